// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Core types
//!
//! Error taxonomy, signals and port descriptions shared by every element model.

pub mod error;
pub mod signal;

pub use error::{Error, Result, TantrikaError};
pub use signal::{
    find_port, Multiplicity, PortDirection, PortSpec, Signal, SignalId, SignalKind, SignalValue,
};
