// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synapse models
//!
//! A closed set of kernel shapes ([`SynapseKernel`]) behind one synapse type that sums the
//! contributions of all still-active triggering spikes.

pub mod conductance;
pub mod kernel;

pub use conductance::{Synapse, SynapseParams, DEFAULT_NEGLIGIBLE_AFTER_TAUS};
pub use kernel::SynapseKernel;
