// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron models

pub mod iaf;
pub mod traits;

pub use iaf::{
    Neuron, NeuronInput, NeuronParams, DEFAULT_CM, DEFAULT_EM, DEFAULT_TAU,
    DEFAULT_THRESHOLD_OFFSET, SPIKE_MARKER_POTENTIAL,
};
pub use traits::{Named, PortLayout};
