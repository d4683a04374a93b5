// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike generators (periodic and Poisson)

pub mod spike_generator;

pub use spike_generator::{GeneratorSpec, SpikeGenerator, SpikeGeneratorKind, TIME_TOLERANCE};
