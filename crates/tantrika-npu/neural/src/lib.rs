// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Tantrika Element Models
//!
//! Everything a single simulated element needs, independent of how a network wires and
//! clocks it:
//! - **Types**: error taxonomy, signals, port descriptions
//! - **Models**: integrate-and-fire neuron
//! - **Synapse**: alpha and exponential conductance kernels
//! - **Generator**: periodic and Poisson spike sources
//! - **Group**: homogeneous collections addressable by index
//! - **Export**: CSV writer for recorded series and neuron traces
//!
//! Every update takes the current simulated time as an explicit argument, so each element
//! can be driven and tested in isolation.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod types;

pub mod models;

pub mod synapse;

pub mod generator;

pub mod group;

// CSV export collaborator
pub mod export;

pub use types::{
    find_port, Error, Multiplicity, PortDirection, PortSpec, Result, Signal, SignalId,
    SignalKind, SignalValue, TantrikaError,
};

pub use models::{Named, Neuron, NeuronInput, NeuronParams, PortLayout, SPIKE_MARKER_POTENTIAL};

pub use synapse::{Synapse, SynapseKernel, SynapseParams};

pub use generator::{GeneratorSpec, SpikeGenerator, SpikeGeneratorKind};

pub use group::{member_path, Group, NeuronGroup, SpikeGeneratorGroup, SynapseGroup};

pub use export::CsvExport;
