// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # tantrika
//!
//! Clocked simulation of small networks of integrate-and-fire neurons driven through
//! conductance-based synapses and spike generators.
//!
//! ## Feature Flags
//! - **`observability`** (default): logging initialisation and per-crate debug flags
//! - **`file-logging`**: JSON log files in a timestamped run folder
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tantrika::prelude::*;
//!
//! let mut net = Assembly::new("demo", 1e-4)?;
//! net.add_spike_generator("drive", GeneratorSpec::Periodic { period: 5e-3, delay: 0.0 })?;
//! net.add_synapse("syn", SynapseParams::default())?;
//! net.add_neuron("cell", NeuronParams::default())?;
//! net.connect_synapse("drive", "syn", "cell")?;
//! net.record("cell", "vm")?;
//!
//! let mut network = net.finalize();
//! let report = network.run(0.1)?;
//! network.save_data("./out")?;
//! println!("{}", report);
//! # Ok::<(), tantrika::neural::TantrikaError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use tantrika_config as config;
pub use tantrika_npu_engine as engine;
pub use tantrika_npu_neural as neural;

#[cfg(feature = "observability")]
pub use tantrika_observability as observability;

pub mod demo;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, TantrikaConfig};
    pub use crate::engine::{
        Assembly, ElementType, Recorder, RunReport, RunnableNetwork, Snapshot, TimeSeriesRecorder,
    };
    pub use crate::neural::{
        GeneratorSpec, Named, Neuron, NeuronParams, Result, SignalKind, SignalValue,
        SpikeGenerator, SpikeGeneratorKind, Synapse, SynapseKernel, SynapseParams,
        TantrikaError,
    };
}
