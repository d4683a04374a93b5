// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Tantrika Simulation Engine
//!
//! Turns element models into a clocked network:
//! - **Scheduler**: fixed-period clock releasing Integrate → Synapse → Generate → Record
//! - **Registry**: elements by path and by type tag
//! - **Wiring**: named ports, explicit connects, default sources for unbound inputs
//! - **Assembly**: two-phase builder, finalized into a [`RunnableNetwork`]
//! - **Recorder**: per-tick snapshots of designated signals
//!
//! A network cannot be changed structurally once it is runnable; only external signals can
//! be written between `run` calls.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod scheduler;

pub mod element;
pub mod registry;
pub mod wiring;

pub mod assembly;
pub mod recorder;
pub mod report;
pub mod runnable;

pub use assembly::{derive_seed, Assembly, SUPPORTED_NEURON_TYPES};
pub use element::{ElementId, ElementSpec, ElementType, ExternalSignal, NetworkElement};
pub use recorder::{Recorder, Snapshot, TimeSeriesRecorder};
pub use registry::Registry;
pub use report::RunReport;
pub use runnable::RunnableNetwork;
pub use scheduler::{Clock, Phase, Scheduler, Tick, TickHandler};
pub use wiring::{Binding, BindingOrigin, Endpoint, PortAddress};
