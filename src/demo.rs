// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Demonstration circuit used by `tantrika-simulate`
//!
//! ```text
//!   drive (periodic) ──spike──▶ syn (config kernel) ──psc──▶ cell (IAF)
//!                                  ▲                          │
//!                                  └────────────vm────────────┘
//!   step (current) ──────────────────────────────inject──────▶ cell
//! ```
//!
//! The current step is off for the first half of the run and on for the second.

use tantrika_config::TantrikaConfig;
use tantrika_npu_engine::{Assembly, RunReport, RunnableNetwork, TimeSeriesRecorder};
use tantrika_npu_neural::{GeneratorSpec, Result, SignalKind, SignalValue};
use tracing::info;

pub const NETWORK_PATH: &str = "demo";
pub const GENERATOR_PATH: &str = "drive";
pub const SYNAPSE_PATH: &str = "syn";
pub const NEURON_PATH: &str = "cell";
pub const STEP_PATH: &str = "step";

/// Generator period and start delay (seconds)
pub const DRIVE_PERIOD: f64 = 10e-3;
pub const DRIVE_DELAY: f64 = 5e-3;

/// Steady-state depolarisation produced by the current step (volts)
pub const STEP_DEPOLARISATION: f64 = 15e-3;

/// Build the circuit from configuration.
pub fn assemble(config: &TantrikaConfig) -> Result<Assembly> {
    let mut net = Assembly::from_config(NETWORK_PATH, config)?;
    net.add_spike_generator(
        GENERATOR_PATH,
        GeneratorSpec::Periodic {
            period: DRIVE_PERIOD,
            delay: DRIVE_DELAY,
        },
    )?;
    let synapse = *net.synapse_defaults();
    net.add_synapse(SYNAPSE_PATH, synapse)?;
    let neuron = *net.neuron_defaults();
    net.add_neuron(NEURON_PATH, neuron)?;
    net.add_signal(STEP_PATH, SignalKind::Current, SignalValue::Real(0.0))?;

    net.connect_synapse(GENERATOR_PATH, SYNAPSE_PATH, NEURON_PATH)?;
    net.connect(STEP_PATH, "out", NEURON_PATH, "inject")?;

    net.record(GENERATOR_PATH, "spike")?;
    net.record(SYNAPSE_PATH, "psc")?;
    net.record(STEP_PATH, "out")?;
    Ok(net)
}

/// Run `duration` seconds: the first half without the step, the second half with it.
pub fn run(network: &mut RunnableNetwork<TimeSeriesRecorder>, duration: f64) -> Result<RunReport> {
    let first = network.run(duration / 2.0)?;

    let rm = network.neuron(NEURON_PATH)?.params().rm;
    let step = STEP_DEPOLARISATION / rm;
    network.write_signal(STEP_PATH, SignalValue::Real(step))?;
    info!(current = step, at = network.time(), "Current step on");

    let second = network.run(duration - first.simulated_seconds)?;
    Ok(RunReport {
        ticks: first.ticks + second.ticks,
        simulated_seconds: first.simulated_seconds + second.simulated_seconds,
        end_time: second.end_time,
        spikes: first.spikes + second.spikes,
        generator_spikes: first.generator_spikes + second.generator_spikes,
        wall_time_secs: first.wall_time_secs + second.wall_time_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_wiring() {
        let config = TantrikaConfig::default();
        let net = assemble(&config).unwrap();
        // drive→syn, syn→cell, cell→syn, step→cell
        assert_eq!(net.bindings().len(), 4);
        let network = net.finalize();
        assert_eq!(
            &network.recorded_signals()[..4],
            ["time", "drive.spike", "syn.psc", "step.out"]
        );
    }
}
