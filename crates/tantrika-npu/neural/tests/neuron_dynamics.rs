// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Multi-element dynamics driven by hand, without a network

use tantrika_npu_neural::{Neuron, NeuronInput, NeuronParams, SpikeGenerator, Synapse};

const DT: f64 = 1e-4;

/// Inter-spike interval under constant drive converges to `tau × ln(RI / (RI - θ))`.
#[test]
fn constant_injection_fires_periodically_at_analytic_interval() {
    let params = NeuronParams::from_tau(10e-3, -65e-3);
    let mut neuron = Neuron::new("n", params).unwrap();
    let drive_mv = 20e-3;
    let inject = drive_mv / params.rm;

    for k in 0..2_000u64 {
        neuron.decay(
            k as f64 * DT,
            NeuronInput {
                inject,
                synaptic: 0.0,
            },
        );
    }

    let spikes = neuron.spikes();
    assert!(spikes.len() > 10);
    let analytic = params.tau * (drive_mv / (drive_mv - (params.threshold - params.em))).ln();
    let intervals: Vec<f64> = spikes.windows(2).map(|w| w[1] - w[0]).collect();
    let last = *intervals.last().unwrap();
    assert!((last - analytic).abs() < 2.0 * DT, "isi {} vs {}", last, analytic);
    for isi in &intervals[1..] {
        assert!((isi - last).abs() < 1e-9);
    }
}

#[test]
fn subthreshold_drive_never_fires() {
    let params = NeuronParams::from_tau(10e-3, -65e-3);
    let mut neuron = Neuron::new("n", params).unwrap();
    // Steady state sits at Em + 8 mV, below the 10 mV threshold offset
    let inject = 8e-3 / params.rm;
    for k in 0..5_000u64 {
        neuron.decay(k as f64 * DT, NeuronInput { inject, synaptic: 0.0 });
    }
    assert!(neuron.spikes().is_empty());
    assert!((neuron.vm() - (params.em + 8e-3)).abs() < 1e-6);
}

/// Periodic generator -> alpha synapse -> neuron, clocked by hand with a one-tick delay
/// between the synapse current and the neuron that reads it.
#[test]
fn generator_driven_synapse_depolarises_target() {
    let mut generator = SpikeGenerator::periodic("g", 5e-3, 1e-3).unwrap();
    let mut synapse = Synapse::alpha("s", 2e-5, 1e-3, 0.0).unwrap();
    let mut neuron = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();

    let mut psc = 0.0;
    let mut spike_flag = false;
    let mut peak = neuron.vm();
    for k in 0..400u64 {
        let t = k as f64 * DT;
        neuron.decay(t, NeuronInput { inject: 0.0, synaptic: psc });
        psc = synapse.update(t, spike_flag, neuron.vm());
        spike_flag = generator.advance_if_due(t) > 0;
        peak = peak.max(neuron.vm());
    }

    assert_eq!(synapse.total_spikes(), 8);
    assert!(peak > -65e-3 + 1e-3, "peak {}", peak);
    assert_eq!(neuron.data().len(), 400);
}

#[test]
fn save_data_defaults_to_neuron_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cell");
    let mut neuron = Neuron::with_tau(path.to_string_lossy().to_string(), 10e-3, -65e-3).unwrap();
    for k in 0..3u64 {
        neuron.decay(k as f64 * DT, NeuronInput::default());
    }

    let written = neuron.save_data("").unwrap();
    assert_eq!(written, dir.path().join("cell.csv"));
    let text = std::fs::read_to_string(&written).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("time,vm"));
    assert_eq!(lines.next(), Some("0,-0.065"));
    assert_eq!(text.lines().count(), 4);
}
