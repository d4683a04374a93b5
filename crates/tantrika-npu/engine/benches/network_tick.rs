// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tick throughput
//!
//! Poisson generators drive alpha synapses onto IAF neurons member-wise. Each iteration
//! advances the network by 10 ticks. Recording is discarded so only the phase loop is
//! measured.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tantrika_npu_engine::{Assembly, Recorder, RunnableNetwork, Snapshot};
use tantrika_npu_neural::{GeneratorSpec, NeuronParams, SynapseParams};

const DT: f64 = 1e-4;
const TICKS_PER_ITER: u64 = 10;

struct Discard;

impl Recorder for Discard {
    fn record(&mut self, snapshot: &Snapshot<'_>) {
        black_box(snapshot.values.len());
    }
}

fn build_network(size: usize) -> RunnableNetwork<Discard> {
    let mut net = Assembly::new("bench", DT).unwrap().with_seed(42);
    net.add_spike_generator_group(
        "drive",
        size,
        GeneratorSpec::Poisson {
            lambda: 50.0,
            delay: 0.0,
        },
    )
    .unwrap();
    net.add_synapse_group("syn", size, SynapseParams::default())
        .unwrap();
    net.add_neuron_group("cells", size, NeuronParams::default())
        .unwrap();
    net.connect_synapse("drive", "syn", "cells").unwrap();
    net.record("cells", "vm").unwrap();
    net.finalize_with_recorder(Discard)
}

fn bench_network_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("network_tick");
    group.sample_size(20);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    for size in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(size as u64 * TICKS_PER_ITER));
        group.bench_with_input(BenchmarkId::new("run_10_ticks", size), &size, |b, &size| {
            let mut network = build_network(size);
            b.iter(|| {
                let report = network.run(black_box(TICKS_PER_ITER as f64 * DT)).unwrap();
                black_box(report.spikes);
            });
        });
    }

    group.finish();
}

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");
    group.sample_size(20);

    group.bench_function("finalize_1k", |b| {
        b.iter(|| black_box(build_network(1_000)).tick_count());
    });

    group.finish();
}

criterion_group!(benches, bench_network_tick, bench_assembly);
criterion_main!(benches);
