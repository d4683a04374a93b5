// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Config file → demo circuit → run → CSV and JSON report

use std::collections::HashMap;

use tantrika::demo;
use tantrika::prelude::*;

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("tantrika.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn configured_demo_runs_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("out");
    let path = write_config(
        dir.path(),
        &format!(
            "[simulation]\ndt = 0.0001\nduration = 0.2\nseed = 3\n\n[output]\ndata_dir = {:?}\n",
            data_dir.to_string_lossy()
        ),
    );
    let cli = HashMap::from([("duration".to_string(), "0.1".to_string())]);
    let config = load_config(Some(path.as_path()), Some(&cli)).unwrap();
    validate_config(&config).unwrap();
    assert_eq!(config.simulation.duration, 0.1);

    let mut network = demo::assemble(&config).unwrap().finalize();
    let report = demo::run(&mut network, config.simulation.duration).unwrap();
    assert_eq!(report.ticks, 1000);
    assert_eq!(report.exit_code(), 0);
    // 5, 15, ..., 95 ms
    assert_eq!(report.generator_spikes, 10);
    // The step alone settles 15 mV above rest, past the 10 mV threshold offset
    assert!(report.spikes > 0);

    let (csv, export) = network.save_data(&config.output.data_dir).unwrap();
    assert_eq!(export.rows, 1000);
    assert!(!export.truncated);
    let header = std::fs::read_to_string(&csv).unwrap();
    assert!(header.starts_with("time,drive.spike,syn.psc,step.out,cell.vm,cell.spike\n"));

    let json = serde_json::to_string(&report).unwrap();
    let parsed: RunReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.ticks, report.ticks);
    assert_eq!(parsed.spikes, report.spikes);
}

#[test]
fn step_current_is_off_for_first_half() {
    let mut config = TantrikaConfig::default();
    config.simulation.record_neurons = false;
    let mut network = demo::assemble(&config).unwrap().finalize();
    demo::run(&mut network, 0.02).unwrap();

    let step = network.recorder().get("step.out").unwrap();
    assert_eq!(step.len(), 200);
    assert!(step[..100].iter().all(|&v| v == 0.0));
    assert!(step[100..].iter().all(|&v| v > 0.0));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[simulation]\ndt = -1.0\n\n[neuron]\ntau = 0.0\n");
    let config = load_config(Some(path.as_path()), None).unwrap();
    let err = validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("simulation.dt"), "{}", err);
    assert!(err.contains("neuron.tau"), "{}", err);

    assert!(matches!(
        Assembly::from_config("bad", &config),
        Err(TantrikaError::InvalidClockPeriod(_))
    ));
}
