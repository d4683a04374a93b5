// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Simulation Tool

Runs the demonstration circuit (periodic generator → synapse → IAF neuron, plus a current
step halfway through) with settings from `tantrika.toml`, then writes the recorded series
as CSV and a JSON run report into `output.data_dir`.

Usage:
  cargo run --bin tantrika-simulate -- [--config <tantrika.toml>] [--dt <s>] [--duration <s>]
      [--seed <n>] [--log-level <level>] [--data-dir <dir>] [--debug-<crate>] [--debug-all]

Exit codes: 0 success, 1 configuration error, 2 not implemented, 3 I/O error.
*/

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tantrika::config::{self, ConfigError, TantrikaConfig};
use tantrika::demo;
use tantrika::neural::TantrikaError;
use tantrika::observability::{debug_flags_help, parse_debug_flags, LoggingConfig};
use tracing::{error, info};

const REPORT_FILE: &str = "run_report.json";

/// Tantrika simulator - runs the demonstration circuit and saves the recorded series
#[derive(Parser, Debug)]
#[command(name = "tantrika-simulate", version, author, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to tantrika.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clock period in seconds
    #[arg(long)]
    dt: Option<f64>,

    /// Simulated duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Base seed for neuron noise and Poisson generators
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output directory for the CSV and the run report
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Args {
    /// Parse everything except `--debug-*`, which belongs to the logging setup.
    fn parse_from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(without_debug_flags(env::args()))
    }

    /// Command line values win over the file and the environment.
    fn apply_overrides(&self, cfg: &mut TantrikaConfig) {
        if let Some(dt) = self.dt {
            cfg.simulation.dt = dt;
        }
        if let Some(duration) = self.duration {
            cfg.simulation.duration = duration;
        }
        if let Some(seed) = self.seed {
            cfg.simulation.seed = seed;
        }
        if let Some(level) = &self.log_level {
            cfg.logging.level = level.clone();
        }
        if let Some(dir) = &self.data_dir {
            cfg.output.data_dir = dir.clone();
        }
    }
}

fn without_debug_flags(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .filter(|arg| !arg.starts_with("--debug-"))
        .collect()
}

fn load(args: &Args) -> Result<TantrikaConfig, ConfigError> {
    let mut cfg = match config::load_config(args.config.as_deref(), None) {
        Ok(cfg) => cfg,
        // No file anywhere: defaults plus the environment
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut cfg = TantrikaConfig::default();
            config::apply_environment_overrides(&mut cfg)?;
            cfg
        }
        Err(e) => return Err(e),
    };
    args.apply_overrides(&mut cfg);
    config::validate_config(&cfg)?;
    Ok(cfg)
}

fn simulate(cfg: &TantrikaConfig) -> anyhow::Result<i32> {
    let assembly = demo::assemble(cfg)?;
    let mut network = assembly.finalize();
    let report = demo::run(&mut network, cfg.simulation.duration)?;

    let (csv, export) = network.save_data(&cfg.output.data_dir)?;
    if export.truncated {
        info!(file = %csv.display(), "Recorded series had unequal lengths and were truncated");
    }
    if cfg.output.save_neuron_traces {
        network.save_neuron_traces(cfg.output.data_dir.join("traces"))?;
    }

    let report_path = cfg.output.data_dir.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    println!("{}", report);
    println!("Series:  {}", csv.display());
    println!("Report:  {}", report_path.display());
    Ok(report.exit_code())
}

fn exit_code_of(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TantrikaError>() {
        Some(e) => e.exit_code(),
        None if err.downcast_ref::<std::io::Error>().is_some() => 3,
        None if err.downcast_ref::<serde_json::Error>().is_some() => 3,
        None => 1,
    }
}

fn main() -> ExitCode {
    let args = match Args::parse_from_env() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    let cfg = match load(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::from(1);
        }
    };

    let logging = LoggingConfig::new(
        cfg.logging.level.clone(),
        cfg.logging.file_logging,
        cfg.logging.log_dir.clone(),
    );
    let _guard = match tantrika::observability::init_logging(&parse_debug_flags(), &logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Failed to initialise logging: {:#}", e);
            return ExitCode::from(1);
        }
    };
    info!(version = tantrika::VERSION, dt = cfg.simulation.dt, duration = cfg.simulation.duration, "tantrika-simulate");

    match simulate(&cfg) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::from(exit_code_of(&e) as u8)
        }
    }
}
