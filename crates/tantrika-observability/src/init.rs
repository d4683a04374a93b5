// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature, a JSON log file per run in a
//! timestamped folder, with retention clean-up of older runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps file writers alive; logs are flushed when it is dropped.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// The filter is built from `config.level` plus the per-crate debug flags. Fails if the
/// level is unknown or a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    config.level_filter()?;
    let filter = debug_flags.to_filter_string(&config.level.to_ascii_lowercase());
    let env_filter =
        EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);
    layers.push(match config.format {
        LogFormat::Text => console.with_filter(env_filter.clone()).boxed(),
        LogFormat::Json => console.json().with_filter(env_filter.clone()).boxed(),
    });

    #[cfg(feature = "file-logging")]
    let (file_guards, log_dir) = if config.file_logging {
        let run_folder = create_run_folder(&config.log_dir)?;
        cleanup_old_logs(&config.log_dir, config.retention_days, config.retention_runs)?;

        let appender = tracing_appender::rolling::never(&run_folder, "tantrika.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(env_filter)
                .boxed(),
        );
        (vec![guard], Some(run_folder))
    } else {
        (Vec::new(), None)
    };

    #[cfg(not(feature = "file-logging"))]
    let log_dir = None;
    let file_logging_unavailable = config.file_logging && cfg!(not(feature = "file-logging"));

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    if file_logging_unavailable {
        tracing::warn!("File logging requested but the file-logging feature is disabled");
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir,
    })
}

/// Initialize console logging at `info` with the given debug flags.
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingConfig::default())
}

/// Create `<base>/run_<timestamp>`.
pub fn create_run_folder(base_log_dir: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now().format(RUN_TIMESTAMP_FORMAT);
    let run_folder = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    Ok(run_folder)
}

fn run_timestamp(path: &Path) -> Option<DateTime<Utc>> {
    let name = path.file_name()?.to_str()?;
    let stamp = name.strip_prefix(RUN_PREFIX)?;
    let naive = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Remove run folders older than `retention_days`, then all but the newest
/// `retention_runs`. Returns the number of folders removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }
    let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to read log directory: {}", base_log_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(stamp) = run_timestamp(&path) {
            runs.push((path, stamp));
        }
    }
    // Newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (index, (path, stamp)) in runs.iter().enumerate() {
        if *stamp >= cutoff && index < retention_runs {
            continue;
        }
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_keeps_recent_runs() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        for hours in [1, 2, 3, 4] {
            let stamp = (now - chrono::Duration::hours(hours)).format(RUN_TIMESTAMP_FORMAT);
            std::fs::create_dir(dir.path().join(format!("run_{}", stamp))).unwrap();
        }
        std::fs::create_dir(dir.path().join("run_20000101_000000")).unwrap();
        std::fs::create_dir(dir.path().join("unrelated")).unwrap();

        let removed = cleanup_old_logs(dir.path(), 30, 2).unwrap();
        assert_eq!(removed, 3);

        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        left.sort();
        assert_eq!(left.len(), 3);
        assert!(left.contains(&"unrelated".to_string()));
        let newest = format!(
            "run_{}",
            (now - chrono::Duration::hours(1)).format(RUN_TIMESTAMP_FORMAT)
        );
        assert!(left.contains(&newest));
    }

    #[test]
    fn test_cleanup_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("absent"), 30, 10).unwrap(), 0);
    }

    #[test]
    fn test_run_folder_name_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let run = create_run_folder(dir.path()).unwrap();
        assert!(run.is_dir());
        assert!(run_timestamp(&run).is_some());
    }

    #[test]
    fn test_unknown_level_rejected_before_install() {
        let config = LoggingConfig::new("chatty", false, "./logs");
        assert!(init_logging(&CrateDebugFlags::default(), &config).is_err());
    }
}
