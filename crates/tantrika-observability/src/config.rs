// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Errors raised while interpreting logging settings
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ObservabilityError {
    #[error("Unknown log level '{0}' (expected trace, debug, info, warn or error)")]
    UnknownLevel(String),
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Console format
    pub format: LogFormat,

    /// Also write JSON log files (requires the `file-logging` feature)
    pub file_logging: bool,

    /// Base directory for run folders
    pub log_dir: PathBuf,

    /// Keep run folders for N days
    pub retention_days: u64,

    /// Keep the N most recent run folders
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, file_logging: bool, log_dir: impl Into<PathBuf>) -> Self {
        LoggingConfig {
            level: level.into(),
            file_logging,
            log_dir: log_dir.into(),
            ..Default::default()
        }
    }

    /// Parse `level` into a filter.
    pub fn level_filter(&self) -> Result<LevelFilter, ObservabilityError> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LevelFilter::TRACE),
            "debug" => Ok(LevelFilter::DEBUG),
            "info" => Ok(LevelFilter::INFO),
            "warn" => Ok(LevelFilter::WARN),
            "error" => Ok(LevelFilter::ERROR),
            _ => Err(ObservabilityError::UnknownLevel(self.level.clone())),
        }
    }
}
