// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every violation is collected before reporting, so one pass shows all problems.

use crate::{ConfigError, ConfigResult, TantrikaConfig};

/// Synapse kernel names the engine can build
pub const KNOWN_KERNELS: [&str; 3] = ["alpha", "exp", "exponential"];

/// Log levels accepted by the logging setup
pub const KNOWN_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NotPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "{} = {} must be finite and greater than zero", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must be finite and not negative", field, value)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &TantrikaConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_neuron(config, &mut errors);
    validate_synapse(config, &mut errors);
    validate_logging_and_output(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigValidationError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn non_negative(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
}

fn finite(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !value.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason: "must be finite".to_string(),
        });
    }
}

fn validate_simulation(config: &TantrikaConfig, errors: &mut Vec<ConfigValidationError>) {
    // duration < dt is allowed: the run simply has zero ticks
    positive("simulation.dt", config.simulation.dt, errors);
    non_negative("simulation.duration", config.simulation.duration, errors);
}

fn validate_neuron(config: &TantrikaConfig, errors: &mut Vec<ConfigValidationError>) {
    let neuron = &config.neuron;
    finite("neuron.em", neuron.em, errors);
    positive("neuron.tau", neuron.tau, errors);
    positive("neuron.cm", neuron.cm, errors);
    finite("neuron.threshold_offset", neuron.threshold_offset, errors);
    non_negative("neuron.refractory", neuron.refractory, errors);
    non_negative("neuron.noise", neuron.noise, errors);
}

fn validate_synapse(config: &TantrikaConfig, errors: &mut Vec<ConfigValidationError>) {
    let synapse = &config.synapse;
    non_negative("synapse.gbar", synapse.gbar, errors);
    positive("synapse.tau", synapse.tau, errors);
    finite("synapse.esyn", synapse.esyn, errors);
    positive("synapse.negligible_after_taus", synapse.negligible_after_taus, errors);

    let kernel = synapse.kernel.trim().to_ascii_lowercase();
    if !KNOWN_KERNELS.contains(&kernel.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "synapse.kernel".to_string(),
            reason: format!(
                "'{}' is not one of: {}",
                synapse.kernel,
                KNOWN_KERNELS.join(", ")
            ),
        });
    }
}

fn validate_logging_and_output(config: &TantrikaConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.trim().to_ascii_lowercase();
    if !KNOWN_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of: {}", KNOWN_LEVELS.join(", ")),
        });
    }
    if config.output.delimiter().is_none() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "output.csv_delimiter".to_string(),
            reason: "must be exactly one character".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&TantrikaConfig::default()).is_ok());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let mut config = TantrikaConfig::default();
        config.simulation.dt = 0.0;
        config.neuron.tau = -1.0;
        config.output.csv_delimiter = "::".to_string();

        let result = validate_config(&config);
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("simulation.dt"));
            assert!(msg.contains("neuron.tau"));
            assert!(msg.contains("output.csv_delimiter"));
        } else {
            panic!("expected a validation error");
        }
    }

    #[test]
    fn test_unknown_kernel() {
        let mut config = TantrikaConfig::default();
        config.synapse.kernel = "nmda".to_string();

        let result = validate_config(&config);
        assert!(result.is_err());
        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("synapse.kernel"));
            assert!(msg.contains("alpha"));
        }
    }

    #[test]
    fn test_nan_dt_rejected() {
        let mut config = TantrikaConfig::default();
        config.simulation.dt = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_short_duration_is_allowed() {
        let mut config = TantrikaConfig::default();
        config.simulation.duration = config.simulation.dt / 2.0;
        assert!(validate_config(&config).is_ok());
    }
}
