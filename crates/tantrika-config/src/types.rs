// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `tantrika.toml`. All quantities are SI units.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TantrikaConfig {
    pub simulation: SimulationConfig,
    pub neuron: NeuronConfig,
    pub synapse: SynapseConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// Clock and run length
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Clock period (s)
    pub dt: f64,
    /// Simulated duration of one run (s)
    pub duration: f64,
    /// Base seed from which per-element seeds are derived
    pub seed: u64,
    /// Record the `vm` and `spike` outputs of every neuron
    pub record_neurons: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 1e-4,
            duration: 0.1,
            seed: 0,
            record_neurons: true,
        }
    }
}

/// Default IAF neuron parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuronConfig {
    /// Resting and reset potential (V)
    pub em: f64,
    /// Membrane time constant (s)
    pub tau: f64,
    /// Membrane capacitance (F)
    pub cm: f64,
    /// Threshold above `em` (V)
    pub threshold_offset: f64,
    /// Refractory duration (s)
    pub refractory: f64,
    /// Uniform noise amplitude (V)
    pub noise: f64,
}

impl Default for NeuronConfig {
    fn default() -> Self {
        Self {
            em: -0.065,
            tau: 0.01,
            cm: 1e-6,
            threshold_offset: 0.01,
            refractory: 0.0,
            noise: 0.0,
        }
    }
}

/// Default synapse parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SynapseConfig {
    /// Peak conductance (S)
    pub gbar: f64,
    /// Kernel time constant (s)
    pub tau: f64,
    /// Reversal potential (V)
    pub esyn: f64,
    /// Kernel name: "alpha" or "exp"
    pub kernel: String,
    pub negligible_after_taus: f64,
}

impl Default for SynapseConfig {
    fn default() -> Self {
        Self {
            gbar: 2e-5,
            tau: 0.001,
            esyn: 0.0,
            kernel: "alpha".to_string(),
            negligible_after_taus: 10.0,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level: trace, debug, info, warn, error
    pub level: String,
    /// Also write JSON logs into a per-run folder under `log_dir`
    pub file_logging: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
        }
    }
}

/// Where and how results are written
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
    /// Single-character column separator
    pub csv_delimiter: String,
    /// Also write one `(time, vm)` file per neuron
    pub save_neuron_traces: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            csv_delimiter: ",".to_string(),
            save_neuron_traces: false,
        }
    }
}

impl OutputConfig {
    /// The delimiter as a character, if it is exactly one
    pub fn delimiter(&self) -> Option<char> {
        let mut chars = self.csv_delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: TantrikaConfig = toml::from_str("[simulation]\ndt = 0.0005\n").unwrap();
        assert_eq!(config.simulation.dt, 0.0005);
        assert_eq!(config.simulation.duration, 0.1);
        assert_eq!(config.neuron, NeuronConfig::default());
        assert_eq!(config.synapse.kernel, "alpha");
    }

    #[test]
    fn test_delimiter_must_be_one_char() {
        let mut output = OutputConfig::default();
        assert_eq!(output.delimiter(), Some(','));
        output.csv_delimiter = "\t".to_string();
        assert_eq!(output.delimiter(), Some('\t'));
        output.csv_delimiter = ";;".to_string();
        assert_eq!(output.delimiter(), None);
        output.csv_delimiter.clear();
        assert_eq!(output.delimiter(), None);
    }
}
