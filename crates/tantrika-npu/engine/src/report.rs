// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

use serde::{Deserialize, Serialize};

/// Summary of one `run` call
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Ticks executed by this call
    pub ticks: u64,
    /// Simulated seconds covered by this call (`ticks × dt`)
    pub simulated_seconds: f64,
    /// Simulated time of the next tick
    pub end_time: f64,
    /// Neuron spikes during this call
    pub spikes: usize,
    /// Generator spikes during this call
    pub generator_spikes: usize,
    pub wall_time_secs: f64,
}

impl RunReport {
    /// Status code of a completed run
    pub fn exit_code(&self) -> i32 {
        0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks ({} s simulated) in {:.3} s, {} neuron spikes, {} generator spikes",
            self.ticks, self.simulated_seconds, self.wall_time_secs, self.spikes, self.generator_spikes
        )
    }
}
