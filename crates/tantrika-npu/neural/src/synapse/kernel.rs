// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synaptic conductance kernels
//!
//! Pure functions of the time elapsed since a triggering spike.

use core::fmt;
use core::str::FromStr;

use crate::types::TantrikaError;

/// Kernel shape of a synapse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynapseKernel {
    /// `gbar × (s/tau) × exp(1 - s/tau)`, peaks at `s = tau` with value `gbar`
    Alpha,
    /// `gbar × exp(-s/tau)`, single first-order decay
    Exponential,
}

impl SynapseKernel {
    /// Conductance contributed by one spike, `elapsed` seconds after it.
    ///
    /// Zero for negative elapsed time (the spike has not happened yet).
    #[inline]
    pub fn evaluate(self, gbar: f64, tau: f64, elapsed: f64) -> f64 {
        if elapsed < 0.0 {
            return 0.0;
        }
        let x = elapsed / tau;
        match self {
            SynapseKernel::Alpha => gbar * x * (1.0 - x).exp(),
            SynapseKernel::Exponential => gbar * (-x).exp(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SynapseKernel::Alpha => "alpha",
            SynapseKernel::Exponential => "exp",
        }
    }
}

impl fmt::Display for SynapseKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SynapseKernel {
    type Err = TantrikaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alpha" => Ok(SynapseKernel::Alpha),
            "exp" | "exponential" => Ok(SynapseKernel::Exponential),
            other => Err(TantrikaError::NotImplemented(format!(
                "synapse kernel '{}'",
                other
            ))),
        }
    }
}
