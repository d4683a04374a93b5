// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Conductance-based synapse
//!
//! Converts presynaptic spike events into a conductance time course and a current
//! `g(t) × (Esyn - vm_post)` at the postsynaptic neuron.

use std::collections::VecDeque;

use super::kernel::SynapseKernel;
use crate::models::iaf::{finite, non_negative, positive};
use crate::models::traits::{Named, PortLayout};
use crate::types::{PortSpec, Result, SignalKind};

/// Default negligibility cutoff, in multiples of `tau`
pub const DEFAULT_NEGLIGIBLE_AFTER_TAUS: f64 = 10.0;

/// Synapse parameters (shared by all members of a synapse group)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapseParams {
    /// Peak conductance (S)
    pub gbar: f64,
    /// Kernel time constant (s)
    pub tau: f64,
    /// Synaptic reversal potential (V)
    pub esyn: f64,
    pub kernel: SynapseKernel,
    /// Spikes older than `negligible_after_taus × tau` no longer contribute
    pub negligible_after_taus: f64,
}

impl SynapseParams {
    pub fn new(gbar: f64, tau: f64, esyn: f64, kernel: SynapseKernel) -> Self {
        Self {
            gbar,
            tau,
            esyn,
            kernel,
            negligible_after_taus: DEFAULT_NEGLIGIBLE_AFTER_TAUS,
        }
    }

    pub fn with_cutoff(mut self, negligible_after_taus: f64) -> Self {
        self.negligible_after_taus = negligible_after_taus;
        self
    }

    /// Time after a spike beyond which its contribution is dropped
    pub fn horizon(&self) -> f64 {
        self.negligible_after_taus * self.tau
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("gbar", self.gbar)?;
        positive("tau", self.tau)?;
        finite("esyn", self.esyn)?;
        positive("negligible_after_taus", self.negligible_after_taus)?;
        Ok(())
    }
}

impl Default for SynapseParams {
    fn default() -> Self {
        Self::new(2e-5, 1e-3, 0.0, SynapseKernel::Alpha)
    }
}

/// Synapse with independent per-instance kernel state
#[derive(Debug, Clone)]
pub struct Synapse {
    path: String,
    params: SynapseParams,
    /// Triggering spikes still inside the horizon, oldest first
    active: VecDeque<f64>,
    last_spike: Option<f64>,
    total_spikes: usize,
}

impl Synapse {
    pub const PORT_SPIKE: usize = 0;
    pub const PORT_POST: usize = 1;
    pub const PORT_PSC: usize = 2;

    pub fn new(path: impl Into<String>, params: SynapseParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            path: path.into(),
            params,
            active: VecDeque::new(),
            last_spike: None,
            total_spikes: 0,
        })
    }

    pub fn alpha(path: impl Into<String>, gbar: f64, tau: f64, esyn: f64) -> Result<Self> {
        Self::new(path, SynapseParams::new(gbar, tau, esyn, SynapseKernel::Alpha))
    }

    pub fn exponential(path: impl Into<String>, gbar: f64, tau: f64, esyn: f64) -> Result<Self> {
        Self::new(
            path,
            SynapseParams::new(gbar, tau, esyn, SynapseKernel::Exponential),
        )
    }

    /// Record a triggering spike at time `t`.
    pub fn on_presynaptic_spike(&mut self, t: f64) {
        self.active.push_back(t);
        self.last_spike = Some(t);
        self.total_spikes += 1;
    }

    /// Conductance at time `t`: the sum of the kernels of all spikes within the horizon.
    pub fn conductance(&self, t: f64) -> f64 {
        let horizon = self.params.horizon();
        self.active
            .iter()
            .map(|&t0| t - t0)
            .filter(|&elapsed| elapsed <= horizon)
            .map(|elapsed| self.params.kernel.evaluate(self.params.gbar, self.params.tau, elapsed))
            .sum()
    }

    /// Postsynaptic current at time `t` for a target at potential `vm_post`.
    pub fn current(&self, t: f64, vm_post: f64) -> f64 {
        self.conductance(t) * (self.params.esyn - vm_post)
    }

    /// One synapse phase: consume a spike raised for this tick, drop decayed spikes, and
    /// return the current to publish.
    pub fn update(&mut self, t: f64, presynaptic_spike: bool, vm_post: f64) -> f64 {
        if presynaptic_spike {
            self.on_presynaptic_spike(t);
        }
        self.prune(t);
        self.current(t, vm_post)
    }

    fn prune(&mut self, t: f64) {
        let horizon = self.params.horizon();
        while let Some(&t0) = self.active.front() {
            if t - t0 > horizon {
                self.active.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn params(&self) -> &SynapseParams {
        &self.params
    }

    pub fn kernel(&self) -> SynapseKernel {
        self.params.kernel
    }

    /// Time since the most recent triggering spike, if any
    pub fn time_since_last_spike(&self, t: f64) -> Option<f64> {
        self.last_spike.map(|t0| t - t0)
    }

    /// Number of spikes currently contributing
    pub fn active_spikes(&self) -> usize {
        self.active.len()
    }

    pub fn total_spikes(&self) -> usize {
        self.total_spikes
    }
}

impl Named for Synapse {
    fn path(&self) -> &str {
        &self.path
    }
}

impl PortLayout for Synapse {
    const TYPE_NAME: &'static str = "Synapse";
    const PORTS: &'static [PortSpec] = &[
        PortSpec::input("spike", SignalKind::Spike),
        PortSpec::input("post", SignalKind::Voltage),
        PortSpec::output("psc", SignalKind::Current),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_before_any_spike() {
        let syn = Synapse::alpha("s", 1e-5, 1e-3, 0.0).unwrap();
        assert_eq!(syn.conductance(0.5), 0.0);
        assert_eq!(syn.current(0.5, -65e-3), 0.0);
        assert!(syn.time_since_last_spike(0.5).is_none());
    }

    #[test]
    fn test_alpha_peak_and_exponential_decay() {
        let mut alpha = Synapse::alpha("a", 1e-5, 2e-3, 0.0).unwrap();
        alpha.on_presynaptic_spike(0.010);
        assert!((alpha.conductance(0.012) - 1e-5).abs() < 1e-17);

        let mut exp = Synapse::exponential("e", 1e-5, 2e-3, 0.0).unwrap();
        exp.on_presynaptic_spike(0.010);
        assert!((exp.conductance(0.012) - 1e-5 / std::f64::consts::E).abs() < 1e-17);
    }

    #[test]
    fn test_current_uses_driving_force() {
        let mut syn = Synapse::exponential("s", 1e-5, 1e-3, 0.0).unwrap();
        syn.on_presynaptic_spike(0.0);
        // Excitatory: Esyn above vm drives positive current
        assert!((syn.current(0.0, -65e-3) - 1e-5 * 65e-3).abs() < 1e-18);

        let mut inhibitory = Synapse::exponential("i", 1e-5, 1e-3, -80e-3).unwrap();
        inhibitory.on_presynaptic_spike(0.0);
        assert!(inhibitory.current(0.0, -65e-3) < 0.0);
    }

    #[test]
    fn test_retriggers_superpose() {
        let params = SynapseParams::new(1.0, 1e-3, 0.0, SynapseKernel::Alpha);
        let mut both = Synapse::new("both", params).unwrap();
        both.on_presynaptic_spike(0.0);
        both.on_presynaptic_spike(0.5e-3);

        let t = 1.7e-3;
        let single_a = SynapseKernel::Alpha.evaluate(1.0, 1e-3, t);
        let single_b = SynapseKernel::Alpha.evaluate(1.0, 1e-3, t - 0.5e-3);
        assert!((both.conductance(t) - (single_a + single_b)).abs() < 1e-12);
        assert_eq!(both.active_spikes(), 2);
    }

    #[test]
    fn test_update_prunes_decayed_spikes() {
        let params = SynapseParams::new(1.0, 1e-3, 0.0, SynapseKernel::Exponential).with_cutoff(5.0);
        let mut syn = Synapse::new("s", params).unwrap();
        syn.update(0.0, true, 0.0);
        syn.update(1e-3, true, 0.0);
        assert_eq!(syn.active_spikes(), 2);
        syn.update(5.5e-3, false, 0.0);
        assert_eq!(syn.active_spikes(), 1);
        assert_eq!(syn.total_spikes(), 2);
        syn.update(1.0, false, 0.0);
        assert_eq!(syn.active_spikes(), 0);
        assert_eq!(syn.conductance(1.0), 0.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(Synapse::alpha("s", 1e-5, 0.0, 0.0).is_err());
        assert!(Synapse::alpha("s", -1e-5, 1e-3, 0.0).is_err());
    }

    proptest! {
        #[test]
        fn conductance_never_negative(
            gbar in 0.0f64..1e-3,
            tau in 1e-4f64..1e-1,
            spikes in proptest::collection::vec(0.0f64..0.1, 0..8),
            t in 0.0f64..0.2,
        ) {
            for kernel in [SynapseKernel::Alpha, SynapseKernel::Exponential] {
                let mut syn = Synapse::new("s", SynapseParams::new(gbar, tau, 0.0, kernel)).unwrap();
                let mut sorted = spikes.clone();
                sorted.sort_by(f64::total_cmp);
                for s in sorted {
                    syn.on_presynaptic_spike(s);
                }
                prop_assert!(syn.conductance(t) >= 0.0);
            }
        }

        #[test]
        fn conductance_is_sum_of_single_spike_responses(
            tau in 1e-4f64..1e-2,
            t0 in 0.0f64..0.01,
            t1 in 0.0f64..0.01,
            t in 0.0f64..0.02,
        ) {
            let params = SynapseParams::new(1.0, tau, 0.0, SynapseKernel::Exponential).with_cutoff(1e6);
            let mut a = Synapse::new("a", params).unwrap();
            let mut b = Synapse::new("b", params).unwrap();
            let mut ab = Synapse::new("ab", params).unwrap();
            a.on_presynaptic_spike(t0);
            b.on_presynaptic_spike(t1);
            ab.on_presynaptic_spike(t0);
            ab.on_presynaptic_spike(t1);
            let expected = a.conductance(t) + b.conductance(t);
            prop_assert!((ab.conductance(t) - expected).abs() <= 1e-12);
        }
    }
}
