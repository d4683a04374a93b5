// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # IAF (Integrate-and-Fire) Neuron Model
//!
//! ## Model Dynamics
//!
//! ```text
//! Leak and synaptic drive (explicit Euler, dt = t - prevT):
//!     vm += dt × (-(vm - Em) + Rm × I_syn) / tau
//!
//! Injected current (capacitive side-channel, after the leak update):
//!     vm += I_inject × dt / Cm
//!
//! Firing check:
//!     if vm ≥ threshold:
//!         record spike time, vm = SPIKE_MARKER_POTENTIAL, fired = true
//!
//! Next integration step after a spike:
//!     vm = Em, then integrate (leak only while refractory)
//! ```
//!
//! Because `I_inject × dt / Cm == dt × Rm × I_inject / tau`, the two updates together are
//! exactly one explicit Euler step of `tau dV/dt = -(V - Em) + Rm (I_inject + I_syn)`.

use core::fmt;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::traits::{Named, PortLayout};
use crate::export;
use crate::types::{PortSpec, Result, SignalKind, TantrikaError};

/// Membrane potential written on the tick a spike is detected (V).
///
/// A fixed depolarised marker, not the peak of a real action potential.
pub const SPIKE_MARKER_POTENTIAL: f64 = 10e-3;

/// Membrane capacitance used when a neuron is built from its time constant (F)
pub const DEFAULT_CM: f64 = 1e-6;

/// Default resting potential (V)
pub const DEFAULT_EM: f64 = -65e-3;

/// Default membrane time constant (s)
pub const DEFAULT_TAU: f64 = 10e-3;

/// Default distance of the firing threshold above `Em` (V)
pub const DEFAULT_THRESHOLD_OFFSET: f64 = 10e-3;

/// IAF neuron parameters
///
/// `tau == rm * cm` holds for every value produced by the constructors and mutators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuronParams {
    /// Membrane capacitance (F)
    pub cm: f64,
    /// Membrane resistance (Ω)
    pub rm: f64,
    /// Resting / reset potential (V)
    pub em: f64,
    /// Membrane time constant (s)
    pub tau: f64,
    /// Firing threshold (V)
    pub threshold: f64,
    /// Refractory duration after a spike (s)
    pub refractory: f64,
    /// Amplitude of uniform noise added each integration step (V)
    pub noise: f64,
}

impl NeuronParams {
    /// Time-constant form: `cm` is fixed to [`DEFAULT_CM`] and `rm` derived.
    pub fn from_tau(tau: f64, em: f64) -> Self {
        Self {
            cm: DEFAULT_CM,
            rm: tau / DEFAULT_CM,
            em,
            tau,
            threshold: em + DEFAULT_THRESHOLD_OFFSET,
            refractory: 0.0,
            noise: 0.0,
        }
    }

    /// Resistance/capacitance form: `tau` is derived.
    pub fn from_rc(cm: f64, rm: f64, em: f64) -> Self {
        Self {
            cm,
            rm,
            em,
            tau: rm * cm,
            threshold: em + DEFAULT_THRESHOLD_OFFSET,
            refractory: 0.0,
            noise: 0.0,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_refractory(mut self, refractory: f64) -> Self {
        self.refractory = refractory;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn validate(&self) -> Result<()> {
        positive("cm", self.cm)?;
        positive("rm", self.rm)?;
        positive("tau", self.tau)?;
        finite("em", self.em)?;
        finite("threshold", self.threshold)?;
        non_negative("refractory", self.refractory)?;
        non_negative("noise", self.noise)?;
        Ok(())
    }
}

impl Default for NeuronParams {
    fn default() -> Self {
        Self::from_tau(DEFAULT_TAU, DEFAULT_EM)
    }
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TantrikaError::InvalidParameter {
            name,
            value,
            reason: "must be finite and > 0",
        })
    }
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TantrikaError::InvalidParameter {
            name,
            value,
            reason: "must be finite and >= 0",
        })
    }
}

pub(crate) fn finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TantrikaError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}

/// Currents sampled from the previous tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeuronInput {
    /// Externally injected current (A)
    pub inject: f64,
    /// Sum of all bound synaptic currents (A)
    pub synaptic: f64,
}

/// Integrate-and-fire neuron
#[derive(Debug, Clone)]
pub struct Neuron {
    path: String,
    params: NeuronParams,

    vm: f64,
    prev_t: f64,
    dt: f64,
    fired: bool,
    started: bool,
    last_spike: Option<f64>,

    spikes: Vec<f64>,
    data: Vec<(f64, f64)>,

    rng: StdRng,
}

impl Neuron {
    pub const PORT_INJECT: usize = 0;
    pub const PORT_PSC: usize = 1;
    pub const PORT_VM: usize = 2;
    pub const PORT_SPIKE: usize = 3;

    pub fn new(path: impl Into<String>, params: NeuronParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            path: path.into(),
            params,
            vm: params.em,
            prev_t: 0.0,
            dt: 0.0,
            fired: false,
            started: false,
            last_spike: None,
            spikes: Vec::new(),
            data: Vec::new(),
            rng: StdRng::seed_from_u64(0),
        })
    }

    /// Time-constant constructor (`Cm` fixed, `Rm = tau / Cm`).
    pub fn with_tau(path: impl Into<String>, tau: f64, em: f64) -> Result<Self> {
        Self::new(path, NeuronParams::from_tau(tau, em))
    }

    /// Resistance/capacitance constructor (`tau = Rm × Cm`).
    pub fn with_rc(path: impl Into<String>, cm: f64, rm: f64, em: f64) -> Result<Self> {
        Self::new(path, NeuronParams::from_rc(cm, rm, em))
    }

    /// Reseed the noise generator. Only valid before the first tick.
    pub fn set_seed(&mut self, seed: u64) -> Result<()> {
        self.ensure_not_started("seed")?;
        self.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }

    /// Advance the membrane to time `t`.
    ///
    /// Returns `true` if the neuron fired on this step. A call with no elapsed time since
    /// the previous one leaves the state untouched.
    pub fn decay(&mut self, t: f64, input: NeuronInput) -> bool {
        self.started = true;
        let dt = t - self.prev_t;
        if dt <= 0.0 {
            self.log_sample(t);
            return false;
        }
        self.dt = dt;

        if self.fired {
            self.vm = self.params.em;
            self.fired = false;
        }

        let refractory = self.in_refractory(t);
        let synaptic = if refractory { 0.0 } else { input.synaptic };

        self.vm += dt * (-(self.vm - self.params.em) + self.params.rm * synaptic) / self.params.tau;
        if !refractory && self.params.noise > 0.0 {
            self.vm += self.noise();
        }
        if !refractory && input.inject != 0.0 {
            self.handle_injection(input.inject);
        }
        self.prev_t = t;

        let fired = !refractory && self.vm >= self.params.threshold;
        if fired {
            self.handle_on_fire(t);
        }
        self.log_sample(t);
        fired
    }

    /// Capacitive charging from injected current over the step just integrated.
    fn handle_injection(&mut self, inject: f64) {
        self.vm += inject * self.dt / self.params.cm;
    }

    fn handle_on_fire(&mut self, t: f64) {
        trace!(neuron = %self.path, t, vm = self.vm, "spike");
        self.spikes.push(t);
        self.last_spike = Some(t);
        self.vm = SPIKE_MARKER_POTENTIAL;
        self.fired = true;
    }

    fn in_refractory(&self, t: f64) -> bool {
        match self.last_spike {
            Some(spike_t) => t - spike_t < self.params.refractory,
            None => false,
        }
    }

    fn noise(&mut self) -> f64 {
        self.params.noise * self.rng.gen_range(-1.0..=1.0)
    }

    fn log_sample(&mut self, t: f64) {
        match self.data.last() {
            Some(&(last_t, _)) if last_t == t => {}
            _ => self.data.push((t, self.vm)),
        }
    }

    fn ensure_not_started(&self, parameter: &'static str) -> Result<()> {
        if self.started {
            return Err(TantrikaError::MutationAfterStart {
                path: self.path.clone(),
                parameter,
            });
        }
        Ok(())
    }

    //-------------------------------------------------------------------------
    //  Mutators (valid before the first tick only)
    //-------------------------------------------------------------------------

    /// Change the time constant, keeping `Cm` and re-deriving `Rm`.
    pub fn set_tau(&mut self, tau: f64) -> Result<()> {
        self.ensure_not_started("tau")?;
        positive("tau", tau)?;
        self.params.tau = tau;
        self.params.rm = tau / self.params.cm;
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        self.ensure_not_started("threshold")?;
        finite("threshold", threshold)?;
        self.params.threshold = threshold;
        Ok(())
    }

    pub fn set_refractory(&mut self, refractory: f64) -> Result<()> {
        self.ensure_not_started("refractory")?;
        non_negative("refractory", refractory)?;
        self.params.refractory = refractory;
        Ok(())
    }

    pub fn set_noise(&mut self, eps: f64) -> Result<()> {
        self.ensure_not_started("noise")?;
        non_negative("noise", eps)?;
        self.params.noise = eps;
        Ok(())
    }

    //-------------------------------------------------------------------------
    //  Accessors
    //-------------------------------------------------------------------------

    pub fn params(&self) -> &NeuronParams {
        &self.params
    }

    pub fn tau(&self) -> f64 {
        self.params.tau
    }

    pub fn vm(&self) -> f64 {
        self.vm
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Spike timestamps in firing order
    pub fn spikes(&self) -> &[f64] {
        &self.spikes
    }

    /// `(time, vm)` samples, one per tick
    pub fn data(&self) -> &[(f64, f64)] {
        &self.data
    }

    /// Write the `(time, vm)` samples as CSV.
    ///
    /// An empty `outfile` writes `<path>.csv` in the current directory.
    pub fn save_data(&self, outfile: &str) -> Result<PathBuf> {
        let target = if outfile.is_empty() {
            PathBuf::from(format!("{}.csv", self.path))
        } else {
            PathBuf::from(outfile)
        };
        self.save_data_to(&target)?;
        Ok(target)
    }

    pub fn save_data_to(&self, target: &Path) -> Result<usize> {
        export::save_samples_csv(target, &self.data, Some("time,vm"))
    }
}

impl Named for Neuron {
    fn path(&self) -> &str {
        &self.path
    }
}

impl PortLayout for Neuron {
    const TYPE_NAME: &'static str = "Neuron";
    const PORTS: &'static [PortSpec] = &[
        PortSpec::input("inject", SignalKind::Current),
        PortSpec::input_many("psc", SignalKind::Current),
        PortSpec::output("vm", SignalKind::Voltage),
        PortSpec::output("spike", SignalKind::Spike),
    ];
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IAF:{}, Em={}, cm={} rm={} tau={}",
            self.path, self.params.em, self.params.cm, self.params.rm, self.params.tau
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1e-4;

    fn relative_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
    }

    fn run(neuron: &mut Neuron, steps: usize, input: NeuronInput) {
        for k in 0..steps {
            neuron.decay(k as f64 * DT, input);
        }
    }

    #[test]
    fn test_tau_invariant_for_both_constructors() {
        let a = Neuron::with_tau("a", 10e-3, -65e-3).unwrap();
        assert!(relative_eq(a.params().tau, a.params().rm * a.params().cm));

        let b = Neuron::with_rc("b", 2e-6, 5e3, -70e-3).unwrap();
        assert!(relative_eq(b.params().tau, 2e-6 * 5e3));
        assert!(relative_eq(b.tau(), b.params().rm * b.params().cm));
    }

    #[test]
    fn test_set_tau_rederives_rm() {
        let mut n = Neuron::with_rc("n", 1e-6, 1e4, -65e-3).unwrap();
        n.set_tau(20e-3).unwrap();
        assert_eq!(n.params().cm, 1e-6);
        assert!(relative_eq(n.params().rm * n.params().cm, 20e-3));
    }

    #[test]
    fn test_zero_elapsed_time_is_noop() {
        let mut n = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();
        let fired = n.decay(0.0, NeuronInput { inject: 1.0, synaptic: 1.0 });
        assert!(!fired);
        assert_eq!(n.vm(), -65e-3);
        assert_eq!(n.data(), &[(0.0, -65e-3)]);
    }

    #[test]
    fn test_leak_only_relaxes_toward_em_without_spikes() {
        let mut n = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();
        n.decay(0.0, NeuronInput::default());
        // Start depolarised, just below threshold
        n.vm = -56e-3;
        let mut previous_distance = (n.vm() - n.params().em).abs();
        for k in 1..2000 {
            assert!(!n.decay(k as f64 * DT, NeuronInput::default()));
            let distance = (n.vm() - n.params().em).abs();
            assert!(distance <= previous_distance);
            previous_distance = distance;
        }
        assert!(n.spikes().is_empty());
        assert!(previous_distance < 1e-6);
    }

    #[test]
    fn test_injection_crosses_threshold_within_one_tau() {
        let mut n = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();
        // Rm × I = 20 mV
        let inject = 20e-3 / n.params().rm;
        run(&mut n, 100, NeuronInput { inject, synaptic: 0.0 });
        let first = n.spikes()[0];
        assert!(first < 10e-3, "first spike at {first}");
        // Analytic crossing: tau × ln(2) ≈ 6.93 ms
        assert!((first - 10e-3 * std::f64::consts::LN_2).abs() < 3.0 * DT);
    }

    #[test]
    fn test_spike_marker_then_reset() {
        let mut n = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();
        let inject = 20e-3 / n.params().rm;
        let mut k = 0;
        loop {
            if n.decay(k as f64 * DT, NeuronInput { inject, synaptic: 0.0 }) {
                break;
            }
            k += 1;
        }
        assert_eq!(n.vm(), SPIKE_MARKER_POTENTIAL);
        assert!(n.fired());

        // Next step snaps to Em before integrating one step of input
        k += 1;
        n.decay(k as f64 * DT, NeuronInput { inject, synaptic: 0.0 });
        assert!(!n.fired());
        let expected = -65e-3 + inject * DT / n.params().cm;
        assert!((n.vm() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_refractory_ignores_input() {
        let params = NeuronParams::from_tau(10e-3, -65e-3).with_refractory(2e-3);
        let mut n = Neuron::new("n", params).unwrap();
        let inject = 40e-3 / n.params().rm;
        let mut k = 0;
        while !n.decay(k as f64 * DT, NeuronInput { inject, synaptic: 0.0 }) {
            k += 1;
        }
        let spike_t = n.spikes()[0];
        // Within the refractory window the membrane sits at Em
        for _ in 0..15 {
            k += 1;
            n.decay(k as f64 * DT, NeuronInput { inject, synaptic: 0.0 });
            assert_eq!(n.vm(), -65e-3);
        }
        assert_eq!(n.spikes().len(), 1);
        assert!(k as f64 * DT - spike_t < 2e-3);
    }

    #[test]
    fn test_synaptic_current_depolarises() {
        let mut n = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();
        n.decay(0.0, NeuronInput::default());
        n.decay(DT, NeuronInput { inject: 0.0, synaptic: 1e-7 });
        let expected = -65e-3 + DT * n.params().rm * 1e-7 / n.tau();
        assert!((n.vm() - expected).abs() < 1e-15);
    }

    #[test]
    fn test_noise_is_reproducible_for_a_seed() {
        let params = NeuronParams::default().with_noise(1e-4);
        let mut a = Neuron::new("a", params).unwrap();
        let mut b = Neuron::new("b", params).unwrap();
        a.set_seed(7).unwrap();
        b.set_seed(7).unwrap();
        run(&mut a, 50, NeuronInput::default());
        run(&mut b, 50, NeuronInput::default());
        assert_eq!(a.data(), b.data());
        assert!(a.data().iter().any(|&(_, vm)| vm != -65e-3));
    }

    #[test]
    fn test_mutators_rejected_after_start() {
        let mut n = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();
        n.set_threshold(-50e-3).unwrap();
        n.decay(0.0, NeuronInput::default());

        assert!(matches!(
            n.set_tau(5e-3),
            Err(TantrikaError::MutationAfterStart { parameter: "tau", .. })
        ));
        assert!(n.set_threshold(-40e-3).is_err());
        assert!(n.set_refractory(1e-3).is_err());
        assert!(n.set_noise(1e-3).is_err());
        assert_eq!(n.params().threshold, -50e-3);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(Neuron::with_tau("n", 0.0, -65e-3).is_err());
        assert!(Neuron::with_rc("n", -1e-6, 1e4, -65e-3).is_err());
        let mut n = Neuron::with_tau("n", 10e-3, -65e-3).unwrap();
        assert!(n.set_noise(-1.0).is_err());
    }

    #[test]
    fn test_repr() {
        let n = Neuron::with_rc("cell", 1e-6, 1e4, -0.065).unwrap();
        assert!(n.to_string().starts_with("IAF:cell, Em=-0.065"));
    }
}
