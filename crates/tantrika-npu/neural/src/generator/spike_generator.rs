// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Exogenous spike sources
//!
//! Both variants expose the same `next_spike_time` / `advance_if_due` contract so a network
//! can drive mixed generator groups uniformly.

use core::fmt;
use core::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::iaf::{finite, non_negative, positive};
use crate::models::traits::{Named, PortLayout};
use crate::types::{PortSpec, Result, SignalKind, TantrikaError};

/// Absolute tolerance when comparing a due time against the clock
pub const TIME_TOLERANCE: f64 = 1e-12;

/// Generator variant tag, parsed from the string-typed construction API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpikeGeneratorKind {
    Periodic,
    Poisson,
}

impl SpikeGeneratorKind {
    pub fn name(self) -> &'static str {
        match self {
            SpikeGeneratorKind::Periodic => "periodic",
            SpikeGeneratorKind::Poisson => "poisson",
        }
    }
}

impl fmt::Display for SpikeGeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpikeGeneratorKind {
    type Err = TantrikaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "periodic" => Ok(SpikeGeneratorKind::Periodic),
            "poisson" => Ok(SpikeGeneratorKind::Poisson),
            other => Err(TantrikaError::NotImplemented(format!(
                "spike generator '{}'",
                other
            ))),
        }
    }
}

/// Construction parameters of one generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeneratorSpec {
    /// Spikes at `delay + k × period`
    Periodic { period: f64, delay: f64 },
    /// Exponential inter-spike intervals with rate `lambda` (Hz), starting at `delay`
    Poisson { lambda: f64, delay: f64 },
}

impl GeneratorSpec {
    /// Build a spec from a variant tag and its rate parameter (`period` for periodic,
    /// `lambda` for Poisson).
    pub fn from_kind(kind: SpikeGeneratorKind, rate: f64, delay: f64) -> Self {
        match kind {
            SpikeGeneratorKind::Periodic => GeneratorSpec::Periodic {
                period: rate,
                delay,
            },
            SpikeGeneratorKind::Poisson => GeneratorSpec::Poisson {
                lambda: rate,
                delay,
            },
        }
    }

    pub fn kind(&self) -> SpikeGeneratorKind {
        match self {
            GeneratorSpec::Periodic { .. } => SpikeGeneratorKind::Periodic,
            GeneratorSpec::Poisson { .. } => SpikeGeneratorKind::Poisson,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            GeneratorSpec::Periodic { period, delay } => {
                positive("period", period)?;
                non_negative("delay", delay)?;
            }
            GeneratorSpec::Poisson { lambda, delay } => {
                non_negative("lambda", lambda)?;
                finite("lambda", lambda)?;
                non_negative("delay", delay)?;
            }
        }
        Ok(())
    }

    /// Construct a generator. `seed` only affects Poisson generators.
    pub fn build(&self, path: impl Into<String>, seed: u64) -> Result<SpikeGenerator> {
        match *self {
            GeneratorSpec::Periodic { period, delay } => SpikeGenerator::periodic(path, period, delay),
            GeneratorSpec::Poisson { lambda, delay } => {
                SpikeGenerator::poisson(path, lambda, delay, seed)
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Schedule {
    Periodic { period: f64, emitted: u64 },
    Poisson { lambda: f64, seed: u64, rng: StdRng },
}

/// Spike generator (periodic or Poisson)
#[derive(Debug, Clone)]
pub struct SpikeGenerator {
    path: String,
    delay: f64,
    schedule: Schedule,
    next: f64,
    started: bool,
    spikes: Vec<f64>,
}

impl SpikeGenerator {
    pub const PORT_SPIKE: usize = 0;

    pub fn periodic(path: impl Into<String>, period: f64, delay: f64) -> Result<Self> {
        GeneratorSpec::Periodic { period, delay }.validate()?;
        Ok(Self {
            path: path.into(),
            delay,
            schedule: Schedule::Periodic { period, emitted: 0 },
            next: delay,
            started: false,
            spikes: Vec::new(),
        })
    }

    pub fn poisson(path: impl Into<String>, lambda: f64, delay: f64, seed: u64) -> Result<Self> {
        GeneratorSpec::Poisson { lambda, delay }.validate()?;
        let mut generator = Self {
            path: path.into(),
            delay,
            schedule: Schedule::Poisson {
                lambda,
                seed,
                rng: StdRng::seed_from_u64(seed),
            },
            next: f64::INFINITY,
            started: false,
            spikes: Vec::new(),
        };
        generator.reschedule_first();
        Ok(generator)
    }

    pub fn kind(&self) -> SpikeGeneratorKind {
        match self.schedule {
            Schedule::Periodic { .. } => SpikeGeneratorKind::Periodic,
            Schedule::Poisson { .. } => SpikeGeneratorKind::Poisson,
        }
    }

    /// Time of the next scheduled spike (`INFINITY` for a silent Poisson source)
    pub fn next_spike_time(&self) -> f64 {
        self.next
    }

    /// Emit every spike due at or before `now`, returning how many were emitted.
    pub fn advance_if_due(&mut self, now: f64) -> u32 {
        self.started = true;
        let mut emitted = 0;
        while self.next <= now + TIME_TOLERANCE {
            self.spikes.push(self.next);
            emitted += 1;
            self.schedule_next();
        }
        emitted
    }

    fn schedule_next(&mut self) {
        match &mut self.schedule {
            Schedule::Periodic { period, emitted } => {
                *emitted += 1;
                self.next = self.delay + (*emitted as f64) * *period;
            }
            Schedule::Poisson { lambda, rng, .. } => {
                self.next += exponential_interval(rng, *lambda);
            }
        }
    }

    fn reschedule_first(&mut self) {
        match &mut self.schedule {
            Schedule::Periodic { emitted, .. } => {
                *emitted = 0;
                self.next = self.delay;
            }
            Schedule::Poisson { lambda, seed, rng } => {
                *rng = StdRng::seed_from_u64(*seed);
                self.next = self.delay + exponential_interval(rng, *lambda);
            }
        }
    }

    /// Change the start delay. Only valid before the first tick.
    pub fn set_delay(&mut self, delay: f64) -> Result<()> {
        self.ensure_not_started("delay")?;
        non_negative("delay", delay)?;
        self.delay = delay;
        self.reschedule_first();
        Ok(())
    }

    /// Reseed a Poisson generator; periodic generators ignore the seed.
    pub fn set_seed(&mut self, new_seed: u64) -> Result<()> {
        self.ensure_not_started("seed")?;
        if let Schedule::Poisson { seed, .. } = &mut self.schedule {
            *seed = new_seed;
        }
        self.reschedule_first();
        Ok(())
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

    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Rate parameter: the period for periodic sources, lambda for Poisson ones
    pub fn rate(&self) -> f64 {
        match self.schedule {
            Schedule::Periodic { period, .. } => period,
            Schedule::Poisson { lambda, .. } => lambda,
        }
    }

    /// Emitted spike times in order
    pub fn spikes(&self) -> &[f64] {
        &self.spikes
    }
}

/// Inverse-CDF exponential draw; a zero rate never fires.
fn exponential_interval(rng: &mut StdRng, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return f64::INFINITY;
    }
    let u: f64 = rng.gen();
    -(1.0 - u).ln() / lambda
}

impl Named for SpikeGenerator {
    fn path(&self) -> &str {
        &self.path
    }
}

impl PortLayout for SpikeGenerator {
    const TYPE_NAME: &'static str = "SpikeGenerator";
    const PORTS: &'static [PortSpec] = &[PortSpec::output("spike", SignalKind::Spike)];
}

impl fmt::Display for SpikeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.schedule {
            Schedule::Periodic { period, .. } => write!(
                f,
                "SpikeGenerator:{} periodic period={} delay={}",
                self.path, period, self.delay
            ),
            Schedule::Poisson { lambda, .. } => write!(
                f,
                "SpikeGenerator:{} poisson lambda={} delay={}",
                self.path, lambda, self.delay
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(generator: &mut SpikeGenerator, dt: f64, ticks: u64) {
        for k in 0..ticks {
            generator.advance_if_due(k as f64 * dt);
        }
    }

    #[test]
    fn test_periodic_times_are_exact() {
        let mut generator = SpikeGenerator::periodic("g", 5.0, 2.0).unwrap();
        assert_eq!(generator.next_spike_time(), 2.0);
        drive(&mut generator, 1.0, 18);
        assert_eq!(generator.spikes(), &[2.0, 7.0, 12.0, 17.0]);
        assert_eq!(generator.next_spike_time(), 22.0);
    }

    #[test]
    fn test_periodic_catches_up_on_coarse_clock() {
        let mut generator = SpikeGenerator::periodic("g", 1e-3, 0.0).unwrap();
        assert_eq!(generator.advance_if_due(0.0), 1);
        assert_eq!(generator.advance_if_due(3.5e-3), 3);
        assert_eq!(generator.spikes().len(), 4);
    }

    #[test]
    fn test_periodic_due_within_tolerance() {
        // 0.1 + 0.2 lands one ulp above 0.3
        let mut generator = SpikeGenerator::periodic("g", 0.1 + 0.2, 0.0).unwrap();
        generator.advance_if_due(0.0);
        assert_eq!(generator.advance_if_due(0.3), 1);
    }

    #[test]
    fn test_poisson_respects_delay_and_is_monotonic() {
        let mut generator = SpikeGenerator::poisson("p", 200.0, 0.05, 42).unwrap();
        assert!(generator.next_spike_time() >= 0.05);
        drive(&mut generator, 1e-4, 10_000);
        let spikes = generator.spikes();
        assert!(!spikes.is_empty());
        assert!(spikes.iter().all(|&t| t >= 0.05));
        assert!(spikes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_poisson_mean_count_matches_rate() {
        let lambda = 50.0;
        let seconds = 2.0;
        let runs = 40;
        let mut total = 0usize;
        for seed in 0..runs {
            let mut generator = SpikeGenerator::poisson("p", lambda, 0.0, seed).unwrap();
            total += generator.advance_if_due(seconds) as usize;
        }
        let mean = total as f64 / runs as f64;
        let expected = lambda * seconds;
        // Standard error of the mean is sqrt(100 / 40) ~ 1.6
        assert!((mean - expected).abs() < 8.0, "mean {} vs {}", mean, expected);
    }

    #[test]
    fn test_poisson_same_seed_same_train() {
        let mut a = SpikeGenerator::poisson("a", 100.0, 0.0, 9).unwrap();
        let mut b = SpikeGenerator::poisson("b", 100.0, 0.0, 9).unwrap();
        a.advance_if_due(1.0);
        b.advance_if_due(1.0);
        assert_eq!(a.spikes(), b.spikes());
    }

    #[test]
    fn test_zero_rate_poisson_is_silent() {
        let mut generator = SpikeGenerator::poisson("p", 0.0, 0.0, 1).unwrap();
        assert!(generator.next_spike_time().is_infinite());
        assert_eq!(generator.advance_if_due(100.0), 0);
    }

    #[test]
    fn test_set_delay_only_before_start() {
        let mut generator = SpikeGenerator::periodic("g", 1.0, 0.0).unwrap();
        generator.set_delay(3.0).unwrap();
        assert_eq!(generator.next_spike_time(), 3.0);
        generator.advance_if_due(0.0);
        assert!(matches!(
            generator.set_delay(1.0),
            Err(TantrikaError::MutationAfterStart { .. })
        ));
    }

    #[test]
    fn test_unknown_kinds_not_implemented() {
        assert_eq!(
            "Poisson".parse::<SpikeGeneratorKind>().unwrap(),
            SpikeGeneratorKind::Poisson
        );
        for name in ["gamma", "bursting", "regular-ish"] {
            let err = name.parse::<SpikeGeneratorKind>().unwrap_err();
            assert!(err.is_not_implemented(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SpikeGenerator::periodic("g", 0.0, 0.0).is_err());
        assert!(SpikeGenerator::periodic("g", 1.0, -1.0).is_err());
        assert!(SpikeGenerator::poisson("g", -5.0, 0.0, 0).is_err());
    }
}
