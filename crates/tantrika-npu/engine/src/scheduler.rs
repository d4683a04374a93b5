// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-period clock and per-tick phase ordering
//!
//! Tick `k` happens at `t = k × dt`, starting from `k = 0`. Every tick runs the phases in
//! [`Phase::ORDER`]; a phase only reads values that earlier phases of the same tick (or the
//! previous tick) have finalised.

use core::fmt;

use tantrika_npu_neural::{Result, TantrikaError};

/// Relative slack when converting a duration into a tick count
pub const TICK_TOLERANCE: f64 = 1e-9;

/// Discrete-time clock with a fixed period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    period: f64,
    tick: u64,
}

impl Clock {
    /// Rejects zero, negative and non-finite periods.
    pub fn new(period: f64) -> Result<Self> {
        if !(period.is_finite() && period > 0.0) {
            return Err(TantrikaError::InvalidClockPeriod(period));
        }
        Ok(Self { period, tick: 0 })
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Index of the next tick to run
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time of the next tick
    pub fn time(&self) -> f64 {
        self.tick as f64 * self.period
    }

    /// Number of ticks covering `duration`: `floor(duration / dt)`.
    pub fn ticks_for(&self, duration: f64) -> Result<u64> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(TantrikaError::InvalidParameter {
                name: "duration",
                value: duration,
                reason: "must be finite and non-negative",
            });
        }
        let ratio = duration / self.period;
        Ok((ratio * (1.0 + TICK_TOLERANCE)).floor() as u64)
    }

    fn next(&mut self) -> Tick {
        let tick = Tick {
            index: self.tick,
            time: self.time(),
        };
        self.tick += 1;
        tick
    }
}

/// One clock event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: u64,
    /// Simulated time (s)
    pub time: f64,
}

/// Update phases of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Neurons integrate the previous tick's currents and raise spike flags
    Integrate,
    /// Synapses consume spike flags and publish currents for the next tick
    Synapse,
    /// Spike generators raise their flags
    Generate,
    /// The recorder consumes the tick's snapshot
    Record,
}

impl Phase {
    pub const ORDER: [Phase; 4] = [Phase::Integrate, Phase::Synapse, Phase::Generate, Phase::Record];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Integrate => "integrate",
            Phase::Synapse => "synapse",
            Phase::Generate => "generate",
            Phase::Record => "record",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receiver of the phase sequence
pub trait TickHandler {
    fn run_phase(&mut self, phase: Phase, tick: Tick) -> Result<()>;
}

/// Drives a [`TickHandler`] through whole ticks
#[derive(Debug, Clone)]
pub struct Scheduler {
    clock: Clock,
}

impl Scheduler {
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Run `floor(duration / dt)` ticks, continuing from the current tick.
    ///
    /// Returns the number of ticks executed.
    pub fn advance<H: TickHandler>(&mut self, duration: f64, handler: &mut H) -> Result<u64> {
        let ticks = self.clock.ticks_for(duration)?;
        for _ in 0..ticks {
            let tick = self.clock.next();
            for phase in Phase::ORDER {
                handler.run_phase(phase, tick)?;
            }
        }
        Ok(ticks)
    }
}
