// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signals and ports
//!
//! A signal is a named, typed value cell with a single writer (the element owning the
//! output port) and any number of readers (bound input ports). Ports describe which
//! signals an element reads and writes.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Index of a signal in the network's signal table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalId(pub u32);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal#{}", self.0)
    }
}

/// What a signal carries. Bindings are only allowed between ports of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Membrane or driving potential (V)
    Voltage,
    /// Injected or synaptic current (A)
    Current,
    /// Boolean spike flag, true on the tick a spike is raised
    Spike,
}

impl SignalKind {
    pub fn name(self) -> &'static str {
        match self {
            SignalKind::Voltage => "voltage",
            SignalKind::Current => "current",
            SignalKind::Spike => "spike",
        }
    }

    /// Zero value used by default sources.
    pub fn zero(self) -> SignalValue {
        match self {
            SignalKind::Voltage | SignalKind::Current => SignalValue::Real(0.0),
            SignalKind::Spike => SignalValue::Flag(false),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current value of a signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalValue {
    Real(f64),
    Flag(bool),
}

impl SignalValue {
    /// Scalar view used by recording: flags record as 0/1.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            SignalValue::Real(v) => v,
            SignalValue::Flag(true) => 1.0,
            SignalValue::Flag(false) => 0.0,
        }
    }

    #[inline]
    pub fn as_flag(self) -> bool {
        match self {
            SignalValue::Real(v) => v != 0.0,
            SignalValue::Flag(b) => b,
        }
    }

    pub fn fits(self, kind: SignalKind) -> bool {
        matches!(
            (self, kind),
            (SignalValue::Real(_), SignalKind::Voltage | SignalKind::Current)
                | (SignalValue::Flag(_), SignalKind::Spike)
        )
    }
}

/// A named, typed, single-writer value cell
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    name: String,
    kind: SignalKind,
    value: SignalValue,
}

impl Signal {
    pub fn new(name: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: kind.zero(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    #[inline]
    pub fn read(&self) -> SignalValue {
        self.value
    }

    #[inline]
    pub fn read_real(&self) -> f64 {
        self.value.as_f64()
    }

    #[inline]
    pub fn read_flag(&self) -> bool {
        self.value.as_flag()
    }

    /// Overwrite the value. The kind of the cell never changes.
    #[inline]
    pub fn write(&mut self, value: SignalValue) {
        debug_assert!(value.fits(self.kind), "{} written with {:?}", self.name, value);
        self.value = value;
    }
}

/// Port direction relative to the owning element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn name(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

/// How many sources an input port accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// Exactly one source
    Single,
    /// Any number of sources, summed by the reader
    Many,
}

/// Static description of one port of an element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub name: &'static str,
    pub direction: PortDirection,
    pub kind: SignalKind,
    pub multiplicity: Multiplicity,
}

impl PortSpec {
    pub const fn input(name: &'static str, kind: SignalKind) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            kind,
            multiplicity: Multiplicity::Single,
        }
    }

    pub const fn input_many(name: &'static str, kind: SignalKind) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            kind,
            multiplicity: Multiplicity::Many,
        }
    }

    pub const fn output(name: &'static str, kind: SignalKind) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            kind,
            multiplicity: Multiplicity::Single,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }
}

/// Look a port up by name in a port table, returning its ordinal.
pub fn find_port(ports: &[PortSpec], name: &str) -> Option<(usize, PortSpec)> {
    ports
        .iter()
        .enumerate()
        .find(|(_, p)| p.name == name)
        .map(|(i, p)| (i, *p))
}
