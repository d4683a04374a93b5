// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network elements as a closed sum type
//!
//! Every element the registry can hold is one variant of [`NetworkElement`]; the type tag
//! ([`ElementType`]) drives "find all of type T" queries.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tantrika_npu_neural::{
    GeneratorSpec, Neuron, NeuronGroup, NeuronParams, PortLayout, PortSpec, SignalKind,
    SignalValue, SpikeGenerator, SpikeGeneratorGroup, Synapse, SynapseGroup, SynapseParams,
    TantrikaError,
};

/// Index of an element in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Element type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Neuron,
    NeuronGroup,
    Synapse,
    SynapseGroup,
    SpikeGenerator,
    SpikeGeneratorGroup,
    Signal,
}

impl ElementType {
    pub const ALL: [ElementType; 7] = [
        ElementType::Neuron,
        ElementType::NeuronGroup,
        ElementType::Synapse,
        ElementType::SynapseGroup,
        ElementType::SpikeGenerator,
        ElementType::SpikeGeneratorGroup,
        ElementType::Signal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Neuron => "Neuron",
            ElementType::NeuronGroup => "NeuronGroup",
            ElementType::Synapse => "Synapse",
            ElementType::SynapseGroup => "SynapseGroup",
            ElementType::SpikeGenerator => "SpikeGenerator",
            ElementType::SpikeGeneratorGroup => "SpikeGeneratorGroup",
            ElementType::Signal => "Signal",
        }
    }

    pub fn is_group(self) -> bool {
        matches!(
            self,
            ElementType::NeuronGroup | ElementType::SynapseGroup | ElementType::SpikeGeneratorGroup
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = TantrikaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TantrikaError::NotImplemented(format!("element type '{}'", s)))
    }
}

/// Network-owned named source, written by the driver between runs
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalSignal {
    path: String,
    kind: SignalKind,
    initial: SignalValue,
}

impl ExternalSignal {
    pub const PORT_OUT: usize = 0;

    pub fn new(path: impl Into<String>, kind: SignalKind, initial: SignalValue) -> Result<Self, TantrikaError> {
        if !initial.fits(kind) {
            return Err(TantrikaError::InvalidParameter {
                name: "initial",
                value: initial.as_f64(),
                reason: "value does not match the signal kind",
            });
        }
        Ok(Self {
            path: path.into(),
            kind,
            initial,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn initial(&self) -> SignalValue {
        self.initial
    }

    pub fn ports(&self) -> &'static [PortSpec] {
        const VOLTAGE: &[PortSpec] = &[PortSpec::output("out", SignalKind::Voltage)];
        const CURRENT: &[PortSpec] = &[PortSpec::output("out", SignalKind::Current)];
        const SPIKE: &[PortSpec] = &[PortSpec::output("out", SignalKind::Spike)];
        match self.kind {
            SignalKind::Voltage => VOLTAGE,
            SignalKind::Current => CURRENT,
            SignalKind::Spike => SPIKE,
        }
    }
}

/// Construction request for [`crate::Assembly::add_element`]
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSpec {
    Neuron(NeuronParams),
    NeuronGroup { size: usize, params: NeuronParams },
    Synapse(SynapseParams),
    SynapseGroup { size: usize, params: SynapseParams },
    SpikeGenerator(GeneratorSpec),
    SpikeGeneratorGroup { size: usize, spec: GeneratorSpec },
    Signal { kind: SignalKind, initial: SignalValue },
}

impl ElementSpec {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementSpec::Neuron(_) => ElementType::Neuron,
            ElementSpec::NeuronGroup { .. } => ElementType::NeuronGroup,
            ElementSpec::Synapse(_) => ElementType::Synapse,
            ElementSpec::SynapseGroup { .. } => ElementType::SynapseGroup,
            ElementSpec::SpikeGenerator(_) => ElementType::SpikeGenerator,
            ElementSpec::SpikeGeneratorGroup { .. } => ElementType::SpikeGeneratorGroup,
            ElementSpec::Signal { .. } => ElementType::Signal,
        }
    }
}

/// An element owned by a network
#[derive(Debug, Clone)]
pub enum NetworkElement {
    Neuron(Neuron),
    NeuronGroup(NeuronGroup),
    Synapse(Synapse),
    SynapseGroup(SynapseGroup),
    SpikeGenerator(SpikeGenerator),
    SpikeGeneratorGroup(SpikeGeneratorGroup),
    Signal(ExternalSignal),
}

impl NetworkElement {
    pub fn element_type(&self) -> ElementType {
        match self {
            NetworkElement::Neuron(_) => ElementType::Neuron,
            NetworkElement::NeuronGroup(_) => ElementType::NeuronGroup,
            NetworkElement::Synapse(_) => ElementType::Synapse,
            NetworkElement::SynapseGroup(_) => ElementType::SynapseGroup,
            NetworkElement::SpikeGenerator(_) => ElementType::SpikeGenerator,
            NetworkElement::SpikeGeneratorGroup(_) => ElementType::SpikeGeneratorGroup,
            NetworkElement::Signal(_) => ElementType::Signal,
        }
    }

    pub fn path(&self) -> &str {
        use tantrika_npu_neural::Named;
        match self {
            NetworkElement::Neuron(n) => n.path(),
            NetworkElement::NeuronGroup(g) => g.path(),
            NetworkElement::Synapse(s) => s.path(),
            NetworkElement::SynapseGroup(g) => g.path(),
            NetworkElement::SpikeGenerator(s) => s.path(),
            NetworkElement::SpikeGeneratorGroup(g) => g.path(),
            NetworkElement::Signal(s) => s.path(),
        }
    }

    /// Number of members (1 for single elements)
    pub fn size(&self) -> usize {
        match self {
            NetworkElement::NeuronGroup(g) => g.len(),
            NetworkElement::SynapseGroup(g) => g.len(),
            NetworkElement::SpikeGeneratorGroup(g) => g.len(),
            _ => 1,
        }
    }

    pub fn is_group(&self) -> bool {
        self.element_type().is_group()
    }

    /// Port table shared by every member
    pub fn ports(&self) -> &'static [PortSpec] {
        match self {
            NetworkElement::Neuron(_) | NetworkElement::NeuronGroup(_) => Neuron::PORTS,
            NetworkElement::Synapse(_) | NetworkElement::SynapseGroup(_) => Synapse::PORTS,
            NetworkElement::SpikeGenerator(_) | NetworkElement::SpikeGeneratorGroup(_) => {
                SpikeGenerator::PORTS
            }
            NetworkElement::Signal(s) => s.ports(),
        }
    }

    /// Path of member `index` (`path[i]` for groups, the plain path otherwise)
    pub fn member_label(&self, index: usize) -> String {
        if self.is_group() {
            tantrika_npu_neural::member_path(self.path(), index)
        } else {
            self.path().to_string()
        }
    }

    pub fn neurons(&self) -> &[Neuron] {
        match self {
            NetworkElement::Neuron(n) => core::slice::from_ref(n),
            NetworkElement::NeuronGroup(g) => g.members(),
            _ => &[],
        }
    }

    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        match self {
            NetworkElement::Neuron(n) => core::slice::from_mut(n),
            NetworkElement::NeuronGroup(g) => g.members_mut(),
            _ => &mut [],
        }
    }

    pub fn synapses(&self) -> &[Synapse] {
        match self {
            NetworkElement::Synapse(s) => core::slice::from_ref(s),
            NetworkElement::SynapseGroup(g) => g.members(),
            _ => &[],
        }
    }

    pub fn synapses_mut(&mut self) -> &mut [Synapse] {
        match self {
            NetworkElement::Synapse(s) => core::slice::from_mut(s),
            NetworkElement::SynapseGroup(g) => g.members_mut(),
            _ => &mut [],
        }
    }

    pub fn generators(&self) -> &[SpikeGenerator] {
        match self {
            NetworkElement::SpikeGenerator(s) => core::slice::from_ref(s),
            NetworkElement::SpikeGeneratorGroup(g) => g.members(),
            _ => &[],
        }
    }

    pub fn generators_mut(&mut self) -> &mut [SpikeGenerator] {
        match self {
            NetworkElement::SpikeGenerator(s) => core::slice::from_mut(s),
            NetworkElement::SpikeGeneratorGroup(g) => g.members_mut(),
            _ => &mut [],
        }
    }

    /// One-line human-readable summary
    pub fn describe(&self) -> String {
        match self {
            NetworkElement::Neuron(n) => n.to_string(),
            NetworkElement::NeuronGroup(g) => {
                let p = g.members()[0].params();
                format!("{} Em={} tau={} threshold={}", g, p.em, p.tau, p.threshold)
            }
            NetworkElement::Synapse(s) => {
                let p = s.params();
                format!(
                    "Synapse:{} kernel={} gbar={} tau={} Esyn={}",
                    self.path(),
                    p.kernel,
                    p.gbar,
                    p.tau,
                    p.esyn
                )
            }
            NetworkElement::SynapseGroup(g) => {
                let p = g.params();
                format!("{} kernel={} gbar={} tau={} Esyn={}", g, p.kernel, p.gbar, p.tau, p.esyn)
            }
            NetworkElement::SpikeGenerator(s) => s.to_string(),
            NetworkElement::SpikeGeneratorGroup(g) => {
                let first = &g.members()[0];
                format!(
                    "{} kind={} rate={} delay={}",
                    g,
                    first.kind(),
                    first.rate(),
                    first.delay()
                )
            }
            NetworkElement::Signal(s) => format!("Signal:{} kind={}", s.path, s.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for t in ElementType::ALL {
            assert_eq!(t.name().parse::<ElementType>().unwrap(), t);
        }
        assert_eq!("neurongroup".parse::<ElementType>().unwrap(), ElementType::NeuronGroup);
        assert!("Dendrite".parse::<ElementType>().unwrap_err().is_not_implemented());
    }

    #[test]
    fn test_member_labels() {
        let group = NetworkElement::NeuronGroup(
            NeuronGroup::neurons("exc", 2, NeuronParams::default()).unwrap(),
        );
        assert_eq!(group.member_label(1), "exc[1]");
        assert_eq!(group.size(), 2);
        assert_eq!(group.neurons().len(), 2);
        assert!(group.synapses().is_empty());

        let single = NetworkElement::Neuron(Neuron::new("n", NeuronParams::default()).unwrap());
        assert_eq!(single.member_label(0), "n");
        assert!(!single.is_group());
    }

    #[test]
    fn test_signal_ports_follow_kind() {
        let sig = ExternalSignal::new("i", SignalKind::Current, SignalValue::Real(0.0)).unwrap();
        assert_eq!(sig.ports()[0].kind, SignalKind::Current);
        assert!(ExternalSignal::new("s", SignalKind::Spike, SignalValue::Real(1.0)).is_err());
    }

    #[test]
    fn test_describe_group() {
        let group = NetworkElement::NeuronGroup(
            NeuronGroup::neurons("exc", 3, NeuronParams::default()).unwrap(),
        );
        assert!(group.describe().starts_with("NeuronGroup:exc size=3"));
    }
}
