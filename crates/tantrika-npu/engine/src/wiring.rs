// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Port binding
//!
//! Every output port of every member owns one signal, allocated when the element is
//! registered. Input ports are bound to those signals either explicitly (`connect`) or,
//! before the simulation starts, to a shared zero-valued default source of the port's kind.
//!
//! A connect request is validated completely before any binding is applied, so a failed
//! request leaves the table exactly as it was.

use core::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tantrika_npu_neural::{
    find_port, Multiplicity, PortDirection, PortSpec, Result, Signal, SignalId, SignalKind,
    TantrikaError,
};
use tracing::debug;

use crate::element::{ElementId, NetworkElement};
use crate::registry::Registry;

/// `path` or `path[index]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub path: &'a str,
    pub index: Option<usize>,
}

impl<'a> Endpoint<'a> {
    pub fn parse(endpoint: &'a str) -> Result<Self> {
        let invalid = || TantrikaError::InvalidPath(endpoint.to_string());
        match endpoint.find('[') {
            None => Ok(Self {
                path: endpoint,
                index: None,
            }),
            Some(open) => {
                let inner = endpoint[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
                let index = inner.parse::<usize>().map_err(|_| invalid())?;
                let path = &endpoint[..open];
                if path.is_empty() {
                    return Err(invalid());
                }
                Ok(Self {
                    path,
                    index: Some(index),
                })
            }
        }
    }
}

/// One input or output port of one member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortAddress {
    pub element: ElementId,
    pub member: usize,
    /// Port ordinal in the element's port table
    pub port: usize,
}

/// How a binding was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingOrigin {
    Explicit,
    /// Attached by [`Wiring::bind_unbound`]
    Default,
}

/// Signal feeding an input port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub source: SignalId,
    pub target: PortAddress,
    pub origin: BindingOrigin,
}

/// Human-readable `path.port` / `path[i].port`
pub fn port_label(registry: &Registry, address: PortAddress) -> String {
    match registry.get(address.element) {
        Some(element) => {
            let port = element
                .ports()
                .get(address.port)
                .map(|p| p.name)
                .unwrap_or("?");
            format!("{}.{}", element.member_label(address.member), port)
        }
        None => format!("{}.{}", address.element, address.port),
    }
}

/// Resolved `endpoint.port`: the element, the addressed members and the port
#[derive(Debug, Clone)]
pub struct ResolvedPort {
    pub element: ElementId,
    pub members: Vec<usize>,
    pub ordinal: usize,
    pub spec: PortSpec,
}

impl ResolvedPort {
    pub fn address(&self, member: usize) -> PortAddress {
        PortAddress {
            element: self.element,
            member,
            port: self.ordinal,
        }
    }
}

/// Resolve an endpoint to an element and the members it addresses.
pub fn resolve_members(registry: &Registry, endpoint: &str) -> Result<(ElementId, Vec<usize>)> {
    let parsed = Endpoint::parse(endpoint)?;
    let id = registry.lookup(parsed.path)?;
    let size = registry.get(id).map(NetworkElement::size).unwrap_or(0);
    match parsed.index {
        Some(index) if index >= size => Err(TantrikaError::IndexOutOfRange {
            path: parsed.path.to_string(),
            index,
            size,
        }),
        Some(index) => Ok((id, vec![index])),
        None => Ok((id, (0..size).collect())),
    }
}

/// Resolve `endpoint.port` and check the port's direction.
pub fn resolve_port(
    registry: &Registry,
    endpoint: &str,
    port: &str,
    direction: PortDirection,
) -> Result<ResolvedPort> {
    let (element, members) = resolve_members(registry, endpoint)?;
    let Some(target) = registry.get(element) else {
        return Err(TantrikaError::UnknownPath(endpoint.to_string()));
    };
    let (ordinal, spec) =
        find_port(target.ports(), port).ok_or_else(|| TantrikaError::UnknownPort {
            path: endpoint.to_string(),
            element_type: target.element_type().name(),
            port: port.to_string(),
        })?;
    if spec.direction != direction {
        return Err(TantrikaError::WrongPortDirection {
            path: endpoint.to_string(),
            port: port.to_string(),
            expected: direction.name(),
            actual: spec.direction.name(),
        });
    }
    Ok(ResolvedPort {
        element,
        members,
        ordinal,
        spec,
    })
}

/// Resolve an endpoint that must address exactly one member.
pub fn resolve_member(
    registry: &Registry,
    endpoint: &str,
    expected: &'static str,
) -> Result<(ElementId, usize)> {
    let (id, members) = resolve_members(registry, endpoint)?;
    match members.as_slice() {
        [member] => Ok((id, *member)),
        _ => Err(TantrikaError::WrongElementType {
            path: endpoint.to_string(),
            expected,
            actual: registry
                .get(id)
                .map(|e| e.element_type().name())
                .unwrap_or("?"),
        }),
    }
}

/// Typed access to one member, e.g. `member(registry, "exc[3]", "Neuron", NetworkElement::neurons)`.
pub fn member<'a, T>(
    registry: &'a Registry,
    endpoint: &str,
    expected: &'static str,
    select: fn(&NetworkElement) -> &[T],
) -> Result<&'a T> {
    let (id, index) = resolve_member(registry, endpoint, expected)?;
    let element = registry
        .get(id)
        .ok_or_else(|| TantrikaError::UnknownPath(endpoint.to_string()))?;
    select(element)
        .get(index)
        .ok_or_else(|| TantrikaError::WrongElementType {
            path: endpoint.to_string(),
            expected,
            actual: element.element_type().name(),
        })
}

/// Mutable counterpart of [`member`]
pub fn member_mut<'a, T>(
    registry: &'a mut Registry,
    endpoint: &str,
    expected: &'static str,
    select: fn(&mut NetworkElement) -> &mut [T],
) -> Result<&'a mut T> {
    let (id, index) = resolve_member(registry, endpoint, expected)?;
    let element = registry
        .get_mut(id)
        .ok_or_else(|| TantrikaError::UnknownPath(endpoint.to_string()))?;
    let actual = element.element_type().name();
    select(element)
        .get_mut(index)
        .ok_or_else(|| TantrikaError::WrongElementType {
            path: endpoint.to_string(),
            expected,
            actual,
        })
}

/// A validated binding waiting to be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedBinding {
    pub source: SignalId,
    pub target: PortAddress,
    pub multiplicity: Multiplicity,
}

/// Signal table plus binding table
#[derive(Debug, Clone, Default)]
pub struct Wiring {
    signals: Vec<Signal>,
    outputs: AHashMap<PortAddress, SignalId>,
    bindings: Vec<Binding>,
    by_target: AHashMap<PortAddress, Vec<usize>>,
    defaults: AHashMap<SignalKind, SignalId>,
}

impl Wiring {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, name: String, kind: SignalKind) -> SignalId {
        let id = SignalId(self.signals.len() as u32);
        self.signals.push(Signal::new(name, kind));
        id
    }

    /// Allocate the output signals of a newly registered element.
    pub fn register_outputs(&mut self, id: ElementId, element: &NetworkElement) {
        for member in 0..element.size() {
            let label = element.member_label(member);
            for (ordinal, spec) in element.ports().iter().enumerate() {
                if spec.is_input() {
                    continue;
                }
                let signal = self.allocate(format!("{}.{}", label, spec.name), spec.kind);
                if let NetworkElement::Signal(external) = element {
                    self.signals[signal.0 as usize].write(external.initial());
                }
                self.outputs.insert(
                    PortAddress {
                        element: id,
                        member,
                        port: ordinal,
                    },
                    signal,
                );
            }
        }
    }

    pub fn output_signal(&self, address: PortAddress) -> Option<SignalId> {
        self.outputs.get(&address).copied()
    }

    pub fn signal(&self, id: SignalId) -> Option<&Signal> {
        self.signals.get(id.0 as usize)
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// All bindings in the order they were made
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Bindings feeding one input port
    pub fn bindings_for(&self, target: PortAddress) -> impl Iterator<Item = &Binding> {
        self.by_target
            .get(&target)
            .into_iter()
            .flatten()
            .map(|&i| &self.bindings[i])
    }

    pub fn is_bound(&self, target: PortAddress) -> bool {
        self.by_target.get(&target).is_some_and(|v| !v.is_empty())
    }

    /// Pair up source and target members of a connect request and validate every pair.
    ///
    /// Equal sizes bind member-wise; a single source fans out to every target member; many
    /// sources may only fan in to a `Many` port of a single target.
    pub fn plan(
        &self,
        registry: &Registry,
        source: &ResolvedPort,
        target: &ResolvedPort,
        pending: &[PlannedBinding],
    ) -> Result<Vec<PlannedBinding>> {
        if source.spec.kind != target.spec.kind {
            return Err(TantrikaError::PortKindMismatch {
                source_port: port_label(registry, source.address(source.members[0])),
                source_kind: source.spec.kind.name(),
                target_port: port_label(registry, target.address(target.members[0])),
                target_kind: target.spec.kind.name(),
            });
        }

        let (n, m) = (source.members.len(), target.members.len());
        let pairs: Vec<(usize, usize)> = if n == m {
            source.members.iter().copied().zip(target.members.iter().copied()).collect()
        } else if n == 1 {
            target.members.iter().map(|&t| (source.members[0], t)).collect()
        } else if m == 1 && target.spec.multiplicity == Multiplicity::Many {
            source.members.iter().map(|&s| (s, target.members[0])).collect()
        } else {
            let path_of = |id: ElementId| {
                registry
                    .get(id)
                    .map(|e| e.path().to_string())
                    .unwrap_or_default()
            };
            return Err(TantrikaError::GroupSizeMismatch {
                source_path: path_of(source.element),
                source_size: n,
                target_path: path_of(target.element),
                target_size: m,
            });
        };

        let mut planned = Vec::with_capacity(pairs.len());
        for (s, t) in pairs {
            let source_address = source.address(s);
            let signal = self.output_signal(source_address).ok_or_else(|| {
                TantrikaError::UnknownPort {
                    path: port_label(registry, source_address),
                    element_type: registry
                        .get(source.element)
                        .map(|e| e.element_type().name())
                        .unwrap_or("?"),
                    port: source.spec.name.to_string(),
                }
            })?;
            let candidate = PlannedBinding {
                source: signal,
                target: target.address(t),
                multiplicity: target.spec.multiplicity,
            };
            self.check(registry, &candidate, pending.iter().chain(planned.iter()))?;
            planned.push(candidate);
        }
        Ok(planned)
    }

    fn check<'a>(
        &self,
        registry: &Registry,
        candidate: &PlannedBinding,
        pending: impl Iterator<Item = &'a PlannedBinding>,
    ) -> Result<()> {
        let explicit: Vec<SignalId> = self
            .bindings_for(candidate.target)
            .filter(|b| b.origin == BindingOrigin::Explicit)
            .map(|b| b.source)
            .chain(
                pending
                    .filter(|p| p.target == candidate.target)
                    .map(|p| p.source),
            )
            .collect();

        match candidate.multiplicity {
            Multiplicity::Single if !explicit.is_empty() => Err(TantrikaError::PortAlreadyBound(
                port_label(registry, candidate.target),
            )),
            Multiplicity::Many if explicit.contains(&candidate.source) => {
                Err(TantrikaError::DuplicateBinding {
                    source_signal: self
                        .signal(candidate.source)
                        .map(|s| s.name().to_string())
                        .unwrap_or_else(|| candidate.source.to_string()),
                    target: port_label(registry, candidate.target),
                })
            }
            _ => Ok(()),
        }
    }

    /// Apply validated bindings. An explicit binding takes the place of a default one.
    pub fn apply(&mut self, registry: &Registry, planned: &[PlannedBinding]) {
        for p in planned {
            let binding = Binding {
                source: p.source,
                target: p.target,
                origin: BindingOrigin::Explicit,
            };
            let replaced = self
                .by_target
                .get(&p.target)
                .and_then(|slots| {
                    slots
                        .iter()
                        .copied()
                        .find(|&i| self.bindings[i].origin == BindingOrigin::Default)
                });
            match replaced {
                Some(index) => self.bindings[index] = binding,
                None => self.push(binding),
            }
            debug!(
                source = %self.signal(p.source).map(Signal::name).unwrap_or("?"),
                target = %port_label(registry, p.target),
                "Bound port"
            );
        }
    }

    fn push(&mut self, binding: Binding) {
        let index = self.bindings.len();
        self.bindings.push(binding);
        self.by_target.entry(binding.target).or_default().push(index);
    }

    /// Shared zero-valued source of a kind, allocated on first use
    pub fn default_source(&mut self, kind: SignalKind) -> SignalId {
        if let Some(&id) = self.defaults.get(&kind) {
            return id;
        }
        let id = self.allocate(format!("default.{}", kind.name()), kind);
        self.defaults.insert(kind, id);
        id
    }

    /// Attach a default source to every input port that has no binding yet.
    ///
    /// Returns the number of ports bound; a second call returns 0.
    pub fn bind_unbound(&mut self, registry: &Registry) -> usize {
        let mut bound = 0;
        for (id, element) in registry.iter() {
            for member in 0..element.size() {
                for (ordinal, spec) in element.ports().iter().enumerate() {
                    if !spec.is_input() {
                        continue;
                    }
                    let target = PortAddress {
                        element: id,
                        member,
                        port: ordinal,
                    };
                    if self.is_bound(target) {
                        continue;
                    }
                    let source = self.default_source(spec.kind);
                    self.push(Binding {
                        source,
                        target,
                        origin: BindingOrigin::Default,
                    });
                    bound += 1;
                }
            }
        }
        bound
    }

    /// Hand the tables over to a runnable network.
    pub fn into_parts(self) -> (Vec<Signal>, AHashMap<PortAddress, SignalId>, Vec<Binding>) {
        (self.signals, self.outputs, self.bindings)
    }
}

impl fmt::Display for BindingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingOrigin::Explicit => f.write_str("explicit"),
            BindingOrigin::Default => f.write_str("default"),
        }
    }
}
