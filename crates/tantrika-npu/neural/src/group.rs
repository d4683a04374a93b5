// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Homogeneous element groups
//!
//! A group holds `size` members of one element type built from the same construction
//! parameters. Member `i` is named `"{path}[{i}]"` and keeps its own state.

use core::fmt;

use crate::generator::{GeneratorSpec, SpikeGenerator};
use crate::models::iaf::{Neuron, NeuronParams};
use crate::models::traits::{Named, PortLayout};
use crate::synapse::{Synapse, SynapseParams};
use crate::types::{Result, TantrikaError};

/// Path of member `index` in the group at `path`
pub fn member_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

#[derive(Debug, Clone)]
pub struct Group<T> {
    path: String,
    members: Vec<T>,
}

pub type NeuronGroup = Group<Neuron>;
pub type SynapseGroup = Group<Synapse>;
pub type SpikeGeneratorGroup = Group<SpikeGenerator>;

impl<T> Group<T> {
    /// Build `size` members with `make(member_path, index)`.
    pub fn from_fn<F>(path: impl Into<String>, size: usize, mut make: F) -> Result<Self>
    where
        F: FnMut(String, usize) -> Result<T>,
    {
        if size == 0 {
            return Err(TantrikaError::InvalidParameter {
                name: "size",
                value: 0.0,
                reason: "a group needs at least one member",
            });
        }
        let path = path.into();
        let members = (0..size)
            .map(|i| make(member_path(&path, i), i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { path, members })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.members.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.members.get_mut(index)
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut [T] {
        &mut self.members
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.members.iter()
    }
}

impl Group<Neuron> {
    pub fn neurons(path: impl Into<String>, size: usize, params: NeuronParams) -> Result<Self> {
        Self::from_fn(path, size, |member, _| Neuron::new(member, params))
    }
}

impl Group<Synapse> {
    /// All members share `params` and keep independent kernel state.
    pub fn synapses(path: impl Into<String>, size: usize, params: SynapseParams) -> Result<Self> {
        Self::from_fn(path, size, |member, _| Synapse::new(member, params))
    }

    pub fn params(&self) -> &SynapseParams {
        // Groups are never empty
        self.members[0].params()
    }
}

impl Group<SpikeGenerator> {
    /// Member `i` is seeded with `seed_for(i)`.
    pub fn generators<S>(
        path: impl Into<String>,
        size: usize,
        spec: GeneratorSpec,
        seed_for: S,
    ) -> Result<Self>
    where
        S: Fn(usize) -> u64,
    {
        spec.validate()?;
        Self::from_fn(path, size, |member, i| spec.build(member, seed_for(i)))
    }
}

impl<T: Named> Named for Group<T> {
    fn path(&self) -> &str {
        &self.path
    }
}

impl<T: PortLayout> fmt::Display for Group<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Group:{} size={}", T::TYPE_NAME, self.path, self.members.len())
    }
}

impl<'a, T> IntoIterator for &'a Group<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
