// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Element registry
//!
//! Elements are stored in registration order. A path index and a type index are
//! maintained on insertion; neither is ever rebuilt.

use ahash::AHashMap;
use tantrika_npu_neural::{Result, TantrikaError};

use crate::element::{ElementId, ElementType, NetworkElement};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    elements: Vec<NetworkElement>,
    by_path: AHashMap<String, ElementId>,
    by_type: AHashMap<ElementType, Vec<ElementId>>,
}

/// Element paths must be non-empty and free of the characters used for member and port
/// addressing.
pub fn validate_path(path: &str) -> Result<()> {
    let bad = path.is_empty()
        || path
            .chars()
            .any(|c| c == '[' || c == ']' || c == '.' || c.is_whitespace());
    if bad {
        return Err(TantrikaError::InvalidPath(path.to_string()));
    }
    Ok(())
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element under its path. Duplicate paths are rejected across all types.
    pub fn insert(&mut self, element: NetworkElement) -> Result<ElementId> {
        let path = element.path().to_string();
        validate_path(&path)?;
        if self.by_path.contains_key(&path) {
            return Err(TantrikaError::DuplicatePath(path));
        }
        let id = ElementId(self.elements.len());
        self.by_type.entry(element.element_type()).or_default().push(id);
        self.by_path.insert(path, id);
        self.elements.push(element);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Id of the element at `path`
    pub fn lookup(&self, path: &str) -> Result<ElementId> {
        self.by_path
            .get(path)
            .copied()
            .ok_or_else(|| TantrikaError::UnknownPath(path.to_string()))
    }

    pub fn get(&self, id: ElementId) -> Option<&NetworkElement> {
        self.elements.get(id.0)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut NetworkElement> {
        self.elements.get_mut(id.0)
    }

    /// Element (single or group) registered under `path`
    pub fn find_group(&self, path: &str) -> Result<&NetworkElement> {
        let id = self.lookup(path)?;
        Ok(&self.elements[id.0])
    }

    pub fn find_group_mut(&mut self, path: &str) -> Result<&mut NetworkElement> {
        let id = self.lookup(path)?;
        Ok(&mut self.elements[id.0])
    }

    /// All elements of one type, in registration order
    pub fn find_elements_by_type(&self, element_type: ElementType) -> Vec<&NetworkElement> {
        self.ids_of_type(element_type)
            .iter()
            .map(|id| &self.elements[id.0])
            .collect()
    }

    pub fn ids_of_type(&self, element_type: ElementType) -> &[ElementId] {
        self.by_type
            .get(&element_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &NetworkElement)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId(i), e))
    }

    /// Mutable access for the simulation loop. Paths and types cannot change through it.
    pub fn elements_mut(&mut self) -> &mut [NetworkElement] {
        &mut self.elements
    }

    pub fn elements(&self) -> &[NetworkElement] {
        &self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantrika_npu_neural::{Neuron, NeuronGroup, NeuronParams, SpikeGenerator};

    fn neuron(path: &str) -> NetworkElement {
        NetworkElement::Neuron(Neuron::new(path, NeuronParams::default()).unwrap())
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut registry = Registry::new();
        let a = registry.insert(neuron("a")).unwrap();
        let b = registry.insert(neuron("b")).unwrap();
        assert_eq!(a, ElementId(0));
        assert_eq!(registry.lookup("b").unwrap(), b);
        assert_eq!(registry.find_group("a").unwrap().path(), "a");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_path_rejected_across_types() {
        let mut registry = Registry::new();
        registry.insert(neuron("x")).unwrap();
        let generator = SpikeGenerator::periodic("x", 1e-3, 0.0).unwrap();
        let err = registry
            .insert(NetworkElement::SpikeGenerator(generator))
            .unwrap_err();
        assert!(matches!(err, TantrikaError::DuplicatePath(p) if p == "x"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_path_is_an_error() {
        let registry = Registry::new();
        assert!(matches!(
            registry.find_group("ghost"),
            Err(TantrikaError::UnknownPath(_))
        ));
    }

    #[test]
    fn test_invalid_paths() {
        for path in ["", "a[0]", "a.b", "a b"] {
            assert!(validate_path(path).is_err(), "{:?}", path);
        }
        assert!(validate_path("layer_1-exc").is_ok());
    }

    #[test]
    fn test_find_by_type_keeps_registration_order() {
        let mut registry = Registry::new();
        registry.insert(neuron("n1")).unwrap();
        registry
            .insert(NetworkElement::NeuronGroup(
                NeuronGroup::neurons("g", 2, NeuronParams::default()).unwrap(),
            ))
            .unwrap();
        registry.insert(neuron("n2")).unwrap();

        let found: Vec<&str> = registry
            .find_elements_by_type(ElementType::Neuron)
            .iter()
            .map(|e| e.path())
            .collect();
        assert_eq!(found, vec!["n1", "n2"]);
        assert_eq!(registry.find_elements_by_type(ElementType::NeuronGroup).len(), 1);
        assert!(registry.find_elements_by_type(ElementType::Synapse).is_empty());
    }
}
