//! Elements and the ordered element table.

use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshEquivError;
use crate::topology::cell_type::CellType;
use crate::topology::point::{ElementId, PointId, PropertyId};

/// A single element: type tag plus its ordered vertex references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub cell_type: CellType,
    /// Ordered node references; order defines orientation.
    pub nodes: Vec<PointId>,
    pub property: Option<PropertyId>,
}

impl Element {
    /// Build an element, checking the vertex count against the type tag.
    pub fn try_new(
        id: ElementId,
        cell_type: CellType,
        nodes: Vec<PointId>,
    ) -> Result<Self, MeshEquivError> {
        let element = Self {
            id,
            cell_type,
            nodes,
            property: None,
        };
        element.check_vertex_count()?;
        Ok(element)
    }

    /// Attach a property reference.
    #[must_use]
    pub fn with_property(mut self, property: PropertyId) -> Self {
        self.property = Some(property);
        self
    }

    /// `true` if any node id appears more than once in the vertex list.
    pub fn has_repeated_nodes(&self) -> bool {
        !self.nodes.iter().all_unique()
    }

    pub(crate) fn check_vertex_count(&self) -> Result<(), MeshEquivError> {
        let expected = self.cell_type.vertex_count();
        if self.nodes.len() != expected {
            return Err(MeshEquivError::VertexCountMismatch {
                element: self.id,
                cell_type: self.cell_type,
                expected,
                found: self.nodes.len(),
            });
        }
        Ok(())
    }
}

/// Element table keyed by id, iterated in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ElementTable {
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Build a table from elements, rejecting duplicate ids and bad vertex counts.
    pub fn try_from_elements<I>(elements: I) -> Result<Self, MeshEquivError>
    where
        I: IntoIterator<Item = Element>,
    {
        let mut table = Self::new();
        for element in elements {
            table.try_insert(element)?;
        }
        Ok(table)
    }

    /// Append an element.
    pub fn try_insert(&mut self, element: Element) -> Result<(), MeshEquivError> {
        element.check_vertex_count()?;
        if self.index.contains_key(&element.id) {
            return Err(MeshEquivError::DuplicateElement(element.id));
        }
        self.index.insert(element.id, self.elements.len());
        self.elements.push(element);
        Ok(())
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Element ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().map(|e| e.id)
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<Element> {
        self.elements
    }
}

impl PartialEq for ElementTable {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<'a> IntoIterator for &'a ElementTable {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl DebugInvariants for ElementTable {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "ElementTable");
    }

    fn validate_invariants(&self) -> Result<(), MeshEquivError> {
        if self.index.len() != self.elements.len() {
            return Err(MeshEquivError::InvalidPermutation(format!(
                "element index holds {} ids for {} elements",
                self.index.len(),
                self.elements.len()
            )));
        }
        for (pos, element) in self.elements.iter().enumerate() {
            if self.index.get(&element.id) != Some(&pos) {
                return Err(MeshEquivError::DuplicateElement(element.id));
            }
            element.check_vertex_count()?;
        }
        Ok(())
    }
}
