//! In-memory finite-element model: the subset of a deck the mesh utilities touch.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::data::coordinates::Coordinates;
use crate::mesh_error::MeshEquivError;
use crate::topology::element::ElementTable;
use crate::topology::point::{EntityKind, MaterialId, PropertyId};

/// A property card; only the material reference matters for renumbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub material: Option<MaterialId>,
}

/// Nodes, elements, properties and materials of one model.
///
/// Fields are public like a parsed deck; call [`MeshModel::validate`] after
/// editing them by hand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshModel {
    pub coordinates: Coordinates,
    pub elements: ElementTable,
    /// Property cards in deck order.
    pub properties: Vec<Property>,
    /// Material ids in deck order.
    pub materials: Vec<MaterialId>,
}

impl MeshModel {
    pub fn new(coordinates: Coordinates, elements: ElementTable) -> Self {
        Self {
            coordinates,
            elements,
            properties: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Check cross references: element → node, element → property,
    /// property → material, and id uniqueness of properties and materials.
    pub fn validate(&self) -> Result<(), MeshEquivError> {
        let mut materials = HashSet::with_capacity(self.materials.len());
        for &mid in &self.materials {
            if !materials.insert(mid) {
                return Err(MeshEquivError::IdCollision {
                    kind: EntityKind::Material,
                    id: mid.get(),
                });
            }
        }

        let mut properties = HashSet::with_capacity(self.properties.len());
        for prop in &self.properties {
            if !properties.insert(prop.id) {
                return Err(MeshEquivError::IdCollision {
                    kind: EntityKind::Property,
                    id: prop.id.get(),
                });
            }
            if let Some(mid) = prop.material {
                if !materials.contains(&mid) {
                    return Err(MeshEquivError::UnknownMaterial {
                        property: prop.id,
                        material: mid,
                    });
                }
            }
        }

        for element in &self.elements {
            for &node in &element.nodes {
                if !self.coordinates.contains(node) {
                    return Err(MeshEquivError::UnknownNode {
                        element: element.id,
                        node,
                    });
                }
            }
            if let Some(pid) = element.property {
                if !properties.contains(&pid) {
                    return Err(MeshEquivError::UnknownProperty {
                        element: element.id,
                        property: pid,
                    });
                }
            }
        }
        Ok(())
    }
}
