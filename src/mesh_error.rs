//! MeshEquivError: Unified error type for mesh-equiv public APIs
//!
//! Every fallible operation in the crate returns this error so callers can
//! propagate failures with `?` instead of panicking on malformed decks.

use thiserror::Error;

use crate::algs::remap::DegenerateElement;
use crate::topology::cell_type::CellType;
use crate::topology::point::{ElementId, EntityKind, MaterialId, PointId, PropertyId};

/// Unified error type for mesh-equiv operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshEquivError {
    /// Attempted to construct an identifier with a zero value.
    #[error("{0} id must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidId(EntityKind),
    /// A node id appears twice in one coordinate table.
    #[error("duplicate node id {0}")]
    DuplicateNode(PointId),
    /// An element id appears twice in one element table.
    #[error("duplicate element id {0}")]
    DuplicateElement(ElementId),
    /// An element references a node that is not in the coordinate table.
    #[error("element {element} references unknown node {node}")]
    UnknownNode { element: ElementId, node: PointId },
    /// An element references a property that is not defined.
    #[error("element {element} references unknown property {property}")]
    UnknownProperty {
        element: ElementId,
        property: PropertyId,
    },
    /// A property references a material that is not defined.
    #[error("property {property} references unknown material {material}")]
    UnknownMaterial {
        property: PropertyId,
        material: MaterialId,
    },
    /// The vertex list length does not match the element type.
    #[error("element {element} ({cell_type}): expected {expected} vertices, found {found}")]
    VertexCountMismatch {
        element: ElementId,
        cell_type: CellType,
        expected: usize,
        found: usize,
    },
    /// A card name that maps to no supported element type.
    #[error("unknown element card `{0}`")]
    UnknownCellType(String),
    /// A node carries a NaN or infinite coordinate.
    #[error("node {node} has a non-finite coordinate")]
    NonFiniteCoordinate { node: PointId },
    /// A node's grid cell cannot be represented at the chosen cell size.
    #[error("node {node} is out of range for the spatial grid")]
    GridOverflow { node: PointId },
    /// Contradictory or invalid options, reported before any clustering work.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Elements collapsed while `crash_on_collapse` was set.
    #[error("{} element(s) collapsed during equivalencing: {}", .0.len(), format_degenerate(.0))]
    DegenerateElements(Vec<DegenerateElement>),
    /// The requested permutation/renumbering is not a bijection.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),
    /// Two distinct entities of the same kind would share an id.
    #[error("{kind} id {id} collides with an existing {kind}")]
    IdCollision { kind: EntityKind, id: u64 },
}

fn format_degenerate(elements: &[DegenerateElement]) -> String {
    elements
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
