//! Ids, element type tags and element connectivity.

pub mod cell_type;
pub mod element;
pub mod point;

pub use cell_type::CellType;
pub use element::{Element, ElementTable};
pub use point::{ElementId, EntityKind, MaterialId, MeshId, PointId, PropertyId};
