//! Element type tags for deck elements.
//!
//! The tag fixes how many vertices an element must reference. Vertex order
//! within an element is significant (it defines orientation and face
//! connectivity) and is never altered by the algorithms in this crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshEquivError;

/// Element types understood by the equivalencer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// 0D point element (concentrated mass).
    Vertex,
    /// 1D two-node line (rod, bar, beam).
    Segment,
    /// 3-node triangle.
    Triangle,
    /// 6-node quadratic triangle.
    Triangle6,
    /// 4-node quadrilateral.
    Quadrilateral,
    /// 8-node quadratic quadrilateral.
    Quadrilateral8,
    /// 4-node tetrahedron.
    Tetrahedron,
    /// 10-node quadratic tetrahedron.
    Tetrahedron10,
    /// 5-node pyramid.
    Pyramid,
    /// 6-node wedge/prism.
    Prism,
    /// 8-node hexahedron.
    Hexahedron,
    /// 20-node quadratic hexahedron.
    Hexahedron20,
}

impl Default for CellType {
    fn default() -> Self {
        CellType::Vertex
    }
}

impl CellType {
    /// Number of node references an element of this type carries.
    pub const fn vertex_count(self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Triangle6 => 6,
            CellType::Quadrilateral => 4,
            CellType::Quadrilateral8 => 8,
            CellType::Tetrahedron => 4,
            CellType::Tetrahedron10 => 10,
            CellType::Pyramid => 5,
            CellType::Prism => 6,
            CellType::Hexahedron => 8,
            CellType::Hexahedron20 => 20,
        }
    }

    /// Topological dimension of the element.
    pub const fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Segment => 1,
            CellType::Triangle
            | CellType::Triangle6
            | CellType::Quadrilateral
            | CellType::Quadrilateral8 => 2,
            CellType::Tetrahedron
            | CellType::Tetrahedron10
            | CellType::Pyramid
            | CellType::Prism
            | CellType::Hexahedron
            | CellType::Hexahedron20 => 3,
        }
    }

    /// The deck card that writes this element type.
    pub const fn card_name(self) -> &'static str {
        match self {
            CellType::Vertex => "CONM2",
            CellType::Segment => "CBAR",
            CellType::Triangle => "CTRIA3",
            CellType::Triangle6 => "CTRIA6",
            CellType::Quadrilateral => "CQUAD4",
            CellType::Quadrilateral8 => "CQUAD8",
            CellType::Tetrahedron | CellType::Tetrahedron10 => "CTETRA",
            CellType::Pyramid => "CPYRAM",
            CellType::Prism => "CPENTA",
            CellType::Hexahedron | CellType::Hexahedron20 => "CHEXA",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.card_name(), self.vertex_count())
    }
}

/// Parses a deck card name. Solid cards map to their low-order variant.
impl FromStr for CellType {
    type Err = MeshEquivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cell = match s.trim().to_ascii_uppercase().as_str() {
            "CONM2" | "CONM1" => CellType::Vertex,
            "CBAR" | "CROD" | "CBEAM" | "CONROD" | "CTUBE" => CellType::Segment,
            "CTRIA3" | "CTRIAR" => CellType::Triangle,
            "CTRIA6" => CellType::Triangle6,
            "CQUAD4" | "CQUADR" | "CSHEAR" => CellType::Quadrilateral,
            "CQUAD8" => CellType::Quadrilateral8,
            "CTETRA" => CellType::Tetrahedron,
            "CPYRAM" => CellType::Pyramid,
            "CPENTA" => CellType::Prism,
            "CHEXA" => CellType::Hexahedron,
            _ => return Err(MeshEquivError::UnknownCellType(s.to_string())),
        };
        Ok(cell)
    }
}
