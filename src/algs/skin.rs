//! Free faces of a solid mesh.
//!
//! Solids are equivalenced first so that faces shared through coincident
//! but distinct nodes are recognised. A face is free when exactly one solid
//! owns it. Free faces become triangles and quadrilaterals that keep the
//! owning solid's property and node order, so their normals point out of the
//! solid.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::algs::equivalence::{EquivalenceOptions, EquivalenceReport, equivalence_model};
use crate::algs::filter::{UnusedReport, remove_unused};
use crate::data::model::MeshModel;
use crate::diagnostics::DiagnosticSink;
use crate::mesh_error::MeshEquivError;
use crate::topology::cell_type::CellType;
use crate::topology::element::{Element, ElementTable};
use crate::topology::point::{ElementId, PointId};

const TET_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]];
const PYRAMID_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];
const PRISM_FACES: &[&[usize]] = &[
    &[0, 2, 1],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];
const HEX_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];

/// Corner-node faces of a solid, outward by the right-hand rule.
/// Quadratic solids use their corner nodes only.
pub fn solid_faces(cell_type: CellType) -> &'static [&'static [usize]] {
    match cell_type {
        CellType::Tetrahedron | CellType::Tetrahedron10 => TET_FACES,
        CellType::Pyramid => PYRAMID_FACES,
        CellType::Prism => PRISM_FACES,
        CellType::Hexahedron | CellType::Hexahedron20 => HEX_FACES,
        _ => &[],
    }
}

/// Options for [`skin_solids`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinOptions {
    /// Equivalencing tolerance applied before faces are matched.
    pub tolerance: f64,
    pub max_neighbors: Option<usize>,
}

impl Default for SkinOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_neighbors: Some(10),
        }
    }
}

impl SkinOptions {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_neighbors(mut self, k: Option<usize>) -> Self {
        self.max_neighbors = k;
        self
    }

    pub fn equivalence_options(&self) -> EquivalenceOptions {
        let options = EquivalenceOptions::new(self.tolerance);
        match self.max_neighbors {
            Some(k) => options.with_max_neighbors(k),
            None => options,
        }
    }
}

/// What [`skin_solids`] found.
#[derive(Clone, Debug)]
pub struct SkinReport {
    pub equivalence: EquivalenceReport,
    /// Solid elements that contributed faces.
    pub solids: usize,
    /// Faces owned by two or more solids.
    pub interior_faces: usize,
    /// Faces left with fewer than three distinct nodes.
    pub degenerate_faces: usize,
    pub unused: UnusedReport,
}

struct FaceRecord {
    nodes: Vec<PointId>,
    owner: ElementId,
    count: usize,
}

/// Replaces the solids of `model` with their free faces.
///
/// Non-solid elements are ignored. Face ids count up from 1 in the order
/// faces are first met. Nodes, properties and materials the skin no longer
/// references are dropped.
pub fn skin_solids(
    model: &MeshModel,
    options: &SkinOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<(MeshModel, SkinReport), MeshEquivError> {
    let (equivalenced, equivalence) =
        equivalence_model(model, &options.equivalence_options(), sink)?;

    let mut faces: Vec<FaceRecord> = Vec::new();
    let mut by_key: HashMap<Vec<PointId>, usize> = HashMap::new();
    let mut solids = 0;
    let mut degenerate_faces = 0;
    for element in &equivalenced.elements {
        let local = solid_faces(element.cell_type);
        if local.is_empty() {
            continue;
        }
        solids += 1;
        for corners in local {
            let mut nodes: Vec<PointId> = Vec::with_capacity(corners.len());
            for &k in corners.iter() {
                let node = element.nodes[k];
                if !nodes.contains(&node) {
                    nodes.push(node);
                }
            }
            if nodes.len() < 3 {
                degenerate_faces += 1;
                continue;
            }
            let mut key = nodes.clone();
            key.sort_unstable();
            match by_key.get(&key) {
                Some(&slot) => faces[slot].count += 1,
                None => {
                    by_key.insert(key, faces.len());
                    faces.push(FaceRecord {
                        nodes,
                        owner: element.id,
                        count: 1,
                    });
                }
            }
        }
    }
    if solids == 0 {
        log::warn!("no solid elements to skin");
    }

    let interior_faces = faces.iter().filter(|f| f.count > 1).count();
    let mut skin = ElementTable::with_capacity(faces.len() - interior_faces);
    let mut next = 1u64;
    for face in faces.into_iter().filter(|f| f.count == 1) {
        let cell_type = if face.nodes.len() == 3 {
            CellType::Triangle
        } else {
            CellType::Quadrilateral
        };
        let id = ElementId::new(next)?;
        next += 1;
        let mut element = Element::try_new(id, cell_type, face.nodes)?;
        element.property = equivalenced
            .elements
            .get(face.owner)
            .and_then(|owner| owner.property);
        skin.try_insert(element)?;
    }
    log::info!(
        "{} solids: {} free faces, {} interior faces",
        solids,
        skin.len(),
        interior_faces
    );

    let (out, unused) = remove_unused(&MeshModel {
        elements: skin,
        ..equivalenced
    })?;
    Ok((
        out,
        SkinReport {
            equivalence,
            solids,
            interior_faces,
            degenerate_faces,
            unused,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::coordinates::Coordinates;
    use crate::diagnostics::RecordingSink;

    fn pid(id: u64) -> PointId {
        PointId::new(id).unwrap()
    }

    fn corners(cell_type: CellType) -> Vec<[f64; 3]> {
        match cell_type {
            CellType::Tetrahedron => vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            CellType::Pyramid => vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.5, 0.5, 1.0],
            ],
            CellType::Prism => vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
            _ => vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
        }
    }

    fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    fn mean(points: &[[f64; 3]]) -> [f64; 3] {
        let n = points.len() as f64;
        let mut m = [0.0; 3];
        for p in points {
            for k in 0..3 {
                m[k] += p[k] / n;
            }
        }
        m
    }

    #[test]
    fn face_tables_point_outward() {
        for cell_type in [
            CellType::Tetrahedron,
            CellType::Pyramid,
            CellType::Prism,
            CellType::Hexahedron,
        ] {
            let pts = corners(cell_type);
            let center = mean(&pts);
            for face in solid_faces(cell_type) {
                let q: Vec<[f64; 3]> = face.iter().map(|&k| pts[k]).collect();
                let normal = if q.len() == 3 {
                    cross(sub(q[1], q[0]), sub(q[2], q[0]))
                } else {
                    cross(sub(q[2], q[0]), sub(q[3], q[1]))
                };
                let out = sub(mean(&q), center);
                let dot: f64 = (0..3).map(|k| normal[k] * out[k]).sum();
                assert!(dot > 0.0, "{cell_type:?} face {face:?} points inward");
            }
        }
    }

    #[test]
    fn single_tet_is_its_own_skin() {
        let coords = Coordinates::try_from_nodes(
            corners(CellType::Tetrahedron)
                .into_iter()
                .enumerate()
                .map(|(k, xyz)| (pid(k as u64 + 1), xyz)),
        )
        .unwrap();
        let tet = Element::try_new(
            ElementId::new(9).unwrap(),
            CellType::Tetrahedron,
            (1..=4).map(pid).collect(),
        )
        .unwrap();
        let model = MeshModel::new(coords, ElementTable::try_from_elements([tet]).unwrap());
        let mut sink = RecordingSink::new();
        let (out, report) = skin_solids(&model, &SkinOptions::default(), &mut sink).unwrap();
        assert_eq!(report.solids, 1);
        assert_eq!(out.elements.len(), 4);
        assert!(out.elements.iter().all(|e| e.cell_type == CellType::Triangle));
        assert_eq!(out.elements.as_slice()[0].nodes, vec![pid(1), pid(3), pid(2)]);
        assert_eq!(out.coordinates.len(), 4);
    }

    #[test]
    fn collapsed_faces_are_skipped() {
        // Hexa with its top face pinched to an edge: the top face drops out
        // and the two side quads touching the pinch become triangles.
        let mut pts = corners(CellType::Hexahedron);
        pts[6] = pts[7];
        pts[5] = pts[4];
        let coords = Coordinates::try_from_nodes(
            pts.into_iter()
                .enumerate()
                .map(|(k, xyz)| (pid(k as u64 + 1), xyz)),
        )
        .unwrap();
        let hexa = Element::try_new(
            ElementId::new(1).unwrap(),
            CellType::Hexahedron,
            (1..=8).map(pid).collect(),
        )
        .unwrap();
        let model = MeshModel::new(coords, ElementTable::try_from_elements([hexa]).unwrap());
        let mut sink = RecordingSink::new();
        let (out, report) = skin_solids(&model, &SkinOptions::default(), &mut sink).unwrap();
        assert_eq!(report.equivalence.eliminated, 2);
        assert_eq!(report.degenerate_faces, 1);
        let triangles = out
            .elements
            .iter()
            .filter(|e| e.cell_type == CellType::Triangle)
            .count();
        assert_eq!((out.elements.len(), triangles), (5, 2));
    }
}
