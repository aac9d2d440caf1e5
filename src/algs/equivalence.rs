//! Spatial node equivalencing.
//!
//! Pipeline: validate → [`SpatialIndex`](crate::algs::spatial_index::SpatialIndex)
//! → [`ClusterBuilder`] → [`select_representatives`] → [`remap_connectivity`].
//! Each call is self-contained; nothing is cached between runs.
//!
//! # Example
//! ```rust
//! use mesh_equiv::algs::equivalence::{equivalence_nodes, EquivalenceOptions};
//! use mesh_equiv::data::coordinates::Coordinates;
//! use mesh_equiv::diagnostics::RecordingSink;
//! use mesh_equiv::topology::cell_type::CellType;
//! use mesh_equiv::topology::element::{Element, ElementTable};
//! use mesh_equiv::topology::point::{ElementId, PointId};
//!
//! let p = |i| PointId::new(i);
//! let coords = Coordinates::try_from_nodes([
//!     (p(1)?, [0.0, 0.0, 0.0]),
//!     (p(2)?, [1.0, 0.0, 0.0]),
//!     (p(3)?, [1.0, 0.0, 0.0]),
//! ])?;
//! let elements = ElementTable::try_from_elements([
//!     Element::try_new(ElementId::new(1)?, CellType::Segment, vec![p(1)?, p(2)?])?,
//!     Element::try_new(ElementId::new(2)?, CellType::Segment, vec![p(3)?, p(1)?])?,
//! ])?;
//!
//! let mut sink = RecordingSink::new();
//! let report = equivalence_nodes(&coords, &elements, &EquivalenceOptions::new(1e-6), &mut sink)?;
//! assert_eq!(report.eliminated, 1);
//! assert_eq!(report.representatives.get(p(3)?), Some(p(2)?));
//! # Ok::<(), mesh_equiv::mesh_error::MeshEquivError>(())
//! ```

use std::collections::BTreeSet;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::algs::cluster::{ClusterBuilder, Clustering, ElementIncidence};
use crate::algs::remap::{remap_connectivity, CollapsePolicy, DegenerateElement};
use crate::algs::renumber::{renumber_ids, RenumberMaps};
use crate::algs::representative::{select_representatives, RepresentativeMap};
use crate::data::coordinates::Coordinates;
use crate::data::model::MeshModel;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::mesh_error::MeshEquivError;
use crate::topology::element::ElementTable;
use crate::topology::point::{ElementId, PointId};

/// Options for one equivalencing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivalenceOptions {
    /// Spherical, inclusive merge tolerance. `<= 0` disables equivalencing.
    pub tolerance: f64,
    /// When set, only these nodes may merge (into each other).
    pub node_set: Option<BTreeSet<PointId>>,
    /// Keep at most this many nearest links per node. `None` = unlimited.
    pub max_neighbors: Option<usize>,
    pub remove_collapsed_elements: bool,
    pub avoid_collapsed_elements: bool,
    pub crash_on_collapse: bool,
    /// Renumber surviving nodes from 1 after [`equivalence_model`].
    pub renumber_nodes: bool,
}

impl Default for EquivalenceOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            node_set: None,
            max_neighbors: None,
            remove_collapsed_elements: false,
            avoid_collapsed_elements: false,
            crash_on_collapse: false,
            renumber_nodes: false,
        }
    }
}

impl EquivalenceOptions {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Options that skip equivalencing entirely.
    pub fn disabled() -> Self {
        Self::new(-1.0)
    }

    #[must_use]
    pub fn with_node_set<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = PointId>,
    {
        self.node_set = Some(nodes.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_max_neighbors(mut self, k: usize) -> Self {
        self.max_neighbors = Some(k);
        self
    }

    #[must_use]
    pub fn with_remove_collapsed(mut self, on: bool) -> Self {
        self.remove_collapsed_elements = on;
        self
    }

    #[must_use]
    pub fn with_avoid_collapsed(mut self, on: bool) -> Self {
        self.avoid_collapsed_elements = on;
        self
    }

    #[must_use]
    pub fn with_crash_on_collapse(mut self, on: bool) -> Self {
        self.crash_on_collapse = on;
        self
    }

    #[must_use]
    pub fn with_renumber_nodes(mut self, on: bool) -> Self {
        self.renumber_nodes = on;
        self
    }

    /// Collapses the three flags into one policy.
    pub fn collapse_policy(&self) -> CollapsePolicy {
        CollapsePolicy::from_flags(
            self.crash_on_collapse,
            self.remove_collapsed_elements,
            self.avoid_collapsed_elements,
        )
    }

    /// `false` when the tolerance sentinel disables the run.
    pub fn is_enabled(&self) -> bool {
        self.tolerance > 0.0
    }

    /// Checks the options against the nodes they will run on.
    pub fn validate(&self, coordinates: &Coordinates) -> Result<(), MeshEquivError> {
        if !self.tolerance.is_finite() {
            return Err(MeshEquivError::Configuration(format!(
                "tolerance must be finite, got {}",
                self.tolerance
            )));
        }
        if self.max_neighbors == Some(0) {
            return Err(MeshEquivError::Configuration(
                "max_neighbors must be at least 1".into(),
            ));
        }
        if let Some(set) = &self.node_set {
            if let Some(missing) = set.iter().find(|&&id| !coordinates.contains(id)) {
                return Err(MeshEquivError::Configuration(format!(
                    "node_set contains {missing}, which is not a node of the model"
                )));
            }
        }
        Ok(())
    }
}

/// Everything an equivalencing run produces.
#[derive(Clone, Debug)]
pub struct EquivalenceReport {
    pub representatives: RepresentativeMap,
    /// Remapped element table (collapsed elements dropped under `Remove`).
    pub elements: ElementTable,
    /// Input node count minus cluster count.
    pub eliminated: usize,
    pub clusters: usize,
    pub degenerate: Vec<DegenerateElement>,
    pub removed: Vec<ElementId>,
    /// Within-tolerance node pairs kept apart by the collapse veto.
    pub vetoed: Vec<(PointId, PointId)>,
    pub policy: CollapsePolicy,
}

impl EquivalenceReport {
    fn identity(
        coordinates: &Coordinates,
        elements: &ElementTable,
        policy: CollapsePolicy,
    ) -> Self {
        Self {
            representatives: RepresentativeMap::identity(coordinates.ids().iter().copied()),
            elements: elements.clone(),
            eliminated: 0,
            clusters: coordinates.len(),
            degenerate: Vec::new(),
            removed: Vec::new(),
            vetoed: Vec::new(),
            policy,
        }
    }
}

/// Merges nodes within `options.tolerance` and remaps `elements` onto the
/// survivors.
pub fn equivalence_nodes(
    coordinates: &Coordinates,
    elements: &ElementTable,
    options: &EquivalenceOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<EquivalenceReport, MeshEquivError> {
    options.validate(coordinates)?;
    check_references(coordinates, elements)?;
    let policy = options.collapse_policy();

    if coordinates.is_empty() || elements.is_empty() {
        sink.emit(Diagnostic::EmptyInput {
            nodes: coordinates.len(),
            elements: elements.len(),
        });
        return Ok(EquivalenceReport::identity(coordinates, elements, policy));
    }
    if !options.is_enabled() {
        sink.emit(Diagnostic::EquivalencingDisabled {
            tolerance: options.tolerance,
        });
        return Ok(EquivalenceReport::identity(coordinates, elements, policy));
    }

    let (ids, points) = coordinates.sorted_by_id();
    let position: HashMap<PointId, u32> = ids
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i as u32))
        .collect();
    let connectivity = element_indices(elements, &position)?;

    let mask: Option<Vec<bool>> = options
        .node_set
        .as_ref()
        .map(|set| ids.iter().map(|id| set.contains(id)).collect());
    let incidence = (policy == CollapsePolicy::Avoid)
        .then(|| ElementIncidence::from_connectivity(ids.len(), connectivity));

    let mut builder =
        ClusterBuilder::new(&ids, &points, options.tolerance).max_neighbors(options.max_neighbors);
    if let Some(mask) = mask.as_deref() {
        builder = builder.restrict_to(mask);
    }
    if let Some(incidence) = incidence.as_ref() {
        builder = builder.avoid_collapse(incidence);
    }
    let clustering = builder.build()?;

    let representatives = select_representatives(&ids, &clustering)?;
    report_clusters(&ids, &clustering, sink);
    let vetoed: Vec<(PointId, PointId)> = clustering
        .vetoed()
        .iter()
        .map(|&(a, b)| (ids[a as usize], ids[b as usize]))
        .collect();
    for &(kept, candidate) in &vetoed {
        sink.emit(Diagnostic::MergeVetoed { kept, candidate });
    }

    let remapped = remap_connectivity(elements, &representatives, policy, sink)?;
    let eliminated = ids.len() - clustering.n_clusters();
    debug_assert_eq!(eliminated, representatives.eliminated_count());

    sink.emit(Diagnostic::Summary {
        nodes: ids.len(),
        clusters: clustering.n_clusters(),
        eliminated,
        degenerate: remapped.degenerate.len(),
    });

    Ok(EquivalenceReport {
        representatives,
        elements: remapped.elements,
        eliminated,
        clusters: clustering.n_clusters(),
        degenerate: remapped.degenerate,
        removed: remapped.removed,
        vetoed,
        policy,
    })
}

/// Equivalences a whole model and returns the model rebuilt on surviving nodes.
///
/// Surviving nodes keep their original coordinates and deck order. With
/// `renumber_nodes` set, they are then renumbered from 1 in that order.
pub fn equivalence_model(
    model: &MeshModel,
    options: &EquivalenceOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<(MeshModel, EquivalenceReport), MeshEquivError> {
    model.validate()?;
    let report = equivalence_nodes(&model.coordinates, &model.elements, options, sink)?;

    let mut coordinates = Coordinates::with_capacity(model.coordinates.len() - report.eliminated);
    for (id, xyz) in model.coordinates.iter() {
        if report.representatives.get(id) == Some(id) {
            coordinates.try_insert(id, xyz)?;
        }
    }
    let mut out = MeshModel {
        coordinates,
        elements: report.elements.clone(),
        properties: model.properties.clone(),
        materials: model.materials.clone(),
    };

    if options.renumber_nodes {
        let maps = RenumberMaps {
            nodes: renumber_ids(out.coordinates.ids().iter().copied(), 1, false)?,
            ..RenumberMaps::identity(&out)
        };
        out = maps.apply(&out)?;
    }
    Ok((out, report))
}

fn check_references(
    coordinates: &Coordinates,
    elements: &ElementTable,
) -> Result<(), MeshEquivError> {
    for element in elements {
        if let Some(&node) = element.nodes.iter().find(|&&n| !coordinates.contains(n)) {
            return Err(MeshEquivError::UnknownNode {
                element: element.id,
                node,
            });
        }
    }
    Ok(())
}

fn element_indices(
    elements: &ElementTable,
    position: &HashMap<PointId, u32>,
) -> Result<Vec<Vec<u32>>, MeshEquivError> {
    elements
        .iter()
        .map(|element| {
            element
                .nodes
                .iter()
                .map(|&node| {
                    position
                        .get(&node)
                        .copied()
                        .ok_or(MeshEquivError::UnknownNode {
                            element: element.id,
                            node,
                        })
                })
                .collect()
        })
        .collect()
}

fn report_clusters(ids: &[PointId], clustering: &Clustering, sink: &mut dyn DiagnosticSink) {
    if clustering.n_clusters() == ids.len() {
        return;
    }
    for members in clustering.members() {
        if members.len() < 2 {
            continue;
        }
        // Members are ascending point indices, so the first is the survivor.
        let members: Vec<PointId> = members.iter().map(|&i| ids[i as usize]).collect();
        sink.emit(Diagnostic::ClusterFormed {
            representative: members[0],
            members,
        });
    }
}
