#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-equiv
//!
//! mesh-equiv collapses coincident nodes of a finite-element model. Nodes
//! closer than a tolerance are grouped transitively, every group keeps its
//! smallest node id, and element connectivity is rewritten onto the
//! surviving ids. Elements that collapse in the process can be kept,
//! removed, vetoed during clustering, or turned into a hard error.
//!
//! ## Pipeline
//! 1. [`SpatialIndex`](algs::spatial_index::SpatialIndex): uniform hash grid
//!    with cells at least one tolerance wide.
//! 2. [`ClusterBuilder`](algs::cluster::ClusterBuilder): union-find over all
//!    within-tolerance pairs, with an optional neighbor cap and collapse veto.
//! 3. [`select_representatives`](algs::representative::select_representatives):
//!    minimum id per cluster.
//! 4. [`remap_connectivity`](algs::remap::remap_connectivity): rewrites
//!    elements and applies the [`CollapsePolicy`](algs::remap::CollapsePolicy).
//!
//! [`equivalence_nodes`](algs::equivalence::equivalence_nodes) runs all four.
//! Model-level utilities (renumbering, superelement renumbering, merging,
//! centroid filtering and solid skinning) live next to it in [`algs`].
//!
//! ## Determinism
//!
//! Results depend only on node ids, coordinates and options. Points are
//! visited in ascending id order and hash-map iteration order never leaks
//! into the output.
//!
//! ## Diagnostics
//!
//! Entry points take a [`DiagnosticSink`](diagnostics::DiagnosticSink).
//! [`LogSink`](diagnostics::LogSink) forwards to the `log` facade; any
//! `FnMut(Diagnostic)` closure works too.
//!
//! ## Features
//! - `check-invariants`, `strict-invariants`: keep the [`DebugInvariants`]
//!   checks (and their panics) in release builds.

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod diagnostics;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::equivalence::{
        EquivalenceOptions, EquivalenceReport, equivalence_model, equivalence_nodes,
    };
    pub use crate::algs::filter::{CentroidFilter, filter_elements, remove_unused};
    pub use crate::algs::merge::{MergeOptions, merge_models};
    pub use crate::algs::remap::{CollapsePolicy, DegenerateElement};
    pub use crate::algs::renumber::{
        RenumberMaps, RenumberOptions, StartingIds, renumber_model, superelement_renumber,
    };
    pub use crate::algs::representative::RepresentativeMap;
    pub use crate::algs::skin::{SkinOptions, SkinReport, skin_solids};
    pub use crate::data::coordinates::Coordinates;
    pub use crate::data::model::{MeshModel, Property};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::diagnostics::{Diagnostic, DiagnosticSink, LogSink, RecordingSink};
    pub use crate::mesh_error::MeshEquivError;
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::element::{Element, ElementTable};
    pub use crate::topology::point::{ElementId, MaterialId, MeshId, PointId, PropertyId};
}
