//! Connectivity remapping onto surviving node ids.
//!
//! Each element's vertex list is rewritten through the
//! [`RepresentativeMap`], keeping vertex order. An element whose rewritten
//! list repeats a node id is *degenerate*; what happens to it is decided by
//! a single [`CollapsePolicy`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algs::representative::RepresentativeMap;
use crate::debug_invariants::DebugInvariants;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::mesh_error::MeshEquivError;
use crate::topology::cell_type::CellType;
use crate::topology::element::{Element, ElementTable};
use crate::topology::point::{ElementId, PointId};

/// Disposition of degenerate elements, resolved once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollapsePolicy {
    /// Abort the run and report every degenerate element.
    Crash,
    /// Veto merges that would collapse an element during clustering.
    Avoid,
    /// Drop degenerate elements from the output table.
    Remove,
    /// Keep degenerate elements unchanged and report them.
    Passthrough,
}

impl CollapsePolicy {
    /// Resolves the deck-level flags. Precedence is
    /// `crash > avoid > remove > passthrough`.
    pub fn from_flags(
        crash_on_collapse: bool,
        remove_collapsed: bool,
        avoid_collapsed: bool,
    ) -> Self {
        match (crash_on_collapse, avoid_collapsed, remove_collapsed) {
            (true, _, _) => CollapsePolicy::Crash,
            (false, true, _) => CollapsePolicy::Avoid,
            (false, false, true) => CollapsePolicy::Remove,
            (false, false, false) => CollapsePolicy::Passthrough,
        }
    }
}

impl Default for CollapsePolicy {
    fn default() -> Self {
        CollapsePolicy::Passthrough
    }
}

/// An element whose remapped vertex list repeats a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateElement {
    pub element: ElementId,
    pub cell_type: CellType,
    pub original: Vec<PointId>,
    pub remapped: Vec<PointId>,
}

impl fmt::Display for DegenerateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: [{}] -> [{}]",
            self.cell_type.card_name(),
            self.element,
            join_ids(&self.original),
            join_ids(&self.remapped)
        )
    }
}

fn join_ids(ids: &[PointId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of remapping a whole element table.
#[derive(Clone, Debug, Default)]
pub struct RemapOutcome {
    /// Remapped elements (minus removed ones), in input order.
    pub elements: ElementTable,
    /// Every degenerate element, in input order.
    pub degenerate: Vec<DegenerateElement>,
    /// Ids dropped under [`CollapsePolicy::Remove`].
    pub removed: Vec<ElementId>,
}

/// Rewrites every element through `map` and applies `policy` to degenerate ones.
///
/// Under [`CollapsePolicy::Crash`] no partial output is produced: the error
/// carries all offending elements.
pub fn remap_connectivity(
    elements: &ElementTable,
    map: &RepresentativeMap,
    policy: CollapsePolicy,
    sink: &mut dyn DiagnosticSink,
) -> Result<RemapOutcome, MeshEquivError> {
    let mut out = RemapOutcome {
        elements: ElementTable::with_capacity(elements.len()),
        ..RemapOutcome::default()
    };

    for element in elements {
        let remapped = remap_nodes(element, map)?;
        let candidate = Element {
            nodes: remapped,
            ..element.clone()
        };
        if !candidate.has_repeated_nodes() {
            out.elements.try_insert(candidate)?;
            continue;
        }

        let report = DegenerateElement {
            element: element.id,
            cell_type: element.cell_type,
            original: element.nodes.clone(),
            remapped: candidate.nodes.clone(),
        };
        out.degenerate.push(report.clone());
        if policy == CollapsePolicy::Crash {
            continue;
        }
        sink.emit(Diagnostic::DegenerateElement(report));
        if policy == CollapsePolicy::Remove {
            out.removed.push(element.id);
            sink.emit(Diagnostic::ElementRemoved {
                element: element.id,
            });
        } else {
            out.elements.try_insert(candidate)?;
        }
    }

    if policy == CollapsePolicy::Crash && !out.degenerate.is_empty() {
        return Err(MeshEquivError::DegenerateElements(out.degenerate));
    }
    out.elements.debug_assert_invariants();
    Ok(out)
}

fn remap_nodes(element: &Element, map: &RepresentativeMap) -> Result<Vec<PointId>, MeshEquivError> {
    element
        .nodes
        .iter()
        .map(|&node| {
            map.get(node).ok_or(MeshEquivError::UnknownNode {
                element: element.id,
                node,
            })
        })
        .collect()
}
