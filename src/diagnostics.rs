//! Structured diagnostics emitted by the mesh utilities.
//!
//! The engine never logs through global state directly; callers pass a
//! [`DiagnosticSink`] into each entry point. [`LogSink`] forwards events to
//! the `log` facade, [`RecordingSink`] keeps them for inspection.

use crate::algs::remap::DegenerateElement;
use crate::topology::point::{ElementId, PointId};

/// One event observed during an equivalencing, merge or filter run.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// Nothing to process; the run returned an identity result.
    EmptyInput { nodes: usize, elements: usize },
    /// Tolerance ≤ 0 skipped the clustering phase.
    EquivalencingDisabled { tolerance: f64 },
    /// A multi-node cluster collapsed onto `representative`.
    ClusterFormed {
        representative: PointId,
        members: Vec<PointId>,
    },
    /// A within-tolerance pair was kept apart to avoid collapsing an element.
    MergeVetoed { kept: PointId, candidate: PointId },
    /// An element whose remapped vertex list repeats a node.
    DegenerateElement(DegenerateElement),
    /// An element dropped from the output table.
    ElementRemoved { element: ElementId },
    /// End-of-run totals.
    Summary {
        nodes: usize,
        clusters: usize,
        eliminated: usize,
        degenerate: usize,
    },
}

/// Receiver for [`Diagnostic`] events.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(Diagnostic),
{
    fn emit(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Forwards diagnostics to the `log` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::EmptyInput { nodes, elements } => {
                log::warn!("nothing to equivalence: nodes={nodes} elements={elements}");
            }
            Diagnostic::EquivalencingDisabled { tolerance } => {
                log::info!("equivalencing disabled (tolerance={tolerance})");
            }
            Diagnostic::ClusterFormed {
                representative,
                members,
            } => {
                log::debug!("nodes {members:?} -> {representative}");
            }
            Diagnostic::MergeVetoed { kept, candidate } => {
                log::debug!("kept nodes {kept} and {candidate} apart to avoid a collapsed element");
            }
            Diagnostic::DegenerateElement(element) => {
                log::warn!("collapsed element {element}");
            }
            Diagnostic::ElementRemoved { element } => {
                log::info!("removed collapsed element {element}");
            }
            Diagnostic::Summary {
                nodes,
                clusters,
                eliminated,
                degenerate,
            } => {
                log::info!(
                    "equivalenced {nodes} nodes into {clusters} \
                     ({eliminated} eliminated, {degenerate} collapsed elements)"
                );
            }
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Diagnostic>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `MergeVetoed` events.
    pub fn vetoes(&self) -> usize {
        self.events
            .iter()
            .filter(|d| matches!(d, Diagnostic::MergeVetoed { .. }))
            .count()
    }

    /// The final `Summary` event, if any.
    pub fn summary(&self) -> Option<&Diagnostic> {
        self.events
            .iter()
            .rev()
            .find(|d| matches!(d, Diagnostic::Summary { .. }))
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.events.push(diagnostic);
    }
}
