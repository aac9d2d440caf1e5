//! Structural checks for the tables the equivalencer produces.
//!
//! [`ElementTable`](crate::topology::element::ElementTable) checks that its
//! id index agrees with insertion order and that every element carries the
//! vertex count of its type.
//! [`RepresentativeMap`](crate::algs::representative::RepresentativeMap)
//! checks that every representative maps to itself and is the smallest id
//! of its cluster.
//!
//! The checks run in debug builds. The `check-invariants` and
//! `strict-invariants` features keep them in release builds.

use crate::mesh_error::MeshEquivError;

pub trait DebugInvariants {
    /// Panics on the first broken invariant when checks are compiled in.
    fn debug_assert_invariants(&self);
    /// Returns the first broken invariant as a [`MeshEquivError`].
    fn validate_invariants(&self) -> Result<(), MeshEquivError>;
}

/// Panics with `[invariants] <context>: <error>` when `$expr` is an `Err`
/// and checks are compiled in; expands to nothing otherwise.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(
            debug_assertions,
            feature = "strict-invariants",
            feature = "check-invariants"
        ))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
