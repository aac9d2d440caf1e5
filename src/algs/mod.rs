//! Re-export public algorithms.

pub mod cluster;
pub mod equivalence;
pub mod filter;
pub mod merge;
pub mod remap;
pub mod renumber;
pub mod representative;
pub mod skin;
pub mod spatial_index;
pub mod union_find;

pub use equivalence::{equivalence_model, equivalence_nodes};
pub use filter::{filter_elements, remove_unused};
pub use merge::merge_models;
pub use renumber::{renumber_model, superelement_renumber};
pub use skin::skin_solids;
