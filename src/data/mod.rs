//! Data module: node coordinates and the model container.

pub mod coordinates;
pub mod model;

pub use coordinates::Coordinates;
pub use model::{MeshModel, Property};
