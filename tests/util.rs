#![allow(dead_code)]
use mesh_equiv::{
    data::coordinates::Coordinates,
    data::model::{MeshModel, Property},
    topology::cell_type::CellType,
    topology::element::{Element, ElementTable},
    topology::point::{ElementId, MaterialId, PointId, PropertyId},
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub fn pid(u: u64) -> PointId { PointId::new(u).unwrap() }

pub fn eid(u: u64) -> ElementId { ElementId::new(u).unwrap() }

/// Coordinates from `(id, xyz)` pairs.
pub fn coords(nodes: &[(u64, [f64; 3])]) -> Coordinates {
    Coordinates::try_from_nodes(nodes.iter().map(|&(id, xyz)| (pid(id), xyz))).unwrap()
}

/// Nodes on the x axis: `xs[k]` becomes node `k + 1`.
pub fn on_x_axis(xs: &[f64]) -> Coordinates {
    Coordinates::try_from_nodes(
        xs.iter()
            .enumerate()
            .map(|(k, &x)| (pid(k as u64 + 1), [x, 0.0, 0.0])),
    )
    .unwrap()
}

pub fn element(id: u64, cell_type: CellType, nodes: &[u64]) -> Element {
    Element::try_new(eid(id), cell_type, nodes.iter().map(|&n| pid(n)).collect()).unwrap()
}

pub fn table(elements: Vec<Element>) -> ElementTable {
    ElementTable::try_from_elements(elements).unwrap()
}

/// A chain of segments through every node of `coordinates`, in id order.
pub fn chain(coordinates: &Coordinates) -> ElementTable {
    let (ids, _) = coordinates.sorted_by_id();
    table(
        ids.windows(2)
            .enumerate()
            .map(|(k, w)| {
                Element::try_new(eid(k as u64 + 1), CellType::Segment, w.to_vec()).unwrap()
            })
            .collect(),
    )
}

/// Model with one property (id 1, material 1) that every element references.
pub fn model_with_property(coordinates: Coordinates, elements: Vec<Element>) -> MeshModel {
    let prop = PropertyId::new(1).unwrap();
    let elements = elements.into_iter().map(|e| e.with_property(prop)).collect::<Vec<_>>();
    let mut m = MeshModel::new(coordinates, table(elements));
    m.properties.push(Property { id: prop, material: Some(MaterialId::new(1).unwrap()) });
    m.materials.push(MaterialId::new(1).unwrap());
    m
}

/// `n` points uniformly in `[0, side)^3` with ids `1..=n`.
pub fn random_cloud(n: usize, side: f64, seed: u64) -> Coordinates {
    let mut rng = SmallRng::seed_from_u64(seed);
    Coordinates::try_from_nodes((1..=n as u64).map(|id| {
        (pid(id), [rng.gen_range(0.0..side), rng.gen_range(0.0..side), rng.gen_range(0.0..side)])
    }))
    .unwrap()
}
