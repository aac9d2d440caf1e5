mod util;

use mesh_equiv::algs::filter::{Axis, CentroidFilter, Comparison, filter_elements, remove_unused};
use mesh_equiv::topology::cell_type::CellType;
use util::*;

/// Row of `n` unit quads along x, sharing edges.
fn quad_row(n: u64) -> mesh_equiv::data::model::MeshModel {
    let mut nodes = Vec::new();
    for k in 0..=n {
        nodes.push((2 * k + 1, [k as f64, 0.0, 0.0]));
        nodes.push((2 * k + 2, [k as f64, 1.0, 0.0]));
    }
    let elements = (0..n)
        .map(|k| {
            let corners = [2 * k + 1, 2 * k + 3, 2 * k + 4, 2 * k + 2];
            element(k + 1, CellType::Quadrilateral, &corners)
        })
        .collect();
    model_with_property(coords(&nodes), elements)
}

#[test]
fn negative_x_half_is_cut_away() {
    let mut model = quad_row(4);
    for k in 1..=10 {
        model.coordinates.get_mut(pid(k)).unwrap()[0] -= 2.0;
    }
    let filter = CentroidFilter::parse("x", "< 0.").unwrap();
    let (out, report) = filter_elements(&model, &[filter]).unwrap();
    assert_eq!(report.elements, vec![eid(1), eid(2)]);
    assert_eq!(out.elements.len(), 2);
    // The shared edge at x = 0 survives.
    assert_eq!(out.coordinates.ids(), &[pid(5), pid(6), pid(7), pid(8), pid(9), pid(10)]);
    assert_eq!(report.unused.nodes, vec![pid(1), pid(2), pid(3), pid(4)]);
    assert!(report.unused.properties.is_empty());
    out.validate().unwrap();
}

#[test]
fn boundary_follows_the_comparison() {
    let model = quad_row(2);
    // Centroids are at x = 0.5 and 1.5.
    let strict = CentroidFilter::new(Axis::X, Comparison::Less, 0.5).unwrap();
    assert!(filter_elements(&model, &[strict]).unwrap().1.elements.is_empty());
    let inclusive = CentroidFilter::new(Axis::X, Comparison::LessEqual, 0.5).unwrap();
    assert_eq!(filter_elements(&model, &[inclusive]).unwrap().1.elements, vec![eid(1)]);
}

#[test]
fn removing_everything_drops_properties_and_materials() {
    let model = quad_row(3);
    let filter = CentroidFilter::parse("y", ">= 0").unwrap();
    let (out, report) = filter_elements(&model, &[filter]).unwrap();
    assert!(out.elements.is_empty());
    assert!(out.coordinates.is_empty());
    assert!(out.properties.is_empty());
    assert!(out.materials.is_empty());
    assert_eq!(report.unused.properties.len(), 1);
    assert_eq!(report.unused.materials.len(), 1);
}

#[test]
fn remove_unused_keeps_a_clean_model_as_is() {
    let model = quad_row(3);
    let (out, report) = remove_unused(&model).unwrap();
    assert_eq!(out, model);
    assert!(report.nodes.is_empty());
}

#[test]
fn filters_load_from_json() {
    let f: CentroidFilter =
        serde_json::from_str(r#"{"axis": "z", "comparison": "GreaterEqual", "value": 2.0}"#)
            .unwrap();
    assert_eq!(f, CentroidFilter::parse("z", ">= 2").unwrap());
}
