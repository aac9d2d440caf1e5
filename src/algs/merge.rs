//! Merging several models into one deck.
//!
//! Models are appended in order. With `renumber` set, every model after the
//! first is shifted past the largest node, element, property and material id
//! merged so far, so nothing collides. Optionally the result is equivalenced.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::algs::equivalence::{equivalence_model, EquivalenceOptions, EquivalenceReport};
use crate::algs::renumber::{IdMap, RenumberMaps, StartingIds};
use crate::data::model::MeshModel;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::mesh_error::MeshEquivError;
use crate::topology::point::MeshId;

/// Options for [`merge_models`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Shift ids of later models past those already merged.
    pub renumber: bool,
    /// Equivalence the merged model afterwards.
    pub equivalence: Option<EquivalenceOptions>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            renumber: true,
            equivalence: None,
        }
    }
}

impl MergeOptions {
    #[must_use]
    pub fn with_renumber(mut self, on: bool) -> Self {
        self.renumber = on;
        self
    }

    #[must_use]
    pub fn with_equivalence(mut self, options: EquivalenceOptions) -> Self {
        self.equivalence = Some(options);
        self
    }
}

/// What [`merge_models`] did to each input.
#[derive(Clone, Debug)]
pub struct MergeReport {
    /// Per input model, the id maps applied before appending.
    pub maps: Vec<RenumberMaps>,
    pub equivalence: Option<EquivalenceReport>,
}

/// Concatenates `models` into one model.
pub fn merge_models(
    models: &[MeshModel],
    options: &MergeOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<(MeshModel, MergeReport), MeshEquivError> {
    if models.is_empty() {
        sink.emit(Diagnostic::EmptyInput {
            nodes: 0,
            elements: 0,
        });
    }

    let mut merged = MeshModel::default();
    let mut properties = HashSet::new();
    let mut materials = HashSet::new();
    let mut used = StartingIds {
        node: 0,
        element: 0,
        property: 0,
        material: 0,
    };
    let mut all_maps = Vec::with_capacity(models.len());

    for (k, model) in models.iter().enumerate() {
        model.validate()?;
        let maps = if options.renumber && k > 0 {
            shift_maps(model, &used)?
        } else {
            RenumberMaps::identity(model)
        };
        let shifted = maps.apply(model)?;

        for (id, xyz) in shifted.coordinates.iter() {
            merged
                .coordinates
                .try_insert(id, xyz)
                .map_err(|_| collision(id))?;
        }
        for element in shifted.elements.into_vec() {
            let id = element.id;
            merged.elements.try_insert(element).map_err(|_| collision(id))?;
        }
        for prop in shifted.properties {
            if !properties.insert(prop.id) {
                return Err(collision(prop.id));
            }
            merged.properties.push(prop);
        }
        for mid in shifted.materials {
            if !materials.insert(mid) {
                return Err(collision(mid));
            }
            merged.materials.push(mid);
        }

        let top = maps.max_ids();
        used = StartingIds {
            node: used.node.max(top.node),
            element: used.element.max(top.element),
            property: used.property.max(top.property),
            material: used.material.max(top.material),
        };
        all_maps.push(maps);
    }
    log::info!(
        "merged {} models: {} nodes, {} elements",
        models.len(),
        merged.coordinates.len(),
        merged.elements.len()
    );

    let equivalence = match &options.equivalence {
        Some(eq) => {
            let (out, report) = equivalence_model(&merged, eq, sink)?;
            merged = out;
            Some(report)
        }
        None => None,
    };

    Ok((
        merged,
        MergeReport {
            maps: all_maps,
            equivalence,
        },
    ))
}

fn shift_maps(model: &MeshModel, by: &StartingIds) -> Result<RenumberMaps, MeshEquivError> {
    Ok(RenumberMaps {
        nodes: IdMap::shifted(model.coordinates.ids().iter().copied(), by.node)?,
        elements: IdMap::shifted(model.elements.ids(), by.element)?,
        properties: IdMap::shifted(model.properties.iter().map(|p| p.id), by.property)?,
        materials: IdMap::shifted(model.materials.iter().copied(), by.material)?,
    })
}

fn collision<I: MeshId>(id: I) -> MeshEquivError {
    MeshEquivError::IdCollision {
        kind: I::KIND,
        id: id.raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::coordinates::Coordinates;
    use crate::data::model::Property;
    use crate::diagnostics::RecordingSink;
    use crate::topology::cell_type::CellType;
    use crate::topology::element::{Element, ElementTable};
    use crate::topology::point::{ElementId, EntityKind, MaterialId, PointId, PropertyId};

    fn pid(id: u64) -> PointId {
        PointId::new(id).unwrap()
    }

    /// One bar from `x0` to `x0 + 1` with nodes 1, 2, element 1, property 1, material 1.
    fn bar(x0: f64) -> MeshModel {
        let coords =
            Coordinates::try_from_nodes([(pid(1), [x0, 0.0, 0.0]), (pid(2), [x0 + 1.0, 0.0, 0.0])])
                .unwrap();
        let e = Element::try_new(
            ElementId::new(1).unwrap(),
            CellType::Segment,
            vec![pid(1), pid(2)],
        )
        .unwrap()
        .with_property(PropertyId::new(1).unwrap());
        let mut m = MeshModel::new(coords, ElementTable::try_from_elements([e]).unwrap());
        m.properties.push(Property {
            id: PropertyId::new(1).unwrap(),
            material: Some(MaterialId::new(1).unwrap()),
        });
        m.materials.push(MaterialId::new(1).unwrap());
        m
    }

    #[test]
    fn later_models_are_shifted() {
        let mut sink = RecordingSink::new();
        let (out, report) =
            merge_models(&[bar(0.0), bar(1.0)], &MergeOptions::default(), &mut sink).unwrap();
        assert_eq!(out.coordinates.ids(), &[pid(1), pid(2), pid(3), pid(4)]);
        let second = out.elements.get(ElementId::new(2).unwrap()).unwrap();
        assert_eq!(second.nodes, vec![pid(3), pid(4)]);
        assert_eq!(second.property, Some(PropertyId::new(2).unwrap()));
        assert_eq!(
            out.property(PropertyId::new(2).unwrap()).unwrap().material,
            Some(MaterialId::new(2).unwrap())
        );
        assert!(report.maps[0].nodes.is_identity());
        assert_eq!(report.maps[1].nodes.get(pid(1)), Some(pid(3)));
        out.validate().unwrap();
    }

    #[test]
    fn collisions_without_renumber() {
        let mut sink = RecordingSink::new();
        let opts = MergeOptions::default().with_renumber(false);
        let err = merge_models(&[bar(0.0), bar(1.0)], &opts, &mut sink).unwrap_err();
        assert_eq!(
            err,
            MeshEquivError::IdCollision {
                kind: EntityKind::Node,
                id: 1
            }
        );
    }

    #[test]
    fn merge_then_equivalence_joins_the_shared_end() {
        let mut sink = RecordingSink::new();
        let opts = MergeOptions::default().with_equivalence(EquivalenceOptions::new(0.01));
        let (out, report) = merge_models(&[bar(0.0), bar(1.0)], &opts, &mut sink).unwrap();
        assert_eq!(out.coordinates.len(), 3);
        let eq = report.equivalence.unwrap();
        assert_eq!(eq.representatives.get(pid(3)), Some(pid(2)));
        let second = out.elements.get(ElementId::new(2).unwrap()).unwrap();
        assert_eq!(second.nodes, vec![pid(2), pid(4)]);
    }

    #[test]
    fn nothing_to_merge() {
        let mut sink = RecordingSink::new();
        let (out, report) = merge_models(&[], &MergeOptions::default(), &mut sink).unwrap();
        assert!(out.coordinates.is_empty());
        assert!(report.maps.is_empty());
        assert_eq!(sink.events.len(), 1);
    }
}
