//! Renumbering utilities for nodes, elements, properties and materials.
//!
//! New ids are contiguous from a per-kind starting id. Entities keep their
//! relative order of first appearance in the deck unless `round_ids` asks for
//! ascending numeric order. Every cross reference (element → node,
//! element → property, property → material) is rewritten consistently.

use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::data::coordinates::Coordinates;
use crate::data::model::{MeshModel, Property};
use crate::mesh_error::MeshEquivError;
use crate::topology::element::{Element, ElementTable};
use crate::topology::point::{ElementId, EntityKind, MaterialId, MeshId, PointId, PropertyId};

/// Bidirectional old ↔ new mapping for one entity kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdMap<I: MeshId> {
    old_to_new: HashMap<I, I>,
    new_to_old: Vec<I>,
}

impl<I: MeshId> Default for IdMap<I> {
    fn default() -> Self {
        Self {
            old_to_new: HashMap::new(),
            new_to_old: Vec::new(),
        }
    }
}

impl<I: MeshId> IdMap<I> {
    /// Every id maps to itself.
    pub fn identity<It>(ids: It) -> Self
    where
        It: IntoIterator<Item = I>,
    {
        let mut map = Self::default();
        for id in ids {
            if !map.old_to_new.contains_key(&id) {
                map.old_to_new.insert(id, id);
                map.new_to_old.push(id);
            }
        }
        map
    }

    /// Every id maps to `id + offset`.
    pub fn shifted<It>(ids: It, offset: u64) -> Result<Self, MeshEquivError>
    where
        It: IntoIterator<Item = I>,
    {
        let mut map = Self::default();
        for id in ids {
            if map.old_to_new.contains_key(&id) {
                continue;
            }
            let raw = id.raw().checked_add(offset).ok_or_else(|| {
                MeshEquivError::Configuration(format!("{} id {id} + {offset} overflows", I::KIND))
            })?;
            map.old_to_new.insert(id, I::try_from_raw(raw)?);
            map.new_to_old.push(id);
        }
        Ok(map)
    }

    /// New id for `old`.
    pub fn get(&self, old: I) -> Option<I> {
        self.old_to_new.get(&old).copied()
    }

    /// New id for `old`, or an error naming the missing id.
    pub fn map(&self, old: I) -> Result<I, MeshEquivError> {
        self.get(old).ok_or_else(|| {
            MeshEquivError::InvalidPermutation(format!("missing {} {old:?}", I::KIND))
        })
    }

    pub fn len(&self) -> usize {
        self.new_to_old.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_to_old.is_empty()
    }

    /// Old ids in the order new ids were handed out.
    pub fn new_to_old(&self) -> &[I] {
        &self.new_to_old
    }

    /// `(old, new)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (I, I)> + '_ {
        self.new_to_old.iter().map(|&old| (old, self.old_to_new[&old]))
    }

    /// Largest new id handed out.
    pub fn max_new(&self) -> Option<u64> {
        self.old_to_new.values().map(|id| id.raw()).max()
    }

    pub fn is_identity(&self) -> bool {
        self.old_to_new.iter().all(|(k, v)| k == v)
    }

    /// Adds `offset` to every new id.
    pub fn offset(&self, offset: u64) -> Result<Self, MeshEquivError> {
        let mut out = Self::default();
        for (old, new) in self.iter() {
            let raw = new.raw().checked_add(offset).ok_or_else(|| {
                MeshEquivError::Configuration(format!("{} id {new} + {offset} overflows", I::KIND))
            })?;
            out.old_to_new.insert(old, I::try_from_raw(raw)?);
            out.new_to_old.push(old);
        }
        Ok(out)
    }
}

fn next_id(start: u64, idx: usize, kind: EntityKind) -> Result<u64, MeshEquivError> {
    start
        .checked_add(idx as u64)
        .ok_or_else(|| MeshEquivError::Configuration(format!("{kind} ids overflow from {start}")))
}

/// Assigns contiguous ids from `start` to `ids`, deduplicated.
///
/// Order is first appearance, or ascending old id with `round_ids`.
pub fn renumber_ids<I, It>(ids: It, start: u64, round_ids: bool) -> Result<IdMap<I>, MeshEquivError>
where
    I: MeshId,
    It: IntoIterator<Item = I>,
{
    if start == 0 {
        return Err(MeshEquivError::Configuration(format!(
            "starting {} id must be at least 1",
            I::KIND
        )));
    }
    let mut seen = HashSet::new();
    let mut order: Vec<I> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if round_ids {
        order.sort_unstable();
    }
    let mut map = IdMap::default();
    for (idx, old) in order.into_iter().enumerate() {
        let new = I::try_from_raw(next_id(start, idx, I::KIND)?)?;
        map.old_to_new.insert(old, new);
        map.new_to_old.push(old);
    }
    Ok(map)
}

/// First new id per entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingIds {
    pub node: u64,
    pub element: u64,
    pub property: u64,
    pub material: u64,
}

impl Default for StartingIds {
    fn default() -> Self {
        Self {
            node: 1,
            element: 1,
            property: 1,
            material: 1,
        }
    }
}

impl StartingIds {
    pub fn get(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Node => self.node,
            EntityKind::Element => self.element,
            EntityKind::Property => self.property,
            EntityKind::Material => self.material,
        }
    }
}

/// Options for [`renumber_model`] and [`superelement_renumber`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenumberOptions {
    pub starting_ids: StartingIds,
    /// Assign new ids in ascending old-id order instead of deck order.
    pub round_ids: bool,
}

/// One [`IdMap`] per entity kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenumberMaps {
    pub nodes: IdMap<PointId>,
    pub elements: IdMap<ElementId>,
    pub properties: IdMap<PropertyId>,
    pub materials: IdMap<MaterialId>,
}

impl RenumberMaps {
    /// Maps that leave `model` unchanged.
    pub fn identity(model: &MeshModel) -> Self {
        Self {
            nodes: IdMap::identity(model.coordinates.ids().iter().copied()),
            elements: IdMap::identity(model.elements.ids()),
            properties: IdMap::identity(model.properties.iter().map(|p| p.id)),
            materials: IdMap::identity(model.materials.iter().copied()),
        }
    }

    /// Largest new id per kind (0 when the kind is empty).
    pub fn max_ids(&self) -> StartingIds {
        StartingIds {
            node: self.nodes.max_new().unwrap_or(0),
            element: self.elements.max_new().unwrap_or(0),
            property: self.properties.max_new().unwrap_or(0),
            material: self.materials.max_new().unwrap_or(0),
        }
    }

    /// Adds a per-kind offset to every new id.
    pub fn offset(&self, by: &StartingIds) -> Result<Self, MeshEquivError> {
        Ok(Self {
            nodes: self.nodes.offset(by.node)?,
            elements: self.elements.offset(by.element)?,
            properties: self.properties.offset(by.property)?,
            materials: self.materials.offset(by.material)?,
        })
    }

    /// Rewrites every id and cross reference of `model`. Deck order is kept.
    pub fn apply(&self, model: &MeshModel) -> Result<MeshModel, MeshEquivError> {
        let mut coordinates = Coordinates::with_capacity(model.coordinates.len());
        for (id, xyz) in model.coordinates.iter() {
            coordinates.try_insert(self.nodes.map(id)?, xyz)?;
        }

        let mut elements = ElementTable::with_capacity(model.elements.len());
        for element in &model.elements {
            let nodes = element
                .nodes
                .iter()
                .map(|&n| self.nodes.map(n))
                .collect::<Result<Vec<_>, _>>()?;
            let property = element.property.map(|p| self.properties.map(p)).transpose()?;
            elements.try_insert(Element {
                id: self.elements.map(element.id)?,
                cell_type: element.cell_type,
                nodes,
                property,
            })?;
        }

        let properties = model
            .properties
            .iter()
            .map(|p| {
                Ok(Property {
                    id: self.properties.map(p.id)?,
                    material: p.material.map(|m| self.materials.map(m)).transpose()?,
                })
            })
            .collect::<Result<Vec<_>, MeshEquivError>>()?;
        let materials = model
            .materials
            .iter()
            .map(|&m| self.materials.map(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MeshModel {
            coordinates,
            elements,
            properties,
            materials,
        })
    }
}

/// Renumbers all four entity kinds of `model`.
pub fn renumber_model(
    model: &MeshModel,
    options: &RenumberOptions,
) -> Result<(MeshModel, RenumberMaps), MeshEquivError> {
    model.validate()?;
    let maps = build_maps(model, &options.starting_ids, options.round_ids)?;
    let out = maps.apply(model)?;
    log::debug!(
        "renumbered {} nodes, {} elements, {} properties, {} materials",
        maps.nodes.len(),
        maps.elements.len(),
        maps.properties.len(),
        maps.materials.len()
    );
    Ok((out, maps))
}

/// Renumbers each superelement group in isolation, then offsets every group
/// past the ids used by the groups before it (ascending superelement id).
///
/// The first group starts at `options.starting_ids`.
pub fn superelement_renumber(
    groups: &BTreeMap<u32, MeshModel>,
    options: &RenumberOptions,
) -> Result<(BTreeMap<u32, MeshModel>, BTreeMap<u32, RenumberMaps>), MeshEquivError> {
    let start = options.starting_ids;
    for kind in EntityKind::ALL {
        if start.get(kind) == 0 {
            return Err(MeshEquivError::Configuration(format!(
                "starting {kind} id must be at least 1"
            )));
        }
    }
    let mut used = StartingIds {
        node: start.node - 1,
        element: start.element - 1,
        property: start.property - 1,
        material: start.material - 1,
    };

    let mut models = BTreeMap::new();
    let mut all_maps = BTreeMap::new();
    for (&seid, model) in groups {
        model.validate()?;
        let local = build_maps(model, &StartingIds::default(), options.round_ids)?;
        let maps = local.offset(&used)?;
        let top = maps.max_ids();
        used = StartingIds {
            node: used.node.max(top.node),
            element: used.element.max(top.element),
            property: used.property.max(top.property),
            material: used.material.max(top.material),
        };
        log::debug!("superelement {seid}: nodes up to {}", used.node);
        models.insert(seid, maps.apply(model)?);
        all_maps.insert(seid, maps);
    }
    Ok((models, all_maps))
}

fn build_maps(
    model: &MeshModel,
    start: &StartingIds,
    round_ids: bool,
) -> Result<RenumberMaps, MeshEquivError> {
    Ok(RenumberMaps {
        nodes: renumber_ids(model.coordinates.ids().iter().copied(), start.node, round_ids)?,
        elements: renumber_ids(model.elements.ids(), start.element, round_ids)?,
        properties: renumber_ids(model.properties.iter().map(|p| p.id), start.property, round_ids)?,
        materials: renumber_ids(model.materials.iter().copied(), start.material, round_ids)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PointId {
        PointId::new(id).unwrap()
    }

    #[test]
    fn first_appearance_order() {
        let map = renumber_ids([pid(30), pid(10), pid(20), pid(10)], 1, false).unwrap();
        assert_eq!(map.get(pid(30)), Some(pid(1)));
        assert_eq!(map.get(pid(10)), Some(pid(2)));
        assert_eq!(map.get(pid(20)), Some(pid(3)));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn round_ids_sorts_numerically() {
        let map = renumber_ids([pid(30), pid(10), pid(20)], 100, true).unwrap();
        assert_eq!(map.get(pid(10)), Some(pid(100)));
        assert_eq!(map.get(pid(30)), Some(pid(102)));
        assert_eq!(map.max_new(), Some(102));
    }

    #[test]
    fn zero_start_is_rejected() {
        assert!(matches!(
            renumber_ids([pid(1)], 0, false),
            Err(MeshEquivError::Configuration(_))
        ));
    }

    #[test]
    fn shifted_and_offset_agree() {
        let a = IdMap::shifted([pid(1), pid(5)], 10).unwrap();
        assert_eq!(a.get(pid(5)), Some(pid(15)));
        let b = IdMap::identity([pid(1), pid(5)]).offset(10).unwrap();
        assert_eq!(a, b);
        assert!(IdMap::shifted([pid(u64::MAX)], 1).is_err());
    }
}
