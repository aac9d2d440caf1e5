//! Node coordinate storage.
//!
//! Coordinates are stored as `[f64; 3]` triples in the resolved global frame,
//! one per node, in insertion order. A side index gives O(1) lookup by id.

use hashbrown::HashMap;

use crate::mesh_error::MeshEquivError;
use crate::topology::point::PointId;

/// Ordered node id → coordinate table.
#[derive(Clone, Debug, Default)]
pub struct Coordinates {
    ids: Vec<PointId>,
    xyz: Vec<[f64; 3]>,
    index: HashMap<PointId, usize>,
}

impl Coordinates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            xyz: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Build from `(id, xyz)` pairs, rejecting duplicate ids.
    pub fn try_from_nodes<I>(nodes: I) -> Result<Self, MeshEquivError>
    where
        I: IntoIterator<Item = (PointId, [f64; 3])>,
    {
        let nodes = nodes.into_iter();
        let mut coords = Self::with_capacity(nodes.size_hint().0);
        for (id, xyz) in nodes {
            coords.try_insert(id, xyz)?;
        }
        Ok(coords)
    }

    /// Adds a node. Non-finite values are accepted here and rejected by the
    /// equivalencer, which reports the offending node.
    pub fn try_insert(&mut self, id: PointId, xyz: [f64; 3]) -> Result<(), MeshEquivError> {
        if self.index.contains_key(&id) {
            return Err(MeshEquivError::DuplicateNode(id));
        }
        self.index.insert(id, self.ids.len());
        self.ids.push(id);
        self.xyz.push(xyz);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: PointId) -> Option<[f64; 3]> {
        self.index.get(&id).map(|&i| self.xyz[i])
    }

    /// Mutable view of one node's coordinate.
    #[inline]
    pub fn get_mut(&mut self, id: PointId) -> Option<&mut [f64; 3]> {
        let i = *self.index.get(&id)?;
        Some(&mut self.xyz[i])
    }

    #[inline]
    pub fn contains(&self, id: PointId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Node ids in insertion order.
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// `(id, xyz)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, [f64; 3])> + '_ {
        self.ids.iter().copied().zip(self.xyz.iter().copied())
    }

    /// Ids and coordinates reordered by ascending id.
    pub fn sorted_by_id(&self) -> (Vec<PointId>, Vec<[f64; 3]>) {
        let mut order: Vec<usize> = (0..self.ids.len()).collect();
        order.sort_unstable_by_key(|&i| self.ids[i]);
        let ids = order.iter().map(|&i| self.ids[i]).collect();
        let xyz = order.iter().map(|&i| self.xyz[i]).collect();
        (ids, xyz)
    }

}

impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.xyz == other.xyz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PointId {
        PointId::new(id).unwrap()
    }

    #[test]
    fn insert_and_lookup() {
        let mut c = Coordinates::new();
        c.try_insert(pid(10), [1.0, 2.0, 3.0]).unwrap();
        c.try_insert(pid(4), [0.0, 0.0, 0.0]).unwrap();
        assert_eq!(c.get(pid(10)), Some([1.0, 2.0, 3.0]));
        assert_eq!(c.get(pid(5)), None);
        assert_eq!(c.ids(), &[pid(10), pid(4)]);
        assert_eq!(
            c.try_insert(pid(4), [9.0; 3]),
            Err(MeshEquivError::DuplicateNode(pid(4)))
        );
    }

    #[test]
    fn sorted_by_id_reorders_both_columns() {
        let c = Coordinates::try_from_nodes([
            (pid(3), [3.0, 0.0, 0.0]),
            (pid(1), [1.0, 0.0, 0.0]),
            (pid(2), [2.0, 0.0, 0.0]),
        ])
        .unwrap();
        let (ids, xyz) = c.sorted_by_id();
        assert_eq!(ids, vec![pid(1), pid(2), pid(3)]);
        assert_eq!(xyz[0][0], 1.0);
        assert_eq!(xyz[2][0], 3.0);
    }
}
