//! Surviving-node selection.
//!
//! Every cluster keeps its numerically smallest node id. The choice depends
//! only on cluster membership, never on traversal or insertion order.

use std::collections::{BTreeMap, BTreeSet};

use crate::algs::cluster::Clustering;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshEquivError;
use crate::topology::point::PointId;

/// Total map from every input node id to its surviving node id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepresentativeMap {
    map: BTreeMap<PointId, PointId>,
}

impl RepresentativeMap {
    /// Every node maps to itself.
    pub fn identity<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = PointId>,
    {
        Self {
            map: ids.into_iter().map(|id| (id, id)).collect(),
        }
    }

    /// Builds the map from explicit clusters; each cluster keeps its minimum id.
    ///
    /// Clusters must be disjoint. Empty clusters are ignored.
    pub fn from_clusters<C, I>(clusters: C) -> Result<Self, MeshEquivError>
    where
        C: IntoIterator<Item = I>,
        I: IntoIterator<Item = PointId>,
    {
        let mut map = BTreeMap::new();
        for cluster in clusters {
            let members: Vec<PointId> = cluster.into_iter().collect();
            let Some(&survivor) = members.iter().min() else {
                continue;
            };
            for id in members {
                if map.insert(id, survivor).is_some() {
                    return Err(MeshEquivError::DuplicateNode(id));
                }
            }
        }
        Ok(Self { map })
    }

    /// Surviving id for `id`, or `None` if `id` was not an input node.
    #[inline]
    pub fn get(&self, id: PointId) -> Option<PointId> {
        self.map.get(&id).copied()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.map.contains_key(&id)
    }

    /// Number of input nodes covered.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// `(original, survivor)` pairs in ascending original id.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, PointId)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }

    /// Only the entries whose node was merged away.
    pub fn merged(&self) -> impl Iterator<Item = (PointId, PointId)> + '_ {
        self.iter().filter(|(k, v)| k != v)
    }

    /// Distinct surviving ids, ascending.
    pub fn survivors(&self) -> BTreeSet<PointId> {
        self.map.values().copied().collect()
    }

    /// Input node count minus distinct survivor count.
    pub fn eliminated_count(&self) -> usize {
        self.map.len() - self.survivors().len()
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().all(|(k, v)| k == v)
    }

    /// Survivor → all members (survivor included), ascending.
    pub fn clusters(&self) -> BTreeMap<PointId, Vec<PointId>> {
        let mut out: BTreeMap<PointId, Vec<PointId>> = BTreeMap::new();
        for (k, v) in self.iter() {
            out.entry(v).or_default().push(k);
        }
        out
    }
}

/// Picks one survivor per cluster of `clustering`.
///
/// `ids[i]` is the node id of point `i` of the clustering.
pub fn select_representatives(
    ids: &[PointId],
    clustering: &Clustering,
) -> Result<RepresentativeMap, MeshEquivError> {
    if ids.len() != clustering.n_points() {
        return Err(MeshEquivError::Configuration(format!(
            "{} node ids for a clustering of {} points",
            ids.len(),
            clustering.n_points()
        )));
    }
    let mut best: Vec<Option<PointId>> = vec![None; clustering.n_clusters()];
    for (i, &id) in ids.iter().enumerate() {
        let slot = &mut best[clustering.label(i) as usize];
        *slot = Some(slot.map_or(id, |cur| cur.min(id)));
    }
    let mut map = BTreeMap::new();
    for (i, &id) in ids.iter().enumerate() {
        let survivor = best[clustering.label(i) as usize].unwrap_or(id);
        if map.insert(id, survivor).is_some() {
            return Err(MeshEquivError::DuplicateNode(id));
        }
    }
    let out = RepresentativeMap { map };
    out.debug_assert_invariants();
    Ok(out)
}

impl DebugInvariants for RepresentativeMap {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "RepresentativeMap");
    }

    fn validate_invariants(&self) -> Result<(), MeshEquivError> {
        for (k, v) in self.iter() {
            if v > k {
                return Err(MeshEquivError::InvalidPermutation(format!(
                    "node {k} maps to larger survivor {v}"
                )));
            }
            if self.get(v) != Some(v) {
                return Err(MeshEquivError::InvalidPermutation(format!(
                    "survivor {v} of node {k} does not map to itself"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PointId {
        PointId::new(id).unwrap()
    }

    #[test]
    fn smallest_id_wins_regardless_of_order() {
        for order in [[7, 3, 9], [9, 7, 3], [3, 9, 7]] {
            let map = RepresentativeMap::from_clusters([order.map(pid)]).unwrap();
            for id in order {
                assert_eq!(map.get(pid(id)), Some(pid(3)));
            }
        }
    }

    #[test]
    fn overlapping_clusters_are_rejected() {
        let err = RepresentativeMap::from_clusters([vec![pid(1), pid(2)], vec![pid(2), pid(5)]])
            .unwrap_err();
        assert_eq!(err, MeshEquivError::DuplicateNode(pid(2)));
    }

    #[test]
    fn counts_and_clusters() {
        let map = RepresentativeMap::from_clusters([
            vec![pid(4), pid(2)],
            vec![pid(8)],
            vec![pid(5), pid(6), pid(7)],
        ])
        .unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(map.eliminated_count(), 3);
        assert_eq!(map.merged().count(), 3);
        assert_eq!(map.clusters()[&pid(5)], vec![pid(5), pid(6), pid(7)]);
        map.validate_invariants().unwrap();
    }

    #[test]
    fn broken_maps_fail_validation() {
        let larger = RepresentativeMap {
            map: BTreeMap::from([(pid(2), pid(2)), (pid(3), pid(3)), (pid(1), pid(2))]),
        };
        assert!(larger.validate_invariants().is_err());
        let dangling = RepresentativeMap {
            map: BTreeMap::from([(pid(4), pid(1))]),
        };
        assert!(dangling.validate_invariants().is_err());
    }

    #[test]
    #[should_panic(expected = "[invariants] RepresentativeMap")]
    #[cfg(any(debug_assertions, feature = "check-invariants", feature = "strict-invariants"))]
    fn debug_check_panics_with_context() {
        let map = RepresentativeMap {
            map: BTreeMap::from([(pid(4), pid(1))]),
        };
        map.debug_assert_invariants();
    }

    #[test]
    fn identity_is_identity() {
        let map = RepresentativeMap::identity([pid(1), pid(9)]);
        assert!(map.is_identity());
        assert_eq!(map.eliminated_count(), 0);
    }
}
