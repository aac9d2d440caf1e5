//! Tolerance clustering of a point cloud.
//!
//! Two points are linked when `|p_i - p_j| <= tolerance`. Clusters are the
//! connected components of that link graph, so clustering is transitive: a
//! chain A–B–C merges into one cluster even when `|A - C| > tolerance`.
//!
//! Points are processed in ascending node-id order and each point's links are
//! applied in ascending id order, which makes the result (including which
//! merges the collapse veto rejects) reproducible for a given input.

use hashbrown::HashSet;

use crate::algs::spatial_index::{CellKeyError, SpatialIndex};
use crate::algs::union_find::UnionFind;
use crate::mesh_error::MeshEquivError;
use crate::topology::point::PointId;

/// Point index → incident element indices, in CSR layout.
#[derive(Clone, Debug, Default)]
pub struct ElementIncidence {
    offsets: Vec<usize>,
    elements: Vec<u32>,
}

impl ElementIncidence {
    /// Builds incidence for `n_points` points from per-element vertex index lists.
    pub fn from_connectivity<I, R>(n_points: usize, connectivity: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = u32>,
    {
        let mut rows: Vec<Vec<u32>> = vec![Vec::new(); n_points];
        for (e, vertices) in connectivity.into_iter().enumerate() {
            for v in vertices {
                rows[v as usize].push(e as u32);
            }
        }
        let mut offsets = Vec::with_capacity(n_points + 1);
        let mut elements = Vec::new();
        offsets.push(0);
        for mut row in rows {
            // Already ascending; dedup handles elements that repeat a vertex.
            row.dedup();
            elements.extend_from_slice(&row);
            offsets.push(elements.len());
        }
        Self { offsets, elements }
    }

    /// Elements incident to point `i`, ascending.
    pub fn row(&self, i: u32) -> &[u32] {
        let i = i as usize;
        &self.elements[self.offsets[i]..self.offsets[i + 1]]
    }

    pub fn n_points(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

/// Partition of point indices into clusters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clustering {
    labels: Vec<u32>,
    n_clusters: usize,
    vetoed: Vec<(u32, u32)>,
}

impl Clustering {
    /// Every point in its own cluster.
    pub fn singletons(n: usize) -> Self {
        Self {
            labels: (0..n as u32).collect(),
            n_clusters: n,
            vetoed: Vec::new(),
        }
    }

    /// Cluster id of point `i`; ids are dense, ordered by smallest member.
    pub fn label(&self, i: usize) -> u32 {
        self.labels[i]
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn n_points(&self) -> usize {
        self.labels.len()
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Point-index pairs that were within tolerance but kept apart.
    pub fn vetoed(&self) -> &[(u32, u32)] {
        &self.vetoed
    }

    /// Members of each cluster, ascending, indexed by cluster id.
    pub fn members(&self) -> Vec<Vec<u32>> {
        let mut out = vec![Vec::new(); self.n_clusters];
        for (i, &label) in self.labels.iter().enumerate() {
            out[label as usize].push(i as u32);
        }
        out
    }
}

/// Configures and runs one clustering pass.
#[derive(Clone, Debug)]
pub struct ClusterBuilder<'a> {
    ids: &'a [PointId],
    points: &'a [[f64; 3]],
    tolerance: f64,
    eligible: Option<&'a [bool]>,
    max_neighbors: Option<usize>,
    incidence: Option<&'a ElementIncidence>,
}

impl<'a> ClusterBuilder<'a> {
    /// `ids` must be strictly ascending and parallel to `points`.
    pub fn new(ids: &'a [PointId], points: &'a [[f64; 3]], tolerance: f64) -> Self {
        Self {
            ids,
            points,
            tolerance,
            eligible: None,
            max_neighbors: None,
            incidence: None,
        }
    }

    /// Only points with `eligible[i] == true` may merge.
    #[must_use]
    pub fn restrict_to(mut self, eligible: &'a [bool]) -> Self {
        self.eligible = Some(eligible);
        self
    }

    /// Keep at most `k` nearest links per point.
    #[must_use]
    pub fn max_neighbors(mut self, k: Option<usize>) -> Self {
        self.max_neighbors = k;
        self
    }

    /// Reject any merge that would put two vertices of one element into the
    /// same cluster.
    #[must_use]
    pub fn avoid_collapse(mut self, incidence: &'a ElementIncidence) -> Self {
        self.incidence = Some(incidence);
        self
    }

    pub fn build(&self) -> Result<Clustering, MeshEquivError> {
        self.check_inputs()?;
        let n = self.points.len();
        if self.tolerance <= 0.0 || n == 0 {
            return Ok(Clustering::singletons(n));
        }

        let eligible: Vec<u32> = (0..n as u32)
            .filter(|&i| self.eligible.map_or(true, |e| e[i as usize]))
            .collect();
        let cell_size =
            SpatialIndex::cell_size_for(self.tolerance, self.points, eligible.iter().copied());
        let index = SpatialIndex::build(self.points, cell_size, eligible.iter().copied())
            .map_err(|(i, e)| self.key_error(i, e))?;
        log::debug!(
            "spatial index: {} points in {} cells (cell size {})",
            index.len(),
            index.cell_count(),
            index.cell_size()
        );

        let mut links = Linker {
            uf: UnionFind::new(n),
            touched: self
                .incidence
                .map(|inc| (0..n as u32).map(|i| inc.row(i).to_vec()).collect()),
            vetoed: HashSet::new(),
        };

        let mut candidates = Vec::new();
        for &i in &eligible {
            index
                .within(&self.points[i as usize], self.tolerance, &mut candidates)
                .map_err(|e| self.key_error(i, e))?;
            match self.max_neighbors {
                Some(k) => {
                    candidates.retain(|&(j, _)| j != i);
                    candidates.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
                    candidates.truncate(k);
                }
                None => candidates.retain(|&(j, _)| j > i),
            }
            candidates.sort_unstable_by_key(|&(j, _)| j);
            for &(j, _) in &candidates {
                links.link(i, j);
            }
        }

        let (labels, n_clusters) = links.uf.labels();
        let mut vetoed: Vec<(u32, u32)> = links.vetoed.into_iter().collect();
        vetoed.sort_unstable();
        Ok(Clustering {
            labels,
            n_clusters,
            vetoed,
        })
    }

    fn check_inputs(&self) -> Result<(), MeshEquivError> {
        if self.ids.len() != self.points.len() {
            return Err(MeshEquivError::Configuration(format!(
                "{} node ids for {} points",
                self.ids.len(),
                self.points.len()
            )));
        }
        if let Some(w) = self.ids.windows(2).find(|w| w[0] >= w[1]) {
            return Err(MeshEquivError::Configuration(format!(
                "node ids must be strictly ascending ({} before {})",
                w[0], w[1]
            )));
        }
        if let Some(e) = self.eligible {
            if e.len() != self.points.len() {
                return Err(MeshEquivError::Configuration(format!(
                    "restriction mask has {} entries for {} points",
                    e.len(),
                    self.points.len()
                )));
            }
        }
        if let Some(inc) = self.incidence {
            if inc.n_points() != self.points.len() {
                return Err(MeshEquivError::Configuration(format!(
                    "element incidence covers {} points, expected {}",
                    inc.n_points(),
                    self.points.len()
                )));
            }
        }
        if self.max_neighbors == Some(0) {
            return Err(MeshEquivError::Configuration(
                "max_neighbors must be at least 1".into(),
            ));
        }
        if self.tolerance.is_nan() || self.tolerance.is_infinite() {
            return Err(MeshEquivError::Configuration(format!(
                "tolerance must be finite, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    fn key_error(&self, i: u32, err: CellKeyError) -> MeshEquivError {
        let node = self.ids[i as usize];
        match err {
            CellKeyError::NonFinite => MeshEquivError::NonFiniteCoordinate { node },
            CellKeyError::OutOfRange => MeshEquivError::GridOverflow { node },
        }
    }
}

struct Linker {
    uf: UnionFind,
    /// Per root: sorted incident elements of the whole cluster.
    touched: Option<Vec<Vec<u32>>>,
    vetoed: HashSet<(u32, u32)>,
}

impl Linker {
    fn link(&mut self, i: u32, j: u32) {
        let ri = self.uf.find(i);
        let rj = self.uf.find(j);
        if ri == rj {
            return;
        }
        if let Some(touched) = self.touched.as_mut() {
            if shares_element(&touched[ri as usize], &touched[rj as usize]) {
                self.vetoed.insert((i.min(j), i.max(j)));
                return;
            }
            let a = std::mem::take(&mut touched[ri as usize]);
            let b = std::mem::take(&mut touched[rj as usize]);
            touched[ri.min(rj) as usize] = merge_sorted(a, b);
        }
        self.uf.union_keep_min(ri, rj);
    }
}

fn shares_element(a: &[u32], b: &[u32]) -> bool {
    let (mut x, mut y) = (0, 0);
    while x < a.len() && y < b.len() {
        match a[x].cmp(&b[y]) {
            std::cmp::Ordering::Less => x += 1,
            std::cmp::Ordering::Greater => y += 1,
            std::cmp::Ordering::Equal => return true,
        }
    }
    false
}

fn merge_sorted(a: Vec<u32>, b: Vec<u32>) -> Vec<u32> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend(itertools::merge(a, b));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> Vec<PointId> {
        (1..=n).map(|i| PointId::new(i).unwrap()).collect()
    }

    #[test]
    fn chain_is_clustered_transitively() {
        let pts = [[0.0, 0.0, 0.0], [0.0, 0.0, 0.9], [0.0, 0.0, 1.8]];
        let ids = ids(3);
        let c = ClusterBuilder::new(&ids, &pts, 1.0).build().unwrap();
        assert_eq!(c.n_clusters(), 1);
        assert_eq!(c.labels(), &[0, 0, 0]);
    }

    #[test]
    fn non_positive_tolerance_gives_singletons() {
        let pts = [[0.0; 3]; 4];
        let ids = ids(4);
        for tol in [0.0, -1.0] {
            let c = ClusterBuilder::new(&ids, &pts, tol).build().unwrap();
            assert_eq!(c, Clustering::singletons(4));
        }
    }

    #[test]
    fn restriction_mask_blocks_merges() {
        let pts = [[0.0; 3]; 3];
        let ids = ids(3);
        let mask = [true, false, true];
        let c = ClusterBuilder::new(&ids, &pts, 0.1)
            .restrict_to(&mask)
            .build()
            .unwrap();
        assert_eq!(c.n_clusters(), 2);
        assert_eq!(c.label(0), c.label(2));
        assert_ne!(c.label(0), c.label(1));
    }

    #[test]
    fn neighbour_cap_limits_links() {
        // Two tight pairs, all four points within tolerance of each other.
        let pts = [
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0],
            [0.6, 0.0, 0.0],
            [0.7, 0.0, 0.0],
        ];
        let ids = ids(4);
        let open = ClusterBuilder::new(&ids, &pts, 1.0).build().unwrap();
        assert_eq!(open.n_clusters(), 1);

        // With one link per point each point only reaches its pair partner.
        let capped = ClusterBuilder::new(&ids, &pts, 1.0)
            .max_neighbors(Some(1))
            .build()
            .unwrap();
        assert_eq!(capped.n_clusters(), 2);
        assert_eq!(capped.labels(), &[0, 0, 1, 1]);
    }

    #[test]
    fn collapse_veto_keeps_element_vertices_apart() {
        // Segment element over points 0 and 1, which coincide with point 2.
        let pts = [[0.0; 3], [0.0; 3], [0.0; 3]];
        let ids = ids(3);
        let inc = ElementIncidence::from_connectivity(3, [vec![0u32, 1]]);
        let c = ClusterBuilder::new(&ids, &pts, 0.1)
            .avoid_collapse(&inc)
            .build()
            .unwrap();
        // 0–1 vetoed; 0–2 merges; 1–2 then vetoed because 2 joined 0.
        assert_eq!(c.n_clusters(), 2);
        assert_eq!(c.label(0), c.label(2));
        assert_eq!(c.vetoed(), &[(0, 1), (1, 2)]);
    }

    #[test]
    fn nan_coordinate_names_the_node() {
        let pts = [[0.0; 3], [f64::NAN, 0.0, 0.0]];
        let ids = vec![PointId::new(10).unwrap(), PointId::new(20).unwrap()];
        let err = ClusterBuilder::new(&ids, &pts, 1.0).build().unwrap_err();
        assert_eq!(
            err,
            MeshEquivError::NonFiniteCoordinate {
                node: PointId::new(20).unwrap()
            }
        );
    }

    #[test]
    fn unsorted_ids_are_rejected() {
        let pts = [[0.0; 3]; 2];
        let ids = vec![PointId::new(2).unwrap(), PointId::new(1).unwrap()];
        assert!(matches!(
            ClusterBuilder::new(&ids, &pts, 1.0).build(),
            Err(MeshEquivError::Configuration(_))
        ));
    }
}
