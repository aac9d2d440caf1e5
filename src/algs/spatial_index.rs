//! Uniform hash grid over a 3-D point cloud.
//!
//! Points are bucketed by `floor(coord / cell_size)`. With `cell_size` equal
//! to the search radius, every point within the radius of a query lies in the
//! query's cell or one of its 26 neighbours, so a query touches 27 buckets
//! instead of the whole cloud.
//!
//! The index only prunes. Candidates it returns must still be checked against
//! the exact Euclidean distance by the caller (or via [`SpatialIndex::within`]).
//!
//! Degenerate clouds (one point, all points coincident, points on a line or
//! plane) need no special handling; they simply load a few buckets heavily.

use hashbrown::HashMap;

/// Why a point could not be placed in the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKeyError {
    /// A coordinate is NaN or infinite.
    NonFinite,
    /// `coord / cell_size` has no unit resolution in `i64`.
    OutOfRange,
}

type CellKey = [i64; 3];

// Beyond 2^52 consecutive cell indices are no longer distinct f64 values.
const MAX_CELL_INDEX: f64 = 4_503_599_627_370_496.0;

// Cell sizes from `cell_size_for` keep every index below 2^50, leaving room
// for the neighbour offsets of a query.
const MAX_SPAN_CELLS: f64 = 1_125_899_906_842_624.0;

/// Hash grid over a borrowed point slice; bucket entries are point indices.
#[derive(Clone, Debug)]
pub struct SpatialIndex<'a> {
    points: &'a [[f64; 3]],
    cell_size: f64,
    cells: HashMap<CellKey, Vec<u32>>,
    len: usize,
}

impl<'a> SpatialIndex<'a> {
    /// Creates an empty grid over `points`. `cell_size` must be positive and finite.
    pub fn new(points: &'a [[f64; 3]], cell_size: f64) -> Self {
        debug_assert!(cell_size.is_finite() && cell_size > 0.0);
        Self {
            points,
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Smallest usable cell size for a search `radius` over the listed points.
    ///
    /// This is `radius` itself unless the largest finite coordinate would
    /// need more than 2^50 cells per axis; then cells grow to fit and queries
    /// scan the same 27 buckets with more candidates each.
    pub fn cell_size_for<I>(radius: f64, points: &[[f64; 3]], indices: I) -> f64
    where
        I: IntoIterator<Item = u32>,
    {
        let extent = indices
            .into_iter()
            .flat_map(|i| points[i as usize])
            .filter(|c| c.is_finite())
            .fold(0.0f64, |m, c| m.max(c.abs()));
        radius.max(extent / MAX_SPAN_CELLS)
    }

    /// Builds a grid containing the listed point indices.
    ///
    /// On failure returns the offending index together with the reason.
    pub fn build<I>(
        points: &'a [[f64; 3]],
        cell_size: f64,
        indices: I,
    ) -> Result<Self, (u32, CellKeyError)>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut index = Self::new(points, cell_size);
        for i in indices {
            index.insert(i).map_err(|e| (i, e))?;
        }
        Ok(index)
    }

    /// Inserts point `i` into its bucket.
    pub fn insert(&mut self, i: u32) -> Result<(), CellKeyError> {
        let key = self.key_for(&self.points[i as usize])?;
        self.cells.entry(key).or_default().push(i);
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied buckets.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Calls `f` for every indexed point whose bucket is within
    /// `ceil(radius / cell_size)` cells of `query`'s bucket.
    pub fn for_each_candidate<F>(
        &self,
        query: &[f64; 3],
        radius: f64,
        mut f: F,
    ) -> Result<(), CellKeyError>
    where
        F: FnMut(u32),
    {
        let base = self.key_for(query)?;
        let reach = ((radius / self.cell_size).ceil() as i64).max(1);
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let key = [base[0] + dx, base[1] + dy, base[2] + dz];
                    if let Some(bucket) = self.cells.get(&key) {
                        bucket.iter().copied().for_each(&mut f);
                    }
                }
            }
        }
        Ok(())
    }

    /// Collects into `out` the indexed points within `radius` (inclusive) of
    /// `query`, as `(index, squared distance)` pairs. `out` is cleared first.
    pub fn within(
        &self,
        query: &[f64; 3],
        radius: f64,
        out: &mut Vec<(u32, f64)>,
    ) -> Result<(), CellKeyError> {
        out.clear();
        let r2 = radius * radius;
        let points = self.points;
        self.for_each_candidate(query, radius, |j| {
            let d2 = distance_squared(query, &points[j as usize]);
            if d2 <= r2 {
                out.push((j, d2));
            }
        })
    }

    fn key_for(&self, p: &[f64; 3]) -> Result<CellKey, CellKeyError> {
        let mut key = [0i64; 3];
        for (slot, &c) in key.iter_mut().zip(p.iter()) {
            if !c.is_finite() {
                return Err(CellKeyError::NonFinite);
            }
            let cell = (c / self.cell_size).floor();
            if !cell.is_finite() || cell.abs() >= MAX_CELL_INDEX {
                return Err(CellKeyError::OutOfRange);
            }
            *slot = cell as i64;
        }
        Ok(key)
    }
}

#[inline]
pub(crate) fn distance_squared(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
