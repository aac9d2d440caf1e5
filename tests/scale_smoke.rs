mod util;

use std::time::{Duration, Instant};

use mesh_equiv::algs::equivalence::{EquivalenceOptions, equivalence_nodes};
use mesh_equiv::algs::spatial_index::SpatialIndex;
use mesh_equiv::diagnostics::RecordingSink;
use util::*;

#[test]
fn hundred_thousand_points_with_planted_duplicates() {
    let n = 100_000u64;
    let dupes = 1_000u64;
    let mut c = random_cloud(n as usize, 100.0, 42);
    for id in 1..=dupes {
        let xyz = c.get(pid(id)).unwrap();
        c.try_insert(pid(n + id), xyz).unwrap();
    }
    let elements = chain(&c);

    let mut sink = RecordingSink::new();
    let start = Instant::now();
    let report =
        equivalence_nodes(&c, &elements, &EquivalenceOptions::new(1e-6), &mut sink).unwrap();
    let elapsed = start.elapsed();

    assert!(report.eliminated >= dupes as usize);
    for id in 1..=dupes {
        assert_eq!(
            report.representatives.get(pid(n + id)),
            report.representatives.get(pid(id))
        );
    }
    assert_eq!(report.representatives.len(), (n + dupes) as usize);
    assert!(elapsed < Duration::from_secs(10), "equivalencing took {elapsed:?}");
}

#[test]
fn grid_queries_scan_few_candidates() {
    let (_, points) = random_cloud(100_000, 100.0, 7).sorted_by_id();
    let all = 0..points.len() as u32;
    let cell = SpatialIndex::cell_size_for(1e-6, &points, all.clone());
    let index = SpatialIndex::build(&points, cell, all).unwrap();

    let mut scanned = 0usize;
    let queries = points.iter().step_by(10);
    let count = queries.len();
    for q in queries {
        index.for_each_candidate(q, 1e-6, |_| scanned += 1).unwrap();
    }
    let average = scanned as f64 / count as f64;
    assert!(average >= 1.0);
    assert!(average < 4.0, "{average} candidates per query");
}
