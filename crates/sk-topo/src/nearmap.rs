//! 2D near-point index.
//!
//! A uniform-grid hash used by the assembler to find free chain ends
//! that coincide within tolerance. Cell size equals the tolerance, so a
//! 3x3 cell neighborhood is guaranteed to cover every candidate.

use std::collections::HashMap;

use glam::DVec2;

/// Spatial index mapping 2D points to tags of type `T`.
#[derive(Debug, Clone)]
pub struct NearMap<T> {
    tolerance: f64,
    cells: HashMap<(i64, i64), Vec<(DVec2, T)>>,
}

impl<T: Copy> NearMap<T> {
    /// Create an index with the given coincidence tolerance
    pub fn new(tolerance: f64) -> Self {
        debug_assert!(tolerance > 0.0, "tolerance must be positive");
        Self {
            tolerance,
            cells: HashMap::new(),
        }
    }

    fn key(&self, p: DVec2) -> (i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
        )
    }

    /// Insert a tagged point
    pub fn insert(&mut self, p: DVec2, tag: T) {
        self.cells.entry(self.key(p)).or_default().push((p, tag));
    }

    /// All tagged points within tolerance of `p`
    pub fn query(&self, p: DVec2) -> Vec<(DVec2, T)> {
        let (cx, cy) = self.key(p);
        let mut hits = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &(q, tag) in bucket {
                        if q.distance(p) <= self.tolerance {
                            hits.push((q, tag));
                        }
                    }
                }
            }
        }
        hits
    }

    /// Number of points inserted
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
