//! Chains: growable, mergeable sequences of curve fragments.
//!
//! A chain tracks its two logical free ends by remembering which
//! physical endpoint (A or B) of its boundary fragments is still
//! unmerged. Once the free ends coincide within tolerance the chain is
//! a closed loop.

pub mod assembler;

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TopoError;
use crate::curve::CurveFragment;
use crate::kernel::{GeometryKernel, Wire};

/// Which physical endpoint of a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhichPoint {
    /// The endpoint at the start of the parameter interval
    A,
    /// The endpoint at the end of the parameter interval
    B,
}

/// Which logical free end of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreeEnd {
    /// The end ahead of the front fragment
    First,
    /// The end behind the back fragment
    Last,
}

/// Error type for chain operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChainError {
    /// The queried point matches neither free end. Callers are expected
    /// to have verified a match beforehand, so this is an
    /// assembly-protocol violation, never silently defaulted.
    #[error("point ({x:.4}, {y:.4}) matches neither free end of the chain")]
    EndMismatch {
        /// X of the queried point
        x: f64,
        /// Y of the queried point
        y: f64,
    },

    /// A fragment connects to neither side of the running endpoint
    /// while ordering; the loop has a gap or a branch.
    #[error("fragment {index} breaks the loop walk; chain has a gap or branch")]
    NonSimpleLoop {
        /// Index of the offending fragment in traversal order
        index: usize,
    },
}

/// An ordered, mergeable sequence of curve fragments.
///
/// Fragments are owned by exactly one chain at a time; merging moves
/// them, never duplicates them.
#[derive(Debug, Clone)]
pub struct Chain {
    fragments: VecDeque<CurveFragment>,
    first_point: WhichPoint,
    last_point: WhichPoint,
    tolerance: f64,
}

impl Chain {
    /// Create a single-fragment chain
    pub fn from_fragment(fragment: CurveFragment, tolerance: f64) -> Self {
        Self {
            fragments: VecDeque::from([fragment]),
            first_point: WhichPoint::A,
            last_point: WhichPoint::B,
            tolerance,
        }
    }

    /// Number of fragments in the chain
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Chains are never empty
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The coincidence tolerance this chain was assembled with
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Iterate the fragments front to back
    pub fn fragments(&self) -> impl Iterator<Item = &CurveFragment> {
        self.fragments.iter()
    }

    /// The free point at the first end
    pub fn begin(&self) -> DVec2 {
        let first = self.fragments.front().expect("chain is never empty");
        match self.first_point {
            WhichPoint::A => first.point_a(),
            WhichPoint::B => first.point_b(),
        }
    }

    /// The free point at the last end
    pub fn end(&self) -> DVec2 {
        let last = self.fragments.back().expect("chain is never empty");
        match self.last_point {
            WhichPoint::A => last.point_a(),
            WhichPoint::B => last.point_b(),
        }
    }

    /// Whether the two free ends coincide within tolerance
    pub fn is_closed(&self) -> bool {
        self.begin().distance(self.end()) <= self.tolerance
    }

    /// Swap the roles of the two free ends and reverse fragment order.
    ///
    /// Used to make two chains' traversal directions consistent before
    /// merging.
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.first_point, &mut self.last_point);
        self.fragments = std::mem::take(&mut self.fragments).into_iter().rev().collect();
    }

    /// Which free end of this chain sits at `p`.
    ///
    /// The first end wins when both match (a closed loop has both ends
    /// at the same point). No match is an assembly-protocol violation
    /// and fails loudly.
    pub fn free_end_kind(&self, p: DVec2) -> Result<FreeEnd, ChainError> {
        if self.begin().distance(p) <= self.tolerance {
            return Ok(FreeEnd::First);
        }
        if self.end().distance(p) <= self.tolerance {
            return Ok(FreeEnd::Last);
        }
        Err(ChainError::EndMismatch { x: p.x, y: p.y })
    }

    /// Join `other` onto this chain at the verified coincidence point
    /// `at`.
    ///
    /// `other`'s fragments are prepended or appended, reversed when its
    /// traversal direction disagrees with ours. The merged chain's free
    /// ends are the two ends not involved in the join. O(m) in `other`'s
    /// fragment count.
    ///
    /// On rejection `other` is handed back untouched, so no fragment is
    /// lost when the coincidence does not hold.
    pub fn merge(&mut self, mut other: Chain, at: DVec2) -> Result<(), (ChainError, Chain)> {
        let my_end = match self.free_end_kind(at) {
            Ok(end) => end,
            Err(err) => return Err((err, other)),
        };
        let other_end = match other.free_end_kind(at) {
            Ok(end) => end,
            Err(err) => return Err((err, other)),
        };
        let moved = std::mem::take(&mut other.fragments);

        match (my_end, other_end) {
            (FreeEnd::First, FreeEnd::First) => {
                self.first_point = other.last_point;
                for fragment in moved {
                    self.fragments.push_front(fragment);
                }
            }
            (FreeEnd::First, FreeEnd::Last) => {
                self.first_point = other.first_point;
                for fragment in moved.into_iter().rev() {
                    self.fragments.push_front(fragment);
                }
            }
            (FreeEnd::Last, FreeEnd::First) => {
                self.last_point = other.last_point;
                self.fragments.extend(moved);
            }
            (FreeEnd::Last, FreeEnd::Last) => {
                self.last_point = other.first_point;
                self.fragments.extend(moved.into_iter().rev());
            }
        }
        Ok(())
    }

    /// Walk the fragments from `begin()` and derive each fragment's
    /// effective traversal direction.
    ///
    /// A fragment whose A endpoint matches the running cursor is
    /// traversed A→B, a B match flips it. Neither matching means the
    /// loop is not simple (gap or branch) and is an error, never
    /// ignored.
    pub fn order(&self) -> Result<Vec<WhichPoint>, ChainError> {
        let mut directions = Vec::with_capacity(self.fragments.len());
        let mut cursor = self.begin();
        for (index, fragment) in self.fragments.iter().enumerate() {
            if fragment.point_a().distance(cursor) <= self.tolerance {
                directions.push(WhichPoint::A);
                cursor = fragment.point_b();
            } else if fragment.point_b().distance(cursor) <= self.tolerance {
                directions.push(WhichPoint::B);
                cursor = fragment.point_a();
            } else {
                return Err(ChainError::NonSimpleLoop { index });
            }
        }
        Ok(directions)
    }

    /// The start point of each fragment in traversal order
    fn ordered_begin_points(&self) -> Result<Vec<DVec2>, ChainError> {
        let directions = self.order()?;
        Ok(self
            .fragments
            .iter()
            .zip(directions)
            .map(|(fragment, direction)| match direction {
                WhichPoint::A => fragment.point_a(),
                WhichPoint::B => fragment.point_b(),
            })
            .collect())
    }

    /// Shoelace area over the ordered, wraparound-closed endpoint
    /// sequence. Positive means counter-clockwise.
    ///
    /// Diagnostics and orientation only; nesting never uses area.
    pub fn signed_area(&self) -> Result<f64, ChainError> {
        let points = self.ordered_begin_points()?;
        let mut total = 0.0;
        for i in 0..points.len() {
            let p = points[i];
            let q = points[(i + 1) % points.len()];
            total += p.x * q.y - q.x * p.y;
        }
        Ok(total * 0.5)
    }

    /// How many fragments a horizontal +X ray from `p` crosses.
    ///
    /// `p` is inside the loop iff the count is odd.
    pub fn ray_crossing_count(&self, p: DVec2) -> usize {
        self.fragments
            .iter()
            .filter(|fragment| fragment.ray_intersects_horizontal(p))
            .count()
    }

    /// Even-odd containment test for `p` against this loop
    pub fn contains_point(&self, p: DVec2) -> bool {
        self.ray_crossing_count(p) % 2 == 1
    }

    /// Build one kernel edge per fragment in traversal order and
    /// assemble them into a closed wire.
    pub fn materialize_wire(&self, kernel: &dyn GeometryKernel) -> Result<Wire, TopoError> {
        let directions = self.order()?;
        let mut edges = Vec::with_capacity(self.fragments.len());
        for (fragment, direction) in self.fragments.iter().zip(directions) {
            let (start, end) = match direction {
                WhichPoint::A => (fragment.point_a(), fragment.point_b()),
                WhichPoint::B => (fragment.point_b(), fragment.point_a()),
            };
            edges.push(kernel.make_edge(start, end)?);
        }
        Ok(kernel.make_wire(edges)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: f64 = 1e-4;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> CurveFragment {
        CurveFragment::segment(DVec2::new(ax, ay), DVec2::new(bx, by))
    }

    /// Unit-square chain assembled by hand: (0,0)→(1,0)→(1,1)→(0,1)→(0,0)
    fn square_chain() -> Chain {
        let mut chain = Chain::from_fragment(seg(0.0, 0.0, 1.0, 0.0), TOL);
        chain
            .merge(
                Chain::from_fragment(seg(1.0, 0.0, 1.0, 1.0), TOL),
                DVec2::new(1.0, 0.0),
            )
            .unwrap();
        chain
            .merge(
                Chain::from_fragment(seg(1.0, 1.0, 0.0, 1.0), TOL),
                DVec2::new(1.0, 1.0),
            )
            .unwrap();
        chain
            .merge(
                Chain::from_fragment(seg(0.0, 1.0, 0.0, 0.0), TOL),
                DVec2::new(0.0, 1.0),
            )
            .unwrap();
        chain
    }

    #[test]
    fn test_single_fragment_ends() {
        let chain = Chain::from_fragment(seg(0.0, 0.0, 5.0, 0.0), TOL);
        assert_relative_eq!(chain.begin().x, 0.0);
        assert_relative_eq!(chain.end().x, 5.0);
        assert!(!chain.is_closed());
    }

    #[test]
    fn test_merge_closes_square() {
        let chain = square_chain();
        assert_eq!(chain.len(), 4);
        assert!(chain.is_closed(), "square should close");
        assert!(chain.order().is_ok(), "square should walk cleanly");
    }

    #[test]
    fn test_merge_reverses_opposing_direction() {
        // Second fragment points the wrong way: B end sits at the join
        let mut chain = Chain::from_fragment(seg(0.0, 0.0, 1.0, 0.0), TOL);
        let backwards = Chain::from_fragment(seg(2.0, 0.0, 1.0, 0.0), TOL);
        chain.merge(backwards, DVec2::new(1.0, 0.0)).unwrap();

        assert_eq!(chain.len(), 2);
        assert_relative_eq!(chain.begin().x, 0.0);
        assert_relative_eq!(chain.end().x, 2.0);
        assert!(chain.order().is_ok());
    }

    #[test]
    fn test_merge_at_first_end() {
        let mut chain = Chain::from_fragment(seg(1.0, 0.0, 2.0, 0.0), TOL);
        let left = Chain::from_fragment(seg(0.0, 0.0, 1.0, 0.0), TOL);
        chain.merge(left, DVec2::new(1.0, 0.0)).unwrap();

        assert_relative_eq!(chain.begin().x, 0.0);
        assert_relative_eq!(chain.end().x, 2.0);
        assert!(chain.order().is_ok());
    }

    #[test]
    fn test_rejected_merge_returns_other_chain() {
        let mut chain = Chain::from_fragment(seg(0.0, 0.0, 1.0, 0.0), TOL);
        let other = Chain::from_fragment(seg(10.0, 0.0, 11.0, 0.0), TOL);
        let (err, returned) = chain
            .merge(other, DVec2::new(50.0, 50.0))
            .unwrap_err();
        assert!(matches!(err, ChainError::EndMismatch { .. }));
        assert_eq!(returned.len(), 1, "rejected chain keeps its fragments");
        assert_eq!(chain.len(), 1, "target chain is unchanged");
    }

    #[test]
    fn test_free_end_mismatch_fails_loudly() {
        let chain = Chain::from_fragment(seg(0.0, 0.0, 1.0, 0.0), TOL);
        let err = chain.free_end_kind(DVec2::new(50.0, 50.0));
        assert!(
            matches!(err, Err(ChainError::EndMismatch { .. })),
            "mismatched point must be an error, not a default"
        );
    }

    #[test]
    fn test_reverse_negates_signed_area() {
        let mut chain = square_chain();
        let area = chain.signed_area().unwrap();
        assert_relative_eq!(area.abs(), 1.0, epsilon = 1e-12);

        chain.reverse();
        let reversed_area = chain.signed_area().unwrap();
        assert_relative_eq!(reversed_area, -area, epsilon = 1e-12);
    }

    #[test]
    fn test_ray_crossing_counts() {
        let chain = square_chain();
        assert_eq!(chain.ray_crossing_count(DVec2::new(0.5, 0.5)), 1);
        assert!(chain.contains_point(DVec2::new(0.5, 0.5)));
        assert_eq!(chain.ray_crossing_count(DVec2::new(5.0, 0.5)), 0);
        assert!(!chain.contains_point(DVec2::new(5.0, 0.5)));
        // Left of the square: both vertical edges cross
        assert_eq!(chain.ray_crossing_count(DVec2::new(-1.0, 0.5)), 2);
        assert!(!chain.contains_point(DVec2::new(-1.0, 0.5)));
    }

    #[test]
    fn test_order_detects_gap() {
        // Fragments that do not connect: forced into one chain by merge
        // at a shared point, then the far fragment replaced via a
        // disconnected construction.
        let mut chain = Chain::from_fragment(seg(0.0, 0.0, 1.0, 0.0), TOL);
        chain.fragments.push_back(seg(5.0, 5.0, 6.0, 5.0));
        let err = chain.order();
        assert_eq!(err, Err(ChainError::NonSimpleLoop { index: 1 }));
    }
}
