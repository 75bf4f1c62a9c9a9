//! Containment forest over closed loops.
//!
//! Classifies loops as solid boundaries or holes by depth parity under
//! the even-odd ray-crossing rule. The forest is an arena of nodes with
//! index references over the flat loop collection, never a pointer
//! graph.

use glam::DVec2;
use thiserror::Error;

use crate::chain::Chain;

/// Error type for nesting resolution
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NestingError {
    /// Every candidate sample point of the inner loop sits on an
    /// endpoint Y level of the outer loop, so the even-odd test is
    /// undefined for the pair. Reported instead of guessing.
    #[error("cannot classify loop {inner} against loop {outer}: no sample point clears the endpoint levels")]
    ContainmentAmbiguity {
        /// Index of the loop being classified
        inner: usize,
        /// Index of the loop tested against
        outer: usize,
    },
}

/// One loop in the containment forest
#[derive(Debug, Clone)]
pub struct NestingNode {
    /// Index of the loop this node describes
    pub loop_index: usize,
    /// Number of loops containing this one
    pub depth: usize,
    /// Direct container, if any
    pub parent: Option<usize>,
    /// Directly contained loops
    pub children: Vec<usize>,
    /// Even depth: a solid outer boundary. Odd depth: a hole.
    pub solid: bool,
}

/// An outer loop paired with its directly nested holes.
///
/// Produced once by the resolver and consumed by the face builder;
/// immutable thereafter.
#[derive(Debug)]
pub struct FaceDescriptor {
    /// The solid outer boundary
    pub outer: Chain,
    /// Holes one nesting level beneath the outer loop
    pub holes: Vec<Chain>,
}

/// Result of nesting resolution
#[derive(Debug)]
pub struct NestingOutcome {
    /// One descriptor per even-depth loop, ordered by depth then
    /// discovery index
    pub faces: Vec<FaceDescriptor>,
    /// The containment forest, for diagnostics
    pub nodes: Vec<NestingNode>,
    /// Pairs whose containment could not be decided
    pub errors: Vec<NestingError>,
}

/// Builds the containment forest and classifies solids and holes.
pub struct NestingResolver {
    tolerance: f64,
}

impl Default for NestingResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NestingResolver {
    /// Create a resolver with the default tolerance
    pub fn new() -> Self {
        Self {
            tolerance: crate::chain::assembler::DEFAULT_TOLERANCE,
        }
    }

    /// Set the coincidence tolerance used for sample-point selection
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Resolve a flat collection of closed loops into face descriptors.
    ///
    /// Loops involved in a containment ambiguity are excluded from face
    /// production and reported; the remaining loops still classify.
    pub fn resolve(&self, loops: Vec<Chain>) -> NestingOutcome {
        let n = loops.len();
        let mut errors = Vec::new();
        let mut ambiguous = vec![false; n];
        // containers[i] holds every loop containing loop i
        let mut containers: Vec<Vec<usize>> = vec![Vec::new(); n];

        for inner in 0..n {
            for outer in 0..n {
                if inner == outer {
                    continue;
                }
                match self.sample_point(&loops[inner], &loops[outer]) {
                    Some(sample) => {
                        if loops[outer].contains_point(sample) {
                            containers[inner].push(outer);
                        }
                    }
                    None => {
                        tracing::warn!(inner, outer, "containment ambiguity; excluding loop");
                        errors.push(NestingError::ContainmentAmbiguity { inner, outer });
                        ambiguous[inner] = true;
                    }
                }
            }
        }

        let depth: Vec<usize> = containers.iter().map(Vec::len).collect();

        let mut nodes: Vec<NestingNode> = (0..n)
            .map(|i| NestingNode {
                loop_index: i,
                depth: depth[i],
                parent: containers[i].iter().copied().find(|&c| depth[c] + 1 == depth[i]),
                children: Vec::new(),
                solid: depth[i] % 2 == 0,
            })
            .collect();
        for i in 0..n {
            if let Some(parent) = nodes[i].parent {
                nodes[parent].children.push(i);
            }
        }

        // Even-depth loops become faces carrying their direct odd-depth
        // children as holes; a depth-2 loop starts a new face inside a
        // hole. Each loop is consumed exactly once.
        let mut order: Vec<usize> = (0..n)
            .filter(|&i| !ambiguous[i] && depth[i] % 2 == 0)
            .collect();
        order.sort_by_key(|&i| (depth[i], i));

        let mut slots: Vec<Option<Chain>> = loops.into_iter().map(Some).collect();
        let mut faces = Vec::new();
        for i in order {
            let hole_indices: Vec<usize> = nodes[i]
                .children
                .iter()
                .copied()
                .filter(|&h| !ambiguous[h])
                .collect();
            let outer = slots[i].take().expect("each loop is used once");
            let holes = hole_indices
                .into_iter()
                .map(|h| slots[h].take().expect("each hole is used once"))
                .collect();
            faces.push(FaceDescriptor { outer, holes });
        }

        NestingOutcome {
            faces,
            nodes,
            errors,
        }
    }

    /// Pick a deterministic sample point of `inner` whose Y clears every
    /// endpoint Y level of `outer` by more than the tolerance.
    ///
    /// Candidates are the fragment endpoints of `inner` in order, then
    /// the fragment midpoints. None clearing the levels is a
    /// containment ambiguity.
    fn sample_point(&self, inner: &Chain, outer: &Chain) -> Option<DVec2> {
        let levels: Vec<f64> = outer
            .fragments()
            .flat_map(|f| [f.point_a().y, f.point_b().y])
            .collect();
        let clears = |p: &DVec2| levels.iter().all(|&y| (p.y - y).abs() > self.tolerance);

        inner
            .fragments()
            .flat_map(|f| [f.point_a(), f.point_b()])
            .find(|p| clears(p))
            .or_else(|| inner.fragments().map(|f| f.midpoint()).find(|p| clears(p)))
    }
}
