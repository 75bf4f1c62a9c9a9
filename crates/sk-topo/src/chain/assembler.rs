//! Fixed-point chain assembly.
//!
//! Starts from one single-fragment chain per input fragment and merges
//! chains whose free ends coincide within tolerance until no candidate
//! pair remains. Every merge reduces the open-chain count by one, so
//! the loop terminates.

use std::collections::VecDeque;

use glam::DVec2;
use thiserror::Error;

use crate::curve::CurveFragment;
use crate::nearmap::NearMap;

use super::Chain;

/// Default endpoint coincidence tolerance
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Error type for chain assembly
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssemblyError {
    /// A chain was still open when the merge fixed point was reached;
    /// the sketch boundary is malformed. Scoped to the one chain, not
    /// fatal to the batch.
    #[error("chain of {fragments} fragment(s) never closed: begin {begin}, end {end}")]
    OpenChain {
        /// Free point at the first end
        begin: DVec2,
        /// Free point at the last end
        end: DVec2,
        /// Number of fragments stranded in the open chain
        fragments: usize,
    },
}

/// Result of one assembly pass
#[derive(Debug)]
pub struct AssemblyOutcome {
    /// Chains whose free ends coincide within tolerance
    pub closed: Vec<Chain>,
    /// One entry per chain left open at the fixed point
    pub errors: Vec<AssemblyError>,
    /// Fragments dropped before assembly
    pub degenerate_fragments: usize,
}

/// Coalesces split curve fragments into closed loops.
pub struct ChainAssembler {
    tolerance: f64,
}

impl Default for ChainAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainAssembler {
    /// Create an assembler with the default tolerance
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Set the endpoint coincidence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The configured tolerance
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Assemble fragments into closed loops.
    ///
    /// Degenerate fragments are filtered and logged. Free endpoints go
    /// into a near-point index; a work queue merges coincident pairs to
    /// a fixed point. Chains still open afterwards are reported
    /// per-chain in the outcome.
    pub fn assemble(&self, fragments: Vec<CurveFragment>) -> AssemblyOutcome {
        let mut chains: Vec<Option<Chain>> = Vec::with_capacity(fragments.len());
        let mut degenerate_fragments = 0;
        for fragment in fragments {
            if fragment.is_degenerate(self.tolerance) {
                tracing::warn!(
                    a = %fragment.point_a(),
                    b = %fragment.point_b(),
                    "dropping degenerate fragment"
                );
                degenerate_fragments += 1;
                continue;
            }
            chains.push(Some(Chain::from_fragment(fragment, self.tolerance)));
        }

        let mut index = NearMap::new(self.tolerance);
        let mut queue = VecDeque::with_capacity(chains.len() * 2);
        for (slot, chain) in chains.iter().enumerate() {
            if let Some(chain) = chain {
                index.insert(chain.begin(), slot);
                index.insert(chain.end(), slot);
                queue.push_back((chain.begin(), slot));
                queue.push_back((chain.end(), slot));
            }
        }

        // Absorbed slots forward to the chain that swallowed them, so
        // stale index entries still resolve to a live chain.
        let mut forward: Vec<usize> = (0..chains.len()).collect();

        while let Some((point, tag)) = queue.pop_front() {
            let slot = resolve(&forward, tag);
            let Some(chain) = chains[slot].as_ref() else {
                continue;
            };
            if chain.is_closed() || chain.free_end_kind(point).is_err() {
                // End already consumed by an earlier merge
                continue;
            }

            let mut partner = None;
            for (_, other_tag) in index.query(point) {
                let other_slot = resolve(&forward, other_tag);
                if other_slot == slot {
                    continue;
                }
                let Some(other) = chains[other_slot].as_ref() else {
                    continue;
                };
                if !other.is_closed() && other.free_end_kind(point).is_ok() {
                    partner = Some(other_slot);
                    break;
                }
            }

            let Some(other_slot) = partner else {
                continue;
            };
            let other = chains[other_slot].take().expect("partner chain present");
            let merged = chains[slot].as_mut().expect("chain present");
            match merged.merge(other, point) {
                Ok(()) => {
                    forward[other_slot] = slot;
                    tracing::debug!(
                        slot,
                        absorbed = other_slot,
                        fragments = merged.len(),
                        "merged chains at {point}"
                    );
                }
                Err((err, rejected)) => {
                    // Both ends were verified against `point`, so this
                    // is unreachable in practice. Put the chain back so
                    // its fragments stay accounted for at the fixed
                    // point.
                    chains[other_slot] = Some(rejected);
                    tracing::warn!(%err, "merge rejected a verified coincidence");
                }
            }
        }

        let mut closed = Vec::new();
        let mut errors = Vec::new();
        for chain in chains.into_iter().flatten() {
            if chain.is_closed() {
                closed.push(chain);
            } else {
                tracing::warn!(
                    fragments = chain.len(),
                    begin = %chain.begin(),
                    end = %chain.end(),
                    "chain left open after assembly"
                );
                errors.push(AssemblyError::OpenChain {
                    begin: chain.begin(),
                    end: chain.end(),
                    fragments: chain.len(),
                });
            }
        }

        AssemblyOutcome {
            closed,
            errors,
            degenerate_fragments,
        }
    }
}

fn resolve(forward: &[usize], mut slot: usize) -> usize {
    while forward[slot] != slot {
        slot = forward[slot];
    }
    slot
}
