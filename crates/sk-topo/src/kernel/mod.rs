//! Geometry kernel abstraction.
//!
//! The face builder talks to the kernel through the `GeometryKernel`
//! trait; backends decide how edges, wires and faces are actually
//! represented and validated.

mod polyline;

pub use polyline::PolylineKernel;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for kernel operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum KernelError {
    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    #[error("invalid wire: {0}")]
    InvalidWire(String),

    #[error("face construction failed: {0}")]
    FaceRejected(String),

    #[error("kernel not available: {0}")]
    KernelNotAvailable(String),
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// A straight edge between two planar points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Start point
    pub start: DVec2,
    /// End point
    pub end: DVec2,
}

impl Edge {
    /// Create a new edge
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    /// Length of the edge
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Midpoint of the edge
    pub fn midpoint(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }
}

/// A closed loop of edges in traversal order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    /// Unique identifier
    pub id: Uuid,
    /// Edges in traversal order
    pub edges: Vec<Edge>,
}

impl Wire {
    /// Create a wire from ordered edges
    pub fn new(edges: Vec<Edge>) -> Self {
        Self {
            id: Uuid::new_v4(),
            edges,
        }
    }

    /// The edge start points in traversal order
    pub fn points(&self) -> Vec<DVec2> {
        self.edges.iter().map(|e| e.start).collect()
    }
}

/// A planar face: one outer boundary and zero or more holes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    /// Unique identifier
    pub id: Uuid,
    /// Outer boundary wire
    pub outer: Wire,
    /// Inner boundary wires subtracted from the face
    pub holes: Vec<Wire>,
}

impl Face {
    /// Create a face from an outer wire and holes
    pub fn new(outer: Wire, holes: Vec<Wire>) -> Self {
        Self {
            id: Uuid::new_v4(),
            outer,
            holes,
        }
    }

    /// Number of holes
    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }
}

/// The geometry kernel trait.
///
/// Implementations provide edge, wire and face construction with
/// whatever validation the backend supports. All operations are
/// synchronous and blocking.
pub trait GeometryKernel: Send + Sync {
    /// Name of this kernel
    fn name(&self) -> &str;

    /// Whether the kernel can build geometry
    fn is_available(&self) -> bool;

    /// Build an edge between two points
    fn make_edge(&self, start: DVec2, end: DVec2) -> KernelResult<Edge>;

    /// Assemble ordered edges into a closed wire
    fn make_wire(&self, edges: Vec<Edge>) -> KernelResult<Wire>;

    /// Build a face from an outer wire and hole wires
    fn make_face(&self, outer: Wire, holes: Vec<Wire>) -> KernelResult<Face>;
}

/// A null kernel that always returns errors (used when no kernel is
/// available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn make_edge(&self, _start: DVec2, _end: DVec2) -> KernelResult<Edge> {
        Err(KernelError::KernelNotAvailable(
            "no geometry kernel available".into(),
        ))
    }

    fn make_wire(&self, _edges: Vec<Edge>) -> KernelResult<Wire> {
        Err(KernelError::KernelNotAvailable(
            "no geometry kernel available".into(),
        ))
    }

    fn make_face(&self, _outer: Wire, _holes: Vec<Wire>) -> KernelResult<Face> {
        Err(KernelError::KernelNotAvailable(
            "no geometry kernel available".into(),
        ))
    }
}

/// Get the default geometry kernel
pub fn default_kernel() -> Box<dyn GeometryKernel> {
    Box::new(PolylineKernel::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_kernel_is_unavailable() {
        let kernel = NullKernel;
        assert!(!kernel.is_available());
        assert!(matches!(
            kernel.make_edge(DVec2::ZERO, DVec2::ONE),
            Err(KernelError::KernelNotAvailable(_))
        ));
    }

    #[test]
    fn test_edge_metrics() {
        let edge = Edge::new(DVec2::ZERO, DVec2::new(3.0, 4.0));
        assert_eq!(edge.length(), 5.0);
        assert_eq!(edge.midpoint(), DVec2::new(1.5, 2.0));
    }

    #[test]
    fn test_default_kernel_available() {
        assert!(default_kernel().is_available());
    }
}
