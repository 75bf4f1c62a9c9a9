//! Pure Rust polyline kernel backend.
//!
//! Represents every edge as a straight segment and validates wires and
//! faces with planar predicates: wires must close and must not
//! self-intersect, holes must lie inside their outer boundary.

use glam::DVec2;

use super::{Edge, Face, GeometryKernel, KernelError, KernelResult, Wire};

/// Polyline-based geometry kernel
pub struct PolylineKernel {
    tolerance: f64,
}

impl Default for PolylineKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl PolylineKernel {
    /// Create a kernel with the default tolerance
    pub fn new() -> Self {
        Self {
            tolerance: crate::chain::assembler::DEFAULT_TOLERANCE,
        }
    }

    /// Set the connectivity tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl GeometryKernel for PolylineKernel {
    fn name(&self) -> &str {
        "polyline"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn make_edge(&self, start: DVec2, end: DVec2) -> KernelResult<Edge> {
        if start.distance(end) <= self.tolerance {
            return Err(KernelError::InvalidEdge(format!(
                "edge endpoints coincide at {start}"
            )));
        }
        Ok(Edge::new(start, end))
    }

    fn make_wire(&self, edges: Vec<Edge>) -> KernelResult<Wire> {
        if edges.len() < 2 {
            return Err(KernelError::InvalidWire(format!(
                "{} edge(s) cannot form a closed wire",
                edges.len()
            )));
        }
        for pair in edges.windows(2) {
            if pair[0].end.distance(pair[1].start) > self.tolerance {
                return Err(KernelError::InvalidWire(format!(
                    "edges disconnect between {} and {}",
                    pair[0].end, pair[1].start
                )));
            }
        }
        let first = edges[0].start;
        let last = edges[edges.len() - 1].end;
        if first.distance(last) > self.tolerance {
            return Err(KernelError::InvalidWire(format!(
                "wire is not closed: {first} to {last}"
            )));
        }
        if let Some((i, j)) = first_self_intersection(&edges) {
            return Err(KernelError::InvalidWire(format!(
                "wire self-intersects between edges {i} and {j}"
            )));
        }
        Ok(Wire::new(edges))
    }

    fn make_face(&self, outer: Wire, holes: Vec<Wire>) -> KernelResult<Face> {
        let boundary = outer.points();
        for (i, hole) in holes.iter().enumerate() {
            let inside = hole
                .points()
                .iter()
                .all(|&p| point_in_polygon(p, &boundary));
            if !inside {
                return Err(KernelError::FaceRejected(format!(
                    "hole {i} is not inside the outer boundary"
                )));
            }
        }
        Ok(Face::new(outer, holes))
    }
}

/// First pair of non-adjacent edges that properly cross, if any
fn first_self_intersection(edges: &[Edge]) -> Option<(usize, usize)> {
    let n = edges.len();
    for i in 0..n {
        for j in i + 1..n {
            // Skip adjacent edges (sharing an endpoint), including the
            // wraparound pair.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            if segments_cross(edges[i], edges[j]) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Strict proper-crossing test for two segments
fn segments_cross(a: Edge, b: Edge) -> bool {
    let d1 = orient(b.start, b.end, a.start);
    let d2 = orient(b.start, b.end, a.end);
    let d3 = orient(a.start, a.end, b.start);
    let d4 = orient(a.start, a.end, b.end);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Even-odd point-in-polygon test over polygon vertices, half-open on
/// the vertex Y levels
fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if x > p.x {
                inside = !inside;
            }
        }
    }
    inside
}
