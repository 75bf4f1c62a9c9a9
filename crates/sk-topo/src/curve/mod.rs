//! Parametric curve model for planar sketch fragments.
//!
//! Curves are shared, externally-owned geometry; fragments are trimmed,
//! directed views over them. The curve abstraction is a trait with
//! variant implementations (line, arc, polyline) so one loop can mix
//! curve kinds freely.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use glam::DVec2;

/// A planar parametric curve.
///
/// Implementations must be pure: evaluation has no side effects and the
/// same parameter always yields the same point.
pub trait Curve: fmt::Debug + Send + Sync {
    /// Evaluate the curve position at parameter `u`.
    fn point_at(&self, u: f64) -> DVec2;

    /// Inverse evaluation: the parameter of the curve point closest to `p`.
    ///
    /// `p` is not required to lie on the curve; callers use this for
    /// ray-crossing tests where an approximate inverse is sufficient.
    fn param_at(&self, p: DVec2) -> f64;

    /// The valid parameter domain `(min, max)`.
    fn domain(&self) -> (f64, f64);
}

/// An infinite-precision line segment parameterized over `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Point at parameter 0
    pub start: DVec2,
    /// Point at parameter 1
    pub end: DVec2,
}

impl Line {
    /// Create a line segment between two points
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }
}

impl Curve for Line {
    fn point_at(&self, u: f64) -> DVec2 {
        self.start.lerp(self.end, u)
    }

    fn param_at(&self, p: DVec2) -> f64 {
        let d = self.end - self.start;
        let len_sq = d.length_squared();
        if len_sq == 0.0 {
            return 0.0;
        }
        (p - self.start).dot(d) / len_sq
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

/// A circular arc parameterized by angle in radians.
///
/// The domain runs from `start_angle` to `end_angle`; a full circle is
/// an arc spanning `TAU`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularArc {
    /// Center of the supporting circle
    pub center: DVec2,
    /// Radius of the supporting circle
    pub radius: f64,
    /// Angle at the start of the domain
    pub start_angle: f64,
    /// Angle at the end of the domain
    pub end_angle: f64,
}

impl CircularArc {
    /// Create an arc; `end_angle` may exceed `start_angle` by up to a full turn
    pub fn new(center: DVec2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// A full circle starting at angle 0
    pub fn circle(center: DVec2, radius: f64) -> Self {
        Self::new(center, radius, 0.0, TAU)
    }
}

impl Curve for CircularArc {
    fn point_at(&self, u: f64) -> DVec2 {
        self.center + self.radius * DVec2::from_angle(u)
    }

    fn param_at(&self, p: DVec2) -> f64 {
        let mut angle = (p - self.center).to_angle();
        let (lo, hi) = self.domain();
        while angle < lo {
            angle += TAU;
        }
        while angle > hi && angle - TAU >= lo {
            angle -= TAU;
        }
        angle
    }

    fn domain(&self) -> (f64, f64) {
        if self.start_angle <= self.end_angle {
            (self.start_angle, self.end_angle)
        } else {
            (self.end_angle, self.start_angle)
        }
    }
}

/// A piecewise-linear curve, the stand-in for generic splines.
///
/// Parameterized by segment index plus fraction: `u = 1.5` is the
/// midpoint of the second segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// Control points, at least two
    pub points: Vec<DVec2>,
}

impl Polyline {
    /// Create a polyline through the given points
    pub fn new(points: Vec<DVec2>) -> Self {
        debug_assert!(points.len() >= 2, "polyline needs at least two points");
        Self { points }
    }
}

impl Curve for Polyline {
    fn point_at(&self, u: f64) -> DVec2 {
        let max = (self.points.len() - 1) as f64;
        let u = u.clamp(0.0, max);
        let i = (u.floor() as usize).min(self.points.len() - 2);
        let t = u - i as f64;
        self.points[i].lerp(self.points[i + 1], t)
    }

    fn param_at(&self, p: DVec2) -> f64 {
        let mut best_u = 0.0;
        let mut best_dist = f64::INFINITY;
        for i in 0..self.points.len() - 1 {
            let a = self.points[i];
            let b = self.points[i + 1];
            let d = b - a;
            let len_sq = d.length_squared();
            let t = if len_sq == 0.0 {
                0.0
            } else {
                ((p - a).dot(d) / len_sq).clamp(0.0, 1.0)
            };
            let dist = p.distance(a.lerp(b, t));
            if dist < best_dist {
                best_dist = dist;
                best_u = i as f64 + t;
            }
        }
        best_u
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, (self.points.len() - 1) as f64)
    }
}

/// A trimmed, directed view over a shared parametric curve.
///
/// The fragment references its curve through an `Arc`; many fragments
/// produced by splitting one sketch entity share the same curve value.
/// Endpoints are derived on demand by evaluating the curve at the
/// interval bounds.
#[derive(Debug, Clone)]
pub struct CurveFragment {
    curve: Arc<dyn Curve>,
    u0: f64,
    u1: f64,
}

impl CurveFragment {
    /// Create a fragment over `[u0, u1]` of `curve`.
    ///
    /// The interval must lie within the curve's valid domain; the bounds
    /// may be given in either order.
    pub fn new(curve: Arc<dyn Curve>, u0: f64, u1: f64) -> Self {
        let (lo, hi) = curve.domain();
        debug_assert!(
            u0.min(u1) >= lo - 1e-9 && u0.max(u1) <= hi + 1e-9,
            "fragment interval [{u0}, {u1}] outside curve domain [{lo}, {hi}]"
        );
        Self { curve, u0, u1 }
    }

    /// A line-segment fragment between two points
    pub fn segment(start: DVec2, end: DVec2) -> Self {
        Self::new(Arc::new(Line::new(start, end)), 0.0, 1.0)
    }

    /// The physical endpoint at the `u0` interval bound
    pub fn point_a(&self) -> DVec2 {
        self.curve.point_at(self.u0)
    }

    /// The physical endpoint at the `u1` interval bound
    pub fn point_b(&self) -> DVec2 {
        self.curve.point_at(self.u1)
    }

    /// The curve point halfway through the interval
    pub fn midpoint(&self) -> DVec2 {
        self.curve.point_at((self.u0 + self.u1) * 0.5)
    }

    /// Whether the fragment is too small to take part in assembly.
    ///
    /// Degenerate means a collapsed parameter interval, or endpoints that
    /// coincide while the fragment itself has near-zero length. A full
    /// circle has coincident endpoints but real length and is kept.
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        if (self.u1 - self.u0).abs() <= f64::EPSILON {
            return true;
        }
        let a = self.point_a();
        let b = self.point_b();
        if a.distance(b) > tolerance {
            return false;
        }
        let mid = self.midpoint();
        a.distance(mid) + mid.distance(b) <= tolerance
    }

    /// Even-odd crossing test against a horizontal ray cast from `p`
    /// toward +X.
    ///
    /// True iff `p.y` lies strictly between the two endpoint Y values and
    /// the fragment's X at the matching parameter exceeds `p.x`. The
    /// strict comparison is the tie-break convention: an endpoint whose Y
    /// equals `p.y` never counts as a crossing, so a sample point sitting
    /// on an endpoint level must be resampled by the caller.
    ///
    /// Assumes the fragment is monotone in Y: the upstream intersection
    /// split cuts curves at their horizontal tangents, so a fragment
    /// never spans a Y extremum. A non-monotone fragment would cross the
    /// ray twice inside the endpoint band but be counted once, breaking
    /// the parity contract.
    pub fn ray_intersects_horizontal(&self, p: DVec2) -> bool {
        let a = self.point_a();
        let b = self.point_b();
        let between = (p.y < b.y && p.y > a.y) || (p.y > b.y && p.y < a.y);
        if !between {
            return false;
        }
        let u = self.curve.param_at(p);
        self.curve.point_at(u).x > p.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_line_evaluation() {
        let line = Line::new(DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0));
        assert_relative_eq!(line.point_at(0.5).x, 5.0);
        assert_relative_eq!(line.param_at(DVec2::new(2.5, 3.0)), 0.25);
    }

    #[test]
    fn test_arc_evaluation() {
        let arc = CircularArc::new(DVec2::ZERO, 2.0, 0.0, PI);
        let top = arc.point_at(PI / 2.0);
        assert_relative_eq!(top.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(top.y, 2.0);
        assert_relative_eq!(arc.param_at(DVec2::new(0.0, 5.0)), PI / 2.0);
    }

    #[test]
    fn test_polyline_inverse() {
        let poly = Polyline::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
        ]);
        // Closest point to (10, 5) is halfway up the second segment
        assert_relative_eq!(poly.param_at(DVec2::new(11.0, 5.0)), 1.5);
        assert_relative_eq!(poly.point_at(1.5).y, 5.0);
    }

    #[test]
    fn test_fragment_endpoints() {
        let frag = CurveFragment::segment(DVec2::new(1.0, 2.0), DVec2::new(3.0, 4.0));
        assert_relative_eq!(frag.point_a().x, 1.0);
        assert_relative_eq!(frag.point_b().y, 4.0);
        assert_relative_eq!(frag.midpoint().x, 2.0);
    }

    #[test]
    fn test_ray_crossing_vertical_segment() {
        let frag = CurveFragment::segment(DVec2::new(5.0, 0.0), DVec2::new(5.0, 10.0));
        // Segment lies to the right of the sample point
        assert!(frag.ray_intersects_horizontal(DVec2::new(3.0, 5.0)));
        // Segment lies to the left
        assert!(!frag.ray_intersects_horizontal(DVec2::new(7.0, 5.0)));
        // Sample above the segment
        assert!(!frag.ray_intersects_horizontal(DVec2::new(3.0, 11.0)));
    }

    #[test]
    fn test_ray_crossing_equal_endpoint_y_never_counts() {
        let horizontal = CurveFragment::segment(DVec2::new(0.0, 5.0), DVec2::new(10.0, 5.0));
        assert!(!horizontal.ray_intersects_horizontal(DVec2::new(-1.0, 5.0)));

        // Vertex-exact sample: p.y equals an endpoint y
        let slanted = CurveFragment::segment(DVec2::new(5.0, 5.0), DVec2::new(10.0, 10.0));
        assert!(!slanted.ray_intersects_horizontal(DVec2::new(0.0, 5.0)));
    }

    #[test]
    fn test_ray_crossing_monotone_arc() {
        // Right half-circle, monotone in Y from (0,-2) up to (0,2)
        let arc = CircularArc::new(DVec2::ZERO, 2.0, -PI / 2.0, PI / 2.0);
        let frag = CurveFragment::new(Arc::new(arc), -PI / 2.0, PI / 2.0);
        // Crossing at x = 2 lies to the right of the sample
        assert!(frag.ray_intersects_horizontal(DVec2::new(1.0, 0.0)));
        // Sample beyond the arc
        assert!(!frag.ray_intersects_horizontal(DVec2::new(3.0, 0.0)));
        // Endpoint levels never count
        assert!(!frag.ray_intersects_horizontal(DVec2::new(0.0, 2.0)));
    }

    #[test]
    fn test_degenerate_fragment() {
        let zero_span = CurveFragment::new(
            Arc::new(Line::new(DVec2::ZERO, DVec2::new(1.0, 0.0))),
            0.5,
            0.5,
        );
        assert!(zero_span.is_degenerate(1e-4));

        let tiny = CurveFragment::segment(DVec2::ZERO, DVec2::new(1e-6, 0.0));
        assert!(tiny.is_degenerate(1e-4));

        // Full circle: coincident endpoints but real length
        let circle = CircularArc::circle(DVec2::ZERO, 3.0);
        let frag = CurveFragment::new(Arc::new(circle), 0.0, TAU);
        assert!(!frag.is_degenerate(1e-4));
    }
}
