// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D geometry kernel.
//!
//! Pure functions over [`Vec2`]: rational quadratic Bézier evaluation and
//! subdivision, closest-parameter search, polygon area/centroid and the small
//! predicates used by the triangulator and hit testing.
//!
//! A curved edge is stored as an offset of its control point from the edge
//! midpoint plus a rational weight. A weight `<= 0` means "standard quadratic"
//! and is treated as `1`.

use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// 2D vector/point type used throughout the crate.
pub type Vec2 = Vector2<f32>;

/// Tolerance for degenerate lengths, areas and weights.
pub const EPSILON: f32 = 1e-6;

/// Squared offset length above which an edge counts as curved.
pub const CURVE_THRESHOLD_SQ: f32 = 0.0001;

/// Curve attached to an edge: control point offset from the edge midpoint and rational weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub offset: Vec2,
    pub weight: f32,
}

impl Curve {
    /// A straight edge.
    pub fn straight() -> Self {
        Self {
            offset: Vec2::zeros(),
            weight: 1.0,
        }
    }

    pub fn new(offset: Vec2, weight: f32) -> Self {
        Self { offset, weight }
    }

    /// Returns `true` if the offset is large enough to bend the edge.
    #[inline]
    pub fn is_curved(&self) -> bool {
        self.offset.norm_squared() > CURVE_THRESHOLD_SQ
    }

    /// Weight with the `<= 0` sentinel resolved to `1`.
    #[inline]
    pub fn effective_weight(&self) -> f32 {
        if self.weight > 0.0 {
            self.weight
        } else {
            1.0
        }
    }

    /// Absolute control point for an edge from `p0` to `p1`.
    #[inline]
    pub fn control_point(&self, p0: Vec2, p1: Vec2) -> Vec2 {
        (p0 + p1) * 0.5 + self.offset
    }
}

impl Default for Curve {
    fn default() -> Self {
        Curve::straight()
    }
}

/// 2D cross product (z component of the 3D cross).
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Rotates a vector 90 degrees counter-clockwise.
#[inline]
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Normalizes `v`, returning zero for degenerate input.
#[inline]
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    let len = v.norm();
    if len > EPSILON {
        v / len
    } else {
        Vec2::zeros()
    }
}

/// Outward normal of a boundary edge from `p0` to `p1` on a CCW face.
#[inline]
pub fn edge_outward_normal(p0: Vec2, p1: Vec2) -> Vec2 {
    -perpendicular(normalize_or_zero(p1 - p0))
}

/// Linear interpolation.
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

/// Applies a 2D affine transform in homogeneous form to a point.
#[inline]
pub fn transform_point(transform: &Matrix3<f32>, p: Vec2) -> Vec2 {
    let h = transform * Vector3::new(p.x, p.y, 1.0);
    Vec2::new(h.x, h.y)
}

/// Evaluates a rational quadratic Bézier at `t`.
///
/// `B(t) = (u²P0 + 2wut·P1 + t²P2) / (u² + 2wut + t²)` with `u = 1 - t`.
pub fn eval_quadratic_bezier(p0: Vec2, control: Vec2, p2: Vec2, t: f32, weight: f32) -> Vec2 {
    let w = if weight > 0.0 { weight } else { 1.0 };
    let u = 1.0 - t;
    let a = u * u;
    let b = 2.0 * u * t * w;
    let c = t * t;
    let denom = a + b + c;
    if denom.abs() < EPSILON {
        return lerp(p0, p2, t);
    }
    (p0 * a + control * b + p2 * c) / denom
}

/// First derivative of a rational quadratic Bézier at `t`.
pub fn quadratic_bezier_derivative(p0: Vec2, control: Vec2, p2: Vec2, t: f32, weight: f32) -> Vec2 {
    let w = if weight > 0.0 { weight } else { 1.0 };
    let u = 1.0 - t;
    let numerator = p0 * (u * u) + control * (2.0 * u * t * w) + p2 * (t * t);
    let denom = u * u + 2.0 * u * t * w + t * t;
    let d_numerator = p0 * (-2.0 * u) + control * (2.0 * w * (1.0 - 2.0 * t)) + p2 * (2.0 * t);
    let d_denom = -2.0 * u + 2.0 * w * (1.0 - 2.0 * t) + 2.0 * t;
    if denom.abs() < EPSILON {
        return p2 - p0;
    }
    (d_numerator * denom - numerator * d_denom) / (denom * denom)
}

/// Point on the edge `p0 → p1` at `t`, following the curve when one is set.
pub fn edge_point(p0: Vec2, p1: Vec2, curve: &Curve, t: f32) -> Vec2 {
    if curve.is_curved() {
        eval_quadratic_bezier(p0, curve.control_point(p0, p1), p1, t, curve.effective_weight())
    } else {
        lerp(p0, p1, t)
    }
}

/// Splits the curved edge `p0 → p2` at `t` into two curves.
///
/// Subdivision runs in homogeneous coordinates so rational curves (circular
/// arcs) split exactly; each half is renormalized to unit end weights.
/// Returns `(left, right)` for `p0 → B(t)` and `B(t) → p2`.
pub fn split_bezier(p0: Vec2, p2: Vec2, curve: &Curve, t: f32) -> (Curve, Curve) {
    let p1 = curve.control_point(p0, p2);
    let w = curve.effective_weight();
    let u = 1.0 - t;

    let left_weight = u + t * w;
    let right_weight = u * w + t;
    let mid_weight = u * u + 2.0 * u * t * w + t * t;

    let l1 = if left_weight > EPSILON {
        (p0 * u + p1 * (t * w)) / left_weight
    } else {
        p0
    };
    let r1 = if right_weight > EPSILON {
        (p1 * (u * w) + p2 * t) / right_weight
    } else {
        p2
    };
    let m = eval_quadratic_bezier(p0, p1, p2, t, w);

    let norm = mid_weight.max(EPSILON).sqrt();
    let left = Curve::new(l1 - (p0 + m) * 0.5, left_weight / norm);
    let right = Curve::new(r1 - (m + p2) * 0.5, right_weight / norm);
    (left, right)
}

/// Finds the curve parameter closest to `point`.
///
/// Seeds with the projection onto the chord, then refines with four
/// Newton-Raphson steps against the exact curve.
pub fn find_bezier_parameter(p0: Vec2, control: Vec2, p2: Vec2, weight: f32, point: Vec2) -> f32 {
    let chord = p2 - p0;
    let chord_len_sq = chord.norm_squared();
    let seed = if chord_len_sq > EPSILON {
        ((point - p0).dot(&chord) / chord_len_sq).clamp(0.0, 1.0)
    } else {
        0.5
    };
    refine_bezier_parameter(p0, control, p2, weight, point, seed)
}

/// Newton-Raphson refinement of a closest-point parameter starting at `t`.
pub fn refine_bezier_parameter(
    p0: Vec2,
    control: Vec2,
    p2: Vec2,
    weight: f32,
    point: Vec2,
    mut t: f32,
) -> f32 {
    for _ in 0..4 {
        let on_curve = eval_quadratic_bezier(p0, control, p2, t, weight);
        let derivative = quadratic_bezier_derivative(p0, control, p2, t, weight);
        let deriv_len_sq = derivative.norm_squared();
        if deriv_len_sq < EPSILON {
            break;
        }
        let dt = (on_curve - point).dot(&derivative) / deriv_len_sq;
        t = (t - dt).clamp(0.0, 1.0);
    }
    t
}

/// Curve that turns the edge `p0 → p1` into an exact circular arc around `center`.
///
/// Returns a straight curve if the tangents at the endpoints are parallel.
pub fn arc_curve(p0: Vec2, p1: Vec2, center: Vec2) -> Curve {
    let r0 = p0 - center;
    let r1 = p1 - center;
    let t0 = perpendicular(r0);
    let t1 = perpendicular(r1);

    let denom = cross(t0, t1);
    if denom.abs() < 0.0001 {
        return Curve::straight();
    }

    let s = cross(p1 - p0, t1) / denom;
    let control = p0 + t0 * s;

    let cos_angle = normalize_or_zero(r0)
        .dot(&normalize_or_zero(r1))
        .clamp(-1.0, 1.0);
    let weight = (cos_angle.acos() * 0.5).cos();

    Curve::new(control - (p0 + p1) * 0.5, weight)
}

/// Signed area of a polygon (positive for CCW).
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        twice_area += cross(points[i], points[(i + 1) % n]);
    }
    twice_area * 0.5
}

/// Area-weighted polygon centroid, falling back to the vertex average for
/// degenerate polygons.
pub fn polygon_centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::zeros();
    }

    let n = points.len();
    let mut area = 0.0;
    let mut centroid = Vec2::zeros();
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        let a = cross(p0, p1);
        area += a;
        centroid += (p0 + p1) * a;
    }
    area *= 0.5;

    if area.abs() < EPSILON {
        let sum: Vec2 = points.iter().sum();
        return sum / n as f32;
    }

    centroid / (6.0 * area)
}

/// Returns `true` if `p` is strictly inside triangle `a, b, c` (barycentric test).
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < f32::MIN_POSITIVE {
        return false;
    }
    let inv = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv;
    let v = (dot00 * dot12 - dot01 * dot02) * inv;

    u > 0.0 && v > 0.0 && u + v < 1.0
}

/// Closest point on segment `a → b` to `p` and its parameter along the segment.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f32) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn bezier_endpoints_and_midpoint() {
        let p0 = v(0.0, 0.0);
        let c = v(1.0, 2.0);
        let p2 = v(2.0, 0.0);
        assert_relative_eq!(eval_quadratic_bezier(p0, c, p2, 0.0, 1.0), p0);
        assert_relative_eq!(eval_quadratic_bezier(p0, c, p2, 1.0, 1.0), p2);
        // (0.25*p0 + 0.5*c + 0.25*p2)
        assert_relative_eq!(eval_quadratic_bezier(p0, c, p2, 0.5, 1.0), v(1.0, 1.0));
    }

    #[test]
    fn non_positive_weight_is_standard_quadratic() {
        let p0 = v(0.0, 0.0);
        let c = v(1.0, 2.0);
        let p2 = v(2.0, 0.0);
        let standard = eval_quadratic_bezier(p0, c, p2, 0.3, 1.0);
        assert_relative_eq!(eval_quadratic_bezier(p0, c, p2, 0.3, 0.0), standard);
        assert_relative_eq!(eval_quadratic_bezier(p0, c, p2, 0.3, -2.0), standard);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let p0 = v(0.0, 0.0);
        let c = v(0.4, 1.3);
        let p2 = v(2.0, 0.5);
        for &w in &[1.0, 0.7, 1.8] {
            let t = 0.35;
            let h = 1e-3;
            let numeric = (eval_quadratic_bezier(p0, c, p2, t + h, w)
                - eval_quadratic_bezier(p0, c, p2, t - h, w))
                / (2.0 * h);
            let analytic = quadratic_bezier_derivative(p0, c, p2, t, w);
            assert_relative_eq!(analytic, numeric, epsilon = 1e-2);
        }
    }

    #[test]
    fn split_halves_rejoin_standard_quadratic() {
        let p0 = v(-1.0, 0.0);
        let p2 = v(1.0, 0.0);
        let curve = Curve::new(v(0.0, 1.0), 1.0);
        let control = curve.control_point(p0, p2);
        let t = 0.5;
        let (left, right) = split_bezier(p0, p2, &curve, t);
        let m = eval_quadratic_bezier(p0, control, p2, t, 1.0);

        assert_relative_eq!(left.weight, 1.0, epsilon = 1e-5);
        assert_relative_eq!(right.weight, 1.0, epsilon = 1e-5);

        for i in 0..=10 {
            let s = i as f32 / 10.0;
            let l = eval_quadratic_bezier(p0, left.control_point(p0, m), m, s, left.weight);
            let r = eval_quadratic_bezier(m, right.control_point(m, p2), p2, s, right.weight);
            assert_relative_eq!(l, eval_quadratic_bezier(p0, control, p2, s * t, 1.0), epsilon = 1e-5);
            assert_relative_eq!(
                r,
                eval_quadratic_bezier(p0, control, p2, t + s * (1.0 - t), 1.0),
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn arc_split_stays_on_circle() {
        let center = v(0.0, 0.0);
        let p0 = v(1.0, 0.0);
        let p2 = v(0.0, 1.0);
        let arc = arc_curve(p0, p2, center);
        assert!(arc.is_curved());
        assert_relative_eq!(arc.weight, std::f32::consts::FRAC_PI_4.cos(), epsilon = 1e-5);

        let control = arc.control_point(p0, p2);
        let m = eval_quadratic_bezier(p0, control, p2, 0.3, arc.weight);
        assert_relative_eq!(m.norm(), 1.0, epsilon = 1e-4);

        let (left, right) = split_bezier(p0, p2, &arc, 0.3);
        for i in 0..=8 {
            let s = i as f32 / 8.0;
            let l = eval_quadratic_bezier(p0, left.control_point(p0, m), m, s, left.weight);
            let r = eval_quadratic_bezier(m, right.control_point(m, p2), p2, s, right.weight);
            assert_relative_eq!(l.norm(), 1.0, epsilon = 1e-4);
            assert_relative_eq!(r.norm(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn closest_parameter_refines_to_curve() {
        let p0 = v(0.0, 0.0);
        let c = v(1.0, 2.0);
        let p2 = v(2.0, 0.0);
        let target = eval_quadratic_bezier(p0, c, p2, 0.3, 1.0);
        let t = find_bezier_parameter(p0, c, p2, 1.0, target + v(0.0, 0.01));
        assert_relative_eq!(t, 0.3, epsilon = 0.02);
    }

    #[test]
    fn centroid_and_area() {
        let square = [v(-1.0, -1.0), v(1.0, -1.0), v(1.0, 1.0), v(-1.0, 1.0)];
        assert_relative_eq!(signed_area(&square), 4.0);
        assert_relative_eq!(polygon_centroid(&square), v(0.0, 0.0));

        let clockwise: Vec<Vec2> = square.iter().rev().copied().collect();
        assert_relative_eq!(signed_area(&clockwise), -4.0);

        let degenerate = [v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0)];
        assert_relative_eq!(polygon_centroid(&degenerate), v(1.0, 0.0));
    }

    #[test]
    fn triangle_containment_is_strict() {
        let a = v(0.0, 0.0);
        let b = v(2.0, 0.0);
        let c = v(0.0, 2.0);
        assert!(point_in_triangle(v(0.5, 0.5), a, b, c));
        assert!(!point_in_triangle(v(1.0, 0.0), a, b, c));
        assert!(!point_in_triangle(v(2.0, 2.0), a, b, c));
    }

    #[test]
    fn outward_normal_points_right_of_ccw_edge() {
        // Bottom edge of a CCW square runs +x; outside is -y.
        assert_relative_eq!(edge_outward_normal(v(0.0, 0.0), v(2.0, 0.0)), v(0.0, -1.0));
    }
}
