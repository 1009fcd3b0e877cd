/// Torus-knot sampling and the closed Catmull-Rom spline built through it
use std::f32::consts::TAU;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CurveError;
use crate::frames::{self, FrenetFrame};

/// Number of chord segments used to approximate the arc length.
pub const ARC_LENGTH_DIVISIONS: usize = 200;

/// Smallest segment count that still forms a closed loop.
pub const MIN_SEGMENTS: usize = 3;

/// Largest segment count accepted.
pub const MAX_SEGMENTS: usize = 4096;

/// Position on a (p, q) torus knot at angle `u`.
///
/// `p` must be non-zero; use [`TorusKnot::validate`] before calling this with
/// user input.
pub fn position_on_curve(u: f32, p: i32, q: i32, radius: f32) -> Point3<f32> {
    let cu = u.cos();
    let su = u.sin();
    let qu_over_p = (q as f32 / p as f32) * u;
    let cs = qu_over_p.cos();

    Point3::new(
        radius * (2.0 + cs) * 0.5 * cu,
        radius * (2.0 + cs) * su * 0.5,
        radius * qu_over_p.sin() * 0.5,
    )
}

/// Shape parameters of a torus knot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusKnot {
    pub radius: f32,
    pub tubular_segments: usize,
    pub p: i32,
    pub q: i32,
}

impl Default for TorusKnot {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tubular_segments: 64,
            p: 2,
            q: 3,
        }
    }
}

impl TorusKnot {
    pub fn new(radius: f32, tubular_segments: usize, p: i32, q: i32) -> Self {
        Self {
            radius,
            tubular_segments,
            p,
            q,
        }
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        if self.p < 1 {
            return Err(CurveError::InvalidWinding(self.p));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(CurveError::InvalidRadius(self.radius));
        }
        if self.tubular_segments < MIN_SEGMENTS {
            return Err(CurveError::TooFewSegments(self.tubular_segments));
        }
        if self.tubular_segments > MAX_SEGMENTS {
            return Err(CurveError::TooManySegments(self.tubular_segments));
        }
        Ok(())
    }

    /// Sample `tubular_segments` points; the closing point is not repeated.
    pub fn points(&self) -> Result<Vec<Point3<f32>>, CurveError> {
        self.validate()?;

        let segments = self.tubular_segments as f32;
        let points = (0..self.tubular_segments)
            .map(|i| {
                let u = (i as f32 / segments) * self.p as f32 * TAU;
                position_on_curve(u, self.p, self.q, self.radius)
            })
            .collect();
        Ok(points)
    }

    /// Sample the knot and wrap the samples in a closed spline.
    pub fn curve(&self) -> Result<ClosedCurve, CurveError> {
        let points = self.points()?;
        debug!(
            radius = self.radius,
            segments = self.tubular_segments,
            p = self.p,
            q = self.q,
            "generated torus knot"
        );
        Ok(ClosedCurve::new(points))
    }
}

/// Closed centripetal Catmull-Rom spline with an arc-length table.
#[derive(Debug, Clone)]
pub struct ClosedCurve {
    points: Vec<Point3<f32>>,
    lengths: Vec<f32>,
}

impl ClosedCurve {
    /// Build a looping spline through `points`. Callers pass at least
    /// [`MIN_SEGMENTS`] points; [`TorusKnot::curve`] guarantees it.
    pub fn new(points: Vec<Point3<f32>>) -> Self {
        let mut curve = Self {
            points,
            lengths: Vec::new(),
        };
        curve.lengths = curve.cumulative_lengths(ARC_LENGTH_DIVISIONS);
        curve
    }

    /// The control points the spline passes through.
    pub fn control_points(&self) -> &[Point3<f32>] {
        &self.points
    }

    /// Total arc length.
    pub fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at spline parameter `t`; `t` wraps, so `point(0) == point(1)`.
    pub fn point(&self, t: f32) -> Point3<f32> {
        let span = self.span(t);
        Point3::new(span.x.eval(span.weight), span.y.eval(span.weight), span.z.eval(span.weight))
    }

    /// Unit tangent at spline parameter `t`.
    pub fn tangent(&self, t: f32) -> Vector3<f32> {
        let span = self.span(t);
        let derivative = Vector3::new(
            span.x.derivative(span.weight),
            span.y.derivative(span.weight),
            span.z.derivative(span.weight),
        );
        if let Some(unit) = derivative.try_normalize(1e-9) {
            return unit;
        }

        // Zero-length span: fall back to a finite difference across it.
        let delta = 1e-3;
        (self.point(t + delta) - self.point(t - delta))
            .try_normalize(1e-9)
            .unwrap_or_else(Vector3::x)
    }

    /// Point at arc-length fraction `u`; `u` wraps around the loop.
    pub fn point_at(&self, u: f32) -> Point3<f32> {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at arc-length fraction `u`.
    pub fn tangent_at(&self, u: f32) -> Vector3<f32> {
        self.tangent(self.u_to_t(u))
    }

    /// `divisions + 1` points evenly spaced in `t`; first and last coincide.
    pub fn points(&self, divisions: usize) -> Vec<Point3<f32>> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point(i as f32 / divisions as f32))
            .collect()
    }

    /// `divisions + 1` points evenly spaced along the arc length.
    pub fn spaced_points(&self, divisions: usize) -> Vec<Point3<f32>> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point_at(i as f32 / divisions as f32))
            .collect()
    }

    /// Parallel-transport frames at `segments + 1` arc-length stations.
    pub fn frenet_frames(&self, segments: usize) -> Vec<FrenetFrame> {
        let segments = segments.max(1);
        let tangents: Vec<Vector3<f32>> = (0..=segments)
            .map(|i| self.tangent_at(i as f32 / segments as f32))
            .collect();
        frames::parallel_transport(&tangents, true)
    }

    /// Map an arc-length fraction to the spline parameter.
    pub fn u_to_t(&self, u: f32) -> f32 {
        let u = u.rem_euclid(1.0);
        let count = self.lengths.len();
        let total = self.length();
        if count < 2 || total <= 0.0 {
            return u;
        }

        let target = u * total;
        let upper = self.lengths.partition_point(|&len| len <= target);
        let i = upper.saturating_sub(1).min(count - 2);

        let before = self.lengths[i];
        let segment = self.lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (i as f32 + fraction) / (count - 1) as f32
    }

    fn cumulative_lengths(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut total = 0.0;
        let mut last = self.point(0.0);
        lengths.push(0.0);
        for i in 1..=divisions {
            let current = self.point(i as f32 / divisions as f32);
            total += (current - last).norm();
            lengths.push(total);
            last = current;
        }
        lengths
    }

    fn span(&self, t: f32) -> Span {
        let count = self.points.len();
        let scaled = count as f32 * t.rem_euclid(1.0);
        let index = scaled.floor() as usize;
        let weight = scaled - index as f32;

        let at = |offset: isize| {
            let i = (index as isize + offset).rem_euclid(count as isize) as usize;
            self.points[i]
        };
        let (p0, p1, p2, p3) = (at(-1), at(0), at(1), at(2));

        // Centripetal knot spacing: chord length raised to 0.5.
        let mut dt0 = (p1 - p0).norm_squared().powf(0.25);
        let mut dt1 = (p2 - p1).norm_squared().powf(0.25);
        let mut dt2 = (p3 - p2).norm_squared().powf(0.25);
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        Span {
            x: CubicPoly::nonuniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2),
            y: CubicPoly::nonuniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2),
            z: CubicPoly::nonuniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2),
            weight,
        }
    }
}

struct Span {
    x: CubicPoly,
    y: CubicPoly,
    z: CubicPoly,
    weight: f32,
}

#[derive(Debug, Clone, Copy)]
struct CubicPoly {
    c0: f32,
    c1: f32,
    c2: f32,
    c3: f32,
}

impl CubicPoly {
    fn nonuniform(x0: f32, x1: f32, x2: f32, x3: f32, dt0: f32, dt1: f32, dt2: f32) -> Self {
        let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
        let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;

        Self {
            c0: x1,
            c1: t1,
            c2: -3.0 * x1 + 3.0 * x2 - 2.0 * t1 - t2,
            c3: 2.0 * x1 - 2.0 * x2 + t1 + t2,
        }
    }

    fn eval(&self, t: f32) -> f32 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }

    fn derivative(&self, t: f32) -> f32 {
        self.c1 + 2.0 * self.c2 * t + 3.0 * self.c3 * t * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn classic_knot_starts_at_one_and_a_half() {
        let p = position_on_curve(0.0, 2, 3, 1.0);
        assert_relative_eq!(p, Point3::new(1.5, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn point_count_matches_segments_and_neighbours_differ() {
        let knot = TorusKnot::new(1.0, 64, 2, 3);
        let points = knot.points().unwrap();
        assert_eq!(points.len(), 64);
        for i in 0..points.len() {
            let next = points[(i + 1) % points.len()];
            assert!((points[i] - next).norm() > 1e-4, "samples {i} and its successor coincide");
        }
    }

    #[test]
    fn rejects_zero_winding() {
        let knot = TorusKnot::new(1.0, 64, 0, 3);
        assert_eq!(knot.points().unwrap_err(), CurveError::InvalidWinding(0));
    }

    #[test]
    fn rejects_bad_radius_and_segments() {
        assert_eq!(
            TorusKnot::new(0.0, 64, 2, 3).validate(),
            Err(CurveError::InvalidRadius(0.0))
        );
        assert!(TorusKnot::new(f32::NAN, 64, 2, 3).validate().is_err());
        assert_eq!(
            TorusKnot::new(1.0, 2, 2, 3).validate(),
            Err(CurveError::TooFewSegments(2))
        );
        assert!(TorusKnot::new(1.0, 3, 2, 3).validate().is_ok());
    }

    #[test]
    fn rejects_oversized_segment_counts() {
        assert!(TorusKnot::new(1.0, MAX_SEGMENTS, 2, 3).validate().is_ok());
        assert_eq!(
            TorusKnot::new(1.0, MAX_SEGMENTS + 1, 2, 3).points(),
            Err(CurveError::TooManySegments(MAX_SEGMENTS + 1))
        );
        assert_eq!(
            TorusKnot::new(1.0, usize::MAX, 2, 3).curve().map(|_| ()),
            Err(CurveError::TooManySegments(usize::MAX))
        );
    }

    #[test]
    fn radius_scales_distance_from_origin() {
        let base = TorusKnot::new(1.0, 48, 3, 5).points().unwrap();
        let scaled = TorusKnot::new(2.5, 48, 3, 5).points().unwrap();
        for (a, b) in base.iter().zip(&scaled) {
            assert_relative_eq!(b.coords.norm(), a.coords.norm() * 2.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn closed_curve_is_continuous_at_the_wrap() {
        let curve = TorusKnot::default().curve().unwrap();
        assert_relative_eq!(curve.point(0.0), curve.point(1.0), epsilon = 1e-5);
        assert_relative_eq!(curve.point(0.0), curve.point(0.999_999), epsilon = 1e-3);
        assert_relative_eq!(curve.tangent(0.0), curve.tangent(1.0), epsilon = 1e-5);
    }

    #[test]
    fn spline_passes_through_samples() {
        let knot = TorusKnot::default();
        let curve = knot.curve().unwrap();
        let points = knot.points().unwrap();
        for (i, sample) in points.iter().enumerate() {
            let t = i as f32 / points.len() as f32;
            assert_relative_eq!(curve.point(t), *sample, epsilon = 1e-4);
        }
    }

    #[test]
    fn denser_sampling_converges_to_the_knot() {
        let max_error = |segments: usize| {
            let curve = TorusKnot::new(1.0, segments, 2, 3).curve().unwrap();
            (0..500)
                .map(|i| {
                    let t = i as f32 / 500.0;
                    let exact = position_on_curve(t * 2.0 * TAU, 2, 3, 1.0);
                    (curve.point(t) - exact).norm()
                })
                .fold(0.0_f32, f32::max)
        };
        let coarse = max_error(16);
        let fine = max_error(256);
        assert!(fine < coarse);
        assert!(fine < 1e-3, "dense spline strays {fine} from the knot");
    }

    #[test]
    fn arc_length_mapping_is_monotonic_and_closed() {
        let curve = TorusKnot::default().curve().unwrap();
        let mut last = -1.0;
        for i in 0..100 {
            let t = curve.u_to_t(i as f32 / 100.0);
            assert!(t > last);
            last = t;
        }
        assert_relative_eq!(curve.point_at(0.0), curve.point(0.0), epsilon = 1e-6);
        assert_relative_eq!(curve.point_at(1.0), curve.point_at(0.0), epsilon = 1e-6);
    }

    #[test]
    fn spaced_points_are_roughly_equidistant() {
        let curve = TorusKnot::default().curve().unwrap();
        let points = curve.spaced_points(50);
        let expected = curve.length() / 50.0;
        for pair in points.windows(2) {
            let gap = (pair[1] - pair[0]).norm();
            assert!((gap - expected).abs() < expected * 0.05);
        }
    }

    #[test]
    fn tangents_are_unit_length() {
        let curve = TorusKnot::default().curve().unwrap();
        for i in 0..40 {
            assert_relative_eq!(curve.tangent_at(i as f32 / 40.0).norm(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn repeated_control_points_do_not_produce_nan() {
        let p = Point3::new(1.0, 0.0, 0.0);
        let curve = ClosedCurve::new(vec![p, p, Point3::new(0.0, 1.0, 0.0), Point3::origin()]);
        for i in 0..20 {
            let t = i as f32 / 20.0;
            assert!(curve.point(t).coords.iter().all(|c| c.is_finite()));
            assert!(curve.tangent(t).iter().all(|c| c.is_finite()));
        }
    }
}
