//! Pixel-space geometry primitives used by hit-testing and derived shapes.
//!
//! Everything here is a pure function. Degenerate input (zero-length
//! segments, collinear points, empty paths) yields a sentinel result rather
//! than NaN or a panic.

use crate::coords::PixelPos;

/// Threshold below which lengths and determinants count as zero.
pub const EPSILON: f64 = 1e-9;

/// Z component of `(a - o) x (b - o)`.
#[must_use]
pub fn cross(o: PixelPos, a: PixelPos, b: PixelPos) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Parameter of the projection of `p` onto the line through `a` and `b`,
/// `None` when the two points coincide.
fn projection_param(p: PixelPos, a: PixelPos, b: PixelPos) -> Option<f64> {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq < EPSILON {
        return None;
    }
    Some(((p.x - a.x) * vx + (p.y - a.y) * vy) / len_sq)
}

fn point_at(a: PixelPos, b: PixelPos, t: f64) -> PixelPos {
    PixelPos::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn distance_to_segment(p: PixelPos, a: PixelPos, b: PixelPos) -> f64 {
    match projection_param(p, a, b) {
        Some(t) => p.distance_to(point_at(a, b, t.clamp(0.0, 1.0))),
        None => p.distance_to(a),
    }
}

/// Distance from `p` to the ray starting at `origin` and passing through `through`.
#[must_use]
pub fn distance_to_ray(p: PixelPos, origin: PixelPos, through: PixelPos) -> f64 {
    match projection_param(p, origin, through) {
        Some(t) => p.distance_to(point_at(origin, through, t.max(0.0))),
        None => p.distance_to(origin),
    }
}

/// Distance from `p` to the infinite line through `a` and `b`.
#[must_use]
pub fn distance_to_line(p: PixelPos, a: PixelPos, b: PixelPos) -> f64 {
    match projection_param(p, a, b) {
        Some(t) => p.distance_to(point_at(a, b, t)),
        None => p.distance_to(a),
    }
}

/// Smallest distance from `p` to any segment of an open polyline.
///
/// A single vertex degrades to a point distance; an empty path has no distance.
#[must_use]
pub fn distance_to_polyline(p: PixelPos, path: &[PixelPos]) -> Option<f64> {
    match path {
        [] => None,
        [only] => Some(p.distance_to(*only)),
        _ => path
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .min_by(f64::total_cmp),
    }
}

/// Y of the line through `a` and `b` at `x`, `None` for a vertical line.
#[must_use]
pub fn interpolate_y(a: PixelPos, b: PixelPos, x: f64) -> Option<f64> {
    let dx = b.x - a.x;
    if dx.abs() < EPSILON {
        return None;
    }
    Some(a.y + (b.y - a.y) * (x - a.x) / dx)
}

/// Even-odd point-in-polygon test. Fewer than three vertices never contain anything.
#[must_use]
pub fn point_in_polygon(p: PixelPos, polygon: &[PixelPos]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let vi = polygon[i];
        let vj = polygon[j];
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = vj.x + (p.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether `p` lies between two rails.
///
/// The horizontal extent is taken from `rail_a`; inside that range each rail
/// is evaluated at `p.x` and `p.y` must fall between the two values.
/// Vertical rails contain nothing.
#[must_use]
pub fn point_in_channel(p: PixelPos, rail_a: (PixelPos, PixelPos), rail_b: (PixelPos, PixelPos)) -> bool {
    let min_x = rail_a.0.x.min(rail_a.1.x);
    let max_x = rail_a.0.x.max(rail_a.1.x);
    if p.x < min_x || p.x > max_x {
        return false;
    }
    let (Some(ya), Some(yb)) = (
        interpolate_y(rail_a.0, rail_a.1, p.x),
        interpolate_y(rail_b.0, rail_b.1, p.x),
    ) else {
        return false;
    };
    p.y >= ya.min(yb) && p.y <= ya.max(yb)
}

/// A circle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: PixelPos,
    pub radius: f64,
}

/// The unique circle through three points, `None` when they are collinear.
#[must_use]
pub fn circumcircle(a: PixelPos, b: PixelPos, c: PixelPos) -> Option<Circle> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < EPSILON {
        return None;
    }

    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;

    let center = PixelPos::new(ux, uy);
    if !center.is_finite() {
        return None;
    }
    Some(Circle {
        center,
        radius: center.distance_to(a),
    })
}

/// Control point of the quadratic Bézier from `start` to `end` that passes
/// through `mid` at t = 0.5.
#[must_use]
pub fn quadratic_control_through(start: PixelPos, end: PixelPos, mid: PixelPos) -> PixelPos {
    PixelPos::new(
        2.0 * mid.x - (start.x + end.x) / 2.0,
        2.0 * mid.y - (start.y + end.y) / 2.0,
    )
}

/// Point at parameter `t` of the quadratic Bézier `p0`, `control`, `p1`.
#[must_use]
pub fn quadratic_point(p0: PixelPos, control: PixelPos, p1: PixelPos, t: f64) -> PixelPos {
    let u = 1.0 - t;
    PixelPos::new(
        u * u * p0.x + 2.0 * u * t * control.x + t * t * p1.x,
        u * u * p0.y + 2.0 * u * t * control.y + t * t * p1.y,
    )
}

/// `segments + 1` evenly spaced samples along a quadratic Bézier, endpoints included.
#[must_use]
pub fn sample_quadratic(p0: PixelPos, control: PixelPos, p1: PixelPos, segments: usize) -> Vec<PixelPos> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| quadratic_point(p0, control, p1, i as f64 / segments as f64))
        .collect()
}

/// Approximate distance from `p` to the outline of an axis-aligned ellipse.
///
/// `None` when either radius is zero.
#[must_use]
pub fn distance_to_ellipse(p: PixelPos, center: PixelPos, rx: f64, ry: f64) -> Option<f64> {
    if rx < EPSILON || ry < EPSILON {
        return None;
    }
    let nx = (p.x - center.x) / rx;
    let ny = (p.y - center.y) / ry;
    let k = (nx * nx + ny * ny).sqrt();
    if k < EPSILON {
        return Some(rx.min(ry));
    }
    // Scale the radial offset by the ellipse radius along the pointer's direction.
    let radial = p.distance_to(center) / k;
    Some((k - 1.0).abs() * radial)
}

/// Whether `p` lies inside (or on) an axis-aligned ellipse.
#[must_use]
pub fn point_in_ellipse(p: PixelPos, center: PixelPos, rx: f64, ry: f64) -> bool {
    if rx < EPSILON || ry < EPSILON {
        return false;
    }
    let nx = (p.x - center.x) / rx;
    let ny = (p.y - center.y) / ry;
    nx * nx + ny * ny <= 1.0
}

/// Result of an ordinary least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Population standard deviation of the residuals.
    pub std_dev: f64,
}

impl LinearFit {
    #[must_use]
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares line through `samples`, `None` with fewer than two samples
/// or when every sample shares the same x.
#[must_use]
pub fn linear_regression(samples: &[(f64, f64)]) -> Option<LinearFit> {
    if samples.len() < 2 {
        return None;
    }
    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|s| s.0).sum::<f64>() / n;
    let mean_y = samples.iter().map(|s| s.1).sum::<f64>() / n;

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for &(x, y) in samples {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx < EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let variance = samples
        .iter()
        .map(|&(x, y)| {
            let r = y - (slope * x + intercept);
            r * r
        })
        .sum::<f64>()
        / n;

    let fit = LinearFit {
        slope,
        intercept,
        std_dev: variance.sqrt(),
    };
    (fit.slope.is_finite() && fit.intercept.is_finite() && fit.std_dev.is_finite()).then_some(fit)
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PixelRect {
    #[must_use]
    pub fn from_corners(a: PixelPos, b: PixelPos) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Smallest rectangle containing every finite point, `None` if there is none.
    pub fn from_points(points: impl IntoIterator<Item = PixelPos>) -> Option<Self> {
        points
            .into_iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<PixelRect>, p| {
                Some(match acc {
                    Some(r) => r.include(p),
                    None => PixelRect::from_corners(p, p),
                })
            })
    }

    #[must_use]
    pub fn include(self, p: PixelPos) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    #[must_use]
    pub fn union(self, other: PixelRect) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn contains(&self, p: PixelPos) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Distance from `p` to the rectangle's border.
    #[must_use]
    pub fn distance_to_border(&self, p: PixelPos) -> f64 {
        let corners = self.corners();
        (0..4)
            .map(|i| distance_to_segment(p, corners[i], corners[(i + 1) % 4]))
            .fold(f64::INFINITY, f64::min)
    }

    #[must_use]
    pub fn corners(&self) -> [PixelPos; 4] {
        [
            PixelPos::new(self.min_x, self.min_y),
            PixelPos::new(self.max_x, self.min_y),
            PixelPos::new(self.max_x, self.max_y),
            PixelPos::new(self.min_x, self.max_y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> PixelPos {
        PixelPos::new(x, y)
    }

    #[test]
    fn test_distance_to_segment() {
        let a = p(0.0, 0.0);
        let b = p(10.0, 0.0);
        assert_eq!(distance_to_segment(p(5.0, 0.0), a, b), 0.0);
        assert!((distance_to_segment(p(5.0, 3.0), a, b) - 3.0).abs() < 1e-9);
        // Beyond the end clamps to the endpoint.
        assert!((distance_to_segment(p(13.0, 4.0), a, b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_segment() {
        let a = p(2.0, 2.0);
        assert!((distance_to_segment(p(5.0, 6.0), a, a) - 5.0).abs() < 1e-9);
        assert!((distance_to_ray(p(5.0, 6.0), a, a) - 5.0).abs() < 1e-9);
        assert!((distance_to_line(p(5.0, 6.0), a, a) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_and_line() {
        let a = p(0.0, 0.0);
        let b = p(10.0, 0.0);
        assert!((distance_to_ray(p(50.0, 2.0), a, b) - 2.0).abs() < 1e-9);
        assert!((distance_to_ray(p(-3.0, 4.0), a, b) - 5.0).abs() < 1e-9);
        assert!((distance_to_line(p(-30.0, 2.0), a, b) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline() {
        assert_eq!(distance_to_polyline(p(0.0, 0.0), &[]), None);
        assert_eq!(distance_to_polyline(p(3.0, 4.0), &[p(0.0, 0.0)]), Some(5.0));
        let path = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)];
        assert!((distance_to_polyline(p(12.0, 5.0), &path).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_circumcircle() {
        let c = circumcircle(p(0.0, 0.0), p(10.0, 0.0), p(5.0, 5.0)).unwrap();
        assert!((c.center.x - 5.0).abs() < 1e-9);
        assert!(c.center.y.abs() < 1e-9);
        assert!((c.radius - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_circumcircle_collinear() {
        assert!(circumcircle(p(0.0, 0.0), p(5.0, 5.0), p(10.0, 10.0)).is_none());
        assert!(circumcircle(p(1.0, 1.0), p(1.0, 1.0), p(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_quadratic_through_midpoint() {
        let start = p(0.0, 0.0);
        let end = p(10.0, 0.0);
        let mid = p(5.0, -8.0);
        let control = quadratic_control_through(start, end, mid);
        let at_half = quadratic_point(start, control, end, 0.5);
        assert!(at_half.distance_to(mid) < 1e-9);

        let samples = sample_quadratic(start, control, end, 20);
        assert_eq!(samples.len(), 21);
        assert_eq!(samples[0], start);
        assert!(samples[20].distance_to(end) < 1e-9);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        assert!(point_in_polygon(p(5.0, 5.0), &square));
        assert!(!point_in_polygon(p(15.0, 5.0), &square));
        assert!(!point_in_polygon(p(5.0, 5.0), &square[..2]));
    }

    #[test]
    fn test_point_in_channel() {
        let lower = (p(0.0, 100.0), p(100.0, 50.0));
        let upper = (p(0.0, 60.0), p(100.0, 10.0));
        assert!(point_in_channel(p(50.0, 60.0), lower, upper));
        assert!(!point_in_channel(p(50.0, 90.0), lower, upper));
        assert!(!point_in_channel(p(150.0, 30.0), lower, upper));
        let vertical = (p(10.0, 0.0), p(10.0, 100.0));
        assert!(!point_in_channel(p(10.0, 50.0), vertical, vertical));
    }

    #[test]
    fn test_linear_regression() {
        let samples: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let fit = linear_regression(&samples).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!(fit.std_dev < 1e-9);
        assert!((fit.value_at(20.0) - 41.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_regression_degenerate() {
        assert!(linear_regression(&[]).is_none());
        assert!(linear_regression(&[(1.0, 1.0)]).is_none());
        assert!(linear_regression(&[(1.0, 1.0), (1.0, 5.0)]).is_none());
    }

    #[test]
    fn test_linear_regression_std_dev() {
        let samples = [(0.0, 1.0), (1.0, -1.0), (2.0, 1.0), (3.0, -1.0)];
        let fit = linear_regression(&samples).unwrap();
        assert!(fit.std_dev > 0.5);
    }

    #[test]
    fn test_ellipse() {
        let c = p(0.0, 0.0);
        assert!(point_in_ellipse(p(3.0, 0.0), c, 4.0, 2.0));
        assert!(!point_in_ellipse(p(0.0, 3.0), c, 4.0, 2.0));
        assert!(distance_to_ellipse(p(4.0, 0.0), c, 4.0, 2.0).unwrap() < 1e-9);
        assert!((distance_to_ellipse(p(0.0, 3.0), c, 4.0, 2.0).unwrap() - 1.0).abs() < 1e-9);
        assert!(distance_to_ellipse(p(1.0, 1.0), c, 0.0, 2.0).is_none());
    }

    #[test]
    fn test_rect() {
        let r = PixelRect::from_points([p(5.0, 1.0), p(-2.0, 8.0), p(f64::NAN, 0.0)]).unwrap();
        assert_eq!(r.min_x, -2.0);
        assert_eq!(r.max_y, 8.0);
        assert_eq!(r.width(), 7.0);
        assert!(r.contains(p(0.0, 4.0)));
        assert!((r.distance_to_border(p(0.0, 4.0)) - 2.0).abs() < 1e-9);
        assert!(PixelRect::from_points(Vec::new()).is_none());
    }
}
