//! Pixel-space building blocks of a drawing's derived geometry.
//!
//! Each drawing type derives a list of [`Part`]s from its projected points.
//! Hit-testing and bounds are answered generically over the parts.

use crate::coords::PixelPos;
use crate::geometry::{
    distance_to_ellipse, distance_to_line, distance_to_polyline, distance_to_ray, distance_to_segment,
    point_in_channel, point_in_ellipse, point_in_polygon, Circle, PixelRect,
};

use super::style::TextStyle;

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Segment(PixelPos, PixelPos),
    /// Starts at `.0`, passes through `.1` and continues indefinitely.
    Ray(PixelPos, PixelPos),
    /// Infinite line through both points.
    Line(PixelPos, PixelPos),
    HorizontalLine { y: f64 },
    VerticalLine { x: f64 },
    /// Horizontal ray from `origin`, to the right unless `leftward`.
    HorizontalRay { origin: PixelPos, leftward: bool },
    /// Open path, also used for sampled curves.
    Polyline(Vec<PixelPos>),
    /// Closed outline; the interior counts as a hit when `filled`.
    Polygon { vertices: Vec<PixelPos>, filled: bool },
    Ellipse { center: PixelPos, rx: f64, ry: f64, filled: bool },
    Circle { circle: Circle, filled: bool },
    /// Interior between two rails. Only the interior is hittable; the rails
    /// themselves are separate parts.
    Band { rail_a: (PixelPos, PixelPos), rail_b: (PixelPos, PixelPos) },
    /// Text box. The whole box is hittable.
    Label(PixelRect),
}

impl Part {
    /// Distance from `p` to the outline, `None` when not measurable.
    pub fn distance(&self, p: PixelPos) -> Option<f64> {
        match self {
            Part::Segment(a, b) => Some(distance_to_segment(p, *a, *b)),
            Part::Ray(a, b) => Some(distance_to_ray(p, *a, *b)),
            Part::Line(a, b) => Some(distance_to_line(p, *a, *b)),
            Part::HorizontalLine { y } => Some((p.y - y).abs()),
            Part::VerticalLine { x } => Some((p.x - x).abs()),
            Part::HorizontalRay { origin, leftward } => {
                let through = origin.offset(if *leftward { -1.0 } else { 1.0 }, 0.0);
                Some(distance_to_ray(p, *origin, through))
            }
            Part::Polyline(path) => distance_to_polyline(p, path),
            Part::Polygon { vertices, .. } => {
                if vertices.len() < 2 {
                    return distance_to_polyline(p, vertices);
                }
                vertices
                    .iter()
                    .zip(vertices.iter().cycle().skip(1))
                    .map(|(a, b)| distance_to_segment(p, *a, *b))
                    .min_by(f64::total_cmp)
            }
            Part::Ellipse { center, rx, ry, .. } => distance_to_ellipse(p, *center, *rx, *ry),
            Part::Circle { circle, .. } => Some((p.distance_to(circle.center) - circle.radius).abs()),
            Part::Band { .. } => None,
            Part::Label(rect) => Some(if rect.contains(p) { 0.0 } else { rect.distance_to_border(p) }),
        }
    }

    /// Whether `p` lies in a filled interior.
    pub fn contains(&self, p: PixelPos) -> bool {
        match self {
            Part::Polygon { vertices, filled: true } => point_in_polygon(p, vertices),
            Part::Ellipse { center, rx, ry, filled: true } => point_in_ellipse(p, *center, *rx, *ry),
            Part::Circle { circle, filled: true } => p.distance_to(circle.center) <= circle.radius,
            Part::Band { rail_a, rail_b } => point_in_channel(p, *rail_a, *rail_b),
            Part::Label(rect) => rect.contains(p),
            _ => false,
        }
    }

    pub fn hit(&self, p: PixelPos, threshold: f64) -> bool {
        self.contains(p) || self.distance(p).is_some_and(|d| d <= threshold)
    }

    /// Finite extent of the part. Unbounded parts report only their anchors.
    pub fn bounds(&self) -> Option<PixelRect> {
        match self {
            Part::Segment(a, b) | Part::Ray(a, b) | Part::Line(a, b) => PixelRect::from_points([*a, *b]),
            Part::HorizontalLine { .. } | Part::VerticalLine { .. } => None,
            Part::HorizontalRay { origin, .. } => PixelRect::from_points([*origin]),
            Part::Polyline(path) => PixelRect::from_points(path.iter().copied()),
            Part::Polygon { vertices, .. } => PixelRect::from_points(vertices.iter().copied()),
            Part::Ellipse { center, rx, ry, .. } => {
                PixelRect::from_points([center.offset(-rx, -ry), center.offset(*rx, *ry)])
            }
            Part::Circle { circle, .. } => {
                let r = circle.radius;
                PixelRect::from_points([circle.center.offset(-r, -r), circle.center.offset(r, r)])
            }
            Part::Band { rail_a, rail_b } => {
                PixelRect::from_points([rail_a.0, rail_a.1, rail_b.0, rail_b.1])
            }
            Part::Label(rect) => Some(*rect),
        }
    }
}

/// Approximate box occupied by `text` drawn with its baseline-left corner at `anchor`.
pub fn label_rect(anchor: PixelPos, text: &TextStyle) -> PixelRect {
    const PADDING: f64 = 4.0;
    let chars = text.content.chars().count().max(1) as f64;
    let width = chars * text.font_size * 0.6 + PADDING * 2.0;
    let height = text.font_size * 1.4;
    PixelRect::from_corners(anchor.offset(0.0, -height), anchor.offset(width, 0.0))
}
