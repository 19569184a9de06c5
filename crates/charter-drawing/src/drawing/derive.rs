//! Per-type derivation of pixel geometry from projected points.
//!
//! Everything here is pure: given the logical points, their pixel projection,
//! the style and the current view, produce the parts used for hit-testing and
//! rendering. Degenerate inputs yield fewer parts, never NaN geometry.

use charter_core::bars_in_range;

use super::metrics::{
    arc_params, channel_offset, ellipse_params, extension_levels, fib_channel_levels, retracement_levels,
    time_zones, ArcParams, LevelValue, RegressionChannel,
};
use super::parts::{label_rect, Part};
use super::style::{Style, StyleExt, TextStyle};
use super::types::{DrawingKind, LogicalPoint};
use crate::coords::{ChartView, PixelPos};
use crate::geometry::{linear_regression, quadratic_control_through, sample_quadratic, Circle as PixelCircle, PixelRect};

const ARROW_HEAD_LEN: f64 = 10.0;

/// Output of a derivation pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct Derived {
    pub parts: Vec<Part>,
    pub arc: Option<ArcParams>,
    pub regression: Option<RegressionChannel>,
}

impl Derived {
    fn parts(parts: Vec<Part>) -> Self {
        Self { parts, ..Self::default() }
    }
}

/// Derive geometry for `kind`. `logical` and `pixels` are the same points
/// (confirmed plus preview) in both spaces.
pub(crate) fn derive(
    kind: DrawingKind,
    logical: &[LogicalPoint],
    pixels: &[PixelPos],
    style: &Style,
    view: &ChartView<'_>,
) -> Derived {
    if pixels.is_empty() || pixels.len() != logical.len() {
        return Derived::default();
    }
    if pixels.len() < kind.required_points() {
        // Still being placed: connect what we have.
        return Derived::parts(vec![Part::Polyline(pixels.to_vec())]);
    }

    use DrawingKind::*;
    let p = pixels;
    let (extend_left, extend_right) = style.ext.extend();
    match kind {
        TrendLine | TrendAngle | InfoLine => Derived::parts(vec![line_part(p[0], p[1], extend_left, extend_right)]),
        HorizontalLine => Derived::parts(vec![Part::HorizontalLine { y: p[0].y }]),
        VerticalLine => Derived::parts(vec![Part::VerticalLine { x: p[0].x }]),
        CrossLine => Derived::parts(vec![Part::HorizontalLine { y: p[0].y }, Part::VerticalLine { x: p[0].x }]),

        Ray => Derived::parts(vec![Part::Ray(p[0], p[1])]),
        HorizontalRay => Derived::parts(vec![Part::HorizontalRay { origin: p[0], leftward: false }]),
        ExtendedLine => Derived::parts(vec![Part::Line(p[0], p[1])]),

        Rectangle => Derived::parts(vec![Part::Polygon {
            vertices: PixelRect::from_corners(p[0], p[1]).corners().to_vec(),
            filled: style.is_filled(),
        }]),
        Ellipse => {
            let e = ellipse_params(p[0], p[1]);
            Derived::parts(vec![Part::Ellipse {
                center: e.center,
                rx: e.rx,
                ry: e.ry,
                filled: style.is_filled(),
            }])
        }
        Circle => Derived::parts(vec![Part::Circle {
            circle: PixelCircle {
                center: p[0],
                radius: p[0].distance_to(p[1]),
            },
            filled: style.is_filled(),
        }]),
        Triangle => Derived::parts(vec![Part::Polygon {
            vertices: p[..3].to_vec(),
            filled: style.is_filled(),
        }]),
        Arc => {
            let (start, end, through) = (p[0], p[1], p[2]);
            let control = quadratic_control_through(start, end, through);
            Derived {
                parts: vec![Part::Polyline(sample_quadratic(start, control, end, view.curve_samples))],
                arc: arc_params(start, end, through),
                regression: None,
            }
        }
        Curve => Derived::parts(vec![Part::Polyline(sample_quadratic(
            p[0],
            p[2],
            p[1],
            view.curve_samples,
        ))]),

        ParallelChannel => Derived::parts(parallel_channel(logical, p, style, view)),
        FlatTopBottom => {
            let rail = (PixelPos::new(p[0].x, p[2].y), PixelPos::new(p[1].x, p[2].y));
            Derived::parts(channel_parts((p[0], p[1]), Some(rail), style))
        }
        DisjointChannel => Derived::parts(channel_parts((p[0], p[1]), Some((p[2], p[3])), style)),
        RegressionTrend => regression_trend(logical, p, style, view),

        FibRetracement => {
            let levels = fib_levels(kind, logical, style);
            let (x0, x1) = (p[0].x.min(p[1].x), p[0].x.max(p[1].x));
            let mut parts = level_lines(&levels, x0, x1, extend_left, extend_right, view);
            parts.push(Part::Segment(p[0], p[1]));
            Derived::parts(parts)
        }
        FibExtension => {
            let levels = fib_levels(kind, logical, style);
            let width = (p[1].x - p[0].x).abs();
            let mut parts = level_lines(&levels, p[2].x, p[2].x + width, extend_left, extend_right, view);
            parts.push(Part::Polyline(p[..3].to_vec()));
            Derived::parts(parts)
        }
        FibChannel => {
            let levels = fib_levels(kind, logical, style);
            let parts = levels
                .iter()
                .filter(|l| l.visible)
                .filter_map(|l| {
                    let a = view.coords.to_pixel(logical[0].translate(0.0, l.value))?;
                    let b = view.coords.to_pixel(logical[1].translate(0.0, l.value))?;
                    Some(line_part(a, b, extend_left, extend_right))
                })
                .collect();
            Derived::parts(parts)
        }
        FibTimeZone => Derived::parts(
            fib_levels(kind, logical, style)
                .iter()
                .filter(|l| l.visible)
                .filter_map(|l| view.coords.time_to_x(l.value))
                .map(|x| Part::VerticalLine { x })
                .collect(),
        ),

        AbcdPattern | ElliottImpulse => Derived::parts(vec![Part::Polyline(p.to_vec())]),
        XabcdPattern => Derived::parts(vec![
            Part::Polyline(p.to_vec()),
            Part::Polygon {
                vertices: p[..3].to_vec(),
                filled: style.is_filled(),
            },
            Part::Polygon {
                vertices: p[2..5].to_vec(),
                filled: style.is_filled(),
            },
        ]),
        HeadAndShoulders => Derived::parts(vec![Part::Polyline(p.to_vec()), Part::Ray(p[2], p[4])]),

        Text => Derived::parts(vec![Part::Label(label_rect(p[0], &text_of(style)))]),
        PriceLabel => {
            let mut text = text_of(style);
            if text.content.is_empty() {
                text.content = format!("{:.2}", logical[0].price);
            }
            Derived::parts(vec![Part::Label(label_rect(p[0], &text))])
        }
        Callout => Derived::parts(vec![
            Part::Segment(p[0], p[1]),
            Part::Label(label_rect(p[1], &text_of(style))),
        ]),
        Arrow => {
            let mut parts = vec![Part::Segment(p[0], p[1])];
            if let Some(head) = arrow_head(p[0], p[1]) {
                parts.push(Part::Polyline(head));
            }
            Derived::parts(parts)
        }
        PriceRange | DateRange => {
            let rect = PixelRect::from_corners(p[0], p[1]);
            let measure = if kind == PriceRange {
                let x = (p[0].x + p[1].x) / 2.0;
                Part::Segment(PixelPos::new(x, p[0].y), PixelPos::new(x, p[1].y))
            } else {
                let y = (p[0].y + p[1].y) / 2.0;
                Part::Segment(PixelPos::new(p[0].x, y), PixelPos::new(p[1].x, y))
            };
            Derived::parts(vec![
                Part::Polygon {
                    vertices: rect.corners().to_vec(),
                    filled: style.is_filled(),
                },
                measure,
            ])
        }
    }
}

/// Resolved Fibonacci levels for the Fibonacci kinds, empty for the rest or
/// when too few points are placed. Time zones resolve to times.
pub(crate) fn fib_levels(kind: DrawingKind, logical: &[LogicalPoint], style: &Style) -> Vec<LevelValue> {
    let StyleExt::Fibonacci(ext) = &style.ext else {
        return Vec::new();
    };
    match (kind, logical) {
        (DrawingKind::FibRetracement, [start, end, ..]) => retracement_levels(*start, *end, &ext.levels),
        (DrawingKind::FibExtension, [p0, p1, p2, ..]) => extension_levels(*p0, *p1, *p2, &ext.levels),
        (DrawingKind::FibChannel, [a, b, c, ..]) => fib_channel_levels(*a, *b, *c, &ext.levels),
        (DrawingKind::FibTimeZone, [start, unit, ..]) => time_zones(*start, *unit, &ext.levels),
        _ => Vec::new(),
    }
}

/// Segment, ray or infinite line through `a` and `b`, extended past the
/// leftmost and/or rightmost point.
fn line_part(a: PixelPos, b: PixelPos, extend_left: bool, extend_right: bool) -> Part {
    let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
    match (extend_left, extend_right) {
        (true, true) => Part::Line(a, b),
        (false, true) => Part::Ray(left, right),
        (true, false) => Part::Ray(right, left),
        (false, false) => Part::Segment(a, b),
    }
}

fn channel_parts(base: (PixelPos, PixelPos), rail: Option<(PixelPos, PixelPos)>, style: &Style) -> Vec<Part> {
    let (extend_left, extend_right) = style.ext.extend();
    let mut parts = vec![line_part(base.0, base.1, extend_left, extend_right)];
    let Some(rail) = rail else {
        return parts;
    };
    parts.push(line_part(rail.0, rail.1, extend_left, extend_right));
    if let StyleExt::Channel(ext) = &style.ext {
        if ext.show_middle_line {
            parts.push(line_part(
                base.0.midpoint(rail.0),
                base.1.midpoint(rail.1),
                extend_left,
                extend_right,
            ));
        }
        if ext.fill_background {
            parts.push(Part::Band { rail_a: base, rail_b: rail });
        }
    }
    parts
}

fn parallel_channel(logical: &[LogicalPoint], p: &[PixelPos], style: &Style, view: &ChartView<'_>) -> Vec<Part> {
    let offset = channel_offset(logical[0], logical[1], logical[2]);
    let rail = view
        .coords
        .to_pixel(logical[0].translate(0.0, offset))
        .zip(view.coords.to_pixel(logical[1].translate(0.0, offset)));
    channel_parts((p[0], p[1]), rail, style)
}

fn regression_trend(logical: &[LogicalPoint], p: &[PixelPos], style: &Style, view: &ChartView<'_>) -> Derived {
    let (multiplier, show_bands) = match &style.ext {
        StyleExt::Regression(ext) => (ext.deviation_multiplier, ext.show_bands),
        _ => (2.0, true),
    };
    let samples: Vec<(f64, f64)> = bars_in_range(view.bars, logical[0].time, logical[1].time)
        .iter()
        .filter_map(|bar| Some((view.coords.time_to_x(bar.timestamp)?, view.coords.price_to_y(bar.close)?)))
        .collect();
    let Some(fit) = linear_regression(&samples) else {
        return Derived::parts(vec![Part::Segment(p[0], p[1])]);
    };

    let channel = RegressionChannel::new(fit, samples.len(), p[0].x, p[1].x, multiplier);
    let mut parts = vec![Part::Segment(channel.center.0, channel.center.1)];
    if show_bands {
        parts.push(Part::Segment(channel.upper.0, channel.upper.1));
        parts.push(Part::Segment(channel.lower.0, channel.lower.1));
        parts.push(Part::Band {
            rail_a: channel.upper,
            rail_b: channel.lower,
        });
    }
    Derived {
        parts,
        arc: None,
        regression: Some(channel),
    }
}

fn level_lines(
    levels: &[LevelValue],
    x0: f64,
    x1: f64,
    extend_left: bool,
    extend_right: bool,
    view: &ChartView<'_>,
) -> Vec<Part> {
    levels
        .iter()
        .filter(|l| l.visible)
        .filter_map(|l| view.coords.price_to_y(l.value))
        .map(|y| match (extend_left, extend_right) {
            (true, true) => Part::HorizontalLine { y },
            (false, true) => Part::HorizontalRay {
                origin: PixelPos::new(x0, y),
                leftward: false,
            },
            (true, false) => Part::HorizontalRay {
                origin: PixelPos::new(x1, y),
                leftward: true,
            },
            (false, false) => Part::Segment(PixelPos::new(x0, y), PixelPos::new(x1, y)),
        })
        .collect()
}

fn text_of(style: &Style) -> TextStyle {
    style.text.clone().unwrap_or_default()
}

fn arrow_head(from: PixelPos, to: PixelPos) -> Option<Vec<PixelPos>> {
    let len = from.distance_to(to);
    if len < crate::geometry::EPSILON {
        return None;
    }
    let (ux, uy) = ((from.x - to.x) / len, (from.y - to.y) / len);
    let (sin, cos) = std::f64::consts::FRAC_PI_6.sin_cos();
    let wing = |s: f64| {
        PixelPos::new(
            to.x + ARROW_HEAD_LEN * (ux * cos - s * uy * sin),
            to.y + ARROW_HEAD_LEN * (s * ux * sin + uy * cos),
        )
    };
    Some(vec![wing(1.0), to, wing(-1.0)])
}
