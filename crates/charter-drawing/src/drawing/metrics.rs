//! Numbers derived from a drawing's points: channel offsets, Fibonacci level
//! values, measurements and pattern ratios (logical space), plus the
//! pixel-space parameters of arcs, ellipses and regression channels.

use charter_core::{bars_in_range, Candle};

use super::style::FibLevel;
use super::types::LogicalPoint;
use crate::coords::PixelPos;
use crate::geometry::{circumcircle, cross, LinearFit, EPSILON};

/// Price of the line through `a` and `b` at `time`, interpolated in
/// (time, price) space. A zero-width time span yields `a.price`.
pub fn price_on_line(a: LogicalPoint, b: LogicalPoint, time: f64) -> f64 {
    let dt = b.time - a.time;
    if dt.abs() < EPSILON {
        return a.price;
    }
    a.price + (b.price - a.price) * (time - a.time) / dt
}

/// Price distance of `offset` above the base line `base_start`-`base_end`,
/// measured at the offset point's time.
pub fn channel_offset(base_start: LogicalPoint, base_end: LogicalPoint, offset: LogicalPoint) -> f64 {
    offset.price - price_on_line(base_start, base_end, offset.time)
}

/// A Fibonacci level resolved to a concrete value.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelValue {
    pub ratio: f64,
    /// Price for price-based studies, time for time zones.
    pub value: f64,
    pub color: super::style::Rgba,
    pub visible: bool,
}

impl LevelValue {
    fn from_level(level: &FibLevel, value: f64) -> Self {
        Self {
            ratio: level.ratio,
            value,
            color: level.color,
            visible: level.visible,
        }
    }
}

/// Retracement: level 0 sits on `end`, level 1 on `start`.
pub fn retracement_levels(start: LogicalPoint, end: LogicalPoint, levels: &[FibLevel]) -> Vec<LevelValue> {
    levels
        .iter()
        .map(|l| LevelValue::from_level(l, end.price + (start.price - end.price) * l.ratio))
        .collect()
}

/// Trend-based extension: the `p0`→`p1` move projected from `p2`.
pub fn extension_levels(
    p0: LogicalPoint,
    p1: LogicalPoint,
    p2: LogicalPoint,
    levels: &[FibLevel],
) -> Vec<LevelValue> {
    let leg = p1.price - p0.price;
    levels
        .iter()
        .map(|l| LevelValue::from_level(l, p2.price + leg * l.ratio))
        .collect()
}

/// Channel: each level is the base line shifted by `offset * ratio`.
/// The value is the price offset from the base line.
pub fn fib_channel_levels(
    base_start: LogicalPoint,
    base_end: LogicalPoint,
    width_point: LogicalPoint,
    levels: &[FibLevel],
) -> Vec<LevelValue> {
    let offset = channel_offset(base_start, base_end, width_point);
    levels
        .iter()
        .map(|l| LevelValue::from_level(l, offset * l.ratio))
        .collect()
}

/// Fibonacci time zones starting at `start`, spaced by the `start`→`unit`
/// interval. Each level's ratio is its zone number; the value is a time.
/// A zero interval collapses every zone onto `start`, so only the first
/// level is kept.
pub fn time_zones(start: LogicalPoint, unit: LogicalPoint, levels: &[FibLevel]) -> Vec<LevelValue> {
    let step = unit.time - start.time;
    let count = if step.abs() < EPSILON { 1 } else { levels.len() };
    levels
        .iter()
        .take(count)
        .map(|l| LevelValue::from_level(l, start.time + step * l.ratio))
        .collect()
}

/// Price and time span between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    pub price_delta: f64,
    /// Relative change from the first point, `None` when it sits at zero.
    pub percent: Option<f64>,
    pub time_delta: f64,
    /// Bars whose timestamps fall inside the time span.
    pub bar_count: usize,
}

pub fn measure(from: LogicalPoint, to: LogicalPoint, bars: &[Candle]) -> Measure {
    let price_delta = to.price - from.price;
    let percent = (from.price.abs() > EPSILON).then(|| price_delta / from.price.abs() * 100.0);
    Measure {
        price_delta,
        percent,
        time_delta: to.time - from.time,
        bar_count: bars_in_range(bars, from.time, to.time).len(),
    }
}

fn leg_ratio(numerator: (LogicalPoint, LogicalPoint), denominator: (LogicalPoint, LogicalPoint)) -> Option<f64> {
    let den = (denominator.1.price - denominator.0.price).abs();
    if den < EPSILON {
        return None;
    }
    Some((numerator.1.price - numerator.0.price).abs() / den)
}

/// Leg ratios of a harmonic pattern.
///
/// XABCD (5 points): `[AB/XA, BC/AB, CD/BC, AD/XA]`.
/// ABCD (4 points): `[BC/AB, CD/BC]`. Zero-length denominators give `None`.
pub fn pattern_ratios(points: &[LogicalPoint]) -> Vec<Option<f64>> {
    match points {
        [x, a, b, c, d] => vec![
            leg_ratio((*a, *b), (*x, *a)),
            leg_ratio((*b, *c), (*a, *b)),
            leg_ratio((*c, *d), (*b, *c)),
            leg_ratio((*a, *d), (*x, *a)),
        ],
        [a, b, c, d] => vec![leg_ratio((*b, *c), (*a, *b)), leg_ratio((*c, *d), (*b, *c))],
        _ => Vec::new(),
    }
}

/// Circle through an arc's three pixel points plus its sweep direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcParams {
    pub center: PixelPos,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub counter_clockwise: bool,
}

/// Arc through `start` and `end` bulging toward `control`, `None` when the
/// three points are collinear.
pub fn arc_params(start: PixelPos, end: PixelPos, control: PixelPos) -> Option<ArcParams> {
    let circle = circumcircle(start, control, end)?;
    let c = circle.center;
    Some(ArcParams {
        center: c,
        radius: circle.radius,
        start_angle: (start.y - c.y).atan2(start.x - c.x),
        end_angle: (end.y - c.y).atan2(end.x - c.x),
        counter_clockwise: cross(start, end, control) > 0.0,
    })
}

/// Ellipse inscribed in the box spanned by two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseParams {
    pub center: PixelPos,
    pub rx: f64,
    pub ry: f64,
}

pub fn ellipse_params(a: PixelPos, b: PixelPos) -> EllipseParams {
    EllipseParams {
        center: a.midpoint(b),
        rx: (b.x - a.x).abs() / 2.0,
        ry: (b.y - a.y).abs() / 2.0,
    }
}

/// Regression channel fitted in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionChannel {
    pub fit: LinearFit,
    pub bar_count: usize,
    pub center: (PixelPos, PixelPos),
    pub upper: (PixelPos, PixelPos),
    pub lower: (PixelPos, PixelPos),
}

impl RegressionChannel {
    /// Build the channel between `x0` and `x1` with bands `multiplier` standard
    /// deviations away from the center line.
    pub fn new(fit: LinearFit, bar_count: usize, x0: f64, x1: f64, multiplier: f64) -> Self {
        let band = fit.std_dev * multiplier;
        let at = |x: f64, shift: f64| PixelPos::new(x, fit.value_at(x) + shift);
        Self {
            fit,
            bar_count,
            center: (at(x0, 0.0), at(x1, 0.0)),
            // Pixel y grows downward, so the upper band has the smaller y.
            upper: (at(x0, -band), at(x1, -band)),
            lower: (at(x0, band), at(x1, band)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::style;

    fn lp(time: f64, price: f64) -> LogicalPoint {
        LogicalPoint::new(time, price)
    }

    #[test]
    fn test_channel_offset_interpolates_in_logical_space() {
        let offset = channel_offset(lp(100.0, 50.0), lp(200.0, 60.0), lp(150.0, 70.0));
        assert!((offset - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_channel_offset_zero_time_span() {
        let offset = channel_offset(lp(100.0, 50.0), lp(100.0, 60.0), lp(150.0, 70.0));
        assert!(offset.is_finite());
        assert!((offset - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_retracement_levels() {
        let levels = retracement_levels(lp(0.0, 100.0), lp(10.0, 200.0), &style::retracement_levels());
        let at = |ratio: f64| levels.iter().find(|l| (l.ratio - ratio).abs() < 1e-9).unwrap().value;
        assert!((at(0.0) - 200.0).abs() < 1e-9);
        assert!((at(1.0) - 100.0).abs() < 1e-9);
        assert!((at(0.5) - 150.0).abs() < 1e-9);
        assert!((at(0.618) - 138.2).abs() < 1e-9);
    }

    #[test]
    fn test_extension_levels() {
        let levels = extension_levels(
            lp(0.0, 100.0),
            lp(10.0, 150.0),
            lp(20.0, 120.0),
            &[FibLevel::new(1.0, [1.0; 4], true), FibLevel::new(1.618, [1.0; 4], true)],
        );
        assert!((levels[0].value - 170.0).abs() < 1e-9);
        assert!((levels[1].value - 200.9).abs() < 1e-9);
    }

    #[test]
    fn test_time_zones() {
        let levels = style::time_zone_levels();
        let zones = time_zones(lp(100.0, 0.0), lp(110.0, 0.0), &levels);
        assert_eq!(zones.len(), style::FIB_TIME_SEQUENCE.len());
        assert_eq!(zones[0].value, 100.0);
        assert_eq!(zones[4].ratio, 5.0);
        assert_eq!(zones[4].value, 150.0);
        assert_eq!(zones[10].value, 990.0);
        assert!(zones.iter().all(|z| z.visible));

        let collapsed = time_zones(lp(5.0, 0.0), lp(5.0, 1.0), &levels);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].value, 5.0);
    }

    #[test]
    fn test_measure() {
        let bars: Vec<Candle> = (0..10).map(|i| Candle::from_value(i as f64, 1.0)).collect();
        let m = measure(lp(2.0, 100.0), lp(5.0, 110.0), &bars);
        assert!((m.price_delta - 10.0).abs() < 1e-9);
        assert!((m.percent.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(m.time_delta, 3.0);
        assert_eq!(m.bar_count, 4);

        assert!(measure(lp(0.0, 0.0), lp(1.0, 5.0), &bars).percent.is_none());
    }

    #[test]
    fn test_pattern_ratios() {
        let ratios = pattern_ratios(&[lp(0.0, 100.0), lp(1.0, 200.0), lp(2.0, 150.0), lp(3.0, 175.0)]);
        assert_eq!(ratios.len(), 2);
        assert!((ratios[0].unwrap() - 0.5).abs() < 1e-9);
        assert!((ratios[1].unwrap() - 0.5).abs() < 1e-9);

        let flat = pattern_ratios(&[lp(0.0, 1.0), lp(1.0, 1.0), lp(2.0, 2.0), lp(3.0, 3.0)]);
        assert_eq!(flat[0], None);
        assert!(pattern_ratios(&[lp(0.0, 1.0)]).is_empty());
    }

    #[test]
    fn test_arc_params() {
        let arc = arc_params(
            PixelPos::new(0.0, 0.0),
            PixelPos::new(10.0, 0.0),
            PixelPos::new(5.0, -5.0),
        )
        .unwrap();
        assert!((arc.center.x - 5.0).abs() < 1e-9);
        assert!((arc.radius - 5.0).abs() < 1e-9);
        assert!(!arc.counter_clockwise);

        let flipped = arc_params(
            PixelPos::new(0.0, 0.0),
            PixelPos::new(10.0, 0.0),
            PixelPos::new(5.0, 5.0),
        )
        .unwrap();
        assert!(flipped.counter_clockwise);
    }

    #[test]
    fn test_arc_params_collinear() {
        let arc = arc_params(
            PixelPos::new(0.0, 0.0),
            PixelPos::new(10.0, 10.0),
            PixelPos::new(5.0, 5.0),
        );
        assert!(arc.is_none());
    }

    #[test]
    fn test_regression_channel_bands() {
        let fit = LinearFit { slope: 0.0, intercept: 100.0, std_dev: 5.0 };
        let channel = RegressionChannel::new(fit, 10, 0.0, 50.0, 2.0);
        assert_eq!(channel.center.0.y, 100.0);
        assert_eq!(channel.upper.0.y, 90.0);
        assert_eq!(channel.lower.1.y, 110.0);
    }
}
