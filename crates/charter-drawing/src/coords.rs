//! Coordinate contract between logical (time, price) space and pixel space.
//!
//! Drawings never store pixels as their source of truth. Every conversion goes
//! through a [`CoordinateAdapter`], which is owned by the time/price scales
//! outside this crate. Conversions return `None` instead of NaN whenever a
//! value cannot be mapped, and every change of the mapping bumps
//! [`CoordinateAdapter::generation`] so cached pixel geometry can be detected
//! as stale.
//!
//! [`LinearCoordinates`] is a plain linear implementation used by tests,
//! benches and hosts that have no scale objects of their own.

use charter_core::Candle;

use crate::drawing::LogicalPoint;

/// Pixel coordinates relative to the top-left corner of the chart pane.
///
/// X increases to the right, Y increases downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another pixel position.
    #[must_use]
    pub fn distance_to(self, other: PixelPos) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// Calculate squared distance (faster than distance_to when only comparing).
    #[must_use]
    pub fn distance_squared_to(self, other: PixelPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub fn midpoint(self, other: PixelPos) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for PixelPos {
    fn from(pos: (f64, f64)) -> Self {
        Self::new(pos.0, pos.1)
    }
}

/// Converts between logical chart coordinates and pixels.
///
/// Implementations are read-only from the drawing engine's point of view and
/// may change between any two calls (pan, zoom, resize). Each such change
/// must increase `generation`.
pub trait CoordinateAdapter {
    fn time_to_x(&self, time: f64) -> Option<f64>;
    fn price_to_y(&self, price: f64) -> Option<f64>;
    fn x_to_time(&self, x: f64) -> Option<f64>;
    fn y_to_price(&self, y: f64) -> Option<f64>;

    /// Counter identifying the current mapping.
    fn generation(&self) -> u64;

    /// Project a logical point, `None` if either axis is out of range.
    fn to_pixel(&self, point: LogicalPoint) -> Option<PixelPos> {
        Some(PixelPos::new(
            self.time_to_x(point.time)?,
            self.price_to_y(point.price)?,
        ))
    }

    /// Unproject a pixel position, `None` if either axis is out of range.
    fn to_logical(&self, pos: PixelPos) -> Option<LogicalPoint> {
        Some(LogicalPoint::new(
            self.x_to_time(pos.x)?,
            self.y_to_price(pos.y)?,
        ))
    }

    /// Logical (time, price) delta equivalent to moving `anchor` by
    /// `(dx, dy)` pixels under the current mapping.
    fn pixel_delta_to_logical(&self, anchor: PixelPos, dx: f64, dy: f64) -> Option<(f64, f64)> {
        let from = self.to_logical(anchor)?;
        let to = self.to_logical(anchor.offset(dx, dy))?;
        Some((to.time - from.time, to.price - from.price))
    }
}

/// Everything a drawing needs to derive its pixel geometry for one frame.
#[derive(Clone, Copy)]
pub struct ChartView<'a> {
    pub coords: &'a dyn CoordinateAdapter,
    /// Bars ordered by ascending timestamp, used by magnet snapping and
    /// data-driven drawings such as regression channels.
    pub bars: &'a [Candle],
    /// Samples used when approximating curves.
    pub curve_samples: usize,
}

impl<'a> ChartView<'a> {
    pub const DEFAULT_CURVE_SAMPLES: usize = 20;

    #[must_use]
    pub fn new(coords: &'a dyn CoordinateAdapter, bars: &'a [Candle]) -> Self {
        Self {
            coords,
            bars,
            curve_samples: Self::DEFAULT_CURVE_SAMPLES,
        }
    }

    #[must_use]
    pub fn with_curve_samples(mut self, samples: usize) -> Self {
        self.curve_samples = samples.max(2);
        self
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.coords.generation()
    }
}

/// Linear time and price scales over a pane of `width` x `height` pixels.
///
/// The visible time range maps onto `[0, width]` and the visible price range
/// onto `[height, 0]` (higher prices toward the top).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCoordinates {
    time_range: (f64, f64),
    price_range: (f64, f64),
    width: f64,
    height: f64,
    generation: u64,
}

impl LinearCoordinates {
    #[must_use]
    pub fn new(time_range: (f64, f64), price_range: (f64, f64), width: f64, height: f64) -> Self {
        Self {
            time_range,
            price_range,
            width,
            height,
            generation: 1,
        }
    }

    #[must_use]
    pub fn time_range(&self) -> (f64, f64) {
        self.time_range
    }

    #[must_use]
    pub fn price_range(&self) -> (f64, f64) {
        self.price_range
    }

    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Replace both visible ranges.
    pub fn set_ranges(&mut self, time_range: (f64, f64), price_range: (f64, f64)) {
        self.time_range = time_range;
        self.price_range = price_range;
        self.bump();
    }

    /// Update with new pane size. The visible ranges stay the same.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.bump();
    }

    /// Pan the view so content moves by `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let tpp = self.time_per_pixel();
        let ppp = self.price_per_pixel();
        // Content moving right means the visible window moves left in time.
        let dt = -dx * tpp;
        // Content moving down means the visible window moves up in price.
        let dp = dy * ppp;
        self.time_range = (self.time_range.0 + dt, self.time_range.1 + dt);
        self.price_range = (self.price_range.0 + dp, self.price_range.1 + dp);
        self.bump();
    }

    /// Zoom the time axis by `factor` (> 1 zooms in) around pixel `anchor_x`.
    pub fn zoom(&mut self, factor: f64, anchor_x: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let Some(anchor_time) = self.x_to_time(anchor_x) else {
            return;
        };
        let (t0, t1) = self.time_range;
        self.time_range = (
            anchor_time - (anchor_time - t0) / factor,
            anchor_time + (t1 - anchor_time) / factor,
        );
        self.bump();
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    fn time_span(&self) -> Option<f64> {
        let span = self.time_range.1 - self.time_range.0;
        (span.is_finite() && span.abs() > f64::EPSILON && self.width > 0.0).then_some(span)
    }

    fn price_span(&self) -> Option<f64> {
        let span = self.price_range.1 - self.price_range.0;
        (span.is_finite() && span.abs() > f64::EPSILON && self.height > 0.0).then_some(span)
    }

    fn time_per_pixel(&self) -> f64 {
        self.time_span().map_or(0.0, |span| span / self.width)
    }

    fn price_per_pixel(&self) -> f64 {
        self.price_span().map_or(0.0, |span| span / self.height)
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl CoordinateAdapter for LinearCoordinates {
    fn time_to_x(&self, time: f64) -> Option<f64> {
        let span = self.time_span()?;
        finite((finite(time)? - self.time_range.0) / span * self.width)
    }

    fn price_to_y(&self, price: f64) -> Option<f64> {
        let span = self.price_span()?;
        finite(self.height - (finite(price)? - self.price_range.0) / span * self.height)
    }

    fn x_to_time(&self, x: f64) -> Option<f64> {
        let span = self.time_span()?;
        finite(self.time_range.0 + finite(x)? / self.width * span)
    }

    fn y_to_price(&self, y: f64) -> Option<f64> {
        let span = self.price_span()?;
        finite(self.price_range.0 + (self.height - finite(y)?) / self.height * span)
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_coords() -> LinearCoordinates {
        // 1 time unit per pixel, 0.1 price per pixel.
        LinearCoordinates::new((0.0, 1000.0), (0.0, 50.0), 1000.0, 500.0)
    }

    #[test]
    fn test_pixel_pos_distance() {
        let a = PixelPos::new(0.0, 0.0);
        let b = PixelPos::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);
        assert_eq!(a.distance_squared_to(b), 25.0);
        assert_eq!(a.midpoint(b), PixelPos::new(1.5, 2.0));
    }

    #[test]
    fn test_projection() {
        let coords = test_coords();
        assert_eq!(coords.time_to_x(250.0), Some(250.0));
        assert_eq!(coords.price_to_y(50.0), Some(0.0));
        assert_eq!(coords.price_to_y(0.0), Some(500.0));
        assert_eq!(coords.price_to_y(25.0), Some(250.0));
    }

    #[test]
    fn test_logical_pixel_roundtrip() {
        let coords = test_coords();
        let point = LogicalPoint::new(123.0, 17.5);
        let pixel = coords.to_pixel(point).unwrap();
        let back = coords.to_logical(pixel).unwrap();
        assert!((back.time - point.time).abs() < 1e-9);
        assert!((back.price - point.price).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_returns_none() {
        let coords = test_coords();
        assert_eq!(coords.time_to_x(f64::NAN), None);
        assert_eq!(coords.price_to_y(f64::INFINITY), None);
        assert_eq!(coords.x_to_time(f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_degenerate_range_returns_none() {
        let coords = LinearCoordinates::new((10.0, 10.0), (0.0, 0.0), 800.0, 600.0);
        assert_eq!(coords.time_to_x(10.0), None);
        assert_eq!(coords.price_to_y(0.0), None);
        assert_eq!(coords.x_to_time(5.0), None);

        let zero_size = LinearCoordinates::new((0.0, 10.0), (0.0, 10.0), 0.0, 0.0);
        assert_eq!(zero_size.time_to_x(5.0), None);
        assert_eq!(zero_size.y_to_price(5.0), None);
    }

    #[test]
    fn test_generation_bumps() {
        let mut coords = test_coords();
        let g0 = coords.generation();
        coords.pan(10.0, 0.0);
        let g1 = coords.generation();
        coords.zoom(2.0, 500.0);
        let g2 = coords.generation();
        coords.resize(800.0, 400.0);
        let g3 = coords.generation();
        assert!(g0 < g1 && g1 < g2 && g2 < g3);
    }

    #[test]
    fn test_pan_moves_content() {
        let mut coords = test_coords();
        let point = LogicalPoint::new(500.0, 25.0);
        let before = coords.to_pixel(point).unwrap();
        coords.pan(40.0, -20.0);
        let after = coords.to_pixel(point).unwrap();
        assert!((after.x - before.x - 40.0).abs() < 1e-9);
        assert!((after.y - before.y + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_anchor() {
        let mut coords = test_coords();
        let anchor_time = coords.x_to_time(300.0).unwrap();
        coords.zoom(2.0, 300.0);
        assert!((coords.time_to_x(anchor_time).unwrap() - 300.0).abs() < 1e-9);
        let (t0, t1) = coords.time_range();
        assert!((t1 - t0 - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_delta_to_logical() {
        let coords = test_coords();
        let (dt, dp) = coords
            .pixel_delta_to_logical(PixelPos::new(100.0, 100.0), 20.0, -10.0)
            .unwrap();
        assert!((dt - 20.0).abs() < 1e-9);
        assert!((dp - 1.0).abs() < 1e-9);
    }
}
