//! Snapping pointer input to bar OHLC values.

use charter_config::{MagnetConfig, MagnetMode};
use charter_core::nearest_bar_index;

use super::types::LogicalPoint;
use crate::coords::{ChartView, PixelPos};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Magnet {
    pub mode: MagnetMode,
    /// Pixel radius within which weak mode snaps.
    pub weak_tolerance_px: f64,
}

impl Default for Magnet {
    fn default() -> Self {
        Self::from(&MagnetConfig::default())
    }
}

impl From<&MagnetConfig> for Magnet {
    fn from(config: &MagnetConfig) -> Self {
        Self {
            mode: config.mode,
            weak_tolerance_px: config.weak_tolerance_px,
        }
    }
}

impl Magnet {
    /// Snapped logical position for the pointer at `pos`, `None` when the
    /// magnet is off, there are no bars, or weak mode finds nothing close.
    pub fn snap(&self, view: &ChartView<'_>, pos: PixelPos) -> Option<LogicalPoint> {
        if self.mode == MagnetMode::None {
            return None;
        }
        let time = view.coords.x_to_time(pos.x)?;
        let bar = view.bars.get(nearest_bar_index(view.bars, time)?)?;
        let bar_x = view.coords.time_to_x(bar.timestamp)?;

        // Closest of open/high/low/close to the pointer, measured on screen.
        let (price, y) = bar
            .ohlc()
            .into_iter()
            .filter_map(|price| Some((price, view.coords.price_to_y(price)?)))
            .min_by(|a, b| (a.1 - pos.y).abs().total_cmp(&(b.1 - pos.y).abs()))?;

        if self.mode == MagnetMode::Weak && pos.distance_to(PixelPos::new(bar_x, y)) > self.weak_tolerance_px {
            return None;
        }
        Some(LogicalPoint::new(bar.timestamp, price))
    }

    /// Logical position for the pointer: snapped when the magnet applies,
    /// otherwise the plain unprojection.
    pub fn resolve(&self, view: &ChartView<'_>, pos: PixelPos) -> Option<LogicalPoint> {
        self.snap(view, pos).or_else(|| view.coords.to_logical(pos))
    }
}
