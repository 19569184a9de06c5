//! Drawing style: a base record shared by every type plus a per-family
//! extension, so flags that only make sense for one family cannot be set on
//! another.

use serde::{Deserialize, Serialize};

use super::types::{DrawingFamily, DrawingKind};
use crate::error::DrawingError;

/// RGBA color, components in `0.0..=1.0`.
pub type Rgba = [f32; 4];

/// Default color for drawings (blue).
pub const DEFAULT_DRAWING_COLOR: Rgba = [0.16, 0.38, 1.0, 1.0];
/// Default fill color for filled shapes.
pub const DEFAULT_FILL_COLOR: Rgba = [0.16, 0.38, 1.0, 1.0];
pub const DEFAULT_FILL_OPACITY: f32 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub color: Rgba,
    pub opacity: f32,
}

impl Default for Fill {
    fn default() -> Self {
        Self {
            color: DEFAULT_FILL_COLOR,
            opacity: DEFAULT_FILL_OPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub content: String,
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    pub color: Rgba,
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            content: "Text".to_string(),
            font_size: 14.0,
            font_family: default_font_family(),
            bold: false,
            italic: false,
            color: DEFAULT_DRAWING_COLOR,
        }
    }
}

/// One Fibonacci ratio with its own color and visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub color: Rgba,
    pub visible: bool,
}

impl FibLevel {
    pub fn new(ratio: f64, color: Rgba, visible: bool) -> Self {
        Self { ratio, color, visible }
    }
}

const FIB_GRAY: Rgba = [0.47, 0.47, 0.47, 1.0];
const FIB_RED: Rgba = [0.95, 0.21, 0.27, 1.0];
const FIB_ORANGE: Rgba = [1.0, 0.6, 0.0, 1.0];
const FIB_GREEN: Rgba = [0.3, 0.69, 0.31, 1.0];
const FIB_TEAL: Rgba = [0.03, 0.6, 0.5, 1.0];
const FIB_BLUE: Rgba = [0.16, 0.38, 1.0, 1.0];
const FIB_PURPLE: Rgba = [0.61, 0.15, 0.69, 1.0];

/// Default retracement levels.
pub fn retracement_levels() -> Vec<FibLevel> {
    vec![
        FibLevel::new(0.0, FIB_GRAY, true),
        FibLevel::new(0.236, FIB_RED, true),
        FibLevel::new(0.382, FIB_ORANGE, true),
        FibLevel::new(0.5, FIB_GREEN, true),
        FibLevel::new(0.618, FIB_TEAL, true),
        FibLevel::new(0.786, FIB_BLUE, true),
        FibLevel::new(1.0, FIB_GRAY, true),
        FibLevel::new(1.618, FIB_BLUE, true),
        FibLevel::new(2.618, FIB_RED, false),
        FibLevel::new(3.618, FIB_PURPLE, false),
        FibLevel::new(4.236, FIB_PURPLE, false),
    ]
}

/// Default trend-based extension levels.
pub fn extension_levels() -> Vec<FibLevel> {
    vec![
        FibLevel::new(0.0, FIB_GRAY, true),
        FibLevel::new(0.382, FIB_ORANGE, true),
        FibLevel::new(0.618, FIB_TEAL, true),
        FibLevel::new(1.0, FIB_GRAY, true),
        FibLevel::new(1.272, FIB_GREEN, true),
        FibLevel::new(1.618, FIB_BLUE, true),
        FibLevel::new(2.0, FIB_RED, false),
        FibLevel::new(2.618, FIB_RED, true),
        FibLevel::new(3.618, FIB_PURPLE, false),
    ]
}

/// Fibonacci sequence used for time zones.
pub const FIB_TIME_SEQUENCE: [u32; 11] = [0, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89];

/// Default time zones, one level per sequence number. The ratio is the
/// number of intervals from the first point.
pub fn time_zone_levels() -> Vec<FibLevel> {
    FIB_TIME_SEQUENCE
        .iter()
        .map(|&n| FibLevel::new(f64::from(n), if n == 0 { FIB_GRAY } else { FIB_BLUE }, true))
        .collect()
}

/// Default Fibonacci channel levels.
pub fn channel_levels() -> Vec<FibLevel> {
    vec![
        FibLevel::new(0.0, FIB_GRAY, true),
        FibLevel::new(0.382, FIB_ORANGE, true),
        FibLevel::new(0.618, FIB_TEAL, true),
        FibLevel::new(1.0, FIB_GRAY, true),
        FibLevel::new(1.618, FIB_BLUE, true),
        FibLevel::new(2.618, FIB_RED, false),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineExt {
    pub extend_left: bool,
    pub extend_right: bool,
    pub show_angle: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelExt {
    pub show_middle_line: bool,
    pub fill_background: bool,
    pub extend_left: bool,
    pub extend_right: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionExt {
    pub deviation_multiplier: f64,
    pub show_bands: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FibonacciExt {
    pub levels: Vec<FibLevel>,
    pub show_labels: bool,
    pub extend_left: bool,
    pub extend_right: bool,
}

/// Family-specific style fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StyleExt {
    #[default]
    None,
    Line(LineExt),
    Channel(ChannelExt),
    Regression(RegressionExt),
    Fibonacci(FibonacciExt),
}

impl StyleExt {
    /// Default extension for a drawing type.
    pub fn for_kind(kind: DrawingKind) -> Self {
        match kind {
            DrawingKind::TrendLine | DrawingKind::InfoLine => StyleExt::Line(LineExt {
                extend_left: false,
                extend_right: false,
                show_angle: false,
            }),
            DrawingKind::TrendAngle => StyleExt::Line(LineExt {
                extend_left: false,
                extend_right: false,
                show_angle: true,
            }),
            DrawingKind::ParallelChannel | DrawingKind::FlatTopBottom | DrawingKind::DisjointChannel => {
                StyleExt::Channel(ChannelExt {
                    show_middle_line: kind == DrawingKind::ParallelChannel,
                    fill_background: true,
                    extend_left: false,
                    extend_right: false,
                })
            }
            DrawingKind::RegressionTrend => StyleExt::Regression(RegressionExt {
                deviation_multiplier: 2.0,
                show_bands: true,
            }),
            DrawingKind::FibRetracement => StyleExt::Fibonacci(FibonacciExt {
                levels: retracement_levels(),
                show_labels: true,
                extend_left: false,
                extend_right: false,
            }),
            DrawingKind::FibExtension => StyleExt::Fibonacci(FibonacciExt {
                levels: extension_levels(),
                show_labels: true,
                extend_left: false,
                extend_right: false,
            }),
            DrawingKind::FibTimeZone => StyleExt::Fibonacci(FibonacciExt {
                levels: time_zone_levels(),
                show_labels: true,
                extend_left: false,
                extend_right: false,
            }),
            DrawingKind::FibChannel => StyleExt::Fibonacci(FibonacciExt {
                levels: channel_levels(),
                show_labels: true,
                extend_left: false,
                extend_right: false,
            }),
            _ => StyleExt::None,
        }
    }

    /// Whether this extension may be attached to `kind`.
    pub fn fits(&self, kind: DrawingKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(&StyleExt::for_kind(kind))
    }

    /// Horizontal extension flags, if the family has them.
    pub fn extend(&self) -> (bool, bool) {
        match self {
            StyleExt::Line(l) => (l.extend_left, l.extend_right),
            StyleExt::Channel(c) => (c.extend_left, c.extend_right),
            StyleExt::Fibonacci(f) => (f.extend_left, f.extend_right),
            StyleExt::None | StyleExt::Regression(_) => (false, false),
        }
    }
}

/// Visual attributes of a drawing.
///
/// The base fields serialize into the record's `style` object; `ext` travels
/// as top-level type-specific flags (see `record`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub color: Rgba,
    pub line_width: f64,
    /// Dash pattern in pixels; empty for a solid line.
    #[serde(default)]
    pub dash: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextStyle>,
    #[serde(skip)]
    pub ext: StyleExt,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: DEFAULT_DRAWING_COLOR,
            line_width: 1.0,
            dash: Vec::new(),
            fill: None,
            text: None,
            ext: StyleExt::None,
        }
    }
}

impl Style {
    /// Default style for a drawing type.
    pub fn for_kind(kind: DrawingKind) -> Self {
        let mut style = Style {
            ext: StyleExt::for_kind(kind),
            ..Style::default()
        };
        if kind.is_filled() {
            style.fill = Some(Fill::default());
        }
        if kind.has_text() {
            style.text = Some(TextStyle::default());
        }
        match kind.family() {
            DrawingFamily::Pattern | DrawingFamily::Channel => style.line_width = 2.0,
            _ => {}
        }
        if kind == DrawingKind::PriceLabel {
            if let Some(text) = style.text.as_mut() {
                text.content.clear();
            }
        }
        style
    }

    /// Check the style invariants: positive line width, positive dash entries,
    /// positive font size.
    pub fn validate(&self) -> Result<(), DrawingError> {
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(DrawingError::InvalidStyle(format!(
                "line width must be positive, got {}",
                self.line_width
            )));
        }
        if let Some(bad) = self.dash.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
            return Err(DrawingError::InvalidStyle(format!(
                "dash entries must be positive, got {bad}"
            )));
        }
        if let Some(text) = &self.text {
            if !(text.font_size.is_finite() && text.font_size > 0.0) {
                return Err(DrawingError::InvalidStyle(format!(
                    "font size must be positive, got {}",
                    text.font_size
                )));
            }
        }
        if let StyleExt::Regression(r) = &self.ext {
            if !(r.deviation_multiplier.is_finite() && r.deviation_multiplier >= 0.0) {
                return Err(DrawingError::InvalidStyle(format!(
                    "deviation multiplier must be non-negative, got {}",
                    r.deviation_multiplier
                )));
            }
        }
        Ok(())
    }

    pub fn is_filled(&self) -> bool {
        self.fill.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_kind() {
        let style = Style::for_kind(DrawingKind::Rectangle);
        assert!(style.fill.is_some());
        assert_eq!(style.ext, StyleExt::None);

        let style = Style::for_kind(DrawingKind::ParallelChannel);
        assert!(matches!(style.ext, StyleExt::Channel(ref c) if c.show_middle_line));

        let style = Style::for_kind(DrawingKind::Text);
        assert!(style.text.is_some());
    }

    #[test]
    fn test_every_default_is_valid_and_fits() {
        for kind in DrawingKind::all() {
            let style = Style::for_kind(*kind);
            assert!(style.validate().is_ok(), "{kind}");
            assert!(style.ext.fits(*kind), "{kind}");
        }
    }

    #[test]
    fn test_ext_fits() {
        let channel = StyleExt::for_kind(DrawingKind::ParallelChannel);
        assert!(channel.fits(DrawingKind::FlatTopBottom));
        assert!(!channel.fits(DrawingKind::TrendLine));
        assert!(StyleExt::None.fits(DrawingKind::Rectangle));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut style = Style::default();
        style.line_width = 0.0;
        assert!(style.validate().is_err());

        let mut style = Style::default();
        style.dash = vec![4.0, -2.0];
        assert!(style.validate().is_err());

        let mut style = Style::default();
        style.dash = vec![4.0, 2.0];
        assert!(style.validate().is_ok());
    }

    #[test]
    fn test_base_serialization_omits_ext() {
        let style = Style::for_kind(DrawingKind::FibRetracement);
        let json = serde_json::to_value(&style).unwrap();
        assert!(json.get("ext").is_none());
        assert!(json.get("lineWidth").is_some());
    }
}
