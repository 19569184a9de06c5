//! Persisted form of a drawing.
//!
//! ```json
//! { "id": 7, "type": "parallelChannel", "points": [{"time": 100, "price": 50}],
//!   "style": {...}, "state": "complete", "visible": true, "locked": false,
//!   "showMiddleLine": true }
//! ```
//!
//! Type-specific flags sit at the top level next to the common fields. New
//! fields must stay optional so older documents keep loading.

use serde::{Deserialize, Serialize};

use super::style::{FibLevel, Style, StyleExt};
use super::types::{DrawingId, DrawingKind, DrawingState, LogicalPoint};
use super::variant::Drawing;
use crate::error::DrawingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRecord {
    pub id: DrawingId,
    /// Type identifier such as `trendLine`. Kept as text so an unknown type
    /// is reported as such instead of as a generic parse error.
    #[serde(rename = "type")]
    pub kind: String,
    pub points: Vec<LogicalPoint>,
    #[serde(default)]
    pub style: Style,
    #[serde(default = "complete_state")]
    pub state: DrawingState,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(flatten)]
    pub flags: ExtFlags,
}

fn complete_state() -> DrawingState {
    DrawingState::Complete
}

fn default_true() -> bool {
    true
}

/// Type-specific style flags. Only the ones relevant to the drawing's family
/// are written; flags foreign to the family are ignored on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend_left: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend_right: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_angle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_middle_line: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_background: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_bands: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<FibLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_labels: Option<bool>,
}

impl ExtFlags {
    fn from_ext(ext: &StyleExt) -> Self {
        match ext {
            StyleExt::None => Self::default(),
            StyleExt::Line(l) => Self {
                extend_left: Some(l.extend_left),
                extend_right: Some(l.extend_right),
                show_angle: Some(l.show_angle),
                ..Self::default()
            },
            StyleExt::Channel(c) => Self {
                extend_left: Some(c.extend_left),
                extend_right: Some(c.extend_right),
                show_middle_line: Some(c.show_middle_line),
                fill_background: Some(c.fill_background),
                ..Self::default()
            },
            StyleExt::Regression(r) => Self {
                deviation_multiplier: Some(r.deviation_multiplier),
                show_bands: Some(r.show_bands),
                ..Self::default()
            },
            StyleExt::Fibonacci(f) => Self {
                extend_left: Some(f.extend_left),
                extend_right: Some(f.extend_right),
                levels: Some(f.levels.clone()),
                show_labels: Some(f.show_labels),
                ..Self::default()
            },
        }
    }

    /// The default extension for `kind` with every present flag applied.
    fn into_ext(self, kind: DrawingKind) -> StyleExt {
        let mut ext = StyleExt::for_kind(kind);
        match &mut ext {
            StyleExt::None => {}
            StyleExt::Line(l) => {
                l.extend_left = self.extend_left.unwrap_or(l.extend_left);
                l.extend_right = self.extend_right.unwrap_or(l.extend_right);
                l.show_angle = self.show_angle.unwrap_or(l.show_angle);
            }
            StyleExt::Channel(c) => {
                c.extend_left = self.extend_left.unwrap_or(c.extend_left);
                c.extend_right = self.extend_right.unwrap_or(c.extend_right);
                c.show_middle_line = self.show_middle_line.unwrap_or(c.show_middle_line);
                c.fill_background = self.fill_background.unwrap_or(c.fill_background);
            }
            StyleExt::Regression(r) => {
                r.deviation_multiplier = self.deviation_multiplier.unwrap_or(r.deviation_multiplier);
                r.show_bands = self.show_bands.unwrap_or(r.show_bands);
            }
            StyleExt::Fibonacci(f) => {
                f.extend_left = self.extend_left.unwrap_or(f.extend_left);
                f.extend_right = self.extend_right.unwrap_or(f.extend_right);
                f.show_labels = self.show_labels.unwrap_or(f.show_labels);
                if let Some(levels) = self.levels {
                    f.levels = levels;
                }
            }
        }
        ext
    }
}

impl Drawing {
    /// Persisted form. `Selected` is saved as `Complete` and the preview
    /// point is dropped.
    pub fn to_record(&self) -> DrawingRecord {
        let state = match self.state {
            DrawingState::Selected => DrawingState::Complete,
            state => state,
        };
        DrawingRecord {
            id: self.id,
            kind: self.kind.as_str().to_string(),
            points: self.points.clone(),
            style: self.style.clone(),
            state,
            visible: self.visible,
            locked: self.locked,
            flags: ExtFlags::from_ext(&self.style.ext),
        }
    }

    /// Rebuild a drawing from its persisted form, keeping the saved id.
    pub fn from_record(record: DrawingRecord) -> Result<Self, DrawingError> {
        let kind: DrawingKind = record.kind.parse()?;
        let found = record.points.len();
        if found > kind.max_points() {
            return Err(DrawingError::TooManyPoints {
                kind,
                max: kind.max_points(),
                found,
            });
        }
        if let Some(index) = record.points.iter().position(|p| !p.is_finite()) {
            return Err(DrawingError::NonFinitePoint { index });
        }
        let state = match record.state {
            DrawingState::Creating if found < kind.required_points() => DrawingState::Creating,
            _ if found < kind.required_points() => {
                return Err(DrawingError::IncompletePoints {
                    kind,
                    required: kind.required_points(),
                    found,
                });
            }
            _ => DrawingState::Complete,
        };

        let mut style = record.style;
        style.ext = record.flags.into_ext(kind);
        style.validate()?;

        let id = DrawingId::from_raw(record.id.raw()).ok_or(DrawingError::IdOutOfRange(record.id.raw()))?;
        let mut drawing = Drawing::with_id(id, kind);
        drawing.points = record.points;
        drawing.style = style;
        drawing.state = state;
        drawing.visible = record.visible;
        drawing.locked = record.locked;
        Ok(drawing)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, DrawingError> {
        Ok(serde_json::to_value(self.to_record())?)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, DrawingError> {
        let record: DrawingRecord = serde_json::from_value(value.clone())?;
        Self::from_record(record)
    }
}
