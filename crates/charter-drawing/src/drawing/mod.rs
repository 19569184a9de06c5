//! Interactive drawing tools for chart annotations.

mod derive;
mod magnet;
mod metrics;
mod parts;
mod record;
mod state;
mod style;
mod types;
mod variant;

pub use magnet::Magnet;
pub use metrics::{ArcParams, EllipseParams, LevelValue, Measure, RegressionChannel};
pub use parts::{label_rect, Part};
pub use record::{DrawingRecord, ExtFlags};
pub use state::{DragTarget, DrawingManager, HoveredPoint, InteractionState};
pub use style::{
    channel_levels, extension_levels, retracement_levels, time_zone_levels, ChannelExt, FibLevel, FibonacciExt, Fill,
    LineExt, RegressionExt, Rgba, Style, StyleExt, TextStyle, DEFAULT_DRAWING_COLOR, FIB_TIME_SEQUENCE,
};
pub use types::{DrawingFamily, DrawingId, DrawingKind, DrawingMode, DrawingState, LogicalPoint};
pub use variant::Drawing;
