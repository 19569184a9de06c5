//! Identifiers, logical points and the closed set of drawing types.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::DrawingError;

/// Global counter for generating unique drawing IDs.
static NEXT_DRAWING_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a drawing.
///
/// Assigned once at creation and carried unchanged through serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawingId(u64);

impl DrawingId {
    /// Largest id accepted from storage: the largest integer a JSON number
    /// holds exactly. Keeps the generator far from wrapping around.
    pub const MAX: u64 = (1 << 53) - 1;

    /// Generate a new unique drawing ID.
    pub fn new() -> Self {
        Self(NEXT_DRAWING_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Restore a persisted ID, keeping the generator ahead of it so freshly
    /// created drawings never collide with loaded ones. `None` above
    /// [`DrawingId::MAX`].
    pub fn from_raw(raw: u64) -> Option<Self> {
        if raw > Self::MAX {
            return None;
        }
        NEXT_DRAWING_ID.fetch_max(raw + 1, Ordering::Relaxed);
        Some(Self(raw))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Default for DrawingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in chart space: time on the horizontal axis, price on the vertical.
///
/// Never holds pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalPoint {
    /// Epoch timestamp or (fractional) bar ordinal.
    pub time: f64,
    pub price: f64,
}

impl LogicalPoint {
    pub const fn new(time: f64, price: f64) -> Self {
        Self { time, price }
    }

    pub fn is_finite(&self) -> bool {
        self.time.is_finite() && self.price.is_finite()
    }

    #[must_use]
    pub fn translate(self, dt: f64, dp: f64) -> Self {
        Self::new(self.time + dt, self.price + dp)
    }
}

/// Lifecycle of a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingState {
    /// Accumulating points interactively.
    #[default]
    Creating,
    Complete,
    /// Complete and focused. Persisted as `complete`.
    Selected,
}

/// Shape family a drawing type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawingFamily {
    Line,
    Ray,
    Shape,
    Channel,
    Fibonacci,
    Pattern,
    Annotation,
}

/// Every drawing type the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawingKind {
    TrendLine,
    HorizontalLine,
    VerticalLine,
    CrossLine,
    TrendAngle,
    InfoLine,

    Ray,
    HorizontalRay,
    ExtendedLine,

    Rectangle,
    Ellipse,
    Circle,
    Triangle,
    Arc,
    Curve,

    ParallelChannel,
    RegressionTrend,
    FlatTopBottom,
    DisjointChannel,

    FibRetracement,
    FibExtension,
    FibChannel,
    FibTimeZone,

    XabcdPattern,
    AbcdPattern,
    HeadAndShoulders,
    ElliottImpulse,

    Text,
    Callout,
    PriceLabel,
    Arrow,
    PriceRange,
    DateRange,
}

impl DrawingKind {
    /// Get all drawing types, in toolbar order.
    pub fn all() -> &'static [DrawingKind] {
        use DrawingKind::*;
        &[
            TrendLine,
            HorizontalLine,
            VerticalLine,
            CrossLine,
            TrendAngle,
            InfoLine,
            Ray,
            HorizontalRay,
            ExtendedLine,
            Rectangle,
            Ellipse,
            Circle,
            Triangle,
            Arc,
            Curve,
            ParallelChannel,
            RegressionTrend,
            FlatTopBottom,
            DisjointChannel,
            FibRetracement,
            FibExtension,
            FibChannel,
            FibTimeZone,
            XabcdPattern,
            AbcdPattern,
            HeadAndShoulders,
            ElliottImpulse,
            Text,
            Callout,
            PriceLabel,
            Arrow,
            PriceRange,
            DateRange,
        ]
    }

    pub fn family(self) -> DrawingFamily {
        use DrawingKind::*;
        match self {
            TrendLine | HorizontalLine | VerticalLine | CrossLine | TrendAngle | InfoLine => DrawingFamily::Line,
            Ray | HorizontalRay | ExtendedLine => DrawingFamily::Ray,
            Rectangle | Ellipse | Circle | Triangle | Arc | Curve => DrawingFamily::Shape,
            ParallelChannel | RegressionTrend | FlatTopBottom | DisjointChannel => DrawingFamily::Channel,
            FibRetracement | FibExtension | FibChannel | FibTimeZone => DrawingFamily::Fibonacci,
            XabcdPattern | AbcdPattern | HeadAndShoulders | ElliottImpulse => DrawingFamily::Pattern,
            Text | Callout | PriceLabel | Arrow | PriceRange | DateRange => DrawingFamily::Annotation,
        }
    }

    /// Number of points needed to complete the drawing. Also the maximum.
    pub fn required_points(self) -> usize {
        use DrawingKind::*;
        match self {
            HorizontalLine | VerticalLine | CrossLine | HorizontalRay | Text | PriceLabel => 1,
            TrendLine | TrendAngle | InfoLine | Ray | ExtendedLine | Rectangle | Ellipse | Circle
            | RegressionTrend | FibRetracement | FibTimeZone | Callout | Arrow | PriceRange
            | DateRange => 2,
            Triangle | Arc | Curve | ParallelChannel | FlatTopBottom | FibExtension | FibChannel => 3,
            DisjointChannel | AbcdPattern => 4,
            XabcdPattern => 5,
            ElliottImpulse => 6,
            HeadAndShoulders => 7,
        }
    }

    pub fn max_points(self) -> usize {
        self.required_points()
    }

    /// Identifier used in the persisted form.
    pub fn as_str(self) -> &'static str {
        use DrawingKind::*;
        match self {
            TrendLine => "trendLine",
            HorizontalLine => "horizontalLine",
            VerticalLine => "verticalLine",
            CrossLine => "crossLine",
            TrendAngle => "trendAngle",
            InfoLine => "infoLine",
            Ray => "ray",
            HorizontalRay => "horizontalRay",
            ExtendedLine => "extendedLine",
            Rectangle => "rectangle",
            Ellipse => "ellipse",
            Circle => "circle",
            Triangle => "triangle",
            Arc => "arc",
            Curve => "curve",
            ParallelChannel => "parallelChannel",
            RegressionTrend => "regressionTrend",
            FlatTopBottom => "flatTopBottom",
            DisjointChannel => "disjointChannel",
            FibRetracement => "fibRetracement",
            FibExtension => "fibExtension",
            FibChannel => "fibChannel",
            FibTimeZone => "fibTimeZone",
            XabcdPattern => "xabcdPattern",
            AbcdPattern => "abcdPattern",
            HeadAndShoulders => "headAndShoulders",
            ElliottImpulse => "elliottImpulse",
            Text => "text",
            Callout => "callout",
            PriceLabel => "priceLabel",
            Arrow => "arrow",
            PriceRange => "priceRange",
            DateRange => "dateRange",
        }
    }

    /// Types that carry a text label by default.
    pub fn has_text(self) -> bool {
        matches!(self, DrawingKind::Text | DrawingKind::Callout | DrawingKind::PriceLabel)
    }

    /// Types filled by default.
    pub fn is_filled(self) -> bool {
        use DrawingKind::*;
        matches!(
            self,
            Rectangle | Ellipse | Circle | Triangle | PriceRange | DateRange | XabcdPattern
        )
    }
}

impl fmt::Display for DrawingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawingKind {
    type Err = DrawingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrawingKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DrawingError::UnknownKind(s.to_string()))
    }
}

/// Interaction mode: either nothing, or the type of drawing being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingMode {
    #[default]
    None,
    Create(DrawingKind),
}

impl DrawingMode {
    pub fn kind(self) -> Option<DrawingKind> {
        match self {
            DrawingMode::None => None,
            DrawingMode::Create(kind) => Some(kind),
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, DrawingMode::None)
    }

    /// Get the display name for this mode.
    pub fn name(self) -> &'static str {
        match self {
            DrawingMode::None => "none",
            DrawingMode::Create(kind) => kind.as_str(),
        }
    }
}
