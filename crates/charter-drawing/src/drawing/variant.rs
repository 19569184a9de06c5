//! A single drawing: logical points, style, lifecycle and its pixel cache.

use charter_core::Candle;

use super::derive::{self, Derived};
use super::metrics::{self, ArcParams, LevelValue, Measure, RegressionChannel};
use super::parts::Part;
use super::style::Style;
use super::types::{DrawingId, DrawingKind, DrawingState, LogicalPoint};
use crate::coords::{ChartView, PixelPos};
use crate::error::DrawingError;
use crate::geometry::PixelRect;

/// Pixel projection of a drawing, valid for one coordinate generation and one
/// revision of the drawing.
#[derive(Debug, Clone)]
struct PixelCache {
    generation: u64,
    revision: u64,
    /// Confirmed points followed by the preview point, if any. Empty when a
    /// point could not be projected.
    points: Vec<PixelPos>,
    derived: Derived,
}

/// A chart annotation anchored to logical (time, price) points.
#[derive(Debug, Clone)]
pub struct Drawing {
    pub(crate) id: DrawingId,
    pub(crate) kind: DrawingKind,
    pub(crate) points: Vec<LogicalPoint>,
    /// Pointer position while placing the next point. Never part of `points`.
    pub(crate) preview: Option<LogicalPoint>,
    pub(crate) style: Style,
    pub(crate) state: DrawingState,
    pub(crate) visible: bool,
    pub(crate) locked: bool,
    /// Bumped by every mutation; the cache records the one it was built from.
    revision: u64,
    cache: Option<PixelCache>,
}

impl Drawing {
    /// Start a new drawing of `kind` with no points.
    pub fn new(kind: DrawingKind) -> Self {
        Self::with_id(DrawingId::new(), kind)
    }

    pub(crate) fn with_id(id: DrawingId, kind: DrawingKind) -> Self {
        Self {
            id,
            kind,
            points: Vec::with_capacity(kind.max_points()),
            preview: None,
            style: Style::for_kind(kind),
            state: DrawingState::Creating,
            visible: true,
            locked: false,
            revision: 0,
            cache: None,
        }
    }

    /// Build a complete drawing from all of its points.
    pub fn from_points(kind: DrawingKind, points: &[LogicalPoint]) -> Result<Self, DrawingError> {
        if points.len() != kind.required_points() {
            return Err(if points.len() > kind.max_points() {
                DrawingError::TooManyPoints {
                    kind,
                    max: kind.max_points(),
                    found: points.len(),
                }
            } else {
                DrawingError::IncompletePoints {
                    kind,
                    required: kind.required_points(),
                    found: points.len(),
                }
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(DrawingError::NonFinitePoint { index });
        }
        let mut drawing = Self::new(kind);
        drawing.points = points.to_vec();
        drawing.state = DrawingState::Complete;
        Ok(drawing)
    }

    pub fn id(&self) -> DrawingId {
        self.id
    }

    pub fn kind(&self) -> DrawingKind {
        self.kind
    }

    /// Confirmed points, without the preview.
    pub fn points(&self) -> &[LogicalPoint] {
        &self.points
    }

    pub fn preview(&self) -> Option<LogicalPoint> {
        self.preview
    }

    /// Confirmed points followed by the preview point, the path shown while
    /// the drawing is being placed.
    pub fn merged_points(&self) -> Vec<LogicalPoint> {
        self.points.iter().copied().chain(self.preview).collect()
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Replace the style. The family extension must match the drawing type.
    pub fn set_style(&mut self, style: Style) -> Result<(), DrawingError> {
        style.validate()?;
        if !style.ext.fits(self.kind) {
            return Err(DrawingError::InvalidStyle(format!(
                "style extension does not apply to {}",
                self.kind
            )));
        }
        self.style = style;
        self.touch();
        Ok(())
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.touch();
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Append a confirmed point. Reaching the type's point count completes the
    /// drawing. Ignored once complete, at the maximum, or for non-finite input.
    pub fn add_point(&mut self, point: LogicalPoint) -> bool {
        if self.state != DrawingState::Creating || self.points.len() >= self.kind.max_points() || !point.is_finite()
        {
            return false;
        }
        self.points.push(point);
        self.preview = None;
        if self.points.len() >= self.kind.required_points() {
            self.state = DrawingState::Complete;
        }
        self.touch();
        true
    }

    /// Required point count reached and no longer being placed.
    pub fn is_complete(&self) -> bool {
        self.points.len() >= self.kind.required_points() && self.state != DrawingState::Creating
    }

    /// While creating, set the preview point. On a complete drawing, move the
    /// last confirmed point.
    pub fn update_last_point(&mut self, point: LogicalPoint) -> bool {
        if !point.is_finite() {
            return false;
        }
        match self.state {
            DrawingState::Creating => {
                if self.points.len() >= self.kind.max_points() {
                    return false;
                }
                self.preview = Some(point);
            }
            DrawingState::Complete | DrawingState::Selected => match self.points.last_mut() {
                Some(last) => *last = point,
                None => return false,
            },
        }
        self.touch();
        true
    }

    /// Make the preview point permanent.
    pub fn confirm_preview_point(&mut self) -> bool {
        match self.preview.take() {
            Some(point) => self.add_point(point),
            None => false,
        }
    }

    /// Drop the preview without confirming it.
    pub fn clear_preview(&mut self) {
        if self.preview.take().is_some() {
            self.touch();
        }
    }

    pub fn is_selected(&self) -> bool {
        self.state == DrawingState::Selected
    }

    /// Toggle between `Complete` and `Selected`. No effect while creating.
    pub fn set_selected(&mut self, selected: bool) {
        self.state = match (self.state, selected) {
            (DrawingState::Complete, true) => DrawingState::Selected,
            (DrawingState::Selected, false) => DrawingState::Complete,
            (state, _) => state,
        };
    }

    /// Shift every point by a logical delta.
    pub fn translate(&mut self, dt: f64, dp: f64) {
        if !(dt.is_finite() && dp.is_finite()) {
            return;
        }
        for point in &mut self.points {
            *point = point.translate(dt, dp);
        }
        if let Some(preview) = self.preview.as_mut() {
            *preview = preview.translate(dt, dp);
        }
        self.touch();
    }

    /// Replace the confirmed point at `index`. Out-of-range indices are ignored.
    pub fn move_point(&mut self, index: usize, point: LogicalPoint) -> bool {
        if !point.is_finite() {
            return false;
        }
        let Some(slot) = self.points.get_mut(index) else {
            return false;
        };
        *slot = point;
        self.touch();
        true
    }

    /// Install pixel positions for the merged point path and derive the
    /// type's geometry from them. Rejected when the count does not match.
    pub fn set_pixel_points(&mut self, view: &ChartView<'_>, pixels: Vec<PixelPos>) -> bool {
        let logical = self.merged_points();
        if pixels.len() != logical.len() || !pixels.iter().all(|p| p.is_finite()) {
            return false;
        }
        let derived = derive::derive(self.kind, &logical, &pixels, &self.style, view);
        self.cache = Some(PixelCache {
            generation: view.generation(),
            revision: self.revision,
            points: pixels,
            derived,
        });
        true
    }

    /// Project the points through `view` and rebuild the cache. Returns
    /// `false` when some point cannot be positioned; the cache is then empty
    /// and the drawing is not hittable until the view changes.
    pub fn derive(&mut self, view: &ChartView<'_>) -> bool {
        let projected: Option<Vec<PixelPos>> = self
            .merged_points()
            .into_iter()
            .map(|p| view.coords.to_pixel(p))
            .collect();
        match projected {
            Some(pixels) => self.set_pixel_points(view, pixels),
            None => {
                self.cache = Some(PixelCache {
                    generation: view.generation(),
                    revision: self.revision,
                    points: Vec::new(),
                    derived: Derived::default(),
                });
                false
            }
        }
    }

    /// Whether the cache must be rebuilt for coordinate `generation`.
    pub fn needs_derive(&self, generation: u64) -> bool {
        self.cache
            .as_ref()
            .map_or(true, |c| c.generation != generation || c.revision != self.revision)
    }

    /// The cache, if it was built for `generation` and the current revision.
    fn fresh_cache(&self, generation: u64) -> Option<&PixelCache> {
        self.cache
            .as_ref()
            .filter(|c| c.generation == generation && c.revision == self.revision)
    }

    /// Cached pixel positions of the merged point path. Empty when not yet
    /// positioned for coordinate `generation`.
    pub fn pixel_points(&self, generation: u64) -> &[PixelPos] {
        self.fresh_cache(generation).map(|c| c.points.as_slice()).unwrap_or(&[])
    }

    /// Derived geometry from the cache.
    pub fn parts(&self, generation: u64) -> &[Part] {
        self.fresh_cache(generation).map(|c| c.derived.parts.as_slice()).unwrap_or(&[])
    }

    /// Whether pixel `(x, y)` lies within `threshold` pixels of the shape.
    /// Hidden drawings and drawings not positioned for `generation` never hit.
    pub fn hit_test(&self, generation: u64, x: f64, y: f64, threshold: f64) -> bool {
        if !self.visible {
            return false;
        }
        let p = PixelPos::new(x, y);
        self.parts(generation).iter().any(|part| part.hit(p, threshold.max(0.0)))
    }

    /// Pixel bounding box of the cached geometry.
    pub fn bounds(&self, generation: u64) -> Option<PixelRect> {
        let from_parts = self
            .parts(generation)
            .iter()
            .filter_map(Part::bounds)
            .reduce(PixelRect::union);
        let from_points = PixelRect::from_points(self.pixel_points(generation).iter().copied());
        match (from_parts, from_points) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    /// Pixel positions of the confirmed points, the handles a user can drag.
    pub fn control_points(&self, generation: u64) -> &[PixelPos] {
        let pixels = self.pixel_points(generation);
        &pixels[..self.points.len().min(pixels.len())]
    }

    /// Index of the control point nearest to `pos` within `radius` pixels.
    pub fn control_point_at(&self, generation: u64, pos: PixelPos, radius: f64) -> Option<usize> {
        self.control_points(generation)
            .iter()
            .enumerate()
            .map(|(i, cp)| (i, cp.distance_to(pos)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Price distance between the offset point and the base line, for channel
    /// types with all three points placed (or previewed).
    pub fn channel_offset(&self) -> Option<f64> {
        if !matches!(
            self.kind,
            DrawingKind::ParallelChannel | DrawingKind::FibChannel | DrawingKind::FlatTopBottom
        ) {
            return None;
        }
        match self.merged_points().as_slice() {
            [a, b, c, ..] => Some(metrics::channel_offset(*a, *b, *c)),
            _ => None,
        }
    }

    /// Circle parameters of an arc, `None` for collinear points or other types.
    pub fn arc_params(&self, generation: u64) -> Option<ArcParams> {
        self.fresh_cache(generation).and_then(|c| c.derived.arc)
    }

    /// Fitted regression channel, `None` with fewer than two bars in range.
    pub fn regression(&self, generation: u64) -> Option<RegressionChannel> {
        self.fresh_cache(generation).and_then(|c| c.derived.regression)
    }

    /// Resolved Fibonacci levels; empty for non-Fibonacci types.
    pub fn fib_levels(&self) -> Vec<LevelValue> {
        derive::fib_levels(self.kind, &self.merged_points(), &self.style)
    }

    /// Price and time span of an info line or range annotation.
    pub fn measure(&self, bars: &[Candle]) -> Option<Measure> {
        if !matches!(
            self.kind,
            DrawingKind::InfoLine | DrawingKind::PriceRange | DrawingKind::DateRange
        ) {
            return None;
        }
        match self.merged_points().as_slice() {
            [a, b, ..] => Some(metrics::measure(*a, *b, bars)),
            _ => None,
        }
    }

    /// On-screen angle of a line in degrees, counter-clockwise from the x axis.
    pub fn angle_degrees(&self, generation: u64) -> Option<f64> {
        if !matches!(
            self.kind,
            DrawingKind::TrendAngle | DrawingKind::TrendLine | DrawingKind::InfoLine
        ) {
            return None;
        }
        match self.pixel_points(generation) {
            [a, b, ..] if a.distance_to(*b) > crate::geometry::EPSILON => {
                Some((a.y - b.y).atan2(b.x - a.x).to_degrees())
            }
            _ => None,
        }
    }

    /// Leg ratios of XABCD and ABCD patterns.
    pub fn pattern_ratios(&self) -> Vec<Option<f64>> {
        match self.kind {
            DrawingKind::XabcdPattern | DrawingKind::AbcdPattern if self.is_complete() => {
                metrics::pattern_ratios(&self.points)
            }
            _ => Vec::new(),
        }
    }

    /// Copy of this drawing with a fresh id, unlocked and not selected.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::with_id(DrawingId::new(), self.kind);
        copy.points = self.points.clone();
        copy.style = self.style.clone();
        copy.state = if self.state == DrawingState::Creating {
            DrawingState::Creating
        } else {
            DrawingState::Complete
        };
        copy.visible = self.visible;
        copy
    }
}
