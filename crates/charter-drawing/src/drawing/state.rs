//! Drawing state management.

use charter_config::{DrawingConfig, MagnetConfig, MagnetMode};

use super::magnet::Magnet;
use super::style::{Style, StyleExt};
use super::types::{DrawingId, DrawingMode, LogicalPoint};
use super::variant::Drawing;
use crate::coords::{ChartView, PixelPos};
use crate::error::{DrawingError, PersistError};
use crate::events::{DrawingEvent, EventBus, Key};
use crate::persistence::{restore, LoadReport, PersistenceBridge};

/// What a drag gesture moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// The whole drawing.
    Whole,
    /// One control point, by index into the drawing's points.
    ControlPoint(usize),
}

/// Current interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Placing points for a new drawing.
    Creating,
    /// A completed drawing has focus, no pointer gesture in progress.
    Selected,
    /// Dragging an entire drawing.
    DraggingWhole,
    /// Dragging a single control point.
    DraggingControlPoint(usize),
}

/// Drawing id and control point index under the pointer.
pub type HoveredPoint = (DrawingId, usize);

#[derive(Debug, Clone, Copy)]
struct Drag {
    drawing_id: DrawingId,
    target: DragTarget,
    /// Last pointer position seen by `handle_drag`.
    last: Option<PixelPos>,
}

/// Manager for all drawing state and operations.
///
/// Drawings are kept in z-order: later entries are drawn on top and win hit
/// tests. Every read of pixel geometry goes through [`refresh`](Self::refresh)
/// first, so caches always match the current coordinates.
#[derive(Debug)]
pub struct DrawingManager {
    drawings: Vec<Drawing>,
    mode: DrawingMode,
    /// Drawing being placed. Not part of `drawings` until complete.
    active: Option<Drawing>,
    selected: Option<DrawingId>,
    drag: Option<Drag>,
    hovered: Option<HoveredPoint>,
    /// Global lock: no drawing can be moved, edited or deleted one by one.
    locked: bool,
    /// Hide every drawing; hidden drawings are not hittable either.
    hidden: bool,
    magnet: Magnet,
    hit_threshold: f64,
    control_point_radius: f64,
    curve_samples: usize,
    min_drawing_size: f64,
    regression_deviation: f64,
    symbol: Option<String>,
    events: EventBus,
}

impl Default for DrawingManager {
    fn default() -> Self {
        Self::with_config(&DrawingConfig::default(), &MagnetConfig::default())
    }
}

impl DrawingManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(drawing: &DrawingConfig, magnet: &MagnetConfig) -> Self {
        Self {
            drawings: Vec::new(),
            mode: DrawingMode::None,
            active: None,
            selected: None,
            drag: None,
            hovered: None,
            locked: false,
            hidden: false,
            magnet: Magnet::from(magnet),
            hit_threshold: drawing.hit_threshold_px.max(0.0),
            control_point_radius: drawing.control_point_radius_px.max(0.0),
            curve_samples: drawing.arc_samples.max(2),
            min_drawing_size: drawing.min_drawing_size_px.max(0.0),
            regression_deviation: drawing.regression_deviation,
            symbol: None,
            events: EventBus::new(),
        }
    }

    /// Committed drawings in z-order.
    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    /// Drawings to paint: visible committed drawings plus the one being placed.
    pub fn visible_drawings(&self) -> impl Iterator<Item = &Drawing> {
        let hidden = self.hidden;
        self.drawings
            .iter()
            .filter(move |d| !hidden && d.is_visible())
            .chain(self.active.iter())
    }

    pub fn get(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id() == id)
    }

    fn find_mut(&mut self, id: DrawingId) -> Option<&mut Drawing> {
        self.drawings.iter_mut().find(|d| d.id() == id)
    }

    fn index_of(&self, id: DrawingId) -> Option<usize> {
        self.drawings.iter().position(|d| d.id() == id)
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    /// The drawing currently being placed.
    pub fn active(&self) -> Option<&Drawing> {
        self.active.as_ref()
    }

    pub fn selected(&self) -> Option<DrawingId> {
        self.selected
    }

    pub fn selected_drawing(&self) -> Option<&Drawing> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn hovered_point(&self) -> Option<HoveredPoint> {
        self.hovered
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn magnet(&self) -> Magnet {
        self.magnet
    }

    pub fn hit_threshold(&self) -> f64 {
        self.hit_threshold
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn interaction(&self) -> InteractionState {
        match (self.drag, &self.active, self.selected) {
            (Some(Drag { target: DragTarget::Whole, .. }), _, _) => InteractionState::DraggingWhole,
            (Some(Drag { target: DragTarget::ControlPoint(i), .. }), _, _) => {
                InteractionState::DraggingControlPoint(i)
            }
            (None, Some(_), _) => InteractionState::Creating,
            (None, None, Some(_)) => InteractionState::Selected,
            (None, None, None) => InteractionState::Idle,
        }
    }

    /// Pending notifications.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Take all pending notifications.
    pub fn take_events(&mut self) -> Vec<DrawingEvent> {
        self.events.take_events()
    }

    fn changed(&mut self) {
        self.events.emit(DrawingEvent::DrawingsChanged);
    }

    /// Re-derive every cache that is stale for the current coordinates.
    pub fn refresh(&mut self, view: &ChartView<'_>) {
        let view = view.with_curve_samples(self.curve_samples);
        let generation = view.generation();
        for drawing in self.drawings.iter_mut().chain(self.active.iter_mut()) {
            if drawing.needs_derive(generation) {
                drawing.derive(&view);
            }
        }
    }

    fn rederive(&mut self, view: &ChartView<'_>, id: DrawingId) {
        let view = view.with_curve_samples(self.curve_samples);
        if let Some(drawing) = self.find_mut(id) {
            drawing.derive(&view);
        }
    }

    fn rederive_active(&mut self, view: &ChartView<'_>) {
        let view = view.with_curve_samples(self.curve_samples);
        if let Some(active) = self.active.as_mut() {
            active.derive(&view);
        }
    }

    /// Logical position for a pointer event, with magnet snapping applied.
    fn pointer_point(&self, view: &ChartView<'_>, x: f64, y: f64) -> Option<LogicalPoint> {
        self.magnet.resolve(view, PixelPos::new(x, y))
    }

    /// Topmost drawing hit at `(x, y)`.
    pub fn drawing_at(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> Option<DrawingId> {
        if self.hidden {
            return None;
        }
        self.refresh(view);
        let generation = view.generation();
        self.drawings
            .iter()
            .rev()
            .find(|d| d.hit_test(generation, x, y, self.hit_threshold))
            .map(Drawing::id)
    }

    /// What a press at `(x, y)` would grab: a control point (of the selected
    /// drawing first, then of any drawing top-down), else a drawing body.
    pub fn drag_target_at(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> Option<(DrawingId, DragTarget)> {
        if self.hidden {
            return None;
        }
        self.refresh(view);
        let generation = view.generation();
        let pos = PixelPos::new(x, y);
        let radius = self.control_point_radius;

        let handle_of = |d: &Drawing| {
            d.is_visible()
                .then(|| d.control_point_at(generation, pos, radius))
                .flatten()
                .map(|i| (d.id(), DragTarget::ControlPoint(i)))
        };
        if let Some(hit) = self.selected_drawing().and_then(handle_of) {
            return Some(hit);
        }
        if let Some(hit) = self.drawings.iter().rev().find_map(handle_of) {
            return Some(hit);
        }
        self.drawings
            .iter()
            .rev()
            .find(|d| d.hit_test(generation, x, y, self.hit_threshold))
            .map(|d| (d.id(), DragTarget::Whole))
    }

    /// Switch the creation mode. A drawing being placed for another type is
    /// discarded.
    pub fn set_mode(&mut self, mode: DrawingMode) {
        if self.active.as_ref().is_some_and(|a| Some(a.kind()) != mode.kind()) {
            self.discard_active();
        }
        self.drag = None;
        if self.mode == mode {
            return;
        }
        log::debug!("drawing mode {} -> {}", self.mode.name(), mode.name());
        self.mode = mode;
        if !mode.is_none() {
            self.set_selection(None);
            self.hovered = None;
        }
        self.events.emit(DrawingEvent::ModeChanged(mode));
    }

    fn discard_active(&mut self) {
        if let Some(active) = self.active.take() {
            log::debug!("discarding incomplete {} {}", active.kind(), active.id());
            self.changed();
        }
    }

    /// Abandon the drawing being placed, keeping the mode.
    pub fn cancel_drawing(&mut self) {
        self.discard_active();
    }

    /// Place the first point of a new drawing of the current mode's type.
    /// Single-point types are committed at once.
    pub fn start_drawing(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> bool {
        let Some(kind) = self.mode.kind() else {
            return false;
        };
        if self.active.is_some() {
            log::warn!("start_drawing ignored: a {kind} is already being placed");
            return false;
        }
        let Some(point) = self.pointer_point(view, x, y) else {
            return false;
        };

        let mut drawing = Drawing::new(kind);
        if let StyleExt::Regression(ext) = &mut drawing.style.ext {
            ext.deviation_multiplier = self.regression_deviation;
        }
        if !drawing.add_point(point) {
            return false;
        }
        self.set_selection(None);
        log::debug!("started {} {}", kind, drawing.id());

        self.active = Some(drawing);
        if self.active.as_ref().is_some_and(Drawing::is_complete) {
            self.commit_active(view);
        } else {
            self.rederive_active(view);
            self.changed();
        }
        true
    }

    /// Move the preview point of the drawing being placed.
    pub fn update_drawing(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> bool {
        if self.active.is_none() {
            return false;
        }
        let Some(point) = self.pointer_point(view, x, y) else {
            return false;
        };
        let updated = self.active.as_mut().is_some_and(|a| a.update_last_point(point));
        if updated {
            self.rederive_active(view);
            self.changed();
        }
        updated
    }

    /// Confirm the next point of the drawing being placed. Commits the drawing
    /// once its point count is reached.
    pub fn finish_drawing(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> bool {
        let Some(point) = self.pointer_point(view, x, y) else {
            return false;
        };
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.clear_preview();
        if !active.add_point(point) {
            return false;
        }
        if active.is_complete() {
            self.commit_active(view);
        } else {
            self.rederive_active(view);
            self.changed();
        }
        true
    }

    fn commit_active(&mut self, view: &ChartView<'_>) {
        self.rederive_active(view);
        let Some(drawing) = self.active.take() else {
            return;
        };

        if self.min_drawing_size > 0.0 && drawing.points().len() > 1 && self.is_too_small(&drawing, view.generation()) {
            log::debug!("discarding {} {}: smaller than {}px", drawing.kind(), drawing.id(), self.min_drawing_size);
        } else {
            log::debug!("committed {} {}", drawing.kind(), drawing.id());
            self.drawings.push(drawing);
        }
        self.set_mode(DrawingMode::None);
        self.changed();
    }

    fn is_too_small(&self, drawing: &Drawing, generation: u64) -> bool {
        match drawing.control_points(generation) {
            [first, rest @ ..] if !rest.is_empty() => {
                rest.iter().all(|p| p.distance_to(*first) < self.min_drawing_size)
            }
            _ => false,
        }
    }

    fn set_selection(&mut self, id: Option<DrawingId>) -> bool {
        if self.selected == id {
            return false;
        }
        if let Some(previous) = self.selected {
            if let Some(drawing) = self.find_mut(previous) {
                drawing.set_selected(false);
            }
        }
        if let Some(next) = id {
            if let Some(drawing) = self.find_mut(next) {
                drawing.set_selected(true);
            }
        }
        self.selected = id;
        self.events.emit(DrawingEvent::SelectionChanged(id));
        true
    }

    /// Select a drawing by id, or clear the selection.
    pub fn select(&mut self, id: Option<DrawingId>) -> bool {
        match id {
            Some(id) if self.get(id).is_none() => false,
            _ => self.set_selection(id),
        }
    }

    /// Select the topmost drawing under the pointer. Only works when no
    /// creation mode is active; a miss clears the selection.
    pub fn select_drawing_at(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> Option<DrawingId> {
        if !self.mode.is_none() {
            return None;
        }
        let hit = self.drawing_at(view, x, y);
        self.set_selection(hit);
        hit
    }

    /// Whether a single drawing may be moved, edited or deleted.
    fn is_editable(&self, id: DrawingId) -> bool {
        !self.locked && self.get(id).is_some_and(|d| !d.is_locked())
    }

    /// Start dragging the selected drawing.
    pub fn begin_drag(&mut self, target: DragTarget) -> bool {
        let Some(id) = self.selected else {
            log::warn!("begin_drag ignored: nothing selected");
            return false;
        };
        if !self.is_editable(id) {
            log::debug!("begin_drag ignored: {id} is locked");
            return false;
        }
        if let DragTarget::ControlPoint(index) = target {
            if self.get(id).map_or(true, |d| index >= d.points().len()) {
                log::warn!("begin_drag ignored: {id} has no control point {index}");
                return false;
            }
        }
        self.drag = Some(Drag {
            drawing_id: id,
            target,
            last: None,
        });
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Move point `index` of the selected drawing to the pointer.
    pub fn move_control_point(&mut self, view: &ChartView<'_>, index: usize, x: f64, y: f64) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        if !self.is_editable(id) {
            return false;
        }
        let Some(point) = self.pointer_point(view, x, y) else {
            return false;
        };
        let moved = self.find_mut(id).is_some_and(|d| d.move_point(index, point));
        if moved {
            self.rederive(view, id);
            self.changed();
        }
        moved
    }

    /// Translate the selected drawing by a pixel delta. The logical delta is
    /// taken from the current coordinates at the drawing's first point.
    pub fn move_drawing(&mut self, view: &ChartView<'_>, dx: f64, dy: f64) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        if !self.is_editable(id) {
            return false;
        }
        let Some(anchor) = self
            .get(id)
            .and_then(|d| d.points().first().copied())
            .and_then(|p| view.coords.to_pixel(p))
        else {
            return false;
        };
        let Some((dt, dp)) = view.coords.pixel_delta_to_logical(anchor, dx, dy) else {
            return false;
        };
        if let Some(drawing) = self.find_mut(id) {
            drawing.translate(dt, dp);
        }
        self.rederive(view, id);
        self.changed();
        true
    }

    pub fn set_style(&mut self, id: DrawingId, style: Style) -> Result<(), DrawingError> {
        let drawing = self.find_mut(id).ok_or(DrawingError::NotFound(id.raw()))?;
        drawing.set_style(style)?;
        self.changed();
        Ok(())
    }

    pub fn set_visible(&mut self, id: DrawingId, visible: bool) -> bool {
        let Some(drawing) = self.find_mut(id) else {
            return false;
        };
        drawing.set_visible(visible);
        self.changed();
        true
    }

    pub fn set_drawing_locked(&mut self, id: DrawingId, locked: bool) -> bool {
        let Some(drawing) = self.find_mut(id) else {
            return false;
        };
        drawing.set_locked(locked);
        if locked && self.drag.is_some_and(|d| d.drawing_id == id) {
            self.drag = None;
        }
        self.changed();
        true
    }

    pub fn set_locked_all(&mut self, locked: bool) {
        self.locked = locked;
        if locked {
            self.drag = None;
        }
    }

    pub fn set_hidden_all(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;
        if hidden {
            self.drag = None;
            self.hovered = None;
            self.set_selection(None);
        }
        self.changed();
    }

    pub fn set_magnet_mode(&mut self, mode: MagnetMode) {
        self.magnet.mode = mode;
    }

    /// Move a drawing to the top of the z-order.
    pub fn bring_to_front(&mut self, id: DrawingId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let drawing = self.drawings.remove(index);
        self.drawings.push(drawing);
        self.changed();
        true
    }

    /// Move a drawing to the bottom of the z-order.
    pub fn send_to_back(&mut self, id: DrawingId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let drawing = self.drawings.remove(index);
        self.drawings.insert(0, drawing);
        self.changed();
        true
    }

    /// Copy a drawing under a fresh id, placed on top.
    pub fn duplicate(&mut self, id: DrawingId) -> Option<DrawingId> {
        let copy = self.get(id)?.duplicate();
        let new_id = copy.id();
        log::debug!("duplicated {id} as {new_id}");
        self.drawings.push(copy);
        self.changed();
        Some(new_id)
    }

    pub fn delete_drawing(&mut self, id: DrawingId) -> bool {
        if !self.is_editable(id) {
            log::debug!("delete ignored: {id} is missing or locked");
            return false;
        }
        self.drawings.retain(|d| d.id() != id);
        if self.drag.is_some_and(|d| d.drawing_id == id) {
            self.drag = None;
        }
        if self.hovered.is_some_and(|(hovered, _)| hovered == id) {
            self.hovered = None;
        }
        if self.selected == Some(id) {
            self.set_selection(None);
        }
        log::debug!("deleted {id}");
        self.changed();
        true
    }

    /// Delete the selected drawing.
    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(id) => self.delete_drawing(id),
            None => false,
        }
    }

    /// Remove every drawing, locked or not.
    pub fn delete_all(&mut self) {
        let count = self.drawings.len();
        self.drawings.clear();
        self.drag = None;
        self.hovered = None;
        self.set_selection(None);
        log::debug!("deleted all {count} drawings");
        self.changed();
    }

    /// Handle mouse press.
    pub fn handle_press(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> bool {
        if !self.mode.is_none() {
            return if self.active.is_some() {
                self.finish_drawing(view, x, y)
            } else {
                self.start_drawing(view, x, y)
            };
        }

        match self.drag_target_at(view, x, y) {
            Some((id, target)) => {
                self.set_selection(Some(id));
                if self.begin_drag(target) {
                    if let Some(drag) = self.drag.as_mut() {
                        drag.last = Some(PixelPos::new(x, y));
                    }
                }
                true
            }
            None => {
                // Clicked on nothing - deselect
                self.set_selection(None);
                false
            }
        }
    }

    /// Handle mouse drag.
    pub fn handle_drag(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> bool {
        let Some(drag) = self.drag else {
            return self.update_drawing(view, x, y);
        };
        match drag.target {
            DragTarget::ControlPoint(index) => self.move_control_point(view, index, x, y),
            DragTarget::Whole => {
                let pos = PixelPos::new(x, y);
                let last = drag.last.unwrap_or(pos);
                if let Some(d) = self.drag.as_mut() {
                    d.last = Some(pos);
                }
                self.move_drawing(view, pos.x - last.x, pos.y - last.y)
            }
        }
    }

    /// Handle mouse release.
    pub fn handle_release(&mut self) {
        self.end_drag();
    }

    /// Track the pointer: moves the preview while placing, otherwise updates
    /// the hovered control point. Returns whether anything changed.
    pub fn handle_hover(&mut self, view: &ChartView<'_>, x: f64, y: f64) -> bool {
        if self.active.is_some() {
            return self.update_drawing(view, x, y);
        }
        if self.drag.is_some() || !self.mode.is_none() {
            return false;
        }
        let hovered = match self.drag_target_at(view, x, y) {
            Some((id, DragTarget::ControlPoint(index))) => Some((id, index)),
            _ => None,
        };
        let changed = hovered != self.hovered;
        self.hovered = hovered;
        changed
    }

    /// Handle a key press. Delete/Backspace removes the selection, Escape
    /// clears it and abandons any drawing being placed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if key.is_delete() {
            return self.delete_selected();
        }
        match key {
            Key::Escape => {
                let had_state = self.selected.is_some() || self.active.is_some() || !self.mode.is_none();
                self.drag = None;
                self.set_selection(None);
                self.discard_active();
                self.set_mode(DrawingMode::None);
                had_state
            }
            _ => false,
        }
    }

    /// Save every committed drawing for `symbol`. Returns the number saved.
    pub fn save_to(&self, bridge: &mut dyn PersistenceBridge, symbol: &str) -> Result<usize, PersistError> {
        let records = self
            .drawings
            .iter()
            .map(|d| serde_json::to_value(d.to_record()))
            .collect::<Result<Vec<_>, _>>()?;
        bridge.save(symbol, &records)?;
        log::info!("saved {} drawings for {}", records.len(), symbol);
        Ok(records.len())
    }

    /// Replace the collection with `symbol`'s saved drawings. Entries that
    /// fail to restore are dropped and reported; the rest load normally.
    pub fn load_from(&mut self, bridge: &dyn PersistenceBridge, symbol: &str) -> Result<LoadReport, PersistError> {
        let records = bridge.load(symbol)?;
        let (drawings, report) = restore(&records);

        self.discard_active();
        self.drag = None;
        self.hovered = None;
        self.set_selection(None);
        self.drawings = drawings;
        self.symbol = Some(symbol.to_string());
        self.changed();

        if report.is_clean() {
            log::info!("loaded {} drawings for {}", report.loaded, symbol);
        } else {
            log::warn!(
                "loaded {} drawings for {}, dropped {}",
                report.loaded,
                symbol,
                report.dropped.len()
            );
        }
        Ok(report)
    }

    /// Flush the current symbol's drawings and load the next symbol's.
    pub fn switch_symbol(&mut self, bridge: &mut dyn PersistenceBridge, symbol: &str) -> Result<LoadReport, PersistError> {
        if let Some(current) = self.symbol.clone() {
            self.save_to(bridge, &current)?;
        }
        self.set_mode(DrawingMode::None);
        self.load_from(bridge, symbol)
    }

    /// Add an already-complete drawing, e.g. one built programmatically.
    pub fn insert(&mut self, drawing: Drawing) -> Result<DrawingId, DrawingError> {
        if !drawing.is_complete() {
            return Err(DrawingError::IncompletePoints {
                kind: drawing.kind(),
                required: drawing.kind().required_points(),
                found: drawing.points().len(),
            });
        }
        let id = drawing.id();
        if self.get(id).is_some() {
            self.drawings.retain(|d| d.id() != id);
        }
        self.drawings.push(drawing);
        self.changed();
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{CoordinateAdapter, LinearCoordinates};
    use crate::drawing::{DrawingKind, DrawingState};

    fn coords() -> LinearCoordinates {
        // 1 time unit and 1 price unit per pixel.
        LinearCoordinates::new((0.0, 400.0), (0.0, 400.0), 400.0, 400.0)
    }

    fn add_trend_line(m: &mut DrawingManager, view: &ChartView<'_>, from: (f64, f64), to: (f64, f64)) -> DrawingId {
        m.set_mode(DrawingMode::Create(DrawingKind::TrendLine));
        assert!(m.start_drawing(view, from.0, from.1));
        assert!(m.finish_drawing(view, to.0, to.1));
        m.drawings().last().unwrap().id()
    }

    #[test]
    fn test_single_point_kind_commits_immediately() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        m.set_mode(DrawingMode::Create(DrawingKind::HorizontalLine));
        assert!(m.start_drawing(&view, 10.0, 200.0));
        assert_eq!(m.len(), 1);
        assert!(m.active().is_none());
        assert_eq!(m.mode(), DrawingMode::None);
        assert_eq!(m.interaction(), InteractionState::Idle);
    }

    #[test]
    fn test_mode_events() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        add_trend_line(&mut m, &view, (10.0, 10.0), (50.0, 50.0));
        let events = m.take_events();
        assert_eq!(
            events.first(),
            Some(&DrawingEvent::ModeChanged(DrawingMode::Create(DrawingKind::TrendLine)))
        );
        assert!(events.contains(&DrawingEvent::ModeChanged(DrawingMode::None)));
        assert_eq!(events.last(), Some(&DrawingEvent::DrawingsChanged));
    }

    #[test]
    fn test_select_prefers_topmost() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let bottom = add_trend_line(&mut m, &view, (0.0, 100.0), (200.0, 100.0));
        let top = add_trend_line(&mut m, &view, (0.0, 100.0), (200.0, 100.0));

        assert_eq!(m.select_drawing_at(&view, 100.0, 101.0), Some(top));
        assert_eq!(m.get(top).unwrap().state(), DrawingState::Selected);

        assert!(m.send_to_back(top));
        assert_eq!(m.select_drawing_at(&view, 100.0, 101.0), Some(bottom));
        assert_eq!(m.get(top).unwrap().state(), DrawingState::Complete);

        assert_eq!(m.select_drawing_at(&view, 300.0, 300.0), None);
        assert_eq!(m.selected(), None);
    }

    #[test]
    fn test_select_ignored_in_create_mode() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        add_trend_line(&mut m, &view, (0.0, 100.0), (200.0, 100.0));
        m.set_mode(DrawingMode::Create(DrawingKind::Rectangle));
        assert_eq!(m.select_drawing_at(&view, 100.0, 100.0), None);
    }

    #[test]
    fn test_control_point_drag() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let id = add_trend_line(&mut m, &view, (10.0, 10.0), (100.0, 100.0));

        assert!(m.handle_press(&view, 101.0, 99.0));
        assert_eq!(m.selected(), Some(id));
        assert_eq!(m.interaction(), InteractionState::DraggingControlPoint(1));

        assert!(m.handle_drag(&view, 150.0, 50.0));
        m.handle_release();
        assert_eq!(m.interaction(), InteractionState::Selected);

        let end = m.get(id).unwrap().points()[1];
        let expected = coords.to_logical(PixelPos::new(150.0, 50.0)).unwrap();
        assert_eq!(end, expected);
    }

    #[test]
    fn test_whole_drag_moves_all_points() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let id = add_trend_line(&mut m, &view, (10.0, 10.0), (100.0, 100.0));
        let before = m.get(id).unwrap().points().to_vec();

        assert!(m.handle_press(&view, 55.0, 55.0));
        assert_eq!(m.interaction(), InteractionState::DraggingWhole);
        m.handle_drag(&view, 60.0, 55.0);
        m.handle_drag(&view, 65.0, 45.0);
        m.handle_release();

        let after = m.get(id).unwrap().points();
        for (a, b) in before.iter().zip(after) {
            assert!((b.time - a.time - 10.0).abs() < 1e-9);
            assert!((b.price - a.price - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_locked_drawing_cannot_move_or_delete() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let id = add_trend_line(&mut m, &view, (10.0, 10.0), (100.0, 100.0));
        m.select(Some(id));
        m.set_drawing_locked(id, true);

        assert!(!m.begin_drag(DragTarget::Whole));
        assert!(!m.move_drawing(&view, 5.0, 5.0));
        assert!(!m.move_control_point(&view, 0, 0.0, 0.0));
        assert!(!m.delete_selected());
        assert_eq!(m.len(), 1);

        m.set_drawing_locked(id, false);
        m.set_locked_all(true);
        assert!(!m.delete_drawing(id));

        m.delete_all();
        assert!(m.is_empty());
    }

    #[test]
    fn test_begin_drag_without_selection_is_noop() {
        let mut m = DrawingManager::new();
        assert!(!m.begin_drag(DragTarget::Whole));
        assert_eq!(m.interaction(), InteractionState::Idle);
    }

    #[test]
    fn test_move_control_point_out_of_range() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let id = add_trend_line(&mut m, &view, (10.0, 10.0), (100.0, 100.0));
        m.select(Some(id));
        assert!(!m.begin_drag(DragTarget::ControlPoint(7)));
        assert!(!m.move_control_point(&view, 7, 0.0, 0.0));
    }

    #[test]
    fn test_escape_abandons_creation() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        m.set_mode(DrawingMode::Create(DrawingKind::Triangle));
        m.handle_press(&view, 10.0, 10.0);
        m.handle_hover(&view, 50.0, 50.0);
        assert_eq!(m.interaction(), InteractionState::Creating);

        assert!(m.handle_key(Key::Escape));
        assert!(m.active().is_none());
        assert_eq!(m.mode(), DrawingMode::None);
        assert!(m.is_empty());
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let id = add_trend_line(&mut m, &view, (10.0, 10.0), (100.0, 100.0));
        m.select(Some(id));
        m.take_events();

        assert!(m.handle_key(Key::Backspace));
        assert!(m.is_empty());
        assert!(m.take_events().contains(&DrawingEvent::SelectionChanged(None)));
        assert!(!m.handle_key(Key::Delete));
    }

    #[test]
    fn test_hover_tracks_control_points() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let id = add_trend_line(&mut m, &view, (10.0, 10.0), (100.0, 100.0));
        assert!(m.handle_hover(&view, 12.0, 10.0));
        assert_eq!(m.hovered_point(), Some((id, 0)));
        assert!(!m.handle_hover(&view, 13.0, 10.0));
        assert!(m.handle_hover(&view, 300.0, 300.0));
        assert_eq!(m.hovered_point(), None);
    }

    #[test]
    fn test_hidden_all_blocks_hits() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        add_trend_line(&mut m, &view, (0.0, 100.0), (200.0, 100.0));
        m.set_hidden_all(true);
        assert_eq!(m.select_drawing_at(&view, 100.0, 300.0), None);
        assert_eq!(m.visible_drawings().count(), 0);
        m.set_hidden_all(false);
        assert_eq!(m.visible_drawings().count(), 1);
    }

    #[test]
    fn test_duplicate_and_z_order() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let a = add_trend_line(&mut m, &view, (0.0, 0.0), (10.0, 10.0));
        let b = add_trend_line(&mut m, &view, (20.0, 20.0), (30.0, 30.0));
        let copy = m.duplicate(a).unwrap();
        assert_ne!(copy, a);
        assert_eq!(m.drawings().last().unwrap().id(), copy);
        assert_eq!(m.get(copy).unwrap().points(), m.get(a).unwrap().points());

        assert!(m.bring_to_front(a));
        let order: Vec<DrawingId> = m.drawings().iter().map(Drawing::id).collect();
        assert_eq!(order, vec![b, copy, a]);
    }

    #[test]
    fn test_min_drawing_size_discards_tiny_drawings() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let config = DrawingConfig {
            min_drawing_size_px: 5.0,
            ..DrawingConfig::default()
        };
        let mut m = DrawingManager::with_config(&config, &MagnetConfig::default());
        m.set_mode(DrawingMode::Create(DrawingKind::Rectangle));
        m.start_drawing(&view, 10.0, 10.0);
        m.finish_drawing(&view, 12.0, 11.0);
        assert!(m.is_empty());
        assert_eq!(m.mode(), DrawingMode::None);
    }

    #[test]
    fn test_regression_uses_configured_deviation() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let config = DrawingConfig {
            regression_deviation: 1.5,
            ..DrawingConfig::default()
        };
        let mut m = DrawingManager::with_config(&config, &MagnetConfig::default());
        m.set_mode(DrawingMode::Create(DrawingKind::RegressionTrend));
        m.start_drawing(&view, 10.0, 10.0);
        m.finish_drawing(&view, 100.0, 10.0);
        match &m.drawings()[0].style().ext {
            StyleExt::Regression(ext) => assert_eq!(ext.deviation_multiplier, 1.5),
            other => panic!("unexpected ext {other:?}"),
        }
    }

    #[test]
    fn test_hidden_drawing_is_not_hit() {
        let coords = coords();
        let view = ChartView::new(&coords, &[]);
        let mut m = DrawingManager::new();
        let id = add_trend_line(&mut m, &view, (0.0, 100.0), (200.0, 100.0));
        assert!(m.set_visible(id, false));
        assert_eq!(m.drawing_at(&view, 100.0, 100.0), None);
        assert_eq!(m.visible_drawings().count(), 0);
        assert!(m.set_visible(id, true));
        assert_eq!(m.drawing_at(&view, 100.0, 100.0), Some(id));
        assert!(!m.set_visible(DrawingId::from_raw(987_654).unwrap(), true));
    }

    #[test]
    fn test_insert_requires_complete_drawing() {
        let mut m = DrawingManager::new();
        assert!(m.insert(Drawing::new(DrawingKind::TrendLine)).is_err());

        let line = Drawing::from_points(
            DrawingKind::TrendLine,
            &[LogicalPoint::new(1.0, 1.0), LogicalPoint::new(2.0, 2.0)],
        )
        .unwrap();
        let id = m.insert(line.clone()).unwrap();
        assert_eq!(m.insert(line).unwrap(), id);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_set_style_unknown_id() {
        let mut m = DrawingManager::new();
        let result = m.set_style(DrawingId::from_raw(123_456).unwrap(), Style::default());
        assert!(matches!(result, Err(DrawingError::NotFound(123_456))));
    }
}
