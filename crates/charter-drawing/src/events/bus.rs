//! Event bus for queuing drawing notifications.
//!
//! The [`EventBus`] collects events while the manager handles input; the host
//! drains them afterwards and forwards them to its observers.

use std::collections::VecDeque;

use super::types::DrawingEvent;

/// A simple FIFO queue of drawing events.
///
/// Back-to-back [`DrawingEvent::DrawingsChanged`] entries are coalesced, so a
/// burst of pointer moves yields one repaint request.
///
/// # Usage Pattern
///
/// ```ignore
/// manager.handle_drag(&view, x, y);
///
/// for event in manager.events_mut().drain_events() {
///     match event {
///         DrawingEvent::DrawingsChanged => renderer.request_redraw(),
///         DrawingEvent::SelectionChanged(id) => attribute_bar.show(id),
///         DrawingEvent::ModeChanged(mode) => toolbar.set_active(mode),
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct EventBus {
    events: VecDeque<DrawingEvent>,
}

impl EventBus {
    /// Create a new empty event bus.
    #[must_use]
    pub fn new() -> Self {
        Self { events: VecDeque::new() }
    }

    /// Create an event bus with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// Queue an event. A `DrawingsChanged` directly after another one is dropped.
    pub fn emit(&mut self, event: DrawingEvent) {
        if event.is_redraw() && self.events.back().is_some_and(DrawingEvent::is_redraw) {
            return;
        }
        self.events.push_back(event);
    }

    /// Emit multiple events at once.
    pub fn emit_all(&mut self, events: impl IntoIterator<Item = DrawingEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Drain all pending events in FIFO order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = DrawingEvent> + '_ {
        self.events.drain(..)
    }

    /// Take all pending events, leaving the queue empty.
    #[must_use]
    pub fn take_events(&mut self) -> Vec<DrawingEvent> {
        std::mem::take(&mut self.events).into_iter().collect()
    }

    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Peek at pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &DrawingEvent> {
        self.events.iter()
    }

    /// Clear all pending events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
