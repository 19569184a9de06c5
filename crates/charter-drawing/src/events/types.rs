//! Event type definitions.
//!
//! - [`DrawingEvent`] - notifications for the render scheduler, attribute bar
//!   and toolbar
//! - [`Key`] - keyboard input understood by the manager

use crate::drawing::{DrawingId, DrawingMode};

/// Something observers of the drawing manager need to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingEvent {
    /// A drawing was added, removed or changed; schedule a repaint.
    DrawingsChanged,
    /// The selected drawing changed, `None` when nothing is selected.
    SelectionChanged(Option<DrawingId>),
    /// The active creation mode changed.
    ModeChanged(DrawingMode),
}

impl DrawingEvent {
    /// Check if this event only asks for a repaint.
    #[must_use]
    pub fn is_redraw(&self) -> bool {
        matches!(self, DrawingEvent::DrawingsChanged)
    }
}

/// Keys with a meaning for drawings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Other,
}

impl Key {
    /// Check if this key removes the selected drawing.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self, Key::Delete | Key::Backspace)
    }
}
