//! Notifications raised by the drawing manager and the keys it reacts to.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{DrawingEvent, Key};
