//! Chart annotation engine: drawings anchored to (time, price) points,
//! projected through a coordinate adapter, edited through a pointer-driven
//! state machine, and persisted per symbol.

pub mod coords;
pub mod drawing;
pub mod error;
pub mod events;
pub mod geometry;
pub mod persistence;

pub use charter_config::MagnetMode;
pub use coords::{ChartView, CoordinateAdapter, LinearCoordinates, PixelPos};
pub use drawing::{
    DragTarget, Drawing, DrawingId, DrawingKind, DrawingManager, DrawingMode, DrawingState, LogicalPoint, Style,
};
pub use error::{DrawingError, PersistError};
pub use events::{DrawingEvent, EventBus, Key};
pub use persistence::{JsonFileStore, LoadReport, MemoryStore, PersistenceBridge};
