//! Error types for drawing deserialization, styling and persistence.
//!
//! Geometry and hit-testing never produce errors; they report "no result"
//! through `Option`/`bool` instead.

use thiserror::Error;

use crate::drawing::DrawingKind;

/// Errors raised while building or restoring a single drawing.
#[derive(Error, Debug)]
pub enum DrawingError {
    #[error("unknown drawing type `{0}`")]
    UnknownKind(String),
    #[error("{kind} takes at most {max} points, found {found}")]
    TooManyPoints {
        kind: DrawingKind,
        max: usize,
        found: usize,
    },
    #[error("{kind} is marked complete but has {found} of {required} points")]
    IncompletePoints {
        kind: DrawingKind,
        required: usize,
        found: usize,
    },
    #[error("point {index} has a non-finite coordinate")]
    NonFinitePoint { index: usize },
    #[error("invalid style: {0}")]
    InvalidStyle(String),
    #[error("drawing {0} not found")]
    NotFound(u64),
    #[error("drawing id {0} is out of range")]
    IdOutOfRange(u64),
    #[error("malformed drawing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a persistence bridge.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("drawing store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("drawing store JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("drawing document for `{symbol}` is not a drawing list")]
    Format { symbol: String },
}
