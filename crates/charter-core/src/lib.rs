//! Core types for the charter drawing engine.
//!
//! This crate provides fundamental data structures with no external dependencies:
//! - `Candle` - OHLCV bar data
//! - `bars` - lookups over a time-ordered bar series

pub mod bars;
pub mod candle;

pub use bars::{bars_in_range, nearest_bar_index};
pub use candle::{Candle, OHLCV};
