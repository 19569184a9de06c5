//! Candle data structures for OHLCV data.

/// OHLCV candle. `timestamp` shares the time axis used by drawing points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub timestamp: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: f64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A bar carrying a single value (line/area series), all four prices equal.
    pub fn from_value(timestamp: f64, value: f64) -> Self {
        Self::new(timestamp, value, value, value, value, 0.0)
    }

    /// Open, high, low, close in that order.
    pub fn ohlc(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }
}

/// Trait for types that provide OHLCV data.
pub trait OHLCV {
    fn time(&self) -> f64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

impl OHLCV for Candle {
    fn time(&self) -> f64 {
        self.timestamp
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_flattens_prices() {
        let c = Candle::from_value(10.0, 42.5);
        assert_eq!(c.ohlc(), [42.5; 4]);
        assert_eq!(c.close(), 42.5);
        assert_eq!(c.time(), 10.0);
    }
}
