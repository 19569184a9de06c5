//! Lookups over a bar series ordered by ascending timestamp.

use crate::candle::Candle;

/// Index of the bar whose timestamp is closest to `time`.
///
/// Ties resolve to the earlier bar. Returns `None` for an empty series or a
/// non-finite time.
pub fn nearest_bar_index(bars: &[Candle], time: f64) -> Option<usize> {
    if bars.is_empty() || !time.is_finite() {
        return None;
    }

    let idx = bars.partition_point(|c| c.timestamp < time);
    if idx == 0 {
        return Some(0);
    }
    if idx >= bars.len() {
        return Some(bars.len() - 1);
    }

    let before = time - bars[idx - 1].timestamp;
    let after = bars[idx].timestamp - time;
    if after < before {
        Some(idx)
    } else {
        Some(idx - 1)
    }
}

/// The contiguous slice of bars with `t0 <= timestamp <= t1`.
///
/// The bounds may be given in either order.
pub fn bars_in_range(bars: &[Candle], t0: f64, t1: f64) -> &[Candle] {
    if !t0.is_finite() || !t1.is_finite() {
        return &[];
    }
    let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
    let start = bars.partition_point(|c| c.timestamp < lo);
    let end = bars.partition_point(|c| c.timestamp <= hi);
    if start >= end {
        return &[];
    }
    &bars[start..end]
}
