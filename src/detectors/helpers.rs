//! Constants and numeric helpers shared by the detectors.

// ============================================================
// DEFAULTS
// ============================================================

/// SMA lookback for the trend bias
pub const DEFAULT_BIAS_PERIOD: usize = 20;
/// Minimum gap in currency units
pub const DEFAULT_MIN_GAP_DOLLAR: f64 = 0.1;
/// Minimum gap relative to the third bar's close (5 bps)
pub const DEFAULT_MIN_GAP_PCT: f64 = 0.0005;
/// Bars kept by a "recent" scan
pub const DEFAULT_RECENT_BARS: usize = 50;
/// Setups kept by a report
pub const DEFAULT_TOP_N: usize = 10;
/// Target distance as a multiple of the gap
pub const REWARD_MULTIPLE: f64 = 1.5;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Round a price to two decimals, half away from zero.
#[inline]
pub fn round_cents(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// Simple moving average column.
///
/// Position `i` holds the mean of `values[i + 1 - period..=i]`. The first
/// `period - 1` positions, and any window holding a non-finite value, are `None`.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
  let mut column = vec![None; values.len()];
  if period == 0 || values.len() < period {
    return column;
  }

  for (slot, window) in column[period - 1..].iter_mut().zip(values.windows(period)) {
    if window.iter().all(|v| v.is_finite()) {
      *slot = Some(window.iter().sum::<f64>() / period as f64);
    }
  }
  column
}
