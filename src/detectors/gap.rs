//! Three-bar Fair Value Gap detector
//!
//! For each window `(i-2, i-1, i)` only the outer bars are read: a bullish gap
//! is `bars[i].low > bars[i-2].high`, a bearish gap is `bars[i].high < bars[i-2].low`.
//! The middle bar is the displacement candle and its prices never enter the test.
//!
//! A gap becomes a [`Setup`] when it passes both thresholds (inclusive):
//! `gap >= min_gap_dollar` and `gap / bars[i].close >= min_gap_pct`.

use std::collections::HashMap;

use crate::{
  params::{get_price, get_ratio, ParamMeta, ParameterizedDetector},
  Bias, Direction, OHLCVExt, Price, Ratio, Result, Setup, OHLCV,
};

use super::helpers::{self, round_cents, REWARD_MULTIPLE};

/// Fair Value Gap detector with absolute and relative size thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct GapDetector {
  pub min_gap_dollar: Price,
  pub min_gap_pct: Ratio,
}

impl Default for GapDetector {
  fn default() -> Self {
    Self {
      min_gap_dollar: Price::new_const(helpers::DEFAULT_MIN_GAP_DOLLAR),
      min_gap_pct: Ratio::new_const(helpers::DEFAULT_MIN_GAP_PCT),
    }
  }
}

impl GapDetector {
  pub fn new(min_gap_dollar: Price, min_gap_pct: Ratio) -> Self {
    Self { min_gap_dollar, min_gap_pct }
  }

  pub fn with_defaults() -> Self {
    Self::default()
  }

  /// Check the window ending at `index`.
  ///
  /// Returns `None` when there is no qualifying gap, when `index < 2`, or when
  /// either outer bar has unusable prices.
  pub fn detect_at<T: OHLCV>(&self, bars: &[T], index: usize, direction: Direction) -> Option<Setup> {
    if index < 2 {
      return None;
    }
    let first = bars.get(index - 2)?;
    let third = bars.get(index)?;

    let (Some((first_high, first_low, _)), Some((third_high, third_low, third_close))) =
      (first.finite_hlc(), third.finite_hlc())
    else {
      log::trace!("{}: skipping window at {index}, non-finite prices", Self::detector_name());
      return None;
    };
    if third_close <= 0.0 {
      log::trace!("{}: skipping window at {index}, close {third_close} <= 0", Self::detector_name());
      return None;
    }

    let (gap, entry, stop, target) = match direction {
      Direction::Bullish => {
        if third_low <= first_high {
          return None;
        }
        let gap = third_low - first_high;
        (gap, first_high, first_low, first_high + REWARD_MULTIPLE * gap)
      },
      Direction::Bearish => {
        if third_high >= first_low {
          return None;
        }
        let gap = first_low - third_high;
        (gap, first_low, first_high, first_low - REWARD_MULTIPLE * gap)
      },
    };

    if gap < self.min_gap_dollar.get() || gap / third_close < self.min_gap_pct.get() {
      return None;
    }

    let setup = Setup {
      direction,
      entry: round_cents(entry),
      stop: round_cents(stop),
      target: round_cents(target),
      index,
      timestamp: third.timestamp(),
    };

    // A flat first bar (or sub-cent levels) collapses after rounding.
    if !setup.is_consistent() {
      log::debug!(
        "{}: dropping degenerate {direction} setup at {index}: {setup}",
        Self::detector_name()
      );
      return None;
    }

    log::debug!("{}: {setup} (gap {gap:.4})", Self::detector_name());
    Some(setup)
  }

  /// Lazily scan every window of `bars` in order.
  pub fn iter<'a, T: OHLCV>(&'a self, bars: &'a [T], direction: Direction) -> GapIterator<'a, T> {
    GapIterator { detector: self, bars, direction, current: 2 }
  }

  /// Scan every window of `bars` and collect the setups in bar order.
  pub fn detect<T: OHLCV>(&self, bars: &[T], direction: Direction) -> Vec<Setup> {
    self.iter(bars, direction).collect()
  }

  /// Scan for gaps agreeing with `bias`.
  ///
  /// Callers must check the bias first: with [`Bias::Unknown`] there is no
  /// direction to scan for, so a warning is logged and nothing is returned.
  pub fn detect_with_bias<T: OHLCV>(&self, bars: &[T], bias: Bias) -> Vec<Setup> {
    match bias.direction() {
      Some(direction) => self.detect(bars, direction),
      None => {
        log::warn!("{}: scan requested with unknown bias, skipping", Self::detector_name());
        Vec::new()
      },
    }
  }

  pub fn validate_config(&self) -> Result<()> {
    Price::new(self.min_gap_dollar.get())?;
    Ratio::new(self.min_gap_pct.get())?;
    Ok(())
  }
}

impl ParameterizedDetector for GapDetector {
  fn param_meta() -> &'static [ParamMeta] {
    static META: [ParamMeta; 2] = [
      ParamMeta::price(
        "min_gap_dollar",
        helpers::DEFAULT_MIN_GAP_DOLLAR,
        (0.05, 1.0, 0.05),
        "Minimum gap between outer bars in currency units",
      ),
      ParamMeta::ratio(
        "min_gap_pct",
        helpers::DEFAULT_MIN_GAP_PCT,
        (0.0, 0.005, 0.00025),
        "Minimum gap relative to the third bar's close",
      ),
    ];
    &META
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self {
      min_gap_dollar: get_price(params, "min_gap_dollar", helpers::DEFAULT_MIN_GAP_DOLLAR)?,
      min_gap_pct: get_ratio(params, "min_gap_pct", helpers::DEFAULT_MIN_GAP_PCT)?,
    })
  }

  fn detector_name() -> &'static str {
    "FVG_3BAR"
  }
}

/// Iterator over the setups of one bar series
pub struct GapIterator<'a, T: OHLCV> {
  detector: &'a GapDetector,
  bars: &'a [T],
  direction: Direction,
  current: usize,
}

impl<'a, T: OHLCV> Iterator for GapIterator<'a, T> {
  type Item = Setup;

  fn next(&mut self) -> Option<Self::Item> {
    while self.current < self.bars.len() {
      let index = self.current;
      self.current += 1;
      if let Some(setup) = self.detector.detect_at(self.bars, index, self.direction) {
        return Some(setup);
      }
    }
    None
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.bars.len().saturating_sub(self.current)))
  }
}

/// Gap scan with explicit thresholds.
///
/// `bias` must not be [`Bias::Unknown`]; see [`GapDetector::detect_with_bias`].
pub fn detect_gaps<T: OHLCV>(
  bars: &[T],
  bias: Bias,
  min_gap_dollar: Price,
  min_gap_pct: Ratio,
) -> Vec<Setup> {
  GapDetector::new(min_gap_dollar, min_gap_pct).detect_with_bias(bars, bias)
}
