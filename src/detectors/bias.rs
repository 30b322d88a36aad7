//! Trend bias from a simple moving average of closes.
//!
//! The last close is compared with the last fully populated SMA value:
//! strictly above is bullish, anything else (ties included) is bearish.

use std::collections::HashMap;

use crate::{
  params::{get_period, ParamMeta, ParameterizedDetector},
  Bias, Period, Result, OHLCV,
};

use super::helpers::{self, sma};

/// SMA trend bias estimator
#[derive(Debug, Clone, PartialEq)]
pub struct TrendBiasEstimator {
  pub period: Period,
}

impl Default for TrendBiasEstimator {
  fn default() -> Self {
    Self { period: Period::new_const(helpers::DEFAULT_BIAS_PERIOD) }
  }
}

impl TrendBiasEstimator {
  pub fn new(period: Period) -> Self {
    Self { period }
  }

  pub fn with_defaults() -> Self {
    Self::default()
  }

  /// Classify `bars`. Fewer bars than the period yields [`Bias::Unknown`].
  pub fn estimate<T: OHLCV>(&self, bars: &[T]) -> Bias {
    let period = self.period.get();
    if bars.len() < period {
      log::debug!("{}: {} bar(s) < period {period}, unknown", Self::detector_name(), bars.len());
      return Bias::Unknown;
    }

    // Only the trailing window feeds the last SMA value.
    let closes: Vec<f64> = bars[bars.len() - period..].iter().map(|b| b.close()).collect();
    let Some(Some(last_sma)) = sma(&closes, period).last().copied() else {
      log::debug!("{}: moving average undefined, unknown", Self::detector_name());
      return Bias::Unknown;
    };
    let last_close = closes[closes.len() - 1];

    let bias = if last_close > last_sma { Bias::Bullish } else { Bias::Bearish };
    log::debug!(
      "{}: close {last_close} vs sma{period} {last_sma} -> {bias}",
      Self::detector_name()
    );
    bias
  }

  pub fn validate_config(&self) -> Result<()> {
    Period::new(self.period.get()).map(|_| ())
  }
}

impl ParameterizedDetector for TrendBiasEstimator {
  fn param_meta() -> &'static [ParamMeta] {
    static META: [ParamMeta; 1] = [ParamMeta::period(
      "period",
      helpers::DEFAULT_BIAS_PERIOD as f64,
      (5.0, 100.0, 5.0),
      "SMA lookback in coarse bars",
    )];
    &META
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self { period: get_period(params, "period", helpers::DEFAULT_BIAS_PERIOD)? })
  }

  fn detector_name() -> &'static str {
    "TREND_BIAS_SMA"
  }
}

/// Bias of `bars` with the default 20-bar lookback.
pub fn estimate_bias<T: OHLCV>(bars: &[T]) -> Bias {
  TrendBiasEstimator::default().estimate(bars)
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Close(f64);

  impl OHLCV for Close {
    fn open(&self) -> f64 {
      self.0
    }

    fn high(&self) -> f64 {
      self.0
    }

    fn low(&self) -> f64 {
      self.0
    }

    fn close(&self) -> f64 {
      self.0
    }

    fn volume(&self) -> f64 {
      0.0
    }
  }

  fn closes(values: impl IntoIterator<Item = f64>) -> Vec<Close> {
    values.into_iter().map(Close).collect()
  }

  #[test]
  fn test_insufficient_data_is_unknown() {
    assert_eq!(estimate_bias::<Close>(&[]), Bias::Unknown);
    assert_eq!(estimate_bias(&closes((0..19).map(|i| 100.0 + i as f64))), Bias::Unknown);
  }

  #[test]
  fn test_exactly_period_bars_is_known() {
    assert_eq!(estimate_bias(&closes((0..20).map(|i| 100.0 + i as f64))), Bias::Bullish);
  }

  #[test]
  fn test_bullish_when_close_above_sma() {
    let bars = closes((0..40).map(|i| 100.0 + i as f64 * 0.5));
    assert_eq!(estimate_bias(&bars), Bias::Bullish);
  }

  #[test]
  fn test_bearish_when_close_below_sma() {
    let bars = closes((0..40).map(|i| 100.0 - i as f64 * 0.5));
    assert_eq!(estimate_bias(&bars), Bias::Bearish);
  }

  #[test]
  fn test_tie_is_bearish() {
    let bars = closes(std::iter::repeat(100.0).take(25));
    assert_eq!(estimate_bias(&bars), Bias::Bearish);
  }

  #[test]
  fn test_only_trailing_window_matters() {
    // Early crash is outside the last 20 bars.
    let mut values: Vec<f64> = vec![1.0; 10];
    values.extend((0..20).map(|i| 100.0 + i as f64));
    assert_eq!(estimate_bias(&closes(values)), Bias::Bullish);
  }

  #[test]
  fn test_non_finite_close_in_window_is_unknown() {
    let mut values: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
    values[20] = f64::NAN;
    assert_eq!(estimate_bias(&closes(values.clone())), Bias::Unknown);

    // Outside the trailing window it is ignored.
    values[20] = 120.0;
    values[2] = f64::NAN;
    assert_eq!(estimate_bias(&closes(values)), Bias::Bullish);
  }

  #[test]
  fn test_custom_period() {
    let estimator = TrendBiasEstimator::new(Period::new(3).unwrap());
    assert_eq!(estimator.estimate(&closes([1.0, 2.0])), Bias::Unknown);
    assert_eq!(estimator.estimate(&closes([3.0, 2.0, 1.0])), Bias::Bearish);
    assert_eq!(estimator.estimate(&closes([1.0, 2.0, 3.0])), Bias::Bullish);
  }

  #[test]
  fn test_input_untouched() {
    let bars = closes((0..30).map(|i| 100.0 + i as f64));
    let before: Vec<f64> = bars.iter().map(|b| b.0).collect();
    let first = estimate_bias(&bars);
    let after: Vec<f64> = bars.iter().map(|b| b.0).collect();
    assert_eq!(before, after);
    assert_eq!(first, estimate_bias(&bars));
  }

  #[test]
  fn test_with_params() {
    let mut params = HashMap::new();
    params.insert("period", 50.0);
    let estimator = TrendBiasEstimator::with_params(&params).unwrap();
    assert_eq!(estimator.period.get(), 50);
    assert!(estimator.validate_config().is_ok());
    assert_eq!(TrendBiasEstimator::param_meta()[0].name, "period");
  }

  #[test]
  fn test_detector_name() {
    assert_eq!(TrendBiasEstimator::detector_name(), "TREND_BIAS_SMA");
  }
}
