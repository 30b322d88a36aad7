//! Parameter metadata for the detectors
//!
//! This module describes each detector's tunable parameters, enabling:
//! - Threshold sweeps (grid search)
//! - Parameter documentation
//! - Building detectors from loosely typed key/value settings
//!
//! # Example
//!
//! ```rust
//! use fvgscan::params::{ParamMeta, ParamType, ParameterizedDetector};
//! use fvgscan::prelude::*;
//!
//! for param in GapDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::{Period, Price, Ratio, Result, ScanError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value (0.0..=1.0)
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Price distance in currency units (>= 0)
  Price,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "min_gap_pct")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn price(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Price, default, range, description }
  }

  /// Generate all values for grid search
  ///
  /// Values are computed as `min + k * step` so long grids do not drift.
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    if step <= 0.0 || !step.is_finite() {
      return vec![min];
    }
    let steps = ((max - min) / step + 1e-9).floor() as usize;
    (0..=steps).map(|k| min + k as f64 * step).collect()
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(ScanError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Price => Price::new(value).map(|_| ()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(ScanError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Short detector name used in logs and reports
  fn detector_name() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  match params.get(key).copied() {
    None => Period::new(default),
    Some(value) if value >= 1.0 && value.fract() == 0.0 => Period::new(value as usize),
    Some(_) => Err(ScanError::InvalidValue("Period must be a positive integer")),
  }
}

/// Helper to get a Price from params with default fallback
pub fn get_price(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Price> {
  let value = params.get(key).copied().unwrap_or(default);
  Price::new(value)
}

// ============================================================
// TESTS
// ============================================================
