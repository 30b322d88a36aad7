//! # fvgscan - trend-filtered Fair Value Gap scanner
//!
//! Scans OHLC price series for two signals: a directional bias from a 20-bar
//! simple moving average on a coarse series, and three-bar Fair Value Gaps on a
//! finer series that agree with that bias. Each accepted gap becomes a
//! [`Setup`] with entry, stop and target levels; setups from many symbols are
//! ranked by reward distance.
//!
//! ## Quick Start
//!
//! ```rust
//! use fvgscan::prelude::*;
//!
//! // Define your OHLCV data
//! struct Bar { o: f64, h: f64, l: f64, c: f64, t: i64 }
//!
//! impl OHLCV for Bar {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//!     fn volume(&self) -> f64 { 0.0 }
//!     fn timestamp(&self) -> Option<i64> { Some(self.t) }
//! }
//!
//! let scanner = ScannerBuilder::new()
//!     .recent(50)
//!     .build()
//!     .unwrap();
//!
//! let hourly: Vec<Bar> = vec![];
//! let quarter_hourly: Vec<Bar> = vec![];
//! let result = scanner.scan("AAPL", &hourly, &quarter_hourly).unwrap();
//! assert_eq!(result.bias, Bias::Unknown);
//! ```

use std::fmt;

pub mod detectors;
pub mod params;
pub mod rank;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Parameters
        params::{get_period, get_price, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        // Ranking
        rank::{rank_setups, RankedSetup, Report, SymbolSummary},
        // Parallel
        scan_parallel,
        // Types
        Bias,
        Direction,
        // Core traits
        OHLCVExt,
        Period,
        Price,
        Ratio,
        Result,
        ScanConfig,
        // Errors
        ScanError,
        ScanMode,
        ScanResult,
        Scanner,
        ScannerBuilder,
        Setup,
        SymbolError,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors raised by configuration validation and strict data checks.
///
/// The detection functions themselves never fail; they return empty results.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(ScanError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScanError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Absolute price distance in currency units (finite, >= 0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Price(f64);

impl Price {
    /// Create a new Price, validating the value is finite and not negative
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(ScanError::InvalidValue("Price cannot be NaN or infinite"));
        }
        if value < 0.0 {
            return Err(ScanError::OutOfRange {
                field: "Price",
                value,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Price {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Price {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Price::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScanError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
///
/// A bar series is any slice of `OHLCV` values ordered by strictly increasing
/// timestamp. The scanner only reads the slice.
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

impl<T: OHLCV + ?Sized> OHLCV for &T {
    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }

    fn volume(&self) -> f64 {
        (**self).volume()
    }

    fn timestamp(&self) -> Option<i64> {
        (**self).timestamp()
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    /// High, low and close if all three are finite.
    ///
    /// `None` marks a bar whose price fields cannot be used.
    #[inline]
    fn finite_hlc(&self) -> Option<(f64, f64, f64)> {
        let (h, l, c) = (self.high(), self.low(), self.close());
        (h.is_finite() && l.is_finite() && c.is_finite()).then_some((h, l, c))
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(ScanError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(ScanError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(ScanError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        if self.low() < 0.0 {
            return Err(ScanError::InvalidOHLCV {
                index: 0,
                reason: "negative price",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV + ?Sized> OHLCVExt for T {}

// ============================================================
// BIAS / DIRECTION / SETUP
// ============================================================

/// Trend classification of a coarse bar series
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    /// Not enough data, or the moving average is undefined
    #[default]
    Unknown,
}

impl Bias {
    /// Gap direction this bias scans for. `None` for [`Bias::Unknown`].
    #[inline]
    pub fn direction(self) -> Option<Direction> {
        match self {
            Bias::Bullish => Some(Direction::Bullish),
            Bias::Bearish => Some(Direction::Bearish),
            Bias::Unknown => None,
        }
    }

    #[inline]
    pub fn is_known(self) -> bool {
        !matches!(self, Bias::Unknown)
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bias::Bullish => "bullish",
            Bias::Bearish => "bearish",
            Bias::Unknown => "unknown",
        })
    }
}

/// Direction of a detected gap and the trade derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

impl From<Direction> for Bias {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Bullish => Bias::Bullish,
            Direction::Bearish => Bias::Bearish,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Bias::from(*self), f)
    }
}

/// Candidate trade derived from one Fair Value Gap - Copy, no allocations
///
/// Prices are rounded to cents when the setup is emitted.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Setup {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    /// Position of the third (triggering) bar in the scanned series
    pub index: usize,
    /// Timestamp of the third bar, if the bar type provides one
    pub timestamp: Option<i64>,
}

impl Setup {
    /// Absolute distance between target and entry, to the cent.
    #[inline]
    pub fn reward(&self) -> f64 {
        detectors::round_cents((self.target - self.entry).abs())
    }

    /// Absolute distance between entry and stop, to the cent.
    #[inline]
    pub fn risk(&self) -> f64 {
        detectors::round_cents((self.entry - self.stop).abs())
    }

    /// True when the levels are ordered for the direction:
    /// stop < entry < target (bullish), target < entry < stop (bearish).
    pub fn is_consistent(&self) -> bool {
        match self.direction {
            Direction::Bullish => self.stop < self.entry && self.entry < self.target,
            Direction::Bearish => self.target < self.entry && self.entry < self.stop,
        }
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Entry: {:.2} | Stop: {:.2} | Target: {:.2} | Time: ",
            self.direction, self.entry, self.stop, self.target
        )?;
        match self.timestamp {
            Some(ts) => write!(f, "{ts}"),
            None => write!(f, "#{}", self.index),
        }
    }
}

// ============================================================
// SCAN CONFIGURATION
// ============================================================

/// Which part of the fine series is scanned for gaps
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScanMode {
    /// Every bar of the fine series
    #[default]
    History,
    /// Only the most recent `bars` bars of the fine series
    Recent { bars: Period },
}

impl ScanMode {
    /// Scan only the most recent `bars` bars
    pub fn recent(bars: usize) -> Result<Self> {
        Ok(ScanMode::Recent {
            bars: Period::new(bars)?,
        })
    }

    /// Recent-window scan with the default 50 bars
    pub fn live() -> Self {
        ScanMode::Recent {
            bars: Period::new_const(detectors::DEFAULT_RECENT_BARS),
        }
    }

    /// Slice of `bars` covered by this mode.
    pub fn window<T>(self, bars: &[T]) -> &[T] {
        match self {
            ScanMode::History => bars,
            ScanMode::Recent { bars: n } => &bars[bars.len().saturating_sub(n.get())..],
        }
    }
}

/// Scanner configuration
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// SMA lookback for the bias estimate
    pub bias_period: Period,
    /// Minimum gap in currency units
    pub min_gap_dollar: Price,
    /// Minimum gap relative to the third bar's close
    pub min_gap_pct: Ratio,
    pub mode: ScanMode,
    /// Number of setups kept in a report
    pub top_n: usize,
    /// Reject a symbol whose bars fail [`OHLCVExt::validate`] instead of
    /// skipping bad gap windows
    pub validate_data: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bias_period: Period::new_const(detectors::DEFAULT_BIAS_PERIOD),
            min_gap_dollar: Price::new_const(detectors::DEFAULT_MIN_GAP_DOLLAR),
            min_gap_pct: Ratio::new_const(detectors::DEFAULT_MIN_GAP_PCT),
            mode: ScanMode::History,
            top_n: detectors::DEFAULT_TOP_N,
            validate_data: false,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if let ScanMode::Recent { bars } = self.mode {
            Period::new(bars.get())?;
        }
        if self.top_n == 0 {
            return Err(ScanError::InvalidConfig("top_n must be > 0".to_string()));
        }
        Ok(())
    }
}

// ============================================================
// SCAN RESULT
// ============================================================

/// Bias and setups found for one symbol in one scan pass
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    pub bias: Bias,
    pub setups: Vec<Setup>,
}

/// Error from scanning a single symbol
#[derive(Debug)]
pub struct SymbolError {
    pub symbol: String,
    pub error: ScanError,
}

// ============================================================
// SCANNER
// ============================================================

use detectors::{GapDetector, TrendBiasEstimator};

/// Bias estimate plus gap scan for one symbol at a time
#[derive(Debug, Clone)]
pub struct Scanner {
    bias: TrendBiasEstimator,
    gaps: GapDetector,
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let bias = TrendBiasEstimator::new(config.bias_period);
        let gaps = GapDetector::new(config.min_gap_dollar, config.min_gap_pct);
        bias.validate_config()?;
        gaps.validate_config()?;
        Ok(Self { bias, gaps, config })
    }

    #[inline]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    #[inline]
    pub fn estimate_bias<T: OHLCV>(&self, coarse: &[T]) -> Bias {
        self.bias.estimate(coarse)
    }

    /// Scan one symbol: bias from `coarse`, gaps from the configured window of `fine`.
    ///
    /// Setup indices refer to positions in the whole `fine` slice. When the
    /// bias is unknown the gap scan is skipped and the result has no setups.
    pub fn scan<C: OHLCV, F: OHLCV>(
        &self,
        symbol: &str,
        coarse: &[C],
        fine: &[F],
    ) -> Result<ScanResult> {
        let window = self.config.mode.window(fine);
        if self.config.validate_data {
            validate_bars(coarse)?;
            validate_bars(window)?;
        }

        let bias = self.bias.estimate(coarse);
        let setups = match bias.direction() {
            Some(direction) => {
                let offset = fine.len() - window.len();
                self.gaps
                    .iter(window, direction)
                    .map(|setup| Setup {
                        index: setup.index + offset,
                        ..setup
                    })
                    .collect()
            }
            None => {
                log::info!("{symbol}: not enough data to determine trend, skipping gap scan");
                Vec::new()
            }
        };

        log::info!(
            "{symbol}: {} FVG setup(s) over {} bar(s) | Trend: {bias}",
            setups.len(),
            window.len()
        );

        Ok(ScanResult {
            symbol: symbol.to_string(),
            bias,
            setups,
        })
    }

    /// Per-symbol summaries plus the configured top N setups.
    pub fn report(&self, results: &[ScanResult]) -> rank::Report {
        rank::Report::new(results, self.config.top_n)
    }
}

fn validate_bars<T: OHLCV>(bars: &[T]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate().map_err(|e| match e {
            ScanError::InvalidOHLCV { reason, .. } => ScanError::InvalidOHLCV { index: i, reason },
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating Scanner instances
#[derive(Debug, Clone, Default)]
pub struct ScannerBuilder {
    config: ScanConfig,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// SMA lookback for the bias estimate
    pub fn bias_period(mut self, period: usize) -> Self {
        self.config.bias_period = Period::new_const(period);
        self
    }

    /// Minimum absolute gap size
    pub fn min_gap_dollar(mut self, value: f64) -> Self {
        self.config.min_gap_dollar = Price::new_const(value);
        self
    }

    /// Minimum gap size relative to the third bar's close
    pub fn min_gap_pct(mut self, value: f64) -> Self {
        self.config.min_gap_pct = Ratio::new_const(value);
        self
    }

    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Scan only the most recent `bars` bars of the fine series
    pub fn recent(mut self, bars: usize) -> Self {
        self.config.mode = ScanMode::Recent {
            bars: Period::new_const(bars),
        };
        self
    }

    pub fn top_n(mut self, top_n: usize) -> Self {
        self.config.top_n = top_n;
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the scanner, validating the configuration
    pub fn build(self) -> Result<Scanner> {
        Scanner::new(self.config)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Parallel scanning of multiple symbols
///
/// Each item is `(symbol, coarse bars, fine bars)`. Results keep the input
/// order, so ranking ties resolve the same way however the work is scheduled.
/// A symbol that fails validation lands in the error list and does not stop
/// the others.
pub fn scan_parallel<'a, C, F, I>(
    scanner: &Scanner,
    instruments: I,
) -> (Vec<ScanResult>, Vec<SymbolError>)
where
    C: OHLCV + Sync + 'a,
    F: OHLCV + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [C], &'a [F])>,
    I::Iter: IndexedParallelIterator,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, coarse, fine)| {
            scanner
                .scan(symbol, coarse, fine)
                .map_err(|error| SymbolError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => {
                log::warn!("{}: scan failed: {}", e.symbol, e.error);
                errors.push(e);
            }
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
