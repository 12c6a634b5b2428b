//! # candlebt - candlestick classification and pattern back-testing
//!
//! Classifies daily candles, smooths closing prices with an EMA trend filter and
//! back-tests reversal patterns over the history of a single instrument.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlebt::prelude::*;
//! use chrono::{Days, NaiveDate};
//!
//! let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
//! let bars: Vec<Bar> = (0..40u64)
//!     .map(|i| {
//!         let base = 100.0 + ((i % 7) as f64 - 3.0) * 1.5;
//!         let close = if i % 2 == 0 { base - 1.0 } else { base + 1.0 };
//!         Bar::new(start + Days::new(i), base, base + 2.0, base - 2.0, close, 1_000)
//!     })
//!     .collect();
//! let series = BarSeries::new(bars).unwrap();
//!
//! let backtester = BacktesterBuilder::new()
//!     .with_all_defaults()
//!     .build()
//!     .unwrap();
//!
//! let run = backtester.run(&series).unwrap();
//! for report in run.reports() {
//!     match report.success_rate() {
//!         Ok(rate) => assert!((0.0..=1.0).contains(&rate)),
//!         Err(PatternError::NoOccurrences { .. }) => {}
//!         Err(other) => panic!("{other}"),
//!     }
//! }
//! ```

pub mod aggregate;
pub mod backtest;
pub mod classifier;
pub mod config;
pub mod patterns;
pub mod series;
pub mod trend;

pub mod prelude {
    pub use crate::{
        // Aggregation
        aggregate::{count_shapes, ShapeCounts},
        // Engine
        backtest::{BacktestRun, Backtester, BacktesterBuilder, EngineConfig, PatternReport},
        // Classification
        classifier::{classify_reversal, classify_shape, CandleClassifier, CandleShape, ReversalShape},
        // Configuration
        config::{AnalysisConfig, PolicyOverride},
        // Patterns
        patterns::{
            BuiltinPattern, EvaluationPolicy, Geometry, Outcome, PatternDefinition,
            PatternOccurrence, ShapeGate, TrendGate,
        },
        // Data model
        series::{Bar, BarSeries},
        // Trend
        trend::{compute_ema, Ema, Trend, TrendIndicator, TrendSeries},
        // Core types
        Direction, OHLCVExt, PatternError, PatternId, Period, Ratio, Result, OHLCV,
    };
}

use chrono::NaiveDate;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised while validating input or running a back-test
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
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

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Bar dates must strictly increase: {current} at index {index} follows {previous}")]
    UnorderedDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Series is empty")]
    EmptySeries,

    #[error("No prior trend value at index {index}")]
    NoPriorTrend { index: usize },

    #[error("Index {index} out of bounds for series of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Trend series has {trend} values but the bar series has {bars}")]
    TrendLengthMismatch { bars: usize, trend: usize },

    #[error("Pattern {pattern} has no occurrences in the analyzed window")]
    NoOccurrences { pattern: PatternId },
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
        if !value.is_finite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
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

/// Smoothing period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
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
// OHLC TRAITS
// ============================================================

/// Price access for a single trading session
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
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
}

/// Candle geometry derived from the four prices
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Mean of open and close, the middle of the real body
    #[inline]
    fn midpoint(&self) -> f64 {
        self.close() + (self.open() - self.close()) / 2.0
    }

    /// Body as ratio of range. Returns None for a zero range
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > 0.0).then(|| self.body() / range)
    }

    #[inline]
    fn upper_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > 0.0).then(|| self.upper_shadow() / range)
    }

    #[inline]
    fn lower_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > 0.0).then(|| self.lower_shadow() / range)
    }

    /// Validate price consistency. The reported index is always 0; callers
    /// scanning a sequence rewrite it to the bar position.
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "NaN price",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "infinite price",
            });
        }
        if prices.iter().any(|p| *p < 0.0) {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "negative price",
            });
        }
        if self.high() < self.low() {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open().min(self.close()) < self.low() {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "body below low",
            });
        }
        if self.open().max(self.close()) > self.high() {
            return Err(PatternError::InvalidBar {
                index: 0,
                reason: "body above high",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV + ?Sized> OHLCVExt for T {}

// ============================================================
// PATTERN IDENTITY
// ============================================================

/// Unique identifier for a pattern definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub &'static str);

impl PatternId {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

/// Move a pattern anticipates after it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
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

    /// True when going from `from` to `to` is a strict move in this direction
    #[inline]
    pub fn confirms(self, from: f64, to: f64) -> bool {
        match self {
            Direction::Bullish => to > from,
            Direction::Bearish => to < from,
        }
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Candle {
        o: f64,
        h: f64,
        l: f64,
        c: f64,
    }

    impl OHLCV for Candle {
        fn open(&self) -> f64 {
            self.o
        }

        fn high(&self) -> f64 {
            self.h
        }

        fn low(&self) -> f64 {
            self.l
        }

        fn close(&self) -> f64 {
            self.c
        }
    }

    fn candle(o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle { o, h, l, c }
    }

    #[test]
    fn test_ratio_validation() {
        assert!(Ratio::new(0.0).is_ok());
        assert!(Ratio::new(1.0).is_ok());
        assert!(Ratio::new(0.12).is_ok());
        assert!(Ratio::new(-0.1).is_err());
        assert!(Ratio::new(1.1).is_err());
        assert!(Ratio::new(f64::NAN).is_err());
        assert!(Ratio::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(9).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_ratio_rejects_out_of_range_json() {
        assert!(serde_json::from_str::<Ratio>("0.5").is_ok());
        assert!(serde_json::from_str::<Ratio>("1.5").is_err());
        assert!(serde_json::from_str::<Period>("0").is_err());
    }

    #[test]
    fn test_ohlcv_ext() {
        let bar = candle(100.0, 110.0, 90.0, 105.0);
        assert_eq!(bar.body(), 5.0);
        assert_eq!(bar.range(), 20.0);
        assert_eq!(bar.upper_shadow(), 5.0);
        assert_eq!(bar.lower_shadow(), 10.0);
        assert_eq!(bar.midpoint(), 102.5);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert!((bar.body_ratio().unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_range_has_no_ratios() {
        let bar = candle(5.0, 5.0, 5.0, 5.0);
        assert_eq!(bar.body_ratio(), None);
        assert_eq!(bar.upper_shadow_ratio(), None);
        assert_eq!(bar.lower_shadow_ratio(), None);
    }

    #[test]
    fn test_validate_rejects_inconsistent_prices() {
        assert!(candle(10.0, 12.0, 9.0, 11.0).validate().is_ok());
        assert!(matches!(
            candle(10.0, 9.0, 12.0, 11.0).validate(),
            Err(PatternError::InvalidBar { reason: "high < low", .. })
        ));
        assert!(matches!(
            candle(13.0, 12.0, 9.0, 11.0).validate(),
            Err(PatternError::InvalidBar { reason: "body above high", .. })
        ));
        assert!(matches!(
            candle(10.0, 12.0, 9.0, 8.0).validate(),
            Err(PatternError::InvalidBar { reason: "body below low", .. })
        ));
        assert!(candle(f64::NAN, 12.0, 9.0, 11.0).validate().is_err());
        assert!(candle(-1.0, 12.0, -2.0, 11.0).validate().is_err());
    }

    #[test]
    fn test_direction_confirms() {
        assert!(Direction::Bullish.confirms(1.0, 2.0));
        assert!(!Direction::Bullish.confirms(2.0, 2.0));
        assert!(Direction::Bearish.confirms(2.0, 1.0));
        assert!(!Direction::Bearish.confirms(1.0, 2.0));
    }

    #[test]
    fn test_pattern_id_display() {
        assert_eq!(PatternId("HAMMER").to_string(), "HAMMER");
        let err = PatternError::NoOccurrences {
            pattern: PatternId("PIERCING"),
        };
        assert!(err.to_string().contains("PIERCING"));
    }
}
