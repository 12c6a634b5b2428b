//! Per-bar candle classification
//!
//! Two independent taxonomies: [`CandleShape`] (body size and colour) and
//! [`ReversalShape`] (shadow proportions). A bar can be `Bearish` and a `Hammer`
//! at the same time.

use serde::{Deserialize, Serialize};

use crate::{OHLCVExt, PatternError, Ratio, Result, OHLCV};

// ============================================================
// THRESHOLDS
// ============================================================

/// Body is doji-like: body / range <= DOJI_LIMIT
pub const DOJI_LIMIT: f64 = 0.12;
/// Long shadow: shadow > body * SHADOW_MULTIPLE
pub const SHADOW_MULTIPLE: f64 = 2.0;
/// Negligible shadow: shadow / range < SHADOW_MAX_RATIO
pub const SHADOW_MAX_RATIO: f64 = 0.10;

// ============================================================
// SHAPES
// ============================================================

/// Body-based category of a single candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleShape {
    Doji,
    Bullish,
    Bearish,
    /// high == low
    Empty,
    /// No branch applies (only reachable with non-finite prices)
    Indeterminate,
}

/// Shadow-based reversal shape of a single candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReversalShape {
    Hammer,
    ShootingStar,
    Other,
}

// ============================================================
// CLASSIFIER
// ============================================================

/// Stateless candle classifier with tunable thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleClassifier {
    pub doji_limit: Ratio,
    pub shadow_multiple: f64,
    pub shadow_max_ratio: Ratio,
}

impl Default for CandleClassifier {
    fn default() -> Self {
        Self {
            doji_limit: Ratio::new_const(DOJI_LIMIT),
            shadow_multiple: SHADOW_MULTIPLE,
            shadow_max_ratio: Ratio::new_const(SHADOW_MAX_RATIO),
        }
    }
}

impl CandleClassifier {
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn new(doji_limit: Ratio) -> Self {
        Self {
            doji_limit,
            ..Self::default()
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        if !self.shadow_multiple.is_finite() || self.shadow_multiple < 0.0 {
            return Err(PatternError::InvalidValue(
                "shadow_multiple must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Classify the body of a candle.
    ///
    /// The doji test compares the body with the full high-low range, which keeps
    /// the threshold independent of the price level.
    pub fn classify_shape<T: OHLCV>(&self, bar: &T) -> CandleShape {
        let range = bar.range();
        if range == 0.0 {
            return CandleShape::Empty;
        }

        let body = bar.body();
        if body / range <= self.doji_limit.get() {
            CandleShape::Doji
        } else if bar.is_bullish() {
            CandleShape::Bullish
        } else if bar.is_bearish() {
            CandleShape::Bearish
        } else {
            CandleShape::Indeterminate
        }
    }

    /// Classify the shadows of a candle. A zero range is never a reversal shape.
    pub fn classify_reversal<T: OHLCV>(&self, bar: &T) -> ReversalShape {
        let total = bar.range();
        if total == 0.0 {
            return ReversalShape::Other;
        }

        let body = bar.body();
        let upper = bar.upper_shadow();
        let lower = bar.lower_shadow();
        let long = body * self.shadow_multiple;
        let short = self.shadow_max_ratio.get();

        if lower > long && upper / total < short {
            ReversalShape::Hammer
        } else if upper > long && lower / total < short {
            ReversalShape::ShootingStar
        } else {
            ReversalShape::Other
        }
    }
}

/// [`CandleClassifier::classify_shape`] with default thresholds
pub fn classify_shape<T: OHLCV>(bar: &T) -> CandleShape {
    CandleClassifier::default().classify_shape(bar)
}

/// [`CandleClassifier::classify_reversal`] with default thresholds
pub fn classify_reversal<T: OHLCV>(bar: &T) -> ReversalShape {
    CandleClassifier::default().classify_reversal(bar)
}
