//! Pattern definitions and the per-pattern scan
//!
//! A pattern is plain data: a trend gate, a shape gate on the first bar, a
//! geometric condition linking the bars it covers and an evaluation policy.
//! New patterns are added by building a [`PatternDefinition`], not by writing
//! another scan loop.
//!
//! # Built-in patterns
//!
//! - **Two-bar**: Bullish/Bearish Engulfing, Piercing, Dark Cloud Cover
//! - **Single-bar**: Hammer, Shooting Star

mod builtin;
mod evaluation;

pub use builtin::*;
pub use evaluation::*;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classifier::{CandleClassifier, CandleShape, ReversalShape},
    series::BarSeries,
    trend::TrendSeries,
    Direction, OHLCVExt, PatternError, PatternId, Result, OHLCV,
};

// ============================================================
// GATES
// ============================================================

/// Trend required at the first bar of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendGate {
    Uptrend,
    Downtrend,
}

impl TrendGate {
    #[inline]
    pub fn admits(self, trend: &TrendSeries, index: usize) -> Result<bool> {
        match self {
            TrendGate::Uptrend => trend.is_uptrend(index),
            TrendGate::Downtrend => trend.is_downtrend(index),
        }
    }
}

/// Shape required of the first bar of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeGate {
    Candle(CandleShape),
    Reversal(ReversalShape),
}

impl ShapeGate {
    #[inline]
    pub fn admits<T: OHLCV>(self, classifier: &CandleClassifier, bar: &T) -> bool {
        match self {
            ShapeGate::Candle(shape) => classifier.classify_shape(bar) == shape,
            ShapeGate::Reversal(shape) => classifier.classify_reversal(bar) == shape,
        }
    }
}

// ============================================================
// GEOMETRY
// ============================================================

/// Condition tying the second bar of a pattern to the first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Geometry {
    /// Single-bar pattern, nothing beyond the shape gate
    None,
    /// Second bar opens beyond the first close and closes beyond the first open
    Engulfing(Direction),
    /// Second bar opens beyond the first close and closes past the first body's middle
    Penetration(Direction),
}

impl Geometry {
    /// Number of bars the pattern covers
    #[inline]
    pub fn span(self) -> usize {
        match self {
            Geometry::None => 1,
            Geometry::Engulfing(_) | Geometry::Penetration(_) => 2,
        }
    }

    /// Check the condition over exactly `span()` bars
    pub fn holds<T: OHLCV>(self, window: &[T]) -> bool {
        match (self, window) {
            (Geometry::None, [_]) => true,
            (Geometry::Engulfing(dir), [first, second]) => match dir {
                Direction::Bullish => {
                    second.open() < first.close() && second.close() > first.open()
                }
                Direction::Bearish => {
                    second.open() > first.close() && second.close() < first.open()
                }
            },
            (Geometry::Penetration(dir), [first, second]) => {
                let mid = first.midpoint();
                match dir {
                    Direction::Bullish => second.open() < first.close() && second.close() > mid,
                    Direction::Bearish => second.open() > first.close() && second.close() < mid,
                }
            }
            _ => false,
        }
    }
}

// ============================================================
// OCCURRENCE
// ============================================================

/// One match of a pattern, judged by its evaluation policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternOccurrence {
    pub pattern: PatternId,
    pub start_index: usize,
    pub date: NaiveDate,
    pub outcome: Outcome,
}

impl PatternOccurrence {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

// ============================================================
// DEFINITION
// ============================================================

/// Complete description of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternDefinition {
    pub id: PatternId,
    /// Move the pattern predicts, used by the evaluation policy
    pub bias: Direction,
    pub trend_gate: TrendGate,
    pub shape_gate: ShapeGate,
    pub geometry: Geometry,
    pub policy: EvaluationPolicy,
}

impl PatternDefinition {
    pub fn with_policy(mut self, policy: EvaluationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn span(&self) -> usize {
        self.geometry.span()
    }

    /// Exclusive upper bound of start indices for a series of `len` bars.
    ///
    /// The last bar of the pattern plus the policy horizon must stay inside the
    /// series: `start + span - 1 + horizon < len`.
    #[inline]
    pub fn window_end(&self, len: usize) -> usize {
        len.saturating_sub(self.span() - 1 + self.policy.horizon())
    }

    /// Shortest series with at least one candidate start index (starts begin at 1)
    #[inline]
    pub fn min_bars(&self) -> usize {
        1 + self.span() + self.policy.horizon()
    }

    pub fn check_len(&self, len: usize) -> Result<()> {
        let need = self.min_bars();
        if len < need {
            return Err(PatternError::InsufficientData { need, got: len });
        }
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.id.as_str().is_empty() {
            return Err(PatternError::InvalidConfig(
                "pattern id must not be empty".to_string(),
            ));
        }
        self.policy.validate_config()
    }

    /// Gates and geometry at `index`, without evaluation
    pub fn matches_at<T: OHLCV>(
        &self,
        bars: &[T],
        trend: &TrendSeries,
        classifier: &CandleClassifier,
        index: usize,
    ) -> Result<bool> {
        let window = bars
            .get(index..index + self.span())
            .ok_or(PatternError::IndexOutOfBounds {
                index: index + self.span() - 1,
                len: bars.len(),
            })?;

        if !self.trend_gate.admits(trend, index)? {
            return Ok(false);
        }
        if !self.shape_gate.admits(classifier, &window[0]) {
            return Ok(false);
        }
        Ok(self.geometry.holds(window))
    }

    /// Outcome of an occurrence starting at `index`
    pub fn evaluate_at<T: OHLCV>(
        &self,
        bars: &[T],
        trend: &TrendSeries,
        index: usize,
    ) -> Result<Outcome> {
        let anchor = index + self.span() - 1;
        self.policy.evaluate(self.bias, bars, trend, anchor)
    }

    /// Scan the whole series left to right.
    ///
    /// Series too short for a single candidate yield no occurrences.
    pub fn scan(
        &self,
        series: &BarSeries,
        trend: &TrendSeries,
        classifier: &CandleClassifier,
    ) -> Result<Vec<PatternOccurrence>> {
        if trend.len() != series.len() {
            return Err(PatternError::TrendLengthMismatch {
                bars: series.len(),
                trend: trend.len(),
            });
        }

        let end = self.window_end(series.len());
        if end <= 1 {
            debug!(
                "{}: series of {} bars is shorter than the {} required",
                self.id,
                series.len(),
                self.min_bars()
            );
            return Ok(Vec::new());
        }

        let bars = series.bars();
        let mut occurrences = Vec::new();
        for index in 1..end {
            if !self.matches_at(bars, trend, classifier, index)? {
                continue;
            }
            occurrences.push(PatternOccurrence {
                pattern: self.id,
                start_index: index,
                date: bars[index].date,
                outcome: self.evaluate_at(bars, trend, index)?,
            });
        }

        Ok(occurrences)
    }
}
