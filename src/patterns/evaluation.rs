//! Outcome evaluation of a detected pattern
//!
//! A policy looks `horizon` bars past the last bar of an occurrence (its anchor)
//! and checks whether the chosen reference moved in the pattern's direction.

use serde::{Deserialize, Serialize};

use crate::{trend::TrendSeries, Direction, PatternError, Result, OHLCV};

/// Forward offset used by the built-in patterns
pub const DEFAULT_HORIZON: usize = 2;

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

/// Result of one occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }

    fn from_bool(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// How an occurrence is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationPolicy {
    /// The trend series confirms: `ema[anchor + horizon]` vs `ema[anchor]`
    EmaConfirmation {
        #[serde(default = "default_horizon")]
        horizon: usize,
    },
    /// The raw close confirms: `close[anchor + horizon]` vs `close[anchor]`
    ForwardClose {
        #[serde(default = "default_horizon")]
        horizon: usize,
    },
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self::ema_confirmation()
    }
}

impl EvaluationPolicy {
    pub const fn ema_confirmation() -> Self {
        Self::EmaConfirmation {
            horizon: DEFAULT_HORIZON,
        }
    }

    pub const fn forward_close() -> Self {
        Self::ForwardClose {
            horizon: DEFAULT_HORIZON,
        }
    }

    #[inline]
    pub fn horizon(&self) -> usize {
        match *self {
            Self::EmaConfirmation { horizon } | Self::ForwardClose { horizon } => horizon,
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.horizon() == 0 {
            return Err(PatternError::InvalidValue(
                "evaluation horizon must be > 0",
            ));
        }
        Ok(())
    }

    /// Judge an occurrence whose last bar is `anchor`
    pub fn evaluate<T: OHLCV>(
        &self,
        bias: Direction,
        bars: &[T],
        trend: &TrendSeries,
        anchor: usize,
    ) -> Result<Outcome> {
        let target = anchor + self.horizon();
        let (from, to) = match self {
            Self::EmaConfirmation { .. } => (trend.at(anchor)?, trend.at(target)?),
            Self::ForwardClose { .. } => {
                let close_at = |i: usize| {
                    bars.get(i)
                        .map(|b| b.close())
                        .ok_or(PatternError::IndexOutOfBounds {
                            index: i,
                            len: bars.len(),
                        })
                };
                (close_at(anchor)?, close_at(target)?)
            }
        };
        Ok(Outcome::from_bool(bias.confirms(from, to)))
    }
}
