//! Trend indicator
//!
//! The trend filter is an exponential moving average of closing prices. It is
//! computed once per series and shared by every pattern scan of a run.

use serde::{Deserialize, Serialize};

use crate::{PatternError, Period, Result, OHLCV};

/// Default EMA period
pub const EMA_PERIOD: usize = 9;

/// Direction of the smoothed series between two adjacent bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, Trend::Up)
    }

    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, Trend::Down)
    }
}

/// Producer of a smoothed trend series aligned with the bars
pub trait TrendIndicator: Send + Sync {
    fn compute<T: OHLCV>(&self, bars: &[T]) -> Result<TrendSeries>;
}

// ============================================================
// EMA
// ============================================================

/// Exponential moving average seeded with the first close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ema {
    pub period: Period,
}

impl Default for Ema {
    fn default() -> Self {
        Self {
            period: Period::new_const(EMA_PERIOD),
        }
    }
}

impl Ema {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    /// Weight of the newest close: 2 / (period + 1)
    #[inline]
    pub fn smoothing(&self) -> f64 {
        2.0 / (self.period.get() as f64 + 1.0)
    }
}

impl TrendIndicator for Ema {
    fn compute<T: OHLCV>(&self, bars: &[T]) -> Result<TrendSeries> {
        let first = bars.first().ok_or(PatternError::EmptySeries)?;
        let k = self.smoothing();

        let mut values = Vec::with_capacity(bars.len());
        let mut prev = first.close();
        values.push(prev);
        for bar in &bars[1..] {
            prev = bar.close() * k + prev * (1.0 - k);
            values.push(prev);
        }

        Ok(TrendSeries { values })
    }
}

/// EMA of closing prices with the given period
pub fn compute_ema<T: OHLCV>(bars: &[T], period: Period) -> Result<TrendSeries> {
    Ema::new(period).compute(bars)
}

// ============================================================
// TREND SERIES
// ============================================================

/// Smoothed values, one per bar
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrendSeries {
    values: Vec<f64>,
}

impl TrendSeries {
    /// Wrap values produced elsewhere (custom indicators, fixtures)
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Value at `index`, failing outside the series
    pub fn at(&self, index: usize) -> Result<f64> {
        self.get(index).ok_or(PatternError::IndexOutOfBounds {
            index,
            len: self.values.len(),
        })
    }

    /// Current and previous value; index 0 has no predecessor
    fn adjacent(&self, index: usize) -> Result<(f64, f64)> {
        if index == 0 {
            return Err(PatternError::NoPriorTrend { index });
        }
        Ok((self.at(index - 1)?, self.at(index)?))
    }

    /// `ema[index] > ema[index - 1]`
    pub fn is_uptrend(&self, index: usize) -> Result<bool> {
        let (prev, curr) = self.adjacent(index)?;
        Ok(curr > prev)
    }

    /// `ema[index] < ema[index - 1]`
    pub fn is_downtrend(&self, index: usize) -> Result<bool> {
        let (prev, curr) = self.adjacent(index)?;
        Ok(curr < prev)
    }

    pub fn direction(&self, index: usize) -> Result<Trend> {
        let (prev, curr) = self.adjacent(index)?;
        Ok(if curr > prev {
            Trend::Up
        } else if curr < prev {
            Trend::Down
        } else {
            Trend::Flat
        })
    }
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
    }

    fn closes(values: &[f64]) -> Vec<Close> {
        values.iter().copied().map(Close).collect()
    }

    #[test]
    fn test_smoothing_factor() {
        assert!((Ema::default().smoothing() - 0.2).abs() < 1e-12);
        assert!((Ema::new(Period::new(3).unwrap()).smoothing() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ema_values() {
        let bars = closes(&[10.0, 20.0, 20.0]);
        let ema = compute_ema(&bars, Period::new(3).unwrap()).unwrap();
        assert_eq!(ema.values(), &[10.0, 15.0, 17.5]);
    }

    #[test]
    fn test_ema_seeded_with_first_close() {
        let bars = closes(&[42.0]);
        let ema = Ema::default().compute(&bars).unwrap();
        assert_eq!(ema.values(), &[42.0]);
    }

    #[test]
    fn test_empty_input_fails() {
        let bars: Vec<Close> = Vec::new();
        assert_eq!(Ema::default().compute(&bars), Err(PatternError::EmptySeries));
    }

    #[test]
    fn test_trend_queries() {
        let ema = TrendSeries::from_values(vec![1.0, 2.0, 1.5, 1.5]);
        assert!(ema.is_uptrend(1).unwrap());
        assert!(!ema.is_downtrend(1).unwrap());
        assert!(ema.is_downtrend(2).unwrap());
        assert_eq!(ema.direction(3).unwrap(), Trend::Flat);
        assert!(!ema.is_uptrend(3).unwrap());
        assert!(!ema.is_downtrend(3).unwrap());
    }

    #[test]
    fn test_trend_query_at_zero_fails() {
        let ema = TrendSeries::from_values(vec![1.0, 2.0]);
        assert_eq!(ema.is_uptrend(0), Err(PatternError::NoPriorTrend { index: 0 }));
        assert_eq!(ema.is_downtrend(0), Err(PatternError::NoPriorTrend { index: 0 }));
    }

    #[test]
    fn test_trend_query_past_end_fails() {
        let ema = TrendSeries::from_values(vec![1.0, 2.0]);
        assert_eq!(
            ema.direction(2),
            Err(PatternError::IndexOutOfBounds { index: 2, len: 2 })
        );
    }
}
