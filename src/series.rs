//! Daily bar data model
//!
//! A [`BarSeries`] is the read-only input of every analysis: bars in chronological
//! order, each with consistent prices and a date strictly after its predecessor.

use std::ops::Index;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{OHLCVExt, PatternError, Result, OHLCV};

/// One trading session of one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: u64,
}

impl Bar {
    /// Bar whose adjusted close equals its close
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            adjusted_close: close,
            volume,
        }
    }

    pub fn with_adjusted_close(mut self, adjusted_close: f64) -> Self {
        self.adjusted_close = adjusted_close;
        self
    }
}

impl OHLCV for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

/// Chronologically ordered bars of a single instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, checking every bar and the date ordering
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                PatternError::InvalidBar { reason, .. } => {
                    PatternError::InvalidBar { index: i, reason }
                }
                other => other,
            })?;
            if bar.adjusted_close.is_nan() || bar.adjusted_close < 0.0 {
                return Err(PatternError::InvalidBar {
                    index: i,
                    reason: "invalid adjusted close",
                });
            }
        }

        if let Some(i) = bars.windows(2).position(|w| w[1].date <= w[0].date) {
            return Err(PatternError::UnorderedDates {
                index: i + 1,
                previous: bars[i].date,
                current: bars[i + 1].date,
            });
        }

        Ok(Self { bars })
    }

    /// Build a series without validation, for sources that are already trusted
    pub fn new_unchecked(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.close)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    /// Position of the bar traded on `date`
    pub fn position_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    pub fn into_inner(self) -> Vec<Bar> {
        self.bars
    }
}

impl Index<usize> for BarSeries {
    type Output = Bar;

    fn index(&self, index: usize) -> &Bar {
        &self.bars[index]
    }
}

impl TryFrom<Vec<Bar>> for BarSeries {
    type Error = PatternError;

    fn try_from(bars: Vec<Bar>) -> Result<Self> {
        Self::new(bars)
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

impl<'de> Deserialize<'de> for BarSeries {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let bars = Vec::<Bar>::deserialize(d)?;
        BarSeries::new(bars).map_err(serde::de::Error::custom)
    }
}
