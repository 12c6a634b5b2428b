//! Shape tallies over a whole series

use serde::{Deserialize, Serialize};

use crate::{
    classifier::{CandleClassifier, CandleShape},
    OHLCV,
};

/// Number of bullish, bearish and doji candles.
/// Empty and indeterminate candles are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeCounts {
    pub bullish: usize,
    pub bearish: usize,
    pub doji: usize,
}

impl ShapeCounts {
    #[inline]
    pub fn record(&mut self, shape: CandleShape) {
        match shape {
            CandleShape::Bullish => self.bullish += 1,
            CandleShape::Bearish => self.bearish += 1,
            CandleShape::Doji => self.doji += 1,
            CandleShape::Empty | CandleShape::Indeterminate => {}
        }
    }

    pub fn total(&self) -> usize {
        self.bullish + self.bearish + self.doji
    }

    /// Counts with their labels, bullish first
    pub fn labelled(&self) -> [(&'static str, usize); 3] {
        [
            ("Bullish", self.bullish),
            ("Bearish", self.bearish),
            ("Doji", self.doji),
        ]
    }
}

impl FromIterator<CandleShape> for ShapeCounts {
    fn from_iter<I: IntoIterator<Item = CandleShape>>(iter: I) -> Self {
        let mut counts = ShapeCounts::default();
        for shape in iter {
            counts.record(shape);
        }
        counts
    }
}

/// Classify every bar and tally the shapes
pub fn count_shapes<T: OHLCV>(bars: &[T], classifier: &CandleClassifier) -> ShapeCounts {
    bars.iter().map(|b| classifier.classify_shape(b)).collect()
}
