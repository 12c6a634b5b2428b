//! Property-based tests using proptest.
//!
//! These check invariants that must hold for every well-formed bar series.

use candlebt::prelude::*;
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

// ==================== Test Data Generators ====================

/// Generate one consistent bar (low <= open, close <= high) around `base`
fn arb_ohlc() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (
        1.0..1000.0_f64,
        -0.05..0.05_f64,
        0.0..0.05_f64,
        0.0..0.05_f64,
    )
        .prop_map(|(base, body_pct, up_pct, down_pct)| {
            let open = base;
            let close = base * (1.0 + body_pct);
            let high = open.max(close) * (1.0 + up_pct);
            let low = open.min(close) * (1.0 - down_pct);
            (open, high, low, close)
        })
}

/// Generate a validated daily series
fn arb_series(min_len: usize, max_len: usize) -> impl Strategy<Value = BarSeries> {
    prop::collection::vec(arb_ohlc(), min_len..=max_len).prop_map(|ohlc| {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let bars = ohlc
            .into_iter()
            .enumerate()
            .map(|(i, (o, h, l, c))| Bar::new(start + Days::new(i as u64), o, h, l, c, 100))
            .collect();
        BarSeries::new(bars).unwrap()
    })
}

// ==================== Classification Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A zero range is always Empty, and only a zero range is
    #[test]
    fn prop_empty_iff_zero_range((o, h, l, c) in arb_ohlc()) {
        let bar = Bar::new(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(), o, h, l, c, 0);
        let shape = classify_shape(&bar);
        prop_assert_eq!(shape == CandleShape::Empty, bar.range() == 0.0);
    }

    /// A flat bar is never a reversal shape
    #[test]
    fn prop_flat_bar_is_other(price in 1.0..1000.0_f64) {
        let bar = Bar::new(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(), price, price, price, price, 0);
        prop_assert_eq!(classify_shape(&bar), CandleShape::Empty);
        prop_assert_eq!(classify_reversal(&bar), ReversalShape::Other);
    }

    /// Shape counts never exceed the number of bars
    #[test]
    fn prop_counts_bounded(series in arb_series(0, 60)) {
        let counts = count_shapes(series.bars(), &CandleClassifier::default());
        prop_assert!(counts.total() <= series.len());
    }
}

// ==================== EMA Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// One EMA value per bar, seeded with the first close
    #[test]
    fn prop_ema_length_and_seed(series in arb_series(1, 80), period in 1usize..=20) {
        let trend = compute_ema(series.bars(), Period::new(period).unwrap()).unwrap();
        prop_assert_eq!(trend.len(), series.len());
        prop_assert_eq!(trend.values()[0], series[0].close);
    }

    /// EMA stays within the range of the closes seen so far
    #[test]
    fn prop_ema_bounded(series in arb_series(1, 80)) {
        let trend = Ema::default().compute(series.bars()).unwrap();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (i, bar) in series.iter().enumerate() {
            lo = lo.min(bar.close);
            hi = hi.max(bar.close);
            let v = trend.values()[i];
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "ema {} outside [{}, {}]", v, lo, hi);
        }
    }

    /// Each value lies between the current close and the previous value
    #[test]
    fn prop_ema_step_between_close_and_previous(series in arb_series(2, 80), period in 1usize..=20) {
        let trend = compute_ema(series.bars(), Period::new(period).unwrap()).unwrap();
        let values = trend.values();
        for i in 1..values.len() {
            let close = series[i].close;
            let lo = close.min(values[i - 1]);
            let hi = close.max(values[i - 1]);
            prop_assert!(values[i] >= lo - 1e-9 && values[i] <= hi + 1e-9);
        }
    }

    /// Recomputing gives the same series
    #[test]
    fn prop_ema_deterministic(series in arb_series(1, 50)) {
        let a = Ema::default().compute(series.bars()).unwrap();
        let b = Ema::default().compute(series.bars()).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ==================== Back-test Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every occurrence leaves room for its last bar plus the horizon
    #[test]
    fn prop_occurrences_within_bounds(series in arb_series(1, 120)) {
        let engine = BacktesterBuilder::new().with_all_defaults().build().unwrap();
        let run = engine.run(&series).unwrap();

        for (report, definition) in run.reports().iter().zip(engine.patterns()) {
            prop_assert_eq!(report.pattern, definition.id);
            prop_assert_eq!(report.successes() + report.failures(), report.len());
            for occurrence in &report.occurrences {
                prop_assert!(occurrence.start_index >= 1);
                prop_assert!(
                    occurrence.start_index + definition.span() - 1 + definition.policy.horizon()
                        < series.len()
                );
                prop_assert_eq!(occurrence.date, series[occurrence.start_index].date);
            }
            match report.success_rate() {
                Ok(rate) => prop_assert!((0.0..=1.0).contains(&rate)),
                Err(e) => prop_assert_eq!(e, PatternError::NoOccurrences { pattern: report.pattern }),
            }
        }
    }

    /// Parallel and sequential scans agree
    #[test]
    fn prop_parallel_matches_sequential(series in arb_series(5, 80)) {
        let parallel = BacktesterBuilder::new().with_all_defaults().build().unwrap();
        let sequential = BacktesterBuilder::new()
            .with_all_defaults()
            .parallel(false)
            .build()
            .unwrap();
        prop_assert_eq!(parallel.run(&series).unwrap(), sequential.run(&series).unwrap());
    }

    /// Occurrence starts are strictly increasing
    #[test]
    fn prop_occurrences_ordered(series in arb_series(5, 120)) {
        let run = BacktesterBuilder::new()
            .with_all_defaults()
            .build()
            .unwrap()
            .run(&series)
            .unwrap();
        for report in run.reports() {
            prop_assert!(report
                .occurrences
                .windows(2)
                .all(|w| w[0].start_index < w[1].start_index));
        }
    }
}
