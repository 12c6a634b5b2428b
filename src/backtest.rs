//! Back-testing engine
//!
//! A [`Backtester`] computes the trend series once, scans every registered
//! pattern over the bar series and collects one [`PatternReport`] per pattern,
//! in registration order.

use chrono::NaiveDate;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    aggregate::{count_shapes, ShapeCounts},
    classifier::CandleClassifier,
    config::AnalysisConfig,
    patterns::{BuiltinPattern, EvaluationPolicy, PatternDefinition, PatternOccurrence},
    series::BarSeries,
    trend::{Ema, TrendIndicator, TrendSeries},
    Direction, PatternError, PatternId, Period, Ratio, Result,
};

// ============================================================
// REPORTS
// ============================================================

/// Occurrences of one pattern over one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub pattern: PatternId,
    pub bias: Direction,
    pub policy: EvaluationPolicy,
    /// Number of candidate start indices that were examined
    pub candidates: usize,
    pub occurrences: Vec<PatternOccurrence>,
}

impl PatternReport {
    #[inline]
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.occurrences.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.len() - self.successes()
    }

    /// Fraction of occurrences that succeeded.
    ///
    /// A pattern that never occurred has no rate; that is reported as
    /// [`PatternError::NoOccurrences`] rather than zero.
    pub fn success_rate(&self) -> Result<f64> {
        if self.occurrences.is_empty() {
            return Err(PatternError::NoOccurrences {
                pattern: self.pattern,
            });
        }
        Ok(self.successes() as f64 / self.len() as f64)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.occurrences.iter().map(|o| o.date)
    }

    pub fn success_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.occurrences
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.date)
    }

    pub fn failure_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.occurrences
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.date)
    }
}

/// Everything produced by one [`Backtester::run`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestRun {
    pub trend: TrendSeries,
    pub reports: Vec<PatternReport>,
}

impl BacktestRun {
    pub fn reports(&self) -> &[PatternReport] {
        &self.reports
    }

    pub fn report(&self, pattern: PatternId) -> Option<&PatternReport> {
        self.reports.iter().find(|r| r.pattern == pattern)
    }

    pub fn builtin(&self, pattern: BuiltinPattern) -> Option<&PatternReport> {
        self.report(pattern.id())
    }

    /// Success rate of every pattern, in registration order
    pub fn success_rates(&self) -> Vec<(PatternId, Result<f64>)> {
        self.reports
            .iter()
            .map(|r| (r.pattern, r.success_rate()))
            .collect()
    }

    pub fn total_occurrences(&self) -> usize {
        self.reports.iter().map(PatternReport::len).sum()
    }
}

// ============================================================
// ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scan patterns on the rayon pool
    pub parallel: bool,
    pub pattern_filter: Option<Vec<PatternId>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            pattern_filter: None,
        }
    }
}

/// Pattern back-testing engine
pub struct Backtester<I: TrendIndicator = Ema> {
    patterns: Vec<PatternDefinition>,
    classifier: CandleClassifier,
    indicator: I,
    config: EngineConfig,
}

impl<I: TrendIndicator> Backtester<I> {
    pub fn new(indicator: I) -> Self {
        Self {
            patterns: Vec::new(),
            classifier: CandleClassifier::default(),
            indicator,
            config: EngineConfig::default(),
        }
    }

    pub fn patterns(&self) -> &[PatternDefinition] {
        &self.patterns
    }

    pub fn classifier(&self) -> &CandleClassifier {
        &self.classifier
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Trend series for the bars; fails on an empty series
    pub fn compute_trend(&self, series: &BarSeries) -> Result<TrendSeries> {
        self.indicator.compute(series.bars())
    }

    /// Scan a single pattern against a precomputed trend series
    pub fn scan_pattern(
        &self,
        definition: &PatternDefinition,
        series: &BarSeries,
        trend: &TrendSeries,
    ) -> Result<PatternReport> {
        let occurrences = definition.scan(series, trend, &self.classifier)?;
        let candidates = definition.window_end(series.len()).saturating_sub(1);

        debug!(
            "{}: {} occurrences over {} candidates",
            definition.id,
            occurrences.len(),
            candidates
        );
        if occurrences.is_empty() {
            warn!("{} never occurred in {} bars", definition.id, series.len());
        }

        Ok(PatternReport {
            pattern: definition.id,
            bias: definition.bias,
            policy: definition.policy,
            candidates,
            occurrences,
        })
    }

    /// Compute the trend and back-test every registered pattern
    pub fn run(&self, series: &BarSeries) -> Result<BacktestRun> {
        let trend = self.compute_trend(series)?;

        let reports = if self.config.parallel {
            self.patterns
                .par_iter()
                .map(|d| self.scan_pattern(d, series, &trend))
                .collect::<Result<Vec<_>>>()?
        } else {
            self.patterns
                .iter()
                .map(|d| self.scan_pattern(d, series, &trend))
                .collect::<Result<Vec<_>>>()?
        };

        let run = BacktestRun { trend, reports };
        info!(
            "back-tested {} patterns over {} bars: {} occurrences",
            run.reports.len(),
            series.len(),
            run.total_occurrences()
        );
        Ok(run)
    }

    /// Shape tally with the engine's classifier
    pub fn count_shapes(&self, series: &BarSeries) -> ShapeCounts {
        count_shapes(series.bars(), &self.classifier)
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating Backtester instances
pub struct BacktesterBuilder<I: TrendIndicator = Ema> {
    indicator: I,
    classifier: CandleClassifier,
    patterns: Vec<PatternDefinition>,
    overrides: Vec<(PatternId, EvaluationPolicy)>,
    config: EngineConfig,
}

impl Default for BacktesterBuilder<Ema> {
    fn default() -> Self {
        Self::new()
    }
}

impl BacktesterBuilder<Ema> {
    pub fn new() -> Self {
        Self {
            indicator: Ema::default(),
            classifier: CandleClassifier::default(),
            patterns: Vec::new(),
            overrides: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Set the EMA period (default 9)
    pub fn ema_period(mut self, period: Period) -> Self {
        self.indicator = Ema::new(period);
        self
    }

    /// Builder populated from a loaded configuration
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::new()
            .indicator(config.indicator())
            .classifier(config.classifier())
            .parallel(config.parallel);

        builder = match &config.patterns {
            Some(patterns) => patterns.iter().fold(builder, |b, &p| b.add(p)),
            None => builder.with_all_defaults(),
        };

        for o in &config.policy_overrides {
            builder = builder.policy(o.pattern.id(), o.policy);
        }

        Ok(builder)
    }
}

impl<I: TrendIndicator> BacktesterBuilder<I> {
    /// Change trend indicator
    pub fn indicator<I2: TrendIndicator>(self, indicator: I2) -> BacktesterBuilder<I2> {
        BacktesterBuilder {
            indicator,
            classifier: self.classifier,
            patterns: self.patterns,
            overrides: self.overrides,
            config: self.config,
        }
    }

    pub fn classifier(mut self, classifier: CandleClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the doji body/range limit (default 0.12)
    pub fn doji_limit(mut self, limit: Ratio) -> Self {
        self.classifier.doji_limit = limit;
        self
    }

    /// Add all six built-in patterns
    pub fn with_all_defaults(mut self) -> Self {
        self.patterns
            .extend(BuiltinPattern::ALL.iter().map(|p| p.definition()));
        self
    }

    /// Add a built-in pattern
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, pattern: BuiltinPattern) -> Self {
        self.patterns.push(pattern.definition());
        self
    }

    /// Add a custom pattern definition
    pub fn add_definition(mut self, definition: PatternDefinition) -> Self {
        self.patterns.push(definition);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, definition: PatternDefinition) -> Result<Self> {
        definition.validate_config()?;
        self.patterns.push(definition);
        Ok(self)
    }

    /// Evaluate a registered pattern with another policy
    pub fn policy(mut self, pattern: PatternId, policy: EvaluationPolicy) -> Self {
        self.overrides.push((pattern, policy));
        self
    }

    /// Enable/disable parallel pattern scans
    pub fn parallel(mut self, enable: bool) -> Self {
        self.config.parallel = enable;
        self
    }

    /// Keep only these patterns
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Backtester<I>> {
        self.classifier.validate_config()?;

        let mut patterns = self.patterns;
        for (id, policy) in self.overrides {
            let definition = patterns.iter_mut().find(|d| d.id == id).ok_or_else(|| {
                PatternError::InvalidConfig(format!("policy override for unregistered pattern {id}"))
            })?;
            definition.policy = policy;
        }

        if let Some(ref filter) = self.config.pattern_filter {
            patterns.retain(|d| filter.contains(&d.id));
        }

        for (i, definition) in patterns.iter().enumerate() {
            definition.validate_config()?;
            if patterns[..i].iter().any(|d| d.id == definition.id) {
                return Err(PatternError::InvalidConfig(format!(
                    "pattern {} registered twice",
                    definition.id
                )));
            }
        }

        Ok(Backtester {
            patterns,
            classifier: self.classifier,
            indicator: self.indicator,
            config: self.config,
        })
    }
}

/// Default engine with the 9-period EMA
pub type DefaultBacktester = Backtester<Ema>;

// ============================================================
// TESTS
// ============================================================
