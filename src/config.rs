//! Analysis configuration
//!
//! Thresholds, the EMA period and per-pattern evaluation policies can be kept
//! in a TOML file:
//!
//! ```toml
//! doji_limit = 0.12
//! ema_period = 9
//! patterns = ["bullish_engulfing", "hammer"]
//! parallel = false
//!
//! [[policy_overrides]]
//! pattern = "bullish_engulfing"
//! policy = { kind = "forward_close" }
//! ```

use std::path::Path;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::{
    classifier::{CandleClassifier, DOJI_LIMIT},
    patterns::{BuiltinPattern, EvaluationPolicy},
    trend::{Ema, EMA_PERIOD},
    PatternError, Period, Ratio, Result,
};

/// Evaluation policy replacing a built-in pattern's default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub pattern: BuiltinPattern,
    pub policy: EvaluationPolicy,
}

/// Parameters of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub doji_limit: Ratio,
    pub ema_period: Period,
    /// Built-ins to run; all of them when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<BuiltinPattern>>,
    pub parallel: bool,
    pub policy_overrides: Vec<PolicyOverride>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            doji_limit: Ratio::new_const(DOJI_LIMIT),
            ema_period: Period::new_const(EMA_PERIOD),
            patterns: None,
            parallel: true,
            policy_overrides: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        debug!("parsing analysis config");
        let config: Self = toml::from_str(content)
            .map_err(|e| PatternError::InvalidConfig(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading analysis config from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            error!("cannot read config {}: {}", path.display(), e);
            PatternError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;

        info!("loaded analysis config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PatternError::InvalidConfig(format!("TOML serialize error: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(patterns) = &self.patterns {
            if patterns.is_empty() {
                return Err(PatternError::InvalidConfig(
                    "pattern list is empty".to_string(),
                ));
            }
            for (i, p) in patterns.iter().enumerate() {
                if patterns[..i].contains(p) {
                    return Err(PatternError::InvalidConfig(format!(
                        "pattern {} listed twice",
                        p.id()
                    )));
                }
            }
        }

        for (i, o) in self.policy_overrides.iter().enumerate() {
            o.policy.validate_config()?;
            if self.policy_overrides[..i].iter().any(|prev| prev.pattern == o.pattern) {
                return Err(PatternError::InvalidConfig(format!(
                    "policy for {} overridden twice",
                    o.pattern.id()
                )));
            }
            if let Some(patterns) = &self.patterns {
                if !patterns.contains(&o.pattern) {
                    return Err(PatternError::InvalidConfig(format!(
                        "policy override for {} which is not enabled",
                        o.pattern.id()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn classifier(&self) -> CandleClassifier {
        CandleClassifier::new(self.doji_limit)
    }

    pub fn indicator(&self) -> Ema {
        Ema::new(self.ema_period)
    }
}
