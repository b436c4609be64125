//! Global configuration types for skillctx.
//!
//! `GlobalConfig` is the top-level `config.toml`. Every field has a default,
//! so an empty file is a valid configuration. The scoring weights and decay
//! factor are tunable policy, not fixed constants.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
///
/// Loaded from `~/.skillctx/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// Root of the skill corpus. Defaults to `{data_dir}/skills`.
    #[serde(default)]
    pub corpus_dir: Option<PathBuf>,

    /// Token budget used when a request does not supply one.
    #[serde(default = "default_budget_tokens")]
    pub default_budget_tokens: u32,

    /// Longest query text accepted before the request degrades.
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,

    #[serde(default)]
    pub scoring: ScoringWeights,

    #[serde(default)]
    pub expansion: ExpansionConfig,

    #[serde(default)]
    pub estimator: EstimatorConfig,
}

fn default_budget_tokens() -> u32 {
    8_000
}

fn default_max_query_chars() -> usize {
    16_384
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            corpus_dir: None,
            default_budget_tokens: default_budget_tokens(),
            max_query_chars: default_max_query_chars(),
            scoring: ScoringWeights::default(),
            expansion: ExpansionConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.expansion.validate()?;
        let ratio = self.estimator.chars_per_token;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::InvalidCharsPerToken(ratio));
        }
        Ok(())
    }
}

/// Matcher weights.
///
/// score = trigger × distinct triggers found
///       + auto_detect × auto-detect tokens found
///       + category × (category matches a signal)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoringWeights {
    #[serde(default = "default_trigger_weight")]
    pub trigger_weight: f64,
    #[serde(default = "default_auto_detect_weight")]
    pub auto_detect_weight: f64,
    #[serde(default = "default_category_weight")]
    pub category_weight: f64,
}

fn default_trigger_weight() -> f64 {
    3.0
}

fn default_auto_detect_weight() -> f64 {
    2.0
}

fn default_category_weight() -> f64 {
    1.0
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            trigger_weight: default_trigger_weight(),
            auto_detect_weight: default_auto_detect_weight(),
            category_weight: default_category_weight(),
        }
    }
}

impl ScoringWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("trigger_weight", self.trigger_weight),
            ("auto_detect_weight", self.auto_detect_weight),
            ("category_weight", self.category_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Related-graph expansion policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExpansionConfig {
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,
    /// Score multiplier applied per hop.
    #[serde(default = "default_decay")]
    pub decay: f64,
}

fn default_max_hops() -> u32 {
    1
}

fn default_decay() -> f64 {
    0.5
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            decay: default_decay(),
        }
    }
}

impl ExpansionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.decay) {
            return Err(ConfigError::DecayOutOfRange(self.decay));
        }
        Ok(())
    }
}

/// Token estimation for skills that do not declare `tokens`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EstimatorConfig {
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
}

fn default_chars_per_token() -> f64 {
    4.0
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            chars_per_token: default_chars_per_token(),
        }
    }
}
