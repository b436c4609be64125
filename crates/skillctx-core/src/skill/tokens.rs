//! Token cost estimation for skill bodies.
//!
//! The corpus index asks a [`TokenEstimator`] for the size of every skill
//! that does not declare `tokens` in its frontmatter. Hosts with a real
//! tokenizer plug it in here; the default is a character ratio.

use skillctx_types::config::EstimatorConfig;

/// Approximate token counter.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> u32;
}

/// Estimates tokens as `ceil(chars / chars_per_token)`.
#[derive(Debug, Clone, Copy)]
pub struct CharRatioEstimator {
    chars_per_token: f64,
}

impl CharRatioEstimator {
    pub fn new(chars_per_token: f64) -> Self {
        Self { chars_per_token }
    }

    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self::new(config.chars_per_token)
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::from_config(&EstimatorConfig::default())
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> u32 {
        let chars = text.chars().count() as f64;
        let tokens = (chars / self.chars_per_token).ceil();
        if tokens >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            tokens as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ratio_rounds_up() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.estimate(""), 0);
        assert_eq!(est.estimate("abcd"), 1);
        assert_eq!(est.estimate("abcde"), 2);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let est = CharRatioEstimator::new(1.0);
        assert_eq!(est.estimate("héllo"), 5);
    }
}
