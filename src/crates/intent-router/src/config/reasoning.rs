//! Reasoning orchestrator configuration

use crate::{Result, RouterError};
use serde::{Deserialize, Serialize};

/// Settings for strategy choice and self-consistency sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Master switch; when off every request is generated directly
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Allow the chain-of-thought strategy
    #[serde(default = "default_true")]
    pub chain_of_thought: bool,
    /// Allow the self-consistency strategy
    #[serde(default = "default_true")]
    pub self_consistency: bool,
    /// Number of self-consistency samples
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Temperature of sample 0; sample i uses base + i * 0.1
    #[serde(default = "default_base_temperature")]
    pub base_temperature: f32,
    /// Ask for explicit step-by-step output instead of hidden reasoning
    #[serde(default)]
    pub verbose: bool,
    /// Keywords that mark a request as analytical
    #[serde(default = "default_analytical_keywords")]
    pub analytical_keywords: Vec<String>,
    /// Messages longer than this with enough question marks count as complex
    #[serde(default = "default_long_message_chars")]
    pub long_message_chars: usize,
    /// Question marks required alongside the length condition
    #[serde(default = "default_min_question_marks")]
    pub min_question_marks: usize,
}

impl ReasoningConfig {
    /// Configuration with every reasoning strategy switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set sample count
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Set verbose mode
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable self-consistency
    pub fn with_self_consistency(mut self, enabled: bool) -> Self {
        self.self_consistency = enabled;
        self
    }

    /// Enable or disable chain-of-thought
    pub fn with_chain_of_thought(mut self, enabled: bool) -> Self {
        self.chain_of_thought = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(RouterError::InvalidConfig(
                "reasoning.samples must be greater than zero".to_string(),
            ));
        }
        if !self.base_temperature.is_finite() || self.base_temperature < 0.0 {
            return Err(RouterError::InvalidConfig(format!(
                "reasoning.base_temperature must be non-negative, got {}",
                self.base_temperature
            )));
        }
        Ok(())
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chain_of_thought: true,
            self_consistency: true,
            samples: default_samples(),
            base_temperature: default_base_temperature(),
            verbose: false,
            analytical_keywords: default_analytical_keywords(),
            long_message_chars: default_long_message_chars(),
            min_question_marks: default_min_question_marks(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_samples() -> usize {
    3
}

fn default_base_temperature() -> f32 {
    0.7
}

fn default_long_message_chars() -> usize {
    50
}

fn default_min_question_marks() -> usize {
    2
}

fn default_analytical_keywords() -> Vec<String> {
    [
        "analyze",
        "analyse",
        "compare",
        "evaluate",
        "explain why",
        "pros and cons",
        "trade-off",
        "tradeoff",
        "calculate",
        "prove",
        "derive",
        "reason about",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReasoningConfig::default();
        assert!(config.enabled);
        assert_eq!(config.samples, 3);
        assert!((config.base_temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.analytical_keywords.iter().any(|k| k == "compare"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ReasoningConfig = serde_yaml::from_str("samples: 5\nverbose: true").unwrap();
        assert_eq!(config.samples, 5);
        assert!(config.verbose);
        assert!(config.self_consistency);
        assert_eq!(config.long_message_chars, 50);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let config = ReasoningConfig::default().with_samples(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled() {
        let config = ReasoningConfig::disabled();
        assert!(!config.enabled);
        assert!(config.validate().is_ok());
    }
}
