//! Strategy choice
//!
//! Self-consistency is reserved for requests that are routed to the
//! complex-reasoning route or look analytical on their own; everything else
//! gets a single chain-of-thought call when enabled.

use crate::config::ReasoningConfig;
use serde::{Deserialize, Serialize};

/// How a request is turned into generation calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningStrategy {
    /// One unmodified generation call
    Direct,
    /// One call with a step-by-step reasoning prompt
    ChainOfThought,
    /// Several diversified calls joined and reduced to one answer
    SelfConsistency,
}

impl ReasoningStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningStrategy::Direct => "direct",
            ReasoningStrategy::ChainOfThought => "chain_of_thought",
            ReasoningStrategy::SelfConsistency => "self_consistency",
        }
    }
}

impl std::fmt::Display for ReasoningStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analytical keyword present, or a long message with several questions
pub fn looks_complex(message: &str, config: &ReasoningConfig) -> bool {
    let lowered = message.to_lowercase();
    if config
        .analytical_keywords
        .iter()
        .any(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
    {
        return true;
    }

    let questions = message.matches('?').count();
    message.chars().count() > config.long_message_chars && questions >= config.min_question_marks
}

/// Pick the strategy for a request routed to `route`
pub fn choose(
    route: &str,
    complex_route: &str,
    message: &str,
    config: &ReasoningConfig,
) -> ReasoningStrategy {
    if !config.enabled {
        return ReasoningStrategy::Direct;
    }

    let complex = route == complex_route || looks_complex(message, config);
    if complex && config.self_consistency {
        ReasoningStrategy::SelfConsistency
    } else if config.chain_of_thought {
        ReasoningStrategy::ChainOfThought
    } else {
        ReasoningStrategy::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLEX: &str = "complex_reasoning";

    #[test]
    fn test_complex_route_uses_self_consistency() {
        let config = ReasoningConfig::default();
        assert_eq!(
            choose(COMPLEX, COMPLEX, "hi", &config),
            ReasoningStrategy::SelfConsistency
        );
    }

    #[test]
    fn test_analytical_keyword_triggers_heuristic() {
        let config = ReasoningConfig::default();
        assert!(looks_complex("Please COMPARE these two", &config));
        assert_eq!(
            choose("chat", COMPLEX, "evaluate my essay", &config),
            ReasoningStrategy::SelfConsistency
        );
    }

    #[test]
    fn test_long_multi_question_triggers_heuristic() {
        let config = ReasoningConfig::default();
        let long = "What time does the shop open tomorrow? And is there parking nearby at all?";
        assert!(long.chars().count() > 50);
        assert!(looks_complex(long, &config));

        let short = "Open? Parking?";
        assert!(!looks_complex(short, &config));

        let one_question = "I would like to know what time the shop opens tomorrow morning?";
        assert!(!looks_complex(one_question, &config));
    }

    #[test]
    fn test_simple_message_uses_chain_of_thought() {
        let config = ReasoningConfig::default();
        assert_eq!(
            choose("chat", COMPLEX, "hello there", &config),
            ReasoningStrategy::ChainOfThought
        );
    }

    #[test]
    fn test_self_consistency_disabled_falls_to_chain_of_thought() {
        let config = ReasoningConfig::default().with_self_consistency(false);
        assert_eq!(
            choose(COMPLEX, COMPLEX, "hi", &config),
            ReasoningStrategy::ChainOfThought
        );
    }

    #[test]
    fn test_everything_disabled_is_direct() {
        assert_eq!(
            choose(COMPLEX, COMPLEX, "analyze", &ReasoningConfig::disabled()),
            ReasoningStrategy::Direct
        );

        let config = ReasoningConfig::default()
            .with_self_consistency(false)
            .with_chain_of_thought(false);
        assert_eq!(choose("chat", COMPLEX, "hi", &config), ReasoningStrategy::Direct);
    }
}
