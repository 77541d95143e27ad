//! Confidence scoring
//!
//! ```text
//! confidence = clamp(
//!     0.5 * min(S / 2, 1)          best match score
//!   + 0.3 * min(K / 2, 1)          keyword hits
//!   + 0.1   if P == 1              top priority
//!   + 0.05 * min(L / 30, 1)        message length
//!   + 0.15  if context enhanced
//!   + 0.1 * (W - 1)  if W > 1      route weight above 1
//!   , 0.1, 1.0)
//! ```
//!
//! The coefficients are empirical and kept as-is.

use crate::router::types::ClassificationMatch;

const SCORE_COEFFICIENT: f64 = 0.5;
const SCORE_SATURATION: f64 = 2.0;
const HITS_COEFFICIENT: f64 = 0.3;
const HITS_SATURATION: f64 = 2.0;
const TOP_PRIORITY_BONUS: f64 = 0.1;
const LENGTH_COEFFICIENT: f64 = 0.05;
const LENGTH_SATURATION: f64 = 30.0;
const CONTEXT_BONUS: f64 = 0.15;
const WEIGHT_COEFFICIENT: f64 = 0.1;

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Inputs of the confidence formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    pub score: f64,
    pub keyword_hits: usize,
    pub priority: i32,
    pub weight: f64,
    pub message_len: usize,
    pub context_enhanced: bool,
}

impl ConfidenceInputs {
    /// Inputs for the best match of `message`
    pub fn from_match(best: &ClassificationMatch, message: &str) -> Self {
        Self {
            score: best.score,
            keyword_hits: best.matched_keywords.len(),
            priority: best.priority,
            weight: best.weight,
            message_len: message.chars().count(),
            context_enhanced: best.context_enhanced,
        }
    }
}

pub fn confidence(inputs: &ConfidenceInputs) -> f64 {
    let mut value = SCORE_COEFFICIENT * (inputs.score / SCORE_SATURATION).min(1.0)
        + HITS_COEFFICIENT * (inputs.keyword_hits as f64 / HITS_SATURATION).min(1.0)
        + LENGTH_COEFFICIENT * (inputs.message_len as f64 / LENGTH_SATURATION).min(1.0);

    if inputs.priority == 1 {
        value += TOP_PRIORITY_BONUS;
    }
    if inputs.context_enhanced {
        value += CONTEXT_BONUS;
    }
    if inputs.weight > 1.0 {
        value += WEIGHT_COEFFICIENT * (inputs.weight - 1.0);
    }

    if value.is_nan() {
        return MIN_CONFIDENCE;
    }
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Confidence of `best` as the answer for `message`
pub fn match_confidence(best: &ClassificationMatch, message: &str) -> f64 {
    confidence(&ConfidenceInputs::from_match(best, message))
}
