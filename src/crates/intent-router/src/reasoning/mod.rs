//! Reasoning orchestration
//!
//! Turns a classification into one of three generation strategies:
//!
//! | Strategy | Calls | Metadata |
//! |---|---|---|
//! | direct | 1, prompt untouched | none |
//! | chain-of-thought | 1, reasoning prompt | `chain-of-thought` |
//! | self-consistency | N concurrent, diversified | `self-consistency`, samples, winner |
//!
//! A failed chain-of-thought or self-consistency run degrades to a direct
//! call; [`ReasoningError`] is only returned when that call fails as well.

pub mod orchestrator;
pub mod prompt;
pub mod selection;
pub mod strategy;

use crate::generation::{Generation, GenerationError};
use crate::router::ClassificationResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use orchestrator::ReasoningOrchestrator;
pub use strategy::ReasoningStrategy;

/// Reasoning failures that reach the caller
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReasoningError {
    /// Every attempt, including the direct fallback, failed
    #[error("All {attempts} generation attempts failed; last error: {last_error}")]
    AllSamplesFailed {
        attempts: usize,
        last_error: GenerationError,
    },

    /// The single direct call failed
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Kind of reasoning applied to a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasoningType {
    #[serde(rename = "chain-of-thought")]
    ChainOfThought,
    #[serde(rename = "self-consistency")]
    SelfConsistency,
}

impl ReasoningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningType::ChainOfThought => "chain-of-thought",
            ReasoningType::SelfConsistency => "self-consistency",
        }
    }
}

impl std::fmt::Display for ReasoningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful self-consistency sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningSample {
    /// Sample number in 0..N
    pub index: usize,
    pub content: String,
    /// First line of the content, shortened
    pub summary: String,
}

impl ReasoningSample {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            index,
            summary: selection::summarize(&content),
            content,
        }
    }
}

/// Reasoning annotations for the HTTP layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningMetadata {
    pub reasoning_type: ReasoningType,
    /// The response was produced by the reasoning strategy
    pub enhanced: bool,
    /// Successful samples
    pub sample_count: usize,
    /// Samples that failed or came back empty
    #[serde(default)]
    pub failed_samples: usize,
    /// Winner's position among the successful samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_sample: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<ReasoningSample>,
    /// Why the strategy degraded to a direct call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl ReasoningMetadata {
    pub fn chain_of_thought() -> Self {
        Self {
            reasoning_type: ReasoningType::ChainOfThought,
            enhanced: true,
            sample_count: 1,
            failed_samples: 0,
            selected_sample: None,
            samples: Vec::new(),
            fallback_reason: None,
        }
    }

    pub fn self_consistency(samples: Vec<ReasoningSample>, selected: usize, failed: usize) -> Self {
        Self {
            reasoning_type: ReasoningType::SelfConsistency,
            enhanced: true,
            sample_count: samples.len(),
            failed_samples: failed,
            selected_sample: Some(selected),
            samples,
            fallback_reason: None,
        }
    }

    /// Annotation for a strategy that degraded to a direct call
    pub fn degraded(reasoning_type: ReasoningType, reason: impl Into<String>) -> Self {
        Self {
            reasoning_type,
            enhanced: false,
            sample_count: 0,
            failed_samples: 0,
            selected_sample: None,
            samples: Vec::new(),
            fallback_reason: Some(reason.into()),
        }
    }
}

/// Generated answer with its classification and reasoning annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningResult {
    pub generation: Generation,
    /// Absent for plain direct generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningMetadata>,
    pub classification: ClassificationResult,
    /// Strategy that produced `generation`
    pub strategy: ReasoningStrategy,
}

impl ReasoningResult {
    pub fn content(&self) -> &str {
        &self.generation.content
    }

    pub fn is_enhanced(&self) -> bool {
        self.reasoning.as_ref().is_some_and(|r| r.enhanced)
    }
}
