//! Classification data types

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Confidence reported for every fallback decision
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Per-route match accumulated while analyzing a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMatch {
    pub route: String,
    /// Accumulated score from keyword hits, pattern bonuses and context
    pub score: f64,
    /// Keywords (and pattern phrases) found in the message
    pub matched_keywords: Vec<String>,
    pub weight: f64,
    pub priority: i32,
    /// Recent conversation turns reinforced this match
    pub context_enhanced: bool,
}

impl ClassificationMatch {
    pub fn new(route: impl Into<String>, weight: f64, priority: i32) -> Self {
        Self {
            route: route.into(),
            score: 0.0,
            matched_keywords: Vec::new(),
            weight,
            priority,
            context_enhanced: false,
        }
    }
}

/// Order matches by priority ascending, then score descending
pub fn sort_matches(matches: &mut [ClassificationMatch]) {
    matches.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });
}

/// Why a route was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    KeywordMatchSuccess,
    NoKeywordsMatched,
    ConfidenceBelowThreshold,
    ClassificationError,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::KeywordMatchSuccess => "keyword_match_success",
            ReasonCode::NoKeywordsMatched => "no_keywords_matched",
            ReasonCode::ConfidenceBelowThreshold => "confidence_below_threshold",
            ReasonCode::ClassificationError => "classification_error",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub selected_route: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// All matches, sorted by (priority asc, score desc)
    pub matches: Vec<ClassificationMatch>,
    pub reason: ReasonCode,
    /// The default route was returned instead of a keyword match
    pub fallback: bool,
    /// Endpoint configured for the selected route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Note attached when classification degraded after an internal error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassificationResult {
    /// Fallback to `route` with the fixed low confidence
    pub fn fallback(
        route: impl Into<String>,
        reason: ReasonCode,
        matches: Vec<ClassificationMatch>,
    ) -> Self {
        Self {
            selected_route: route.into(),
            confidence: FALLBACK_CONFIDENCE,
            matches,
            reason,
            fallback: true,
            endpoint: None,
            error: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn best_match(&self) -> Option<&ClassificationMatch> {
        self.matches.first()
    }
}

/// Per-call classification options
///
/// Options are part of the cache key, so two calls with different options
/// never share a cached decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyOptions {
    /// Overrides the configured default route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_route: Option<String>,
    /// Overrides the configured confidence threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
    /// Neither read nor write the result cache
    #[serde(default)]
    pub bypass_cache: bool,
}

impl ClassifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_route(mut self, route: impl Into<String>) -> Self {
        self.default_route = Some(route.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = Some(threshold);
        self
    }

    pub fn with_bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }
}

/// Selector lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorState {
    Uninitialized,
    Ready,
}

/// Point-in-time selector counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fallbacks: u64,
    pub errors: u64,
    pub reloads: u64,
    pub cache_entries: usize,
    pub config_version: u64,
}

impl RouterStats {
    /// Share of cache lookups that hit, 0.0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}
