//! Intent routing and reasoning orchestration
//!
//! This crate classifies free-text requests into configured routes and turns a
//! classification into a generation strategy:
//!
//! - [`router::RouteSelector`] - keyword index, confidence scoring, context
//!   enhancement and a bounded result cache behind a reloadable snapshot
//! - [`reasoning::ReasoningOrchestrator`] - direct, chain-of-thought or
//!   self-consistency generation on top of an injected
//!   [`generation::GenerationCapability`]
//!
//! # Architecture
//!
//! ```text
//! request
//!    ↓
//! RouteSelector ── cache hit ──────────────┐
//!    ↓ miss                                │
//! KeywordIndex::analyze → ContextEnhancer  │
//!    ↓                                     │
//! confidence / threshold → cache insert ───┤
//!                                          ↓
//!                            ClassificationResult
//!                                          ↓
//! ReasoningOrchestrator: strategy → prompt → 1 or N generate() calls
//!                                          ↓
//!                              ReasoningResult
//! ```
//!
//! Classification never fails past [`router::RouteSelector::select_route`]; the
//! orchestrator only returns an error when every generation attempt for a
//! request failed.

pub mod config;
pub mod context;
pub mod generation;
pub mod reasoning;
pub mod router;

use thiserror::Error;

pub use config::{
    CacheSettings, ConfigSource, FileConfigSource, PatternGroup, ReasoningConfig,
    RouteDefinition, RouterConfig, RouterSettings, StaticConfigSource,
};
pub use context::{ConversationTurn, Role};
pub use generation::{
    Generation, GenerationCapability, GenerationError, GenerationOptions, Usage,
};
pub use reasoning::{
    ReasoningError, ReasoningMetadata, ReasoningOrchestrator, ReasoningResult, ReasoningSample,
    ReasoningStrategy, ReasoningType,
};
pub use router::{
    ClassificationMatch, ClassificationResult, ClassifyOptions, ReasonCode, ResultCache,
    RouteSelector, RouterStats, SelectorState,
};

/// Errors raised inside the routing core
///
/// None of these cross [`RouteSelector::select_route`]: configuration errors
/// fall back to the built-in configuration, classification errors fall back to
/// the default route and cache errors are treated as misses.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Configuration could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    /// Configuration parsed but violates a constraint
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Classification failed internally
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Cache key derivation or bookkeeping failed
    #[error("Cache error: {0}")]
    Cache(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RouterError>;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
