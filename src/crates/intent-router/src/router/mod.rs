//! Keyword-based intent classification
//!
//! - [`index`]: keyword → route lookup and pattern-group bonuses
//! - [`scorer`]: confidence formula
//! - [`enhancer`]: reinforcement from recent conversation
//! - [`cache`]: bounded LRU/TTL result cache and its key digest
//! - [`selector`]: the [`RouteSelector`] tying them together

pub mod cache;
pub mod enhancer;
pub mod index;
pub mod scorer;
pub mod selector;
pub mod types;

pub use cache::{cache_key, CacheStats, InsertOutcome, ResultCache};
pub use enhancer::ContextEnhancer;
pub use index::KeywordIndex;
pub use scorer::{confidence, match_confidence, ConfidenceInputs};
pub use selector::{RouteSelector, Snapshot};
pub use types::{
    ClassificationMatch, ClassificationResult, ClassifyOptions, ReasonCode, RouterStats,
    SelectorState, FALLBACK_CONFIDENCE,
};
