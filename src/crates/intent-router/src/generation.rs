//! Generation capability
//!
//! The orchestrator does not talk to any model provider itself. Hosts supply
//! a [`GenerationCapability`] (an HTTP client for a model server, a local
//! model, a test double) and share it as `Arc<dyn GenerationCapability>`.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use intent_router::{ConversationTurn, Generation, GenerationCapability, GenerationError, GenerationOptions};
//! use async_trait::async_trait;
//!
//! struct EchoModel;
//!
//! #[async_trait]
//! impl GenerationCapability for EchoModel {
//!     async fn generate(
//!         &self,
//!         message: &str,
//!         _context: &[ConversationTurn],
//!         _rag_context: Option<&str>,
//!         _options: &GenerationOptions,
//!     ) -> Result<Generation, GenerationError> {
//!         Ok(Generation::new(message))
//!     }
//! }
//! ```

use crate::context::ConversationTurn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single generation call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    /// The provider reported an error
    #[error("Generation failed: {0}")]
    Failed(String),

    /// The provider returned no usable content
    #[error("Generation returned empty content")]
    EmptyResponse,

    /// The shared transport timeout elapsed
    #[error("Generation timed out: {0}")]
    Timeout(String),

    /// The provider could not be reached
    #[error("Generation backend unavailable: {0}")]
    Unavailable(String),
}

/// Per-call generation parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// System prompt prepended by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Successful generation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Generation {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some("stop".to_string()),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Content is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Text generation backend consumed by the orchestrator
///
/// Implementations must be `Send + Sync`; the orchestrator issues several
/// calls on the same instance concurrently during self-consistency.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Generate a completion for `message`
    ///
    /// `rag_context` carries retrieved reference text the provider should
    /// place in its prompt; it is `None` when the message already embeds it.
    async fn generate(
        &self,
        message: &str,
        context: &[ConversationTurn],
        rag_context: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<Generation, GenerationError>;
}
