//! Reasoning orchestrator
//!
//! Classifies the request, picks a strategy and drives the generation
//! capability. Self-consistency issues every sample call before awaiting any
//! of them and joins them together, so latency follows the slowest sample.
//! Results come back in sample order regardless of completion order.

use crate::config::ReasoningConfig;
use crate::context::ConversationTurn;
use crate::generation::{Generation, GenerationCapability, GenerationError, GenerationOptions};
use crate::reasoning::selection::select_lower_middle;
use crate::reasoning::strategy::{self, ReasoningStrategy};
use crate::reasoning::{
    prompt, ReasoningError, ReasoningMetadata, ReasoningResult, ReasoningSample, ReasoningType,
};
use crate::router::{ClassificationResult, ClassifyOptions, RouteSelector};
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Temperature step between consecutive samples
const TEMPERATURE_STEP: f32 = 0.1;
const MAX_TEMPERATURE: f32 = 2.0;

/// Strategy failure before the direct fallback
struct StrategyFailure {
    attempts: usize,
    error: GenerationError,
}

impl From<GenerationError> for StrategyFailure {
    fn from(error: GenerationError) -> Self {
        Self { attempts: 1, error }
    }
}

pub struct ReasoningOrchestrator {
    selector: Arc<RouteSelector>,
    /// Fixed settings; `None` follows the selector's configuration
    config: Option<ReasoningConfig>,
}

impl ReasoningOrchestrator {
    /// Orchestrator with fixed reasoning settings
    pub fn new(selector: Arc<RouteSelector>, config: ReasoningConfig) -> Self {
        Self {
            selector,
            config: Some(config),
        }
    }

    /// Orchestrator using the `reasoning` section of the selector's
    /// configuration, picking up reloads
    pub fn from_selector(selector: Arc<RouteSelector>) -> Self {
        Self {
            selector,
            config: None,
        }
    }

    pub fn selector(&self) -> &Arc<RouteSelector> {
        &self.selector
    }

    pub fn config(&self) -> ReasoningConfig {
        match &self.config {
            Some(config) => config.clone(),
            None => self.selector.reasoning_config(),
        }
    }

    /// Strategy for a classified message, without generating anything
    pub fn choose_strategy(
        &self,
        classification: &ClassificationResult,
        message: &str,
    ) -> ReasoningStrategy {
        strategy::choose(
            &classification.selected_route,
            &self.selector.complex_reasoning_route(),
            message,
            &self.config(),
        )
    }

    /// Classify and answer `message` with default options
    pub async fn enhance(
        &self,
        message: &str,
        context: &[ConversationTurn],
        rag_context: Option<&str>,
        generator: &dyn GenerationCapability,
    ) -> Result<ReasoningResult, ReasoningError> {
        self.enhance_with_options(
            message,
            context,
            rag_context,
            generator,
            &GenerationOptions::default(),
            &ClassifyOptions::default(),
        )
        .await
    }

    /// Classify and answer `message`
    ///
    /// `options.temperature` replaces the configured base temperature for
    /// self-consistency samples.
    pub async fn enhance_with_options(
        &self,
        message: &str,
        context: &[ConversationTurn],
        rag_context: Option<&str>,
        generator: &dyn GenerationCapability,
        options: &GenerationOptions,
        classify: &ClassifyOptions,
    ) -> Result<ReasoningResult, ReasoningError> {
        let config = self.config();
        let classification = self.selector.select_route(message, context, classify);
        let strategy = strategy::choose(
            &classification.selected_route,
            &self.selector.complex_reasoning_route(),
            message,
            &config,
        );

        info!(
            route = %classification.selected_route,
            confidence = classification.confidence,
            strategy = %strategy,
            "Reasoning strategy selected"
        );

        let outcome = match strategy {
            ReasoningStrategy::Direct => {
                let generation = direct(generator, message, context, rag_context, options).await?;
                return Ok(ReasoningResult {
                    generation,
                    reasoning: None,
                    classification,
                    strategy,
                });
            }
            ReasoningStrategy::ChainOfThought => {
                self.chain_of_thought(generator, message, context, rag_context, options, &config)
                    .await
            }
            ReasoningStrategy::SelfConsistency => {
                self.self_consistency(generator, message, context, rag_context, options, &config)
                    .await
            }
        };

        match outcome {
            Ok((generation, metadata)) => Ok(ReasoningResult {
                generation,
                reasoning: Some(metadata),
                classification,
                strategy,
            }),
            Err(failure) => {
                let reasoning_type = match strategy {
                    ReasoningStrategy::SelfConsistency => ReasoningType::SelfConsistency,
                    _ => ReasoningType::ChainOfThought,
                };
                warn!(
                    strategy = %strategy,
                    attempts = failure.attempts,
                    error = %failure.error,
                    "Reasoning strategy failed, falling back to direct generation"
                );

                match direct(generator, message, context, rag_context, options).await {
                    Ok(generation) => Ok(ReasoningResult {
                        generation,
                        reasoning: Some(ReasoningMetadata::degraded(
                            reasoning_type,
                            failure.error.to_string(),
                        )),
                        classification,
                        strategy: ReasoningStrategy::Direct,
                    }),
                    Err(error) => Err(ReasoningError::AllSamplesFailed {
                        attempts: failure.attempts + 1,
                        last_error: error,
                    }),
                }
            }
        }
    }

    async fn chain_of_thought(
        &self,
        generator: &dyn GenerationCapability,
        message: &str,
        context: &[ConversationTurn],
        rag_context: Option<&str>,
        options: &GenerationOptions,
        config: &ReasoningConfig,
    ) -> Result<(Generation, ReasoningMetadata), StrategyFailure> {
        let prompt = prompt::chain_of_thought(message, rag_context, config.verbose);
        let generation = non_empty(generator.generate(&prompt, context, None, options).await)?;
        Ok((generation, ReasoningMetadata::chain_of_thought()))
    }

    async fn self_consistency(
        &self,
        generator: &dyn GenerationCapability,
        message: &str,
        context: &[ConversationTurn],
        rag_context: Option<&str>,
        options: &GenerationOptions,
        config: &ReasoningConfig,
    ) -> Result<(Generation, ReasoningMetadata), StrategyFailure> {
        let count = config.samples.max(1);
        let base = prompt::self_consistency_base(message, rag_context);
        let base_temperature = options.temperature.unwrap_or(config.base_temperature);

        let requests: Vec<(String, GenerationOptions)> = (0..count)
            .map(|index| {
                let temperature = (base_temperature + index as f32 * TEMPERATURE_STEP)
                    .clamp(0.0, MAX_TEMPERATURE);
                (
                    prompt::sample(&base, index),
                    options.clone().with_temperature(temperature),
                )
            })
            .collect();

        let started = Instant::now();
        let outcomes = join_all(
            requests
                .iter()
                .map(|(prompt, opts)| generator.generate(prompt, context, None, opts)),
        )
        .await;

        let mut successes: Vec<(usize, Generation)> = Vec::with_capacity(count);
        let mut last_error = None;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match non_empty(outcome) {
                Ok(generation) => successes.push((index, generation)),
                Err(e) => {
                    warn!(sample = index, error = %e, "Self-consistency sample failed");
                    last_error = Some(e);
                }
            }
        }

        let failed = count - successes.len();
        debug!(
            samples = count,
            succeeded = successes.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Self-consistency samples joined"
        );

        let samples: Vec<ReasoningSample> = successes
            .iter()
            .map(|(index, generation)| ReasoningSample::new(*index, generation.content.clone()))
            .collect();

        let Some(selected) = select_lower_middle(&samples) else {
            return Err(StrategyFailure {
                attempts: count,
                error: last_error.unwrap_or(GenerationError::EmptyResponse),
            });
        };

        let generation = successes.swap_remove(selected).1;
        debug!(
            selected,
            sample_index = samples[selected].index,
            "Self-consistency winner selected"
        );

        Ok((
            generation,
            ReasoningMetadata::self_consistency(samples, selected, failed),
        ))
    }
}

/// Unaugmented generation call
async fn direct(
    generator: &dyn GenerationCapability,
    message: &str,
    context: &[ConversationTurn],
    rag_context: Option<&str>,
    options: &GenerationOptions,
) -> Result<Generation, GenerationError> {
    non_empty(generator.generate(message, context, rag_context, options).await)
}

/// Treat blank content as a failed call
fn non_empty(outcome: Result<Generation, GenerationError>) -> Result<Generation, GenerationError> {
    match outcome {
        Ok(generation) if generation.is_empty() => Err(GenerationError::EmptyResponse),
        other => other,
    }
}
