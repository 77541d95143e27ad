//! Route selector
//!
//! Turns a message plus recent conversation into a [`ClassificationResult`]:
//!
//! ```text
//! UNINITIALIZED → READY → per call:
//!     CACHE_HIT
//!   | CACHE_MISS → ANALYZE → THRESHOLD_CHECK → SELECTED | FALLBACK
//! ```
//!
//! The route set lives in an immutable [`Snapshot`] behind a swappable
//! `Arc`. A reload builds a complete new snapshot and installs it together
//! with a fresh cache epoch, so a call never sees a half-updated index and
//! no decision from the previous configuration is served afterwards.

use crate::config::{
    ConfigSource, ReasoningConfig, RouteDefinition, RouterConfig, StaticConfigSource,
};
use crate::context::ConversationTurn;
use crate::router::cache::{cache_key, CacheStats, InsertOutcome, ResultCache};
use crate::router::enhancer::ContextEnhancer;
use crate::router::index::KeywordIndex;
use crate::router::scorer::match_confidence;
use crate::router::types::{
    ClassificationResult, ClassifyOptions, ReasonCode, RouterStats, SelectorState,
};
use crate::{Result, RouterError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One installed configuration and the index built from it
#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub config: RouterConfig,
    pub index: KeywordIndex,
}

impl Snapshot {
    fn build(config: RouterConfig, version: u64) -> Self {
        let index = KeywordIndex::build(
            &config.route_definitions(),
            &config.pattern_group_list(),
            config.settings.case_sensitive,
        );
        Self {
            version,
            config,
            index,
        }
    }

    fn endpoint_for(&self, route: &str) -> Option<String> {
        self.index.route(route).and_then(|r| r.endpoint.clone())
    }
}

#[derive(Debug, Default)]
struct Counters {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    fallbacks: AtomicU64,
    errors: AtomicU64,
    reloads: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Keyword classifier with caching and hot reload
pub struct RouteSelector {
    source: Arc<dyn ConfigSource>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    cache: ResultCache,
    enhancer: ContextEnhancer,
    /// Serializes initialize and reload
    install_lock: Mutex<()>,
    version: AtomicU64,
    counters: Counters,
}

impl RouteSelector {
    /// Create an uninitialized selector reading from `source`
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        let defaults = RouterConfig::default();
        Self {
            source,
            snapshot: RwLock::new(None),
            cache: ResultCache::new(
                defaults.settings.cache.max_entries,
                defaults.settings.cache.ttl(),
            ),
            enhancer: ContextEnhancer::default(),
            install_lock: Mutex::new(()),
            version: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    /// Selector over a fixed in-memory configuration
    pub fn from_config(config: RouterConfig) -> Self {
        Self::new(Arc::new(StaticConfigSource::new(config)))
    }

    pub fn state(&self) -> SelectorState {
        if self.snapshot.read().is_some() {
            SelectorState::Ready
        } else {
            SelectorState::Uninitialized
        }
    }

    /// Load the configuration if not done yet
    ///
    /// An unreadable or invalid configuration is replaced by
    /// [`RouterConfig::minimal`]; initialization itself never fails.
    pub fn initialize(&self) {
        self.ready_snapshot();
    }

    /// Re-read the configuration source and install it
    ///
    /// On success the cache is wiped and the new version is returned. When
    /// the source fails, a selector that is already serving keeps its
    /// current configuration and the error is returned; an uninitialized
    /// one falls back to the minimal configuration.
    pub fn reload_config(&self) -> Result<u64> {
        let _guard = self.install_lock.lock();

        match self.source.load() {
            Ok(config) => {
                let version = self.install(config).version;
                Counters::bump(&self.counters.reloads);
                info!(
                    source = %self.source.describe(),
                    version,
                    "Router configuration reloaded"
                );
                Ok(version)
            }
            Err(e) => {
                let uninitialized = self.snapshot.read().is_none();
                if uninitialized {
                    warn!(
                        source = %self.source.describe(),
                        error = %e,
                        "Router configuration unavailable, using minimal configuration"
                    );
                    self.install(RouterConfig::minimal());
                } else {
                    warn!(
                        source = %self.source.describe(),
                        error = %e,
                        "Router configuration reload failed, keeping current configuration"
                    );
                }
                Err(e)
            }
        }
    }

    /// Classify `message`
    ///
    /// Never fails: internal errors degrade to the default route with the
    /// fallback confidence and an error note.
    pub fn select_route(
        &self,
        message: &str,
        context: &[ConversationTurn],
        options: &ClassifyOptions,
    ) -> ClassificationResult {
        Counters::bump(&self.counters.total_requests);
        let snapshot = self.ready_snapshot();

        match self.classify(&snapshot, message, context, options) {
            Ok(result) => result,
            Err(e) => {
                Counters::bump(&self.counters.errors);
                Counters::bump(&self.counters.fallbacks);
                warn!(error = %e, "Classification failed, using default route");

                let route = options
                    .default_route
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| snapshot.config.settings.default_route.clone());
                let endpoint = snapshot.endpoint_for(&route);
                ClassificationResult::fallback(route, ReasonCode::ClassificationError, Vec::new())
                    .with_endpoint(endpoint)
                    .with_error(e.to_string())
            }
        }
    }

    fn classify(
        &self,
        snapshot: &Snapshot,
        message: &str,
        context: &[ConversationTurn],
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult> {
        let settings = &snapshot.config.settings;

        let default_route = match &options.default_route {
            Some(route) if route.trim().is_empty() => {
                return Err(RouterError::Classification(
                    "default route override is empty".to_string(),
                ));
            }
            Some(route) => route.clone(),
            None => settings.default_route.clone(),
        };
        let threshold = options
            .confidence_threshold
            .unwrap_or(settings.confidence_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RouterError::Classification(format!(
                "confidence threshold {} outside [0, 1]",
                threshold
            )));
        }

        let key = if options.bypass_cache {
            None
        } else {
            match cache_key(message, options, context) {
                Ok(key) => Some(key),
                Err(e) => {
                    debug!(error = %e, "Cache key derivation failed, treating as miss");
                    None
                }
            }
        };

        if let Some(key) = &key {
            if let Some(hit) = self.cache.get(key) {
                Counters::bump(&self.counters.cache_hits);
                debug!(route = %hit.selected_route, "Classification cache hit");
                return Ok(hit);
            }
            Counters::bump(&self.counters.cache_misses);
        }

        let matches = snapshot.index.analyze(message);
        let matches = self.enhancer.enhance(&snapshot.index, matches, context);

        let result = match matches.first() {
            None => {
                debug!(route = %default_route, "No keywords matched");
                ClassificationResult::fallback(
                    default_route.clone(),
                    ReasonCode::NoKeywordsMatched,
                    matches,
                )
                .with_endpoint(snapshot.endpoint_for(&default_route))
            }
            Some(best) => {
                let confidence = match_confidence(best, message);
                if confidence < threshold {
                    debug!(
                        best = %best.route,
                        confidence,
                        threshold,
                        "Confidence below threshold"
                    );
                    ClassificationResult::fallback(
                        default_route.clone(),
                        ReasonCode::ConfidenceBelowThreshold,
                        matches,
                    )
                    .with_endpoint(snapshot.endpoint_for(&default_route))
                } else {
                    let route = best.route.clone();
                    debug!(route = %route, confidence, "Route selected");
                    ClassificationResult {
                        endpoint: snapshot.endpoint_for(&route),
                        selected_route: route,
                        confidence,
                        matches,
                        reason: ReasonCode::KeywordMatchSuccess,
                        fallback: false,
                        error: None,
                    }
                }
            }
        };

        if let Some(key) = key {
            if let InsertOutcome::Existing(existing) =
                self.cache.insert_if_absent(key, result.clone(), snapshot.version)
            {
                return Ok(existing);
            }
        }

        if result.fallback {
            Counters::bump(&self.counters.fallbacks);
        }
        Ok(result)
    }

    /// Current snapshot, initializing on first use
    fn ready_snapshot(&self) -> Arc<Snapshot> {
        if let Some(snapshot) = self.snapshot.read().as_ref() {
            return Arc::clone(snapshot);
        }

        let _guard = self.install_lock.lock();
        if let Some(snapshot) = self.snapshot.read().as_ref() {
            return Arc::clone(snapshot);
        }

        let config = match self.source.load() {
            Ok(config) => {
                info!(source = %self.source.describe(), "Router configuration loaded");
                config
            }
            Err(e) => {
                warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "Router configuration unavailable, using minimal configuration"
                );
                RouterConfig::minimal()
            }
        };
        self.install(config)
    }

    /// Swap in `config`; caller holds `install_lock`
    fn install(&self, config: RouterConfig) -> Arc<Snapshot> {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let cache = config.settings.cache.clone();
        let snapshot = Arc::new(Snapshot::build(config, version));

        let mut slot = self.snapshot.write();
        *slot = Some(Arc::clone(&snapshot));
        self.cache.reconfigure(cache.max_entries, cache.ttl(), version);
        drop(slot);

        debug!(version, "Installed router configuration snapshot");
        snapshot
    }

    /// Active snapshot, if initialized
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().clone()
    }

    /// Active route definitions ordered by (priority, name)
    pub fn routes(&self) -> Vec<RouteDefinition> {
        let snapshot = self.ready_snapshot();
        let mut routes: Vec<RouteDefinition> = snapshot.index.routes().cloned().collect();
        routes.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        routes
    }

    pub fn complex_reasoning_route(&self) -> String {
        self.ready_snapshot()
            .config
            .settings
            .complex_reasoning_route
            .clone()
    }

    pub fn reasoning_config(&self) -> ReasoningConfig {
        self.ready_snapshot().config.reasoning.clone()
    }

    /// Version of the installed configuration, 0 before initialization
    pub fn config_version(&self) -> u64 {
        self.snapshot
            .read()
            .as_ref()
            .map(|s| s.version)
            .unwrap_or(0)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Sweep expired cache entries
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn stats(&self) -> RouterStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        RouterStats {
            total_requests: load(&self.counters.total_requests),
            cache_hits: load(&self.counters.cache_hits),
            cache_misses: load(&self.counters.cache_misses),
            fallbacks: load(&self.counters.fallbacks),
            errors: load(&self.counters.errors),
            reloads: load(&self.counters.reloads),
            cache_entries: self.cache.len(),
            config_version: self.config_version(),
        }
    }
}
