//! Route and pattern-group configuration
//!
//! Defines the keyword routes the classifier selects between, the pattern
//! groups that push complex requests toward the reasoning route, and the
//! selector's threshold and cache settings.

use crate::config::reasoning::ReasoningConfig;
use crate::{Result, RouterError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default fallback route name
pub const DEFAULT_ROUTE: &str = "general";

/// Default name of the route that requests complex reasoning
pub const DEFAULT_COMPLEX_ROUTE: &str = "complex_reasoning";

/// Bonus a matching pattern group adds to the complex-reasoning route
pub const DEFAULT_PATTERN_BONUS: f64 = 0.5;

/// Complete router configuration as read from a config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Selector settings
    #[serde(default)]
    pub settings: RouterSettings,
    /// Routes keyed by name
    #[serde(default)]
    pub routes: BTreeMap<String, RouteSpec>,
    /// Pattern groups keyed by name
    #[serde(default = "default_pattern_groups")]
    pub pattern_groups: BTreeMap<String, PatternSpec>,
    /// Reasoning orchestrator settings
    #[serde(default)]
    pub reasoning: ReasoningConfig,
}

/// Selector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Route returned when nothing matches or confidence is too low
    #[serde(default = "default_route")]
    pub default_route: String,
    /// Route that pattern groups boost and that triggers self-consistency
    #[serde(default = "default_complex_route")]
    pub complex_reasoning_route: String,
    /// Minimum confidence for a keyword match to be selected
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
    /// Match keywords case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,
    /// Result cache settings
    #[serde(default)]
    pub cache: CacheSettings,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            default_route: default_route(),
            complex_reasoning_route: default_complex_route(),
            confidence_threshold: default_threshold(),
            case_sensitive: false,
            cache: CacheSettings::default(),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of cached classifications
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Seconds a cached classification stays valid
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheSettings {
    /// TTL as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Route entry as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Keywords that indicate this route
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Score added per keyword hit
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Priority, lower is more important
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Downstream model or endpoint identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Pattern group entry as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Trigger phrases
    pub phrases: Vec<String>,
    /// Route to boost; the complex-reasoning route when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_route: Option<String>,
    /// Score added to the target route when any phrase matches
    #[serde(default = "default_pattern_bonus")]
    pub bonus: f64,
}

/// A named route, immutable for the lifetime of a configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub name: String,
    pub keywords: Vec<String>,
    pub weight: f64,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// A named group of trigger phrases biasing one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternGroup {
    pub name: String,
    pub phrases: Vec<String>,
    pub target_route: String,
    pub bonus: f64,
}

impl RouterConfig {
    /// Built-in configuration used when no source can be read
    ///
    /// A single keyword-less route, so every message falls back to it.
    pub fn minimal() -> Self {
        let mut routes = BTreeMap::new();
        routes.insert(
            DEFAULT_ROUTE.to_string(),
            RouteSpec {
                keywords: Vec::new(),
                weight: 1.0,
                priority: 10,
                endpoint: None,
            },
        );

        Self {
            settings: RouterSettings::default(),
            routes,
            pattern_groups: BTreeMap::new(),
            reasoning: ReasoningConfig::default(),
        }
    }

    /// Route definitions in name order
    pub fn route_definitions(&self) -> Vec<RouteDefinition> {
        self.routes
            .iter()
            .map(|(name, spec)| RouteDefinition {
                name: name.clone(),
                keywords: spec.keywords.clone(),
                weight: spec.weight,
                priority: spec.priority,
                endpoint: spec.endpoint.clone(),
            })
            .collect()
    }

    /// Pattern groups in name order, with target routes resolved
    pub fn pattern_group_list(&self) -> Vec<PatternGroup> {
        self.pattern_groups
            .iter()
            .map(|(name, spec)| PatternGroup {
                name: name.clone(),
                phrases: spec.phrases.clone(),
                target_route: spec
                    .target_route
                    .clone()
                    .unwrap_or_else(|| self.settings.complex_reasoning_route.clone()),
                bonus: spec.bonus,
            })
            .collect()
    }

    /// Check constraints that deserialization cannot express
    pub fn validate(&self) -> Result<()> {
        let settings = &self.settings;

        if !(0.0..=1.0).contains(&settings.confidence_threshold) {
            return Err(RouterError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                settings.confidence_threshold
            )));
        }
        if settings.default_route.trim().is_empty() {
            return Err(RouterError::InvalidConfig(
                "default_route must not be empty".to_string(),
            ));
        }
        if settings.cache.max_entries == 0 {
            return Err(RouterError::InvalidConfig(
                "cache.max_entries must be greater than zero".to_string(),
            ));
        }

        for (name, route) in &self.routes {
            if name.trim().is_empty() {
                return Err(RouterError::InvalidConfig(
                    "route names must not be empty".to_string(),
                ));
            }
            if !route.weight.is_finite() || route.weight <= 0.0 {
                return Err(RouterError::InvalidConfig(format!(
                    "route '{}' has invalid weight {}",
                    name, route.weight
                )));
            }
            if route.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(RouterError::InvalidConfig(format!(
                    "route '{}' contains an empty keyword",
                    name
                )));
            }
        }

        for (name, group) in &self.pattern_groups {
            if !group.bonus.is_finite() || group.bonus < 0.0 {
                return Err(RouterError::InvalidConfig(format!(
                    "pattern group '{}' has invalid bonus {}",
                    name, group.bonus
                )));
            }
        }

        self.reasoning.validate()
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            settings: RouterSettings::default(),
            routes: BTreeMap::new(),
            pattern_groups: default_pattern_groups(),
            reasoning: ReasoningConfig::default(),
        }
    }
}

/// Question, comparison and analysis phrase groups
pub fn default_pattern_groups() -> BTreeMap<String, PatternSpec> {
    let group = |phrases: &[&str]| PatternSpec {
        phrases: phrases.iter().map(|p| p.to_string()).collect(),
        target_route: None,
        bonus: DEFAULT_PATTERN_BONUS,
    };

    let mut groups = BTreeMap::new();
    groups.insert(
        "question".to_string(),
        group(&["how does", "how do", "why does", "why is", "what would happen"]),
    );
    groups.insert(
        "comparison".to_string(),
        group(&["compare", "versus", " vs ", "difference between", "better than", "pros and cons"]),
    );
    groups.insert(
        "analysis".to_string(),
        group(&["analyze", "analyse", "evaluate", "assess", "implications", "trade-off", "step by step"]),
    );
    groups
}

fn default_route() -> String {
    DEFAULT_ROUTE.to_string()
}

fn default_complex_route() -> String {
    DEFAULT_COMPLEX_ROUTE.to_string()
}

fn default_threshold() -> f64 {
    0.6
}

fn default_max_entries() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_weight() -> f64 {
    1.0
}

fn default_priority() -> i32 {
    5
}

fn default_pattern_bonus() -> f64 {
    DEFAULT_PATTERN_BONUS
}
