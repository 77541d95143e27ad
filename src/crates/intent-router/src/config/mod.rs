//! Configuration module for the intent router
//!
//! Provides YAML configuration loading and parsing for:
//! - Route definitions (keywords, weight, priority, endpoint)
//! - Pattern groups that bias the complex-reasoning route
//! - Threshold, cache capacity and TTL settings
//! - Reasoning strategy settings
//! - Environment variable expansion and file includes

pub mod loader;
pub mod reasoning;
pub mod router;
pub mod source;

pub use loader::{deep_merge, load_yaml_config, load_yaml_file, parse_yaml_config};
pub use reasoning::ReasoningConfig;
pub use router::{
    CacheSettings, PatternGroup, PatternSpec, RouteDefinition, RouteSpec, RouterConfig,
    RouterSettings,
};
pub use source::{ConfigSource, FileConfigSource, StaticConfigSource, CONFIG_PATH_ENV};
