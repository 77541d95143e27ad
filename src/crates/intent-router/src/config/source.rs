//! Configuration sources
//!
//! The selector reads its configuration through [`ConfigSource`] at
//! initialization and again on every reload. Sources validate what they
//! return; the selector decides how to recover from a failed load.

use crate::config::loader::{load_yaml_config, parse_yaml_config};
use crate::config::router::RouterConfig;
use crate::Result;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the router configuration file
pub const CONFIG_PATH_ENV: &str = "INTENT_ROUTER_CONFIG";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/router.yaml";

/// Supplies router configuration on startup and on reload
pub trait ConfigSource: Send + Sync {
    /// Load and validate a configuration
    fn load(&self) -> Result<RouterConfig>;

    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// Configuration read from a YAML file
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path from `INTENT_ROUTER_CONFIG`, or `config/router.yaml`
    pub fn from_env() -> Self {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<RouterConfig> {
        debug!("Loading router configuration from {:?}", self.path);
        let config: RouterConfig = load_yaml_config(&self.path)?;
        config.validate()?;
        Ok(config)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// In-memory configuration
#[derive(Debug, Clone)]
pub struct StaticConfigSource {
    config: RouterConfig,
}

impl StaticConfigSource {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Parse YAML text; `$include` is not available here
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config = parse_yaml_config(content, None)?;
        Ok(Self { config })
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<RouterConfig> {
        self.config.validate()?;
        Ok(self.config.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
