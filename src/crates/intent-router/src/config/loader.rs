//! YAML configuration loader with include and environment variable support
//!
//! Loading runs in a fixed order:
//! 1. read and parse the file
//! 2. resolve `$include` directives relative to the including file; sibling
//!    keys next to `$include` are deep-merged over the included document
//! 3. expand `${ENV_VAR:default}` in string values
//! 4. deserialize into the target type

use crate::{Result, RouterError};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_yaml::Value as YamlValue;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Include chains deeper than this are treated as cycles
const MAX_INCLUDE_DEPTH: usize = 8;

const INCLUDE_KEY: &str = "$include";

/// Load a YAML file with includes resolved and variables expanded
pub fn load_yaml_file<P: AsRef<Path>>(path: P) -> Result<YamlValue> {
    load_with_depth(path.as_ref(), 0)
}

/// Load a YAML file and deserialize it into `T`
pub fn load_yaml_config<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let value = load_yaml_file(path)?;
    serde_yaml::from_value(value).map_err(|e| {
        RouterError::ConfigLoad(format!("Failed to deserialize {:?}: {}", path, e))
    })
}

/// Parse YAML text into `T`, expanding variables
///
/// Includes are resolved against `base_dir` when given and rejected otherwise.
pub fn parse_yaml_config<T: DeserializeOwned>(content: &str, base_dir: Option<&Path>) -> Result<T> {
    let mut value: YamlValue = serde_yaml::from_str(content)
        .map_err(|e| RouterError::ConfigLoad(format!("Failed to parse YAML: {}", e)))?;

    match base_dir {
        Some(dir) => process_includes(&mut value, dir, 0)?,
        None if contains_include(&value) => {
            return Err(RouterError::ConfigLoad(
                "$include requires a base directory".to_string(),
            ))
        }
        None => {}
    }
    expand_variables(&mut value);

    serde_yaml::from_value(value)
        .map_err(|e| RouterError::ConfigLoad(format!("Failed to deserialize configuration: {}", e)))
}

fn load_with_depth(path: &Path, depth: usize) -> Result<YamlValue> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(RouterError::ConfigLoad(format!(
            "Include depth exceeded at {:?}; check for include cycles",
            path
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| RouterError::ConfigLoad(format!("Failed to read {:?}: {}", path, e)))?;

    let mut value: YamlValue = serde_yaml::from_str(&content)
        .map_err(|e| RouterError::ConfigLoad(format!("Failed to parse {:?}: {}", path, e)))?;

    let base_dir = path
        .parent()
        .ok_or_else(|| RouterError::ConfigLoad(format!("Invalid file path {:?}", path)))?;

    process_includes(&mut value, base_dir, depth)?;
    expand_variables(&mut value);

    Ok(value)
}

fn process_includes(value: &mut YamlValue, base_dir: &Path, depth: usize) -> Result<()> {
    match value {
        YamlValue::Mapping(map) => {
            let include_key = YamlValue::String(INCLUDE_KEY.to_string());
            if let Some(target) = map.remove(&include_key) {
                let YamlValue::String(relative) = target else {
                    return Err(RouterError::ConfigLoad(
                        "$include must be a string path".to_string(),
                    ));
                };

                let mut included = load_with_depth(&base_dir.join(relative), depth + 1)?;
                let mut overrides = YamlValue::Mapping(std::mem::take(map));
                process_includes(&mut overrides, base_dir, depth)?;
                deep_merge(&mut included, &overrides);
                *value = included;
                return Ok(());
            }

            for (_, v) in map.iter_mut() {
                process_includes(v, base_dir, depth)?;
            }
        }
        YamlValue::Sequence(seq) => {
            for item in seq.iter_mut() {
                process_includes(item, base_dir, depth)?;
            }
        }
        _ => {}
    }

    Ok(())
}

fn contains_include(value: &YamlValue) -> bool {
    match value {
        YamlValue::Mapping(map) => map.iter().any(|(k, v)| {
            k.as_str() == Some(INCLUDE_KEY) || contains_include(v)
        }),
        YamlValue::Sequence(seq) => seq.iter().any(contains_include),
        _ => false,
    }
}

fn expand_variables(value: &mut YamlValue) {
    match value {
        YamlValue::String(s) => {
            if let Some(expanded) = expand_env_in_string(s) {
                *s = expanded;
            }
        }
        YamlValue::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                expand_variables(v);
            }
        }
        YamlValue::Sequence(seq) => {
            for item in seq.iter_mut() {
                expand_variables(item);
            }
        }
        _ => {}
    }
}

fn env_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::([^}]*))?\}").ok())
        .as_ref()
}

/// Expand `${VAR}` and `${VAR:default}`; `None` when nothing to expand
fn expand_env_in_string(s: &str) -> Option<String> {
    if !s.contains("${") {
        return None;
    }

    let expanded = env_pattern()?.replace_all(s, |caps: &regex::Captures<'_>| {
        let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        env::var(&caps[1]).unwrap_or_else(|_| default_value.to_string())
    });

    Some(expanded.into_owned())
}

/// Merge `other` into `base`
///
/// Mappings merge key by key; any other value in `other` replaces `base`.
pub fn deep_merge(base: &mut YamlValue, other: &YamlValue) {
    match (base, other) {
        (YamlValue::Mapping(base_map), YamlValue::Mapping(other_map)) => {
            for (key, other_value) in other_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, other_value),
                    None => {
                        base_map.insert(key.clone(), other_value.clone());
                    }
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}
