//! Configuration loading
//!
//! Reads raw config documents and stacks the layers, lowest first:
//! user config, project config, `CONVOY_*` environment overrides. The
//! stacked raw tree is what [`super::resolve`] consumes.

use std::fs;
use std::path::{Path, PathBuf};

use super::resolver::merge_raw;
use super::value::ConfigValue;
use crate::error::{ConvoyError, ConvoyResult};

/// Project config file names, in lookup order
pub const PROJECT_CONFIG_FILES: &[&str] =
    &["convoy.toml", "convoy.yml", "convoy.yaml", "convoy.json"];

/// Environment variables mapped onto config keys
pub const ENV_OVERRIDES: &[(&str, &str, EnvKind)] = &[
    ("CONVOY_USER", "user", EnvKind::String),
    ("CONVOY_PORT", "port", EnvKind::Integer),
    ("CONVOY_PRESET", "deployment.preset", EnvKind::String),
    ("CONVOY_CONCURRENCY", "deployment.concurrency", EnvKind::Integer),
    ("CONVOY_TRANSPORT", "deployment.transport", EnvKind::String),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    String,
    Integer,
}

/// Raw layered configuration plus the files it came from
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub raw: ConfigValue,
    pub sources: Vec<PathBuf>,
}

/// Parse a config document, picking the format from the file extension
pub fn load_file(path: &Path) -> ConvoyResult<ConfigValue> {
    let content = fs::read_to_string(path).map_err(|e| ConvoyError::LocalIo {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_document(&content, path)
}

/// Parse `content` as TOML, YAML or JSON according to `path`'s extension
pub fn parse_document(content: &str, path: &Path) -> ConvoyResult<ConfigValue> {
    let parse_error = |message: String| ConvoyError::ConfigParse {
        file: path.to_path_buf(),
        message,
    };

    let value: ConfigValue = match path.extension().and_then(|e| e.to_str()) {
        Some("yml") | Some("yaml") => {
            if content.trim().is_empty() {
                ConfigValue::empty_map()
            } else {
                serde_yaml_ng::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
        }
        Some("json") => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        _ => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
    };

    let value = value.without_nulls();
    if value.as_map().is_none() {
        return Err(parse_error(format!(
            "top level must be a table, found {}",
            value.type_name()
        )));
    }
    Ok(value)
}

/// First project config file present in `project_dir`
pub fn discover(project_dir: &Path) -> Option<PathBuf> {
    PROJECT_CONFIG_FILES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

/// `$XDG_CONFIG_HOME/convoy/config.toml`, else `~/.config/convoy/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs_config_dir().map(|dir| dir.join("convoy").join("config.toml"))
}

/// Get XDG config directory
fn dirs_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
}

/// Stack user config, project config and environment overrides.
///
/// `explicit` must exist when given; otherwise the project config is
/// discovered in `project_dir` and may be absent.
pub fn load_layered(explicit: Option<&Path>, project_dir: &Path) -> ConvoyResult<LoadedConfig> {
    let mut loaded = LoadedConfig {
        raw: ConfigValue::empty_map(),
        sources: Vec::new(),
    };

    if let Some(user_config) = user_config_path().filter(|p| p.is_file()) {
        loaded.raw = merge_raw(&loaded.raw, &load_file(&user_config)?);
        loaded.sources.push(user_config);
    }

    let project_config = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ConvoyError::LocalIo {
                    path: path.to_path_buf(),
                    message: "config file not found".to_string(),
                });
            }
            Some(path.to_path_buf())
        }
        None => discover(project_dir),
    };
    if let Some(path) = project_config {
        loaded.raw = merge_raw(&loaded.raw, &load_file(&path)?);
        loaded.sources.push(path);
    }

    loaded.raw = with_env_overrides(loaded.raw)?;
    Ok(loaded)
}

/// Apply environment variable overrides (CONVOY_* prefix)
pub fn with_env_overrides(raw: ConfigValue) -> ConvoyResult<ConfigValue> {
    with_overrides_from(raw, |name| std::env::var(name).ok())
}

/// Same as [`with_env_overrides`] with an injectable variable lookup
pub fn with_overrides_from(
    mut raw: ConfigValue,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConvoyResult<ConfigValue> {
    for (var, key, kind) in ENV_OVERRIDES {
        let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let value = match kind {
            EnvKind::String => ConfigValue::String(value.trim().to_string()),
            EnvKind::Integer => {
                let n = value.trim().parse::<i64>().map_err(|_| {
                    ConvoyError::invalid_config(
                        *key,
                        format!("{} must be an integer, got '{}'", var, value),
                    )
                })?;
                ConfigValue::Integer(n)
            }
        };
        raw.set_path(key, value);
    }
    Ok(raw)
}
