//! Configuration resolution
//!
//! Deep-merges a raw configuration tree over the built-in defaults and
//! validates recognized keys. The result is total over the default schema;
//! keys the defaults do not know about pass through untouched.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::{default_config, DEFAULT_PRESET};
use super::value::{ConfigMap, ConfigValue};
use crate::domain::value_objects::{Target, TargetDefaults, Timeouts};
use crate::error::{ConvoyError, ConvoyResult};

/// Which transport adapter reaches the targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// System `ssh` client
    #[default]
    Ssh,
    /// Local shell; the target host is only a label
    Local,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Local => "local",
        }
    }

    fn parse(value: &str) -> ConvoyResult<Self> {
        match value {
            "ssh" => Ok(Self::Ssh),
            "local" => Ok(Self::Local),
            other => Err(ConvoyError::invalid_config(
                "deployment.transport",
                format!("expected \"ssh\" or \"local\", found \"{}\"", other),
            )),
        }
    }
}

/// Fully populated, validated configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    tree: ConfigValue,
    user: String,
    port: u16,
    identity_file: Option<PathBuf>,
    preset: String,
    transport: TransportKind,
    local_root: Option<PathBuf>,
    concurrency: usize,
    verify_checksum: bool,
    timeouts: Timeouts,
}

impl ResolvedConfig {
    /// The merged tree, defaults included
    pub fn as_value(&self) -> &ConfigValue {
        &self.tree
    }

    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        self.tree.get_path(path)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn identity_file(&self) -> Option<&PathBuf> {
        self.identity_file.as_ref()
    }

    pub fn preset(&self) -> &str {
        &self.preset
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Root directory for the local transport; `None` means the project directory
    pub fn local_root(&self) -> Option<&PathBuf> {
        self.local_root.as_ref()
    }

    /// Worker pool size ceiling
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn verify_checksum(&self) -> bool {
        self.verify_checksum
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn target_defaults(&self) -> TargetDefaults {
        TargetDefaults {
            user: self.user.clone(),
            port: self.port,
            identity_file: self.identity_file.clone(),
        }
    }

    /// Targets from the `targets` key.
    ///
    /// Entries are `"[user@]host[:port]"` strings or tables with `host`,
    /// `user`, `port` and `identity_file`.
    pub fn targets(&self) -> ConvoyResult<Vec<Target>> {
        let defaults = self.target_defaults();
        let Some(entries) = self.tree.get_path("targets").and_then(ConfigValue::as_list) else {
            return Ok(Vec::new());
        };

        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| match entry {
                ConfigValue::String(spec) => Target::parse(spec, &defaults),
                ConfigValue::Map(table) => target_from_table(table, &defaults, i),
                other => Err(ConvoyError::invalid_config(
                    format!("targets[{}]", i),
                    format!("expected string or table, found {}", other.type_name()),
                )),
            })
            .collect()
    }
}

fn target_from_table(
    table: &ConfigMap,
    defaults: &TargetDefaults,
    index: usize,
) -> ConvoyResult<Target> {
    let key = |field: &str| format!("targets[{}].{}", index, field);

    let host = table_str(table, "host", index)?
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ConvoyError::invalid_config(key("host"), "missing host"))?;
    let user = table_str(table, "user", index)?.unwrap_or(&defaults.user);
    let port = match table.get("port") {
        None => defaults.port,
        Some(value) => port_from(value, &key("port"))?,
    };
    let identity_file = match table_str(table, "identity_file", index)? {
        Some(path) => non_empty_path(path),
        None => defaults.identity_file.clone(),
    };

    let mut target = Target::new(host, user, port);
    target.identity_file = identity_file;
    Ok(target)
}

fn table_str<'a>(table: &'a ConfigMap, field: &str, index: usize) -> ConvoyResult<Option<&'a str>> {
    match table.get(field) {
        None => Ok(None),
        Some(ConfigValue::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ConvoyError::invalid_config(
            format!("targets[{}].{}", index, field),
            format!("expected string, found {}", other.type_name()),
        )),
    }
}

/// Merge `raw` over the defaults and validate the result
pub fn resolve(raw: &ConfigValue) -> ConvoyResult<ResolvedConfig> {
    if raw.as_map().is_none() {
        return Err(ConvoyError::invalid_config(
            "<root>",
            format!("expected table, found {}", raw.type_name()),
        ));
    }
    let tree = merge_checked(default_config(), raw, "")?;
    typed(tree)
}

/// Preset name from raw (unresolved) input, falling back to the default
pub fn get_deployment_preset(raw: &ConfigValue) -> String {
    raw.get_path("deployment.preset")
        .and_then(ConfigValue::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_PRESET)
        .to_string()
}

/// Deep-merge two raw layers without validation; `overlay` wins per leaf
pub fn merge_raw(base: &ConfigValue, overlay: &ConfigValue) -> ConfigValue {
    match (base, overlay) {
        (ConfigValue::Map(base_map), ConfigValue::Map(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in overlay_map.iter().filter(|(_, v)| !v.is_null()) {
                let next = match merged.get(key) {
                    Some(existing) => merge_raw(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            ConfigValue::Map(merged)
        }
        (_, ConfigValue::Null) => base.clone(),
        _ => overlay.clone(),
    }
}

fn merge_checked(
    default: &ConfigValue,
    raw: &ConfigValue,
    path: &str,
) -> ConvoyResult<ConfigValue> {
    match (default, raw) {
        (ConfigValue::Map(default_map), ConfigValue::Map(raw_map)) => {
            let mut merged = ConfigMap::new();
            for (key, default_value) in default_map {
                let key_path = join_key(path, key);
                let value = match raw_map.get(key).filter(|v| !v.is_null()) {
                    Some(raw_value) => merge_checked(default_value, raw_value, &key_path)?,
                    None => default_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            for (key, raw_value) in raw_map {
                if !default_map.contains_key(key) && !raw_value.is_null() {
                    merged.insert(key.clone(), raw_value.clone());
                }
            }
            Ok(ConfigValue::Map(merged))
        }
        (ConfigValue::Float(_), ConfigValue::Integer(n)) => Ok(ConfigValue::Float(*n as f64)),
        (default, raw) if std::mem::discriminant(default) == std::mem::discriminant(raw) => {
            Ok(raw.clone())
        }
        (default, raw) => Err(ConvoyError::invalid_config(
            path,
            format!("expected {}, found {}", default.type_name(), raw.type_name()),
        )),
    }
}

fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn typed(tree: ConfigValue) -> ConvoyResult<ResolvedConfig> {
    let user = require_str(&tree, "user")?.to_string();
    if user.trim().is_empty() {
        return Err(ConvoyError::invalid_config("user", "must not be empty"));
    }
    let port = port_from(require(&tree, "port")?, "port")?;
    let identity_file = non_empty_path(require_str(&tree, "identity_file")?);

    let preset = require_str(&tree, "deployment.preset")?;
    let preset = if preset.trim().is_empty() {
        DEFAULT_PRESET.to_string()
    } else {
        preset.to_string()
    };
    let transport = TransportKind::parse(require_str(&tree, "deployment.transport")?)?;
    let local_root = non_empty_path(require_str(&tree, "deployment.local_root")?);
    let concurrency = positive(&tree, "deployment.concurrency")? as usize;
    let verify_checksum = require(&tree, "deployment.verify_checksum")?
        .as_bool()
        .unwrap_or(false);

    let timeouts = Timeouts {
        connect: Duration::from_secs(positive(&tree, "timeouts.connect")?),
        command: Duration::from_secs(positive(&tree, "timeouts.command")?),
        transfer: Duration::from_secs(positive(&tree, "timeouts.transfer")?),
    };

    Ok(ResolvedConfig {
        tree,
        user,
        port,
        identity_file,
        preset,
        transport,
        local_root,
        concurrency,
        verify_checksum,
        timeouts,
    })
}

fn require<'a>(tree: &'a ConfigValue, key: &str) -> ConvoyResult<&'a ConfigValue> {
    tree.get_path(key)
        .ok_or_else(|| ConvoyError::invalid_config(key, "missing value"))
}

fn require_str<'a>(tree: &'a ConfigValue, key: &str) -> ConvoyResult<&'a str> {
    let value = require(tree, key)?;
    value.as_str().ok_or_else(|| {
        ConvoyError::invalid_config(key, format!("expected string, found {}", value.type_name()))
    })
}

fn positive(tree: &ConfigValue, key: &str) -> ConvoyResult<u64> {
    let value = require(tree, key)?;
    match value.as_i64() {
        Some(n) if n >= 1 => Ok(n as u64),
        Some(n) => Err(ConvoyError::invalid_config(
            key,
            format!("must be at least 1, found {}", n),
        )),
        None => Err(ConvoyError::invalid_config(
            key,
            format!("expected integer, found {}", value.type_name()),
        )),
    }
}

fn port_from(value: &ConfigValue, key: &str) -> ConvoyResult<u16> {
    match value.as_i64() {
        Some(n) => u16::try_from(n)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                ConvoyError::invalid_config(key, format!("port {} is outside 1..=65535", n))
            }),
        None => Err(ConvoyError::invalid_config(
            key,
            format!("expected integer, found {}", value.type_name()),
        )),
    }
}

fn non_empty_path(path: &str) -> Option<PathBuf> {
    let path = path.trim();
    (!path.is_empty()).then(|| PathBuf::from(path))
}
