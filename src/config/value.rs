//! Untyped configuration tree
//!
//! Raw configuration documents (TOML, YAML or JSON) all deserialize into
//! [`ConfigValue`], so the resolver works on one shape regardless of format.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered mapping of keys to values
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A node in a configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
    /// YAML `~` or an empty value, JSON `null`; treated as an absent key
    Null,
}

impl ConfigValue {
    /// An empty mapping, the raw config of a project with no settings
    pub fn empty_map() -> Self {
        Self::Map(ConfigMap::new())
    }

    /// Name of the variant, used in validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "table",
            Self::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Drop null entries from tables and lists, recursively
    pub fn without_nulls(self) -> Self {
        match self {
            Self::Map(map) => Self::Map(
                map.into_iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, value)| (key, value.without_nulls()))
                    .collect(),
            ),
            Self::List(items) => Self::List(
                items
                    .into_iter()
                    .filter(|value| !value.is_null())
                    .map(Self::without_nulls)
                    .collect(),
            ),
            other => other,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is a leaf that can be rendered into a string
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_) | Self::Null)
    }

    /// Look up a dotted key path (`deployment.preset`)
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        path.split('.')
            .try_fold(self, |node, segment| node.as_map()?.get(segment))
    }

    /// Set a dotted key path, creating intermediate tables as needed.
    ///
    /// Existing non-table nodes on the way are replaced by tables.
    pub fn set_path(&mut self, path: &str, value: ConfigValue) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        let mut node = self;
        for segment in parents {
            node = node
                .ensure_map()
                .entry((*segment).to_string())
                .or_insert_with(Self::empty_map);
        }
        node.ensure_map().insert((*last).to_string(), value);
    }

    fn ensure_map(&mut self) -> &mut ConfigMap {
        if !matches!(self, Self::Map(_)) {
            *self = Self::empty_map();
        }
        match self {
            Self::Map(map) => map,
            _ => unreachable!("node was just replaced by a table"),
        }
    }
}

impl Default for ConfigValue {
    fn default() -> Self {
        Self::empty_map()
    }
}

impl fmt::Display for ConfigValue {
    /// Scalars render bare (no quotes) so they can be spliced into commands
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => f.write_str(s),
            Self::Null => Ok(()),
            Self::List(_) | Self::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        Self::Map(map)
    }
}
