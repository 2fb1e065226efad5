//! Deployment Target Value Object
//!
//! One remote account on one host. The identifier `user@host` is what
//! reports are keyed by, so it must be unique within a deployment.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConvoyError, ConvoyResult};

/// Fallback values for target fields not given explicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDefaults {
    pub user: String,
    pub port: u16,
    pub identity_file: Option<PathBuf>,
}

/// A (host, account, credential) triple to deploy to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub user: String,
    pub port: u16,
    /// Private key handed to the transport; `None` uses the agent/default keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
}

impl Target {
    pub fn new(host: impl Into<String>, user: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            port,
            identity_file: None,
        }
    }

    pub fn with_identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Parse `[user@]host[:port]`, filling gaps from `defaults`
    pub fn parse(spec: &str, defaults: &TargetDefaults) -> ConvoyResult<Self> {
        let spec = spec.trim();
        let invalid = |message: &str| {
            ConvoyError::invalid_config("targets", format!("'{}': {}", spec, message))
        };

        let (user, rest) = match spec.split_once('@') {
            Some((user, rest)) => {
                if user.is_empty() {
                    return Err(invalid("empty user before '@'"));
                }
                (user.to_string(), rest)
            }
            None => (defaults.user.clone(), spec),
        };

        let parse_port = |port: &str| {
            port.parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| invalid("port must be a number between 1 and 65535"))
        };

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            // IPv6 literal: [addr] or [addr]:port
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("missing ']' after IPv6 address"))?;
            let port = match after {
                "" => defaults.port,
                _ => match after.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => return Err(invalid("unexpected text after ']'")),
                },
            };
            (host, port)
        } else {
            match rest.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => {
                    return Err(invalid("IPv6 addresses must be written as [addr]:port"));
                }
                Some((host, port)) => (host, parse_port(port)?),
                None => (rest, defaults.port),
            }
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if host.contains(char::is_whitespace) || host.contains('@') {
            return Err(invalid("host contains invalid characters"));
        }

        Ok(Self {
            host: host.to_string(),
            user,
            port,
            identity_file: defaults.identity_file.clone(),
        })
    }

    /// Report key: `user@host`
    pub fn id(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}@[{}]:{}", self.user, self.host, self.port)
        } else {
            write!(f, "{}@{}:{}", self.user, self.host, self.port)
        }
    }
}

/// Reject empty target sets and duplicate identifiers
pub fn validate_targets(targets: &[Target]) -> ConvoyResult<()> {
    if targets.is_empty() {
        return Err(ConvoyError::invalid_config(
            "targets",
            "no targets configured; add `targets` to the config or pass --target",
        ));
    }

    let mut seen = HashSet::new();
    for target in targets {
        let id = target.id();
        if !seen.insert(id.clone()) {
            return Err(ConvoyError::invalid_config(
                "targets",
                format!("duplicate target '{}'", id),
            ));
        }
    }
    Ok(())
}
