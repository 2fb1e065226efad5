//! Configuration module for Convoy
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (CONVOY_*)
//! 3. Project config (convoy.toml / convoy.yml / convoy.json)
//! 4. User config (~/.config/convoy/config.toml)
//! 5. Built-in defaults (lowest priority)
//!
//! Layers 2-4 are stacked by [`load_layered`] without validation; the
//! stacked tree is checked against the defaults by [`resolve`].

mod defaults;
mod loader;
mod resolver;
mod value;

pub use defaults::{
    default_config, DEFAULT_CONCURRENCY, DEFAULT_PORT, DEFAULT_PRESET, DEFAULT_TRANSPORT,
    DEFAULT_USER,
};
pub use loader::{
    discover, load_file, load_layered, parse_document, user_config_path, with_env_overrides,
    with_overrides_from, LoadedConfig, PROJECT_CONFIG_FILES,
};
pub use resolver::{get_deployment_preset, merge_raw, resolve, ResolvedConfig, TransportKind};
pub use value::{ConfigMap, ConfigValue};
