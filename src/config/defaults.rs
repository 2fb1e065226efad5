//! Built-in configuration defaults
//!
//! Every key the resolver or a preset template reads has an entry here.
//! The table is built once per process and never mutated.

use std::sync::LazyLock;

use super::value::ConfigValue;

pub const DEFAULT_USER: &str = "deploy";
pub const DEFAULT_PORT: i64 = 22;
pub const DEFAULT_PRESET: &str = "web";
pub const DEFAULT_TRANSPORT: &str = "ssh";
pub const DEFAULT_CONCURRENCY: i64 = 4;

static DEFAULT_CONFIG: LazyLock<ConfigValue> = LazyLock::new(|| {
    let mut config = ConfigValue::empty_map();
    for (key, value) in default_entries() {
        config.set_path(key, value);
    }
    config
});

fn default_entries() -> Vec<(&'static str, ConfigValue)> {
    vec![
        ("project_name", "".into()),
        ("user", DEFAULT_USER.into()),
        ("port", ConfigValue::Integer(DEFAULT_PORT)),
        ("identity_file", "".into()),
        ("branch", "main".into()),
        ("repository_url", "".into()),
        ("targets", ConfigValue::List(Vec::new())),
        ("deployment.preset", DEFAULT_PRESET.into()),
        ("deployment.transport", DEFAULT_TRANSPORT.into()),
        ("deployment.local_root", "".into()),
        ("deployment.base_dir", "~/app".into()),
        ("deployment.archive", "build.tar.gz".into()),
        ("deployment.concurrency", ConfigValue::Integer(DEFAULT_CONCURRENCY)),
        ("deployment.verify_checksum", false.into()),
        ("timeouts.connect", ConfigValue::Integer(10)),
        ("timeouts.command", ConfigValue::Integer(300)),
        ("timeouts.transfer", ConfigValue::Integer(120)),
        ("scripts.install", "npm install".into()),
        ("scripts.build", "npm run build".into()),
        ("scripts.reload", "true".into()),
    ]
}

/// The process-wide default configuration tree
pub fn default_config() -> &'static ConfigValue {
    &DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_core_keys() {
        let config = default_config();
        assert_eq!(config.get_path("user"), Some(&ConfigValue::from("deploy")));
        assert_eq!(config.get_path("port"), Some(&ConfigValue::Integer(22)));
        assert_eq!(
            config.get_path("deployment.preset"),
            Some(&ConfigValue::from("web"))
        );
    }

    #[test]
    fn defaults_are_stable_across_calls() {
        assert!(std::ptr::eq(default_config(), default_config()));
    }

    #[test]
    fn nested_sections_are_tables() {
        let config = default_config();
        for section in ["deployment", "timeouts", "scripts"] {
            assert!(
                config.get_path(section).and_then(|v| v.as_map()).is_some(),
                "{section} should be a table"
            );
        }
    }
}
