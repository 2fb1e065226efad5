//! Deploy Options
//!
//! Overrides given on the command line. They sit above every config layer.

use std::path::PathBuf;

use crate::config::ConfigValue;

/// Options for the deploy use case
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Base directory for relative local paths in steps
    pub project_dir: PathBuf,
    /// Preset to use instead of `deployment.preset`
    pub preset: Option<String>,
    /// `[user@]host[:port]` specs replacing the configured targets
    pub targets: Vec<String>,
    /// Worker pool ceiling instead of `deployment.concurrency`
    pub concurrency: Option<usize>,
}

impl DeployOptions {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Layer the overrides onto a raw config tree
    pub fn apply_to(&self, raw: &ConfigValue) -> ConfigValue {
        let mut raw = raw.clone();
        if let Some(preset) = &self.preset {
            raw.set_path("deployment.preset", ConfigValue::from(preset.as_str()));
        }
        if let Some(concurrency) = self.concurrency {
            let concurrency = i64::try_from(concurrency).unwrap_or(i64::MAX);
            raw.set_path("deployment.concurrency", ConfigValue::Integer(concurrency));
        }
        raw
    }
}
