//! Use Case Factory
//!
//! Creates use cases with infrastructure dependencies wired up.
//! This is the dependency injection point for the application.

use std::path::Path;
use std::sync::Arc;

use crate::application::DeployUseCase;
use crate::config::{ResolvedConfig, TransportKind};
use crate::domain::ports::Transport;
use crate::infrastructure::{LocalFs, LocalTransport, SshTransport};

/// Transport selected by `deployment.transport`
///
/// The local transport is rooted at `deployment.local_root`, resolved
/// against `project_dir` when relative, or at `project_dir` itself.
pub fn create_transport(config: &ResolvedConfig, project_dir: &Path) -> Arc<dyn Transport> {
    match config.transport() {
        TransportKind::Ssh => Arc::new(SshTransport::new()),
        TransportKind::Local => {
            let root = match config.local_root() {
                Some(root) => project_dir.join(root),
                None => project_dir.to_path_buf(),
            };
            Arc::new(LocalTransport::new(root))
        }
    }
}

/// Create a deploy use case with all dependencies wired up
pub fn create_deploy_use_case(config: &ResolvedConfig, project_dir: &Path) -> DeployUseCase {
    DeployUseCase::new(create_transport(config, project_dir), Arc::new(LocalFs::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, ConfigValue};

    #[test]
    fn default_transport_is_ssh() {
        let config = resolve(&ConfigValue::empty_map()).unwrap();
        assert_eq!(create_transport(&config, Path::new(".")).name(), "ssh");
    }

    #[test]
    fn local_transport_selected_by_config() {
        let raw: ConfigValue = toml::from_str("[deployment]\ntransport = \"local\"").unwrap();
        let config = resolve(&raw).unwrap();
        assert_eq!(create_transport(&config, Path::new(".")).name(), "local");
    }
}
