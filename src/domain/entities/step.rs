//! Deployment step entity

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One deployment action, executed against a single remote session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Run a command in the remote login shell
    RunCommand { command: String },
    /// Upload a local file; `confirm` re-checks the remote copy afterwards
    PutFile {
        local: PathBuf,
        remote: String,
        #[serde(default)]
        confirm: bool,
    },
    /// Download a remote file to a local path
    GetFile { remote: String, local: PathBuf },
    /// Create or fully replace a remote file with `data`
    WriteFile { remote: String, data: String },
}

impl Step {
    pub fn run(command: impl Into<String>) -> Self {
        Self::RunCommand {
            command: command.into(),
        }
    }

    pub fn put(local: impl Into<PathBuf>, remote: impl Into<String>, confirm: bool) -> Self {
        Self::PutFile {
            local: local.into(),
            remote: remote.into(),
            confirm,
        }
    }

    pub fn get(remote: impl Into<String>, local: impl Into<PathBuf>) -> Self {
        Self::GetFile {
            remote: remote.into(),
            local: local.into(),
        }
    }

    pub fn write(remote: impl Into<String>, data: impl Into<String>) -> Self {
        Self::WriteFile {
            remote: remote.into(),
            data: data.into(),
        }
    }

    /// Short action name used in events and reports
    pub fn action(&self) -> &'static str {
        match self {
            Self::RunCommand { .. } => "run",
            Self::PutFile { .. } => "put",
            Self::GetFile { .. } => "get",
            Self::WriteFile { .. } => "write",
        }
    }

    /// Apply `f` to every text field, e.g. to render placeholders.
    ///
    /// Local paths are rendered through their lossy string form.
    pub fn try_map_text<E>(&self, mut f: impl FnMut(&str) -> Result<String, E>) -> Result<Self, E> {
        Ok(match self {
            Self::RunCommand { command } => Self::RunCommand {
                command: f(command)?,
            },
            Self::PutFile {
                local,
                remote,
                confirm,
            } => Self::PutFile {
                local: PathBuf::from(f(&local.to_string_lossy())?),
                remote: f(remote)?,
                confirm: *confirm,
            },
            Self::GetFile { remote, local } => Self::GetFile {
                remote: f(remote)?,
                local: PathBuf::from(f(&local.to_string_lossy())?),
            },
            Self::WriteFile { remote, data } => Self::WriteFile {
                remote: f(remote)?,
                data: f(data)?,
            },
        })
    }

    /// Anchor relative local paths at `base`; remote paths are untouched
    pub fn with_local_base(&self, base: &Path) -> Self {
        let anchor = |local: &PathBuf| {
            if local.is_absolute() {
                local.clone()
            } else {
                base.join(local)
            }
        };
        match self {
            Self::PutFile {
                local,
                remote,
                confirm,
            } => Self::PutFile {
                local: anchor(local),
                remote: remote.clone(),
                confirm: *confirm,
            },
            Self::GetFile { remote, local } => Self::GetFile {
                remote: remote.clone(),
                local: anchor(local),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunCommand { command } => write!(f, "run `{}`", command),
            Self::PutFile {
                local,
                remote,
                confirm,
            } => {
                write!(f, "put {} -> {}", local.display(), remote)?;
                if *confirm {
                    write!(f, " (confirm)")?;
                }
                Ok(())
            }
            Self::GetFile { remote, local } => {
                write!(f, "get {} -> {}", remote, local.display())
            }
            Self::WriteFile { remote, data } => {
                write!(f, "write {} ({} bytes)", remote, data.len())
            }
        }
    }
}
