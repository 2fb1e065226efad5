//! Local Transport
//!
//! Treats a directory on this machine as the remote account: commands run
//! in `sh -lc` with that directory as working directory and `$HOME`, and
//! relative paths resolve inside it. The target host is only a label.
//! Useful for staging deploys and for exercising sessions end to end.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use super::process::run_with_timeout;
use crate::domain::ports::{Connection, ExecOutput, Transport, TransportError, TransportResult};
use crate::domain::value_objects::{ContentHash, Target};
use crate::infrastructure::fs::atomic_write;

#[derive(Debug, Clone)]
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Transport for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    fn connect(
        &self,
        _target: &Target,
        _timeout: Duration,
    ) -> TransportResult<Box<dyn Connection>> {
        if !self.root.is_dir() {
            return Err(TransportError::Unreachable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(Box::new(LocalConnection {
            root: self.root.clone(),
            closed: false,
        }))
    }
}

struct LocalConnection {
    root: PathBuf,
    closed: bool,
}

impl LocalConnection {
    fn ensure_open(&self) -> TransportResult<()> {
        if self.closed {
            Err(TransportError::Unreachable("connection closed".to_string()))
        } else {
            Ok(())
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn io_error(path: &str, err: std::io::Error) -> TransportError {
    match err.kind() {
        std::io::ErrorKind::NotFound => TransportError::NotFound(path.to_string()),
        _ => TransportError::Io {
            path: path.to_string(),
            message: err.to_string(),
        },
    }
}

impl Connection for LocalConnection {
    fn exec(
        &mut self,
        command: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> TransportResult<ExecOutput> {
        self.ensure_open()?;
        let mut cmd = Command::new("sh");
        cmd.arg("-lc")
            .arg(command)
            .current_dir(&self.root)
            .env("HOME", &self.root);

        match run_with_timeout(cmd, stdin, timeout) {
            Ok(Some(output)) => Ok(ExecOutput {
                exit_code: output.exit_code,
                stdout: output.stdout_lossy(),
                stderr: output.stderr_lossy(),
            }),
            Ok(None) => Err(TransportError::Timeout {
                operation: format!("command `{}`", command),
                after: timeout,
            }),
            Err(err) => Err(TransportError::Unreachable(format!("cannot spawn sh: {}", err))),
        }
    }

    fn read(&mut self, path: &str, _timeout: Duration) -> TransportResult<Vec<u8>> {
        self.ensure_open()?;
        fs::read(self.resolve(path)).map_err(|e| io_error(path, e))
    }

    fn write(&mut self, path: &str, content: &[u8], _timeout: Duration) -> TransportResult<()> {
        self.ensure_open()?;
        atomic_write(&self.resolve(path), content).map_err(|e| TransportError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn size(&mut self, path: &str, _timeout: Duration) -> TransportResult<u64> {
        self.ensure_open()?;
        fs::metadata(self.resolve(path))
            .map(|m| m.len())
            .map_err(|e| io_error(path, e))
    }

    fn checksum(&mut self, path: &str, timeout: Duration) -> TransportResult<Option<ContentHash>> {
        let content = self.read(path, timeout)?;
        Ok(Some(ContentHash::from_bytes(&content)))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
