//! Remote Session
//!
//! Wraps one authenticated connection to one target. A session moves
//! through `Created -> Open -> Closed`; data operations are only valid while
//! it is open. The session owns its connection exclusively and closes it on
//! every exit path, including drop.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::domain::entities::Step;
use crate::domain::ports::{Connection, ExecOutput, FileSystem, FsError, Transport, TransportError};
use crate::domain::value_objects::{ContentHash, Target, Timeouts};
use crate::error::{ConvoyError, ConvoyResult};

/// Exit status and captured streams of a remote command
pub type CommandOutput = ExecOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Open,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "not open yet",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Per-session behavior knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub timeouts: Timeouts,
    /// Compare SHA-256 on confirmed uploads, on top of the size check
    pub verify_checksum: bool,
}

pub struct RemoteSession {
    target: Target,
    transport: Arc<dyn Transport>,
    fs: Arc<dyn FileSystem>,
    options: SessionOptions,
    state: SessionState,
    connection: Option<Box<dyn Connection>>,
    /// Remote `$HOME`, fetched on first `~` path
    home: Option<String>,
}

impl RemoteSession {
    pub fn new(
        target: Target,
        transport: Arc<dyn Transport>,
        fs: Arc<dyn FileSystem>,
        options: SessionOptions,
    ) -> Self {
        Self {
            target,
            transport,
            fs,
            options,
            state: SessionState::Created,
            connection: None,
            home: None,
        }
    }

    /// Create and open in one go
    pub fn connect(
        target: Target,
        transport: Arc<dyn Transport>,
        fs: Arc<dyn FileSystem>,
        options: SessionOptions,
    ) -> ConvoyResult<Self> {
        let mut session = Self::new(target, transport, fs, options);
        session.open()?;
        Ok(session)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Establish the channel. Opening an open session is a no-op; a closed
    /// session can never be reopened.
    pub fn open(&mut self) -> ConvoyResult<()> {
        match self.state {
            SessionState::Open => return Ok(()),
            SessionState::Closed => return Err(self.closed_error()),
            SessionState::Created => {}
        }

        let connection = self
            .transport
            .connect(&self.target, self.options.timeouts.connect)
            .map_err(|err| match err {
                // anything short of a live channel counts as a connection failure here
                TransportError::NotFound(message) | TransportError::Io { message, .. } => {
                    ConvoyError::Connection {
                        target: self.target.id(),
                        message,
                    }
                }
                other => transport_error(&self.target, other),
            })?;
        self.connection = Some(connection);
        self.state = SessionState::Open;
        Ok(())
    }

    /// Run `command` in the remote login shell and wait for it to finish.
    ///
    /// A non-zero exit is not an error here; see [`Self::execute`].
    pub fn run(&mut self, command: &str) -> ConvoyResult<CommandOutput> {
        let timeout = self.options.timeouts.command;
        let result = self.connection()?.exec(command, None, timeout);
        result.map_err(|e| transport_error(&self.target, e))
    }

    /// Full content of a remote text file
    pub fn read_file(&mut self, path: &str) -> ConvoyResult<String> {
        let path = self.expand_path(path)?;
        let bytes = self.read_remote(&path)?;
        String::from_utf8(bytes).map_err(|_| ConvoyError::RemoteIo {
            path,
            message: "content is not valid UTF-8".to_string(),
        })
    }

    /// Create or fully replace a remote file
    pub fn write_file(&mut self, path: &str, data: &[u8]) -> ConvoyResult<()> {
        let path = self.expand_path(path)?;
        self.write_remote(&path, data)
    }

    /// Copy a local file to `remote`.
    ///
    /// With `confirm`, the remote copy is re-queried afterwards: its size must
    /// match, and with checksum verification on so must its SHA-256.
    pub fn upload(&mut self, local: &Path, remote: &str, confirm: bool) -> ConvoyResult<()> {
        self.ensure_open()?;
        if !self.fs.exists(local) {
            return Err(local_error(FsError::NotFound(local.to_path_buf())));
        }
        let content = self.fs.read(local).map_err(local_error)?;
        let remote = self.expand_path(remote)?;
        self.write_remote(&remote, &content)?;
        if confirm {
            self.verify_transfer(&remote, &content)?;
        }
        Ok(())
    }

    /// Copy a remote file to `local`, creating or overwriting it
    pub fn download(&mut self, remote: &str, local: &Path) -> ConvoyResult<()> {
        let remote = self.expand_path(remote)?;
        let content = self.read_remote(&remote)?;
        self.fs.write(local, &content).map_err(local_error)
    }

    /// Remote working directory
    pub fn cwd(&mut self) -> ConvoyResult<String> {
        let output = self.run("pwd")?;
        let cwd = output.stdout.trim();
        if !output.success() || cwd.is_empty() {
            return Err(command_error("pwd", output));
        }
        Ok(cwd.to_string())
    }

    /// Release the channel; safe to call repeatedly
    pub fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.state = SessionState::Closed;
    }

    /// Interpret one step on this session.
    ///
    /// Returns captured output for commands that printed something.
    pub fn execute(&mut self, step: &Step) -> ConvoyResult<Option<String>> {
        match step {
            Step::RunCommand { command } => {
                let output = self.run(command)?;
                if !output.success() {
                    return Err(command_error(command, output));
                }
                let stdout = output.stdout.trim_end();
                Ok((!stdout.is_empty()).then(|| stdout.to_string()))
            }
            Step::PutFile {
                local,
                remote,
                confirm,
            } => self.upload(local, remote, *confirm).map(|_| None),
            Step::GetFile { remote, local } => self.download(remote, local).map(|_| None),
            Step::WriteFile { remote, data } => {
                self.write_file(remote, data.as_bytes()).map(|_| None)
            }
        }
    }

    fn verify_transfer(&mut self, path: &str, content: &[u8]) -> ConvoyResult<()> {
        let timeout = self.options.timeouts.transfer;
        let result = self.connection()?.size(path, timeout);
        let remote_size = result.map_err(|e| transport_error(&self.target, e))?;
        let local_size = content.len() as u64;
        if remote_size != local_size {
            return Err(ConvoyError::TransferVerification {
                path: path.to_string(),
                message: format!(
                    "remote size {} does not match local size {}",
                    remote_size, local_size
                ),
            });
        }

        if !self.options.verify_checksum {
            return Ok(());
        }
        let result = self.connection()?.checksum(path, timeout);
        let Some(remote_hash) = result.map_err(|e| transport_error(&self.target, e))? else {
            return Ok(());
        };
        let local_hash = ContentHash::from_bytes(content);
        if remote_hash != local_hash {
            return Err(ConvoyError::TransferVerification {
                path: path.to_string(),
                message: format!("checksum {} does not match local {}", remote_hash, local_hash),
            });
        }
        Ok(())
    }

    fn read_remote(&mut self, path: &str) -> ConvoyResult<Vec<u8>> {
        let timeout = self.options.timeouts.transfer;
        let result = self.connection()?.read(path, timeout);
        result.map_err(|e| transport_error(&self.target, e))
    }

    fn write_remote(&mut self, path: &str, data: &[u8]) -> ConvoyResult<()> {
        let timeout = self.options.timeouts.transfer;
        let result = self.connection()?.write(path, data, timeout);
        result.map_err(|e| transport_error(&self.target, e))
    }

    /// Expand a leading `~` with the remote `$HOME`
    fn expand_path(&mut self, path: &str) -> ConvoyResult<String> {
        self.ensure_open()?;
        let rest = match path.strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return Ok(path.to_string()),
        };
        let home = self.remote_home()?;
        Ok(format!("{}{}", home.trim_end_matches('/'), rest))
    }

    fn remote_home(&mut self) -> ConvoyResult<String> {
        if let Some(home) = &self.home {
            return Ok(home.clone());
        }
        let output = self.run("echo $HOME")?;
        let home = output.stdout.trim().to_string();
        if !output.success() || home.is_empty() {
            return Err(ConvoyError::RemoteIo {
                path: "~".to_string(),
                message: "cannot determine remote home directory".to_string(),
            });
        }
        self.home = Some(home.clone());
        Ok(home)
    }

    fn ensure_open(&self) -> ConvoyResult<()> {
        match self.state {
            SessionState::Open => Ok(()),
            _ => Err(self.closed_error()),
        }
    }

    fn connection(&mut self) -> ConvoyResult<&mut Box<dyn Connection>> {
        self.ensure_open()?;
        let state = self.state;
        let target = self.target.id();
        self.connection
            .as_mut()
            .ok_or_else(|| ConvoyError::SessionClosed {
                target,
                state: state.to_string(),
            })
    }

    fn closed_error(&self) -> ConvoyError {
        ConvoyError::SessionClosed {
            target: self.target.id(),
            state: self.state.to_string(),
        }
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSession")
            .field("target", &self.target)
            .field("transport", &self.transport.name())
            .field("state", &self.state)
            .finish()
    }
}

/// Attach target context to a transport failure
pub(crate) fn transport_error(target: &Target, err: TransportError) -> ConvoyError {
    match err {
        TransportError::Unreachable(message) => ConvoyError::Connection {
            target: target.id(),
            message,
        },
        TransportError::AuthenticationRejected(message) => ConvoyError::Authentication {
            target: target.id(),
            message,
        },
        TransportError::NotFound(path) => ConvoyError::RemoteIo {
            path,
            message: "no such file".to_string(),
        },
        TransportError::Io { path, message } => ConvoyError::RemoteIo { path, message },
        TransportError::Timeout { operation, after } => ConvoyError::Timeout {
            operation: format!("{} on {}", operation, target.id()),
            after,
        },
    }
}

fn local_error(err: FsError) -> ConvoyError {
    ConvoyError::LocalIo {
        path: err.path().to_path_buf(),
        message: err.to_string(),
    }
}

fn command_error(command: &str, output: CommandOutput) -> ConvoyError {
    ConvoyError::CommandExecution {
        command: command.to_string(),
        exit_code: output.exit_code,
        stderr: output.stderr.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fs::LocalFs;
    use crate::infrastructure::transport::MemoryTransport;
    use std::time::Duration;

    fn session(transport: MemoryTransport) -> RemoteSession {
        RemoteSession::new(
            Target::new("web-1", "deploy", 22),
            Arc::new(transport),
            Arc::new(LocalFs::new()),
            SessionOptions::default(),
        )
    }

    #[test]
    fn data_operations_require_open_session() {
        let mut session = session(MemoryTransport::new());
        assert_eq!(session.state(), SessionState::Created);
        assert!(matches!(
            session.run("true"),
            Err(ConvoyError::SessionClosed { .. })
        ));

        session.open().unwrap();
        assert_eq!(session.state(), SessionState::Open);
        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);

        assert!(matches!(
            session.read_file("/etc/hostname"),
            Err(ConvoyError::SessionClosed { .. })
        ));
        assert!(session.open().is_err());
    }

    #[test]
    fn open_maps_unreachable_to_connection_error() {
        let mut session = session(MemoryTransport::new().unreachable("web-1"));
        let err = session.open().unwrap_err();
        assert!(matches!(err, ConvoyError::Connection { .. }));
        assert_eq!(session.state(), SessionState::Created);
    }

    #[test]
    fn open_maps_rejected_credentials() {
        let mut session = session(MemoryTransport::new().reject_credentials("web-1"));
        assert!(matches!(
            session.open(),
            Err(ConvoyError::Authentication { .. })
        ));
    }

    #[test]
    fn tilde_paths_use_remote_home() {
        let transport = MemoryTransport::new();
        let mut session = session(transport.clone());
        session.open().unwrap();

        session.write_file("~/app/REVISION", b"v1\n").unwrap();
        assert_eq!(
            transport.file("web-1", "/home/deploy/app/REVISION"),
            Some(b"v1\n".to_vec())
        );
        // home is looked up once
        session.read_file("~/app/REVISION").unwrap();
        let lookups = transport
            .commands("web-1")
            .iter()
            .filter(|c| c.as_str() == "echo $HOME")
            .count();
        assert_eq!(lookups, 1);
    }

    #[test]
    fn execute_run_non_zero_exit_is_command_error() {
        let mut session = session(MemoryTransport::new().fail_command("web-1", "npm test", 3));
        session.open().unwrap();

        let err = session.execute(&Step::run("npm test")).unwrap_err();
        match err {
            ConvoyError::CommandExecution { exit_code, .. } => assert_eq!(exit_code, Some(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn command_timeout_is_reported() {
        let mut session = RemoteSession::new(
            Target::new("web-1", "deploy", 22),
            Arc::new(MemoryTransport::new().hang_command("web-1", "sleep 600")),
            Arc::new(LocalFs::new()),
            SessionOptions {
                timeouts: Timeouts {
                    command: Duration::from_secs(1),
                    ..Timeouts::default()
                },
                verify_checksum: false,
            },
        );
        session.open().unwrap();
        assert!(matches!(
            session.run("sleep 600"),
            Err(ConvoyError::Timeout { .. })
        ));
    }

    fn verifying_session(transport: MemoryTransport, verify_checksum: bool) -> RemoteSession {
        let mut session = RemoteSession::new(
            Target::new("web-1", "deploy", 22),
            Arc::new(transport),
            Arc::new(LocalFs::new()),
            SessionOptions {
                verify_checksum,
                ..SessionOptions::default()
            },
        );
        session.open().unwrap();
        session
    }

    fn archive(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("build.tar.gz");
        std::fs::write(&path, b"archive bytes").unwrap();
        path
    }

    #[test]
    fn corrupted_upload_fails_checksum_verification() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = verifying_session(MemoryTransport::new().corrupt_uploads("web-1"), true);

        let err = session
            .upload(&archive(&dir), "/srv/app/build.tar.gz", true)
            .unwrap_err();
        match err {
            ConvoyError::TransferVerification { path, message } => {
                assert_eq!(path, "/srv/app/build.tar.gz");
                assert!(message.contains("checksum"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupted_upload_passes_size_only_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = verifying_session(MemoryTransport::new().corrupt_uploads("web-1"), false);

        session
            .upload(&archive(&dir), "/srv/app/build.tar.gz", true)
            .unwrap();
    }

    #[test]
    fn checksum_is_skipped_when_remote_cannot_hash() {
        let dir = tempfile::tempdir().unwrap();
        let transport = MemoryTransport::new()
            .corrupt_uploads("web-1")
            .without_checksum_tool("web-1");
        let mut session = verifying_session(transport, true);

        let step = Step::put(archive(&dir), "/srv/app/build.tar.gz", true);
        assert_eq!(session.execute(&step).unwrap(), None);
    }

    #[test]
    fn intact_upload_passes_checksum_verification() {
        let dir = tempfile::tempdir().unwrap();
        let transport = MemoryTransport::new();
        let mut session = verifying_session(transport.clone(), true);

        session
            .upload(&archive(&dir), "/srv/app/build.tar.gz", true)
            .unwrap();
        assert_eq!(
            transport.file("web-1", "/srv/app/build.tar.gz"),
            Some(b"archive bytes".to_vec())
        );
    }
}
