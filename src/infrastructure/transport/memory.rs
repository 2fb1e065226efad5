//! In-memory Transport
//!
//! Simulated hosts with files, a command log and injectable faults. Hosts
//! spring into existence on first connect; clones share state, so a test
//! keeps one handle for inspection and hands another to the code under test.
//!
//! Commands are not interpreted beyond a few shell idioms sessions rely on
//! (`echo`, `pwd`, `echo $HOME`). Every other command succeeds silently
//! unless a fault is registered for it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::domain::ports::{Connection, ExecOutput, Transport, TransportError, TransportResult};
use crate::domain::value_objects::{ContentHash, Target};

#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    hosts: HashMap<String, MemoryHost>,
    unreachable: HashSet<String>,
    rejected: HashSet<String>,
    /// (host, command) -> exit code
    failing: HashMap<(String, String), i32>,
    /// (host, command) -> how long the command runs
    delays: HashMap<(String, String), Duration>,
    /// hosts that drop the last byte of every upload
    truncating: HashSet<String>,
    /// hosts that flip the last byte of every upload, keeping its length
    corrupting: HashSet<String>,
    /// hosts with neither `sha256sum` nor `shasum`
    no_checksum: HashSet<String>,
}

#[derive(Debug, Default)]
struct MemoryHost {
    files: BTreeMap<String, Vec<u8>>,
    commands: Vec<String>,
    connects: usize,
    open: usize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connecting to `host` fails with a connection error
    pub fn unreachable(self, host: &str) -> Self {
        self.lock().unreachable.insert(host.to_string());
        self
    }

    /// Connecting to `host` fails with rejected credentials
    pub fn reject_credentials(self, host: &str) -> Self {
        self.lock().rejected.insert(host.to_string());
        self
    }

    /// `command` exits with `exit_code` on `host`
    pub fn fail_command(self, host: &str, command: &str, exit_code: i32) -> Self {
        self.lock()
            .failing
            .insert((host.to_string(), command.to_string()), exit_code);
        self
    }

    /// `command` takes `delay` to finish on `host`
    pub fn delay_command(self, host: &str, command: &str, delay: Duration) -> Self {
        self.lock()
            .delays
            .insert((host.to_string(), command.to_string()), delay);
        self
    }

    /// `command` never finishes on `host`; it runs into its timeout
    pub fn hang_command(self, host: &str, command: &str) -> Self {
        self.delay_command(host, command, Duration::MAX)
    }

    /// Uploads to `host` lose their last byte
    pub fn truncate_uploads(self, host: &str) -> Self {
        self.lock().truncating.insert(host.to_string());
        self
    }

    /// Uploads to `host` keep their length but get their last byte flipped
    pub fn corrupt_uploads(self, host: &str) -> Self {
        self.lock().corrupting.insert(host.to_string());
        self
    }

    /// `host` cannot compute checksums
    pub fn without_checksum_tool(self, host: &str) -> Self {
        self.lock().no_checksum.insert(host.to_string());
        self
    }

    /// Seed a file on `host`
    pub fn put_file(&self, host: &str, path: &str, content: impl Into<Vec<u8>>) {
        self.lock()
            .hosts
            .entry(host.to_string())
            .or_default()
            .files
            .insert(path.to_string(), content.into());
    }

    pub fn file(&self, host: &str, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .hosts
            .get(host)
            .and_then(|h| h.files.get(path).cloned())
    }

    /// Commands run on `host`, in order
    pub fn commands(&self, host: &str) -> Vec<String> {
        self.lock()
            .hosts
            .get(host)
            .map(|h| h.commands.clone())
            .unwrap_or_default()
    }

    /// Successful connects to `host`
    pub fn connects(&self, host: &str) -> usize {
        self.lock().hosts.get(host).map_or(0, |h| h.connects)
    }

    /// Connections to `host` not closed yet
    pub fn open_connections(&self, host: &str) -> usize {
        self.lock().hosts.get(host).map_or(0, |h| h.open)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn connect(&self, target: &Target, _timeout: Duration) -> TransportResult<Box<dyn Connection>> {
        let mut state = self.lock();
        if state.unreachable.contains(&target.host) {
            return Err(TransportError::Unreachable(format!(
                "ssh: connect to host {} port {}: No route to host",
                target.host, target.port
            )));
        }
        if state.rejected.contains(&target.host) {
            return Err(TransportError::AuthenticationRejected(format!(
                "{}: Permission denied (publickey)",
                target.id()
            )));
        }
        let host = state.hosts.entry(target.host.clone()).or_default();
        host.connects += 1;
        host.open += 1;

        Ok(Box::new(MemoryConnection {
            state: self.clone(),
            host: target.host.clone(),
            home: format!("/home/{}", target.user),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    state: MemoryTransport,
    host: String,
    home: String,
    closed: bool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> TransportResult<()> {
        if self.closed {
            Err(TransportError::Unreachable("connection closed".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_host<T>(&self, f: impl FnOnce(&mut MemoryHost) -> T) -> T {
        let mut state = self.state.lock();
        f(state.hosts.entry(self.host.clone()).or_default())
    }
}

impl Connection for MemoryConnection {
    fn exec(
        &mut self,
        command: &str,
        _stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> TransportResult<ExecOutput> {
        self.ensure_open()?;
        self.with_host(|h| h.commands.push(command.to_string()));

        let key = (self.host.clone(), command.to_string());
        let (delay, failure) = {
            let state = self.state.lock();
            (state.delays.get(&key).copied(), state.failing.get(&key).copied())
        };

        if let Some(delay) = delay {
            if delay >= timeout {
                thread::sleep(timeout);
                return Err(TransportError::Timeout {
                    operation: format!("command `{}`", command),
                    after: timeout,
                });
            }
            thread::sleep(delay);
        }

        if let Some(exit_code) = failure {
            return Ok(ExecOutput {
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr: format!("{}: failed", command),
            });
        }

        let stdout = match command.trim() {
            "echo $HOME" | "pwd" => format!("{}\n", self.home),
            other => match other.strip_prefix("echo ") {
                Some(text) => format!("{}\n", text),
                None => String::new(),
            },
        };
        Ok(ExecOutput {
            exit_code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }

    fn read(&mut self, path: &str, _timeout: Duration) -> TransportResult<Vec<u8>> {
        self.ensure_open()?;
        self.with_host(|h| h.files.get(path).cloned())
            .ok_or_else(|| TransportError::NotFound(path.to_string()))
    }

    fn write(&mut self, path: &str, content: &[u8], _timeout: Duration) -> TransportResult<()> {
        self.ensure_open()?;
        let (truncating, corrupting) = {
            let state = self.state.lock();
            (
                state.truncating.contains(&self.host),
                state.corrupting.contains(&self.host),
            )
        };
        let mut stored = content.to_vec();
        if truncating {
            stored.pop();
        } else if corrupting {
            if let Some(last) = stored.last_mut() {
                *last ^= 0xff;
            }
        }
        self.with_host(|h| h.files.insert(path.to_string(), stored));
        Ok(())
    }

    fn size(&mut self, path: &str, timeout: Duration) -> TransportResult<u64> {
        self.read(path, timeout).map(|c| c.len() as u64)
    }

    fn checksum(&mut self, path: &str, timeout: Duration) -> TransportResult<Option<ContentHash>> {
        let content = self.read(path, timeout)?;
        if self.state.lock().no_checksum.contains(&self.host) {
            return Ok(None);
        }
        Ok(Some(ContentHash::from_bytes(&content)))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.with_host(|h| h.open = h.open.saturating_sub(1));
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}
