//! Child process execution with a deadline
//!
//! Both output pipes are drained on their own threads while the parent
//! polls for exit, so a chatty child never blocks on a full pipe. The
//! deadline also bounds the drain: a background process that inherits the
//! pipes cannot keep the caller waiting past it.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exit status and raw streams of a finished child
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcessOutput {
    /// `None` when killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Spawn `command`, feed it `stdin` and wait up to `timeout`.
///
/// Returns `Ok(None)` if the deadline passed, either before the child
/// exited (it is killed then) or before its output pipes were closed.
pub(crate) fn run_with_timeout(
    mut command: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> io::Result<Option<ProcessOutput>> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;

    if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let data = data.to_vec();
        // detached: a child that exits early closes the pipe, its status tells the story
        thread::spawn(move || {
            let _ = pipe.write_all(&data);
        });
    }
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    };

    // readers still blocked after the deadline are left detached
    let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline))
    else {
        return Ok(None);
    };
    Ok(Some(ProcessOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    }))
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Stream content, or `None` if the pipe is still open at `deadline`
fn collect(stream: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<Vec<u8>> {
    let Some(rx) = stream else {
        return Some(Vec::new());
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_both_streams_and_exit_code() {
        let out = run_with_timeout(
            sh("echo out; echo err >&2; exit 3"),
            None,
            Duration::from_secs(10),
        )
        .unwrap()
        .unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout_lossy(), "out\n");
        assert_eq!(out.stderr_lossy(), "err");
    }

    #[test]
    fn feeds_stdin() {
        let out = run_with_timeout(sh("cat"), Some(b"payload"), Duration::from_secs(10))
            .unwrap()
            .unwrap();
        assert_eq!(out.stdout, b"payload");
    }

    #[test]
    fn drains_large_output() {
        let out = run_with_timeout(
            sh("i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done"),
            None,
            Duration::from_secs(30),
        )
        .unwrap()
        .unwrap();
        assert_eq!(out.stdout_lossy().lines().count(), 20000);
        assert!(out.stdout_lossy().ends_with("line-19999\n"));
    }

    #[test]
    fn kills_on_timeout() {
        let started = Instant::now();
        let out = run_with_timeout(sh("exec sleep 30"), None, Duration::from_millis(200)).unwrap();
        assert!(out.is_none());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn background_process_holding_pipes_hits_deadline() {
        let started = Instant::now();
        let out = run_with_timeout(sh("sleep 30 &"), None, Duration::from_millis(200)).unwrap();
        assert!(out.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn background_process_with_closed_pipes_is_not_waited_for() {
        let out = run_with_timeout(
            sh("sleep 30 >/dev/null 2>&1 & echo started"),
            None,
            Duration::from_secs(5),
        )
        .unwrap()
        .unwrap();
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(out.stdout_lossy(), "started\n");
    }
}
