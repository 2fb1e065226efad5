//! SSH Transport
//!
//! Drives the system `ssh` client. Every operation is one `ssh` invocation
//! in batch mode, so host keys, agents and multiplexing come from the
//! user's ssh config. File operations are plain shell commands on the
//! remote side (`cat`, `mv -f`, `wc -c`, `sha256sum`).

use std::ffi::OsString;
use std::process::Command;
use std::time::Duration;

use super::process::{run_with_timeout, ProcessOutput};
use crate::domain::ports::{Connection, ExecOutput, Transport, TransportError, TransportResult};
use crate::domain::value_objects::{ContentHash, Target};

/// Exit status `ssh` itself uses for connection-level failures
const SSH_FAILURE: i32 = 255;

/// Transport backed by the system `ssh` binary
#[derive(Debug, Clone)]
pub struct SshTransport {
    program: OsString,
    extra_options: Vec<String>,
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SshTransport {
    pub fn new() -> Self {
        Self {
            program: OsString::from("ssh"),
            extra_options: Vec::new(),
        }
    }

    /// Use a different client binary
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Extra `-o` options, e.g. `StrictHostKeyChecking=accept-new`
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.extra_options.push(option.into());
        self
    }

    fn args(&self, target: &Target, connect_timeout: Duration) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            format!("ConnectTimeout={}", connect_timeout.as_secs().max(1)).into(),
        ];
        for option in &self.extra_options {
            args.push("-o".into());
            args.push(option.into());
        }
        args.push("-p".into());
        args.push(target.port.to_string().into());
        if let Some(identity) = &target.identity_file {
            args.push("-i".into());
            args.push(identity.clone().into_os_string());
        }
        args.push(target.id().into());
        args
    }
}

impl Transport for SshTransport {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn connect(&self, target: &Target, timeout: Duration) -> TransportResult<Box<dyn Connection>> {
        let mut connection = SshConnection {
            program: self.program.clone(),
            args: self.args(target, timeout),
            closed: false,
        };
        // authenticates and proves the remote shell works
        let check = connection.invoke("true", None, timeout, "connect")?;
        if check.exit_code != Some(0) {
            return Err(classify_failure(&check));
        }
        Ok(Box::new(connection))
    }
}

struct SshConnection {
    program: OsString,
    args: Vec<OsString>,
    closed: bool,
}

impl SshConnection {
    /// Run `script` through a remote login shell
    fn invoke(
        &mut self,
        script: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
        operation: &str,
    ) -> TransportResult<ProcessOutput> {
        if self.closed {
            return Err(TransportError::Unreachable("connection closed".to_string()));
        }
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(format!("sh -lc {}", shell_quote(script)));

        match run_with_timeout(command, stdin, timeout) {
            Ok(Some(output)) => Ok(output),
            Ok(None) => Err(TransportError::Timeout {
                operation: operation.to_string(),
                after: timeout,
            }),
            Err(err) => Err(TransportError::Unreachable(format!(
                "cannot run {}: {}",
                self.program.to_string_lossy(),
                err
            ))),
        }
    }

    /// Run a file operation; non-zero exits become path errors
    fn file_op(
        &mut self,
        path: &str,
        script: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
        operation: &str,
    ) -> TransportResult<ProcessOutput> {
        let output = self.invoke(script, stdin, timeout, operation)?;
        match output.exit_code {
            Some(0) => Ok(output),
            Some(SSH_FAILURE) => Err(classify_failure(&output)),
            _ => Err(path_error(path, &output)),
        }
    }
}

impl Connection for SshConnection {
    fn exec(
        &mut self,
        command: &str,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> TransportResult<ExecOutput> {
        let output = self.invoke(command, stdin, timeout, &format!("command `{}`", command))?;
        if output.exit_code == Some(SSH_FAILURE) && looks_like_ssh_error(&output.stderr_lossy()) {
            return Err(classify_failure(&output));
        }
        Ok(ExecOutput {
            exit_code: output.exit_code,
            stdout: output.stdout_lossy(),
            stderr: output.stderr_lossy(),
        })
    }

    fn read(&mut self, path: &str, timeout: Duration) -> TransportResult<Vec<u8>> {
        let script = format!("cat -- {}", shell_quote(path));
        let output = self.file_op(path, &script, None, timeout, &format!("read {}", path))?;
        Ok(output.stdout)
    }

    fn write(&mut self, path: &str, content: &[u8], timeout: Duration) -> TransportResult<()> {
        let quoted = shell_quote(path);
        let tmp = shell_quote(&format!("{}.convoy-tmp", path));
        // write to a sibling temp file, then rename over the target
        let script = format!(
            "mkdir -p \"$(dirname -- {p})\" && cat > {t} && mv -f {t} {p}",
            p = quoted,
            t = tmp
        );
        self.file_op(path, &script, Some(content), timeout, &format!("write {}", path))?;
        Ok(())
    }

    fn size(&mut self, path: &str, timeout: Duration) -> TransportResult<u64> {
        let script = format!("wc -c < {}", shell_quote(path));
        let output = self.file_op(path, &script, None, timeout, &format!("stat {}", path))?;
        let text = output.stdout_lossy();
        text.trim().parse::<u64>().map_err(|_| TransportError::Io {
            path: path.to_string(),
            message: format!("unexpected size output '{}'", text.trim()),
        })
    }

    fn checksum(&mut self, path: &str, timeout: Duration) -> TransportResult<Option<ContentHash>> {
        // sha256sum on Linux, shasum on macOS
        let p = shell_quote(path);
        let script = format!(
            "sha256sum {p} 2>/dev/null || shasum -a 256 {p} 2>/dev/null",
            p = p
        );
        let output = self.invoke(&script, None, timeout, &format!("checksum {}", path))?;
        match output.exit_code {
            Some(0) => Ok(ContentHash::from_sum_output(&output.stdout_lossy())),
            Some(SSH_FAILURE) if looks_like_ssh_error(&output.stderr_lossy()) => {
                Err(classify_failure(&output))
            }
            _ => Ok(None),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Quote a string for safe use in a POSIX shell command
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn looks_like_ssh_error(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.starts_with("ssh:")
        || lower.contains("permission denied")
        || lower.contains("connection refused")
        || lower.contains("connection closed")
        || lower.contains("connection timed out")
        || lower.contains("host key verification failed")
        || lower.contains("could not resolve hostname")
}

fn classify_failure(output: &ProcessOutput) -> TransportError {
    let stderr = output.stderr_lossy();
    let message = if stderr.is_empty() {
        format!("ssh exited with {:?}", output.exit_code)
    } else {
        stderr
    };
    if message.contains("Permission denied") {
        TransportError::AuthenticationRejected(message)
    } else {
        TransportError::Unreachable(message)
    }
}

fn path_error(path: &str, output: &ProcessOutput) -> TransportError {
    let stderr = output.stderr_lossy();
    if stderr.contains("No such file") {
        TransportError::NotFound(path.to_string())
    } else {
        TransportError::Io {
            path: path.to_string(),
            message: if stderr.is_empty() {
                format!("remote exit code {:?}", output.exit_code)
            } else {
                stderr
            },
        }
    }
}
