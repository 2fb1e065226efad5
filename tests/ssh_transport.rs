//! SSH transport against a fake `ssh` binary.
//!
//! The fake logs its arguments and runs the remote command string in a
//! local shell, with `$HOME` pointed at a temp directory. No network access.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use convoy::application::{RemoteSession, SessionOptions};
use convoy::domain::ports::{Transport, TransportError};
use convoy::domain::value_objects::ContentHash;
use convoy::infrastructure::{LocalFs, SshTransport};
use convoy::{ErrorKind, Target};
use tempfile::{tempdir, TempDir};

const T: Duration = Duration::from_secs(10);

struct FakeSsh {
    dir: TempDir,
    program: PathBuf,
}

impl FakeSsh {
    fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    fn log(&self) -> String {
        fs::read_to_string(self.dir.path().join("ssh.log")).unwrap_or_default()
    }

    fn transport(&self) -> SshTransport {
        SshTransport::new().with_program(&self.program)
    }
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Fake that executes the remote command locally
fn fake_ssh() -> FakeSsh {
    let dir = tempdir().unwrap();
    let home = dir.path().join("home");
    fs::create_dir_all(&home).unwrap();
    let program = dir.path().join("ssh");
    write_script(
        &program,
        &format!(
            r#"#!/bin/sh
for last; do :; done
echo "$@" >> "{log}"
cd "{home}"
HOME="{home}" exec sh -c "$last"
"#,
            log = dir.path().join("ssh.log").display(),
            home = home.display()
        ),
    );
    FakeSsh { dir, program }
}

/// Fake that fails like `ssh` itself does, with exit status 255
fn failing_ssh(stderr: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let program = dir.path().join("ssh");
    write_script(
        &program,
        &format!("#!/bin/sh\necho '{}' >&2\nexit 255\n", stderr),
    );
    (dir, program)
}

#[test]
fn connect_passes_batch_mode_port_and_destination() {
    let fake = fake_ssh();
    let target = Target::new("web-1", "ops", 2222);

    let mut conn = fake.transport().connect(&target, T).unwrap();
    let out = conn.exec("echo hello", None, T).unwrap();
    assert_eq!(out.exit_code, Some(0));
    assert_eq!(out.stdout, "hello\n");

    let log = fake.log();
    assert!(log.contains("BatchMode=yes"), "{log}");
    assert!(log.contains("-p 2222"), "{log}");
    assert!(log.contains("ops@web-1"), "{log}");
    assert!(log.contains("sh -lc 'echo hello'"), "{log}");
}

#[test]
fn file_operations_run_as_remote_commands() {
    let fake = fake_ssh();
    let mut conn = fake
        .transport()
        .connect(&Target::new("web-1", "ops", 22), T)
        .unwrap();

    let path = fake.home().join("app/it's here.txt");
    let path = path.to_str().unwrap();
    conn.write(path, b"payload", T).unwrap();
    assert_eq!(conn.read(path, T).unwrap(), b"payload");
    assert_eq!(conn.size(path, T).unwrap(), 7);
    if let Some(hash) = conn.checksum(path, T).unwrap() {
        assert_eq!(hash, ContentHash::from_bytes(b"payload"));
    }

    let leftovers: Vec<_> = fs::read_dir(fake.home().join("app"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn missing_remote_file_is_not_found() {
    let fake = fake_ssh();
    let mut conn = fake
        .transport()
        .connect(&Target::new("web-1", "ops", 22), T)
        .unwrap();

    let missing = fake.home().join("missing.txt");
    assert!(matches!(
        conn.read(missing.to_str().unwrap(), T),
        Err(TransportError::NotFound(_))
    ));
}

#[test]
fn permission_denied_is_authentication_failure() {
    let (_dir, program) = failing_ssh("ops@web-1: Permission denied (publickey).");
    let transport = SshTransport::new().with_program(&program);

    let result = transport.connect(&Target::new("web-1", "ops", 22), T);
    assert!(matches!(result, Err(TransportError::AuthenticationRejected(_))));
}

#[test]
fn refused_connection_is_unreachable() {
    let (_dir, program) = failing_ssh("ssh: connect to host web-1 port 22: Connection refused");
    let transport = SshTransport::new().with_program(&program);

    let result = transport.connect(&Target::new("web-1", "ops", 22), T);
    assert!(matches!(result, Err(TransportError::Unreachable(_))));
}

#[test]
fn missing_client_binary_is_a_connection_error() {
    let dir = tempdir().unwrap();
    let transport = SshTransport::new().with_program(dir.path().join("no-such-ssh"));

    let mut session = RemoteSession::new(
        Target::new("web-1", "ops", 22),
        Arc::new(transport),
        Arc::new(LocalFs::new()),
        SessionOptions::default(),
    );
    assert_eq!(session.open().unwrap_err().kind(), ErrorKind::Connection);
}

#[test]
fn session_expands_tilde_with_remote_home() {
    let fake = fake_ssh();
    let mut session = RemoteSession::connect(
        Target::new("web-1", "ops", 22),
        Arc::new(fake.transport()),
        Arc::new(LocalFs::new()),
        SessionOptions::default(),
    )
    .unwrap();

    session.write_file("~/app/REVISION", b"v1\n").unwrap();
    assert_eq!(
        fs::read_to_string(fake.home().join("app/REVISION")).unwrap(),
        "v1\n"
    );
    assert_eq!(session.read_file("~/app/REVISION").unwrap(), "v1\n");

    let log = fake.log();
    assert!(log.contains("echo $HOME"), "{log}");
    assert!(!log.contains("'~/app"), "tilde must not reach the remote quoted: {log}");
}
