//! Fan-out behavior against simulated hosts: failure isolation, fail-fast
//! within a target, verification, timeouts and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use convoy::application::{ExecutorOptions, FanOutExecutor, SessionOptions};
use convoy::domain::entities::{StepStatus, TargetStatus};
use convoy::domain::ports::{DeployEvent, DeployEventSink};
use convoy::domain::value_objects::Timeouts;
use convoy::infrastructure::{LocalFs, MemoryTransport};
use convoy::{summarize, DeploymentPlan, ErrorKind, Step, Target};
use tempfile::tempdir;

fn targets(hosts: &[&str]) -> Vec<Target> {
    hosts.iter().map(|h| Target::new(*h, "deploy", 22)).collect()
}

fn executor(transport: &MemoryTransport, concurrency: usize) -> FanOutExecutor {
    FanOutExecutor::new(
        Arc::new(transport.clone()),
        Arc::new(LocalFs::new()),
        ExecutorOptions {
            concurrency,
            session: SessionOptions::default(),
        },
    )
}

#[test]
fn one_unreachable_host_does_not_affect_the_rest() {
    let transport = MemoryTransport::new().unreachable("web-3");
    let plan = DeploymentPlan::new(
        "test",
        vec![Step::run("mkdir -p /srv/app"), Step::write("/srv/app/REVISION", "v1\n")],
    );
    let hosts = ["web-1", "web-2", "web-3", "web-4", "web-5"];

    let report = executor(&transport, 3).deploy(&plan, &targets(&hosts));

    assert_eq!(report.targets.len(), 5);
    assert!(!summarize(&report));
    let summary = report.summary();
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 1);

    let down = report.outcome("deploy@web-3").unwrap();
    assert_eq!(down.status, TargetStatus::Failed);
    assert!(down.steps.is_empty());
    assert_eq!(down.error.as_ref().unwrap().kind, ErrorKind::Connection);

    for host in ["web-1", "web-2", "web-4", "web-5"] {
        assert_eq!(transport.file(host, "/srv/app/REVISION"), Some(b"v1\n".to_vec()));
    }
}

#[test]
fn rejected_credentials_are_reported_as_authentication() {
    let transport = MemoryTransport::new().reject_credentials("web-2");
    let plan = DeploymentPlan::new("test", vec![Step::run("true")]);

    let report = executor(&transport, 2).deploy(&plan, &targets(&["web-1", "web-2"]));

    let outcome = report.outcome("deploy@web-2").unwrap();
    assert_eq!(outcome.error.as_ref().unwrap().kind, ErrorKind::Authentication);
    assert!(report.outcome("deploy@web-1").unwrap().is_success());
}

#[test]
fn failing_step_stops_its_target_only() {
    let transport = MemoryTransport::new().fail_command("web-1", "step-b", 2);
    let plan = DeploymentPlan::new(
        "test",
        vec![Step::run("step-a"), Step::run("step-b"), Step::run("step-c")],
    );

    let report = executor(&transport, 2).deploy(&plan, &targets(&["web-1", "web-2"]));

    let failed = report.outcome("deploy@web-1").unwrap();
    assert_eq!(failed.status, TargetStatus::Failed);
    assert_eq!(failed.steps.len(), 2);
    assert!(matches!(failed.steps[0].status, StepStatus::Succeeded { .. }));
    assert_eq!(failed.steps[1].error().unwrap().kind, ErrorKind::CommandExecution);
    assert_eq!(transport.commands("web-1"), vec!["step-a", "step-b"]);

    assert_eq!(transport.commands("web-2"), vec!["step-a", "step-b", "step-c"]);
    assert!(report.outcome("deploy@web-2").unwrap().is_success());
}

#[test]
fn truncated_upload_fails_verification() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("build.tar.gz");
    std::fs::write(&archive, b"0123456789").unwrap();

    let transport = MemoryTransport::new().truncate_uploads("web-2");
    let plan = DeploymentPlan::new(
        "test",
        vec![
            Step::put(&archive, "/srv/app/build.tar.gz", true),
            Step::run("tar -xzf /srv/app/build.tar.gz"),
        ],
    );

    let report = executor(&transport, 2).deploy(&plan, &targets(&["web-1", "web-2"]));

    assert!(report.outcome("deploy@web-1").unwrap().is_success());
    let bad = report.outcome("deploy@web-2").unwrap();
    let step = bad.failed_step().unwrap();
    assert_eq!(step.index, 0);
    assert_eq!(step.error().unwrap().kind, ErrorKind::TransferVerification);
    assert!(transport.commands("web-2").iter().all(|c| !c.starts_with("tar ")));
}

#[test]
fn hanging_command_times_out() {
    let transport = MemoryTransport::new().hang_command("web-1", "sleep forever");
    let plan = DeploymentPlan::new(
        "test",
        vec![Step::run("sleep forever"), Step::run("echo after")],
    );
    let exec = FanOutExecutor::new(
        Arc::new(transport.clone()),
        Arc::new(LocalFs::new()),
        ExecutorOptions {
            concurrency: 2,
            session: SessionOptions {
                timeouts: Timeouts {
                    command: Duration::from_millis(50),
                    ..Timeouts::default()
                },
                verify_checksum: false,
            },
        },
    );

    let report = exec.deploy(&plan, &targets(&["web-1", "web-2"]));

    let hung = report.outcome("deploy@web-1").unwrap();
    assert_eq!(hung.failed_step().unwrap().error().unwrap().kind, ErrorKind::Timeout);
    assert_eq!(hung.steps.len(), 1);
    assert!(report.outcome("deploy@web-2").unwrap().is_success());
    assert_eq!(transport.open_connections("web-1"), 0);
}

/// Clears the running flag once the first target finishes
struct CancelAfterFirst {
    running: Arc<AtomicBool>,
    finished: Mutex<Vec<(String, TargetStatus)>>,
}

impl DeployEventSink for CancelAfterFirst {
    fn on_event(&self, event: DeployEvent) {
        if let DeployEvent::TargetFinished { target, status, .. } = event {
            self.running.store(false, Ordering::SeqCst);
            self.finished.lock().unwrap().push((target, status));
        }
    }
}

#[test]
fn cancellation_stops_unstarted_targets() {
    let transport = MemoryTransport::new();
    let running = Arc::new(AtomicBool::new(true));
    let sink = Arc::new(CancelAfterFirst {
        running: running.clone(),
        finished: Mutex::new(Vec::new()),
    });
    let plan = DeploymentPlan::new("test", vec![Step::run("true")]);

    let report = executor(&transport, 1)
        .with_events(sink.clone())
        .with_cancellation(running)
        .deploy(&plan, &targets(&["a", "b", "c"]));

    assert!(!report.success);
    assert_eq!(report.outcome("deploy@a").unwrap().status, TargetStatus::Succeeded);
    for id in ["deploy@b", "deploy@c"] {
        let outcome = report.outcome(id).unwrap();
        assert_eq!(outcome.status, TargetStatus::Cancelled);
        assert_eq!(outcome.error.as_ref().unwrap().kind, ErrorKind::Cancelled);
    }
    assert_eq!(transport.connects("b"), 0);
    assert_eq!(transport.connects("c"), 0);

    // every target still gets exactly one finish event
    assert_eq!(sink.finished.lock().unwrap().len(), 3);
}

struct CancelAfterFirstStep {
    running: Arc<AtomicBool>,
}

impl DeployEventSink for CancelAfterFirstStep {
    fn on_event(&self, event: DeployEvent) {
        if let DeployEvent::StepSucceeded { .. } = event {
            self.running.store(false, Ordering::SeqCst);
        }
    }
}

#[test]
fn cancellation_between_steps_keeps_completed_steps() {
    let transport = MemoryTransport::new();
    let running = Arc::new(AtomicBool::new(true));
    let plan = DeploymentPlan::new(
        "test",
        vec![Step::run("step-a"), Step::run("step-b"), Step::run("step-c")],
    );

    let report = executor(&transport, 1)
        .with_events(Arc::new(CancelAfterFirstStep {
            running: running.clone(),
        }))
        .with_cancellation(running)
        .deploy(&plan, &targets(&["a", "b"]));

    let interrupted = report.outcome("deploy@a").unwrap();
    assert_eq!(interrupted.status, TargetStatus::Cancelled);
    assert_eq!(interrupted.steps.len(), 1);
    assert!(interrupted.steps[0].is_success());
    assert_eq!(interrupted.error.as_ref().unwrap().kind, ErrorKind::Cancelled);
    assert_eq!(transport.commands("a"), vec!["step-a".to_string()]);
    assert_eq!(transport.open_connections("a"), 0);

    let unstarted = report.outcome("deploy@b").unwrap();
    assert_eq!(unstarted.status, TargetStatus::Cancelled);
    assert!(unstarted.steps.is_empty());
    assert_eq!(transport.connects("b"), 0);
}

#[test]
fn every_connection_is_closed() {
    let transport = MemoryTransport::new().fail_command("h2", "deploy", 1);
    let plan = DeploymentPlan::new("test", vec![Step::run("deploy"), Step::run("reload")]);
    let hosts: Vec<String> = (0..12).map(|i| format!("h{}", i)).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();

    let report = executor(&transport, 4).deploy(&plan, &targets(&host_refs));

    assert_eq!(report.targets.len(), 12);
    for host in &host_refs {
        assert_eq!(transport.connects(host), 1, "{host}");
        assert_eq!(transport.open_connections(host), 0, "{host}");
    }
}
