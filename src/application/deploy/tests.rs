//! Deploy Use Case Tests

use super::*;
use crate::config::ConfigValue;
use crate::domain::entities::{Step, TargetStatus};
use crate::domain::ports::{DeployEvent, DeployEventSink};
use crate::error::{ConvoyError, ErrorKind};
use crate::infrastructure::{LocalFs, MemoryTransport};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn raw(toml_src: &str) -> ConfigValue {
    toml::from_str(toml_src).unwrap()
}

const WEB_CONFIG: &str = r#"
project_name = "shop"
branch = "release"
targets = ["web-1", "ops@web-2:2222"]

[deployment]
preset = "web"
base_dir = "/srv/shop"
archive = "dist/shop.tar.gz"
"#;

struct RecordingEventSink {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingEventSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn events(&self) -> Vec<DeployEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DeployEventSink for RecordingEventSink {
    fn on_event(&self, event: DeployEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// === prepare_deployment ===

#[test]
fn prepare_renders_web_preset() {
    let prepared = prepare_deployment(&raw(WEB_CONFIG), &DeployOptions::new("/work/shop")).unwrap();

    assert_eq!(prepared.plan.preset, "web");
    assert_eq!(prepared.plan.len(), 5);
    assert_eq!(prepared.plan.steps[0], Step::run("mkdir -p /srv/shop/current"));
    assert_eq!(
        prepared.plan.steps[1],
        Step::put("/work/shop/dist/shop.tar.gz", "/srv/shop/build.tar.gz", true)
    );
    assert_eq!(
        prepared.plan.steps[4],
        Step::write("/srv/shop/REVISION", "shop@release\n")
    );

    let ids: Vec<String> = prepared.targets.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["deploy@web-1", "ops@web-2"]);
    assert_eq!(prepared.targets[1].port, 2222);
}

#[test]
fn prepare_unknown_preset_is_fatal() {
    let mut config = raw(WEB_CONFIG);
    config.set_path("deployment.preset", "X".into());
    // an unrelated malformed key does not mask the preset error
    config.set_path("port", "twenty-two".into());

    let err = prepare_deployment(&config, &DeployOptions::new(".")).unwrap_err();
    assert!(matches!(err, ConvoyError::UnknownPreset { ref name, .. } if name == "X"));
    assert_eq!(err.kind(), ErrorKind::UnknownPreset);
}

#[test]
fn prepare_rejects_malformed_config() {
    let mut config = raw(WEB_CONFIG);
    config.set_path("port", "twenty-two".into());

    let err = prepare_deployment(&config, &DeployOptions::new(".")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigValidation);
    assert!(err.to_string().contains("'port'"));
}

#[test]
fn prepare_requires_targets() {
    let config = raw("[deployment]\npreset = \"remote-source\"");
    let err = prepare_deployment(&config, &DeployOptions::new(".")).unwrap_err();
    assert!(err.to_string().contains("no targets configured"));
}

#[test]
fn prepare_cli_overrides_win() {
    let options = DeployOptions::new(".")
        .with_preset("remote-source")
        .with_targets(["app@db-1"])
        .with_concurrency(1);
    let prepared = prepare_deployment(&raw(WEB_CONFIG), &options).unwrap();

    assert_eq!(prepared.plan.preset, "remote-source");
    assert_eq!(prepared.plan.len(), 3);
    assert_eq!(prepared.config.concurrency(), 1);
    assert_eq!(prepared.targets.len(), 1);
    assert_eq!(prepared.targets[0].id(), "app@db-1");
}

#[test]
fn prepare_keeps_absolute_archive_path() {
    let mut config = raw(WEB_CONFIG);
    config.set_path("deployment.archive", "/builds/shop.tar.gz".into());
    let prepared = prepare_deployment(&config, &DeployOptions::new("/work/shop")).unwrap();

    match &prepared.plan.steps[1] {
        Step::PutFile { local, .. } => assert_eq!(local, Path::new("/builds/shop.tar.gz")),
        other => panic!("expected put step, got {:?}", other),
    }
}

// === DeployUseCase ===

#[test]
fn execute_deploys_every_target() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("dist")).unwrap();
    fs::write(dir.path().join("dist/shop.tar.gz"), b"archive-bytes").unwrap();

    let prepared = prepare_deployment(&raw(WEB_CONFIG), &DeployOptions::new(dir.path())).unwrap();
    let transport = MemoryTransport::new();
    let events = RecordingEventSink::new();

    let report = DeployUseCase::new(Arc::new(transport.clone()), Arc::new(LocalFs::new()))
        .with_events(events.clone())
        .execute(&prepared);

    assert!(report.success);
    for host in ["web-1", "web-2"] {
        assert_eq!(
            transport.file(host, "/srv/shop/build.tar.gz"),
            Some(b"archive-bytes".to_vec())
        );
        assert_eq!(
            transport.file(host, "/srv/shop/REVISION"),
            Some(b"shop@release\n".to_vec())
        );
        assert_eq!(transport.open_connections(host), 0);
    }

    let events = events.events();
    assert!(matches!(
        events.first(),
        Some(DeployEvent::Started {
            target_count: 2,
            step_count: 5,
            ..
        })
    ));
    assert!(matches!(
        events.last(),
        Some(DeployEvent::Completed { success: true, .. })
    ));
}

#[test]
fn execute_reports_missing_archive_per_target() {
    let dir = tempdir().unwrap();
    let prepared = prepare_deployment(&raw(WEB_CONFIG), &DeployOptions::new(dir.path())).unwrap();
    let transport = MemoryTransport::new();

    let report = DeployUseCase::new(Arc::new(transport.clone()), Arc::new(LocalFs::new()))
        .execute(&prepared);

    assert!(!report.success);
    for outcome in report.targets.values() {
        assert_eq!(outcome.status, TargetStatus::Failed);
        let failed = outcome.failed_step().unwrap();
        assert_eq!(failed.index, 1);
        assert_eq!(failed.error().unwrap().kind, ErrorKind::LocalIo);
    }
    // the tar step never ran
    assert!(!transport
        .commands("web-1")
        .iter()
        .any(|c| c.starts_with("tar ")));
}
