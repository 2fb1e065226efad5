//! Deploy Use Case
//!
//! Runs a prepared deployment through the fan-out executor. Transport,
//! filesystem and event sink are injected, so the same flow runs over ssh,
//! a local shell or in-memory hosts.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::application::executor::{ExecutorOptions, FanOutExecutor};
use crate::domain::entities::DeploymentReport;
use crate::domain::ports::{DeployEventSink, FileSystem, NoopEventSink, Transport};

use super::prepare::PreparedDeployment;

pub struct DeployUseCase {
    transport: Arc<dyn Transport>,
    fs: Arc<dyn FileSystem>,
    events: Arc<dyn DeployEventSink>,
    running: Arc<AtomicBool>,
}

impl DeployUseCase {
    pub fn new(transport: Arc<dyn Transport>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            transport,
            fs,
            events: Arc::new(NoopEventSink),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn DeployEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Execute the deployment; per-target failures end up in the report
    pub fn execute(&self, prepared: &PreparedDeployment) -> DeploymentReport {
        let options = ExecutorOptions::from_config(&prepared.config);
        FanOutExecutor::new(Arc::clone(&self.transport), Arc::clone(&self.fs), options)
            .with_events(Arc::clone(&self.events))
            .with_cancellation(Arc::clone(&self.running))
            .deploy(&prepared.plan, &prepared.targets)
    }
}
