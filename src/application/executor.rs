//! Fan-Out Executor
//!
//! Runs one plan against many targets. A bounded pool of scoped worker
//! threads drains a shared queue of targets; each worker takes a target
//! through open, steps in order, close, before taking the next. Every target
//! owns a write-once slot, so the report is assembled without locking once
//! all workers have joined.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;

use chrono::Utc;

use super::session::{RemoteSession, SessionOptions};
use crate::config::ResolvedConfig;
use crate::domain::entities::{DeploymentPlan, DeploymentReport, StepResult, TargetOutcome};
use crate::domain::ports::{DeployEvent, DeployEventSink, FileSystem, NoopEventSink, Transport};
use crate::domain::value_objects::Target;

/// Worker pool and session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Upper bound on concurrently deployed targets
    pub concurrency: usize,
    pub session: SessionOptions,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            session: SessionOptions::default(),
        }
    }
}

impl ExecutorOptions {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            concurrency: config.concurrency(),
            session: SessionOptions {
                timeouts: config.timeouts(),
                verify_checksum: config.verify_checksum(),
            },
        }
    }
}

pub struct FanOutExecutor {
    transport: Arc<dyn Transport>,
    fs: Arc<dyn FileSystem>,
    options: ExecutorOptions,
    events: Arc<dyn DeployEventSink>,
    /// Cleared to cancel; checked before each target and each step
    running: Arc<AtomicBool>,
}

impl FanOutExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        fs: Arc<dyn FileSystem>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            transport,
            fs,
            options,
            events: Arc::new(NoopEventSink),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn DeployEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Share a running flag; storing `false` cancels the deployment
    pub fn with_cancellation(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Pool size for `targets` targets
    pub fn worker_count(&self, targets: usize) -> usize {
        self.options.concurrency.min(targets).max(1)
    }

    /// Deploy `plan` to every target and wait for all of them.
    ///
    /// Never fails as a whole: connection errors, step failures and
    /// cancellation are all recorded per target.
    pub fn deploy(&self, plan: &DeploymentPlan, targets: &[Target]) -> DeploymentReport {
        let started_at = Utc::now();
        let workers = self.worker_count(targets.len());

        self.events.on_event(DeployEvent::Started {
            preset: plan.preset.clone(),
            target_count: targets.len(),
            step_count: plan.len(),
            workers,
        });

        let queue: Mutex<VecDeque<usize>> = Mutex::new((0..targets.len()).collect());
        let slots: Vec<OnceLock<TargetOutcome>> = targets.iter().map(|_| OnceLock::new()).collect();

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| self.work(plan, targets, &queue, &slots));
            }
        });

        let outcomes: Vec<TargetOutcome> = targets
            .iter()
            .zip(slots)
            .map(|(target, slot)| {
                slot.into_inner().unwrap_or_else(|| {
                    // never picked up before cancellation
                    let outcome = TargetOutcome::cancelled(target.clone(), Vec::new());
                    self.emit_finished(&outcome);
                    outcome
                })
            })
            .collect();

        let report = DeploymentReport::new(plan.preset.clone(), started_at, outcomes);
        self.events.on_event(DeployEvent::Completed {
            summary: report.summary(),
            success: report.success,
        });
        report
    }

    fn work(
        &self,
        plan: &DeploymentPlan,
        targets: &[Target],
        queue: &Mutex<VecDeque<usize>>,
        slots: &[OnceLock<TargetOutcome>],
    ) {
        while self.is_running() {
            let Some(index) = next_target(queue) else {
                return;
            };
            let outcome = self.deploy_target(plan, &targets[index]);
            self.emit_finished(&outcome);
            // each index leaves the queue exactly once
            let _ = slots[index].set(outcome);
        }
    }

    fn deploy_target(&self, plan: &DeploymentPlan, target: &Target) -> TargetOutcome {
        let id = target.id();
        let detailed = self.events.wants_detailed_events();
        if detailed {
            self.events.on_event(DeployEvent::TargetStarted { target: id.clone() });
        }

        let mut session = RemoteSession::new(
            target.clone(),
            Arc::clone(&self.transport),
            Arc::clone(&self.fs),
            self.options.session,
        );
        if let Err(err) = session.open() {
            return TargetOutcome::unreachable(target.clone(), &err);
        }
        if detailed {
            self.events.on_event(DeployEvent::Connected { target: id.clone() });
        }

        let mut results = Vec::with_capacity(plan.len());
        for (index, step) in plan.steps.iter().enumerate() {
            if !self.is_running() {
                session.close();
                return TargetOutcome::cancelled(target.clone(), results);
            }
            if detailed {
                self.events.on_event(DeployEvent::StepStarted {
                    target: id.clone(),
                    index,
                    description: step.to_string(),
                });
            }

            match session.execute(step) {
                Ok(output) => {
                    if detailed {
                        self.events.on_event(DeployEvent::StepSucceeded {
                            target: id.clone(),
                            index,
                            output: output.clone(),
                        });
                    }
                    results.push(StepResult::succeeded(index, step.clone(), output));
                }
                Err(err) => {
                    if detailed {
                        self.events.on_event(DeployEvent::StepFailed {
                            target: id.clone(),
                            index,
                            error: (&err).into(),
                        });
                    }
                    results.push(StepResult::failed(index, step.clone(), &err));
                    break;
                }
            }
        }

        session.close();
        TargetOutcome::finished(target.clone(), results)
    }

    fn emit_finished(&self, outcome: &TargetOutcome) {
        self.events.on_event(DeployEvent::TargetFinished {
            target: outcome.target.id(),
            status: outcome.status,
            error: outcome.error.clone(),
        });
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn next_target(queue: &Mutex<VecDeque<usize>>) -> Option<usize> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}
