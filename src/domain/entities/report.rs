//! Deployment report entity
//!
//! Records, per target, which steps ran and how each ended. The report is
//! plain data: it serializes to JSON and parses back to an equal value.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::step::Step;
use crate::domain::value_objects::Target;
use crate::error::{ConvoyError, ErrorKind};

/// Error as stored in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRecord {
    pub fn cancelled() -> Self {
        Self::from(&ConvoyError::Cancelled)
    }
}

impl From<&ConvoyError> for ErrorRecord {
    fn from(err: &ConvoyError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// How a single step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Failed {
        error: ErrorRecord,
    },
}

/// Outcome of one step on one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Position in the preset, starting at 0
    pub index: usize,
    pub step: Step,
    pub status: StepStatus,
}

impl StepResult {
    pub fn succeeded(index: usize, step: Step, output: Option<String>) -> Self {
        Self {
            index,
            step,
            status: StepStatus::Succeeded { output },
        }
    }

    pub fn failed(index: usize, step: Step, err: &ConvoyError) -> Self {
        Self {
            index,
            step,
            status: StepStatus::Failed { error: err.into() },
        }
    }

    /// Human-readable form of the executed step
    pub fn description(&self) -> String {
        self.step.to_string()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, StepStatus::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&ErrorRecord> {
        match &self.status {
            StepStatus::Failed { error } => Some(error),
            StepStatus::Succeeded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Succeeded,
    Failed,
    Cancelled,
}

/// Everything that happened on one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target: Target,
    pub status: TargetStatus,
    /// Steps attempted, in order; stops at the first failure
    pub steps: Vec<StepResult>,
    /// Why the target did not succeed (step failure, connection or cancellation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
}

impl TargetOutcome {
    /// Outcome after the step loop ran; failed iff the last step failed
    pub fn finished(target: Target, steps: Vec<StepResult>) -> Self {
        let error = steps.last().and_then(StepResult::error).cloned();
        let status = if error.is_some() {
            TargetStatus::Failed
        } else {
            TargetStatus::Succeeded
        };
        Self {
            target,
            status,
            steps,
            error,
        }
    }

    /// Session could not be opened; zero steps executed
    pub fn unreachable(target: Target, err: &ConvoyError) -> Self {
        Self {
            target,
            status: TargetStatus::Failed,
            steps: Vec::new(),
            error: Some(err.into()),
        }
    }

    /// Interrupted (or never started) because the deployment was cancelled
    pub fn cancelled(target: Target, steps: Vec<StepResult>) -> Self {
        Self {
            target,
            status: TargetStatus::Cancelled,
            steps,
            error: Some(ErrorRecord::cancelled()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TargetStatus::Succeeded
    }

    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.is_success())
    }
}

/// Per-target outcomes of one deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub preset: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Keyed by target identifier (`user@host`)
    pub targets: BTreeMap<String, TargetOutcome>,
    /// True iff every target succeeded
    pub success: bool,
}

impl DeploymentReport {
    pub fn new(
        preset: impl Into<String>,
        started_at: DateTime<Utc>,
        outcomes: impl IntoIterator<Item = TargetOutcome>,
    ) -> Self {
        let targets: BTreeMap<String, TargetOutcome> = outcomes
            .into_iter()
            .map(|outcome| (outcome.target.id(), outcome))
            .collect();
        let success = targets.values().all(TargetOutcome::is_success);
        Self {
            preset: preset.into(),
            started_at,
            finished_at: Utc::now(),
            targets,
            success,
        }
    }

    pub fn outcome(&self, target_id: &str) -> Option<&TargetOutcome> {
        self.targets.get(target_id)
    }

    pub fn summary(&self) -> Summary {
        Summary::from(self)
    }
}

/// Overall verdict: true iff every target outcome succeeded
pub fn summarize(report: &DeploymentReport) -> bool {
    report.targets.values().all(TargetOutcome::is_success)
}

/// Target counts by status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl From<&DeploymentReport> for Summary {
    fn from(report: &DeploymentReport) -> Self {
        report
            .targets
            .values()
            .fold(Summary::default(), |mut acc, outcome| {
                acc.total += 1;
                match outcome.status {
                    TargetStatus::Succeeded => acc.succeeded += 1,
                    TargetStatus::Failed => acc.failed += 1,
                    TargetStatus::Cancelled => acc.cancelled += 1,
                }
                acc
            })
    }
}
