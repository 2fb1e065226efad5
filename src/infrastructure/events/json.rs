//! JSON Event Sink
//!
//! Outputs deploy events as NDJSON for CI/automation consumption.

use crate::domain::ports::{DeployEvent, DeployEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer (for testing)
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        let json = match event {
            DeployEvent::Started {
                preset,
                target_count,
                step_count,
                workers,
            } => {
                serde_json::json!({
                    "event": "start",
                    "command": "deploy",
                    "preset": preset,
                    "target_count": target_count,
                    "step_count": step_count,
                    "workers": workers,
                })
            }

            DeployEvent::TargetStarted { target } => {
                serde_json::json!({
                    "event": "target_start",
                    "command": "deploy",
                    "target": target,
                })
            }

            DeployEvent::Connected { target } => {
                serde_json::json!({
                    "event": "connected",
                    "command": "deploy",
                    "target": target,
                })
            }

            DeployEvent::StepStarted {
                target,
                index,
                description,
            } => {
                serde_json::json!({
                    "event": "step_start",
                    "command": "deploy",
                    "target": target,
                    "index": index,
                    "step": description,
                })
            }

            DeployEvent::StepSucceeded {
                target,
                index,
                output,
            } => {
                serde_json::json!({
                    "event": "step_ok",
                    "command": "deploy",
                    "target": target,
                    "index": index,
                    "output": output,
                })
            }

            DeployEvent::StepFailed {
                target,
                index,
                error,
            } => {
                serde_json::json!({
                    "event": "step_error",
                    "command": "deploy",
                    "target": target,
                    "index": index,
                    "kind": error.kind,
                    "error": error.message,
                })
            }

            DeployEvent::TargetFinished {
                target,
                status,
                error,
            } => {
                serde_json::json!({
                    "event": "target_complete",
                    "command": "deploy",
                    "target": target,
                    "status": status,
                    "error": error,
                })
            }

            DeployEvent::Completed { summary, success } => {
                let status = if success {
                    "success"
                } else if summary.succeeded > 0 {
                    "partial"
                } else {
                    "failure"
                };
                serde_json::json!({
                    "event": "complete",
                    "command": "deploy",
                    "status": status,
                    "total": summary.total,
                    "succeeded": summary.succeeded,
                    "failed": summary.failed,
                    "cancelled": summary.cancelled,
                })
            }
        };

        self.write_event(json);
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}
