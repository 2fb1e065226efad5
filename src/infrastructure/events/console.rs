//! Console Event Sink
//!
//! Human-readable progress lines on stderr. Target lines are prefixed with
//! the target id because workers interleave.

use std::io::{self, Write};
use std::sync::Mutex;

use crossterm::style::Stylize;

use crate::domain::entities::TargetStatus;
use crate::domain::ports::{DeployEvent, DeployEventSink};

pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    color: bool,
    /// At 1 and above, step progress and command output are shown
    verbose: u8,
}

impl ConsoleEventSink {
    pub fn stderr(color: bool, verbose: u8) -> Self {
        Self::with_writer(io::stderr(), color, verbose)
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W, color: bool, verbose: u8) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            color,
            verbose,
        }
    }

    fn line(&self, text: String) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", text);
        }
    }

    fn green(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn yellow(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dark_grey().to_string()
        } else {
            text.to_string()
        }
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        match event {
            DeployEvent::Started {
                preset,
                target_count,
                step_count,
                workers,
            } => self.line(format!(
                "Deploying preset '{}' to {} target(s): {} step(s), {} worker(s)",
                preset, target_count, step_count, workers
            )),

            DeployEvent::TargetStarted { target } if self.verbose > 0 => {
                self.line(self.dim(&format!("[{}] connecting", target)))
            }

            DeployEvent::Connected { target } if self.verbose > 0 => {
                self.line(self.dim(&format!("[{}] connected", target)))
            }

            DeployEvent::StepStarted {
                target,
                index,
                description,
            } if self.verbose > 0 => {
                self.line(format!("[{}] step {}: {}", target, index + 1, description))
            }

            DeployEvent::StepSucceeded {
                target,
                output: Some(output),
                ..
            } if self.verbose > 0 => {
                for text in output.lines() {
                    self.line(self.dim(&format!("[{}]   {}", target, text)));
                }
            }

            DeployEvent::StepFailed {
                target,
                index,
                error,
            } => self.line(self.red(&format!(
                "[{}] step {} failed: {}",
                target,
                index + 1,
                error.message
            ))),

            DeployEvent::TargetFinished {
                target,
                status,
                error,
            } => {
                let text = match status {
                    TargetStatus::Succeeded => self.green(&format!("✓ {}", target)),
                    TargetStatus::Failed => self.red(&format!(
                        "✗ {} ({})",
                        target,
                        error.map(|e| e.kind.to_string()).unwrap_or_default()
                    )),
                    TargetStatus::Cancelled => self.yellow(&format!("○ {} cancelled", target)),
                };
                self.line(text);
            }

            DeployEvent::Completed { summary, .. } => self.line(format!(
                "{} target(s): {} succeeded, {} failed, {} cancelled",
                summary.total, summary.succeeded, summary.failed, summary.cancelled
            )),

            _ => {}
        }
    }
}
