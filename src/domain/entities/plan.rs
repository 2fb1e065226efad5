//! Deployment plan entity

use serde::Serialize;

use super::step::Step;

/// The rendered step list of one preset, ready to run against every target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentPlan {
    pub preset: String,
    pub steps: Vec<Step>,
}

impl DeploymentPlan {
    pub fn new(preset: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            preset: preset.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
