//! Resultado de ejecutar (o saltar) un step.
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StepStatus;
use crate::errors::ProbeError;

/// Output capturado de un step, indexado por nombre/path de campo.
pub type Captured = IndexMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub captured: Captured,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeError>,
    /// Copiado del step por el runner; sólo los hard-fail cuentan para el
    /// estado global.
    pub hard_fail: bool,
    pub elapsed_ms: u64,
}

impl StepOutcome {
    pub fn pass(step: impl Into<String>, captured: Captured, message: impl Into<String>) -> Self {
        Self { step: step.into(),
               status: StepStatus::Pass,
               captured,
               message: message.into(),
               error: None,
               hard_fail: true,
               elapsed_ms: 0 }
    }

    pub fn fail(step: impl Into<String>, error: ProbeError) -> Self {
        let message = error.to_string();
        Self::fail_with(step, error, message)
    }

    pub fn fail_with(step: impl Into<String>, error: ProbeError, message: impl Into<String>) -> Self {
        Self { step: step.into(),
               status: StepStatus::Fail,
               captured: Captured::new(),
               message: message.into(),
               error: Some(error),
               hard_fail: true,
               elapsed_ms: 0 }
    }

    pub fn skipped(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self { step: step.into(),
               status: StepStatus::Skipped,
               captured: Captured::new(),
               message: message.into(),
               error: None,
               hard_fail: true,
               elapsed_ms: 0 }
    }

    /// Skip por dependencia: conserva el error tipado `DependencySkip`.
    pub fn dependency_skip(step: &str, dependency: &str) -> Self {
        let error = ProbeError::DependencySkip { step: step.to_string(),
                                                 dependency: dependency.to_string() };
        let mut o = Self::skipped(step, error.to_string());
        o.error = Some(error);
        o
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self
    }

    pub fn is_pass(&self) -> bool {
        self.status == StepStatus::Pass
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.captured.get(field)
    }
}
