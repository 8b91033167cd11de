//! Errores del core del harness.
//!
//! Ninguna variante se reintenta dentro del core: cada una termina capturada
//! en un `StepOutcome`. Sólo el fallo de un step de setup aborta el escenario.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ProbeError {
    #[error("registration of {role} failed with status {status}: {body}")]
    Registration { role: String, status: u16, body: String },
    #[error("authentication failed: {0}")] Authentication(String),
    #[error("contract violation: {0}")] ContractViolation(String),
    #[error("transport error: {0}")] Transport(String),
    #[error("no real-time delivery within deadline ({deadline_ms}ms on {topic})")]
    CorrelationTimeout { topic: String, deadline_ms: u64 },
    #[error("skipped: dependency '{dependency}' of '{step}' did not pass")]
    DependencySkip { step: String, dependency: String },
    #[error("template error: {0}")] Template(String),
    #[error("invalid scenario: {0}")] InvalidScenario(String),
    #[error("internal: {0}")] Internal(String),
}

impl ProbeError {
    /// Nombre estable de la variante (útil para reportes JSON y logs).
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Registration { .. } => "RegistrationError",
            ProbeError::Authentication(_) => "AuthenticationError",
            ProbeError::ContractViolation(_) => "ContractViolation",
            ProbeError::Transport(_) => "TransportError",
            ProbeError::CorrelationTimeout { .. } => "CorrelationTimeout",
            ProbeError::DependencySkip { .. } => "DependencySkip",
            ProbeError::Template(_) => "TemplateError",
            ProbeError::InvalidScenario(_) => "InvalidScenario",
            ProbeError::Internal(_) => "Internal",
        }
    }
}
