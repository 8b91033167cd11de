//! Eventos del journal de una ejecución.
//!
//! Cada `ScenarioRunner::run` emite eventos a un `EventStore` append-only.
//! El journal permite reconstruir qué pasó en la ejecución (orden de steps,
//! suscripciones abiertas y cerradas) sin depender del reporte.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::step::StepStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`.
    ScenarioStarted { scenario: String, definition_hash: String, step_count: usize },
    StepStarted { step_index: usize, step: String },
    StepFinished { step_index: usize, step: String, status: StepStatus, elapsed_ms: u64 },
    /// Step no ejecutado (dependencia o abort).
    StepSkipped { step_index: usize, step: String, reason: String },
    SubscriptionArmed { step: String, topic: String },
    SubscriptionClosed { step: String, topic: String },
    ScenarioCompleted { passed: bool },
    ScenarioAborted { step: String },
}

impl RunEventKind {
    /// Código corto para trazas compactas (`S`, `I`, `F`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            RunEventKind::ScenarioStarted { .. } => "S",
            RunEventKind::StepStarted { .. } => "I",
            RunEventKind::StepFinished { .. } => "F",
            RunEventKind::StepSkipped { .. } => "K",
            RunEventKind::SubscriptionArmed { .. } => "A",
            RunEventKind::SubscriptionClosed { .. } => "X",
            RunEventKind::ScenarioCompleted { .. } => "C",
            RunEventKind::ScenarioAborted { .. } => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64, // asignado por el store (orden append)
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
