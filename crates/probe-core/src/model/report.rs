//! Reporte agregado de una ejecución de escenario.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnosis::DiagnosisLabel;
use crate::step::{StepOutcome, StepStatus};

/// Máquina de estados del escenario: `Pending -> Running -> {Completed, Aborted}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScenarioState {
    Pending,
    Running,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub scenario: String,
    pub definition_hash: String,
    pub state: ScenarioState,
    /// Un outcome por step, en orden declarado.
    pub outcomes: Vec<StepOutcome>,
    pub passed: bool,
    pub diagnosis: Option<DiagnosisLabel>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Conteo por estado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

impl ScenarioReport {
    /// AND de los steps hard-fail no saltados. Un escenario abortado nunca pasa.
    pub fn compute_passed(state: ScenarioState, outcomes: &[StepOutcome]) -> bool {
        state == ScenarioState::Completed
        && outcomes.iter()
                   .filter(|o| o.hard_fail && o.status != StepStatus::Skipped)
                   .all(|o| o.status == StepStatus::Pass)
    }

    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.step == step)
    }

    pub fn status_of(&self, step: &str) -> Option<StepStatus> {
        self.outcome(step).map(|o| o.status)
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut c = OutcomeCounts::default();
        for o in &self.outcomes {
            match o.status {
                StepStatus::Pass => c.passed += 1,
                StepStatus::Fail => c.failed += 1,
                StepStatus::Skipped => c.skipped += 1,
            }
        }
        c
    }

    /// Soft failures: registrados pero sin impacto en `passed`.
    pub fn soft_failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.hard_fail && o.status == StepStatus::Fail)
    }

    /// Código de salida del proceso: 0 si pasa, 1 en otro caso.
    pub fn exit_code(&self) -> i32 {
        if self.passed { 0 } else { 1 }
    }
}
