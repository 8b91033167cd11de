use serde::{Deserialize, Serialize};

/// Estado final de un step dentro del reporte.
///
/// `Skipped` implica que el step no se ejecutó (ni hizo llamadas de red):
/// una dependencia no pasó o el escenario fue abortado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Pass,
    Fail,
    Skipped,
}

impl StepStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Pass => "PASS",
            StepStatus::Fail => "FAIL",
            StepStatus::Skipped => "SKIPPED",
        }
    }
}
