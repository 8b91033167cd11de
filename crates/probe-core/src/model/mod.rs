//! Tipos de datos del harness: actores y reporte de escenario.

pub mod actor;
pub mod report;

pub use actor::{Actor, CredentialTemplate, Credentials, Role};
pub use report::{OutcomeCounts, ScenarioReport, ScenarioState};
