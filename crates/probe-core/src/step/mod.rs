//! Definiciones relacionadas a Steps.
//!
//! Un Step es una acción declarada dentro de un escenario (provisión de actor,
//! request, armado/espera de suscripción push o acción sobre una superficie
//! cliente alternativa) con su contrato esperado. Este módulo define:
//! - `Step` y `StepAction`: descripción inmutable usada por el runner.
//! - `StepStatus` y `StepOutcome`: resultado producido una vez por step.

pub mod definition;
mod outcome;
mod status;

pub use definition::{ArmSpec, AwaitSpec, ProvisionMode, ProvisionSpec, Step, StepAction, StepKind};
pub use outcome::{Captured, StepOutcome};
pub use status::StepStatus;
