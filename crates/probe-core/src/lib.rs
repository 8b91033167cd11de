//! probe-core: motor de escenarios multi-actor contra un servicio en red.
//!
//! Componentes (de hojas a raíz):
//! - `actor`: Actor Registry (alta, login, register-or-login).
//! - `action`: Action Executor (request/response con contrato).
//! - `correlator`: Event Correlator (suscripción push con deadline).
//! - `engine`: Scenario Runner y builder de escenarios.
//! - `diagnosis`: clasificación del patrón de resultados.
pub mod action;
pub mod actor;
pub mod constants;
pub mod correlator;
pub mod diagnosis;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod step;
pub mod template;
pub mod transport;

pub use action::{ActionExecutor, OperationDescriptor, OutcomeContract, StatusClass, StatusExpectation};
pub use actor::{ActorRegistry, AuthEndpoints};
pub use correlator::{EventCorrelator, EventPredicate, EventSubscription};
pub use diagnosis::{diagnose, diagnose_report, DiagnosisAxes, DiagnosisLabel, DiagnosisSignals};
pub use engine::{ScenarioBuilder, ScenarioDefinition, ScenarioRunner};
pub use errors::ProbeError;
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use model::{Actor, CredentialTemplate, Credentials, OutcomeCounts, Role, ScenarioReport, ScenarioState};
pub use step::{Step, StepOutcome, StepStatus};
pub use transport::{ClientSurface, PushChannel, PushSubscription, ServiceClient, ServiceRequest, ServiceResponse, Verb};
