//! Definición declarativa de un step.
//!
//! Cada step tiene un nombre único dentro del escenario; ese nombre es también
//! el namespace de su output (`{{book.id}}`) y, para steps de provisión, el
//! alias del actor que otros steps usan para actuar.
use std::time::Duration;

use serde_json::{json, Value};

use crate::action::OperationDescriptor;
use crate::correlator::EventPredicate;
use crate::model::{CredentialTemplate, Credentials, Role};
use crate::template::{step_refs_in_str, step_refs_in_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Provision,
    Request,
    Arm,
    Await,
    Surface,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Provision => "provision",
            StepKind::Request => "request",
            StepKind::Arm => "arm",
            StepKind::Await => "await",
            StepKind::Surface => "surface",
        }
    }
}

/// Cómo obtener el actor de un step de provisión.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionMode {
    /// Alta con identidad nueva; `login` autentica en el mismo step.
    Create { template: CredentialTemplate, login: bool },
    /// Login del actor provisto por otro step.
    Login { from: String },
    /// Login de una cuenta ya existente.
    Known(Credentials),
    /// Login de la cuenta conocida; si falla, alta y login.
    ReuseOrCreate { known: Credentials, template: CredentialTemplate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionSpec {
    pub role: Role,
    pub mode: ProvisionMode,
}

/// Armado de suscripción. El nombre del step identifica la suscripción.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmSpec {
    /// Tópico con plantillas (`/topic/chat/{{chat.id}}`).
    pub topic: String,
    pub predicate: EventPredicate,
    /// `None` usa el deadline por defecto del runner.
    pub deadline: Option<Duration>,
    /// Actor cuyo token autentica la suscripción.
    pub actor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitSpec {
    /// Step `Arm` que abrió la suscripción.
    pub subscription: String,
    /// Step que dispara el evento; debe ir entre el arm y el await.
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Provision(ProvisionSpec),
    Request { actor: Option<String>, operation: OperationDescriptor },
    Arm(ArmSpec),
    Await(AwaitSpec),
    Surface { surface: String, action: String, params: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub action: StepAction,
    pub depends_on: Vec<String>,
    /// Si falla, los steps que dependen de él quedan SKIPPED y el reporte
    /// no pasa.
    pub hard_fail: bool,
    /// Un step de setup que no pasa aborta el escenario.
    pub setup: bool,
}

impl Step {
    pub fn new(name: impl Into<String>, action: StepAction) -> Self {
        Self { name: name.into(),
               action,
               depends_on: Vec::new(),
               hard_fail: true,
               setup: false }
    }

    fn provision(name: impl Into<String>, role: Role, mode: ProvisionMode) -> Self {
        Self::new(name, StepAction::Provision(ProvisionSpec { role, mode }))
    }

    /// Alta + login de un actor con identidad nueva.
    pub fn create_actor(name: impl Into<String>, role: Role, template: CredentialTemplate) -> Self {
        Self::provision(name, role, ProvisionMode::Create { template, login: true })
    }

    /// Sólo alta; el login queda para un step `login`.
    pub fn register(name: impl Into<String>, role: Role, template: CredentialTemplate) -> Self {
        Self::provision(name, role, ProvisionMode::Create { template, login: false })
    }

    /// Login del actor registrado por `from`.
    pub fn login(name: impl Into<String>, role: Role, from: impl Into<String>) -> Self {
        Self::provision(name, role, ProvisionMode::Login { from: from.into() })
    }

    pub fn authenticate_actor(name: impl Into<String>, role: Role, credentials: Credentials) -> Self {
        Self::provision(name, role, ProvisionMode::Known(credentials))
    }

    pub fn reuse_or_create(name: impl Into<String>,
                           role: Role,
                           known: Credentials,
                           template: CredentialTemplate)
                           -> Self {
        Self::provision(name, role, ProvisionMode::ReuseOrCreate { known, template })
    }

    /// Request ejecutado como el actor provisto por el step `actor`.
    pub fn request(name: impl Into<String>, actor: impl Into<String>, operation: OperationDescriptor) -> Self {
        Self::new(name,
                  StepAction::Request { actor: Some(actor.into()),
                                        operation })
    }

    /// Request anónimo (health checks).
    pub fn probe(name: impl Into<String>, operation: OperationDescriptor) -> Self {
        Self::new(name, StepAction::Request { actor: None, operation })
    }

    pub fn arm(name: impl Into<String>, topic: impl Into<String>, predicate: EventPredicate) -> Self {
        Self::new(name,
                  StepAction::Arm(ArmSpec { topic: topic.into(),
                                            predicate,
                                            deadline: None,
                                            actor: None }))
    }

    pub fn await_event(name: impl Into<String>, subscription: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self::new(name,
                  StepAction::Await(AwaitSpec { subscription: subscription.into(),
                                                trigger: trigger.into() }))
    }

    pub fn surface(name: impl Into<String>, surface: impl Into<String>, action: impl Into<String>, params: Value) -> Self {
        Self::new(name,
                  StepAction::Surface { surface: surface.into(),
                                        action: action.into(),
                                        params })
    }

    /// Deadline propio de un step `arm`.
    pub fn within(mut self, deadline: Duration) -> Self {
        if let StepAction::Arm(spec) = &mut self.action {
            spec.deadline = Some(deadline);
        }
        self
    }

    /// Actor que autentica la suscripción de un step `arm`.
    pub fn as_actor(mut self, actor: impl Into<String>) -> Self {
        if let StepAction::Arm(spec) = &mut self.action {
            spec.actor = Some(actor.into());
        }
        self
    }

    pub fn depends_on(mut self, step: impl Into<String>) -> Self {
        self.depends_on.push(step.into());
        self
    }

    /// Soft-fail: el fallo queda registrado pero no cambia el resultado
    /// global ni salta dependientes.
    pub fn soft(mut self) -> Self {
        self.hard_fail = false;
        self
    }

    pub fn setup(mut self) -> Self {
        self.setup = true;
        self
    }

    pub fn kind(&self) -> StepKind {
        match &self.action {
            StepAction::Provision(_) => StepKind::Provision,
            StepAction::Request { .. } => StepKind::Request,
            StepAction::Arm(_) => StepKind::Arm,
            StepAction::Await(_) => StepKind::Await,
            StepAction::Surface { .. } => StepKind::Surface,
        }
    }

    /// Steps de los que depende: explícitos más los de datos. Sin
    /// duplicados, en orden de aparición.
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps = self.depends_on.clone();
        deps.extend(self.data_dependencies());
        dedup(deps)
    }

    /// Steps cuyos outputs necesita para ejecutarse: referencias de
    /// plantilla, el step que provee el actor y, para un await, su arm y su
    /// trigger. Si uno de ellos no pasó, este step no puede correr aunque la
    /// dependencia sea soft.
    pub fn data_dependencies(&self) -> Vec<String> {
        let mut deps = Vec::new();
        match &self.action {
            StepAction::Provision(spec) => {
                if let ProvisionMode::Login { from } = &spec.mode {
                    deps.push(from.clone());
                }
            }
            StepAction::Request { actor, operation } => {
                deps.extend(actor.iter().cloned());
                deps.extend(step_refs_in_str(&operation.path));
                if let Some(body) = &operation.body {
                    deps.extend(step_refs_in_value(body));
                }
                for value in operation.headers.values() {
                    deps.extend(step_refs_in_str(value));
                }
            }
            StepAction::Arm(spec) => {
                deps.extend(spec.actor.iter().cloned());
                deps.extend(step_refs_in_str(&spec.topic));
                deps.extend(spec.predicate.step_refs());
            }
            StepAction::Await(spec) => {
                deps.push(spec.subscription.clone());
                deps.push(spec.trigger.clone());
            }
            StepAction::Surface { params, .. } => deps.extend(step_refs_in_value(params)),
        }
        dedup(deps)
    }

    /// Forma estable del step para el hash de definición. Las contraseñas
    /// de cuentas conocidas no forman parte del hash.
    pub fn fingerprint_json(&self) -> Value {
        let action = match &self.action {
            StepAction::Provision(spec) => {
                let mode = match &spec.mode {
                    ProvisionMode::Create { template, login } => json!({"create": template.body, "login": login}),
                    ProvisionMode::Login { from } => json!({"login": from}),
                    ProvisionMode::Known(c) => json!({"known": c.email}),
                    ProvisionMode::ReuseOrCreate { known, template } => {
                        json!({"reuse": known.email, "create": template.body})
                    }
                };
                json!({"provision": spec.role.as_str(), "mode": mode})
            }
            StepAction::Request { actor, operation } => json!({"request": operation.fingerprint_json(), "actor": actor}),
            StepAction::Arm(spec) => json!({
                "arm": spec.topic,
                "predicate": spec.predicate.fingerprint_json(),
                "deadline_ms": spec.deadline.map(|d| d.as_millis() as u64),
                "actor": spec.actor,
            }),
            StepAction::Await(spec) => json!({"await": spec.subscription, "trigger": spec.trigger}),
            StepAction::Surface { surface, action, params } => {
                json!({"surface": surface, "action": action, "params": params})
            }
        };
        json!({
            "name": self.name,
            "action": action,
            "depends_on": self.depends_on,
            "hard_fail": self.hard_fail,
            "setup": self.setup,
        })
    }
}

fn dedup(mut deps: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    deps.retain(|d| seen.insert(d.clone()));
    deps
}
