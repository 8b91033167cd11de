//! Scenario Runner.
//!
//! Ejecuta los steps en orden declarado, uno a la vez. Antes de cada step
//! revisa sus dependencias; después registra el outcome (y sus outputs) en el
//! contexto de la ejecución y un evento en el journal. Sólo un step de setup
//! que no pasa aborta el escenario: el resto siempre completa con reporte.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{RunCtx, ScenarioDefinition};
use crate::action::ActionExecutor;
use crate::actor::{ActorRegistry, AuthEndpoints};
use crate::constants::{ABORTED_MESSAGE, DEFAULT_CORRELATION_DEADLINE};
use crate::correlator::EventCorrelator;
use crate::diagnosis::diagnose_report;
use crate::errors::ProbeError;
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::model::{Actor, ScenarioReport, ScenarioState};
use crate::step::{ArmSpec, AwaitSpec, Captured, ProvisionMode, ProvisionSpec, Step, StepAction, StepOutcome};
use crate::template::{render_string, render_value};
use crate::transport::{ClientSurface, PushChannel, ServiceClient};

pub struct ScenarioRunner<E: EventStore = InMemoryEventStore> {
    client: Arc<dyn ServiceClient>,
    registry: ActorRegistry,
    executor: ActionExecutor,
    correlator: Option<EventCorrelator>,
    surfaces: HashMap<String, Arc<dyn ClientSurface>>,
    event_store: E,
    default_deadline: Duration,
}

impl ScenarioRunner<InMemoryEventStore> {
    /// Runner con journal en memoria y sin canal push ni superficies.
    pub fn new(client: Arc<dyn ServiceClient>) -> Self {
        Self { registry: ActorRegistry::new(Arc::clone(&client)),
               executor: ActionExecutor::new(Arc::clone(&client)),
               client,
               correlator: None,
               surfaces: HashMap::new(),
               event_store: InMemoryEventStore::default(),
               default_deadline: DEFAULT_CORRELATION_DEADLINE }
    }
}

impl<E: EventStore> ScenarioRunner<E> {
    pub fn with_event_store<S: EventStore>(self, event_store: S) -> ScenarioRunner<S> {
        ScenarioRunner { client: self.client,
                         registry: self.registry,
                         executor: self.executor,
                         correlator: self.correlator,
                         surfaces: self.surfaces,
                         event_store,
                         default_deadline: self.default_deadline }
    }

    pub fn with_push_channel(mut self, channel: Arc<dyn PushChannel>) -> Self {
        self.correlator = Some(EventCorrelator::new(channel));
        self
    }

    /// Registra una superficie cliente bajo su `name()`.
    pub fn with_surface(mut self, surface: Arc<dyn ClientSurface>) -> Self {
        self.surfaces.insert(surface.name().to_string(), surface);
        self
    }

    pub fn with_auth_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.registry = ActorRegistry::with_endpoints(Arc::clone(&self.client), endpoints);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.executor = ActionExecutor::new(Arc::clone(&self.client)).with_default_timeout(timeout);
        self
    }

    /// Deadline de los steps `arm` que no declaran uno propio.
    pub fn with_correlation_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    pub fn events_for(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.event_store.list(run_id)
    }

    /// Secuencia compacta de códigos de evento de una ejecución.
    pub fn event_trace(&self, run_id: Uuid) -> Vec<&'static str> {
        self.events_for(run_id).iter().map(|e| e.kind.code()).collect()
    }

    fn journal(&mut self, run_id: Uuid, kind: RunEventKind) {
        self.event_store.append_kind(run_id, kind);
    }

    /// Ejecuta el escenario y devuelve siempre un reporte completo: un
    /// outcome por step, en orden declarado.
    pub async fn run(&mut self, definition: &ScenarioDefinition) -> ScenarioReport {
        let started_at = Utc::now();
        let mut ctx = RunCtx::new(definition);
        let run_id = ctx.run_id;
        self.journal(run_id,
                     RunEventKind::ScenarioStarted { scenario: definition.name.clone(),
                                                     definition_hash: definition.definition_hash.clone(),
                                                     step_count: definition.len() });
        info!("scenario '{}' started ({} steps)", definition.name, definition.len());
        ctx.state = ScenarioState::Running;

        for (step_index, step) in definition.steps.iter().enumerate() {
            let hard_fail = step.hard_fail || step.setup;

            if ctx.state == ScenarioState::Aborted {
                self.skip(&mut ctx, step_index, step, StepOutcome::skipped(&step.name, ABORTED_MESSAGE));
                continue;
            }
            if let Some(dependency) = ctx.blocking_dependency(step) {
                debug!("{}: dependency '{dependency}' did not pass", step.name);
                self.skip(&mut ctx, step_index, step, StepOutcome::dependency_skip(&step.name, &dependency));
                if step.setup {
                    self.abort(&mut ctx, &step.name).await;
                }
                continue;
            }

            self.journal(run_id,
                         RunEventKind::StepStarted { step_index,
                                                     step: step.name.clone() });
            let started = Instant::now();
            let mut outcome = self.execute_step(&mut ctx, step).await.with_elapsed(started.elapsed());
            outcome.hard_fail = hard_fail;
            self.journal(run_id,
                         RunEventKind::StepFinished { step_index,
                                                      step: step.name.clone(),
                                                      status: outcome.status,
                                                      elapsed_ms: outcome.elapsed_ms });
            if outcome.is_pass() {
                info!("[{}] {}: {}", outcome.status.label(), step.name, outcome.message);
            } else {
                warn!("[{}] {}: {}", outcome.status.label(), step.name, outcome.message);
            }
            let passed = outcome.is_pass();
            ctx.record(outcome);
            if step.setup && !passed {
                self.abort(&mut ctx, &step.name).await;
            }
        }

        self.close_subscriptions(&mut ctx).await;
        if ctx.state == ScenarioState::Running {
            ctx.state = ScenarioState::Completed;
        }
        let state = ctx.state;
        let outcomes = ctx.into_outcomes();
        let passed = ScenarioReport::compute_passed(state, &outcomes);
        let mut report = ScenarioReport { run_id,
                                          scenario: definition.name.clone(),
                                          definition_hash: definition.definition_hash.clone(),
                                          state,
                                          outcomes,
                                          passed,
                                          diagnosis: None,
                                          started_at,
                                          finished_at: Utc::now() };
        report.diagnosis = definition.axes.as_ref().map(|axes| diagnose_report(&report, axes));
        if state == ScenarioState::Completed {
            self.journal(run_id, RunEventKind::ScenarioCompleted { passed });
        }
        info!("scenario '{}' {:?} (passed: {passed})", definition.name, state);
        report
    }

    fn skip(&mut self, ctx: &mut RunCtx, step_index: usize, step: &Step, mut outcome: StepOutcome) {
        outcome.hard_fail = step.hard_fail || step.setup;
        self.journal(ctx.run_id,
                     RunEventKind::StepSkipped { step_index,
                                                 step: step.name.clone(),
                                                 reason: outcome.message.clone() });
        ctx.record(outcome);
    }

    async fn abort(&mut self, ctx: &mut RunCtx, step: &str) {
        warn!("setup step '{step}' did not pass, aborting");
        ctx.state = ScenarioState::Aborted;
        self.journal(ctx.run_id, RunEventKind::ScenarioAborted { step: step.to_string() });
        self.close_subscriptions(ctx).await;
    }

    async fn close_subscriptions(&mut self, ctx: &mut RunCtx) {
        for (name, mut subscription) in ctx.drain_subscriptions() {
            let topic = subscription.topic().to_string();
            subscription.close().await;
            debug!("closed leftover subscription '{name}' on {topic}");
            self.journal(ctx.run_id, RunEventKind::SubscriptionClosed { step: name, topic });
        }
    }

    async fn execute_step(&mut self, ctx: &mut RunCtx, step: &Step) -> StepOutcome {
        match &step.action {
            StepAction::Provision(spec) => self.provision(ctx, &step.name, spec).await,
            StepAction::Request { actor, operation } => {
                let actor = match actor {
                    Some(alias) => match ctx.actor(alias) {
                        Some(a) => Some(a),
                        None => return missing_actor(&step.name, alias),
                    },
                    None => None,
                };
                self.executor.execute(&step.name, actor.as_deref(), operation, &ctx.scope).await
            }
            StepAction::Arm(spec) => self.arm(ctx, &step.name, spec).await,
            StepAction::Await(spec) => self.await_event(ctx, &step.name, spec).await,
            StepAction::Surface { surface, action, params } => {
                self.perform_surface(ctx, &step.name, surface, action, params).await
            }
        }
    }

    async fn provision(&mut self, ctx: &mut RunCtx, name: &str, spec: &ProvisionSpec) -> StepOutcome {
        let role = spec.role.clone();
        let (result, verb) = match &spec.mode {
            ProvisionMode::Create { template, login } => {
                let created = self.registry.create_actor(role, template).await;
                match (created, *login) {
                    (Ok(actor), true) => (self.registry.authenticate(actor).await, "registered and authenticated"),
                    (other, _) => (other, "registered"),
                }
            }
            ProvisionMode::Login { from } => match ctx.actor(from) {
                Some(actor) => (self.registry.authenticate(Actor::clone(&actor)).await, "authenticated"),
                None => return missing_actor(name, from),
            },
            ProvisionMode::Known(credentials) => {
                let actor = self.registry.known_actor(role, credentials.clone());
                (self.registry.authenticate(actor).await, "authenticated")
            }
            ProvisionMode::ReuseOrCreate { known, template } => {
                (self.registry.reuse_or_create(role, known.clone(), template).await, "ready")
            }
        };
        match result {
            Ok(actor) => {
                let mut captured = Captured::new();
                if let Value::Object(map) = actor.summary() {
                    captured.extend(map);
                }
                captured.insert("authenticated".into(), Value::Bool(actor.is_authenticated()));
                let message = format!("{} {} {verb}", actor.role, actor.credentials.email);
                ctx.insert_actor(name, actor);
                StepOutcome::pass(name, captured, message)
            }
            Err(e) => StepOutcome::fail(name, e),
        }
    }

    async fn arm(&mut self, ctx: &mut RunCtx, name: &str, spec: &ArmSpec) -> StepOutcome {
        let Some(correlator) = &self.correlator else {
            return StepOutcome::fail(name, ProbeError::InvalidScenario("no push channel configured".into()));
        };
        let topic = match render_string(&spec.topic, &ctx.scope) {
            Ok(t) => t,
            Err(e) => return StepOutcome::fail(name, e),
        };
        let predicate = match spec.predicate.resolve(&ctx.scope) {
            Ok(p) => p,
            Err(e) => return StepOutcome::fail(name, e),
        };
        let token = match &spec.actor {
            Some(alias) => match ctx.actor(alias) {
                Some(actor) => actor.token().map(str::to_string),
                None => return missing_actor(name, alias),
            },
            None => None,
        };
        let deadline = spec.deadline.unwrap_or(self.default_deadline);

        let armed = correlator.arm(&topic, predicate, deadline, token.as_deref()).await;
        match armed {
            Ok(subscription) => {
                ctx.insert_subscription(name, subscription);
                self.journal(ctx.run_id,
                             RunEventKind::SubscriptionArmed { step: name.to_string(),
                                                               topic: topic.clone() });
                let mut captured = Captured::new();
                captured.insert("topic".into(), json!(topic));
                captured.insert("deadline_ms".into(), json!(deadline.as_millis() as u64));
                StepOutcome::pass(name, captured, format!("armed {topic}"))
            }
            Err(e) => StepOutcome::fail(name, e),
        }
    }

    async fn await_event(&mut self, ctx: &mut RunCtx, name: &str, spec: &AwaitSpec) -> StepOutcome {
        let (Some(correlator), Some(subscription)) = (&self.correlator, ctx.take_subscription(&spec.subscription))
        else {
            return StepOutcome::fail(name,
                                     ProbeError::Internal(format!("subscription '{}' is not armed", spec.subscription)));
        };
        let topic = subscription.topic().to_string();
        let outcome = correlator.await_match(name, subscription).await;
        self.journal(ctx.run_id,
                     RunEventKind::SubscriptionClosed { step: spec.subscription.clone(),
                                                        topic });
        outcome
    }

    async fn perform_surface(&mut self,
                             ctx: &mut RunCtx,
                             name: &str,
                             surface: &str,
                             action: &str,
                             params: &Value)
                             -> StepOutcome {
        let Some(client) = self.surfaces.get(surface).cloned() else {
            return StepOutcome::fail(name,
                                     ProbeError::InvalidScenario(format!("no client surface named '{surface}'")));
        };
        let params = match render_value(params, &ctx.scope) {
            Ok(p) => p,
            Err(e) => return StepOutcome::fail(name, e),
        };
        match client.perform(action, &params).await {
            Ok(result) => {
                let mut captured = Captured::new();
                if let Value::Object(map) = &result {
                    captured.extend(map.clone());
                }
                captured.insert("result".into(), result);
                StepOutcome::pass(name, captured, format!("{surface}: {action} ok"))
            }
            Err(e) => StepOutcome::fail(name, e),
        }
    }
}

fn missing_actor(step: &str, alias: &str) -> StepOutcome {
    StepOutcome::fail(step, ProbeError::Internal(format!("actor '{alias}' was not provisioned")))
}
