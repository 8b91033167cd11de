//! Estado de una ejecución: outputs capturados, actores, suscripciones
//! armadas y outcomes en orden.
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::correlator::EventSubscription;
use crate::model::{Actor, ScenarioState};
use crate::step::{Step, StepOutcome, StepStatus};
use crate::template::CaptureScope;

use super::ScenarioDefinition;

pub struct RunCtx {
    pub run_id: Uuid,
    pub state: ScenarioState,
    pub scope: CaptureScope,
    actors: HashMap<String, Arc<Actor>>,
    subscriptions: IndexMap<String, EventSubscription>,
    /// Estado final y hard-fail de cada step ya procesado.
    statuses: HashMap<String, (StepStatus, bool)>,
    outcomes: Vec<StepOutcome>,
}

impl RunCtx {
    pub fn new(definition: &ScenarioDefinition) -> Self {
        Self { run_id: Uuid::new_v4(),
               state: ScenarioState::Pending,
               scope: CaptureScope::new(definition.vars.clone()),
               actors: HashMap::new(),
               subscriptions: IndexMap::new(),
               statuses: HashMap::new(),
               outcomes: Vec::with_capacity(definition.len()) }
    }

    /// Primera dependencia que impide ejecutar `step`: saltada, fallida
    /// siendo hard-fail, o fallida siendo una dependencia de datos. Un
    /// soft-fail sólo se deja pasar en aristas `depends_on` explícitas.
    pub fn blocking_dependency(&self, step: &Step) -> Option<String> {
        let data = step.data_dependencies();
        step.dependencies().into_iter().find(|dep| match self.statuses.get(dep) {
                                           Some((StepStatus::Pass, _)) => false,
                                           Some((StepStatus::Fail, hard)) => *hard || data.contains(dep),
                                           Some((StepStatus::Skipped, _)) | None => true,
                                       })
    }

    /// Agrega el outcome; los outputs de un PASS quedan disponibles para
    /// plantillas.
    pub fn record(&mut self, outcome: StepOutcome) {
        if outcome.is_pass() {
            self.scope.record(&outcome.step, outcome.captured.clone());
        }
        self.statuses.insert(outcome.step.clone(), (outcome.status, outcome.hard_fail));
        self.outcomes.push(outcome);
    }

    pub fn actor(&self, alias: &str) -> Option<Arc<Actor>> {
        self.actors.get(alias).cloned()
    }

    pub fn insert_actor(&mut self, alias: &str, actor: Actor) {
        self.actors.insert(alias.to_string(), Arc::new(actor));
    }

    pub fn insert_subscription(&mut self, name: &str, subscription: EventSubscription) {
        self.subscriptions.insert(name.to_string(), subscription);
    }

    pub fn take_subscription(&mut self, name: &str) -> Option<EventSubscription> {
        self.subscriptions.shift_remove(name)
    }

    /// Suscripciones aún armadas, en orden de armado.
    pub fn drain_subscriptions(&mut self) -> Vec<(String, EventSubscription)> {
        self.subscriptions.drain(..).collect()
    }

    pub fn into_outcomes(self) -> Vec<StepOutcome> {
        self.outcomes
    }
}
