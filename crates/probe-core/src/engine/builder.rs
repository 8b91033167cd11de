//! Builder de `ScenarioDefinition`.
//!
//! `build()` valida la forma del escenario antes de que toque la red:
//! - nombres únicos y utilizables como namespace de plantilla;
//! - dependencias sólo hacia steps anteriores (flujo lineal);
//! - actores referenciados provistos por un step `Provision` anterior;
//! - cada `Await` apunta a un `Arm` anterior y su trigger queda entre ambos
//!   (armar después del trigger se rechaza);
//! - los ejes de diagnóstico nombran steps existentes.
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::constants::HARNESS_VERSION;
use crate::diagnosis::DiagnosisAxes;
use crate::errors::ProbeError;
use crate::hashing::hash_value;
use crate::step::{ProvisionMode, Step, StepAction, StepKind};
use crate::template::VARS_NAMESPACE;

/// Escenario validado e inmutable. Se puede ejecutar muchas veces.
#[derive(Debug, Clone)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
    pub vars: IndexMap<String, Value>,
    pub axes: Option<DiagnosisAxes>,
    /// Hash del JSON canónico de la definición (incluye `HARNESS_VERSION`).
    pub definition_hash: String,
}

impl ScenarioDefinition {
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder::new(name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    name: String,
    description: String,
    steps: Vec<Step>,
    vars: IndexMap<String, Value>,
    axes: Option<DiagnosisAxes>,
}

impl ScenarioBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               ..Self::default() }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Variable accesible como `{{vars.nombre}}`.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn diagnose_with(mut self, axes: DiagnosisAxes) -> Self {
        self.axes = Some(axes);
        self
    }

    pub fn build(self) -> Result<ScenarioDefinition, ProbeError> {
        if self.name.trim().is_empty() {
            return Err(invalid("scenario name is empty"));
        }
        if self.steps.is_empty() {
            return Err(invalid(format!("scenario '{}' has no steps", self.name)));
        }
        validate_steps(&self.steps)?;
        if let Some(axes) = &self.axes {
            for name in axes.names() {
                if !self.steps.iter().any(|s| &s.name == name) {
                    return Err(invalid(format!("diagnosis axis names unknown step '{name}'")));
                }
            }
        }

        let fingerprint = json!({
            "version": HARNESS_VERSION,
            "name": self.name,
            "steps": self.steps.iter().map(Step::fingerprint_json).collect::<Vec<_>>(),
            "vars": self.vars,
            "axes": self.axes,
        });
        Ok(ScenarioDefinition { definition_hash: hash_value(&fingerprint),
                                name: self.name,
                                description: self.description,
                                steps: self.steps,
                                vars: self.vars,
                                axes: self.axes })
    }
}

fn invalid(msg: impl Into<String>) -> ProbeError {
    ProbeError::InvalidScenario(msg.into())
}

fn validate_steps(steps: &[Step]) -> Result<(), ProbeError> {
    let mut index: HashMap<&str, (usize, StepKind)> = HashMap::new();
    let mut awaited: HashSet<&str> = HashSet::new();

    for (i, step) in steps.iter().enumerate() {
        let name = step.name.as_str();
        if name.is_empty() || name == VARS_NAMESPACE || name.contains(['.', '{', '}']) {
            return Err(invalid(format!("step name '{name}' is not a valid identifier")));
        }
        if index.contains_key(name) {
            return Err(invalid(format!("duplicate step name '{name}'")));
        }

        for dep in step.dependencies() {
            if !index.contains_key(dep.as_str()) {
                return Err(invalid(format!("step '{name}' depends on '{dep}', which is not an earlier step")));
            }
        }

        let provisioner = |alias: &str| match index.get(alias) {
            Some((_, StepKind::Provision)) => Ok(()),
            _ => Err(invalid(format!("step '{name}' acts as '{alias}', which is not an earlier provisioning step"))),
        };
        match &step.action {
            StepAction::Request { actor: Some(alias), .. } => provisioner(alias)?,
            StepAction::Arm(spec) => {
                if let Some(alias) = &spec.actor {
                    provisioner(alias)?;
                }
            }
            StepAction::Provision(spec) => {
                if let ProvisionMode::Login { from } = &spec.mode {
                    provisioner(from)?;
                }
            }
            StepAction::Await(spec) => {
                let arm_at = match index.get(spec.subscription.as_str()) {
                    Some((at, StepKind::Arm)) => *at,
                    _ => return Err(invalid(format!("step '{name}' awaits '{}', which is not an earlier arm step",
                                                    spec.subscription))),
                };
                let trigger_at = index.get(spec.trigger.as_str()).map(|(at, _)| *at).unwrap_or(i);
                if trigger_at <= arm_at {
                    return Err(invalid(format!("subscription '{}' must be armed before its trigger '{}'",
                                               spec.subscription, spec.trigger)));
                }
                if !awaited.insert(spec.subscription.as_str()) {
                    return Err(invalid(format!("subscription '{}' is awaited more than once", spec.subscription)));
                }
            }
            _ => {}
        }
        index.insert(name, (i, step.kind()));
    }
    Ok(())
}
