//! Ejecuta una operación contra el servicio y evalúa su contrato.
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde_json::Value;

use super::OperationDescriptor;
use crate::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::errors::ProbeError;
use crate::model::Actor;
use crate::step::{Captured, StepOutcome};
use crate::template::{field_at, render_string, render_value, CaptureScope};
use crate::transport::{ServiceClient, ServiceRequest, ServiceResponse};

/// Ejecutor de operaciones request/response. No reintenta.
pub struct ActionExecutor {
    client: Arc<dyn ServiceClient>,
    default_timeout: Duration,
}

impl ActionExecutor {
    pub fn new(client: Arc<dyn ServiceClient>) -> Self {
        Self { client,
               default_timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Resuelve plantillas y agrega el header bearer del actor.
    pub fn render(&self,
                  actor: Option<&Actor>,
                  op: &OperationDescriptor,
                  scope: &CaptureScope)
                  -> Result<ServiceRequest, ProbeError> {
        let path = render_string(&op.path, scope)?;
        let mut request = ServiceRequest::new(op.verb, path).with_timeout(op.timeout.unwrap_or(self.default_timeout));
        if let Some(body) = &op.body {
            request = request.with_body(render_value(body, scope)?);
        }
        for (name, value) in &op.headers {
            request = request.with_header(name.clone(), render_string(value, scope)?);
        }
        if let Some(actor) = actor {
            let bearer = actor.bearer().ok_or_else(|| {
                                           ProbeError::Authentication(format!("actor {} ({}) has no session token",
                                                                              actor.credentials.email, actor.role))
                                       })?;
            request = request.with_header("Authorization", bearer);
        }
        Ok(request)
    }

    /// Ejecuta `op` como `actor` y devuelve exactamente un outcome.
    ///
    /// Errores de plantilla o de sesión fallan sin tocar la red.
    pub async fn execute(&self,
                         step: &str,
                         actor: Option<&Actor>,
                         op: &OperationDescriptor,
                         scope: &CaptureScope)
                         -> StepOutcome {
        let started = Instant::now();
        let request = match self.render(actor, op, scope) {
            Ok(r) => r,
            Err(e) => return StepOutcome::fail(step, e).with_elapsed(started.elapsed()),
        };
        let line = format!("{} {}", request.verb, request.path);
        debug!("{step}: {line}");

        let response = match self.send(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!("{step}: {line} failed: {e}");
                return StepOutcome::fail(step, e).with_elapsed(started.elapsed());
            }
        };
        evaluate(step, &line, op, response).with_elapsed(started.elapsed())
    }

    async fn send(&self, request: ServiceRequest) -> Result<ServiceResponse, ProbeError> {
        let limit = request.timeout.unwrap_or(self.default_timeout);
        let target = format!("{} {}", request.verb, request.path);
        match tokio::time::timeout(limit, self.client.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Transport(format!("{target} timed out after {}ms", limit.as_millis()))),
        }
    }
}

/// Status primero, luego campos requeridos.
fn evaluate(step: &str, line: &str, op: &OperationDescriptor, response: ServiceResponse) -> StepOutcome {
    let contract = &op.contract;
    if !contract.accepts(response.status) {
        let message = format!("{line} -> {} (expected {}): {}",
                              response.status,
                              contract.accepted,
                              response.body_text());
        warn!("{step}: {message}");
        return StepOutcome::fail_with(step, ProbeError::ContractViolation(message.clone()), message);
    }
    let missing = contract.missing_fields(&response.body);
    if !missing.is_empty() {
        let message = format!("{line} -> {} missing required fields [{}]", response.status, missing.join(", "));
        warn!("{step}: {message}");
        return StepOutcome::fail_with(step, ProbeError::ContractViolation(message.clone()), message);
    }

    let mut captured = Captured::new();
    captured.insert("status".into(), Value::from(response.status));
    for field in &contract.required_fields {
        if let Some(v) = field_at(&response.body, field) {
            captured.insert(field.clone(), v.clone());
        }
    }
    if let Value::Object(map) = &response.body {
        for (k, v) in map {
            captured.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
    captured.insert("body".into(), response.body);
    StepOutcome::pass(step, captured, format!("{line} -> {}", response.status))
}
