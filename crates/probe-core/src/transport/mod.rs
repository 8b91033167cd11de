//! Fronteras del servicio bajo prueba.
//!
//! El core sólo conoce estos traits; las implementaciones reales (HTTP,
//! STOMP sobre WebSocket, frontend web) viven en `probe-adapters` y las
//! implementaciones en memoria en [`memory`].
pub mod memory;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::ProbeError;

pub use memory::{InMemoryPushBroker, InMemoryService, InMemorySurface};

/// Verbo HTTP de una operación request/response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request ya renderado (sin referencias de plantilla pendientes).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub verb: Verb,
    /// Path relativo a la URL base (`/api/appointments`).
    pub path: String,
    pub body: Option<Value>,
    pub headers: IndexMap<String, String>,
    pub timeout: Option<Duration>,
}

impl ServiceRequest {
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self { verb,
               path: path.into(),
               body: None,
               headers: IndexMap::new(),
               timeout: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Verb::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Verb::Post, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Token del header `Authorization: Bearer ...`, si existe.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .and_then(|(_, v)| v.strip_prefix("Bearer "))
    }

    /// Segmentos del path sin query string.
    pub fn path_segments(&self) -> Vec<&str> {
        let path = self.path.split('?').next().unwrap_or_default();
        path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Value,
}

impl ServiceResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body en texto para mensajes de diagnóstico.
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Frontera request/response del servicio.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Envía un request. Errores de conexión o timeout devuelven
    /// `ProbeError::Transport`; cualquier status HTTP es una respuesta válida.
    async fn send(&self, request: ServiceRequest) -> Result<ServiceResponse, ProbeError>;
}

/// Frontera push: suscripción por tópico.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Devuelve cuando el canal ya registró la suscripción: eventos
    /// publicados después de este punto llegan al receptor.
    async fn subscribe(&self, topic: &str, token: Option<&str>) -> Result<PushSubscription, ProbeError>;
}

/// Superficie cliente alternativa (p.ej. el frontend web).
#[async_trait]
pub trait ClientSurface: Send + Sync {
    fn name(&self) -> &str;
    async fn perform(&self, action: &str, params: &Value) -> Result<Value, ProbeError>;
}

type CloseHook = Box<dyn FnOnce() + Send>;

/// Stream de payloads JSON de un tópico. Al hacer drop se ejecuta el hook de
/// cierre, que desuscribe en el canal.
pub struct PushSubscription {
    topic: String,
    events: mpsc::Receiver<Value>,
    on_close: Option<CloseHook>,
}

impl PushSubscription {
    pub fn new(topic: impl Into<String>, events: mpsc::Receiver<Value>) -> Self {
        Self { topic: topic.into(),
               events,
               on_close: None }
    }

    pub fn with_on_close(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Próximo payload; `None` cuando el canal se cerró.
    pub async fn recv(&mut self) -> Option<Value> {
        self.events.recv().await
    }
}

impl fmt::Debug for PushSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushSubscription").field("topic", &self.topic).finish()
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.events.close();
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }
}
