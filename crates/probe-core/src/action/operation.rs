//! Descriptor de operación y contrato de resultado.
use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::field_at;
use crate::transport::Verb;

/// Clase de status HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn of(status: u16) -> Option<Self> {
        match status {
            100..=199 => Some(StatusClass::Informational),
            200..=299 => Some(StatusClass::Success),
            300..=399 => Some(StatusClass::Redirection),
            400..=499 => Some(StatusClass::ClientError),
            500..=599 => Some(StatusClass::ServerError),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::Informational => "1xx",
            StatusClass::Success => "2xx",
            StatusClass::Redirection => "3xx",
            StatusClass::ClientError => "4xx",
            StatusClass::ServerError => "5xx",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusExpectation {
    /// Lista explícita (`[200, 201]`).
    Codes(Vec<u16>),
    Class(StatusClass),
    Any,
}

impl StatusExpectation {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusExpectation::Codes(codes) => codes.contains(&status),
            StatusExpectation::Class(class) => StatusClass::of(status) == Some(*class),
            StatusExpectation::Any => true,
        }
    }
}

impl fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusExpectation::Codes(codes) => {
                let list: Vec<String> = codes.iter().map(u16::to_string).collect();
                write!(f, "{}", list.join("|"))
            }
            StatusExpectation::Class(class) => f.write_str(class.label()),
            StatusExpectation::Any => f.write_str("any"),
        }
    }
}

/// Contrato esperado de una respuesta: status aceptado y campos requeridos.
///
/// Esperar un rechazo es un contrato más: `expect_rejection(400)` pasa con
/// un 400 y falla con cualquier 2xx.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeContract {
    pub accepted: StatusExpectation,
    /// Paths con puntos dentro del body (`id`, `user.id`, `0.id`).
    pub required_fields: Vec<String>,
}

impl Default for OutcomeContract {
    fn default() -> Self {
        Self::expect_success()
    }
}

impl OutcomeContract {
    pub fn expect_success() -> Self {
        Self { accepted: StatusExpectation::Class(StatusClass::Success),
               required_fields: Vec::new() }
    }

    pub fn expect_status(codes: &[u16]) -> Self {
        Self { accepted: StatusExpectation::Codes(codes.to_vec()),
               required_fields: Vec::new() }
    }

    /// Espera exactamente un status de rechazo.
    pub fn expect_rejection(status: u16) -> Self {
        Self::expect_status(&[status])
    }

    pub fn expect_class(class: StatusClass) -> Self {
        Self { accepted: StatusExpectation::Class(class),
               required_fields: Vec::new() }
    }

    pub fn any_status() -> Self {
        Self { accepted: StatusExpectation::Any,
               required_fields: Vec::new() }
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.accepted.accepts(status)
    }

    /// Campos requeridos ausentes en `body`.
    pub fn missing_fields(&self, body: &Value) -> Vec<String> {
        self.required_fields
            .iter()
            .filter(|f| field_at(body, f).is_none())
            .cloned()
            .collect()
    }

    pub fn describe(&self) -> String {
        if self.required_fields.is_empty() {
            format!("status {}", self.accepted)
        } else {
            format!("status {} with fields [{}]", self.accepted, self.required_fields.join(", "))
        }
    }
}

/// Operación request/response declarada en un step. Path, body y headers
/// pueden contener referencias `{{step.campo}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub verb: Verb,
    pub path: String,
    pub body: Option<Value>,
    pub headers: IndexMap<String, String>,
    pub contract: OutcomeContract,
    pub timeout: Option<Duration>,
}

impl OperationDescriptor {
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self { verb,
               path: path.into(),
               body: None,
               headers: IndexMap::new(),
               contract: OutcomeContract::default(),
               timeout: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Verb::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Verb::Post, path).body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Verb::Put, path).body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Verb::Patch, path).body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Verb::Delete, path)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn expect(mut self, contract: OutcomeContract) -> Self {
        self.contract = contract;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Representación estable para el hash de la definición.
    pub fn fingerprint_json(&self) -> Value {
        serde_json::json!({
            "verb": self.verb,
            "path": self.path,
            "body": self.body,
            "headers": self.headers,
            "contract": self.contract,
            "timeout_ms": self.timeout.map(|t| t.as_millis() as u64),
        })
    }
}
