//! Actores: identidades ligadas a un rol con credenciales y token de sesión.
//!
//! El token es write-once: se fija al autenticar y luego el actor se comparte
//! en sólo lectura (`Arc<Actor>`) entre los steps del escenario.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ProbeError;

/// Rol del actor frente al servicio bajo prueba.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
    Custom(String),
}

impl Role {
    /// Representación en el wire (`"PATIENT"`, `"DOCTOR"`, ...).
    pub fn as_str(&self) -> &str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
            Role::Admin => "ADMIN",
            Role::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "PATIENT" => Role::Patient,
            "DOCTOR" => Role::Doctor,
            "ADMIN" => Role::Admin,
            _ => Role::Custom(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Par email/password usado para el login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(),
               password: password.into() }
    }

    /// Extrae `email` y `password` de un body de registro ya instanciado.
    pub fn from_body(body: &Value) -> Result<Self, ProbeError> {
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ProbeError::Template(format!("credential template lacks string field '{name}'")))
        };
        Ok(Self { email: field("email")?,
                  password: field("password")? })
    }

    /// Body JSON del login.
    pub fn login_body(&self) -> Value {
        serde_json::json!({ "email": self.email, "password": self.password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
         .field("email", &self.email)
         .field("password", &"***")
         .finish()
    }
}

/// Plantilla JSON de registro. Cada `{seed}` dentro de un string se sustituye
/// por la semilla de identidad del actor.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialTemplate {
    pub body: Value,
}

pub const SEED_PLACEHOLDER: &str = "{seed}";

impl CredentialTemplate {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn instantiate(&self, seed: &str) -> Value {
        substitute(&self.body, seed)
    }
}

fn substitute(value: &Value, seed: &str) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace(SEED_PLACEHOLDER, seed)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, seed)).collect()),
        Value::Object(map) => {
            let out: Map<String, Value> = map.iter().map(|(k, v)| (k.clone(), substitute(v, seed))).collect();
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Identidad con rol. Creada por el `ActorRegistry`; vive sólo durante la
/// ejecución.
#[derive(Clone)]
pub struct Actor {
    pub role: Role,
    pub identity_seed: String,
    pub credentials: Credentials,
    /// Body de registro enviado (o sintetizado para actores conocidos).
    pub profile: Value,
    /// Id asignado por el servicio (numérico u opaco).
    pub id: Option<Value>,
    token: Option<String>,
}

impl Actor {
    pub fn new(role: Role, identity_seed: impl Into<String>, credentials: Credentials, profile: Value) -> Self {
        Self { role,
               identity_seed: identity_seed.into(),
               credentials,
               profile,
               id: None,
               token: None }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Fija el token una única vez. Devuelve `false` si ya existía.
    pub(crate) fn set_token(&mut self, token: String) -> bool {
        if self.token.is_some() {
            return false;
        }
        self.token = Some(token);
        true
    }

    /// Valor del header `Authorization`.
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    /// Campos expuestos como output capturado del step de provisión.
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "id": self.id.clone().unwrap_or(Value::Null),
            "email": self.credentials.email,
            "role": self.role.as_str(),
            "seed": self.identity_seed,
        })
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
         .field("role", &self.role)
         .field("identity_seed", &self.identity_seed)
         .field("email", &self.credentials.email)
         .field("id", &self.id)
         .field("authenticated", &self.is_authenticated())
         .finish()
    }
}
