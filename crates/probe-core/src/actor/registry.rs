//! Registro de actores: alta, login y register-or-login contra el servicio.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use log::{debug, info, warn};
use serde_json::Value;

use crate::errors::ProbeError;
use crate::model::{Actor, CredentialTemplate, Credentials, Role};
use crate::template::field_at;
use crate::transport::{ServiceClient, ServiceRequest};

/// Contador global del proceso: dos registries nunca emiten la misma semilla.
static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Paths y campos del servicio de autenticación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub register_path: String,
    pub login_path: String,
    pub token_field: String,
    /// Se prueban en orden hasta encontrar uno presente.
    pub id_fields: Vec<String>,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self { register_path: "/api/auth/register".into(),
               login_path: "/api/auth/login".into(),
               token_field: "token".into(),
               id_fields: vec!["id".into(), "user.id".into()] }
    }
}

pub struct ActorRegistry {
    client: Arc<dyn ServiceClient>,
    endpoints: AuthEndpoints,
    issued: DashMap<String, Role>,
}

impl ActorRegistry {
    pub fn new(client: Arc<dyn ServiceClient>) -> Self {
        Self::with_endpoints(client, AuthEndpoints::default())
    }

    pub fn with_endpoints(client: Arc<dyn ServiceClient>, endpoints: AuthEndpoints) -> Self {
        Self { client,
               endpoints,
               issued: DashMap::new() }
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// Semillas emitidas por este registry.
    pub fn issued_seeds(&self) -> Vec<String> {
        self.issued.iter().map(|e| e.key().clone()).collect()
    }

    /// Semilla libre de colisiones: timestamp en nanosegundos más un contador
    /// monotónico. Se re-deriva si ya fue emitida.
    fn next_seed(&self, role: &Role) -> String {
        loop {
            let n = SEED_COUNTER.fetch_add(1, Ordering::SeqCst);
            let nanos = SystemTime::now().duration_since(UNIX_EPOCH)
                                         .map(|d| d.as_nanos())
                                         .unwrap_or_default();
            let seed = format!("{nanos}n{n}");
            if self.issued.insert(seed.clone(), role.clone()).is_none() {
                return seed;
            }
        }
    }

    /// Registra un actor nuevo a partir de la plantilla. No autentica.
    pub async fn create_actor(&self, role: Role, template: &CredentialTemplate) -> Result<Actor, ProbeError> {
        let seed = self.next_seed(&role);
        let mut body = template.instantiate(&seed);
        if let Value::Object(map) = &mut body {
            map.insert("role".into(), Value::String(role.as_str().to_string()));
        }
        let credentials = Credentials::from_body(&body)?;
        debug!("registering {role} {}", credentials.email);

        let response = self.client
                           .send(ServiceRequest::post(self.endpoints.register_path.clone(), body.clone()))
                           .await?;
        if !response.is_success() {
            warn!("registration of {role} {} rejected with {}", credentials.email, response.status);
            return Err(ProbeError::Registration { role: role.as_str().to_string(),
                                                  status: response.status,
                                                  body: response.body_text() });
        }
        let mut actor = Actor::new(role, seed, credentials, body);
        actor.id = self.extract_id(&response.body);
        info!("registered {} {}", actor.role, actor.credentials.email);
        Ok(actor)
    }

    /// Intercambia credenciales por token. Un actor ya autenticado se
    /// devuelve sin llamar al servicio.
    pub async fn authenticate(&self, actor: Actor) -> Result<Actor, ProbeError> {
        if actor.is_authenticated() {
            return Ok(actor);
        }
        let response = self.client
                           .send(ServiceRequest::post(self.endpoints.login_path.clone(), actor.credentials.login_body()))
                           .await?;
        if !response.is_success() {
            return Err(ProbeError::Authentication(format!("login of {} returned {}: {}",
                                                          actor.credentials.email,
                                                          response.status,
                                                          response.body_text())));
        }
        let token = field_at(&response.body, &self.endpoints.token_field)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProbeError::Authentication(format!("login of {} returned no '{}' field",
                                                   actor.credentials.email, self.endpoints.token_field))
            })?
            .to_string();

        let mut actor = actor;
        if let Some(id) = self.extract_id(&response.body) {
            actor.id = Some(id);
        }
        actor.set_token(token);
        info!("authenticated {} {}", actor.role, actor.credentials.email);
        Ok(actor)
    }

    /// Actor fijo ya existente en el servicio (sin registrar).
    pub fn known_actor(&self, role: Role, credentials: Credentials) -> Actor {
        let seed = format!("known:{}", credentials.email);
        let profile = serde_json::json!({ "email": credentials.email, "role": role.as_str() });
        Actor::new(role, seed, credentials, profile)
    }

    /// Login de un actor fijo; si falla, lo registra desde la plantilla con
    /// las credenciales conocidas y vuelve a autenticar.
    pub async fn reuse_or_create(&self,
                                 role: Role,
                                 known: Credentials,
                                 template: &CredentialTemplate)
                                 -> Result<Actor, ProbeError> {
        let existing = self.known_actor(role.clone(), known.clone());
        match self.authenticate(existing).await {
            Ok(actor) => return Ok(actor),
            Err(e) => debug!("reuse of {} failed ({e}), creating it", known.email),
        }
        let mut body = template.body.clone();
        if let Value::Object(map) = &mut body {
            map.insert("email".into(), Value::String(known.email.clone()));
            map.insert("password".into(), Value::String(known.password.clone()));
            if map.contains_key("confirmPassword") {
                map.insert("confirmPassword".into(), Value::String(known.password.clone()));
            }
        }
        let created = self.create_actor(role, &CredentialTemplate::new(body)).await?;
        self.authenticate(created).await
    }

    fn extract_id(&self, body: &Value) -> Option<Value> {
        self.endpoints
            .id_fields
            .iter()
            .find_map(|f| field_at(body, f))
            .filter(|v| !v.is_null())
            .cloned()
    }
}
