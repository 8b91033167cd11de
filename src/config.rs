//! Configuración central del harness.
//! Carga variables de entorno (.env) una sola vez y expone una estructura
//! inmutable. Los flags de la CLI pisan las URLs.
use std::env;
use std::time::Duration;

use once_cell::sync::Lazy;
use probe_core::constants::{DEFAULT_CORRELATION_DEADLINE, DEFAULT_REQUEST_TIMEOUT};
use probe_core::Credentials;
use probe_scenarios::common::{FIXTURE_DOCTOR_EMAIL, FIXTURE_PASSWORD, FIXTURE_PATIENT_EMAIL};
use probe_scenarios::ScenarioSettings;

use crate::errors::CoreError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws/websocket";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:4200";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base del servicio request/response.
    pub api_url: String,
    /// Endpoint WebSocket del canal push (STOMP).
    pub ws_url: String,
    /// Frontend web usado como superficie cliente alternativa.
    pub frontend_url: String,
    pub step_timeout: Duration,
    pub correlation_deadline: Duration,
    pub patient: Credentials,
    pub doctor: Credentials,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_API_URL.into(),
               ws_url: DEFAULT_WS_URL.into(),
               frontend_url: DEFAULT_FRONTEND_URL.into(),
               step_timeout: DEFAULT_REQUEST_TIMEOUT,
               correlation_deadline: DEFAULT_CORRELATION_DEADLINE,
               patient: Credentials::new(FIXTURE_PATIENT_EMAIL, FIXTURE_PASSWORD),
               doctor: Credentials::new(FIXTURE_DOCTOR_EMAIL, FIXTURE_PASSWORD) }
    }
}

/// Instancia global perezosa, evaluada una sola vez.
static CONFIG: Lazy<Result<HarnessConfig, String>> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
    HarnessConfig::from_env().map_err(|e| match e {
                                 CoreError::Config(msg) => msg,
                                 other => other.to_string(),
                             })
});

/// Configuración cargada del entorno.
pub fn config() -> Result<&'static HarnessConfig, CoreError> {
    CONFIG.as_ref().map_err(|msg| CoreError::Config(msg.clone()))
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración desde cualquier fuente clave/valor.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let base = Self::default();
        let text = |key: &str, default: String| lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(default);
        let millis = |key: &str, default: Duration| -> Result<Duration, CoreError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim()
                                .parse::<u64>()
                                .ok()
                                .filter(|ms| *ms > 0)
                                .map(Duration::from_millis)
                                .ok_or_else(|| CoreError::Config(format!("{key} debe ser un entero positivo, recibido '{raw}'"))),
            }
        };
        Ok(Self { api_url: text("PROBE_API_URL", base.api_url),
                  ws_url: text("PROBE_WS_URL", base.ws_url),
                  frontend_url: text("PROBE_FRONTEND_URL", base.frontend_url),
                  step_timeout: millis("PROBE_STEP_TIMEOUT_MS", base.step_timeout)?,
                  correlation_deadline: millis("PROBE_CORRELATION_DEADLINE_MS", base.correlation_deadline)?,
                  patient: Credentials::new(text("PROBE_PATIENT_EMAIL", base.patient.email),
                                            text("PROBE_PATIENT_PASSWORD", base.patient.password)),
                  doctor: Credentials::new(text("PROBE_DOCTOR_EMAIL", base.doctor.email),
                                           text("PROBE_DOCTOR_PASSWORD", base.doctor.password)) })
    }

    /// Aplica overrides de la CLI.
    pub fn with_overrides(mut self, api_url: Option<String>, ws_url: Option<String>, frontend_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(url) = ws_url {
            self.ws_url = url;
        }
        if let Some(url) = frontend_url {
            self.frontend_url = url;
        }
        self
    }

    pub fn scenario_settings(&self) -> ScenarioSettings {
        ScenarioSettings { patient: self.patient.clone(),
                           doctor: self.doctor.clone(),
                           correlation_deadline: self.correlation_deadline,
                           ..ScenarioSettings::default() }
    }
}
