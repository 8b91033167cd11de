//! Superficie cliente alternativa: el frontend web.
//!
//! No automatiza un navegador; verifica que cada ruta del frontend responda
//! 2xx. Sirve como eje "cliente" del diagnóstico.
use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use probe_core::{ClientSurface, ProbeError};
use reqwest::Client;
use serde_json::{json, Value};

use crate::errors::AdapterError;
use crate::http::join_url;

pub const FRONTEND_SURFACE: &str = "frontend";

pub struct WebFrontendSurface {
    client: Client,
    base_url: String,
    routes: BTreeMap<String, String>,
}

impl WebFrontendSurface {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AdapterError> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AdapterError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        let routes = [("home", "/"),
                      ("book", "/appointments/book"),
                      ("appointments", "/appointments"),
                      ("chat", "/chat"),
                      ("ai-health-bot", "/ai-health-bot")].into_iter()
                                                          .map(|(a, r)| (a.to_string(), r.to_string()))
                                                          .collect();
        Ok(Self { client,
                  base_url: base_url.trim_end_matches('/').to_string(),
                  routes })
    }

    pub fn with_route(mut self, action: &str, route: &str) -> Self {
        self.routes.insert(action.to_string(), route.to_string());
        self
    }

    /// `visit` usa `params.route`; el resto de acciones, su ruta registrada.
    fn route_for(&self, action: &str, params: &Value) -> Result<String, ProbeError> {
        if action == "visit" {
            return Ok(params.get("route").and_then(Value::as_str).unwrap_or("/").to_string());
        }
        self.routes
            .get(action)
            .cloned()
            .ok_or_else(|| ProbeError::InvalidScenario(format!("frontend has no action '{action}'")))
    }
}

#[async_trait]
impl ClientSurface for WebFrontendSurface {
    fn name(&self) -> &str {
        FRONTEND_SURFACE
    }

    async fn perform(&self, action: &str, params: &Value) -> Result<Value, ProbeError> {
        let route = self.route_for(action, params)?;
        let url = join_url(&self.base_url, &route);
        let response = self.client
                           .get(&url)
                           .send()
                           .await
                           .map_err(|e| ProbeError::Transport(format!("frontend {route}: {e}")))?;
        let status = response.status().as_u16();
        debug!("frontend GET {url} -> {status}");
        if !response.status().is_success() {
            return Err(ProbeError::Transport(format!("frontend {route} answered {status}")));
        }
        Ok(json!({ "route": route, "status": status }))
    }
}
