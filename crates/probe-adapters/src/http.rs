//! Cliente HTTP del servicio bajo prueba (`reqwest`).
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use probe_core::{ProbeError, ServiceClient, ServiceRequest, ServiceResponse, Verb};
use reqwest::{Client, Method};
use serde_json::Value;

use crate::errors::AdapterError;

pub struct HttpServiceClient {
    client: Client,
    base_url: String,
}

impl HttpServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, AdapterError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AdapterError::InvalidUrl(base_url));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn method(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Patch => Method::PATCH,
        Verb::Delete => Method::DELETE,
    }
}

/// JSON si se puede; texto plano como string; vacío como null.
pub(crate) fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl ServiceClient for HttpServiceClient {
    async fn send(&self, request: ServiceRequest) -> Result<ServiceResponse, ProbeError> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(method(request.verb), &url);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| transport(&request, e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| transport(&request, e))?;
        debug!("{} {url} -> {status}", request.verb);
        Ok(ServiceResponse::new(status, decode_body(&text)))
    }
}

fn transport(request: &ServiceRequest, e: reqwest::Error) -> ProbeError {
    let target = format!("{} {}", request.verb, request.path);
    if e.is_timeout() {
        AdapterError::Timeout(target).into()
    } else {
        ProbeError::Transport(format!("{target}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn urls_join_without_double_slashes() {
        assert_eq!(join_url("http://localhost:8080/", "/api/health"), "http://localhost:8080/api/health");
        assert_eq!(join_url("http://h", "api/x"), "http://h/api/x");
        assert_eq!(join_url("http://h", "https://other/x"), "https://other/x");
    }

    #[test]
    fn bodies_decode_leniently() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(decode_body("OK"), json!("OK"));
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(HttpServiceClient::new("localhost:8080", Duration::from_secs(1)).is_err());
        let c = HttpServiceClient::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url(), "http://localhost:8080");
    }
}
