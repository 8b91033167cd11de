//! Errores de los adaptadores. Todos llegan al core como
//! `ProbeError::Transport`.
use probe_core::ProbeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid base url '{0}'")] InvalidUrl(String),
    #[error("http: {0}")] Http(#[from] reqwest::Error),
    #[error("websocket: {0}")] WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("stomp: {0}")] Stomp(String),
    #[error("{0} timed out")] Timeout(String),
}

impl From<AdapterError> for ProbeError {
    fn from(e: AdapterError) -> Self {
        ProbeError::Transport(e.to_string())
    }
}
