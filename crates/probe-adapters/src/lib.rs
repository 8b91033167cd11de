//! probe-adapters: implementaciones reales de las fronteras del core.
//!
//! - `HttpServiceClient`: `ServiceClient` sobre `reqwest`.
//! - `StompPushChannel`: `PushChannel` STOMP 1.2 sobre WebSocket.
//! - `WebFrontendSurface`: `ClientSurface` que verifica rutas del frontend.

pub mod errors;
pub mod http;
pub mod stomp;
pub mod surface;
pub mod websocket;

pub use errors::AdapterError;
pub use http::HttpServiceClient;
pub use stomp::StompFrame;
pub use surface::{WebFrontendSurface, FRONTEND_SURFACE};
pub use websocket::StompPushChannel;
