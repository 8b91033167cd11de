//! connectprobe
//!
//! Harness de verificación multi-actor para HealthConnect:
//! - `config`: configuración desde entorno/.env.
//! - `harness`: ensambla el runner con los adaptadores reales.
//! - `report`: salida de consola y JSON.
//! - `errors`: errores del binario.

pub mod config;
pub mod errors;
pub mod harness;
pub mod report;

pub use config::{config, HarnessConfig};
pub use errors::CoreError;
