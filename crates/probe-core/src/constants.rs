//! Constantes del harness.
//!
//! `HARNESS_VERSION` participa en el hash de definición de cada escenario:
//! un cambio de versión produce hashes distintos aunque los steps no cambien.

use std::time::Duration;

/// Versión lógica del formato de escenarios.
pub const HARNESS_VERSION: &str = "S1.0";

/// Timeout por defecto de una operación request/response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline por defecto del correlador de eventos push.
pub const DEFAULT_CORRELATION_DEADLINE: Duration = Duration::from_secs(3);

/// Capacidad del buffer entre el canal push y el loop de recepción.
pub const SUBSCRIPTION_BUFFER: usize = 64;

/// Mensaje de diagnóstico cuando el correlador no observa el evento.
pub const CORRELATION_TIMEOUT_MESSAGE: &str = "no real-time delivery within deadline";

/// Mensaje para steps no ejecutados tras abortar el escenario.
pub const ABORTED_MESSAGE: &str = "scenario aborted after setup failure";
