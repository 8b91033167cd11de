use probe_adapters::AdapterError;
use probe_core::ProbeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Escenario desconocido: {0}")]
    UnknownScenario(String),
    #[error("Escenario inválido: {0}")]
    Scenario(#[from] ProbeError),
    #[error("Error de adaptador: {0}")]
    Adapter(#[from] AdapterError),
    #[error("Error serializando reporte: {0}")]
    Report(#[from] serde_json::Error),
}

impl CoreError {
    /// Código de salida del proceso para errores previos a la ejecución.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
