//! Ensamblado del runner con los adaptadores reales y ejecución de
//! escenarios del catálogo.
use std::sync::Arc;

use log::info;
use probe_adapters::{HttpServiceClient, StompPushChannel, WebFrontendSurface};
use probe_core::{ScenarioReport, ScenarioRunner};
use probe_scenarios::{builtin, BuiltinScenario, CATALOG};

use crate::config::HarnessConfig;
use crate::errors::CoreError;

/// Runner conectado al servicio, al broker STOMP y al frontend configurados.
pub fn build_runner(config: &HarnessConfig) -> Result<ScenarioRunner, CoreError> {
    let client = HttpServiceClient::new(&config.api_url, config.step_timeout)?;
    let push = StompPushChannel::new(&config.ws_url, config.step_timeout)?;
    let frontend = WebFrontendSurface::new(&config.frontend_url, config.step_timeout)?;
    Ok(ScenarioRunner::new(Arc::new(client)).with_push_channel(Arc::new(push))
                                            .with_surface(Arc::new(frontend))
                                            .with_request_timeout(config.step_timeout)
                                            .with_correlation_deadline(config.correlation_deadline))
}

pub fn lookup(name: &str) -> Result<&'static BuiltinScenario, CoreError> {
    builtin(name).ok_or_else(|| CoreError::UnknownScenario(name.to_string()))
}

/// Ejecuta un escenario del catálogo.
pub async fn run_named(runner: &mut ScenarioRunner, config: &HarnessConfig, name: &str) -> Result<ScenarioReport, CoreError> {
    let definition = lookup(name)?.build(&config.scenario_settings())?;
    info!("running scenario '{}' ({} steps, hash {})", definition.name, definition.len(), definition.definition_hash);
    Ok(runner.run(&definition).await)
}

/// Ejecuta todo el catálogo en orden; cada escenario usa actores propios.
pub async fn run_all(runner: &mut ScenarioRunner, config: &HarnessConfig) -> Result<Vec<ScenarioReport>, CoreError> {
    let mut reports = Vec::with_capacity(CATALOG.len());
    for entry in CATALOG {
        reports.push(run_named(runner, config, entry.name).await?);
    }
    Ok(reports)
}
