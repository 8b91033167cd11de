//! Outputs capturados disponibles para resolver referencias `{{step.campo}}`.
use indexmap::IndexMap;
use serde_json::Value;

use super::path::field_at;
use crate::errors::ProbeError;
use crate::step::Captured;

/// Nombre reservado para variables del escenario (`{{vars.fecha}}`).
pub const VARS_NAMESPACE: &str = "vars";

#[derive(Debug, Clone, Default)]
pub struct CaptureScope {
    steps: IndexMap<String, Captured>,
    vars: IndexMap<String, Value>,
}

impl CaptureScope {
    pub fn new(vars: IndexMap<String, Value>) -> Self {
        Self { steps: IndexMap::new(),
               vars }
    }

    /// Registra el output de un step que pasó.
    pub fn record(&mut self, step: &str, captured: Captured) {
        self.steps.insert(step.to_string(), captured);
    }

    pub fn has_step(&self, step: &str) -> bool {
        self.steps.contains_key(step)
    }

    /// Resuelve una referencia `ns.path`. El namespace es un step o `vars`.
    ///
    /// Las claves capturadas pueden contener puntos (`user.id`), por eso se
    /// prueba primero el prefijo más largo que coincida con una clave.
    pub fn lookup(&self, reference: &str) -> Result<Value, ProbeError> {
        let (ns, rest) = reference.split_once('.')
                                  .ok_or_else(|| ProbeError::Template(format!("reference '{reference}' lacks a field")))?;
        if ns == VARS_NAMESPACE {
            let (name, path) = rest.split_once('.').unwrap_or((rest, ""));
            return self.vars
                       .get(name)
                       .and_then(|v| field_at(v, path))
                       .cloned()
                       .ok_or_else(|| ProbeError::Template(format!("unknown scenario variable '{rest}'")));
        }
        let captured = self.steps
                           .get(ns)
                           .ok_or_else(|| ProbeError::Template(format!("step '{ns}' has no captured output")))?;
        let segments: Vec<&str> = rest.split('.').collect();
        for split in (1..=segments.len()).rev() {
            let key = segments[..split].join(".");
            if let Some(value) = captured.get(&key) {
                let remainder = segments[split..].join(".");
                if let Some(found) = field_at(value, &remainder) {
                    return Ok(found.clone());
                }
            }
        }
        Err(ProbeError::Template(format!("field '{rest}' not captured by step '{ns}'")))
    }
}
