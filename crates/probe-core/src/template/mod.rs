//! Plantillas `{{step.campo}}` en paths, bodies y tópicos.
//!
//! - Un string que es exactamente una referencia se reemplaza por el valor
//!   JSON referenciado (los números siguen siendo números).
//! - Referencias dentro de un string más largo se interpolan como texto.
//! - El namespace `vars` apunta a variables del escenario; cualquier otro
//!   namespace es el nombre de un step previo.
pub mod path;
pub mod scope;

use serde_json::{Map, Value};

pub use path::{field_at, to_text, values_match};
pub use scope::{CaptureScope, VARS_NAMESPACE};

use crate::errors::ProbeError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Referencias (contenido entre llaves, sin espacios) presentes en `text`.
pub fn references(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        match after.find(CLOSE) {
            Some(end) => {
                out.push(after[..end].trim().to_string());
                rest = &after[end + CLOSE.len()..];
            }
            None => break,
        }
    }
    out
}

/// Steps referenciados por `text` (excluye `vars`).
pub fn step_refs_in_str(text: &str) -> Vec<String> {
    references(text).into_iter()
                    .filter_map(|r| r.split('.').next().map(str::to_string))
                    .filter(|ns| ns != VARS_NAMESPACE && !ns.is_empty())
                    .collect()
}

/// Steps referenciados en cualquier string dentro de `value`.
pub fn step_refs_in_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => step_refs_in_str(s),
        Value::Array(items) => items.iter().flat_map(step_refs_in_value).collect(),
        Value::Object(map) => map.values().flat_map(step_refs_in_value).collect(),
        _ => Vec::new(),
    }
}

/// Renderiza un string: valor JSON si es una referencia exacta, texto en
/// otro caso.
pub fn render_str(text: &str, scope: &CaptureScope) -> Result<Value, ProbeError> {
    if text.starts_with(OPEN) && text.ends_with(CLOSE) && references(text).len() == 1 {
        let inner = &text[OPEN.len()..text.len() - CLOSE.len()];
        if !inner.contains(OPEN) {
            return scope.lookup(inner.trim());
        }
    }
    render_string(text, scope).map(Value::String)
}

/// Interpola todas las referencias como texto (paths y tópicos).
pub fn render_string(text: &str, scope: &CaptureScope) -> Result<String, ProbeError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let end = after.find(CLOSE)
                       .ok_or_else(|| ProbeError::Template(format!("unterminated reference in '{text}'")))?;
        let value = scope.lookup(after[..end].trim())?;
        out.push_str(&to_text(&value));
        rest = &after[end + CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Renderiza recursivamente los strings de un body JSON. Las claves no se
/// interpretan.
pub fn render_value(value: &Value, scope: &CaptureScope) -> Result<Value, ProbeError> {
    match value {
        Value::String(s) => render_str(s, scope),
        Value::Array(items) => items.iter()
                                    .map(|v| render_value(v, scope))
                                    .collect::<Result<Vec<_>, _>>()
                                    .map(Value::Array),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), render_value(v, scope)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}
