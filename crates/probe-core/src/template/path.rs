//! Acceso a campos anidados por path con puntos (`user.id`, `0.id`).
use serde_json::Value;

/// Devuelve el valor en `path` dentro de `value`. Los segmentos numéricos
/// indexan arrays. Un path vacío devuelve el propio valor.
pub fn field_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
                       Value::Object(map) => map.get(segment),
                       Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                       _ => None,
                   })
}

/// Igualdad tolerante para escalares: `7` y `"7"` se consideran iguales.
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (scalar_text(actual), scalar_text(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Forma textual de un valor para interpolación dentro de strings.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
