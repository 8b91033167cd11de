//! JSON canónico: claves de objeto ordenadas, sin espacios.
//!
//! Dos escenarios con los mismos steps producen el mismo texto canónico sin
//! importar el orden de inserción de las claves en los bodies.

use serde_json::Value;
use std::collections::BTreeMap;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let tree: BTreeMap<&String, String> = map.iter().map(|(k, v)| (k, to_canonical_json(v))).collect();
            let items: Vec<String> = tree.into_iter()
                                         .map(|(k, v)| format!("{}:{}", quote(k), v))
                                         .collect();
            format!("{{{}}}", items.join(","))
        }
    }
}

fn quote(s: &str) -> String {
    // serializar un &str nunca falla
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let a = json!({"b": 1, "a": [true, null, "x"]});
        assert_eq!(to_canonical_json(&a), r#"{"a":[true,null,"x"],"b":1}"#);
    }
}
