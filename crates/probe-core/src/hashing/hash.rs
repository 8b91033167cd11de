//! Hash helpers sobre blake3.

use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash del JSON canónico de `value`.
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_hash() {
        let a = json!({"x": 1, "y": {"p": "q", "r": 2}});
        let b = json!({"y": {"r": 2, "p": "q"}, "x": 1});
        assert_eq!(hash_value(&a), hash_value(&b));
        assert_eq!(hash_str("abc").len(), 64);
    }
}
