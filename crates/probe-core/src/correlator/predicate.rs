use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::errors::ProbeError;
use crate::template::{field_at, render_value, step_refs_in_value, values_match, CaptureScope};

type Matcher = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Predicado de correlación evaluado sobre cada payload recibido.
#[derive(Clone)]
pub enum EventPredicate {
    Any,
    /// `expected` puede ser una plantilla; se resuelve al armar.
    FieldEquals { field: String, expected: Value },
    Custom(Matcher),
}

impl EventPredicate {
    pub fn field_equals(field: impl Into<String>, expected: impl Into<Value>) -> Self {
        EventPredicate::FieldEquals { field: field.into(),
                                      expected: expected.into() }
    }

    pub fn custom(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        EventPredicate::Custom(Arc::new(f))
    }

    pub fn matches(&self, event: &Value) -> bool {
        match self {
            EventPredicate::Any => true,
            EventPredicate::FieldEquals { field, expected } => {
                field_at(event, field).map(|v| values_match(v, expected)).unwrap_or(false)
            }
            EventPredicate::Custom(f) => f(event),
        }
    }

    /// Copia con las referencias de plantilla resueltas.
    pub fn resolve(&self, scope: &CaptureScope) -> Result<Self, ProbeError> {
        match self {
            EventPredicate::FieldEquals { field, expected } => {
                Ok(EventPredicate::FieldEquals { field: field.clone(),
                                                 expected: render_value(expected, scope)? })
            }
            other => Ok(other.clone()),
        }
    }

    pub fn step_refs(&self) -> Vec<String> {
        match self {
            EventPredicate::FieldEquals { expected, .. } => step_refs_in_value(expected),
            _ => Vec::new(),
        }
    }

    pub fn fingerprint_json(&self) -> Value {
        match self {
            EventPredicate::Any => json!("any"),
            EventPredicate::FieldEquals { field, expected } => json!({ "field": field, "equals": expected }),
            EventPredicate::Custom(_) => json!("custom"),
        }
    }
}

impl fmt::Debug for EventPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPredicate::Any => f.write_str("Any"),
            EventPredicate::FieldEquals { field, expected } => {
                f.debug_struct("FieldEquals").field("field", field).field("expected", expected).finish()
            }
            EventPredicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for EventPredicate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EventPredicate::Any, EventPredicate::Any) => true,
            (EventPredicate::FieldEquals { field: a, expected: x }, EventPredicate::FieldEquals { field: b, expected: y }) => {
                a == b && x == y
            }
            (EventPredicate::Custom(a), EventPredicate::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
