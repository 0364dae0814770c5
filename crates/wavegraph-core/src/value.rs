//! A small dynamic value type for node properties and events.
//!
//! Mirrors `js::Value` from the original runtime: a tagged union wide enough
//! to carry anything a control-thread instruction or an audio-thread event
//! needs to move across the boundary, without committing this crate to a
//! particular serialization format (JSON (de)serialization is out of scope,
//! see `spec.md` §1).

use std::collections::HashMap;
use std::sync::Arc;

/// Function values are carried opaquely — the core never invokes them.
pub type ValueFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(HashMap<String, Value>),
    Array(Vec<Value>),
    Float32Array(Vec<f32>),
    Function(ValueFn),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Object(o) => write!(f, "Object({} keys)", o.len()),
            Value::Array(a) => write!(f, "Array[{}]", a.len()),
            Value::Float32Array(a) => write!(f, "Float32Array[{}]", a.len()),
            Value::Function(_) => write!(f, "Function(..)"),
        }
    }
}

impl Value {
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[must_use]
    pub fn is_float32_array(&self) -> bool {
        matches!(self, Value::Float32Array(_))
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float32_array(&self) -> Option<&[f32]> {
        match self {
            Value::Float32Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Looks up `key` in an object value, falling back to `default` if this
    /// isn't an object or the key is absent.
    #[must_use]
    pub fn get_with_default<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        match self {
            Value::Object(o) => o.get(key).unwrap_or(default),
            _ => default,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
