//! JSON value model used by the rule engine.
//!
//! The engine only ever needs two things from a parsed body: descending into
//! nested objects by key, and reading a scalar leaf. [`Object`] is a borrowed
//! view over a `serde_json` object providing exactly those two lookups, and
//! [`Scalar`] is the closed set of leaf values a rule can convert.
//!
//! `null`, arrays and objects are not scalars. Reading one of them as a leaf
//! is a lookup failure, which the engine treats as a missing value.

use serde_json::{Map, Value};
use thiserror::Error;

/// A JSON leaf value.
///
/// Integer literals that fit into `i64` are [`Int`](Scalar::Int); every other
/// number becomes [`Float`](Scalar::Float).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Returns the scalar held by `value`, or `None` for null, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Int(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// Failure to resolve a key on an [`Object`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("key '{0}' missing")]
    NotFound(String),
    #[error("key '{0}' is not an object")]
    NotAnObject(String),
    #[error("key '{0}' is not a value type")]
    NotAScalar(String),
}

/// Borrowed view over a JSON object node.
#[derive(Debug, Clone, Copy)]
pub struct Object<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Object<'a> {
    /// Views `value` as an object, or returns `None` if it is any other kind of node.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|fields| Self { fields })
    }

    /// Descends into the nested object stored under `key`.
    pub fn object(&self, key: &str) -> Result<Object<'a>, LookupError> {
        let value = self
            .fields
            .get(key)
            .ok_or_else(|| LookupError::NotFound(key.to_owned()))?;
        Object::from_value(value).ok_or_else(|| LookupError::NotAnObject(key.to_owned()))
    }

    /// Reads the scalar stored under `key`.
    pub fn scalar(&self, key: &str) -> Result<Scalar, LookupError> {
        let value = self
            .fields
            .get(key)
            .ok_or_else(|| LookupError::NotFound(key.to_owned()))?;
        Scalar::from_json(value).ok_or_else(|| LookupError::NotAScalar(key.to_owned()))
    }
}
