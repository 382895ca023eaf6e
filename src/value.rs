//! Loaded field values.
//!
//! Raw data enters and leaves the engine as [`serde_json::Value`]; once a field
//! has coerced its input the result is stored as a [`FieldValue`].

use crate::schema::Schema;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::{Number, Value};
use std::fmt;

/// A coerced, validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicit null, only stored for nullable fields.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<FixedOffset>),
    /// Structural values (lists, sets, dictionaries, untyped values).
    Json(Value),
    /// A loaded nested schema.
    Object(Box<Schema>),
}

impl FieldValue {
    /// Convert a raw value without any coercion.
    ///
    /// Scalars map to their typed variant; arrays, objects and numbers that do
    /// not fit an `i64` or `f64` are kept as [`FieldValue::Json`].
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if n.is_f64() {
                    n.as_f64()
                        .map(FieldValue::Float)
                        .unwrap_or_else(|| FieldValue::Json(value.clone()))
                } else {
                    FieldValue::Json(value.clone())
                }
            }
            Value::String(s) => FieldValue::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => FieldValue::Json(value.clone()),
        }
    }

    /// Plain raw representation of the value.
    ///
    /// Nested schemas are converted through [`Schema::to_json`]; non-finite
    /// floats become null.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            FieldValue::Json(v) => v.clone(),
            FieldValue::Object(schema) => schema.to_json(),
        }
    }

    /// Short name of the value's type, used in messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Json(Value::Array(_)) => "array",
            FieldValue::Json(Value::Object(_)) => "object",
            FieldValue::Json(_) => "json",
            FieldValue::Object(_) => "schema",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            FieldValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Schema> {
        match self {
            FieldValue::Object(schema) => Some(schema),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<Schema> for FieldValue {
    fn from(value: Schema) -> Self {
        FieldValue::Object(Box::new(value))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::from_json(&value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Python-style representation of a raw value, used in structural messages.
pub(crate) fn repr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

/// Type name of a raw value as used in structural messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_maps_scalars_to_typed_variants() {
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from_json(&json!(5)), FieldValue::Int(5));
        assert_eq!(FieldValue::from_json(&json!(2.5)), FieldValue::Float(2.5));
        assert_eq!(FieldValue::from_json(&json!("x")), FieldValue::Str("x".into()));
        assert_eq!(
            FieldValue::from_json(&json!([1, 2])),
            FieldValue::Json(json!([1, 2]))
        );
    }

    #[test]
    fn test_u64_beyond_i64_stays_json() {
        let big = json!(u64::MAX);
        assert_eq!(FieldValue::from_json(&big), FieldValue::Json(big.clone()));
    }

    #[test]
    fn test_non_finite_float_dumps_as_null() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(FieldValue::Float(1.5).to_json(), json!(1.5));
    }

    #[test]
    fn test_datetime_renders_rfc3339() {
        let dt = DateTime::parse_from_rfc3339("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(
            FieldValue::DateTime(dt).to_json(),
            json!("2024-03-01T10:00:00+02:00")
        );
    }

    #[test]
    fn test_repr_quotes_strings_only() {
        assert_eq!(repr(&json!("a")), "'a'");
        assert_eq!(repr(&json!(3.14)), "3.14");
        assert_eq!(json_type_name(&json!(3.14)), "float");
        assert_eq!(json_type_name(&json!(3)), "int");
    }
}
