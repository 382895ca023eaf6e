//! Primitive field kinds.
//!
//! Strict mode rejects input that is not already of the target type with
//! [`ErrorKind::InvalidDatatype`]. Lenient mode attempts a conversion and
//! reports [`ErrorKind::NonConvertibleValue`] when it fails.

use super::FieldKind;
use crate::context::LoadContext;
use crate::error::{ErrorKind, FieldError};
use crate::value::FieldValue;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Text form of a scalar used by lenient conversions.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrKind;

impl FieldKind for StrKind {
    fn name(&self) -> &'static str {
        "string"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        match value {
            Value::String(s) => Ok(FieldValue::Str(s.clone())),
            _ if context.is_strict() => Err(context.error(
                ErrorKind::InvalidDatatype,
                "Value for this field must be of string data type.",
            )),
            other => Ok(FieldValue::Str(scalar_text(other))),
        }
    }
}

/// Signed 64-bit integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntKind;

impl IntKind {
    fn coerce(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                let f = n.as_f64()?;
                let in_range = f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64;
                in_range.then(|| f.trunc() as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

impl FieldKind for IntKind {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        if let Some(i) = value.as_i64() {
            return Ok(FieldValue::Int(i));
        }
        if context.is_strict() {
            return Err(context.error(
                ErrorKind::InvalidDatatype,
                "Value for this field must be of integer data type.",
            ));
        }
        Self::coerce(value).map(FieldValue::Int).ok_or_else(|| {
            context.error(
                ErrorKind::NonConvertibleValue,
                "Value for this field must be an integer-convertable value.",
            )
        })
    }
}

/// 64-bit floating point numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatKind;

impl FloatKind {
    fn coerce(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl FieldKind for FloatKind {
    fn name(&self) -> &'static str {
        "float"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        if value.is_f64() {
            if let Some(f) = value.as_f64() {
                return Ok(FieldValue::Float(f));
            }
        }
        if context.is_strict() {
            return Err(context.error(
                ErrorKind::InvalidDatatype,
                "Value for this field must be of float data type.",
            ));
        }
        Self::coerce(value).map(FieldValue::Float).ok_or_else(|| {
            context.error(
                ErrorKind::NonConvertibleValue,
                "Value for this field must be a float-convertable value.",
            )
        })
    }
}

/// Booleans, with table driven conversion from text in lenient mode.
#[derive(Debug, Clone)]
pub struct BoolKind {
    true_values: Vec<String>,
    false_values: Vec<String>,
}

impl BoolKind {
    pub const TRUE_VALUES: [&'static str; 7] = ["TRUE", "True", "true", "YES", "Yes", "yes", "1"];
    pub const FALSE_VALUES: [&'static str; 7] = ["FALSE", "False", "false", "NO", "No", "no", "0"];

    /// Use custom conversion tables.
    pub fn with_values<T, F>(true_values: T, false_values: F) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            true_values: true_values.into_iter().map(Into::into).collect(),
            false_values: false_values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn true_values(&self) -> &[String] {
        &self.true_values
    }

    pub fn false_values(&self) -> &[String] {
        &self.false_values
    }
}

impl Default for BoolKind {
    fn default() -> Self {
        Self::with_values(Self::TRUE_VALUES, Self::FALSE_VALUES)
    }
}

impl FieldKind for BoolKind {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        if let Some(b) = value.as_bool() {
            return Ok(FieldValue::Bool(b));
        }
        if context.is_strict() {
            return Err(context.error(
                ErrorKind::InvalidDatatype,
                "Value for this field must be of boolean data type.",
            ));
        }
        let text = scalar_text(value);
        if self.true_values.contains(&text) {
            Ok(FieldValue::Bool(true))
        } else if self.false_values.contains(&text) {
            Ok(FieldValue::Bool(false))
        } else {
            Err(context.error(
                ErrorKind::NonConvertibleValue,
                "Value for this field must be a boolean-convertable value.",
            ))
        }
    }
}

/// Timestamps with offset, loaded from RFC 3339 strings.
///
/// Lenient mode also accepts offset-less ISO 8601 strings (taken as UTC) and
/// unix timestamps in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeKind;

impl DateTimeKind {
    const NAIVE_FORMATS: [&'static str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    fn parse_lenient(value: &Value) -> Option<FieldValue> {
        let parsed = match value {
            Value::String(s) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s).ok().or_else(|| {
                    Self::NAIVE_FORMATS.iter().find_map(|format| {
                        NaiveDateTime::parse_from_str(s, format)
                            .ok()
                            .map(|naive| naive.and_utc().fixed_offset())
                    })
                })
            }
            Value::Number(n) => {
                let secs = n.as_f64()?;
                if !secs.is_finite() {
                    return None;
                }
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
                DateTime::from_timestamp(whole as i64, nanos).map(|utc| utc.fixed_offset())
            }
            _ => None,
        };
        parsed.map(FieldValue::DateTime)
    }
}

impl FieldKind for DateTimeKind {
    fn name(&self) -> &'static str {
        "datetime"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        let strict = context.is_strict();
        match value {
            Value::String(s) if strict => DateTime::parse_from_rfc3339(s)
                .map(FieldValue::DateTime)
                .map_err(|_| {
                    context.error(
                        ErrorKind::NonConvertibleValue,
                        "Value for this field must be a valid RFC 3339 datetime.",
                    )
                }),
            _ if strict => Err(context.error(
                ErrorKind::InvalidDatatype,
                "Value for this field must be of datetime data type.",
            )),
            other => Self::parse_lenient(other).ok_or_else(|| {
                context.error(
                    ErrorKind::NonConvertibleValue,
                    "Value for this field must be a datetime-convertable value.",
                )
            }),
        }
    }

    fn value_set(
        &self,
        value: &FieldValue,
        context: &LoadContext<'_>,
    ) -> Result<FieldValue, FieldError> {
        match value {
            FieldValue::DateTime(_) => Ok(value.clone()),
            other => self.value_load(&other.to_json(), context),
        }
    }
}
