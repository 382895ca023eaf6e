//! Field validators.
//!
//! A validator inspects a value and either accepts it or signals failure with a
//! [`ValidatorError`]. Raw validators run on the input before coercion; normal
//! validators run on the coerced value. Each field keeps both lists in a
//! [`ValidatorSet`], in registration order.

use crate::context::LoadContext;
use crate::error::{
    ErrorKind, FieldError, Message, SchemaError, SchemaResult, VALIDATION_FAILED_MESSAGE,
};
use crate::value::FieldValue;
use std::fmt;
use std::sync::Arc;

/// How a validator signals failure.
///
/// All three variants are normalized to a [`FieldError`] of kind
/// [`ErrorKind::ValidationFailed`]; an empty message is replaced with
/// `"Validation failed"`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidatorError {
    /// The value is unacceptable.
    #[error("{0}")]
    Value(String),

    /// A checked condition did not hold.
    #[error("{0}")]
    Assertion(String),

    /// A fully formed field error payload.
    #[error("{0}")]
    Field(Message),
}

impl ValidatorError {
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value(message.into())
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    pub fn field(message: impl Into<Message>) -> Self {
        Self::Field(message.into())
    }

    /// Fail with `message` unless `condition` holds.
    pub fn ensure(condition: bool, message: impl Into<String>) -> ValidatorResult {
        if condition {
            Ok(())
        } else {
            Err(Self::assertion(message))
        }
    }
}

impl From<ValidatorError> for FieldError {
    fn from(error: ValidatorError) -> Self {
        let message = match error {
            ValidatorError::Value(text) | ValidatorError::Assertion(text) => Message::Text(text),
            ValidatorError::Field(message) => message,
        };
        if message.is_empty() {
            FieldError::new(ErrorKind::ValidationFailed, VALIDATION_FAILED_MESSAGE)
        } else {
            FieldError::new(ErrorKind::ValidationFailed, message)
        }
    }
}

pub type ValidatorResult = Result<(), ValidatorError>;

/// A field validator.
pub trait Validator: Send + Sync {
    /// Check a value.
    ///
    /// For raw validators `value` is the uncoerced input; for normal validators
    /// it is the value produced by the field.
    fn validate(&self, value: &FieldValue, context: &LoadContext<'_>) -> ValidatorResult;

    /// Whether this validator runs before coercion.
    fn is_raw(&self) -> bool {
        false
    }

    /// Short description used in debug output.
    fn describe(&self) -> String {
        "validator".to_string()
    }
}

type ValidatorFn = dyn Fn(&FieldValue, &LoadContext<'_>) -> ValidatorResult + Send + Sync;

/// Adapter turning a closure into a [`Validator`].
pub struct FnValidator {
    func: Box<ValidatorFn>,
    raw: bool,
}

impl Validator for FnValidator {
    fn validate(&self, value: &FieldValue, context: &LoadContext<'_>) -> ValidatorResult {
        (self.func)(value, context)
    }

    fn is_raw(&self) -> bool {
        self.raw
    }

    fn describe(&self) -> String {
        if self.raw {
            "raw fn validator".to_string()
        } else {
            "fn validator".to_string()
        }
    }
}

/// Wrap a closure as a normal (post-coercion) validator.
pub fn from_fn<F>(func: F) -> Arc<dyn Validator>
where
    F: Fn(&FieldValue, &LoadContext<'_>) -> ValidatorResult + Send + Sync + 'static,
{
    Arc::new(FnValidator {
        func: Box::new(func),
        raw: false,
    })
}

/// Wrap a closure as a raw (pre-coercion) validator.
pub fn raw_fn<F>(func: F) -> Arc<dyn Validator>
where
    F: Fn(&FieldValue, &LoadContext<'_>) -> ValidatorResult + Send + Sync + 'static,
{
    Arc::new(FnValidator {
        func: Box::new(func),
        raw: true,
    })
}

/// Checks that an integer lies within an inclusive range.
///
/// `Range::new(2, 10)` accepts 2 through 10; `Range::upto(5)` accepts 0 through 5.
/// Empty ranges are rejected with [`SchemaError::InvalidRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    lower: i64,
    upper: i64,
    message: String,
}

impl Range {
    pub fn new(lower: i64, upper: i64) -> SchemaResult<Self> {
        if lower > upper {
            return Err(SchemaError::InvalidRange { lower, upper });
        }
        let message = if lower == upper {
            format!("Value must be equal to {lower}")
        } else {
            format!("Value must be in range {lower} to {upper} inclusive")
        };
        Ok(Self {
            lower,
            upper,
            message,
        })
    }

    pub fn upto(upper: i64) -> SchemaResult<Self> {
        Self::new(0, upper)
    }

    /// Build from a half-open standard range; the end stays exclusive.
    pub fn from_std(range: std::ops::Range<i64>) -> SchemaResult<Self> {
        if range.is_empty() {
            return Err(SchemaError::InvalidRange {
                lower: range.start,
                upper: range.end,
            });
        }
        Self::new(range.start, range.end - 1)
    }

    pub fn lower(&self) -> i64 {
        self.lower
    }

    pub fn upper(&self) -> i64 {
        self.upper
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

impl Validator for Range {
    fn validate(&self, value: &FieldValue, _context: &LoadContext<'_>) -> ValidatorResult {
        let within = value.as_i64().is_some_and(|v| self.contains(v));
        ValidatorError::ensure(within, self.message.clone())
    }

    fn describe(&self) -> String {
        format!("Range({}, {})", self.lower, self.upper)
    }
}

/// Ordered raw and normal validator lists of one field.
#[derive(Clone, Default)]
pub struct ValidatorSet {
    normal: Vec<Arc<dyn Validator>>,
    raw: Vec<Arc<dyn Validator>>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator in the list chosen by [`Validator::is_raw`].
    pub fn add(&mut self, validator: Arc<dyn Validator>) {
        if validator.is_raw() {
            self.raw.push(validator);
        } else {
            self.normal.push(validator);
        }
    }

    /// Remove a previously registered validator. Returns whether it was found.
    pub fn remove(&mut self, validator: &Arc<dyn Validator>) -> bool {
        let list = if validator.is_raw() {
            &mut self.raw
        } else {
            &mut self.normal
        };
        match list.iter().position(|v| Arc::ptr_eq(v, validator)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove validators: all when `raw` is `None`, otherwise only that list.
    pub fn clear(&mut self, raw: Option<bool>) {
        match raw {
            None => {
                self.normal.clear();
                self.raw.clear();
            }
            Some(true) => self.raw.clear(),
            Some(false) => self.normal.clear(),
        }
    }

    /// Iterate validators: all (normal first) when `raw` is `None`, otherwise one list.
    pub fn walk(&self, raw: Option<bool>) -> impl Iterator<Item = &Arc<dyn Validator>> {
        let (first, second) = match raw {
            None => (self.normal.as_slice(), self.raw.as_slice()),
            Some(true) => (self.raw.as_slice(), &[][..]),
            Some(false) => (self.normal.as_slice(), &[][..]),
        };
        first.iter().chain(second.iter())
    }

    pub fn normal(&self) -> &[Arc<dyn Validator>] {
        &self.normal
    }

    pub fn raw(&self) -> &[Arc<dyn Validator>] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.normal.len() + self.raw.len()
    }
}

impl fmt::Debug for ValidatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorSet")
            .field(
                "normal",
                &self.normal.iter().map(|v| v.describe()).collect::<Vec<_>>(),
            )
            .field("raw", &self.raw.iter().map(|v| v.describe()).collect::<Vec<_>>())
            .finish()
    }
}

/// Run every validator; failures do not short-circuit.
pub(crate) fn run_all<'v>(
    validators: impl Iterator<Item = &'v Arc<dyn Validator>>,
    value: &FieldValue,
    context: &LoadContext<'_>,
) -> Vec<FieldError> {
    validators
        .filter_map(|validator| validator.validate(value, context).err())
        .map(FieldError::from)
        .collect()
}
