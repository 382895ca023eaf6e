//! Error types for schema loading, dumping and definition.
//!
//! Two families of errors exist and they never mix:
//!
//! - **Data errors** ([`FieldError`], aggregated into [`ValidationError`]) describe
//!   problems with the values being loaded or dumped. They are accumulated across
//!   a whole operation so the caller sees every problem at once.
//! - **Usage errors** ([`SchemaError`]) describe misuse of the API, such as binding
//!   a field twice or passing both `include` and `exclude`. They are returned
//!   immediately and are never part of a [`ValidationError`].

use crate::context::Operation;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Key used in [`ValidationError::raw`] for errors that are not tied to a field.
pub const NON_FIELD_KEY: &str = "_schema";

/// Fallback message for validator failures that carry no message of their own.
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";

/// Category of a single field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An input key matches no declared field.
    UnknownField,
    /// A required field is absent from the input.
    FieldRequired,
    /// Null was given to a non-nullable field.
    NoneDisallowed,
    /// Strict mode type mismatch.
    InvalidDatatype,
    /// Lenient mode coercion failed.
    NonConvertibleValue,
    /// A collection, union, literal or typed structure did not match.
    StructuralValidation,
    /// A user validator signalled failure.
    ValidationFailed,
    /// A nested schema failed to load.
    NestedValidation,
    /// A value could not be converted back to raw form.
    DumpFailed,
}

impl ErrorKind {
    /// Stable machine readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnknownField => "field.unknown",
            ErrorKind::FieldRequired => "field.required",
            ErrorKind::NoneDisallowed => "field.none_disallowed",
            ErrorKind::InvalidDatatype => "field.invalid_datatype",
            ErrorKind::NonConvertibleValue => "field.nonconvertible_value",
            ErrorKind::StructuralValidation => "field.structural_validation",
            ErrorKind::ValidationFailed => "field.validation_failed",
            ErrorKind::NestedValidation => "field.nested_validation",
            ErrorKind::DumpFailed => "field.dump_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The payload of a [`FieldError`].
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A single human readable message.
    Text(String),
    /// Several messages raised together, e.g. one per failing collection element.
    List(Vec<String>),
    /// The structured report of a nested schema, in [`ValidationError::raw`] form.
    Nested(Value),
}

impl Message {
    /// Whether the message carries no text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Message::Text(text) => text.trim().is_empty(),
            Message::List(items) => items.iter().all(|item| item.trim().is_empty()),
            Message::Nested(value) => value.as_object().is_some_and(Map::is_empty),
        }
    }

    /// Appends the raw form of this message to a field's message list.
    fn push_raw(&self, out: &mut Vec<Value>) {
        match self {
            Message::Text(text) => out.push(Value::String(text.clone())),
            Message::List(items) => out.extend(items.iter().cloned().map(Value::String)),
            Message::Nested(value) => out.push(value.clone()),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(text),
            Message::List(items) => f.write_str(&items.join("; ")),
            Message::Nested(value) => {
                let mut lines = Vec::new();
                format_tree(value, 0, &mut lines);
                f.write_str(&lines.join("\n"))
            }
        }
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message::Text(value.to_string())
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Message::Text(value)
    }
}

impl From<Vec<String>> for Message {
    fn from(value: Vec<String>) -> Self {
        Message::List(value)
    }
}

/// A single validation failure attributed to one field.
///
/// Field kinds and validators create unbound errors with [`FieldError::new`];
/// the load and dump pipelines then attach the field name, the raw key and
/// the operation before collecting them into a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    kind: ErrorKind,
    message: Message,
    key: Option<String>,
    field_name: Option<String>,
    operation: Option<Operation>,
    value: Option<Value>,
}

impl FieldError {
    /// Create an unbound error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<Message>) -> Self {
        Self {
            kind,
            message: message.into(),
            key: None,
            field_name: None,
            operation: None,
            value: None,
        }
    }

    /// Create a custom validation error.
    pub fn custom(message: impl Into<Message>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    /// Wrap an arbitrary error raised while processing a value.
    pub fn wrap<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let text = error.to_string();
        if text.trim().is_empty() {
            Self::custom(VALIDATION_FAILED_MESSAGE)
        } else {
            Self::custom(text)
        }
    }

    /// Create an "unknown field" error for a raw input key.
    pub fn unknown_field(key: impl Into<String>) -> Self {
        let key = key.into();
        let mut error = Self::new(ErrorKind::UnknownField, "Invalid or unknown field.");
        error.key = Some(key);
        error
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The error payload.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The raw data key this error is reported under.
    ///
    /// For unknown-field errors this is the unmatched input key.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Name of the field that raised the error, if it was resolved.
    pub fn field_name(&self) -> Option<&str> {
        self.field_name.as_deref()
    }

    /// The operation that was running when the error was raised.
    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    /// The raw value under consideration when the error was raised.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether the error has been attributed to a field.
    pub fn is_bound(&self) -> bool {
        self.field_name.is_some()
    }

    pub(crate) fn with_value(mut self, value: Option<Value>) -> Self {
        if self.value.is_none() {
            self.value = value;
        }
        self
    }

    pub(crate) fn bind(mut self, field_name: &str, key: &str, operation: Operation) -> Self {
        self.field_name = Some(field_name.to_string());
        self.key = Some(key.to_string());
        self.operation = Some(operation);
        self
    }

    pub(crate) fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }
}

type ClassFormatter = Arc<dyn Fn(&ValidationError) -> String + Send + Sync>;

/// The class of aggregate error raised on validation failure.
///
/// Every class shares the structure of [`ValidationError`], so
/// [`ValidationError::raw`] stays stable regardless of the configured class.
/// A class only changes the name callers can match on and, optionally,
/// the human readable rendering.
#[derive(Clone)]
pub struct ErrorClass {
    name: Arc<str>,
    formatter: Option<ClassFormatter>,
}

impl ErrorClass {
    /// Name of the base class.
    pub const BASE: &'static str = "ValidationError";

    /// The base aggregate error class.
    pub fn base() -> Self {
        Self {
            name: Arc::from(Self::BASE),
            formatter: None,
        }
    }

    /// Declare a named error class.
    pub fn new(name: impl Into<String>) -> SchemaResult<Self> {
        let name = name.into();
        if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
            return Err(SchemaError::invalid_config(format!(
                "validation_error_class must be a non-empty identifier, got '{name}'"
            )));
        }
        Ok(Self {
            name: Arc::from(name),
            formatter: None,
        })
    }

    /// Replace the human readable rendering of errors of this class.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&ValidationError) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// The class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the base class.
    pub fn is_base(&self) -> bool {
        &*self.name == Self::BASE
    }
}

impl Default for ErrorClass {
    fn default() -> Self {
        Self::base()
    }
}

impl PartialEq for ErrorClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClass")
            .field("name", &self.name)
            .field("custom_formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Aggregate error raised when one or more fields fail during a load, set or dump.
///
/// The underlying error list keeps raw occurrence order; [`ValidationError::raw`]
/// groups the errors by key in first-seen order.
#[derive(Debug, Clone)]
pub struct ValidationError {
    errors: Vec<FieldError>,
    class: ErrorClass,
}

impl ValidationError {
    /// Create an aggregate error of the base class.
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self::with_class(errors, ErrorClass::base())
    }

    /// Create an aggregate error of a specific class.
    pub fn with_class(errors: Vec<FieldError>, class: ErrorClass) -> Self {
        Self { errors, class }
    }

    /// The collected errors, in occurrence order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consume the aggregate and return the collected errors.
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The class this error was raised as.
    pub fn class(&self) -> &ErrorClass {
        &self.class
    }

    /// Errors reported under the given key.
    pub fn errors_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors
            .iter()
            .filter(move |error| error.key() == Some(key))
    }

    /// Keys with at least one error, in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for error in &self.errors {
            let key = error.key().unwrap_or(NON_FIELD_KEY);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Structured, serializable error report.
    ///
    /// Top-level keys are the raw keys of failing fields in first-seen order;
    /// values are lists of messages. A failing nested schema contributes a
    /// nested mapping of the same shape in place of a message string.
    pub fn raw(&self) -> Value {
        let mut out = Map::new();
        for error in &self.errors {
            let key = error.key().unwrap_or(NON_FIELD_KEY).to_string();
            let entry = out
                .entry(key)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(messages) = entry {
                error.message().push_raw(messages);
            }
        }
        Value::Object(out)
    }

    /// Human readable tree rendering of the report.
    pub fn tree(&self) -> String {
        let mut lines = Vec::new();
        format_tree(&self.raw(), 0, &mut lines);
        lines.join("\n")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class.formatter {
            Some(formatter) => f.write_str(&formatter(self)),
            None => write!(f, "Validation failed for this schema:\n{}", self.tree()),
        }
    }
}

impl std::error::Error for ValidationError {}

fn format_tree(raw: &Value, indent: usize, lines: &mut Vec<String>) {
    let Some(fields) = raw.as_object() else {
        lines.push(format!("{}Error: {}", "  ".repeat(indent), raw));
        return;
    };
    for (key, messages) in fields {
        lines.push(format!("{}In field {}:", "  ".repeat(indent), key));
        let items = messages.as_array().map(Vec::as_slice).unwrap_or_default();
        for message in items {
            match message {
                Value::Object(_) => format_tree(message, indent + 2, lines),
                Value::String(text) => {
                    lines.push(format!("{}Error: {}", "  ".repeat(indent + 2), text))
                }
                other => lines.push(format!("{}Error: {}", "  ".repeat(indent + 2), other)),
            }
        }
    }
}

/// Usage errors raised immediately when the API is misused.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A field definition was attached to a second schema without being copied.
    #[error("Field {schema}.{name} is already bound to {bound_schema}.{bound_name}")]
    FieldAlreadyBound {
        schema: String,
        name: String,
        bound_schema: String,
        bound_name: String,
    },

    /// Two fields share a name within one schema declaration.
    #[error("Duplicate field '{name}' in schema '{schema}'")]
    DuplicateField { schema: String, name: String },

    /// Two fields resolve to the same load key.
    #[error("Duplicate load key '{key}' in schema '{schema}'")]
    DuplicateKey { schema: String, key: String },

    /// A validator was registered for a field the schema does not declare.
    #[error("Validator registered for unknown field '{name}' in schema '{schema}'")]
    UnknownValidatorTarget { schema: String, name: String },

    /// `include` and `exclude` were both given.
    #[error("include and exclude are mutually exclusive")]
    IncludeExcludeConflict,

    /// Neither `include` nor `exclude` was given where one is required.
    #[error("one of include or exclude must be provided")]
    MissingIncludeExclude,

    /// A field name that the schema does not declare.
    #[error("Unknown field '{name}' for schema '{schema}'")]
    UnknownField { schema: String, name: String },

    /// A declared field that holds no value.
    #[error("Value for field '{name}' is not set")]
    FieldNotSet { name: String },

    /// A configuration value was rejected.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A range validator was given bounds that admit no value.
    #[error("Invalid range: lower bound {lower} exceeds upper bound {upper}")]
    InvalidRange { lower: i64, upper: i64 },

    /// A referenced schema is not registered.
    #[error("Schema not found: {name}")]
    SchemaNotFound { name: String },

    /// A type expression could not be parsed.
    #[error("Invalid type expression '{expr}': {message}")]
    InvalidTypeExpr { expr: String, message: String },

    /// A declarative schema document is malformed.
    #[error("Invalid schema definition: {message}")]
    InvalidDefinition { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A definition file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Create an unknown field error
    pub fn unknown_field(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownField {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Create a field-not-set error
    pub fn field_not_set(name: impl Into<String>) -> Self {
        Self::FieldNotSet { name: name.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid definition error
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            message: message.into(),
        }
    }

    /// Create a type expression parse error
    pub fn invalid_type_expr(expr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTypeExpr {
            expr: expr.into(),
            message: message.into(),
        }
    }
}

/// Umbrella error for operations that can fail with either bad data or misuse.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Data did not validate
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The API was misused
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl Error {
    /// The aggregate validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(error) => Some(error),
            Error::Schema(_) => None,
        }
    }

    /// The usage error, if this is one.
    pub fn as_schema(&self) -> Option<&SchemaError> {
        match self {
            Error::Schema(error) => Some(error),
            Error::Validation(_) => None,
        }
    }
}

// Result type aliases for convenience
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
pub type Result<T> = std::result::Result<T, Error>;
