//! Per-call context objects.
//!
//! A context is created fresh for every field invocation and passed explicitly
//! to field kinds, validators and default producers. Contexts only borrow; they
//! are never stored beyond the call that created them.

use crate::error::{ErrorKind, FieldError, Message};
use crate::field::Field;
use crate::schema::{Schema, SchemaType};
use crate::value::FieldValue;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// The pipeline operation a context belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Loading from raw data.
    Load,
    /// Setting a value programmatically (construction from typed values or update).
    Set,
    /// Dumping back to raw data.
    Dump,
}

/// The value handed to a field during load or set.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    /// Untyped raw data.
    Raw(&'a Value),
    /// A programmatically supplied value.
    Typed(&'a FieldValue),
}

impl Input<'_> {
    pub fn is_null(&self) -> bool {
        match self {
            Input::Raw(value) => value.is_null(),
            Input::Typed(value) => value.is_null(),
        }
    }

    /// Raw form of the input.
    pub fn to_json(&self) -> Value {
        match self {
            Input::Raw(value) => (*value).clone(),
            Input::Typed(value) => value.to_json(),
        }
    }
}

/// Context for loading or setting a single field.
pub struct LoadContext<'a> {
    pub(crate) field: &'a Field,
    pub(crate) field_name: &'a str,
    pub(crate) schema: &'a SchemaType,
    pub(crate) values: &'a HashMap<String, FieldValue>,
    pub(crate) input: Input<'a>,
    pub(crate) operation: Operation,
}

impl<'a> LoadContext<'a> {
    /// The field being processed.
    pub fn field(&self) -> &'a Field {
        self.field
    }

    /// Name of the field being processed.
    pub fn field_name(&self) -> &'a str {
        self.field_name
    }

    /// The schema type the field belongs to.
    pub fn schema(&self) -> &'a SchemaType {
        self.schema
    }

    /// The value handed to the field.
    pub fn input(&self) -> Input<'a> {
        self.input
    }

    /// The raw input, when loading from data.
    pub fn raw_value(&self) -> Option<&'a Value> {
        match self.input {
            Input::Raw(value) => Some(value),
            Input::Typed(_) => None,
        }
    }

    /// Value already stored for another field of the same instance.
    ///
    /// During a load only fields processed earlier in input order are visible.
    pub fn value(&self, name: &str) -> Option<&'a FieldValue> {
        self.values.get(name)
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Whether the field is being reassigned on an existing instance or constructed
    /// from typed values rather than loaded from raw data.
    pub fn is_set(&self) -> bool {
        self.operation == Operation::Set
    }

    /// Whether strict coercion applies to this call.
    pub fn is_strict(&self) -> bool {
        match self.operation {
            Operation::Set => self.field.strict_set_enabled(),
            _ => self.field.strict_load_enabled(),
        }
    }

    /// Build an error of the given kind, letting the field's error formatter
    /// replace the standard message.
    pub fn error(&self, kind: ErrorKind, message: impl Into<Message>) -> FieldError {
        self.field.format_error(
            kind,
            message.into(),
            Some(self.input.to_json()),
            self.operation,
        )
    }
}

/// Context for dumping a single field.
pub struct DumpContext<'a> {
    pub(crate) field: &'a Field,
    pub(crate) field_name: &'a str,
    pub(crate) schema: &'a Schema,
    pub(crate) included: &'a BTreeSet<String>,
}

impl<'a> DumpContext<'a> {
    pub fn field(&self) -> &'a Field {
        self.field
    }

    pub fn field_name(&self) -> &'a str {
        self.field_name
    }

    /// The instance being dumped.
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Names of all fields included in the current dump call.
    pub fn included_fields(&self) -> &'a BTreeSet<String> {
        self.included
    }

    pub fn is_included(&self, name: &str) -> bool {
        self.included.contains(name)
    }

    /// Build an error of the given kind, letting the field's error formatter
    /// replace the standard message.
    pub fn error(&self, kind: ErrorKind, message: impl Into<Message>) -> FieldError {
        let value = self.schema.get_value(self.field_name).ok().map(FieldValue::to_json);
        self.field
            .format_error(kind, message.into(), value, Operation::Dump)
    }
}

/// Information handed to a field's error formatter.
pub struct ErrorFormatterContext<'a> {
    pub(crate) kind: ErrorKind,
    pub(crate) field: &'a Field,
    pub(crate) message: &'a Message,
    pub(crate) value: Option<&'a Value>,
    pub(crate) operation: Operation,
}

impl<'a> ErrorFormatterContext<'a> {
    /// The kind of error being formatted.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn field(&self) -> &'a Field {
        self.field
    }

    /// The standard message that will be used if the formatter declines.
    pub fn default_message(&self) -> &'a Message {
        self.message
    }

    /// The value that caused the error. Some errors, such as a missing
    /// required field, have no value.
    pub fn value(&self) -> Option<&'a Value> {
        self.value
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Context handed to default producers when a field is absent.
pub struct DefaultContext<'a> {
    pub(crate) field: &'a Field,
    pub(crate) field_name: &'a str,
    pub(crate) schema: &'a SchemaType,
    pub(crate) values: &'a HashMap<String, FieldValue>,
}

impl<'a> DefaultContext<'a> {
    pub fn field(&self) -> &'a Field {
        self.field
    }

    pub fn field_name(&self) -> &'a str {
        self.field_name
    }

    pub fn schema(&self) -> &'a SchemaType {
        self.schema
    }

    /// Value stored for another field of the instance being built.
    pub fn value(&self, name: &str) -> Option<&'a FieldValue> {
        self.values.get(name)
    }
}
