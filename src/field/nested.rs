//! Nested schema field kinds.
//!
//! A failing nested load is reported as a single error on the parent field
//! whose message is the nested report, so the parent's report nests one level
//! deeper per nesting level.

use super::FieldKind;
use crate::context::{DumpContext, LoadContext};
use crate::error::{ErrorKind, FieldError, Message, SchemaResult, ValidationError};
use crate::schema::SchemaType;
use crate::value::FieldValue;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

fn not_an_object(schema: &SchemaType, context: &LoadContext<'_>) -> FieldError {
    context.error(
        ErrorKind::InvalidDatatype,
        format!("Value for this field must be a {} object.", schema.name()),
    )
}

fn nested_failure(error: ValidationError, context: &LoadContext<'_>) -> FieldError {
    context.error(ErrorKind::NestedValidation, Message::Nested(error.raw()))
}

fn dump_nested(value: &FieldValue, context: &DumpContext<'_>) -> Result<Value, FieldError> {
    match value {
        FieldValue::Object(schema) => schema
            .dump()
            .map(Value::Object)
            .map_err(|error| context.error(ErrorKind::DumpFailed, Message::Nested(error.raw()))),
        other => Ok(other.to_json()),
    }
}

/// A nested schema, loaded from a mapping.
#[derive(Debug, Clone)]
pub struct ObjectKind {
    schema: SchemaType,
}

impl ObjectKind {
    pub fn new(schema: &SchemaType) -> Self {
        Self {
            schema: schema.clone(),
        }
    }

    pub fn schema(&self) -> &SchemaType {
        &self.schema
    }
}

impl FieldKind for ObjectKind {
    fn name(&self) -> &'static str {
        "object"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        let Some(map) = value.as_object() else {
            return Err(not_an_object(&self.schema, context));
        };
        self.schema
            .load(map)
            .map(FieldValue::from)
            .map_err(|error| nested_failure(error, context))
    }

    /// Instances of the nested type pass through unchanged.
    fn value_set(
        &self,
        value: &FieldValue,
        context: &LoadContext<'_>,
    ) -> Result<FieldValue, FieldError> {
        match value {
            FieldValue::Object(instance) if instance.schema_type() == &self.schema => {
                Ok(value.clone())
            }
            FieldValue::Json(raw @ Value::Object(_)) => self.value_load(raw, context),
            _ => Err(not_an_object(&self.schema, context)),
        }
    }

    fn value_dump(&self, value: &FieldValue, context: &DumpContext<'_>) -> Result<Value, FieldError> {
        dump_nested(value, context)
    }
}

/// A nested schema restricted to a subset of its fields.
#[derive(Debug, Clone)]
pub struct PartialKind {
    schema: SchemaType,
    fields: Arc<BTreeSet<String>>,
}

impl PartialKind {
    /// Restrict `schema` to the `include`d fields or to all but the `exclude`d
    /// ones. Exactly one of the two must be given.
    pub fn new(
        schema: &SchemaType,
        include: Option<&[&str]>,
        exclude: Option<&[&str]>,
    ) -> SchemaResult<Self> {
        let fields = schema.subset(include, exclude)?;
        Ok(Self {
            schema: schema.clone(),
            fields: Arc::new(fields),
        })
    }

    pub fn schema(&self) -> &SchemaType {
        &self.schema
    }

    /// Names of the fields in the subset.
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }
}

impl FieldKind for PartialKind {
    fn name(&self) -> &'static str {
        "partial"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        let Some(map) = value.as_object() else {
            return Err(not_an_object(&self.schema, context));
        };
        self.schema
            .load_subset(map, Arc::clone(&self.fields))
            .map(FieldValue::from)
            .map_err(|error| nested_failure(error, context))
    }

    /// Instances of the nested type are restricted to the subset.
    fn value_set(
        &self,
        value: &FieldValue,
        context: &LoadContext<'_>,
    ) -> Result<FieldValue, FieldError> {
        match value {
            FieldValue::Object(instance) if instance.schema_type() == &self.schema => Ok(
                FieldValue::from(instance.restrict(Arc::clone(&self.fields))),
            ),
            FieldValue::Json(raw @ Value::Object(_)) => self.value_load(raw, context),
            _ => Err(not_an_object(&self.schema, context)),
        }
    }

    fn value_dump(&self, value: &FieldValue, context: &DumpContext<'_>) -> Result<Value, FieldError> {
        dump_nested(value, context)
    }
}
