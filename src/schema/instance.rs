//! Schema instances.

use super::load::process_field;
use super::types::{FieldEntry, SchemaType};
use crate::context::{DefaultContext, DumpContext, Input, Operation};
use crate::error::{
    ErrorKind, FieldError, Message, Result, SchemaError, SchemaResult, ValidationError,
    ValidationResult,
};
use crate::value::FieldValue;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// How an instance was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Loaded from raw data.
    Data,
    /// Constructed from typed values.
    Values,
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaContext {
    pub(crate) initialized: bool,
    pub(crate) mode: Mode,
    pub(crate) subset: Option<Arc<BTreeSet<String>>>,
    pub(crate) default_filled: HashSet<String>,
}

/// Field selection for [`Schema::dump_with`].
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

impl DumpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dump only these fields.
    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Dump all fields except these.
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// A validated record of a [`SchemaType`].
///
/// Values are kept per instance, keyed by field name. An instance only exists
/// once every field passed validation.
#[derive(Clone)]
pub struct Schema {
    ty: SchemaType,
    values: HashMap<String, FieldValue>,
    context: SchemaContext,
}

impl Schema {
    pub(crate) fn from_parts(
        ty: SchemaType,
        values: HashMap<String, FieldValue>,
        context: SchemaContext,
    ) -> Self {
        Self { ty, values, context }
    }

    pub fn schema_type(&self) -> &SchemaType {
        &self.ty
    }

    pub fn is_initialized(&self) -> bool {
        self.context.initialized
    }

    pub fn mode(&self) -> Mode {
        self.context.mode
    }

    /// Whether the instance holds only a subset of its type's fields.
    pub fn is_partial(&self) -> bool {
        self.context.subset.is_some()
    }

    /// Whether the field's value came from its default rather than from input.
    pub fn is_default_filled(&self, name: &str) -> bool {
        self.entry(name)
            .is_ok_and(|entry| self.context.default_filled.contains(entry.name()))
    }

    fn in_scope(&self, entry: &FieldEntry) -> bool {
        self.context
            .subset
            .as_ref()
            .is_none_or(|names| names.contains(entry.name()))
    }

    /// Resolve a field by name or load key, within the instance's subset.
    fn entry(&self, name: &str) -> SchemaResult<&FieldEntry> {
        self.ty
            .field(name)
            .filter(|entry| self.in_scope(entry))
            .ok_or_else(|| SchemaError::unknown_field(self.ty.name(), name))
    }

    /// The stored value of a field, addressed by name or load key.
    pub fn get_value(&self, name: &str) -> SchemaResult<&FieldValue> {
        let entry = self.entry(name)?;
        self.values
            .get(entry.name())
            .ok_or_else(|| SchemaError::field_not_set(entry.name()))
    }

    /// The stored value of a field, or `default` when it holds none.
    pub fn get_value_or(&self, name: &str, default: impl Into<FieldValue>) -> SchemaResult<FieldValue> {
        match self.get_value(name) {
            Ok(value) => Ok(value.clone()),
            Err(SchemaError::FieldNotSet { .. }) => Ok(default.into()),
            Err(error) => Err(error),
        }
    }

    /// Reassign a field, re-running its validation with set-style conversion.
    ///
    /// On failure the previous value is kept.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let ty = self.ty.clone();
        let entry = self.entry(name)?;
        let name = entry.name().to_string();
        let value = value.into();

        match process_field(&ty, entry, &self.values, Input::Typed(&value), Operation::Set) {
            Ok(stored) => {
                debug!("Updated field '{}' of schema '{}'", name, ty.name());
                self.values.insert(name.clone(), stored);
                self.context.default_filled.remove(&name);
                Ok(())
            }
            Err(errors) => {
                warn!(
                    "Rejected update of field '{}' of schema '{}' ({} error(s)); previous value kept",
                    name,
                    ty.name(),
                    errors.len()
                );
                Err(ValidationError::with_class(errors, ty.config().validation_error_class.clone()).into())
            }
        }
    }

    /// Convert every field back to raw data.
    pub fn dump(&self) -> ValidationResult<Map<String, Value>> {
        let included = self.scope().map(|e| e.name().to_string()).collect();
        self.dump_fields(&included)
    }

    /// Convert selected fields back to raw data.
    pub fn dump_with(&self, options: &DumpOptions) -> Result<Map<String, Value>> {
        let included: BTreeSet<String> = match (&options.include, &options.exclude) {
            (Some(_), Some(_)) => return Err(SchemaError::IncludeExcludeConflict.into()),
            (Some(include), None) => {
                self.check_names(include)?;
                self.scope()
                    .filter(|e| include.iter().any(|n| n == e.name()))
                    .map(|e| e.name().to_string())
                    .collect()
            }
            (None, Some(exclude)) => {
                self.check_names(exclude)?;
                self.scope()
                    .filter(|e| !exclude.iter().any(|n| n == e.name()))
                    .map(|e| e.name().to_string())
                    .collect()
            }
            (None, None) => self.scope().map(|e| e.name().to_string()).collect(),
        };
        Ok(self.dump_fields(&included)?)
    }

    fn scope(&self) -> impl Iterator<Item = &FieldEntry> {
        self.ty.fields().iter().filter(|e| self.in_scope(e))
    }

    fn check_names(&self, names: &[String]) -> SchemaResult<()> {
        match names
            .iter()
            .find(|name| self.ty.entry_by_name(name).is_none_or(|e| !self.in_scope(e)))
        {
            Some(unknown) => Err(SchemaError::unknown_field(self.ty.name(), unknown.as_str())),
            None => Ok(()),
        }
    }

    fn dump_fields(&self, included: &BTreeSet<String>) -> ValidationResult<Map<String, Value>> {
        debug!(
            "Dumping schema '{}' ({} field(s) selected)",
            self.ty.name(),
            included.len()
        );
        let mut out = Map::new();
        let mut errors = Vec::new();

        for entry in self.ty.fields().iter().filter(|e| included.contains(e.name())) {
            let field = entry.field();
            match self.values.get(entry.name()) {
                Some(FieldValue::Null) => {
                    out.insert(entry.dump_key().to_string(), Value::Null);
                }
                Some(value) if self.context.default_filled.contains(entry.name()) => {
                    match default_to_json(value) {
                        Ok(raw) => {
                            out.insert(entry.dump_key().to_string(), raw);
                        }
                        Err(error) => errors.push(error.bind(
                            entry.name(),
                            entry.dump_key(),
                            Operation::Dump,
                        )),
                    }
                }
                Some(value) => {
                    let context = DumpContext {
                        field,
                        field_name: entry.name(),
                        schema: self,
                        included,
                    };
                    match field.kind().value_dump(value, &context) {
                        Ok(raw) => {
                            out.insert(entry.dump_key().to_string(), raw);
                        }
                        Err(error) => errors.push(error.bind(
                            entry.name(),
                            entry.dump_key(),
                            Operation::Dump,
                        )),
                    }
                }
                None => {
                    if let Some(default) = field.default_value() {
                        let value = default.resolve(&DefaultContext {
                            field,
                            field_name: entry.name(),
                            schema: &self.ty,
                            values: &self.values,
                        });
                        match default_to_json(&value) {
                            Ok(raw) => {
                                out.insert(entry.dump_key().to_string(), raw);
                            }
                            Err(error) => errors.push(error.bind(
                                entry.name(),
                                entry.dump_key(),
                                Operation::Dump,
                            )),
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            debug!(
                "Dumping schema '{}' failed with {} error(s)",
                self.ty.name(),
                errors.len()
            );
            Err(ValidationError::with_class(
                errors,
                self.ty.config().validation_error_class.clone(),
            ))
        }
    }

    /// Plain conversion of the stored values, keyed by field name.
    ///
    /// Unlike [`Schema::dump`] this never calls into field kinds and cannot fail.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .scope()
            .filter_map(|entry| {
                self.values
                    .get(entry.name())
                    .map(|value| (entry.name().to_string(), value.to_json()))
            })
            .collect();
        Value::Object(map)
    }

    /// A copy restricted to a subset of fields.
    pub(crate) fn restrict(&self, subset: Arc<BTreeSet<String>>) -> Schema {
        let values = self
            .values
            .iter()
            .filter(|(name, _)| subset.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let default_filled = self
            .context
            .default_filled
            .iter()
            .filter(|name| subset.contains(*name))
            .cloned()
            .collect();
        Schema {
            ty: self.ty.clone(),
            values,
            context: SchemaContext {
                initialized: self.context.initialized,
                mode: self.context.mode,
                subset: Some(subset),
                default_filled,
            },
        }
    }
}

/// Raw form of a default. Defaults skip the field kind, but nested schemas
/// still dump under their own keys.
fn default_to_json(value: &FieldValue) -> std::result::Result<Value, FieldError> {
    match value {
        FieldValue::Object(nested) => nested
            .dump()
            .map(Value::Object)
            .map_err(|error| FieldError::new(ErrorKind::DumpFailed, Message::Nested(error.raw()))),
        other => Ok(other.to_json()),
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.values == other.values
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.ty.name());
        for entry in self.scope() {
            if let Some(value) = self.values.get(entry.name()) {
                out.field(entry.name(), value);
            }
        }
        out.finish()
    }
}
