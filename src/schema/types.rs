//! Schema type definitions.
//!
//! A [`SchemaType`] is built once through a [`SchemaBuilder`], which walks the
//! declared fields in declaration order, binds each field to the type and
//! produces an immutable field registry shared by every instance.

use super::instance::Schema;
use super::load::{self, Lookup};
use crate::config::{self, SchemaConfig};
use crate::context::{Input, Operation};
use crate::error::{SchemaError, SchemaResult, ValidationResult};
use crate::field::Field;
use crate::validator::{Validator, ValidatorSet};
use crate::value::FieldValue;
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A field as registered in a schema type.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    name: String,
    load_key: String,
    dump_key: String,
    field: Arc<Field>,
    validators: ValidatorSet,
}

impl FieldEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key the field is read from on load.
    pub fn load_key(&self) -> &str {
        &self.load_key
    }

    /// Key the field is written to on dump.
    pub fn dump_key(&self) -> &str {
        &self.dump_key
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Validators registered on the schema for this field.
    pub fn schema_validators(&self) -> &ValidatorSet {
        &self.validators
    }
}

pub(crate) struct SchemaDef {
    name: String,
    entries: Vec<FieldEntry>,
    config: SchemaConfig,
}

/// A declared schema type.
///
/// Cloning is cheap; clones refer to the same definition. Two schema types are
/// equal only if they are the same definition.
#[derive(Clone)]
pub struct SchemaType(Arc<SchemaDef>);

/// Per-call load options.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Overrides the type's `ignore_extra_fields` setting.
    pub ignore_extra: Option<bool>,
}

impl LoadOptions {
    pub fn ignore_extra(ignore: bool) -> Self {
        Self {
            ignore_extra: Some(ignore),
        }
    }
}

impl SchemaType {
    /// Start declaring a schema type.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Registered fields in declaration order, inherited fields first.
    pub fn fields(&self) -> &[FieldEntry] {
        &self.0.entries
    }

    /// Look up a field by name, falling back to its load key.
    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.entry_by_name(name)
            .or_else(|| self.0.entries.iter().find(|e| e.load_key == name))
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.0.config
    }

    pub(crate) fn entry_by_name(&self, name: &str) -> Option<&FieldEntry> {
        self.0.entries.iter().find(|e| e.name == name)
    }

    /// Load and validate raw data.
    pub fn load(&self, data: &Map<String, Value>) -> ValidationResult<Schema> {
        self.load_with(data, LoadOptions::default())
    }

    pub fn load_with(
        &self,
        data: &Map<String, Value>,
        options: LoadOptions,
    ) -> ValidationResult<Schema> {
        let inputs = data.iter().map(|(key, value)| (key.as_str(), Input::Raw(value)));
        load::run(self, inputs, Lookup::LoadKey, options, None, Operation::Load)
    }

    /// Load a raw JSON value, which must be an object.
    pub fn load_json(&self, data: &Value) -> crate::error::Result<Schema> {
        let map = data.as_object().ok_or_else(|| {
            SchemaError::invalid_definition(format!(
                "data for schema '{}' must be a JSON object",
                self.name()
            ))
        })?;
        Ok(self.load(map)?)
    }

    /// Load the fields of a subset only.
    ///
    /// Exactly one of `include` and `exclude` must be given. Fields outside the
    /// subset are unknown to the resulting instance.
    pub fn load_partial(
        &self,
        data: &Map<String, Value>,
        include: Option<&[&str]>,
        exclude: Option<&[&str]>,
    ) -> crate::error::Result<Schema> {
        let subset = Arc::new(self.subset(include, exclude)?);
        Ok(self.load_subset(data, subset)?)
    }

    pub(crate) fn load_subset(
        &self,
        data: &Map<String, Value>,
        subset: Arc<BTreeSet<String>>,
    ) -> ValidationResult<Schema> {
        let inputs = data.iter().map(|(key, value)| (key.as_str(), Input::Raw(value)));
        load::run(
            self,
            inputs,
            Lookup::LoadKey,
            LoadOptions::default(),
            Some(subset),
            Operation::Load,
        )
    }

    /// Build an instance from typed values keyed by field name.
    ///
    /// Values go through the set-style conversion, so strictness follows each
    /// field's `strict_set` flag.
    pub fn construct<I, K, V>(&self, values: I) -> ValidationResult<Schema>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let values: Vec<(String, FieldValue)> = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let inputs = values
            .iter()
            .map(|(key, value)| (key.as_str(), Input::Typed(value)));
        load::run(
            self,
            inputs,
            Lookup::Name,
            LoadOptions::default(),
            None,
            Operation::Set,
        )
    }

    /// Resolve an include/exclude pair to a set of field names.
    pub fn subset(
        &self,
        include: Option<&[&str]>,
        exclude: Option<&[&str]>,
    ) -> SchemaResult<BTreeSet<String>> {
        let check = |names: &[&str]| -> SchemaResult<()> {
            match names.iter().find(|name| self.entry_by_name(name).is_none()) {
                Some(unknown) => Err(SchemaError::unknown_field(self.name(), *unknown)),
                None => Ok(()),
            }
        };
        let all = self.0.entries.iter().map(|e| e.name.clone());
        match (include, exclude) {
            (Some(_), Some(_)) => Err(SchemaError::IncludeExcludeConflict),
            (Some(include), None) => {
                check(include)?;
                Ok(all.filter(|name| include.contains(&name.as_str())).collect())
            }
            (None, Some(exclude)) => {
                check(exclude)?;
                Ok(all.filter(|name| !exclude.contains(&name.as_str())).collect())
            }
            (None, None) => Err(SchemaError::MissingIncludeExclude),
        }
    }
}

impl PartialEq for SchemaType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaType")
            .field("name", &self.0.name)
            .field(
                "fields",
                &self.0.entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Builder for [`SchemaType`].
///
/// ```
/// use schema_engine::field::Field;
/// use schema_engine::schema::SchemaType;
///
/// let author = SchemaType::builder("Author")
///     .field("name", Field::string())
///     .field("rating", Field::integer())
///     .build()
///     .unwrap();
/// assert_eq!(author.fields().len(), 2);
/// ```
pub struct SchemaBuilder {
    name: String,
    parent: Option<SchemaType>,
    fields: Vec<(String, Arc<Field>)>,
    validators: Vec<(String, Arc<dyn Validator>)>,
    config: Option<SchemaConfig>,
    ignore_extra_fields: Option<bool>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            validators: Vec::new(),
            config: None,
            ignore_extra_fields: None,
        }
    }

    /// Inherit the fields, schema validators and configuration of `parent`.
    pub fn extends(mut self, parent: &SchemaType) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declare a field. Passing an `Arc` that is already bound elsewhere fails
    /// at build time; use [`Field::copy`] to reuse a definition.
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Arc<Field>>) -> Self {
        self.fields.push((name.into(), field.into()));
        self
    }

    /// Register a schema-level validator for a field.
    pub fn validator(mut self, field: impl Into<String>, validator: Arc<dyn Validator>) -> Self {
        self.validators.push((field.into(), validator));
        self
    }

    pub fn config(mut self, config: SchemaConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn ignore_extra_fields(mut self, ignore: bool) -> Self {
        self.ignore_extra_fields = Some(ignore);
        self
    }

    pub fn build(self) -> SchemaResult<SchemaType> {
        let mut entries: Vec<FieldEntry> = self
            .parent
            .as_ref()
            .map(|parent| parent.fields().to_vec())
            .unwrap_or_default();

        let mut declared: BTreeSet<&str> = BTreeSet::new();
        for (idx, (name, field)) in self.fields.iter().enumerate() {
            if !declared.insert(name) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    name: name.clone(),
                });
            }
            if let (Some(bound_schema), Some(bound_name)) = (field.schema_name(), field.name()) {
                return Err(SchemaError::FieldAlreadyBound {
                    schema: self.name.clone(),
                    name: name.clone(),
                    bound_schema: bound_schema.to_string(),
                    bound_name: bound_name.to_string(),
                });
            }
            if let Some((other, _)) = self.fields[..idx]
                .iter()
                .find(|(_, earlier)| Arc::ptr_eq(earlier, field))
            {
                return Err(SchemaError::FieldAlreadyBound {
                    schema: self.name.clone(),
                    name: name.clone(),
                    bound_schema: self.name.clone(),
                    bound_name: other.clone(),
                });
            }
        }

        for (name, field) in &self.fields {
            let entry = FieldEntry {
                name: name.clone(),
                load_key: field.configured_load_key().unwrap_or(name).to_string(),
                dump_key: field.configured_dump_key().unwrap_or(name).to_string(),
                field: Arc::clone(field),
                validators: ValidatorSet::new(),
            };
            match entries.iter_mut().find(|e| e.name == *name) {
                Some(inherited) => *inherited = entry,
                None => entries.push(entry),
            }
        }

        let mut load_keys: BTreeSet<&str> = BTreeSet::new();
        for entry in &entries {
            if !load_keys.insert(&entry.load_key) {
                return Err(SchemaError::DuplicateKey {
                    schema: self.name.clone(),
                    key: entry.load_key.clone(),
                });
            }
        }

        for (target, validator) in self.validators {
            let entry = entries
                .iter_mut()
                .find(|e| e.name == target)
                .ok_or_else(|| SchemaError::UnknownValidatorTarget {
                    schema: self.name.clone(),
                    name: target.clone(),
                })?;
            entry.validators.add(validator);
        }

        // Bind last: a failed build leaves every field unbound.
        for (name, field) in &self.fields {
            field
                .bind(&self.name, name)
                .map_err(|(bound_schema, bound_name)| SchemaError::FieldAlreadyBound {
                    schema: self.name.clone(),
                    name: name.clone(),
                    bound_schema,
                    bound_name,
                })?;
        }

        let mut config = match (self.config, &self.parent) {
            (Some(config), _) => config,
            (None, Some(parent)) => parent.config().clone(),
            (None, None) => config::global(),
        };
        if let Some(ignore) = self.ignore_extra_fields {
            config.ignore_extra_fields = ignore;
        }

        debug!(
            "Built schema type '{}' with {} fields (parent: {:?})",
            self.name,
            entries.len(),
            self.parent.as_ref().map(SchemaType::name)
        );

        Ok(SchemaType(Arc::new(SchemaDef {
            name: self.name,
            entries,
            config,
        })))
    }
}
