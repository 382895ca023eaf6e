//! Schema registry for declaring schema types from JSON documents.
//!
//! A definition document names a schema, optionally a parent and a
//! configuration, and lists its fields:
//!
//! ```json
//! {
//!   "name": "Book",
//!   "fields": [
//!     { "name": "title", "type": "string" },
//!     { "name": "author", "type": "object", "schema": "Author" },
//!     { "name": "tags", "type": "list", "items": "str", "default": [] }
//!   ]
//! }
//! ```
//!
//! Object and partial fields may only reference schemas that are already
//! registered, so documents are registered in dependency order.

use super::types::{SchemaBuilder, SchemaType};
use crate::config;
use crate::error::{SchemaError, SchemaResult};
use crate::field::{BoolKind, DictKind, Field, ListKind, PartialKind, SetKind, TypedKind};
use crate::typing::TypeExpr;
use crate::validator::Range;
use crate::value::FieldValue;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Declarative description of a schema type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Options read with [`SchemaConfig::merge_json`](crate::config::SchemaConfig::merge_json).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    pub fields: Vec<FieldDefinition>,
}

/// Field kinds available in definition documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Any,
    Literal,
    Object,
    Partial,
    List,
    Set,
    Dict,
    Typed,
}

fn default_required() -> bool {
    true
}

/// Declarative description of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldType,

    #[serde(default)]
    pub strict: Option<bool>,
    #[serde(default)]
    pub strict_load: Option<bool>,
    #[serde(default)]
    pub strict_set: Option<bool>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,

    #[serde(default)]
    pub data_key: Option<String>,
    #[serde(default)]
    pub load_key: Option<String>,
    #[serde(default)]
    pub dump_key: Option<String>,

    /// Accepted values of a literal field.
    #[serde(default)]
    pub values: Option<Vec<Value>>,
    /// Referenced schema of an object or partial field.
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    /// Item type expression of a list or set field.
    #[serde(default)]
    pub items: Option<String>,
    /// Key type expression of a dict field.
    #[serde(default)]
    pub key: Option<String>,
    /// Value type expression of a dict field.
    #[serde(default)]
    pub value: Option<String>,
    /// Type expression of a typed field.
    #[serde(default)]
    pub expr: Option<String>,
    #[serde(default)]
    pub stack_errors: Option<bool>,
    #[serde(default)]
    pub true_values: Option<Vec<String>>,
    #[serde(default)]
    pub false_values: Option<Vec<String>>,

    /// Inclusive bounds checked by a [`Range`] validator.
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionDocument {
    One(SchemaDefinition),
    Many(Vec<SchemaDefinition>),
}

/// Named schema types built from definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaType>,
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a definition file holding one definition or a list.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let content = fs::read_to_string(&path)?;
        let mut registry = Self::new();
        registry.register_json(&content)?;
        info!(
            "Loaded {} schema(s) from {}",
            registry.len(),
            path.as_ref().display()
        );
        Ok(registry)
    }

    /// Register one definition or a list of definitions from a JSON string.
    pub fn register_json(&mut self, content: &str) -> SchemaResult<Vec<SchemaType>> {
        let definitions = match serde_json::from_str(content)? {
            DefinitionDocument::One(definition) => vec![definition],
            DefinitionDocument::Many(definitions) => definitions,
        };
        definitions
            .into_iter()
            .map(|definition| self.register_definition(definition))
            .collect()
    }

    /// Build and register a schema type from a definition.
    pub fn register_definition(&mut self, definition: SchemaDefinition) -> SchemaResult<SchemaType> {
        debug!("Registering schema definition '{}'", definition.name);
        let mut builder = SchemaBuilder::new(definition.name.clone());

        let parent = match &definition.extends {
            Some(parent) => {
                let parent = self.require(parent)?.clone();
                builder = builder.extends(&parent);
                Some(parent)
            }
            None => None,
        };

        if let Some(options) = &definition.config {
            let base = parent
                .as_ref()
                .map(|p| p.config().clone())
                .unwrap_or_else(config::global);
            builder = builder.config(base.merge_json(options)?);
        }

        for field in &definition.fields {
            builder = builder.field(field.name.clone(), self.build_field(field)?);
        }

        let schema = builder.build()?;
        self.register(schema.clone())?;
        Ok(schema)
    }

    /// Register a schema type built in code.
    pub fn register(&mut self, schema: SchemaType) -> SchemaResult<()> {
        let name = schema.name().to_string();
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::invalid_definition(format!(
                "schema '{name}' is already registered"
            )));
        }
        self.order.push(name.clone());
        self.schemas.insert(name, schema);
        Ok(())
    }

    /// Get a schema type by name.
    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.schemas.get(name)
    }

    /// Get a schema type by name, failing if it is not registered.
    pub fn require(&self, name: &str) -> SchemaResult<&SchemaType> {
        self.get(name).ok_or_else(|| SchemaError::SchemaNotFound {
            name: name.to_string(),
        })
    }

    /// Registered schema names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn build_field(&self, def: &FieldDefinition) -> SchemaResult<Field> {
        let invalid = |message: &str| {
            SchemaError::invalid_definition(format!("field '{}': {message}", def.name))
        };
        let parse = |expr: &Option<String>| -> SchemaResult<TypeExpr> {
            expr.as_deref().map_or(Ok(TypeExpr::Any), TypeExpr::parse)
        };
        let stack = def.stack_errors.unwrap_or(true);

        let mut field = match def.kind {
            FieldType::String => Field::string(),
            FieldType::Integer => Field::integer(),
            FieldType::Float => Field::float(),
            FieldType::Boolean => match (&def.true_values, &def.false_values) {
                (None, None) => Field::boolean(),
                (true_values, false_values) => {
                    let defaults = BoolKind::default();
                    Field::new(BoolKind::with_values(
                        true_values.clone().unwrap_or_else(|| defaults.true_values().to_vec()),
                        false_values.clone().unwrap_or_else(|| defaults.false_values().to_vec()),
                    ))
                }
            },
            FieldType::Datetime => Field::datetime(),
            FieldType::Any => Field::any(),
            FieldType::Literal => match &def.values {
                Some(values) if !values.is_empty() => Field::literal(values.iter().cloned()),
                _ => return Err(invalid("literal fields need a non-empty 'values' list")),
            },
            FieldType::Object => {
                let schema = def
                    .schema
                    .as_deref()
                    .ok_or_else(|| invalid("object fields need a 'schema' reference"))?;
                Field::object(self.require(schema)?)
            }
            FieldType::Partial => {
                let schema = def
                    .schema
                    .as_deref()
                    .ok_or_else(|| invalid("partial fields need a 'schema' reference"))?;
                let include: Option<Vec<&str>> = def
                    .include
                    .as_ref()
                    .map(|names| names.iter().map(String::as_str).collect());
                let exclude: Option<Vec<&str>> = def
                    .exclude
                    .as_ref()
                    .map(|names| names.iter().map(String::as_str).collect());
                Field::new(PartialKind::new(
                    self.require(schema)?,
                    include.as_deref(),
                    exclude.as_deref(),
                )?)
            }
            FieldType::List => Field::new(ListKind::new(parse(&def.items)?).stack_errors(stack)),
            FieldType::Set => Field::new(SetKind::new(parse(&def.items)?).stack_errors(stack)),
            FieldType::Dict => match (&def.key, &def.value) {
                (None, None) => Field::new(DictKind::any()),
                (Some(key), Some(value)) => Field::new(
                    DictKind::typed(TypeExpr::parse(key)?, TypeExpr::parse(value)?)
                        .stack_errors(stack),
                ),
                _ => return Err(invalid("dict fields need both 'key' and 'value' or neither")),
            },
            FieldType::Typed => {
                let expr = def
                    .expr
                    .as_deref()
                    .ok_or_else(|| invalid("typed fields need an 'expr'"))?;
                Field::new(TypedKind::new(TypeExpr::parse(expr)?).stack_errors(stack))
            }
        };

        if let Some(strict) = def.strict {
            field = field.strict(strict);
        }
        if let Some(strict) = def.strict_load {
            field = field.strict_load(strict);
        }
        if let Some(strict) = def.strict_set {
            field = field.strict_set(strict);
        }
        field = field.nullable(def.nullable).required(def.required);
        if let Some(default) = &def.default {
            field = field.default(FieldValue::from_json(default));
        }
        if let Some(key) = &def.data_key {
            field = field.data_key(key.clone());
        }
        if let Some(key) = &def.load_key {
            field = field.load_key(key.clone());
        }
        if let Some(key) = &def.dump_key {
            field = field.dump_key(key.clone());
        }
        if def.min.is_some() || def.max.is_some() {
            let range = Range::new(def.min.unwrap_or(i64::MIN), def.max.unwrap_or(i64::MAX))?;
            field = field.validator(Arc::new(range));
        }
        Ok(field)
    }
}
