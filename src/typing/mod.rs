//! Structural type validation for raw values.
//!
//! A [`TypeExpr`] describes the expected shape of a raw JSON value: scalar
//! types, generic containers, unions, literals and typed dictionaries.
//! [`TypeValidator`] checks a value against an expression and reports one
//! message per failing element, annotated with its position or key.

mod parse;

use crate::value::{json_type_name, repr};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A structural type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Accepts anything.
    Any,
    Str,
    Int,
    Float,
    Bool,
    /// Only null.
    Null,
    List(Box<TypeExpr>),
    /// An array treated as a set of items.
    Set(Box<TypeExpr>),
    /// Any sequence of items.
    Sequence(Box<TypeExpr>),
    /// A fixed-length array with one type per position.
    Tuple(Vec<TypeExpr>),
    /// An array of any length whose items all share one type.
    TupleOf(Box<TypeExpr>),
    /// An object; keys are checked as strings.
    Dict(Box<TypeExpr>, Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    /// Shorthand for a union of a type and null.
    Optional(Box<TypeExpr>),
    /// Exact values.
    Literal(Vec<Value>),
    TypedDict(Arc<TypedDictDef>),
}

impl TypeExpr {
    pub fn list(item: TypeExpr) -> Self {
        TypeExpr::List(Box::new(item))
    }

    pub fn set(item: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(item))
    }

    pub fn sequence(item: TypeExpr) -> Self {
        TypeExpr::Sequence(Box::new(item))
    }

    pub fn tuple(items: Vec<TypeExpr>) -> Self {
        TypeExpr::Tuple(items)
    }

    pub fn tuple_of(item: TypeExpr) -> Self {
        TypeExpr::TupleOf(Box::new(item))
    }

    pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Dict(Box::new(key), Box::new(value))
    }

    pub fn union(members: Vec<TypeExpr>) -> Self {
        TypeExpr::Union(members)
    }

    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional(Box::new(inner))
    }

    pub fn literal<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        TypeExpr::Literal(values.into_iter().map(Into::into).collect())
    }

    pub fn typed_dict(def: TypedDictDef) -> Self {
        TypeExpr::TypedDict(Arc::new(def))
    }

    /// Parse the compact text form, e.g. `dict[str, list[int]]`.
    pub fn parse(text: &str) -> crate::error::SchemaResult<Self> {
        parse::parse(text)
    }

    /// Check a value with error stacking enabled.
    pub fn check(&self, value: &Value) -> Result<(), Vec<String>> {
        TypeValidator::new(self.clone()).validate(value)
    }

    /// Name used when listing union members in messages.
    fn short_name(&self) -> String {
        match self {
            TypeExpr::Any => "Any".to_string(),
            TypeExpr::Str => "str".to_string(),
            TypeExpr::Int => "int".to_string(),
            TypeExpr::Float => "float".to_string(),
            TypeExpr::Bool => "bool".to_string(),
            TypeExpr::Null => "NoneType".to_string(),
            TypeExpr::List(_) => "list".to_string(),
            TypeExpr::Set(_) => "set".to_string(),
            TypeExpr::Sequence(_) => "Sequence".to_string(),
            TypeExpr::Tuple(_) | TypeExpr::TupleOf(_) => "tuple".to_string(),
            TypeExpr::Dict(..) => "dict".to_string(),
            TypeExpr::Union(_) => "Union".to_string(),
            TypeExpr::Optional(_) => "Optional".to_string(),
            TypeExpr::Literal(_) => "Literal".to_string(),
            TypeExpr::TypedDict(def) => def.name.clone(),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeExpr]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Any => f.write_str("any"),
            TypeExpr::Str => f.write_str("str"),
            TypeExpr::Int => f.write_str("int"),
            TypeExpr::Float => f.write_str("float"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::Null => f.write_str("None"),
            TypeExpr::List(item) => write!(f, "list[{item}]"),
            TypeExpr::Set(item) => write!(f, "set[{item}]"),
            TypeExpr::Sequence(item) => write!(f, "sequence[{item}]"),
            TypeExpr::Tuple(items) => {
                f.write_str("tuple[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            TypeExpr::TupleOf(item) => write!(f, "tuple[{item}, ...]"),
            TypeExpr::Dict(key, value) => write!(f, "dict[{key}, {value}]"),
            TypeExpr::Union(members) => {
                f.write_str("union[")?;
                write_list(f, members)?;
                f.write_str("]")
            }
            TypeExpr::Optional(inner) => write!(f, "optional[{inner}]"),
            TypeExpr::Literal(values) => {
                f.write_str("literal[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            TypeExpr::TypedDict(def) => f.write_str(&def.name),
        }
    }
}

/// A dictionary with a fixed set of typed keys.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDictDef {
    name: String,
    total: bool,
    keys: Vec<TypedKey>,
}

#[derive(Debug, Clone, PartialEq)]
struct TypedKey {
    name: String,
    ty: TypeExpr,
    required: Option<bool>,
}

impl TypedDictDef {
    /// Start a definition in which every key is required.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total: true,
            keys: Vec::new(),
        }
    }

    /// Whether unmarked keys are required.
    pub fn total(mut self, total: bool) -> Self {
        self.total = total;
        self
    }

    /// Add a key whose requiredness follows [`TypedDictDef::total`].
    pub fn key(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.keys.push(TypedKey {
            name: name.into(),
            ty,
            required: None,
        });
        self
    }

    /// Add a key that is always required.
    pub fn required(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.keys.push(TypedKey {
            name: name.into(),
            ty,
            required: Some(true),
        });
        self
    }

    /// Add a key that may be omitted.
    pub fn optional(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.keys.push(TypedKey {
            name: name.into(),
            ty,
            required: Some(false),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check a mapping against this definition.
    ///
    /// Unknown keys, failing values and missing required keys each produce
    /// one message.
    pub fn validate(&self, map: &Map<String, Value>) -> Vec<String> {
        let mut errors = Vec::new();
        for (key, value) in map {
            match self.keys.iter().find(|k| &k.name == key) {
                None => errors.push(format!("Invalid key '{key}'")),
                Some(typed) => {
                    if let Some(first) = process(value, &typed.ty, false).into_iter().next() {
                        errors.push(format!("Validation failed for '{key}': {first}"));
                    }
                }
            }
        }
        for typed in &self.keys {
            let required = typed.required.unwrap_or(self.total);
            if required && !map.contains_key(&typed.name) {
                errors.push(format!("Key '{}' is required", typed.name));
            }
        }
        errors
    }
}

/// Validates raw values against a [`TypeExpr`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeValidator {
    expr: TypeExpr,
    stack_errors: bool,
}

impl TypeValidator {
    /// Create a validator that reports every failing element.
    pub fn new(expr: TypeExpr) -> Self {
        Self {
            expr,
            stack_errors: true,
        }
    }

    /// When disabled, a container check stops at its first failing element.
    pub fn stack_errors(mut self, stack: bool) -> Self {
        self.stack_errors = stack;
        self
    }

    pub fn expr(&self) -> &TypeExpr {
        &self.expr
    }

    /// Validate a value, returning the failure messages.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<String>> {
        let errors = process(value, &self.expr, self.stack_errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn type_error(name: &str) -> Vec<String> {
    vec![format!("Must be of type {name}")]
}

fn first(errors: Vec<String>) -> Option<String> {
    errors.into_iter().next()
}

// Nested checks only need their first message, so they never stack.
fn process(value: &Value, expr: &TypeExpr, stack: bool) -> Vec<String> {
    match expr {
        TypeExpr::Any => Vec::new(),
        TypeExpr::Str if value.is_string() => Vec::new(),
        TypeExpr::Int if value.is_i64() || value.is_u64() => Vec::new(),
        TypeExpr::Float if value.is_f64() => Vec::new(),
        TypeExpr::Bool if value.is_boolean() => Vec::new(),
        TypeExpr::Null if value.is_null() => Vec::new(),
        TypeExpr::Str | TypeExpr::Int | TypeExpr::Float | TypeExpr::Bool | TypeExpr::Null => {
            type_error(&expr.short_name())
        }
        TypeExpr::List(item) | TypeExpr::Sequence(item) => {
            items(value, "list", stack, |idx, v| {
                first(process(v, item, false))
                    .map(|msg| format!("Sequence item at index {idx}: {msg}"))
            })
        }
        TypeExpr::Set(item) => items(value, "set", stack, |_, v| {
            first(process(v, item, false)).map(|msg| format!("Set includes an invalid item: {msg}"))
        }),
        TypeExpr::TupleOf(item) => items(value, "tuple", stack, |idx, v| {
            first(process(v, item, false)).map(|msg| format!("Tuple item at index {idx}: {msg}"))
        }),
        TypeExpr::Tuple(types) => tuple(value, types, stack),
        TypeExpr::Dict(key, val) => dict(value, key, val, stack),
        TypeExpr::Union(members) => union(value, members),
        TypeExpr::Optional(inner) => {
            if value.is_null() {
                Vec::new()
            } else {
                union(value, &[(**inner).clone(), TypeExpr::Null])
            }
        }
        TypeExpr::Literal(values) => {
            if values.contains(value) {
                Vec::new()
            } else if let [only] = values.as_slice() {
                vec![format!("Value must be equal to {}", repr(only))]
            } else {
                let listed: Vec<String> = values.iter().map(repr).collect();
                vec![format!("Value must be one of: {}", listed.join(", "))]
            }
        }
        TypeExpr::TypedDict(def) => match value.as_object() {
            Some(map) => def.validate(map),
            None => vec![format!("Must be a {} dictionary", def.name)],
        },
    }
}

fn items<F>(value: &Value, container: &str, stack: bool, check: F) -> Vec<String>
where
    F: Fn(usize, &Value) -> Option<String>,
{
    let Some(array) = value.as_array() else {
        return vec![format!("Must be a valid {container}")];
    };
    let mut errors = Vec::new();
    for (idx, item) in array.iter().enumerate() {
        if let Some(message) = check(idx, item) {
            errors.push(message);
            if !stack {
                break;
            }
        }
    }
    errors
}

fn tuple(value: &Value, types: &[TypeExpr], stack: bool) -> Vec<String> {
    let Some(array) = value.as_array() else {
        return vec!["Must be a valid tuple".to_string()];
    };
    if array.len() != types.len() {
        return vec![format!(
            "Tuple length must be {} (current length: {})",
            types.len(),
            array.len()
        )];
    }
    let mut errors = Vec::new();
    for (idx, (item, ty)) in array.iter().zip(types).enumerate() {
        if let Some(msg) = first(process(item, ty, false)) {
            errors.push(format!("Tuple item at index {idx}: {msg}"));
            if !stack {
                break;
            }
        }
    }
    errors
}

fn dict(value: &Value, key_ty: &TypeExpr, value_ty: &TypeExpr, stack: bool) -> Vec<String> {
    let Some(map) = value.as_object() else {
        return vec!["Must be a valid dictionary".to_string()];
    };
    let mut errors = Vec::new();
    for (idx, (key, item)) in map.iter().enumerate() {
        let message = match first(process(&Value::String(key.clone()), key_ty, false)) {
            Some(msg) => Some(format!("Dictionary key at index {idx}: {msg}")),
            None => first(process(item, value_ty, false))
                .map(|msg| format!("Dictionary value for key '{key}': {msg}")),
        };
        if let Some(message) = message {
            errors.push(message);
            if !stack {
                break;
            }
        }
    }
    errors
}

fn union(value: &Value, members: &[TypeExpr]) -> Vec<String> {
    if members.iter().any(|ty| process(value, ty, false).is_empty()) {
        return Vec::new();
    }
    let names: Vec<String> = members.iter().map(TypeExpr::short_name).collect();
    vec![format!(
        "Type of {} ({}) is not compatible with types ({})",
        repr(value),
        json_type_name(value),
        names.join(", ")
    )]
}

/// Failure report of [`validate_types`], keyed by value name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Type validation failed for {} key(s)", errors.len())]
pub struct TypeValidationError {
    errors: Vec<(String, Vec<String>)>,
}

impl TypeValidationError {
    /// Messages per key, in the order the keys were checked.
    pub fn errors(&self) -> &[(String, Vec<String>)] {
        &self.errors
    }

    /// Messages for one key.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.errors
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, messages)| messages.as_slice())
    }
}

/// Validate a mapping of named values against named type expressions.
///
/// Every declared name must be present unless `ignore_missing` is set, and
/// every value must have a declared type unless `ignore_extra` is set.
pub fn validate_types(
    types: &[(&str, TypeExpr)],
    values: &Map<String, Value>,
    ignore_missing: bool,
    ignore_extra: bool,
) -> Result<(), TypeValidationError> {
    let mut errors = Vec::new();
    for (name, expr) in types {
        match values.get(*name) {
            Some(value) => {
                if let Err(messages) = TypeValidator::new(expr.clone()).validate(value) {
                    errors.push((name.to_string(), messages));
                }
            }
            None if !ignore_missing => {
                errors.push((name.to_string(), vec!["This key is missing.".to_string()]));
            }
            None => {}
        }
    }
    if !ignore_extra {
        for key in values.keys() {
            if !types.iter().any(|(name, _)| name == key) {
                errors.push((key.clone(), vec!["Invalid key".to_string()]));
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TypeValidationError { errors })
    }
}
