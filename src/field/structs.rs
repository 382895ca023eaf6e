//! Structural field kinds: untyped values, literals and typed containers.
//!
//! Element checks are delegated to the [`TypeValidator`]; its messages are
//! reported together as one [`ErrorKind::StructuralValidation`] error.

use super::FieldKind;
use crate::context::LoadContext;
use crate::error::{ErrorKind, FieldError, Message};
use crate::typing::{TypeExpr, TypeValidator, TypedDictDef};
use crate::value::{FieldValue, repr};
use serde_json::Value;
use std::sync::Arc;

fn structural(context: &LoadContext<'_>, errors: Vec<String>) -> FieldError {
    context.error(ErrorKind::StructuralValidation, Message::List(errors))
}

/// Accepts any value without validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyKind;

impl FieldKind for AnyKind {
    fn name(&self) -> &'static str {
        "any"
    }

    fn value_load(&self, value: &Value, _context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::from_json(value))
    }

    fn value_set(
        &self,
        value: &FieldValue,
        _context: &LoadContext<'_>,
    ) -> Result<FieldValue, FieldError> {
        Ok(value.clone())
    }
}

/// Accepts only the given exact values.
#[derive(Debug, Clone)]
pub struct LiteralKind {
    values: Vec<Value>,
    message: String,
}

impl LiteralKind {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let listed: Vec<String> = values.iter().map(repr).collect();
        let message = format!("Value must be one of: {}", listed.join(", "));
        Self { values, message }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl FieldKind for LiteralKind {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        if self.values.contains(value) {
            Ok(FieldValue::from_json(value))
        } else {
            Err(context.error(ErrorKind::StructuralValidation, self.message.as_str()))
        }
    }
}

/// A list of items of one structural type.
#[derive(Debug, Clone)]
pub struct ListKind {
    validator: TypeValidator,
}

impl ListKind {
    pub fn new(item: TypeExpr) -> Self {
        Self {
            validator: TypeValidator::new(TypeExpr::list(item)),
        }
    }

    /// Report every failing item (the default) or only the first.
    pub fn stack_errors(mut self, stack: bool) -> Self {
        self.validator = self.validator.stack_errors(stack);
        self
    }
}

impl FieldKind for ListKind {
    fn name(&self) -> &'static str {
        "list"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        if !value.is_array() {
            return Err(context.error(ErrorKind::InvalidDatatype, "Value must be a list"));
        }
        self.validator
            .validate(value)
            .map(|()| FieldValue::Json(value.clone()))
            .map_err(|errors| structural(context, errors))
    }
}

/// A list of unique items; duplicates are dropped keeping the first occurrence.
#[derive(Debug, Clone)]
pub struct SetKind {
    validator: TypeValidator,
}

impl SetKind {
    pub fn new(item: TypeExpr) -> Self {
        Self {
            validator: TypeValidator::new(TypeExpr::set(item)),
        }
    }

    pub fn stack_errors(mut self, stack: bool) -> Self {
        self.validator = self.validator.stack_errors(stack);
        self
    }
}

impl FieldKind for SetKind {
    fn name(&self) -> &'static str {
        "set"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        let Some(items) = value.as_array() else {
            return Err(context.error(ErrorKind::InvalidDatatype, "Value must be a set"));
        };
        self.validator
            .validate(value)
            .map_err(|errors| structural(context, errors))?;
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(item) {
                unique.push(item.clone());
            }
        }
        Ok(FieldValue::Json(Value::Array(unique)))
    }
}

/// A dictionary, optionally with typed keys and values.
#[derive(Debug, Clone, Default)]
pub struct DictKind {
    validator: Option<TypeValidator>,
}

impl DictKind {
    /// Any dictionary.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn typed(key: TypeExpr, value: TypeExpr) -> Self {
        Self {
            validator: Some(TypeValidator::new(TypeExpr::dict(key, value))),
        }
    }

    pub fn stack_errors(mut self, stack: bool) -> Self {
        self.validator = self.validator.map(|v| v.stack_errors(stack));
        self
    }
}

impl FieldKind for DictKind {
    fn name(&self) -> &'static str {
        "dict"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        if !value.is_object() {
            return Err(context.error(ErrorKind::InvalidDatatype, "Value must be a dictionary"));
        }
        if let Some(validator) = &self.validator {
            validator
                .validate(value)
                .map_err(|errors| structural(context, errors))?;
        }
        Ok(FieldValue::Json(value.clone()))
    }
}

/// A dictionary with a fixed set of typed keys.
#[derive(Debug, Clone)]
pub struct TypedDictKind {
    def: Arc<TypedDictDef>,
}

impl TypedDictKind {
    pub fn new(def: TypedDictDef) -> Self {
        Self { def: Arc::new(def) }
    }

    pub fn definition(&self) -> &TypedDictDef {
        &self.def
    }
}

impl FieldKind for TypedDictKind {
    fn name(&self) -> &'static str {
        "typed_dict"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        let Some(map) = value.as_object() else {
            return Err(context.error(ErrorKind::InvalidDatatype, "Value must be a dictionary"));
        };
        let errors = self.def.validate(map);
        if errors.is_empty() {
            Ok(FieldValue::Json(value.clone()))
        } else {
            Err(structural(context, errors))
        }
    }
}

/// Any value matching a structural type expression.
#[derive(Debug, Clone)]
pub struct TypedKind {
    validator: TypeValidator,
}

impl TypedKind {
    pub fn new(expr: TypeExpr) -> Self {
        Self {
            validator: TypeValidator::new(expr),
        }
    }

    pub fn stack_errors(mut self, stack: bool) -> Self {
        self.validator = self.validator.stack_errors(stack);
        self
    }

    pub fn expr(&self) -> &TypeExpr {
        self.validator.expr()
    }
}

impl FieldKind for TypedKind {
    fn name(&self) -> &'static str {
        "typed"
    }

    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError> {
        self.validator
            .validate(value)
            .map(|()| FieldValue::from_json(value))
            .map_err(|errors| structural(context, errors))
    }
}
