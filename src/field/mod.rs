//! Field definitions.
//!
//! A [`Field`] is the unit of schema declaration. It owns the load/dump policy
//! for one attribute: nullability, requiredness, default, raw keys, strictness
//! and validators. The actual coercion is delegated to a [`FieldKind`].
//!
//! Fields are definitions, never value holders. Once a field is bound to a
//! schema type it is shared by every instance of that type and is never
//! mutated again; loaded values live in each [`Schema`](crate::schema::Schema)
//! instance.

mod nested;
mod primitive;
mod structs;

pub use nested::{ObjectKind, PartialKind};
pub use primitive::{BoolKind, DateTimeKind, FloatKind, IntKind, StrKind};
pub use structs::{AnyKind, DictKind, ListKind, LiteralKind, SetKind, TypedDictKind, TypedKind};

use crate::context::{DefaultContext, DumpContext, ErrorFormatterContext, LoadContext, Operation};
use crate::error::{ErrorKind, FieldError, Message};
use crate::schema::SchemaType;
use crate::typing::{TypeExpr, TypedDictDef};
use crate::validator::{Validator, ValidatorSet};
use crate::value::FieldValue;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Coercion logic of a field.
///
/// `value_load` converts raw input, `value_set` converts a programmatically
/// supplied value and `value_dump` converts a stored value back to raw form.
/// Implement this trait to define custom field kinds.
pub trait FieldKind: Send + Sync + fmt::Debug {
    /// Short name used in debug output and declarative documents.
    fn name(&self) -> &'static str;

    /// Convert raw input into a stored value.
    fn value_load(&self, value: &Value, context: &LoadContext<'_>) -> Result<FieldValue, FieldError>;

    /// Convert a programmatically supplied value.
    ///
    /// The default converts the value to raw form and loads it.
    fn value_set(
        &self,
        value: &FieldValue,
        context: &LoadContext<'_>,
    ) -> Result<FieldValue, FieldError> {
        self.value_load(&value.to_json(), context)
    }

    /// Convert a stored value back to raw form.
    fn value_dump(&self, value: &FieldValue, _context: &DumpContext<'_>) -> Result<Value, FieldError> {
        Ok(value.to_json())
    }
}

type DefaultFn = dyn Fn(&DefaultContext<'_>) -> FieldValue + Send + Sync;
type ErrorFormatter = dyn Fn(&ErrorFormatterContext<'_>) -> Option<Message> + Send + Sync;

/// Default of a field absent from input.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value.
    Value(FieldValue),
    /// A producer invoked lazily, once per load.
    Factory(Arc<DefaultFn>),
}

impl DefaultValue {
    pub(crate) fn resolve(&self, context: &DefaultContext<'_>) -> FieldValue {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(context),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    name: String,
    schema: String,
}

/// A schema field definition.
///
/// ```
/// use schema_engine::field::Field;
/// use schema_engine::validator::Range;
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), schema_engine::SchemaError> {
/// let rating = Field::integer().strict(false).default(5).validator(Arc::new(Range::new(1, 10)?));
/// assert!(!rating.is_required());
/// # Ok(())
/// # }
/// ```
pub struct Field {
    kind: Arc<dyn FieldKind>,
    nullable: bool,
    required: bool,
    default: Option<DefaultValue>,
    load_key: Option<String>,
    dump_key: Option<String>,
    strict_load: bool,
    strict_set: bool,
    validators: ValidatorSet,
    formatter: Option<Arc<ErrorFormatter>>,
    binding: OnceLock<Binding>,
}

impl Field {
    /// Create a required, strict, non-nullable field of the given kind.
    pub fn new(kind: impl FieldKind + 'static) -> Self {
        Self::from_kind(Arc::new(kind))
    }

    pub fn from_kind(kind: Arc<dyn FieldKind>) -> Self {
        Self {
            kind,
            nullable: false,
            required: true,
            default: None,
            load_key: None,
            dump_key: None,
            strict_load: true,
            strict_set: true,
            validators: ValidatorSet::new(),
            formatter: None,
            binding: OnceLock::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(StrKind)
    }

    pub fn integer() -> Self {
        Self::new(IntKind)
    }

    pub fn float() -> Self {
        Self::new(FloatKind)
    }

    pub fn boolean() -> Self {
        Self::new(BoolKind::default())
    }

    pub fn datetime() -> Self {
        Self::new(DateTimeKind)
    }

    pub fn any() -> Self {
        Self::new(AnyKind)
    }

    pub fn literal<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(LiteralKind::new(values))
    }

    /// A nested schema.
    pub fn object(schema: &SchemaType) -> Self {
        Self::new(ObjectKind::new(schema))
    }

    /// A list whose items match `item`.
    pub fn list(item: TypeExpr) -> Self {
        Self::new(ListKind::new(item))
    }

    /// A list of unique items matching `item`.
    pub fn set(item: TypeExpr) -> Self {
        Self::new(SetKind::new(item))
    }

    /// A dictionary with typed keys and values.
    pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
        Self::new(DictKind::typed(key, value))
    }

    pub fn typed_dict(def: TypedDictDef) -> Self {
        Self::new(TypedDictKind::new(def))
    }

    /// A value matching an arbitrary structural type.
    pub fn typed(expr: TypeExpr) -> Self {
        Self::new(TypedKind::new(expr))
    }

    /// Set both strictness flags.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_load = strict;
        self.strict_set = strict;
        self
    }

    pub fn strict_load(mut self, strict: bool) -> Self {
        self.strict_load = strict;
        self
    }

    pub fn strict_set(mut self, strict: bool) -> Self {
        self.strict_set = strict;
        self
    }

    /// Accept explicit null verbatim.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Whether absence is an error. Ignored once a default is set.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Produce the default lazily from the instance being built.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn(&DefaultContext<'_>) -> FieldValue + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    /// Set both the load and the dump key.
    pub fn data_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.load_key(key.clone()).dump_key(key)
    }

    pub fn load_key(mut self, key: impl Into<String>) -> Self {
        self.load_key = Some(key.into());
        self
    }

    pub fn dump_key(mut self, key: impl Into<String>) -> Self {
        self.dump_key = Some(key.into());
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.add_validator(validator);
        self
    }

    /// Replace standard messages. Returning `None` keeps the standard message.
    pub fn error_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&ErrorFormatterContext<'_>) -> Option<Message> + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Register a validator; raw validators go to the raw list.
    pub fn add_validator(&mut self, validator: Arc<dyn Validator>) {
        self.validators.add(validator);
    }

    /// Unregister a validator. Returns whether it was registered.
    pub fn remove_validator(&mut self, validator: &Arc<dyn Validator>) -> bool {
        self.validators.remove(validator)
    }

    /// Remove all validators, or only the raw (`Some(true)`) or normal
    /// (`Some(false)`) ones.
    pub fn clear_validators(&mut self, raw: Option<bool>) {
        self.validators.clear(raw);
    }

    /// Iterate validators, normal ones first when `raw` is `None`.
    pub fn walk_validators(&self, raw: Option<bool>) -> impl Iterator<Item = &Arc<dyn Validator>> {
        self.validators.walk(raw)
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    /// Duplicate the configuration as a fresh, unbound field.
    pub fn copy(&self, validators: bool) -> Self {
        Self {
            kind: Arc::clone(&self.kind),
            nullable: self.nullable,
            required: self.required,
            default: self.default.clone(),
            load_key: self.load_key.clone(),
            dump_key: self.dump_key.clone(),
            strict_load: self.strict_load,
            strict_set: self.strict_set,
            validators: if validators {
                self.validators.clone()
            } else {
                ValidatorSet::new()
            },
            formatter: self.formatter.clone(),
            binding: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> &dyn FieldKind {
        self.kind.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether absence is an error; never true for a field with a default.
    pub fn is_required(&self) -> bool {
        self.required && self.default.is_none()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn strict_load_enabled(&self) -> bool {
        self.strict_load
    }

    pub fn strict_set_enabled(&self) -> bool {
        self.strict_set
    }

    /// Name the field was bound under.
    pub fn name(&self) -> Option<&str> {
        self.binding.get().map(|b| b.name.as_str())
    }

    /// Name of the schema type the field is bound to.
    pub fn schema_name(&self) -> Option<&str> {
        self.binding.get().map(|b| b.schema.as_str())
    }

    pub fn is_bound(&self) -> bool {
        self.binding.get().is_some()
    }

    /// Explicit load key, if one differs from the field name.
    pub fn configured_load_key(&self) -> Option<&str> {
        self.load_key.as_deref()
    }

    pub fn configured_dump_key(&self) -> Option<&str> {
        self.dump_key.as_deref()
    }

    /// Bind the field to a schema. Returns the existing binding on conflict.
    pub(crate) fn bind(&self, schema: &str, name: &str) -> Result<(), (String, String)> {
        let binding = Binding {
            name: name.to_string(),
            schema: schema.to_string(),
        };
        self.binding
            .set(binding)
            .map_err(|_| match self.binding.get() {
                Some(existing) => (existing.schema.clone(), existing.name.clone()),
                None => (String::new(), String::new()),
            })
    }

    /// Build an error, letting the error formatter replace the standard message.
    pub(crate) fn format_error(
        &self,
        kind: ErrorKind,
        message: Message,
        value: Option<Value>,
        operation: Operation,
    ) -> FieldError {
        let replaced = self.formatter.as_ref().and_then(|formatter| {
            formatter(&ErrorFormatterContext {
                kind,
                field: self,
                message: &message,
                value: value.as_ref(),
                operation,
            })
        });
        FieldError::new(kind, replaced.unwrap_or(message))
            .with_value(value)
            .with_operation(operation)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("kind", &self.kind)
            .field("name", &self.name())
            .field("schema", &self.schema_name())
            .field("nullable", &self.nullable)
            .field("required", &self.is_required())
            .field("default", &self.default)
            .field("strict_load", &self.strict_load)
            .field("strict_set", &self.strict_set)
            .field("validators", &self.validators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{from_fn, raw_fn};

    #[test]
    fn test_default_forces_optional() {
        assert!(Field::string().is_required());
        assert!(!Field::string().default("x").is_required());
        assert!(!Field::string().required(false).is_required());
        assert!(Field::string().default("x").has_default());
    }

    #[test]
    fn test_strict_shorthand_sets_both_flags() {
        let field = Field::integer().strict(false);
        assert!(!field.strict_load_enabled());
        assert!(!field.strict_set_enabled());
        let field = Field::integer().strict_set(false);
        assert!(field.strict_load_enabled());
        assert!(!field.strict_set_enabled());
    }

    #[test]
    fn test_data_key_sets_both_keys() {
        let field = Field::string().data_key("userName");
        assert_eq!(field.configured_load_key(), Some("userName"));
        assert_eq!(field.configured_dump_key(), Some("userName"));
    }

    #[test]
    fn test_copy_is_unbound_and_can_drop_validators() {
        let field = Field::string()
            .validator(from_fn(|_, _| Ok(())))
            .validator(raw_fn(|_, _| Ok(())));
        field.bind("User", "name").unwrap();
        assert!(field.is_bound());

        let copy = field.copy(true);
        assert!(!copy.is_bound());
        assert_eq!(copy.validators().len(), 2);
        assert!(field.copy(false).validators().is_empty());
    }

    #[test]
    fn test_validator_registration() {
        let normal = from_fn(|_, _| Ok(()));
        let raw = raw_fn(|_, _| Ok(()));
        let mut field = Field::string();
        field.add_validator(raw.clone());
        field.add_validator(normal.clone());

        let walked: Vec<_> = field.walk_validators(None).collect();
        assert_eq!(walked.len(), 2);
        assert!(Arc::ptr_eq(walked[0], &normal));
        assert!(Arc::ptr_eq(walked[1], &raw));
        assert_eq!(field.walk_validators(Some(true)).count(), 1);

        assert!(field.remove_validator(&normal));
        assert!(!field.remove_validator(&normal));
        assert_eq!(field.walk_validators(Some(false)).count(), 0);

        field.add_validator(normal);
        field.clear_validators(Some(true));
        assert_eq!(field.walk_validators(None).count(), 1);
        field.clear_validators(None);
        assert!(field.validators().is_empty());
    }

    #[test]
    fn test_second_bind_reports_existing_binding() {
        let field = Field::string();
        field.bind("User", "name").unwrap();
        assert_eq!(
            field.bind("Group", "title"),
            Err(("User".to_string(), "name".to_string()))
        );
        assert_eq!(field.name(), Some("name"));
        assert_eq!(field.schema_name(), Some("User"));
    }

    #[test]
    fn test_formatter_replaces_selected_kinds() {
        let field = Field::integer().error_formatter(|ctx| match ctx.kind() {
            ErrorKind::InvalidDatatype => Some(Message::from("need a number")),
            _ => None,
        });
        let error = field.format_error(
            ErrorKind::InvalidDatatype,
            Message::from("standard"),
            Some(Value::from("x")),
            Operation::Load,
        );
        assert_eq!(error.message(), &Message::from("need a number"));
        assert_eq!(error.value(), Some(&Value::from("x")));

        let error = field.format_error(
            ErrorKind::FieldRequired,
            Message::from("This field is required."),
            None,
            Operation::Load,
        );
        assert_eq!(error.message(), &Message::from("This field is required."));
    }
}
