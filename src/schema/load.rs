//! The load pipeline.
//!
//! Input pairs are matched to fields in input order. Each matched field runs
//! its raw validators, null policy, coercion and normal validators; a value is
//! stored only when that field's pass produced no error. Fields absent from
//! the input are then checked for requiredness or filled from their default.
//! All errors are accumulated and raised together.

use super::instance::{Mode, Schema, SchemaContext};
use super::types::{FieldEntry, LoadOptions, SchemaType};
use crate::context::{DefaultContext, Input, LoadContext, Operation};
use crate::error::{ErrorKind, FieldError, ValidationError, ValidationResult};
use crate::validator::run_all;
use crate::value::FieldValue;
use log::{debug, trace, warn};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

pub(crate) const REQUIRED_MESSAGE: &str = "This field is required.";
pub(crate) const NONE_DISALLOWED_MESSAGE: &str = "Value for this field cannot be None.";

/// How input keys are matched to fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// Raw data, keyed by load key.
    LoadKey,
    /// Typed values, keyed by field name.
    Name,
}

pub(crate) fn run<'a, I>(
    ty: &SchemaType,
    inputs: I,
    lookup: Lookup,
    options: LoadOptions,
    subset: Option<Arc<BTreeSet<String>>>,
    operation: Operation,
) -> ValidationResult<Schema>
where
    I: IntoIterator<Item = (&'a str, Input<'a>)>,
{
    let ignore_extra = options
        .ignore_extra
        .unwrap_or(ty.config().ignore_extra_fields);
    let in_subset = |entry: &FieldEntry| {
        subset
            .as_ref()
            .is_none_or(|names| names.contains(entry.name()))
    };

    debug!("Loading schema '{}' ({:?})", ty.name(), operation);

    let mut remaining: Vec<&FieldEntry> = ty.fields().iter().filter(|e| in_subset(*e)).collect();
    let mut values: HashMap<String, FieldValue> = HashMap::new();
    let mut errors: Vec<FieldError> = Vec::new();

    for (key, input) in inputs {
        let position = remaining.iter().position(|entry| match lookup {
            Lookup::LoadKey => entry.load_key() == key,
            Lookup::Name => entry.name() == key,
        });
        let Some(position) = position else {
            if ignore_extra {
                warn!("Ignoring unknown key '{}' for schema '{}'", key, ty.name());
            } else {
                errors.push(FieldError::unknown_field(key).with_operation(operation));
            }
            continue;
        };
        let entry = remaining.remove(position);
        trace!("Processing field '{}' from key '{}'", entry.name(), key);

        match process_field(ty, entry, &values, input, operation) {
            Ok(value) => {
                values.insert(entry.name().to_string(), value);
            }
            Err(field_errors) => errors.extend(field_errors),
        }
    }

    let mut default_filled = HashSet::new();
    for entry in remaining {
        let field = entry.field();
        if field.is_required() {
            trace!("Missing required field '{}'", entry.name());
            errors.push(
                field
                    .format_error(
                        ErrorKind::FieldRequired,
                        REQUIRED_MESSAGE.into(),
                        None,
                        operation,
                    )
                    .bind(entry.name(), entry.load_key(), operation),
            );
        } else if let Some(default) = field.default_value() {
            let value = default.resolve(&DefaultContext {
                field,
                field_name: entry.name(),
                schema: ty,
                values: &values,
            });
            trace!("Filled field '{}' from its default", entry.name());
            values.insert(entry.name().to_string(), value);
            default_filled.insert(entry.name().to_string());
        }
    }

    if !errors.is_empty() {
        debug!(
            "Loading schema '{}' failed with {} error(s)",
            ty.name(),
            errors.len()
        );
        return Err(ValidationError::with_class(
            errors,
            ty.config().validation_error_class.clone(),
        ));
    }

    debug!(
        "Loaded schema '{}' with {} value(s)",
        ty.name(),
        values.len()
    );
    Ok(Schema::from_parts(
        ty.clone(),
        values,
        SchemaContext {
            initialized: true,
            mode: match lookup {
                Lookup::LoadKey => Mode::Data,
                Lookup::Name => Mode::Values,
            },
            subset,
            default_filled,
        },
    ))
}

/// Run one field through raw validators, null policy, coercion and normal
/// validators. Returns the value to store, or the bound errors of this pass.
pub(crate) fn process_field(
    ty: &SchemaType,
    entry: &FieldEntry,
    values: &HashMap<String, FieldValue>,
    input: Input<'_>,
    operation: Operation,
) -> Result<FieldValue, Vec<FieldError>> {
    let field = entry.field();
    let context = LoadContext {
        field,
        field_name: entry.name(),
        schema: ty,
        values,
        input,
        operation,
    };
    let mut errors = Vec::new();

    let raw_validators = field.validators().raw();
    let schema_raw_validators = entry.schema_validators().raw();
    if !raw_validators.is_empty() || !schema_raw_validators.is_empty() {
        let raw = match input {
            Input::Raw(value) => FieldValue::from_json(value),
            Input::Typed(value) => value.clone(),
        };
        errors.extend(run_all(
            raw_validators.iter().chain(schema_raw_validators),
            &raw,
            &context,
        ));
    }

    let value = if input.is_null() {
        if field.is_nullable() {
            Some(FieldValue::Null)
        } else {
            errors.push(context.error(ErrorKind::NoneDisallowed, NONE_DISALLOWED_MESSAGE));
            None
        }
    } else {
        let loaded = match input {
            Input::Raw(value) => field.kind().value_load(value, &context),
            Input::Typed(value) => field.kind().value_set(value, &context),
        };
        match loaded {
            Ok(value) => {
                errors.extend(run_all(
                    field
                        .validators()
                        .normal()
                        .iter()
                        .chain(entry.schema_validators().normal()),
                    &value,
                    &context,
                ));
                Some(value)
            }
            Err(error) => {
                errors.push(error);
                None
            }
        }
    };

    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ => {
            let raw = input.to_json();
            Err(errors
                .into_iter()
                .map(|error| {
                    error
                        .with_value(Some(raw.clone()))
                        .bind(entry.name(), entry.load_key(), operation)
                })
                .collect())
        }
    }
}
