//! Common test utilities for schema validation testing.
//!
//! This module provides assertion macros, schema fixtures and small helpers
//! shared by the validation and integration suites.

use schema_engine::{Field, SchemaType};
use serde_json::{Map, Value};

pub mod fixtures;

/// Convert a `json!` object literal into the map form `load` expects.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected a JSON object, got {}", other),
    }
}

/// Build a one-field schema around `field`, named `value`.
pub fn single(field: Field) -> SchemaType {
    SchemaType::builder("Single")
        .field("value", field)
        .build()
        .expect("Failed to build single-field schema")
}

/// Initialize logging once per test binary; honours `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Custom assertion macro for the raw error report of a failed load
#[macro_export]
macro_rules! assert_raw_errors {
    ($result:expr, $expected:expr) => {
        match $result {
            Err(err) => assert_eq!(err.raw(), $expected, "Unexpected error report"),
            Ok(instance) => panic!(
                "Expected validation to fail with {}, but it passed: {:?}",
                $expected, instance
            ),
        }
    };
}

/// Custom assertion macro for successful validation
#[macro_export]
macro_rules! assert_validation_success {
    ($result:expr) => {
        match $result {
            Ok(instance) => instance,
            Err(err) => panic!("Expected validation to succeed, but got error: {}", err),
        }
    };
}

/// Custom assertion macro for specific error messages
#[macro_export]
macro_rules! assert_error_message_contains {
    ($result:expr, $substring:expr) => {
        match $result {
            Err(err) => assert!(
                err.to_string().contains($substring),
                "Error message '{}' does not contain '{}'",
                err.to_string(),
                $substring
            ),
            Ok(_) => panic!(
                "Expected error containing '{}', but validation passed",
                $substring
            ),
        }
    };
}
