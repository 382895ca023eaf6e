//! Primitive field validation tests.
//!
//! Strict and lenient coercion of strings, numbers, booleans and datetimes.

use crate::common::{object, single};
use crate::{assert_raw_errors, assert_validation_success};
use chrono::{TimeZone, Utc};
use schema_engine::field::BoolKind;
use schema_engine::{ErrorKind, Field, FieldValue};
use serde_json::json;

#[test]
fn test_strict_string_rejects_numbers() {
    let schema = single(Field::string());
    assert_raw_errors!(
        schema.load(&object(json!({"value": 5}))),
        json!({"value": ["Value for this field must be of string data type."]})
    );
}

#[test]
fn test_strict_integer_rejects_booleans_and_floats() {
    let schema = single(Field::integer());
    assert_raw_errors!(
        schema.load(&object(json!({"value": true}))),
        json!({"value": ["Value for this field must be of integer data type."]})
    );
    assert_raw_errors!(
        schema.load(&object(json!({"value": 1.5}))),
        json!({"value": ["Value for this field must be of integer data type."]})
    );
}

#[test]
fn test_lenient_integer_truncates_floats() {
    let schema = single(Field::integer().strict(false));
    let record = assert_validation_success!(schema.load(&object(json!({"value": 3.9}))));
    assert_eq!(record.get_value("value").unwrap(), &FieldValue::Int(3));

    let record = assert_validation_success!(schema.load(&object(json!({"value": " 17 "}))));
    assert_eq!(record.get_value("value").unwrap(), &FieldValue::Int(17));
}

#[test]
fn test_strict_float_rejects_integers() {
    let schema = single(Field::float());
    assert_raw_errors!(
        schema.load(&object(json!({"value": 2}))),
        json!({"value": ["Value for this field must be of float data type."]})
    );

    let lenient = single(Field::float().strict(false));
    let record = assert_validation_success!(lenient.load(&object(json!({"value": 2}))));
    assert_eq!(record.get_value("value").unwrap(), &FieldValue::Float(2.0));
    assert_raw_errors!(
        lenient.load(&object(json!({"value": "two"}))),
        json!({"value": ["Value for this field must be a float-convertable value."]})
    );
}

#[test]
fn test_boolean_conversion_tables() {
    let schema = single(Field::boolean().strict(false));
    for (raw, expected) in [("True", true), ("1", true), ("no", false), ("FALSE", false)] {
        let record = assert_validation_success!(schema.load(&object(json!({"value": raw}))));
        assert_eq!(record.get_value("value").unwrap().as_bool(), Some(expected));
    }
    assert_raw_errors!(
        schema.load(&object(json!({"value": "maybe"}))),
        json!({"value": ["Value for this field must be a boolean-convertable value."]})
    );

    let custom = single(Field::new(BoolKind::with_values(["on"], ["off"])).strict(false));
    let record = assert_validation_success!(custom.load(&object(json!({"value": "on"}))));
    assert_eq!(record.get_value("value").unwrap().as_bool(), Some(true));
    assert!(custom.load(&object(json!({"value": "yes"}))).is_err());
}

#[test]
fn test_strict_datetime_requires_rfc3339() {
    let schema = single(Field::datetime());
    let record = assert_validation_success!(
        schema.load(&object(json!({"value": "2024-03-01T12:30:00+02:00"})))
    );
    let stored = record.get_value("value").unwrap().as_datetime().unwrap();
    assert_eq!(
        stored.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap()
    );
    assert_eq!(
        record.dump().unwrap()["value"],
        json!("2024-03-01T12:30:00+02:00")
    );

    let error = schema
        .load(&object(json!({"value": "2024-03-01 12:30:00"})))
        .unwrap_err();
    assert_eq!(error.errors()[0].kind(), ErrorKind::NonConvertibleValue);

    let error = schema
        .load(&object(json!({"value": 1_700_000_000})))
        .unwrap_err();
    assert_eq!(
        error.raw(),
        json!({"value": ["Value for this field must be of datetime data type."]})
    );
}

#[test]
fn test_lenient_datetime_accepts_naive_and_timestamps() {
    let schema = single(Field::datetime().strict(false));

    let record =
        assert_validation_success!(schema.load(&object(json!({"value": "2024-03-01 12:30:00"}))));
    assert_eq!(
        record.dump().unwrap()["value"],
        json!("2024-03-01T12:30:00Z")
    );

    let record = assert_validation_success!(schema.load(&object(json!({"value": 0}))));
    assert_eq!(record.dump().unwrap()["value"], json!("1970-01-01T00:00:00Z"));

    assert_raw_errors!(
        schema.load(&object(json!({"value": "yesterday"}))),
        json!({"value": ["Value for this field must be a datetime-convertable value."]})
    );
}

#[test]
fn test_datetime_set_accepts_typed_values() {
    let schema = single(Field::datetime());
    let mut record = assert_validation_success!(
        schema.load(&object(json!({"value": "2024-03-01T12:30:00Z"})))
    );
    let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().fixed_offset();
    record.set("value", later).unwrap();
    assert_eq!(record.get_value("value").unwrap().as_datetime(), Some(&later));
}
