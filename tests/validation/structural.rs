//! Structural field validation tests.
//!
//! Lists, sets, dictionaries, typed dictionaries, literals and fields typed by
//! arbitrary type expressions.

use crate::common::{object, single};
use crate::{assert_raw_errors, assert_validation_success};
use schema_engine::field::{DictKind, ListKind, TypedKind};
use schema_engine::{ErrorKind, Field, TypeExpr, TypedDictDef};
use serde_json::json;

#[test]
fn test_list_reports_every_failing_item() {
    let schema = single(Field::list(TypeExpr::Int));
    assert_raw_errors!(
        schema.load(&object(json!({"value": [1, "a", 3, "b"]}))),
        json!({"value": [
            "Sequence item at index 1: Must be of type int",
            "Sequence item at index 3: Must be of type int"
        ]})
    );
    assert_raw_errors!(
        schema.load(&object(json!({"value": {"a": 1}}))),
        json!({"value": ["Value must be a list"]})
    );
}

#[test]
fn test_list_without_stacking_stops_at_first_item() {
    let schema = single(Field::new(ListKind::new(TypeExpr::Int).stack_errors(false)));
    let error = schema
        .load(&object(json!({"value": [1, "a", 3, "b"]})))
        .unwrap_err();
    assert_eq!(
        error.raw(),
        json!({"value": ["Sequence item at index 1: Must be of type int"]})
    );
    assert_eq!(error.errors()[0].kind(), ErrorKind::StructuralValidation);
}

#[test]
fn test_set_deduplicates_items() {
    let schema = single(Field::set(TypeExpr::Str));
    let record = assert_validation_success!(schema.load(&object(json!({"value": ["a", "b", "a"]}))));
    assert_eq!(record.dump().unwrap()["value"], json!(["a", "b"]));

    assert_raw_errors!(
        schema.load(&object(json!({"value": ["a", 1]}))),
        json!({"value": ["Set includes an invalid item: Must be of type str"]})
    );
}

#[test]
fn test_dict_fields() {
    let any = single(Field::new(DictKind::any()));
    assert_validation_success!(any.load(&object(json!({"value": {"a": [1], "b": null}}))));
    assert_raw_errors!(
        any.load(&object(json!({"value": [1]}))),
        json!({"value": ["Value must be a dictionary"]})
    );

    let typed = single(Field::dict(TypeExpr::Str, TypeExpr::Float));
    assert_raw_errors!(
        typed.load(&object(json!({"value": {"a": 1.5, "b": "x"}}))),
        json!({"value": ["Dictionary value for key 'b': Must be of type float"]})
    );
}

#[test]
fn test_typed_dict_field() {
    let def = TypedDictDef::new("Point")
        .key("x", TypeExpr::Int)
        .key("y", TypeExpr::Int)
        .optional("label", TypeExpr::Str);
    let schema = single(Field::typed_dict(def));

    assert_validation_success!(schema.load(&object(json!({"value": {"x": 1, "y": 2}}))));
    assert_raw_errors!(
        schema.load(&object(json!({"value": {"x": "1", "z": 0}}))),
        json!({"value": [
            "Validation failed for 'x': Must be of type int",
            "Invalid key 'z'",
            "Key 'y' is required"
        ]})
    );
}

#[test]
fn test_literal_field() {
    let schema = single(Field::literal([1, 2, 3]));
    let record = assert_validation_success!(schema.load(&object(json!({"value": 2}))));
    assert_eq!(record.get_value("value").unwrap().as_i64(), Some(2));
    assert_raw_errors!(
        schema.load(&object(json!({"value": 4}))),
        json!({"value": ["Value must be one of: 1, 2, 3"]})
    );
}

#[test]
fn test_typed_field_with_parsed_expression() {
    let expr = TypeExpr::parse("tuple[str, optional[int]]").unwrap();
    let schema = single(Field::typed(expr));

    assert_validation_success!(schema.load(&object(json!({"value": ["a", null]}))));
    assert_validation_success!(schema.load(&object(json!({"value": ["a", 4]}))));
    assert_raw_errors!(
        schema.load(&object(json!({"value": ["a"]}))),
        json!({"value": ["Tuple length must be 2 (current length: 1)"]})
    );
    assert_raw_errors!(
        schema.load(&object(json!({"value": ["a", "b"]}))),
        json!({"value": [
            "Tuple item at index 1: Type of 'b' (str) is not compatible with types (int, NoneType)"
        ]})
    );
}

#[test]
fn test_union_field() {
    let schema = single(Field::new(TypedKind::new(TypeExpr::union(vec![
        TypeExpr::Int,
        TypeExpr::Str,
    ]))));
    assert_validation_success!(schema.load(&object(json!({"value": "x"}))));
    assert_raw_errors!(
        schema.load(&object(json!({"value": 1.5}))),
        json!({"value": ["Type of 1.5 (float) is not compatible with types (int, str)"]})
    );
}
