//! Standalone type validation tests.

use schema_engine::typing::TypeValidationError;
use schema_engine::{TypeExpr, TypeValidator, validate_types};
use serde_json::{Map, Value, json};

fn values(value: Value) -> Map<String, Value> {
    crate::common::object(value)
}

fn report(result: Result<(), TypeValidationError>) -> TypeValidationError {
    result.expect_err("Expected type validation to fail")
}

#[test]
fn test_validate_types_checks_each_named_value() {
    let types = [
        ("name", TypeExpr::Str),
        ("tags", TypeExpr::list(TypeExpr::Str)),
        ("limit", TypeExpr::optional(TypeExpr::Int)),
    ];

    assert!(validate_types(&types, &values(json!({"name": "a", "tags": [], "limit": null})), false, false).is_ok());

    let error = report(validate_types(
        &types,
        &values(json!({"name": 1, "tags": ["a", 2], "limit": 3})),
        false,
        false,
    ));
    assert_eq!(error.get("name"), Some(&["Must be of type str".to_string()][..]));
    assert_eq!(
        error.get("tags"),
        Some(&["Sequence item at index 1: Must be of type str".to_string()][..])
    );
    assert_eq!(error.get("limit"), None);
}

#[test]
fn test_validate_types_missing_and_extra_keys() {
    let types = [("a", TypeExpr::Int), ("b", TypeExpr::Int)];
    let data = values(json!({"a": 1, "c": 3}));

    let error = report(validate_types(&types, &data, false, false));
    let keys: Vec<&str> = error.errors().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["b", "c"]);
    assert_eq!(error.get("b"), Some(&["This key is missing.".to_string()][..]));
    assert_eq!(error.get("c"), Some(&["Invalid key".to_string()][..]));

    assert!(validate_types(&types, &data, true, true).is_ok());
    let error = report(validate_types(&types, &data, true, false));
    assert_eq!(error.errors().len(), 1);
}

#[test]
fn test_type_validator_on_nested_containers() {
    let validator = TypeValidator::new(TypeExpr::parse("dict[str, list[int]]").unwrap());
    assert!(validator.validate(&json!({"a": [1, 2], "b": []})).is_ok());
    assert_eq!(
        validator.validate(&json!({"a": [1, "x"]})).unwrap_err(),
        vec!["Dictionary value for key 'a': Sequence item at index 1: Must be of type int"]
    );
    assert_eq!(
        validator.validate(&json!([1])).unwrap_err(),
        vec!["Must be a valid dictionary"]
    );
}

#[test]
fn test_literal_expression_messages() {
    let single = TypeExpr::literal(["on"]);
    assert_eq!(
        single.check(&json!("off")).unwrap_err(),
        vec!["Value must be equal to 'on'"]
    );

    let many = TypeExpr::parse("literal['a', 'b']").unwrap();
    assert_eq!(
        many.check(&json!("c")).unwrap_err(),
        vec!["Value must be one of: 'a', 'b'"]
    );
}

#[test]
fn test_type_expressions_display_as_parsed() {
    for text in ["list[int]", "dict[str, optional[float]]", "tuple[int, ...]", "union[int, str]"] {
        let expr = TypeExpr::parse(text).unwrap();
        assert_eq!(TypeExpr::parse(&expr.to_string()).unwrap(), expr);
    }
    assert!(TypeExpr::parse("list[").is_err());
    assert!(TypeExpr::parse("widget").is_err());
}
