//! Library domain scenarios driven by declarative definitions.

use crate::common::fixtures::{LIBRARY_DEFINITIONS, minimal_book, valid_book};
use crate::common::{init_logging, object};
use crate::{assert_error_message_contains, assert_raw_errors, assert_validation_success};
use schema_engine::schema::Mode;
use schema_engine::{DumpOptions, FieldValue, SchemaError, SchemaRegistry};
use serde_json::{Value, json};
use std::fs;

fn library() -> SchemaRegistry {
    init_logging();
    let mut registry = SchemaRegistry::new();
    registry
        .register_json(LIBRARY_DEFINITIONS)
        .expect("Failed to register library definitions");
    registry
}

#[test]
fn test_full_record_round_trips() {
    let registry = library();
    let book = registry.require("Book").unwrap();

    let record = assert_validation_success!(book.load(&object(valid_book())));
    assert_eq!(record.mode(), Mode::Data);
    assert_eq!(Value::Object(record.dump().unwrap()), valid_book());
}

#[test]
fn test_defaults_fill_missing_fields() {
    let registry = library();
    let book = registry.require("Book").unwrap();

    let record = assert_validation_success!(book.load(&object(minimal_book())));
    assert!(record.is_default_filled("genres"));
    assert!(record.is_default_filled("format"));
    assert!(!record.is_default_filled("published"));
    assert_eq!(
        Value::Object(record.dump().unwrap()),
        json!({
            "title": "Dune",
            "author": {"name": "Frank Herbert", "rating": 9},
            "genres": [],
            "format": "paperback"
        })
    );
}

#[test]
fn test_errors_from_every_level_are_reported_together() {
    let registry = library();
    let book = registry.require("Book").unwrap();

    let data = json!({
        "title": 12,
        "author": {"name": "Frank Herbert", "rating": 11, "born": 1920},
        "format": "scroll",
        "isbn": "0441013597"
    });
    let error = book.load(&object(data)).unwrap_err();
    assert_eq!(
        error.raw(),
        json!({
            "title": ["Value for this field must be of string data type."],
            "author": [{
                "rating": ["Value must be in range 1 to 10 inclusive"],
                "born": ["Invalid or unknown field."]
            }],
            "format": ["Value must be one of: 'hardcover', 'paperback'"],
            "isbn": ["Invalid or unknown field."]
        })
    );

    let text = error.to_string();
    assert!(text.starts_with("Validation failed for this schema:"));
    assert!(text.contains("In field author:"));
    assert!(text.contains("Error: Value must be in range 1 to 10 inclusive"));
}

#[test]
fn test_shelf_with_renamed_and_partial_fields() {
    let registry = library();
    let shelf = registry.require("Shelf").unwrap();

    let data = json!({
        "shelfLabel": "A1",
        "books": [{"title": "Dune"}],
        "owner": {"name": "Ann"},
        "colour": "red"
    });
    let record = assert_validation_success!(shelf.load(&object(data)));
    assert_eq!(record.get_value("label").unwrap().as_str(), Some("A1"));
    assert_eq!(
        Value::Object(record.dump().unwrap()),
        json!({"shelfLabel": "A1", "books": [{"title": "Dune"}], "owner": {"name": "Ann"}})
    );

    let data = json!({"shelfLabel": "A1", "books": [{"title": "Dune"}], "owner": null});
    let record = assert_validation_success!(shelf.load(&object(data)));
    assert!(record.get_value("owner").unwrap().is_null());

    assert_raw_errors!(
        shelf.load(&object(json!({"shelfLabel": "A1", "books": [1], "owner": {"name": "Ann", "rating": 2}}))),
        json!({
            "books": ["Sequence item at index 0: Must be a valid dictionary"],
            "owner": [{"rating": ["Invalid or unknown field."]}]
        })
    );
}

#[test]
fn test_updates_and_selective_dumps() {
    let registry = library();
    let book = registry.require("Book").unwrap();
    let mut record = assert_validation_success!(book.load(&object(valid_book())));

    record.set("title", "Dune Messiah").unwrap();
    let error = record.set("format", "scroll").unwrap_err();
    assert!(error.as_validation().is_some());
    assert_eq!(record.get_value("format").unwrap().as_str(), Some("hardcover"));

    let author = registry.require("Author").unwrap();
    let replacement = assert_validation_success!(
        author.load(&object(json!({"name": "Brian Herbert", "rating": 6})))
    );
    record.set("author", replacement).unwrap();

    let dumped = record
        .dump_with(&DumpOptions::new().include(["title", "author"]))
        .unwrap();
    assert_eq!(
        Value::Object(dumped),
        json!({"title": "Dune Messiah", "author": {"name": "Brian Herbert", "rating": 6}})
    );

    let error = record.set("author", FieldValue::from("nobody")).unwrap_err();
    assert_error_message_contains!(
        Err::<(), _>(error),
        "Value for this field must be a Author object."
    );
}

#[test]
fn test_registry_from_file() {
    init_logging();
    let path = std::env::temp_dir().join(format!(
        "schema-engine-library-{}.json",
        std::process::id()
    ));
    fs::write(&path, LIBRARY_DEFINITIONS).unwrap();

    let registry = SchemaRegistry::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(registry.names(), ["Author", "Book", "Shelf"]);

    let missing = SchemaRegistry::from_file(&path).unwrap_err();
    assert!(matches!(missing, SchemaError::Io(_)));
}
