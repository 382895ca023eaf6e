//! Test fixtures: declarative definitions and sample records.

use serde_json::{Value, json};

/// Definitions of a small library domain, in dependency order.
pub const LIBRARY_DEFINITIONS: &str = r#"[
    {
        "name": "Author",
        "fields": [
            {"name": "name", "type": "string"},
            {"name": "rating", "type": "integer", "min": 1, "max": 10}
        ]
    },
    {
        "name": "Book",
        "fields": [
            {"name": "title", "type": "string"},
            {"name": "author", "type": "object", "schema": "Author"},
            {"name": "published", "type": "datetime", "required": false},
            {"name": "genres", "type": "set", "items": "str", "default": []},
            {"name": "format", "type": "literal", "values": ["hardcover", "paperback"], "default": "paperback"}
        ]
    },
    {
        "name": "Shelf",
        "config": {"ignore_extra_fields": true},
        "fields": [
            {"name": "label", "type": "string", "data_key": "shelfLabel"},
            {"name": "books", "type": "typed", "expr": "list[dict[str, any]]"},
            {"name": "owner", "type": "partial", "schema": "Author", "include": ["name"], "nullable": true}
        ]
    }
]"#;

pub fn valid_book() -> Value {
    json!({
        "title": "Dune",
        "author": {"name": "Frank Herbert", "rating": 9},
        "published": "1965-08-01T00:00:00Z",
        "genres": ["sf", "classic"],
        "format": "hardcover"
    })
}

pub fn minimal_book() -> Value {
    json!({
        "title": "Dune",
        "author": {"name": "Frank Herbert", "rating": 9}
    })
}
