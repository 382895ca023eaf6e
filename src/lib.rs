//! Declarative schema validation and load/dump engine.
//!
//! Schemas are declared as ordered sets of named, typed fields. Loading turns
//! an untyped JSON mapping into a validated [`Schema`] instance, accumulating
//! every field error into one [`ValidationError`]; dumping turns the instance
//! back into a plain mapping.
//!
//! # Core Components
//!
//! - [`SchemaType`] / [`SchemaBuilder`] - Schema declaration and the load pipeline
//! - [`Field`] / [`FieldKind`] - Field policy and coercion
//! - [`Validator`] - Raw and normal per-field validators
//! - [`TypeExpr`] - Structural type validation for collection fields
//! - [`ValidationError`] - Aggregate error with a stable [`raw`](ValidationError::raw) report
//!
//! # Quick Start
//!
//! ```rust
//! use schema_engine::{Field, SchemaType};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let author = SchemaType::builder("Author")
//!     .field("name", Field::string())
//!     .field("rating", Field::integer())
//!     .build()?;
//! let book = SchemaType::builder("Book")
//!     .field("title", Field::string())
//!     .field("author", Field::object(&author))
//!     .build()?;
//!
//! let error = book
//!     .load_json(&json!({"title": "t", "author": {"name": "x"}}))
//!     .unwrap_err();
//! let report = error.as_validation().unwrap().raw();
//! assert_eq!(report, json!({"author": [{"rating": ["This field is required."]}]}));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod schema;
pub mod typing;
pub mod validator;
pub mod value;

// Re-export commonly used types for convenience
pub use config::SchemaConfig;
pub use context::{DumpContext, ErrorFormatterContext, LoadContext, Operation};
pub use error::{
    Error, ErrorClass, ErrorKind, FieldError, Message, Result, SchemaError, SchemaResult,
    ValidationError, ValidationResult,
};
pub use field::{Field, FieldKind};
pub use schema::{DumpOptions, LoadOptions, Schema, SchemaBuilder, SchemaRegistry, SchemaType};
pub use typing::{TypeExpr, TypeValidator, TypedDictDef, validate_types};
pub use validator::{Range, Validator, ValidatorError};
pub use value::FieldValue;
