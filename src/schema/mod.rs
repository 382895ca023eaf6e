//! Schema types, instances and the load/dump pipelines.
//!
//! # Key Types
//!
//! - [`SchemaType`] - A declared schema with its ordered field registry
//! - [`Schema`] - A validated record of a schema type
//! - [`SchemaRegistry`] - Named schema types built from JSON definitions
//!
//! # Examples
//!
//! ```rust
//! use schema_engine::field::Field;
//! use schema_engine::schema::SchemaType;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let person = SchemaType::builder("Person")
//!     .field("id", Field::integer().strict(false))
//!     .field("name", Field::string())
//!     .build()?;
//!
//! let record = person.load_json(&json!({"id": "42", "name": "Ann"}))?;
//! assert_eq!(record.get_value("id")?.as_i64(), Some(42));
//! assert_eq!(serde_json::Value::Object(record.dump()?), json!({"id": 42, "name": "Ann"}));
//! # Ok(())
//! # }
//! ```

mod instance;
mod load;
pub mod registry;
mod types;


pub use instance::{DumpOptions, Mode, Schema};
pub use registry::{FieldDefinition, FieldType, SchemaDefinition, SchemaRegistry};
pub use types::{FieldEntry, LoadOptions, SchemaBuilder, SchemaType};
