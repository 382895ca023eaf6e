//! # Schema Check
//!
//! A command-line utility for validating JSON data against schemas declared in
//! a definition file.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin schema-check definitions.json Book data.json
//! ```
//!
//! The definition file holds one schema definition or a list of them, in
//! dependency order. The data file holds one object or a list of objects.
//!
//! ## Output Examples
//!
//! ### Successful Validation
//!
//! ```text
//! Validating data.json against Book
//! ✓ Record 0 is valid
//! {
//!   "title": "Dune",
//!   "author": {
//!     "name": "Frank Herbert",
//!     "rating": 5
//!   }
//! }
//! ```
//!
//! ### Failed Validation
//!
//! ```text
//! Validating data.json against Book
//! ❌ Record 0 is invalid
//! {
//!   "author": [
//!     {
//!       "rating": [
//!         "This field is required."
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: Every record is valid
//! - `1`: A record is invalid or the inputs could not be read

use schema_engine::{SchemaRegistry, SchemaType};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <definitions.json> <SchemaName> <data.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} schemas/library.json Book data/books.json", args[0]);
        process::exit(1);
    }

    let registry = match SchemaRegistry::from_file(&args[1]) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("❌ Failed to load schema definitions: {}", e);
            process::exit(1);
        }
    };

    let schema = match registry.require(&args[2]) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("Available schemas: {}", registry.names().join(", "));
            process::exit(1);
        }
    };

    let data_path = Path::new(&args[3]);
    let records = match read_records(data_path) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("❌ Failed to read data file: {}", e);
            process::exit(1);
        }
    };

    println!("Validating {} against {}", data_path.display(), schema.name());
    let invalid = records
        .iter()
        .enumerate()
        .filter(|(idx, record)| !check_record(schema, *idx, record))
        .count();

    if records.len() > 1 {
        println!("\nValidation Summary:");
        println!("  Valid records: {}", records.len() - invalid);
        println!("  Invalid records: {}", invalid);
    }

    if invalid > 0 {
        process::exit(1);
    }
}

fn read_records(path: &Path) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Array(records) => Ok(records),
        record @ Value::Object(_) => Ok(vec![record]),
        _ => Err("data must be a JSON object or a list of objects".into()),
    }
}

/// Load and dump one record, printing the outcome. Returns whether it is valid.
fn check_record(schema: &SchemaType, idx: usize, record: &Value) -> bool {
    let outcome = schema
        .load_json(record)
        .and_then(|instance| Ok(instance.dump()?));

    match outcome {
        Ok(dumped) => {
            println!("✓ Record {} is valid", idx);
            print_json(&Value::Object(dumped));
            true
        }
        Err(e) => {
            eprintln!("❌ Record {} is invalid", idx);
            match e.as_validation() {
                Some(validation) => print_json(&validation.raw()),
                None => eprintln!("  {}", e),
            }
            false
        }
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
