//! Integration tests.
//!
//! End-to-end scenarios over schemas declared in code and through the
//! registry: loading, dumping, updating and error reporting across nesting
//! levels.

pub mod library;
pub mod roundtrip;
