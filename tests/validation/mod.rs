//! Validation tests module.
//!
//! Field-level behaviour exercised through the public API, organized by
//! category: primitive coercion, structural containers and standalone type
//! validation.

pub mod primitives;
pub mod structural;
pub mod typing;
