//! Schema configuration.
//!
//! Every schema type carries a [`SchemaConfig`]. Builders that do not set one
//! explicitly inherit it from their parent type, or else take a snapshot of
//! the process-wide default at build time.

use crate::error::{ErrorClass, SchemaError, SchemaResult};
use serde::Deserialize;
use serde_json::Value;
use std::sync::{LazyLock, RwLock};

/// Configuration options of a schema type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaConfig {
    /// Skip input keys that match no field instead of reporting them.
    pub ignore_extra_fields: bool,
    /// Class of the aggregate error raised on validation failure.
    pub validation_error_class: ErrorClass,
}

/// Serialized form of [`SchemaConfig`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    #[serde(default)]
    ignore_extra_fields: Option<bool>,
    #[serde(default)]
    validation_error_class: Option<String>,
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_extra_fields(mut self, ignore: bool) -> Self {
        self.ignore_extra_fields = ignore;
        self
    }

    pub fn with_error_class(mut self, class: ErrorClass) -> Self {
        self.validation_error_class = class;
        self
    }

    /// Read options from a JSON object, starting from the defaults.
    ///
    /// Unknown option names and wrongly typed values are rejected.
    pub fn from_json(value: &Value) -> SchemaResult<Self> {
        Self::default().merge_json(value)
    }

    /// Apply the options present in a JSON object on top of this configuration.
    pub fn merge_json(mut self, value: &Value) -> SchemaResult<Self> {
        let document = ConfigDocument::deserialize(value)
            .map_err(|e| SchemaError::invalid_config(e.to_string()))?;
        if let Some(ignore) = document.ignore_extra_fields {
            self.ignore_extra_fields = ignore;
        }
        if let Some(name) = document.validation_error_class {
            self.validation_error_class = if name == ErrorClass::BASE {
                ErrorClass::base()
            } else {
                ErrorClass::new(name)?
            };
        }
        Ok(self)
    }
}

static GLOBAL: LazyLock<RwLock<SchemaConfig>> = LazyLock::new(|| RwLock::new(SchemaConfig::default()));

/// The process-wide default configuration.
pub fn global() -> SchemaConfig {
    match GLOBAL.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the process-wide default. Only affects schema types built afterwards.
pub fn set_global(config: SchemaConfig) {
    let mut guard = match GLOBAL.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    log::debug!("Updating global schema configuration: {config:?}");
    *guard = config;
}

/// Restore the process-wide default.
pub fn reset_global() {
    set_global(SchemaConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_reads_known_options() {
        let config = SchemaConfig::from_json(&json!({
            "ignore_extra_fields": true,
            "validation_error_class": "ApiError"
        }))
        .unwrap();
        assert!(config.ignore_extra_fields);
        assert_eq!(config.validation_error_class.name(), "ApiError");
    }

    #[test]
    fn test_from_json_rejects_unknown_options() {
        let err = SchemaConfig::from_json(&json!({"invalid_cfg": 1})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConfig { .. }));
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        let err = SchemaConfig::from_json(&json!({"ignore_extra_fields": "yes"})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConfig { .. }));
        assert!(SchemaConfig::from_json(&json!({"validation_error_class": "has space"})).is_err());
    }

    #[test]
    fn test_merge_keeps_unset_options() {
        let base = SchemaConfig::new().with_ignore_extra_fields(true);
        let merged = base.merge_json(&json!({})).unwrap();
        assert!(merged.ignore_extra_fields);
        assert!(merged.validation_error_class.is_base());
    }
}
