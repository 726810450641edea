//! # Validator Configuration
//!
//! Process-level switches consumed by the engine. Set once when the service
//! is configured, then shared read-only by every validation.

use crate::error::AppResult;
use serde::{Deserialize, Serialize};

/// Additional-property switches.
///
/// Both default to `false`: undeclared object keys are accepted on the wire
/// and silently stripped from coerced values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorConfig {
    /// Log (and strip) undeclared object keys.
    pub log_unexpected_additional_data: bool,
    /// Reject undeclared object keys.
    pub throw_unexpected_additional_data: bool,
}

impl ValidatorConfig {
    /// Lenient defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables logging of undeclared object keys.
    pub fn log_unexpected(mut self, enabled: bool) -> Self {
        self.log_unexpected_additional_data = enabled;
        self
    }

    /// Enables rejection of undeclared object keys.
    pub fn throw_unexpected(mut self, enabled: bool) -> Self {
        self.throw_unexpected_additional_data = enabled;
        self
    }

    /// Whether either strict switch is on.
    pub fn is_strict(&self) -> bool {
        self.log_unexpected_additional_data || self.throw_unexpected_additional_data
    }

    /// Parses a configuration from YAML (or JSON, which is valid YAML).
    ///
    /// ```yaml
    /// logUnexpectedAdditionalData: true
    /// throwUnexpectedAdditionalData: false
    /// ```
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
