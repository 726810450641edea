//! # Error Handling
//!
//! Provides the unified `AppError` enum returned at the crate boundary, the
//! client-facing `ValidateError` payload, and the engine-internal
//! `ValidationError` used while walking a schema.

use crate::value::Value;
use derive_more::{Display, From};
use indexmap::IndexMap;
use serde::Serialize;

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// A request or response value violated its schema.
    #[display("Validation Error: {_0}")]
    Validation(ValidateError),

    /// The schema document or a route descriptor is broken.
    /// Never caused by a request; created explicitly.
    #[from(ignore)]
    #[display("Schema Error: {_0}")]
    Schema(String),

    /// Wrapper for JSON (de)serialization errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML parsing errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status the transport layer should answer with.
    ///
    /// Only validation failures map to a definite status; everything else is
    /// an internal fault.
    pub fn status(&self) -> u16 {
        match self {
            AppError::Validation(err) => err.status(),
            _ => 500,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

/// Who is at fault for a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The caller sent a value violating the route's input schema.
    Client,
    /// The handler produced output violating its own declared schema.
    Server,
}

/// A single entry of the field map presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Human-readable reason.
    pub message: String,
    /// The offending value, when it could be recovered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Field path (e.g. `body.items.0`) to failure details.
pub type FieldErrors = IndexMap<String, FieldError>;

/// The single error thrown by the parameter binder and the response validator.
#[derive(Debug, Clone, PartialEq, Serialize, Display)]
#[display("{message} ({} field error(s))", fields.len())]
pub struct ValidateError {
    /// Summary message.
    pub message: String,
    /// Per-field failures. Holds exactly one entry for engine failures.
    pub fields: FieldErrors,
    /// Client or server fault.
    pub severity: Severity,
}

impl ValidateError {
    /// Builds a client-side (400) error.
    pub fn client(message: impl Into<String>, fields: FieldErrors) -> Self {
        Self {
            message: message.into(),
            fields,
            severity: Severity::Client,
        }
    }

    /// Builds a server-side (500) error.
    pub fn server(message: impl Into<String>, fields: FieldErrors) -> Self {
        Self {
            message: message.into(),
            fields,
            severity: Severity::Server,
        }
    }

    /// Escalates the error to a server fault, keeping its shape.
    pub fn into_server(mut self) -> Self {
        self.severity = Severity::Server;
        self
    }

    /// HTTP status code: 400 for client faults, 500 for server faults.
    pub fn status(&self) -> u16 {
        match self.severity {
            Severity::Client => 400,
            Severity::Server => 500,
        }
    }
}

/// A failed value check, addressed by its dotted field path.
#[derive(Debug, Clone, PartialEq, Display)]
#[display("{field}: {message}")]
pub struct FieldFailure {
    /// Reason for the failure.
    pub message: String,
    /// Dotted path rooted at the top-level parameter name.
    pub field: String,
    /// The value that failed, if meaningful.
    pub value: Option<Value>,
}

impl FieldFailure {
    /// Creates a failure without an echoed value.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
            value: None,
        }
    }

    /// Attaches the offending value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Converts the failure into a one-entry field map.
    pub fn into_fields(self) -> FieldErrors {
        let mut fields = FieldErrors::new();
        fields.insert(
            self.field,
            FieldError {
                message: self.message,
                value: self.value,
            },
        );
        fields
    }
}

/// Engine-internal error while validating a value.
///
/// `Invalid` is an ordinary outcome (the value does not conform); `Schema`
/// means the schema graph itself could not be walked and must not be
/// swallowed by union resolution.
#[derive(Debug, Clone, PartialEq, Display, From)]
pub enum ValidationError {
    /// The value does not conform.
    #[display("{_0}")]
    Invalid(FieldFailure),

    /// The schema graph is broken (e.g. unresolved reference).
    #[from(ignore)]
    #[display("{_0}")]
    Schema(String),
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Converts to the boundary error, classifying value failures with `severity`.
    pub fn into_app_error(self, severity: Severity) -> AppError {
        match self {
            ValidationError::Invalid(failure) => {
                let message = failure.message.clone();
                let fields = failure.into_fields();
                AppError::Validation(match severity {
                    Severity::Client => ValidateError::client(message, fields),
                    Severity::Server => ValidateError::server(message, fields),
                })
            }
            ValidationError::Schema(msg) => AppError::Schema(msg),
        }
    }
}

impl From<AppError> for ValidationError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Schema(msg) => ValidationError::Schema(msg),
            other => ValidationError::Schema(other.to_string()),
        }
    }
}
