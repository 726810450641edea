#![deny(missing_docs)]

//! # CDD Runtime
//!
//! Schema-driven validation and coercion for HTTP handlers.
//!
//! Given a schema document and a raw request, the binder produces the typed
//! argument list for a route; the response validator checks what the handler
//! returned against its declared responses.

/// Shared error types.
pub mod error;

/// Runtime feature flags.
pub mod config;

/// In-memory runtime values.
pub mod value;

/// Schema node model and OpenAPI loading.
pub mod schema;

/// Named schema registry and reference resolution.
pub mod document;

/// Recursive validation engine.
pub mod validation;

/// Request binding and response validation.
pub mod binding;

pub use binding::{
    Argument, Discriminator, FnDiscriminator, ParamLocation, ParameterDescriptor, RawRequest,
    RequestBodyDescriptor, ResponseDescriptor, ResponseRules, RouteDescriptor,
};
pub use config::ValidatorConfig;
pub use document::SchemaDocument;
pub use error::{
    AppError, AppResult, FieldError, FieldFailure, Severity, ValidateError, ValidationError,
};
pub use schema::{AdditionalProperties, SchemaKind, SchemaNode};
pub use validation::{ParentKind, Validation, Validator};
pub use value::{Object, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_validator_is_shareable() {
        assert_send_sync::<Validator>();
        assert_send_sync::<RouteDescriptor>();
        let validator = Validator::new(Arc::new(SchemaDocument::new()), ValidatorConfig::default());
        assert!(validator.document().is_empty());
    }
}
