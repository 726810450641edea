#![deny(missing_docs)]

//! # Value Validation Engine
//!
//! Recursive dispatcher routing a `(name, value, schema)` triple to the
//! validator for the schema's shape.
//!
//! - **scalar**: string, number, boolean checks and coercions.
//! - **composite**: array, object, `allOf`, `oneOf`.
//! - **additional**: the undeclared-key policy used by the object validator.
//!
//! Every failure carries a dotted field path rooted at `name`. Validation is
//! synchronous, performs no I/O and shares nothing mutable, so one
//! [`Validator`] can serve any number of concurrent requests.

pub mod additional;
mod composite;
mod scalar;

use crate::config::ValidatorConfig;
use crate::document::SchemaDocument;
use crate::error::{FieldFailure, ValidationError};
use crate::schema::{SchemaKind, SchemaNode};
use crate::value::Value;
use std::sync::Arc;

/// Outcome of validating one value: the coerced value or the first failure.
pub type Validation = Result<Value, ValidationError>;

/// The kind of node that contains the value being validated.
///
/// Only `AllOf` changes behavior: undeclared-key checks are suppressed inside
/// `allOf` branches, because each branch sees keys owned by its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    /// Branch of an `allOf`.
    AllOf,
    /// Branch of a `oneOf`.
    OneOf,
    /// Array element.
    Array,
    /// Object property.
    Object,
    /// Top level (parameter, body, response).
    Unknown,
}

/// Validates and coerces values against a shared schema document.
#[derive(Debug, Clone)]
pub struct Validator {
    document: Arc<SchemaDocument>,
    config: ValidatorConfig,
    typed_payload: bool,
}

impl Validator {
    /// Creates a validator over `document` with the given switches.
    pub fn new(document: Arc<SchemaDocument>, config: ValidatorConfig) -> Self {
        Self {
            document,
            config,
            typed_payload: false,
        }
    }

    /// A validator for decoded JSON payloads (bodies and responses), where
    /// numbers must already be numeric.
    pub(crate) fn for_typed_payload(&self) -> Self {
        Self {
            typed_payload: true,
            ..self.clone()
        }
    }

    /// The schema document references resolve against.
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// The active configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates `value` against `schema`, returning the coerced value.
    ///
    /// 1. The schema is resolved through the document.
    /// 2. `null` yields the default of a nullable schema, or fails.
    /// 3. Shapes are dispatched in the fixed order string, number, boolean,
    ///    array, object, allOf, oneOf.
    /// 4. `any` and shapes the engine does not understand pass through.
    pub fn validate(
        &self,
        name: &str,
        value: &Value,
        schema: &SchemaNode,
        parent: ParentKind,
    ) -> Validation {
        let resolved = self.document.resolve(schema)?;

        if value.is_null() {
            return if schema.nullable || resolved.nullable {
                Ok(schema
                    .default
                    .clone()
                    .or_else(|| resolved.default.clone())
                    .unwrap_or(Value::Null))
            } else {
                Err(FieldFailure::new(name, "not nullable")
                    .with_value(Value::Null)
                    .into())
            };
        }

        match &resolved.kind {
            SchemaKind::String(s) => Ok(scalar::validate_string(name, value, s)?),
            SchemaKind::Number(n) => {
                Ok(scalar::validate_number(name, value, n, self.typed_payload)?)
            }
            SchemaKind::Boolean => Ok(scalar::validate_boolean(name, value)?),
            SchemaKind::Array(arr) => self.validate_array(name, value, arr),
            SchemaKind::Object(obj) => self.validate_object(name, value, obj, parent),
            SchemaKind::AllOf(branches) => self.validate_all_of(name, value, branches),
            SchemaKind::OneOf(branches) => self.validate_one_of(name, value, branches),
            SchemaKind::Any => Ok(value.clone()),
            SchemaKind::Ref(target) => Err(ValidationError::Schema(format!(
                "Reference '{}' did not resolve to a concrete schema",
                target
            ))),
            SchemaKind::Unknown(raw) => {
                tracing::warn!(
                    field = %name,
                    schema = %raw,
                    "unsupported schema shape; value accepted without validation"
                );
                Ok(value.clone())
            }
        }
    }
}

/// Joins a parent path and a child segment.
pub(crate) fn child_path(name: &str, segment: impl std::fmt::Display) -> String {
    format!("{}.{}", name, segment)
}
