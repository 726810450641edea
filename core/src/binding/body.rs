#![deny(missing_docs)]

//! # Body Validation
//!
//! Selects the schema for the request's content type, optionally lets an
//! external discriminator pick a variant, and validates the payload under
//! the root name `body`.

use crate::binding::params::{missing_parameter, ParameterDescriptor};
use crate::binding::request::{Argument, RawRequest};
use crate::error::{AppError, AppResult, FieldError, FieldErrors, Severity, ValidateError};
use crate::schema::SchemaNode;
use crate::validation::{ParentKind, Validator};
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Root field name for body values.
pub const BODY_ROOT: &str = "body";

/// Content type assumed when the request declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Picks the schema a body must match when a union cannot be told apart structurally.
///
/// Returns the name of a schema in the document. Implementations may do
/// asynchronous work; the binder awaits the result before validating.
pub trait Discriminator: Send + Sync {
    /// Returns the schema name for `request`.
    fn discriminate<'a>(&'a self, request: &'a RawRequest) -> BoxFuture<'a, AppResult<String>>;
}

/// Adapts a synchronous closure into a [`Discriminator`].
pub struct FnDiscriminator<F>(pub F);

impl<F> FnDiscriminator<F>
where
    F: Fn(&RawRequest) -> AppResult<String> + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Discriminator for FnDiscriminator<F>
where
    F: Fn(&RawRequest) -> AppResult<String> + Send + Sync,
{
    fn discriminate<'a>(&'a self, request: &'a RawRequest) -> BoxFuture<'a, AppResult<String>> {
        future::ready((self.0)(request)).boxed()
    }
}

/// Accepted content types of a request body.
#[derive(Clone, Default)]
pub struct RequestBodyDescriptor {
    /// Content type (e.g. `application/json`) to schema.
    pub content: IndexMap<String, SchemaNode>,
    /// Optional variant selector.
    pub discriminator: Option<Arc<dyn Discriminator>>,
}

// Manual Debug implementation; the discriminator is an opaque capability.
impl fmt::Debug for RequestBodyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBodyDescriptor")
            .field("content", &self.content)
            .field(
                "discriminator",
                &self.discriminator.as_ref().map(|_| "Some(Discriminator)"),
            )
            .finish()
    }
}

impl RequestBodyDescriptor {
    /// Body accepting `schema` as `application/json`.
    pub fn json(schema: SchemaNode) -> Self {
        Self::new().with_content(DEFAULT_CONTENT_TYPE, schema)
    }

    /// Empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema for a content type.
    pub fn with_content(mut self, content_type: impl Into<String>, schema: SchemaNode) -> Self {
        self.content.insert(content_type.into(), schema);
        self
    }

    /// Attaches a discriminator.
    pub fn with_discriminator(mut self, discriminator: Arc<dyn Discriminator>) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Schema registered for `content_type`, ignoring parameters and case.
    pub fn schema_for(&self, content_type: &str) -> Option<&SchemaNode> {
        let wanted = media_type_essence(content_type);
        self.content
            .iter()
            .find(|(ct, _)| media_type_essence(ct) == wanted)
            .map(|(_, schema)| schema)
    }
}

/// `Application/JSON; charset=utf-8` → `application/json`.
pub(crate) fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl Validator {
    /// Validates the body of `request` for a `body` parameter.
    pub(crate) async fn bind_body<'r>(
        &self,
        param: &ParameterDescriptor,
        descriptor: Option<&RequestBodyDescriptor>,
        request: &'r RawRequest,
    ) -> AppResult<Argument<'r>> {
        let descriptor = descriptor.ok_or_else(|| {
            AppError::Schema(format!(
                "Body parameter '{}' has no request body descriptor",
                param.name
            ))
        })?;

        let content_type = request.content_type().unwrap_or(DEFAULT_CONTENT_TYPE);
        let Some(declared) = descriptor.schema_for(content_type) else {
            let mut fields = FieldErrors::new();
            fields.insert(
                param.name.clone(),
                FieldError {
                    message: "content-type is not allowed".into(),
                    value: Some(content_type.into()),
                },
            );
            return Err(ValidateError::client("content-type is not allowed", fields).into());
        };

        let discriminated;
        let schema = match &descriptor.discriminator {
            Some(discriminator) => {
                let name = discriminator.discriminate(request).await?;
                tracing::debug!(schema = %name, "body schema chosen by discriminator");
                discriminated = SchemaNode::reference(name);
                &discriminated
            }
            None => declared,
        };

        let Some(payload) = request.body() else {
            return if param.required {
                Err(missing_parameter(&param.name))
            } else {
                Ok(Argument::Undefined)
            };
        };

        // Failures carry the literal sub-value the client sent at the failing path.
        self.for_typed_payload()
            .validate(BODY_ROOT, payload, schema, ParentKind::Unknown)
            .map(Argument::Value)
            .map_err(|e| e.into_app_error(Severity::Client))
    }
}
