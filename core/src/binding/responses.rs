#![deny(missing_docs)]

//! # Response Validation
//!
//! Checks handler output against the route's declared responses.
//! Every value failure here is the server's fault and answers with a 500.

use crate::binding::body::{media_type_essence, DEFAULT_CONTENT_TYPE};
use crate::error::{AppError, AppResult, FieldError, FieldErrors, Severity, ValidateError};
use crate::schema::SchemaNode;
use crate::validation::{ParentKind, Validator};
use crate::value::Value;
use indexmap::IndexMap;

/// Root field name for response values.
pub const RESPONSE_ROOT: &str = "response";

/// Content schemas declared for one status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDescriptor {
    /// Content type to schema. An empty map declares a body-less response.
    pub content: IndexMap<String, SchemaNode>,
}

impl ResponseDescriptor {
    /// A response with no body.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A response whose `application/json` body matches `schema`.
    pub fn json(schema: SchemaNode) -> Self {
        Self::empty().with_content(DEFAULT_CONTENT_TYPE, schema)
    }

    /// Registers a schema for a content type.
    pub fn with_content(mut self, content_type: impl Into<String>, schema: SchemaNode) -> Self {
        self.content.insert(content_type.into(), schema);
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

/// Declared responses keyed by status: `"200"`, `"2XX"` or `"default"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseRules {
    by_status: IndexMap<String, ResponseDescriptor>,
}

impl ResponseRules {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the response for a status key.
    pub fn with(mut self, status: impl Into<String>, descriptor: ResponseDescriptor) -> Self {
        self.by_status.insert(status.into(), descriptor);
        self
    }

    /// Finds the descriptor for `status`.
    ///
    /// Lookup order: the exact code, the range (`2XX`, either case), then
    /// `default`.
    pub fn lookup(&self, status: u16) -> AppResult<&ResponseDescriptor> {
        let exact = status.to_string();
        let range = format!("{}XX", status / 100);
        self.by_status
            .get(&exact)
            .or_else(|| self.by_status.get(&range))
            .or_else(|| self.by_status.get(&range.to_ascii_lowercase()))
            .or_else(|| self.by_status.get("default"))
            .ok_or_else(|| {
                AppError::Schema(format!("Missing response schema for status code {}", status))
            })
    }
}

impl Validator {
    /// Validates a handler's `payload` for `status` and `content_type`.
    ///
    /// Returns the coerced payload; `None` when nothing was returned.
    pub fn validate_response(
        &self,
        rules: &ResponseRules,
        status: u16,
        content_type: Option<&str>,
        payload: Option<&Value>,
    ) -> AppResult<Option<Value>> {
        let descriptor = rules.lookup(status)?;
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);

        let Some(schema) = descriptor.schema_for(content_type) else {
            return match payload {
                None | Some(Value::Null) => Ok(payload.cloned()),
                Some(_) => {
                    let mut fields = FieldErrors::new();
                    fields.insert(
                        RESPONSE_ROOT.to_string(),
                        FieldError {
                            message: "content-type is not allowed".into(),
                            value: Some(content_type.into()),
                        },
                    );
                    tracing::error!(status, content_type, "undeclared response content type");
                    Err(ValidateError::server("content-type is not allowed", fields).into())
                }
            };
        };

        let value = payload.cloned().unwrap_or(Value::Null);
        self.for_typed_payload()
            .validate(RESPONSE_ROOT, &value, schema, ParentKind::Unknown)
            .map(Some)
            .map_err(|e| {
                tracing::error!(status, error = %e, "response does not match its schema");
                e.into_app_error(Severity::Server)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::document::SchemaDocument;
    use std::sync::Arc;

    fn validator() -> Validator {
        Validator::new(Arc::new(SchemaDocument::new()), ValidatorConfig::default())
    }

    #[test]
    fn test_lookup_order() {
        let rules = ResponseRules::new()
            .with("200", ResponseDescriptor::json(SchemaNode::string()))
            .with("2XX", ResponseDescriptor::json(SchemaNode::number()))
            .with("4xx", ResponseDescriptor::json(SchemaNode::boolean()))
            .with("default", ResponseDescriptor::empty());

        assert_eq!(
            rules.lookup(200).unwrap(),
            &ResponseDescriptor::json(SchemaNode::string())
        );
        assert_eq!(
            rules.lookup(201).unwrap(),
            &ResponseDescriptor::json(SchemaNode::number())
        );
        assert_eq!(
            rules.lookup(404).unwrap(),
            &ResponseDescriptor::json(SchemaNode::boolean())
        );
        assert_eq!(rules.lookup(503).unwrap(), &ResponseDescriptor::empty());
    }

    #[test]
    fn test_lookup_missing_status() {
        let rules = ResponseRules::new().with("200", ResponseDescriptor::empty());
        let err = rules.lookup(500).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema Error: Missing response schema for status code 500"
        );
    }

    #[test]
    fn test_invalid_response_is_server_error() {
        let rules = ResponseRules::new().with("200", ResponseDescriptor::json(SchemaNode::integer()));
        let err = validator()
            .validate_response(&rules, 200, None, Some(&Value::from("7")))
            .unwrap_err();
        let AppError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert_eq!(v.status(), 500);
        assert_eq!(v.severity, Severity::Server);
        assert_eq!(v.fields["response"].message, "invalid integer number");
    }

    #[test]
    fn test_bodyless_response_passes_through() {
        let rules = ResponseRules::new().with("204", ResponseDescriptor::empty());
        let out = validator().validate_response(&rules, 204, None, None).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn test_undeclared_content_with_payload() {
        let rules = ResponseRules::new().with("204", ResponseDescriptor::empty());
        let err = validator()
            .validate_response(&rules, 204, None, Some(&Value::from("surprise")))
            .unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_missing_payload_checked_as_null() {
        let rules = ResponseRules::new()
            .with("200", ResponseDescriptor::json(SchemaNode::string().nullable()));
        let out = validator().validate_response(&rules, 200, None, None).unwrap();
        assert_eq!(out, Some(Value::Null));

        let rules = ResponseRules::new().with("200", ResponseDescriptor::json(SchemaNode::string()));
        assert!(validator().validate_response(&rules, 200, None, None).is_err());
    }

    #[test]
    fn test_content_type_parameters_ignored() {
        let rules = ResponseRules::new().with("200", ResponseDescriptor::json(SchemaNode::string()));
        let out = validator()
            .validate_response(
                &rules,
                200,
                Some("application/json; charset=utf-8"),
                Some(&Value::from("ok")),
            )
            .unwrap();
        assert_eq!(out, Some(Value::from("ok")));
    }
}
