#![deny(missing_docs)]

//! # Parameter Binding
//!
//! Turns the declared parameters of a route and a raw request into the
//! positional argument list handed to the handler.
//!
//! Binding is fail-fast: the first invalid parameter aborts it.

use crate::binding::body::RequestBodyDescriptor;
use crate::binding::request::{Argument, RawRequest};
use crate::binding::responses::ResponseRules;
use crate::error::{AppError, AppResult, FieldError, FieldErrors, Severity, ValidateError};
use crate::schema::{SchemaKind, SchemaNode};
use crate::validation::{ParentKind, Validator};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a parameter's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// URL query string (e.g. `/users?page=1`).
    Query,
    /// Request header.
    Header,
    /// URL path segment (e.g. `/users/{id}`).
    Path,
    /// The raw request object, passed through unvalidated.
    Request,
    /// The request body, validated through the route's body descriptor.
    Body,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Path => "path",
            ParamLocation::Request => "request",
            ParamLocation::Body => "body",
        };
        write!(f, "{}", s)
    }
}

/// A declared handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name; also the root of every failure path.
    pub name: String,
    /// Source of the raw value.
    pub location: ParamLocation,
    /// Schema of the value. Ignored for `request` and `body` locations.
    pub schema: SchemaNode,
    /// Whether absence is an error.
    pub required: bool,
}

impl ParameterDescriptor {
    /// Creates an optional parameter.
    pub fn new(name: impl Into<String>, location: ParamLocation, schema: SchemaNode) -> Self {
        Self {
            name: name.into(),
            location,
            schema,
            required: false,
        }
    }

    /// Query parameter.
    pub fn query(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self::new(name, ParamLocation::Query, schema)
    }

    /// Header parameter.
    pub fn header(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self::new(name, ParamLocation::Header, schema)
    }

    /// Path parameter (always required).
    pub fn path(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self::new(name, ParamLocation::Path, schema).required()
    }

    /// Raw request pass-through.
    pub fn request(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Request, SchemaNode::any())
    }

    /// Body parameter; the schema comes from the route's body descriptor.
    pub fn body(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Body, SchemaNode::any())
    }

    /// Marks the parameter required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Everything the binder and the response validator need for one route.
#[derive(Debug, Clone, Default)]
pub struct RouteDescriptor {
    /// Handler parameters in positional order.
    pub parameters: Vec<ParameterDescriptor>,
    /// Body descriptor used by the `body` parameter.
    pub request_body: Option<RequestBodyDescriptor>,
    /// Response schemas by status.
    pub responses: ResponseRules,
}

impl RouteDescriptor {
    /// Creates a route with the given parameters.
    pub fn new(parameters: Vec<ParameterDescriptor>) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    /// Sets the request body descriptor.
    pub fn with_request_body(mut self, body: RequestBodyDescriptor) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Sets the response rules.
    pub fn with_responses(mut self, responses: ResponseRules) -> Self {
        self.responses = responses;
        self
    }
}

/// The error raised for a required parameter that was not supplied.
pub(crate) fn missing_parameter(name: &str) -> AppError {
    let mut fields = FieldErrors::new();
    fields.insert(
        name.to_string(),
        FieldError {
            message: "Param is required".into(),
            value: None,
        },
    );
    ValidateError::client("Missing parameter", fields).into()
}

impl Validator {
    /// Binds every declared parameter of `route` from `request`.
    ///
    /// Returns one argument per parameter, in declaration order. The only
    /// suspension point is the body discriminator, when one is configured.
    pub async fn bind<'r>(
        &self,
        route: &RouteDescriptor,
        request: &'r RawRequest,
    ) -> AppResult<Vec<Argument<'r>>> {
        let mut args = Vec::with_capacity(route.parameters.len());
        for param in &route.parameters {
            let arg = match param.location {
                ParamLocation::Request => Argument::Request(request),
                ParamLocation::Body => {
                    self.bind_body(param, route.request_body.as_ref(), request)
                        .await?
                }
                ParamLocation::Query | ParamLocation::Header | ParamLocation::Path => {
                    self.bind_scalar_location(param, request)?
                }
            };
            args.push(arg);
        }
        Ok(args)
    }

    fn bind_scalar_location<'r>(
        &self,
        param: &ParameterDescriptor,
        request: &RawRequest,
    ) -> AppResult<Argument<'r>> {
        let raw = match param.location {
            ParamLocation::Query => request.query(&param.name),
            ParamLocation::Header => request.header(&param.name),
            _ => request.path_param(&param.name),
        };

        let resolved = self.document().resolve(&param.schema)?;
        let raw = match (param.location, raw, &resolved.kind) {
            // `?verbose` means `verbose=true`.
            (ParamLocation::Query, Some(Value::String(s)), SchemaKind::Boolean) if s.is_empty() => {
                Some(Value::Bool(true))
            }
            (ParamLocation::Query, Some(Value::String(s)), SchemaKind::Array(_)) => {
                Some(Value::Array(vec![Value::String(s)]))
            }
            (_, raw, _) => raw,
        };

        let Some(raw) = raw else {
            return if param.required {
                Err(missing_parameter(&param.name))
            } else {
                Ok(Argument::Undefined)
            };
        };

        self.validate(&param.name, &raw, &param.schema, ParentKind::Unknown)
            .map(Argument::Value)
            .map_err(|e| e.into_app_error(Severity::Client))
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

    fn bind_one(param: ParameterDescriptor, request: &RawRequest) -> AppResult<Argument<'_>> {
        validator().bind_scalar_location(&param, request)
    }

    #[test]
    fn test_query_number_is_coerced() {
        let req = RawRequest::from_query_string("limit=5");
        let arg = bind_one(ParameterDescriptor::query("limit", SchemaNode::number()), &req).unwrap();
        assert_eq!(arg, Argument::Value(Value::Number(5.0)));
    }

    #[test]
    fn test_query_named_like_a_payload_root_is_coerced() {
        let req = RawRequest::from_query_string("response=5&body=6");
        let arg =
            bind_one(ParameterDescriptor::query("response", SchemaNode::number()), &req).unwrap();
        assert_eq!(arg, Argument::Value(Value::Number(5.0)));
    }

    #[test]
    fn test_empty_boolean_flag_is_true() {
        let req = RawRequest::from_query_string("verbose=");
        let arg =
            bind_one(ParameterDescriptor::query("verbose", SchemaNode::boolean()), &req).unwrap();
        assert_eq!(arg, Argument::Value(Value::Bool(true)));
    }

    #[test]
    fn test_empty_string_param_stays_empty() {
        let req = RawRequest::from_query_string("q=");
        let arg = bind_one(ParameterDescriptor::query("q", SchemaNode::string()), &req).unwrap();
        assert_eq!(arg, Argument::Value(Value::from("")));
    }

    #[test]
    fn test_single_value_wrapped_for_array_schema() {
        let req = RawRequest::from_query_string("ids=7");
        let schema = SchemaNode::array(SchemaNode::integer());
        let arg = bind_one(ParameterDescriptor::query("ids", schema), &req).unwrap();
        assert_eq!(
            arg,
            Argument::Value(Value::Array(vec![Value::Number(7.0)]))
        );
    }

    #[test]
    fn test_missing_required() {
        let req = RawRequest::new();
        let err = bind_one(
            ParameterDescriptor::header("x-api-version", SchemaNode::string()).required(),
            &req,
        )
        .unwrap_err();
        let AppError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert_eq!(v.message, "Missing parameter");
        assert_eq!(v.fields["x-api-version"].message, "Param is required");
        assert_eq!(v.status(), 400);
    }

    #[test]
    fn test_missing_optional_is_undefined() {
        let req = RawRequest::new();
        let arg = bind_one(ParameterDescriptor::query("page", SchemaNode::integer()), &req).unwrap();
        assert_eq!(arg, Argument::Undefined);
    }

    #[test]
    fn test_path_param_failure_is_field_addressed() {
        let req = RawRequest::new().with_path_param("id", "abc");
        let err = bind_one(ParameterDescriptor::path("id", SchemaNode::integer()), &req).unwrap_err();
        let AppError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert_eq!(v.fields["id"].message, "invalid integer number");
        assert_eq!(v.fields["id"].value, Some(Value::from("abc")));
    }

    #[test]
    fn test_location_serde_names() {
        let loc: ParamLocation = serde_json::from_str("\"header\"").unwrap();
        assert_eq!(loc, ParamLocation::Header);
        assert_eq!(loc.to_string(), "header");
    }
}
