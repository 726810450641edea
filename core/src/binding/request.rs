#![deny(missing_docs)]

//! # Raw Request
//!
//! The values the HTTP layer extracted from a request, before validation,
//! and the positional arguments produced from them.

use crate::value::Value;
use indexmap::IndexMap;
use url::form_urlencoded;

/// Raw request data handed to the binder by the transport layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    query: IndexMap<String, Vec<String>>,
    headers: IndexMap<String, String>,
    path: IndexMap<String, String>,
    body: Option<Value>,
    content_type: Option<String>,
}

impl RawRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string (without `?`).
    /// Repeated keys accumulate.
    pub fn from_query_string(query: &str) -> Self {
        let mut request = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            request = request.with_query(key, value);
        }
        request
    }

    /// Appends a query value.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Sets a header. Names are case-insensitive.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets a path parameter.
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Sets the decoded body.
    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Query value: a string when given once, an array of strings when repeated.
    pub fn query(&self, name: &str) -> Option<Value> {
        match self.query.get(name)?.as_slice() {
            [] => None,
            [single] => Some(Value::String(single.clone())),
            many => Some(Value::Array(
                many.iter().cloned().map(Value::String).collect(),
            )),
        }
    }

    /// Header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<Value> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .cloned()
            .map(Value::String)
    }

    /// Path parameter value.
    pub fn path_param(&self, name: &str) -> Option<Value> {
        self.path.get(name).cloned().map(Value::String)
    }

    /// Decoded body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Declared content type, falling back to the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.headers.get("content-type").map(String::as_str))
    }
}

/// One positional handler argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument<'r> {
    /// The raw request itself (`request` parameters).
    Request(&'r RawRequest),
    /// A validated, coerced value.
    Value(Value),
    /// An optional parameter that was not supplied.
    Undefined,
}

impl Argument<'_> {
    /// The coerced value, if this argument holds one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(v) => Some(v),
            _ => None,
        }
    }
}
