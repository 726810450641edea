#![deny(missing_docs)]

//! # Schema Model
//!
//! Closed representation of the schema graph the engine validates against.
//!
//! - **nodes**: `SchemaNode` and one struct per constrained shape.
//! - **normalization**: rewrites of raw OpenAPI JSON before loading.
//! - **shim**: serde shim turning OpenAPI schema JSON into `SchemaNode`s.

pub(crate) mod normalization;
pub mod shim;

use crate::error::{AppError, AppResult};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde_json::Value as JsonValue;
use std::fmt;

/// A schema node: a shape plus the flags every shape may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// The primary shape.
    pub kind: SchemaKind,
    /// Whether `null` is accepted.
    pub nullable: bool,
    /// Server-assigned; ignored when validating inputs.
    pub read_only: bool,
    /// Value used when the property is absent or the value is a nullable `null`.
    pub default: Option<Value>,
}

/// The shapes the engine can dispatch on.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// `type: string`.
    String(StringSchema),
    /// `type: number` / `type: integer`.
    Number(NumberSchema),
    /// `type: boolean`.
    Boolean,
    /// `type: array`.
    Array(ArraySchema),
    /// `type: object`.
    Object(ObjectSchema),
    /// Intersection; every branch must match.
    AllOf(Vec<SchemaNode>),
    /// Union; the best matching branch is kept.
    OneOf(Vec<SchemaNode>),
    /// Pointer to a named schema in the document.
    Ref(String),
    /// Accepts any value unchanged (the `AnyValue` sentinel, `{}`).
    Any,
    /// A shape this engine does not understand; kept for diagnostics.
    Unknown(JsonValue),
}

impl SchemaKind {
    /// Short label used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            SchemaKind::String(_) => "string",
            SchemaKind::Number(n) if n.integer => "integer",
            SchemaKind::Number(_) => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
            SchemaKind::AllOf(_) => "allOf",
            SchemaKind::OneOf(_) => "oneOf",
            SchemaKind::Ref(_) => "$ref",
            SchemaKind::Any => "any",
            SchemaKind::Unknown(_) => "unknown",
        }
    }
}

/// Constraints of a string schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringSchema {
    /// `format` keyword.
    pub format: Option<String>,
    /// `pattern` keyword, matched against the whole string.
    pub pattern: Option<Pattern>,
    /// Allowed values.
    pub enum_values: Option<Vec<String>>,
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
}

/// Constraints of a number schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberSchema {
    /// Requires a whole number (`type: integer`).
    pub integer: bool,
    /// Allowed values.
    pub enum_values: Option<Vec<f64>>,
    /// Inclusive lower bound.
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    pub maximum: Option<f64>,
}

/// Constraints of an array schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    /// Schema of every element.
    pub items: Box<SchemaNode>,
    /// Minimum element count.
    pub min_items: Option<usize>,
    /// Maximum element count.
    pub max_items: Option<usize>,
}

/// Constraints of an object schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Declared properties in declaration order.
    pub properties: IndexMap<String, SchemaNode>,
    /// Names of required properties.
    pub required: IndexSet<String>,
    /// Policy for undeclared keys.
    pub additional_properties: AdditionalProperties,
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    /// Keyword absent.
    #[default]
    Unset,
    /// `additionalProperties: true` / `false`.
    Allowed(bool),
    /// `additionalProperties: { ...schema }`.
    Schema(Box<SchemaNode>),
}

/// A compiled `pattern`, anchored so it must match the whole input.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source`. An invalid expression is a schema error.
    pub fn new(source: &str) -> AppResult<Self> {
        let regex = Regex::new(&format!("^(?:{})$", source))
            .map_err(|e| AppError::Schema(format!("Invalid pattern '{}': {}", source, e)))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Tests the whole string.
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl SchemaNode {
    /// Wraps a shape with default flags.
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: false,
            read_only: false,
            default: None,
        }
    }

    /// Unconstrained string.
    pub fn string() -> Self {
        Self::new(SchemaKind::String(StringSchema::default()))
    }

    /// String with a `format`.
    pub fn string_format(format: &str) -> Self {
        Self::new(SchemaKind::String(StringSchema {
            format: Some(format.to_string()),
            ..StringSchema::default()
        }))
    }

    /// Unconstrained number.
    pub fn number() -> Self {
        Self::new(SchemaKind::Number(NumberSchema::default()))
    }

    /// Unconstrained integer.
    pub fn integer() -> Self {
        Self::new(SchemaKind::Number(NumberSchema {
            integer: true,
            ..NumberSchema::default()
        }))
    }

    /// Boolean.
    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    /// Array of `items`.
    pub fn array(items: SchemaNode) -> Self {
        Self::new(SchemaKind::Array(ArraySchema {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }))
    }

    /// Object with the given properties and required names.
    pub fn object<P, R>(properties: P, required: R) -> Self
    where
        P: IntoIterator<Item = (&'static str, SchemaNode)>,
        R: IntoIterator<Item = &'static str>,
    {
        Self::new(SchemaKind::Object(ObjectSchema {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            required: required.into_iter().map(str::to_string).collect(),
            additional_properties: AdditionalProperties::Unset,
        }))
    }

    /// `allOf` over `branches`.
    pub fn all_of(branches: Vec<SchemaNode>) -> Self {
        Self::new(SchemaKind::AllOf(branches))
    }

    /// `oneOf` over `branches`.
    pub fn one_of(branches: Vec<SchemaNode>) -> Self {
        Self::new(SchemaKind::OneOf(branches))
    }

    /// Reference to a named schema.
    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(SchemaKind::Ref(target.into()))
    }

    /// The `AnyValue` sentinel.
    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    /// Marks the node nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the node read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets `additionalProperties` on an object node; other shapes are returned unchanged.
    pub fn with_additional_properties(mut self, policy: AdditionalProperties) -> Self {
        if let SchemaKind::Object(obj) = &mut self.kind {
            obj.additional_properties = policy;
        }
        self
    }

    /// True for the `AnyValue` sentinel.
    pub fn is_any(&self) -> bool {
        matches!(self.kind, SchemaKind::Any)
    }

    /// Visits every directly nested node.
    pub fn children(&self) -> Vec<&SchemaNode> {
        match &self.kind {
            SchemaKind::Array(arr) => vec![arr.items.as_ref()],
            SchemaKind::Object(obj) => {
                let mut out: Vec<&SchemaNode> = obj.properties.values().collect();
                if let AdditionalProperties::Schema(extra) = &obj.additional_properties {
                    out.push(extra.as_ref());
                }
                out
            }
            SchemaKind::AllOf(branches) | SchemaKind::OneOf(branches) => branches.iter().collect(),
            _ => Vec::new(),
        }
    }
}
