#![deny(missing_docs)]

//! # Schema Shim
//!
//! A local serde shim for OpenAPI Schema Objects, tolerant of OAS 3.0, 3.1
//! and Swagger 2.0 spellings, converted into the closed `SchemaNode` model.

use crate::error::{AppError, AppResult};
use crate::schema::normalization::normalize_schema;
use crate::schema::{
    AdditionalProperties, ArraySchema, NumberSchema, ObjectSchema, Pattern, SchemaKind,
    SchemaNode, StringSchema,
};
use crate::value::Value;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Raw Schema Object fields the engine cares about. Unknown keywords are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ShimSchema {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    schema_type: Option<ShimType>,
    format: Option<String>,
    pattern: Option<String>,
    #[serde(rename = "enum")]
    enum_values: Option<Vec<JsonValue>>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_items: Option<usize>,
    max_items: Option<usize>,
    items: Option<JsonValue>,
    properties: Option<IndexMap<String, JsonValue>>,
    required: Vec<String>,
    additional_properties: Option<JsonValue>,
    all_of: Option<Vec<JsonValue>>,
    one_of: Option<Vec<JsonValue>>,
    any_of: Option<Vec<JsonValue>>,
    nullable: bool,
    read_only: bool,
    default: Option<JsonValue>,
}

/// `type` is a string, or a list in OAS 3.1 (`null` already stripped by normalization).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ShimType {
    Single(String),
    Multi(Vec<String>),
}

/// Parses one schema from raw JSON, normalizing it first.
pub fn schema_from_json(raw: &JsonValue) -> AppResult<SchemaNode> {
    let mut normalized = raw.clone();
    normalize_schema(&mut normalized);
    convert(&normalized)
}

fn convert(raw: &JsonValue) -> AppResult<SchemaNode> {
    let shim: ShimSchema = serde_json::from_value(raw.clone())
        .map_err(|e| AppError::Schema(format!("Malformed schema {}: {}", raw, e)))?;

    let kind = convert_kind(&shim, raw)?;
    Ok(SchemaNode {
        kind,
        nullable: shim.nullable,
        read_only: shim.read_only,
        default: shim.default.map(Value::from),
    })
}

fn convert_kind(shim: &ShimSchema, raw: &JsonValue) -> AppResult<SchemaKind> {
    if let Some(target) = &shim.reference {
        return Ok(SchemaKind::Ref(target.clone()));
    }
    if let Some(branches) = &shim.all_of {
        return Ok(SchemaKind::AllOf(convert_list(branches)?));
    }
    // anyOf is validated with oneOf's best-match rule.
    if let Some(branches) = shim.one_of.as_ref().or(shim.any_of.as_ref()) {
        return Ok(SchemaKind::OneOf(convert_list(branches)?));
    }

    let type_name = match &shim.schema_type {
        Some(ShimType::Single(t)) => Some(t.as_str()),
        Some(ShimType::Multi(types)) if types.len() == 1 => Some(types[0].as_str()),
        Some(ShimType::Multi(types)) if types.is_empty() => None,
        Some(ShimType::Multi(_)) => return Ok(SchemaKind::Unknown(raw.clone())),
        None if shim.properties.is_some() || shim.additional_properties.is_some() => {
            Some("object")
        }
        None if shim.items.is_some() => Some("array"),
        None => None,
    };

    match type_name {
        Some("string") => Ok(SchemaKind::String(StringSchema {
            format: shim.format.clone(),
            pattern: shim.pattern.as_deref().map(Pattern::new).transpose()?,
            enum_values: shim.enum_values.as_ref().map(|vals| {
                vals.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            }),
            min_length: shim.min_length,
            max_length: shim.max_length,
        })),
        Some(t @ ("number" | "integer")) => Ok(SchemaKind::Number(NumberSchema {
            integer: t == "integer",
            enum_values: shim
                .enum_values
                .as_ref()
                .map(|vals| vals.iter().filter_map(JsonValue::as_f64).collect()),
            minimum: shim.minimum,
            maximum: shim.maximum,
        })),
        Some("boolean") => Ok(SchemaKind::Boolean),
        Some("array") => {
            let items = match &shim.items {
                Some(items) => convert(items)?,
                None => SchemaNode::any(),
            };
            Ok(SchemaKind::Array(ArraySchema {
                items: Box::new(items),
                min_items: shim.min_items,
                max_items: shim.max_items,
            }))
        }
        Some("object") => convert_object(shim),
        Some(_) => Ok(SchemaKind::Unknown(raw.clone())),
        None if is_empty_schema(raw) => Ok(SchemaKind::Any),
        None => Ok(SchemaKind::Unknown(raw.clone())),
    }
}

fn convert_object(shim: &ShimSchema) -> AppResult<SchemaKind> {
    let mut properties = IndexMap::new();
    if let Some(props) = &shim.properties {
        for (name, raw) in props {
            properties.insert(name.clone(), convert(raw)?);
        }
    }

    let additional_properties = match &shim.additional_properties {
        None => AdditionalProperties::Unset,
        Some(JsonValue::Bool(flag)) => AdditionalProperties::Allowed(*flag),
        Some(raw) => AdditionalProperties::Schema(Box::new(convert(raw)?)),
    };

    Ok(SchemaKind::Object(ObjectSchema {
        properties,
        required: shim.required.iter().cloned().collect(),
        additional_properties,
    }))
}

fn convert_list(branches: &[JsonValue]) -> AppResult<Vec<SchemaNode>> {
    branches.iter().map(convert).collect()
}

/// `{}` (optionally with only annotations / flags) accepts anything.
fn is_empty_schema(raw: &JsonValue) -> bool {
    const ANNOTATIONS: [&str; 8] = [
        "description",
        "title",
        "nullable",
        "readOnly",
        "writeOnly",
        "default",
        "example",
        "deprecated",
    ];
    match raw {
        JsonValue::Object(map) => map
            .keys()
            .all(|k| ANNOTATIONS.contains(&k.as_str()) || k.starts_with("x-")),
        _ => false,
    }
}
