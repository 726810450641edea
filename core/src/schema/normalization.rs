#![deny(missing_docs)]

//! # Schema Normalization
//!
//! Rewrites raw OpenAPI / JSON Schema JSON into the single dialect the shim
//! understands. These functions only touch keywords with known compatibility
//! gaps between OAS 3.0, OAS 3.1 and Swagger 2.0 documents.

use serde_json::{json, Map, Value};

/// Keys whose values are data, not schemas.
const DATA_KEYS: [&str; 5] = ["default", "example", "examples", "enum", "const"];

/// Applies every normalization to a schema tree, in place.
pub(crate) fn normalize_schema(value: &mut Value) {
    normalize_boolean_schemas(value);
    normalize_const_schemas(value);
    normalize_nullable_schemas(value);
}

/// Normalizes boolean schemas (`true` / `false`) in schema positions.
///
/// - `true` becomes `{}` (accepts any instance)
/// - `false` becomes `{"oneOf": []}` (a union with no branch never matches)
///
/// `additionalProperties: false` is a policy, not a schema, and is left alone.
pub(crate) fn normalize_boolean_schemas(value: &mut Value) {
    normalize_boolean_node(value);

    let Value::Object(map) = value else {
        return;
    };

    if let Some(props) = map.get_mut("properties").and_then(|p| p.as_object_mut()) {
        for prop in props.values_mut() {
            normalize_boolean_schemas(prop);
        }
    }
    if let Some(items) = map.get_mut("items") {
        normalize_boolean_schemas(items);
    }
    if let Some(extra) = map.get_mut("additionalProperties") {
        if extra.is_object() {
            normalize_boolean_schemas(extra);
        }
    }
    for key in ["allOf", "oneOf", "anyOf"] {
        if let Some(branches) = map.get_mut(key).and_then(|b| b.as_array_mut()) {
            for branch in branches.iter_mut() {
                normalize_boolean_schemas(branch);
            }
        }
    }
}

fn normalize_boolean_node(value: &mut Value) {
    if let Value::Bool(accepts) = value {
        *value = if *accepts {
            json!({})
        } else {
            json!({ "oneOf": [] })
        };
    }
}

/// Normalizes JSON Schema `const` usage into single-value `enum` entries.
pub(crate) fn normalize_const_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(const_val) = map.remove("const") {
                if !map.contains_key("enum") {
                    map.insert("enum".to_string(), Value::Array(vec![const_val.clone()]));
                }
                if !map.contains_key("type") {
                    if let Some(type_name) = infer_schema_type(&const_val) {
                        map.insert("type".to_string(), Value::String(type_name.to_string()));
                    }
                }
            }

            for (key, v) in map.iter_mut() {
                if DATA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                normalize_const_schemas(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                normalize_const_schemas(v);
            }
        }
        _ => {}
    }
}

fn infer_schema_type(value: &Value) -> Option<&'static str> {
    match value {
        Value::String(_) => Some("string"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(num) if num.is_i64() || num.is_u64() => Some("integer"),
        Value::Number(_) => Some("number"),
        Value::Array(_) => Some("array"),
        Value::Object(_) => Some("object"),
        Value::Null => None,
    }
}

/// Collapses every spelling of nullability into `nullable: true`.
///
/// - Swagger 2.0 `x-nullable: true`
/// - OAS 3.1 `type: [T, "null"]`
/// - OAS 3.1 `oneOf`/`anyOf` containing `{type: "null"}`
pub(crate) fn normalize_nullable_schemas(value: &mut Value) {
    if let Value::Object(map) = value {
        apply_nullable_flag(map);
    }

    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if DATA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                normalize_nullable_schemas(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                normalize_nullable_schemas(v);
            }
        }
        _ => {}
    }
}

fn apply_nullable_flag(map: &mut Map<String, Value>) {
    let mut nullable = false;

    if let Some(flag) = map.remove("x-nullable") {
        nullable |= flag.as_bool().unwrap_or(false);
    }

    if let Some(Value::Array(types)) = map.get("type") {
        let has_null = types.iter().any(|t| t.as_str() == Some("null"));
        let rest: Vec<Value> = types
            .iter()
            .filter(|t| t.as_str() != Some("null"))
            .cloned()
            .collect();
        if has_null {
            nullable = true;
        }
        match rest.len() {
            0 => {
                map.remove("type");
            }
            1 => {
                map.insert("type".to_string(), rest[0].clone());
            }
            _ => {
                map.insert("type".to_string(), Value::Array(rest));
            }
        }
    }

    for key in ["oneOf", "anyOf"] {
        if let Some(Value::Array(branches)) = map.get_mut(key) {
            let before = branches.len();
            branches.retain(|b| !is_null_type(b));
            if branches.len() != before {
                nullable = true;
                if branches.len() == 1 {
                    let only = branches.remove(0);
                    map.remove(key);
                    map.insert("allOf".to_string(), Value::Array(vec![only]));
                }
            }
        }
    }

    if nullable {
        map.insert("nullable".to_string(), Value::Bool(true));
    }
}

fn is_null_type(schema: &Value) -> bool {
    schema.get("type").and_then(|t| t.as_str()) == Some("null")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_property_schemas() {
        let mut v = json!({
            "type": "object",
            "properties": { "anything": true, "nothing": false },
            "additionalProperties": false
        });
        normalize_boolean_schemas(&mut v);
        assert_eq!(v["properties"]["anything"], json!({}));
        assert_eq!(v["properties"]["nothing"], json!({"oneOf": []}));
        assert_eq!(v["additionalProperties"], json!(false));
    }

    #[test]
    fn test_const_becomes_enum_with_type() {
        let mut v = json!({ "properties": { "kind": { "const": "dog" } } });
        normalize_const_schemas(&mut v);
        assert_eq!(
            v["properties"]["kind"],
            json!({ "enum": ["dog"], "type": "string" })
        );
    }

    #[test]
    fn test_const_inside_default_is_untouched() {
        let mut v = json!({ "type": "object", "default": { "const": 1 } });
        normalize_const_schemas(&mut v);
        assert_eq!(v["default"], json!({ "const": 1 }));
    }

    #[test]
    fn test_type_array_with_null() {
        let mut v = json!({ "type": ["string", "null"] });
        normalize_nullable_schemas(&mut v);
        assert_eq!(v, json!({ "type": "string", "nullable": true }));
    }

    #[test]
    fn test_x_nullable() {
        let mut v = json!({ "type": "integer", "x-nullable": true });
        normalize_nullable_schemas(&mut v);
        assert_eq!(v, json!({ "type": "integer", "nullable": true }));
    }

    #[test]
    fn test_one_of_with_null_branch_collapses() {
        let mut v = json!({
            "oneOf": [ { "$ref": "#/components/schemas/Pet" }, { "type": "null" } ]
        });
        normalize_nullable_schemas(&mut v);
        assert_eq!(
            v,
            json!({
                "allOf": [ { "$ref": "#/components/schemas/Pet" } ],
                "nullable": true
            })
        );
    }
}
