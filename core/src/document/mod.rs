#![deny(missing_docs)]

//! # Schema Document
//!
//! The named collection of schemas references resolve against.
//!
//! A document is built once (programmatically, or from an OpenAPI / Swagger
//! document) and then shared read-only by every validation.

pub(crate) mod ref_utils;

use crate::error::{AppError, AppResult};
use crate::schema::shim::schema_from_json;
use crate::schema::{SchemaKind, SchemaNode};
use indexmap::IndexMap;
use ref_utils::schema_name_from_ref;
use serde_json::Value as JsonValue;

/// Named schemas plus the document's `$self` URI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    schemas: IndexMap<String, SchemaNode>,
    self_uri: Option<String>,
}

impl SchemaDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a named schema.
    pub fn with_schema(mut self, name: impl Into<String>, schema: SchemaNode) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    /// Sets the `$self` URI used to recognise absolute references to this document.
    pub fn with_self_uri(mut self, uri: impl Into<String>) -> Self {
        self.self_uri = Some(uri.into());
        self
    }

    /// Returns a schema by name.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    /// Iterates over the named schemas in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.schemas.iter()
    }

    /// Number of named schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True when no schema is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Loads `components.schemas` (OAS 3.x) or `definitions` (Swagger 2.0) from YAML.
    pub fn from_openapi_yaml(yaml: &str) -> AppResult<Self> {
        let raw: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_openapi_json(&raw)
    }

    /// Loads `components.schemas` (OAS 3.x) or `definitions` (Swagger 2.0) from JSON.
    ///
    /// Every reference is checked after loading, so a broken document fails here
    /// instead of on the first request that reaches the broken branch.
    pub fn from_openapi_json(raw: &JsonValue) -> AppResult<Self> {
        if !raw.is_object() {
            return Err(AppError::Schema(
                "OpenAPI document must be an object".into(),
            ));
        }

        let section = raw
            .pointer("/components/schemas")
            .or_else(|| raw.get("definitions"));

        let mut doc = SchemaDocument {
            schemas: IndexMap::new(),
            self_uri: raw
                .get("$self")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        };

        if let Some(section) = section {
            let map = section.as_object().ok_or_else(|| {
                AppError::Schema("Schema section must be a mapping of name to schema".into())
            })?;
            for (name, schema) in map {
                let node = schema_from_json(schema).map_err(|e| {
                    AppError::Schema(format!("Schema '{}' could not be loaded: {}", name, e))
                })?;
                doc.schemas.insert(name.clone(), node);
            }
        }

        doc.check_references()?;
        Ok(doc)
    }

    /// Resolves a reference node to its concrete target, following chains.
    ///
    /// Non-reference nodes resolve to themselves. A missing target or a cycle
    /// made only of references is a schema error.
    pub fn resolve<'a>(&'a self, node: &'a SchemaNode) -> AppResult<&'a SchemaNode> {
        let mut current = node;
        let mut hops = 0usize;
        while let SchemaKind::Ref(target) = &current.kind {
            if hops > self.schemas.len() {
                return Err(AppError::Schema(format!(
                    "Reference cycle detected at '{}'",
                    target
                )));
            }
            current = self.lookup(target)?;
            hops += 1;
        }
        Ok(current)
    }

    fn lookup(&self, target: &str) -> AppResult<&SchemaNode> {
        schema_name_from_ref(target, self.self_uri.as_deref())
            .and_then(|name| self.schemas.get(&name))
            .ok_or_else(|| AppError::Schema(format!("Could not resolve reference '{}'", target)))
    }

    /// Walks every schema and resolves every reference it contains.
    pub fn check_references(&self) -> AppResult<()> {
        let mut stack: Vec<&SchemaNode> = self.schemas.values().collect();
        while let Some(node) = stack.pop() {
            if matches!(node.kind, SchemaKind::Ref(_)) {
                self.resolve(node)?;
            }
            stack.extend(node.children());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pets() -> SchemaDocument {
        SchemaDocument::new()
            .with_schema("Pet", SchemaNode::object([("name", SchemaNode::string())], ["name"]))
            .with_schema("Alias", SchemaNode::reference("#/components/schemas/Pet"))
    }

    #[test]
    fn test_resolve_non_ref_is_identity() {
        let doc = pets();
        let node = SchemaNode::string();
        assert_eq!(doc.resolve(&node).unwrap(), &node);
    }

    #[test]
    fn test_resolve_follows_chain() {
        let doc = pets();
        let node = SchemaNode::reference("Alias");
        assert_eq!(doc.resolve(&node).unwrap(), doc.get("Pet").unwrap());
    }

    #[test]
    fn test_resolve_missing_is_schema_error() {
        let doc = pets();
        let err = doc
            .resolve(&SchemaNode::reference("#/components/schemas/Nope"))
            .unwrap_err();
        assert!(matches!(err, AppError::Schema(msg) if msg.contains("Nope")));
    }

    #[test]
    fn test_pure_reference_cycle_is_detected() {
        let doc = SchemaDocument::new()
            .with_schema("A", SchemaNode::reference("B"))
            .with_schema("B", SchemaNode::reference("A"));
        let err = doc.resolve(&SchemaNode::reference("A")).unwrap_err();
        assert!(matches!(err, AppError::Schema(msg) if msg.contains("cycle")));
    }

    #[test]
    fn test_structural_recursion_is_allowed() {
        // A tree node referencing itself through a property is fine.
        let doc = SchemaDocument::new().with_schema(
            "Node",
            SchemaNode::object(
                [("children", SchemaNode::array(SchemaNode::reference("Node")))],
                [],
            ),
        );
        assert!(doc.check_references().is_ok());
    }

    #[test]
    fn test_check_references_finds_nested_allof_ref() {
        let doc = SchemaDocument::new().with_schema(
            "Dog",
            SchemaNode::all_of(vec![SchemaNode::reference("Animal")]),
        );
        assert!(doc.check_references().is_err());
    }

    #[test]
    fn test_from_openapi_yaml() {
        let yaml = r#"
openapi: 3.1.0
$self: https://example.com/openapi.yaml
info: { title: Pets, version: 1.0.0 }
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: { type: string }
        tag: { type: [string, "null"] }
    Pets:
      type: array
      items:
        $ref: "https://example.com/openapi.yaml#/components/schemas/Pet"
"#;
        let doc = SchemaDocument::from_openapi_yaml(yaml).unwrap();
        assert_eq!(doc.len(), 2);
        let SchemaKind::Array(arr) = &doc.get("Pets").unwrap().kind else {
            panic!("expected array");
        };
        assert_eq!(doc.resolve(&arr.items).unwrap(), doc.get("Pet").unwrap());
    }

    #[test]
    fn test_from_swagger_definitions() {
        let raw = serde_json::json!({
            "swagger": "2.0",
            "definitions": {
                "Owner": { "type": "object", "properties": { "pet": { "$ref": "#/definitions/Pet" } } },
                "Pet": { "type": "string", "x-nullable": true }
            }
        });
        let doc = SchemaDocument::from_openapi_json(&raw).unwrap();
        assert!(doc.get("Pet").unwrap().nullable);
    }

    #[test]
    fn test_from_openapi_rejects_dangling_ref() {
        let raw = serde_json::json!({
            "components": { "schemas": { "A": { "$ref": "#/components/schemas/B" } } }
        });
        assert!(SchemaDocument::from_openapi_json(&raw).is_err());
    }
}
