//! # Composite Validators
//!
//! Arrays, objects, `allOf` and `oneOf`. Each either fully succeeds with a
//! coerced value or returns exactly one representative failure.

use crate::error::{FieldFailure, ValidationError};
use crate::schema::{ArraySchema, ObjectSchema, SchemaNode};
use crate::validation::additional::{additional_property_action, AdditionalAction};
use crate::validation::{child_path, ParentKind, Validation, Validator};
use crate::value::{Object, Value};

impl Validator {
    /// Validates every element; the first failure in index order wins.
    pub(super) fn validate_array(
        &self,
        name: &str,
        value: &Value,
        schema: &ArraySchema,
    ) -> Validation {
        let Value::Array(items) = value else {
            return Err(FieldFailure::new(name, "invalid array")
                .with_value(value.clone())
                .into());
        };

        if let Some(min) = schema.min_items {
            if items.len() < min {
                return Err(FieldFailure::new(name, format!("must contain at least {} items", min))
                    .with_value(value.clone())
                    .into());
            }
        }
        if let Some(max) = schema.max_items {
            if items.len() > max {
                return Err(FieldFailure::new(name, format!("must contain at most {} items", max))
                    .with_value(value.clone())
                    .into());
            }
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.validate(&child_path(name, i), item, &schema.items, ParentKind::Array)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    /// Validates declared properties, then applies the undeclared-key policy.
    pub(super) fn validate_object(
        &self,
        name: &str,
        value: &Value,
        schema: &ObjectSchema,
        parent: ParentKind,
    ) -> Validation {
        let Value::Object(input) = value else {
            return Err(FieldFailure::new(name, "invalid object")
                .with_value(value.clone())
                .into());
        };

        // Read-only properties are server-assigned; inputs may not set them.
        let mut declared: Vec<(&String, &SchemaNode, &SchemaNode)> =
            Vec::with_capacity(schema.properties.len());
        for (prop, prop_schema) in &schema.properties {
            let resolved = self.document().resolve(prop_schema)?;
            if !prop_schema.read_only && !resolved.read_only {
                declared.push((prop, prop_schema, resolved));
            }
        }

        let mut output = declared.iter().try_fold(
            Object::with_capacity(input.len()),
            |mut acc, &(prop, prop_schema, resolved)| -> Result<Object, ValidationError> {
                let path = child_path(name, prop);
                if let Some(v) = input.get(prop.as_str()) {
                    let coerced = self.validate(&path, v, prop_schema, ParentKind::Object)?;
                    acc.insert(prop.clone(), coerced);
                } else if schema.required.contains(prop.as_str()) {
                    if !resolved.is_any() {
                        let message = format!("{} is required", prop);
                        return Err(FieldFailure::new(path, message).into());
                    }
                } else if let Some(default) =
                    prop_schema.default.as_ref().or(resolved.default.as_ref())
                {
                    acc.insert(prop.clone(), default.clone());
                }
                Ok(acc)
            },
        )?;

        let additional_keys: Vec<String> = input
            .keys()
            .filter(|k| !declared.iter().any(|(prop, _, _)| prop == k))
            .cloned()
            .collect();

        match additional_property_action(
            self.config(),
            &schema.additional_properties,
            parent,
            &additional_keys,
        ) {
            AdditionalAction::Reject => {
                return Err(FieldFailure::new(
                    name,
                    format!(
                        "\"{}\" is an excess property and therefore is not allowed",
                        additional_keys.join(", ")
                    ),
                )
                .with_value(value.clone())
                .into());
            }
            AdditionalAction::Warn => {
                tracing::warn!(
                    field = %name,
                    keys = ?additional_keys,
                    "unexpected additional properties stripped"
                );
            }
            AdditionalAction::Copy => {
                for key in &additional_keys {
                    output.insert(key.clone(), input[key.as_str()].clone());
                }
            }
            AdditionalAction::Validate(extra) => {
                for key in &additional_keys {
                    let coerced = self.validate(
                        &child_path(name, key),
                        &input[key.as_str()],
                        extra,
                        ParentKind::Object,
                    )?;
                    output.insert(key.clone(), coerced);
                }
            }
            AdditionalAction::Drop => {}
        }

        Ok(Value::Object(output))
    }

    /// Every branch must match; object results are shallow-merged in order.
    pub(super) fn validate_all_of(
        &self,
        name: &str,
        value: &Value,
        branches: &[SchemaNode],
    ) -> Validation {
        let results = branches
            .iter()
            .map(|branch| self.validate(name, value, branch, ParentKind::AllOf))
            .collect::<Result<Vec<Value>, _>>()?;

        let mut results = results.into_iter();
        let Some(first) = results.next() else {
            return Ok(value.clone());
        };

        Ok(results.fold(first, |merged, next| match (merged, next) {
            (Value::Object(mut acc), Value::Object(more)) => {
                acc.extend(more);
                Value::Object(acc)
            }
            // Non-object intersections keep the last branch's coercion.
            (_, other) => other,
        }))
    }

    /// All branches are tried; the object result with the most keys wins,
    /// ties (and scalar results) keep the earliest match.
    pub(super) fn validate_one_of(
        &self,
        name: &str,
        value: &Value,
        branches: &[SchemaNode],
    ) -> Validation {
        let mut best: Option<(usize, Value)> = None;

        for (index, branch) in branches.iter().enumerate() {
            let candidate = match self.validate(name, value, branch, ParentKind::OneOf) {
                Ok(v) => v,
                Err(ValidationError::Invalid(failure)) => {
                    tracing::debug!(
                        field = %name,
                        branch = index,
                        reason = %failure,
                        "oneOf branch rejected"
                    );
                    continue;
                }
                Err(schema_err) => return Err(schema_err),
            };

            let replace = match (&best, &candidate) {
                (None, _) => true,
                (Some((_, Value::Object(current))), Value::Object(next)) => {
                    next.len() > current.len()
                }
                _ => false,
            };
            if replace {
                best = Some((index, candidate));
            }
        }

        match best {
            Some((index, v)) => {
                tracing::debug!(field = %name, branch = index, "oneOf branch selected");
                Ok(v)
            }
            None => Err(FieldFailure::new(name, "no matching schema for provided value")
                .with_value(value.clone())
                .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ValidatorConfig;
    use crate::document::SchemaDocument;
    use crate::error::{FieldFailure, ValidationError};
    use crate::schema::{AdditionalProperties, SchemaNode};
    use crate::validation::{ParentKind, Validator};
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn validator_with(config: ValidatorConfig) -> Validator {
        Validator::new(Arc::new(SchemaDocument::new()), config)
    }

    fn validator() -> Validator {
        validator_with(ValidatorConfig::default())
    }

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn field_of(err: ValidationError) -> FieldFailure {
        match err {
            ValidationError::Invalid(f) => f,
            other => panic!("expected field failure, got {other:?}"),
        }
    }

    #[test]
    fn test_array_first_failure_wins() {
        let schema = SchemaNode::array(SchemaNode::string());
        let err = validator()
            .validate("name", &v(json!(["x", {}, 3])), &schema, ParentKind::Unknown)
            .unwrap_err();
        let failure = field_of(err);
        assert_eq!(failure.field, "name.1");
        assert_eq!(failure.message, "invalid string value");
    }

    #[test]
    fn test_array_coerces_elements() {
        let schema = SchemaNode::array(SchemaNode::number());
        let out = validator()
            .validate("ids", &v(json!(["1", "2"])), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!([1, 2])));
    }

    #[test]
    fn test_array_item_count_bounds() {
        let mut schema = SchemaNode::array(SchemaNode::number());
        if let crate::schema::SchemaKind::Array(arr) = &mut schema.kind {
            arr.min_items = Some(1);
            arr.max_items = Some(2);
        }
        assert!(validator().validate("ids", &v(json!([])), &schema, ParentKind::Unknown).is_err());
        assert!(validator().validate("ids", &v(json!([1, 2, 3])), &schema, ParentKind::Unknown).is_err());
        assert!(validator().validate("ids", &v(json!([1])), &schema, ParentKind::Unknown).is_ok());
    }

    #[test]
    fn test_object_requires_object() {
        let schema = SchemaNode::object([("a", SchemaNode::string())], []);
        let err = validator()
            .validate("body", &v(json!([1])), &schema, ParentKind::Unknown)
            .unwrap_err();
        assert_eq!(field_of(err).message, "invalid object");
    }

    #[test]
    fn test_object_missing_required() {
        let schema = SchemaNode::object([("street", SchemaNode::string())], ["street"]);
        let err = validator()
            .validate("body.address", &v(json!({})), &schema, ParentKind::Object)
            .unwrap_err();
        assert_eq!(
            field_of(err),
            FieldFailure::new("body.address.street", "street is required")
        );
    }

    #[test]
    fn test_required_any_may_be_absent() {
        let schema = SchemaNode::object([("meta", SchemaNode::any())], ["meta"]);
        let out = validator()
            .validate("body", &v(json!({})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({})));
    }

    #[test]
    fn test_optional_absent_uses_default() {
        let schema = SchemaNode::object(
            [
                ("page", SchemaNode::integer().with_default(1i64)),
                ("q", SchemaNode::string()),
            ],
            [],
        );
        let out = validator()
            .validate("filter", &v(json!({})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({"page": 1})));
    }

    #[test]
    fn test_read_only_properties_are_ignored_on_input() {
        let schema = SchemaNode::object(
            [
                ("id", SchemaNode::string().read_only()),
                ("name", SchemaNode::string()),
            ],
            ["id", "name"],
        );
        let out = validator()
            .validate("body", &v(json!({"id": "server", "name": "x"})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({"name": "x"})));
    }

    #[test]
    fn test_lenient_mode_strips_unknown_keys() {
        let schema = SchemaNode::object([("declaredProp", SchemaNode::string())], []);
        let out = validator()
            .validate(
                "body",
                &v(json!({"declaredProp": "x", "extra": "y"})),
                &schema,
                ParentKind::Unknown,
            )
            .unwrap();
        assert_eq!(out, v(json!({"declaredProp": "x"})));
    }

    #[test]
    fn test_throw_mode_lists_unknown_keys() {
        let schema = SchemaNode::object([("declaredProp", SchemaNode::string())], []);
        let err = validator_with(ValidatorConfig::new().throw_unexpected(true))
            .validate(
                "body",
                &v(json!({"declaredProp": "x", "extra": "y"})),
                &schema,
                ParentKind::Unknown,
            )
            .unwrap_err();
        let failure = field_of(err);
        assert_eq!(failure.field, "body");
        assert!(failure.message.contains("extra"));
    }

    #[test]
    fn test_log_mode_accepts_and_strips() {
        let schema = SchemaNode::object([("a", SchemaNode::string())], [])
            .with_additional_properties(AdditionalProperties::Allowed(false));
        let out = validator_with(ValidatorConfig::new().log_unexpected(true))
            .validate("body", &v(json!({"a": "x", "b": 1})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({"a": "x"})));
    }

    #[test]
    fn test_throw_mode_with_additional_true_copies() {
        let schema = SchemaNode::object([("a", SchemaNode::string())], [])
            .with_additional_properties(AdditionalProperties::Allowed(true));
        let out = validator_with(ValidatorConfig::new().throw_unexpected(true))
            .validate("body", &v(json!({"a": "x", "b": [1]})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({"a": "x", "b": [1]})));
    }

    #[test]
    fn test_additional_schema_validates_values() {
        let schema = SchemaNode::object([], [])
            .with_additional_properties(AdditionalProperties::Schema(Box::new(SchemaNode::number())));
        let out = validator()
            .validate("scores", &v(json!({"alice": "3"})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({"alice": 3})));

        let err = validator()
            .validate("scores", &v(json!({"bob": "x"})), &schema, ParentKind::Unknown)
            .unwrap_err();
        assert_eq!(field_of(err).field, "scores.bob");
    }

    #[test]
    fn test_all_of_merges_branches() {
        let schema = SchemaNode::all_of(vec![
            SchemaNode::object([("a", SchemaNode::number())], ["a"]),
            SchemaNode::object([("b", SchemaNode::string())], ["b"]),
        ]);
        let out = validator_with(ValidatorConfig::new().throw_unexpected(true))
            .validate("q", &v(json!({"a": "1", "b": "x"})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({"a": 1, "b": "x"})));
    }

    #[test]
    fn test_all_of_first_failing_branch_wins() {
        let schema = SchemaNode::all_of(vec![
            SchemaNode::object([("a", SchemaNode::number())], ["a"]),
            SchemaNode::object([("b", SchemaNode::number())], ["b"]),
        ]);
        let err = validator()
            .validate("q", &v(json!({"a": 1})), &schema, ParentKind::Unknown)
            .unwrap_err();
        assert_eq!(field_of(err).message, "b is required");
    }

    #[test]
    fn test_all_of_single_branch_is_unchanged() {
        let schema = SchemaNode::all_of(vec![SchemaNode::number()]);
        let out = validator()
            .validate("q", &Value::from("4"), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, Value::Number(4.0));
    }

    #[test]
    fn test_one_of_prefers_most_keys() {
        let schema = SchemaNode::one_of(vec![
            SchemaNode::object([("foo", SchemaNode::string())], []),
            SchemaNode::object(
                [("foo", SchemaNode::string()), ("bar", SchemaNode::string())],
                [],
            ),
        ]);
        let out = validator()
            .validate("body", &v(json!({"foo": "1", "bar": "2"})), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, v(json!({"foo": "1", "bar": "2"})));
    }

    #[test]
    fn test_one_of_scalar_first_match_wins() {
        let schema = SchemaNode::one_of(vec![SchemaNode::number(), SchemaNode::boolean()]);
        let out = validator()
            .validate("q", &Value::from("1"), &schema, ParentKind::Unknown)
            .unwrap();
        assert_eq!(out, Value::Number(1.0));
    }

    #[test]
    fn test_one_of_no_match() {
        let schema = SchemaNode::one_of(vec![SchemaNode::number(), SchemaNode::boolean()]);
        let err = validator()
            .validate("body.kind", &Value::from("cat"), &schema, ParentKind::Object)
            .unwrap_err();
        let failure = field_of(err);
        assert_eq!(failure.field, "body.kind");
        assert_eq!(failure.message, "no matching schema for provided value");
    }

    #[test]
    fn test_one_of_propagates_schema_errors() {
        let schema = SchemaNode::one_of(vec![SchemaNode::reference("Gone"), SchemaNode::string()]);
        let err = validator()
            .validate("q", &Value::from("x"), &schema, ParentKind::Unknown)
            .unwrap_err();
        assert!(matches!(err, ValidationError::Schema(_)));
    }
}
