#![deny(missing_docs)]

//! # Additional-Property Policy
//!
//! Decides what happens to object keys a schema does not declare. The object
//! validator only executes the returned action.

use crate::config::ValidatorConfig;
use crate::schema::{AdditionalProperties, SchemaNode};
use crate::validation::ParentKind;

/// What to do with the undeclared keys of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdditionalAction<'s> {
    /// Fail the object, listing the keys.
    Reject,
    /// Log the keys, then strip them.
    Warn,
    /// Copy the keys into the result unchanged.
    Copy,
    /// Validate each key's value against the schema and keep it.
    Validate(&'s SchemaNode),
    /// Strip the keys silently.
    Drop,
}

/// Chooses the action for `additional_keys`.
///
/// Branches are evaluated in this order and the first match wins:
/// 1. outside `allOf`, a strict switch on, `additionalProperties: false`
///    → reject (throw) or warn (log only);
/// 2. throw switch on, `additionalProperties: true` → copy;
/// 3. `additionalProperties` is a schema → validate;
/// 4. outside `allOf` with a strict switch on → reject or warn as in 1,
///    otherwise drop.
pub fn additional_property_action<'s>(
    config: &ValidatorConfig,
    policy: &'s AdditionalProperties,
    parent: ParentKind,
    additional_keys: &[String],
) -> AdditionalAction<'s> {
    if additional_keys.is_empty() {
        return AdditionalAction::Drop;
    }

    let checks_apply = parent != ParentKind::AllOf && config.is_strict();
    let reject_or_warn = if config.throw_unexpected_additional_data {
        AdditionalAction::Reject
    } else {
        AdditionalAction::Warn
    };

    match policy {
        AdditionalProperties::Allowed(false) if checks_apply => reject_or_warn,
        AdditionalProperties::Allowed(true) if config.throw_unexpected_additional_data => {
            AdditionalAction::Copy
        }
        AdditionalProperties::Schema(schema) => AdditionalAction::Validate(schema),
        _ if checks_apply => reject_or_warn,
        _ => AdditionalAction::Drop,
    }
}
