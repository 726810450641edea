//! # Scalar Validators
//!
//! String, number and boolean checks. Each returns the coerced value or a
//! single `FieldFailure` addressed at `name`.

use crate::error::FieldFailure;
use crate::schema::{NumberSchema, StringSchema};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats accepted as-is without a diagnostic.
const PLAIN_FORMATS: [&str; 3] = ["binary", "byte", "password"];

/// Root name of request body values.
const BODY_ROOT: &str = "body";

pub(super) fn validate_string(
    name: &str,
    value: &Value,
    schema: &StringSchema,
) -> Result<Value, FieldFailure> {
    let format = schema.format.as_deref();

    // Already decoded by the transport layer.
    match (value, format) {
        (Value::Date(_), Some("date" | "date-time")) => return Ok(value.clone()),
        (Value::Binary(_), Some("binary" | "byte")) => return Ok(value.clone()),
        _ => {}
    }

    let Value::String(s) = value else {
        return Err(FieldFailure::new(name, "invalid string value").with_value(value.clone()));
    };

    let len = s.chars().count();
    if let Some(min) = schema.min_length {
        if len < min {
            return Err(FieldFailure::new(
                name,
                format!("must be at least {} characters long", min),
            )
            .with_value(value.clone()));
        }
    }
    if let Some(max) = schema.max_length {
        if len > max {
            return Err(FieldFailure::new(
                name,
                format!("must be at most {} characters long", max),
            )
            .with_value(value.clone()));
        }
    }

    if let Some(allowed) = &schema.enum_values {
        if !allowed.iter().any(|a| a == s) {
            return Err(FieldFailure::new(
                name,
                format!("should be one of the following; [{}]", allowed.join(", ")),
            )
            .with_value(value.clone()));
        }
    }

    if let Some(pattern) = &schema.pattern {
        if !pattern.is_match(s) {
            return Err(FieldFailure::new(
                name,
                format!("must match the pattern {}", pattern.as_str()),
            )
            .with_value(value.clone()));
        }
    }

    match format {
        Some("date" | "date-time") => parse_date(s)
            .map(Value::Date)
            .ok_or_else(|| FieldFailure::new(name, "must be a valid date").with_value(value.clone())),
        Some(f) if PLAIN_FORMATS.contains(&f) => Ok(value.clone()),
        Some(f) => {
            tracing::warn!(field = %name, format = %f, "unknown string format; value accepted as-is");
            Ok(value.clone())
        }
        None => Ok(value.clone()),
    }
}

/// Parses RFC 3339 date-times, naive date-times (as UTC) and plain dates (midnight UTC).
pub(crate) fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// True for `body` and every path beneath it.
fn is_body_path(name: &str) -> bool {
    name == BODY_ROOT
        || name
            .strip_prefix(BODY_ROOT)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Validates a number. Strings are parsed unless the value sits in a body
/// path or `typed_payload` is set (decoded JSON, where numbers are native).
pub(super) fn validate_number(
    name: &str,
    value: &Value,
    schema: &NumberSchema,
    typed_payload: bool,
) -> Result<Value, FieldFailure> {
    let invalid = || {
        let msg = if schema.integer {
            "invalid integer number"
        } else {
            "invalid number value"
        };
        FieldFailure::new(name, msg).with_value(value.clone())
    };

    let n = match value {
        Value::Number(n) => *n,
        Value::String(s) if !typed_payload && !is_body_path(name) => {
            s.trim().parse::<f64>().map_err(|_| invalid())?
        }
        _ => return Err(invalid()),
    };

    if !n.is_finite() || (schema.integer && n.fract() != 0.0) {
        return Err(invalid());
    }

    if let Some(min) = schema.minimum {
        if n < min {
            return Err(FieldFailure::new(name, format!("This property must be >= {}", min))
                .with_value(value.clone()));
        }
    }
    if let Some(max) = schema.maximum {
        if n > max {
            return Err(FieldFailure::new(name, format!("This property must be <= {}", max))
                .with_value(value.clone()));
        }
    }

    if let Some(allowed) = &schema.enum_values {
        if !allowed.contains(&n) {
            let listed: Vec<String> = allowed.iter().map(f64::to_string).collect();
            return Err(FieldFailure::new(
                name,
                format!("should be one of the following; [{}]", listed.join(", ")),
            )
            .with_value(value.clone()));
        }
    }

    tracing::debug!(field = %name, value = n, "number accepted");
    Ok(Value::Number(n))
}

pub(super) fn validate_boolean(name: &str, value: &Value) -> Result<Value, FieldFailure> {
    let coerced = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) if *n == 1.0 => Some(true),
        Value::Number(n) if *n == 0.0 => Some(false),
        _ => None,
    };

    coerced
        .map(Value::Bool)
        .ok_or_else(|| FieldFailure::new(name, "must be a boolean").with_value(value.clone()))
}
