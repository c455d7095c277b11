//! Turns an untrusted model reply into a [`ValidationResult`].
//!
//! The reply may be wrapped in a code fence and surrounded by prose. The
//! object between the first `{` and the last `}` is parsed, checked for the
//! three top-level fields, decoded into the typed model and finally checked
//! for nested shape (see [`crate::shape`]).

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{ValidatorError, ValidatorResult};
use crate::model::{ValidationResult, LIST_FIELDS, SENTINEL};
use crate::shape::{check_shape, ListPolicy};

/// Characters of the raw reply kept at each end for diagnostics.
pub const EXCERPT_CHARS: usize = 500;

/// Top-level fields a reply must carry with a truthy value.
pub const REQUIRED_FIELDS: [&str; 3] = ["summary", "evaluation", "recommendations"];

/// Runs the full normalization pipeline on a raw reply.
pub fn normalize(raw: &str, policy: ListPolicy) -> ValidatorResult<ValidationResult> {
    let cleaned = strip_code_fence(raw.trim());

    let Some(object) = extract_object(cleaned) else {
        return Err(malformed("no JSON object boundaries found", raw));
    };
    debug!(raw_chars = raw.chars().count(), object_chars = object.chars().count(), "extracted JSON object");

    let value: Value =
        serde_json::from_str(object).map_err(|e| malformed(&e.to_string(), raw))?;

    check_required_fields(&value)?;
    let expanded = sentinel_lists(&value);

    let mut result: ValidationResult = serde_json::from_value(value)
        .map_err(|e| ValidatorError::SchemaViolation(e.to_string()))?;

    let mut outcome = check_shape(&mut result, policy);
    for path in expanded {
        outcome = outcome.warn(format!("{path}: \"{SENTINEL}\" expanded to a sentinel list"));
    }
    log_repairs(outcome.into_result()?);
    Ok(result)
}

/// Shape check for a result that was decoded elsewhere (a saved file).
pub fn conform(mut result: ValidationResult, policy: ListPolicy) -> ValidatorResult<ValidationResult> {
    log_repairs(check_shape(&mut result, policy).into_result()?);
    Ok(result)
}

/// List fields that hold the bare sentinel string instead of a list.
pub fn sentinel_lists(value: &Value) -> Vec<&'static str> {
    LIST_FIELDS
        .iter()
        .copied()
        .filter(|path| {
            let pointer = format!("/{}", path.replace('.', "/"));
            value
                .pointer(&pointer)
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim() == SENTINEL)
        })
        .collect()
}

fn log_repairs(warnings: Vec<String>) {
    if !warnings.is_empty() {
        warn!(
            warnings = warnings.len(),
            details = %warnings.join("; "),
            "model reply coerced to schema"
        );
    }
}

/// Drops one leading fence marker (with any language tag) and one trailing
/// fence marker. Markers elsewhere in the text are left alone.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text;
    if let Some(rest) = s.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
            .unwrap_or(rest.len());
        s = rest[tag_len..].trim_start();
    }
    let end = s.trim_end();
    match end.strip_suffix("```") {
        Some(rest) => rest.trim_end(),
        None => s,
    }
}

/// Slice from the first `{` to the last `}` inclusive.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Presence check of [`REQUIRED_FIELDS`]. `null`, `false`, `0` and `""` count
/// as missing; empty arrays and objects do not.
pub fn check_required_fields(value: &Value) -> ValidatorResult<()> {
    let Some(obj) = value.as_object() else {
        return Err(ValidatorError::SchemaViolation(
            "top-level value is not an object".to_string(),
        ));
    };
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !obj.get(*field).is_some_and(is_truthy))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidatorError::SchemaViolation(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn malformed(message: &str, raw: &str) -> ValidatorError {
    let head = head_chars(raw, EXCERPT_CHARS);
    let tail = tail_chars(raw, EXCERPT_CHARS);
    error!(
        error = %message,
        raw_chars = raw.chars().count(),
        head = %head,
        tail = %tail,
        "model reply is not a JSON object"
    );
    ValidatorError::MalformedResponse {
        message: message.to_string(),
        head,
        tail,
    }
}

fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}
