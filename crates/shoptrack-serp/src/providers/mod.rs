//! Per-provider response adapters.
//!
//! Field-shape differences between vendors (`seller` vs `merchant`, compact
//! review strings, price buried in free-text extensions) are resolved inside
//! the owning module; everything past this boundary sees only
//! [`crate::types::ProvisionalRecord`].

pub mod serpapi;
pub mod valueserp;

use serde_json::Value;
use shoptrack_core::coerce::{parse_compact_count, try_i64};

/// Coerces a review count that may arrive as a number, a numeric string, or
/// a compact human-readable string like `"7.7K"`.
pub(crate) fn coerce_reviews(value: Option<&Value>) -> Option<i64> {
    if let Some(n) = try_i64(value) {
        return Some(n);
    }
    match value {
        Some(Value::String(s)) => parse_compact_count(s),
        _ => None,
    }
}

/// Renders a scalar JSON value as plain text, without the quotes that
/// `Value::to_string` would add. Non-scalar values render as empty.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
