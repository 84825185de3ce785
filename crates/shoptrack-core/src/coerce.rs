//! Best-effort numeric coercion for loosely-typed upstream fields.
//!
//! Search providers return the same logical field as a number in one response
//! and a string in the next ("4.5" vs 4.5), and review counts arrive in a
//! compact human-readable form ("7.7K"). Every call site that needs a number
//! goes through this module so the try-parse-or-null policy stays uniform.

use serde_json::Value;

/// Interprets `value` as a finite `f64` if it can be done losslessly.
///
/// Accepts JSON numbers and strings that parse as a float. Anything else —
/// null, booleans, objects, arrays, non-numeric strings, NaN/infinite
/// values — yields `None`.
#[must_use]
pub fn try_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Interprets `value` as an `i64` via [`try_f64`], rounding fractional input.
#[must_use]
pub fn try_i64(value: Option<&Value>) -> Option<i64> {
    #[allow(clippy::cast_possible_truncation)]
    try_f64(value).map(|v| v.round() as i64)
}

/// Parses a compact human-readable count like `"7.7K"` or `"2.5M"`.
///
/// Plain numerics (with optional thousands separators, `"1,234"`) also parse.
/// Empty or unrecognized input yields `None`; callers decide whether that
/// defaults to zero or stays null.
#[must_use]
pub fn parse_compact_count(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('k' | 'K') => (&trimmed[..trimmed.len() - 1], 1_000.0),
        Some('m' | 'M') => (&trimmed[..trimmed.len() - 1], 1_000_000.0),
        Some('b' | 'B') => (&trimmed[..trimmed.len() - 1], 1_000_000_000.0),
        _ => (trimmed, 1.0),
    };

    let cleaned: String = digits.chars().filter(|c| *c != ',').collect();
    let value = cleaned.trim().parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some((value * multiplier).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn try_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(try_f64(Some(&json!(4.5))), Some(4.5));
        assert_eq!(try_f64(Some(&json!("4.5"))), Some(4.5));
        assert_eq!(try_f64(Some(&json!(" 12 "))), Some(12.0));
        assert_eq!(try_f64(Some(&json!(380))), Some(380.0));
    }

    #[test]
    fn try_f64_rejects_non_numeric_input() {
        assert_eq!(try_f64(None), None);
        assert_eq!(try_f64(Some(&Value::Null)), None);
        assert_eq!(try_f64(Some(&json!("N/A"))), None);
        assert_eq!(try_f64(Some(&json!(true))), None);
        assert_eq!(try_f64(Some(&json!({"value": 1}))), None);
    }

    #[test]
    fn try_i64_rounds_fractional_values() {
        assert_eq!(try_i64(Some(&json!("380"))), Some(380));
        assert_eq!(try_i64(Some(&json!(99.6))), Some(100));
    }

    #[test]
    fn compact_count_suffixes() {
        assert_eq!(parse_compact_count("7.7K"), Some(7_700));
        assert_eq!(parse_compact_count("2.5M"), Some(2_500_000));
        assert_eq!(parse_compact_count("1b"), Some(1_000_000_000));
        assert_eq!(parse_compact_count("123"), Some(123));
        assert_eq!(parse_compact_count("1,234"), Some(1_234));
    }

    #[test]
    fn compact_count_rejects_empty_and_garbage() {
        assert_eq!(parse_compact_count(""), None);
        assert_eq!(parse_compact_count("   "), None);
        assert_eq!(parse_compact_count("lots"), None);
        assert_eq!(parse_compact_count("-5K"), None);
    }
}
