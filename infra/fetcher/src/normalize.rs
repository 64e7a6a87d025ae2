//! Ingress normalization shared by all parsers.
//!
//! Values that are not usable are mapped to `None` instead of zero or an empty
//! string, so downstream code never sees a spurious zero quota or a literal
//! `"none"` known-issues note.

use serde_json::Value;

const ABSENT_SENTINEL: &str = "none";

/// Trimmed text, or `None` for empty input and the `"none"` sentinel (any case).
#[must_use]
pub fn text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || collapsed.eq_ignore_ascii_case(ABSENT_SENTINEL) {
        None
    } else {
        Some(collapsed)
    }
}

/// Non-negative integral number, or `None` when the input is not one.
///
/// Integral floats such as `"1000.0"` are accepted.
#[must_use]
pub fn number(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Some(n);
    }
    trimmed.parse::<f64>().ok().and_then(integral)
}

/// Like [`number`], for values that may arrive as JSON numbers or numeric strings.
#[must_use]
pub fn json_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => number(s),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// Splits a provider list on commas or semicolons; an empty result is `None`.
#[must_use]
pub fn list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw.split([',', ';']).filter_map(text).collect();
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_and_empty_text_are_absent() {
        assert_eq!(text("none"), None);
        assert_eq!(text(" None "), None);
        assert_eq!(text("   "), None);
        assert_eq!(text("long files\n  time out"), Some("long files time out".to_owned()));
    }

    #[test]
    fn invalid_numbers_are_absent() {
        assert_eq!(number("1000"), Some(1000));
        assert_eq!(number(" 250.0 "), Some(250));
        assert_eq!(number("unlimited"), None);
        assert_eq!(number("-5"), None);
        assert_eq!(number("2.5"), None);
        assert_eq!(number("NaN"), None);
    }

    #[test]
    fn json_numbers_accept_strings() {
        assert_eq!(json_number(&json!(1000)), Some(1000));
        assert_eq!(json_number(&json!("42")), Some(42));
        assert_eq!(json_number(&json!(null)), None);
        assert_eq!(json_number(&json!("n/a")), None);
        assert_eq!(json_number(&json!(true)), None);
    }

    #[test]
    fn provider_lists_are_split_and_trimmed() {
        assert_eq!(
            list("Google, Watson;LST"),
            Some(vec!["Google".to_owned(), "Watson".to_owned(), "LST".to_owned()])
        );
        assert_eq!(list(" , ;"), None);
    }
}
