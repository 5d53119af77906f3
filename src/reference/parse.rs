//! Tolerant parsing helpers for hand-maintained reference files.

use serde_json::Value;

const BOM: char = '\u{feff}';

/// Strip a leading UTF-8 byte order mark.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}

/// Parse a count such as `1'620'000`, `1 620 000`, `1,620,000`, `1.620.000` or `12.7`.
///
/// Thousands separators are dropped. More than one dot means the dots are
/// separators too; a single dot is a decimal point and the value is truncated.
/// Returns `None` for anything negative or unparseable.
pub fn parse_count(raw: &str) -> Option<u64> {
    let cleaned: String = strip_bom(raw.trim())
        .chars()
        .filter(|c| !matches!(c, '\'' | '’' | ',' | '_') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let digits = if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    if digits.contains('.') {
        let value: f64 = digits.parse().ok()?;
        if value.is_finite() && value >= 0.0 {
            return Some(value.trunc() as u64);
        }
        return None;
    }

    digits.parse().ok()
}

/// Read a count from a JSON number or string.
pub fn count_from_json(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

/// Parse a frequency weight; noise defaults to 1.
pub fn parse_weight(raw: &str) -> f64 {
    parse_count(raw).map(|n| n as f64).unwrap_or(1.0)
}

/// Trimmed non-empty string from a JSON value.
pub fn text_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{feff}[1]"), "[1]");
        assert_eq!(strip_bom("[1]"), "[1]");
    }

    #[test]
    fn test_parse_count_separators() {
        assert_eq!(parse_count("1'620'000"), Some(1_620_000));
        assert_eq!(parse_count("1’620’000"), Some(1_620_000));
        assert_eq!(parse_count("1 620 000"), Some(1_620_000));
        assert_eq!(parse_count("1,620,000"), Some(1_620_000));
        assert_eq!(parse_count("1_620_000"), Some(1_620_000));
        assert_eq!(parse_count("1.620.000"), Some(1_620_000));
    }

    #[test]
    fn test_parse_count_single_dot_is_decimal() {
        assert_eq!(parse_count("12.7"), Some(12));
        assert_eq!(parse_count("0.5"), Some(0));
    }

    #[test]
    fn test_parse_count_noise() {
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("n/a"), None);
        assert_eq!(parse_count("-5"), None);
        assert_eq!(parse_weight("???"), 1.0);
        assert_eq!(parse_weight("0"), 0.0);
    }

    #[test]
    fn test_count_from_json() {
        assert_eq!(count_from_json(&json!(430000)), Some(430_000));
        assert_eq!(count_from_json(&json!(12.9)), Some(12));
        assert_eq!(count_from_json(&json!("38'000")), Some(38_000));
        assert_eq!(count_from_json(&json!(-3)), None);
        assert_eq!(count_from_json(&json!(null)), None);
    }

    #[test]
    fn test_text_from_json() {
        assert_eq!(text_from_json(&json!("  Zürich ")), Some("Zürich".to_string()));
        assert_eq!(text_from_json(&json!("   ")), None);
        assert_eq!(text_from_json(&json!(true)), None);
    }
}
