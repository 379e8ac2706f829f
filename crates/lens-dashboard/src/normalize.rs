//! Numeric normalizer for heterogeneous upstream values
//!
//! Financial feeds hand back numbers, numeric strings with separators or
//! scale suffixes, nulls, and occasional garbage. Everything downstream
//! (growth math, comparisons, chart axes) assumes finite floats, so every
//! raw value passes through [`coerce`] before any arithmetic.
//!
//! Policy: unparseable or missing input maps to `0.0`. This is a documented
//! default, not a hidden failure; presence is tracked separately by the
//! metric resolver so a true zero is never confused with an absent value.

use serde_json::Value;

/// Coerce a raw JSON value into a finite float.
///
/// Accepts numbers, numeric strings (with `,`/`_` separators, a leading `$`,
/// a trailing `%`, or a `K`/`M`/`B`/`T` scale suffix), and anything else.
/// Never panics; never returns NaN or infinity.
pub fn coerce(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_numeric(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse a numeric string, handling the formats upstream feeds emit.
fn parse_numeric(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let negative = s.starts_with('-') || (s.starts_with('(') && s.ends_with(')'));
    s = s.trim_start_matches('-').trim_start_matches('(').trim_end_matches(')');
    s = s.trim_start_matches('$').trim_end_matches('%').trim();

    let mut scale = 1.0_f64;
    if let Some(last) = s.chars().last() {
        let suffix_scale = match last.to_ascii_uppercase() {
            'K' => Some(1e3),
            'M' => Some(1e6),
            'B' => Some(1e9),
            'T' => Some(1e12),
            _ => None,
        };
        if let Some(mult) = suffix_scale {
            scale = mult;
            s = &s[..s.len() - last.len_utf8()];
        }
    }

    let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
    let parsed: f64 = cleaned.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }

    let signed = if negative { -parsed } else { parsed };
    Some(signed * scale).filter(|f| f.is_finite())
}
