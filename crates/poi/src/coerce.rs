//! Field coercion rules for POI records.
//!
//! Both storage formats hand POI fields over as raw text. The table below decides how
//! each named field is interpreted; there is no per-format special casing.

/// Target type of a POI field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    Text,
}

pub const INTEGER_FIELDS: &[&str] = &["dimension", "type", "alt", "visibilityRange"];
pub const FLOAT_FIELDS: &[&str] = &["lat", "lon", "relativeAlt"];
pub const BOOLEAN_FIELDS: &[&str] = &["showSmallBiw", "showBiwOnClick", "doNotIndex", "isVisible"];

pub fn field_kind(name: &str) -> FieldKind {
    if INTEGER_FIELDS.contains(&name) {
        FieldKind::Integer
    } else if FLOAT_FIELDS.contains(&name) {
        FieldKind::Float
    } else if BOOLEAN_FIELDS.contains(&name) {
        FieldKind::Boolean
    } else {
        FieldKind::Text
    }
}

/// A raw field value after coercion. Numeric and text values are `None` when the raw
/// text was empty, i.e. the field was present but unset.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(Option<i64>),
    Float(Option<f64>),
    Boolean(bool),
    Text(Option<String>),
}

pub fn coerce(name: &str, raw: &str) -> FieldValue {
    match field_kind(name) {
        FieldKind::Integer => FieldValue::Integer(parse_int(raw)),
        FieldKind::Float => FieldValue::Float(parse_float(raw)),
        FieldKind::Boolean => FieldValue::Boolean(parse_bool(raw)),
        FieldKind::Text => FieldValue::Text(parse_text(raw)),
    }
}

/// Reads the longest numeric prefix of `raw`. Text without a numeric prefix reads as
/// zero; empty text is unset.
pub fn parse_float(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    Some(numeric_prefix(s).and_then(|p| p.parse::<f64>().ok()).unwrap_or(0.0))
}

/// Integer variant of [`parse_float`]; fractional parts are truncated toward zero.
pub fn parse_int(raw: &str) -> Option<i64> {
    parse_float(raw).map(|v| v.trunc() as i64)
}

/// Boolean from the field's string form: only `""` and `"0"` are false.
pub fn parse_bool(raw: &str) -> bool {
    let s = raw.trim();
    !(s.is_empty() || s == "0")
}

pub fn parse_text(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Formats a boolean the way [`parse_bool`] reads it back.
pub fn format_bool(v: bool) -> &'static str {
    if v { "1" } else { "0" }
}

fn numeric_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    Some(&s[..end])
}
