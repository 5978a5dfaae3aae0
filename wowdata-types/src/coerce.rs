//! Loose scalar coercions.
//!
//! Backends hand over numbers as text and text as numbers. These conversions
//! define one consistent reading of such values:
//! - integer coercion parses a leading numeric prefix (`"12abc"` is 12)
//! - text rendering prints integral floats without a fraction (`42.0` is `"42"`)
//! - truthiness treats `""`, `"0"`, zero, null and empty containers as false

use crate::Value;

const WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\u{0B}', '\u{0C}'];

/// Significant digits used when rendering non-integral floats.
const FLOAT_PRECISION: usize = 14;

impl Value {
    /// Integer coercion.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(i) => *i,
            Value::Float(f) => float_to_int(*f),
            Value::Str(s) => text_to_int(s),
            Value::Bytes(b) => text_to_int(&String::from_utf8_lossy(b)),
            Value::List(items) => i64::from(!items.is_empty()),
            Value::Map(map) => i64::from(!map.is_empty()),
        }
    }

    /// Float coercion.
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Str(s) => text_to_float(s),
            Value::Bytes(b) => text_to_float(&String::from_utf8_lossy(b)),
            Value::List(items) => f64::from(u8::from(!items.is_empty())),
            Value::Map(map) => f64::from(u8::from(!map.is_empty())),
        }
    }

    /// Text rendering. `true` is `"1"`; `false`, null and empty containers
    /// are `""`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_to_text(*f),
            Value::Str(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::List(items) if items.is_empty() => String::new(),
            Value::Map(map) if map.is_empty() => String::new(),
            Value::List(_) | Value::Map(_) => "Array".to_string(),
        }
    }

    /// Truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !(s.is_empty() || s == "0"),
            Value::Bytes(b) => !(b.is_empty() || b.as_slice() == b"0"),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Whether the value is a number or a fully numeric string.
    pub fn is_numeric(&self) -> bool {
        match self {
            Value::Int(_) | Value::Float(_) => true,
            Value::Str(s) => is_numeric_text(s),
            _ => false,
        }
    }

    /// Loose equality: numbers compare numerically against numeric text,
    /// booleans compare by truthiness, everything else compares as text.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(b), v) | (v, Value::Bool(b)) => *b == v.truthy(),
            (Value::Null, Value::Str(s)) | (Value::Str(s), Value::Null) => s.is_empty(),
            (Value::Null, v) | (v, Value::Null) => !v.truthy(),
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::List(_) | Value::Map(_), _) | (_, Value::List(_) | Value::Map(_)) => self == other,
            (a, b) if a.is_numeric() && b.is_numeric() => a.to_float() == b.to_float(),
            (a, b) => a.to_text() == b.to_text(),
        }
    }
}

fn float_to_int(f: f64) -> i64 {
    if f.is_finite() { f.trunc() as i64 } else { 0 }
}

fn float_to_text(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    let rounded: f64 = format!("{:.*e}", FLOAT_PRECISION - 1, f)
        .parse()
        .unwrap_or(f);
    format!("{rounded}")
}

/// Length of the longest numeric prefix of `s` (after leading whitespace),
/// and whether that prefix has a fraction or exponent.
fn numeric_prefix(s: &str) -> (usize, bool) {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    let mut fractional = false;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            fractional = true;
            i = j;
        }
    }
    if digits == 0 {
        return (0, false);
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            fractional = true;
            i = j;
        }
    }
    (i, fractional)
}

fn text_to_int(s: &str) -> i64 {
    let trimmed = s.trim_start_matches(WHITESPACE);
    let (len, fractional) = numeric_prefix(trimmed);
    if len == 0 {
        return 0;
    }
    let prefix = &trimmed[..len];
    if fractional {
        return float_to_int(prefix.parse().unwrap_or(0.0));
    }
    prefix.parse().unwrap_or_else(|_| {
        if prefix.starts_with('-') { i64::MIN } else { i64::MAX }
    })
}

fn text_to_float(s: &str) -> f64 {
    let trimmed = s.trim_start_matches(WHITESPACE);
    let (len, _) = numeric_prefix(trimmed);
    if len == 0 {
        return 0.0;
    }
    trimmed[..len].parse().unwrap_or(0.0)
}

fn is_numeric_text(s: &str) -> bool {
    let trimmed = s.trim_matches(WHITESPACE);
    let (len, _) = numeric_prefix(trimmed);
    len > 0 && len == trimmed.len()
}
