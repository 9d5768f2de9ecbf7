//! Rule-table interpreter turning raw captures into typed record fields.
//!
//! The interpreter is dialect-agnostic: every decision comes from the
//! [`Transform`] attached to a field in the descriptor table.

use crate::descriptor::{FieldRule, TraceBlank, Transform};
use crate::matcher::CaptureSet;
use crate::models::{FieldValue, Record};

/// Literal used by all dialects for "not applicable"
pub const SENTINEL: &str = "-";

/// Build the record for one matched line. Total over the rules.
pub fn normalize(captures: &CaptureSet<'_>, rules: &[FieldRule]) -> Record {
    let mut record = Record::with_capacity(rules.len() + 2);
    for rule in rules {
        apply(&rule.transform, captures.get(rule.capture), &mut record);
    }
    record
}

fn apply(transform: &Transform, raw: Option<&str>, record: &mut Record) {
    match *transform {
        Transform::PassThrough { key } | Transform::Sentinel { key } => {
            record.push(key, non_sentinel(raw).into());
        }
        Transform::Integer { key } => {
            let value = non_sentinel(raw).map(lenient_int);
            record.push(key, value.into());
        }
        Transform::StatusCode { key } => {
            let code = lenient_int(raw.unwrap_or(""));
            let value = if code == 0 { FieldValue::Null } else { FieldValue::Int(code) };
            record.push(key, value);
        }
        Transform::ScaledDuration { key, suffix } => {
            let value = non_sentinel(raw)
                .and_then(lenient_float)
                .map(|millis| FieldValue::Str(format!("{}{}", render_float(millis / 1000.0), suffix)));
            record.push(key, value.into());
        }
        Transform::TraceSplit { trace_key, span_key, blank_on } => {
            let (trace, span) = split_trace(raw, blank_on);
            record.push(trace_key, trace);
            record.push(span_key, span);
        }
    }
}

fn non_sentinel(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| *s != SENTINEL)
}

fn split_trace(raw: Option<&str>, blank_on: TraceBlank) -> (FieldValue, FieldValue) {
    let blank = || (FieldValue::Str(String::new()), FieldValue::Str(String::new()));

    let value = match (raw, blank_on) {
        (None, TraceBlank::Absent) => return blank(),
        (Some(SENTINEL), TraceBlank::Sentinel) => return blank(),
        (None, TraceBlank::Sentinel) => return (FieldValue::Null, FieldValue::Null),
        (Some(value), _) => value,
    };

    // Trailing empty segments are dropped, so "abc/" has a single segment
    let mut segments: Vec<&str> = value.split('/').collect();
    while segments.last() == Some(&"") {
        segments.pop();
    }

    match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => (FieldValue::from(*first), FieldValue::from(*last)),
        _ => (FieldValue::Null, FieldValue::Null),
    }
}

/// Integer coercion: optional whitespace and sign, then leading digits.
/// No digits yields 0; out-of-range values saturate.
pub fn lenient_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(|b| b.is_ascii_digit()) {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

/// Decimal coercion over the longest numeric prefix; `None` if there is none
pub fn lenient_float(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if let Ok(value) = s.parse::<f64>() {
        if value.is_finite() && s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
            return Some(value);
        }
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Shortest round-trip decimal that always shows a fractional part;
/// exponent form below 1e-4 and from 1e16 up (`1.0e-05`, `1.5e+16`).
pub fn render_float(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }

    let magnitude = value.abs();
    if value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{}.0", mantissa)
        };
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let mut rendered = value.to_string();
    if !rendered.contains('.') {
        rendered.push_str(".0");
    }
    rendered
}
