//! InfluxDB line protocol and InfluxQL quoting.
//!
//! ```text
//! steps,DroneAddress=https://drone.example.com,Name=test BuildId=7i,Name="test" 1600000000
//! ```

use crate::point::{FieldValue, Point};

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\n' {
            out.push_str("\\n");
            continue;
        }
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a measurement name.
#[must_use]
pub fn escape_measurement(s: &str) -> String {
    escape(s, &[',', ' '])
}

/// Escape a tag key, tag value or field key.
#[must_use]
pub fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

/// Quote a string field value.
#[must_use]
pub fn quote_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn encode_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Integer(v) => format!("{v}i"),
        FieldValue::Text(v) => quote_field(v),
    }
}

/// Encode one point with a seconds-precision timestamp.
///
/// Tags with empty values are omitted since InfluxDB rejects them.
#[must_use]
pub fn encode_point(point: &Point) -> String {
    let mut line = escape_measurement(point.measurement());

    for (key, value) in point.tags() {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(&key));
        line.push('=');
        line.push_str(&escape_key(&value));
    }

    let fields: Vec<String> = point
        .fields()
        .iter()
        .map(|(key, value)| format!("{}={}", escape_key(key), encode_field(value)))
        .collect();
    line.push(' ');
    line.push_str(&fields.join(","));

    line.push(' ');
    line.push_str(&point.time().timestamp().to_string());
    line
}

/// Encode points as a newline-separated request body.
#[must_use]
pub fn encode_points(points: &[Point]) -> String {
    points
        .iter()
        .map(encode_point)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quote an InfluxQL string literal.
#[must_use]
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Quote an InfluxQL identifier.
#[must_use]
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
