//! JSON text serialization

use std::fmt::Write as _;

use crate::value::{Array, Object, Value};

/// Configuration options for pretty formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    /// Number of spaces for indentation
    pub indent_spaces: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { indent_spaces: 2 }
    }
}

/// Serialize to compact single-line JSON
pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_compact(value, &mut out);
    out
}

/// Serialize to indented multi-line JSON
pub fn to_string_pretty(value: &Value, config: &FormatConfig) -> String {
    let mut out = String::new();
    write_pretty(value, 0, config, &mut out);
    out
}

fn write_compact(value: &Value, out: &mut String) {
    match value {
        Value::Array(arr) => {
            out.push('[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_compact(item, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            out.push('{');
            for (i, (key, item)) in obj.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_compact(item, out);
            }
            out.push('}');
        }
        _ => write_scalar(value, out),
    }
}

fn write_pretty(value: &Value, indent: usize, config: &FormatConfig, out: &mut String) {
    match value {
        Value::Array(arr) if !arr.is_empty() => write_pretty_array(arr, indent, config, out),
        Value::Object(obj) if !obj.is_empty() => write_pretty_object(obj, indent, config, out),
        _ => write_compact(value, out),
    }
}

fn write_pretty_array(arr: &Array, indent: usize, config: &FormatConfig, out: &mut String) {
    let inner = " ".repeat((indent + 1) * config.indent_spaces);
    out.push_str("[\n");
    for (i, item) in arr.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str(&inner);
        write_pretty(item, indent + 1, config, out);
    }
    out.push('\n');
    out.push_str(&" ".repeat(indent * config.indent_spaces));
    out.push(']');
}

fn write_pretty_object(obj: &Object, indent: usize, config: &FormatConfig, out: &mut String) {
    let inner = " ".repeat((indent + 1) * config.indent_spaces);
    out.push_str("{\n");
    for (i, (key, item)) in obj.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str(&inner);
        write_string(key, out);
        out.push_str(": ");
        write_pretty(item, indent + 1, config, out);
    }
    out.push('\n');
    out.push_str(&" ".repeat(indent * config.indent_spaces));
    out.push('}');
}

fn write_scalar(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(*n, out),
        Value::String(s) => write_string(s, out),
        Value::Array(_) => out.push_str("[]"),
        Value::Object(_) => out.push_str("{}"),
    }
}

fn write_number(n: f64, out: &mut String) {
    if n.is_finite() {
        // f64 Display never uses exponent notation and prints integral values without ".0"
        let _ = write!(out, "{n}");
    } else {
        out.push_str("null");
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c < '\u{20}' => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
