//! Output formatting: single-line and multi-line pretty printers, plus
//! the escape transform applied by the printing built-ins.

use crate::interpreter::value::Value;

/// Format a value as a single-line string. Strings are quoted; map keys
/// print in lexicographic order regardless of insertion order.
pub fn pretty(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("{}", n),
        Value::String(s) => format!("\"{}\"", s),
        Value::Bool(b) => format!("{}", b),
        Value::Null => "null".to_string(),
        Value::Function(_) | Value::NativeFunction(_) | Value::VmFunction(_) => {
            "[function]".to_string()
        }
        Value::Array(arr) => {
            let parts: Vec<String> = arr.borrow().iter().map(pretty).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Map(map) => {
            let map = map.borrow();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .iter()
                .map(|k| format!("\"{}\": {}", k, pretty(&map[k.as_str()])))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

/// Format a value as a multi-line, two-space-indented string with the
/// same sorted-key guarantee as `pretty`.
pub fn pretty_multiline(value: &Value) -> String {
    pretty_ml(value, 0)
}

fn pretty_ml(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match value {
        Value::Number(_)
        | Value::String(_)
        | Value::Bool(_)
        | Value::Null
        | Value::Function(_)
        | Value::NativeFunction(_)
        | Value::VmFunction(_) => format!("{}{}", pad, pretty(value)),
        Value::Array(arr) => {
            let arr = arr.borrow();
            if arr.is_empty() {
                return format!("{}[]", pad);
            }
            let mut out = String::new();
            out.push_str(&pad);
            out.push_str("[\n");
            for (i, el) in arr.iter().enumerate() {
                out.push_str(&pretty_ml(el, indent + 1));
                if i < arr.len() - 1 {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad);
            out.push(']');
            out
        }
        Value::Map(map) => {
            let map = map.borrow();
            if map.is_empty() {
                return format!("{}{{}}", pad);
            }
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = String::new();
            out.push_str(&pad);
            out.push_str("{\n");
            for (i, k) in keys.iter().enumerate() {
                out.push_str(&"  ".repeat(indent + 1));
                out.push_str(&format!("\"{}\": ", k));
                let val = &map[k.as_str()];
                match val {
                    // Nested aggregates start on their own line, one
                    // level deeper than the key.
                    Value::Array(_) | Value::Map(_) => {
                        out.push('\n');
                        out.push_str(&pretty_ml(val, indent + 2));
                    }
                    _ => out.push_str(&pretty(val)),
                }
                if i < keys.len() - 1 {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad);
            out.push('}');
            out
        }
    }
}

/// Interpret the escape sequences `\r\n \n \t \\ \"` in a raw string
/// body. Single-pass, longest match first; unknown escapes pass through
/// untouched.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'r' if s[i + 2..].starts_with("\\n") => {
                    out.push_str("\r\n");
                    i += 4;
                }
                b'n' => {
                    out.push('\n');
                    i += 2;
                }
                b't' => {
                    out.push('\t');
                    i += 2;
                }
                b'\\' => {
                    out.push('\\');
                    i += 2;
                }
                b'"' => {
                    out.push('"');
                    i += 2;
                }
                _ => {
                    out.push('\\');
                    i += 1;
                }
            }
        } else {
            let c = s[i..].chars().next().unwrap();
            out.push(c);
            i += c.len_utf8();
        }
    }
    out
}

/// Inverse of `unescape` over the same escape set.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn sample_map() -> Value {
        let mut entries = IndexMap::new();
        entries.insert("b".to_string(), Value::Number(2.0));
        entries.insert("a".to_string(), Value::Number(1.0));
        Value::map(entries)
    }

    #[test]
    fn test_pretty_scalars() {
        assert_eq!(pretty(&Value::Number(4.0)), "4");
        assert_eq!(pretty(&Value::Number(0.5)), "0.5");
        assert_eq!(pretty(&Value::String("hi".to_string())), "\"hi\"");
        assert_eq!(pretty(&Value::Bool(true)), "true");
        assert_eq!(pretty(&Value::Null), "null");
    }

    #[test]
    fn test_pretty_array() {
        let arr = Value::array(vec![Value::Number(1.0), Value::String("x".to_string())]);
        assert_eq!(pretty(&arr), "[1, \"x\"]");
    }

    #[test]
    fn test_pretty_map_sorts_keys() {
        assert_eq!(pretty(&sample_map()), "{\"a\": 1, \"b\": 2}");
    }

    #[test]
    fn test_pretty_multiline_map() {
        assert_eq!(
            pretty_multiline(&sample_map()),
            "{\n  \"a\": 1,\n  \"b\": 2\n}"
        );
    }

    #[test]
    fn test_pretty_multiline_nested() {
        let mut inner = IndexMap::new();
        inner.insert("k".to_string(), Value::Number(1.0));
        let mut outer = IndexMap::new();
        outer.insert("m".to_string(), Value::map(inner));
        let v = Value::map(outer);
        assert_eq!(
            pretty_multiline(&v),
            "{\n  \"m\": \n    {\n      \"k\": 1\n    }\n}"
        );
    }

    #[test]
    fn test_pretty_multiline_empty_aggregates() {
        assert_eq!(pretty_multiline(&Value::array(vec![])), "[]");
        assert_eq!(pretty_multiline(&Value::map(IndexMap::new())), "{}");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\nb"), "a\nb");
        assert_eq!(unescape("a\\tb"), "a\tb");
        assert_eq!(unescape("a\\r\\nb"), "a\r\nb");
        assert_eq!(unescape("a\\\\nb"), "a\\nb");
        assert_eq!(unescape("say \\\"hi\\\""), "say \"hi\"");
        // Unknown escapes pass through.
        assert_eq!(unescape("a\\qb"), "a\\qb");
    }

    #[test]
    fn test_escape_roundtrip() {
        for s in ["plain", "a\nb\tc", "back\\slash", "quote\"d", "\r\n mix"] {
            assert_eq!(unescape(&escape(s)), s);
        }
    }
}
