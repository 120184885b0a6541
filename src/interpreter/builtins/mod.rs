//! Built-in functions preloaded on the root environment.
//!
//! These are the I/O-facing built-ins; their responsibilities end at
//! formatting and writing. The evaluator only sees the `NativeFunction`
//! interface.

use std::io::Write;

use lazy_static::lazy_static;
use regex::Regex;

use crate::interpreter::environment::Environment;
use crate::interpreter::printer::{pretty, pretty_multiline, unescape};
use crate::interpreter::value::{NativeFunction, Value};

lazy_static! {
    /// C-style format specifier: %[flags][width][.precision]verb
    static ref FORMAT_SPEC: Regex =
        Regex::new(r"%([-+ 0#]*)(\d+)?(?:\.(\d+))?([a-zA-Z%])").unwrap();
}

/// Register all built-in functions as constants on the root environment.
pub fn register_builtins(env: &mut Environment) {
    // println(v, ...) - per argument: "[println]: " then the value.
    // Strings print with escapes interpreted; other values use the
    // single-line pretty form.
    define(env, "println", None, |args| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for arg in &args {
            match arg {
                Value::String(s) => writeln!(out, "[println]: {}", unescape(s)),
                other => writeln!(out, "[println]: {}", pretty(other)),
            }
            .map_err(|e| e.to_string())?;
        }
        Ok(Value::Null)
    });

    // printf(fmt, args...) - C-style format specifiers.
    define(env, "printf", None, |args| {
        let mut args = args.into_iter();
        let Some(Value::String(fmt)) = args.next() else {
            return Err("first argument to printf must be a string".to_string());
        };
        let rendered = format_printf(&unescape(&fmt), args.collect());
        print!("{}", rendered);
        std::io::stdout().flush().ok();
        Ok(Value::Null)
    });

    // systemout(v, ...) - one pretty line per value, log style.
    define(env, "systemout", None, |args| {
        for arg in &args {
            eprintln!("{}", pretty(arg));
        }
        Ok(Value::Null)
    });

    // logln(v, ...) - log line with prefix per value.
    define(env, "logln", None, |args| {
        for arg in &args {
            eprintln!("[logln]: {} ", pretty(arg));
        }
        Ok(Value::Null)
    });

    // pretty(v) - single-line string form, keys sorted.
    define(env, "pretty", None, |args| {
        match args.first() {
            Some(v) => Ok(Value::String(pretty(v))),
            None => Ok(Value::String(String::new())),
        }
    });

    // prettyml(v) - multi-line indented string form, keys sorted.
    define(env, "prettyml", None, |args| {
        match args.first() {
            Some(v) => Ok(Value::String(pretty_multiline(v))),
            None => Ok(Value::String(String::new())),
        }
    });

    // printlnml(v) - prettyml(v) followed by a newline.
    define(env, "printlnml", None, |args| {
        match args.first() {
            Some(v) => println!("{}", pretty_multiline(v)),
            None => println!(),
        }
        Ok(Value::Null)
    });
}

fn define<F>(env: &mut Environment, name: &str, arity: Option<usize>, func: F)
where
    F: Fn(Vec<Value>) -> Result<Value, String> + 'static,
{
    env.declare(
        name.to_string(),
        Value::NativeFunction(NativeFunction::new(name, arity, func)),
        true,
    );
}

/// Render a printf-style format string. Whole-valued numbers are passed
/// as integers; non-whole numbers as floats; everything else through
/// its display/pretty form.
pub(crate) fn format_printf(fmt: &str, args: Vec<Value>) -> String {
    let mut out = String::with_capacity(fmt.len());
    let mut args = args.into_iter();
    let mut last = 0;

    for caps in FORMAT_SPEC.captures_iter(fmt) {
        let whole = caps.get(0).unwrap();
        out.push_str(&fmt[last..whole.start()]);
        last = whole.end();

        let flags = caps.get(1).map_or("", |m| m.as_str());
        let width: Option<usize> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let precision: Option<usize> = caps.get(3).and_then(|m| m.as_str().parse().ok());
        let verb = caps.get(4).unwrap().as_str().chars().next().unwrap();

        if verb == '%' {
            out.push('%');
            continue;
        }

        let arg = args.next().unwrap_or(Value::Null);
        let rendered = render_spec(&arg, verb, precision);
        out.push_str(&apply_width(&rendered, flags, width));
    }

    out.push_str(&fmt[last..]);
    out
}

fn render_spec(arg: &Value, verb: char, precision: Option<usize>) -> String {
    match verb {
        'd' | 'i' => match arg {
            Value::Number(n) => format!("{}", *n as i64),
            other => other.to_string(),
        },
        'f' | 'F' => match arg {
            Value::Number(n) => format!("{:.*}", precision.unwrap_or(6), n),
            other => other.to_string(),
        },
        'e' => match arg {
            Value::Number(n) => format!("{:e}", n),
            other => other.to_string(),
        },
        'g' => match arg {
            Value::Number(n) => format!("{}", n),
            other => other.to_string(),
        },
        's' => match arg {
            Value::String(s) => s.clone(),
            other => pretty(other),
        },
        'v' => match arg {
            // Whole-valued numbers pass as integers.
            Value::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Value::String(s) => s.clone(),
            other => pretty(other),
        },
        // Unknown verb: emit the value as-is.
        _ => arg.to_string(),
    }
}

fn apply_width(s: &str, flags: &str, width: Option<usize>) -> String {
    let Some(width) = width else {
        return s.to_string();
    };
    if s.len() >= width {
        return s.to_string();
    }
    let pad = width - s.len();
    if flags.contains('-') {
        format!("{}{}", s, " ".repeat(pad))
    } else if flags.contains('0') {
        format!("{}{}", "0".repeat(pad), s)
    } else {
        format!("{}{}", " ".repeat(pad), s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_printf_basic() {
        assert_eq!(
            format_printf("x = %d\n", vec![Value::Number(42.0)]),
            "x = 42\n"
        );
        assert_eq!(
            format_printf("%s!", vec![Value::String("hi".to_string())]),
            "hi!"
        );
    }

    #[test]
    fn test_format_printf_float_precision() {
        assert_eq!(
            format_printf("%.2f", vec![Value::Number(3.14159)]),
            "3.14"
        );
    }

    #[test]
    fn test_format_printf_whole_numbers_as_integers() {
        assert_eq!(format_printf("%v", vec![Value::Number(4.0)]), "4");
        assert_eq!(format_printf("%v", vec![Value::Number(4.5)]), "4.5");
    }

    #[test]
    fn test_format_printf_width() {
        assert_eq!(format_printf("%5d", vec![Value::Number(42.0)]), "   42");
        assert_eq!(format_printf("%-5d|", vec![Value::Number(42.0)]), "42   |");
        assert_eq!(format_printf("%05d", vec![Value::Number(42.0)]), "00042");
    }

    #[test]
    fn test_format_printf_percent_literal() {
        assert_eq!(format_printf("100%%", vec![]), "100%");
    }

    #[test]
    fn test_format_printf_missing_args_render_null() {
        assert_eq!(format_printf("%s", vec![]), "null");
    }
}
