//! The `time` module: wall-clock readings and blocking sleep.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;

use crate::interpreter::value::{NativeFunction, Value};

fn epoch_nanos() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as f64)
        .unwrap_or(0.0)
}

/// Build the `time` module map.
pub fn module() -> Value {
    let mut entries = IndexMap::new();

    entries.insert(
        "now".to_string(),
        Value::NativeFunction(NativeFunction::new("now", Some(0), |_args| {
            Ok(Value::Number(epoch_nanos() / 1e9))
        })),
    );

    entries.insert(
        "millis".to_string(),
        Value::NativeFunction(NativeFunction::new("millis", Some(0), |_args| {
            Ok(Value::Number(epoch_nanos() / 1e6))
        })),
    );

    entries.insert(
        "nanos".to_string(),
        Value::NativeFunction(NativeFunction::new("nanos", Some(0), |_args| {
            Ok(Value::Number(epoch_nanos()))
        })),
    );

    entries.insert(
        "sleep".to_string(),
        Value::NativeFunction(NativeFunction::new("sleep", Some(1), |args| {
            match args.first() {
                Some(Value::Number(seconds)) => {
                    if *seconds > 0.0 {
                        std::thread::sleep(Duration::from_secs_f64(*seconds));
                    }
                    Ok(Value::Null)
                }
                _ => Err("sleep requires numeric argument".to_string()),
            }
        })),
    );

    Value::map(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(module: &Value, name: &str, args: Vec<Value>) -> Result<Value, String> {
        let Value::Map(map) = module else {
            panic!("module is not a map");
        };
        let Some(Value::NativeFunction(f)) = map.borrow().get(name).cloned() else {
            panic!("no function {}", name);
        };
        f.call(args)
    }

    #[test]
    fn test_now_is_positive_seconds() {
        let module = module();
        let Value::Number(secs) = call(&module, "now", vec![]).unwrap() else {
            panic!("now() must return a number");
        };
        // Sanity window: after 2020, before 2100.
        assert!(secs > 1.5e9 && secs < 4.2e9);
    }

    #[test]
    fn test_units_are_consistent() {
        let module = module();
        let Value::Number(secs) = call(&module, "now", vec![]).unwrap() else {
            unreachable!()
        };
        let Value::Number(millis) = call(&module, "millis", vec![]).unwrap() else {
            unreachable!()
        };
        let Value::Number(nanos) = call(&module, "nanos", vec![]).unwrap() else {
            unreachable!()
        };
        assert!((millis / 1e3 - secs).abs() < 5.0);
        assert!((nanos / 1e9 - secs).abs() < 5.0);
    }

    #[test]
    fn test_sleep_blocks_and_returns_null() {
        let module = module();
        let start = std::time::Instant::now();
        let result = call(&module, "sleep", vec![Value::Number(0.02)]).unwrap();
        assert_eq!(result, Value::Null);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_sleep_rejects_non_number() {
        let module = module();
        assert!(call(&module, "sleep", vec![Value::Null]).is_err());
    }
}
