//! The `fmaths` module: numeric functions and constants.
//!
//! Every function validates its argument count and types; domain
//! violations are reported as errors rather than NaN.

use indexmap::IndexMap;

use crate::interpreter::value::{NativeFunction, Value};

/// Golden ratio.
const PHI: f64 = 1.618033988749894;

fn number_arg(args: &[Value], index: usize, name: &str, needed: usize) -> Result<f64, String> {
    if args.len() < needed {
        let plural = if needed == 1 { "argument" } else { "arguments" };
        return Err(format!("{} requires {} {}", name, needed, plural));
    }
    match &args[index] {
        Value::Number(n) => Ok(*n),
        _ => {
            let plural = if needed == 1 { "argument" } else { "arguments" };
            Err(format!("{} requires numeric {}", name, plural))
        }
    }
}

fn insert_unary(
    entries: &mut IndexMap<String, Value>,
    name: &'static str,
    f: fn(f64) -> Result<f64, String>,
) {
    entries.insert(
        name.to_string(),
        Value::NativeFunction(NativeFunction::new(name, Some(1), move |args| {
            let x = number_arg(&args, 0, name, 1)?;
            f(x).map(Value::Number)
        })),
    );
}

fn insert_binary(
    entries: &mut IndexMap<String, Value>,
    name: &'static str,
    f: fn(f64, f64) -> Result<f64, String>,
) {
    entries.insert(
        name.to_string(),
        Value::NativeFunction(NativeFunction::new(name, Some(2), move |args| {
            let x = number_arg(&args, 0, name, 2)?;
            let y = number_arg(&args, 1, name, 2)?;
            f(x, y).map(Value::Number)
        })),
    );
}

/// Variadic fold over at least two numeric arguments.
fn insert_variadic(
    entries: &mut IndexMap<String, Value>,
    name: &'static str,
    f: fn(f64, f64) -> f64,
) {
    entries.insert(
        name.to_string(),
        Value::NativeFunction(NativeFunction::new(name, None, move |args| {
            if args.len() < 2 {
                return Err(format!("{} requires at least 2 arguments", name));
            }
            let mut acc: Option<f64> = None;
            for arg in &args {
                let Value::Number(n) = arg else {
                    return Err(format!("{} requires numeric arguments", name));
                };
                acc = Some(match acc {
                    Some(a) => f(a, *n),
                    None => *n,
                });
            }
            Ok(Value::Number(acc.unwrap()))
        })),
    );
}

/// Build the `fmaths` module map.
pub fn module() -> Value {
    let mut entries = IndexMap::new();

    // Powers and roots
    insert_binary(&mut entries, "pow", |x, y| Ok(x.powf(y)));
    insert_unary(&mut entries, "sqrt", |x| {
        if x < 0.0 {
            Err("sqrt of negative number".to_string())
        } else {
            Ok(x.sqrt())
        }
    });
    insert_unary(&mut entries, "cbrt", |x| Ok(x.cbrt()));

    // Logarithms
    insert_unary(&mut entries, "log", |x| {
        if x <= 0.0 {
            Err("log of non-positive number".to_string())
        } else {
            Ok(x.ln())
        }
    });
    insert_unary(&mut entries, "log10", |x| {
        if x <= 0.0 {
            Err("log10 of non-positive number".to_string())
        } else {
            Ok(x.log10())
        }
    });
    insert_unary(&mut entries, "log2", |x| {
        if x <= 0.0 {
            Err("log2 of non-positive number".to_string())
        } else {
            Ok(x.log2())
        }
    });

    // Exponentials
    insert_unary(&mut entries, "exp", |x| Ok(x.exp()));
    insert_unary(&mut entries, "exp2", |x| Ok(x.exp2()));

    // Trigonometry
    insert_unary(&mut entries, "sin", |x| Ok(x.sin()));
    insert_unary(&mut entries, "cos", |x| Ok(x.cos()));
    insert_unary(&mut entries, "tan", |x| Ok(x.tan()));
    insert_unary(&mut entries, "asin", |x| {
        if !(-1.0..=1.0).contains(&x) {
            Err("asin domain error: argument must be in [-1, 1]".to_string())
        } else {
            Ok(x.asin())
        }
    });
    insert_unary(&mut entries, "acos", |x| {
        if !(-1.0..=1.0).contains(&x) {
            Err("acos domain error: argument must be in [-1, 1]".to_string())
        } else {
            Ok(x.acos())
        }
    });
    insert_unary(&mut entries, "atan", |x| Ok(x.atan()));
    insert_binary(&mut entries, "atan2", |y, x| Ok(y.atan2(x)));

    // Hyperbolics
    insert_unary(&mut entries, "sinh", |x| Ok(x.sinh()));
    insert_unary(&mut entries, "cosh", |x| Ok(x.cosh()));
    insert_unary(&mut entries, "tanh", |x| Ok(x.tanh()));

    // Rounding and magnitude
    insert_unary(&mut entries, "abs", |x| Ok(x.abs()));
    insert_unary(&mut entries, "ceil", |x| Ok(x.ceil()));
    insert_unary(&mut entries, "floor", |x| Ok(x.floor()));
    insert_unary(&mut entries, "round", |x| Ok(x.round()));

    // Variadic extrema
    insert_variadic(&mut entries, "min", f64::min);
    insert_variadic(&mut entries, "max", f64::max);

    // Advanced
    insert_unary(&mut entries, "gamma", |x| Ok(gamma(x)));
    insert_unary(&mut entries, "factorial", |x| {
        let n = x as i64;
        if n < 0 || n as f64 != x {
            return Err("factorial requires non-negative integer".to_string());
        }
        let mut result = 1.0;
        for i in 2..=n {
            result *= i as f64;
        }
        Ok(result)
    });

    // Constants
    entries.insert("pi".to_string(), Value::Number(std::f64::consts::PI));
    entries.insert("e".to_string(), Value::Number(std::f64::consts::E));
    entries.insert("phi".to_string(), Value::Number(PHI));
    entries.insert("sqrt2".to_string(), Value::Number(std::f64::consts::SQRT_2));
    entries.insert("ln2".to_string(), Value::Number(std::f64::consts::LN_2));
    entries.insert("ln10".to_string(), Value::Number(std::f64::consts::LN_10));

    Value::map(entries)
}

/// Lanczos approximation of the gamma function, reflected for x < 0.5.
fn gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * gamma(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut acc = COEFFICIENTS[0];
        for (i, c) in COEFFICIENTS.iter().enumerate().skip(1) {
            acc += c / (x + i as f64);
        }
        let t = x + G + 0.5;
        (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, String> {
        let Value::Map(map) = module() else {
            unreachable!()
        };
        let Some(Value::NativeFunction(f)) = map.borrow().get(name).cloned() else {
            panic!("no function {}", name);
        };
        f.call(args)
    }

    fn num(name: &str, args: Vec<f64>) -> f64 {
        match call(name, args.into_iter().map(Value::Number).collect()) {
            Ok(Value::Number(n)) => n,
            other => panic!("{} returned {:?}", name, other),
        }
    }

    #[test]
    fn test_basic_functions() {
        assert_eq!(num("sqrt", vec![16.0]), 4.0);
        assert_eq!(num("pow", vec![2.0, 10.0]), 1024.0);
        assert_eq!(num("cbrt", vec![27.0]), 3.0);
        assert_eq!(num("abs", vec![-3.5]), 3.5);
        assert_eq!(num("floor", vec![2.7]), 2.0);
        assert_eq!(num("ceil", vec![2.1]), 3.0);
        assert_eq!(num("round", vec![2.5]), 3.0);
    }

    #[test]
    fn test_logs_and_exp() {
        assert!((num("log", vec![std::f64::consts::E]) - 1.0).abs() < 1e-12);
        assert_eq!(num("log10", vec![1000.0]), 3.0);
        assert_eq!(num("log2", vec![8.0]), 3.0);
        assert!((num("exp", vec![0.0]) - 1.0).abs() < 1e-12);
        assert_eq!(num("exp2", vec![3.0]), 8.0);
    }

    #[test]
    fn test_trig_identities() {
        assert!((num("sin", vec![0.0])).abs() < 1e-12);
        assert!((num("cos", vec![0.0]) - 1.0).abs() < 1e-12);
        assert!((num("atan2", vec![1.0, 1.0]) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((num("tanh", vec![0.0])).abs() < 1e-12);
    }

    #[test]
    fn test_domain_errors() {
        assert_eq!(
            call("sqrt", vec![Value::Number(-1.0)]).unwrap_err(),
            "sqrt of negative number"
        );
        assert_eq!(
            call("log", vec![Value::Number(0.0)]).unwrap_err(),
            "log of non-positive number"
        );
        assert!(call("asin", vec![Value::Number(2.0)]).is_err());
        assert!(call("acos", vec![Value::Number(-1.5)]).is_err());
    }

    #[test]
    fn test_arity_and_type_validation() {
        assert_eq!(call("pow", vec![Value::Number(2.0)]).unwrap_err(), "pow requires 2 arguments");
        assert_eq!(
            call("sin", vec![Value::String("x".to_string())]).unwrap_err(),
            "sin requires numeric argument"
        );
    }

    #[test]
    fn test_variadic_min_max() {
        assert_eq!(num("min", vec![3.0, 1.0, 2.0]), 1.0);
        assert_eq!(num("max", vec![3.0, 1.0, 2.0]), 3.0);
        assert!(call("min", vec![Value::Number(1.0)]).is_err());
    }

    #[test]
    fn test_factorial() {
        assert_eq!(num("factorial", vec![0.0]), 1.0);
        assert_eq!(num("factorial", vec![5.0]), 120.0);
        assert_eq!(
            call("factorial", vec![Value::Number(2.5)]).unwrap_err(),
            "factorial requires non-negative integer"
        );
        assert!(call("factorial", vec![Value::Number(-1.0)]).is_err());
    }

    #[test]
    fn test_gamma_matches_factorial() {
        // gamma(n) == (n-1)! for small naturals
        assert!((num("gamma", vec![5.0]) - 24.0).abs() < 1e-9);
        assert!((num("gamma", vec![0.5]) - std::f64::consts::PI.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_constants() {
        let Value::Map(map) = module() else {
            unreachable!()
        };
        let map = map.borrow();
        assert_eq!(map.get("pi"), Some(&Value::Number(std::f64::consts::PI)));
        assert_eq!(map.get("phi"), Some(&Value::Number(PHI)));
        assert!(map.contains_key("sqrt2"));
        assert!(map.contains_key("ln2"));
        assert!(map.contains_key("ln10"));
    }
}
