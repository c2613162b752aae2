//! `Math`

use std::f64::consts;

use super::{arg, attach, attach_value, Builtin};
use crate::error::EvalResult;
use crate::eval_expr::js_pow;
use crate::value::Value;
use crate::Interpreter;

const UNARY: &[(&str, fn(f64) -> f64)] = &[
    ("abs", f64::abs),
    ("floor", f64::floor),
    ("ceil", f64::ceil),
    ("round", js_round),
    ("trunc", f64::trunc),
    ("sign", js_sign),
    ("sqrt", f64::sqrt),
    ("cbrt", f64::cbrt),
    ("exp", f64::exp),
    ("log", f64::ln),
    ("log2", f64::log2),
    ("log10", f64::log10),
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("asin", f64::asin),
    ("acos", f64::acos),
    ("atan", f64::atan),
];

const FUNCTIONS: &[(&str, Builtin)] = &[
    ("max", max),
    ("min", min),
    ("pow", pow),
    ("atan2", atan2),
    ("hypot", hypot),
    ("random", random),
];

pub(crate) fn object() -> Value {
    let math = Value::new_object();
    for (name, value) in [
        ("PI", consts::PI),
        ("E", consts::E),
        ("LN2", consts::LN_2),
        ("LN10", consts::LN_10),
        ("LOG2E", consts::LOG2_E),
        ("LOG10E", consts::LOG10_E),
        ("SQRT2", consts::SQRT_2),
        ("SQRT1_2", consts::FRAC_1_SQRT_2),
    ] {
        attach_value(&math, name, Value::Number(value));
    }
    for &(name, func) in UNARY {
        let native = Value::native(name, move |interp, _this, args| {
            let x = interp.to_number(&arg(args, 0))?;
            Ok(Value::Number(func(x)))
        });
        attach_value(&math, name, native);
    }
    attach(&math, FUNCTIONS);
    math
}

/// Rounds half up, toward `+Infinity`: `Math.round(-2.5)` is `-2`.
fn js_round(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

fn js_sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 {
        x
    } else {
        x.signum()
    }
}

fn numbers(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Vec<f64>> {
    args.iter().map(|a| interp.to_number(a)).collect()
}

fn max(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut result = f64::NEG_INFINITY;
    for n in numbers(interp, args)? {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(Value::Number(result))
}

fn min(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut result = f64::INFINITY;
    for n in numbers(interp, args)? {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(Value::Number(result))
}

fn pow(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let base = interp.to_number(&arg(args, 0))?;
    let exponent = interp.to_number(&arg(args, 1))?;
    Ok(Value::Number(js_pow(base, exponent)))
}

fn atan2(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let y = interp.to_number(&arg(args, 0))?;
    let x = interp.to_number(&arg(args, 1))?;
    Ok(Value::Number(y.atan2(x)))
}

fn hypot(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let sum: f64 = numbers(interp, args)?.iter().map(|n| n * n).sum();
    Ok(Value::Number(sum.sqrt()))
}

fn random(_interp: &mut Interpreter, _this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(rand::random::<f64>()))
}
