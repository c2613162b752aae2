//! `Number` and the number methods.

use super::{arg, attach, attach_value, global_parse_float, global_parse_int, lookup, to_integer, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::value::{number_to_string, Value};
use crate::Interpreter;

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

const STATICS: &[(&str, Builtin)] = &[
    ("isInteger", is_integer),
    ("isFinite", is_finite),
    ("isNaN", is_nan),
    ("isSafeInteger", is_safe_integer),
    ("parseFloat", global_parse_float),
    ("parseInt", global_parse_int),
];

const METHODS: &[(&str, Builtin)] = &[
    ("toFixed", to_fixed),
    ("toPrecision", to_precision),
    ("toString", to_string),
    ("toLocaleString", to_locale_string),
    ("valueOf", value_of),
];

pub(crate) fn constructor() -> Value {
    let construct = |interp: &mut Interpreter, _this: &Value, args: &[Value]| -> EvalResult<Value> {
        match args.first() {
            None => Ok(Value::Number(0.0)),
            Some(value) => Ok(Value::Number(interp.to_number(value)?)),
        }
    };
    let number = Value::native_constructor("Number", construct, construct);
    attach(&number, STATICS);
    for (name, value) in [
        ("MAX_SAFE_INTEGER", MAX_SAFE_INTEGER),
        ("MIN_SAFE_INTEGER", -MAX_SAFE_INTEGER),
        ("EPSILON", f64::EPSILON),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("NaN", f64::NAN),
    ] {
        attach_value(&number, name, Value::Number(value));
    }
    number
}

pub(crate) fn method(key: &str) -> Option<Value> {
    lookup(METHODS, key)
}

// ── Statics ──────────────────────────────────────────────────────────────────

fn number_or_none(args: &[Value]) -> Option<f64> {
    match args.first() {
        Some(Value::Number(n)) => Some(*n),
        _ => None,
    }
}

fn is_integer(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(
        number_or_none(args).is_some_and(|n| n.is_finite() && n.trunc() == n),
    ))
}

fn is_safe_integer(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(number_or_none(args).is_some_and(|n| {
        n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER
    })))
}

fn is_finite(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(number_or_none(args).is_some_and(f64::is_finite)))
}

fn is_nan(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(number_or_none(args).is_some_and(f64::is_nan)))
}

// ── Number.prototype ─────────────────────────────────────────────────────────

fn this_number(this: &Value, method: &str) -> EvalResult<f64> {
    match this {
        Value::Number(n) => Ok(*n),
        _ => Err(EvalError::type_error(format!(
            "Number.prototype.{method} requires that 'this' be a Number"
        ))),
    }
}

fn digits_arg(
    interp: &mut Interpreter,
    args: &[Value],
    range: std::ops::RangeInclusive<f64>,
    message: &str,
) -> EvalResult<Option<usize>> {
    match arg(args, 0) {
        Value::Undefined => Ok(None),
        value => {
            let digits = to_integer(interp.to_number(&value)?);
            if !range.contains(&digits) {
                return Err(EvalError::range_error(message));
            }
            Ok(Some(digits as usize))
        }
    }
}

fn to_fixed(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let n = this_number(this, "toFixed")?;
    let digits = digits_arg(
        interp,
        args,
        0.0..=100.0,
        "toFixed() digits argument must be between 0 and 100",
    )?
    .unwrap_or(0);
    Ok(Value::from(fixed(n, digits)))
}

/// `toFixed`: exact decimal expansion of the double, ties rounded away
/// from zero.
pub(crate) fn fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    // 1100 places cover every digit a finite double can have.
    let exact = format!("{:.1100}", n.abs());
    let (int, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int.bytes().chain(frac.bytes().take(digits)).collect();
    if frac.as_bytes().get(digits).is_some_and(|&d| d >= b'5') {
        round_up(&mut kept);
    }
    let int_len = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(&String::from_utf8_lossy(&kept[..int_len]));
    if digits > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(&kept[int_len..]));
    }
    out
}

/// Add one unit in the last place of a decimal digit string.
fn round_up(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

fn to_precision(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let n = this_number(this, "toPrecision")?;
    let precision = digits_arg(
        interp,
        args,
        1.0..=100.0,
        "toPrecision() argument must be between 1 and 100",
    )?;
    let Some(precision) = precision else {
        return Ok(Value::from(number_to_string(n)));
    };
    if !n.is_finite() {
        return Ok(Value::from(number_to_string(n)));
    }
    if n == 0.0 {
        return Ok(Value::from(fixed(0.0, precision - 1)));
    }

    let sci = format!("{:.*e}", precision - 1, n);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -6 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        return Ok(Value::from(format!("{mantissa}e{sign}{}", exponent.abs())));
    }
    let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
    Ok(Value::from(format!("{n:.decimals$}")))
}

fn to_string(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let n = this_number(this, "toString")?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10.0,
        value => to_integer(interp.to_number(&value)?),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(EvalError::range_error(
            "toString() radix must be between 2 and 36",
        ));
    }
    Ok(Value::from(to_radix_string(n, radix as u32)))
}

/// `Number.prototype.toString(radix)`.
pub(crate) fn to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    let n = n.abs();
    let mut int = n.trunc();
    let mut frac = n - int;

    let mut int_digits = Vec::new();
    loop {
        let d = (int % f64::from(radix)) as u32;
        int_digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        int = (int / f64::from(radix)).trunc();
        if int < 1.0 {
            break;
        }
    }
    let mut out: String = int_digits.into_iter().rev().collect();
    if negative {
        out.insert(0, '-');
    }
    if frac > 0.0 {
        out.push('.');
        for _ in 0..52 {
            frac *= f64::from(radix);
            let d = frac.trunc();
            out.push(std::char::from_digit(d as u32, radix).unwrap_or('0'));
            frac -= d;
            if frac <= 0.0 {
                break;
            }
        }
    }
    out
}

/// `en-US` formatting: thousands separators and at most three decimals.
fn to_locale_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let n = this_number(this, "toLocaleString")?;
    Ok(Value::from(locale_string(n)))
}

pub(crate) fn locale_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "∞" } else { "-∞" }.into();
    }
    let text = fixed(n, 3);
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let (sign, int) = match int.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int),
    };
    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

fn value_of(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(this_number(this, "valueOf")?))
}
