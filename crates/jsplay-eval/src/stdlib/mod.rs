//! Built-in globals: `Math`, `JSON`, `Date`, `Array`, `Object`, `String`,
//! `Number`, `Boolean`, the `Error` family and the global functions.
//!
//! Prototype methods are not stored on objects; property lookup asks the
//! `method` function of the matching module for a fresh native.

pub mod array;
pub mod date;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::value::{parse_float, parse_int, Value};
use crate::Interpreter;

/// Plain function pointer form of a built-in.
pub(crate) type Builtin = fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value>;

/// Install every built-in global into `globals`.
pub(crate) fn install(globals: &Environment) {
    let define = |name: &str, value: Value| globals.define(name, value, true);

    define("undefined", Value::Undefined);
    define("NaN", Value::Number(f64::NAN));
    define("Infinity", Value::Number(f64::INFINITY));

    define("parseInt", Value::native("parseInt", global_parse_int));
    define("parseFloat", Value::native("parseFloat", global_parse_float));
    define("isNaN", Value::native("isNaN", global_is_nan));
    define("isFinite", Value::native("isFinite", global_is_finite));

    for name in ["Error", "TypeError", "RangeError", "ReferenceError", "SyntaxError"] {
        define(name, error_constructor(name));
    }

    define("Math", math::object());
    define("JSON", json::object());
    define("Date", date::constructor());
    define("Array", array::constructor());
    define("Object", object::constructor());
    define("String", string::constructor());
    define("Number", number::constructor());
    define("Boolean", boolean_constructor());
}

// ── Helpers shared by the modules ────────────────────────────────────────────

/// Argument `i`, or `undefined` when absent.
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// A native for `key` from a method table.
pub(crate) fn lookup(table: &[(&'static str, Builtin)], key: &str) -> Option<Value> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(name, func)| Value::native(name, *func))
}

/// Attach a method table as own properties of `target`.
pub(crate) fn attach(target: &Value, table: &[(&'static str, Builtin)]) {
    if let Value::Object(obj) = target {
        let mut obj = obj.borrow_mut();
        for (name, func) in table {
            obj.props.insert(name.to_string(), Value::native(name, *func));
        }
    }
}

/// Attach a plain value property.
pub(crate) fn attach_value(target: &Value, name: &str, value: Value) {
    if let Value::Object(obj) = target {
        obj.borrow_mut().props.insert(name.to_string(), value);
    }
}

/// ToIntegerOrInfinity.
pub(crate) fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolve a relative index (`-1` is the last element) into `0..=len`.
pub(crate) fn relative_index(n: f64, len: usize) -> usize {
    let n = to_integer(n);
    let len_f = len as f64;
    if n < 0.0 {
        (len_f + n).max(0.0) as usize
    } else {
        n.min(len_f) as usize
    }
}

pub(crate) fn require_callable(value: &Value) -> EvalResult<()> {
    if value.is_function() {
        Ok(())
    } else {
        Err(EvalError::type_error(format!("{value} is not a function")))
    }
}

// ── Global functions ─────────────────────────────────────────────────────────

fn global_parse_int(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = interp.to_string(&arg(args, 0))?;
    let radix = match arg(args, 1) {
        Value::Undefined => None,
        value => match to_integer(interp.to_number(&value)?) {
            r if r == 0.0 => None,
            r if (2.0..=36.0).contains(&r) => Some(r as u32),
            _ => return Ok(Value::Number(f64::NAN)),
        },
    };
    Ok(Value::Number(parse_int(&text, radix)))
}

fn global_parse_float(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = interp.to_string(&arg(args, 0))?;
    Ok(Value::Number(parse_float(&text)))
}

fn global_is_nan(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(interp.to_number(&arg(args, 0))?.is_nan()))
}

fn global_is_finite(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(interp.to_number(&arg(args, 0))?.is_finite()))
}

// ── Error family ─────────────────────────────────────────────────────────────

fn error_constructor(name: &'static str) -> Value {
    let make = move |interp: &mut Interpreter, _this: &Value, args: &[Value]| -> EvalResult<Value> {
        let message = match args.first() {
            None | Some(Value::Undefined) => String::new(),
            Some(value) => interp.to_string(value)?,
        };
        Ok(Value::error(name, message))
    };
    Value::native_constructor(name, make, make)
}

pub(crate) fn error_method(key: &str) -> Option<Value> {
    match key {
        "toString" => Some(Value::native("toString", |_, this, _| {
            Ok(Value::from(this.to_display_string()))
        })),
        _ => None,
    }
}

// ── Boolean ──────────────────────────────────────────────────────────────────

fn boolean_constructor() -> Value {
    let make = |_: &mut Interpreter, _this: &Value, args: &[Value]| -> EvalResult<Value> {
        Ok(Value::Bool(arg(args, 0).truthy()))
    };
    Value::native_constructor("Boolean", make, make)
}

pub(crate) fn boolean_method(key: &str) -> Option<Value> {
    match key {
        "toString" => Some(Value::native("toString", |_, this, _| {
            Ok(Value::from(this.to_display_string()))
        })),
        "valueOf" => Some(Value::native("valueOf", |_, this, _| Ok(this.clone()))),
        _ => None,
    }
}

// ── Function.prototype ───────────────────────────────────────────────────────

const FUNCTION_METHODS: &[(&str, Builtin)] = &[
    ("call", function_call),
    ("apply", function_apply),
    ("bind", function_bind),
    ("toString", function_to_string),
];

pub(crate) fn function_method(key: &str) -> Option<Value> {
    lookup(FUNCTION_METHODS, key)
}

fn function_call(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let rest = args.get(1..).unwrap_or_default();
    interp.call(this, arg(args, 0), rest)
}

fn function_apply(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let call_args = match arg(args, 1) {
        Value::Undefined | Value::Null => Vec::new(),
        list => interp.iterate(&list)?,
    };
    interp.call(this, arg(args, 0), &call_args)
}

fn function_bind(_interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let Some(target) = this.as_function() else {
        return Err(EvalError::type_error("Bind must be called on a function"));
    };
    let bound_this = arg(args, 0);
    let bound_args: Vec<Value> = args.get(1..).unwrap_or_default().to_vec();
    let name = format!("bound {}", target.name());
    Ok(Value::native(&name, move |interp, _this, call_args| {
        let mut all = bound_args.clone();
        all.extend_from_slice(call_args);
        interp.call_function(&target, bound_this.clone(), &all)
    }))
}

fn function_to_string(_interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    match this.as_function() {
        Some(func) => Ok(Value::from(func.source_text())),
        None => Err(EvalError::type_error(
            "Function.prototype.toString requires that 'this' be a Function",
        )),
    }
}

