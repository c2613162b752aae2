//! `Object` and the methods every object inherits.

use super::{arg, attach, lookup, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::property::own_property;
use crate::value::{ObjectKind, Value};
use crate::Interpreter;

const STATICS: &[(&str, Builtin)] = &[
    ("keys", keys),
    ("values", values),
    ("entries", entries),
    ("assign", assign),
    ("fromEntries", from_entries),
    ("freeze", freeze),
    ("isFrozen", is_frozen),
    ("create", create),
];

const PROTO_METHODS: &[(&str, Builtin)] = &[
    ("hasOwnProperty", has_own_property),
    ("toString", to_string),
    ("toLocaleString", to_string),
    ("valueOf", value_of),
];

pub(crate) fn constructor() -> Value {
    let object = Value::native_constructor("Object", construct, construct);
    attach(&object, STATICS);
    object
}

/// Methods found at the end of every prototype chain.
pub(crate) fn proto_method(key: &str) -> Option<Value> {
    lookup(PROTO_METHODS, key)
}

fn construct(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    match arg(args, 0) {
        value @ Value::Object(_) => Ok(value),
        _ => Ok(Value::new_object()),
    }
}

fn require_object_coercible(value: &Value) -> EvalResult<()> {
    if value.is_nullish() {
        return Err(EvalError::type_error("Cannot convert undefined or null to object"));
    }
    Ok(())
}

/// `[key, value]` pairs of the enumerable own properties; strings
/// enumerate their characters.
fn own_entries(interp: &mut Interpreter, target: &Value) -> EvalResult<Vec<(String, Value)>> {
    require_object_coercible(target)?;
    let mut entries = Vec::new();
    for key in interp.enumerable_keys(target) {
        let value = interp.get_property(target, &key)?;
        entries.push((key, value));
    }
    Ok(entries)
}

fn keys(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    require_object_coercible(&target)?;
    let keys = interp.enumerable_keys(&target);
    Ok(Value::array(keys.into_iter().map(Value::from).collect()))
}

fn values(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let entries = own_entries(interp, &arg(args, 0))?;
    Ok(Value::array(entries.into_iter().map(|(_, v)| v).collect()))
}

fn entries(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let entries = own_entries(interp, &arg(args, 0))?;
    Ok(Value::array(
        entries
            .into_iter()
            .map(|(k, v)| Value::array(vec![Value::from(k), v]))
            .collect(),
    ))
}

fn assign(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    require_object_coercible(&target)?;
    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        for (key, value) in own_entries(interp, source)? {
            interp.set_property(&target, &key, value)?;
        }
    }
    Ok(target)
}

fn from_entries(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let result = Value::new_object();
    for entry in interp.iterate(&arg(args, 0))? {
        if !matches!(entry, Value::Object(_)) {
            return Err(EvalError::type_error(format!(
                "Iterator value {entry} is not an entry object"
            )));
        }
        let key = interp.get_property(&entry, "0")?;
        let key = interp.to_property_key(&key)?;
        let value = interp.get_property(&entry, "1")?;
        interp.define_own(&result, key, value);
    }
    Ok(result)
}

/// Shallow freeze: later writes to the object's own properties are ignored.
fn freeze(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    if let Value::Object(obj) = &target {
        obj.borrow_mut().frozen = true;
    }
    Ok(target)
}

fn is_frozen(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(match arg(args, 0) {
        Value::Object(obj) => obj.borrow().frozen,
        _ => true,
    }))
}

fn create(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let proto = match arg(args, 0) {
        Value::Object(obj) => Some(obj),
        Value::Null => None,
        other => {
            return Err(EvalError::type_error(format!(
                "Object prototype may only be an Object or null: {other}"
            )))
        }
    };
    let result = Value::new_object();
    if let Value::Object(obj) = &result {
        obj.borrow_mut().proto = proto;
    }
    Ok(result)
}

// ── Object.prototype ─────────────────────────────────────────────────────────

fn has_own_property(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let key = interp.to_property_key(&arg(args, 0))?;
    Ok(Value::Bool(match this {
        Value::Object(obj) => own_property(obj, &key).is_some(),
        Value::String(s) => key == "length" || key.parse::<usize>().is_ok_and(|i| i < s.chars().count()),
        _ => false,
    }))
}

fn to_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let tag = match this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Object(obj) => match obj.borrow().kind {
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error { .. } => "Error",
            ObjectKind::Date(_) => "Date",
            ObjectKind::Ordinary => "Object",
        },
    };
    Ok(Value::from(format!("[object {tag}]")))
}

fn value_of(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(this.clone())
}
