//! `JSON.stringify` / `JSON.parse`, backed by `serde_json`.
//!
//! Values are converted to a `serde_json::Value` first (keys keep their
//! insertion order through `preserve_order`) and then written out with
//! either the compact or the pretty formatter.

use std::rc::Rc;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::{arg, attach, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::value::{ObjectKind, ObjectRef, Value, MAX_NESTING};
use crate::Interpreter;

const FUNCTIONS: &[(&str, Builtin)] = &[("stringify", stringify), ("parse", parse)];

pub(crate) fn object() -> Value {
    let json = Value::new_object();
    attach(&json, FUNCTIONS);
    json
}

/// Per-call state: the objects currently being serialized (for cycle
/// detection) and the optional replacer.
struct Serializer {
    stack: Vec<ObjectRef>,
    replacer: Option<Value>,
    allow_list: Option<Vec<String>>,
}

impl Interpreter {
    /// `JSON.stringify(value)`; `None` when the value has no JSON form
    /// (`undefined`, functions).
    pub fn json_stringify(&mut self, value: &Value) -> EvalResult<Option<String>> {
        self.json_stringify_with(value, &Value::Undefined, None)
    }

    fn json_stringify_with(
        &mut self,
        value: &Value,
        replacer: &Value,
        indent: Option<&str>,
    ) -> EvalResult<Option<String>> {
        let mut state = Serializer {
            stack: Vec::new(),
            replacer: None,
            allow_list: None,
        };
        if replacer.is_function() {
            state.replacer = Some(replacer.clone());
        } else if let Some(items) = replacer.array_items() {
            let mut keys = Vec::new();
            for item in items {
                if matches!(item, Value::String(_) | Value::Number(_)) {
                    keys.push(item.to_property_key());
                }
            }
            state.allow_list = Some(keys);
        }

        let holder = Value::object_from(vec![(String::new(), value.clone())]);
        let Some(json) = self.to_json(&mut state, &holder, "", value.clone())? else {
            return Ok(None);
        };
        let text = match indent {
            None => serde_json::to_string(&json)
                .map_err(|e| EvalError::type_error(e.to_string()))?,
            Some(indent) => {
                let mut buf = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(
                    &mut buf,
                    PrettyFormatter::with_indent(indent.as_bytes()),
                );
                json.serialize(&mut ser)
                    .map_err(|e| EvalError::type_error(e.to_string()))?;
                String::from_utf8_lossy(&buf).into_owned()
            }
        };
        Ok(Some(text))
    }

    fn to_json(
        &mut self,
        state: &mut Serializer,
        holder: &Value,
        key: &str,
        value: Value,
    ) -> EvalResult<Option<serde_json::Value>> {
        self.tick()?;
        let mut value = value;
        if let Value::Object(_) = value {
            let to_json = self.get_property(&value, "toJSON")?;
            if to_json.is_function() {
                value = self.call(&to_json, value.clone(), &[Value::from(key)])?;
            }
        }
        if let Some(replacer) = state.replacer.clone() {
            value = self.call(&replacer, holder.clone(), &[Value::from(key), value])?;
        }

        let obj = match &value {
            Value::Undefined => return Ok(None),
            Value::Null => return Ok(Some(serde_json::Value::Null)),
            Value::Bool(b) => return Ok(Some(serde_json::Value::Bool(*b))),
            Value::Number(n) => return Ok(Some(json_number(*n))),
            Value::String(s) => return Ok(Some(serde_json::Value::String(s.to_string()))),
            Value::Object(obj) => obj.clone(),
        };
        if value.is_function() {
            return Ok(None);
        }
        if state.stack.iter().any(|seen| Rc::ptr_eq(seen, &obj)) {
            return Err(EvalError::type_error("Converting circular structure to JSON"));
        }
        if state.stack.len() >= MAX_NESTING {
            return Err(EvalError::stack_overflow());
        }

        state.stack.push(obj.clone());
        let result = self.object_to_json(state, &value, &obj);
        state.stack.pop();
        result.map(Some)
    }

    fn object_to_json(
        &mut self,
        state: &mut Serializer,
        value: &Value,
        obj: &ObjectRef,
    ) -> EvalResult<serde_json::Value> {
        let items = match &obj.borrow().kind {
            ObjectKind::Array(items) => Some(items.clone()),
            _ => None,
        };
        if let Some(items) = items {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let json = self.to_json(state, value, &i.to_string(), item)?;
                out.push(json.unwrap_or(serde_json::Value::Null));
            }
            return Ok(serde_json::Value::Array(out));
        }

        let mut map = serde_json::Map::new();
        for key in self.enumerable_keys(value) {
            if let Some(allowed) = &state.allow_list {
                if !allowed.contains(&key) {
                    continue;
                }
            }
            let item = self.get_property(value, &key)?;
            if let Some(json) = self.to_json(state, value, &key, item)? {
                map.insert(key, json);
            }
        }
        Ok(serde_json::Value::Object(map))
    }
}

/// Integral numbers print without a fraction; non-finite ones as `null`.
fn json_number(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// The `space` argument: a count of spaces (capped at 10) or a string
/// (first 10 characters).
fn indent_from(interp: &mut Interpreter, space: &Value) -> EvalResult<Option<String>> {
    let indent = match space {
        Value::Number(_) => {
            let n = interp.to_number(space)?.clamp(0.0, 10.0) as usize;
            " ".repeat(n)
        }
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    Ok((!indent.is_empty()).then_some(indent))
}

fn stringify(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let indent = indent_from(interp, &arg(args, 2))?;
    let text = interp.json_stringify_with(&arg(args, 0), &arg(args, 1), indent.as_deref())?;
    Ok(text.map(Value::from).unwrap_or_default())
}

fn parse(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = interp.to_string(&arg(args, 0))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| EvalError::syntax_error(parse_error_message(&text, &e)))?;
    interp.charge(text.len() as u64 / 16)?;
    Ok(from_json(json))
}

fn parse_error_message(text: &str, err: &serde_json::Error) -> String {
    if err.is_eof() {
        return "Unexpected end of JSON input".to_string();
    }
    let offending = text
        .lines()
        .nth(err.line().saturating_sub(1))
        .and_then(|line| line.chars().nth(err.column().saturating_sub(1)));
    match offending {
        Some(c) => format!("Unexpected token '{c}', \"{text}\" is not valid JSON"),
        None => format!("{err}"),
    }
}

/// Convert parsed JSON into runtime values, keeping key order.
pub(crate) fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(items) => Value::array(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            Value::object_from(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_have_no_fraction() {
        assert_eq!(json_number(42.0).to_string(), "42");
        assert_eq!(json_number(-0.0).to_string(), "0");
        assert_eq!(json_number(1.5).to_string(), "1.5");
        assert_eq!(json_number(f64::NAN), serde_json::Value::Null);
        assert_eq!(json_number(f64::INFINITY), serde_json::Value::Null);
    }

    #[test]
    fn parse_errors_name_the_offending_token() {
        let text = "{\"a\": x}";
        let err = serde_json::from_str::<serde_json::Value>(text).unwrap_err();
        let message = parse_error_message(text, &err);
        assert!(message.starts_with("Unexpected token"), "{message}");
        assert!(message.ends_with("is not valid JSON"), "{message}");
        let err = serde_json::from_str::<serde_json::Value>("[1, 2").unwrap_err();
        assert_eq!(parse_error_message("[1, 2", &err), "Unexpected end of JSON input");
    }

    #[test]
    fn parsed_objects_keep_key_order() {
        let json: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": [true, null]}"#).unwrap();
        let value = from_json(json);
        let obj = value.as_object().unwrap().borrow();
        assert_eq!(obj.props.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
