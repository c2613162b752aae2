//! Property access, iteration and the conversions that may call user code.

use std::rc::Rc;

use crate::error::{EvalError, EvalResult};
use crate::stdlib;
use crate::value::{array_index, Function, JsObject, ObjectKind, ObjectRef, Value};
use crate::Interpreter;

/// Preferred type for ToPrimitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hint {
    Default,
    Number,
    String,
}

impl Interpreter {
    // ══════════════════════════════════════════════════════════════════════════
    // Reading
    // ══════════════════════════════════════════════════════════════════════════

    /// `target[key]`
    pub fn get_property(&mut self, target: &Value, key: &str) -> EvalResult<Value> {
        match target {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot read properties of {target} (reading '{key}')"
            ))),
            Value::String(_) if key == "constructor" => Ok(self.builtin_global("String")),
            Value::Number(_) if key == "constructor" => Ok(self.builtin_global("Number")),
            Value::Bool(_) if key == "constructor" => Ok(self.builtin_global("Boolean")),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Some(index) = array_index(key) {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map(|c| Value::from(c.to_string()))
                        .unwrap_or_default());
                }
                Ok(stdlib::string::method(key).unwrap_or_default())
            }
            Value::Number(_) => Ok(stdlib::number::method(key).unwrap_or_default()),
            Value::Bool(_) => Ok(stdlib::boolean_method(key).unwrap_or_default()),
            Value::Object(obj) => self.get_object_property(obj, key),
        }
    }

    fn get_object_property(&mut self, obj: &ObjectRef, key: &str) -> EvalResult<Value> {
        if let Some(value) = own_property(obj, key) {
            return Ok(value);
        }
        let mut proto = obj.borrow().proto.clone();
        while let Some(current) = proto {
            if let Some(value) = current.borrow().props.get(key) {
                return Ok(value.clone());
            }
            proto = current.borrow().proto.clone();
        }

        // Created on first use; `new` links instances to it.
        let lazy_prototype = key == "prototype"
            && matches!(
                &obj.borrow().kind,
                ObjectKind::Function(Function::Closure(c)) if !c.def.is_arrow
            );
        if lazy_prototype {
            let prototype = Value::new_object();
            if let Value::Object(proto) = &prototype {
                proto
                    .borrow_mut()
                    .props
                    .insert("constructor".to_string(), Value::Object(obj.clone()));
            }
            obj.borrow_mut()
                .props
                .insert("prototype".to_string(), prototype.clone());
            return Ok(prototype);
        }

        if key == "constructor" {
            let name = match &obj.borrow().kind {
                ObjectKind::Ordinary => "Object".to_string(),
                ObjectKind::Array(_) => "Array".to_string(),
                ObjectKind::Function(_) => "Function".to_string(),
                ObjectKind::Date(_) => "Date".to_string(),
                ObjectKind::Error { name, .. } => name.clone(),
            };
            return Ok(self.builtin_global(&name));
        }

        let method = match &obj.borrow().kind {
            ObjectKind::Array(_) => stdlib::array::method(key),
            ObjectKind::Function(_) => stdlib::function_method(key),
            ObjectKind::Date(_) => stdlib::date::method(key),
            ObjectKind::Error { .. } => stdlib::error_method(key),
            ObjectKind::Ordinary => None,
        };
        Ok(method
            .or_else(|| stdlib::object::proto_method(key))
            .unwrap_or_default())
    }

    /// A built-in constructor as this interpreter's globals hold it;
    /// `undefined` for one that is not installed.
    fn builtin_global(&self, name: &str) -> Value {
        self.globals().get(name).unwrap_or_default()
    }

    /// `key in target`
    pub(crate) fn has_property(&mut self, target: &Value, key: &str) -> bool {
        let Value::Object(obj) = target else {
            return false;
        };
        if own_property(obj, key).is_some() {
            return true;
        }
        let mut proto = obj.borrow().proto.clone();
        while let Some(current) = proto {
            if current.borrow().props.contains(key) {
                return true;
            }
            proto = current.borrow().proto.clone();
        }
        !self.get_object_property(obj, key).map_or(true, |v| v.is_undefined())
    }

    /// A function-valued property found on the object itself or its
    /// prototype chain, ignoring built-in methods.
    fn user_method(&self, target: &Value, name: &str) -> Option<Value> {
        let mut current = target.as_object().cloned();
        while let Some(obj) = current {
            if let Some(value) = obj.borrow().props.get(name) {
                return value.is_function().then(|| value.clone());
            }
            current = obj.borrow().proto.clone();
        }
        None
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Writing
    // ══════════════════════════════════════════════════════════════════════════

    /// `target[key] = value`. Writes to primitives and frozen objects are
    /// silently dropped, as in sloppy-mode JavaScript.
    pub fn set_property(&mut self, target: &Value, key: &str, value: Value) -> EvalResult<()> {
        let obj = match target {
            Value::Undefined | Value::Null => {
                return Err(EvalError::type_error(format!(
                    "Cannot set properties of {target} (setting '{key}')"
                )))
            }
            Value::Object(obj) => obj,
            _ => return Ok(()),
        };
        if obj.borrow().frozen {
            return Ok(());
        }

        let current_len = match &obj.borrow().kind {
            ObjectKind::Array(items) => Some(items.len()),
            _ => None,
        };
        if let Some(len) = current_len {
            if key == "length" {
                let new_len = value.to_number();
                if new_len < 0.0 || new_len.fract() != 0.0 || new_len > f64::from(u32::MAX) {
                    return Err(EvalError::range_error("Invalid array length"));
                }
                let new_len = new_len as usize;
                self.charge(new_len.saturating_sub(len) as u64)?;
                if let ObjectKind::Array(items) = &mut obj.borrow_mut().kind {
                    items.resize(new_len, Value::Undefined);
                }
                return Ok(());
            }
            if let Some(index) = array_index(key) {
                self.charge((index + 1).saturating_sub(len) as u64)?;
                if let ObjectKind::Array(items) = &mut obj.borrow_mut().kind {
                    if index >= items.len() {
                        items.resize(index + 1, Value::Undefined);
                    }
                    items[index] = value;
                }
                return Ok(());
            }
        }

        obj.borrow_mut().props.insert(key.to_string(), value);
        Ok(())
    }

    /// Define an own property on a fresh object literal.
    pub(crate) fn define_own(&self, target: &Value, key: String, value: Value) {
        if let Value::Object(obj) = target {
            obj.borrow_mut().props.insert(key, value);
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Enumeration
    // ══════════════════════════════════════════════════════════════════════════

    /// Own enumerable keys in JavaScript order: array indices, then
    /// integer-like keys ascending, then the rest in insertion order.
    pub fn enumerable_keys(&self, target: &Value) -> Vec<String> {
        match target {
            Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
            Value::Object(obj) => {
                let o = obj.borrow();
                let mut keys: Vec<String> = match &o.kind {
                    ObjectKind::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
                    _ => Vec::new(),
                };
                let mut integer_keys: Vec<(usize, &str)> = Vec::new();
                let mut string_keys: Vec<&str> = Vec::new();
                for key in o.props.keys() {
                    match array_index(key) {
                        Some(i) => integer_keys.push((i, key)),
                        None => string_keys.push(key),
                    }
                }
                integer_keys.sort_by_key(|(i, _)| *i);
                keys.extend(integer_keys.into_iter().map(|(_, k)| k.to_string()));
                keys.extend(string_keys.into_iter().map(String::from));
                keys
            }
            _ => Vec::new(),
        }
    }

    /// `{ ...rest }` of an object pattern: every enumerable own key not
    /// already taken.
    pub(crate) fn object_rest(&mut self, source: &Value, used: &[String]) -> Value {
        let rest = Value::new_object();
        for key in self.enumerable_keys(source) {
            if used.contains(&key) {
                continue;
            }
            if let Ok(value) = self.get_property(source, &key) {
                self.define_own(&rest, key, value);
            }
        }
        rest
    }

    /// The values produced by `for…of` / spread over `value`.
    pub fn iterate(&mut self, value: &Value) -> EvalResult<Vec<Value>> {
        match value {
            Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::Array(items) => Ok(items.clone()),
                _ => Err(EvalError::type_error("object is not iterable")),
            },
            other => Err(EvalError::type_error(format!("{other} is not iterable"))),
        }
    }

    /// `value instanceof constructor`
    pub(crate) fn instance_of(&mut self, value: &Value, constructor: &Value) -> EvalResult<bool> {
        let Some(func) = constructor.as_function() else {
            return Err(EvalError::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        };
        let Value::Object(obj) = value else {
            return Ok(false);
        };
        match func {
            Function::Native(native) => Ok(builtin_instance_of(&native.name, &obj.borrow())),
            Function::Closure(_) => {
                let prototype = self.get_property(constructor, "prototype")?;
                let Value::Object(prototype) = prototype else {
                    return Ok(false);
                };
                let mut current = obj.borrow().proto.clone();
                while let Some(proto) = current {
                    if Rc::ptr_eq(&proto, &prototype) {
                        return Ok(true);
                    }
                    current = proto.borrow().proto.clone();
                }
                Ok(false)
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Conversions
    // ══════════════════════════════════════════════════════════════════════════

    /// ToPrimitive, calling a user-defined `valueOf`/`toString` if present.
    pub(crate) fn to_primitive(&mut self, value: &Value, hint: Hint) -> EvalResult<Value> {
        let Value::Object(obj) = value else {
            return Ok(value.clone());
        };
        let order = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Default | Hint::Number => ["valueOf", "toString"],
        };
        for name in order {
            if let Some(method) = self.user_method(value, name) {
                let result = self.call(&method, value.clone(), &[])?;
                if !matches!(result, Value::Object(_)) {
                    return Ok(result);
                }
            }
        }
        let date = match obj.borrow().kind {
            ObjectKind::Date(time) => Some(time),
            _ => None,
        };
        Ok(match (date, hint) {
            (Some(time), Hint::Number) => Value::Number(time),
            _ => Value::from(value.try_display_string()?),
        })
    }

    /// JavaScript `String(value)`.
    pub fn to_string(&mut self, value: &Value) -> EvalResult<String> {
        match value {
            Value::Object(_) => Ok(self.to_primitive(value, Hint::String)?.to_display_string()),
            other => Ok(other.to_display_string()),
        }
    }

    /// JavaScript `Number(value)`.
    pub fn to_number(&mut self, value: &Value) -> EvalResult<f64> {
        match value {
            Value::Object(_) => Ok(self.to_primitive(value, Hint::Number)?.to_number()),
            other => Ok(other.to_number()),
        }
    }

    pub(crate) fn to_property_key(&mut self, value: &Value) -> EvalResult<String> {
        match value {
            Value::Object(_) => self.to_string(value),
            other => Ok(other.to_property_key()),
        }
    }

    /// `Array.prototype.join` conversion: nullish items become empty.
    pub fn join_values(&mut self, values: &[Value], separator: &str) -> EvalResult<String> {
        let mut parts = Vec::with_capacity(values.len());
        for value in values {
            if value.is_nullish() {
                parts.push(String::new());
            } else {
                parts.push(self.to_string(value)?);
            }
        }
        Ok(parts.join(separator))
    }
}

/// Properties that live on the object itself, including the synthetic
/// ones (`length`, indices, `name`, `message`).
pub(crate) fn own_property(obj: &ObjectRef, key: &str) -> Option<Value> {
    let o = obj.borrow();
    if let Some(value) = o.props.get(key) {
        return Some(value.clone());
    }
    match &o.kind {
        ObjectKind::Array(items) => {
            if key == "length" {
                return Some(Value::Number(items.len() as f64));
            }
            array_index(key).map(|i| items.get(i).cloned().unwrap_or_default())
        }
        ObjectKind::Function(func) => match key {
            "name" => Some(Value::from(func.name())),
            "length" => Some(Value::Number(match func {
                Function::Closure(c) => c.def.params.iter().take_while(|p| p.default.is_none()).count() as f64,
                Function::Native(_) => 0.0,
            })),
            _ => None,
        },
        ObjectKind::Error { name, message } => match key {
            "name" => Some(Value::from(name.as_str())),
            "message" => Some(Value::from(message.as_str())),
            "stack" => Some(Value::from(format!("{name}: {message}\n    at <anonymous>"))),
            _ => None,
        },
        ObjectKind::Ordinary | ObjectKind::Date(_) => None,
    }
}

fn builtin_instance_of(constructor: &str, obj: &JsObject) -> bool {
    match (&obj.kind, constructor) {
        (_, "Object") => true,
        (ObjectKind::Array(_), "Array") => true,
        (ObjectKind::Function(_), "Function") => true,
        (ObjectKind::Date(_), "Date") => true,
        (ObjectKind::Error { .. }, "Error") => true,
        (ObjectKind::Error { name, .. }, other) => name == other,
        _ => false,
    }
}
