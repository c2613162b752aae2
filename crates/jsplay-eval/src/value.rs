//! Runtime values for the jsplay evaluator.
//!
//! Primitives are stored inline; objects, arrays, functions, errors and
//! dates live behind a shared [`ObjectRef`] so that assignment copies the
//! reference, never the contents.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use jsplay_types::ast::FunctionDef;

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::Interpreter;

pub type ObjectRef = Rc<RefCell<JsObject>>;

/// How deep `String(value)` and `JSON.stringify` follow nested arrays and
/// objects before failing with a `RangeError`.
pub const MAX_NESTING: usize = 500;

/// Signature shared by every built-in function: interpreter, `this`, arguments.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value>>;

// ══════════════════════════════════════════════════════════════════════════════
// Value
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(ObjectRef),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn from_object(obj: JsObject) -> Self {
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    /// A fresh `{}`.
    pub fn new_object() -> Self {
        Self::from_object(JsObject::new(ObjectKind::Ordinary))
    }

    /// An ordinary object with the given properties, in order.
    pub fn object_from(props: Vec<(String, Value)>) -> Self {
        let mut obj = JsObject::new(ObjectKind::Ordinary);
        for (key, value) in props {
            obj.props.insert(key, value);
        }
        Self::from_object(obj)
    }

    pub fn array(items: Vec<Value>) -> Self {
        Self::from_object(JsObject::new(ObjectKind::Array(items)))
    }

    /// An `Error`-family object such as `TypeError: message`.
    pub fn error(name: &str, message: impl Into<String>) -> Self {
        Self::from_object(JsObject::new(ObjectKind::Error {
            name: name.to_string(),
            message: message.into(),
        }))
    }

    pub fn date(time: f64) -> Self {
        Self::from_object(JsObject::new(ObjectKind::Date(time)))
    }

    /// A callable built-in.
    pub fn native(
        name: &str,
        call: impl Fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self::from_object(JsObject::new(ObjectKind::Function(Function::Native(
            NativeFunction {
                name: name.to_string(),
                call: Rc::new(call),
                construct: None,
            },
        ))))
    }

    /// A built-in that also answers to `new`.
    pub fn native_constructor(
        name: &str,
        call: impl Fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value> + 'static,
        construct: impl Fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self::from_object(JsObject::new(ObjectKind::Function(Function::Native(
            NativeFunction {
                name: name.to_string(),
                call: Rc::new(call),
                construct: Some(Rc::new(construct)),
            },
        ))))
    }

    pub fn closure(def: Rc<FunctionDef>, env: Environment, name: String) -> Self {
        Self::from_object(JsObject::new(ObjectKind::Function(Function::Closure(
            Closure { def, env, name },
        ))))
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        self.as_object()
            .is_some_and(|o| matches!(o.borrow().kind, ObjectKind::Function(_)))
    }

    pub fn is_array(&self) -> bool {
        self.as_object()
            .is_some_and(|o| matches!(o.borrow().kind, ObjectKind::Array(_)))
    }

    /// The function payload, cloned out so no borrow outlives the call.
    pub fn as_function(&self) -> Option<Function> {
        match &self.as_object()?.borrow().kind {
            ObjectKind::Function(f) => Some(f.clone()),
            _ => None,
        }
    }

    /// A snapshot of an array's elements.
    pub fn array_items(&self) -> Option<Vec<Value>> {
        match &self.as_object()?.borrow().kind {
            ObjectKind::Array(items) => Some(items.clone()),
            _ => None,
        }
    }

    /// JavaScript truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// The `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) if self.is_function() => "function",
            Value::Object(_) => "object",
        }
    }

    // ── Conversions ──────────────────────────────────────────────────────────

    /// ToNumber without calling user code.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Object(obj) => {
                if let ObjectKind::Date(t) = obj.borrow().kind {
                    return t;
                }
                string_to_number(&self.to_display_string())
            }
        }
    }

    /// ToString without calling user code. Arrays nested past
    /// [`MAX_NESTING`] render as an empty string.
    pub fn to_display_string(&self) -> String {
        self.try_display_string().unwrap_or_default()
    }

    /// Like [`Value::to_display_string`], but nesting past [`MAX_NESTING`]
    /// is a `RangeError`.
    pub fn try_display_string(&self) -> EvalResult<String> {
        let mut seen = HashSet::new();
        display_into(self, &mut seen).ok_or_else(EvalError::stack_overflow)
    }

    /// Property-key form of a value: `obj[1]` and `obj['1']` are the same slot.
    pub fn to_property_key(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            other => other.to_display_string(),
        }
    }
}

/// `seen` holds the arrays currently being rendered, so its size is the
/// nesting depth. `None` once that passes [`MAX_NESTING`].
fn display_into(value: &Value, seen: &mut HashSet<*const RefCell<JsObject>>) -> Option<String> {
    Some(match value {
        Value::Undefined => "undefined".into(),
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => s.to_string(),
        Value::Object(obj) => {
            let ptr = Rc::as_ptr(obj);
            let o = obj.borrow();
            match &o.kind {
                ObjectKind::Array(items) => {
                    // A cycle renders as an empty string, as in browsers.
                    if !seen.insert(ptr) {
                        return Some(String::new());
                    }
                    if seen.len() > MAX_NESTING {
                        return None;
                    }
                    let items = items.clone();
                    drop(o);
                    let mut parts = Vec::with_capacity(items.len());
                    for item in &items {
                        if item.is_nullish() {
                            parts.push(String::new());
                        } else {
                            parts.push(display_into(item, seen)?);
                        }
                    }
                    seen.remove(&ptr);
                    parts.join(",")
                }
                ObjectKind::Function(f) => f.source_text(),
                ObjectKind::Error { name, message } => {
                    let message = match o.props.get("message") {
                        Some(m) => m.to_display_string(),
                        None => message.clone(),
                    };
                    if message.is_empty() {
                        name.clone()
                    } else {
                        format!("{name}: {message}")
                    }
                }
                ObjectKind::Date(t) => crate::stdlib::date::date_string(*t),
                ObjectKind::Ordinary => "[object Object]".into(),
            }
        }
    })
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Object(_) => write!(f, "{}", self.to_display_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Equality
// ══════════════════════════════════════════════════════════════════════════════

/// `===`
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// `==`
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Object(_), _) => loose_equals(&to_primitive(a), b),
        (_, Value::Object(_)) => loose_equals(a, &to_primitive(b)),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(_), _) | (_, Value::Bool(_)) => a.to_number() == b.to_number(),
        _ => a.to_number() == b.to_number(),
    }
}

/// SameValueZero, used by `includes`: like `===` except `NaN` equals `NaN`.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

/// ToPrimitive without calling user code: dates become their time value,
/// everything else its string form.
pub fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            if let ObjectKind::Date(t) = obj.borrow().kind {
                return Value::Number(t);
            }
            Value::from(value.to_display_string())
        }
        other => other.clone(),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Objects
// ══════════════════════════════════════════════════════════════════════════════

/// Heap object: a kind-specific payload plus insertion-ordered properties.
pub struct JsObject {
    pub kind: ObjectKind,
    pub props: PropertyMap,
    /// Set by `new` on user functions and by `Object.create`.
    pub proto: Option<ObjectRef>,
    pub frozen: bool,
}

impl JsObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            props: PropertyMap::default(),
            proto: None,
            frozen: false,
        }
    }

    /// Move out everything this object keeps alive.
    fn release_into(&mut self, values: &mut Vec<Value>, scopes: &mut Vec<Environment>) {
        values.extend(std::mem::take(&mut self.props).into_values());
        if let Some(proto) = self.proto.take() {
            values.push(Value::Object(proto));
        }
        match std::mem::replace(&mut self.kind, ObjectKind::Ordinary) {
            ObjectKind::Array(items) => values.extend(items),
            ObjectKind::Function(Function::Closure(closure)) => scopes.push(closure.env),
            _ => {}
        }
    }
}

// A long linked list or a deeply nested array would otherwise be freed by
// one recursive drop per level. Unlink children onto a worklist instead.
impl Drop for JsObject {
    fn drop(&mut self) {
        let mut values = Vec::new();
        let mut scopes = Vec::new();
        self.release_into(&mut values, &mut scopes);
        loop {
            if let Some(value) = values.pop() {
                if let Value::Object(obj) = value {
                    if let Ok(cell) = Rc::try_unwrap(obj) {
                        cell.into_inner().release_into(&mut values, &mut scopes);
                    }
                }
            } else if let Some(env) = scopes.pop() {
                if let Some((held, parent)) = env.into_parts_if_unique() {
                    values.extend(held);
                    scopes.extend(parent);
                }
            } else {
                break;
            }
        }
    }
}

pub enum ObjectKind {
    Ordinary,
    Array(Vec<Value>),
    Function(Function),
    Error { name: String, message: String },
    /// Milliseconds since the Unix epoch; `NaN` for an invalid date.
    Date(f64),
}

#[derive(Clone)]
pub enum Function {
    Closure(Closure),
    Native(NativeFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Closure(c) => &c.name,
            Function::Native(n) => &n.name,
        }
    }

    /// What `String(fn)` prints.
    pub fn source_text(&self) -> String {
        match self {
            Function::Closure(c) => c.def.source.clone(),
            Function::Native(n) => format!("function {}() {{ [native code] }}", n.name),
        }
    }
}

/// A user function together with the scope it closes over.
#[derive(Clone)]
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: Environment,
    pub name: String,
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub call: NativeFn,
    pub construct: Option<NativeFn>,
}

/// Insertion-ordered string-keyed properties.
#[derive(Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(String, Value)>,
}

impl PropertyMap {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Updates in place, or appends a new key at the end.
    pub fn insert(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn into_values(self) -> impl Iterator<Item = Value> {
        self.entries.into_iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses a canonical array index (`"0"`, `"12"`, not `"01"` or `"-1"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || key.len() > 10 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u64>()
        .ok()
        .filter(|&i| i < u64::from(u32::MAX))
        .map(|i| i as usize)
}

// ══════════════════════════════════════════════════════════════════════════════
// Number formatting and parsing
// ══════════════════════════════════════════════════════════════════════════════

/// `Number.prototype.toString()` for radix 10.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n == 0.0 {
        return "0".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    // `{:e}` yields the shortest round-tripping digits, e.g. `1.2345e3`.
    let sci = format!("{n:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exponent + 1;

    if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if point - 1 >= 0 { '+' } else { '-' };
        let dot = if rest.is_empty() { "" } else { "." };
        format!("{first}{dot}{rest}e{sign}{}", (point - 1).abs())
    }
}

pub(crate) fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// ToNumber applied to a string.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim_matches(is_js_whitespace);
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64);
        }
    }
    let allowed = |b: u8| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-');
    if !t.bytes().all(allowed) {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Global `parseInt`.
pub fn parse_int(input: &str, radix: Option<u32>) -> f64 {
    let mut s = input.trim_start_matches(is_js_whitespace);
    let negative = s.starts_with('-');
    if s.starts_with('-') || s.starts_with('+') {
        s = &s[1..];
    }
    let mut radix = radix.unwrap_or(0);
    if radix != 0 && !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    if (radix == 0 || radix == 16) && (s.starts_with("0x") || s.starts_with("0X")) {
        s = &s[2..];
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    let digits: String = s.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    if negative {
        -value
    } else {
        value
    }
}

/// Global `parseFloat`: the longest decimal prefix.
pub fn parse_float(input: &str) -> f64 {
    let s = input.trim_start_matches(is_js_whitespace);
    let unsigned = s.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}
