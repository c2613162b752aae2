//! `Array` and `Array.prototype`.
//!
//! Callback-taking methods iterate over a snapshot of the elements taken
//! when the method starts, so a callback that mutates the array cannot
//! invalidate the walk.

use std::cmp::Ordering;

use super::{arg, attach, attach_value, lookup, relative_index, require_callable, to_integer, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::value::{same_value_zero, strict_equals, ObjectKind, ObjectRef, Value};
use crate::Interpreter;

const STATICS: &[(&str, Builtin)] = &[("isArray", is_array), ("from", from), ("of", of)];

const METHODS: &[(&str, Builtin)] = &[
    ("push", push),
    ("pop", pop),
    ("shift", shift),
    ("unshift", unshift),
    ("slice", slice),
    ("splice", splice),
    ("concat", concat),
    ("join", join),
    ("reverse", reverse),
    ("indexOf", index_of),
    ("lastIndexOf", last_index_of),
    ("includes", includes),
    ("find", find),
    ("findIndex", find_index),
    ("findLast", find_last),
    ("findLastIndex", find_last_index),
    ("filter", filter),
    ("map", map),
    ("forEach", for_each),
    ("reduce", reduce),
    ("reduceRight", reduce_right),
    ("some", some),
    ("every", every),
    ("sort", sort),
    ("flat", flat),
    ("flatMap", flat_map),
    ("fill", fill),
    ("at", at),
    ("keys", keys),
    ("values", values),
    ("entries", entries),
    ("toString", to_string),
];

pub(crate) fn constructor() -> Value {
    let array = Value::native_constructor("Array", construct, construct);
    attach(&array, STATICS);
    let prototype = Value::new_object();
    attach(&prototype, METHODS);
    attach_value(&array, "prototype", prototype);
    array
}

pub(crate) fn method(key: &str) -> Option<Value> {
    lookup(METHODS, key)
}

fn construct(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    if let [Value::Number(n)] = args {
        let len = *n;
        if len < 0.0 || len.fract() != 0.0 || len > f64::from(u32::MAX) {
            return Err(EvalError::range_error("Invalid array length"));
        }
        interp.charge(len as u64)?;
        return Ok(Value::array(vec![Value::Undefined; len as usize]));
    }
    Ok(Value::array(args.to_vec()))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn this_array(this: &Value, method: &str) -> EvalResult<ObjectRef> {
    match this {
        Value::Object(obj) if matches!(obj.borrow().kind, ObjectKind::Array(_)) => Ok(obj.clone()),
        _ => Err(EvalError::type_error(format!(
            "Array.prototype.{method} called on a non-array value"
        ))),
    }
}

fn items_of(this: &Value, method: &str) -> EvalResult<Vec<Value>> {
    let obj = this_array(this, method)?;
    let items = match &obj.borrow().kind {
        ObjectKind::Array(items) => items.clone(),
        _ => Vec::new(),
    };
    Ok(items)
}

/// Element `index` as it is now; `None` once the array has shrunk past it.
/// Callback-driven methods fix the length up front and then read each
/// element live, so a callback that mutates the array is seen.
fn live_item(this: &Value, index: usize) -> Option<Value> {
    match this {
        Value::Object(obj) => match &obj.borrow().kind {
            ObjectKind::Array(items) => items.get(index).cloned(),
            _ => None,
        },
        _ => None,
    }
}

/// Run `f` on the live element vector.
fn with_items<R>(this: &Value, method: &str, f: impl FnOnce(&mut Vec<Value>) -> R) -> EvalResult<R> {
    let obj = this_array(this, method)?;
    let mut o = obj.borrow_mut();
    match &mut o.kind {
        ObjectKind::Array(items) => Ok(f(items)),
        _ => Err(EvalError::type_error(format!(
            "Array.prototype.{method} called on a non-array value"
        ))),
    }
}

fn number_arg(interp: &mut Interpreter, args: &[Value], i: usize, default: f64) -> EvalResult<f64> {
    match args.get(i) {
        None | Some(Value::Undefined) => Ok(default),
        Some(value) => interp.to_number(value),
    }
}

/// `callback(item, index, array)` with an optional `thisArg`.
fn call_back(
    interp: &mut Interpreter,
    callback: &Value,
    this_arg: &Value,
    item: &Value,
    index: usize,
    array: &Value,
) -> EvalResult<Value> {
    interp.call(
        callback,
        this_arg.clone(),
        &[item.clone(), Value::Number(index as f64), array.clone()],
    )
}

// ── Statics ──────────────────────────────────────────────────────────────────

fn is_array(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(arg(args, 0).is_array()))
}

/// `Array.from(iterable | { length }, mapFn?)`
fn from(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let source = arg(args, 0);
    let map_fn = arg(args, 1);
    if !map_fn.is_undefined() {
        require_callable(&map_fn)?;
    }

    let items = match &source {
        Value::Undefined | Value::Null => {
            return Err(EvalError::type_error(format!("{source} is not iterable")))
        }
        Value::String(_) => interp.iterate(&source)?,
        Value::Object(_) if source.is_array() => interp.iterate(&source)?,
        Value::Object(_) => {
            let len = interp.get_property(&source, "length")?;
            let len = to_integer(interp.to_number(&len)?).clamp(0.0, f64::from(u32::MAX));
            interp.charge(len as u64)?;
            let mut items = Vec::with_capacity(len as usize);
            for i in 0..len as usize {
                items.push(interp.get_property(&source, &i.to_string())?);
            }
            items
        }
        _ => Vec::new(),
    };

    if map_fn.is_undefined() {
        return Ok(Value::array(items));
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        mapped.push(interp.call(&map_fn, Value::Undefined, &[item.clone(), Value::Number(i as f64)])?);
    }
    Ok(Value::array(mapped))
}

fn of(_: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::array(args.to_vec()))
}

// ── Mutators ─────────────────────────────────────────────────────────────────

fn push(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let len = with_items(this, "push", |items| {
        items.extend_from_slice(args);
        items.len()
    })?;
    Ok(Value::Number(len as f64))
}

fn pop(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(with_items(this, "pop", |items| items.pop())?.unwrap_or_default())
}

fn shift(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let first = with_items(this, "shift", |items| {
        (!items.is_empty()).then(|| items.remove(0))
    })?;
    Ok(first.unwrap_or_default())
}

fn unshift(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let len = with_items(this, "unshift", |items| {
        items.splice(0..0, args.iter().cloned());
        items.len()
    })?;
    Ok(Value::Number(len as f64))
}

/// `splice(start, deleteCount?, ...items)` returns the removed elements.
fn splice(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let len = items_of(this, "splice")?.len();
    let start = relative_index(number_arg(interp, args, 0, 0.0)?, len);
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => {
            let n = to_integer(interp.to_number(&args[1])?);
            n.clamp(0.0, (len - start) as f64) as usize
        }
    };
    let inserted: Vec<Value> = args.get(2..).unwrap_or_default().to_vec();
    let removed = with_items(this, "splice", |items| {
        items
            .splice(start..start + delete_count, inserted)
            .collect::<Vec<_>>()
    })?;
    Ok(Value::array(removed))
}

fn reverse(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    with_items(this, "reverse", |items| items.reverse())?;
    Ok(this.clone())
}

fn fill(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let len = items_of(this, "fill")?.len();
    let value = arg(args, 0);
    let start = relative_index(number_arg(interp, args, 1, 0.0)?, len);
    let end = relative_index(number_arg(interp, args, 2, len as f64)?, len);
    with_items(this, "fill", |items| {
        for slot in items.iter_mut().take(end).skip(start) {
            *slot = value.clone();
        }
    })?;
    Ok(this.clone())
}

/// In-place stable sort. The comparator may throw, so this is a merge
/// sort over `Result` rather than `slice::sort_by`.
fn sort(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let comparator = arg(args, 0);
    if !comparator.is_undefined() {
        require_callable(&comparator)?;
    }
    let items = items_of(this, "sort")?;
    // `undefined` always sorts to the end, without consulting the comparator.
    let (mut defined, undefined): (Vec<Value>, Vec<Value>) =
        items.into_iter().partition(|v| !v.is_undefined());

    let keys = if comparator.is_undefined() {
        let mut keys = Vec::with_capacity(defined.len());
        for item in &defined {
            keys.push(interp.to_string(item)?);
        }
        Some(keys)
    } else {
        None
    };

    let mut order: Vec<usize> = (0..defined.len()).collect();
    merge_sort(&mut order, &mut |a, b| match &keys {
        Some(keys) => Ok(keys[a].cmp(&keys[b])),
        None => {
            let result = interp.call(
                &comparator,
                Value::Undefined,
                &[defined[a].clone(), defined[b].clone()],
            )?;
            let n = interp.to_number(&result)?;
            Ok(if n > 0.0 {
                Ordering::Greater
            } else if n < 0.0 {
                Ordering::Less
            } else {
                Ordering::Equal
            })
        }
    })?;

    let mut sorted: Vec<Value> = order
        .into_iter()
        .map(|i| std::mem::take(&mut defined[i]))
        .collect();
    sorted.extend(undefined);
    with_items(this, "sort", |items| *items = sorted)?;
    Ok(this.clone())
}

fn merge_sort(
    order: &mut [usize],
    compare: &mut dyn FnMut(usize, usize) -> EvalResult<Ordering>,
) -> EvalResult<()> {
    if order.len() <= 1 {
        return Ok(());
    }
    let mid = order.len() / 2;
    merge_sort(&mut order[..mid], compare)?;
    merge_sort(&mut order[mid..], compare)?;

    let mut merged = Vec::with_capacity(order.len());
    let (mut i, mut j) = (0, mid);
    while i < mid && j < order.len() {
        if compare(order[j], order[i])? == Ordering::Less {
            merged.push(order[j]);
            j += 1;
        } else {
            merged.push(order[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&order[i..mid]);
    merged.extend_from_slice(&order[j..]);
    order.copy_from_slice(&merged);
    Ok(())
}

// ── Accessors ────────────────────────────────────────────────────────────────

fn slice(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "slice")?;
    let len = items.len();
    let start = relative_index(number_arg(interp, args, 0, 0.0)?, len);
    let end = relative_index(number_arg(interp, args, 1, len as f64)?, len);
    Ok(Value::array(items.get(start..end.max(start)).unwrap_or_default().to_vec()))
}

fn concat(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut items = items_of(this, "concat")?;
    for arg in args {
        match arg.array_items() {
            Some(more) => items.extend(more),
            None => items.push(arg.clone()),
        }
    }
    Ok(Value::array(items))
}

fn join(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "join")?;
    let separator = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        sep => interp.to_string(&sep)?,
    };
    Ok(Value::from(interp.join_values(&items, &separator)?))
}

fn to_string(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    join(interp, this, &[])
}

fn index_of(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "indexOf")?;
    let target = arg(args, 0);
    let start = relative_index(number_arg(interp, args, 1, 0.0)?, items.len());
    let found = items
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, item)| strict_equals(item, &target))
        .map_or(-1.0, |(i, _)| i as f64);
    Ok(Value::Number(found))
}

fn last_index_of(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "lastIndexOf")?;
    if items.is_empty() {
        return Ok(Value::Number(-1.0));
    }
    let target = arg(args, 0);
    let from = number_arg(interp, args, 1, items.len() as f64 - 1.0)?;
    let from = to_integer(from);
    let last = if from < 0.0 {
        items.len() as f64 + from
    } else {
        from.min(items.len() as f64 - 1.0)
    };
    if last < 0.0 {
        return Ok(Value::Number(-1.0));
    }
    let found = items[..=last as usize]
        .iter()
        .rposition(|item| strict_equals(item, &target))
        .map_or(-1.0, |i| i as f64);
    Ok(Value::Number(found))
}

fn includes(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "includes")?;
    let target = arg(args, 0);
    let start = relative_index(number_arg(interp, args, 1, 0.0)?, items.len());
    Ok(Value::Bool(
        items[start..].iter().any(|item| same_value_zero(item, &target)),
    ))
}

fn at(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "at")?;
    let index = to_integer(number_arg(interp, args, 0, 0.0)?);
    let index = if index < 0.0 { items.len() as f64 + index } else { index };
    if index < 0.0 {
        return Ok(Value::Undefined);
    }
    Ok(items.get(index as usize).cloned().unwrap_or_default())
}

/// Walks with an explicit stack of (remaining items, depth left) so that
/// `flat(Infinity)` on a deeply nested array stays off the native stack.
fn flatten_into(out: &mut Vec<Value>, items: Vec<Value>, depth: f64) {
    let mut stack = vec![(items.into_iter(), depth)];
    while let Some((rest, depth)) = stack.last_mut() {
        let depth = *depth;
        let Some(item) = rest.next() else {
            stack.pop();
            continue;
        };
        match item.array_items() {
            Some(inner) if depth >= 1.0 => stack.push((inner.into_iter(), depth - 1.0)),
            _ => out.push(item),
        }
    }
}

fn flat(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "flat")?;
    let depth = to_integer(number_arg(interp, args, 0, 1.0)?);
    let mut out = Vec::new();
    flatten_into(&mut out, items, depth);
    Ok(Value::array(out))
}

fn keys(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let len = items_of(this, "keys")?.len();
    Ok(Value::array((0..len).map(|i| Value::Number(i as f64)).collect()))
}

fn values(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::array(items_of(this, "values")?))
}

fn entries(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let items = items_of(this, "entries")?;
    Ok(Value::array(
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| Value::array(vec![Value::Number(i as f64), item]))
            .collect(),
    ))
}

// ── Iteration ────────────────────────────────────────────────────────────────

fn for_each(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let len = items_of(this, "forEach")?.len();
    let callback = arg(args, 0);
    require_callable(&callback)?;
    for i in 0..len {
        if let Some(item) = live_item(this, i) {
            call_back(interp, &callback, &arg(args, 1), &item, i, this)?;
        }
    }
    Ok(Value::Undefined)
}

fn map(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let len = items_of(this, "map")?.len();
    let callback = arg(args, 0);
    require_callable(&callback)?;
    // Slots removed mid-walk stay `undefined`; the result keeps the length.
    let mut out = vec![Value::Undefined; len];
    for (i, slot) in out.iter_mut().enumerate() {
        if let Some(item) = live_item(this, i) {
            *slot = call_back(interp, &callback, &arg(args, 1), &item, i, this)?;
        }
    }
    Ok(Value::array(out))
}

fn filter(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let len = items_of(this, "filter")?.len();
    let callback = arg(args, 0);
    require_callable(&callback)?;
    let mut out = Vec::new();
    for i in 0..len {
        let Some(item) = live_item(this, i) else {
            continue;
        };
        if call_back(interp, &callback, &arg(args, 1), &item, i, this)?.truthy() {
            out.push(item);
        }
    }
    Ok(Value::array(out))
}

fn flat_map(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mapped = map(interp, this, args)?;
    let mut out = Vec::new();
    flatten_into(&mut out, mapped.array_items().unwrap_or_default(), 1.0);
    Ok(Value::array(out))
}

/// First (or last) element and index accepted by the predicate.
fn search(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    method: &str,
    from_end: bool,
) -> EvalResult<Option<(usize, Value)>> {
    let len = items_of(this, method)?.len();
    let callback = arg(args, 0);
    require_callable(&callback)?;
    let mut indices: Vec<usize> = (0..len).collect();
    if from_end {
        indices.reverse();
    }
    for i in indices {
        let item = live_item(this, i).unwrap_or_default();
        if call_back(interp, &callback, &arg(args, 1), &item, i, this)?.truthy() {
            return Ok(Some((i, item)));
        }
    }
    Ok(None)
}

fn find(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(search(interp, this, args, "find", false)?
        .map(|(_, item)| item)
        .unwrap_or_default())
}

fn find_index(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = search(interp, this, args, "findIndex", false)?;
    Ok(Value::Number(found.map_or(-1.0, |(i, _)| i as f64)))
}

fn find_last(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(search(interp, this, args, "findLast", true)?
        .map(|(_, item)| item)
        .unwrap_or_default())
}

fn find_last_index(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = search(interp, this, args, "findLastIndex", true)?;
    Ok(Value::Number(found.map_or(-1.0, |(i, _)| i as f64)))
}

/// Whether the predicate's answer for some present element equals `wanted`.
fn any_answer(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    method: &str,
    wanted: bool,
) -> EvalResult<bool> {
    let len = items_of(this, method)?.len();
    let callback = arg(args, 0);
    require_callable(&callback)?;
    for i in 0..len {
        let Some(item) = live_item(this, i) else {
            continue;
        };
        if call_back(interp, &callback, &arg(args, 1), &item, i, this)?.truthy() == wanted {
            return Ok(true);
        }
    }
    Ok(false)
}

fn some(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(any_answer(interp, this, args, "some", true)?))
}

fn every(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(!any_answer(interp, this, args, "every", false)?))
}

fn fold(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    method: &str,
    from_end: bool,
) -> EvalResult<Value> {
    let len = items_of(this, method)?.len();
    let callback = arg(args, 0);
    require_callable(&callback)?;
    let mut indices: Vec<usize> = (0..len).collect();
    if from_end {
        indices.reverse();
    }
    let mut indices = indices.into_iter();
    let mut acc = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match indices.next().and_then(|i| live_item(this, i)) {
            Some(first) => first,
            None => {
                return Err(EvalError::type_error(
                    "Reduce of empty array with no initial value",
                ))
            }
        },
    };
    for i in indices {
        let Some(item) = live_item(this, i) else {
            continue;
        };
        acc = interp.call(
            &callback,
            Value::Undefined,
            &[acc, item, Value::Number(i as f64), this.clone()],
        )?;
    }
    Ok(acc)
}

fn reduce(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    fold(interp, this, args, "reduce", false)
}

fn reduce_right(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    fold(interp, this, args, "reduceRight", true)
}
