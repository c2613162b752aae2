//! `String` and the string methods.
//!
//! Strings are indexed by Unicode scalar value: `"é".length` is 1 and
//! indices count `char`s, not UTF-16 units.

use super::{arg, attach, lookup, relative_index, to_integer, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::value::{is_js_whitespace, Value};
use crate::Interpreter;

const STATICS: &[(&str, Builtin)] = &[("fromCharCode", from_char_code)];

const METHODS: &[(&str, Builtin)] = &[
    ("charAt", char_at),
    ("charCodeAt", char_code_at),
    ("codePointAt", char_code_at),
    ("at", at),
    ("indexOf", index_of),
    ("lastIndexOf", last_index_of),
    ("includes", includes),
    ("startsWith", starts_with),
    ("endsWith", ends_with),
    ("slice", slice),
    ("substring", substring),
    ("substr", substr),
    ("toUpperCase", to_upper_case),
    ("toLowerCase", to_lower_case),
    ("toLocaleUpperCase", to_upper_case),
    ("toLocaleLowerCase", to_lower_case),
    ("trim", trim),
    ("trimStart", trim_start),
    ("trimEnd", trim_end),
    ("padStart", pad_start),
    ("padEnd", pad_end),
    ("repeat", repeat),
    ("split", split),
    ("concat", concat),
    ("replace", replace),
    ("replaceAll", replace_all),
    ("localeCompare", locale_compare),
    ("normalize", value_of),
    ("toString", value_of),
    ("valueOf", value_of),
];

pub(crate) fn constructor() -> Value {
    let string = Value::native_constructor("String", construct, construct);
    attach(&string, STATICS);
    string
}

pub(crate) fn method(key: &str) -> Option<Value> {
    lookup(METHODS, key)
}

fn construct(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    match args.first() {
        None => Ok(Value::from("")),
        Some(value) => Ok(Value::from(interp.to_string(value)?)),
    }
}

fn from_char_code(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = String::with_capacity(args.len());
    for value in args {
        let code = interp.to_number(value)?;
        let code = (to_integer(code) as i64).rem_euclid(0x1_0000) as u32;
        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    Ok(Value::from(out))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn chars_of(interp: &mut Interpreter, this: &Value) -> EvalResult<Vec<char>> {
    Ok(this_string(interp, this)?.chars().collect())
}

fn this_string(interp: &mut Interpreter, this: &Value) -> EvalResult<String> {
    if this.is_nullish() {
        return Err(EvalError::type_error(
            "String.prototype method called on null or undefined",
        ));
    }
    interp.to_string(this)
}

fn string_arg(interp: &mut Interpreter, args: &[Value], i: usize) -> EvalResult<String> {
    interp.to_string(&arg(args, i))
}

fn integer_arg(interp: &mut Interpreter, args: &[Value], i: usize, default: f64) -> EvalResult<f64> {
    match args.get(i) {
        None | Some(Value::Undefined) => Ok(default),
        Some(value) => Ok(to_integer(interp.to_number(value)?)),
    }
}

/// Char position of `needle` in `haystack` at or after char `from`.
fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    (from..haystack.len()).find(|&i| haystack[i..].starts_with(needle))
}

fn collect(chars: &[char]) -> Value {
    Value::from(chars.iter().collect::<String>())
}

// ── Character access ─────────────────────────────────────────────────────────

fn char_at(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let i = integer_arg(interp, args, 0, 0.0)?;
    if i < 0.0 {
        return Ok(Value::from(""));
    }
    Ok(Value::from(
        chars.get(i as usize).map(|c| c.to_string()).unwrap_or_default(),
    ))
}

fn char_code_at(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let i = integer_arg(interp, args, 0, 0.0)?;
    if i < 0.0 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(
        chars.get(i as usize).map_or(f64::NAN, |&c| f64::from(u32::from(c))),
    ))
}

fn at(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let i = integer_arg(interp, args, 0, 0.0)?;
    let i = if i < 0.0 { chars.len() as f64 + i } else { i };
    if i < 0.0 {
        return Ok(Value::Undefined);
    }
    Ok(chars
        .get(i as usize)
        .map(|c| Value::from(c.to_string()))
        .unwrap_or_default())
}

// ── Searching ────────────────────────────────────────────────────────────────

fn index_of(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let needle: Vec<char> = string_arg(interp, args, 0)?.chars().collect();
    let from = integer_arg(interp, args, 1, 0.0)?.clamp(0.0, chars.len() as f64) as usize;
    Ok(Value::Number(
        find_from(&chars, &needle, from).map_or(-1.0, |i| i as f64),
    ))
}

fn last_index_of(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let needle: Vec<char> = string_arg(interp, args, 0)?.chars().collect();
    let from = match args.get(1) {
        None => f64::INFINITY,
        Some(value) => {
            let n = interp.to_number(value)?;
            if n.is_nan() {
                f64::INFINITY
            } else {
                to_integer(n)
            }
        }
    };
    if needle.len() > chars.len() {
        return Ok(Value::Number(-1.0));
    }
    let last_start = (chars.len() - needle.len()) as f64;
    let start = from.clamp(0.0, last_start) as usize;
    let found = (0..=start)
        .rev()
        .find(|&i| chars[i..].starts_with(&needle))
        .map_or(-1.0, |i| i as f64);
    Ok(Value::Number(found))
}

fn includes(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = index_of(interp, this, args)?;
    Ok(Value::Bool(!matches!(found, Value::Number(n) if n < 0.0)))
}

fn starts_with(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let prefix: Vec<char> = string_arg(interp, args, 0)?.chars().collect();
    let from = integer_arg(interp, args, 1, 0.0)?.clamp(0.0, chars.len() as f64) as usize;
    Ok(Value::Bool(chars[from..].starts_with(&prefix)))
}

fn ends_with(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let suffix: Vec<char> = string_arg(interp, args, 0)?.chars().collect();
    let end = integer_arg(interp, args, 1, chars.len() as f64)?.clamp(0.0, chars.len() as f64) as usize;
    Ok(Value::Bool(chars[..end].ends_with(&suffix)))
}

// ── Extraction ───────────────────────────────────────────────────────────────

fn slice(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let len = chars.len();
    let start = relative_index(integer_arg(interp, args, 0, 0.0)?, len);
    let end = relative_index(integer_arg(interp, args, 1, len as f64)?, len);
    Ok(collect(chars.get(start..end.max(start)).unwrap_or_default()))
}

fn substring(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let len = chars.len() as f64;
    let a = integer_arg(interp, args, 0, 0.0)?.clamp(0.0, len) as usize;
    let b = integer_arg(interp, args, 1, len)?.clamp(0.0, len) as usize;
    Ok(collect(&chars[a.min(b)..a.max(b)]))
}

fn substr(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars_of(interp, this)?;
    let len = chars.len();
    let start = relative_index(integer_arg(interp, args, 0, 0.0)?, len);
    let count = integer_arg(interp, args, 1, len as f64)?.clamp(0.0, (len - start) as f64) as usize;
    Ok(collect(&chars[start..start + count]))
}

fn concat(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = this_string(interp, this)?;
    for value in args {
        out.push_str(&interp.to_string(value)?);
    }
    Ok(Value::from(out))
}

fn split(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = this_string(interp, this)?;
    let limit = match args.get(1) {
        None | Some(Value::Undefined) => usize::MAX,
        Some(value) => interp.to_number(value)?.max(0.0) as usize,
    };
    let parts: Vec<Value> = match arg(args, 0) {
        Value::Undefined => vec![Value::from(text)],
        separator => {
            let separator = interp.to_string(&separator)?;
            if separator.is_empty() {
                text.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                text.split(separator.as_str()).map(Value::from).collect()
            }
        }
    };
    interp.charge(parts.len() as u64)?;
    Ok(Value::array(parts.into_iter().take(limit).collect()))
}

// ── Transformation ───────────────────────────────────────────────────────────

fn to_upper_case(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(this_string(interp, this)?.to_uppercase()))
}

fn to_lower_case(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(this_string(interp, this)?.to_lowercase()))
}

fn trim(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(this_string(interp, this)?.trim_matches(is_js_whitespace)))
}

fn trim_start(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(
        this_string(interp, this)?.trim_start_matches(is_js_whitespace),
    ))
}

fn trim_end(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(
        this_string(interp, this)?.trim_end_matches(is_js_whitespace),
    ))
}

/// Filler of `width` chars cycled from `fill`.
fn padding(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<(String, String)> {
    let text = this_string(interp, this)?;
    let target = integer_arg(interp, args, 0, 0.0)?;
    let fill = match arg(args, 1) {
        Value::Undefined => " ".to_string(),
        value => interp.to_string(&value)?,
    };
    let len = text.chars().count();
    if target <= len as f64 || fill.is_empty() {
        return Ok((text, String::new()));
    }
    let width = target as usize - len;
    interp.charge(width as u64)?;
    let pad: String = fill.chars().cycle().take(width).collect();
    Ok((text, pad))
}

fn pad_start(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (text, pad) = padding(interp, this, args)?;
    Ok(Value::from(pad + &text))
}

fn pad_end(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (text, pad) = padding(interp, this, args)?;
    Ok(Value::from(text + &pad))
}

fn repeat(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = this_string(interp, this)?;
    let count = interp.to_number(&arg(args, 0))?;
    let count = to_integer(count);
    if count < 0.0 || count.is_infinite() {
        return Err(EvalError::range_error(format!(
            "Invalid count value: {}",
            Value::Number(count)
        )));
    }
    let total = text.chars().count() as f64 * count;
    interp.charge(total as u64)?;
    Ok(Value::from(text.repeat(count as usize)))
}

/// Replacement text for one match: a function is called with
/// `(match, offset, string)`, anything else is stringified with `$&`
/// expanded.
fn replacement(
    interp: &mut Interpreter,
    replacer: &Value,
    matched: &str,
    offset: usize,
    text: &str,
) -> EvalResult<String> {
    if replacer.is_function() {
        let result = interp.call(
            replacer,
            Value::Undefined,
            &[
                Value::from(matched),
                Value::Number(offset as f64),
                Value::from(text),
            ],
        )?;
        return interp.to_string(&result);
    }
    Ok(interp.to_string(replacer)?.replace("$&", matched))
}

fn replace_matches(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    all: bool,
) -> EvalResult<Value> {
    let text = this_string(interp, this)?;
    let pattern = string_arg(interp, args, 0)?;
    let replacer = arg(args, 1);

    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut cursor = 0;
    while let Some(found) = find_from(&chars, &needle, cursor) {
        interp.tick()?;
        out.extend(&chars[cursor..found]);
        out.push_str(&replacement(interp, &replacer, &pattern, found, &text)?);
        if needle.is_empty() {
            if let Some(c) = chars.get(found) {
                out.push(*c);
            }
            cursor = found + 1;
        } else {
            cursor = found + needle.len();
        }
        if !all || cursor > chars.len() {
            break;
        }
    }
    if cursor <= chars.len() {
        out.extend(&chars[cursor..]);
    }
    Ok(Value::from(out))
}

fn replace(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    replace_matches(interp, this, args, false)
}

fn replace_all(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    replace_matches(interp, this, args, true)
}

fn locale_compare(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = this_string(interp, this)?;
    let other = string_arg(interp, args, 0)?;
    let ordering = text
        .to_lowercase()
        .cmp(&other.to_lowercase())
        .then_with(|| other.cmp(&text));
    Ok(Value::Number(ordering as i8 as f64))
}

fn value_of(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(this_string(interp, this)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn find_from_counts_chars() {
        assert_eq!(find_from(&chars("héllo"), &chars("llo"), 0), Some(2));
        assert_eq!(find_from(&chars("abcabc"), &chars("abc"), 1), Some(3));
        assert_eq!(find_from(&chars("abc"), &chars("x"), 0), None);
    }

    #[test]
    fn empty_needle_matches_at_start_position() {
        assert_eq!(find_from(&chars("abc"), &[], 2), Some(2));
        assert_eq!(find_from(&chars("abc"), &[], 10), Some(3));
    }
}
