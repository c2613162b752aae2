//! `Date`, backed by `chrono`. All calendar fields are in UTC; the local
//! time zone of the host is never consulted.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use super::{arg, attach, lookup, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::value::{ObjectKind, Value};
use crate::Interpreter;

/// Largest time value a `Date` can hold, in milliseconds.
const MAX_TIME: f64 = 8.64e15;

const STATICS: &[(&str, Builtin)] = &[("now", date_now), ("parse", date_parse), ("UTC", date_utc)];

const METHODS: &[(&str, Builtin)] = &[
    ("getTime", get_time),
    ("valueOf", get_time),
    ("getFullYear", get_full_year),
    ("getUTCFullYear", get_full_year),
    ("getMonth", get_month),
    ("getUTCMonth", get_month),
    ("getDate", get_date),
    ("getUTCDate", get_date),
    ("getDay", get_day),
    ("getUTCDay", get_day),
    ("getHours", get_hours),
    ("getUTCHours", get_hours),
    ("getMinutes", get_minutes),
    ("getUTCMinutes", get_minutes),
    ("getSeconds", get_seconds),
    ("getUTCSeconds", get_seconds),
    ("getMilliseconds", get_milliseconds),
    ("getUTCMilliseconds", get_milliseconds),
    ("getTimezoneOffset", get_timezone_offset),
    ("toISOString", to_iso_string),
    ("toJSON", to_json),
    ("toString", to_string),
    ("toDateString", to_date_string),
    ("toTimeString", to_time_string),
    ("toLocaleString", to_locale_string),
    ("toLocaleDateString", to_locale_date_string),
    ("toLocaleTimeString", to_locale_time_string),
];

pub(crate) fn constructor() -> Value {
    let date = Value::native_constructor(
        "Date",
        |_, _, _| Ok(Value::from(date_string(now()))),
        construct,
    );
    attach(&date, STATICS);
    date
}

pub(crate) fn method(key: &str) -> Option<Value> {
    lookup(METHODS, key)
}

fn now() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// TimeClip: out-of-range or non-finite times become an invalid date.
fn time_clip(time: f64) -> f64 {
    if !time.is_finite() || time.abs() > MAX_TIME {
        f64::NAN
    } else {
        time.trunc() + 0.0
    }
}

fn datetime(time: f64) -> Option<DateTime<Utc>> {
    if time.is_nan() {
        return None;
    }
    Utc.timestamp_millis_opt(time as i64).single()
}

/// What `String(date)` prints.
pub(crate) fn date_string(time: f64) -> String {
    match datetime(time) {
        Some(dt) => dt
            .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
            .to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// Parse the string forms `new Date(text)` accepts: RFC 3339 timestamps,
/// `YYYY-MM-DD`, and date-times without an offset (read as UTC).
pub(crate) fn parse_date(text: &str) -> f64 {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.timestamp_millis() as f64;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Utc.from_utc_datetime(&midnight).timestamp_millis() as f64;
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Utc.from_utc_datetime(&naive).timestamp_millis() as f64;
        }
    }
    f64::NAN
}

/// MakeDate from calendar fields; months outside 0..12 roll the year.
fn make_time(fields: &[f64]) -> f64 {
    if fields.iter().any(|f| !f.is_finite()) {
        return f64::NAN;
    }
    let field = |i: usize, default: f64| fields.get(i).copied().unwrap_or(default).trunc();
    let mut year = field(0, f64::NAN);
    if year.is_nan() {
        return f64::NAN;
    }
    if (0.0..=99.0).contains(&year) {
        year += 1900.0;
    }
    let month = field(1, 0.0);
    let year = year + (month / 12.0).floor();
    let month = month.rem_euclid(12.0);
    let Some(first) = NaiveDate::from_ymd_opt(year as i32, month as u32 + 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return f64::NAN;
    };
    let base = Utc.from_utc_datetime(&first).timestamp_millis() as f64;
    base + (field(2, 1.0) - 1.0) * 86_400_000.0
        + field(3, 0.0) * 3_600_000.0
        + field(4, 0.0) * 60_000.0
        + field(5, 0.0) * 1_000.0
        + field(6, 0.0)
}

fn construct(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let time = match args {
        [] => now(),
        [Value::String(text)] => parse_date(text),
        [single] => {
            let existing = single.as_object().and_then(|o| match o.borrow().kind {
                ObjectKind::Date(t) => Some(t),
                _ => None,
            });
            match existing {
                Some(t) => t,
                None => interp.to_number(single)?,
            }
        }
        fields => {
            let mut numbers = Vec::with_capacity(fields.len());
            for field in fields.iter().take(7) {
                numbers.push(interp.to_number(field)?);
            }
            make_time(&numbers)
        }
    };
    Ok(Value::date(time_clip(time)))
}

fn date_now(_: &mut Interpreter, _this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(now()))
}

fn date_parse(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = interp.to_string(&arg(args, 0))?;
    Ok(Value::Number(time_clip(parse_date(&text))))
}

fn date_utc(interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut numbers = Vec::with_capacity(args.len());
    for field in args.iter().take(7) {
        numbers.push(interp.to_number(field)?);
    }
    Ok(Value::Number(time_clip(make_time(&numbers))))
}

// ── Prototype methods ────────────────────────────────────────────────────────

fn this_time(this: &Value) -> EvalResult<f64> {
    this.as_object()
        .and_then(|o| match o.borrow().kind {
            ObjectKind::Date(t) => Some(t),
            _ => None,
        })
        .ok_or_else(|| EvalError::type_error("this is not a Date object."))
}

/// Apply `field` to the date, or return `NaN` for an invalid one.
fn field_of(this: &Value, field: impl Fn(&DateTime<Utc>) -> f64) -> EvalResult<Value> {
    let time = this_time(this)?;
    Ok(Value::Number(datetime(time).map_or(f64::NAN, |dt| field(&dt))))
}

fn format_with(this: &Value, format: &str) -> EvalResult<Value> {
    let time = this_time(this)?;
    Ok(Value::from(match datetime(time) {
        Some(dt) => dt.format(format).to_string(),
        None => "Invalid Date".to_string(),
    }))
}

fn get_time(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(this_time(this)?))
}

fn get_full_year(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.year()))
}

fn get_month(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.month0()))
}

fn get_date(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.day()))
}

fn get_day(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.weekday().num_days_from_sunday()))
}

fn get_hours(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.hour()))
}

fn get_minutes(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.minute()))
}

fn get_seconds(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.second()))
}

fn get_milliseconds(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |dt| f64::from(dt.timestamp_subsec_millis()))
}

fn get_timezone_offset(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    field_of(this, |_| 0.0)
}

fn to_iso_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    let time = this_time(this)?;
    match datetime(time) {
        Some(dt) => Ok(Value::from(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())),
        None => Err(EvalError::range_error("Invalid time value")),
    }
}

fn to_json(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    if this_time(this)?.is_nan() {
        return Ok(Value::Null);
    }
    to_iso_string(interp, this, args)
}

fn to_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(date_string(this_time(this)?)))
}

fn to_date_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    format_with(this, "%a %b %d %Y")
}

fn to_time_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    format_with(this, "%H:%M:%S GMT+0000 (Coordinated Universal Time)")
}

fn to_locale_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    format_with(this, "%-m/%-d/%Y, %-I:%M:%S %p")
}

fn to_locale_date_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    format_with(this, "%-m/%-d/%Y")
}

fn to_locale_time_string(_: &mut Interpreter, this: &Value, _args: &[Value]) -> EvalResult<Value> {
    format_with(this, "%-I:%M:%S %p")
}
