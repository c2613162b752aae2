//! Built-in library tests: JSON, Math, Date, Array, Object, String,
//! Number, Boolean and the Error family.

use jsplay_eval::{EvalError, Interpreter, Limits, Value};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn run(source: &str) -> Value {
    let mut interp = Interpreter::new(Limits::default());
    match interp.run_script(source) {
        Ok(value) => value,
        Err(err) => panic!("script failed: {err}\n{source}"),
    }
}

/// Evaluate one expression and render it with `String(v)` semantics.
fn eval(expr: &str) -> String {
    run(&format!("return {expr};")).to_display_string()
}

fn eval_err(expr: &str) -> EvalError {
    let mut interp = Interpreter::new(Limits::default());
    match interp.run_script(&format!("return {expr};")) {
        Ok(value) => panic!("expected an error, got {value:?}\n{expr}"),
        Err(err) => err,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// JSON
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn json_stringify_compact() {
    assert_eq!(
        eval("JSON.stringify({ b: 1, a: [1, 'x', null, undefined], f() {}, u: undefined })"),
        r#"{"b":1,"a":[1,"x",null,null]}"#
    );
    assert_eq!(eval("JSON.stringify('he said \"hi\"')"), r#""he said \"hi\"""#);
    assert_eq!(eval("JSON.stringify([NaN, Infinity, 1.5, -0])"), "[null,null,1.5,0]");
    assert_eq!(eval("String(JSON.stringify(undefined))"), "undefined");
    assert_eq!(eval("String(JSON.stringify(() => 1))"), "undefined");
}

#[test]
fn json_stringify_pretty() {
    assert_eq!(
        eval("JSON.stringify({ a: 1, b: [1, 2] }, null, 2)"),
        "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ]\n}"
    );
    assert_eq!(eval("JSON.stringify([1], null, '--')"), "[\n--1\n]");
}

#[test]
fn json_stringify_replacers_and_to_json() {
    assert_eq!(
        eval("JSON.stringify({ a: 1, b: 2, c: 3 }, ['a', 'c'])"),
        r#"{"a":1,"c":3}"#
    );
    assert_eq!(
        eval("JSON.stringify({ a: 1, b: 'x' }, (k, v) => typeof v === 'number' ? v * 10 : v)"),
        r#"{"a":10,"b":"x"}"#
    );
    assert_eq!(
        eval("JSON.stringify({ when: { toJSON() { return 'now'; } } })"),
        r#"{"when":"now"}"#
    );
    assert_eq!(eval("JSON.stringify(new Date(0))"), r#""1970-01-01T00:00:00.000Z""#);
}

#[test]
fn json_stringify_rejects_cycles() {
    let mut interp = Interpreter::new(Limits::default());
    let err = interp
        .run_script("const o = {}; o.self = o; return JSON.stringify(o);")
        .unwrap_err();
    assert_eq!(err.message(), "Converting circular structure to JSON");
}

#[test]
fn json_stringify_limits_nesting_depth() {
    let nested = |depth: usize| {
        format!(
            "(() => {{ let a = []; for (let i = 0; i < {depth}; i++) a = [a]; \
             try {{ return JSON.stringify(a).length; }} catch (e) {{ return e.name + ': ' + e.message; }} }})()"
        )
    };
    assert_eq!(eval(&nested(100)), "202");
    assert_eq!(
        eval(&nested(2_000)),
        "RangeError: Maximum call stack size exceeded"
    );
}

#[test]
fn string_conversion_limits_nesting_depth() {
    assert_eq!(
        eval("(() => { let a = [1]; for (let i = 0; i < 2000; i++) a = [a]; try { return String(a); } catch (e) { return e.name; } })()"),
        "RangeError"
    );
    assert_eq!(
        eval("(() => { let a = [1]; for (let i = 0; i < 100; i++) a = [a]; return String(a); })()"),
        "1"
    );
}

#[test]
fn long_chains_drop_cleanly() {
    let limits = Limits {
        gas_limit: 20_000_000,
        ..Limits::default()
    };
    let mut interp = Interpreter::new(limits);
    let value = interp
        .run_script("let n = null; for (let i = 0; i < 100000; i++) n = { v: i, next: n }; return n;")
        .unwrap();
    drop(interp);
    assert!(value.as_object().is_some());
    drop(value);
}

#[test]
fn json_parse() {
    assert_eq!(eval(r#"JSON.parse('{"x":[1,2,{"y":true}]}').x[2].y"#), "true");
    assert_eq!(eval(r#"Object.keys(JSON.parse('{"z":1,"a":2}')).join()"#), "z,a");
    let err = eval_err("JSON.parse('{bad')");
    assert!(err.to_string().starts_with("Uncaught SyntaxError"), "{err}");
}

// ══════════════════════════════════════════════════════════════════════════════
// Math
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn math_functions() {
    assert_eq!(eval("Math.max(1, 5, 3)"), "5");
    assert_eq!(eval("Math.max()"), "-Infinity");
    assert_eq!(eval("Math.min(2, '1')"), "1");
    assert_eq!(eval("Math.round(-2.5)"), "-2");
    assert_eq!(eval("Math.round(2.5)"), "3");
    assert_eq!(eval("Math.floor(-1.5)"), "-2");
    assert_eq!(eval("Math.abs(-3)"), "3");
    assert_eq!(eval("Math.pow(2, 8)"), "256");
    assert_eq!(eval("Math.hypot(3, 4)"), "5");
    assert_eq!(eval("Math.PI.toFixed(4)"), "3.1416");
}

#[test]
fn math_random_is_in_unit_interval() {
    for _ in 0..100 {
        let Value::Number(n) = run("return Math.random();") else {
            panic!("Math.random did not return a number");
        };
        assert!((0.0..1.0).contains(&n));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Date
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn dates_are_utc() {
    assert_eq!(eval("new Date(0).toISOString()"), "1970-01-01T00:00:00.000Z");
    assert_eq!(eval("new Date(Date.UTC(2024, 0, 15)).getUTCDate()"), "15");
    assert_eq!(eval("new Date(Date.UTC(2024, 1, 29, 13, 5)).getHours()"), "13");
    assert_eq!(eval("new Date('2024-03-01T12:00:00Z').getMonth()"), "2");
    assert_eq!(eval("new Date(0).getDay()"), "4");
}

#[test]
fn date_now_is_a_timestamp() {
    let Value::Number(now) = run("return Date.now();") else {
        panic!("Date.now did not return a number");
    };
    // 2020-01-01T00:00:00Z
    assert!(now > 1_577_836_800_000.0);
    assert_eq!(eval("typeof new Date().getTime()"), "number");
}

#[test]
fn invalid_dates() {
    assert_eq!(eval("new Date('not a date').getTime()"), "NaN");
    let err = eval_err("new Date('not a date').toISOString()");
    assert_eq!(err.message(), "Invalid time value");
}

// ══════════════════════════════════════════════════════════════════════════════
// Array
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn array_statics() {
    assert_eq!(eval("Array.isArray([])"), "true");
    assert_eq!(eval("Array.isArray({})"), "false");
    assert_eq!(eval("Array.from('abc').join('-')"), "a-b-c");
    assert_eq!(eval("Array.from({ length: 3 }, (_, i) => i * 2).join()"), "0,2,4");
    assert_eq!(eval("Array.of(7, 8).length"), "2");
    assert_eq!(eval("new Array(3).length"), "3");
    assert_eq!(eval("Array(1, 2).join()"), "1,2");
}

#[test]
fn array_mutators() {
    let source = r#"
const a = [1, 2, 3];
const pushed = a.push(4, 5);
const popped = a.pop();
const shifted = a.shift();
a.unshift(0);
const removed = a.splice(1, 2, 'x');
return [pushed, popped, shifted, a.join(), removed.join()].join('|');
"#;
    assert_eq!(run(source).to_display_string(), "5|5|1|0,x,4|2,3");
}

#[test]
fn array_length_writes() {
    assert_eq!(eval("(() => { const a = [1, 2, 3]; a.length = 1; return a.join(); })()"), "1");
    assert_eq!(eval("(() => { const a = []; a[2] = 'z'; return a.length; })()"), "3");
}

#[test]
fn array_sort() {
    assert_eq!(eval("[3, 1, 2].sort().join()"), "1,2,3");
    assert_eq!(eval("[10, 9, 1].sort().join()"), "1,10,9");
    assert_eq!(eval("[10, 9, 1].sort((a, b) => a - b).join()"), "1,9,10");
    assert_eq!(eval("[undefined, 2, 1].sort().map(String).join()"), "1,2,undefined");
    assert_eq!(
        eval("[{ k: 1, v: 'a' }, { k: 0, v: 'b' }, { k: 1, v: 'c' }].sort((x, y) => x.k - y.k).map(o => o.v).join('')"),
        "bac"
    );
}

#[test]
fn array_searching() {
    assert_eq!(eval("[1, 2, 3].indexOf(2)"), "1");
    assert_eq!(eval("[1, 2, 1].lastIndexOf(1)"), "2");
    assert_eq!(eval("[NaN].includes(NaN)"), "true");
    assert_eq!(eval("[NaN].indexOf(NaN)"), "-1");
    assert_eq!(eval("[5, 12, 8].find(n => n > 6)"), "12");
    assert_eq!(eval("[5, 12, 8].findIndex(n => n > 100)"), "-1");
    assert_eq!(eval("[5, 12, 8].findLast(n => n > 6)"), "8");
    assert_eq!(eval("[1, 2, 3].at(-1)"), "3");
    assert_eq!(eval("[1, 2, 3].some(n => n > 2)"), "true");
    assert_eq!(eval("[1, 2, 3].every(n => n > 2)"), "false");
}

#[test]
fn array_transformations() {
    assert_eq!(eval("[1, 2, 3, 4].filter(n => n % 2).map(n => n * 10).join()"), "10,30");
    assert_eq!(eval("[1, 2, 3, 4].reduce((a, b) => a + b)"), "10");
    assert_eq!(eval("['a', 'b'].reduceRight((acc, s) => acc + s, '')"), "ba");
    assert_eq!(eval("[1, [2, [3, [4]]]].flat().length"), "3");
    assert_eq!(eval("[1, [2, [3, [4]]]].flat(Infinity).join()"), "1,2,3,4");
    assert_eq!(eval("[1, 2].flatMap(n => [n, n]).join()"), "1,1,2,2");
    assert_eq!(eval("[1, 2, 3].slice(-2).join()"), "2,3");
    assert_eq!(eval("[1].concat([2, 3], 4).join()"), "1,2,3,4");
    assert_eq!(eval("new Array(3).fill(0).join()"), "0,0,0");
    assert_eq!(eval("[1, 2, 3].reverse().join()"), "3,2,1");
    assert_eq!(eval("[[1, 2], [3]].join(';')"), "1,2;3");
    assert_eq!(eval("[null, undefined, 1].join('-')"), "--1");
    assert_eq!(eval("[...['a', 'b'].entries()].map(e => e.join(':')).join()"), "0:a,1:b");
}

#[test]
fn array_callbacks_read_the_live_array() {
    assert_eq!(
        eval("(() => { const a = [1, 2, 3]; return a.filter(x => { a.pop(); return true; }).join(); })()"),
        "1,2"
    );
    assert_eq!(
        eval("(() => { const a = [1, 2, 3]; return a.map(x => { a.pop(); return x * 10; }).join(); })()"),
        "10,20,"
    );
    assert_eq!(
        eval("(() => { const a = [1, 2, 3, 4]; return a.reduce((s, x) => { a.pop(); return s + x; }, 0); })()"),
        "3"
    );
    assert_eq!(
        eval("(() => { const a = [1]; let n = 0; a.forEach(() => { a.push(0); n++; }); return n; })()"),
        "1"
    );
    assert_eq!(
        eval("(() => { const a = [1, 2, 3]; return a.find((x, i) => { a[2] = 9; return x > 2; }); })()"),
        "9"
    );
}

#[test]
fn reduce_of_empty_array_without_initial_value() {
    let err = eval_err("[].reduce((a, b) => a + b)");
    assert_eq!(err.message(), "Reduce of empty array with no initial value");
}

#[test]
fn callbacks_must_be_functions() {
    let err = eval_err("[1].map(42)");
    assert_eq!(err.message(), "42 is not a function");
}

// ══════════════════════════════════════════════════════════════════════════════
// Object
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn object_statics() {
    assert_eq!(eval("Object.keys({ b: 1, a: 2, 1: 'x' }).join()"), "1,b,a");
    assert_eq!(eval("Object.values({ a: 1, b: 2 }).join()"), "1,2");
    assert_eq!(eval("Object.entries({ a: 1 }).join()"), "a,1");
    assert_eq!(
        eval("JSON.stringify(Object.assign({}, { a: 1 }, null, { b: 2 }))"),
        r#"{"a":1,"b":2}"#
    );
    assert_eq!(
        eval("JSON.stringify(Object.fromEntries([['x', 1], ['y', 2]]))"),
        r#"{"x":1,"y":2}"#
    );
    assert_eq!(eval("Object.keys('ab').join()"), "0,1");
}

#[test]
fn frozen_objects_ignore_writes() {
    assert_eq!(
        eval("(() => { const o = Object.freeze({ a: 1 }); o.a = 2; o.b = 3; return [o.a, o.b, Object.isFrozen(o)].join(); })()"),
        "1,,true"
    );
}

#[test]
fn object_create_sets_the_prototype() {
    assert_eq!(
        eval("(() => { const base = { hi() { return 'hi ' + this.name; } }; const o = Object.create(base); o.name = 'kim'; return o.hi(); })()"),
        "hi kim"
    );
}

#[test]
fn keys_of_nullish_values_throw() {
    let err = eval_err("Object.keys(null)");
    assert_eq!(err.message(), "Cannot convert undefined or null to object");
}

#[test]
fn object_prototype_methods() {
    assert_eq!(eval("({ a: 1 }).hasOwnProperty('a')"), "true");
    assert_eq!(eval("({ a: 1 }).hasOwnProperty('toString')"), "false");
    assert_eq!(eval("({}).toString()"), "[object Object]");
    assert_eq!(eval("'a' in { a: undefined }"), "true");
}

// ══════════════════════════════════════════════════════════════════════════════
// String
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn string_methods() {
    assert_eq!(eval("'Hello'.padStart(8, '*')"), "***Hello");
    assert_eq!(eval("'5'.padEnd(3, '0')"), "500");
    assert_eq!(eval("'a-b-c'.split('-').reverse().join('+')"), "c+b+a");
    assert_eq!(eval("'abc'.split('').length"), "3");
    assert_eq!(eval("'abc'.at(-1)"), "c");
    assert_eq!(eval("'  x  '.trim() + '|'"), "x|");
    assert_eq!(eval("'aXbX'.replace('X', '_')"), "a_bX");
    assert_eq!(eval("'aXbX'.replaceAll('X', '_')"), "a_b_");
    assert_eq!(eval("'abc'.replace('b', m => m.toUpperCase())"), "aBc");
    assert_eq!(eval("'ab'.repeat(3)"), "ababab");
    assert_eq!(eval("'Hello'.slice(-3)"), "llo");
    assert_eq!(eval("'Hello'.substring(3, 1)"), "el");
    assert_eq!(eval("'Hello'.toUpperCase()"), "HELLO");
    assert_eq!(eval("'Hello'.indexOf('l')"), "2");
    assert_eq!(eval("'Hello'.lastIndexOf('l')"), "3");
    assert_eq!(eval("'Hello'.includes('ell')"), "true");
    assert_eq!(eval("'Hello'.startsWith('He')"), "true");
    assert_eq!(eval("'Hello'.endsWith('lo')"), "true");
    assert_eq!(eval("'abc'.charCodeAt(1)"), "98");
    assert_eq!(eval("String.fromCharCode(72, 105)"), "Hi");
}

#[test]
fn strings_count_characters() {
    assert_eq!(eval("'한글'.length"), "2");
    assert_eq!(eval("'한글'[1]"), "글");
    assert_eq!(eval("[...'héllo'].length"), "5");
}

#[test]
fn string_conversion() {
    assert_eq!(eval("String(123)"), "123");
    assert_eq!(eval("String(null)"), "null");
    assert_eq!(eval("String([1, [2, 3]])"), "1,2,3");
    assert_eq!(eval("String({ toString() { return 'custom'; } })"), "custom");
    assert_eq!(eval("String(new TypeError('bad'))"), "TypeError: bad");
}

#[test]
fn invalid_repeat_count() {
    let err = eval_err("'a'.repeat(-1)");
    assert_eq!(err.to_string(), "Uncaught RangeError: Invalid count value: -1");
}

// ══════════════════════════════════════════════════════════════════════════════
// Number and Boolean
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn number_statics() {
    assert_eq!(eval("Number('42')"), "42");
    assert_eq!(eval("Number('12px')"), "NaN");
    assert_eq!(eval("Number('')"), "0");
    assert_eq!(eval("Number(true)"), "1");
    assert_eq!(eval("Number.isInteger(5)"), "true");
    assert_eq!(eval("Number.isInteger('5')"), "false");
    assert_eq!(eval("Number.isNaN('x')"), "false");
    assert_eq!(eval("isNaN('x')"), "true");
    assert_eq!(eval("Number.parseFloat('3.5kg')"), "3.5");
    assert_eq!(eval("parseInt('12px')"), "12");
    assert_eq!(eval("parseInt('ff', 16)"), "255");
    assert_eq!(eval("Number.MAX_SAFE_INTEGER"), "9007199254740991");
}

#[test]
fn number_formatting_methods() {
    assert_eq!(eval("(1.005).toFixed(2)"), "1.00");
    assert_eq!(eval("(2.5).toFixed(0)"), "3");
    assert_eq!(eval("(1234.5678).toFixed(1)"), "1234.6");
    assert_eq!(eval("(255).toString(16)"), "ff");
    assert_eq!(eval("(255).toString(2)"), "11111111");
    assert_eq!(eval("(123.456).toPrecision(4)"), "123.5");
    assert_eq!(eval("(0.00001234).toPrecision(2)"), "0.000012");
    assert_eq!(eval("(1234567.891).toLocaleString()"), "1,234,567.891");
}

#[test]
fn to_fixed_range() {
    let err = eval_err("(1).toFixed(101)");
    assert_eq!(err.message(), "toFixed() digits argument must be between 0 and 100");
}

#[test]
fn booleans() {
    assert_eq!(eval("Boolean('')"), "false");
    assert_eq!(eval("Boolean('0')"), "true");
    assert_eq!(eval("Boolean([])"), "true");
    assert_eq!(eval("true.toString()"), "true");
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn error_constructors() {
    assert_eq!(eval("new Error('x').message"), "x");
    assert_eq!(eval("new RangeError('r').name"), "RangeError");
    assert_eq!(eval("Error('no new').message"), "no new");
    assert_eq!(eval("new TypeError('t') instanceof TypeError"), "true");
    assert_eq!(eval("new TypeError('t') instanceof Error"), "true");
    assert_eq!(eval("new Error('e') instanceof TypeError"), "false");
    assert_eq!(eval("String(new Error())"), "Error");
}

#[test]
fn constructor_property_names_the_builtin() {
    assert_eq!(eval("({}).constructor === Object"), "true");
    assert_eq!(eval("[].constructor === Array"), "true");
    assert_eq!(eval("new Date(0).constructor === Date"), "true");
    assert_eq!(eval("new TypeError('t').constructor === TypeError"), "true");
    assert_eq!(eval("'s'.constructor === String"), "true");
    assert_eq!(eval("(1).constructor === Number"), "true");
    assert_eq!(eval("true.constructor === Boolean"), "true");
    assert_eq!(
        eval("(() => { function Foo() {} return new Foo().constructor === Foo && Foo.prototype.constructor === Foo; })()"),
        "true"
    );
}

#[test]
fn user_errors_can_carry_extra_fields() {
    assert_eq!(
        eval("(() => { try { const e = new Error('m'); e.code = 7; throw e; } catch (err) { return err.code + err.message; } })()"),
        "7m"
    );
}
