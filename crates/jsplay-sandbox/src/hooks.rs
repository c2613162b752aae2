//! Mock React hooks.
//!
//! No component ever renders: each hook reports what it was called with
//! into the run's log and returns something shaped like the real hook's
//! result, so tutorial snippets run top to bottom without a renderer.

use jsplay_eval::{EvalError, EvalResult, Interpreter, Value};

use crate::console::LogBuffer;

/// The five hook functions, bound to one run's log.
#[derive(Debug, Clone)]
pub struct Hooks {
    pub use_state: Value,
    pub use_effect: Value,
    pub use_ref: Value,
    pub use_callback: Value,
    pub use_memo: Value,
}

impl Hooks {
    pub fn new(log: &LogBuffer) -> Self {
        Self {
            use_state: use_state(log.clone()),
            use_effect: use_effect(log.clone()),
            use_ref: Value::native("useRef", |_, _this, args| {
                let initial = args.first().cloned().unwrap_or_default();
                Ok(Value::object_from(vec![("current".to_string(), initial)]))
            }),
            use_callback: use_callback(log.clone()),
            use_memo: use_memo(log.clone()),
        }
    }

    /// `(name, hook)` pairs in context order.
    pub fn entries(&self) -> [(&'static str, Value); 5] {
        [
            ("useState", self.use_state.clone()),
            ("useEffect", self.use_effect.clone()),
            ("useRef", self.use_ref.clone()),
            ("useCallback", self.use_callback.clone()),
            ("useMemo", self.use_memo.clone()),
        ]
    }

    /// The `React` namespace object carrying the same five hooks.
    pub fn react_object(&self) -> Value {
        Value::object_from(
            self.entries()
                .into_iter()
                .map(|(name, hook)| (name.to_string(), hook))
                .collect(),
        )
    }
}

/// `JSON.stringify` form used in hook log lines; values with no JSON form
/// print as `undefined`.
fn json_text(interp: &mut Interpreter, value: &Value) -> EvalResult<String> {
    Ok(interp
        .json_stringify(value)?
        .unwrap_or_else(|| "undefined".to_string()))
}

fn deps_line(interp: &mut Interpreter, hook: &str, deps: &Value) -> EvalResult<String> {
    Ok(format!(
        "{hook} called with deps: {}",
        json_text(interp, deps)?
    ))
}

fn use_state(log: LogBuffer) -> Value {
    Value::native("useState", move |_, _this, args| {
        let initial = args.first().cloned().unwrap_or_default();
        let log = log.clone();
        let setter = Value::native("setState", move |interp, _this, args| {
            let next = args.first().cloned().unwrap_or_default();
            log.push(format!("State updated: {}", json_text(interp, &next)?));
            Ok(Value::Undefined)
        });
        Ok(Value::array(vec![initial, setter]))
    })
}

fn use_effect(log: LogBuffer) -> Value {
    Value::native("useEffect", move |interp, _this, args| {
        let callback = args.first().cloned().unwrap_or_default();
        let deps = args.get(1).cloned().unwrap_or_default();
        log.push(deps_line(interp, "useEffect", &deps)?);

        if !callback.is_function() {
            log.push("useEffect error: callback is not a function");
            return Ok(Value::Undefined);
        }
        match interp.call(&callback, Value::Undefined, &[]) {
            Ok(cleanup) if cleanup.is_function() => log.push("Cleanup function returned"),
            Ok(_) => {}
            Err(EvalError::StepLimit) => return Err(EvalError::StepLimit),
            Err(err) => log.push(format!("useEffect error: {}", err.message())),
        }
        Ok(Value::Undefined)
    })
}

fn use_callback(log: LogBuffer) -> Value {
    Value::native("useCallback", move |interp, _this, args| {
        let callback = args.first().cloned().unwrap_or_default();
        let deps = args.get(1).cloned().unwrap_or_default();
        log.push(deps_line(interp, "useCallback", &deps)?);
        Ok(callback)
    })
}

fn use_memo(log: LogBuffer) -> Value {
    Value::native("useMemo", move |interp, _this, args| {
        let factory = args.first().cloned().unwrap_or_default();
        let deps = args.get(1).cloned().unwrap_or_default();
        log.push(deps_line(interp, "useMemo", &deps)?);
        if !factory.is_function() {
            return Err(EvalError::type_error("factory is not a function"));
        }
        interp.call(&factory, Value::Undefined, &[])
    })
}
