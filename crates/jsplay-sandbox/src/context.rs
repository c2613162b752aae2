//! The execution context: the fixed set of names a snippet can see.

use std::rc::Rc;

use jsplay_eval::{Interpreter, Value};

use crate::console::{HostConsole, LogBuffer};
use crate::hooks::Hooks;
use crate::timers::{timer_bindings, TimerHost};

/// Context names, in the order they are bound as parameters.
pub const CONTEXT_NAMES: [&str; 19] = [
    "console",
    "React",
    "useState",
    "useEffect",
    "useRef",
    "useCallback",
    "useMemo",
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "JSON",
    "Math",
    "Date",
    "Array",
    "Object",
    "String",
    "Number",
    "Boolean",
];

/// Built-ins passed through from the interpreter's globals unchanged.
const PASS_THROUGH: [&str; 8] = [
    "JSON", "Math", "Date", "Array", "Object", "String", "Number", "Boolean",
];

/// Name/value bindings for one run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    bindings: Vec<(&'static str, Value)>,
}

impl ExecutionContext {
    /// Assemble the context for a run whose hooks write to `log`.
    ///
    /// `console` in the context forwards to `host` at call time, so a
    /// callback that outlives the run prints wherever `host` points by then.
    pub fn build(
        interp: &Interpreter,
        host: &HostConsole,
        timers: &Rc<dyn TimerHost>,
        log: &LogBuffer,
    ) -> Self {
        let hooks = Hooks::new(log);
        let mut bindings = Vec::with_capacity(CONTEXT_NAMES.len());
        bindings.push(("console", console_object(host)));
        bindings.push(("React", hooks.react_object()));
        bindings.extend(hooks.entries());
        bindings.extend(timer_bindings(timers));
        for name in PASS_THROUGH {
            let value = interp.globals().get(name).unwrap_or_default();
            bindings.push((name, value));
        }
        Self { bindings }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.bindings.iter().map(|(name, _)| *name).collect()
    }

    /// Values in binding order, ready to pass as arguments.
    pub fn values(&self) -> Vec<Value> {
        self.bindings.iter().map(|(_, value)| value.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// `console.log` and `console.error`: arguments joined with single spaces.
fn console_object(host: &HostConsole) -> Value {
    let log_host = host.clone();
    let log = Value::native("log", move |interp, _this, args| {
        let line = interp.join_values(args, " ")?;
        log_host.log(&line);
        Ok(Value::Undefined)
    });
    let error_host = host.clone();
    let error = Value::native("error", move |interp, _this, args| {
        let line = interp.join_values(args, " ")?;
        error_host.error(&line);
        Ok(Value::Undefined)
    });
    Value::object_from(vec![("log".to_string(), log), ("error".to_string(), error)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timers::TimerQueue;
    use jsplay_eval::Limits;

    fn build() -> ExecutionContext {
        let interp = Interpreter::new(Limits::default());
        let host = HostConsole::new(Rc::new(LogBuffer::new()));
        let timers: Rc<dyn TimerHost> = Rc::new(TimerQueue::new(host.clone(), Limits::default()));
        ExecutionContext::build(&interp, &host, &timers, &LogBuffer::new())
    }

    #[test]
    fn names_follow_the_fixed_order() {
        let context = build();
        assert_eq!(context.names(), CONTEXT_NAMES.to_vec());
        assert_eq!(context.values().len(), 19);
    }

    #[test]
    fn every_binding_is_defined() {
        let context = build();
        for name in CONTEXT_NAMES {
            let value = context.get(name).cloned().unwrap_or_default();
            assert!(!value.is_nullish(), "{name} is not bound");
        }
        assert!(context.get("document").is_none());
    }

    #[test]
    fn built_ins_pass_through() {
        let context = build();
        for name in PASS_THROUGH {
            assert!(context.get(name).is_some_and(|v| matches!(v, Value::Object(_))));
        }
        assert!(context.get("Math").is_some_and(|v| !v.is_function()));
        assert!(context.get("Array").is_some_and(Value::is_function));
    }
}
