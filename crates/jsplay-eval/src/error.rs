//! Runtime error types for the jsplay evaluator.

use crate::value::{ObjectKind, Value};

/// An abrupt completion that escaped evaluation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// A JavaScript value thrown by `throw` or by a failing built-in.
    /// Catchable by `try`/`catch`.
    #[error("Uncaught {0}")]
    Thrown(Value),
    /// The step budget ran out. Never catchable from script code.
    #[error("execution step limit exceeded")]
    StepLimit,
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Thrown(Value::error("TypeError", message))
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::Thrown(Value::error("ReferenceError", message))
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::Thrown(Value::error("RangeError", message))
    }

    /// Runaway recursion, in calls or in walking nested data.
    pub fn stack_overflow() -> Self {
        Self::range_error("Maximum call stack size exceeded")
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::Thrown(Value::error("SyntaxError", message))
    }

    pub fn is_catchable(&self) -> bool {
        matches!(self, Self::Thrown(_))
    }

    /// What `err.message` evaluates to in script code, stringified:
    /// the message of an Error object, `"undefined"` for primitives.
    pub fn message(&self) -> String {
        match self {
            Self::Thrown(value) => thrown_message(value),
            Self::StepLimit => "execution step limit exceeded".into(),
        }
    }
}

fn thrown_message(value: &Value) -> String {
    let Some(obj) = value.as_object() else {
        return "undefined".into();
    };
    let obj = obj.borrow();
    if let Some(message) = obj.props.get("message") {
        return message.to_display_string();
    }
    match &obj.kind {
        ObjectKind::Error { message, .. } => message.clone(),
        _ => "undefined".into(),
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_objects_expose_message() {
        let err = EvalError::type_error("x is not a function");
        assert_eq!(err.message(), "x is not a function");
        assert_eq!(err.to_string(), "Uncaught TypeError: x is not a function");
    }

    #[test]
    fn primitive_throws_have_undefined_message() {
        let err = EvalError::Thrown(Value::from("boom"));
        assert_eq!(err.message(), "undefined");
        assert_eq!(err.to_string(), "Uncaught boom");
    }

    #[test]
    fn plain_object_message_property_is_used() {
        let thrown = Value::object_from(vec![("message".into(), Value::from("custom"))]);
        assert_eq!(EvalError::Thrown(thrown).message(), "custom");
    }

    #[test]
    fn step_limit_is_not_catchable() {
        assert!(!EvalError::StepLimit.is_catchable());
        assert_eq!(EvalError::StepLimit.message(), "execution step limit exceeded");
    }
}
