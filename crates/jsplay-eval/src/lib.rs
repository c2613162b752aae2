//! jsplay evaluator: a tree-walking interpreter for the JavaScript subset.
//!
//! Programs run directly from the AST produced by `jsplay-parser`. Every
//! statement and expression costs one unit of gas; bulk built-ins charge in
//! proportion to the work they do, so any script terminates with either a
//! value, a thrown JavaScript value, or [`EvalError::StepLimit`].
//!
//! ```ignore
//! let mut interp = Interpreter::new(Limits::default());
//! let value = interp.run_script("return [1, 2, 3].map(n => n * 2).join('-');")?;
//! assert_eq!(value.to_display_string(), "2-4-6");
//! ```

mod env;
mod error;
mod eval_expr;
mod interpreter;
mod property;
pub mod stdlib;
pub mod value;

pub use env::{AssignError, Environment, LookupError};
pub use error::{EvalError, EvalResult};
pub use interpreter::{Interpreter, Limits};
pub use value::{Function, JsObject, NativeFn, ObjectKind, ObjectRef, Value};
