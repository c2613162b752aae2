//! The compile boundary: snippet text to a callable function.

use jsplay_eval::{EvalResult, Interpreter, Limits, Value};

/// File name syntax errors are reported against.
const FILE_NAME: &str = "snippet.js";

/// The snippet as the body of a nullary function whose result is returned,
/// so a top-level `return` in the snippet becomes the run's return value.
pub fn wrap_source(text: &str) -> String {
    format!("return (function() {{\n{text}\n}})();")
}

/// A compiled snippet with its own interpreter.
pub struct CompiledUnit {
    interp: Interpreter,
    func: Value,
    params: Vec<String>,
}

impl CompiledUnit {
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interp
    }

    /// Call the compiled function with one argument per parameter.
    pub fn invoke(&mut self, args: &[Value]) -> EvalResult<Value> {
        self.interp.call(&self.func, Value::Undefined, args)
    }
}

/// Compile `text` with `names` as parameters. Syntax errors come back as a
/// thrown `SyntaxError` and nothing runs.
pub fn compile(text: &str, names: &[&str], limits: Limits) -> EvalResult<CompiledUnit> {
    let mut interp = Interpreter::new(limits);
    let params: Vec<String> = names.iter().map(|name| name.to_string()).collect();
    let func = interp.compile_function(FILE_NAME, &params, &wrap_source(text))?;
    Ok(CompiledUnit {
        interp,
        func,
        params,
    })
}
