//! Tree-walking interpreter: statements, calls and hoisting.
//!
//! Expressions live in `eval_expr.rs`, property access and conversions in
//! `property.rs`. Every statement and expression costs one step of gas.

use std::rc::Rc;

use jsplay_types::ast::*;
use jsplay_types::SourceFile;

use crate::env::{AssignError, Environment, LookupError};
use crate::error::{EvalError, EvalResult};
use crate::stdlib;
use crate::value::{Closure, Function, JsObject, ObjectKind, Value};

/// Resource limits for one interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum statements + expressions evaluated.
    pub gas_limit: u64,
    /// Maximum nested function calls.
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            gas_limit: 1_000_000,
            max_call_depth: 128,
        }
    }
}

/// How a statement finished.
#[derive(Debug, Clone)]
pub(crate) enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// How a binding pattern introduces its names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindMode {
    /// Assign to the hoisted `var` slot.
    Var,
    Let,
    Const,
}

impl From<VarKind> for BindMode {
    fn from(kind: VarKind) -> Self {
        match kind {
            VarKind::Var => BindMode::Var,
            VarKind::Let => BindMode::Let,
            VarKind::Const => BindMode::Const,
        }
    }
}

/// The jsplay interpreter. One instance per run; closures created by one
/// instance may be called from another (timer callbacks do this).
pub struct Interpreter {
    globals: Environment,
    limits: Limits,
    steps: u64,
    call_depth: usize,
}

impl Interpreter {
    /// Create an interpreter with the built-in globals installed.
    pub fn new(limits: Limits) -> Self {
        let globals = Environment::global();
        stdlib::install(&globals);
        Self {
            globals,
            limits,
            steps: 0,
            call_depth: 0,
        }
    }

    /// Create an interpreter over globals another one installed, so the
    /// two agree on which built-in objects exist.
    pub fn with_globals(globals: Environment, limits: Limits) -> Self {
        Self {
            globals,
            limits,
            steps: 0,
            call_depth: 0,
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Steps consumed so far.
    pub fn steps_used(&self) -> u64 {
        self.steps
    }

    // ── Gas ──────────────────────────────────────────────────────────────────

    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.charge(1)
    }

    /// Consume `units` steps at once; built-ins use this for bulk work such
    /// as `new Array(n)` or `'x'.repeat(n)`.
    pub(crate) fn charge(&mut self, units: u64) -> EvalResult<()> {
        self.steps = self.steps.saturating_add(units);
        if self.steps > self.limits.gas_limit {
            Err(EvalError::StepLimit)
        } else {
            Ok(())
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Entry points
    // ══════════════════════════════════════════════════════════════════════════

    /// Turn `body` into `function anonymous(params…) { body }`, closed over
    /// the globals. Syntax errors surface as a thrown `SyntaxError`.
    pub fn compile_function(
        &mut self,
        file_name: &str,
        params: &[String],
        body: &str,
    ) -> EvalResult<Value> {
        let source_file = SourceFile::new(file_name, body);
        let parsed = jsplay_parser::parse_source(&source_file);
        let program = match parsed.program {
            Some(program) if !parsed.errors.has_errors() => program,
            _ => {
                let message = parsed
                    .errors
                    .first()
                    .map(|d| d.message.clone())
                    .unwrap_or_else(|| "Unexpected end of input".to_string());
                tracing::debug!(file = file_name, %message, "compile failed");
                return Err(EvalError::syntax_error(message));
            }
        };

        let span = program.span;
        let def = FunctionDef {
            name: Some(Ident::new("anonymous", span)),
            params: params
                .iter()
                .map(|name| PatternElem {
                    target: Pattern::Ident(Ident::new(name.clone(), span)),
                    default: None,
                })
                .collect(),
            rest: None,
            body: FunctionBody::Block(Block {
                stmts: program.body,
                span,
            }),
            is_arrow: false,
            source: format!("function anonymous({}\n) {{\n{body}\n}}", params.join(",")),
            span,
        };
        Ok(Value::closure(
            Rc::new(def),
            self.globals.clone(),
            "anonymous".to_string(),
        ))
    }

    /// Compile and run a script with no parameters, returning its
    /// completion value (`return` at top level is allowed).
    pub fn run_script(&mut self, source: &str) -> EvalResult<Value> {
        let func = self.compile_function("script.js", &[], source)?;
        self.call(&func, Value::Undefined, &[])
    }

    /// Call any function value.
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> EvalResult<Value> {
        let Some(func) = callee.as_function() else {
            return Err(EvalError::type_error(format!(
                "{} is not a function",
                callee.to_display_string()
            )));
        };
        self.call_function(&func, this, args)
    }

    /// `new callee(...args)`
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> EvalResult<Value> {
        let Some(func) = callee.as_function() else {
            return Err(EvalError::type_error(format!(
                "{} is not a constructor",
                callee.to_display_string()
            )));
        };
        match &func {
            Function::Native(native) => {
                let Some(construct) = native.construct.clone() else {
                    return Err(EvalError::type_error(format!(
                        "{} is not a constructor",
                        native.name
                    )));
                };
                self.enter_call()?;
                let result = construct(self, &Value::Undefined, args);
                self.call_depth -= 1;
                result
            }
            Function::Closure(closure) if closure.def.is_arrow => Err(EvalError::type_error(
                format!("{} is not a constructor", display_name(&closure.name)),
            )),
            Function::Closure(_) => {
                let proto = self.get_property(callee, "prototype")?;
                let mut instance = JsObject::new(ObjectKind::Ordinary);
                instance.proto = proto.as_object().cloned();
                let instance = Value::from_object(instance);
                let result = self.call_function(&func, instance.clone(), args)?;
                Ok(match result {
                    Value::Object(_) => result,
                    _ => instance,
                })
            }
        }
    }

    fn enter_call(&mut self) -> EvalResult<()> {
        if self.call_depth >= self.limits.max_call_depth {
            return Err(EvalError::stack_overflow());
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn call_function(
        &mut self,
        func: &Function,
        this: Value,
        args: &[Value],
    ) -> EvalResult<Value> {
        self.enter_call()?;
        let result = match func {
            Function::Native(native) => (native.call)(self, &this, args),
            Function::Closure(closure) => self.call_closure(closure, this, args),
        };
        self.call_depth -= 1;
        result
    }

    fn call_closure(&mut self, closure: &Closure, this: Value, args: &[Value]) -> EvalResult<Value> {
        let def = &closure.def;
        let scope = if def.is_arrow {
            closure.env.function_child(None)
        } else {
            let scope = closure.env.function_child(Some(this));
            scope.define("arguments", Value::array(args.to_vec()), true);
            scope
        };

        for (i, param) in def.params.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or_default();
            self.bind_element(param, arg, &scope, BindMode::Let)?;
        }
        if let Some(rest) = &def.rest {
            let rest_args = args.get(def.params.len()..).unwrap_or_default().to_vec();
            self.bind_pattern(rest, Value::array(rest_args), &scope, BindMode::Let)?;
        }

        match &def.body {
            FunctionBody::Expr(expr) => self.eval_expr(expr, &scope),
            FunctionBody::Block(block) => {
                self.hoist_declarations(&block.stmts, &scope);
                match self.exec_stmts(&block.stmts, &scope)? {
                    Completion::Return(value) => Ok(value),
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Hoisting
    // ══════════════════════════════════════════════════════════════════════════

    /// Function-entry setup: `var` names anywhere in the body become
    /// `undefined`, then the top-level block is instantiated.
    fn hoist_declarations(&mut self, stmts: &[Stmt], scope: &Environment) {
        let mut names = Vec::new();
        for stmt in stmts {
            collect_var_names(stmt, &mut names);
        }
        for name in &names {
            scope.define_var(name);
        }
        self.instantiate_block(stmts, scope);
    }

    /// Block-entry setup: `let`/`const` enter their dead zone and function
    /// declarations are bound before any statement runs.
    fn instantiate_block(&mut self, stmts: &[Stmt], scope: &Environment) {
        for stmt in stmts {
            match stmt {
                Stmt::Var(decl) if decl.kind != VarKind::Var => {
                    for declarator in &decl.declarations {
                        for name in declarator.target.bound_names() {
                            scope.define_uninitialized(name, decl.kind == VarKind::Let);
                        }
                    }
                }
                Stmt::Function(def) => {
                    if let Some(name) = &def.name {
                        let func = Value::closure(def.clone(), scope.clone(), name.name.clone());
                        scope.define(&name.name, func, true);
                    }
                }
                _ => {}
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn exec_stmts(&mut self, stmts: &[Stmt], env: &Environment) -> EvalResult<Completion> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> EvalResult<Completion> {
        self.tick()?;
        match stmt {
            Stmt::Var(decl) => self.exec_var_decl(decl, env),
            Stmt::Function(_) | Stmt::Empty(_) => Ok(Completion::Normal),
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Stmt::If(stmt) => {
                if self.eval_expr(&stmt.condition, env)?.truthy() {
                    self.exec_stmt(&stmt.consequent, env)
                } else if let Some(alternate) = &stmt.alternate {
                    self.exec_stmt(alternate, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            Stmt::For(stmt) => self.exec_for(stmt, env),
            Stmt::ForOf(stmt) => self.exec_for_of(stmt, env),
            Stmt::While(stmt) => {
                while self.eval_expr(&stmt.condition, env)?.truthy() {
                    match self.exec_stmt(&stmt.body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Continue | Completion::Normal => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::DoWhile(stmt) => {
                loop {
                    match self.exec_stmt(&stmt.body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Continue | Completion::Normal => {}
                    }
                    if !self.eval_expr(&stmt.condition, env)?.truthy() {
                        break;
                    }
                }
                Ok(Completion::Normal)
            }
            Stmt::Break(_) => Ok(Completion::Break),
            Stmt::Continue(_) => Ok(Completion::Continue),
            Stmt::Throw(stmt) => {
                let value = self.eval_expr(&stmt.value, env)?;
                Err(EvalError::Thrown(value))
            }
            Stmt::Try(stmt) => self.exec_try(stmt, env),
            Stmt::Block(block) => self.exec_block(block, env),
            Stmt::Expr(stmt) => {
                self.eval_expr(&stmt.expr, env)?;
                Ok(Completion::Normal)
            }
        }
    }

    pub(crate) fn exec_block(&mut self, block: &Block, env: &Environment) -> EvalResult<Completion> {
        let scope = env.child();
        self.instantiate_block(&block.stmts, &scope);
        self.exec_stmts(&block.stmts, &scope)
    }

    fn exec_var_decl(&mut self, decl: &VarDecl, env: &Environment) -> EvalResult<Completion> {
        let mode = BindMode::from(decl.kind);
        for declarator in &decl.declarations {
            let value = match (&declarator.init, decl.kind) {
                // `var x;` leaves an existing value alone.
                (None, VarKind::Var) => continue,
                (None, _) => Value::Undefined,
                (Some(init), _) => match &declarator.target {
                    Pattern::Ident(id) => self.eval_named(init, &id.name, env)?,
                    _ => self.eval_expr(init, env)?,
                },
            };
            self.bind_pattern(&declarator.target, value, env, mode)?;
        }
        Ok(Completion::Normal)
    }

    fn exec_for(&mut self, stmt: &ForStmt, env: &Environment) -> EvalResult<Completion> {
        let loop_env = env.child();
        let mut per_iteration: Vec<String> = Vec::new();
        match &stmt.init {
            Some(ForInit::Var(decl)) => {
                if decl.kind != VarKind::Var {
                    for declarator in &decl.declarations {
                        for name in declarator.target.bound_names() {
                            loop_env.define_uninitialized(name, decl.kind == VarKind::Let);
                            per_iteration.push(name.to_string());
                        }
                    }
                }
                self.exec_var_decl(decl, &loop_env)?;
            }
            Some(ForInit::Expr(expr)) => {
                self.eval_expr(expr, &loop_env)?;
            }
            None => {}
        }

        let mut iter_env = if per_iteration.is_empty() {
            loop_env
        } else {
            loop_env.copy_for_iteration(&per_iteration)
        };
        loop {
            if let Some(test) = &stmt.test {
                if !self.eval_expr(test, &iter_env)?.truthy() {
                    break;
                }
            }
            match self.exec_stmt(&stmt.body, &iter_env)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Continue | Completion::Normal => {}
            }
            if !per_iteration.is_empty() {
                iter_env = iter_env.copy_for_iteration(&per_iteration);
            }
            if let Some(update) = &stmt.update {
                self.eval_expr(update, &iter_env)?;
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_for_of(&mut self, stmt: &ForOfStmt, env: &Environment) -> EvalResult<Completion> {
        let iterable = self.eval_expr(&stmt.iterable, env)?;
        let items: Vec<Value> = match stmt.kind {
            IterKind::Of => self.iterate(&iterable)?,
            IterKind::In => self
                .enumerable_keys(&iterable)
                .into_iter()
                .map(Value::from)
                .collect(),
        };

        for item in items {
            let iter_env = env.child();
            match &stmt.binding {
                ForBinding::Decl(kind, pattern) => {
                    self.bind_pattern(pattern, item, &iter_env, BindMode::from(*kind))?;
                }
                ForBinding::Target(target) => self.assign_to_target(target, item, &iter_env)?,
            }
            match self.exec_stmt(&stmt.body, &iter_env)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Continue | Completion::Normal => {}
            }
        }
        Ok(Completion::Normal)
    }

    fn exec_try(&mut self, stmt: &TryStmt, env: &Environment) -> EvalResult<Completion> {
        let result = match (self.exec_block(&stmt.block, env), &stmt.handler) {
            (Err(EvalError::Thrown(thrown)), Some(handler)) => self.exec_catch(handler, thrown, env),
            (other, _) => other,
        };

        let Some(finalizer) = &stmt.finalizer else {
            return result;
        };
        if matches!(result, Err(EvalError::StepLimit)) {
            return result;
        }
        match self.exec_block(finalizer, env)? {
            Completion::Normal => result,
            abrupt => Ok(abrupt),
        }
    }

    fn exec_catch(
        &mut self,
        handler: &CatchClause,
        thrown: Value,
        env: &Environment,
    ) -> EvalResult<Completion> {
        let scope = env.child();
        if let Some(param) = &handler.param {
            self.bind_pattern(param, thrown, &scope, BindMode::Let)?;
        }
        self.exec_block(&handler.body, &scope)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Bindings
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn lookup(&self, name: &str, env: &Environment) -> EvalResult<Value> {
        env.get(name).map_err(|err| match err {
            LookupError::NotDefined => EvalError::reference_error(format!("{name} is not defined")),
            LookupError::Uninitialized => EvalError::reference_error(format!(
                "Cannot access '{name}' before initialization"
            )),
        })
    }

    /// Plain assignment `name = value`. Undeclared names become globals.
    pub(crate) fn assign_binding(&self, name: &str, value: Value, env: &Environment) -> EvalResult<()> {
        match env.set(name, value.clone()) {
            Ok(()) => Ok(()),
            Err(AssignError::NotDefined) => {
                env.global_scope().define(name, value, true);
                Ok(())
            }
            Err(AssignError::Uninitialized) => Err(EvalError::reference_error(format!(
                "Cannot access '{name}' before initialization"
            ))),
            Err(AssignError::Constant) => {
                Err(EvalError::type_error("Assignment to constant variable."))
            }
        }
    }

    fn bind_name(&self, name: &str, value: Value, env: &Environment, mode: BindMode) -> EvalResult<()> {
        match mode {
            BindMode::Var => match env.set(name, value.clone()) {
                Ok(()) => Ok(()),
                Err(_) => {
                    env.var_scope().define(name, value, true);
                    Ok(())
                }
            },
            BindMode::Let => {
                env.define(name, value, true);
                Ok(())
            }
            BindMode::Const => {
                env.define(name, value, false);
                Ok(())
            }
        }
    }

    /// Bind a declaration pattern against `value`.
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Environment,
        mode: BindMode,
    ) -> EvalResult<()> {
        match pattern {
            Pattern::Ident(id) => self.bind_name(&id.name, value, env, mode),
            Pattern::Array(array) => {
                let items = self.iterate(&value)?;
                for (i, elem) in array.elements.iter().enumerate() {
                    if let Some(elem) = elem {
                        let item = items.get(i).cloned().unwrap_or_default();
                        self.bind_element(elem, item, env, mode)?;
                    }
                }
                if let Some(rest) = &array.rest {
                    let tail = items.get(array.elements.len()..).unwrap_or_default().to_vec();
                    self.bind_pattern(rest, Value::array(tail), env, mode)?;
                }
                Ok(())
            }
            Pattern::Object(object) => {
                require_destructurable(&value)?;
                let mut used = Vec::with_capacity(object.props.len());
                for prop in &object.props {
                    let key = self.prop_key(&prop.key, env)?;
                    let item = self.get_property(&value, &key)?;
                    self.bind_element(&prop.value, item, env, mode)?;
                    used.push(key);
                }
                if let Some(rest) = &object.rest {
                    let remaining = self.object_rest(&value, &used);
                    self.bind_name(&rest.name, remaining, env, mode)?;
                }
                Ok(())
            }
        }
    }

    /// Bind one pattern element, applying its default when `value` is
    /// `undefined`.
    pub(crate) fn bind_element(
        &mut self,
        elem: &PatternElem,
        value: Value,
        env: &Environment,
        mode: BindMode,
    ) -> EvalResult<()> {
        let value = match (&elem.default, value) {
            (Some(default), Value::Undefined) => match &elem.target {
                Pattern::Ident(id) => self.eval_named(default, &id.name, env)?,
                _ => self.eval_expr(default, env)?,
            },
            (_, value) => value,
        };
        self.bind_pattern(&elem.target, value, env, mode)
    }
}

/// `const {a} = null` fails before any property is read.
pub(crate) fn require_destructurable(value: &Value) -> EvalResult<()> {
    if value.is_nullish() {
        let shown = value.to_display_string();
        return Err(EvalError::type_error(format!(
            "Cannot destructure '{shown}' as it is {shown}."
        )));
    }
    Ok(())
}

pub(crate) fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "anonymous"
    } else {
        name
    }
}

/// Every `var` name declared in `stmt`, not descending into functions.
fn collect_var_names(stmt: &Stmt, out: &mut Vec<String>) {
    let var_names = |decl: &VarDecl, out: &mut Vec<String>| {
        if decl.kind == VarKind::Var {
            for declarator in &decl.declarations {
                out.extend(declarator.target.bound_names().into_iter().map(String::from));
            }
        }
    };
    match stmt {
        Stmt::Var(decl) => var_names(decl, out),
        Stmt::If(stmt) => {
            collect_var_names(&stmt.consequent, out);
            if let Some(alternate) = &stmt.alternate {
                collect_var_names(alternate, out);
            }
        }
        Stmt::For(stmt) => {
            if let Some(ForInit::Var(decl)) = &stmt.init {
                var_names(decl, out);
            }
            collect_var_names(&stmt.body, out);
        }
        Stmt::ForOf(stmt) => {
            if let ForBinding::Decl(VarKind::Var, pattern) = &stmt.binding {
                out.extend(pattern.bound_names().into_iter().map(String::from));
            }
            collect_var_names(&stmt.body, out);
        }
        Stmt::While(stmt) | Stmt::DoWhile(stmt) => collect_var_names(&stmt.body, out),
        Stmt::Try(stmt) => {
            for s in &stmt.block.stmts {
                collect_var_names(s, out);
            }
            if let Some(handler) = &stmt.handler {
                for s in &handler.body.stmts {
                    collect_var_names(s, out);
                }
            }
            if let Some(finalizer) = &stmt.finalizer {
                for s in &finalizer.stmts {
                    collect_var_names(s, out);
                }
            }
        }
        Stmt::Block(block) => {
            for s in &block.stmts {
                collect_var_names(s, out);
            }
        }
        _ => {}
    }
}
