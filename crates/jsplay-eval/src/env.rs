//! Lexical scope chain for the jsplay evaluator.
//!
//! Scopes are reference-counted so closures can keep the scope they were
//! created in alive after the enclosing call returns.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A single variable slot. `value` is `None` while a `let`/`const`
/// binding is in its temporal dead zone.
#[derive(Debug, Clone)]
struct Binding {
    value: Option<Value>,
    mutable: bool,
}

#[derive(Debug)]
struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<Environment>,
    /// `Some` on function scopes of non-arrow functions.
    this: Option<Value>,
    /// Target scope for `var` declarations.
    is_function: bool,
}

/// Why reading a name failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    NotDefined,
    Uninitialized,
}

/// Why writing a name failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    NotDefined,
    Uninitialized,
    Constant,
}

/// Handle to one scope in the chain. Cloning shares the scope.
#[derive(Debug, Clone)]
pub struct Environment {
    scope: Rc<RefCell<Scope>>,
}

impl Environment {
    fn with_scope(parent: Option<Environment>, this: Option<Value>, is_function: bool) -> Self {
        Self {
            scope: Rc::new(RefCell::new(Scope {
                bindings: HashMap::new(),
                parent,
                this,
                is_function,
            })),
        }
    }

    /// The outermost scope, holding built-in globals.
    pub fn global() -> Self {
        Self::with_scope(None, None, true)
    }

    /// A block scope nested in `self`.
    pub fn child(&self) -> Self {
        Self::with_scope(Some(self.clone()), None, false)
    }

    /// A function-call scope. Arrow functions pass `None` so `this`
    /// resolves lexically.
    pub fn function_child(&self, this: Option<Value>) -> Self {
        Self::with_scope(Some(self.clone()), this, true)
    }

    /// Take this scope apart if no other handle shares it: the values it
    /// kept alive and its parent. Used to free long chains without
    /// recursing.
    pub(crate) fn into_parts_if_unique(self) -> Option<(Vec<Value>, Option<Environment>)> {
        let scope = Rc::try_unwrap(self.scope).ok()?.into_inner();
        let mut held: Vec<Value> = scope
            .bindings
            .into_values()
            .filter_map(|binding| binding.value)
            .collect();
        held.extend(scope.this);
        Some((held, scope.parent))
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }

    fn parent(&self) -> Option<Environment> {
        self.scope.borrow().parent.clone()
    }

    // ── Declaration ──────────────────────────────────────────────────────────

    /// Define (or redefine) a name in this scope.
    pub fn define(&self, name: &str, value: Value, mutable: bool) {
        self.scope.borrow_mut().bindings.insert(
            name.to_string(),
            Binding {
                value: Some(value),
                mutable,
            },
        );
    }

    /// Reserve a `let`/`const` name; reads fail until it is defined.
    pub fn define_uninitialized(&self, name: &str, mutable: bool) {
        self.scope.borrow_mut().bindings.insert(
            name.to_string(),
            Binding {
                value: None,
                mutable,
            },
        );
    }

    /// Define a `var` slot as `undefined` unless the name already exists
    /// here (a parameter of the same name keeps its value).
    pub fn define_var(&self, name: &str) {
        let mut scope = self.scope.borrow_mut();
        if !scope.bindings.contains_key(name) {
            scope.bindings.insert(
                name.to_string(),
                Binding {
                    value: Some(Value::Undefined),
                    mutable: true,
                },
            );
        }
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.scope.borrow().bindings.contains_key(name)
    }

    // ── Access ───────────────────────────────────────────────────────────────

    /// Look a name up from this scope outward.
    pub fn get(&self, name: &str) -> Result<Value, LookupError> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.scope.borrow();
                if let Some(binding) = scope.bindings.get(name) {
                    return binding.value.clone().ok_or(LookupError::Uninitialized);
                }
                scope.parent.clone()
            };
            match parent {
                Some(p) => current = p,
                None => return Err(LookupError::NotDefined),
            }
        }
    }

    /// Update the nearest binding of `name`.
    pub fn set(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut scope = current.scope.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(name) {
                    if binding.value.is_none() {
                        return Err(AssignError::Uninitialized);
                    }
                    if !binding.mutable {
                        return Err(AssignError::Constant);
                    }
                    binding.value = Some(value);
                    return Ok(());
                }
                scope.parent.clone()
            };
            match parent {
                Some(p) => current = p,
                None => return Err(AssignError::NotDefined),
            }
        }
    }

    /// The `this` of the nearest non-arrow function, `undefined` at top level.
    pub fn this_value(&self) -> Value {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.scope.borrow();
                if let Some(this) = &scope.this {
                    return this.clone();
                }
                scope.parent.clone()
            };
            match parent {
                Some(p) => current = p,
                None => return Value::Undefined,
            }
        }
    }

    /// The nearest function scope, where `var` declarations live.
    pub fn var_scope(&self) -> Environment {
        let mut current = self.clone();
        loop {
            if current.scope.borrow().is_function {
                return current;
            }
            match current.parent() {
                Some(p) => current = p,
                None => return current,
            }
        }
    }

    /// The root of the chain; assignments to undeclared names land here.
    pub fn global_scope(&self) -> Environment {
        let mut current = self.clone();
        while let Some(p) = current.parent() {
            current = p;
        }
        current
    }

    /// A sibling scope carrying copies of the named bindings. Used to give
    /// every iteration of `for (let …)` its own variables.
    pub fn copy_for_iteration(&self, names: &[String]) -> Environment {
        let scope = self.scope.borrow();
        let next = Self::with_scope(scope.parent.clone(), None, false);
        {
            let mut fresh = next.scope.borrow_mut();
            for name in names {
                if let Some(binding) = scope.bindings.get(name) {
                    fresh.bindings.insert(name.clone(), binding.clone());
                }
            }
        }
        next
    }

    /// Names bound directly in this scope, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scope.borrow().bindings.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let global = Environment::global();
        global.define("x", Value::Number(1.0), true);
        let inner = global.child();
        inner.define("x", Value::Number(2.0), true);
        assert_eq!(inner.get("x").map(|v| v.to_number()), Ok(2.0));
        assert_eq!(global.get("x").map(|v| v.to_number()), Ok(1.0));
    }

    #[test]
    fn set_updates_nearest_binding() {
        let global = Environment::global();
        global.define("x", Value::Number(1.0), true);
        let inner = global.child();
        assert_eq!(inner.set("x", Value::Number(5.0)), Ok(()));
        assert_eq!(global.get("x").map(|v| v.to_number()), Ok(5.0));
    }

    #[test]
    fn constants_and_dead_zone() {
        let env = Environment::global();
        env.define("c", Value::Number(1.0), false);
        env.define_uninitialized("later", true);
        assert_eq!(env.set("c", Value::Null), Err(AssignError::Constant));
        assert_eq!(env.get("later").err(), Some(LookupError::Uninitialized));
        assert_eq!(env.set("later", Value::Null), Err(AssignError::Uninitialized));
        assert_eq!(env.get("missing").err(), Some(LookupError::NotDefined));
    }

    #[test]
    fn this_resolves_through_arrow_scopes() {
        let global = Environment::global();
        let func = global.function_child(Some(Value::from("me")));
        let arrow = func.function_child(None);
        let block = arrow.child();
        assert_eq!(block.this_value().to_display_string(), "me");
        assert!(global.this_value().is_undefined());
    }

    #[test]
    fn var_scope_skips_blocks() {
        let global = Environment::global();
        let func = global.function_child(None);
        let block = func.child().child();
        assert!(block.var_scope().ptr_eq(&func));
        assert!(block.global_scope().ptr_eq(&global));
    }

    #[test]
    fn define_var_keeps_existing_value() {
        let env = Environment::global();
        env.define("a", Value::Number(3.0), true);
        env.define_var("a");
        env.define_var("b");
        assert_eq!(env.get("a").map(|v| v.to_number()), Ok(3.0));
        assert!(env.get("b").is_ok_and(|v| v.is_undefined()));
    }

    #[test]
    fn iteration_copies_are_independent() {
        let global = Environment::global();
        let first = global.child();
        first.define("i", Value::Number(0.0), true);
        let second = first.copy_for_iteration(&["i".to_string()]);
        second.set("i", Value::Number(1.0)).unwrap();
        assert_eq!(first.get("i").map(|v| v.to_number()), Ok(0.0));
        assert_eq!(second.get("i").map(|v| v.to_number()), Ok(1.0));
    }
}
