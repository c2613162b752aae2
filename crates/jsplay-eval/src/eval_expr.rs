//! Expression evaluation.

use std::cmp::Ordering;
use std::rc::Rc;

use jsplay_types::ast::*;

use crate::env::{Environment, LookupError};
use crate::error::{EvalError, EvalResult};
use crate::interpreter::require_destructurable;
use crate::property::Hint;
use crate::value::{loose_equals, strict_equals, Value};
use crate::Interpreter;

/// A resolved assignment target.
enum Reference {
    Binding(String),
    Property(Value, String),
}

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> EvalResult<Value> {
        self.tick()?;
        match &expr.kind {
            // ── Literals ──
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::string(s)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Template(parts) => self.eval_template(parts, env),
            ExprKind::Array(elems) => self.eval_array_literal(elems, env),
            ExprKind::Object(props) => self.eval_object_literal(props, env),
            ExprKind::Function(def) => Ok(self.make_function(def, env, None)),

            // ── References ──
            ExprKind::Ident(name) => self.lookup(name, env),
            ExprKind::This => Ok(env.this_value()),
            ExprKind::Member { .. } | ExprKind::Call { .. } => {
                Ok(self.eval_chain(expr, env)?.unwrap_or_default())
            }
            ExprKind::OptionalChain(inner) => Ok(self.eval_chain(inner, env)?.unwrap_or_default()),
            ExprKind::New { callee, args } => {
                let constructor = self.eval_expr(callee, env)?;
                let args = self.eval_args(args, env)?;
                if !constructor.is_function() {
                    return Err(EvalError::type_error(format!(
                        "{} is not a constructor",
                        describe(callee)
                    )));
                }
                self.construct(&constructor, &args)
            }

            // ── Operators ──
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, env),
            ExprKind::Update { op, prefix, target } => self.eval_update(*op, *prefix, target, env),
            ExprKind::Binary { left, op, right } => {
                let lhs = self.eval_expr(left, env)?;
                let rhs = self.eval_expr(right, env)?;
                self.binary_op(*op, &lhs, &rhs)
            }
            ExprKind::Logical { left, op, right } => {
                let lhs = self.eval_expr(left, env)?;
                if short_circuits(*op, &lhs) {
                    Ok(lhs)
                } else {
                    self.eval_expr(right, env)
                }
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expr(test, env)?.truthy() {
                    self.eval_expr(consequent, env)
                } else {
                    self.eval_expr(alternate, env)
                }
            }
            ExprKind::Assign { op, target, value } => self.eval_assign(*op, target, value, env),
            ExprKind::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval_expr(expr, env)?;
                }
                Ok(last)
            }
        }
    }

    /// Evaluate `expr`; an anonymous function gets `name` as its `.name`.
    pub(crate) fn eval_named(&mut self, expr: &Expr, name: &str, env: &Environment) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Function(def) if def.name.is_none() => {
                self.tick()?;
                Ok(self.make_function(def, env, Some(name)))
            }
            _ => self.eval_expr(expr, env),
        }
    }

    fn make_function(&mut self, def: &Rc<FunctionDef>, env: &Environment, inferred: Option<&str>) -> Value {
        match &def.name {
            // A named function expression can see its own name.
            Some(own) => {
                let scope = env.child();
                let func = Value::closure(def.clone(), scope.clone(), own.name.clone());
                scope.define(&own.name, func.clone(), false);
                func
            }
            None => Value::closure(
                def.clone(),
                env.clone(),
                inferred.unwrap_or_default().to_string(),
            ),
        }
    }

    // ── Literals ─────────────────────────────────────────────────────────────

    fn eval_template(&mut self, parts: &[TemplatePart], env: &Environment) -> EvalResult<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Expr(expr) => {
                    let value = self.eval_expr(expr, env)?;
                    out.push_str(&self.to_string(&value)?);
                }
            }
        }
        Ok(Value::from(out))
    }

    fn eval_array_literal(&mut self, elems: &[ArrayElem], env: &Environment) -> EvalResult<Value> {
        let mut items = Vec::with_capacity(elems.len());
        for elem in elems {
            match elem {
                ArrayElem::Expr(expr) => items.push(self.eval_expr(expr, env)?),
                ArrayElem::Spread(expr) => {
                    let spread = self.eval_expr(expr, env)?;
                    items.extend(self.iterate(&spread)?);
                }
                ArrayElem::Hole => items.push(Value::Undefined),
            }
        }
        Ok(Value::array(items))
    }

    fn eval_object_literal(&mut self, props: &[PropDef], env: &Environment) -> EvalResult<Value> {
        let object = Value::new_object();
        for prop in props {
            match prop {
                PropDef::KeyValue(key, value) => {
                    let key = self.prop_key(key, env)?;
                    let value = self.eval_named(value, &key, env)?;
                    self.define_own(&object, key, value);
                }
                PropDef::Shorthand(ident) => {
                    let value = self.lookup(&ident.name, env)?;
                    self.define_own(&object, ident.name.clone(), value);
                }
                PropDef::Spread(expr) => {
                    let source = self.eval_expr(expr, env)?;
                    for key in self.enumerable_keys(&source) {
                        let value = self.get_property(&source, &key)?;
                        self.define_own(&object, key, value);
                    }
                }
            }
        }
        Ok(object)
    }

    pub(crate) fn prop_key(&mut self, key: &PropKey, env: &Environment) -> EvalResult<String> {
        match key {
            PropKey::Static(name) => Ok(name.clone()),
            PropKey::Computed(expr) => {
                let value = self.eval_expr(expr, env)?;
                self.to_property_key(&value)
            }
        }
    }

    fn member_key(&mut self, key: &MemberKey, env: &Environment) -> EvalResult<String> {
        match key {
            MemberKey::Name(name) => Ok(name.clone()),
            MemberKey::Computed(expr) => {
                let value = self.eval_expr(expr, env)?;
                self.to_property_key(&value)
            }
        }
    }

    // ── Member access and calls ──────────────────────────────────────────────

    /// Evaluate a member/call chain. `None` means an optional link hit
    /// `null`/`undefined` and the rest of the chain is skipped.
    fn eval_chain(&mut self, expr: &Expr, env: &Environment) -> EvalResult<Option<Value>> {
        match &expr.kind {
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.eval_chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, env)?;
                self.get_property(&target, &key).map(Some)
            }
            ExprKind::Call {
                callee,
                args,
                optional,
            } => {
                let (this, func) = match &callee.kind {
                    ExprKind::Member {
                        object,
                        property,
                        optional: member_optional,
                    } => {
                        let Some(target) = self.eval_chain(object, env)? else {
                            return Ok(None);
                        };
                        if *member_optional && target.is_nullish() {
                            return Ok(None);
                        }
                        let key = self.member_key(property, env)?;
                        let func = self.get_property(&target, &key)?;
                        (target, func)
                    }
                    _ => {
                        let Some(func) = self.eval_chain(callee, env)? else {
                            return Ok(None);
                        };
                        (Value::Undefined, func)
                    }
                };
                if *optional && func.is_nullish() {
                    return Ok(None);
                }
                let args = self.eval_args(args, env)?;
                let Some(function) = func.as_function() else {
                    return Err(EvalError::type_error(format!(
                        "{} is not a function",
                        describe(callee)
                    )));
                };
                self.call_function(&function, this, &args).map(Some)
            }
            _ => self.eval_expr(expr, env).map(Some),
        }
    }

    fn eval_args(&mut self, args: &[Argument], env: &Environment) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Expr(expr) => values.push(self.eval_expr(expr, env)?),
                Argument::Spread(expr) => {
                    let spread = self.eval_expr(expr, env)?;
                    values.extend(self.iterate(&spread)?);
                }
            }
        }
        Ok(values)
    }

    // ── Operators ────────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Environment) -> EvalResult<Value> {
        // `typeof undeclared` is "undefined", not a ReferenceError.
        if let (UnaryOp::TypeOf, ExprKind::Ident(name)) = (op, &operand.kind) {
            return match env.get(name) {
                Ok(value) => Ok(Value::from(value.type_of())),
                Err(LookupError::NotDefined) => Ok(Value::from("undefined")),
                Err(LookupError::Uninitialized) => self.lookup(name, env),
            };
        }
        let value = self.eval_expr(operand, env)?;
        Ok(match op {
            UnaryOp::Neg => Value::Number(-self.to_number(&value)?),
            UnaryOp::Plus => Value::Number(self.to_number(&value)?),
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::TypeOf => Value::from(value.type_of()),
            UnaryOp::Void => Value::Undefined,
        })
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
        env: &Environment,
    ) -> EvalResult<Value> {
        let reference = self.resolve_reference(target, env)?;
        let old = self.get_reference(&reference, env)?;
        let old = self.to_number(&old)?;
        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.put_reference(&reference, Value::Number(new), env)?;
        Ok(Value::Number(if prefix { new } else { old }))
    }

    pub(crate) fn binary_op(&mut self, op: BinOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
        let value = match op {
            BinOp::Add => {
                let l = self.to_primitive(lhs, Hint::Default)?;
                let r = self.to_primitive(rhs, Hint::Default)?;
                if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                    let mut out = l.to_display_string();
                    out.push_str(&r.to_display_string());
                    Value::from(out)
                } else {
                    Value::Number(l.to_number() + r.to_number())
                }
            }
            BinOp::Sub => Value::Number(self.to_number(lhs)? - self.to_number(rhs)?),
            BinOp::Mul => Value::Number(self.to_number(lhs)? * self.to_number(rhs)?),
            BinOp::Div => Value::Number(self.to_number(lhs)? / self.to_number(rhs)?),
            BinOp::Mod => Value::Number(self.to_number(lhs)? % self.to_number(rhs)?),
            BinOp::Exp => Value::Number(js_pow(self.to_number(lhs)?, self.to_number(rhs)?)),
            BinOp::Eq => Value::Bool(self.loose_eq(lhs, rhs)?),
            BinOp::NotEq => Value::Bool(!self.loose_eq(lhs, rhs)?),
            BinOp::StrictEq => Value::Bool(strict_equals(lhs, rhs)),
            BinOp::StrictNotEq => Value::Bool(!strict_equals(lhs, rhs)),
            BinOp::Less => Value::Bool(self.compare(lhs, rhs)? == Some(Ordering::Less)),
            BinOp::Greater => Value::Bool(self.compare(lhs, rhs)? == Some(Ordering::Greater)),
            BinOp::LessEq => Value::Bool(matches!(
                self.compare(lhs, rhs)?,
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinOp::GreaterEq => Value::Bool(matches!(
                self.compare(lhs, rhs)?,
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinOp::In => {
                if !matches!(rhs, Value::Object(_)) {
                    return Err(EvalError::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        lhs.to_display_string(),
                        rhs.to_display_string()
                    )));
                }
                let key = self.to_property_key(lhs)?;
                Value::Bool(self.has_property(rhs, &key))
            }
            BinOp::InstanceOf => Value::Bool(self.instance_of(lhs, rhs)?),
        };
        Ok(value)
    }

    fn loose_eq(&mut self, lhs: &Value, rhs: &Value) -> EvalResult<bool> {
        match (lhs, rhs) {
            (Value::Object(_), Value::Object(_)) => Ok(strict_equals(lhs, rhs)),
            (Value::Object(_), other) if !other.is_nullish() => {
                let prim = self.to_primitive(lhs, Hint::Default)?;
                Ok(loose_equals(&prim, other))
            }
            (other, Value::Object(_)) if !other.is_nullish() => {
                let prim = self.to_primitive(rhs, Hint::Default)?;
                Ok(loose_equals(other, &prim))
            }
            _ => Ok(loose_equals(lhs, rhs)),
        }
    }

    /// Abstract relational comparison; `None` when either side is `NaN`.
    fn compare(&mut self, lhs: &Value, rhs: &Value) -> EvalResult<Option<Ordering>> {
        let l = self.to_primitive(lhs, Hint::Number)?;
        let r = self.to_primitive(rhs, Hint::Number)?;
        if let (Value::String(a), Value::String(b)) = (&l, &r) {
            return Ok(Some(a.cmp(b)));
        }
        Ok(l.to_number().partial_cmp(&r.to_number()))
    }

    // ── Assignment ───────────────────────────────────────────────────────────

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        env: &Environment,
    ) -> EvalResult<Value> {
        if op == AssignOp::Assign {
            if matches!(target.kind, ExprKind::Array(_) | ExprKind::Object(_)) {
                let value = self.eval_expr(value, env)?;
                self.assign_pattern(target, value.clone(), env)?;
                return Ok(value);
            }
            let reference = self.resolve_reference(target, env)?;
            let value = match &reference {
                Reference::Binding(name) => self.eval_named(value, name, env)?,
                Reference::Property(..) => self.eval_expr(value, env)?,
            };
            self.put_reference(&reference, value.clone(), env)?;
            return Ok(value);
        }

        let reference = self.resolve_reference(target, env)?;
        let current = self.get_reference(&reference, env)?;
        let result = if let Some(logical) = op.logical() {
            if short_circuits(logical, &current) {
                return Ok(current);
            }
            self.eval_expr(value, env)?
        } else {
            let rhs = self.eval_expr(value, env)?;
            match op.binary() {
                Some(bin) => self.binary_op(bin, &current, &rhs)?,
                None => rhs,
            }
        };
        self.put_reference(&reference, result.clone(), env)?;
        Ok(result)
    }

    fn resolve_reference(&mut self, target: &Expr, env: &Environment) -> EvalResult<Reference> {
        match &target.kind {
            ExprKind::Ident(name) => Ok(Reference::Binding(name.clone())),
            ExprKind::Member {
                object, property, ..
            } => {
                let object = self.eval_expr(object, env)?;
                let key = self.member_key(property, env)?;
                Ok(Reference::Property(object, key))
            }
            _ => Err(EvalError::syntax_error("Invalid left-hand side in assignment")),
        }
    }

    fn get_reference(&mut self, reference: &Reference, env: &Environment) -> EvalResult<Value> {
        match reference {
            Reference::Binding(name) => self.lookup(name, env),
            Reference::Property(object, key) => self.get_property(object, key),
        }
    }

    fn put_reference(&mut self, reference: &Reference, value: Value, env: &Environment) -> EvalResult<()> {
        match reference {
            Reference::Binding(name) => self.assign_binding(name, value, env),
            Reference::Property(object, key) => self.set_property(object, key, value),
        }
    }

    /// Store into an assignment target: a name, a member, a nested
    /// destructuring literal, or any of those with `= default`.
    pub(crate) fn assign_to_target(&mut self, target: &Expr, value: Value, env: &Environment) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Array(_) | ExprKind::Object(_) => self.assign_pattern(target, value, env),
            ExprKind::Assign {
                op: AssignOp::Assign,
                target: inner,
                value: default,
            } => {
                let value = match value {
                    Value::Undefined => match &inner.kind {
                        ExprKind::Ident(name) => self.eval_named(default, name, env)?,
                        _ => self.eval_expr(default, env)?,
                    },
                    value => value,
                };
                self.assign_to_target(inner, value, env)
            }
            _ => {
                let reference = self.resolve_reference(target, env)?;
                self.put_reference(&reference, value, env)
            }
        }
    }

    /// `[a, b] = …` and `({ a, b } = …)`.
    fn assign_pattern(&mut self, target: &Expr, value: Value, env: &Environment) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Array(elems) => {
                let items = self.iterate(&value)?;
                for (i, elem) in elems.iter().enumerate() {
                    match elem {
                        ArrayElem::Expr(expr) => {
                            let item = items.get(i).cloned().unwrap_or_default();
                            self.assign_to_target(expr, item, env)?;
                        }
                        ArrayElem::Spread(expr) => {
                            let tail = items.get(i..).unwrap_or_default().to_vec();
                            self.assign_to_target(expr, Value::array(tail), env)?;
                        }
                        ArrayElem::Hole => {}
                    }
                }
                Ok(())
            }
            ExprKind::Object(props) => {
                require_destructurable(&value)?;
                let mut used = Vec::new();
                for prop in props {
                    match prop {
                        PropDef::KeyValue(key, inner) => {
                            let key = self.prop_key(key, env)?;
                            let item = self.get_property(&value, &key)?;
                            self.assign_to_target(inner, item, env)?;
                            used.push(key);
                        }
                        PropDef::Shorthand(ident) => {
                            let item = self.get_property(&value, &ident.name)?;
                            self.assign_binding(&ident.name, item, env)?;
                            used.push(ident.name.clone());
                        }
                        PropDef::Spread(inner) => {
                            let remaining = self.object_rest(&value, &used);
                            self.assign_to_target(inner, remaining, env)?;
                        }
                    }
                }
                Ok(())
            }
            _ => self.assign_to_target(target, value, env),
        }
    }
}

fn short_circuits(op: LogicalOp, lhs: &Value) -> bool {
    match op {
        LogicalOp::And => !lhs.truthy(),
        LogicalOp::Or => lhs.truthy(),
        LogicalOp::Nullish => !lhs.is_nullish(),
    }
}

/// `**`, with the IEEE corner cases where JavaScript differs from `powf`.
pub(crate) fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// Source-like rendering of a callee for error messages.
fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::This => "this".into(),
        ExprKind::Member {
            object, property, ..
        } => match property {
            MemberKey::Name(name) => format!("{}.{name}", describe(object)),
            MemberKey::Computed(key) => match &key.kind {
                ExprKind::Number(n) => {
                    format!("{}[{}]", describe(object), crate::value::number_to_string(*n))
                }
                ExprKind::String(s) => format!("{}[\"{s}\"]", describe(object)),
                ExprKind::Ident(name) => format!("{}[{name}]", describe(object)),
                _ => format!("{}[...]", describe(object)),
            },
        },
        ExprKind::Call { callee, .. } => format!("{}(...)", describe(callee)),
        ExprKind::OptionalChain(inner) => describe(inner),
        _ => "(intermediate value)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow_matches_javascript_corner_cases() {
        assert_eq!(js_pow(2.0, 10.0), 1024.0);
        assert!(js_pow(1.0, f64::NAN).is_nan());
        assert!(js_pow(1.0, f64::INFINITY).is_nan());
        assert!(js_pow(-1.0, f64::NEG_INFINITY).is_nan());
        assert_eq!(js_pow(f64::NAN, 0.0), 1.0);
    }

    #[test]
    fn logical_short_circuit_rules() {
        assert!(short_circuits(LogicalOp::And, &Value::Number(0.0)));
        assert!(!short_circuits(LogicalOp::And, &Value::from("x")));
        assert!(short_circuits(LogicalOp::Or, &Value::Bool(true)));
        assert!(short_circuits(LogicalOp::Nullish, &Value::Number(0.0)));
        assert!(!short_circuits(LogicalOp::Nullish, &Value::Null));
    }
}
