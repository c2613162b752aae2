//! Expression parsing with JavaScript operator precedence.
//!
//! Precedence (lowest → highest):
//! 14. `,` (sequence)
//! 13. `=`, `+=`, …, `&&=`, `||=`, `??=`, arrow functions
//! 12. `? :`
//! 11. `??`
//! 10. `||`
//! 9. `&&`
//! 8. `==`, `!=`, `===`, `!==`
//! 7. `<`, `>`, `<=`, `>=`, `instanceof`, `in`
//! 6. `+`, `-`
//! 5. `*`, `/`, `%`
//! 4. `**` (right-associative)
//! 3. unary `!`, `-`, `+`, `typeof`, `void`, prefix `++`/`--`
//! 2. postfix `++`/`--`
//! 1. `new`, `.`, `?.`, `[]`, `()`

use std::rc::Rc;

use jsplay_lexer::token::TokenKind;
use jsplay_types::ast::*;
use jsplay_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Points
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a full expression, including the comma operator.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Some(first);
        }
        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        let span = exprs[0].span.merge(self.previous_span());
        Some(Expr::new(ExprKind::Sequence(exprs), span))
    }

    /// Parse an assignment expression (no top-level comma).
    pub(crate) fn parse_assignment(&mut self) -> Option<Expr> {
        self.enter_nesting()?;
        let result = self.parse_assignment_inner();
        self.exit_nesting();
        result
    }

    fn parse_assignment_inner(&mut self) -> Option<Expr> {
        if self.at_arrow_function() {
            return self.parse_arrow_function();
        }

        let target = self.parse_conditional()?;
        let Some(op) = self.match_assign_op() else {
            return Some(target);
        };

        let allow_pattern = op == AssignOp::Assign;
        if !Self::is_assignable(&target, allow_pattern) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side in assignment",
                target.span,
            );
            return None;
        }
        self.advance(); // consume operator
        let value = self.parse_assignment()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn at_arrow_function(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Identifier(_) => *self.look_ahead(1) == TokenKind::Arrow,
            TokenKind::LParen => self.paren_followed_by_arrow(),
            _ => false,
        }
    }

    fn match_assign_op(&self) -> Option<AssignOp> {
        Some(match self.peek_kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            TokenKind::StarStarEq => AssignOp::Exp,
            TokenKind::AmpAmpEq => AssignOp::And,
            TokenKind::PipePipeEq => AssignOp::Or,
            TokenKind::QuestionQuestionEq => AssignOp::Nullish,
            _ => return None,
        })
    }

    /// Whether `expr` can be assigned to.
    ///
    /// Plain assignment and `for … of` heads also accept array and object
    /// literals, which are then destructured.
    pub(crate) fn is_assignable(expr: &Expr, allow_pattern: bool) -> bool {
        match &expr.kind {
            ExprKind::Ident(_) => true,
            ExprKind::Member { optional, .. } => !optional,
            ExprKind::Array(elems) if allow_pattern => {
                let last = elems.len().saturating_sub(1);
                elems.iter().enumerate().all(|(i, elem)| match elem {
                    ArrayElem::Hole => true,
                    ArrayElem::Expr(e) => Self::is_pattern_element(e),
                    ArrayElem::Spread(e) => i == last && Self::is_assignable(e, true),
                })
            }
            ExprKind::Object(props) if allow_pattern => {
                let last = props.len().saturating_sub(1);
                props.iter().enumerate().all(|(i, prop)| match prop {
                    PropDef::Shorthand(_) => true,
                    PropDef::KeyValue(_, value) => Self::is_pattern_element(value),
                    PropDef::Spread(e) => i == last && matches!(e.kind, ExprKind::Ident(_)),
                })
            }
            _ => false,
        }
    }

    /// A destructuring element: a target, optionally with `= default`.
    fn is_pattern_element(expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                ..
            } => Self::is_assignable(target, true),
            _ => Self::is_assignable(expr, true),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Cond = Nullish [ "?" Assign ":" Assign ]`
    fn parse_conditional(&mut self) -> Option<Expr> {
        let test = self.parse_nullish()?;
        if !self.eat(&TokenKind::Question) {
            return Some(test);
        }
        let consequent = self.allow_in(|p| p.parse_assignment())?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = test.span.merge(alternate.span);
        Some(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            span,
        ))
    }

    /// `Nullish = Or { "??" Or }`
    fn parse_nullish(&mut self) -> Option<Expr> {
        let mut left = self.parse_or()?;
        while self.eat(&TokenKind::QuestionQuestion) {
            let right = self.parse_or()?;
            left = logical(left, LogicalOp::Nullish, right);
        }
        Some(left)
    }

    /// `Or = And { "||" And }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = logical(left, LogicalOp::Or, right);
        }
        Some(left)
    }

    /// `And = Equality { "&&" Equality }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AmpAmp) {
            let right = self.parse_equality()?;
            left = logical(left, LogicalOp::And, right);
        }
        Some(left)
    }

    /// `Equality = Relational { ("==" | "!=" | "===" | "!==") Relational }`
    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                TokenKind::EqEqEq => BinOp::StrictEq,
                TokenKind::BangEqEq => BinOp::StrictNotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `Relational = Additive { ("<" | ">" | "<=" | ">=" | "instanceof" | "in") Additive }`
    fn parse_relational(&mut self) -> Option<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinOp::Less,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                TokenKind::InstanceOf => BinOp::InstanceOf,
                TokenKind::In if !self.no_in => BinOp::In,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `Additive = Multiplicative { ("+" | "-") Multiplicative }`
    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `Multiplicative = Exponent { ("*" | "/" | "%") Exponent }`
    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_exponent()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_exponent()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `Exponent = Unary [ "**" Exponent ]`
    ///
    /// A bare unary operand (`-2 ** 2`) is ambiguous and rejected.
    fn parse_exponent(&mut self) -> Option<Expr> {
        let bare_unary = matches!(
            self.peek_kind(),
            TokenKind::Bang | TokenKind::Minus | TokenKind::Plus | TokenKind::TypeOf | TokenKind::Void
        );
        let left = self.parse_unary()?;
        if !self.check(&TokenKind::StarStar) {
            return Some(left);
        }
        if bare_unary {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                "Unary operator used immediately before exponentiation expression. \
                 Parenthesis must be used to disambiguate operator precedence",
            );
            return None;
        }
        self.advance();
        let right = self.parse_exponent()?;
        Some(binary(left, BinOp::Exp, right))
    }

    /// `Unary = ("!" | "-" | "+" | "typeof" | "void") Unary | ("++" | "--") Unary | Postfix`
    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::TypeOf => UnaryOp::TypeOf,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                let target = self.parse_unary()?;
                if !Self::is_assignable(&target, false) {
                    self.error_at(
                        ErrorCode::INVALID_ASSIGNMENT_TARGET,
                        "Invalid left-hand side expression in prefix operation",
                        target.span,
                    );
                    return None;
                }
                let span = start.merge(target.span);
                return Some(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: true,
                        target: Box::new(target),
                    },
                    span,
                ));
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter_nesting()?;
        let operand = self.parse_unary();
        self.exit_nesting();
        let operand = operand?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `Postfix = LeftHandSide [ no-newline ("++" | "--") ]`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let expr = self.parse_left_hand_side()?;
        let op = match self.peek_kind() {
            TokenKind::PlusPlus if !self.newline_before() => UpdateOp::Increment,
            TokenKind::MinusMinus if !self.newline_before() => UpdateOp::Decrement,
            _ => return Some(expr),
        };
        if !Self::is_assignable(&expr, false) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side expression in postfix operation",
                expr.span,
            );
            return None;
        }
        self.advance();
        let span = expr.span.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                target: Box::new(expr),
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Calls, members, `new`
    // ══════════════════════════════════════════════════════════════════════════

    /// Member accesses, calls and optional chains after a primary or `new`.
    fn parse_left_hand_side(&mut self) -> Option<Expr> {
        let base = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        self.parse_call_tail(base, true)
    }

    /// `new Callee(args)`; `new Callee` without arguments is allowed.
    fn parse_new(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `new`
        self.enter_nesting()?;
        let callee = if self.check(&TokenKind::New) {
            self.parse_new()
        } else {
            self.parse_primary()
        };
        self.exit_nesting();
        let callee = self.parse_call_tail(callee?, false)?;
        let args = if self.check(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// Apply `.name`, `[expr]`, `?.` and (when `allow_calls`) `(args)` to `expr`.
    fn parse_call_tail(&mut self, mut expr: Expr, allow_calls: bool) -> Option<Expr> {
        let mut in_chain = false;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    let span = expr.span.merge(name.span);
                    expr = member(expr, MemberKey::Name(name.name), false, span);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.allow_in(|p| p.parse_expression())?;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = member(expr, MemberKey::Computed(Box::new(key)), false, span);
                }
                TokenKind::LParen if allow_calls => {
                    let args = self.parse_arguments()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = call(expr, args, false, span);
                }
                TokenKind::QuestionDot if allow_calls => {
                    self.advance();
                    in_chain = true;
                    expr = match self.peek_kind() {
                        TokenKind::LParen => {
                            let args = self.parse_arguments()?;
                            let span = expr.span.merge(self.previous_span());
                            call(expr, args, true, span)
                        }
                        TokenKind::LBracket => {
                            self.advance();
                            let key = self.allow_in(|p| p.parse_expression())?;
                            self.expect(&TokenKind::RBracket)?;
                            let span = expr.span.merge(self.previous_span());
                            member(expr, MemberKey::Computed(Box::new(key)), true, span)
                        }
                        _ => {
                            let name = self.expect_property_name()?;
                            let span = expr.span.merge(name.span);
                            member(expr, MemberKey::Name(name.name), true, span)
                        }
                    };
                }
                TokenKind::Template(_) | TokenKind::TemplateStart(_) => {
                    // Tagged templates are not supported
                    self.error_unexpected();
                    return None;
                }
                _ => break,
            }
        }
        if in_chain {
            let span = expr.span;
            expr = Expr::new(ExprKind::OptionalChain(Box::new(expr)), span);
        }
        Some(expr)
    }

    /// `( [arg {, arg}] [,] )` where `arg = ["..."] Assign`
    fn parse_arguments(&mut self) -> Option<Vec<Argument>> {
        self.expect(&TokenKind::LParen)?;
        let args = self.allow_in(|p| {
            let mut args = Vec::new();
            while !p.check(&TokenKind::RParen) {
                if p.eat(&TokenKind::DotDotDot) {
                    args.push(Argument::Spread(p.parse_assignment()?));
                } else {
                    args.push(Argument::Expr(p.parse_assignment()?));
                }
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Some(args)
        })?;
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let token = self.peek().clone();
        let span = token.span;
        let kind = match token.kind {
            TokenKind::Number(n) => ExprKind::Number(n),
            TokenKind::String(s) => ExprKind::String(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::This => ExprKind::This,
            TokenKind::Identifier(name) => ExprKind::Ident(name),
            TokenKind::Template(text) => ExprKind::Template(vec![TemplatePart::Literal(text)]),
            TokenKind::TemplateStart(_) => return self.parse_template(),
            TokenKind::LParen => return self.parse_parenthesized(),
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Function => return self.parse_function_expr(),
            _ => {
                self.error_unexpected();
                return None;
            }
        };
        self.advance();
        Some(Expr::new(kind, span))
    }

    /// `( Expression )`
    fn parse_parenthesized(&mut self) -> Option<Expr> {
        self.advance(); // eat `(`
        let expr = self.allow_in(|p| p.parse_expression())?;
        self.expect(&TokenKind::RParen)?;
        Some(expr)
    }

    /// `` `text ${expr} text` ``
    fn parse_template(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let mut parts = Vec::new();
        if let TokenKind::TemplateStart(text) = self.advance().kind {
            if !text.is_empty() {
                parts.push(TemplatePart::Literal(text));
            }
        }
        loop {
            self.expect(&TokenKind::InterpolationStart)?;
            let expr = self.allow_in(|p| p.parse_expression())?;
            parts.push(TemplatePart::Expr(expr));
            self.expect(&TokenKind::InterpolationEnd)?;
            match self.peek_kind().clone() {
                TokenKind::TemplatePart(text) => {
                    self.advance();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Literal(text));
                    }
                }
                TokenKind::TemplateEnd(text) => {
                    self.advance();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Literal(text));
                    }
                    break;
                }
                _ => {
                    self.error_unexpected();
                    return None;
                }
            }
        }
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Template(parts), span))
    }

    /// `[a, , ...rest]`
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `[`
        let elems = self.allow_in(|p| {
            let mut elems = Vec::new();
            loop {
                match p.peek_kind() {
                    TokenKind::RBracket => break,
                    TokenKind::Comma => {
                        p.advance();
                        elems.push(ArrayElem::Hole);
                        continue;
                    }
                    TokenKind::DotDotDot => {
                        p.advance();
                        elems.push(ArrayElem::Spread(p.parse_assignment()?));
                    }
                    _ => elems.push(ArrayElem::Expr(p.parse_assignment()?)),
                }
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Some(elems)
        })?;
        self.expect(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Array(elems), span))
    }

    /// `{ a: 1, b, [k]: v, method() {}, ...other }`
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `{`
        let props = self.allow_in(|p| {
            let mut props = Vec::new();
            while !p.check(&TokenKind::RBrace) {
                props.push(p.parse_property()?);
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
            Some(props)
        })?;
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Object(props), span))
    }

    fn parse_property(&mut self) -> Option<PropDef> {
        if self.eat(&TokenKind::DotDotDot) {
            return Some(PropDef::Spread(self.parse_assignment()?));
        }
        let key_start = self.current_span();
        let (key, shorthand) = self.parse_property_key()?;

        if self.check(&TokenKind::LParen) {
            // Method shorthand: `name(args) { body }`. The name is not bound
            // inside the body; it is taken from the key at runtime.
            let def = self.parse_function_rest(None, key_start)?;
            let span = def.span;
            let value = Expr::new(ExprKind::Function(Rc::new(def)), span);
            return Some(PropDef::KeyValue(key, value));
        }

        if self.eat(&TokenKind::Colon) {
            let value = self.parse_assignment()?;
            return Some(PropDef::KeyValue(key, value));
        }

        match shorthand {
            Some(ident) if matches!(self.peek_kind(), TokenKind::Comma | TokenKind::RBrace) => {
                Some(PropDef::Shorthand(ident))
            }
            Some(ident) if self.check(&TokenKind::Eq) => {
                // Only valid as a destructuring assignment target:
                // `({ a = 1 } = obj)`
                self.advance();
                let default = self.parse_assignment()?;
                let target = Expr::new(ExprKind::Ident(ident.name.clone()), ident.span);
                let span = ident.span.merge(default.span);
                Some(PropDef::KeyValue(
                    PropKey::Static(ident.name),
                    Expr::new(
                        ExprKind::Assign {
                            op: AssignOp::Assign,
                            target: Box::new(target),
                            value: Box::new(default),
                        },
                        span,
                    ),
                ))
            }
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    /// `function [name](params) { body }`
    fn parse_function_expr(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `function`
        let name = if let TokenKind::Identifier(_) = self.peek_kind() {
            self.expect_identifier()
        } else {
            None
        };
        let def = self.parse_function_rest(name, start)?;
        let span = def.span;
        Some(Expr::new(ExprKind::Function(Rc::new(def)), span))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Node constructors
// ══════════════════════════════════════════════════════════════════════════════

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn member(object: Expr, property: MemberKey, optional: bool, span: jsplay_types::Span) -> Expr {
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            property,
            optional,
        },
        span,
    )
}

fn call(callee: Expr, args: Vec<Argument>, optional: bool, span: jsplay_types::Span) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
            optional,
        },
        span,
    )
}
