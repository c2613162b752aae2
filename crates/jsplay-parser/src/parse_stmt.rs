//! Statement parsing.

use std::rc::Rc;

use crate::parser::Parser;
use jsplay_lexer::token::TokenKind;
use jsplay_types::ast::*;
use jsplay_types::ErrorCode;

impl<'src> Parser<'src> {
    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                return None;
            }
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Block { stmts, span })
    }

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        self.enter_nesting()?;
        let stmt = self.parse_statement_inner();
        self.exit_nesting();
        stmt
    }

    fn parse_statement_inner(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_var_decl()?;
                self.consume_semicolon()?;
                Some(Stmt::Var(decl))
            }
            TokenKind::Function => self.parse_function_decl(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::Break | TokenKind::Continue => self.parse_jump_stmt(),
            TokenKind::Throw => self.parse_throw_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::Semicolon => Some(Stmt::Empty(self.advance().span)),
            _ => {
                let expr = self.parse_expression()?;
                let span = expr.span;
                self.consume_semicolon()?;
                Some(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    /// `var|let|const declarator, declarator...` without the terminator.
    pub(crate) fn parse_var_decl(&mut self) -> Option<VarDecl> {
        let start = self.current_span();
        let kind = self.parse_var_kind()?;
        let mut declarations = Vec::new();
        loop {
            let target = self.parse_binding_target()?;
            declarations.push(self.parse_declarator_rest(kind, target)?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let span = start.merge(self.previous_span());
        Some(VarDecl {
            kind,
            declarations,
            span,
        })
    }

    fn parse_var_kind(&mut self) -> Option<VarKind> {
        let kind = match self.peek_kind() {
            TokenKind::Var => VarKind::Var,
            TokenKind::Let => VarKind::Let,
            TokenKind::Const => VarKind::Const,
            _ => {
                self.error_unexpected();
                return None;
            }
        };
        self.advance();
        Some(kind)
    }

    /// The optional `= init` of a declarator whose target is already parsed.
    fn parse_declarator_rest(&mut self, kind: VarKind, target: Pattern) -> Option<VarDeclarator> {
        let init = if self.eat(&TokenKind::Eq) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        if init.is_none() {
            if kind == VarKind::Const {
                self.error_at_current(
                    ErrorCode::MISSING_INITIALIZER,
                    "Missing initializer in const declaration",
                );
                return None;
            }
            if !matches!(target, Pattern::Ident(_)) {
                self.error_at_current(
                    ErrorCode::MISSING_INITIALIZER,
                    "Missing initializer in destructuring declaration",
                );
                return None;
            }
        }
        let span = init
            .as_ref()
            .map_or(target.span(), |e| target.span().merge(e.span));
        Some(VarDeclarator { target, init, span })
    }

    /// `function name(params) { body }`
    fn parse_function_decl(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // eat `function`
        let name = self.expect_identifier()?;
        let def = self.parse_function_rest(Some(name), start)?;
        Some(Stmt::Function(Rc::new(def)))
    }

    /// `return [expr]`
    ///
    /// A line break directly after `return` ends the statement.
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `return`
        let value = if self.check(&TokenKind::Semicolon) || self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = start.merge(self.previous_span());
        self.consume_semicolon()?;
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `if (cond) stmt [else stmt]`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `if`
        let condition = self.parse_paren_condition()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Some(Stmt::If(IfStmt {
            condition,
            consequent,
            alternate,
            span,
        }))
    }

    /// `( expr )` as used by `if`, `while` and `do … while`.
    fn parse_paren_condition(&mut self) -> Option<Expr> {
        self.expect(&TokenKind::LParen)?;
        let condition = self.allow_in(|p| p.parse_expression())?;
        self.expect(&TokenKind::RParen)?;
        Some(condition)
    }

    /// Body of a loop: counts as being inside an iteration statement.
    fn parse_loop_body(&mut self) -> Option<Box<Stmt>> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body.map(Box::new)
    }

    /// `for (init; test; update) body`, `for (x of xs) body`, `for (k in obj) body`
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `for`
        self.expect(&TokenKind::LParen)?;

        let init = match self.peek_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl_start = self.current_span();
                let kind = self.parse_var_kind()?;
                let target = self.parse_binding_target()?;
                if let Some(iter) = self.peek_iter_kind() {
                    self.advance();
                    return self.finish_for_of(start, iter, ForBinding::Decl(kind, target));
                }
                let mut declarations = Vec::new();
                let first = self.with_no_in(|p| p.parse_declarator_rest(kind, target))?;
                declarations.push(first);
                while self.eat(&TokenKind::Comma) {
                    let target = self.parse_binding_target()?;
                    declarations.push(self.with_no_in(|p| p.parse_declarator_rest(kind, target))?);
                }
                let span = decl_start.merge(self.previous_span());
                Some(ForInit::Var(VarDecl {
                    kind,
                    declarations,
                    span,
                }))
            }
            _ => {
                let expr = self.with_no_in(|p| p.parse_expression())?;
                if let Some(iter) = self.peek_iter_kind() {
                    if !Self::is_assignable(&expr, true) {
                        let message = match iter {
                            IterKind::Of => "Invalid left-hand side in for-of loop",
                            IterKind::In => "Invalid left-hand side in for-in loop",
                        };
                        self.error_at(ErrorCode::INVALID_ASSIGNMENT_TARGET, message, expr.span);
                        return None;
                    }
                    self.advance();
                    return self.finish_for_of(start, iter, ForBinding::Target(expr));
                }
                Some(ForInit::Expr(expr))
            }
        };

        self.expect(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::For(ForStmt {
            init,
            test,
            update,
            body,
            span,
        }))
    }

    fn peek_iter_kind(&self) -> Option<IterKind> {
        if self.check_contextual("of") {
            Some(IterKind::Of)
        } else if self.check(&TokenKind::In) {
            Some(IterKind::In)
        } else {
            None
        }
    }

    fn with_no_in<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.no_in, true);
        let result = f(self);
        self.no_in = saved;
        result
    }

    /// The part of a `for … of` / `for … in` after the `of`/`in` keyword.
    fn finish_for_of(
        &mut self,
        start: jsplay_types::Span,
        kind: IterKind,
        binding: ForBinding,
    ) -> Option<Stmt> {
        let iterable = match kind {
            IterKind::Of => self.allow_in(|p| p.parse_assignment())?,
            IterKind::In => self.allow_in(|p| p.parse_expression())?,
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::ForOf(ForOfStmt {
            kind,
            binding,
            iterable,
            body,
            span,
        }))
    }

    /// `while (cond) body`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `while`
        let condition = self.parse_paren_condition()?;
        let body = self.parse_loop_body()?;
        let span = start.merge(self.previous_span());
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `do body while (cond)`
    fn parse_do_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `do`
        let body = self.parse_loop_body()?;
        self.expect(&TokenKind::While)?;
        let condition = self.parse_paren_condition()?;
        let span = start.merge(self.previous_span());
        // A `;` is always inserted after `do … while (…)`
        self.eat(&TokenKind::Semicolon);
        Some(Stmt::DoWhile(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `break` / `continue`
    fn parse_jump_stmt(&mut self) -> Option<Stmt> {
        let token = self.advance();
        if self.loop_depth == 0 {
            let message = if token.kind == TokenKind::Break {
                "Illegal break statement"
            } else {
                "Illegal continue statement: no surrounding iteration statement"
            };
            self.error_at(ErrorCode::ILLEGAL_STATEMENT, message, token.span);
            return None;
        }
        self.consume_semicolon()?;
        Some(if token.kind == TokenKind::Break {
            Stmt::Break(token.span)
        } else {
            Stmt::Continue(token.span)
        })
    }

    /// `throw expr`
    fn parse_throw_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `throw`
        if self.newline_before() {
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "Illegal newline after throw");
            return None;
        }
        let value = self.parse_expression()?;
        let span = start.merge(self.previous_span());
        self.consume_semicolon()?;
        Some(Stmt::Throw(ThrowStmt { value, span }))
    }

    /// `try { } catch (e) { } finally { }`
    fn parse_try_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `try`
        let block = self.parse_block()?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.advance().span;
            let param = if self.eat(&TokenKind::LParen) {
                let param = self.parse_binding_target()?;
                self.expect(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block()?;
            let span = catch_start.merge(body.span);
            Some(CatchClause { param, body, span })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "Missing catch or finally after try");
            return None;
        }

        let span = start.merge(self.previous_span());
        Some(Stmt::Try(TryStmt {
            block,
            handler,
            finalizer,
            span,
        }))
    }
}
