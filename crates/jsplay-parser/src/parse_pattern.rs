//! Binding patterns, parameter lists and function bodies.
//!
//! Shared by declarations (`const [a, b] = …`), function and arrow
//! parameters, `catch` parameters and `for … of` heads.

use std::rc::Rc;

use crate::parser::Parser;
use jsplay_lexer::token::TokenKind;
use jsplay_types::ast::*;
use jsplay_types::Span;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Patterns
    // ══════════════════════════════════════════════════════════════════════════

    /// An identifier, array pattern or object pattern.
    pub(crate) fn parse_binding_target(&mut self) -> Option<Pattern> {
        match self.peek_kind() {
            TokenKind::Identifier(_) => self.expect_identifier().map(Pattern::Ident),
            TokenKind::LBracket => self.parse_array_pattern().map(Pattern::Array),
            TokenKind::LBrace => self.parse_object_pattern().map(Pattern::Object),
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    /// A binding target with an optional `= default`.
    pub(crate) fn parse_binding_element(&mut self) -> Option<PatternElem> {
        let target = self.parse_binding_target()?;
        let default = if self.eat(&TokenKind::Eq) {
            Some(self.allow_in(|p| p.parse_assignment())?)
        } else {
            None
        };
        Some(PatternElem { target, default })
    }

    /// `[a, , b = 1, ...rest]`
    fn parse_array_pattern(&mut self) -> Option<ArrayPattern> {
        let start = self.advance().span; // eat `[`
        let mut elements = Vec::new();
        let mut rest = None;
        loop {
            match self.peek_kind() {
                TokenKind::RBracket => break,
                TokenKind::Comma => {
                    self.advance();
                    elements.push(None);
                    continue;
                }
                TokenKind::DotDotDot => {
                    self.advance();
                    rest = Some(Box::new(self.parse_binding_target()?));
                    break;
                }
                _ => elements.push(Some(self.parse_binding_element()?)),
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        let span = start.merge(self.previous_span());
        Some(ArrayPattern {
            elements,
            rest,
            span,
        })
    }

    /// `{ a, b: renamed, c = 1, ...rest }`
    fn parse_object_pattern(&mut self) -> Option<ObjectPattern> {
        let start = self.advance().span; // eat `{`
        let mut props = Vec::new();
        let mut rest = None;
        while !self.check(&TokenKind::RBrace) {
            if self.eat(&TokenKind::DotDotDot) {
                rest = Some(self.expect_identifier()?);
                break;
            }
            let (key, shorthand) = self.parse_property_key()?;
            let value = if self.eat(&TokenKind::Colon) {
                self.parse_binding_element()?
            } else if let Some(ident) = shorthand {
                let default = if self.eat(&TokenKind::Eq) {
                    Some(self.allow_in(|p| p.parse_assignment())?)
                } else {
                    None
                };
                PatternElem {
                    target: Pattern::Ident(ident),
                    default,
                }
            } else {
                self.error_unexpected();
                return None;
            };
            props.push(ObjectPatternProp { key, value });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(ObjectPattern { props, rest, span })
    }

    /// A property name in an object literal or pattern.
    ///
    /// The second value is the identifier when the key was a plain
    /// identifier, which is what makes shorthand `{ a }` legal.
    pub(crate) fn parse_property_key(&mut self) -> Option<(PropKey, Option<Ident>)> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                let ident = Ident::new(name.clone(), token.span);
                Some((PropKey::Static(name), Some(ident)))
            }
            TokenKind::String(s) => {
                self.advance();
                Some((PropKey::Static(s), None))
            }
            TokenKind::Number(n) => {
                self.advance();
                Some((PropKey::Static(number_key(n)), None))
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.allow_in(|p| p.parse_assignment())?;
                self.expect(&TokenKind::RBracket)?;
                Some((PropKey::Computed(Box::new(expr)), None))
            }
            ref kind if kind.is_keyword() => {
                self.advance();
                Some((PropKey::Static(kind.to_string()), None))
            }
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// `(a, b = 1, ...rest)`
    fn parse_params(&mut self) -> Option<(Vec<PatternElem>, Option<Pattern>)> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut rest = None;
        while !self.check(&TokenKind::RParen) {
            if self.eat(&TokenKind::DotDotDot) {
                rest = Some(self.parse_binding_target()?);
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some((params, rest))
    }

    /// A `{ … }` function body, parsed outside any enclosing loop.
    fn parse_function_body(&mut self) -> Option<Block> {
        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.allow_in(|p| p.parse_block());
        self.loop_depth = saved_loops;
        body
    }

    /// Parameters and body of a `function`, once the keyword and optional
    /// name are consumed. `start` is the span of the `function` keyword (or
    /// of the method name) so the source text can be captured.
    pub(crate) fn parse_function_rest(
        &mut self,
        name: Option<Ident>,
        start: Span,
    ) -> Option<FunctionDef> {
        let (params, rest) = self.parse_params()?;
        let body = self.parse_function_body()?;
        let span = start.merge(self.previous_span());
        Some(FunctionDef {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            is_arrow: false,
            source: self.source_text(span),
            span,
        })
    }

    /// `x => …` or `(a, b) => …`; the caller has checked for the arrow.
    pub(crate) fn parse_arrow_function(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let (params, rest) = if let TokenKind::Identifier(_) = self.peek_kind() {
            let ident = self.expect_identifier()?;
            let param = PatternElem {
                target: Pattern::Ident(ident),
                default: None,
            };
            (vec![param], None)
        } else {
            self.parse_params()?
        };
        self.expect(&TokenKind::Arrow)?;

        let body = if self.check(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
            let expr = self.parse_assignment();
            self.loop_depth = saved_loops;
            FunctionBody::Expr(Box::new(expr?))
        };

        let span = start.merge(self.previous_span());
        let def = FunctionDef {
            name: None,
            params,
            rest,
            body,
            is_arrow: true,
            source: self.source_text(span),
            span,
        };
        Some(Expr::new(ExprKind::Function(Rc::new(def)), span))
    }

    pub(crate) fn source_text(&self, span: Span) -> String {
        self.source_file.slice(span).unwrap_or_default().to_string()
    }
}

/// Property name for a numeric key: `{ 1: 'a' }` has the key `"1"`.
fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
