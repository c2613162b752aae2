//! Core parser infrastructure: token cursor, error reporting, helpers.

use jsplay_lexer::token::{Token, TokenKind};
use jsplay_types::ast::{Ident, Program};
use jsplay_types::{Diagnostics, ErrorCode, SourceFile, Span, SyntaxDiagnostic};

/// Maximum nesting of statements and expressions.
///
/// The evaluator walks the tree recursively, so the parser refuses inputs
/// that would nest deeper than it can safely evaluate.
pub const MAX_NESTING_DEPTH: u32 = 64;

/// The jsplay parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and attempts recovery when possible.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context and function source capture.
    pub(crate) source_file: &'src SourceFile,
    /// File name for error messages.
    file_name: String,
    /// Collected errors.
    errors: Diagnostics,
    /// Current statement/expression nesting depth.
    pub(crate) depth: u32,
    /// Enclosing loops in the current function body (for `break`/`continue`).
    pub(crate) loop_depth: u32,
    /// `in` is not a binary operator here (head of a `for` statement).
    pub(crate) no_in: bool,
}

/// Result of parsing.
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::point(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            file_name: source_file.name.clone(),
            source_file,
            errors: Diagnostics::empty(),
            depth: 0,
            loop_depth: 0,
            no_in: false,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        // `new` guarantees the stream is non-empty and ends with Eof
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Whether a line terminator precedes the current token.
    pub(crate) fn newline_before(&self) -> bool {
        self.peek().newline_before
    }

    /// Current identifier is the contextual word `word` (`of`, `get`, ...).
    pub(crate) fn check_contextual(&self, word: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Identifier(name) if name == word)
    }

    /// Starting at a `(`, find whether the matching `)` is followed by `=>`.
    pub(crate) fn paren_followed_by_arrow(&self) -> bool {
        let mut depth = 0usize;
        let mut idx = self.pos;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(idx + 1),
                            Some(next) if next.kind == TokenKind::Arrow && !next.newline_before
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    // ── Semicolons ────────────────────────────────────────────────────────────

    /// Whether a statement may end here without an explicit `;`.
    pub(crate) fn can_insert_semicolon(&self) -> bool {
        self.at_end() || self.check(&TokenKind::RBrace) || self.newline_before()
    }

    /// Consume a statement terminator: an explicit `;`, or an inserted one
    /// before a line break, a `}` or the end of input.
    pub(crate) fn consume_semicolon(&mut self) -> Option<()> {
        if self.eat(&TokenKind::Semicolon) || self.can_insert_semicolon() {
            Some(())
        } else {
            self.error_unexpected();
            None
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            self.error_unexpected();
            None
        }
    }

    /// Expect an identifier token. Returns the name and span.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    /// Expect a property name after `.`: identifiers and reserved words
    /// are both allowed (`promise.catch`, `obj.new`).
    pub(crate) fn expect_property_name(&mut self) -> Option<Ident> {
        let kind = self.peek_kind().clone();
        match &kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ if kind.is_keyword() => {
                let span = self.advance().span;
                Some(Ident::new(kind.to_string(), span))
            }
            _ => {
                self.error_unexpected();
                None
            }
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report the current token as unexpected, worded like a browser would.
    pub(crate) fn error_unexpected(&mut self) {
        let kind = self.peek_kind();
        let code = if *kind == TokenKind::Eof {
            ErrorCode::UNEXPECTED_END
        } else {
            ErrorCode::UNEXPECTED_TOKEN
        };
        let message = kind.unexpected_message();
        self.error_at_current(code, message);
    }

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self
            .source_file
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        let error = SyntaxDiagnostic::new(&self.file_name, code, message, span, source_line);
        self.errors.push(error);
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    /// Enter one level of nesting; reports and fails past the limit.
    pub(crate) fn enter_nesting(&mut self) -> Option<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("Maximum nesting depth of {MAX_NESTING_DEPTH} exceeded"),
            );
            self.depth -= 1;
            return None;
        }
        Some(())
    }

    pub(crate) fn exit_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` with `in` re-enabled as a binary operator (inside brackets,
    /// parentheses and function bodies).
    pub(crate) fn allow_in<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until we reach a synchronization point.
    /// Used after an error to resume at a known-good position.
    pub(crate) fn synchronize(&mut self) {
        // Always make progress past the offending token
        if !self.at_end() {
            self.advance();
        }
        while !self.at_end() {
            if self.eat(&TokenKind::Semicolon) {
                return;
            }
            if self.newline_before() {
                return;
            }
            match self.peek_kind() {
                TokenKind::Var
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::RBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a `Program` AST.
    ///
    /// The program is parsed as a function body, so a top-level `return`
    /// is allowed.
    pub fn parse(mut self) -> ParseResult {
        let start = self.current_span();
        let mut body = Vec::new();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            if self.check(&TokenKind::RBrace) {
                self.error_unexpected();
                self.advance();
                continue;
            }
            match self.parse_statement() {
                Some(stmt) => body.push(stmt),
                None => self.synchronize(),
            }
        }
        let span = start.merge(self.previous_span());
        let program = if self.errors.has_errors() {
            None
        } else {
            Some(Program { body, span })
        };
        ParseResult {
            program,
            errors: self.errors,
        }
    }
}
