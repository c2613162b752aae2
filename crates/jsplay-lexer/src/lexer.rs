//! Core lexer: converts source text to a token stream.
//!
//! Features:
//! - Numbers (decimal, fraction, exponent, hex), quoted strings with escapes
//! - Template literals with `${expr}` substitutions via a mode stack
//! - `//` and `/* */` comments skipped
//! - Line terminators recorded on the following token for semicolon insertion
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use jsplay_types::{Diagnostics, ErrorCode, SourceFile, Span, SyntaxDiagnostic};

use crate::token::{Token, TokenKind};

/// Lexer mode: top-level code or somewhere inside a template literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Normal code scanning.
    Normal,
    /// Inside a template literal, scanning text until `` ` `` or `${`.
    Template,
    /// Inside a `${...}` substitution. The `u32` tracks the brace depth so
    /// we know when the substitution's closing `}` is reached.
    Interpolation { brace_depth: u32 },
}

/// The jsplay lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`jsplay_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in bytes).
    col: u32,
    /// Collected errors.
    errors: Diagnostics,
    /// Mode stack for template literals.
    mode_stack: Vec<Mode>,
    /// Pending tokens to emit before the next scan (used for substitutions).
    pending: Vec<Token>,
    /// A line terminator was skipped since the last emitted token.
    saw_newline: bool,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: Diagnostics::empty(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
            saw_newline: false,
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.is_full() {
                break;
            }

            if let Some(pending) = self.pending.pop() {
                tokens.push(pending);
                continue;
            }

            let mut token = match self.current_mode() {
                Mode::Template => self.scan_template_continuation(),
                Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
            };
            token.newline_before = std::mem::take(&mut self.saw_newline);

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Advance if the next byte equals `expected`.
    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn token(&self, kind: TokenKind, start_line: u32, start_col: u32) -> Token {
        Token::new(kind, self.span_from(start_line, start_col))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self
            .source_file
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        let err = SyntaxDiagnostic::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace, line terminators and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b'\n') => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some(b' ' | b'\t' | b'\r' | 0x0b | 0x0c) => {
                    self.advance();
                }
                // U+00A0 NO-BREAK SPACE and U+FEFF BOM
                Some(0xc2) if self.peek_at(1) == Some(0xa0) => {
                    self.advance();
                    self.advance();
                }
                Some(0xef) if self.peek_at(1) == Some(0xbb) && self.peek_at(2) == Some(0xbf) => {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_LITERAL,
                        "Invalid or unexpected token",
                        span,
                    );
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(ch) => {
                    if ch == b'\n' {
                        self.saw_newline = true;
                    }
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in normal (non-template-text) mode.
    fn scan_normal(&mut self) -> Token {
        self.skip_trivia();

        if self.errors.is_full() || self.at_end() {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        let kind = match ch {
            b'\'' | b'"' => return self.scan_string(ch, start_line, start_col),
            b'`' => return self.scan_template(start_line, start_col),
            b'0'..=b'9' => return self.scan_number(start_pos, start_line, start_col),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => {
                return self.scan_number(start_pos, start_line, start_col)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => {
                return self.scan_identifier(start_pos, start_line, start_col)
            }

            b'+' => {
                if self.eat(b'+') {
                    TokenKind::PlusPlus
                } else if self.eat(b'=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            b'-' => {
                if self.eat(b'-') {
                    TokenKind::MinusMinus
                } else if self.eat(b'=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            b'*' => {
                if self.eat(b'*') {
                    if self.eat(b'=') {
                        TokenKind::StarStarEq
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.eat(b'=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            b'/' => {
                // Comments were consumed by skip_trivia, so this is division
                if self.eat(b'=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            b'%' => {
                if self.eat(b'=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            b'=' => {
                if self.eat(b'=') {
                    if self.eat(b'=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.eat(b'>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            b'!' => {
                if self.eat(b'=') {
                    if self.eat(b'=') {
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            b'<' => {
                if self.eat(b'=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            b'&' if self.peek() == Some(b'&') => {
                self.advance();
                if self.eat(b'=') {
                    TokenKind::AmpAmpEq
                } else {
                    TokenKind::AmpAmp
                }
            }
            b'|' if self.peek() == Some(b'|') => {
                self.advance();
                if self.eat(b'=') {
                    TokenKind::PipePipeEq
                } else {
                    TokenKind::PipePipe
                }
            }
            b'?' => {
                if self.eat(b'?') {
                    if self.eat(b'=') {
                        TokenKind::QuestionQuestionEq
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else if self.peek() == Some(b'.')
                    && !matches!(self.peek_at(1), Some(b'0'..=b'9'))
                {
                    // `a?.5:b` is a conditional, not optional chaining
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }
            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,

            b'{' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }

            b'}' => {
                if let Mode::Interpolation { brace_depth } = self.current_mode() {
                    if brace_depth == 0 {
                        // This `}` ends the substitution; back to template text
                        self.pop_mode();
                        self.push_mode(Mode::Template);
                        return self.token(TokenKind::InterpolationEnd, start_line, start_col);
                    }
                    if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut()
                    {
                        *brace_depth -= 1;
                    }
                }
                TokenKind::RBrace
            }

            _ => {
                // Skip the rest of a multi-byte UTF-8 sequence
                while matches!(self.peek(), Some(0x80..=0xbf)) {
                    self.advance();
                }
                let span = self.span_from(start_line, start_col);
                self.emit_error(ErrorCode::INVALID_TOKEN, "Invalid or unexpected token", span);
                return self.scan_normal();
            }
        };

        self.token(kind, start_line, start_col)
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> Token {
        let first = self.source[start_pos];

        if first == b'0' && matches!(self.peek(), Some(b'x' | b'X')) {
            self.advance();
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = std::str::from_utf8(&self.source[digits_start..self.pos]).unwrap_or("");
            return match u64::from_str_radix(digits, 16) {
                Ok(value) => self.token(TokenKind::Number(value as f64), start_line, start_col),
                Err(_) => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(ErrorCode::INVALID_TOKEN, "Invalid or unexpected token", span);
                    Token::new(TokenKind::Number(0.0), span)
                }
            };
        }

        // Integer part (the first digit or `.` was already consumed)
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }

        // Fraction
        if first != b'.' && self.peek() == Some(b'.') {
            self.advance();
            while let Some(b'0'..=b'9') = self.peek() {
                self.advance();
            }
        }

        // Exponent
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let has_sign = matches!(self.peek_at(1), Some(b'+' | b'-'));
            let digit_at = if has_sign { 2 } else { 1 };
            if matches!(self.peek_at(digit_at), Some(b'0'..=b'9')) {
                self.advance();
                if has_sign {
                    self.advance();
                }
                while let Some(b'0'..=b'9') = self.peek() {
                    self.advance();
                }
            }
        }

        let span = self.span_from(start_line, start_col);

        // `3in` or `1abc` are not valid numeric literals
        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == b'_' || c == b'$') {
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_' || c == b'$')
            {
                self.advance();
            }
            let span = self.span_from(start_line, start_col);
            self.emit_error(ErrorCode::INVALID_TOKEN, "Invalid or unexpected token", span);
            return Token::new(TokenKind::Number(0.0), span);
        }

        let text = std::str::from_utf8(&self.source[start_pos..self.pos]).unwrap_or("0");
        let value: f64 = text.parse().unwrap_or(f64::NAN);
        Token::new(TokenKind::Number(value), span)
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> Token {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$' {
                self.advance();
            } else {
                break;
            }
        }

        let text = std::str::from_utf8(&self.source[start_pos..self.pos]).unwrap_or("");
        let kind =
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        self.token(kind, start_line, start_col)
    }

    // ─────────────────────────────────────────────────────────────
    // Quoted strings
    // ─────────────────────────────────────────────────────────────

    /// Scan a `'…'` or `"…"` literal after the opening quote.
    fn scan_string(&mut self, quote: u8, start_line: u32, start_col: u32) -> Token {
        let mut buf = Vec::new();

        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_LITERAL,
                        "Invalid or unexpected token",
                        span,
                    );
                    return Token::new(TokenKind::String(into_string(buf)), span);
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return self.token(TokenKind::String(into_string(buf)), start_line, start_col);
                }
                Some(b'\\') => self.scan_escape_sequence(&mut buf),
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Template literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a template literal after the opening backtick.
    ///
    /// Produces `Template` for a template without substitutions, otherwise
    /// `TemplateStart` followed by a queued `InterpolationStart`.
    fn scan_template(&mut self, start_line: u32, start_col: u32) -> Token {
        match self.scan_template_text() {
            TemplateStop::Closed(text) => {
                self.token(TokenKind::Template(text), start_line, start_col)
            }
            TemplateStop::Substitution(text, interp_span) => {
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                self.pending
                    .push(Token::new(TokenKind::InterpolationStart, interp_span));
                self.token(TokenKind::TemplateStart(text), start_line, start_col)
            }
            TemplateStop::Unterminated(text) => {
                Token::new(TokenKind::Template(text), self.span_from(start_line, start_col))
            }
        }
    }

    /// Continue scanning template text after a substitution ends.
    /// Called when we're in `Mode::Template`.
    fn scan_template_continuation(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        match self.scan_template_text() {
            TemplateStop::Closed(text) | TemplateStop::Unterminated(text) => {
                self.pop_mode();
                Token::new(TokenKind::TemplateEnd(text), self.span_from(start_line, start_col))
            }
            TemplateStop::Substitution(text, interp_span) => {
                self.pop_mode();
                self.push_mode(Mode::Interpolation { brace_depth: 0 });
                self.pending
                    .push(Token::new(TokenKind::InterpolationStart, interp_span));
                Token::new(TokenKind::TemplatePart(text), self.span_from(start_line, start_col))
            }
        }
    }

    /// Read template text up to the closing backtick or the next `${`.
    fn scan_template_text(&mut self) -> TemplateStop {
        let start_line = self.line;
        let start_col = self.col;
        let mut buf = Vec::new();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_LITERAL,
                        "Unterminated template literal",
                        span,
                    );
                    return TemplateStop::Unterminated(into_string(buf));
                }
                Some(b'`') => {
                    self.advance();
                    return TemplateStop::Closed(into_string(buf));
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    let line = self.line;
                    let col = self.col;
                    self.advance();
                    self.advance();
                    let span = self.span_from(line, col);
                    return TemplateStop::Substitution(into_string(buf), span);
                }
                Some(b'\\') => self.scan_escape_sequence(&mut buf),
                Some(b'\r') => {
                    // Template text normalises CRLF to LF
                    self.advance();
                    if self.peek() != Some(b'\n') {
                        buf.push(b'\n');
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Escapes
    // ─────────────────────────────────────────────────────────────

    /// Scan an escape sequence starting at the `\`, appending the decoded
    /// character to `buf`.
    fn scan_escape_sequence(&mut self, buf: &mut Vec<u8>) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // consume the '\'

        let decoded = match self.advance() {
            Some(b'n') => '\n',
            Some(b't') => '\t',
            Some(b'r') => '\r',
            Some(b'b') => '\u{8}',
            Some(b'f') => '\u{c}',
            Some(b'v') => '\u{b}',
            Some(b'0') if !matches!(self.peek(), Some(b'0'..=b'9')) => '\0',
            // Line continuation
            Some(b'\n') => return,
            Some(b'\r') => {
                self.eat(b'\n');
                return;
            }
            Some(b'x') => match self.read_hex_digits(2) {
                Some(code) => char::from_u32(code).unwrap_or('\u{fffd}'),
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::INVALID_ESCAPE,
                        "Invalid hexadecimal escape sequence",
                        span,
                    );
                    return;
                }
            },
            Some(b'u') => match self.read_unicode_escape() {
                Some(ch) => ch,
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::INVALID_ESCAPE,
                        "Invalid Unicode escape sequence",
                        span,
                    );
                    return;
                }
            },
            Some(ch) => {
                // Unknown escapes stand for the character itself
                buf.push(ch);
                while matches!(self.peek(), Some(0x80..=0xbf)) {
                    if let Some(cont) = self.advance() {
                        buf.push(cont);
                    }
                }
                return;
            }
            None => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNTERMINATED_LITERAL,
                    "Invalid or unexpected token",
                    span,
                );
                return;
            }
        };

        let mut tmp = [0u8; 4];
        buf.extend_from_slice(decoded.encode_utf8(&mut tmp).as_bytes());
    }

    fn read_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = (self.peek()? as char).to_digit(16)?;
            self.advance();
            value = value * 16 + digit;
        }
        Some(value)
    }

    /// `\uXXXX` or `\u{X…}` (after the `u`).
    fn read_unicode_escape(&mut self) -> Option<char> {
        if self.eat(b'{') {
            let mut value = 0u32;
            let mut digits = 0;
            while let Some(digit) = self.peek().and_then(|c| (c as char).to_digit(16)) {
                self.advance();
                value = value.checked_mul(16)?.checked_add(digit)?;
                digits += 1;
            }
            if digits == 0 || !self.eat(b'}') {
                return None;
            }
            return char::from_u32(value);
        }
        let code = self.read_hex_digits(4)?;
        // Lone surrogates cannot be represented in a Rust string
        Some(char::from_u32(code).unwrap_or('\u{fffd}'))
    }
}

/// Where template text scanning stopped.
enum TemplateStop {
    Closed(String),
    Substitution(String, Span),
    Unterminated(String),
}

fn into_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
