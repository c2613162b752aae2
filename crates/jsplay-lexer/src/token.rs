//! Token types for the jsplay lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the supported JavaScript
//! subset and [`Token`], which pairs a kind with a source [`Span`].

use jsplay_types::Span;
use std::fmt;

/// Reserved words recognised by the lexer.
///
/// `undefined`, `of` and the built-in names are ordinary identifiers.
pub const ALL_KEYWORDS: &[&str] = &[
    // Declarations (4)
    "var", "let", "const", "function",
    // Control flow (14)
    "return", "if", "else", "for", "in", "while", "do", "break", "continue",
    "throw", "try", "catch", "finally", "new",
    // Operators (3)
    "typeof", "void", "instanceof",
    // Literals (4)
    "true", "false", "null", "this",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
    /// A line terminator appeared between the previous token and this one.
    /// Drives automatic semicolon insertion.
    pub newline_before: bool,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
        }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind of the supported JavaScript subset.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal: `42`, `3.14`, `1e3`, `0xff`
    Number(f64),
    /// Quoted string literal: `'hi'` or `"hi"`
    String(String),

    // ── Template literals ────────────────────────────────────

    /// Template with no substitutions: `` `plain` ``
    Template(String),
    /// Text before the first `${` of a template.
    TemplateStart(String),
    /// Text between a `}` and the next `${` inside a template.
    TemplatePart(String),
    /// Text after the last `}` up to the closing backtick.
    TemplateEnd(String),
    /// The `${` that opens a substitution.
    InterpolationStart,
    /// The `}` that closes a substitution.
    InterpolationEnd,

    // ── Identifiers ──────────────────────────────────────────

    /// `count`, `setCount`, `$el`, `_private`
    Identifier(String),

    // ── Keywords ─────────────────────────────────────────────

    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    For,
    In,
    While,
    Do,
    Break,
    Continue,
    Throw,
    Try,
    Catch,
    Finally,
    New,
    TypeOf,
    Void,
    InstanceOf,
    True,
    False,
    Null,
    This,

    // ── Operators ────────────────────────────────────────────

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `!`
    Bang,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    BangEq,
    /// `!==`
    BangEqEq,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEq,
    /// `>=`
    GreaterEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `??`
    QuestionQuestion,
    /// `?`
    Question,
    /// `?.`
    QuestionDot,

    // ── Assignment ───────────────────────────────────────────

    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `**=`
    StarStarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `&&=`
    AmpAmpEq,
    /// `||=`
    PipePipeEq,
    /// `??=`
    QuestionQuestionEq,

    // ── Punctuation ──────────────────────────────────────────

    /// `=>`
    Arrow,
    /// `...`
    DotDotDot,
    /// `.`
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,

    // ── Special ──────────────────────────────────────────────

    /// End of input
    Eof,
}

impl TokenKind {
    /// Look up a reserved word. Returns `None` for ordinary identifiers.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "new" => TokenKind::New,
            "typeof" => TokenKind::TypeOf,
            "void" => TokenKind::Void,
            "instanceof" => TokenKind::InstanceOf,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "this" => TokenKind::This,
            _ => return None,
        })
    }

    /// Returns `true` if this token kind is a reserved word.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Var
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::In
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Throw
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::New
                | TokenKind::TypeOf
                | TokenKind::Void
                | TokenKind::InstanceOf
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
        )
    }

    /// The `SyntaxError` message a browser reports when this token is
    /// found where it is not allowed.
    pub fn unexpected_message(&self) -> String {
        match self {
            TokenKind::Eof => "Unexpected end of input".to_string(),
            TokenKind::Number(_) => "Unexpected number".to_string(),
            TokenKind::String(_) => "Unexpected string".to_string(),
            TokenKind::Template(_) | TokenKind::TemplateStart(_) => {
                "Unexpected template string".to_string()
            }
            TokenKind::Identifier(name) => format!("Unexpected identifier '{name}'"),
            kind => format!("Unexpected token '{kind}'"),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Literals
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::String(s) => write!(f, "'{s}'"),
            TokenKind::Template(s) => write!(f, "`{s}`"),
            TokenKind::TemplateStart(_) => f.write_str("template start"),
            TokenKind::TemplatePart(_) => f.write_str("template part"),
            TokenKind::TemplateEnd(_) => f.write_str("template end"),
            TokenKind::InterpolationStart => f.write_str("${"),
            TokenKind::InterpolationEnd => f.write_str("}"),
            TokenKind::Identifier(s) => f.write_str(s),
            // Keywords
            TokenKind::Var => f.write_str("var"),
            TokenKind::Let => f.write_str("let"),
            TokenKind::Const => f.write_str("const"),
            TokenKind::Function => f.write_str("function"),
            TokenKind::Return => f.write_str("return"),
            TokenKind::If => f.write_str("if"),
            TokenKind::Else => f.write_str("else"),
            TokenKind::For => f.write_str("for"),
            TokenKind::In => f.write_str("in"),
            TokenKind::While => f.write_str("while"),
            TokenKind::Do => f.write_str("do"),
            TokenKind::Break => f.write_str("break"),
            TokenKind::Continue => f.write_str("continue"),
            TokenKind::Throw => f.write_str("throw"),
            TokenKind::Try => f.write_str("try"),
            TokenKind::Catch => f.write_str("catch"),
            TokenKind::Finally => f.write_str("finally"),
            TokenKind::New => f.write_str("new"),
            TokenKind::TypeOf => f.write_str("typeof"),
            TokenKind::Void => f.write_str("void"),
            TokenKind::InstanceOf => f.write_str("instanceof"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Null => f.write_str("null"),
            TokenKind::This => f.write_str("this"),
            // Operators
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::StarStar => f.write_str("**"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::PlusPlus => f.write_str("++"),
            TokenKind::MinusMinus => f.write_str("--"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::EqEqEq => f.write_str("==="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::BangEqEq => f.write_str("!=="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::AmpAmp => f.write_str("&&"),
            TokenKind::PipePipe => f.write_str("||"),
            TokenKind::QuestionQuestion => f.write_str("??"),
            TokenKind::Question => f.write_str("?"),
            TokenKind::QuestionDot => f.write_str("?."),
            // Assignment
            TokenKind::Eq => f.write_str("="),
            TokenKind::PlusEq => f.write_str("+="),
            TokenKind::MinusEq => f.write_str("-="),
            TokenKind::StarEq => f.write_str("*="),
            TokenKind::StarStarEq => f.write_str("**="),
            TokenKind::SlashEq => f.write_str("/="),
            TokenKind::PercentEq => f.write_str("%="),
            TokenKind::AmpAmpEq => f.write_str("&&="),
            TokenKind::PipePipeEq => f.write_str("||="),
            TokenKind::QuestionQuestionEq => f.write_str("??="),
            // Punctuation
            TokenKind::Arrow => f.write_str("=>"),
            TokenKind::DotDotDot => f.write_str("..."),
            TokenKind::Dot => f.write_str("."),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keywords_count() {
        assert_eq!(ALL_KEYWORDS.len(), 25);
    }

    #[test]
    fn test_from_keyword_recognises_all() {
        for &kw in ALL_KEYWORDS {
            assert!(
                TokenKind::from_keyword(kw).is_some(),
                "from_keyword should recognise '{kw}'"
            );
        }
    }

    #[test]
    fn test_from_keyword_returns_none_for_identifiers() {
        let non_keywords = [
            "undefined", "of", "console", "useState", "Let", "NULL", "async",
        ];
        for &name in &non_keywords {
            assert!(
                TokenKind::from_keyword(name).is_none(),
                "from_keyword should not recognise '{name}'"
            );
        }
    }

    #[test]
    fn test_is_keyword_false_for_non_keywords() {
        let kinds = [
            TokenKind::Number(1.0),
            TokenKind::String("x".into()),
            TokenKind::Identifier("x".into()),
            TokenKind::Arrow,
            TokenKind::Eof,
        ];
        for kind in &kinds {
            assert!(!kind.is_keyword(), "is_keyword should be false for {kind:?}");
        }
    }

    #[test]
    fn test_token_defaults_to_same_line() {
        let token = Token::new(TokenKind::Let, Span::new(1, 1, 1, 3));
        assert!(!token.newline_before);
        assert!(token.is_keyword());
    }

    #[test]
    fn test_display_roundtrip_keywords() {
        for &kw in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(kw).unwrap();
            assert_eq!(kind.to_string(), kw);
        }
    }

    #[test]
    fn test_display_operators() {
        assert_eq!(TokenKind::EqEqEq.to_string(), "===");
        assert_eq!(TokenKind::QuestionDot.to_string(), "?.");
        assert_eq!(TokenKind::QuestionQuestionEq.to_string(), "??=");
        assert_eq!(TokenKind::Arrow.to_string(), "=>");
        assert_eq!(TokenKind::DotDotDot.to_string(), "...");
    }

    #[test]
    fn test_unexpected_messages() {
        assert_eq!(TokenKind::RBrace.unexpected_message(), "Unexpected token '}'");
        assert_eq!(TokenKind::Eof.unexpected_message(), "Unexpected end of input");
        assert_eq!(
            TokenKind::Identifier("foo".into()).unexpected_message(),
            "Unexpected identifier 'foo'"
        );
        assert_eq!(TokenKind::Number(3.0).unexpected_message(), "Unexpected number");
        assert_eq!(
            TokenKind::String("a".into()).unexpected_message(),
            "Unexpected string"
        );
        assert_eq!(TokenKind::Else.unexpected_message(), "Unexpected token 'else'");
    }
}
