//! Lexer tests.
//!
//! Covers: keywords, operators, numeric and string literals, escapes,
//! template literals with nested substitutions, comments, newline tracking,
//! error recovery, and the 100-iteration determinism test.

use jsplay_lexer::{Lexer, TokenKind, ALL_KEYWORDS};
use jsplay_types::SourceFile;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return just the token kinds (excluding final Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    let sf = SourceFile::new("test.js", source);
    let result = Lexer::new(&sf).lex();
    result
        .tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex and return the error count.
fn error_count(source: &str) -> usize {
    let sf = SourceFile::new("test.js", source);
    Lexer::new(&sf).lex().errors.total_errors
}

/// Lex and return the first error message.
fn first_error(source: &str) -> String {
    let sf = SourceFile::new("test.js", source);
    let result = Lexer::new(&sf).lex();
    result
        .errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_default()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

fn string(text: &str) -> TokenKind {
    TokenKind::String(text.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Keywords & identifiers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_every_keyword_lexes_as_keyword() {
    for kw in ALL_KEYWORDS {
        let toks = kinds(kw);
        assert_eq!(toks.len(), 1, "keyword {kw}");
        assert!(toks[0].is_keyword(), "{kw} should be a keyword");
    }
}

#[test]
fn test_contextual_names_are_identifiers() {
    assert_eq!(
        kinds("undefined of console useState"),
        vec![
            ident("undefined"),
            ident("of"),
            ident("console"),
            ident("useState")
        ]
    );
}

#[test]
fn test_identifier_with_dollar_and_underscore() {
    assert_eq!(kinds("$el _private a1"), vec![ident("$el"), ident("_private"), ident("a1")]);
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(kinds("letter iffy"), vec![ident("letter"), ident("iffy")]);
}

// ─────────────────────────────────────────────────────────────────────
// Operators & punctuation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_arithmetic_operators() {
    assert_eq!(
        kinds("+ - * / % ** ++ --"),
        vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::StarStar,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
        ]
    );
}

#[test]
fn test_comparison_operators() {
    assert_eq!(
        kinds("== === != !== < > <= >="),
        vec![
            TokenKind::EqEq,
            TokenKind::EqEqEq,
            TokenKind::BangEq,
            TokenKind::BangEqEq,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEq,
            TokenKind::GreaterEq,
        ]
    );
}

#[test]
fn test_logical_and_nullish_operators() {
    assert_eq!(
        kinds("&& || ?? ! ?. ?"),
        vec![
            TokenKind::AmpAmp,
            TokenKind::PipePipe,
            TokenKind::QuestionQuestion,
            TokenKind::Bang,
            TokenKind::QuestionDot,
            TokenKind::Question,
        ]
    );
}

#[test]
fn test_assignment_operators() {
    assert_eq!(
        kinds("= += -= *= /= %= **= &&= ||= ??="),
        vec![
            TokenKind::Eq,
            TokenKind::PlusEq,
            TokenKind::MinusEq,
            TokenKind::StarEq,
            TokenKind::SlashEq,
            TokenKind::PercentEq,
            TokenKind::StarStarEq,
            TokenKind::AmpAmpEq,
            TokenKind::PipePipeEq,
            TokenKind::QuestionQuestionEq,
        ]
    );
}

#[test]
fn test_punctuation() {
    assert_eq!(
        kinds("( ) { } [ ] , : ; . ... =>"),
        vec![
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Comma,
            TokenKind::Colon,
            TokenKind::Semicolon,
            TokenKind::Dot,
            TokenKind::DotDotDot,
            TokenKind::Arrow,
        ]
    );
}

#[test]
fn test_question_dot_before_digit_is_conditional() {
    assert_eq!(
        kinds("a?.5:b"),
        vec![
            ident("a"),
            TokenKind::Question,
            TokenKind::Number(0.5),
            TokenKind::Colon,
            ident("b"),
        ]
    );
}

#[test]
fn test_optional_chain_tokens() {
    assert_eq!(
        kinds("user?.profile?.[0]"),
        vec![
            ident("user"),
            TokenKind::QuestionDot,
            ident("profile"),
            TokenKind::QuestionDot,
            TokenKind::LBracket,
            TokenKind::Number(0.0),
            TokenKind::RBracket,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_number_forms() {
    assert_eq!(
        kinds("0 42 3.14 .5 1e3 2.5E-2 0xff"),
        vec![
            TokenKind::Number(0.0),
            TokenKind::Number(42.0),
            TokenKind::Number(3.14),
            TokenKind::Number(0.5),
            TokenKind::Number(1000.0),
            TokenKind::Number(0.025),
            TokenKind::Number(255.0),
        ]
    );
}

#[test]
fn test_member_access_on_integer_result() {
    // `1.toString` would be invalid, but `x.y` after a number is common
    assert_eq!(
        kinds("arr.length"),
        vec![ident("arr"), TokenKind::Dot, ident("length")]
    );
}

#[test]
fn test_number_followed_by_letters_is_error() {
    assert_eq!(error_count("3abc"), 1);
    assert_eq!(first_error("3abc"), "Invalid or unexpected token");
}

// ─────────────────────────────────────────────────────────────────────
// Strings
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_single_and_double_quoted_strings() {
    assert_eq!(
        kinds(r#"'hello' "world""#),
        vec![string("hello"), string("world")]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds(r#"'a\nb\t\'q\'' "\x41B\u{1F600}""#),
        vec![string("a\nb\t'q'"), string("AB\u{1F600}")]
    );
}

#[test]
fn test_unknown_escape_keeps_character() {
    assert_eq!(kinds(r"'\d\한'"), vec![string("d한")]);
}

#[test]
fn test_line_continuation_in_string() {
    assert_eq!(kinds("'ab\\\ncd'"), vec![string("abcd")]);
}

#[test]
fn test_non_ascii_string_content() {
    assert_eq!(
        kinds("'코드가 성공적으로 실행되었습니다.'"),
        vec![string("코드가 성공적으로 실행되었습니다.")]
    );
}

#[test]
fn test_unterminated_string() {
    assert_eq!(first_error("'abc"), "Invalid or unexpected token");
    assert_eq!(first_error("'abc\n'"), "Invalid or unexpected token");
}

#[test]
fn test_invalid_hex_escape() {
    assert_eq!(first_error(r"'\xZZ'"), "Invalid hexadecimal escape sequence");
    assert_eq!(first_error(r"'\u12'"), "Invalid Unicode escape sequence");
}

// ─────────────────────────────────────────────────────────────────────
// Template literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_plain_template() {
    assert_eq!(
        kinds("`hello world`"),
        vec![TokenKind::Template("hello world".into())]
    );
}

#[test]
fn test_template_with_substitution() {
    assert_eq!(
        kinds("`count: ${n}!`"),
        vec![
            TokenKind::TemplateStart("count: ".into()),
            TokenKind::InterpolationStart,
            ident("n"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("!".into()),
        ]
    );
}

#[test]
fn test_template_with_two_substitutions() {
    assert_eq!(
        kinds("`${a} and ${b}`"),
        vec![
            TokenKind::TemplateStart("".into()),
            TokenKind::InterpolationStart,
            ident("a"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplatePart(" and ".into()),
            TokenKind::InterpolationStart,
            ident("b"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("".into()),
        ]
    );
}

#[test]
fn test_template_substitution_with_object_literal() {
    let toks = kinds("`${ {a: 1}.a }`");
    assert_eq!(toks[2], TokenKind::LBrace);
    assert!(toks.contains(&TokenKind::RBrace));
    assert_eq!(toks[toks.len() - 2], TokenKind::InterpolationEnd);
    assert_eq!(toks[toks.len() - 1], TokenKind::TemplateEnd("".into()));
}

#[test]
fn test_nested_template() {
    let toks = kinds("`a${`b${c}`}d`");
    assert_eq!(
        toks,
        vec![
            TokenKind::TemplateStart("a".into()),
            TokenKind::InterpolationStart,
            TokenKind::TemplateStart("b".into()),
            TokenKind::InterpolationStart,
            ident("c"),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("".into()),
            TokenKind::InterpolationEnd,
            TokenKind::TemplateEnd("d".into()),
        ]
    );
}

#[test]
fn test_template_spans_lines() {
    assert_eq!(
        kinds("`line1\nline2`"),
        vec![TokenKind::Template("line1\nline2".into())]
    );
}

#[test]
fn test_unterminated_template() {
    assert_eq!(first_error("`abc"), "Unterminated template literal");
}

// ─────────────────────────────────────────────────────────────────────
// Comments & newlines
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_line_comment_skipped() {
    assert_eq!(
        kinds("// 여기에 코드를 작성하세요\nx"),
        vec![ident("x")]
    );
}

#[test]
fn test_block_comment_skipped() {
    assert_eq!(kinds("a /* note */ b"), vec![ident("a"), ident("b")]);
}

#[test]
fn test_unterminated_block_comment() {
    assert_eq!(first_error("a /* never closed"), "Invalid or unexpected token");
}

#[test]
fn test_newline_before_flag() {
    let sf = SourceFile::new("test.js", "a\nb c /*\n*/ d");
    let tokens = Lexer::new(&sf).lex().tokens;
    let flags: Vec<bool> = tokens.iter().map(|t| t.newline_before).collect();
    // a, b, c, d, Eof
    assert_eq!(flags, vec![false, true, false, true, false]);
}

#[test]
fn test_spans_are_one_based() {
    let sf = SourceFile::new("test.js", "let x = 10;\n  y");
    let tokens = Lexer::new(&sf).lex().tokens;
    assert_eq!(tokens[0].span.start_line, 1);
    assert_eq!(tokens[0].span.start_col, 1);
    assert_eq!(tokens[0].span.end_col, 3);
    let y = &tokens[5];
    assert_eq!(y.kind, ident("y"));
    assert_eq!(y.span.start_line, 2);
    assert_eq!(y.span.start_col, 3);
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_character_recovers() {
    let toks = kinds("a # b");
    assert_eq!(toks, vec![ident("a"), ident("b")]);
    assert_eq!(error_count("a # b"), 1);
}

#[test]
fn test_non_ascii_identifier_rejected() {
    assert_eq!(first_error("let 변수 = 1"), "Invalid or unexpected token");
}

#[test]
fn test_error_cap() {
    let source = "#".repeat(30);
    let sf = SourceFile::new("test.js", source);
    let result = Lexer::new(&sf).lex();
    assert!(result.errors.is_full());
    assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
}

#[test]
fn test_empty_source_is_just_eof() {
    let sf = SourceFile::new("test.js", "");
    let tokens = Lexer::new(&sf).lex().tokens;
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

// ─────────────────────────────────────────────────────────────────────
// Realistic snippets
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_use_state_destructuring() {
    assert_eq!(
        kinds("const [count, setCount] = useState(0);"),
        vec![
            TokenKind::Const,
            TokenKind::LBracket,
            ident("count"),
            TokenKind::Comma,
            ident("setCount"),
            TokenKind::RBracket,
            TokenKind::Eq,
            ident("useState"),
            TokenKind::LParen,
            TokenKind::Number(0.0),
            TokenKind::RParen,
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn test_arrow_with_spread() {
    assert_eq!(
        kinds("(...args) => args"),
        vec![
            TokenKind::LParen,
            TokenKind::DotDotDot,
            ident("args"),
            TokenKind::RParen,
            TokenKind::Arrow,
            ident("args"),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_determinism_100_iterations() {
    let source = "useEffect(() => {\n  const id = setInterval(() => console.log(`tick ${n}`), 1000);\n  return () => clearInterval(id);\n}, []);";
    let first = kinds(source);
    for _ in 0..100 {
        assert_eq!(kinds(source), first);
    }
}
