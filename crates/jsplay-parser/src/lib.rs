//! jsplay parser: converts a token stream into an AST.

mod parse_expr;
mod parse_pattern;
mod parse_stmt;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING_DEPTH};

use jsplay_lexer::Lexer;
use jsplay_types::SourceFile;

/// Lex and parse a source file in one step.
///
/// Lexer diagnostics take precedence: when the token stream is already
/// known to be broken the parser is not run, so the first reported error
/// is the one closest to the real mistake.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    if lexed.errors.has_errors() {
        return ParseResult {
            program: None,
            errors: lexed.errors,
        };
    }
    Parser::new(lexed.tokens, source_file).parse()
}
