//! Shared types for the jsplay script runner.
//!
//! This crate defines the AST node types, source spans, syntax diagnostics,
//! and other shared data structures used by the lexer, parser and evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{Diagnostics, ErrorCategory, ErrorCode, SyntaxDiagnostic, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used by front-end stages that stop at the first diagnostic.
pub type Result<T> = std::result::Result<T, SyntaxDiagnostic>;
