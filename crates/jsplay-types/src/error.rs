use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics kept before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// Diagnostic category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Limit,
}

/// Numeric diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_LITERAL: Self = Self(101);
    pub const INVALID_TOKEN: Self = Self(102);
    pub const UNEXPECTED_END: Self = Self(103);
    pub const MISSING_INITIALIZER: Self = Self(104);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(105);
    pub const ILLEGAL_STATEMENT: Self = Self(106);
    pub const INVALID_ESCAPE: Self = Self(107);

    // ── Structural limits (E600–E699) ──
    pub const NESTING_LIMIT_EXCEEDED: Self = Self(600);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            600..=699 => ErrorCategory::Limit,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Limit => write!(f, "limit"),
        }
    }
}

/// A structured syntax diagnostic produced by the lexer or parser.
///
/// `message` uses the wording a browser engine would put in
/// `SyntaxError.message`, since it is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{span}: {code} [{category}] {message}")]
pub struct SyntaxDiagnostic {
    /// Source file name.
    pub file: String,
    /// Diagnostic code (e.g., E100).
    pub code: ErrorCode,
    /// Category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
}

impl SyntaxDiagnostic {
    /// Create a new diagnostic.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }
}

/// Diagnostics collected by one front-end pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<SyntaxDiagnostic>,
    pub total_errors: usize,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Whether the cap has been reached and scanning should stop.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push(&mut self, error: SyntaxDiagnostic) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append everything from another pass.
    pub fn extend(&mut self, other: Diagnostics) {
        let extra = other.total_errors.saturating_sub(other.errors.len());
        for err in other.errors {
            self.push(err);
        }
        self.total_errors += extra;
    }

    /// The first diagnostic, which is the one reported to the user.
    pub fn first(&self) -> Option<&SyntaxDiagnostic> {
        self.errors.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(message: &str) -> SyntaxDiagnostic {
        SyntaxDiagnostic::new(
            "main.js",
            ErrorCode::UNEXPECTED_TOKEN,
            message,
            Span::new(2, 5, 2, 5),
            "  }",
        )
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorCode::INVALID_ESCAPE.category(), ErrorCategory::Syntax);
        assert_eq!(
            ErrorCode::NESTING_LIMIT_EXCEEDED.category(),
            ErrorCategory::Limit
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.to_string(), "E100");
        assert_eq!(ErrorCode::NESTING_LIMIT_EXCEEDED.to_string(), "E600");
    }

    #[test]
    fn test_diagnostic_display() {
        assert_eq!(
            diag("Unexpected token '}'").to_string(),
            "2:5: E100 [syntax] Unexpected token '}'"
        );
    }

    #[test]
    fn test_diagnostic_json() {
        let json = serde_json::to_string(&diag("Unexpected token '}'")).unwrap();
        assert!(json.contains("\"code\":100"));
        assert!(json.contains("\"category\":\"syntax\""));
        assert!(json.contains("\"line\":2"));
        assert!(json.contains("\"source_line\":\"  }\""));
    }

    #[test]
    fn test_diagnostics_max_limit() {
        let mut errs = Diagnostics::empty();
        for i in 0..25 {
            errs.push(diag(&format!("error {i}")));
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.is_full());
        assert_eq!(errs.first().map(|e| e.message.as_str()), Some("error 0"));
    }

    #[test]
    fn test_diagnostics_extend_keeps_order_and_count() {
        let mut a = Diagnostics::empty();
        a.push(diag("first"));
        let mut b = Diagnostics::empty();
        b.push(diag("second"));
        b.push(diag("third"));
        a.extend(b);
        assert_eq!(a.total_errors, 3);
        assert_eq!(a.errors[1].message, "second");
    }

    #[test]
    fn test_diagnostics_empty() {
        let errs = Diagnostics::empty();
        assert!(!errs.has_errors());
        assert!(errs.first().is_none());
    }
}
