//! Parser error types.

use reft_lexer::{LexError, Span, TokenKind};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// A parse error.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("expected expression, found {found}")]
    ExpectedExpression { found: String, span: Span },

    #[error("expected identifier, found {found}")]
    ExpectedIdent { found: String, span: Span },

    #[error("{message}")]
    Custom { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(e) => e.span(),
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::ExpectedExpression { span, .. } => *span,
            ParseError::ExpectedIdent { span, .. } => *span,
            ParseError::Custom { span, .. } => *span,
        }
    }

    pub fn unexpected_token(expected: impl Into<String>, found: &TokenKind, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: format!("{}", found),
            span,
        }
    }

    /// Attaches the file name, producing the error shown to users.
    pub fn into_syntax_error(self, file: impl AsRef<Path>) -> SyntaxError {
        let span = self.span();
        SyntaxError {
            file: file.as_ref().to_path_buf(),
            line: span.line,
            column: span.column,
            message: self.to_string(),
        }
    }
}

/// A syntax error located in a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at {}:{}:{}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

impl std::error::Error for SyntaxError {}
