//! Lexer error types.

use crate::Span;
use thiserror::Error;

/// Result type for lexer operations.
pub type LexResult<T> = Result<T, LexError>;

/// An unrecoverable lexing error. The token stream halts after one of these.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string")]
    UnterminatedString { span: Span },

    #[error("unterminated comment")]
    UnterminatedComment { span: Span },

    #[error("invalid escape sequence '\\{escape}'")]
    InvalidEscape { escape: char, span: Span },

    #[error("too many quotes found when specifying {context}")]
    TooManyQuotes { context: String, span: Span },

    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String, span: Span },

    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidEscape { span, .. } => *span,
            LexError::TooManyQuotes { span, .. } => *span,
            LexError::InvalidNumber { span, .. } => *span,
            LexError::UnexpectedChar { span, .. } => *span,
        }
    }
}
