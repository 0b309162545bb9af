//! Lexical analyzer for Nextflow scripts and configuration files.
//!
//! Nextflow sits on top of Groovy, so this crate tokenizes the subset of
//! Groovy that shows up in pipelines: quoted, triple-quoted, slashy and
//! interpolated strings, numeric literals with type suffixes, and
//! significant newlines that terminate statements.

mod error;
mod lexer;
mod span;
mod token;

pub use error::{LexError, LexResult};
pub use lexer::Lexer;
pub use span::Span;
pub use token::{GStringPart, Token, TokenKind};
