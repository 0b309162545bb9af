//! Parser for Nextflow scripts and configuration files.
//!
//! A recursive descent parser with precedence climbing for expressions.
//! Groovy's command syntax (`cpus 4`, `process FOO { ... }`) is lowered
//! into ordinary method calls while parsing, so the tree handed to callers
//! has no notion of the surface syntax it came from.

mod error;
mod expr;
mod parser;
mod stmt;

pub use error::{ParseError, ParseResult, SyntaxError};
pub use parser::Parser;

use reft_ast::SourceFile;

/// Parses a whole source file.
pub fn parse_source(source: &str) -> ParseResult<SourceFile> {
    Parser::new(source)?.parse()
}
