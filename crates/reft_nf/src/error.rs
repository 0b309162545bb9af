//! Error types for module and config analysis.

use reft_parser::SyntaxError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a module or config file from being built.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("only DSL2 scripts are supported, but {} enables DSL1", path.display())]
    Dsl1 { path: PathBuf },

    #[error("errors found in processes in {}: {}", path.display(), details.join("; "))]
    ProcessErrors { path: PathBuf, details: Vec<String> },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModuleError {
    /// True when the failure points at the analyzer rather than the input.
    ///
    /// Every variant here describes a problem with the analyzed file;
    /// engine failures are detected by the driver.
    pub fn is_likely_bug(&self) -> bool {
        false
    }
}

/// Result type for module and config analysis.
pub type ModuleResult<T> = Result<T, ModuleError>;
