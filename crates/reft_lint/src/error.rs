//! Error types for the scripted drivers.

use reft_driver::DriverError;
use reft_parser::SyntaxError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a whole scripted lint or check invocation.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("rules file not found: {}", .0.display())]
    RulesNotFound(PathBuf),

    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error compiling {}: {message}", path.display())]
    Compile { path: PathBuf, message: String },

    #[error("error initializing rules program: {0}")]
    Init(String),

    #[error("error processing directory: {0}")]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("main function not defined in checks program")]
    MissingMain,
}

impl ScriptError {
    pub fn is_likely_bug(&self) -> bool {
        matches!(self, ScriptError::Driver(err) if err.is_likely_bug())
    }
}

/// Result type for scripted drivers.
pub type ScriptResult<T> = Result<T, ScriptError>;
