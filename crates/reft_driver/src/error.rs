//! Error types for the driver.

use reft_nf::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building modules.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("internal error while analyzing {}: {message} (this is likely a bug in reft)", path.display())]
    Panic { path: PathBuf, message: String },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("encountered {} errors during processing: {}", .0.len(), join(.0))]
    Multiple(Vec<DriverError>),
}

impl DriverError {
    /// True when the failure points at the analyzer rather than the input.
    pub fn is_likely_bug(&self) -> bool {
        match self {
            DriverError::Panic { .. } => true,
            DriverError::Module(err) => err.is_likely_bug(),
            DriverError::Multiple(errors) => errors.iter().any(DriverError::is_likely_bug),
            DriverError::Walk(_) | DriverError::Pool(_) => false,
        }
    }
}

fn join(errors: &[DriverError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
