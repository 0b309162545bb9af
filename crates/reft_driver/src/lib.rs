//! Driver for analyzing Nextflow pipelines.
//!
//! This crate turns files and directories into analyzed modules:
//!
//! ```text
//! directory → walk (*.nf) → worker pool → ModuleBuilder → Vec<Module>
//! ```
//!
//! A panic inside the analyzer is caught per file and reported as a
//! likely bug, so one bad file never takes down a whole walk.
//!
//! # Example
//!
//! ```ignore
//! use reft_driver::{Session, WalkOptions};
//!
//! let session = Session::new(WalkOptions::default());
//! let modules = session.load_directory("pipelines/rnaseq")?;
//! ```

mod build;
mod error;
mod session;
mod walk;

pub use build::*;
pub use error::*;
pub use session::*;
pub use walk::*;

// Re-export commonly used types from dependencies
pub use reft_nf::{ConfigFile, Module};
