//! Analysis session management.

use crate::build::{build_config, build_module};
use crate::error::DriverResult;
use crate::walk::walk_directory;
use reft_nf::{ConfigFile, Module};
use std::path::Path;

/// Options for directory walks.
#[derive(Clone, Debug)]
pub struct WalkOptions {
    /// Worker threads (defaults to the available parallelism).
    pub threads: Option<usize>,

    /// File extension to analyze, without the dot.
    pub extension: String,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            threads: None,
            extension: "nf".to_string(),
        }
    }
}

impl WalkOptions {
    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// Set the file extension to analyze.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// An analysis session: the entry point the lint drivers and the CLI use.
#[derive(Clone, Debug, Default)]
pub struct Session {
    options: WalkOptions,
}

impl Session {
    /// Create a new session.
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Build every module under a directory.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> DriverResult<Vec<Module>> {
        let dir = dir.as_ref();
        tracing::info!(dir = %dir.display(), "loading modules");
        walk_directory(dir, &self.options)
    }

    /// Build a single module.
    pub fn load_file(&self, path: impl AsRef<Path>) -> DriverResult<Module> {
        build_module(path)
    }

    /// Analyze a single config file.
    pub fn load_config(&self, path: impl AsRef<Path>) -> DriverResult<ConfigFile> {
        build_config(path)
    }
}
