//! Parallel directory walks.

use crate::build::build_module;
use crate::error::{DriverError, DriverResult};
use crate::session::WalkOptions;
use rayon::prelude::*;
use reft_nf::Module;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use walkdir::WalkDir;

/// Lists the files under `dir` with the configured extension, in a
/// deterministic order.
pub fn discover_files(dir: impl AsRef<Path>, options: &WalkOptions) -> DriverResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(options.extension.as_str())
        {
            files.push(path.to_path_buf());
        }
    }
    tracing::debug!(dir = %dir.as_ref().display(), files = files.len(), "discovered files");
    Ok(files)
}

/// Builds every matching file under `dir` on a worker pool.
///
/// Modules come back in discovery order. If any file fails, the result is
/// a single [`DriverError::Multiple`] listing every failure.
pub fn walk_directory(dir: impl AsRef<Path>, options: &WalkOptions) -> DriverResult<Vec<Module>> {
    let files = discover_files(dir, options)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or(0))
        .build()?;

    let modules: Mutex<Vec<(usize, Module)>> = Mutex::new(Vec::with_capacity(files.len()));
    let errors: Mutex<Vec<(usize, DriverError)>> = Mutex::new(Vec::new());

    pool.install(|| {
        files.par_iter().enumerate().for_each(|(index, path)| {
            tracing::debug!(path = %path.display(), "building module");
            match build_module(path) {
                Ok(module) => modules
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((index, module)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "module build failed");
                    errors
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push((index, err));
                }
            }
        });
    });

    let mut errors = errors.into_inner().unwrap_or_else(PoisonError::into_inner);
    if !errors.is_empty() {
        errors.sort_by_key(|(index, _)| *index);
        return Err(DriverError::Multiple(
            errors.into_iter().map(|(_, err)| err).collect(),
        ));
    }

    let mut modules = modules.into_inner().unwrap_or_else(PoisonError::into_inner);
    modules.sort_by_key(|(index, _)| *index);
    Ok(modules.into_iter().map(|(_, module)| module).collect())
}
