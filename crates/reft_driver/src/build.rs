//! Single-file builds with panic capture.

use crate::error::{DriverError, DriverResult};
use reft_nf::{ConfigFile, Module, ModuleBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Builds the module for one `.nf` file.
///
/// The path is made absolute first. A panic anywhere in the analyzer is
/// returned as [`DriverError::Panic`].
pub fn build_module(path: impl AsRef<Path>) -> DriverResult<Module> {
    let path = absolute(path.as_ref());
    let builder = ModuleBuilder::new(&path);
    guarded(&path, || builder.build_file())?.map_err(DriverError::from)
}

/// Analyzes one `.config` file.
pub fn build_config(path: impl AsRef<Path>) -> DriverResult<ConfigFile> {
    let path = absolute(path.as_ref());
    guarded(&path, || ConfigFile::from_file(&path))?.map_err(DriverError::from)
}

fn guarded<T>(path: &Path, f: impl FnOnce() -> T) -> DriverResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!(path = %path.display(), %message, "analyzer panicked");
        DriverError::Panic {
            path: path.to_path_buf(),
            message,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
