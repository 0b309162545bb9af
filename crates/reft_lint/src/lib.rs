//! Lint drivers for analyzed Nextflow modules.
//!
//! Two drivers share the same module set:
//!
//! ```text
//!                      ┌─> NativeLinter (nf-core rules) ─> LintReport
//! directory → Session ─┤
//!                      └─> ScriptedLinter (rules.rhai) ─> ScriptReport
//! ```
//!
//! Native rules are Rust code registered with a [`NativeLinter`]. Scripted
//! rules are `rule_*` functions in a rhai script; each one is called once
//! per module with a read-only projection of that module.
//!
//! # Example
//!
//! ```ignore
//! use reft_lint::{run_lint, LintOptions, NativeLinter};
//! use reft_driver::Session;
//!
//! let session = Session::default();
//! let report = NativeLinter::nf_core().lint_directory(&session, "pipelines/rnaseq");
//!
//! let options = LintOptions::default().with_rule("has_label");
//! let scripted = run_lint(&options, &session)?;
//! ```

mod check;
mod error;
pub mod native;
pub mod script;

pub use check::*;
pub use error::*;
pub use native::{LintReport, LintResult, ModuleDiagnostic, NativeLinter, NativeRule};
pub use script::{run_lint, LintOptions, RuleModuleOutput, ScriptReport, ScriptedLinter};
