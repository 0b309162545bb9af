//! Native lint rules.
//!
//! # Architecture
//!
//! 1. **NativeRule trait** - each rule implements this trait
//! 2. **NativeLinter** - holds the registered rules and runs them over modules
//! 3. **LintReport** - the flattened errors and warnings of a run
//!
//! A rule can look at a whole module, at one process at a time, or at one
//! `label` directive at a time. Every invocation returns one
//! [`LintResult`] holding at most one error and one warning.
//!
//! # Adding a New Rule
//!
//! ```ignore
//! pub struct MyRule;
//!
//! impl NativeRule for MyRule {
//!     fn id(&self) -> &'static str { "my-rule" }
//!     fn description(&self) -> &'static str { "Checks for something" }
//!
//!     fn check_process(&self, module: &Module, process: &Process) -> LintResult {
//!         LintResult::default()
//!     }
//! }
//! ```
//!
//! Then register it in [`NativeLinter::nf_core`].

mod container;
mod labels;

pub use container::{ContainerWithSpace, MultipleContainers, MustBeTagged};
pub use labels::{
    ConflictingLabels, DuplicateLabels, LabelAlphanumerics, NoLabels, NoStandardLabel,
    NonStandardLabel,
};

use reft_driver::Session;
use reft_nf::{DirectiveKind, Module, Process};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One lint finding attributed to a module and line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleDiagnostic {
    pub module_path: PathBuf,
    pub message: String,
    pub line: u32,
}

/// The outcome of one rule invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LintResult {
    pub error: Option<ModuleDiagnostic>,
    pub warning: Option<ModuleDiagnostic>,
}

impl LintResult {
    pub fn error(module: &Module, line: u32, message: impl Into<String>) -> Self {
        Self {
            error: Some(diagnostic(module, line, message)),
            warning: None,
        }
    }

    pub fn warning(module: &Module, line: u32, message: impl Into<String>) -> Self {
        Self {
            error: None,
            warning: Some(diagnostic(module, line, message)),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.warning.is_none()
    }
}

fn diagnostic(module: &Module, line: u32, message: impl Into<String>) -> ModuleDiagnostic {
    ModuleDiagnostic {
        module_path: module.path.clone(),
        message: message.into(),
        line,
    }
}

/// A `label` directive seen by label-level rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label<'a> {
    pub name: &'a str,
    pub line: u32,
    /// Position among the process's labels.
    pub index: usize,
}

/// The `label` directives of a process, in source order.
pub fn labels(process: &Process) -> Vec<Label<'_>> {
    process
        .directives
        .iter()
        .filter_map(|d| match &d.kind {
            DirectiveKind::Label { label } => Some((label.as_str(), d.line)),
            _ => None,
        })
        .enumerate()
        .map(|(index, (name, line))| Label { name, line, index })
        .collect()
}

/// Trait that all native rules implement.
///
/// Rules must be pure: no I/O, no shared state, no dependence on other
/// rules' results.
pub trait NativeRule: Send + Sync {
    /// Unique identifier, e.g. `container-with-space`.
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks.
    fn description(&self) -> &'static str;

    fn check_module(&self, _module: &Module) -> LintResult {
        LintResult::default()
    }

    fn check_process(&self, _module: &Module, _process: &Process) -> LintResult {
        LintResult::default()
    }

    fn check_label(&self, _module: &Module, _process: &Process, _label: Label<'_>) -> LintResult {
        LintResult::default()
    }
}

/// Errors and warnings from a native lint run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub errors: Vec<ModuleDiagnostic>,
    pub warnings: Vec<ModuleDiagnostic>,
}

impl LintReport {
    pub fn push(&mut self, result: LintResult) {
        self.errors.extend(result.error);
        self.warnings.extend(result.warning);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 1 if any error was reported; warnings alone never fail a run.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_errors())
    }
}

/// Runs a fixed set of native rules over modules.
pub struct NativeLinter {
    rules: Vec<Box<dyn NativeRule>>,
}

impl NativeLinter {
    /// A linter with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The nf-core rule set.
    pub fn nf_core() -> Self {
        Self {
            rules: vec![
                // Errors
                Box::new(ContainerWithSpace),
                Box::new(MustBeTagged),
                // Warnings
                Box::new(MultipleContainers),
                Box::new(ConflictingLabels),
                Box::new(NoStandardLabel),
                Box::new(NonStandardLabel),
                Box::new(DuplicateLabels),
                Box::new(NoLabels),
                Box::new(LabelAlphanumerics),
            ],
        }
    }

    pub fn with_rule(mut self, rule: impl NativeRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// The registered rules as `(id, description)` pairs.
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }

    /// Runs every rule over every module.
    pub fn lint(&self, modules: &[Module]) -> LintReport {
        let mut report = LintReport::default();
        for module in modules {
            for rule in &self.rules {
                tracing::debug!(rule = rule.id(), path = %module.path.display(), "running rule");
                report.push(rule.check_module(module));
                for process in &module.processes {
                    report.push(rule.check_process(module, process));
                    for label in labels(process) {
                        report.push(rule.check_label(module, process, label));
                    }
                }
            }
        }
        report
    }

    /// Builds every module under `dir` and lints them.
    ///
    /// Failing to build the modules is reported as a single error
    /// attributed to the directory.
    pub fn lint_directory(&self, session: &Session, dir: impl AsRef<Path>) -> LintReport {
        let dir = dir.as_ref();
        match session.load_directory(dir) {
            Ok(modules) => self.lint(&modules),
            Err(err) => LintReport {
                errors: vec![ModuleDiagnostic {
                    module_path: dir.to_path_buf(),
                    message: err.to_string(),
                    line: 0,
                }],
                warnings: Vec::new(),
            },
        }
    }
}

impl Default for NativeLinter {
    fn default() -> Self {
        Self::nf_core()
    }
}
