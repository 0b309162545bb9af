//! Process directives.
//!
//! Every directive in the Nextflow alphabet has an extractor that reads
//! the directive call's argument shape and produces a typed
//! [`DirectiveKind`]. Shapes that cannot be resolved statically (closures,
//! `params.*` lookups, arithmetic) become [`DirectiveKind::Dynamic`];
//! method calls outside the alphabet become [`DirectiveKind::Unknown`].
//! Only values that are malformed on their face are reported as
//! [`DirectiveError`]s.

mod container;
mod memory;
mod publish_dir;
mod simple;

pub use container::Container;
pub use memory::{Memory, MemoryUnit};
pub use publish_dir::PublishDir;

use reft_ast::MethodCall;
use serde::Serialize;
use thiserror::Error;

/// Every directive name a process body may use.
pub const DIRECTIVE_NAMES: &[&str] = &[
    "accelerator",
    "afterScript",
    "arch",
    "array",
    "beforeScript",
    "cache",
    "clusterOptions",
    "conda",
    "container",
    "containerOptions",
    "cpus",
    "debug",
    "disk",
    "echo",
    "errorStrategy",
    "executor",
    "ext",
    "fair",
    "label",
    "machineType",
    "maxErrors",
    "maxForks",
    "maxRetries",
    "maxSubmitAwait",
    "memory",
    "module",
    "penv",
    "pod",
    "publishDir",
    "queue",
    "resourceLabels",
    "resourceLimits",
    "scratch",
    "shell",
    "spack",
    "stageInMode",
    "stageOutMode",
    "storeDir",
    "tag",
    "time",
];

/// Directives whose value Nextflow resolves before any task exists, so a
/// closure there is always a mistake.
const STATIC_ONLY: &[&str] = &["executor", "label", "maxForks"];

/// Returns true if `name` is a directive name.
pub fn is_directive(name: &str) -> bool {
    DIRECTIVE_NAMES.contains(&name)
}

/// A malformed directive value.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DirectiveError {
    #[error("unknown memory unit: {0}")]
    UnknownMemoryUnit(String),

    #[error("invalid memory format: {0}")]
    InvalidMemory(String),

    #[error("invalid publish dir directive: no valid path specified")]
    PublishDirPath,

    #[error("invalid {0} directive: value cannot be a closure")]
    ClosureNotAllowed(String),
}

/// A directive together with the line it was written on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Directive {
    pub line: u32,
    #[serde(flatten)]
    pub kind: DirectiveKind,
}

impl Directive {
    pub fn new(kind: DirectiveKind, line: u32) -> Self {
        Self { line, kind }
    }

    /// The directive name as written in Nextflow.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Extracts a directive from a call at directive position.
    pub fn extract(call: &MethodCall, line: u32) -> Result<Directive, DirectiveError> {
        let name = call.method.as_str();
        if !is_directive(name) {
            return Ok(Directive::new(
                DirectiveKind::Unknown {
                    name: name.to_string(),
                },
                line,
            ));
        }

        if call.closure_arg().is_some() {
            if STATIC_ONLY.contains(&name) {
                return Err(DirectiveError::ClosureNotAllowed(name.to_string()));
            }
            return Ok(Directive::new(
                DirectiveKind::Dynamic {
                    name: name.to_string(),
                },
                line,
            ));
        }

        let kind = match name {
            "container" => container::extract(call).map(DirectiveKind::Container),
            "memory" => memory::extract(call)?.map(DirectiveKind::Memory),
            "publishDir" => Some(DirectiveKind::PublishDir(publish_dir::extract(call)?)),
            _ => simple::extract(name, call),
        };

        let kind = kind.unwrap_or_else(|| {
            tracing::debug!(directive = name, line, "directive value is not static");
            DirectiveKind::Dynamic {
                name: name.to_string(),
            }
        });
        Ok(Directive::new(kind, line))
    }
}

/// The typed payload of a directive.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DirectiveKind {
    Accelerator {
        num_gpus: i64,
        gpu_type: Option<String>,
    },
    AfterScript {
        script: String,
    },
    Arch {
        name: String,
        target: Option<String>,
    },
    Array {
        size: i64,
    },
    BeforeScript {
        script: String,
    },
    Cache {
        enabled: bool,
        deep: bool,
        lenient: bool,
    },
    ClusterOptions {
        options: String,
    },
    /// `conda 'bioconda::x=1'`; a ternary keeps both arms in `alternatives`.
    Conda {
        dependencies: String,
        alternatives: Vec<String>,
    },
    Container(Container),
    ContainerOptions {
        options: String,
    },
    Cpus {
        num: i64,
    },
    Debug {
        enabled: bool,
    },
    Disk {
        space: String,
    },
    Echo {
        enabled: bool,
    },
    ErrorStrategy {
        strategy: String,
    },
    Executor {
        executor: String,
    },
    Ext {
        version: String,
        args: Option<String>,
    },
    Fair {
        enabled: bool,
    },
    Label {
        label: String,
    },
    MachineType {
        machine_type: String,
    },
    MaxErrors {
        num: i64,
    },
    MaxForks {
        num: i64,
    },
    MaxRetries {
        num: i64,
    },
    MaxSubmitAwait {
        value: String,
    },
    Memory(Memory),
    Module {
        name: String,
    },
    Penv {
        environment: String,
    },
    Pod {
        env: String,
        value: String,
    },
    PublishDir(PublishDir),
    Queue {
        name: String,
    },
    ResourceLabels {
        keys: Vec<String>,
    },
    ResourceLimits {
        cpus: Option<i64>,
        disk: Option<String>,
        memory: Option<String>,
        time: Option<String>,
    },
    Scratch {
        enabled: bool,
        directory: Option<String>,
    },
    Shell {
        command: String,
    },
    Spack {
        dependencies: String,
    },
    StageInMode {
        mode: String,
    },
    StageOutMode {
        mode: String,
    },
    StoreDir {
        directory: String,
    },
    Tag {
        tag: String,
    },
    Time {
        duration: String,
    },
    /// A known directive whose value cannot be resolved statically.
    Dynamic {
        name: String,
    },
    /// A call at directive position that is not a directive.
    Unknown {
        name: String,
    },
}

impl DirectiveKind {
    /// The directive name as written in Nextflow.
    pub fn name(&self) -> &str {
        match self {
            DirectiveKind::Accelerator { .. } => "accelerator",
            DirectiveKind::AfterScript { .. } => "afterScript",
            DirectiveKind::Arch { .. } => "arch",
            DirectiveKind::Array { .. } => "array",
            DirectiveKind::BeforeScript { .. } => "beforeScript",
            DirectiveKind::Cache { .. } => "cache",
            DirectiveKind::ClusterOptions { .. } => "clusterOptions",
            DirectiveKind::Conda { .. } => "conda",
            DirectiveKind::Container(_) => "container",
            DirectiveKind::ContainerOptions { .. } => "containerOptions",
            DirectiveKind::Cpus { .. } => "cpus",
            DirectiveKind::Debug { .. } => "debug",
            DirectiveKind::Disk { .. } => "disk",
            DirectiveKind::Echo { .. } => "echo",
            DirectiveKind::ErrorStrategy { .. } => "errorStrategy",
            DirectiveKind::Executor { .. } => "executor",
            DirectiveKind::Ext { .. } => "ext",
            DirectiveKind::Fair { .. } => "fair",
            DirectiveKind::Label { .. } => "label",
            DirectiveKind::MachineType { .. } => "machineType",
            DirectiveKind::MaxErrors { .. } => "maxErrors",
            DirectiveKind::MaxForks { .. } => "maxForks",
            DirectiveKind::MaxRetries { .. } => "maxRetries",
            DirectiveKind::MaxSubmitAwait { .. } => "maxSubmitAwait",
            DirectiveKind::Memory(_) => "memory",
            DirectiveKind::Module { .. } => "module",
            DirectiveKind::Penv { .. } => "penv",
            DirectiveKind::Pod { .. } => "pod",
            DirectiveKind::PublishDir(_) => "publishDir",
            DirectiveKind::Queue { .. } => "queue",
            DirectiveKind::ResourceLabels { .. } => "resourceLabels",
            DirectiveKind::ResourceLimits { .. } => "resourceLimits",
            DirectiveKind::Scratch { .. } => "scratch",
            DirectiveKind::Shell { .. } => "shell",
            DirectiveKind::Spack { .. } => "spack",
            DirectiveKind::StageInMode { .. } => "stageInMode",
            DirectiveKind::StageOutMode { .. } => "stageOutMode",
            DirectiveKind::StoreDir { .. } => "storeDir",
            DirectiveKind::Tag { .. } => "tag",
            DirectiveKind::Time { .. } => "time",
            DirectiveKind::Dynamic { name } | DirectiveKind::Unknown { name } => name,
        }
    }

    /// True for the `Dynamic` and `Unknown` fallbacks.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            DirectiveKind::Dynamic { .. } | DirectiveKind::Unknown { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_ast::{Stmt, StmtKind};
    use reft_parser::parse_source;

    fn directive(source: &str) -> Result<Directive, DirectiveError> {
        let file = parse_source(source).unwrap();
        let stmt: &Stmt = file.statements().next().unwrap();
        let StmtKind::Expr(expr) = &stmt.kind else {
            panic!("expected expression statement");
        };
        let call = expr.as_method_call().unwrap();
        Directive::extract(call, stmt.line())
    }

    #[test]
    fn test_unknown_name() {
        let d = directive("frobnicate 3").unwrap();
        assert_eq!(
            d.kind,
            DirectiveKind::Unknown {
                name: "frobnicate".into()
            }
        );
    }

    #[test]
    fn test_closure_is_dynamic() {
        let d = directive("cpus { 2 * task.attempt }").unwrap();
        assert_eq!(d.kind, DirectiveKind::Dynamic { name: "cpus".into() });
        assert!(d.kind.is_unresolved());
    }

    #[test]
    fn test_closure_not_allowed_on_label() {
        let err = directive("label { 'x' }").unwrap_err();
        assert_eq!(err, DirectiveError::ClosureNotAllowed("label".into()));
    }

    #[test]
    fn test_params_value_is_dynamic() {
        let d = directive("cpus params.max_cpus").unwrap();
        assert_eq!(d.kind, DirectiveKind::Dynamic { name: "cpus".into() });
    }

    #[test]
    fn test_cpus_and_line() {
        let d = directive("\n\ncpus 4").unwrap();
        assert_eq!(d.line, 3);
        assert_eq!(d.kind, DirectiveKind::Cpus { num: 4 });
        assert_eq!(d.name(), "cpus");
    }

    #[test]
    fn test_serialized_shape() {
        let d = directive("label 'process_low'").unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"line": 1, "type": "label", "label": "process_low"})
        );
    }
}
