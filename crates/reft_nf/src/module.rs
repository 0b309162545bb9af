//! Module construction.

use crate::error::{ModuleError, ModuleResult};
use crate::include::{IncludeStatement, IncludeVisitor};
use crate::params::{ParamInfo, ParamVisitor};
use crate::process::{Process, ProcessVisitor};
use crate::workflow::{Workflow, WorkflowVisitor};
use reft_ast::visit::Visitor;
use reft_ast::{Constant, ExprKind, SourceFile};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A `process` call that is not a process definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub line: u32,
    pub text: String,
}

/// The analyzed form of one `.nf` file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Module {
    pub path: PathBuf,
    pub dsl_version: u32,
    pub processes: Vec<Process>,
    pub workflows: Vec<Workflow>,
    pub includes: Vec<IncludeStatement>,
    pub params: Vec<ParamInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<Anomaly>,
    #[serde(skip)]
    pub ast: SourceFile,
}

impl Module {
    pub fn process(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.name == name)
    }
}

/// Builds a [`Module`] from a file path or from source text.
#[derive(Clone, Debug)]
pub struct ModuleBuilder {
    path: PathBuf,
}

impl ModuleBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and builds its module.
    pub fn build_file(&self) -> ModuleResult<Module> {
        let source = std::fs::read_to_string(&self.path).map_err(|source| ModuleError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.build_source(&source)
    }

    /// Builds a module from source text attributed to this builder's path.
    pub fn build_source(&self, source: &str) -> ModuleResult<Module> {
        tracing::debug!(path = %self.path.display(), "building module");

        let ast = reft_parser::parse_source(source)
            .map_err(|err| err.into_syntax_error(&self.path))?;

        if dsl_version(&ast) == Some(1) {
            return Err(ModuleError::Dsl1 {
                path: self.path.clone(),
            });
        }

        let mut includes = IncludeVisitor::new();
        includes.visit_source_file(&ast);

        let mut processes = ProcessVisitor::new();
        processes.visit_source_file(&ast);

        let params = ParamVisitor::collect(&ast);

        let mut workflows = WorkflowVisitor::new();
        workflows.visit_source_file(&ast);

        let details: Vec<String> = processes
            .processes
            .iter()
            .flat_map(|p| {
                p.errors
                    .iter()
                    .map(move |err| format!("process '{}': {}", p.name, err))
            })
            .collect();
        if !details.is_empty() {
            return Err(ModuleError::ProcessErrors {
                path: self.path.clone(),
                details,
            });
        }

        let module = Module {
            path: self.path.clone(),
            dsl_version: 2,
            processes: processes.processes,
            workflows: workflows.workflows,
            includes: includes.into_sorted(),
            params,
            anomalies: processes.anomalies,
            ast,
        };
        tracing::debug!(
            path = %self.path.display(),
            processes = module.processes.len(),
            workflows = module.workflows.len(),
            "built module"
        );
        Ok(module)
    }
}

/// The value of a top-level `nextflow.enable.dsl = <n>`.
fn dsl_version(ast: &SourceFile) -> Option<i64> {
    ast.statements().find_map(|stmt| {
        let (target, value) = stmt.as_expr()?.as_assignment()?;
        if target.text() != "nextflow.enable.dsl" {
            return None;
        }
        match value.kind {
            ExprKind::Constant(Constant::Int(n)) => Some(n),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str) -> ModuleResult<Module> {
        ModuleBuilder::new("/pipeline/main.nf").build_source(source)
    }

    #[test]
    fn test_dsl1_rejected() {
        let err = build("nextflow.enable.dsl = 1\nprocess P { script: 'x' }").unwrap_err();
        assert!(matches!(err, ModuleError::Dsl1 { .. }));
        assert!(err.to_string().starts_with("only DSL2 scripts are supported"));
    }

    #[test]
    fn test_dsl2_accepted() {
        let module = build("nextflow.enable.dsl = 2\nworkflow { }").unwrap();
        assert_eq!(module.dsl_version, 2);
        assert_eq!(module.workflows.len(), 1);
    }

    #[test]
    fn test_syntax_error() {
        let err = build("process P {").unwrap_err();
        let ModuleError::Syntax(syntax) = &err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert_eq!(syntax.file, PathBuf::from("/pipeline/main.nf"));
        assert!(!err.is_likely_bug());
    }

    #[test]
    fn test_process_errors_aggregate() {
        let err = build("process A { memory '3 GBB' }\nprocess B { memory '1 XB' }").unwrap_err();
        assert_eq!(
            err.to_string(),
            "errors found in processes in /pipeline/main.nf: process 'A': unknown memory unit: GBB; process 'B': unknown memory unit: XB"
        );
    }

    #[test]
    fn test_builds_are_deterministic() {
        let source = "include { A } from './a'\nprocess P {\n  cpus params.cpus\n  script:\n  'x'\n}\nworkflow { P() }";
        assert_eq!(build(source).unwrap(), build(source).unwrap());
    }

    #[test]
    fn test_anomalies_are_kept() {
        let module = build("process(A, B)").unwrap();
        assert_eq!(module.anomalies.len(), 1);
        assert!(module.processes.is_empty());
    }
}
