//! Workflow definitions.

use reft_ast::visit::{walk_expr, Visitor};
use reft_ast::{Expr, ExprKind, MethodCall, Stmt, StmtKind};
use serde::Serialize;

/// A workflow definition. The entry workflow has an empty name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Workflow {
    pub name: String,
    pub line: u32,
    pub takes: Vec<String>,
    pub emits: Vec<String>,
    /// Section ordering problems; these do not fail the module.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// The statements of the `main:` section.
    #[serde(skip)]
    pub body: Vec<Stmt>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Main,
    Take,
    Emit,
}

impl Workflow {
    /// Builds a workflow from the statements of its body closure.
    pub fn from_body(name: &str, line: u32, stmts: &[Stmt]) -> Workflow {
        let mut workflow = Workflow {
            name: name.to_string(),
            line,
            takes: Vec::new(),
            emits: Vec::new(),
            errors: Vec::new(),
            body: Vec::new(),
        };

        let mut section = Section::Main;
        let mut seen_statement = false;
        let mut seen_take = false;
        let mut seen_main = false;
        let mut seen_emit = false;

        for stmt in stmts {
            for label in &stmt.labels {
                match label.as_str() {
                    "take" => {
                        if seen_statement || seen_main || seen_emit {
                            workflow
                                .errors
                                .push("take: must be the first section in the workflow".into());
                        }
                        seen_take = true;
                        section = Section::Take;
                    }
                    "main" => {
                        if seen_emit {
                            workflow.errors.push("main: cannot come after emit:".into());
                        }
                        seen_main = true;
                        section = Section::Main;
                    }
                    "emit" => {
                        seen_emit = true;
                        section = Section::Emit;
                    }
                    other => workflow.errors.push(format!("Unknown label: {}", other)),
                }
            }

            if matches!(stmt.kind, StmtKind::Empty) {
                continue;
            }
            seen_statement = true;

            match section {
                Section::Take => match stmt.as_expr().and_then(Expr::as_variable) {
                    Some(name) => workflow.takes.push(name.to_string()),
                    None => tracing::debug!(workflow = name, stmt = %stmt.text(), "skipping take"),
                },
                Section::Emit => match stmt.as_expr().and_then(emit_name) {
                    Some(name) => workflow.emits.push(name),
                    None => tracing::debug!(workflow = name, stmt = %stmt.text(), "skipping emit"),
                },
                Section::Main => workflow.body.push(stmt.clone()),
            }
        }

        if seen_take && !seen_main {
            workflow
                .errors
                .push("When take: is used, main: must also be present".into());
        }
        workflow
    }
}

/// `out`, `FOO.out.bam` or `out = FOO.out`.
fn emit_name(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Variable(name) => Some(name.clone()),
        ExprKind::Property(_) => Some(expr.text()),
        _ => expr
            .as_assignment()
            .and_then(|(target, _)| target.as_variable())
            .map(str::to_string),
    }
}

/// Collects `workflow { ... }` and `workflow NAME { ... }` definitions.
#[derive(Debug, Default)]
pub struct WorkflowVisitor {
    pub workflows: Vec<Workflow>,
}

impl WorkflowVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'ast> Visitor<'ast> for WorkflowVisitor {
    fn visit_method_call(&mut self, expr: &'ast Expr, call: &'ast MethodCall) {
        if call.method != "workflow" || !call.implicit_this() {
            walk_expr(self, expr);
            return;
        }

        let (name, closure) = match call.args() {
            [arg] if matches!(arg.kind, ExprKind::Closure { .. }) => ("", arg),
            [arg] => match arg.as_method_call() {
                Some(inner) if inner.implicit_this() => match inner.closure_arg() {
                    Some(closure) => (inner.method.as_str(), closure),
                    None => return,
                },
                _ => return,
            },
            _ => return,
        };

        if let ExprKind::Closure { body, .. } = &closure.kind {
            tracing::debug!(workflow = name, line = expr.line(), "found workflow");
            self.workflows
                .push(Workflow::from_body(name, expr.line(), body.block_stmts()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_parser::parse_source;

    fn workflows(source: &str) -> Vec<Workflow> {
        let file = parse_source(source).unwrap();
        let mut visitor = WorkflowVisitor::new();
        visitor.visit_source_file(&file);
        visitor.workflows
    }

    fn workflow(source: &str) -> Workflow {
        let mut all = workflows(source);
        assert_eq!(all.len(), 1);
        all.remove(0)
    }

    #[test]
    fn test_sections_on_one_line() {
        let wf = workflow("workflow { take: x; y; main: P(x,y); emit: out = P.out }");
        assert_eq!(wf.name, "");
        assert_eq!(wf.takes, vec!["x", "y"]);
        assert_eq!(wf.emits, vec!["out"]);
        assert!(wf.errors.is_empty(), "{:?}", wf.errors);
        assert_eq!(wf.body.len(), 1);
    }

    #[test]
    fn test_main_after_emit() {
        let wf = workflow("workflow { take: x; y; emit: out = P.out; main: P(x,y) }");
        assert_eq!(wf.errors, vec!["main: cannot come after emit:".to_string()]);
    }

    #[test]
    fn test_take_not_first() {
        let wf = workflow("workflow W {\n  main:\n  P()\n  take:\n  x\n}");
        assert_eq!(
            wf.errors,
            vec!["take: must be the first section in the workflow".to_string()]
        );
    }

    #[test]
    fn test_take_without_main() {
        let wf = workflow("workflow W {\n  take:\n  x\n  emit:\n  x\n}");
        assert_eq!(
            wf.errors,
            vec!["When take: is used, main: must also be present".to_string()]
        );
    }

    #[test]
    fn test_named_workflow_with_property_emits() {
        let wf = workflow(
            "workflow QC {\n  take:\n  reads\n\n  main:\n  FASTQC(reads)\n  MULTIQC(FASTQC.out.zip.collect())\n\n  emit:\n  html = FASTQC.out.html\n  MULTIQC.out.report\n}",
        );
        assert_eq!(wf.name, "QC");
        assert_eq!(wf.line, 1);
        assert_eq!(wf.takes, vec!["reads"]);
        assert_eq!(wf.emits, vec!["html", "MULTIQC.out.report"]);
        assert_eq!(wf.body.len(), 2);
    }

    #[test]
    fn test_unknown_label() {
        let wf = workflow("workflow {\n  setup:\n  P()\n}");
        assert_eq!(wf.errors, vec!["Unknown label: setup".to_string()]);
    }

    #[test]
    fn test_workflow_handlers_are_not_definitions() {
        let all = workflows("workflow.onComplete { log.info 'done' }\nworkflow { P() }");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].line, 2);
    }
}
