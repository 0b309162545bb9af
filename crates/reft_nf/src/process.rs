//! Process definitions.
//!
//! `process FOO { ... }` parses as `process(FOO({ ... }))`. The closure
//! body is read with a small section machine: statements before the
//! first section label are directives, and the `input:`, `output:`,
//! `when:` and `script:`/`shell:`/`exec:` labels switch which extractor
//! sees the statements that follow.

use crate::directives::Directive;
use crate::inputs::Input;
use crate::module::Anomaly;
use crate::outputs::Output;
use reft_ast::visit::{walk_expr, Visitor};
use reft_ast::{Expr, ExprKind, MethodCall, Stmt, StmtKind};
use serde::Serialize;

/// The flavour of a process's task body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    Script,
    Shell,
    Exec,
}

/// A process definition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Process {
    pub name: String,
    pub line: u32,
    pub directives: Vec<Directive>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    /// The `when:` guard as text.
    pub when: Option<String>,
    pub script_kind: Option<ScriptKind>,
    /// The statements of the script section.
    #[serde(skip)]
    pub script: Vec<Stmt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl Process {
    fn new(name: String, line: u32) -> Self {
        Self {
            name,
            line,
            directives: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            when: None,
            script_kind: None,
            script: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Directives with the given Nextflow name, in source order.
    pub fn directives_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.directives.iter().filter(move |d| d.name() == name)
    }

    /// Builds a process from the statements of its body closure.
    pub fn from_body(name: &str, line: u32, body: &[Stmt]) -> Process {
        let mut process = Process::new(name.to_string(), line);
        let mut section = Section::Directives;

        for stmt in body {
            for label in &stmt.labels {
                section = section.after_label(label, &mut process.script_kind);
            }
            match section {
                Section::Directives => process.directive_stmt(stmt),
                Section::Input => match stmt.as_expr() {
                    Some(expr) => match Input::extract(expr) {
                        Some(input) => process.inputs.push(input),
                        None => tracing::debug!(process = name, stmt = %stmt.text(), "skipping input"),
                    },
                    None => skip_empty(name, stmt, "input"),
                },
                Section::Output => match stmt.as_expr() {
                    Some(expr) => match Output::extract(expr) {
                        Some(output) => process.outputs.push(output),
                        None => tracing::debug!(process = name, stmt = %stmt.text(), "skipping output"),
                    },
                    None => skip_empty(name, stmt, "output"),
                },
                Section::When => {
                    if let Some(expr) = stmt.as_expr() {
                        process.when.get_or_insert_with(|| expr.text());
                    }
                }
                Section::Script => {
                    if !matches!(stmt.kind, StmtKind::Empty) {
                        process.script.push(stmt.clone());
                    }
                }
                Section::Stub => {}
            }
        }
        process
    }

    fn directive_stmt(&mut self, stmt: &Stmt) {
        let expr = match &stmt.kind {
            StmtKind::Empty | StmtKind::If { .. } => return,
            StmtKind::Expr(expr) => expr,
            _ => {
                self.errors.push(format!("unknown statement: {}", stmt.text()));
                return;
            }
        };

        match &expr.kind {
            ExprKind::MethodCall(call) => match Directive::extract(call, stmt.line()) {
                Ok(directive) => self.directives.push(directive),
                Err(err) => self.errors.push(err.to_string()),
            },
            ExprKind::Binary { .. }
            | ExprKind::Constant(_)
            | ExprKind::GString(_)
            | ExprKind::Declaration { .. }
            | ExprKind::Property(_) => {}
            _ => self.errors.push(format!("unknown statement: {}", stmt.text())),
        }
    }
}

fn skip_empty(process: &str, stmt: &Stmt, section: &str) {
    if !matches!(stmt.kind, StmtKind::Empty) {
        tracing::debug!(process, section, stmt = %stmt.text(), "skipping statement");
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Directives,
    Input,
    Output,
    When,
    Script,
    Stub,
}

impl Section {
    fn after_label(self, label: &str, script_kind: &mut Option<ScriptKind>) -> Section {
        match label {
            "input" => Section::Input,
            "output" => Section::Output,
            "when" => Section::When,
            "script" => {
                *script_kind = Some(ScriptKind::Script);
                Section::Script
            }
            "shell" => {
                *script_kind = Some(ScriptKind::Shell);
                Section::Script
            }
            "exec" => {
                *script_kind = Some(ScriptKind::Exec);
                Section::Script
            }
            "stub" => Section::Stub,
            _ => self,
        }
    }
}

/// Collects every `process NAME { ... }` definition in a file.
#[derive(Debug, Default)]
pub struct ProcessVisitor {
    pub processes: Vec<Process>,
    /// `process` calls of any other shape.
    pub anomalies: Vec<Anomaly>,
}

impl ProcessVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'ast> Visitor<'ast> for ProcessVisitor {
    fn visit_method_call(&mut self, expr: &'ast Expr, call: &'ast MethodCall) {
        if call.method != "process" || !call.implicit_this() {
            walk_expr(self, expr);
            return;
        }

        match definition(call) {
            Some((name, body)) => {
                tracing::debug!(process = name, line = expr.line(), "found process");
                self.processes
                    .push(Process::from_body(name, expr.line(), body.block_stmts()));
            }
            None => self.anomalies.push(Anomaly {
                line: expr.line(),
                text: expr.text(),
            }),
        }
    }
}

/// Matches `process(NAME({ body }))`.
fn definition(call: &MethodCall) -> Option<(&str, &Stmt)> {
    let [inner] = call.args() else {
        return None;
    };
    let inner = inner.as_method_call().filter(|c| c.implicit_this())?;
    match &inner.closure_arg()?.kind {
        ExprKind::Closure { body, .. } => Some((inner.method.as_str(), body.as_ref())),
        _ => None,
    }
}
