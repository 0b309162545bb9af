//! Process outputs.

use crate::args::{const_bool, const_int, const_string, string_or_gstring, CallArgs};
use reft_ast::{Expr, ExprKind, MethodCall};
use serde::Serialize;

/// An output declaration with its channel options.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Output {
    pub line: u32,
    /// The name the output channel is emitted under.
    pub emit: Option<String>,
    pub optional: bool,
    pub topic: Option<String>,
    #[serde(flatten)]
    pub kind: OutputKind,
}

/// The kinds of process output.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutputKind {
    Val {
        value: String,
    },
    Path {
        path: String,
        arity: Option<String>,
        follow_links: Option<bool>,
        glob: Option<bool>,
        hidden: Option<bool>,
        include_inputs: Option<bool>,
        max_depth: Option<i64>,
        path_type: Option<String>,
    },
    File {
        path: String,
    },
    Env {
        var: String,
    },
    Stdout,
    Eval {
        command: String,
    },
    Tuple {
        values: Vec<Output>,
    },
}

impl OutputKind {
    /// The qualifier as written: `val`, `path`, `tuple`, ...
    pub fn qualifier(&self) -> &'static str {
        match self {
            OutputKind::Val { .. } => "val",
            OutputKind::Path { .. } => "path",
            OutputKind::File { .. } => "file",
            OutputKind::Env { .. } => "env",
            OutputKind::Stdout => "stdout",
            OutputKind::Eval { .. } => "eval",
            OutputKind::Tuple { .. } => "tuple",
        }
    }
}

impl Output {
    /// Extracts an output from a statement expression inside `output:`.
    ///
    /// Returns `None` for shapes that are not output declarations.
    pub fn extract(expr: &Expr) -> Option<Output> {
        match &expr.kind {
            ExprKind::Variable(name) if name == "stdout" => Some(Output {
                line: expr.line(),
                emit: None,
                optional: false,
                topic: None,
                kind: OutputKind::Stdout,
            }),
            ExprKind::MethodCall(call) if call.implicit_this() => extract_call(call, expr.line()),
            _ => None,
        }
    }
}

fn extract_call(call: &MethodCall, line: u32) -> Option<Output> {
    let args = CallArgs::of(call);
    let kind = match call.method.as_str() {
        "val" => OutputKind::Val {
            value: args
                .single()
                .and_then(|e| e.as_variable().map(str::to_string).or_else(|| value_text(e)))?,
        },
        "path" => {
            let target = args.single()?;
            OutputKind::Path {
                path: target
                    .as_variable()
                    .map(str::to_string)
                    .or_else(|| string_or_gstring(target))?,
                arity: args.named("arity").and_then(const_string),
                follow_links: args.named("followLinks").and_then(const_bool),
                glob: args.named("glob").and_then(const_bool),
                hidden: args.named("hidden").and_then(const_bool),
                include_inputs: args.named("includeInputs").and_then(const_bool),
                max_depth: args.named("maxDepth").and_then(const_int),
                path_type: args.named("type").and_then(const_string),
            }
        }
        "file" => {
            let target = args.single()?;
            OutputKind::File {
                path: target
                    .as_variable()
                    .map(str::to_string)
                    .or_else(|| string_or_gstring(target))?,
            }
        }
        "env" => OutputKind::Env {
            var: args
                .single()
                .and_then(|e| e.as_variable().map(str::to_string).or_else(|| const_string(e)))?,
        },
        "stdout" => {
            if !args.positional.is_empty() {
                return None;
            }
            OutputKind::Stdout
        }
        "eval" => OutputKind::Eval {
            command: args.single().and_then(string_or_gstring)?,
        },
        "tuple" => {
            let values: Vec<Output> = args
                .positional
                .iter()
                .filter_map(|arg| match &arg.kind {
                    ExprKind::MethodCall(inner) if inner.method != "tuple" => {
                        let value = extract_call(inner, line);
                        if value.is_none() {
                            tracing::debug!(element = %arg.text(), "skipping tuple output element");
                        }
                        value
                    }
                    _ => None,
                })
                .collect();
            if values.is_empty() {
                return None;
            }
            OutputKind::Tuple { values }
        }
        _ => return None,
    };

    Some(Output {
        line,
        emit: args.named("emit").and_then(name_text),
        optional: args.named("optional").and_then(const_bool).unwrap_or(false),
        topic: args.named("topic").and_then(name_text),
        kind,
    })
}

/// `val` outputs may emit a variable, a literal or an interpolated string.
fn value_text(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Constant(constant) => Some(constant.to_string()),
        ExprKind::GString(gstring) => Some(gstring.verbatim.clone()),
        _ => None,
    }
}

/// `emit: reads` names a channel with a bare identifier or a string.
fn name_text(expr: &Expr) -> Option<String> {
    expr.as_variable()
        .map(str::to_string)
        .or_else(|| const_string(expr))
}
