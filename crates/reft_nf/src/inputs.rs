//! Process inputs.

use crate::args::{const_string, string_or_gstring, CallArgs};
use reft_ast::{Expr, ExprKind, MethodCall};
use serde::Serialize;

/// An input declaration and the line it was written on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Input {
    pub line: u32,
    #[serde(flatten)]
    pub kind: InputKind,
}

/// The kinds of process input.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InputKind {
    Val {
        var: String,
    },
    Path {
        path: String,
        arity: Option<String>,
        stage_as: Option<String>,
    },
    File {
        path: String,
        arity: Option<String>,
        stage_as: Option<String>,
    },
    Env {
        var: String,
    },
    Stdin {
        var: Option<String>,
    },
    Each {
        value: Box<InputKind>,
    },
    Tuple {
        values: Vec<InputKind>,
    },
}

impl InputKind {
    /// The qualifier as written: `val`, `path`, `tuple`, ...
    pub fn qualifier(&self) -> &'static str {
        match self {
            InputKind::Val { .. } => "val",
            InputKind::Path { .. } => "path",
            InputKind::File { .. } => "file",
            InputKind::Env { .. } => "env",
            InputKind::Stdin { .. } => "stdin",
            InputKind::Each { .. } => "each",
            InputKind::Tuple { .. } => "tuple",
        }
    }
}

impl Input {
    /// Extracts an input from a statement expression inside `input:`.
    ///
    /// Returns `None` for shapes that are not input declarations.
    pub fn extract(expr: &Expr) -> Option<Input> {
        let kind = match &expr.kind {
            ExprKind::Variable(name) if name == "stdin" => InputKind::Stdin { var: None },
            ExprKind::MethodCall(call) if call.implicit_this() => extract_call(call)?,
            _ => return None,
        };
        Some(Input {
            line: expr.line(),
            kind,
        })
    }
}

fn extract_call(call: &MethodCall) -> Option<InputKind> {
    let args = CallArgs::of(call);
    match call.method.as_str() {
        "val" => Some(InputKind::Val {
            var: variable(args.single()?)?,
        }),
        "env" => Some(InputKind::Env {
            var: args
                .single()
                .and_then(|e| variable(e).or_else(|| const_string(e)))?,
        }),
        "stdin" => Some(InputKind::Stdin {
            var: args.single().and_then(variable),
        }),
        "path" => {
            let (path, arity, stage_as) = path_parts(&args)?;
            Some(InputKind::Path {
                path,
                arity,
                stage_as,
            })
        }
        "file" => {
            let (path, arity, stage_as) = path_parts(&args)?;
            Some(InputKind::File {
                path,
                arity,
                stage_as,
            })
        }
        "each" => {
            let value = args.single()?;
            let inner = match &value.kind {
                ExprKind::Variable(name) => InputKind::Val { var: name.clone() },
                ExprKind::MethodCall(inner) if matches!(inner.method.as_str(), "path" | "file") => {
                    extract_call(inner)?
                }
                _ => return None,
            };
            Some(InputKind::Each {
                value: Box::new(inner),
            })
        }
        "tuple" => {
            let values: Vec<InputKind> = args
                .positional
                .iter()
                .filter_map(|arg| match &arg.kind {
                    ExprKind::MethodCall(inner) if inner.method != "tuple" => {
                        let value = extract_call(inner);
                        if value.is_none() {
                            tracing::debug!(element = %arg.text(), "skipping tuple input element");
                        }
                        value
                    }
                    _ => None,
                })
                .collect();
            (!values.is_empty()).then_some(InputKind::Tuple { values })
        }
        _ => None,
    }
}

fn variable(expr: &Expr) -> Option<String> {
    expr.as_variable().map(str::to_string)
}

type PathParts = (String, Option<String>, Option<String>);

fn path_parts(args: &CallArgs<'_>) -> Option<PathParts> {
    let target = args.single()?;
    let path = variable(target).or_else(|| string_or_gstring(target))?;
    if path.is_empty() {
        return None;
    }
    let arity = args.named("arity").and_then(const_string);
    let stage_as = args.named("stageAs").and_then(string_or_gstring);
    Some((path, arity, stage_as))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_parser::parse_source;

    fn input(source: &str) -> Option<Input> {
        let file = parse_source(source).unwrap();
        let stmt = file.statements().next().unwrap();
        Input::extract(stmt.as_expr().unwrap())
    }

    fn kind(source: &str) -> Option<InputKind> {
        input(source).map(|i| i.kind)
    }

    #[test]
    fn test_val() {
        assert_eq!(kind("val x"), Some(InputKind::Val { var: "x".into() }));
        assert_eq!(kind("val(sample_id)"), Some(InputKind::Val { var: "sample_id".into() }));
        assert_eq!(kind("val 'x'"), None);
    }

    #[test]
    fn test_path_with_options() {
        assert_eq!(
            kind("path reads, stageAs: 'input/*', arity: '1..*'"),
            Some(InputKind::Path {
                path: "reads".into(),
                arity: Some("1..*".into()),
                stage_as: Some("input/*".into()),
            })
        );
        assert_eq!(kind("path ''"), None);
    }

    #[test]
    fn test_tuple() {
        let Some(InputKind::Tuple { values }) = kind("tuple val(meta), path(reads)") else {
            panic!("expected tuple");
        };
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].qualifier(), "val");
        assert_eq!(values[1].qualifier(), "path");
    }

    #[test]
    fn test_tuple_skips_bad_elements() {
        let Some(InputKind::Tuple { values }) = kind("tuple val(meta), val('x'), path(fasta)") else {
            panic!("expected tuple");
        };
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_each() {
        assert_eq!(
            kind("each mode"),
            Some(InputKind::Each {
                value: Box::new(InputKind::Val { var: "mode".into() })
            })
        );
        assert!(matches!(
            kind("each path(db)"),
            Some(InputKind::Each { value }) if value.qualifier() == "path"
        ));
    }

    #[test]
    fn test_env_and_stdin() {
        assert_eq!(kind("env FOO"), Some(InputKind::Env { var: "FOO".into() }));
        assert_eq!(kind("env 'BAR'"), Some(InputKind::Env { var: "BAR".into() }));
        assert_eq!(kind("stdin"), Some(InputKind::Stdin { var: None }));
        assert_eq!(kind("stdin str"), Some(InputKind::Stdin { var: Some("str".into()) }));
    }

    #[test]
    fn test_line() {
        assert_eq!(input("\nval x").unwrap().line, 2);
    }
}
