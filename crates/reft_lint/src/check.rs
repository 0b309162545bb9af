//! One-shot checks over a single file.
//!
//! A checks script defines `main(params, includes)`. `params` holds one
//! `#{name, line}` map per parameter; `includes` holds one
//! `#{name, alias, from_, line}` map per imported name.

use crate::error::{ScriptError, ScriptResult};
use crate::script::env::{base_engine, failure_message};
use reft_ast::visit::Visitor;
use reft_nf::{IncludeStatement, IncludeVisitor, ParamInfo, ParamVisitor};
use rhai::{Array, Dynamic, Map, Scope, INT};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// What a checks script printed, and how it failed if it did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    pub outputs: Vec<String>,
    pub error: Option<String>,
}

fn param(info: &ParamInfo) -> Dynamic {
    let mut map = Map::new();
    map.insert("name".into(), info.name.clone().into());
    map.insert("line".into(), (info.line as INT).into());
    Dynamic::from_map(map).into_read_only()
}

fn include_items(statement: &IncludeStatement) -> impl Iterator<Item = Dynamic> + '_ {
    statement.items.iter().map(move |item| {
        let mut map = Map::new();
        map.insert("name".into(), item.name.clone().into());
        map.insert(
            "alias".into(),
            item.alias.clone().map_or(Dynamic::UNIT, Dynamic::from),
        );
        map.insert("from_".into(), statement.module_path.clone().into());
        map.insert("line".into(), (statement.line as INT).into());
        Dynamic::from_map(map).into_read_only()
    })
}

/// Runs `checks_file`'s `main` against the params and includes of `nf_file`.
pub fn run_check(nf_file: impl AsRef<Path>, checks_file: impl AsRef<Path>) -> ScriptResult<CheckOutcome> {
    let (nf_file, checks_file) = (nf_file.as_ref(), checks_file.as_ref());
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })
    };

    let script = read(checks_file)?;
    let source = read(nf_file)?;
    let ast = reft_parser::parse_source(&source).map_err(|err| err.into_syntax_error(nf_file))?;

    let params: Array = ParamVisitor::collect(&ast).iter().map(param).collect();
    let mut visitor = IncludeVisitor::new();
    visitor.visit_source_file(&ast);
    let includes: Array = visitor.into_sorted().iter().flat_map(include_items).collect();
    tracing::debug!(params = params.len(), includes = includes.len(), "collected check inputs");

    run_main(checks_file, &script, params, includes)
}

fn run_main(path: &Path, script: &str, params: Array, includes: Array) -> ScriptResult<CheckOutcome> {
    let outputs = Arc::new(Mutex::new(Vec::new()));
    let mut engine = base_engine();
    let printed = Arc::clone(&outputs);
    engine.on_print(move |text| {
        printed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string())
    });

    let ast = engine.compile(script).map_err(|err| ScriptError::Compile {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if !ast.iter_functions().any(|f| f.name == "main" && f.params.len() == 2) {
        return Err(ScriptError::MissingMain);
    }

    let result = engine.call_fn::<Dynamic>(&mut Scope::new(), &ast, "main", (params, includes));
    let error = result.err().map(|err| failure_message(&err));

    let outputs = std::mem::take(&mut *outputs.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(CheckOutcome { outputs, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MAIN_NF: &str = r#"include { FASTQC } from './modules/fastqc'
include { TRIM as TRIM_READS; ALIGN } from './modules/align'

workflow {
    FASTQC(params.input)
    TRIM_READS(params.input, params.adapters)
}
"#;

    fn check(script: &str) -> ScriptResult<CheckOutcome> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.nf"), MAIN_NF).unwrap();
        fs::write(dir.path().join("checks.rhai"), script).unwrap();
        run_check(dir.path().join("main.nf"), dir.path().join("checks.rhai"))
    }

    #[test]
    fn test_params_and_includes() {
        let outcome = check(
            r#"
fn main(params, includes) {
    for p in params { print(`${p.name}@${p.line}`); }
    for i in includes { print(`${i.name} ${i.alias} ${i.from_} ${i.line}`); }
}
"#,
        )
        .unwrap();
        assert_eq!(
            outcome.outputs,
            vec![
                "input@5",
                "adapters@6",
                "FASTQC  ./modules/fastqc 1",
                "TRIM TRIM_READS ./modules/align 2",
                "ALIGN  ./modules/align 2",
            ]
        );
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn test_failure_is_reported() {
        let outcome = check("fn main(params, includes) { print(\"start\"); params[99].name }\n").unwrap();
        assert_eq!(outcome.outputs, vec!["start"]);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_missing_main() {
        let err = check("fn helper() {}\n").unwrap_err();
        assert!(matches!(err, ScriptError::MissingMain));
    }

    #[test]
    fn test_syntax_error_in_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.nf"), "process {\n").unwrap();
        fs::write(dir.path().join("checks.rhai"), "fn main(p, i) {}").unwrap();
        let err = run_check(dir.path().join("main.nf"), dir.path().join("checks.rhai")).unwrap_err();
        assert!(matches!(err, ScriptError::Syntax(_)));
    }
}
