//! Scripted lint rules.
//!
//! A rules file is a rhai script. Every function whose name starts with
//! `rule_` is a rule; `rule_has_label` runs as `has_label`. Each rule is
//! called once per module with that module's projection:
//!
//! ```text
//! fn rule_has_label(m) {
//!     for p in m.processes {
//!         if p.directives.label.is_empty() {
//!             error("process", p.name, "has no label");
//!         }
//!     }
//! }
//! ```
//!
//! The script environment provides:
//!
//! - `error(...)`: records an error for the current rule and module
//! - `fatal(...)`: records an error and stops the current rule
//! - `print(...)`: recorded as output for the current rule and module
//! - `re::*`: regular expressions
//!
//! `throw` is not available; rules report through `error` and `fatal`.

pub(crate) mod env;
pub mod projection;

use crate::error::{ScriptError, ScriptResult};
use env::{failure_message, lint_engine, with_collector, Collector, SharedCollector};
use reft_driver::Session;
use reft_nf::Module;
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Options for a scripted lint run.
#[derive(Clone, Debug)]
pub struct LintOptions {
    /// The rules script.
    pub rules_file: PathBuf,

    /// The pipeline directory to lint.
    pub directory: PathBuf,

    /// Run only this rule.
    pub rule: Option<String>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            rules_file: PathBuf::from("rules.rhai"),
            directory: PathBuf::from("."),
            rule: None,
        }
    }
}

impl LintOptions {
    pub fn with_rules_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_file = path.into();
        self
    }

    pub fn with_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directory = path.into();
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

/// What one rule reported for one module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RuleModuleOutput {
    pub errors: Vec<String>,
    pub outputs: Vec<String>,
}

/// rule -> module path -> output
pub type GroupedOutput = BTreeMap<String, BTreeMap<String, RuleModuleOutput>>;

/// The diagnostics of a scripted lint run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScriptReport {
    pub rules: GroupedOutput,
}

impl ScriptReport {
    pub fn has_errors(&self) -> bool {
        self.rules
            .values()
            .flat_map(BTreeMap::values)
            .any(|entry| !entry.errors.is_empty())
    }

    /// 1 if any rule reported an error.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_errors())
    }

    /// Writes the report grouped by rule, then module. Modules a rule had
    /// nothing to say about are left out.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out)?;
        for (rule, modules) in &self.rules {
            writeln!(out, "Rule: {}", rule)?;
            for (module, entry) in modules {
                if entry.errors.is_empty() && entry.outputs.is_empty() {
                    continue;
                }
                writeln!(out, "  Module: {}", module)?;
                for error in &entry.errors {
                    writeln!(out, "    Error: {}", error)?;
                }
                for output in &entry.outputs {
                    writeln!(out, "    Output: {}", output)?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// A compiled rules script.
pub struct ScriptedLinter {
    engine: Engine,
    ast: AST,
    /// (rule name, function name), sorted by rule name.
    rules: Vec<(String, String)>,
    collector: SharedCollector,
}

impl ScriptedLinter {
    /// Reads and compiles a rules file.
    pub fn from_file(path: impl AsRef<Path>) -> ScriptResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScriptError::RulesNotFound(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, &source)
    }

    /// Compiles rules from source text; `path` is used in messages.
    pub fn from_source(path: impl AsRef<Path>, source: &str) -> ScriptResult<Self> {
        let collector = SharedCollector::default();
        let engine = lint_engine(&collector);

        let ast = engine
            .compile(source)
            .map_err(|err| ScriptError::Compile {
                path: path.as_ref().to_path_buf(),
                message: err.to_string(),
            })?;

        // Top-level statements run once, outside any rule.
        engine
            .run_ast_with_scope(&mut Scope::new(), &ast)
            .map_err(|err| ScriptError::Init(failure_message(&err)))?;

        let mut rules: Vec<(String, String)> = ast
            .iter_functions()
            .filter_map(|f| {
                let rule = f.name.strip_prefix("rule_")?;
                (f.params.len() == 1).then(|| (rule.to_string(), f.name.to_string()))
            })
            .collect();
        rules.sort();
        rules.dedup();
        tracing::debug!(rules = rules.len(), "compiled rules script");

        Ok(Self {
            engine,
            ast,
            rules,
            collector,
        })
    }

    /// Rule names, sorted.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(rule, _)| rule.as_str())
    }

    /// Runs every rule, or only `only`, over every module.
    pub fn run(&self, modules: &[Module], only: Option<&str>) -> ScriptReport {
        let mut scope = Scope::new();

        for (rule, function) in &self.rules {
            if only.is_some_and(|name| name != rule.as_str()) {
                continue;
            }
            tracing::debug!(rule = %rule, "running rule");
            for module in modules {
                let path = module.path.display().to_string();
                with_collector(&self.collector, |c| c.enter(rule, &path));

                let outcome = projection::module(module).and_then(|projected| {
                    self.engine.call_fn_with_options::<Dynamic>(
                        CallFnOptions::new().eval_ast(false).rewind_scope(true),
                        &mut scope,
                        &self.ast,
                        function,
                        (projected,),
                    )
                });
                if let Err(err) = outcome {
                    let message = failure_message(&err);
                    tracing::debug!(rule = %rule, path = %path, %message, "rule failed");
                    with_collector(&self.collector, |c| c.error(message));
                }

                with_collector(&self.collector, Collector::leave);
            }
        }

        ScriptReport {
            rules: with_collector(&self.collector, Collector::take),
        }
    }
}

/// Compiles the rules file, builds the modules in the configured directory
/// and runs the rules over them.
pub fn run_lint(options: &LintOptions, session: &Session) -> ScriptResult<ScriptReport> {
    let linter = ScriptedLinter::from_file(&options.rules_file)?;
    let modules = session.load_directory(&options.directory)?;
    tracing::info!(
        modules = modules.len(),
        rules = linter.rules.len(),
        "running scripted rules"
    );
    Ok(linter.run(&modules, options.rule.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_nf::ModuleBuilder;

    fn modules() -> Vec<Module> {
        vec![
            ModuleBuilder::new("/p/a.nf")
                .build_source("process A {\n    label 'process_low'\n    cpus 2\n}\n")
                .unwrap(),
            ModuleBuilder::new("/p/b.nf")
                .build_source("process B {\n    cpus 200\n}\n")
                .unwrap(),
        ]
    }

    fn linter(source: &str) -> ScriptedLinter {
        ScriptedLinter::from_source("rules.rhai", source).unwrap()
    }

    #[test]
    fn test_rules_are_discovered() {
        let linter = linter(
            "fn helper(x) { x }\nfn rule_b(m) {}\nfn rule_a(m) {}\nfn rule_wrong_arity() {}\n",
        );
        assert_eq!(linter.rule_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_errors_and_outputs_are_grouped() {
        let linter = linter(
            r#"
fn rule_has_label(m) {
    for p in m.processes {
        if p.directives.label.is_empty() {
            error("process", p.name, "has no label");
        } else {
            print(`${p.name} ok`);
        }
    }
}
"#,
        );
        let report = linter.run(&modules(), None);
        let rule = &report.rules["has_label"];
        assert_eq!(rule["/p/a.nf"].outputs, vec!["A ok"]);
        assert!(rule["/p/a.nf"].errors.is_empty());
        assert_eq!(rule["/p/b.nf"].errors, vec!["process B has no label"]);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_fatal_stops_only_the_current_rule() {
        let linter = linter(
            r#"
fn rule_cpus(m) {
    for p in m.processes {
        for d in p.directives.cpus {
            if d.num > 96 {
                fatal("Process", p.name, "has an invalid CPU value:", d.num);
            }
        }
    }
    print("checked");
}
fn rule_other(m) {
    print("other ran");
}
"#,
        );
        let report = linter.run(&modules(), None);
        assert_eq!(report.rules["cpus"]["/p/a.nf"].outputs, vec!["checked"]);
        assert_eq!(
            report.rules["cpus"]["/p/b.nf"],
            RuleModuleOutput {
                errors: vec!["Process B has an invalid CPU value: 200".to_string()],
                outputs: Vec::new(),
            }
        );
        assert_eq!(report.rules["other"]["/p/b.nf"].outputs, vec!["other ran"]);
    }

    #[test]
    fn test_evaluation_errors_are_recorded() {
        let linter = linter("fn rule_broken(m) { m.processes[10].name }\n");
        let report = linter.run(&modules(), None);
        assert_eq!(report.rules["broken"].len(), 2);
        assert!(report.has_errors());
    }

    #[test]
    fn test_single_rule_filter() {
        let linter = linter("fn rule_a(m) { print(\"a\"); }\nfn rule_b(m) { print(\"b\"); }\n");
        let report = linter.run(&modules(), Some("b"));
        assert_eq!(report.rules.len(), 1);
        assert!(report.rules.contains_key("b"));
        assert!(!report.has_errors());
    }

    #[test]
    fn test_runs_are_independent() {
        let linter = linter("fn rule_a(m) { error(m.path); }\n");
        let first = linter.run(&modules(), None);
        let second = linter.run(&modules(), None);
        assert_eq!(first, second);
        assert_eq!(first.rules["a"]["/p/a.nf"].errors.len(), 1);
    }

    #[test]
    fn test_nested_loops_and_branches() {
        let linter = linter(
            r#"
fn rule_labels(m) {
    for p in m.processes {
        for d in p.directives.label {
            if d.label == "" { error("x"); } else { print(`${p.name}: ${d.label}`); }
        }
    }
}
"#,
        );
        let report = linter.run(&modules(), None);
        assert_eq!(report.rules["labels"]["/p/a.nf"].outputs, vec!["A: process_low"]);
        assert!(report.rules["labels"]["/p/b.nf"].outputs.is_empty());
        assert!(!report.has_errors());
    }

    #[test]
    fn test_compile_error() {
        let err = ScriptedLinter::from_source("rules.rhai", "fn rule_a(m) {").err().unwrap();
        assert!(matches!(err, ScriptError::Compile { .. }));
        assert!(err.to_string().starts_with("error compiling rules.rhai: "));
    }

    #[test]
    fn test_render() {
        let mut rules = GroupedOutput::new();
        rules.entry("labels".into()).or_default().insert(
            "/p/a.nf".into(),
            RuleModuleOutput {
                errors: vec!["no label".into()],
                outputs: vec!["looked".into()],
            },
        );
        rules
            .entry("labels".into())
            .or_default()
            .insert("/p/b.nf".into(), RuleModuleOutput::default());

        let mut out = Vec::new();
        ScriptReport { rules }.render(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nRule: labels\n  Module: /p/a.nf\n    Error: no label\n    Output: looked\n\n"
        );
    }
}
