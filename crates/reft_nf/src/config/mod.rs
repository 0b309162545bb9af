//! Nextflow configuration files.
//!
//! A config goes through the same lexer and parser as a script. The
//! analyzer then looks for `process { ... }` scopes, including ones nested
//! in profiles, and reads their directive assignments and their
//! `withName:` / `withLabel:` selectors:
//!
//! ```text
//! process {
//!     cpus = 2
//!     withName: 'FASTQC' {
//!         ext.args   = { "--quiet ${params.fastqc_args}" }
//!         publishDir = [ path: { "${params.outdir}/fastqc" }, mode: params.publish_dir_mode ]
//!     }
//! }
//! ```

mod params;

pub use params::ConfigParamVisitor;

use crate::directives::is_directive;
use crate::error::{ModuleError, ModuleResult};
use crate::params::ParamInfo;
use params::ParamRefs;
use reft_ast::visit::{walk_expr, Visitor};
use reft_ast::{Expr, ExprKind, MethodCall, SourceFile, Stmt};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The analyzed form of one `.config` file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub process_scopes: Vec<ProcessScope>,
    /// Every `params.*` reference in the file, ordered by line.
    pub params: Vec<ParamInfo>,
}

/// A `process { ... }` block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessScope {
    pub line: u32,
    pub directives: Vec<ConfigDirective>,
    pub named_scopes: Vec<NamedScope>,
}

/// How a named scope selects processes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Selector {
    WithName,
    WithLabel,
}

/// A `withName: PATTERN { ... }` or `withLabel: PATTERN { ... }` block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedScope {
    pub line: u32,
    /// The selector pattern, e.g. `FASTQC` or `.*:TRIMGALORE`.
    pub name: String,
    pub selector: Selector,
    pub directives: Vec<ConfigDirective>,
}

/// A directive assignment inside a process scope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigDirective {
    pub line: u32,
    /// The assigned name, e.g. `cpus` or `ext.args`.
    pub name: String,
    pub value: DirectiveValue,
    /// The entries of a map value, e.g. the `path:` and `mode:` of `publishDir`.
    pub options: Vec<NamedOption>,
}

/// One entry of a map-valued directive.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedOption {
    pub name: String,
    pub value: DirectiveValue,
}

/// A directive value and the parameters it refers to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectiveValue {
    /// Distinct parameter names, sorted.
    pub params: Vec<String>,
    /// True iff there is at least one reference and all of them are
    /// inside a closure.
    pub in_closure: bool,
    pub text: String,
    #[serde(skip)]
    pub expr: Expr,
}

impl DirectiveValue {
    pub fn new(expr: &Expr) -> Self {
        let refs = ParamRefs::collect(expr);
        let in_closure = !refs.is_empty() && refs.iter().all(|(_, in_closure)| *in_closure);
        let mut params: Vec<String> = refs.into_iter().map(|(name, _)| name).collect();
        params.sort();
        params.dedup();
        Self {
            params,
            in_closure,
            text: expr.text(),
            expr: expr.clone(),
        }
    }
}

impl ConfigFile {
    /// Reads and analyzes a config file.
    pub fn from_file(path: impl AsRef<Path>) -> ModuleResult<ConfigFile> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, &source)
    }

    /// Analyzes config source text attributed to `path`.
    pub fn from_source(path: impl AsRef<Path>, source: &str) -> ModuleResult<ConfigFile> {
        let path = path.as_ref();
        let ast = reft_parser::parse_source(source).map_err(|err| err.into_syntax_error(path))?;
        Ok(Self::from_ast(path, &ast))
    }

    pub fn from_ast(path: &Path, ast: &SourceFile) -> ConfigFile {
        let mut scopes = ProcessScopeVisitor::default();
        scopes.visit_source_file(ast);
        tracing::debug!(
            path = %path.display(),
            scopes = scopes.scopes.len(),
            "analyzed config"
        );

        ConfigFile {
            path: path.to_path_buf(),
            process_scopes: scopes.scopes,
            params: ConfigParamVisitor::collect(ast),
        }
    }

    /// Every directive in the file, including those in named scopes.
    pub fn directives(&self) -> impl Iterator<Item = &ConfigDirective> {
        self.process_scopes.iter().flat_map(|scope| {
            scope
                .directives
                .iter()
                .chain(scope.named_scopes.iter().flat_map(|named| &named.directives))
        })
    }
}

/// Returns true if an assignment target names a process directive.
pub(crate) fn is_directive_target(target: &str) -> bool {
    is_directive(target) || target.starts_with("ext.")
}

#[derive(Default)]
struct ProcessScopeVisitor {
    scopes: Vec<ProcessScope>,
}

impl<'ast> Visitor<'ast> for ProcessScopeVisitor {
    fn visit_method_call(&mut self, expr: &'ast Expr, call: &'ast MethodCall) {
        if call.method == "process" && call.implicit_this() {
            if let Some(body) = closure_body(call) {
                tracing::debug!(line = expr.line(), "found process scope");
                self.scopes.push(process_scope(expr.line(), body));
                return;
            }
        }
        walk_expr(self, expr);
    }
}

fn closure_body(call: &MethodCall) -> Option<&[Stmt]> {
    match &call.closure_arg()?.kind {
        ExprKind::Closure { body, .. } => Some(body.block_stmts()),
        _ => None,
    }
}

fn process_scope(line: u32, stmts: &[Stmt]) -> ProcessScope {
    let mut scope = ProcessScope {
        line,
        directives: Vec::new(),
        named_scopes: Vec::new(),
    };

    for stmt in stmts {
        let selector = stmt.labels.iter().find_map(|label| match label.as_str() {
            "withName" => Some(Selector::WithName),
            "withLabel" => Some(Selector::WithLabel),
            _ => None,
        });

        match selector {
            Some(selector) => {
                if let Some(named) = named_scope(stmt, selector) {
                    scope.named_scopes.push(named);
                }
            }
            None => scope.directives.extend(directive(stmt)),
        }
    }
    scope
}

fn named_scope(stmt: &Stmt, selector: Selector) -> Option<NamedScope> {
    let call = stmt.as_expr()?.as_method_call()?;
    let body = closure_body(call)?;
    Some(NamedScope {
        line: stmt.line(),
        name: call.method.clone(),
        selector,
        directives: body.iter().filter_map(directive).collect(),
    })
}

fn directive(stmt: &Stmt) -> Option<ConfigDirective> {
    let (target, value) = stmt.as_expr()?.as_assignment()?;
    let name = target.text();
    if !is_directive_target(&name) {
        return None;
    }

    let options = match &value.kind {
        ExprKind::Map(entries) => entries
            .iter()
            .filter_map(crate::args::entry)
            .map(|(key, value)| NamedOption {
                name: key.to_string(),
                value: DirectiveValue::new(value),
            })
            .collect(),
        _ => Vec::new(),
    };

    Some(ConfigDirective {
        line: stmt.line(),
        name,
        value: DirectiveValue::new(value),
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULES_CONFIG: &str = r#"
process {
    publishDir = [
        path: { "${params.outdir}/${task.process.tokenize(':')[-1].toLowerCase()}" },
        mode: params.publish_dir_mode,
        saveAs: { filename -> filename.equals('versions.yml') ? null : filename }
    ]

    withName: FASTQC {
        ext.args = '--quiet'
        cpus = { 2 * task.attempt }
    }

    withName: 'MULTIQC' {
        ext.args   = { params.multiqc_title ? "--title \"$params.multiqc_title\"" : '' }
        memory = 4.GB
    }

    withLabel: process_low {
        cpus = { check_max(2, params.max_cpus) }
    }
}
"#;

    fn config() -> ConfigFile {
        ConfigFile::from_source("conf/modules.config", MODULES_CONFIG).unwrap()
    }

    #[test]
    fn test_scopes() {
        let config = config();
        assert_eq!(config.process_scopes.len(), 1);
        let scope = &config.process_scopes[0];
        assert_eq!(scope.directives.len(), 1);
        let names: Vec<_> = scope
            .named_scopes
            .iter()
            .map(|n| (n.name.as_str(), n.selector))
            .collect();
        assert_eq!(
            names,
            vec![
                ("FASTQC", Selector::WithName),
                ("MULTIQC", Selector::WithName),
                ("process_low", Selector::WithLabel),
            ]
        );
    }

    #[test]
    fn test_map_value_options() {
        let config = config();
        let publish = &config.process_scopes[0].directives[0];
        assert_eq!(publish.name, "publishDir");
        let options: Vec<_> = publish.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(options, vec!["path", "mode", "saveAs"]);
        assert_eq!(publish.value.params, vec!["outdir", "publish_dir_mode"]);
        assert!(!publish.value.in_closure);
        assert!(publish.options[0].value.in_closure);
        assert!(!publish.options[1].value.in_closure);
        assert!(!publish.options[2].value.in_closure);
    }

    #[test]
    fn test_ext_and_closure_values() {
        let config = config();
        let multiqc = &config.process_scopes[0].named_scopes[1];
        assert_eq!(multiqc.directives[0].name, "ext.args");
        assert_eq!(multiqc.directives[0].value.params, vec!["multiqc_title"]);
        assert!(multiqc.directives[0].value.in_closure);
        assert_eq!(multiqc.directives[1].name, "memory");
        assert!(multiqc.directives[1].value.params.is_empty());
    }

    #[test]
    fn test_all_directives() {
        assert_eq!(config().directives().count(), 6);
    }

    #[test]
    fn test_nested_in_profile() {
        let config = ConfigFile::from_source(
            "nextflow.config",
            "params { outdir = 'results' }\nprofiles {\n  test {\n    process { cpus = 1 }\n  }\n}",
        )
        .unwrap();
        assert_eq!(config.process_scopes.len(), 1);
        assert_eq!(config.process_scopes[0].line, 4);
    }

    #[test]
    fn test_non_directives_ignored() {
        let config =
            ConfigFile::from_source("x.config", "process {\n  foo = 1\n  cpus = 2\n}").unwrap();
        let names: Vec<_> = config.directives().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["cpus"]);
    }
}
