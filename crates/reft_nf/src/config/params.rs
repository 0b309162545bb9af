//! `params.*` references in config files.

use super::is_directive_target;
use crate::params::ParamInfo;
use reft_ast::visit::{walk_expr, Visitor};
use reft_ast::{Expr, PropertyAccess, SourceFile};

/// The parameter references inside one directive value.
pub(super) struct ParamRefs {
    closure_depth: usize,
    refs: Vec<(String, bool)>,
}

impl ParamRefs {
    /// Returns `(name, in_closure)` for every reference, in source order.
    pub fn collect(expr: &Expr) -> Vec<(String, bool)> {
        let mut visitor = ParamRefs {
            closure_depth: 0,
            refs: Vec::new(),
        };
        visitor.visit_expr(expr);
        visitor.refs
    }
}

impl<'ast> Visitor<'ast> for ParamRefs {
    fn visit_closure(&mut self, expr: &'ast Expr) {
        self.closure_depth += 1;
        walk_expr(self, expr);
        self.closure_depth -= 1;
    }

    fn visit_property(&mut self, expr: &'ast Expr, _prop: &'ast PropertyAccess) {
        if let Some(name) = expr.params_property() {
            self.refs.push((name.to_string(), self.closure_depth > 0));
        }
        walk_expr(self, expr);
    }
}

/// Records every `params.*` reference in a config with its context.
///
/// Unlike scripts, configs keep every occurrence: the same parameter
/// used by two directives is two findings.
#[derive(Debug, Default)]
pub struct ConfigParamVisitor {
    directives: Vec<String>,
    closure_depth: usize,
    params: Vec<ParamInfo>,
}

impl ConfigParamVisitor {
    /// All references in the file, ordered by line.
    pub fn collect(file: &SourceFile) -> Vec<ParamInfo> {
        let mut visitor = ConfigParamVisitor::default();
        visitor.visit_source_file(file);
        let mut params = visitor.params;
        params.sort_by_key(|param| param.line);
        params
    }
}

impl<'ast> Visitor<'ast> for ConfigParamVisitor {
    fn visit_binary(&mut self, expr: &'ast Expr) {
        let Some((target, value)) = expr.as_assignment() else {
            walk_expr(self, expr);
            return;
        };
        let name = target.text();
        if !is_directive_target(&name) {
            walk_expr(self, expr);
            return;
        }

        self.visit_expr(target);
        self.directives.push(name);
        self.visit_expr(value);
        self.directives.pop();
    }

    /// Only closures inside a directive value count; scope blocks such as
    /// `process { ... }` are closures too.
    fn visit_closure(&mut self, expr: &'ast Expr) {
        if self.directives.is_empty() {
            walk_expr(self, expr);
            return;
        }
        self.closure_depth += 1;
        walk_expr(self, expr);
        self.closure_depth -= 1;
    }

    fn visit_property(&mut self, expr: &'ast Expr, _prop: &'ast PropertyAccess) {
        if let Some(name) = expr.params_property() {
            self.params.push(ParamInfo {
                name: name.to_string(),
                line: expr.line(),
                in_directive: !self.directives.is_empty(),
                directive_name: self.directives.last().cloned(),
                in_closure: self.closure_depth > 0,
            });
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_parser::parse_source;

    #[test]
    fn test_refs_in_closure() {
        let file = parse_source("x = [a: params.a, b: { params.b }]").unwrap();
        let expr = file.statements().next().unwrap().as_expr().unwrap();
        let (_, value) = expr.as_assignment().unwrap();
        assert_eq!(
            ParamRefs::collect(value),
            vec![("a".to_string(), false), ("b".to_string(), true)]
        );
    }

    #[test]
    fn test_config_flavour_keeps_every_occurrence() {
        let file = parse_source(
            "params.outdir = 'results'\nprocess {\n  publishDir = [path: { \"${params.outdir}/x\" }]\n  withName: FOO {\n    cpus = params.max_cpus\n    ext.prefix = params.outdir\n  }\n}",
        )
        .unwrap();
        let params = ConfigParamVisitor::collect(&file);
        let seen: Vec<_> = params
            .iter()
            .map(|p| {
                (
                    p.name.as_str(),
                    p.line,
                    p.directive_name.as_deref(),
                    p.in_closure,
                )
            })
            .collect();
        assert_eq!(
            seen,
            vec![
                ("outdir", 1, None, false),
                ("outdir", 3, Some("publishDir"), true),
                ("max_cpus", 5, Some("cpus"), false),
                ("outdir", 6, Some("ext.prefix"), false),
            ]
        );
        assert!(params[1].in_directive);
        assert!(!params[0].in_directive);
    }
}
