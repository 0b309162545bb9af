//! Include statements.

use reft_ast::visit::{walk_expr, Visitor};
use reft_ast::{Expr, ExprKind, MethodCall};
use serde::Serialize;

/// One name imported by an include statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct IncludeItem {
    pub name: String,
    pub alias: Option<String>,
}

/// `include { A; B as C } from './modules/x'`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct IncludeStatement {
    pub line: u32,
    pub module_path: String,
    pub items: Vec<IncludeItem>,
}

/// Collects include statements, which parse as `include({ ... }).from('path')`.
#[derive(Debug, Default)]
pub struct IncludeVisitor {
    pub includes: Vec<IncludeStatement>,
}

impl IncludeVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected statements ordered by line.
    pub fn into_sorted(mut self) -> Vec<IncludeStatement> {
        self.includes.sort_by_key(|include| include.line);
        self.includes
    }
}

impl<'ast> Visitor<'ast> for IncludeVisitor {
    fn visit_method_call(&mut self, expr: &'ast Expr, call: &'ast MethodCall) {
        match include_statement(expr, call) {
            Some(include) => self.includes.push(include),
            None => walk_expr(self, expr),
        }
    }
}

fn include_statement(expr: &Expr, call: &MethodCall) -> Option<IncludeStatement> {
    if call.method != "from" {
        return None;
    }
    let include = call.object.as_deref()?.as_method_call()?;
    if include.method != "include" || !include.implicit_this() {
        return None;
    }
    let ExprKind::Closure { body, .. } = &include.closure_arg()?.kind else {
        return None;
    };
    let [path] = call.args() else {
        tracing::debug!(line = expr.line(), "include without a single module path");
        return None;
    };
    let module_path = path.as_str()?.to_string();

    let items = body
        .block_stmts()
        .iter()
        .filter_map(|stmt| stmt.as_expr())
        .filter_map(include_item)
        .collect();

    Some(IncludeStatement {
        line: expr.line(),
        module_path,
        items,
    })
}

fn include_item(expr: &Expr) -> Option<IncludeItem> {
    match &expr.kind {
        ExprKind::Variable(name) => Some(IncludeItem {
            name: name.clone(),
            alias: None,
        }),
        ExprKind::Cast { ty, expr, .. } => Some(IncludeItem {
            name: expr.as_variable()?.to_string(),
            alias: Some(ty.clone()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_parser::parse_source;

    fn includes(source: &str) -> Vec<IncludeStatement> {
        let file = parse_source(source).unwrap();
        let mut visitor = IncludeVisitor::new();
        visitor.visit_source_file(&file);
        visitor.into_sorted()
    }

    #[test]
    fn test_items_and_aliases() {
        let all = includes("include { FOO; BAR as BAZ } from './modules/foo'");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].module_path, "./modules/foo");
        assert_eq!(
            all[0].items,
            vec![
                IncludeItem {
                    name: "FOO".into(),
                    alias: None
                },
                IncludeItem {
                    name: "BAR".into(),
                    alias: Some("BAZ".into())
                },
            ]
        );
    }

    #[test]
    fn test_multiline_and_order() {
        let all = includes(
            "include { A } from './a'\n\ninclude {\n    B\n    C as D\n} from '../b'\n",
        );
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].line, 1);
        assert_eq!(all[1].line, 3);
        assert_eq!(all[1].items.len(), 2);
    }

    #[test]
    fn test_add_params_chain() {
        let all = includes("include { A } from './a' addParams(options: [:])");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].module_path, "./a");
    }

    #[test]
    fn test_not_an_include() {
        assert!(includes("Channel.from(1, 2)").is_empty());
        assert!(includes("include { A } from params.path").is_empty());
    }
}
