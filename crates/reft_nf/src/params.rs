//! `params.*` references.

use indexmap::IndexMap;
use reft_ast::visit::{HookVisitor, Phase};
use reft_ast::{ExprTag, SourceFile};
use serde::Serialize;

/// A reference to a pipeline parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ParamInfo {
    pub name: String,
    pub line: u32,
    /// Config files only: the reference is part of a directive value.
    pub in_directive: bool,
    pub directive_name: Option<String>,
    /// Config files only: the reference is inside a closure.
    pub in_closure: bool,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            line,
            in_directive: false,
            directive_name: None,
            in_closure: false,
        }
    }
}

/// Collects the parameters a script refers to.
pub struct ParamVisitor;

impl ParamVisitor {
    /// Every distinct `params.<name>` in a script, at its first line,
    /// ordered by that line.
    pub fn collect(file: &SourceFile) -> Vec<ParamInfo> {
        let mut first_seen: IndexMap<String, u32> = IndexMap::new();
        HookVisitor::new()
            .on_expr(ExprTag::Property, |expr, phase| {
                if phase != Phase::Enter {
                    return;
                }
                if let Some(name) = expr.params_property() {
                    first_seen.entry(name.to_string()).or_insert(expr.line());
                }
            })
            .run(file);

        let mut params: Vec<ParamInfo> = first_seen
            .into_iter()
            .map(|(name, line)| ParamInfo::new(name, line))
            .collect();
        params.sort_by_key(|param| param.line);
        params
    }
}
