//! Argument-shape helpers shared by the directive and channel extractors.

use reft_ast::{Constant, Expr, ExprKind, MethodCall};

/// The arguments of a call split into positional values and named options.
///
/// Named options come from a leading map (`path "x", emit: y`), a
/// named-only tuple (`ext version: '1'`) or a map literal argument.
pub(crate) struct CallArgs<'a> {
    pub positional: Vec<&'a Expr>,
    pub named: Vec<(&'a str, &'a Expr)>,
}

impl<'a> CallArgs<'a> {
    pub fn of(call: &'a MethodCall) -> Self {
        Self::from_exprs(call.args())
    }

    pub fn from_exprs(args: &'a [Expr]) -> Self {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            match arg.map_entries() {
                Some(entries) => named.extend(entries.iter().filter_map(entry)),
                None => positional.push(arg),
            }
        }
        Self { positional, named }
    }

    /// The only positional argument, if there is exactly one.
    pub fn single(&self) -> Option<&'a Expr> {
        match self.positional.as_slice() {
            [arg] => Some(arg),
            _ => None,
        }
    }

    /// The value of a named option.
    pub fn named(&self, key: &str) -> Option<&'a Expr> {
        self.named
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }
}

/// Splits a map entry into its key name and value.
pub(crate) fn entry(expr: &Expr) -> Option<(&str, &Expr)> {
    match &expr.kind {
        ExprKind::MapEntry { key, value } => key.as_str().map(|k| (k, value.as_ref())),
        _ => None,
    }
}

/// A string constant.
pub(crate) fn const_string(expr: &Expr) -> Option<String> {
    expr.as_str().map(str::to_string)
}

/// A string constant, or the verbatim body of an interpolated string.
pub(crate) fn string_or_gstring(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Constant(Constant::String(s)) => Some(s.clone()),
        ExprKind::GString(gstring) => Some(gstring.verbatim.clone()),
        _ => None,
    }
}

pub(crate) fn const_int(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::Constant(Constant::Int(n)) => Some(*n),
        _ => None,
    }
}

pub(crate) fn const_bool(expr: &Expr) -> Option<bool> {
    match &expr.kind {
        ExprKind::Constant(Constant::Bool(b)) => Some(*b),
        _ => None,
    }
}

/// A quantity written as a string or as a unit suffix on a number
/// (`'2h'`, `2.h`, `10.GB`).
pub(crate) fn quantity_text(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Property(prop) if matches!(prop.object.kind, ExprKind::Constant(_)) => {
            Some(expr.text())
        }
        _ => string_or_gstring(expr),
    }
}
