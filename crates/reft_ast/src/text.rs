//! Source-like text rendering for AST nodes.
//!
//! The rendering is used in diagnostics and by extractors that keep a
//! value's text (property chains, ternary containers). String constants
//! render without quotes; interpolated strings render their verbatim body.

use crate::{Constant, Expr, ExprKind, MethodCall, Param, Stmt, StmtKind};
use std::fmt::{self, Write};

impl Expr {
    /// Returns the source-like text of this expression.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl Stmt {
    /// Returns the source-like text of this statement.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::String(s) => write!(f, "{}", s),
            Constant::Int(n) => write!(f, "{}", n),
            Constant::Float(n) => write!(f, "{}", n),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Null => write!(f, "null"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Param]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if let Some(ty) = &param.ty {
            write!(f, "{} ", ty)?;
        }
        f.write_str(&param.name)?;
        if let Some(default) = &param.default {
            write!(f, " = {}", default)?;
        }
    }
    Ok(())
}

/// Renders call arguments, always parenthesized.
fn write_args(f: &mut fmt::Formatter<'_>, arguments: &Expr) -> fmt::Result {
    match &arguments.kind {
        ExprKind::ArgumentList(_) | ExprKind::Tuple(_) => write!(f, "{}", arguments),
        _ => write!(f, "({})", arguments),
    }
}

fn write_method_call(f: &mut fmt::Formatter<'_>, call: &MethodCall) -> fmt::Result {
    if let Some(object) = &call.object {
        write!(f, "{}", object)?;
        if call.spread {
            f.write_char('*')?;
        }
        if call.safe {
            f.write_char('?')?;
        }
        f.write_char('.')?;
    }
    if is_identifier(&call.method) {
        f.write_str(&call.method)?;
    } else {
        write!(f, "'{}'", call.method)?;
    }
    write_args(f, &call.arguments)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::MethodCall(call) => write_method_call(f, call),
            ExprKind::StaticMethodCall {
                class,
                method,
                arguments,
            } => {
                write!(f, "{}.{}", class, method)?;
                write_args(f, arguments)
            }
            ExprKind::ConstructorCall { class, arguments } => {
                write!(f, "new {}", class)?;
                write_args(f, arguments)
            }
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => write!(f, "{} ? {} : {}", condition, then_expr, else_expr),
            ExprKind::Elvis { value, fallback } => write!(f, "{} ?: {}", value, fallback),
            ExprKind::Binary { op, left, right } => match op {
                crate::BinaryOp::Index => write!(f, "{}[{}]", left, right),
                _ => write!(f, "{} {} {}", left, op.as_str(), right),
            },
            ExprKind::Prefix { op, expr } => write!(f, "{}{}", op.as_str(), expr),
            ExprKind::Postfix { op, expr } => write!(f, "{}{}", expr, op.as_str()),
            ExprKind::Unary { op, expr } => write!(f, "{}{}", op.as_str(), expr),
            ExprKind::Boolean(expr) => write!(f, "{}", expr),
            ExprKind::Cast { ty, expr, coerce } => {
                if *coerce {
                    write!(f, "{} as {}", expr, ty)
                } else {
                    write!(f, "({}) {}", ty, expr)
                }
            }
            ExprKind::Closure { params, .. } => {
                if params.is_empty() {
                    f.write_str("{ ... }")
                } else {
                    f.write_str("{ ")?;
                    write_params(f, params)?;
                    f.write_str(" -> ... }")
                }
            }
            ExprKind::Lambda { params, .. } => {
                f.write_char('(')?;
                write_params(f, params)?;
                f.write_str(") -> { ... }")
            }
            ExprKind::Tuple(items) | ExprKind::ArgumentList(items) => {
                f.write_char('(')?;
                write_list(f, items, ", ")?;
                f.write_char(')')
            }
            ExprKind::NamedArgumentList(entries) => write_list(f, entries, ", "),
            ExprKind::Map(entries) => {
                if entries.is_empty() {
                    return f.write_str("[:]");
                }
                f.write_char('[')?;
                write_list(f, entries, ", ")?;
                f.write_char(']')
            }
            ExprKind::MapEntry { key, value } => write!(f, "{}:{}", key, value),
            ExprKind::List(items) => {
                f.write_char('[')?;
                write_list(f, items, ", ")?;
                f.write_char(']')
            }
            ExprKind::Range {
                from,
                to,
                exclusive,
            } => {
                let op = if *exclusive { "..<" } else { ".." };
                write!(f, "{}{}{}", from, op, to)
            }
            ExprKind::Property(prop) => {
                write!(f, "{}", prop.object)?;
                if prop.spread {
                    f.write_char('*')?;
                }
                if prop.safe {
                    f.write_char('?')?;
                }
                write!(f, ".{}", prop.property)
            }
            ExprKind::Attribute(prop) => write!(f, "{}.@{}", prop.object, prop.property),
            ExprKind::Field(name) => f.write_str(name),
            ExprKind::MethodPointer { object, method } => write!(f, "{}.&{}", object, method),
            ExprKind::MethodReference { object, method } => write!(f, "{}::{}", object, method),
            ExprKind::Constant(c) => write!(f, "{}", c),
            ExprKind::ClassRef(name) | ExprKind::Variable(name) => f.write_str(name),
            ExprKind::Declaration { ty, target, value } => {
                write!(f, "{} {}", ty.as_deref().unwrap_or("def"), target)?;
                if let Some(value) = value {
                    write!(f, " = {}", value)?;
                }
                Ok(())
            }
            ExprKind::GString(gstring) => f.write_str(&gstring.verbatim),
            ExprKind::Array {
                element_type,
                sizes,
                elements,
            } => {
                write!(f, "new {}", element_type)?;
                for size in sizes {
                    write!(f, "[{}]", size)?;
                }
                if let Some(elements) = elements {
                    f.write_str("[] { ")?;
                    write_list(f, elements, ", ")?;
                    f.write_str(" }")?;
                }
                Ok(())
            }
            ExprKind::Spread(expr) => write!(f, "*{}", expr),
            ExprKind::SpreadMap(expr) => write!(f, "*:{}", expr),
            ExprKind::ClosureList(items) => {
                f.write_char('(')?;
                write_list(f, items, "; ")?;
                f.write_char(')')
            }
            ExprKind::Empty => Ok(()),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.labels {
            write!(f, "{}: ", label)?;
        }
        match &self.kind {
            StmtKind::Block(_) => f.write_str("{ ... }"),
            StmtKind::Expr(expr) => write!(f, "{}", expr),
            StmtKind::If { condition, .. } => write!(f, "if ({}) ...", condition),
            StmtKind::For { collection, .. } => write!(f, "for {} ...", collection),
            StmtKind::While { condition, .. } => write!(f, "while ({}) ...", condition),
            StmtKind::DoWhile { condition, .. } => write!(f, "do ... while ({})", condition),
            StmtKind::Return(Some(expr)) => write!(f, "return {}", expr),
            StmtKind::Return(None) => f.write_str("return"),
            StmtKind::Throw(expr) => write!(f, "throw {}", expr),
            StmtKind::Try { .. } => f.write_str("try ..."),
            StmtKind::Switch { subject, .. } => write!(f, "switch ({}) ...", subject),
            StmtKind::Break(label) => match label {
                Some(label) => write!(f, "break {}", label),
                None => f.write_str("break"),
            },
            StmtKind::Continue(label) => match label {
                Some(label) => write!(f, "continue {}", label),
                None => f.write_str("continue"),
            },
            StmtKind::Assert { condition, .. } => write!(f, "assert {}", condition),
            StmtKind::Synchronized { lock, .. } => write!(f, "synchronized ({}) ...", lock),
            StmtKind::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, NodeId, PropertyAccess};
    use reft_lexer::Span;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::dummy(), NodeId(0))
    }

    fn var(name: &str) -> Expr {
        expr(ExprKind::Variable(name.to_string()))
    }

    fn string(s: &str) -> Expr {
        expr(ExprKind::Constant(Constant::String(s.to_string())))
    }

    #[test]
    fn test_property_chain_text() {
        let inner = expr(ExprKind::Property(PropertyAccess {
            object: Box::new(var("params")),
            property: "outdir".to_string(),
            safe: false,
            spread: false,
        }));
        assert_eq!(inner.text(), "params.outdir");
        assert_eq!(inner.params_property(), Some("outdir"));
    }

    #[test]
    fn test_method_call_text() {
        let call = expr(ExprKind::MethodCall(MethodCall {
            object: Some(Box::new(var("ch"))),
            method: "map".to_string(),
            arguments: Box::new(expr(ExprKind::ArgumentList(vec![string("a"), var("b")]))),
            safe: true,
            spread: false,
        }));
        assert_eq!(call.text(), "ch?.map(a, b)");

        let implicit = expr(ExprKind::MethodCall(MethodCall {
            object: None,
            method: "cpus".to_string(),
            arguments: Box::new(expr(ExprKind::ArgumentList(vec![expr(ExprKind::Constant(
                Constant::Int(4),
            ))]))),
            safe: false,
            spread: false,
        }));
        assert_eq!(implicit.text(), "cpus(4)");
    }

    #[test]
    fn test_binary_and_index_text() {
        let index = expr(ExprKind::Binary {
            op: BinaryOp::Index,
            left: Box::new(var("xs")),
            right: Box::new(expr(ExprKind::Constant(Constant::Int(0)))),
        });
        assert_eq!(index.text(), "xs[0]");

        let assign = expr(ExprKind::Binary {
            op: BinaryOp::Assign,
            left: Box::new(var("out")),
            right: Box::new(string("x")),
        });
        assert_eq!(assign.text(), "out = x");
        assert!(assign.as_assignment().is_some());
    }

    #[test]
    fn test_map_text() {
        let empty = expr(ExprKind::Map(Vec::new()));
        assert_eq!(empty.text(), "[:]");

        let map = expr(ExprKind::Map(vec![expr(ExprKind::MapEntry {
            key: Box::new(string("mode")),
            value: Box::new(string("copy")),
        })]));
        assert_eq!(map.text(), "[mode:copy]");
    }
}
