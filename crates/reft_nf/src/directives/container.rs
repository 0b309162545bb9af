//! The `container` directive.

use crate::args::CallArgs;
use reft_ast::{Constant, Expr, ExprKind, MethodCall};
use serde::Serialize;

/// A container image reference.
///
/// nf-core modules usually pick between a Singularity URL and a Docker
/// image with a ternary on the container engine:
///
/// ```text
/// container "${ workflow.containerEngine == 'singularity' ? 'https://...' : 'biocontainers/...' }"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Container {
    Simple {
        name: String,
    },
    Ternary {
        condition: String,
        true_name: String,
        false_name: String,
    },
}

impl Container {
    /// Every image this directive may resolve to.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Container::Simple { name } => vec![name.as_str()],
            Container::Ternary {
                true_name,
                false_name,
                ..
            } => vec![true_name.as_str(), false_name.as_str()],
        }
    }

    /// The value as a single string; ternaries render as `cond ? a : b`.
    pub fn name(&self) -> String {
        match self {
            Container::Simple { name } => name.clone(),
            Container::Ternary {
                condition,
                true_name,
                false_name,
            } => format!("{} ? {} : {}", condition, true_name, false_name),
        }
    }

    pub fn is_ternary(&self) -> bool {
        matches!(self, Container::Ternary { .. })
    }
}

pub(super) fn extract(call: &MethodCall) -> Option<Container> {
    let args = CallArgs::of(call);
    let arg = args.single()?;

    match &arg.kind {
        ExprKind::Constant(Constant::String(name)) => Some(Container::Simple { name: name.clone() }),
        ExprKind::Constant(Constant::Null) => Some(Container::Simple {
            name: String::new(),
        }),
        ExprKind::Ternary { .. } => ternary(arg),
        ExprKind::GString(gstring) => match gstring.values.as_slice() {
            [value] if matches!(value.kind, ExprKind::Ternary { .. }) => ternary(value),
            _ => Some(Container::Simple {
                name: gstring.verbatim.clone(),
            }),
        },
        _ => None,
    }
}

fn ternary(expr: &Expr) -> Option<Container> {
    match &expr.kind {
        ExprKind::Ternary {
            condition,
            then_expr,
            else_expr,
        } => Some(Container::Ternary {
            condition: condition.text(),
            true_name: then_expr.text(),
            false_name: else_expr.text(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reft_parser::parse_source;

    fn container(source: &str) -> Option<Container> {
        let file = parse_source(source).unwrap();
        let stmt = file.statements().next().unwrap();
        let call = stmt.as_expr().and_then(|e| e.as_method_call()).unwrap();
        extract(call)
    }

    #[test]
    fn test_simple() {
        let c = container("container 'biocontainers/fastqc:0.11.9--0'").unwrap();
        assert_eq!(c.names(), vec!["biocontainers/fastqc:0.11.9--0"]);
        assert!(!c.is_ternary());
    }

    #[test]
    fn test_null_is_empty_name() {
        let c = container("container null").unwrap();
        assert_eq!(c.name(), "");
    }

    #[test]
    fn test_ternary_in_gstring() {
        let c = container(
            "container \"${ workflow.containerEngine == 'singularity' ? 'https://depot.galaxyproject.org/singularity/x:1.0' : 'org/x:1.0' }\"",
        )
        .unwrap();
        assert!(c.is_ternary());
        assert_eq!(
            c.names(),
            vec!["https://depot.galaxyproject.org/singularity/x:1.0", "org/x:1.0"]
        );
        let Container::Ternary { condition, .. } = &c else {
            panic!("expected ternary");
        };
        assert!(condition.starts_with("workflow.containerEngine =="));
        assert!(c.name().ends_with("? https://depot.galaxyproject.org/singularity/x:1.0 : org/x:1.0"));
    }

    #[test]
    fn test_plain_interpolation_is_verbatim() {
        let c = container("container \"quay.io/${params.org}/tool:1.0\"").unwrap();
        assert_eq!(c.name(), "quay.io/${params.org}/tool:1.0");
    }

    #[test]
    fn test_params_is_unresolved() {
        assert_eq!(container("container params.image"), None);
    }
}
