//! The `publishDir` directive.

use super::DirectiveError;
use crate::args::{const_bool, const_string, string_or_gstring, CallArgs};
use reft_ast::{Expr, ExprKind, MethodCall};
use serde::Serialize;

/// Where and how a process publishes its outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDir {
    pub path: String,
    /// The parameter name when the path is `params.<name>`.
    pub params: Option<String>,
    pub content_type: Option<bool>,
    pub enabled: Option<bool>,
    pub fail_on_error: Option<bool>,
    pub mode: Option<String>,
    pub overwrite: Option<bool>,
}

pub(super) fn extract(call: &MethodCall) -> Result<PublishDir, DirectiveError> {
    let args = CallArgs::of(call);
    let target = args.single().or_else(|| args.named("path"));
    let mut dir = target.and_then(path).ok_or(DirectiveError::PublishDirPath)?;

    for (key, value) in &args.named {
        match *key {
            "contentType" => dir.content_type = const_bool(value),
            "enabled" => dir.enabled = const_bool(value),
            "failOnError" => dir.fail_on_error = const_bool(value),
            "overwrite" => dir.overwrite = const_bool(value),
            "mode" => dir.mode = const_string(value),
            _ => {}
        }
    }
    Ok(dir)
}

fn path(expr: &Expr) -> Option<PublishDir> {
    match &expr.kind {
        ExprKind::Property(_) => Some(PublishDir {
            path: expr.text(),
            params: expr.params_property().map(str::to_string),
            ..PublishDir::default()
        }),
        _ => string_or_gstring(expr).map(|path| PublishDir {
            path,
            ..PublishDir::default()
        }),
    }
}
