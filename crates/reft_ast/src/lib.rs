//! Abstract Syntax Tree definitions for Nextflow scripts and configs.
//!
//! The tree models the Groovy subset that Nextflow pipelines are written
//! in. Nodes are produced by `reft_parser`, are immutable once built, and
//! are traversed with the [`visit`] framework.

mod expr;
mod stmt;
mod text;
pub mod visit;

pub use expr::*;
pub use stmt::*;

use reft_lexer::Span;
use serde::Serialize;

/// A unique identifier for an AST node.
///
/// Ids are assigned in parse order and are unique within one file, so a
/// visitor can remember a node without holding on to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A complete Nextflow source file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceFile {
    pub items: Vec<Item>,
    pub span: Span,
}

impl SourceFile {
    /// Returns the top-level statements in source order.
    pub fn statements(&self) -> impl Iterator<Item = &Stmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Statement(stmt) => Some(stmt),
            _ => None,
        })
    }

    /// Returns the top-level function declarations in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(func) => Some(func),
            _ => None,
        })
    }
}

/// A top-level item in a source file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Item {
    Import(ImportDecl),
    Function(FunctionDecl),
    Statement(Stmt),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Import(i) => i.span,
            Item::Function(f) => f.span,
            Item::Statement(s) => s.span,
        }
    }
}

/// `import a.b.C`, `import a.b.*`, `import static a.b.C.m as n`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportDecl {
    pub path: String,
    pub alias: Option<String>,
    pub is_static: bool,
    pub is_star: bool,
    pub span: Span,
}

/// A `def name(params) { ... }` function declared at the top level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    pub modifiers: Vec<String>,
    pub body: Stmt,
    pub span: Span,
    pub id: NodeId,
}

/// A parameter of a function, closure, lambda or catch clause.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Option<String>,
    pub default: Option<Expr>,
    pub span: Span,
}

impl Param {
    pub fn new(name: String, ty: Option<String>, default: Option<Expr>, span: Span) -> Self {
        Self {
            name,
            ty,
            default,
            span,
        }
    }
}
