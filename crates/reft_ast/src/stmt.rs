//! Statement AST nodes.

use crate::{Expr, NodeId, Param};
use reft_lexer::Span;
use serde::Serialize;

/// A statement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    pub id: NodeId,
    /// Statement labels (`input:`, `main:`, ...) in source order.
    pub labels: Vec<String>,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span, id: NodeId) -> Self {
        Self {
            kind,
            span,
            id,
            labels: Vec::new(),
        }
    }

    /// The 1-based line this statement starts on.
    pub fn line(&self) -> u32 {
        self.span.line
    }

    /// Returns the variant tag of this statement.
    pub fn tag(&self) -> StmtTag {
        self.kind.tag()
    }

    /// Returns the expression of an expression statement.
    pub fn as_expr(&self) -> Option<&Expr> {
        match &self.kind {
            StmtKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    /// Returns the statements of a block, or this statement alone.
    pub fn block_stmts(&self) -> &[Stmt] {
        match &self.kind {
            StmtKind::Block(stmts) => stmts,
            _ => std::slice::from_ref(self),
        }
    }
}

/// The kind of statement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum StmtKind {
    /// `{ ... }`
    Block(Vec<Stmt>),

    /// An expression evaluated for its effect.
    Expr(Expr),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `for (x in xs)` or `for (init; cond; update)`; the classic form has
    /// no variable and a `ClosureList` collection.
    For {
        variable: Option<Param>,
        collection: Expr,
        body: Box<Stmt>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },

    Return(Option<Expr>),

    Throw(Expr),

    Try {
        body: Box<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Box<Stmt>>,
    },

    Switch {
        subject: Expr,
        cases: Vec<CaseClause>,
        default: Option<Box<Stmt>>,
    },

    Break(Option<String>),

    Continue(Option<String>),

    Assert {
        condition: Expr,
        message: Option<Expr>,
    },

    Synchronized {
        lock: Expr,
        body: Box<Stmt>,
    },

    /// `;` or a label with nothing after it.
    Empty,
}

impl StmtKind {
    pub fn tag(&self) -> StmtTag {
        match self {
            StmtKind::Block(_) => StmtTag::Block,
            StmtKind::Expr(_) => StmtTag::Expr,
            StmtKind::If { .. } => StmtTag::If,
            StmtKind::For { .. } => StmtTag::For,
            StmtKind::While { .. } => StmtTag::While,
            StmtKind::DoWhile { .. } => StmtTag::DoWhile,
            StmtKind::Return(_) => StmtTag::Return,
            StmtKind::Throw(_) => StmtTag::Throw,
            StmtKind::Try { .. } => StmtTag::Try,
            StmtKind::Switch { .. } => StmtTag::Switch,
            StmtKind::Break(_) => StmtTag::Break,
            StmtKind::Continue(_) => StmtTag::Continue,
            StmtKind::Assert { .. } => StmtTag::Assert,
            StmtKind::Synchronized { .. } => StmtTag::Synchronized,
            StmtKind::Empty => StmtTag::Empty,
        }
    }
}

/// Field-less mirror of [`StmtKind`], used to key visitor hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StmtTag {
    Block,
    Expr,
    If,
    For,
    While,
    DoWhile,
    Return,
    Throw,
    Try,
    Switch,
    Break,
    Continue,
    Assert,
    Synchronized,
    Empty,
}

/// `catch (IOException e) { ... }`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatchClause {
    pub param: Param,
    pub body: Stmt,
    pub span: Span,
}

/// `case x: ...`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaseClause {
    pub value: Expr,
    pub body: Stmt,
    pub span: Span,
}
