//! Expression AST nodes.

use crate::{NodeId, Param, Stmt};
use reft_lexer::Span;
use serde::Serialize;

/// An expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub id: NodeId,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span, id: NodeId) -> Self {
        Self { kind, span, id }
    }

    /// The 1-based line this expression starts on.
    pub fn line(&self) -> u32 {
        self.span.line
    }

    /// Returns the variant tag of this expression.
    pub fn tag(&self) -> ExprTag {
        self.kind.tag()
    }

    pub fn as_method_call(&self) -> Option<&MethodCall> {
        match &self.kind {
            ExprKind::MethodCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Variable(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.kind {
            ExprKind::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the value of a string constant.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Constant(Constant::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the property name if this is `params.<name>`.
    pub fn params_property(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Property(prop) => match &prop.object.kind {
                ExprKind::Variable(name) if name == "params" => Some(&prop.property),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the positional argument expressions of an argument node.
    ///
    /// `ArgumentList`, `Tuple` and `NamedArgumentList` all hold their
    /// elements directly; anything else is treated as a single argument.
    pub fn argument_exprs(&self) -> &[Expr] {
        match &self.kind {
            ExprKind::ArgumentList(args)
            | ExprKind::Tuple(args)
            | ExprKind::NamedArgumentList(args) => args,
            _ => std::slice::from_ref(self),
        }
    }

    /// Returns the entries of a map-like node (`Map`, `NamedArgumentList`).
    pub fn map_entries(&self) -> Option<&[Expr]> {
        match &self.kind {
            ExprKind::Map(entries) | ExprKind::NamedArgumentList(entries) => Some(entries),
            _ => None,
        }
    }

    /// If this is an assignment, returns its target and value.
    pub fn as_assignment(&self) -> Option<(&Expr, &Expr)> {
        match &self.kind {
            ExprKind::Binary {
                op: BinaryOp::Assign,
                left,
                right,
            } => Some((left, right)),
            _ => None,
        }
    }
}

/// The kind of expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ExprKind {
    /// `obj.method(args)`, `method(args)`, command calls `method arg`.
    MethodCall(MethodCall),

    /// `Channel.of(1, 2)`: a call on a class name.
    StaticMethodCall {
        class: String,
        method: String,
        arguments: Box<Expr>,
    },

    /// `new File(path)`
    ConstructorCall {
        class: String,
        arguments: Box<Expr>,
    },

    /// `cond ? a : b`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// `a ?: b`
    Elvis {
        value: Box<Expr>,
        fallback: Box<Expr>,
    },

    /// Binary operators, including assignment and indexing.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `++x`, `--x`
    Prefix { op: IncDec, expr: Box<Expr> },

    /// `x++`, `x--`
    Postfix { op: IncDec, expr: Box<Expr> },

    /// `+x`, `-x`, `~x`, `!x`
    Unary { op: UnaryOp, expr: Box<Expr> },

    /// A condition of `if`, `while`, `assert` or a ternary.
    Boolean(Box<Expr>),

    /// `(Type) x` or `x as Type`
    Cast {
        ty: String,
        expr: Box<Expr>,
        coerce: bool,
    },

    /// `{ a, b -> ... }`
    Closure { params: Vec<Param>, body: Box<Stmt> },

    /// `(a, b) -> ...`
    Lambda { params: Vec<Param>, body: Box<Stmt> },

    /// Parenthesized multiple values or call arguments made only of
    /// named arguments.
    Tuple(Vec<Expr>),

    /// `name: value, other: value` inside a call's argument list.
    NamedArgumentList(Vec<Expr>),

    /// Positional call arguments.
    ArgumentList(Vec<Expr>),

    /// `[key: value, ...]`
    Map(Vec<Expr>),

    /// One `key: value` pair of a map or named argument list.
    MapEntry { key: Box<Expr>, value: Box<Expr> },

    /// `[a, b, c]`
    List(Vec<Expr>),

    /// `a..b`, `a..<b`
    Range {
        from: Box<Expr>,
        to: Box<Expr>,
        exclusive: bool,
    },

    /// `obj.prop`, `obj?.prop`, `obj*.prop`
    Property(PropertyAccess),

    /// `obj.@field`
    Attribute(PropertyAccess),

    /// A direct field reference.
    Field(String),

    /// `obj.&method`
    MethodPointer { object: Box<Expr>, method: String },

    /// `obj::method`
    MethodReference { object: Box<Expr>, method: String },

    /// A literal value.
    Constant(Constant),

    /// A reference to a class by name, e.g. the object of `Math.max`.
    ClassRef(String),

    /// A bare identifier.
    Variable(String),

    /// `def x = 1`, `String s`, `def (a, b) = pair`
    Declaration {
        ty: Option<String>,
        target: Box<Expr>,
        value: Option<Box<Expr>>,
    },

    /// An interpolated string.
    GString(GString),

    /// `new int[3]`, `new String[] { ... }`
    Array {
        element_type: String,
        sizes: Vec<Expr>,
        elements: Option<Vec<Expr>>,
    },

    /// `*list` inside a list or argument list.
    Spread(Box<Expr>),

    /// `*:map` inside a map or argument list.
    SpreadMap(Box<Expr>),

    /// The `(init; cond; update)` header of a classic for loop.
    ClosureList(Vec<Expr>),

    /// An absent expression, e.g. an omitted for-loop component.
    Empty,
}

impl ExprKind {
    pub fn tag(&self) -> ExprTag {
        match self {
            ExprKind::MethodCall(_) => ExprTag::MethodCall,
            ExprKind::StaticMethodCall { .. } => ExprTag::StaticMethodCall,
            ExprKind::ConstructorCall { .. } => ExprTag::ConstructorCall,
            ExprKind::Ternary { .. } => ExprTag::Ternary,
            ExprKind::Elvis { .. } => ExprTag::Elvis,
            ExprKind::Binary { .. } => ExprTag::Binary,
            ExprKind::Prefix { .. } => ExprTag::Prefix,
            ExprKind::Postfix { .. } => ExprTag::Postfix,
            ExprKind::Unary { .. } => ExprTag::Unary,
            ExprKind::Boolean(_) => ExprTag::Boolean,
            ExprKind::Cast { .. } => ExprTag::Cast,
            ExprKind::Closure { .. } => ExprTag::Closure,
            ExprKind::Lambda { .. } => ExprTag::Lambda,
            ExprKind::Tuple(_) => ExprTag::Tuple,
            ExprKind::NamedArgumentList(_) => ExprTag::NamedArgumentList,
            ExprKind::ArgumentList(_) => ExprTag::ArgumentList,
            ExprKind::Map(_) => ExprTag::Map,
            ExprKind::MapEntry { .. } => ExprTag::MapEntry,
            ExprKind::List(_) => ExprTag::List,
            ExprKind::Range { .. } => ExprTag::Range,
            ExprKind::Property(_) => ExprTag::Property,
            ExprKind::Attribute(_) => ExprTag::Attribute,
            ExprKind::Field(_) => ExprTag::Field,
            ExprKind::MethodPointer { .. } => ExprTag::MethodPointer,
            ExprKind::MethodReference { .. } => ExprTag::MethodReference,
            ExprKind::Constant(_) => ExprTag::Constant,
            ExprKind::ClassRef(_) => ExprTag::ClassRef,
            ExprKind::Variable(_) => ExprTag::Variable,
            ExprKind::Declaration { .. } => ExprTag::Declaration,
            ExprKind::GString(_) => ExprTag::GString,
            ExprKind::Array { .. } => ExprTag::Array,
            ExprKind::Spread(_) => ExprTag::Spread,
            ExprKind::SpreadMap(_) => ExprTag::SpreadMap,
            ExprKind::ClosureList(_) => ExprTag::ClosureList,
            ExprKind::Empty => ExprTag::Empty,
        }
    }
}

/// Field-less mirror of [`ExprKind`], used to key visitor hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExprTag {
    MethodCall,
    StaticMethodCall,
    ConstructorCall,
    Ternary,
    Elvis,
    Binary,
    Prefix,
    Postfix,
    Unary,
    Boolean,
    Cast,
    Closure,
    Lambda,
    Tuple,
    NamedArgumentList,
    ArgumentList,
    Map,
    MapEntry,
    List,
    Range,
    Property,
    Attribute,
    Field,
    MethodPointer,
    MethodReference,
    Constant,
    ClassRef,
    Variable,
    Declaration,
    GString,
    Array,
    Spread,
    SpreadMap,
    ClosureList,
    Empty,
}

/// A method call.
///
/// Nextflow leans on Groovy's command syntax, so `process FOO { ... }`
/// arrives here as `process(FOO({ ... }))` and
/// `include { A } from 'x'` as `include({ A }).from('x')`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodCall {
    /// The receiver; `None` for calls on the implicit `this`.
    pub object: Option<Box<Expr>>,
    pub method: String,
    /// An `ArgumentList`, or a `Tuple` wrapping a `NamedArgumentList`.
    pub arguments: Box<Expr>,
    /// `?.`
    pub safe: bool,
    /// `*.`
    pub spread: bool,
}

impl MethodCall {
    /// True if the call has no explicit receiver.
    pub fn implicit_this(&self) -> bool {
        self.object.is_none()
    }

    /// The argument expressions in source order.
    pub fn args(&self) -> &[Expr] {
        self.arguments.argument_exprs()
    }

    /// The single closure argument of `name { ... }`, if that is the shape.
    pub fn closure_arg(&self) -> Option<&Expr> {
        match self.args() {
            [arg @ Expr {
                kind: ExprKind::Closure { .. },
                ..
            }] => Some(arg),
            _ => None,
        }
    }
}

/// Property-style access on an object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyAccess {
    pub object: Box<Expr>,
    pub property: String,
    pub safe: bool,
    pub spread: bool,
}

/// A literal value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Constant {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// An interpolated string.
///
/// `strings` and `values` interleave: `strings[0] values[0] strings[1] ...`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GString {
    /// The body as written, without the surrounding quotes.
    pub verbatim: String,
    pub strings: Vec<String>,
    pub values: Vec<Expr>,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    // Assignment
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    ElvisAssign,

    // Logical
    Or,
    And,

    // Bitwise
    BitOr,
    BitXor,
    BitAnd,

    // Equality and relational
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Compare,
    RegexFind,
    RegexMatch,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    Instanceof,

    // Shifts
    Shl,
    Shr,
    UShr,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    /// `a[b]`
    Index,
}

impl BinaryOp {
    /// Returns true for `=` and the compound assignments.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::PowAssign
                | BinaryOp::BitAndAssign
                | BinaryOp::BitOrAssign
                | BinaryOp::BitXorAssign
                | BinaryOp::ShlAssign
                | BinaryOp::ShrAssign
                | BinaryOp::UShrAssign
                | BinaryOp::ElvisAssign
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::PowAssign => "**=",
            BinaryOp::BitAndAssign => "&=",
            BinaryOp::BitOrAssign => "|=",
            BinaryOp::BitXorAssign => "^=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::UShrAssign => ">>>=",
            BinaryOp::ElvisAssign => "?=",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Compare => "<=>",
            BinaryOp::RegexFind => "=~",
            BinaryOp::RegexMatch => "==~",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Index => "[",
        }
    }
}

/// Prefix and postfix increment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IncDec {
    Inc,
    Dec,
}

impl IncDec {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncDec::Inc => "++",
            IncDec::Dec => "--",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "!",
        }
    }
}
