//! Traversal over the syntax tree.
//!
//! [`Visitor`] is a full-sweep visitor: every method has a default that
//! keeps descending, so an implementation overrides only the node kinds it
//! cares about and calls the matching `walk_*` function to continue into
//! the children. Nodes are visited in pre-order, children in source order.
//!
//! [`HookVisitor`] is a pass-through visitor that fires registered
//! callbacks when it enters and leaves nodes of a given kind, so several
//! small observers can share a single walk without writing any descent.

use crate::{
    Constant, Expr, ExprKind, ExprTag, FunctionDecl, GString, Item, MethodCall, Param,
    PropertyAccess, SourceFile, Stmt, StmtKind, StmtTag,
};
use std::collections::HashMap;

/// A full-sweep visitor over the syntax tree.
pub trait Visitor<'ast>: Sized {
    fn visit_source_file(&mut self, file: &'ast SourceFile) {
        walk_source_file(self, file);
    }

    fn visit_function(&mut self, func: &'ast FunctionDecl) {
        walk_function(self, func);
    }

    fn visit_param(&mut self, param: &'ast Param) {
        walk_param(self, param);
    }

    // Statements

    /// Entry point for every statement; dispatches on the statement kind.
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        dispatch_stmt(self, stmt);
    }

    fn visit_block(&mut self, stmt: &'ast Stmt, _stmts: &'ast [Stmt]) {
        walk_stmt(self, stmt);
    }

    fn visit_expr_stmt(&mut self, stmt: &'ast Stmt, _expr: &'ast Expr) {
        walk_stmt(self, stmt);
    }

    fn visit_if(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_for(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_while(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_do_while(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_return(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_throw(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_try(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_switch(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_break(&mut self, _stmt: &'ast Stmt) {}

    fn visit_continue(&mut self, _stmt: &'ast Stmt) {}

    fn visit_assert(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_synchronized(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_empty_stmt(&mut self, _stmt: &'ast Stmt) {}

    // Expressions

    /// Entry point for every expression; dispatches on the expression kind.
    fn visit_expr(&mut self, expr: &'ast Expr) {
        dispatch_expr(self, expr);
    }

    fn visit_method_call(&mut self, expr: &'ast Expr, _call: &'ast MethodCall) {
        walk_expr(self, expr);
    }

    fn visit_static_method_call(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_constructor_call(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_ternary(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_elvis(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_binary(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_prefix(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_postfix(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_unary(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_boolean(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_cast(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_closure(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_lambda(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_tuple(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_named_argument_list(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_argument_list(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_map(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_map_entry(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_list(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_range(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_property(&mut self, expr: &'ast Expr, _prop: &'ast PropertyAccess) {
        walk_expr(self, expr);
    }

    fn visit_attribute(&mut self, expr: &'ast Expr, _attr: &'ast PropertyAccess) {
        walk_expr(self, expr);
    }

    fn visit_field(&mut self, _expr: &'ast Expr) {}

    fn visit_method_pointer(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_method_reference(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_constant(&mut self, _expr: &'ast Expr, _value: &'ast Constant) {}

    fn visit_class_ref(&mut self, _expr: &'ast Expr) {}

    fn visit_variable(&mut self, _expr: &'ast Expr, _name: &'ast str) {}

    fn visit_declaration(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_gstring(&mut self, expr: &'ast Expr, _gstring: &'ast GString) {
        walk_expr(self, expr);
    }

    fn visit_array(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_spread(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_spread_map(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_closure_list(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_empty_expr(&mut self, _expr: &'ast Expr) {}
}

pub fn walk_source_file<'ast, V: Visitor<'ast>>(visitor: &mut V, file: &'ast SourceFile) {
    for item in &file.items {
        match item {
            Item::Import(_) => {}
            Item::Function(func) => visitor.visit_function(func),
            Item::Statement(stmt) => visitor.visit_stmt(stmt),
        }
    }
}

pub fn walk_function<'ast, V: Visitor<'ast>>(visitor: &mut V, func: &'ast FunctionDecl) {
    for param in &func.params {
        visitor.visit_param(param);
    }
    visitor.visit_stmt(&func.body);
}

pub fn walk_param<'ast, V: Visitor<'ast>>(visitor: &mut V, param: &'ast Param) {
    if let Some(default) = &param.default {
        visitor.visit_expr(default);
    }
}

/// Calls the `visit_*` method matching the statement's kind.
pub fn dispatch_stmt<'ast, V: Visitor<'ast>>(visitor: &mut V, stmt: &'ast Stmt) {
    match &stmt.kind {
        StmtKind::Block(stmts) => visitor.visit_block(stmt, stmts),
        StmtKind::Expr(expr) => visitor.visit_expr_stmt(stmt, expr),
        StmtKind::If { .. } => visitor.visit_if(stmt),
        StmtKind::For { .. } => visitor.visit_for(stmt),
        StmtKind::While { .. } => visitor.visit_while(stmt),
        StmtKind::DoWhile { .. } => visitor.visit_do_while(stmt),
        StmtKind::Return(_) => visitor.visit_return(stmt),
        StmtKind::Throw(_) => visitor.visit_throw(stmt),
        StmtKind::Try { .. } => visitor.visit_try(stmt),
        StmtKind::Switch { .. } => visitor.visit_switch(stmt),
        StmtKind::Break(_) => visitor.visit_break(stmt),
        StmtKind::Continue(_) => visitor.visit_continue(stmt),
        StmtKind::Assert { .. } => visitor.visit_assert(stmt),
        StmtKind::Synchronized { .. } => visitor.visit_synchronized(stmt),
        StmtKind::Empty => visitor.visit_empty_stmt(stmt),
    }
}

/// Visits the children of a statement in source order.
pub fn walk_stmt<'ast, V: Visitor<'ast>>(visitor: &mut V, stmt: &'ast Stmt) {
    match &stmt.kind {
        StmtKind::Block(stmts) => {
            for stmt in stmts {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::Expr(expr) | StmtKind::Throw(expr) => visitor.visit_expr(expr),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        StmtKind::For {
            variable,
            collection,
            body,
        } => {
            if let Some(variable) = variable {
                visitor.visit_param(variable);
            }
            visitor.visit_expr(collection);
            visitor.visit_stmt(body);
        }
        StmtKind::While { condition, body } => {
            visitor.visit_expr(condition);
            visitor.visit_stmt(body);
        }
        StmtKind::DoWhile { body, condition } => {
            visitor.visit_stmt(body);
            visitor.visit_expr(condition);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Try {
            body,
            catches,
            finally,
        } => {
            visitor.visit_stmt(body);
            for catch in catches {
                visitor.visit_param(&catch.param);
                visitor.visit_stmt(&catch.body);
            }
            if let Some(finally) = finally {
                visitor.visit_stmt(finally);
            }
        }
        StmtKind::Switch {
            subject,
            cases,
            default,
        } => {
            visitor.visit_expr(subject);
            for case in cases {
                visitor.visit_expr(&case.value);
                visitor.visit_stmt(&case.body);
            }
            if let Some(default) = default {
                visitor.visit_stmt(default);
            }
        }
        StmtKind::Assert { condition, message } => {
            visitor.visit_expr(condition);
            if let Some(message) = message {
                visitor.visit_expr(message);
            }
        }
        StmtKind::Synchronized { lock, body } => {
            visitor.visit_expr(lock);
            visitor.visit_stmt(body);
        }
        StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty => {}
    }
}

/// Calls the `visit_*` method matching the expression's kind.
pub fn dispatch_expr<'ast, V: Visitor<'ast>>(visitor: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::MethodCall(call) => visitor.visit_method_call(expr, call),
        ExprKind::StaticMethodCall { .. } => visitor.visit_static_method_call(expr),
        ExprKind::ConstructorCall { .. } => visitor.visit_constructor_call(expr),
        ExprKind::Ternary { .. } => visitor.visit_ternary(expr),
        ExprKind::Elvis { .. } => visitor.visit_elvis(expr),
        ExprKind::Binary { .. } => visitor.visit_binary(expr),
        ExprKind::Prefix { .. } => visitor.visit_prefix(expr),
        ExprKind::Postfix { .. } => visitor.visit_postfix(expr),
        ExprKind::Unary { .. } => visitor.visit_unary(expr),
        ExprKind::Boolean(_) => visitor.visit_boolean(expr),
        ExprKind::Cast { .. } => visitor.visit_cast(expr),
        ExprKind::Closure { .. } => visitor.visit_closure(expr),
        ExprKind::Lambda { .. } => visitor.visit_lambda(expr),
        ExprKind::Tuple(_) => visitor.visit_tuple(expr),
        ExprKind::NamedArgumentList(_) => visitor.visit_named_argument_list(expr),
        ExprKind::ArgumentList(_) => visitor.visit_argument_list(expr),
        ExprKind::Map(_) => visitor.visit_map(expr),
        ExprKind::MapEntry { .. } => visitor.visit_map_entry(expr),
        ExprKind::List(_) => visitor.visit_list(expr),
        ExprKind::Range { .. } => visitor.visit_range(expr),
        ExprKind::Property(prop) => visitor.visit_property(expr, prop),
        ExprKind::Attribute(attr) => visitor.visit_attribute(expr, attr),
        ExprKind::Field(_) => visitor.visit_field(expr),
        ExprKind::MethodPointer { .. } => visitor.visit_method_pointer(expr),
        ExprKind::MethodReference { .. } => visitor.visit_method_reference(expr),
        ExprKind::Constant(value) => visitor.visit_constant(expr, value),
        ExprKind::ClassRef(_) => visitor.visit_class_ref(expr),
        ExprKind::Variable(name) => visitor.visit_variable(expr, name),
        ExprKind::Declaration { .. } => visitor.visit_declaration(expr),
        ExprKind::GString(gstring) => visitor.visit_gstring(expr, gstring),
        ExprKind::Array { .. } => visitor.visit_array(expr),
        ExprKind::Spread(_) => visitor.visit_spread(expr),
        ExprKind::SpreadMap(_) => visitor.visit_spread_map(expr),
        ExprKind::ClosureList(_) => visitor.visit_closure_list(expr),
        ExprKind::Empty => visitor.visit_empty_expr(expr),
    }
}

/// Visits the children of an expression in source order.
pub fn walk_expr<'ast, V: Visitor<'ast>>(visitor: &mut V, expr: &'ast Expr) {
    match &expr.kind {
        ExprKind::MethodCall(call) => {
            if let Some(object) = &call.object {
                visitor.visit_expr(object);
            }
            visitor.visit_expr(&call.arguments);
        }
        ExprKind::StaticMethodCall { arguments, .. }
        | ExprKind::ConstructorCall { arguments, .. } => visitor.visit_expr(arguments),
        ExprKind::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_expr);
            visitor.visit_expr(else_expr);
        }
        ExprKind::Elvis { value, fallback } => {
            visitor.visit_expr(value);
            visitor.visit_expr(fallback);
        }
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Prefix { expr, .. }
        | ExprKind::Postfix { expr, .. }
        | ExprKind::Unary { expr, .. }
        | ExprKind::Cast { expr, .. }
        | ExprKind::Boolean(expr)
        | ExprKind::Spread(expr)
        | ExprKind::SpreadMap(expr) => visitor.visit_expr(expr),
        ExprKind::Closure { params, body } | ExprKind::Lambda { params, body } => {
            for param in params {
                visitor.visit_param(param);
            }
            visitor.visit_stmt(body);
        }
        ExprKind::Tuple(items)
        | ExprKind::NamedArgumentList(items)
        | ExprKind::ArgumentList(items)
        | ExprKind::Map(items)
        | ExprKind::List(items)
        | ExprKind::ClosureList(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        ExprKind::MapEntry { key, value } => {
            visitor.visit_expr(key);
            visitor.visit_expr(value);
        }
        ExprKind::Range { from, to, .. } => {
            visitor.visit_expr(from);
            visitor.visit_expr(to);
        }
        ExprKind::Property(prop) | ExprKind::Attribute(prop) => visitor.visit_expr(&prop.object),
        ExprKind::MethodPointer { object, .. } | ExprKind::MethodReference { object, .. } => {
            visitor.visit_expr(object)
        }
        ExprKind::Declaration { target, value, .. } => {
            visitor.visit_expr(target);
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        ExprKind::GString(gstring) => {
            for value in &gstring.values {
                visitor.visit_expr(value);
            }
        }
        ExprKind::Array {
            sizes, elements, ..
        } => {
            for size in sizes {
                visitor.visit_expr(size);
            }
            for element in elements.iter().flatten() {
                visitor.visit_expr(element);
            }
        }
        ExprKind::Field(_)
        | ExprKind::Constant(_)
        | ExprKind::ClassRef(_)
        | ExprKind::Variable(_)
        | ExprKind::Empty => {}
    }
}

/// When a hook fires relative to the node's children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Before any child has been visited.
    Enter,
    /// After every child has been visited.
    Exit,
}

type ExprHook<'h> = Box<dyn FnMut(&Expr, Phase) + 'h>;
type StmtHook<'h> = Box<dyn FnMut(&Stmt, Phase) + 'h>;

/// A pass-through visitor that fires callbacks on selected node kinds.
#[derive(Default)]
pub struct HookVisitor<'h> {
    expr_hooks: HashMap<ExprTag, Vec<ExprHook<'h>>>,
    stmt_hooks: HashMap<StmtTag, Vec<StmtHook<'h>>>,
}

impl<'h> HookVisitor<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for expressions of the given kind.
    pub fn on_expr(mut self, tag: ExprTag, hook: impl FnMut(&Expr, Phase) + 'h) -> Self {
        self.expr_hooks.entry(tag).or_default().push(Box::new(hook));
        self
    }

    /// Registers a callback for statements of the given kind.
    pub fn on_stmt(mut self, tag: StmtTag, hook: impl FnMut(&Stmt, Phase) + 'h) -> Self {
        self.stmt_hooks.entry(tag).or_default().push(Box::new(hook));
        self
    }

    /// Walks a whole file, firing hooks along the way.
    pub fn run(&mut self, file: &SourceFile) {
        self.visit_source_file(file);
    }

    fn fire_expr(&mut self, expr: &Expr, phase: Phase) {
        if let Some(hooks) = self.expr_hooks.get_mut(&expr.tag()) {
            for hook in hooks {
                hook(expr, phase);
            }
        }
    }

    fn fire_stmt(&mut self, stmt: &Stmt, phase: Phase) {
        if let Some(hooks) = self.stmt_hooks.get_mut(&stmt.tag()) {
            for hook in hooks {
                hook(stmt, phase);
            }
        }
    }
}

impl<'ast> Visitor<'ast> for HookVisitor<'_> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        self.fire_stmt(stmt, Phase::Enter);
        walk_stmt(self, stmt);
        self.fire_stmt(stmt, Phase::Exit);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        self.fire_expr(expr, Phase::Enter);
        walk_expr(self, expr);
        self.fire_expr(expr, Phase::Exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;
    use reft_lexer::Span;

    fn expr(id: u32, kind: ExprKind) -> Expr {
        Expr::new(kind, Span::new(id, id + 1, 1, id + 1), NodeId(id))
    }

    /// `foo(x, { y })`
    fn sample() -> SourceFile {
        let closure_body = Stmt::new(
            StmtKind::Block(vec![Stmt::new(
                StmtKind::Expr(expr(5, ExprKind::Variable("y".into()))),
                Span::dummy(),
                NodeId(6),
            )]),
            Span::dummy(),
            NodeId(7),
        );
        let call = expr(
            1,
            ExprKind::MethodCall(MethodCall {
                object: None,
                method: "foo".into(),
                arguments: Box::new(expr(
                    2,
                    ExprKind::ArgumentList(vec![
                        expr(3, ExprKind::Variable("x".into())),
                        expr(
                            4,
                            ExprKind::Closure {
                                params: Vec::new(),
                                body: Box::new(closure_body),
                            },
                        ),
                    ]),
                )),
                safe: false,
                spread: false,
            }),
        );
        SourceFile {
            items: vec![Item::Statement(Stmt::new(
                StmtKind::Expr(call),
                Span::dummy(),
                NodeId(0),
            ))],
            span: Span::dummy(),
        }
    }

    struct Recorder {
        order: Vec<u32>,
    }

    impl<'ast> Visitor<'ast> for Recorder {
        fn visit_expr(&mut self, expr: &'ast Expr) {
            self.order.push(expr.id.0);
            dispatch_expr(self, expr);
        }
    }

    #[test]
    fn test_pre_order_in_source_order() {
        let file = sample();
        let mut recorder = Recorder { order: Vec::new() };
        recorder.visit_source_file(&file);
        assert_eq!(recorder.order, vec![1, 2, 3, 4, 5]);
    }

    struct VariableNames<'ast> {
        names: Vec<&'ast str>,
    }

    impl<'ast> Visitor<'ast> for VariableNames<'ast> {
        fn visit_variable(&mut self, _expr: &'ast Expr, name: &'ast str) {
            self.names.push(name);
        }
    }

    #[test]
    fn test_override_single_kind() {
        let file = sample();
        let mut names = VariableNames { names: Vec::new() };
        names.visit_source_file(&file);
        assert_eq!(names.names, vec!["x", "y"]);
    }

    #[test]
    fn test_hooks_fire_on_enter_and_exit() {
        let file = sample();
        let mut events = Vec::new();
        let mut depth = 0i32;
        let mut max_depth = 0i32;

        HookVisitor::new()
            .on_expr(ExprTag::Closure, |e, phase| {
                match phase {
                    Phase::Enter => depth += 1,
                    Phase::Exit => depth -= 1,
                }
                max_depth = max_depth.max(depth);
                events.push((e.id.0, phase));
            })
            .run(&file);

        assert_eq!(events, vec![(4, Phase::Enter), (4, Phase::Exit)]);
        assert_eq!(depth, 0);
        assert_eq!(max_depth, 1);
    }

    #[test]
    fn test_multiple_hooks_share_one_walk() {
        let file = sample();
        let mut calls = 0;
        let mut stmts = 0;

        HookVisitor::new()
            .on_expr(ExprTag::MethodCall, |_, phase| {
                if phase == Phase::Enter {
                    calls += 1;
                }
            })
            .on_stmt(StmtTag::Expr, |_, phase| {
                if phase == Phase::Enter {
                    stmts += 1;
                }
            })
            .run(&file);

        assert_eq!(calls, 1);
        assert_eq!(stmts, 2);
    }
}
