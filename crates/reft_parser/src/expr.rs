//! Expression parsing.
//!
//! Precedence, lowest first:
//!
//! 1. assignment (`=`, `+=`, `?=`, ...), right associative
//! 2. ternary `?:` and elvis `?:`
//! 3. `||`
//! 4. `&&`
//! 5. `|`
//! 6. `^`
//! 7. `&`
//! 8. equality (`==`, `!=`, `===`, `<=>`, `=~`, `==~`)
//! 9. relational (`<`, `in`, `instanceof`, `as`)
//! 10. shift and range (`<<`, `..`, `..<`)
//! 11. additive
//! 12. multiplicative
//! 13. prefix `+ - ++ --`
//! 14. power `**`
//! 15. `!` and `~`
//! 16. postfix and path elements (`.x`, `?.x`, `(args)`, `[i]`, trailing closures)

use crate::error::{ParseError, ParseResult};
use crate::parser::Parser;
use reft_ast::*;
use reft_lexer::{GStringPart, Span, TokenKind};

impl Parser<'_> {
    /// Parses an expression.
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    /// Parses an expression statement, allowing Groovy command syntax:
    ///
    /// ```text
    /// cpus 2                      -> cpus(2)
    /// tuple val(meta), path(x)    -> tuple(val(meta), path(x))
    /// include { A } from './a'    -> include({ A }).from('./a')
    /// ```
    pub(crate) fn parse_command_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut expr = self.parse_expr()?;

        if matches!(expr.kind, ExprKind::Variable(_) | ExprKind::Property(_)) && self.starts_argument()
        {
            let arguments = self.parse_command_arguments()?;
            expr = self.make_call(expr, arguments, start);
        }

        while matches!(expr.kind, ExprKind::MethodCall(_))
            && matches!(self.peek_kind(), TokenKind::Ident(_))
        {
            let (name, _) = self.expect_name()?;
            let object = Box::new(expr);

            expr = if self.check(&TokenKind::LParen) {
                let arguments = self.parse_paren_arguments()?;
                self.method_call(Some(object), name, arguments, false, false, start)
            } else if self.check(&TokenKind::LBrace) {
                let arguments = self.closure_arguments()?;
                self.method_call(Some(object), name, arguments, false, false, start)
            } else if self.starts_argument() {
                let arguments = self.parse_command_arguments()?;
                self.method_call(Some(object), name, arguments, false, false, start)
            } else {
                let id = self.next_id();
                Expr::new(
                    ExprKind::Property(PropertyAccess {
                        object,
                        property: name,
                        safe: false,
                        spread: false,
                    }),
                    self.span_from(start),
                    id,
                )
            };
            expr = self.parse_path_elements(expr, start)?;
        }

        Ok(expr)
    }

    /// Wraps a condition so that visitors can tell where truthiness is
    /// being tested.
    pub(crate) fn boolean(&mut self, expr: Expr) -> Expr {
        let span = expr.span;
        let id = self.next_id();
        Expr::new(ExprKind::Boolean(Box::new(expr)), span, id)
    }

    pub(crate) fn empty_expr(&mut self) -> Expr {
        let span = self.current_span();
        let id = self.next_id();
        Expr::new(ExprKind::Empty, span, id)
    }

    /// True if the current token can begin a parenthesis-free argument.
    fn starts_argument(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Ident(_)
            | TokenKind::IntLiteral(_)
            | TokenKind::FloatLiteral(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::GString(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::This
            | TokenKind::New => true,
            kind => kind.keyword_text().is_some() && *self.peek_nth(1) == TokenKind::Colon,
        }
    }

    // ========== Binary levels ==========

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let left = self.parse_ternary()?;

        let op = match self.peek_kind() {
            TokenKind::Eq => BinaryOp::Assign,
            TokenKind::PlusEq => BinaryOp::AddAssign,
            TokenKind::MinusEq => BinaryOp::SubAssign,
            TokenKind::StarEq => BinaryOp::MulAssign,
            TokenKind::SlashEq => BinaryOp::DivAssign,
            TokenKind::PercentEq => BinaryOp::ModAssign,
            TokenKind::StarStarEq => BinaryOp::PowAssign,
            TokenKind::AndEq => BinaryOp::BitAndAssign,
            TokenKind::OrEq => BinaryOp::BitOrAssign,
            TokenKind::CaretEq => BinaryOp::BitXorAssign,
            TokenKind::ShlEq => BinaryOp::ShlAssign,
            TokenKind::ShrEq => BinaryOp::ShrAssign,
            TokenKind::UShrEq => BinaryOp::UShrAssign,
            TokenKind::ElvisEq => BinaryOp::ElvisAssign,
            _ => return Ok(left),
        };
        self.advance();
        self.skip_newlines();

        let right = self.parse_assignment()?;
        Ok(self.binary(op, left, right, start))
    }

    fn parse_ternary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let condition = self.parse_or()?;

        if self.match_token(&TokenKind::Question) {
            self.skip_newlines();
            let then_expr = self.parse_ternary()?;
            self.skip_newlines();
            self.expect(TokenKind::Colon)?;
            self.skip_newlines();
            let else_expr = self.parse_ternary()?;

            let condition = self.boolean(condition);
            let id = self.next_id();
            return Ok(Expr::new(
                ExprKind::Ternary {
                    condition: Box::new(condition),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                self.span_from(start),
                id,
            ));
        }

        if self.match_token(&TokenKind::Elvis) {
            self.skip_newlines();
            let fallback = self.parse_ternary()?;
            let id = self.next_id();
            return Ok(Expr::new(
                ExprKind::Elvis {
                    value: Box::new(condition),
                    fallback: Box::new(fallback),
                },
                self.span_from(start),
                id,
            ));
        }

        Ok(condition)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_and()?;

        while self.match_token(&TokenKind::OrOr) {
            self.skip_newlines();
            let right = self.parse_and()?;
            left = self.binary(BinaryOp::Or, left, right, start);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_bit_or()?;

        while self.match_token(&TokenKind::AndAnd) {
            self.skip_newlines();
            let right = self.parse_bit_or()?;
            left = self.binary(BinaryOp::And, left, right, start);
        }

        Ok(left)
    }

    fn parse_bit_or(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_bit_xor()?;

        while self.match_token(&TokenKind::Or) {
            let right = self.parse_bit_xor()?;
            left = self.binary(BinaryOp::BitOr, left, right, start);
        }

        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_bit_and()?;

        while self.match_token(&TokenKind::Caret) {
            let right = self.parse_bit_and()?;
            left = self.binary(BinaryOp::BitXor, left, right, start);
        }

        Ok(left)
    }

    fn parse_bit_and(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_equality()?;

        while self.match_token(&TokenKind::And) {
            let right = self.parse_equality()?;
            left = self.binary(BinaryOp::BitAnd, left, right, start);
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::EqEqEq => BinaryOp::Identical,
                TokenKind::NotEqEq => BinaryOp::NotIdentical,
                TokenKind::Spaceship => BinaryOp::Compare,
                TokenKind::RegexFind => BinaryOp::RegexFind,
                TokenKind::RegexMatch => BinaryOp::RegexMatch,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = self.binary(op, left, right, start);
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_shift()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::In => BinaryOp::In,
                TokenKind::Instanceof => {
                    self.advance();
                    let type_start = self.current_span();
                    let ty = self.parse_type()?;
                    let id = self.next_id();
                    let right = Expr::new(ExprKind::ClassRef(ty), self.span_from(type_start), id);
                    left = self.binary(BinaryOp::Instanceof, left, right, start);
                    continue;
                }
                TokenKind::As => {
                    self.advance();
                    let ty = self.parse_type()?;
                    let id = self.next_id();
                    left = Expr::new(
                        ExprKind::Cast {
                            ty,
                            expr: Box::new(left),
                            coerce: true,
                        },
                        self.span_from(start),
                        id,
                    );
                    continue;
                }
                // `!in` and `!instanceof`
                TokenKind::Not
                    if matches!(self.peek_nth(1), TokenKind::In | TokenKind::Instanceof) =>
                {
                    self.advance();
                    let test = if self.match_token(&TokenKind::In) {
                        let right = self.parse_shift()?;
                        self.binary(BinaryOp::In, left, right, start)
                    } else {
                        self.advance();
                        let type_start = self.current_span();
                        let ty = self.parse_type()?;
                        let id = self.next_id();
                        let right =
                            Expr::new(ExprKind::ClassRef(ty), self.span_from(type_start), id);
                        self.binary(BinaryOp::Instanceof, left, right, start)
                    };
                    let id = self.next_id();
                    left = Expr::new(
                        ExprKind::Unary {
                            op: UnaryOp::Not,
                            expr: Box::new(test),
                        },
                        self.span_from(start),
                        id,
                    );
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_shift()?;
            left = self.binary(op, left, right, start);
        }

        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_additive()?;

        loop {
            match self.peek_kind() {
                TokenKind::Shl | TokenKind::Shr | TokenKind::UShr => {
                    let op = match self.advance().kind {
                        TokenKind::Shl => BinaryOp::Shl,
                        TokenKind::Shr => BinaryOp::Shr,
                        _ => BinaryOp::UShr,
                    };
                    let right = self.parse_additive()?;
                    left = self.binary(op, left, right, start);
                }
                TokenKind::DotDot | TokenKind::DotDotLt => {
                    let exclusive = self.advance().kind == TokenKind::DotDotLt;
                    let right = self.parse_additive()?;
                    let id = self.next_id();
                    left = Expr::new(
                        ExprKind::Range {
                            from: Box::new(left),
                            to: Box::new(right),
                            exclusive,
                        },
                        self.span_from(start),
                        id,
                    );
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right, start);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right, start);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        match self.peek_kind() {
            TokenKind::Minus | TokenKind::Plus => {
                let op = if self.advance().kind == TokenKind::Minus {
                    UnaryOp::Minus
                } else {
                    UnaryOp::Plus
                };
                let expr = self.parse_unary()?;
                let id = self.next_id();
                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        expr: Box::new(expr),
                    },
                    self.span_from(start),
                    id,
                ))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.advance().kind == TokenKind::PlusPlus {
                    IncDec::Inc
                } else {
                    IncDec::Dec
                };
                let expr = self.parse_unary()?;
                let id = self.next_id();
                Ok(Expr::new(
                    ExprKind::Prefix {
                        op,
                        expr: Box::new(expr),
                    },
                    self.span_from(start),
                    id,
                ))
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let left = self.parse_not()?;

        if self.match_token(&TokenKind::StarStar) {
            let right = self.parse_unary()?;
            return Ok(self.binary(BinaryOp::Pow, left, right, start));
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        let op = match self.peek_kind() {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let expr = self.parse_not()?;
        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                expr: Box::new(expr),
            },
            self.span_from(start),
            id,
        ))
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let primary = self.parse_primary()?;
        let mut expr = self.parse_path_elements(primary, start)?;

        while matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let op = if self.advance().kind == TokenKind::PlusPlus {
                IncDec::Inc
            } else {
                IncDec::Dec
            };
            let id = self.next_id();
            expr = Expr::new(
                ExprKind::Postfix {
                    op,
                    expr: Box::new(expr),
                },
                self.span_from(start),
                id,
            );
        }

        Ok(expr)
    }

    // ========== Path elements ==========

    /// Parses member access, calls, indexing and trailing closures after
    /// `expr`.
    fn parse_path_elements(&mut self, mut expr: Expr, start: Span) -> ParseResult<Expr> {
        loop {
            expr = match self.peek_kind() {
                TokenKind::Dot | TokenKind::SafeDot | TokenKind::SpreadDot => {
                    let dot = self.advance().kind;
                    let safe = dot == TokenKind::SafeDot;
                    let spread = dot == TokenKind::SpreadDot;
                    self.skip_newlines();
                    let name = self.parse_member_name()?;
                    self.parse_member(expr, name, safe, spread, start)?
                }

                TokenKind::DotAt => {
                    self.advance();
                    let (name, _) = self.expect_name()?;
                    let id = self.next_id();
                    Expr::new(
                        ExprKind::Attribute(PropertyAccess {
                            object: Box::new(expr),
                            property: name,
                            safe: false,
                            spread: false,
                        }),
                        self.span_from(start),
                        id,
                    )
                }

                TokenKind::DotAmp | TokenKind::ColonColon => {
                    let pointer = self.advance().kind == TokenKind::DotAmp;
                    let (method, _) = self.expect_name()?;
                    let object = Box::new(expr);
                    let kind = if pointer {
                        ExprKind::MethodPointer { object, method }
                    } else {
                        ExprKind::MethodReference { object, method }
                    };
                    let id = self.next_id();
                    Expr::new(kind, self.span_from(start), id)
                }

                TokenKind::LParen => {
                    let arguments = self.parse_paren_arguments()?;
                    self.make_call(expr, arguments, start)
                }

                TokenKind::LBracket => {
                    self.advance();
                    let index_start = self.current_span();
                    let mut items = vec![self.parse_expr()?];
                    while self.match_token(&TokenKind::Comma) {
                        items.push(self.parse_expr()?);
                    }
                    self.expect(TokenKind::RBracket)?;
                    let index = if items.len() == 1 {
                        items.remove(0)
                    } else {
                        let id = self.next_id();
                        Expr::new(ExprKind::List(items), self.span_from(index_start), id)
                    };
                    self.binary(BinaryOp::Index, expr, index, start)
                }

                TokenKind::LBrace if Self::takes_trailing_closure(&expr) => {
                    self.attach_closure(expr, start)?
                }

                _ => return Ok(expr),
            };
        }
    }

    /// The name after `.`: an identifier, a keyword or a quoted string.
    fn parse_member_name(&mut self) -> ParseResult<String> {
        match self.peek_kind() {
            TokenKind::StringLiteral(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            TokenKind::GString(_) => {
                let token = self.advance();
                Ok(token.text(self.source()).trim_matches('"').to_string())
            }
            _ => Ok(self.expect_name()?.0),
        }
    }

    fn parse_member(
        &mut self,
        object: Expr,
        name: String,
        safe: bool,
        spread: bool,
        start: Span,
    ) -> ParseResult<Expr> {
        let has_args = matches!(self.peek_kind(), TokenKind::LParen | TokenKind::LBrace);

        // `Channel.of(...)` and `Math.PI`
        if let ExprKind::Variable(class) = &object.kind {
            if Self::is_class_name(class) && !safe && !spread {
                let class = class.clone();
                if has_args {
                    let arguments = if self.check(&TokenKind::LParen) {
                        self.parse_paren_arguments()?
                    } else {
                        self.closure_arguments()?
                    };
                    let id = self.next_id();
                    return Ok(Expr::new(
                        ExprKind::StaticMethodCall {
                            class,
                            method: name,
                            arguments: Box::new(arguments),
                        },
                        self.span_from(start),
                        id,
                    ));
                }
                let id = self.next_id();
                let class_ref = Expr::new(ExprKind::ClassRef(class), object.span, id);
                return Ok(self.property(class_ref, name, false, false, start));
            }
        }

        if has_args {
            let arguments = if self.check(&TokenKind::LParen) {
                self.parse_paren_arguments()?
            } else {
                self.closure_arguments()?
            };
            return Ok(self.method_call(Some(Box::new(object)), name, arguments, safe, spread, start));
        }

        Ok(self.property(object, name, safe, spread, start))
    }

    fn takes_trailing_closure(expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Variable(_)
            | ExprKind::Property(_)
            | ExprKind::MethodCall(_)
            | ExprKind::StaticMethodCall { .. } => true,
            ExprKind::Constant(Constant::String(_)) => true,
            _ => false,
        }
    }

    /// Attaches a `{ ... }` that follows `expr` on the same line.
    ///
    /// `name { }` becomes `name({ })`, `call(a) { }` becomes `call(a, { })`
    /// and `'FOO' { }` becomes a call named `FOO`, which is how config
    /// selectors such as `withName: 'FOO' { ... }` read.
    fn attach_closure(&mut self, expr: Expr, start: Span) -> ParseResult<Expr> {
        let closure = self.parse_closure()?;

        match expr.kind {
            ExprKind::MethodCall(mut call) => {
                let arguments = *call.arguments;
                call.arguments = Box::new(self.append_argument(arguments, closure));
                let id = self.next_id();
                Ok(Expr::new(ExprKind::MethodCall(call), self.span_from(start), id))
            }
            ExprKind::StaticMethodCall {
                class,
                method,
                arguments,
            } => {
                let arguments = self.append_argument(*arguments, closure);
                let id = self.next_id();
                Ok(Expr::new(
                    ExprKind::StaticMethodCall {
                        class,
                        method,
                        arguments: Box::new(arguments),
                    },
                    self.span_from(start),
                    id,
                ))
            }
            ExprKind::Constant(Constant::String(name)) => {
                let arguments = self.argument_list(vec![closure]);
                Ok(self.method_call(None, name, arguments, false, false, start))
            }
            kind => {
                let callee = Expr::new(kind, expr.span, expr.id);
                let arguments = self.argument_list(vec![closure]);
                Ok(self.make_call(callee, arguments, start))
            }
        }
    }

    fn append_argument(&mut self, arguments: Expr, extra: Expr) -> Expr {
        let span = arguments.span.to(extra.span);
        let kind = match arguments.kind {
            ExprKind::ArgumentList(mut items) => {
                items.push(extra);
                ExprKind::ArgumentList(items)
            }
            ExprKind::Tuple(mut items)
                if matches!(items.as_slice(), [Expr { kind: ExprKind::NamedArgumentList(_), .. }]) =>
            {
                let named = items.remove(0);
                let entries = match named.kind {
                    ExprKind::NamedArgumentList(entries) => entries,
                    _ => Vec::new(),
                };
                let id = self.next_id();
                let map = Expr::new(ExprKind::Map(entries), named.span, id);
                ExprKind::ArgumentList(vec![map, extra])
            }
            kind => {
                let id = self.next_id();
                ExprKind::ArgumentList(vec![Expr::new(kind, arguments.span, id), extra])
            }
        };
        let id = self.next_id();
        Expr::new(kind, span, id)
    }

    // ========== Calls ==========

    /// Turns `callee` plus `arguments` into a method call: a variable names
    /// the method, a property supplies receiver and method, and anything
    /// else is invoked through `call`.
    fn make_call(&mut self, callee: Expr, arguments: Expr, start: Span) -> Expr {
        match callee.kind {
            ExprKind::Variable(name) => self.method_call(None, name, arguments, false, false, start),
            ExprKind::Property(prop) => self.method_call(
                Some(prop.object),
                prop.property,
                arguments,
                prop.safe,
                prop.spread,
                start,
            ),
            kind => {
                let object = Expr::new(kind, callee.span, callee.id);
                self.method_call(
                    Some(Box::new(object)),
                    "call".to_string(),
                    arguments,
                    false,
                    false,
                    start,
                )
            }
        }
    }

    fn method_call(
        &mut self,
        object: Option<Box<Expr>>,
        method: String,
        arguments: Expr,
        safe: bool,
        spread: bool,
        start: Span,
    ) -> Expr {
        let id = self.next_id();
        Expr::new(
            ExprKind::MethodCall(MethodCall {
                object,
                method,
                arguments: Box::new(arguments),
                safe,
                spread,
            }),
            self.span_from(start),
            id,
        )
    }

    fn property(&mut self, object: Expr, property: String, safe: bool, spread: bool, start: Span) -> Expr {
        let id = self.next_id();
        Expr::new(
            ExprKind::Property(PropertyAccess {
                object: Box::new(object),
                property,
                safe,
                spread,
            }),
            self.span_from(start),
            id,
        )
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr, start: Span) -> Expr {
        let id = self.next_id();
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            self.span_from(start),
            id,
        )
    }

    fn argument_list(&mut self, items: Vec<Expr>) -> Expr {
        let span = match (items.first(), items.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => self.prev_span(),
        };
        let id = self.next_id();
        Expr::new(ExprKind::ArgumentList(items), span, id)
    }

    /// Parses `(args)` plus an optional trailing closure.
    fn parse_paren_arguments(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect(TokenKind::LParen)?;
        self.skip_newlines();

        let mut named = Vec::new();
        let mut positional = Vec::new();
        while !self.check(&TokenKind::RParen) {
            self.parse_argument(&mut named, &mut positional)?;
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen)?;

        if self.check(&TokenKind::LBrace) {
            positional.push(self.parse_closure()?);
        }

        Ok(self.build_arguments(named, positional, start))
    }

    /// Arguments made of a single closure: `name { ... }`.
    fn closure_arguments(&mut self) -> ParseResult<Expr> {
        let closure = self.parse_closure()?;
        Ok(self.argument_list(vec![closure]))
    }

    /// Parses comma separated arguments without parentheses.
    fn parse_command_arguments(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let mut named = Vec::new();
        let mut positional = Vec::new();

        loop {
            self.parse_argument(&mut named, &mut positional)?;
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }

        Ok(self.build_arguments(named, positional, start))
    }

    fn parse_argument(&mut self, named: &mut Vec<Expr>, positional: &mut Vec<Expr>) -> ParseResult<()> {
        let start = self.current_span();

        let named_key = *self.peek_nth(1) == TokenKind::Colon
            && (Self::is_name(self.peek_kind())
                || matches!(self.peek_kind(), TokenKind::StringLiteral(_)));
        if named_key {
            let key = self.parse_map_key()?;
            self.expect(TokenKind::Colon)?;
            self.skip_newlines();
            let value = self.parse_expr()?;
            named.push(self.map_entry(key, value, start));
            return Ok(());
        }

        if self.check(&TokenKind::Star) {
            self.advance();
            let spread_map = self.match_token(&TokenKind::Colon);
            let inner = self.parse_expr()?;
            let id = self.next_id();
            let kind = if spread_map {
                ExprKind::SpreadMap(Box::new(inner))
            } else {
                ExprKind::Spread(Box::new(inner))
            };
            let expr = Expr::new(kind, self.span_from(start), id);
            if spread_map {
                named.push(expr);
            } else {
                positional.push(expr);
            }
            return Ok(());
        }

        positional.push(self.parse_expr()?);
        Ok(())
    }

    /// Shapes parsed arguments the way call sites expect them:
    ///
    /// - positional only: `ArgumentList(args)`
    /// - named only: `Tuple([NamedArgumentList(entries)])`
    /// - both: `ArgumentList([Map(entries), args...])`
    fn build_arguments(&mut self, named: Vec<Expr>, mut positional: Vec<Expr>, start: Span) -> Expr {
        let span = self.span_from(start);

        if named.is_empty() {
            let id = self.next_id();
            return Expr::new(ExprKind::ArgumentList(positional), span, id);
        }

        let named_span = match (named.first(), named.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => span,
        };

        if positional.is_empty() {
            let id = self.next_id();
            let list = Expr::new(ExprKind::NamedArgumentList(named), named_span, id);
            let id = self.next_id();
            return Expr::new(ExprKind::Tuple(vec![list]), span, id);
        }

        let id = self.next_id();
        let map = Expr::new(ExprKind::Map(named), named_span, id);
        positional.insert(0, map);
        let id = self.next_id();
        Expr::new(ExprKind::ArgumentList(positional), span, id)
    }

    fn parse_map_key(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let key = match self.peek_kind() {
            TokenKind::StringLiteral(s) => {
                let s = s.clone();
                self.advance();
                s
            }
            _ => self.expect_name()?.0,
        };
        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::Constant(Constant::String(key)),
            self.span_from(start),
            id,
        ))
    }

    fn map_entry(&mut self, key: Expr, value: Expr, start: Span) -> Expr {
        let id = self.next_id();
        Expr::new(
            ExprKind::MapEntry {
                key: Box::new(key),
                value: Box::new(value),
            },
            self.span_from(start),
            id,
        )
    }

    // ========== Primary expressions ==========

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        let kind = match self.peek_kind() {
            TokenKind::IntLiteral(n) => ExprKind::Constant(Constant::Int(*n)),
            TokenKind::FloatLiteral(n) => ExprKind::Constant(Constant::Float(*n)),
            TokenKind::StringLiteral(s) => ExprKind::Constant(Constant::String(s.clone())),
            TokenKind::True => ExprKind::Constant(Constant::Bool(true)),
            TokenKind::False => ExprKind::Constant(Constant::Bool(false)),
            TokenKind::Null => ExprKind::Constant(Constant::Null),
            TokenKind::Ident(name) => ExprKind::Variable(name.clone()),
            TokenKind::This => ExprKind::Variable("this".to_string()),
            TokenKind::Super => ExprKind::Variable("super".to_string()),

            TokenKind::GString(_) => return self.parse_gstring(),
            TokenKind::LParen => return self.parse_paren_expr(),
            TokenKind::LBracket => return self.parse_list_or_map(),
            TokenKind::LBrace => return self.parse_closure(),
            TokenKind::New => return self.parse_new(),

            other => {
                return Err(ParseError::ExpectedExpression {
                    found: other.to_string(),
                    span: start,
                })
            }
        };

        self.advance();
        let id = self.next_id();
        Ok(Expr::new(kind, start, id))
    }

    fn parse_gstring(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();
        let parts = match self.advance().kind {
            TokenKind::GString(parts) => parts,
            other => return Err(ParseError::unexpected_token("interpolated string", &other, span)),
        };

        let mut verbatim = String::new();
        let mut strings = Vec::new();
        let mut values = Vec::new();

        for part in parts {
            match part {
                GStringPart::Text(text) => {
                    verbatim.push_str(&text);
                    strings.push(text);
                }
                GStringPart::Expr { source, span: origin } => {
                    if strings.len() == values.len() {
                        strings.push(String::new());
                    }
                    let braced = (origin.start as usize)
                        .checked_sub(1)
                        .and_then(|i| self.source().as_bytes().get(i))
                        == Some(&b'{');
                    if braced {
                        verbatim.push_str(&format!("${{{}}}", source));
                    } else {
                        verbatim.push('$');
                        verbatim.push_str(&source);
                    }
                    values.push(self.parse_embedded(&source, origin)?);
                }
            }
        }
        if strings.len() == values.len() {
            strings.push(String::new());
        }

        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::GString(GString {
                verbatim,
                strings,
                values,
            }),
            span,
            id,
        ))
    }

    /// Index of the `)` matching the `(` at `open`.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        loop {
            match self.kind_at(i) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            i += 1;
        }
    }

    /// `(expr)`, `(a, b)`, `(Type) expr` or `(a, b) -> body`.
    fn parse_paren_expr(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        let open = self.position();
        let close = self.matching_paren(open);

        if close.is_some_and(|close| *self.kind_at(close + 1) == TokenKind::Arrow) {
            return self.parse_lambda();
        }

        if let Some(close) = close {
            if self.is_cast(open, close) {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(TokenKind::RParen)?;
                let expr = self.parse_unary()?;
                let id = self.next_id();
                return Ok(Expr::new(
                    ExprKind::Cast {
                        ty,
                        expr: Box::new(expr),
                        coerce: false,
                    },
                    self.span_from(start),
                    id,
                ));
            }
        }

        self.advance();
        self.skip_newlines();
        let first = self.parse_expr()?;
        if !self.check(&TokenKind::Comma) {
            self.skip_newlines();
            self.expect(TokenKind::RParen)?;
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            self.skip_newlines();
            items.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RParen)?;
        let id = self.next_id();
        Ok(Expr::new(ExprKind::Tuple(items), self.span_from(start), id))
    }

    fn is_cast(&self, open: usize, close: usize) -> bool {
        let TokenKind::Ident(name) = self.kind_at(open + 1) else {
            return false;
        };
        if !(Self::is_class_name(name) || Self::is_primitive(name)) {
            return false;
        }
        if self.scan_type(open + 1) != Some(close) {
            return false;
        }
        matches!(
            self.kind_at(close + 1),
            TokenKind::Ident(_)
                | TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::GString(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::New
                | TokenKind::Not
                | TokenKind::Tilde
        )
    }

    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameters(&TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;

        let body = if self.check(&TokenKind::LBrace) {
            self.parse_block()?
        } else {
            let expr = self.parse_expr()?;
            let span = expr.span;
            let id = self.next_id();
            Stmt::new(StmtKind::Expr(expr), span, id)
        };

        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            self.span_from(start),
            id,
        ))
    }

    /// `[]`, `[:]`, `[a, b]` or `[k: v, ...]`.
    fn parse_list_or_map(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect(TokenKind::LBracket)?;
        self.skip_newlines();

        if self.check(&TokenKind::Colon) && *self.peek_nth(1) == TokenKind::RBracket {
            self.advance();
            self.advance();
            let id = self.next_id();
            return Ok(Expr::new(ExprKind::Map(Vec::new()), self.span_from(start), id));
        }

        let is_map = *self.peek_nth(1) == TokenKind::Colon
            && (Self::is_name(self.peek_kind())
                || matches!(
                    self.peek_kind(),
                    TokenKind::StringLiteral(_)
                        | TokenKind::GString(_)
                        | TokenKind::IntLiteral(_)
                        | TokenKind::Star
                ));

        let mut items = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            let item = if is_map {
                self.parse_map_element()?
            } else if self.check(&TokenKind::Star) {
                let item_start = self.current_span();
                self.advance();
                let inner = self.parse_expr()?;
                let id = self.next_id();
                Expr::new(ExprKind::Spread(Box::new(inner)), self.span_from(item_start), id)
            } else {
                self.parse_expr()?
            };
            items.push(item);

            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        self.expect(TokenKind::RBracket)?;

        let kind = if is_map {
            ExprKind::Map(items)
        } else {
            ExprKind::List(items)
        };
        let id = self.next_id();
        Ok(Expr::new(kind, self.span_from(start), id))
    }

    fn parse_map_element(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        if self.check(&TokenKind::Star) && *self.peek_nth(1) == TokenKind::Colon {
            self.advance();
            self.advance();
            let inner = self.parse_expr()?;
            let id = self.next_id();
            return Ok(Expr::new(
                ExprKind::SpreadMap(Box::new(inner)),
                self.span_from(start),
                id,
            ));
        }

        let key = if Self::is_name(self.peek_kind()) && *self.peek_nth(1) == TokenKind::Colon {
            self.parse_map_key()?
        } else {
            self.parse_ternary()?
        };
        self.expect(TokenKind::Colon)?;
        self.skip_newlines();
        let value = self.parse_expr()?;
        Ok(self.map_entry(key, value, start))
    }

    /// Parses `{ params -> stmts }`.
    pub(crate) fn parse_closure(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace)?;

        let params = if self.closure_has_params() {
            self.skip_newlines();
            let params = self.parse_parameters(&TokenKind::Arrow)?;
            self.expect(TokenKind::Arrow)?;
            params
        } else {
            Vec::new()
        };

        let body_start = self.current_span();
        let stmts = self.parse_stmts_until_brace()?;
        let body_span = self.span_from(body_start);
        self.expect(TokenKind::RBrace)?;

        let id = self.next_id();
        let body = Stmt::new(StmtKind::Block(stmts), body_span, id);
        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::Closure {
                params,
                body: Box::new(body),
            },
            self.span_from(start),
            id,
        ))
    }

    /// Looks ahead for `->` across tokens that can appear in a closure's
    /// parameter list.
    fn closure_has_params(&self) -> bool {
        let mut i = self.position();
        while *self.kind_at(i) == TokenKind::Newline {
            i += 1;
        }
        loop {
            match self.kind_at(i) {
                TokenKind::Arrow => return true,
                TokenKind::Ident(_)
                | TokenKind::Comma
                | TokenKind::Def
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Dot
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::Question
                | TokenKind::Modifier(_) => i += 1,
                _ => return false,
            }
        }
    }

    /// `new Type(args)`, `new int[n]` or `new String[] { a, b }`.
    fn parse_new(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        self.expect(TokenKind::New)?;
        let class = self.parse_type()?;

        if self.check(&TokenKind::LParen) {
            let arguments = self.parse_paren_arguments()?;
            let id = self.next_id();
            return Ok(Expr::new(
                ExprKind::ConstructorCall {
                    class,
                    arguments: Box::new(arguments),
                },
                self.span_from(start),
                id,
            ));
        }

        let mut sizes = Vec::new();
        while self.match_token(&TokenKind::LBracket) {
            sizes.push(self.parse_expr()?);
            self.expect(TokenKind::RBracket)?;
        }

        let elements = if self.check(&TokenKind::LBrace) {
            self.advance();
            self.skip_newlines();
            let mut elements = Vec::new();
            while !self.check(&TokenKind::RBrace) {
                elements.push(self.parse_expr()?);
                self.skip_newlines();
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
            self.expect(TokenKind::RBrace)?;
            Some(elements)
        } else {
            None
        };

        if sizes.is_empty() && elements.is_none() {
            return Err(ParseError::unexpected_token(
                "'(' or '['",
                self.peek_kind(),
                self.current_span(),
            ));
        }

        let element_type = class.trim_end_matches("[]").to_string();
        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::Array {
                element_type,
                sizes,
                elements,
            },
            self.span_from(start),
            id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::new(source).expect("failed to tokenize");
        parser.parse_expr().expect("failed to parse expression")
    }

    fn parse_stmt_expr(source: &str) -> Expr {
        let mut parser = Parser::new(source).expect("failed to tokenize");
        let file = parser.parse().expect("failed to parse source file");
        let expr = file
            .statements()
            .next()
            .and_then(|s| s.as_expr())
            .cloned()
            .expect("expected an expression statement");
        expr
    }

    fn call(expr: &Expr) -> &MethodCall {
        expr.as_method_call()
            .unwrap_or_else(|| panic!("expected method call, got {:?}", expr.kind))
    }

    #[test]
    fn test_precedence() {
        let expr = parse_expr("a + b * c");
        match &expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("expected addition, got {:?}", other),
        }

        let expr = parse_expr("a || b && c == d");
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinaryOp::Or, .. }));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let expr = parse_expr("a = b = 1");
        let (target, value) = expr.as_assignment().expect("assignment");
        assert_eq!(target.as_variable(), Some("a"));
        assert!(value.as_assignment().is_some());
    }

    #[test]
    fn test_ternary_and_elvis() {
        let expr = parse_expr("x ? 'a' : y ?: 'b'");
        match &expr.kind {
            ExprKind::Ternary {
                condition,
                else_expr,
                ..
            } => {
                assert!(matches!(condition.kind, ExprKind::Boolean(_)));
                assert!(matches!(else_expr.kind, ExprKind::Elvis { .. }));
            }
            other => panic!("expected ternary, got {:?}", other),
        }
    }

    #[test]
    fn test_process_definition_shape() {
        let expr = parse_stmt_expr("process FOO {\n  cpus 2\n}");
        let outer = call(&expr);
        assert_eq!(outer.method, "process");
        assert!(outer.implicit_this());
        let inner = call(&outer.args()[0]);
        assert_eq!(inner.method, "FOO");
        let closure = inner.closure_arg().expect("closure argument");
        let ExprKind::Closure { body, .. } = &closure.kind else {
            unreachable!();
        };
        let stmt = &body.block_stmts()[0];
        let cpus = call(stmt.as_expr().expect("expression"));
        assert_eq!(cpus.method, "cpus");
        assert_eq!(cpus.args()[0].as_constant(), Some(&Constant::Int(2)));
    }

    #[test]
    fn test_include_chain() {
        let expr = parse_stmt_expr("include { FOO; BAR as BAZ } from './modules/foo'");
        let from = call(&expr);
        assert_eq!(from.method, "from");
        assert_eq!(from.args()[0].as_str(), Some("./modules/foo"));

        let include = call(from.object.as_deref().expect("receiver"));
        assert_eq!(include.method, "include");
        let ExprKind::Closure { body, .. } = &include.args()[0].kind else {
            panic!("expected closure");
        };
        let items = body.block_stmts();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[1].as_expr().map(|e| &e.kind),
            Some(ExprKind::Cast { ty, .. }) if ty == "BAZ"
        ));
    }

    #[test]
    fn test_command_with_named_and_positional_args() {
        let expr = parse_stmt_expr("tuple val(meta), path('*.bam'), emit: bam");
        let tuple = call(&expr);
        let args = tuple.args();
        assert_eq!(args.len(), 3);
        assert!(matches!(args[0].kind, ExprKind::Map(ref entries) if entries.len() == 1));
        assert_eq!(call(&args[1]).method, "val");
        assert_eq!(call(&args[2]).method, "path");
    }

    #[test]
    fn test_named_only_args() {
        let expr = parse_expr("splitCsv(header: true, sep: ',')");
        let split = call(&expr);
        match &split.arguments.kind {
            ExprKind::Tuple(items) => {
                assert!(matches!(items[0].kind, ExprKind::NamedArgumentList(ref e) if e.len() == 2))
            }
            other => panic!("expected tuple, got {:?}", other),
        }
    }

    #[test]
    fn test_method_chain_with_closures() {
        let expr = parse_expr("Channel.fromPath(params.input).map { row -> [row.id, row] }");
        let map = call(&expr);
        assert_eq!(map.method, "map");
        let closure = map.closure_arg().expect("closure");
        assert!(matches!(closure.kind, ExprKind::Closure { ref params, .. } if params.len() == 1));
        let receiver = map.object.as_deref().expect("receiver");
        assert!(matches!(
            receiver.kind,
            ExprKind::StaticMethodCall { ref class, ref method, .. } if class == "Channel" && method == "fromPath"
        ));
    }

    #[test]
    fn test_memory_units_and_closures() {
        let expr = parse_stmt_expr("memory { 6.GB * task.attempt }");
        let memory = call(&expr);
        let ExprKind::Closure { body, .. } = &memory.args()[0].kind else {
            panic!("expected closure");
        };
        let product = body.block_stmts()[0].as_expr().expect("expression");
        match &product.kind {
            ExprKind::Binary { left, .. } => {
                assert!(matches!(left.kind, ExprKind::Property(ref p) if p.property == "GB"));
            }
            other => panic!("expected multiplication, got {:?}", other),
        }
    }

    #[test]
    fn test_gstring_with_ternary() {
        let expr = parse_expr(
            r#""${ workflow.containerEngine == 'singularity' ? 'https://depot/x:1' : 'biocontainers/x:1' }""#,
        );
        let ExprKind::GString(gstring) = &expr.kind else {
            panic!("expected gstring");
        };
        assert_eq!(gstring.values.len(), 1);
        assert_eq!(gstring.strings.len(), 2);
        assert!(matches!(gstring.values[0].kind, ExprKind::Ternary { .. }));
        assert!(gstring.verbatim.starts_with("${"));
    }

    #[test]
    fn test_gstring_path_interpolation() {
        let expr = parse_expr(r#""$meta.id""#);
        let ExprKind::GString(gstring) = &expr.kind else {
            panic!("expected gstring");
        };
        assert_eq!(gstring.verbatim, "$meta.id");
        assert_eq!(gstring.values[0].text(), "meta.id");
    }

    #[test]
    fn test_string_selector_with_closure() {
        let expr = parse_stmt_expr("withName: 'FOO' {\n  cpus = 2\n}");
        let selector = call(&expr);
        assert_eq!(selector.method, "FOO");
        assert!(selector.closure_arg().is_some());
    }

    #[test]
    fn test_maps_lists_and_ranges() {
        assert!(matches!(parse_expr("[:]").kind, ExprKind::Map(ref e) if e.is_empty()));
        assert!(matches!(parse_expr("[a: 1, 'b': 2]").kind, ExprKind::Map(ref e) if e.len() == 2));
        assert!(matches!(parse_expr("[1, 2, 3,]").kind, ExprKind::List(ref e) if e.len() == 3));
        assert!(matches!(parse_expr("1..<5").kind, ExprKind::Range { exclusive: true, .. }));
    }

    #[test]
    fn test_casts_and_in() {
        assert!(matches!(
            parse_expr("(String) x").kind,
            ExprKind::Cast { coerce: false, .. }
        ));
        assert!(matches!(
            parse_expr("x as Integer").kind,
            ExprKind::Cast { coerce: true, .. }
        ));
        assert!(matches!(parse_expr("(a + b)").kind, ExprKind::Binary { .. }));
        assert!(matches!(
            parse_expr("task.exitStatus in [143, 137]").kind,
            ExprKind::Binary { op: BinaryOp::In, .. }
        ));
    }

    #[test]
    fn test_safe_navigation_and_index() {
        let expr = parse_expr("meta?.id");
        assert!(matches!(expr.kind, ExprKind::Property(ref p) if p.safe));

        let expr = parse_expr("reads[0]");
        assert_eq!(expr.text(), "reads[0]");
    }

    #[test]
    fn test_constructor_and_lambda() {
        assert!(matches!(
            parse_expr("new File(path)").kind,
            ExprKind::ConstructorCall { ref class, .. } if class == "File"
        ));
        assert!(matches!(parse_expr("(a, b) -> a + b").kind, ExprKind::Lambda { .. }));
    }

    #[test]
    fn test_expected_expression_error() {
        let mut parser = Parser::new(")").expect("failed to tokenize");
        let err = parser.parse_expr().unwrap_err();
        assert!(matches!(err, ParseError::ExpectedExpression { .. }));
    }
}
