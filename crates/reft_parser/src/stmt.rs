//! Statement parsing.

use crate::error::{ParseError, ParseResult};
use crate::parser::Parser;
use reft_ast::*;
use reft_lexer::TokenKind;

impl Parser<'_> {
    /// Parses a statement along with any labels in front of it.
    ///
    /// Labels attach to the statement that follows them, so in
    ///
    /// ```text
    /// input:
    ///     val x
    /// ```
    ///
    /// `val x` carries the label `input`. A label with nothing after it
    /// before the end of the block produces an empty statement.
    pub fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        let mut labels = Vec::new();

        while matches!(self.peek_kind(), TokenKind::Ident(_)) && *self.peek_nth(1) == TokenKind::Colon
        {
            let (label, _) = self.expect_ident()?;
            self.advance(); // :
            self.skip_separators();
            labels.push(label);
        }

        if !labels.is_empty() && matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            let id = self.next_id();
            let mut stmt = Stmt::new(StmtKind::Empty, self.span_from(start), id);
            stmt.labels = labels;
            return Ok(stmt);
        }

        let mut stmt = self.parse_unlabeled_stmt()?;
        stmt.labels = labels;
        Ok(stmt)
    }

    fn parse_unlabeled_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();

        match self.peek_kind() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::Synchronized => self.parse_synchronized_stmt(),

            TokenKind::Return => {
                self.advance();
                let value = if self.at_stmt_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let id = self.next_id();
                Ok(Stmt::new(StmtKind::Return(value), self.span_from(start), id))
            }

            TokenKind::Throw => {
                self.advance();
                let value = self.parse_expr()?;
                let id = self.next_id();
                Ok(Stmt::new(StmtKind::Throw(value), self.span_from(start), id))
            }

            TokenKind::Break | TokenKind::Continue => {
                let is_break = self.check(&TokenKind::Break);
                self.advance();
                let label = match self.peek_kind() {
                    TokenKind::Ident(name) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                let kind = if is_break {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                };
                let id = self.next_id();
                Ok(Stmt::new(kind, self.span_from(start), id))
            }

            TokenKind::Assert => {
                self.advance();
                let condition = self.parse_expr()?;
                let condition = self.boolean(condition);
                let message = if self.match_token(&TokenKind::Colon)
                    || self.match_token(&TokenKind::Comma)
                {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                let id = self.next_id();
                Ok(Stmt::new(
                    StmtKind::Assert { condition, message },
                    self.span_from(start),
                    id,
                ))
            }

            TokenKind::Semi => {
                self.advance();
                let id = self.next_id();
                Ok(Stmt::new(StmtKind::Empty, start, id))
            }

            _ => {
                let expr = if self.looks_like_declaration() {
                    self.parse_declaration()?
                } else {
                    self.parse_command_expr()?
                };
                let id = self.next_id();
                Ok(Stmt::new(StmtKind::Expr(expr), self.span_from(start), id))
            }
        }
    }

    /// Parses `{ stmt* }` into a block statement.
    pub fn parse_block(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::LBrace)?;
        let stmts = self.parse_stmts_until_brace()?;
        self.expect(TokenKind::RBrace)?;

        let id = self.next_id();
        Ok(Stmt::new(StmtKind::Block(stmts), self.span_from(start), id))
    }

    /// Parses statements up to, but not including, the closing `}`.
    pub(crate) fn parse_stmts_until_brace(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.skip_separators();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
            self.expect_separator()?;
        }
        Ok(stmts)
    }

    fn at_stmt_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof
        )
    }

    /// Parses the body of `if`, `for` and `while`, which may sit on the
    /// next line.
    fn parse_body(&mut self) -> ParseResult<Box<Stmt>> {
        self.skip_newlines();
        Ok(Box::new(self.parse_stmt()?))
    }

    fn parse_paren_condition(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(self.boolean(condition))
    }

    fn parse_if_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::If)?;

        let condition = self.parse_paren_condition()?;
        let then_branch = self.parse_body()?;

        let else_branch = if self.check_past_newlines(&TokenKind::Else) {
            self.skip_newlines();
            self.advance(); // else
            Some(self.parse_body()?)
        } else {
            None
        };

        let id = self.next_id();
        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            self.span_from(start),
            id,
        ))
    }

    fn parse_for_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let mut at = self.position();
        if *self.kind_at(at) == TokenKind::Def {
            at += 1;
        }
        let typed = self.scan_typed_name(at);
        let name_at = typed.map(|end| end - 1).unwrap_or(at);
        let is_for_in = matches!(self.kind_at(name_at), TokenKind::Ident(_))
            && matches!(self.kind_at(name_at + 1), TokenKind::In | TokenKind::Colon);

        let (variable, collection) = if is_for_in {
            let var_start = self.current_span();
            self.match_token(&TokenKind::Def);
            let ty = if typed.is_some() {
                Some(self.parse_type()?)
            } else {
                None
            };
            let (name, _) = self.expect_ident()?;
            let variable = Param::new(name, ty, None, self.span_from(var_start));
            self.advance(); // in / :
            (Some(variable), self.parse_expr()?)
        } else {
            (None, self.parse_classic_for_header()?)
        };

        self.expect(TokenKind::RParen)?;
        let body = self.parse_body()?;

        let id = self.next_id();
        Ok(Stmt::new(
            StmtKind::For {
                variable,
                collection,
                body,
            },
            self.span_from(start),
            id,
        ))
    }

    /// Parses `init; condition; update` into a closure list.
    fn parse_classic_for_header(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        let init = if self.check(&TokenKind::Semi) {
            self.empty_expr()
        } else if self.looks_like_declaration() {
            self.parse_declaration()?
        } else {
            self.parse_expr()?
        };
        self.expect(TokenKind::Semi)?;

        let condition = if self.check(&TokenKind::Semi) {
            self.empty_expr()
        } else {
            self.parse_expr()?
        };
        self.expect(TokenKind::Semi)?;

        let update = if self.check(&TokenKind::RParen) {
            self.empty_expr()
        } else {
            self.parse_expr()?
        };

        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::ClosureList(vec![init, condition, update]),
            self.span_from(start),
            id,
        ))
    }

    fn parse_while_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::While)?;

        let condition = self.parse_paren_condition()?;
        let body = self.parse_body()?;

        let id = self.next_id();
        Ok(Stmt::new(
            StmtKind::While { condition, body },
            self.span_from(start),
            id,
        ))
    }

    fn parse_do_while_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::Do)?;

        let body = self.parse_body()?;
        self.skip_newlines();
        self.expect(TokenKind::While)?;
        let condition = self.parse_paren_condition()?;

        let id = self.next_id();
        Ok(Stmt::new(
            StmtKind::DoWhile { body, condition },
            self.span_from(start),
            id,
        ))
    }

    fn parse_try_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::Try)?;
        self.skip_newlines();
        let body = Box::new(self.parse_block()?);

        let mut catches = Vec::new();
        while self.check_past_newlines(&TokenKind::Catch) {
            self.skip_newlines();
            catches.push(self.parse_catch_clause()?);
        }

        let finally = if self.check_past_newlines(&TokenKind::Finally) {
            self.skip_newlines();
            self.advance();
            self.skip_newlines();
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(ParseError::Custom {
                message: "try without catch or finally".to_string(),
                span: self.span_from(start),
            });
        }

        let id = self.next_id();
        Ok(Stmt::new(
            StmtKind::Try {
                body,
                catches,
                finally,
            },
            self.span_from(start),
            id,
        ))
    }

    fn parse_catch_clause(&mut self) -> ParseResult<CatchClause> {
        let start = self.current_span();
        self.expect(TokenKind::Catch)?;
        self.expect(TokenKind::LParen)?;

        let param_start = self.current_span();
        self.match_token(&TokenKind::Def);
        let typed = self.scan_type(self.position()).is_some_and(|end| {
            matches!(self.kind_at(end), TokenKind::Ident(_) | TokenKind::Or)
        });
        let ty = if typed {
            let mut ty = self.parse_type()?;
            while self.match_token(&TokenKind::Or) {
                ty.push_str(" | ");
                ty.push_str(&self.parse_type()?);
            }
            Some(ty)
        } else {
            None
        };
        let (name, _) = self.expect_ident()?;
        let param = Param::new(name, ty, None, self.span_from(param_start));

        self.expect(TokenKind::RParen)?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(CatchClause {
            param,
            body,
            span: self.span_from(start),
        })
    }

    fn parse_switch_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::Switch)?;
        self.expect(TokenKind::LParen)?;
        let subject = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.skip_newlines();
        self.expect(TokenKind::LBrace)?;
        self.skip_separators();

        let mut cases = Vec::new();
        let mut default = None;

        loop {
            match self.peek_kind() {
                TokenKind::Case => {
                    let case_start = self.current_span();
                    self.advance();
                    let value = self.parse_expr()?;
                    self.expect(TokenKind::Colon)?;
                    let body = self.parse_case_body()?;
                    cases.push(CaseClause {
                        value,
                        body,
                        span: self.span_from(case_start),
                    });
                }
                TokenKind::Default => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    default = Some(Box::new(self.parse_case_body()?));
                }
                TokenKind::RBrace => break,
                other => {
                    return Err(ParseError::unexpected_token(
                        "case, default or '}'",
                        other,
                        self.current_span(),
                    ))
                }
            }
        }
        self.expect(TokenKind::RBrace)?;

        let id = self.next_id();
        Ok(Stmt::new(
            StmtKind::Switch {
                subject,
                cases,
                default,
            },
            self.span_from(start),
            id,
        ))
    }

    fn parse_case_body(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        let mut stmts = Vec::new();
        self.skip_separators();
        while !matches!(
            self.peek_kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
        ) {
            stmts.push(self.parse_stmt()?);
            self.expect_separator()?;
        }
        let id = self.next_id();
        Ok(Stmt::new(StmtKind::Block(stmts), self.span_from(start), id))
    }

    fn parse_synchronized_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::Synchronized)?;
        self.expect(TokenKind::LParen)?;
        let lock = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.skip_newlines();
        let body = Box::new(self.parse_block()?);

        let id = self.next_id();
        Ok(Stmt::new(
            StmtKind::Synchronized { lock, body },
            self.span_from(start),
            id,
        ))
    }

    // ========== Declarations ==========

    /// Detects `def x`, `Type x = ...`, `final x = ...`, `a b = ...`.
    pub(crate) fn looks_like_declaration(&self) -> bool {
        let mut i = self.position();
        while matches!(self.kind_at(i), TokenKind::Modifier(_)) {
            i += 1;
        }
        let has_modifiers = i > self.position();

        match self.kind_at(i) {
            TokenKind::Def => true,
            TokenKind::Ident(_) => {
                if let Some(end) = self.scan_typed_name(i) {
                    return matches!(
                        self.kind_at(end),
                        TokenKind::Eq
                            | TokenKind::Newline
                            | TokenKind::Semi
                            | TokenKind::RBrace
                            | TokenKind::Eof
                    );
                }
                let untyped = has_modifiers && *self.kind_at(i + 1) == TokenKind::Eq;
                let lower_typed = matches!(self.kind_at(i + 1), TokenKind::Ident(_))
                    && *self.kind_at(i + 2) == TokenKind::Eq;
                untyped || lower_typed
            }
            _ => false,
        }
    }

    /// Parses a local variable declaration.
    pub(crate) fn parse_declaration(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        while matches!(self.peek_kind(), TokenKind::Modifier(_)) {
            self.advance();
        }
        let has_def = self.match_token(&TokenKind::Def);

        let two_names = matches!(self.peek_kind(), TokenKind::Ident(_))
            && matches!(self.peek_nth(1), TokenKind::Ident(_));
        let ty = if self.scan_typed_name(self.position()).is_some() || (!has_def && two_names) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let target = if self.check(&TokenKind::LParen) {
            let tuple_start = self.current_span();
            self.advance();
            let mut names = Vec::new();
            loop {
                let name_start = self.current_span();
                if self.scan_typed_name(self.position()).is_some() {
                    self.parse_type()?;
                }
                let (name, _) = self.expect_ident()?;
                let id = self.next_id();
                names.push(Expr::new(
                    ExprKind::Variable(name),
                    self.span_from(name_start),
                    id,
                ));
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            let id = self.next_id();
            Expr::new(ExprKind::Tuple(names), self.span_from(tuple_start), id)
        } else {
            let (name, span) = self.expect_ident()?;
            let id = self.next_id();
            Expr::new(ExprKind::Variable(name), span, id)
        };

        let value = if self.match_token(&TokenKind::Eq) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        let id = self.next_id();
        Ok(Expr::new(
            ExprKind::Declaration {
                ty,
                target: Box::new(target),
                value,
            },
            self.span_from(start),
            id,
        ))
    }
}
