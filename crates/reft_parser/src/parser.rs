//! The main parser implementation.

use crate::error::{ParseError, ParseResult};
use reft_ast::*;
use reft_lexer::{Lexer, Span, Token, TokenKind};

static EOF_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    span: Span {
        start: 0,
        end: 0,
        line: 0,
        column: 0,
    },
};

/// Primitive type names that may start a cast or a declaration.
const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// The Nextflow parser.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    /// The full file text; spans of every token index into it.
    source: &'a str,
    next_node_id: u32,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    ///
    /// The whole file is tokenized up front, so lexical errors surface here.
    pub fn new(source: &'a str) -> ParseResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            source,
            next_node_id: 0,
        })
    }

    /// Parses a complete source file.
    pub fn parse(&mut self) -> ParseResult<SourceFile> {
        let start = self.current_span();
        let mut items = Vec::new();

        self.skip_separators();
        while !self.is_at_end() {
            items.push(self.parse_item()?);
            self.expect_separator()?;
        }

        let span = match items.last() {
            Some(last) => start.to(last.span()),
            None => start,
        };

        Ok(SourceFile { items, span })
    }

    /// Parses a top-level item.
    pub fn parse_item(&mut self) -> ParseResult<Item> {
        self.skip_annotations()?;

        if self.check(&TokenKind::Import) {
            return Ok(Item::Import(self.parse_import()?));
        }

        if self.looks_like_function() {
            return Ok(Item::Function(self.parse_function()?));
        }

        Ok(Item::Statement(self.parse_stmt()?))
    }

    /// Parses the text of an interpolated expression found inside a string.
    pub(crate) fn parse_embedded(&mut self, text: &str, origin: Span) -> ParseResult<Expr> {
        let tokens = Lexer::embedded(text, origin).tokenize()?;
        let mut sub = Parser {
            tokens,
            pos: 0,
            source: self.source,
            next_node_id: self.next_node_id,
        };

        sub.skip_newlines();
        let expr = if sub.is_at_end() {
            let id = sub.next_id();
            Expr::new(ExprKind::Empty, origin, id)
        } else {
            sub.parse_expr()?
        };
        sub.skip_newlines();
        if !sub.is_at_end() {
            return Err(ParseError::unexpected_token(
                "end of interpolation",
                sub.peek_kind(),
                sub.current_span(),
            ));
        }

        self.next_node_id = sub.next_node_id;
        Ok(expr)
    }

    // ========== Helper methods ==========

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        NodeId(id)
    }

    pub(crate) fn source(&self) -> &'a str {
        self.source
    }

    pub(crate) fn is_at_end(&self) -> bool {
        *self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .unwrap_or(&EOF_TOKEN)
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&EOF_TOKEN.kind)
    }

    pub(crate) fn kind_at(&self, index: usize) -> &TokenKind {
        self.tokens
            .get(index)
            .map(|t| &t.kind)
            .unwrap_or(&EOF_TOKEN.kind)
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// The span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => self.current_span(),
        }
    }

    pub(crate) fn prev_kind(&self) -> Option<&TokenKind> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| &t.kind)
    }

    /// A span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        start.to(self.prev_span())
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected_token(
                kind.as_str(),
                self.peek_kind(),
                self.current_span(),
            ))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            other => Err(ParseError::ExpectedIdent {
                found: other.to_string(),
                span: self.current_span(),
            }),
        }
    }

    /// Accepts an identifier or a keyword used as a name, as Groovy allows
    /// after `.` and as map keys.
    pub(crate) fn expect_name(&mut self) -> ParseResult<(String, Span)> {
        if let Some(text) = self.peek_kind().keyword_text() {
            let text = text.to_string();
            let span = self.advance().span;
            return Ok((text, span));
        }
        self.expect_ident()
    }

    pub(crate) fn is_name(kind: &TokenKind) -> bool {
        matches!(kind, TokenKind::Ident(_)) || kind.keyword_text().is_some()
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.match_token(&TokenKind::Newline) {}
    }

    pub(crate) fn skip_separators(&mut self) {
        while self.match_token(&TokenKind::Newline) || self.match_token(&TokenKind::Semi) {}
    }

    /// Returns true if `kind` follows the current token, skipping newlines.
    pub(crate) fn check_past_newlines(&self, kind: &TokenKind) -> bool {
        let mut i = self.pos;
        while *self.kind_at(i) == TokenKind::Newline {
            i += 1;
        }
        std::mem::discriminant(self.kind_at(i)) == std::mem::discriminant(kind)
    }

    /// Consumes statement separators after a statement.
    ///
    /// A statement must be followed by a newline, `;`, the closing brace of
    /// its block or the end of the file. A statement that itself ended with
    /// `}` may be followed directly by another one.
    pub(crate) fn expect_separator(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Semi => {
                self.skip_separators();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ if self.prev_kind() == Some(&TokenKind::RBrace) => Ok(()),
            other => Err(ParseError::unexpected_token(
                "newline or ';'",
                other,
                self.current_span(),
            )),
        }
    }

    /// Skips `@Annotation` and `@Annotation(args)`.
    pub(crate) fn skip_annotations(&mut self) -> ParseResult<()> {
        while self.check(&TokenKind::At) && matches!(self.peek_nth(1), TokenKind::Ident(_)) {
            self.advance();
            self.parse_type()?;
            if self.check(&TokenKind::LParen) {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
            }
            self.skip_newlines();
        }
        Ok(())
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> ParseResult<()> {
        self.expect(open.clone())?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(ParseError::unexpected_token(
                    close.as_str(),
                    &TokenKind::Eof,
                    self.current_span(),
                ));
            }
            let token = self.advance();
            if token.kind == open {
                depth += 1;
            } else if token.kind == close {
                depth -= 1;
            }
        }
        Ok(())
    }

    // ========== Types ==========

    /// Returns true if `name` looks like a class name: capitalized and not
    /// an all-caps constant such as a process name.
    pub(crate) fn is_class_name(name: &str) -> bool {
        name.starts_with(|c: char| c.is_ascii_uppercase()) && name.chars().any(|c| c.is_lowercase())
    }

    pub(crate) fn is_primitive(name: &str) -> bool {
        PRIMITIVES.contains(&name)
    }

    /// Scans a type starting at token `at`, returning the index just past
    /// it. A type is a dotted name with optional generic arguments and
    /// array brackets.
    pub(crate) fn scan_type(&self, at: usize) -> Option<usize> {
        let mut i = at;
        if !matches!(self.kind_at(i), TokenKind::Ident(_)) {
            return None;
        }
        i += 1;
        while *self.kind_at(i) == TokenKind::Dot && matches!(self.kind_at(i + 1), TokenKind::Ident(_))
        {
            i += 2;
        }

        if *self.kind_at(i) == TokenKind::Lt {
            let mut depth: i32 = 0;
            loop {
                match self.kind_at(i) {
                    TokenKind::Lt => depth += 1,
                    TokenKind::Gt => depth -= 1,
                    TokenKind::Shr => depth -= 2,
                    TokenKind::UShr => depth -= 3,
                    TokenKind::Ident(_)
                    | TokenKind::Comma
                    | TokenKind::Dot
                    | TokenKind::Question
                    | TokenKind::LBracket
                    | TokenKind::RBracket => {}
                    TokenKind::Modifier(_) | TokenKind::Super => {}
                    _ => return None,
                }
                i += 1;
                if depth <= 0 {
                    break;
                }
            }
            if depth < 0 {
                return None;
            }
        }

        while *self.kind_at(i) == TokenKind::LBracket && *self.kind_at(i + 1) == TokenKind::RBracket {
            i += 2;
        }
        Some(i)
    }

    /// Parses a type and returns its text.
    pub(crate) fn parse_type(&mut self) -> ParseResult<String> {
        let start = self.current_span();
        let end = self.scan_type(self.pos).ok_or_else(|| ParseError::UnexpectedToken {
            expected: "type".to_string(),
            found: self.peek_kind().to_string(),
            span: start,
        })?;

        let mut text = String::new();
        while self.pos < end {
            let token = self.advance();
            match &token.kind {
                TokenKind::Ident(name) => text.push_str(name),
                TokenKind::Comma => text.push_str(", "),
                other => text.push_str(other.as_str()),
            }
        }
        Ok(text)
    }

    /// Returns the index past `Type name` if a typed declaration starts at
    /// `at`. Only class-like or primitive types qualify, so that command
    /// calls like `val x` are not mistaken for declarations.
    pub(crate) fn scan_typed_name(&self, at: usize) -> Option<usize> {
        let TokenKind::Ident(first) = self.kind_at(at) else {
            return None;
        };
        let end = self.scan_type(at)?;
        let generic = end > at + 1;
        if !(Self::is_class_name(first) || Self::is_primitive(first) || generic) {
            return None;
        }
        match self.kind_at(end) {
            TokenKind::Ident(_) => Some(end + 1),
            _ => None,
        }
    }

    // ========== Declarations ==========

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        let start = self.current_span();
        self.expect(TokenKind::Import)?;

        let is_static = matches!(self.peek_kind(), TokenKind::Modifier(m) if m == "static");
        if is_static {
            self.advance();
        }

        let (first, _) = self.expect_name()?;
        let mut path = first;
        let mut is_star = false;
        while self.match_token(&TokenKind::Dot) {
            if self.match_token(&TokenKind::Star) {
                is_star = true;
                break;
            }
            let (segment, _) = self.expect_name()?;
            path.push('.');
            path.push_str(&segment);
        }

        let alias = if self.match_token(&TokenKind::As) {
            Some(self.expect_ident()?.0)
        } else {
            None
        };

        Ok(ImportDecl {
            path,
            alias,
            is_static,
            is_star,
            span: self.span_from(start),
        })
    }

    /// Detects `[modifiers] (def | Type) name (...) {`.
    fn looks_like_function(&self) -> bool {
        let mut i = self.pos;
        while matches!(self.kind_at(i), TokenKind::Modifier(_)) {
            i += 1;
        }

        let name_at = match self.kind_at(i) {
            TokenKind::Def => {
                // `def Type name(` or `def name(`
                match self.scan_typed_name(i + 1) {
                    Some(end) => end - 1,
                    None => i + 1,
                }
            }
            TokenKind::Ident(_) => match self.scan_typed_name(i) {
                Some(end) => end - 1,
                None => return false,
            },
            _ => return false,
        };

        if !matches!(self.kind_at(name_at), TokenKind::Ident(_))
            || *self.kind_at(name_at + 1) != TokenKind::LParen
        {
            return false;
        }

        // Find the matching paren and require a body after it.
        let mut depth = 0usize;
        let mut j = name_at + 1;
        loop {
            match self.kind_at(j) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            j += 1;
        }
        j += 1;
        while *self.kind_at(j) == TokenKind::Newline {
            j += 1;
        }
        *self.kind_at(j) == TokenKind::LBrace
    }

    fn parse_function(&mut self) -> ParseResult<FunctionDecl> {
        let start = self.current_span();

        let mut modifiers = Vec::new();
        while let TokenKind::Modifier(m) = self.peek_kind() {
            modifiers.push(m.clone());
            self.advance();
        }

        self.match_token(&TokenKind::Def);
        let return_type = if self.scan_typed_name(self.pos).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };

        let (name, _) = self.expect_ident()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_parameters(&TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        self.skip_newlines();

        let body = self.parse_block()?;
        let id = self.next_id();

        Ok(FunctionDecl {
            name,
            params,
            return_type,
            modifiers,
            body,
            span: self.span_from(start),
            id,
        })
    }

    /// Parses a comma separated parameter list up to (not including) `end`.
    pub(crate) fn parse_parameters(&mut self, end: &TokenKind) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();

        if self.check(end) {
            return Ok(params);
        }

        loop {
            params.push(self.parse_parameter()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    fn parse_parameter(&mut self) -> ParseResult<Param> {
        let start = self.current_span();

        while matches!(self.peek_kind(), TokenKind::Modifier(_) | TokenKind::Def) {
            self.advance();
        }

        let ty = if self.scan_type(self.pos).is_some_and(|end| {
            matches!(self.kind_at(end), TokenKind::Ident(_))
        }) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let (name, _) = self.expect_ident()?;

        let default = if self.match_token(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Param::new(name, ty, default, self.span_from(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> SourceFile {
        let mut parser = Parser::new(source).expect("failed to tokenize");
        parser.parse().expect("failed to parse source file")
    }

    #[test]
    fn test_empty_file() {
        let file = parse_source("\n\n// nothing here\n");
        assert!(file.items.is_empty());
    }

    #[test]
    fn test_import() {
        let file = parse_source("import groovy.json.JsonSlurper\nimport static java.lang.Math.*");
        assert_eq!(file.items.len(), 2);
        match &file.items[0] {
            Item::Import(import) => {
                assert_eq!(import.path, "groovy.json.JsonSlurper");
                assert!(!import.is_static);
            }
            other => panic!("expected import, got {:?}", other),
        }
        match &file.items[1] {
            Item::Import(import) => {
                assert!(import.is_static);
                assert!(import.is_star);
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_def_function() {
        let file = parse_source("def greet(String name, times = 2) {\n  return name\n}");
        let func = file.functions().next().expect("function");
        assert_eq!(func.name, "greet");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[0].ty.as_deref(), Some("String"));
        assert!(func.params[1].default.is_some());
    }

    #[test]
    fn test_typed_function() {
        let file = parse_source("static Map<String, List<String>> groups(xs) {\n  [:]\n}");
        let func = file.functions().next().expect("function");
        assert_eq!(func.name, "groups");
        assert_eq!(func.modifiers, vec!["static".to_string()]);
        assert_eq!(func.return_type.as_deref(), Some("Map<String, List<String>>"));
    }

    #[test]
    fn test_command_call_is_not_a_function() {
        let file = parse_source("process FOO {\n  cpus 2\n}");
        assert_eq!(file.functions().count(), 0);
        assert_eq!(file.statements().count(), 1);
    }

    #[test]
    fn test_annotations_are_skipped() {
        let file = parse_source("@CompileStatic\ndef f() { 1 }");
        assert_eq!(file.functions().count(), 1);
    }

    #[test]
    fn test_missing_separator_is_error() {
        let err = Parser::new("a = 1 b = 2").unwrap().parse().unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_lex_error_surfaces_from_new() {
        let err = Parser::new("x = 'unterminated").err().expect("lex error");
        assert!(matches!(err, ParseError::Lex(_)));
    }

    #[test]
    fn test_node_ids_are_unique() {
        use reft_ast::visit::{walk_expr, Visitor};
        use std::collections::HashSet;

        struct Ids(HashSet<NodeId>, bool);
        impl<'ast> Visitor<'ast> for Ids {
            fn visit_expr(&mut self, expr: &'ast Expr) {
                if !self.0.insert(expr.id) {
                    self.1 = false;
                }
                walk_expr(self, expr);
            }
        }

        let file = parse_source("x = \"${a.b} and ${c + d}\"\nfoo(x, [k: v]) { it * 2 }");
        let mut ids = Ids(HashSet::new(), true);
        ids.visit_source_file(&file);
        assert!(ids.1);
        assert!(ids.0.len() > 10);
    }
}
