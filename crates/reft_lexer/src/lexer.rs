//! The lexer implementation.

use crate::{GStringPart, LexError, LexResult, Span, Token, TokenKind};
use std::str::Chars;

/// The flavours of string literal Groovy supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quote {
    Single,
    TripleSingle,
    Double,
    TripleDouble,
    Slashy,
    DollarSlashy,
}

impl Quote {
    fn interpolates(self) -> bool {
        matches!(
            self,
            Quote::Double | Quote::TripleDouble | Quote::Slashy | Quote::DollarSlashy
        )
    }

    fn multiline(self) -> bool {
        !matches!(self, Quote::Single | Quote::Double)
    }

    fn escapes(self) -> bool {
        matches!(
            self,
            Quote::Single | Quote::TripleSingle | Quote::Double | Quote::TripleDouble
        )
    }
}

/// A position captured at the start of a token.
#[derive(Clone, Copy)]
struct Mark {
    pos: u32,
    line: u32,
    column: u32,
}

/// The lexer for Nextflow source code.
///
/// Tokens are produced lazily, either through [`Lexer::next_token`] or the
/// `Iterator` impl. After the first error or `Eof` the iterator is exhausted.
pub struct Lexer<'a> {
    /// The source code being lexed.
    source: &'a str,
    /// Iterator over source characters.
    chars: Chars<'a>,
    /// Current byte position in `source`.
    pos: u32,
    /// Byte offset of `source` inside the enclosing file.
    offset: u32,
    /// Current line, counting from 1.
    line: u32,
    /// Current column, counting from 1.
    column: u32,
    /// The character at the current position (None if at end).
    current: Option<char>,
    /// Open brackets, innermost last.
    brackets: Vec<char>,
    /// The last token handed out.
    last: Option<TokenKind>,
    /// Lexing the body of a `${...}` interpolation: newlines never terminate.
    embedded: bool,
    /// Set once `Eof` or an error has been produced.
    halted: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_origin(source, Span::new(0, 0, 1, 1), false)
    }

    /// Creates a lexer for the text of an interpolated expression.
    ///
    /// `origin` is where that text starts inside the file, so spans of the
    /// produced tokens point into the file rather than into `source`.
    pub fn embedded(source: &'a str, origin: Span) -> Self {
        Self::with_origin(source, origin, true)
    }

    fn with_origin(source: &'a str, origin: Span, embedded: bool) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            offset: origin.start,
            line: origin.line.max(1),
            column: origin.column.max(1),
            current,
            brackets: Vec::new(),
            last: None,
            embedded,
            halted: false,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> LexResult<Token> {
        if let Some(newline) = self.skip_trivia()? {
            return Ok(newline);
        }

        let start = self.mark();

        let kind = match self.current {
            None => TokenKind::Eof,

            Some('$') if self.peek_next() == Some('/') => self.lex_dollar_slashy(start)?,

            Some(c) if is_ident_start(c) => self.lex_ident_or_keyword(),

            Some(c) if c.is_ascii_digit() => self.lex_number(start)?,

            Some('"') => self.lex_double_quoted(start)?,

            Some('\'') => self.lex_single_quoted(start)?,

            Some('/') if !self.last_ends_operand() => self.lex_slashy(start)?,

            Some(c) => self.lex_punctuation(c, start)?,
        };

        match kind {
            TokenKind::LParen => self.brackets.push('('),
            TokenKind::LBracket => self.brackets.push('['),
            TokenKind::LBrace => self.brackets.push('{'),
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                self.brackets.pop();
            }
            _ => {}
        }

        let span = self.span_from(start);
        self.last = Some(kind.clone());
        Ok(Token::new(kind, span))
    }

    /// Tokenizes the entire source and returns all tokens, ending with `Eof`.
    pub fn tokenize(self) -> LexResult<Vec<Token>> {
        self.collect()
    }

    /// Advances to the next character and returns the current one.
    fn advance(&mut self) -> Option<char> {
        let current = self.current;
        if let Some(c) = current {
            self.pos += c.len_utf8() as u32;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.current = self.chars.next();
        }
        current
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Returns the character `n` places after the current one.
    fn peek_nth(&self, n: usize) -> Option<char> {
        if n == 0 {
            return self.current;
        }
        self.chars.clone().nth(n - 1)
    }

    /// Returns true if the current character matches the expected one.
    fn check(&self, expected: char) -> bool {
        self.current == Some(expected)
    }

    /// Advances if the current character matches the expected one.
    fn match_char(&mut self, expected: char) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn span_from(&self, mark: Mark) -> Span {
        Span::new(
            self.offset + mark.pos,
            self.offset + self.pos,
            mark.line,
            mark.column,
        )
    }

    fn last_ends_operand(&self) -> bool {
        self.last.as_ref().is_some_and(|k| k.ends_operand())
    }

    /// Skips whitespace and comments. Returns a `Newline` token if a line
    /// break was crossed and it terminates a statement.
    fn skip_trivia(&mut self) -> LexResult<Option<Token>> {
        let mut newline: Option<Mark> = None;

        loop {
            match self.current {
                Some(' ' | '\t' | '\r' | '\u{feff}' | '\u{c}') => {
                    self.advance();
                }
                Some('\\') if self.peek_next() == Some('\n') => {
                    // Explicit line continuation.
                    self.advance();
                    self.advance();
                }
                Some('\\') if self.peek_next() == Some('\r') && self.peek_nth(2) == Some('\n') => {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                Some('\n') => {
                    if newline.is_none() {
                        newline = Some(self.mark());
                    }
                    self.advance();
                }
                Some('#') if self.pos == 0 && self.peek_next() == Some('!') => {
                    // Shebang line
                    while self.current.is_some() && self.current != Some('\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_next() == Some('/') => {
                    // Single-line comment
                    while self.current.is_some() && self.current != Some('\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    // Multi-line comment
                    let start = self.mark();
                    self.advance(); // /
                    self.advance(); // *
                    loop {
                        match (self.current, self.peek_next()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some('\n'), _) => {
                                if newline.is_none() {
                                    newline = Some(start);
                                }
                                self.advance();
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => {
                                return Err(LexError::UnterminatedComment {
                                    span: self.span_from(start),
                                });
                            }
                        }
                    }
                }
                _ => break,
            }
        }

        match newline {
            Some(mark) if self.newline_is_significant() => {
                let span = Span::new(
                    self.offset + mark.pos,
                    self.offset + mark.pos + 1,
                    mark.line,
                    mark.column,
                );
                self.last = Some(TokenKind::Newline);
                Ok(Some(Token::new(TokenKind::Newline, span)))
            }
            _ => Ok(None),
        }
    }

    /// Decides whether a newline just crossed ends the current statement.
    fn newline_is_significant(&self) -> bool {
        if self.embedded {
            return false;
        }
        if matches!(self.brackets.last(), Some('(' | '[')) {
            return false;
        }
        if !self.last.as_ref().is_some_and(|k| k.can_end_statement()) {
            return false;
        }
        !self.continues_previous_line()
    }

    /// Returns true if the upcoming line begins with an operator that
    /// continues the previous expression (`.map {}`, `?: x`, `&& y`).
    fn continues_previous_line(&self) -> bool {
        match (self.current, self.peek_next()) {
            (Some('.'), Some(c)) => c != '.',
            (Some('?'), _) => true,
            (Some(':'), Some(c)) => c != ':',
            (Some('*'), Some('.')) => true,
            (Some('&'), Some('&')) => true,
            (Some('|'), Some('|')) => true,
            _ => false,
        }
    }

    /// Lexes an identifier or keyword.
    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let start = self.pos as usize;

        while let Some(c) = self.current {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.pos as usize;
        let ident = &self.source[start..end];

        TokenKind::keyword(ident).unwrap_or_else(|| TokenKind::Ident(ident.to_string()))
    }

    /// Lexes a number, including hex/binary forms and Groovy type suffixes.
    fn lex_number(&mut self, start: Mark) -> LexResult<TokenKind> {
        if self.check('0') {
            match self.peek_next() {
                Some('x' | 'X') => return self.lex_radix_number(start, 16),
                Some('b' | 'B') => return self.lex_radix_number(start, 2),
                _ => {}
            }
        }

        self.eat_digits();
        let mut is_float = false;

        if self.check('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(); // .
            self.eat_digits();
        }

        if matches!(self.current, Some('e' | 'E')) {
            let signed = matches!(self.peek_next(), Some('+' | '-'))
                && self.peek_nth(2).is_some_and(|c| c.is_ascii_digit());
            if signed || self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance(); // e
                if signed {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        let digits_end = self.pos as usize;

        match self.current {
            Some('l' | 'L' | 'i' | 'I') if !is_float => {
                self.advance();
            }
            Some('g' | 'G') => {
                self.advance();
            }
            Some('d' | 'D' | 'f' | 'F') => {
                is_float = true;
                self.advance();
            }
            _ => {}
        }

        if self.current.is_some_and(is_ident_continue) {
            while self.current.is_some_and(is_ident_continue) {
                self.advance();
            }
            return Err(self.invalid_number(start));
        }

        let text: String = self.source[start.pos as usize..digits_end]
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if !is_float {
            if let Ok(value) = text.parse::<i64>() {
                return Ok(TokenKind::IntLiteral(value));
            }
        }

        text.parse::<f64>()
            .map(TokenKind::FloatLiteral)
            .map_err(|_| self.invalid_number(start))
    }

    fn lex_radix_number(&mut self, start: Mark, radix: u32) -> LexResult<TokenKind> {
        self.advance(); // 0
        self.advance(); // x or b
        let digits_start = self.pos as usize;

        while let Some(c) = self.current {
            if c.is_digit(radix) || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let digits_end = self.pos as usize;
        if matches!(self.current, Some('l' | 'L' | 'i' | 'I' | 'g' | 'G')) {
            self.advance();
        }

        let text: String = self.source[digits_start..digits_end]
            .chars()
            .filter(|c| *c != '_')
            .collect();

        i64::from_str_radix(&text, radix)
            .map(TokenKind::IntLiteral)
            .map_err(|_| self.invalid_number(start))
    }

    fn eat_digits(&mut self) {
        while let Some(c) = self.current {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn invalid_number(&self, start: Mark) -> LexError {
        LexError::InvalidNumber {
            text: self.source[start.pos as usize..self.pos as usize].to_string(),
            span: self.span_from(start),
        }
    }

    fn lex_double_quoted(&mut self, start: Mark) -> LexResult<TokenKind> {
        if self.peek_next() == Some('"') && self.peek_nth(2) == Some('"') {
            self.advance();
            self.advance();
            self.advance();
            return self.lex_string_body(Quote::TripleDouble, start);
        }
        self.advance();
        let kind = self.lex_string_body(Quote::Double, start)?;
        self.reject_adjacent_quote(start)?;
        Ok(kind)
    }

    fn lex_single_quoted(&mut self, start: Mark) -> LexResult<TokenKind> {
        if self.peek_next() == Some('\'') && self.peek_nth(2) == Some('\'') {
            self.advance();
            self.advance();
            self.advance();
            return self.lex_string_body(Quote::TripleSingle, start);
        }
        self.advance();
        let kind = self.lex_string_body(Quote::Single, start)?;
        self.reject_adjacent_quote(start)?;
        Ok(kind)
    }

    fn lex_slashy(&mut self, start: Mark) -> LexResult<TokenKind> {
        self.advance(); // /
        self.lex_string_body(Quote::Slashy, start)
    }

    fn lex_dollar_slashy(&mut self, start: Mark) -> LexResult<TokenKind> {
        self.advance(); // $
        self.advance(); // /
        self.lex_string_body(Quote::DollarSlashy, start)
    }

    /// A quoted string glued to another literal (`"ubuntu"latest""`) is
    /// never meaningful and almost always a quoting mistake.
    fn reject_adjacent_quote(&self, start: Mark) -> LexResult<()> {
        let glued = match self.current {
            Some('"' | '\'') => true,
            Some(c) => is_ident_continue(c) && c != '$',
            None => false,
        };
        if !glued {
            return Ok(());
        }
        let context = match &self.last {
            Some(TokenKind::Ident(name)) => name.clone(),
            _ => "string literal".to_string(),
        };
        Err(LexError::TooManyQuotes {
            context,
            span: self.span_from(start),
        })
    }

    fn at_closing(&self, quote: Quote) -> bool {
        match quote {
            Quote::Single => self.check('\''),
            Quote::Double => self.check('"'),
            Quote::TripleSingle => {
                self.check('\'') && self.peek_next() == Some('\'') && self.peek_nth(2) == Some('\'')
            }
            Quote::TripleDouble => {
                self.check('"') && self.peek_next() == Some('"') && self.peek_nth(2) == Some('"')
            }
            Quote::Slashy => self.check('/'),
            Quote::DollarSlashy => self.check('/') && self.peek_next() == Some('$'),
        }
    }

    fn consume_closing(&mut self, quote: Quote) {
        let width = match quote {
            Quote::Single | Quote::Double | Quote::Slashy => 1,
            Quote::DollarSlashy => 2,
            Quote::TripleSingle | Quote::TripleDouble => 3,
        };
        for _ in 0..width {
            self.advance();
        }
    }

    /// Lexes the body of a string literal up to and including its closing
    /// delimiter. The opening delimiter has already been consumed.
    fn lex_string_body(&mut self, quote: Quote, start: Mark) -> LexResult<TokenKind> {
        let mut parts = Vec::new();
        let mut text = String::new();

        loop {
            if self.at_closing(quote) {
                self.consume_closing(quote);
                break;
            }

            match self.current {
                None => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                Some('\n') if !quote.multiline() => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                Some('\\') if quote.escapes() => self.lex_escape(&mut text, start)?,
                Some('\\') if quote == Quote::Slashy && self.peek_next() == Some('/') => {
                    self.advance();
                    self.advance();
                    text.push('/');
                }
                Some('$')
                    if quote == Quote::DollarSlashy
                        && matches!(self.peek_next(), Some('/' | '$')) =>
                {
                    self.advance();
                    if let Some(c) = self.advance() {
                        text.push(c);
                    }
                }
                Some('$') if quote.interpolates() => match self.peek_next() {
                    Some('{') => {
                        if !text.is_empty() {
                            parts.push(GStringPart::Text(std::mem::take(&mut text)));
                        }
                        parts.push(self.lex_braced_interpolation(start)?);
                    }
                    Some(c) if c.is_alphabetic() || c == '_' => {
                        if !text.is_empty() {
                            parts.push(GStringPart::Text(std::mem::take(&mut text)));
                        }
                        parts.push(self.lex_path_interpolation());
                    }
                    _ => {
                        self.advance();
                        text.push('$');
                    }
                },
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }

        if parts.is_empty() {
            return Ok(TokenKind::StringLiteral(text));
        }
        if !text.is_empty() {
            parts.push(GStringPart::Text(text));
        }
        Ok(TokenKind::GString(parts))
    }

    /// Lexes a backslash escape inside a quoted string.
    fn lex_escape(&mut self, text: &mut String, start: Mark) -> LexResult<()> {
        let escape_start = self.mark();
        self.advance(); // \

        let Some(c) = self.current else {
            return Err(LexError::UnterminatedString {
                span: self.span_from(start),
            });
        };

        let value = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            's' => ' ',
            '\\' | '\'' | '"' | '$' => c,
            '\n' => {
                self.advance();
                return Ok(());
            }
            'u' => {
                self.advance();
                let mut code = 0u32;
                for _ in 0..4 {
                    match self.current.and_then(|h| h.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            self.advance();
                        }
                        None => {
                            return Err(LexError::InvalidEscape {
                                escape: 'u',
                                span: self.span_from(escape_start),
                            });
                        }
                    }
                }
                text.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                return Ok(());
            }
            '0'..='7' => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 3 {
                    match self.current.and_then(|o| o.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.advance();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                text.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                return Ok(());
            }
            other => {
                self.advance();
                return Err(LexError::InvalidEscape {
                    escape: other,
                    span: self.span_from(escape_start),
                });
            }
        };

        self.advance();
        text.push(value);
        Ok(())
    }

    /// Lexes `${ ... }`, capturing the expression text for the parser.
    fn lex_braced_interpolation(&mut self, start: Mark) -> LexResult<GStringPart> {
        self.advance(); // $
        self.advance(); // {
        let expr_start = self.mark();
        self.skip_balanced_braces(start)?;
        let source = self.source[expr_start.pos as usize..self.pos as usize].to_string();
        let span = self.span_from(expr_start);
        self.advance(); // }
        Ok(GStringPart::Expr { source, span })
    }

    /// Skips to the `}` that closes an interpolation, stepping over nested
    /// braces and nested string literals. Stops on the closing brace.
    fn skip_balanced_braces(&mut self, start: Mark) -> LexResult<()> {
        let mut depth = 0usize;
        loop {
            match self.current {
                None => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                Some('}') if depth == 0 => return Ok(()),
                Some('}') => {
                    depth -= 1;
                    self.advance();
                }
                Some('{') => {
                    depth += 1;
                    self.advance();
                }
                Some(q @ ('"' | '\'')) => self.skip_nested_string(q, start)?,
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn skip_nested_string(&mut self, quote: char, start: Mark) -> LexResult<()> {
        let triple = self.peek_next() == Some(quote) && self.peek_nth(2) == Some(quote);
        let width = if triple { 3 } else { 1 };
        for _ in 0..width {
            self.advance();
        }

        loop {
            match self.current {
                None => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('$') if quote == '"' && self.peek_next() == Some('{') => {
                    self.advance();
                    self.advance();
                    self.skip_balanced_braces(start)?;
                    self.advance();
                }
                Some(c) if c == quote => {
                    if !triple {
                        self.advance();
                        return Ok(());
                    }
                    if self.peek_next() == Some(quote) && self.peek_nth(2) == Some(quote) {
                        self.advance();
                        self.advance();
                        self.advance();
                        return Ok(());
                    }
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Lexes `$name` or `$name.path.to.prop`.
    fn lex_path_interpolation(&mut self) -> GStringPart {
        self.advance(); // $
        let expr_start = self.mark();

        loop {
            while self.current.is_some_and(|c| c.is_alphanumeric() || c == '_') {
                self.advance();
            }
            let continues = self.check('.')
                && self
                    .peek_next()
                    .is_some_and(|c| c.is_alphabetic() || c == '_');
            if !continues {
                break;
            }
            self.advance(); // .
        }

        let source = self.source[expr_start.pos as usize..self.pos as usize].to_string();
        GStringPart::Expr {
            source,
            span: self.span_from(expr_start),
        }
    }

    /// Lexes punctuation and operators.
    fn lex_punctuation(&mut self, c: char, start: Mark) -> LexResult<TokenKind> {
        self.advance();

        let kind = match c {
            '+' => {
                if self.match_char('+') {
                    TokenKind::PlusPlus
                } else if self.match_char('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('-') {
                    TokenKind::MinusMinus
                } else if self.match_char('=') {
                    TokenKind::MinusEq
                } else if self.match_char('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('*') {
                    if self.match_char('=') {
                        TokenKind::StarStarEq
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.match_char('=') {
                    TokenKind::StarEq
                } else if self.check('.') && self.peek_next() != Some('.') {
                    self.advance();
                    TokenKind::SpreadDot
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.match_char('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.match_char('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.match_char('=') {
                    if self.match_char('~') {
                        TokenKind::RegexMatch
                    } else if self.match_char('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else if self.match_char('~') {
                    TokenKind::RegexFind
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::NotEqEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.match_char('=') {
                    if self.match_char('>') {
                        TokenKind::Spaceship
                    } else {
                        TokenKind::LtEq
                    }
                } else if self.match_char('<') {
                    if self.match_char('=') {
                        TokenKind::ShlEq
                    } else {
                        TokenKind::Shl
                    }
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GtEq
                } else if self.match_char('>') {
                    if self.match_char('>') {
                        if self.match_char('=') {
                            TokenKind::UShrEq
                        } else {
                            TokenKind::UShr
                        }
                    } else if self.match_char('=') {
                        TokenKind::ShrEq
                    } else {
                        TokenKind::Shr
                    }
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::AndAnd
                } else if self.match_char('=') {
                    TokenKind::AndEq
                } else {
                    TokenKind::And
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::OrOr
                } else if self.match_char('=') {
                    TokenKind::OrEq
                } else {
                    TokenKind::Or
                }
            }
            '^' => {
                if self.match_char('=') {
                    TokenKind::CaretEq
                } else {
                    TokenKind::Caret
                }
            }
            '?' => {
                if self.match_char('.') {
                    TokenKind::SafeDot
                } else if self.match_char(':') {
                    TokenKind::Elvis
                } else if self.match_char('=') {
                    TokenKind::ElvisEq
                } else {
                    TokenKind::Question
                }
            }
            '.' => {
                if self.match_char('.') {
                    if self.match_char('<') {
                        TokenKind::DotDotLt
                    } else {
                        TokenKind::DotDot
                    }
                } else if self.match_char('&') {
                    TokenKind::DotAmp
                } else if self.match_char('@') {
                    TokenKind::DotAt
                } else {
                    TokenKind::Dot
                }
            }
            ':' => {
                if self.match_char(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '~' => TokenKind::Tilde,
            '@' => TokenKind::At,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semi,
            _ => {
                return Err(LexError::UnexpectedChar {
                    ch: c,
                    span: self.span_from(start),
                })
            }
        };

        Ok(kind)
    }
}

impl Iterator for Lexer<'_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.kind == TokenKind::Eof => self.halted = true,
            Err(_) => self.halted = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
