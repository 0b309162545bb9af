//! Token definitions for the Groovy subset used by Nextflow.

use crate::Span;
use std::fmt;

/// A token produced by the lexer.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the lexeme this token was read from.
    ///
    /// `source` must be the text the lexer was created with; tokens of
    /// embedded expressions carry file offsets, so pass the whole file.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source
            .get(self.span.start as usize..self.span.end as usize)
            .unwrap_or("")
    }

    /// Returns true if this token can end a statement, so a following
    /// newline acts as a terminator.
    pub fn can_end_statement(&self) -> bool {
        self.kind.can_end_statement()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// One fragment of an interpolated string.
#[derive(Clone, Debug, PartialEq)]
pub enum GStringPart {
    /// Literal text between interpolations, escapes already processed.
    Text(String),
    /// The source of an embedded `${...}` or `$name.path` expression.
    /// `span` locates the expression text inside the file.
    Expr { source: String, span: Span },
}

/// The kind of token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42, 0xFF, 10L)
    IntLiteral(i64),
    /// Float literal (e.g., 3.14, 1e-5, 2.5d)
    FloatLiteral(f64),
    /// String without interpolation ('a', "b", '''c''', /d/)
    StringLiteral(String),
    /// String with `$` interpolation ("${x}", """$y""")
    GString(Vec<GStringPart>),

    // Identifiers
    /// An identifier (e.g., process, meta, _x, $y)
    Ident(String),

    // Keywords
    /// `def`
    Def,
    /// `if`
    If,
    /// `else`
    Else,
    /// `for`
    For,
    /// `in`
    In,
    /// `while`
    While,
    /// `do`
    Do,
    /// `return`
    Return,
    /// `throw`
    Throw,
    /// `try`
    Try,
    /// `catch`
    Catch,
    /// `finally`
    Finally,
    /// `switch`
    Switch,
    /// `case`
    Case,
    /// `default`
    Default,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `assert`
    Assert,
    /// `synchronized`
    Synchronized,
    /// `new`
    New,
    /// `as`
    As,
    /// `instanceof`
    Instanceof,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `import`
    Import,
    /// `this`
    This,
    /// `super`
    Super,
    /// Declaration modifiers (`static`, `final`, `private`, ...)
    Modifier(String),

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    NotEq,
    /// `!==`
    NotEqEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `<=>`
    Spaceship,
    /// `=~`
    RegexFind,
    /// `==~`
    RegexMatch,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Not,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `**=`
    StarStarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `&=`
    AndEq,
    /// `|=`
    OrEq,
    /// `^=`
    CaretEq,
    /// `<<=`
    ShlEq,
    /// `>>=`
    ShrEq,
    /// `>>>=`
    UShrEq,
    /// `?=`
    ElvisEq,
    /// `->`
    Arrow,
    /// `::`
    ColonColon,
    /// `..`
    DotDot,
    /// `..<`
    DotDotLt,
    /// `?`
    Question,
    /// `?:`
    Elvis,
    /// `?.`
    SafeDot,
    /// `*.`
    SpreadDot,
    /// `.&`
    DotAmp,
    /// `.@`
    DotAt,
    /// `@`
    At,

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // Punctuation
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `;`
    Semi,
    /// A statement-terminating newline
    Newline,

    // Special
    /// End of file
    Eof,
}

impl TokenKind {
    /// Returns the keyword for a given identifier, or None if it's not a keyword.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        Some(match ident {
            "def" => TokenKind::Def,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "return" => TokenKind::Return,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "assert" => TokenKind::Assert,
            "synchronized" => TokenKind::Synchronized,
            "new" => TokenKind::New,
            "as" => TokenKind::As,
            "instanceof" => TokenKind::Instanceof,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "import" => TokenKind::Import,
            "this" => TokenKind::This,
            "super" => TokenKind::Super,
            "static" | "final" | "private" | "public" | "protected" | "abstract" => {
                TokenKind::Modifier(ident.to_string())
            }
            _ => return None,
        })
    }

    /// Returns the source spelling of a keyword token, if this is one.
    ///
    /// Groovy lets keywords appear as map keys and property names
    /// (`[default: 1]`, `task.ext.when`), so the parser needs the text back.
    pub fn keyword_text(&self) -> Option<&str> {
        Some(match self {
            TokenKind::Def => "def",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Return => "return",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Assert => "assert",
            TokenKind::Synchronized => "synchronized",
            TokenKind::New => "new",
            TokenKind::As => "as",
            TokenKind::Instanceof => "instanceof",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Import => "import",
            TokenKind::This => "this",
            TokenKind::Super => "super",
            TokenKind::Modifier(m) => m.as_str(),
            _ => return None,
        })
    }

    /// Returns true if a newline after this token terminates a statement.
    pub fn can_end_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::GString(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Returns true if a `/` after this token is a division operator rather
    /// than the start of a slashy string.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::GString(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Returns the string representation of this token kind.
    pub fn as_str(&self) -> &str {
        if let Some(text) = self.keyword_text() {
            return text;
        }
        match self {
            TokenKind::IntLiteral(_) => "integer literal",
            TokenKind::FloatLiteral(_) => "float literal",
            TokenKind::StringLiteral(_) => "string literal",
            TokenKind::GString(_) => "interpolated string",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::EqEqEq => "===",
            TokenKind::NotEq => "!=",
            TokenKind::NotEqEq => "!==",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Spaceship => "<=>",
            TokenKind::RegexFind => "=~",
            TokenKind::RegexMatch => "==~",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Not => "!",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::UShr => ">>>",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::StarStarEq => "**=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AndEq => "&=",
            TokenKind::OrEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::ShlEq => "<<=",
            TokenKind::ShrEq => ">>=",
            TokenKind::UShrEq => ">>>=",
            TokenKind::ElvisEq => "?=",
            TokenKind::Arrow => "->",
            TokenKind::ColonColon => "::",
            TokenKind::DotDot => "..",
            TokenKind::DotDotLt => "..<",
            TokenKind::Question => "?",
            TokenKind::Elvis => "?:",
            TokenKind::SafeDot => "?.",
            TokenKind::SpreadDot => "*.",
            TokenKind::DotAmp => ".&",
            TokenKind::DotAt => ".@",
            TokenKind::At => "@",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Semi => ";",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",
            _ => "keyword",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLiteral(n) => write!(f, "{}", n),
            TokenKind::FloatLiteral(n) => write!(f, "{}", n),
            TokenKind::StringLiteral(s) => write!(f, "'{}'", s),
            TokenKind::GString(_) => write!(f, "interpolated string"),
            TokenKind::Ident(s) => write!(f, "{}", s),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}
