//! Lexical token kinds and the immutable [`Token`] type.

use moonc_core::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Generic
    Id,
    BlockComment,
    InlineComment,
    Eof,

    // Literals
    IntegerLiteral,
    FloatLiteral,

    // Keywords
    If,
    Then,
    Else,
    While,
    Do,
    End,
    Return,
    Integer,
    Float,
    Class,
    Inherits,
    Public,
    Private,
    Local,
    Read,
    Write,
    Main,

    // Operators
    Eq,
    /// `<>`, the lexer's name for "not equal". The parser's AST operator
    /// enum names the same operator `Neq`; both names are preserved
    /// deliberately (see DESIGN.md).
    NeqLex,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Div,
    Mult,
    Or,
    And,
    Not,

    // Punctuation
    OpenPar,
    ClosePar,
    OpenCbr,
    CloseCbr,
    OpenSbr,
    CloseSbr,
    Colon,
    DColon,
    Assign,
    Dot,
    Comma,
    SemiColon,

    // Errors
    InvalidNumber,
    InvalidCharacter,
    InvalidIdentifier,
    DanglingBlockComment,
}

impl TokenKind {
    pub fn is_error(self) -> bool {
        matches!(
            self,
            TokenKind::InvalidNumber
                | TokenKind::InvalidCharacter
                | TokenKind::InvalidIdentifier
                | TokenKind::DanglingBlockComment
        )
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::BlockComment | TokenKind::InlineComment)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenKind::Id => "id",
            TokenKind::BlockComment => "block_cmt",
            TokenKind::InlineComment => "inline_cmt",
            TokenKind::Eof => "eof",
            TokenKind::IntegerLiteral => "integer_literal",
            TokenKind::FloatLiteral => "float_literal",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::End => "end",
            TokenKind::Return => "return",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::Class => "class",
            TokenKind::Inherits => "inherits",
            TokenKind::Public => "public",
            TokenKind::Private => "private",
            TokenKind::Local => "local",
            TokenKind::Read => "read",
            TokenKind::Write => "write",
            TokenKind::Main => "main",
            TokenKind::Eq => "eq",
            TokenKind::NeqLex => "neq",
            TokenKind::Lt => "lt",
            TokenKind::Gt => "gt",
            TokenKind::Lte => "lte",
            TokenKind::Gte => "gte",
            TokenKind::Plus => "plus",
            TokenKind::Minus => "minus",
            TokenKind::Div => "div",
            TokenKind::Mult => "mult",
            TokenKind::Or => "or",
            TokenKind::And => "and",
            TokenKind::Not => "not",
            TokenKind::OpenPar => "open_par",
            TokenKind::ClosePar => "close_par",
            TokenKind::OpenCbr => "open_cbr",
            TokenKind::CloseCbr => "close_cbr",
            TokenKind::OpenSbr => "open_sbr",
            TokenKind::CloseSbr => "close_sbr",
            TokenKind::Colon => "colon",
            TokenKind::DColon => "dcolon",
            TokenKind::Assign => "assign",
            TokenKind::Dot => "dot",
            TokenKind::Comma => "comma",
            TokenKind::SemiColon => "semi_colon",
            TokenKind::InvalidNumber => "Invalid number",
            TokenKind::InvalidCharacter => "Invalid character",
            TokenKind::InvalidIdentifier => "Invalid identifier",
            TokenKind::DanglingBlockComment => "Dangling block comment",
        };
        write!(f, "{s}")
    }
}

/// One scanned lexeme. Immutable once produced; lives only through scanning
/// and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }

    /// Lexeme with control characters escaped for display, matching the
    /// artifact formatters' expectations.
    pub fn display_lexeme(&self) -> String {
        self.lexeme
            .replace('\\', "\\\\")
            .replace('\n', "\\n")
            .replace('\t', "\\t")
            .replace('\r', "\\r")
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kind.is_error() {
            write!(
                f,
                "Lexical Error: {}: \"{}\": line {}, column {}.",
                self.kind,
                self.display_lexeme(),
                self.location.line,
                self.location.column
            )
        } else {
            write!(
                f,
                "[{}, {}, {}]",
                self.kind,
                self.display_lexeme(),
                self.location
            )
        }
    }
}

pub fn lookup_keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "end" => TokenKind::End,
        "return" => TokenKind::Return,
        "integer" => TokenKind::Integer,
        "float" => TokenKind::Float,
        "class" => TokenKind::Class,
        "inherits" => TokenKind::Inherits,
        "public" => TokenKind::Public,
        "private" => TokenKind::Private,
        "local" => TokenKind::Local,
        "read" => TokenKind::Read,
        "write" => TokenKind::Write,
        "main" => TokenKind::Main,
        "or" => TokenKind::Or,
        "and" => TokenKind::And,
        "not" => TokenKind::Not,
        _ => return None,
    })
}
