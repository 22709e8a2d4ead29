#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Str(String),
    Ident(String),

    // Keywords
    Fn,
    Let,
    True,
    False,
    If,
    Else,
    Return,

    // Operators
    Assign,   // =
    Plus,     // +
    Minus,    // -
    Bang,     // !
    Star,     // *
    Slash,    // /
    Lt,       // <
    Gt,       // >
    EqEq,     // ==
    BangEq,   // !=

    // Punctuation
    Comma,     // ,
    Semicolon, // ;
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]

    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Fn | Self::Let | Self::True | Self::False | Self::If | Self::Else | Self::Return
        )
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "fn"     => TokenKind::Fn,
        "let"    => TokenKind::Let,
        "true"   => TokenKind::True,
        "false"  => TokenKind::False,
        "if"     => TokenKind::If,
        "else"   => TokenKind::Else,
        "return" => TokenKind::Return,
        _        => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
