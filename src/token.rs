//! Lexical tokens produced by the [`crate::lexer`].

use std::fmt;

/// A position in the source text. Lines and columns are both 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn start() -> Position {
        Position { line: 1, col: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// The kind of a token, carrying its scanned value where one exists.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum TokenKind {
    // literals
    IntConst(i64),
    RealConst(f64),
    StringConst(String),
    Ident(String),

    // keywords
    KwRank,
    KwRate,
    KwFlag,
    KwLabel,
    KwVoid,
    KwAction,
    KwPlay,
    KwGameover,
    KwChoice,
    KwRetry,
    KwFail,
    KwStay,
    KwLoop,
    KwGrab,
    KwDrop,
    KwReward,
    KwQuit,
    KwTrue,
    KwFalse,

    // punctuation / operators
    Assign,    // <--
    Equals,    // =
    OutDeref,  // -->
    Arrow,     // ->
    Colon,     // :
    Semi,      // ;
    Comma,     // ,
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,   // ==
    NotEq,  // <>
    Lt,
    Lte,
    Gt,
    Gte,
    AndAnd, // &&
    OrOr,   // ||
    Bang,   // !

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        match self {
            IntConst(v) => write!(f, "integer '{v}'"),
            RealConst(v) => write!(f, "real '{v}'"),
            StringConst(v) => write!(f, "string \"{v}\""),
            Ident(v) => write!(f, "identifier '{v}'"),
            KwRank => write!(f, "'rank'"),
            KwRate => write!(f, "'rate'"),
            KwFlag => write!(f, "'flag'"),
            KwLabel => write!(f, "'label'"),
            KwVoid => write!(f, "'void'"),
            KwAction => write!(f, "'action'"),
            KwPlay => write!(f, "'play'"),
            KwGameover => write!(f, "'gameover'"),
            KwChoice => write!(f, "'choice'"),
            KwRetry => write!(f, "'retry'"),
            KwFail => write!(f, "'fail'"),
            KwStay => write!(f, "'stay'"),
            KwLoop => write!(f, "'loop'"),
            KwGrab => write!(f, "'grab'"),
            KwDrop => write!(f, "'drop'"),
            KwReward => write!(f, "'reward'"),
            KwQuit => write!(f, "'quit'"),
            KwTrue => write!(f, "'true'"),
            KwFalse => write!(f, "'false'"),
            Assign => write!(f, "'<--'"),
            Equals => write!(f, "'='"),
            OutDeref => write!(f, "'-->'"),
            Arrow => write!(f, "'->'"),
            Colon => write!(f, "':'"),
            Semi => write!(f, "';'"),
            Comma => write!(f, "','"),
            LParen => write!(f, "'('"),
            RParen => write!(f, "')'"),
            LBrace => write!(f, "'{{'"),
            RBrace => write!(f, "'}}'"),
            Plus => write!(f, "'+'"),
            Minus => write!(f, "'-'"),
            Star => write!(f, "'*'"),
            Slash => write!(f, "'/'"),
            Percent => write!(f, "'%'"),
            EqEq => write!(f, "'=='"),
            NotEq => write!(f, "'<>'"),
            Lt => write!(f, "'<'"),
            Lte => write!(f, "'<='"),
            Gt => write!(f, "'>'"),
            Gte => write!(f, "'>='"),
            AndAnd => write!(f, "'&&'"),
            OrOr => write!(f, "'||'"),
            Bang => write!(f, "'!'"),
            Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position) -> Token {
        Token { kind, pos }
    }
}
