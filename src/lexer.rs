//! Turns Play source text into a flat token stream.
//!
//! Whitespace and `// ...` line comments are skipped here; everything else
//! in the lexicon of spec.md §4.1 becomes exactly one [`Token`].

use crate::error::SyntaxError;
use crate::token::{Position, Token, TokenKind};

pub struct Lexer<'a> {
    chars: Vec<char>,
    src: &'a str,
    idx: usize,
    line: usize,
    col: usize,
}

fn keyword(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match word {
        "rank" => KwRank,
        "rate" => KwRate,
        "flag" => KwFlag,
        "label" => KwLabel,
        "void" => KwVoid,
        "action" => KwAction,
        "play" => KwPlay,
        "gameover" => KwGameover,
        "choice" => KwChoice,
        "retry" => KwRetry,
        "fail" => KwFail,
        "stay" => KwStay,
        "loop" => KwLoop,
        "grab" => KwGrab,
        "drop" => KwDrop,
        "reward" => KwReward,
        "quit" => KwQuit,
        "true" => KwTrue,
        "false" => KwFalse,
        _ => return None,
    })
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Lexer<'a> {
        Lexer {
            chars: src.chars().collect(),
            src,
            idx: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(src: &'a str) -> Result<Vec<Token>, SyntaxError> {
        let mut lexer = Lexer::new(src);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn pos(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia();
        let start = self.pos();

        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, start));
        };

        if c.is_ascii_digit() {
            return self.lex_number(start);
        }
        if c == '_' || c.is_alphabetic() {
            return Ok(self.lex_ident_or_keyword(start));
        }
        if c == '"' {
            return self.lex_string(start);
        }

        self.lex_operator(start)
    }

    fn lex_ident_or_keyword(&mut self, start: Position) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = keyword(&s).unwrap_or(TokenKind::Ident(s));
        Token::new(kind, start)
    }

    fn lex_number(&mut self, start: Position) -> Result<Token, SyntaxError> {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let mut is_real = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_real = true;
            s.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if is_real {
            let value: f64 = s
                .parse()
                .map_err(|_| SyntaxError::UnexpectedCharacter(start, self.peek().unwrap_or('\0')))?;
            Ok(Token::new(TokenKind::RealConst(value), start))
        } else {
            let value: i64 = s
                .parse()
                .map_err(|_| SyntaxError::UnexpectedCharacter(start, self.peek().unwrap_or('\0')))?;
            Ok(Token::new(TokenKind::IntConst(value), start))
        }
    }

    fn lex_string(&mut self, start: Position) -> Result<Token, SyntaxError> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(SyntaxError::UnterminatedString(start)),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
        Ok(Token::new(TokenKind::StringConst(s), start))
    }

    fn lex_operator(&mut self, start: Position) -> Result<Token, SyntaxError> {
        use TokenKind::*;
        let c = self.advance().unwrap();
        let kind = match c {
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            ':' => Colon,
            ';' => Semi,
            ',' => Comma,
            '+' => Plus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '!' => Bang,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    EqEq
                } else {
                    Equals
                }
            }
            '<' => {
                if self.peek() == Some('-') && self.peek_at(1) == Some('-') {
                    self.advance();
                    self.advance();
                    Assign
                } else if self.peek() == Some('>') {
                    self.advance();
                    NotEq
                } else if self.peek() == Some('=') {
                    self.advance();
                    Lte
                } else {
                    Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Gte
                } else {
                    Gt
                }
            }
            '-' => {
                if self.peek() == Some('-') && self.peek_at(1) == Some('>') {
                    self.advance();
                    self.advance();
                    OutDeref
                } else if self.peek() == Some('>') {
                    self.advance();
                    Arrow
                } else {
                    Minus
                }
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                AndAnd
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                OrOr
            }
            other => return Err(SyntaxError::UnexpectedCharacter(start, other)),
        };
        Ok(Token::new(kind, start))
    }

    /// The raw source text this lexer was built from, for diagnostics.
    pub fn source(&self) -> &'a str {
        self.src
    }
}
