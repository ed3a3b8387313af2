//! The three error kinds that cross the frontend/backend boundary (spec §6),
//! plus [`CompileError`] which unifies them for the pipeline's public API.

use crate::token::Position;
use thiserror::Error;

/// Failures from the lexer or the parser. The lexer only ever produces
/// [`SyntaxError::UnexpectedCharacter`] or [`SyntaxError::UnterminatedString`];
/// the parser only ever produces [`SyntaxError::UnexpectedToken`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("{0}: unexpected character '{1}'")]
    UnexpectedCharacter(Position, char),

    #[error("{0}: unterminated string literal")]
    UnterminatedString(Position),

    #[error("{pos}: unexpected {got}, expected {expected}")]
    UnexpectedToken {
        pos: Position,
        got: String,
        expected: String,
    },
}

impl SyntaxError {
    pub fn unexpected_token(pos: Position, got: impl Into<String>, expected: impl Into<String>) -> SyntaxError {
        SyntaxError::UnexpectedToken {
            pos,
            got: got.into(),
            expected: expected.into(),
        }
    }
}

/// Failures lowering the CST into the AST (spec §4.2). The only case the
/// grammar allows through to this stage is an invalid declaration chain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("Invalid chain: '{name}' cannot be equated to '{linked_name}' without a value assignment")]
    InvalidChain { name: String, linked_name: String },
}

/// A semantic-analysis failure (spec §4.3). The analyzer stops at the first
/// one; there is no multi-error accumulation.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct SemanticError {
    pub message: String,
    pub pos: Option<Position>,
}

impl SemanticError {
    pub fn new(message: impl Into<String>) -> SemanticError {
        SemanticError {
            message: message.into(),
            pos: None,
        }
    }

    pub fn at(pos: Position, message: impl Into<String>) -> SemanticError {
        SemanticError {
            message: message.into(),
            pos: Some(pos),
        }
    }
}

/// The frontend's single public error type: one of the three stage errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),
}
