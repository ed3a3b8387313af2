//! Glues the three pipeline stages together behind one entry point (spec §6).

use crate::ast::Program;
use crate::error::CompileError;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::semantics::Analyzer;
use crate::token::Token;
use crate::transform::transform_program;

/// Tokenizes, parses, transforms, and semantically checks `source`,
/// returning the validated AST on success.
pub fn compile_source(source: &str) -> Result<Program, CompileError> {
    let tokens = tokenize(source)?;
    let cst = Parser::parse_program(&tokens)?;
    log::debug!("parsed {} top-level declarations", cst.decls.len());
    let program = transform_program(cst)?;
    log::debug!(
        "lowered to {} functions, {} global declarations",
        program.functions.len(),
        program.global_decls.len()
    );
    Analyzer::analyze(&program)?;
    log::debug!("semantic analysis passed");
    Ok(program)
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let tokens = Lexer::tokenize(source)?;
    log::trace!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_compiles() {
        compile_source("play { } gameover").unwrap();
    }

    #[test]
    fn empty_void_action_compiles() {
        compile_source("action noop() -> void { }  play { } gameover").unwrap();
    }

    #[test]
    fn syntax_errors_surface_as_compile_error() {
        let err = compile_source("play { ").unwrap_err();
        assert!(matches!(err, CompileError::Syntax(_)));
    }

    #[test]
    fn transform_errors_surface_as_compile_error() {
        let err = compile_source("play { rank: a = b } gameover").unwrap_err();
        assert!(matches!(err, CompileError::Transform(_)));
    }

    #[test]
    fn semantic_errors_surface_as_compile_error() {
        let err = compile_source("play { quit } gameover").unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
    }
}
