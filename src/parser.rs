//! A hand-written recursive-descent parser for the grammar in spec §4.1.
//!
//! The grammar is LALR(1); a single token of lookahead always resolves the
//! next production (chiefly: does an identifier start a call, an lvalue
//! chain, or a bare variable reference), so a table-generated parser buys
//! nothing a direct-coded one doesn't already have, and a hand-written one
//! keeps the precedence ladder (`logic_expr` > `comp_expr` > `sum_expr` >
//! `prod_expr` > `unary_expr`) readable as ordinary function calls.

use crate::cst::*;
use crate::ast::{BinOperator, TypeTag, UnaryOperator};
use crate::error::SyntaxError;
use crate::token::{Position, Token, TokenKind};

pub struct Parser<'a> {
    tokens: &'a [Token],
    idx: usize,
}

type PResult<T> = Result<T, SyntaxError>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Parser { tokens, idx: 0 }
    }

    pub fn parse_program(tokens: &'a [Token]) -> PResult<CstProgram> {
        let mut parser = Parser::new(tokens);
        let program = parser.program()?;
        parser.expect_eof()?;
        Ok(program)
    }

    // --- token-stream helpers ---

    fn current(&self) -> &Token {
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let i = (self.idx + offset).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    fn pos(&self) -> Position {
        self.current().pos
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        tok
    }

    fn expect_eof(&mut self) -> PResult<()> {
        if *self.peek_kind() == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        SyntaxError::unexpected_token(self.pos(), self.peek_kind().to_string(), expected)
    }

    fn eat(&mut self, kind: TokenKind, expected: &str) -> PResult<Position> {
        if *self.peek_kind() == kind {
            Ok(self.advance().pos)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn eat_ident(&mut self) -> PResult<(String, Position)> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let pos = self.advance().pos;
                Ok((name, pos))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn eat_type(&mut self) -> PResult<(TypeTag, Position)> {
        let pos = self.pos();
        let tag = match self.peek_kind() {
            TokenKind::KwRank => TypeTag::Rank,
            TokenKind::KwRate => TypeTag::Rate,
            TokenKind::KwFlag => TypeTag::Flag,
            TokenKind::KwLabel => TypeTag::Label,
            _ => return Err(self.unexpected("a type ('rank', 'rate', 'flag', or 'label')")),
        };
        self.advance();
        Ok((tag, pos))
    }

    fn at_type(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::KwRank | TokenKind::KwRate | TokenKind::KwFlag | TokenKind::KwLabel
        )
    }

    // --- grammar productions ---

    fn program(&mut self) -> PResult<CstProgram> {
        let mut decls = Vec::new();
        while self.at_type() {
            decls.push(self.var_decl()?);
        }
        let mut functions = Vec::new();
        while *self.peek_kind() == TokenKind::KwAction {
            functions.push(self.function_def()?);
        }
        self.eat(TokenKind::KwPlay, "'play'")?;
        let main_block = self.block()?;
        self.eat(TokenKind::KwGameover, "'gameover'")?;
        Ok(CstProgram {
            decls,
            functions,
            main_block,
        })
    }

    fn var_decl(&mut self) -> PResult<CstVarDecl> {
        let (type_name, pos) = self.eat_type()?;
        self.eat(TokenKind::Colon, "':'")?;
        let mut items = vec![self.var_item()?];
        while *self.peek_kind() == TokenKind::Comma {
            self.advance();
            items.push(self.var_item()?);
        }
        Ok(CstVarDecl {
            type_name,
            items,
            pos,
        })
    }

    fn var_item(&mut self) -> PResult<CstVarItem> {
        let (name, pos) = self.eat_ident()?;
        match self.peek_kind() {
            TokenKind::Assign => {
                self.advance();
                let init = self.expr()?;
                Ok(CstVarItem {
                    name,
                    pos,
                    init: Some(init),
                    chain: None,
                })
            }
            TokenKind::Equals => {
                self.advance();
                let chain = self.var_item()?;
                Ok(CstVarItem {
                    name,
                    pos,
                    init: None,
                    chain: Some(Box::new(chain)),
                })
            }
            _ => Ok(CstVarItem {
                name,
                pos,
                init: None,
                chain: None,
            }),
        }
    }

    fn function_def(&mut self) -> PResult<CstFunctionDef> {
        let pos = self.eat(TokenKind::KwAction, "'action'")?;
        let (name, _) = self.eat_ident()?;
        self.eat(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if *self.peek_kind() != TokenKind::RParen {
            params.push(self.param()?);
            while *self.peek_kind() == TokenKind::Comma {
                self.advance();
                params.push(self.param()?);
            }
        }
        self.eat(TokenKind::RParen, "')'")?;
        self.eat(TokenKind::Arrow, "'->'")?;
        let ret_type = self.return_type()?;
        let body = self.block()?;
        Ok(CstFunctionDef {
            name,
            params,
            ret_type,
            body,
            pos,
        })
    }

    fn param(&mut self) -> PResult<CstParam> {
        let (type_name, pos) = self.eat_type()?;
        let (name, _) = self.eat_ident()?;
        Ok(CstParam {
            type_name,
            name,
            pos,
        })
    }

    fn return_type(&mut self) -> PResult<CstReturnType> {
        if *self.peek_kind() == TokenKind::KwVoid {
            self.advance();
            Ok(CstReturnType::Void)
        } else {
            let (tag, _) = self.eat_type()?;
            Ok(CstReturnType::Type(tag))
        }
    }

    fn block(&mut self) -> PResult<CstBlock> {
        let pos = self.eat(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace {
            stmts.push(self.stmt()?);
        }
        self.eat(TokenKind::RBrace, "'}'")?;
        Ok(CstBlock { stmts, pos })
    }

    fn stmt(&mut self) -> PResult<CstStmt> {
        match self.peek_kind() {
            _ if self.at_type() => Ok(CstStmt::VarDecl(self.var_decl()?)),
            TokenKind::KwDrop => self.output_stat(),
            TokenKind::KwReward => self.return_stat(),
            TokenKind::KwQuit => {
                let pos = self.advance().pos;
                Ok(CstStmt::Break(pos))
            }
            TokenKind::KwChoice => self.if_stat(),
            TokenKind::KwStay => self.while_stat(),
            TokenKind::KwLoop => self.for_stat(),
            TokenKind::Ident(_) if *self.peek_at(1) == TokenKind::LParen => self.func_call_stmt(),
            TokenKind::Ident(_) => self.assign_or_input_stat(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn lvalue(&mut self) -> PResult<CstLvalue> {
        let (name, pos) = self.eat_ident()?;
        if *self.peek_kind() == TokenKind::Equals {
            self.advance();
            let chain = self.lvalue()?;
            Ok(CstLvalue {
                name,
                pos,
                chain: Some(Box::new(chain)),
            })
        } else {
            Ok(CstLvalue {
                name,
                pos,
                chain: None,
            })
        }
    }

    fn lvalue_list(&mut self) -> PResult<Vec<CstLvalue>> {
        let mut groups = vec![self.lvalue()?];
        while *self.peek_kind() == TokenKind::Comma {
            self.advance();
            groups.push(self.lvalue()?);
        }
        Ok(groups)
    }

    fn starts_expr(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::IntConst(_)
                | TokenKind::RealConst(_)
                | TokenKind::StringConst(_)
                | TokenKind::Ident(_)
                | TokenKind::KwTrue
                | TokenKind::KwFalse
                | TokenKind::LParen
                | TokenKind::Bang
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::OutDeref
        )
    }

    fn assign_or_input_stat(&mut self) -> PResult<CstStmt> {
        let groups = self.lvalue_list()?;
        let pos = self.eat(TokenKind::Assign, "'<--'")?;
        if *self.peek_kind() == TokenKind::KwGrab {
            self.advance();
            let prompt = if self.starts_expr() {
                Some(self.expr()?)
            } else {
                None
            };
            Ok(CstStmt::Input {
                groups,
                prompt,
                pos,
            })
        } else {
            let expr = self.expr()?;
            Ok(CstStmt::Assign { groups, expr, pos })
        }
    }

    fn output_stat(&mut self) -> PResult<CstStmt> {
        let pos = self.eat(TokenKind::KwDrop, "'drop'")?;
        let expr = self.expr()?;
        Ok(CstStmt::Output { expr, pos })
    }

    fn return_stat(&mut self) -> PResult<CstStmt> {
        let pos = self.eat(TokenKind::KwReward, "'reward'")?;
        let value = if *self.peek_kind() == TokenKind::KwVoid {
            self.advance();
            CstReturnValue::Void
        } else {
            CstReturnValue::Expr(self.expr()?)
        };
        Ok(CstStmt::Return { value, pos })
    }

    fn if_stat(&mut self) -> PResult<CstStmt> {
        let pos = self.eat(TokenKind::KwChoice, "'choice'")?;
        self.eat(TokenKind::LParen, "'('")?;
        let cond = self.expr()?;
        self.eat(TokenKind::RParen, "')'")?;
        self.eat(TokenKind::Arrow, "'->'")?;
        let then_block = self.block()?;

        let mut elifs = Vec::new();
        while *self.peek_kind() == TokenKind::KwRetry {
            let epos = self.advance().pos;
            self.eat(TokenKind::LParen, "'('")?;
            let econd = self.expr()?;
            self.eat(TokenKind::RParen, "')'")?;
            self.eat(TokenKind::Arrow, "'->'")?;
            let eblock = self.block()?;
            elifs.push(CstElif {
                cond: econd,
                block: eblock,
                pos: epos,
            });
        }

        let else_block = if *self.peek_kind() == TokenKind::KwFail {
            self.advance();
            self.eat(TokenKind::Arrow, "'->'")?;
            Some(self.block()?)
        } else {
            None
        };

        Ok(CstStmt::If(CstIf {
            cond,
            then_block,
            elifs,
            else_block,
            pos,
        }))
    }

    fn while_stat(&mut self) -> PResult<CstStmt> {
        let pos = self.eat(TokenKind::KwStay, "'stay'")?;
        self.eat(TokenKind::LParen, "'('")?;
        let cond = self.expr()?;
        self.eat(TokenKind::RParen, "')'")?;
        self.eat(TokenKind::Arrow, "'->'")?;
        let block = self.block()?;
        Ok(CstStmt::While { cond, block, pos })
    }

    fn for_stat(&mut self) -> PResult<CstStmt> {
        let pos = self.eat(TokenKind::KwLoop, "'loop'")?;
        self.eat(TokenKind::LParen, "'('")?;
        let init_groups = self.lvalue_list()?;
        self.eat(TokenKind::Assign, "'<--'")?;
        let init_expr = self.expr()?;
        self.eat(TokenKind::Semi, "';'")?;
        let cond = self.expr()?;
        self.eat(TokenKind::Semi, "';'")?;
        let update = self.for_update()?;
        self.eat(TokenKind::RParen, "')'")?;
        self.eat(TokenKind::Arrow, "'->'")?;
        let block = self.block()?;
        Ok(CstStmt::For {
            init_groups,
            init_expr,
            cond,
            update,
            block,
            pos,
        })
    }

    /// `(assign_stmt | expr)`: an identifier followed by `=` or `,` before
    /// `<--` is an assignment chain; anything else is a plain expression
    /// (this also covers a bare identifier used as an expression, since a
    /// trailing `<--` is what distinguishes the two).
    fn for_update(&mut self) -> PResult<CstForUpdate> {
        if let TokenKind::Ident(_) = self.peek_kind() {
            let save = self.idx;
            if let Ok(groups) = self.lvalue_list() {
                if *self.peek_kind() == TokenKind::Assign {
                    let pos = self.advance().pos;
                    let expr = self.expr()?;
                    return Ok(CstForUpdate::Assign { groups, expr, pos });
                }
            }
            self.idx = save;
        }
        Ok(CstForUpdate::Expr(self.expr()?))
    }

    fn func_call_stmt(&mut self) -> PResult<CstStmt> {
        let (name, pos) = self.eat_ident()?;
        self.eat(TokenKind::LParen, "'('")?;
        let args = self.arg_list()?;
        self.eat(TokenKind::RParen, "')'")?;
        Ok(CstStmt::FuncCall { name, args, pos })
    }

    fn arg_list(&mut self) -> PResult<Vec<CstExpr>> {
        let mut args = Vec::new();
        if *self.peek_kind() != TokenKind::RParen {
            args.push(self.expr()?);
            while *self.peek_kind() == TokenKind::Comma {
                self.advance();
                args.push(self.expr()?);
            }
        }
        Ok(args)
    }

    // --- expressions, by precedence layer ---

    fn expr(&mut self) -> PResult<CstExpr> {
        self.logic_expr()
    }

    fn logic_expr(&mut self) -> PResult<CstExpr> {
        let mut left = self.comp_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::AndAnd => BinOperator::And,
                TokenKind::OrOr => BinOperator::Or,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.comp_expr()?;
            left = CstExpr::Bin(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn comp_expr(&mut self) -> PResult<CstExpr> {
        let mut left = self.sum_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOperator::Eq,
                TokenKind::NotEq => BinOperator::Neq,
                TokenKind::Lt => BinOperator::Lt,
                TokenKind::Lte => BinOperator::Lte,
                TokenKind::Gt => BinOperator::Gt,
                TokenKind::Gte => BinOperator::Gte,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.sum_expr()?;
            left = CstExpr::Bin(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn sum_expr(&mut self) -> PResult<CstExpr> {
        let mut left = self.prod_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOperator::Add,
                TokenKind::Minus => BinOperator::Sub,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.prod_expr()?;
            left = CstExpr::Bin(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn prod_expr(&mut self) -> PResult<CstExpr> {
        let mut left = self.unary_expr()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOperator::Mul,
                TokenKind::Slash => BinOperator::Div,
                TokenKind::Percent => BinOperator::Mod,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.unary_expr()?;
            left = CstExpr::Bin(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> PResult<CstExpr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Neg,
            TokenKind::Plus => UnaryOperator::Pos,
            TokenKind::OutDeref => UnaryOperator::OutDeref,
            _ => return self.base_expr(),
        };
        let pos = self.advance().pos;
        let operand = self.unary_expr()?;
        Ok(CstExpr::Unary(op, Box::new(operand), pos))
    }

    fn base_expr(&mut self) -> PResult<CstExpr> {
        let pos = self.pos();
        match self.peek_kind().clone() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.eat(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::IntConst(v) => {
                self.advance();
                Ok(CstExpr::Int(v, pos))
            }
            TokenKind::RealConst(v) => {
                self.advance();
                Ok(CstExpr::Real(v, pos))
            }
            TokenKind::StringConst(s) => {
                self.advance();
                Ok(CstExpr::Str(s, pos))
            }
            TokenKind::KwTrue => {
                self.advance();
                Ok(CstExpr::Bool(true, pos))
            }
            TokenKind::KwFalse => {
                self.advance();
                Ok(CstExpr::Bool(false, pos))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if *self.peek_kind() == TokenKind::LParen {
                    self.advance();
                    let args = self.arg_list()?;
                    self.eat(TokenKind::RParen, "')'")?;
                    Ok(CstExpr::Call(name, args, pos))
                } else {
                    Ok(CstExpr::Var(name, pos))
                }
            }
            _ => Err(self.unexpected(
                "an expression (literal, identifier, function call, or parenthesized expression)",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> CstProgram {
        let tokens = Lexer::tokenize(src).expect("lex ok");
        Parser::parse_program(&tokens).expect("parse ok")
    }

    #[test]
    fn empty_program() {
        let p = parse("play { } gameover");
        assert!(p.decls.is_empty());
        assert!(p.functions.is_empty());
        assert!(p.main_block.stmts.is_empty());
    }

    #[test]
    fn arithmetic_precedence() {
        let p = parse("rank: x  play { x <-- 1 + 2 * 3 } gameover");
        match &p.main_block.stmts[0] {
            CstStmt::Assign { expr, .. } => match expr {
                CstExpr::Bin(BinOperator::Add, left, right, _) => {
                    assert!(matches!(**left, CstExpr::Int(1, _)));
                    assert!(matches!(**right, CstExpr::Bin(BinOperator::Mul, _, _, _)));
                }
                other => panic!("unexpected expr {other:?}"),
            },
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn declaration_chain() {
        let p = parse("rank: a = b = c <-- 10  play { } gameover");
        let items = &p.decls[0].items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "a");
        assert!(items[0].chain.is_some());
    }

    #[test]
    fn if_elif_else_shape() {
        let p = parse(
            "flag: f  play { choice (f) -> { drop \"a\" } retry (f) -> { drop \"b\" } fail -> { drop \"c\" } } gameover",
        );
        match &p.main_block.stmts[0] {
            CstStmt::If(node) => {
                assert_eq!(node.elifs.len(), 1);
                assert!(node.else_block.is_some());
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn unexpected_keyword_is_a_syntax_error() {
        let tokens = Lexer::tokenize("play { print \"hi\" } gameover").unwrap();
        let err = Parser::parse_program(&tokens).unwrap_err();
        assert!(matches!(err, SyntaxError::UnexpectedToken { .. }));
    }

    #[test]
    fn missing_closing_brace_is_a_syntax_error() {
        let tokens = Lexer::tokenize("play { rank: x gameover").unwrap();
        assert!(Parser::parse_program(&tokens).is_err());
    }

    #[test]
    fn for_loop_roundtrip() {
        let p = parse("rank: i  play { loop (i <-- 0; i < 10; i <-- i + 1) -> { } } gameover");
        match &p.main_block.stmts[0] {
            CstStmt::For { update, .. } => {
                assert!(matches!(update, CstForUpdate::Assign { .. }));
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn output_dereference_parses_anywhere() {
        let p = parse("rank: x  play { x <-- -->x } gameover");
        match &p.main_block.stmts[0] {
            CstStmt::Assign { expr, .. } => {
                assert!(matches!(expr, CstExpr::Unary(UnaryOperator::OutDeref, _, _)));
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }
}
