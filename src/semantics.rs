//! Semantic analysis over the AST (spec §4.3): scoping, typing, numeric
//! promotion, and the contextual-use rules for `quit`, `reward`, and `-->`.
//!
//! Per the design notes, the three ambient flags the source carries as
//! mutable instance state (`in_output`, `loop_depth`,
//! `current_function_ret_type`) are instead threaded as an immutable
//! [`Context`] value, built by push/pop at the relevant AST boundaries; the
//! only mutable state left on [`Analyzer`] is the symbol table itself.

use crate::ast::*;
use crate::error::SemanticError;
use crate::symbol_table::{FuncSignature, SymbolEntry, SymbolTable};
use crate::token::Position;

type SResult<T> = Result<T, SemanticError>;

#[derive(Clone, Copy)]
struct Context {
    loop_depth: usize,
    return_type: Option<ReturnType>,
    in_output: bool,
}

impl Context {
    fn top_level() -> Context {
        Context {
            loop_depth: 0,
            return_type: None,
            in_output: false,
        }
    }

    fn for_function(ret: ReturnType) -> Context {
        Context {
            loop_depth: 0,
            return_type: Some(ret),
            in_output: false,
        }
    }

    fn entering_loop(self) -> Context {
        Context {
            loop_depth: self.loop_depth + 1,
            ..self
        }
    }

    fn entering_output(self) -> Context {
        Context {
            in_output: true,
            ..self
        }
    }
}

fn is_numeric(t: TypeTag) -> bool {
    matches!(t, TypeTag::Rank | TypeTag::Rate)
}

/// `expected == actual` always; `rate <- rank` additionally (spec §4.3).
fn is_compatible(expected: TypeTag, actual: TypeTag) -> bool {
    expected == actual || (expected == TypeTag::Rate && actual == TypeTag::Rank)
}

fn err(pos: &Option<Position>, message: impl Into<String>) -> SemanticError {
    match pos {
        Some(p) => SemanticError::at(*p, message),
        None => SemanticError::new(message),
    }
}

pub struct Analyzer {
    symbols: SymbolTable,
}

impl Analyzer {
    pub fn new() -> Analyzer {
        Analyzer {
            symbols: SymbolTable::new(),
        }
    }

    pub fn analyze(program: &Program) -> SResult<()> {
        let mut analyzer = Analyzer::new();
        analyzer.visit_program(program)
    }

    fn define(&mut self, pos: &Option<Position>, name: &str, entry: SymbolEntry) -> SResult<()> {
        if self.symbols.define(name, entry) {
            Ok(())
        } else {
            Err(err(
                pos,
                format!("Symbol '{name}' already defined in current scope"),
            ))
        }
    }

    fn visit_program(&mut self, program: &Program) -> SResult<()> {
        log::debug!("semantics: visiting {} global declarations", program.global_decls.len());
        for decl in &program.global_decls {
            self.visit_var_decl(decl)?;
        }

        log::debug!("semantics: registering {} function signatures", program.functions.len());
        for fun in &program.functions {
            self.register_function(fun)?;
        }

        for fun in &program.functions {
            self.visit_function(fun)?;
        }

        log::debug!("semantics: visiting main block");
        self.visit_block(&program.main_block, Context::top_level())
    }

    fn register_function(&mut self, fun: &Fun) -> SResult<()> {
        let sig = FuncSignature {
            params: fun.params.iter().map(|p| p.type_name).collect(),
            ret: match fun.ret_type {
                ReturnType::Type(t) => Some(t),
                ReturnType::Void => None,
            },
        };
        self.define(&fun.pos, &fun.name, SymbolEntry::Func(sig))
    }

    fn visit_function(&mut self, fun: &Fun) -> SResult<()> {
        log::trace!("semantics: entering function '{}'", fun.name);
        self.symbols.push_scope();
        // Collected via `and_then` rather than `?` so a duplicate parameter
        // name (the grammar doesn't forbid `action foo(rank a, rank a)`)
        // still reaches `pop_scope` below instead of leaking the pushed
        // scope onto the stack.
        let result = self.define_params(fun).and_then(|()| {
            self.visit_block(&fun.body, Context::for_function(fun.ret_type))
        });
        self.symbols.pop_scope();
        result
    }

    fn define_params(&mut self, fun: &Fun) -> SResult<()> {
        for param in &fun.params {
            self.define(&param.pos, &param.name, SymbolEntry::Var(param.type_name))?;
        }
        Ok(())
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) -> SResult<()> {
        for item in &decl.items {
            if let Some(init) = &item.init {
                let actual = self.visit_expr(init, Context::top_level())?;
                if !is_compatible(decl.type_name, actual) {
                    return Err(err(
                        &item.pos,
                        format!(
                            "Type mismatch in declaration of '{}': expected {}, got {}",
                            item.name, decl.type_name, actual
                        ),
                    ));
                }
            }
            self.define(&item.pos, &item.name, SymbolEntry::Var(decl.type_name))?;
        }
        Ok(())
    }

    fn visit_block(&mut self, block: &Block, ctx: Context) -> SResult<()> {
        for stmt in &block.statements {
            self.visit_stmt(stmt, ctx)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt, ctx: Context) -> SResult<()> {
        match stmt {
            Stmt::VarDecl(decl) => self.visit_var_decl(decl),
            Stmt::Assign { target, expr, pos } => self.visit_assign(target, expr, pos, ctx),
            Stmt::If {
                cond,
                then_block,
                elifs,
                else_block,
                pos: _,
            } => self.visit_if(cond, then_block, elifs, else_block, ctx),
            Stmt::While { cond, block, pos: _ } => self.visit_while(cond, block, ctx),
            Stmt::For {
                init,
                cond,
                update,
                block,
                pos: _,
            } => self.visit_for(init, cond, update, block, ctx),
            Stmt::Input {
                target_groups,
                prompt,
                pos,
            } => self.visit_input(target_groups, prompt, pos, ctx),
            Stmt::Output { expr, pos: _ } => self.visit_output(expr, ctx),
            Stmt::Return { expr, pos } => self.visit_return(expr, pos, ctx),
            Stmt::Break(pos) => {
                if ctx.loop_depth == 0 {
                    Err(err(pos, "Quit used outside loop"))
                } else {
                    Ok(())
                }
            }
            Stmt::FuncCallStmt { name, args, pos } => {
                // A call used as a statement discards its return value, even
                // for a non-void function (spec §4.3: no warning).
                self.check_func_call(name, args, pos, ctx).map(|_| ())
            }
        }
    }

    fn visit_assign(
        &mut self,
        target: &str,
        expr: &Expr,
        pos: &Option<Position>,
        ctx: Context,
    ) -> SResult<()> {
        let target_type = match self.symbols.lookup(target) {
            None => return Err(err(pos, format!("Variable '{target}' not declared"))),
            Some(SymbolEntry::Func(_)) => {
                return Err(err(pos, format!("Cannot assign to '{target}' which is a func")))
            }
            Some(SymbolEntry::Var(t)) => *t,
        };
        let actual = self.visit_expr(expr, ctx)?;
        if is_compatible(target_type, actual) {
            Ok(())
        } else {
            Err(err(
                pos,
                format!(
                    "Type mismatch in assignment to '{target}': expected {target_type}, got {actual}"
                ),
            ))
        }
    }

    fn visit_if(
        &mut self,
        cond: &Expr,
        then_block: &Block,
        elifs: &[Elif],
        else_block: &Option<Block>,
        ctx: Context,
    ) -> SResult<()> {
        self.require_flag(cond, "If", ctx)?;
        self.visit_block(then_block, ctx)?;
        for elif in elifs {
            self.require_flag(&elif.cond, "Elif", ctx)?;
            self.visit_block(&elif.block, ctx)?;
        }
        if let Some(block) = else_block {
            self.visit_block(block, ctx)?;
        }
        Ok(())
    }

    fn visit_while(&mut self, cond: &Expr, block: &Block, ctx: Context) -> SResult<()> {
        self.require_flag(cond, "While", ctx)?;
        self.visit_block(block, ctx.entering_loop())
    }

    fn visit_for(
        &mut self,
        init: &ForInit,
        cond: &Expr,
        update: &ForUpdate,
        block: &Block,
        ctx: Context,
    ) -> SResult<()> {
        match init {
            ForInit::Stmt(s) => self.visit_stmt(s, ctx)?,
            ForInit::Block(b) => self.visit_block(b, ctx)?,
        }
        self.require_flag(cond, "For", ctx)?;
        match update {
            ForUpdate::Stmt(s) => self.visit_stmt(s, ctx)?,
            ForUpdate::Block(b) => self.visit_block(b, ctx)?,
            ForUpdate::Expr(e) => {
                self.visit_expr(e, ctx)?;
            }
        }
        self.visit_block(block, ctx.entering_loop())
    }

    fn visit_input(
        &mut self,
        target_groups: &[Vec<String>],
        prompt: &Option<Expr>,
        pos: &Option<Position>,
        ctx: Context,
    ) -> SResult<()> {
        if let Some(prompt) = prompt {
            let t = self.visit_expr(prompt, ctx)?;
            if t != TypeTag::Label {
                return Err(err(pos, format!("Input prompt must be 'label', got {t}")));
            }
        }
        for group in target_groups {
            for name in group {
                if self.symbols.lookup(name).is_none() {
                    return Err(err(pos, format!("Input target '{name}' not declared")));
                }
            }
        }
        Ok(())
    }

    fn visit_output(&mut self, expr: &Expr, ctx: Context) -> SResult<()> {
        let t = self.visit_expr(expr, ctx.entering_output())?;
        if t == TypeTag::Label {
            Ok(())
        } else {
            Err(err(&expr.pos(), format!("Output requires 'label', got {t}")))
        }
    }

    fn visit_return(&mut self, expr: &Option<Expr>, pos: &Option<Position>, ctx: Context) -> SResult<()> {
        let Some(ret_type) = ctx.return_type else {
            return Err(err(pos, "Return statement outside function"));
        };
        match (ret_type, expr) {
            (ReturnType::Void, None) => Ok(()),
            (ReturnType::Void, Some(e)) => {
                let actual = self.visit_expr(e, ctx)?;
                Err(err(
                    pos,
                    format!("Invalid return type: expected void, got {actual}"),
                ))
            }
            (ReturnType::Type(t), Some(e)) => {
                let actual = self.visit_expr(e, ctx)?;
                if is_compatible(t, actual) {
                    Ok(())
                } else {
                    Err(err(
                        pos,
                        format!("Invalid return type: expected {t}, got {actual}"),
                    ))
                }
            }
            (ReturnType::Type(t), None) => Err(err(
                pos,
                format!("Return value expected for non-void function (expected {t})"),
            )),
        }
    }

    fn require_flag(&mut self, cond: &Expr, context_name: &str, ctx: Context) -> SResult<()> {
        let t = self.visit_expr(cond, ctx)?;
        if t == TypeTag::Flag {
            Ok(())
        } else {
            Err(err(
                &cond.pos(),
                format!("{context_name} condition must be 'flag', got {t}"),
            ))
        }
    }

    fn visit_expr(&mut self, expr: &Expr, ctx: Context) -> SResult<TypeTag> {
        match expr {
            Expr::Literal { type_tag, .. } => Ok(*type_tag),
            Expr::VarAccess { name, pos } => match self.symbols.lookup(name) {
                Some(SymbolEntry::Var(t)) => Ok(*t),
                Some(SymbolEntry::Func(_)) => {
                    Err(err(pos, format!("'{name}' is a function, not a variable")))
                }
                None => Err(err(pos, format!("Variable '{name}' not defined"))),
            },
            Expr::BinOp {
                op,
                left,
                right,
                pos,
            } => self.visit_binop(*op, left, right, pos, ctx),
            Expr::UnaryOp { op, expr, pos } => self.visit_unary(*op, expr, pos, ctx),
            Expr::FunCallExpr { name, args, pos } => {
                match self.check_func_call(name, args, pos, ctx)? {
                    Some(t) => Ok(t),
                    None => Err(err(
                        pos,
                        format!("Function '{name}' returns void and cannot be used as an expression"),
                    )),
                }
            }
        }
    }

    fn visit_binop(
        &mut self,
        op: BinOperator,
        left: &Expr,
        right: &Expr,
        pos: &Option<Position>,
        ctx: Context,
    ) -> SResult<TypeTag> {
        let lt = self.visit_expr(left, ctx)?;
        let rt = self.visit_expr(right, ctx)?;
        use BinOperator::*;
        match op {
            And | Or => {
                if lt == TypeTag::Flag && rt == TypeTag::Flag {
                    Ok(TypeTag::Flag)
                } else {
                    Err(err(
                        pos,
                        format!("Logical operator '{op}' requires flag operands, got {lt} and {rt}"),
                    ))
                }
            }
            Eq | Neq | Lt | Lte | Gt | Gte => {
                if (is_numeric(lt) && is_numeric(rt)) || lt == rt {
                    Ok(TypeTag::Flag)
                } else {
                    Err(err(
                        pos,
                        format!("Comparison '{op}' types incompatible: {lt} and {rt}"),
                    ))
                }
            }
            Add => {
                if lt == TypeTag::Label || rt == TypeTag::Label {
                    Ok(TypeTag::Label)
                } else if is_numeric(lt) && is_numeric(rt) {
                    Ok(numeric_result(lt, rt))
                } else {
                    Err(err(
                        pos,
                        format!("Operator '+' incompatible types: {lt} and {rt}"),
                    ))
                }
            }
            Sub | Mul | Div | Mod => {
                if is_numeric(lt) && is_numeric(rt) {
                    Ok(numeric_result(lt, rt))
                } else {
                    Err(err(
                        pos,
                        format!("Operator '{op}' requires numeric operands, got {lt} and {rt}"),
                    ))
                }
            }
        }
    }

    fn visit_unary(
        &mut self,
        op: UnaryOperator,
        operand: &Expr,
        pos: &Option<Position>,
        ctx: Context,
    ) -> SResult<TypeTag> {
        match op {
            UnaryOperator::Not => {
                let t = self.visit_expr(operand, ctx)?;
                if t == TypeTag::Flag {
                    Ok(TypeTag::Flag)
                } else {
                    Err(err(pos, format!("Operator '!' requires flag, got {t}")))
                }
            }
            UnaryOperator::Neg | UnaryOperator::Pos => {
                let t = self.visit_expr(operand, ctx)?;
                if is_numeric(t) {
                    Ok(t)
                } else {
                    Err(err(pos, format!("Unary operator '{op}' requires numeric, got {t}")))
                }
            }
            UnaryOperator::OutDeref => {
                if !ctx.in_output {
                    return Err(err(pos, "Operator '-->' can only be used in 'drop' statements"));
                }
                self.visit_expr(operand, ctx)
            }
        }
    }

    fn check_func_call(
        &mut self,
        name: &str,
        args: &[Expr],
        pos: &Option<Position>,
        ctx: Context,
    ) -> SResult<Option<TypeTag>> {
        let sig = match self.symbols.lookup(name) {
            None => return Err(err(pos, format!("Function '{name}' not defined"))),
            Some(SymbolEntry::Var(_)) => {
                return Err(err(pos, format!("'{name}' is not a function")))
            }
            Some(SymbolEntry::Func(sig)) => sig.clone(),
        };
        if args.len() != sig.params.len() {
            return Err(err(
                pos,
                format!(
                    "Function '{name}' expects {} args, got {}",
                    sig.params.len(),
                    args.len()
                ),
            ));
        }
        for (i, (arg, expected)) in args.iter().zip(sig.params.iter()).enumerate() {
            let actual = self.visit_expr(arg, ctx)?;
            if !is_compatible(*expected, actual) {
                return Err(err(
                    pos,
                    format!(
                        "Argument {} of '{name}' type mismatch: expected {expected}, got {actual}",
                        i + 1
                    ),
                ));
            }
        }
        Ok(sig.ret)
    }
}

/// `rate` if either operand is `rate`, otherwise `rank` (spec §4.3).
fn numeric_result(a: TypeTag, b: TypeTag) -> TypeTag {
    if a == TypeTag::Rate || b == TypeTag::Rate {
        TypeTag::Rate
    } else {
        TypeTag::Rank
    }
}

impl Default for Analyzer {
    fn default() -> Analyzer {
        Analyzer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::transform::transform_program;
    use pretty_assertions::assert_eq;

    fn analyze_src(src: &str) -> SResult<()> {
        let tokens = Lexer::tokenize(src).expect("lex ok");
        let cst = Parser::parse_program(&tokens).expect("parse ok");
        let program = transform_program(cst).expect("transform ok");
        Analyzer::analyze(&program)
    }

    #[test]
    fn arithmetic_precedence_passes() {
        analyze_src("rank: x  play { x <-- 1 + 2 * 3 } gameover").unwrap();
    }

    #[test]
    fn declaration_chain_all_in_global_scope() {
        analyze_src("rank: a = b = c <-- 10  play { } gameover").unwrap();
    }

    #[test]
    fn output_dereference_misuse_is_rejected() {
        let err = analyze_src("rank: x  play { x <-- -->x } gameover").unwrap_err();
        assert_eq!(err.message, "Operator '-->' can only be used in 'drop' statements");
    }

    #[test]
    fn output_dereference_inside_drop_is_accepted() {
        // `-->x` on a `rank` still fails: `drop` requires `label`, but the
        // operator itself is legal here (no "can only be used" error).
        let err = analyze_src("rank: x  play { drop -->x } gameover").unwrap_err();
        assert!(err.message.contains("Output requires 'label'"));
    }

    #[test]
    fn function_call_type_mismatch_is_rejected() {
        let err = analyze_src(
            "action foo(rank a) -> void { }  play { foo(\"wrong\") } gameover",
        )
        .unwrap_err();
        assert!(err.message.contains("Argument 1 of 'foo' type mismatch"));
    }

    #[test]
    fn if_elif_else_passes() {
        analyze_src(
            "flag: f  play { choice (f) -> { drop \"a\" } retry (f) -> { drop \"b\" } fail -> { drop \"c\" } } gameover",
        )
        .unwrap();
    }

    #[test]
    fn quit_outside_loop_is_rejected() {
        let err = analyze_src("play { quit } gameover").unwrap_err();
        assert_eq!(err.message, "Quit used outside loop");
    }

    #[test]
    fn quit_inside_loop_is_accepted() {
        analyze_src("flag: f  play { stay (f) -> { quit } } gameover").unwrap();
    }

    #[test]
    fn reward_outside_function_is_rejected() {
        let err = analyze_src("play { reward void } gameover").unwrap_err();
        assert_eq!(err.message, "Return statement outside function");
    }

    #[test]
    fn rate_widens_from_rank() {
        analyze_src("rate: r <-- 5  play { } gameover").unwrap();
    }

    #[test]
    fn label_cannot_widen_from_rank() {
        let err = analyze_src("label: s <-- 5  play { } gameover").unwrap_err();
        assert!(err.message.contains("Type mismatch"));
    }

    #[test]
    fn duplicate_global_declaration_is_rejected() {
        let err = analyze_src("rank: x  rank: x  play { } gameover").unwrap_err();
        assert!(err.message.contains("already defined"));
    }

    #[test]
    fn scope_pushed_only_at_function_entry() {
        // `y` is declared inside the loop body; since control-flow blocks
        // don't push a scope, it must still resolve once the loop exits.
        analyze_src(
            "flag: f  rank: z  play { stay (f) -> { rank: y <-- 1 } z <-- y } gameover",
        )
        .unwrap();
    }

    #[test]
    fn string_concat_accepts_numeric_operand() {
        analyze_src("rate: r <-- 3.5  play { drop \"total: \" + r } gameover").unwrap();
    }

    #[test]
    fn duplicate_parameter_name_is_rejected() {
        // The grammar doesn't forbid repeating a parameter name, so this is
        // caught here: `visit_function` must still pop the pushed function
        // scope in this case rather than leaking it (see `define_params`).
        let err =
            analyze_src("action foo(rank a, rank a) -> void { }  play { } gameover").unwrap_err();
        assert!(err.message.contains("already defined"));
    }

    #[test]
    fn function_signature_collides_with_global_var() {
        let err = analyze_src(
            "rank: foo  action foo() -> void { }  play { } gameover",
        )
        .unwrap_err();
        assert!(err.message.contains("already defined"));
    }
}
