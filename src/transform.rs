//! Lowers a [`CstProgram`] into the [`Program`] AST (spec §4.2).
//!
//! Each CST shape that exists purely for parsing convenience is normalized
//! away here: declaration and lvalue `=`-chains are flattened, only the last
//! comma-group of an assignment is semantically kept, literals pick up their
//! [`TypeTag`], and `for`'s init/update clauses are folded into plain
//! statements or blocks. A chained assignment (`a = b <-- 10`) has no single
//! AST node of its own, so it lowers to one [`Stmt::Assign`] per name and
//! those statements are spliced into the enclosing block in source order.

use crate::ast::*;
use crate::cst::*;
use crate::error::TransformError;
use crate::token::Position;

type TResult<T> = Result<T, TransformError>;

pub fn transform_program(cst: CstProgram) -> TResult<Program> {
    let global_decls = cst
        .decls
        .into_iter()
        .map(transform_var_decl)
        .collect::<TResult<Vec<_>>>()?;
    let functions = cst
        .functions
        .into_iter()
        .map(transform_function_def)
        .collect::<TResult<Vec<_>>>()?;
    let main_block = transform_block(cst.main_block)?;
    Ok(Program {
        global_decls,
        functions,
        main_block,
    })
}

fn transform_function_def(f: CstFunctionDef) -> TResult<Fun> {
    Ok(Fun {
        name: f.name,
        params: f
            .params
            .into_iter()
            .map(|p| Param {
                type_name: p.type_name,
                name: p.name,
                pos: Some(p.pos),
            })
            .collect(),
        ret_type: match f.ret_type {
            CstReturnType::Type(t) => ReturnType::Type(t),
            CstReturnType::Void => ReturnType::Void,
        },
        body: transform_block(f.body)?,
        pos: Some(f.pos),
    })
}

/// Flattens a declaration's `=`-chain into one [`VarInit`] per name (spec
/// §4.2(a)): `rank: a = b = c <-- 10` becomes three items all initialized to
/// `10`. Only the innermost link of the chain may carry the initializer;
/// every other link must be a bare name linked onward by `=`.
fn transform_var_decl(decl: CstVarDecl) -> TResult<VarDecl> {
    let mut items = Vec::new();
    for item in decl.items {
        flatten_var_item(item, None, &mut items)?;
    }
    Ok(VarDecl {
        type_name: decl.type_name,
        items,
        pos: Some(decl.pos),
    })
}

/// `linked_from` is the name of the link closer to the head of the chain, so
/// an invalid inner item (neither an initializer nor a further link) can be
/// reported against the pair that is actually invalid.
fn flatten_var_item(
    item: CstVarItem,
    linked_from: Option<&str>,
    out: &mut Vec<VarInit>,
) -> TResult<()> {
    match (item.init, item.chain) {
        (Some(init), None) => {
            out.push(VarInit {
                name: item.name,
                init: Some(transform_expr(init)?),
                pos: Some(item.pos),
            });
            Ok(())
        }
        (None, Some(next)) => {
            let start = out.len();
            flatten_var_item(*next, Some(&item.name), out)?;
            let init = out[start].init.clone();
            out.insert(
                start,
                VarInit {
                    name: item.name,
                    init,
                    pos: Some(item.pos),
                },
            );
            Ok(())
        }
        // A bare name with neither an initializer nor a further link is a
        // valid uninitialized declaration (spec §4.2(b)) — unless it's the
        // innermost link of a chain, where the absence of an initializer is
        // exactly what `InvalidChain` reports.
        (None, None) => match linked_from {
            None => {
                out.push(VarInit {
                    name: item.name,
                    init: None,
                    pos: Some(item.pos),
                });
                Ok(())
            }
            Some(outer) => Err(TransformError::InvalidChain {
                name: item.name,
                linked_name: outer.to_string(),
            }),
        },
        (Some(_), Some(next)) => Err(TransformError::InvalidChain {
            name: item.name,
            linked_name: next.name,
        }),
    }
}

fn transform_block(block: CstBlock) -> TResult<Block> {
    let mut statements = Vec::new();
    for stmt in block.stmts {
        statements.extend(transform_stmt(stmt)?);
    }
    Ok(Block {
        statements,
        pos: Some(block.pos),
    })
}

/// Flattens an lvalue `=`-chain (`a = b = c`) into its source-ordered names.
fn lvalue_names(lv: &CstLvalue) -> Vec<String> {
    lv.flatten()
}

/// Keeps only the last comma-group of an assignment's lvalue list (spec
/// §4.2(c)): `a, b <-- 10` declares `a` unused and assigns only `b`'s chain.
fn last_assign_names(groups: &[CstLvalue]) -> Vec<String> {
    groups.last().map(lvalue_names).unwrap_or_default()
}

fn assign_stmts(names: Vec<String>, expr: &Expr, pos: Position) -> Vec<Stmt> {
    names
        .into_iter()
        .map(|target| Stmt::Assign {
            target,
            expr: expr.clone(),
            pos: Some(pos),
        })
        .collect()
}

/// Returns the statements a single CST statement lowers to: one in every
/// case except a chained assignment, which fans out to one [`Stmt::Assign`]
/// per name in the chain.
fn transform_stmt(stmt: CstStmt) -> TResult<Vec<Stmt>> {
    let single = match stmt {
        CstStmt::VarDecl(decl) => Stmt::VarDecl(transform_var_decl(decl)?),
        CstStmt::Assign { groups, expr, pos } => {
            let expr = transform_expr(expr)?;
            let names = last_assign_names(&groups);
            return Ok(assign_stmts(names, &expr, pos));
        }
        CstStmt::Input {
            groups,
            prompt,
            pos,
        } => {
            let target_groups = groups.iter().map(lvalue_names).collect();
            Stmt::Input {
                target_groups,
                prompt: prompt.map(transform_expr).transpose()?,
                pos: Some(pos),
            }
        }
        CstStmt::Output { expr, pos } => Stmt::Output {
            expr: transform_expr(expr)?,
            pos: Some(pos),
        },
        CstStmt::Return { value, pos } => Stmt::Return {
            expr: match value {
                CstReturnValue::Expr(e) => Some(transform_expr(e)?),
                CstReturnValue::Void => None,
            },
            pos: Some(pos),
        },
        CstStmt::Break(pos) => Stmt::Break(Some(pos)),
        CstStmt::If(node) => transform_if(node)?,
        CstStmt::While { cond, block, pos } => Stmt::While {
            cond: transform_expr(cond)?,
            block: transform_block(block)?,
            pos: Some(pos),
        },
        CstStmt::For {
            init_groups,
            init_expr,
            cond,
            update,
            block,
            pos,
        } => transform_for(init_groups, init_expr, cond, update, block, pos)?,
        CstStmt::FuncCall { name, args, pos } => Stmt::FuncCallStmt {
            name,
            args: args
                .into_iter()
                .map(transform_expr)
                .collect::<TResult<_>>()?,
            pos: Some(pos),
        },
    };
    Ok(vec![single])
}

fn transform_if(node: CstIf) -> TResult<Stmt> {
    let elifs = node
        .elifs
        .into_iter()
        .map(|e| {
            Ok(Elif {
                cond: transform_expr(e.cond)?,
                block: transform_block(e.block)?,
                pos: Some(e.pos),
            })
        })
        .collect::<TResult<Vec<_>>>()?;
    Ok(Stmt::If {
        cond: transform_expr(node.cond)?,
        then_block: transform_block(node.then_block)?,
        elifs,
        else_block: node.else_block.map(transform_block).transpose()?,
        pos: Some(node.pos),
    })
}

/// Wraps the `for` loop's init and update clauses into the shapes spec
/// §4.2(f) defines: a single-name clause lowers to one [`Stmt`]; a
/// multi-name assignment chain lowers to a [`Block`] of per-name assigns; a
/// bare expression update lowers to [`ForUpdate::Expr`].
fn transform_for(
    init_groups: Vec<CstLvalue>,
    init_expr: CstExpr,
    cond: CstExpr,
    update: CstForUpdate,
    block: CstBlock,
    pos: Position,
) -> TResult<Stmt> {
    let init_expr = transform_expr(init_expr)?;
    let init_names = last_assign_names(&init_groups);
    let init = wrap_for_init(init_names, &init_expr, pos);

    let update = match update {
        CstForUpdate::Expr(e) => ForUpdate::Expr(transform_expr(e)?),
        CstForUpdate::Assign { groups, expr, pos } => {
            let names = last_assign_names(&groups);
            let expr = transform_expr(expr)?;
            wrap_for_update(names, &expr, pos)
        }
    };

    Ok(Stmt::For {
        init: Box::new(init),
        cond: transform_expr(cond)?,
        update: Box::new(update),
        block: transform_block(block)?,
        pos: Some(pos),
    })
}

fn wrap_for_init(names: Vec<String>, expr: &Expr, pos: Position) -> ForInit {
    let mut stmts = assign_stmts(names, expr, pos);
    if stmts.len() == 1 {
        ForInit::Stmt(Box::new(stmts.pop().unwrap()))
    } else {
        ForInit::Block(Block {
            statements: stmts,
            pos: Some(pos),
        })
    }
}

fn wrap_for_update(names: Vec<String>, expr: &Expr, pos: Position) -> ForUpdate {
    let mut stmts = assign_stmts(names, expr, pos);
    if stmts.len() == 1 {
        ForUpdate::Stmt(Box::new(stmts.pop().unwrap()))
    } else {
        ForUpdate::Block(Block {
            statements: stmts,
            pos: Some(pos),
        })
    }
}

fn transform_expr(expr: CstExpr) -> TResult<Expr> {
    Ok(match expr {
        CstExpr::Int(v, pos) => Expr::Literal {
            value: LiteralValue::Int(v),
            type_tag: TypeTag::Rank,
            pos: Some(pos),
        },
        CstExpr::Real(v, pos) => Expr::Literal {
            value: LiteralValue::Real(v),
            type_tag: TypeTag::Rate,
            pos: Some(pos),
        },
        CstExpr::Str(v, pos) => Expr::Literal {
            value: LiteralValue::Str(v),
            type_tag: TypeTag::Label,
            pos: Some(pos),
        },
        CstExpr::Bool(v, pos) => Expr::Literal {
            value: LiteralValue::Bool(v),
            type_tag: TypeTag::Flag,
            pos: Some(pos),
        },
        CstExpr::Var(name, pos) => Expr::VarAccess {
            name,
            pos: Some(pos),
        },
        CstExpr::Bin(op, l, r, pos) => Expr::BinOp {
            op,
            left: Box::new(transform_expr(*l)?),
            right: Box::new(transform_expr(*r)?),
            pos: Some(pos),
        },
        CstExpr::Unary(op, e, pos) => Expr::UnaryOp {
            op,
            expr: Box::new(transform_expr(*e)?),
            pos: Some(pos),
        },
        CstExpr::Call(name, args, pos) => Expr::FunCallExpr {
            name,
            args: args
                .into_iter()
                .map(transform_expr)
                .collect::<TResult<_>>()?,
            pos: Some(pos),
        },
    })
}
