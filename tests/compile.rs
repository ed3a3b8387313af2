//! End-to-end pipeline tests: source text in, AST or error out.

use play_lang::ast::{BinOperator, Expr, LiteralValue, Stmt, TypeTag};
use play_lang::compile_source;
use play_lang::error::CompileError;

#[test]
fn arithmetic_precedence_builds_expected_ast_shape() {
    let program = compile_source("rank: x  play { x <-- 1 + 2 * 3 } gameover").unwrap();
    match &program.main_block.statements[0] {
        Stmt::Assign { expr, .. } => match expr {
            Expr::BinOp {
                op: BinOperator::Add,
                left,
                right,
                ..
            } => {
                assert!(matches!(
                    **left,
                    Expr::Literal {
                        value: LiteralValue::Int(1),
                        ..
                    }
                ));
                assert!(matches!(
                    **right,
                    Expr::BinOp {
                        op: BinOperator::Mul,
                        ..
                    }
                ));
            }
            other => panic!("unexpected expr {other:?}"),
        },
        other => panic!("unexpected stmt {other:?}"),
    }
}

#[test]
fn declaration_chain_produces_three_initialized_vars() {
    let program = compile_source("rank: a = b = c <-- 10  play { } gameover").unwrap();
    let decl = &program.global_decls[0];
    assert_eq!(decl.items.len(), 3);
    assert_eq!(decl.items[0].name, "a");
    assert_eq!(decl.items[1].name, "b");
    assert_eq!(decl.items[2].name, "c");
    for item in &decl.items {
        assert!(matches!(
            item.init,
            Some(Expr::Literal {
                value: LiteralValue::Int(10),
                ..
            })
        ));
    }
}

#[test]
fn declaration_chain_without_initializer_fails_to_transform() {
    let err = compile_source("play { rank: a = b } gameover").unwrap_err();
    match err {
        CompileError::Transform(e) => assert!(e.to_string().contains("Invalid chain")),
        other => panic!("expected a transform error, got {other:?}"),
    }
}

#[test]
fn output_dereference_outside_drop_is_a_semantic_error() {
    let err = compile_source("rank: x  play { x <-- -->x } gameover").unwrap_err();
    match err {
        CompileError::Semantic(e) => {
            assert_eq!(
                e.message,
                "Operator '-->' can only be used in 'drop' statements"
            );
        }
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

#[test]
fn function_call_argument_type_mismatch_is_rejected() {
    let err =
        compile_source("action foo(rank a) -> void { }  play { foo(\"wrong\") } gameover")
            .unwrap_err();
    match err {
        CompileError::Semantic(e) => assert!(e.message.contains("Argument 1 of 'foo'")),
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

#[test]
fn if_elif_else_lowers_to_expected_ast_shape() {
    let program = compile_source(
        r#"flag: f
           play {
               choice (f) -> { drop "a" }
               retry (f) -> { drop "b" }
               fail -> { drop "c" }
           } gameover"#,
    )
    .unwrap();
    match &program.main_block.statements[0] {
        Stmt::If {
            elifs, else_block, ..
        } => {
            assert_eq!(elifs.len(), 1);
            assert!(else_block.is_some());
        }
        other => panic!("unexpected stmt {other:?}"),
    }
}

#[test]
fn empty_main_block_with_no_decls_or_functions_is_accepted() {
    let program = compile_source("play { } gameover").unwrap();
    assert!(program.global_decls.is_empty());
    assert!(program.functions.is_empty());
    assert!(program.main_block.statements.is_empty());
}

#[test]
fn empty_void_action_with_no_params_is_accepted() {
    let program = compile_source("action noop() -> void { }  play { } gameover").unwrap();
    assert_eq!(program.functions[0].name, "noop");
    assert!(program.functions[0].params.is_empty());
    assert!(program.functions[0].body.statements.is_empty());
}

#[test]
fn quit_at_main_block_top_level_is_rejected() {
    let err = compile_source("play { quit } gameover").unwrap_err();
    match err {
        CompileError::Semantic(e) => assert_eq!(e.message, "Quit used outside loop"),
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

#[test]
fn reward_at_main_block_top_level_is_rejected() {
    let err = compile_source("play { reward void } gameover").unwrap_err();
    match err {
        CompileError::Semantic(e) => assert_eq!(e.message, "Return statement outside function"),
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

#[test]
fn numeric_promotion_is_symmetric() {
    let program =
        compile_source("rank: a <-- 1  rate: b <-- 2.0  rate: c  play { c <-- a + b } gameover")
            .unwrap();
    assert_eq!(program.global_decls.len(), 3);
    let program2 =
        compile_source("rank: a <-- 1  rate: b <-- 2.0  rate: c  play { c <-- b + a } gameover")
            .unwrap();
    assert_eq!(program2.global_decls.len(), 3);
}

/// A small arithmetic-menu program exercising most of the pipeline at once:
/// two functions, `stay`, nested `choice/retry/fail`, `grab`, and
/// string-concatenation `drop`.
#[test]
fn arithmetic_menu_program_compiles() {
    let source = r#"
        rank: op_choice
        rate: n1, n2, res
        flag: running

        action add(rate a, rate b) -> rate {
            reward a + b
        }

        action sub(rate a, rate b) -> rate {
            reward a - b
        }

        action mul(rate a, rate b) -> rate {
            reward a * b
        }

        action div(rate a, rate b) -> rate {
            reward a / b
        }

        play {
            running <-- true

            stay (running) -> {
                drop "--- SIMPLE CALCULATOR MENU ---"
                drop "1. Add"
                drop "2. Subtract"
                drop "3. Multiply"
                drop "4. Divide"
                drop "0. Exit"

                op_choice <-- grab "Pick an operation (0-4): "
                n1 <-- grab "Enter the first number: "
                n2 <-- grab "Enter the second number: "

                choice (op_choice == 0) -> {
                    running <-- false
                    drop "Exiting."
                } retry (op_choice == 1) -> {
                    res <-- add(n1, n2)
                    drop "Result: " + res
                } retry (op_choice == 2) -> {
                    res <-- sub(n1, n2)
                    drop "Result: " + res
                } retry (op_choice == 3) -> {
                    res <-- mul(n1, n2)
                    drop "Result: " + res
                } retry (op_choice == 4) -> {
                    res <-- div(n1, n2)
                    drop "Result: " + res
                } fail -> {
                    drop "Invalid choice, try again."
                }
            }
        } gameover
        "#;
    let program = compile_source(source).unwrap();
    assert_eq!(program.functions.len(), 4);
    assert_eq!(program.global_decls.len(), 3);
}

#[test]
fn for_loop_with_chained_assignment_in_init_uses_a_block() {
    use play_lang::ast::ForInit;
    let program = compile_source(
        "rank: i  rank: j  play { loop (i = j <-- 0; i < 10; i <-- i + 1) -> { } } gameover",
    )
    .unwrap();
    match &program.main_block.statements[0] {
        Stmt::For { init, .. } => assert!(matches!(**init, ForInit::Block(_))),
        other => panic!("unexpected stmt {other:?}"),
    }
}

#[test]
fn unterminated_string_is_a_lexical_syntax_error() {
    let err = compile_source("play { drop \"oops } gameover").unwrap_err();
    assert!(matches!(err, CompileError::Syntax(_)));
}

#[test]
fn label_cannot_receive_a_rank_value() {
    let err = compile_source("label: s <-- 5  play { } gameover").unwrap_err();
    match err {
        CompileError::Semantic(e) => assert!(e.message.contains("Type mismatch")),
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

#[test]
fn assign_only_the_last_comma_group() {
    let program = compile_source("rank: a  rank: b  play { a, b <-- 10 } gameover").unwrap();
    assert_eq!(program.main_block.statements.len(), 1);
    match &program.main_block.statements[0] {
        Stmt::Assign { target, .. } => assert_eq!(target, "b"),
        other => panic!("unexpected stmt {other:?}"),
    }
}

#[test]
fn input_target_types_are_unconstrained() {
    // A `rank` variable may be the target of `grab`, whose implicit source
    // type is `label`; the analyzer does not constrain this (spec §4.3).
    compile_source("rank: x  play { x <-- grab \"enter a number: \" } gameover").unwrap();
}

#[test]
fn every_literal_carries_its_expected_type_tag() {
    let program = compile_source(
        "play { drop \"s\" + 1 + 2.0 + true } gameover",
    )
    .unwrap();
    // Type-checks because `+` with any `label` operand always yields `label`.
    assert_eq!(program.main_block.statements.len(), 1);
    let _ = TypeTag::Label;
}
