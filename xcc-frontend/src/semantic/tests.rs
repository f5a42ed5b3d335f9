use super::*;
use crate::lexer::Lexer;
use crate::parser::Parser;
use pretty_assertions::assert_eq;

fn analyze(source: &str) -> Result<(), SemanticError> {
    let tokens = Lexer::new(source, "sema.l2").tokenize().unwrap();
    let program = Parser::new(tokens).parse_program().unwrap();
    SemanticAnalyzer::new().check_program(&program)
}

fn in_main(body: &str) -> Result<(), SemanticError> {
    analyze(&format!("int main() {{ {body} }}"))
}

#[test]
fn test_valid_programs() {
    for body in [
        "return 2 + 3 * 4;",
        "int i = 0; int s = 0; while (i < 5) { s = s + i; i = i + 1; } return s;",
        "int x; if (true) { x = 1; } else { x = 2; } return x;",
        "int x; if (false) { return 0; } else { x = 3; } return x;",
        "for (int i = 0; i < 3; i += 1) { if (i == 1) continue; break; } return 0;",
        "bool b = 1 < 2 && !(3 == 4); return b ? 0x7fffffff : -2147483648;",
        "{ int x = 1; } { int x = 2; } return 0;",
    ] {
        let result = in_main(body);
        assert!(result.is_ok(), "{body}: {result:?}");
    }
}

#[test]
fn test_break_outside_loop() {
    let err = in_main("break; return 0;").unwrap_err();
    assert!(matches!(err, SemanticError::LoopControlOutsideLoop { keyword: "break", .. }));

    let err = in_main("if (true) { continue; } return 0;").unwrap_err();
    assert!(matches!(err, SemanticError::LoopControlOutsideLoop { keyword: "continue", .. }));
}

#[test]
fn test_break_inside_loop_is_fine_but_not_after() {
    assert!(in_main("while (true) { break; } return 0;").is_ok());
    assert!(in_main("while (true) { } break; return 0;").is_err());
}

#[test]
fn test_initialization_rules() {
    assert!(matches!(
        in_main("int x; return x;"),
        Err(SemanticError::Uninitialized { .. })
    ));
    assert!(matches!(
        in_main("int x; if (true) { x = 1; } return x;"),
        Err(SemanticError::Uninitialized { .. })
    ));
    assert!(matches!(
        in_main("int x; while (false) { x = 1; } return x;"),
        Err(SemanticError::Uninitialized { .. })
    ));
    assert!(matches!(
        in_main("int x; x += 1; return x;"),
        Err(SemanticError::Uninitialized { .. })
    ));
    assert!(matches!(
        in_main("y = 1; return 0;"),
        Err(SemanticError::UndeclaredVariable { .. })
    ));
    assert!(matches!(
        in_main("int x = 1; { int x = 2; } return x;"),
        Err(SemanticError::Redeclaration { .. })
    ));
    assert!(matches!(
        in_main("int x = x; return 0;"),
        Err(SemanticError::UndeclaredVariable { .. })
    ));
}

#[test]
fn test_for_step_may_not_declare() {
    assert!(matches!(
        in_main("for (int i = 0; i < 3; int j = 1) { } return 0;"),
        Err(SemanticError::DeclarationInForStep { .. })
    ));
}

#[test]
fn test_type_errors() {
    for body in [
        "return true;",
        "int x = true; return x;",
        "bool b = 1 + true; return 0;",
        "if (1) { } return 0;",
        "return 1 == true ? 1 : 0;",
        "return true ? 1 : false;",
        "bool b = true; b += 1; return 0;",
        "return -true;",
        "return !1 ? 1 : 0;",
    ] {
        let err = in_main(body).unwrap_err();
        assert!(
            matches!(err, SemanticError::TypeMismatch { .. } | SemanticError::InvalidOperand { .. }),
            "{body}: {err:?}"
        );
    }
}

#[test]
fn test_missing_return() {
    assert!(matches!(
        in_main("int x = 1; if (true) { return x; }"),
        Err(SemanticError::MissingReturn { .. })
    ));
    assert!(matches!(
        in_main("while (true) { return 1; } "),
        Err(SemanticError::MissingReturn { .. })
    ));
}

#[test]
fn test_literal_range() {
    assert!(in_main("return 2147483647;").is_ok());
    assert!(in_main("return -2147483648;").is_ok());
    assert!(in_main("return 0xffffffff;").is_ok());
    assert!(matches!(
        in_main("return 2147483648;"),
        Err(SemanticError::LiteralOutOfRange { .. })
    ));
    assert!(matches!(
        in_main("return 0x100000000;"),
        Err(SemanticError::LiteralOutOfRange { .. })
    ));
}

#[test]
fn test_program_level_rules() {
    assert!(matches!(
        analyze("int f() { return 1; }"),
        Err(SemanticError::MissingMain { .. })
    ));
    assert!(matches!(
        analyze("int main() { return 1; } int main() { return 2; }"),
        Err(SemanticError::DuplicateFunction { .. })
    ));
}

#[test]
fn test_error_converts_to_semantic_compiler_error() {
    let tokens = Lexer::new("int main() { break; }", "sema.l2").tokenize().unwrap();
    let program = Parser::new(tokens).parse_program().unwrap();
    let err = SemanticAnalyzer::new().analyze(&program).unwrap_err();
    assert_eq!(err.exit_status().code(), 7);
    assert!(err.to_string().contains("'break' outside of a loop"));
}
