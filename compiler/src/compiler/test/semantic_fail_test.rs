use indoc::indoc;

use super::super::semantic_analyser::SemanticError;
use super::super::{Compiler, CompilerError};

fn analyse_error(source: &str) -> SemanticError {
    match Compiler::compile_str(source) {
        Err(CompilerError::Semantic(error)) => error,
        Err(other) => panic!("expected a semantic error, got: {}", other),
        Ok(_) => panic!("expected a semantic error, program was accepted"),
    }
}

#[test]
fn non_matching_types_in_operations() {
    let rejected = [
        "5 + 3 * true;",
        "false - 1;",
        "true > 2;",
        r#"5 || "hola";"#,
        r#"5 && "hola";"#,
        r#"5 != "hola";"#,
        "!2;",
        "[4, true];",
    ];
    for source in rejected {
        assert!(
            matches!(analyse_error(source), SemanticError::NonMatchingTypes { .. }),
            "{} should be a type mismatch",
            source
        );
    }
}

#[test]
fn non_matching_types_in_assignments() {
    let rejected = [
        "let x: integer = true;",
        r#"const x: string = 4;"#,
        indoc! {r#"
            let x = "hola";
            x = true;
        "#},
    ];
    for source in rejected {
        assert!(
            matches!(analyse_error(source), SemanticError::NonMatchingTypes { .. }),
            "{} should be a type mismatch",
            source
        );
    }
}

#[test]
fn non_matching_types_in_classes() {
    let error = analyse_error(indoc! {r#"
        class Animal {
            let nombre: string;

            function constructor(nombre: string) {
                this.nombre = nombre;
            }
        }

        let animal: Animal = new Animal("Toby");
        animal.nombre = 4;
    "#});
    assert!(matches!(error, SemanticError::NonMatchingTypes { .. }));
}

#[test]
fn non_matching_types_in_calls() {
    let error = analyse_error(indoc! {r#"
        function saludar(nombre: string): string {
            return "Hola " + nombre;
        }

        saludar(true);
    "#});
    assert!(matches!(error, SemanticError::NonMatchingTypes { .. }));
}

#[test]
fn invalid_condition_types() {
    let rejected = [
        r#"if ("Hola") {}"#,
        "while (4) {}",
        "do {} while (null);",
        r#"for (; "hello";) {}"#,
    ];
    for source in rejected {
        assert!(
            matches!(analyse_error(source), SemanticError::InvalidType { .. }),
            "{} should be an invalid condition type",
            source
        );
    }
}

#[test]
fn printing_an_object_is_invalid() {
    let error = analyse_error(indoc! {r#"
        class Animal {
            let nombre: string;
        }

        let animal: Animal = new Animal();
        print(animal);
    "#});
    assert!(matches!(error, SemanticError::InvalidType { .. }));
}

#[test]
fn redefinition_in_same_scope() {
    let error = analyse_error("let x = 1;\nlet x = 2;\n");
    assert!(matches!(error, SemanticError::Redefinition { .. }));

    // Shadowing an outer name in an inner scope stays legal.
    Compiler::compile_str("let x = 1;\n{ let x = 2; }\n").expect("shadowing is accepted");
}

#[test]
fn undefined_access() {
    assert!(matches!(
        analyse_error("y = 4;"),
        SemanticError::UndefinedAccess { .. }
    ));
    assert!(matches!(
        analyse_error("print(z);"),
        SemanticError::UndefinedAccess { .. }
    ));
}

#[test]
fn invalid_property_access() {
    let error = analyse_error(indoc! {r#"
        class Animal {
            let nombre: string;
        }

        let animal: Animal = new Animal();
        print(animal.edad);
    "#});
    assert!(matches!(error, SemanticError::InvalidPropertyAccess { .. }));
}

#[test]
fn invalid_suffix_combinations() {
    assert!(matches!(
        analyse_error("let x = 5;\nx(1);\n"),
        SemanticError::InvalidSuffix { .. }
    ));
    assert!(matches!(
        analyse_error("let x = 5;\nlet y = x[0];\n"),
        SemanticError::InvalidSuffix { .. }
    ));
}

#[test]
fn invalid_index_type() {
    let error = analyse_error("let a = [1, 2];\nlet b = a[true];\n");
    assert!(matches!(error, SemanticError::InvalidIndex { .. }));
}

#[test]
fn loop_keywords_outside_loops() {
    assert!(matches!(
        analyse_error("break;"),
        SemanticError::InvalidKeywordUse { .. }
    ));
    assert!(matches!(
        analyse_error("continue;"),
        SemanticError::InvalidKeywordUse { .. }
    ));
    assert!(matches!(
        analyse_error("return 1;"),
        SemanticError::InvalidKeywordUse { .. }
    ));
    assert!(matches!(
        analyse_error("print(this);"),
        SemanticError::InvalidKeywordUse { .. }
    ));
}

#[test]
fn invalid_declarations() {
    assert!(matches!(
        analyse_error("let x;"),
        SemanticError::InvalidDeclaration { .. }
    ));

    let nested_class = analyse_error(indoc! {r#"
        class Exterior {
            class Interior {
            }
        }
    "#});
    assert!(matches!(nested_class, SemanticError::InvalidDeclaration { .. }));
}

#[test]
fn constant_modification() {
    let error = analyse_error("const k: integer = 1;\nk = 2;\n");
    assert!(matches!(error, SemanticError::ConstantModification { .. }));
}

#[test]
fn unreachable_code_after_return() {
    let error = analyse_error(indoc! {r#"
        function f(): integer {
            return 1;
            print(2);
        }
    "#});
    assert!(matches!(error, SemanticError::UnreachableCode { .. }));
}

#[test]
fn incomplete_function_call() {
    let error = analyse_error(indoc! {r#"
        function f(): integer {
            return 1;
        }
        let g = f;
    "#});
    assert!(matches!(error, SemanticError::IncompleteCall { .. }));
}

#[test]
fn missing_return() {
    let error = analyse_error("function f(): integer { print(1); }");
    assert!(matches!(error, SemanticError::MissingReturn { .. }));
}

#[test]
fn non_matching_argument_counts() {
    let error = analyse_error(indoc! {r#"
        function f(n: integer): integer {
            return n;
        }
        f();
    "#});
    assert!(matches!(error, SemanticError::NonMatchingArguments { .. }));

    let constructor = analyse_error(indoc! {r#"
        class Animal {
            let nombre: string;

            function constructor(nombre: string) {
                this.nombre = nombre;
            }
        }

        let animal = new Animal();
    "#});
    assert!(matches!(constructor, SemanticError::NonMatchingArguments { .. }));
}

#[test]
fn syntax_errors_are_reported() {
    assert!(matches!(
        Compiler::compile_str("let = ;"),
        Err(CompilerError::Syntax(_))
    ));
}
