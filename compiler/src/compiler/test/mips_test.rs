use indoc::indoc;

use super::{compile, normalized};

fn assembly_for(source: &str) -> String {
    compile(source).assembly()
}

#[test]
fn arithmetic_and_logic_asm_generation() {
    let assembly = assembly_for(indoc! {r#"
        let x = 5 + 3 * 2;
        let y = !(x < 10 || x > 20);
        let z = (1 + 2) * 3;
    "#});

    let expected = indoc! {r#"
        .data
        W0_x:		.word	0
        B0_y:		.byte	0
        W0_z:		.word	0
        .text
        main:
        li $t0, 3
        li $t1, 2
        mult $t0, $t1
        mflo $t2
        li $t0, 5
        add $t1, $t0, $t2
        move $s0, $t1
        sw $s0, W0_x
        li $t0, 10
        slt $t1, $s0, $t0
        li $t0, 20
        sgt $t2, $s0, $t0
        or $t0, $t1, $t2
        not $t3, $t0
        move $s1, $t3
        sb $s1, B0_y
        li $t0, 1
        li $t1, 2
        add $t2, $t0, $t1
        li $t0, 3
        mult $t2, $t0
        mflo $t1
        move $s2, $t1
        sw $s2, W0_z
    "#};

    assert_eq!(normalized(expected), normalized(&assembly));
}

#[test]
fn data_section_synthesis() {
    let assembly = assembly_for(indoc! {r#"
        let x = 4;
        let s = "hola";
        let b = true;
        let lista = [1, 2];
    "#});

    let text = normalized(&assembly);
    // Literal initializers are materialised as cell initial values.
    assert!(text.contains("W0_x: .word 4"));
    assert!(text.contains("B0_b: .byte 1"));
    // Array storage comes from the elided alloc.
    assert!(text.contains("S0_lista: .space 8"));
    // String literals are interned and referenced by name.
    assert!(text.contains("str0: .asciiz \"hola\""));
    assert!(text.contains("S0_s: .word 0"));
    assert!(text.contains("la $t0, str0"));
    // The materialised initializers leave no runtime trace; the cells are
    // only ever named by their declarations.
    assert_eq!(assembly.matches("W0_x").count(), 1);
    assert_eq!(assembly.matches("B0_b").count(), 1);
}

#[test]
fn runtime_helpers_emitted_iff_used() {
    let string_print = assembly_for("print(\"hola\");\n");
    assert!(!string_print.contains("to_string:"));
    assert!(!string_print.contains("concat_string:"));
    assert!(!string_print.contains("err_bad_index:"));

    let integer_print = assembly_for("print(1);\n");
    assert_eq!(integer_print.matches("to_string:").count(), 1);
    assert!(integer_print.contains("jal to_string"));
    assert!(!integer_print.contains("concat_string:"));

    let concatenation = assembly_for("let s = \"a\" + \"b\";\nprint(s);\n");
    assert_eq!(concatenation.matches("concat_string:").count(), 1);
    assert!(concatenation.contains("jal concat_string"));

    let indexing = assembly_for("let a = [1, 2];\nprint(a[0]);\n");
    assert_eq!(indexing.matches("err_bad_index:").count(), 1);
    assert!(indexing.contains("err_bad_index_msg:"));
}

#[test]
fn saved_register_writes_store_back() {
    let programs = [
        indoc! {r#"
            let x = 5 + 3 * 2;
            let y = !(x < 10 || x > 20);
            let z = (1 + 2) * 3;
        "#},
        indoc! {r#"
            let matriz = [[1, 2], [3, 4]];
            let num2 = matriz[0][1];
        "#},
    ];

    for program in programs {
        let assembly = assembly_for(program);
        let lines: Vec<&str> = assembly.lines().collect();
        for (index, line) in lines.iter().enumerate() {
            let writes_saved = line.starts_with("move $s")
                || ((line.starts_with("lw $s") || line.starts_with("lb $s"))
                    && line.ends_with("($t8)"));
            if writes_saved {
                let register = line
                    .split_whitespace()
                    .nth(1)
                    .expect("register operand")
                    .trim_end_matches(',');
                let next = lines.get(index + 1).expect("a line follows the write");
                assert!(
                    next.starts_with(&format!("sw {},", register))
                        || next.starts_with(&format!("sb {},", register)),
                    "write to {} is not stored back: {} / {}",
                    register,
                    line,
                    next
                );
            }
        }
    }
}

#[test]
fn function_bodies_precede_main() {
    let assembly = assembly_for(indoc! {r#"
        function factorial(n: integer): integer {
          if (n <= 1) { return 1; }
          return n * factorial(n - 1);
        }

        let resultado = factorial(5);
    "#});

    let function_at = assembly.find("F0_factorial:").expect("function label emitted");
    let main_at = assembly.find("main:").expect("entry point emitted");
    assert!(function_at < main_at);

    assert!(assembly.starts_with(".data\n"));
    assert!(assembly.contains("\n.text\n"));
    assert!(assembly.contains("jal F0_factorial"));
    // Caller prologue materialises the argument into $a0.
    assert!(assembly.contains("move $a0, $t"));
    // The call saves and restores the return address around the jump.
    assert!(assembly.contains("sw $ra, ($sp)\njal F0_factorial\nlw $ra, ($sp)"));
}

#[test]
fn bounds_trap_chains_through_the_handler() {
    let assembly = assembly_for(indoc! {r#"
        let lista = [1, 2];
        let x = lista[1];
    "#});

    let text = normalized(&assembly);
    assert!(text.contains("beq $zero, $t8, no_err0"));
    assert!(text.contains("beq $zero, $t9, err_bad_index"));
    assert!(text.contains("la $t8, err_bad_index_msg"));
    assert!(text.contains("jr $t9"));
    assert!(text.contains("clean_err0:"));
    assert!(text.contains("no_err0:"));
}

#[test]
fn catch_handler_is_installed_with_la() {
    let assembly = assembly_for(indoc! {r#"
        let lista = [1, 2];
        try {
          let x = lista[0];
        } catch (err) {
          print(err);
        }
    "#});

    assert!(assembly.contains("la $t9, l0"));
    // The handler body floats in front of main like any subroutine.
    let handler_at = assembly.find("l0:\n").expect("handler label emitted");
    let main_at = assembly.find("main:").expect("entry point emitted");
    assert!(handler_at < main_at);
}
