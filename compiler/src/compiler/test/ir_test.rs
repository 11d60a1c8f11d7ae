use indoc::indoc;

use compiscript_common::QuadOp;

use super::{compile, normalized};

fn tac_for(source: &str) -> String {
    compile(source).tac.to_string()
}

fn assert_tac(source: &str, expected: &str) {
    assert_eq!(normalized(expected), normalized(&tac_for(source)));
}

#[test]
fn arithmetic_and_logic_operations_generation() {
    assert_tac(
        indoc! {r#"
            let x = 5 + 3 * 2;
            let y = !(x < 10 || x > 20);
            let z = (1 + 2) * 3;
        "#},
        indoc! {r#"
            t0 = * 3 2
            t1 = + 5 t0
            W0_x = t1
            t0 = < W0_x 10
            t1 = > W0_x 20
            t2 = || t0 t1
            t3 = ! t2
            B0_y = t3
            t0 = + 1 2
            t1 = * t0 3
            W0_z = t1
        "#},
    );
}

#[test]
fn function_code_generation() {
    assert_tac(
        indoc! {r#"
            function saludar(nombre: string): string {
              return "Hola " + nombre;
            }

            let mensaje = saludar("Mundo");

            function crearContador(): integer {
              function siguiente(): integer {
                return 1;
              }
              return siguiente();
            }
        "#},
        indoc! {r#"
            begin F0_saludar
            arg S1_nombre
            t0 = concat "Hola " S1_nombre
            return t0
            end F0_saludar
            param "Mundo"
            call F0_saludar
            S0_mensaje = ret
            begin F0_crearContador
            begin F2_siguiente
            return 1
            end F2_siguiente
            call F2_siguiente
            return ret
            end F0_crearContador
        "#},
    );
}

#[test]
fn function_with_recursion_code_generation() {
    assert_tac(
        indoc! {r#"
            function factorial(n: integer): integer {
              if (n <= 1) { return 1; }
              return n * factorial(n - 1);
            }
        "#},
        indoc! {r#"
            begin F0_factorial
            arg W1_n
            t0 = <= W1_n 1
            if t0 l0
            goto l1
            tag l0
            return 1
            tag l1
            t0 = - W1_n 1
            push W1_n
            param t0
            call F0_factorial
            pop W1_n
            t1 = * W1_n ret
            return t1
            end F0_factorial
        "#},
    );
}

#[test]
fn array_code_generation() {
    assert_tac(
        indoc! {r#"
            let lista = [1, 2, 3];
            print(lista[0]);
            let matriz = [[1, 2], [3, 4]];
            let num2 = matriz[0][1];
        "#},
        indoc! {r#"
            S0_lista = alloc 12
            i = + S0_lista 0
            i* = 1
            i = + S0_lista 4
            i* = 2
            i = + S0_lista 8
            i* = 3
            t0 = 0
            err = >= t0 3
            iferr err_bad_index
            t0 = * t0 4
            i = + S0_lista t0
            p = to_str i* 4
            print
            S0_matriz = alloc 16
            i = + S0_matriz 0
            i* = 1
            i = + S0_matriz 4
            i* = 2
            i = + S0_matriz 8
            i* = 3
            i = + S0_matriz 12
            i* = 4
            t0 = 0
            err = >= t0 2
            iferr err_bad_index
            t0 = * t0 2
            t0 = * t0 4
            i = + S0_matriz t0
            t0 = 1
            err = >= t0 2
            iferr err_bad_index
            t0 = * t0 4
            i = + i t0
            W0_num2 = i*
        "#},
    );
}

#[test]
fn class_code_generation() {
    assert_tac(
        indoc! {r#"
            class Animal {
              let nombre: string;

              function constructor(nombre: string) {
                this.nombre = nombre;
              }

              function hablar(): string {
                return this.nombre + " hace ruido.";
              }
            }

            let animal = new Animal("Firulais");
            print(animal.hablar());

            class Perro: Animal {
                function hablar(): string {
                    return this.nombre + " ladra.";
                }
            }

            let perro = new Perro("Firulais");
            print(perro.hablar());
        "#},
        indoc! {r#"
            begin F1_constructor
            arg S2_this
            arg S2_nombre
            i = + S2_this 0
            i* = S2_nombre
            end F1_constructor
            begin F1_hablar
            arg S3_this
            i = + S3_this 0
            t0 = concat i* " hace ruido."
            return t0
            end F1_hablar
            t0 = alloc 4
            param t0
            param "Firulais"
            call F1_constructor
            S0_animal = t0
            param S0_animal
            call F1_hablar
            p = ret
            print
            begin F4_hablar
            arg S5_this
            i = + S5_this 0
            t0 = concat i* " ladra."
            return t0
            end F4_hablar
            t0 = alloc 4
            param t0
            param "Firulais"
            call F1_constructor
            S0_perro = t0
            param S0_perro
            call F4_hablar
            p = ret
            print
        "#},
    );
}

#[test]
fn conditionals_code_generation() {
    assert_tac(
        indoc! {r#"
            let x = 4;
            if (x > 10) {
              print("Mayor a 10");
            } else {
              print("Menor o igual");
            }

            while (x < 5) {
              x = x + 1;
            }

            do {
              x = x - 1;
            } while (x > 0);
        "#},
        indoc! {r#"
            W0_x = 4
            t0 = > W0_x 10
            if t0 l0
            goto l1
            tag l0
            p = "Mayor a 10"
            print
            tag l1
            p = "Menor o igual"
            print
            tag l2
            t0 = < W0_x 5
            ifnot t0 l3
            t0 = + W0_x 1
            W0_x = t0
            goto l2
            tag l3
            tag l4
            t0 = - W0_x 1
            W0_x = t0
            t0 = > W0_x 0
            if t0 l4
            tag l5
        "#},
    );
}

#[test]
fn for_loop_code_generation() {
    assert_tac(
        indoc! {r#"
            for (let i: integer = 0; i < 3; i = i + 1) {
              print(i);
            }

            let notas = [40, 60, 80, 100];
            foreach (n in notas) {
              if (n < 60) { continue; }
              if (n == 100) { break; }
              print(n);
            }
        "#},
        indoc! {r#"
            W1_i = 0
            tag l0
            t0 = < W1_i 3
            ifnot t0 l1
            p = to_str W1_i 4
            print
            t0 = + W1_i 1
            W1_i = t0
            goto l0
            tag l1
            S0_notas = alloc 16
            i = + S0_notas 0
            i* = 40
            i = + S0_notas 4
            i* = 60
            i = + S0_notas 8
            i* = 80
            i = + S0_notas 12
            i* = 100
            i = S0_notas
            tag l2
            W2_n = i*
            t0 = < W2_n 60
            if t0 l4
            goto l5
            tag l4
            goto l2
            tag l5
            t0 = == W2_n 100
            if t0 l6
            goto l7
            tag l6
            goto l3
            tag l7
            p = to_str W2_n 4
            print
            i = + i 4
            t0 = + S0_notas 16
            t1 = < i t0
            if t1 l2
            tag l3
        "#},
    );
}

#[test]
fn try_catch_code_generation() {
    assert_tac(
        indoc! {r#"
            let lista = [1, 2, 3, 4];
            try {
              let peligro = lista[100];
            } catch (err) {
              print("Error atrapado: " + err);
            }
        "#},
        indoc! {r#"
            S0_lista = alloc 16
            i = + S0_lista 0
            i* = 1
            i = + S0_lista 4
            i* = 2
            i = + S0_lista 8
            i* = 3
            i = + S0_lista 12
            i* = 4
            catch = l0
            t0 = 100
            err = >= t0 4
            iferr err_bad_index
            t0 = * t0 4
            i = + S0_lista t0
            W1_peligro = i*
            catch = 0
            begin l0
            S2_err = err
            t0 = concat "Error atrapado: " S2_err
            p = t0
            print
            end l0
        "#},
    );
}

#[test]
fn switch_case_code_generation() {
    assert_tac(
        indoc! {r#"
            let x = 2;
            switch (x) {
              case 1:
                print("uno");
              case 2:
                print("dos");
              default:
                print("otro");
            }
        "#},
        indoc! {r#"
            W0_x = 2
            switch = W0_x
            case = == switch 1
            ifnot case l0
            p = "uno"
            print
            goto l2
            tag l0
            case = == switch 2
            ifnot case l1
            p = "dos"
            print
            goto l2
            tag l1
            p = "otro"
            print
            tag l2
        "#},
    );
}

#[test]
fn array_literal_reassignment_restores_the_elements() {
    assert_tac(
        indoc! {r#"
            let x = [1, 2];
            x = [3, 4];
        "#},
        indoc! {r#"
            S0_x = alloc 8
            i = + S0_x 0
            i* = 1
            i = + S0_x 4
            i* = 2
            i = + S0_x 0
            i* = 3
            i = + S0_x 4
            i* = 4
        "#},
    );
}

#[test]
fn array_literal_property_assignment_stores_behind_the_offset() {
    assert_tac(
        indoc! {r#"
            class Caja {
              let valores: integer[];

              function constructor() {
                this.valores = [1, 2];
              }
            }
        "#},
        indoc! {r#"
            begin F1_constructor
            arg S2_this
            i = + S2_this 0
            i* = 1
            i = + S2_this 4
            i* = 2
            end F1_constructor
        "#},
    );
}

#[test]
fn ternary_code_generation() {
    assert_tac(
        "let x = true ? 1 : 2;\n",
        indoc! {r#"
            ifnot true l0
            t0 = 1
            goto l1
            tag l0
            t0 = 2
            tag l1
            W0_x = t0
        "#},
    );
}

#[test]
fn string_comparison_code_generation() {
    assert_tac(
        indoc! {r#"
            let a = "x";
            let b = "y";
            let eq = a == b;
            let ne = a != b;
        "#},
        indoc! {r#"
            S0_a = "x"
            S0_b = "y"
            t0 = streql S0_a S0_b
            B0_eq = t0
            t0 = strneq S0_a S0_b
            B0_ne = t0
        "#},
    );
}

#[test]
fn string_concatenation_coerces_the_right_operand() {
    assert_tac(
        r#"let s = "n = " + 3;"#,
        indoc! {r#"
            t0 = to_str 3 4
            t1 = concat "n = " t0
            S0_s = t1
        "#},
    );
}

#[test]
fn unary_negation_code_generation() {
    assert_tac(
        "let x = -5;\n",
        indoc! {r#"
            t0 = - 5
            W0_x = t0
        "#},
    );
}

#[test]
fn shadowed_names_keep_scope_qualified_targets() {
    assert_tac(
        indoc! {r#"
            let x = 1;
            {
              let x = 2;
              print(x);
            }
            print(x);
        "#},
        indoc! {r#"
            W0_x = 1
            W1_x = 2
            p = to_str W1_x 4
            print
            p = to_str W0_x 4
            print
        "#},
    );
}

#[test]
fn method_calls_pass_the_receiver_after_the_arguments() {
    assert_tac(
        indoc! {r#"
            class Punto {
              let x: integer;

              function constructor(x: integer) {
                this.x = x;
              }

              function mover(dx: integer) {
                this.x = this.x + dx;
              }
            }

            let p = new Punto(1);
            p.mover(2);
        "#},
        indoc! {r#"
            begin F1_constructor
            arg S2_this
            arg W2_x
            i = + S2_this 0
            i* = W2_x
            end F1_constructor
            begin F1_mover
            arg S3_this
            arg W3_dx
            i = + S3_this 0
            t0 = + i* W3_dx
            i = + S3_this 0
            i* = t0
            end F1_mover
            t0 = alloc 4
            param t0
            param 1
            call F1_constructor
            S0_p = t0
            param 2
            param S0_p
            call F1_mover
        "#},
    );
}

#[test]
fn generation_is_deterministic() {
    let source = indoc! {r#"
        function factorial(n: integer): integer {
          if (n <= 1) { return 1; }
          return n * factorial(n - 1);
        }

        let lista = [1, 2, 3];
        print(lista[0]);
    "#};
    assert_eq!(tac_for(source), tac_for(source));
}

#[test]
fn function_bodies_are_bracketed() {
    let artifacts = compile(indoc! {r#"
        function saludar(nombre: string): string {
          return "Hola " + nombre;
        }

        function crearContador(): integer {
          function siguiente(): integer {
            return 1;
          }
          return siguiente();
        }

        let lista = [1, 2];
        try {
          let x = lista[0];
        } catch (err) {
          print(err);
        }
    "#});

    let mut open = Vec::new();
    for quad in &artifacts.tac.quadruplets {
        match quad.op {
            QuadOp::Begin => open.push(quad.arg1.text()),
            QuadOp::End => {
                let begin = open.pop().expect("end without begin");
                assert_eq!(begin, quad.arg1.text());
            }
            _ => {}
        }
    }
    assert!(open.is_empty(), "unterminated bodies: {:?}", open);
}

#[test]
fn call_sites_push_and_pop_in_reverse() {
    let artifacts = compile(indoc! {r#"
        function suma(a: integer, b: integer): integer {
          return a + suma(a - 1, b);
        }
    "#});

    let quads = &artifacts.tac.quadruplets;
    let pushes: Vec<String> = quads
        .iter()
        .filter(|quad| quad.op == QuadOp::Push)
        .map(|quad| quad.arg1.text())
        .collect();
    let pops: Vec<String> = quads
        .iter()
        .filter(|quad| quad.op == QuadOp::Pop)
        .map(|quad| quad.arg1.text())
        .collect();

    assert_eq!(pushes, vec!["W1_a", "W1_b"]);
    assert_eq!(pops, vec!["W1_b", "W1_a"]);

    let call = quads.iter().position(|quad| quad.op == QuadOp::Call).expect("call emitted");
    let last_push = quads.iter().rposition(|quad| quad.op == QuadOp::Push).expect("push emitted");
    let first_pop = quads.iter().position(|quad| quad.op == QuadOp::Pop).expect("pop emitted");
    assert!(last_push < call && call < first_pop);
}
