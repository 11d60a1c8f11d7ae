use std::collections::HashSet;

use compiscript_common::{Operand, Quad, QuadOp};
use regex::Regex;

pub const ERR_BAD_INDEX_MESSAGE: &str = "Error: index out of bounds";

/// Result of the data pass: the `.data` directives and the quadruples that
/// survive into text synthesis. Initializer quadruples materialised as cell
/// initial values are dropped here rather than spliced out of a shared
/// stream, so the text pass never sees stale indices.
pub struct DataSection {
    pub text: String,
    pub quadruplets: Vec<Quad>,
}

impl DataSection {
    /// Scan every quadruple: intern string literals as `strN` cells, declare
    /// one cell per unique result name by storage class (`W` word, `B` byte,
    /// `S` space or pointer word), and emit the bounds message on the first
    /// `iferr`.
    pub fn generate(quadruplets: Vec<Quad>) -> DataSection {
        let string_literal = Regex::new("^\"([^\"\r\n])*\"$").expect("valid string pattern");
        let integer = Regex::new("^[0-9]+$").expect("valid integer pattern");

        let mut text = String::new();
        let mut string_count = 0;
        let mut variables: HashSet<String> = HashSet::new();
        let mut err_message_emitted = false;
        let mut retained = Vec::new();

        for mut quad in quadruplets {
            for operand in [&mut quad.arg1, &mut quad.arg2] {
                if let Operand::Immediate(value) = operand {
                    if string_literal.is_match(value) {
                        let name = format!("str{}", string_count);
                        string_count += 1;
                        text.push_str(&format!("{}:\t\t.asciiz\t{}\n", name, value));
                        *operand = Operand::ScopedLocal(name);
                    }
                }
            }

            if quad.op == QuadOp::IfErr && !err_message_emitted {
                text.push_str(&format!(
                    "err_bad_index_msg:\t\t.asciiz\t\"{}\"\n",
                    ERR_BAD_INDEX_MESSAGE
                ));
                err_message_emitted = true;
            }

            let mut elide = false;
            if let Operand::ScopedLocal(name) = &quad.result {
                if !variables.contains(name) {
                    let declaration = match name.chars().next() {
                        Some('W') => {
                            let initial = match &quad.arg1 {
                                Operand::Immediate(value)
                                    if quad.op == QuadOp::Assign && integer.is_match(value) =>
                                {
                                    elide = true;
                                    value.clone()
                                }
                                _ => String::from("0"),
                            };
                            Some(format!("{}:\t\t.word\t{}\n", name, initial))
                        }
                        Some('B') => {
                            let initial = match &quad.arg1 {
                                Operand::Immediate(value) if quad.op == QuadOp::Assign => {
                                    match value.as_str() {
                                        "true" => {
                                            elide = true;
                                            "1"
                                        }
                                        "false" | "null" => {
                                            elide = true;
                                            "0"
                                        }
                                        _ => "0",
                                    }
                                }
                                _ => "0",
                            };
                            Some(format!("{}:\t\t.byte\t{}\n", name, initial))
                        }
                        Some('S') => {
                            if quad.op == QuadOp::Alloc {
                                elide = true;
                                Some(format!("{}:\t\t.space\t{}\n", name, quad.arg1))
                            } else {
                                Some(format!("{}:\t\t.word\t0\n", name))
                            }
                        }
                        _ => None,
                    };
                    if let Some(declaration) = declaration {
                        variables.insert(name.clone());
                        text.push_str(&declaration);
                    }
                }
            }

            if !elide {
                retained.push(quad);
            }
        }

        DataSection { text, quadruplets: retained }
    }
}
