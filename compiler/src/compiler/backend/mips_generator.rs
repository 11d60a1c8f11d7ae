use compiscript_common::{Operand, Quad, QuadOp, TacProgram};

use super::data_section::DataSection;
use super::registers::RegisterFile;
use super::runtime;

/// MipsGenerator consumes the quadruple stream in order and renders the
/// final assembly: a `.data` section synthesised from result names and
/// interned strings, then a `.text` section opened by the runtime helpers in
/// use, the nested subroutine bodies, and `main`.
pub struct MipsGenerator {
    quadruplets: Vec<Quad>,
}

impl MipsGenerator {
    pub fn new(program: &TacProgram) -> Self {
        MipsGenerator { quadruplets: program.quadruplets.clone() }
    }

    pub fn generate_assembly(self) -> String {
        let data = DataSection::generate(self.quadruplets);
        let helpers = runtime::required_helpers(&data.quadruplets);
        let text = Self::generate_text_section(&data.quadruplets);

        let mut assembly = String::from(".data\n");
        assembly.push_str(&data.text);
        assembly.push_str(".text\n");
        assembly.push_str(&helpers);
        assembly.push_str(&text);
        assembly
    }

    fn generate_text_section(quadruplets: &[Quad]) -> String {
        let mut registers = RegisterFile::new();
        let mut subroutine_sections: Vec<String> = Vec::new();
        let mut text = String::from("main:\n");
        let mut arg_count = 0;
        let mut err_labels = 0;

        for quad in quadruplets {
            // A write to t0 that does not read t0 starts a new statement;
            // every statement-local temporary is dead.
            if quad.result.is_first_temp()
                && !(quad.arg1.is_first_temp() || quad.arg2.is_first_temp())
            {
                registers.clear_statement_temps();
            }

            match quad.op {
                QuadOp::Arg => {
                    registers.bind_arg(arg_count, quad.arg1.text());
                    arg_count += 1;
                    continue;
                }
                QuadOp::Param => {
                    let ry = registers.get_register(&quad.arg1);
                    text.push_str(&ry.text);
                    text.push_str(&format!("move $a{}, {}\n", arg_count, ry.reg));
                    arg_count += 1;
                    continue;
                }
                _ => arg_count = 0,
            }

            match quad.op {
                QuadOp::Tag => {
                    text.push_str(&format!("{}:\n", quad.arg1));
                }
                QuadOp::Begin => {
                    // Function bodies are emitted in front of the code that
                    // references them; stash the accumulated text.
                    subroutine_sections.push(std::mem::replace(
                        &mut text,
                        format!("{}:\n", quad.arg1),
                    ));
                    registers.clear_all_temporaries();
                }
                QuadOp::End => {
                    if !text.ends_with("jr $ra\n\n") {
                        text.push_str("jr $ra\n\n");
                    }
                    let outer = subroutine_sections
                        .pop()
                        .expect("every end matches an earlier begin");
                    text.push_str(&outer);
                }
                QuadOp::Call => {
                    text.push_str("addi $sp, -4\n");
                    text.push_str("sw $ra, ($sp)\n");
                    text.push_str(&format!("jal {}\n", quad.arg1));
                    text.push_str("lw $ra, ($sp)\n");
                    text.push_str("addi $sp, 4\n");
                }
                QuadOp::Goto => {
                    text.push_str(&format!("b {}\n", quad.arg1));
                }
                QuadOp::Print => {
                    text.push_str("addi $sp, -4\n");
                    text.push_str("sw $a0, ($sp)\n");
                    text.push_str("move $a0, $v1\n");
                    text.push_str("li $v0, 4\n");
                    text.push_str("syscall\n");
                    text.push_str("lw $a0, ($sp)\n");
                    text.push_str("addi $sp, 4\n");
                }
                QuadOp::Alloc => {
                    let rx = registers.get_register(&quad.result);
                    text.push_str("addi $sp, -4\n");
                    text.push_str("sw $a0, ($sp)\n");
                    match &quad.arg1 {
                        Operand::Immediate(size) => {
                            text.push_str(&format!("li $a0, {}\n", size));
                        }
                        operand => {
                            let ry = registers.get_register(operand);
                            text.push_str(&ry.text);
                            text.push_str(&format!("move $a0, {}\n", ry.reg));
                        }
                    }
                    text.push_str("li $v0, 9\n");
                    text.push_str("syscall\n");
                    text.push_str("lw $a0, ($sp)\n");
                    text.push_str("addi $sp, 4\n");
                    text.push_str(&format!("move {}, $v0\n", rx.reg));
                }
                QuadOp::IfErr => {
                    text.push_str(&format!("beq $zero, $t8, no_err{}\n", err_labels));
                    text.push_str(&format!("beq $zero, $t9, {}\n", quad.arg1));
                    if quad.arg1.text() == "err_bad_index" {
                        text.push_str("la $t8, err_bad_index_msg\n");
                    }
                    text.push_str("addi $sp, -4\n");
                    text.push_str("sw $ra, ($sp)\n");
                    text.push_str(&format!("la $ra, clean_err{}\n", err_labels));
                    text.push_str("jr $t9\n");
                    text.push_str(&format!("clean_err{}:\n", err_labels));
                    text.push_str("lw $ra, ($sp)\n");
                    text.push_str("addi $sp, 4\n");
                    text.push_str(&format!("no_err{}:\n", err_labels));
                    text.push_str("move $t8, $zero\n");
                    text.push_str("move $t9, $zero\n");
                    err_labels += 1;
                }
                _ => {
                    Self::generate_quad(quad, &mut registers, &mut text);
                }
            }

            registers.clear_immediates();
        }

        text.push('\n');
        text
    }

    /// Emission for the register-operand ops: loads for the source operands
    /// first, then the operation itself.
    fn generate_quad(quad: &Quad, registers: &mut RegisterFile, text: &mut String) {
        let ry = registers.get_register(&quad.arg1);
        let rz = registers.get_register(&quad.arg2);
        let rx = registers.get_register(&quad.result);

        text.push_str(&ry.text);
        text.push_str(&rz.text);

        match quad.op {
            QuadOp::Assign => {
                if let Operand::AddressRegDeref { byte } = quad.result {
                    let store = if byte { "sb" } else { "sw" };
                    text.push_str(&format!("{} {}, ($t8)\n", store, ry.reg));
                } else if let Operand::AddressRegDeref { byte } = quad.arg1 {
                    let load = if byte { "lb" } else { "lw" };
                    text.push_str(&format!("{} {}, ($t8)\n", load, rx.reg));
                    Self::write_through(quad, &rx.reg, text);
                } else if let Operand::Label(label) = &quad.arg1 {
                    text.push_str(&format!("la {}, {}\n", rx.reg, label));
                } else {
                    text.push_str(&format!("move {}, {}\n", rx.reg, ry.reg));
                    Self::write_through(quad, &rx.reg, text);
                }
            }
            QuadOp::Return => {
                if !ry.reg.is_empty() {
                    text.push_str(&format!("move $v0, {}\n", ry.reg));
                }
                text.push_str("jr $ra\n\n");
            }
            QuadOp::If => {
                text.push_str(&format!("bne $zero, {}, {}\n", ry.reg, quad.arg2));
            }
            QuadOp::IfNot => {
                text.push_str(&format!("beq $zero, {}, {}\n", ry.reg, quad.arg2));
            }
            QuadOp::ToStr => {
                Self::call_helper("to_string", &ry, &rz, &rx.reg, text);
            }
            QuadOp::Concat => {
                Self::call_helper("concat_string", &ry, &rz, &rx.reg, text);
            }
            QuadOp::Push => {
                text.push_str("addi $sp, -4\n");
                text.push_str(&format!("sw {}, ($sp)\n", ry.reg));
            }
            QuadOp::Pop => {
                text.push_str(&format!("lw {}, ($sp)\n", ry.reg));
                text.push_str("addi $sp, 4\n");
            }
            QuadOp::Mul => {
                text.push_str(&format!("mult {}, {}\n", ry.reg, rz.reg));
                text.push_str(&format!("mflo {}\n", rx.reg));
            }
            QuadOp::Div => {
                text.push_str(&format!("div {}, {}\n", ry.reg, rz.reg));
                text.push_str(&format!("mflo {}\n", rx.reg));
            }
            QuadOp::Not => {
                text.push_str(&format!("not {}, {}\n", rx.reg, ry.reg));
            }
            QuadOp::Sub if quad.arg2.is_none() => {
                text.push_str(&format!("sub {}, $zero, {}\n", rx.reg, ry.reg));
            }
            op => {
                if let Some(mnemonic) = op.mnemonic() {
                    text.push_str(&format!(
                        "{} {}, {}, {}\n",
                        mnemonic, rx.reg, ry.reg, rz.reg
                    ));
                }
            }
        }
    }

    /// Writes of `$s`-class registers go straight back to the backing cell,
    /// byte-wide for `B`-named results.
    fn write_through(quad: &Quad, target_reg: &str, text: &mut String) {
        if !target_reg.starts_with("$s") {
            return;
        }
        let result = quad.result.text();
        let store = if result.starts_with('B') { "sb" } else { "sw" };
        text.push_str(&format!("{} {}, {}\n", store, target_reg, result));
    }

    /// Common save/load/call/restore framing of the `to_str` and `concat`
    /// runtime calls.
    fn call_helper(
        helper: &str,
        ry: &super::registers::Register,
        rz: &super::registers::Register,
        result_reg: &str,
        text: &mut String,
    ) {
        text.push_str("addi $sp, -4\n");
        text.push_str("sw $a0, ($sp)\n");
        text.push_str("addi $sp, -4\n");
        text.push_str("sw $a1, ($sp)\n");

        if ry.reg.starts_with('(') {
            text.push_str(&format!("lw $a0, {}\n", ry.reg));
        } else {
            text.push_str(&format!("move $a0, {}\n", ry.reg));
        }
        if rz.reg == "$a0" {
            text.push_str("lw $a1, 4($sp)\n");
        } else if rz.reg.starts_with('(') {
            text.push_str(&format!("lw $a1, {}\n", rz.reg));
        } else {
            text.push_str(&format!("move $a1, {}\n", rz.reg));
        }

        text.push_str("addi $sp, -4\n");
        text.push_str("sw $ra, ($sp)\n");
        text.push_str(&format!("jal {}\n", helper));
        text.push_str("lw $ra, ($sp)\n");
        text.push_str("addi $sp, 4\n");
        text.push_str("lw $a1, ($sp)\n");
        text.push_str("addi $sp, 4\n");
        text.push_str("lw $a0, ($sp)\n");
        text.push_str("addi $sp, 4\n");
        text.push_str(&format!("move {}, $v0\n", result_reg));
    }
}
