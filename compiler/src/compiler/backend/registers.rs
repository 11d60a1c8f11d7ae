use std::collections::HashMap;

use compiscript_common::{Operand, SpecialReg};
use regex::Regex;

/// A materialised operand: the register naming it and the load code (possibly
/// empty) that brings the value into that register.
#[derive(Debug, Default, Clone)]
pub struct Register {
    pub reg: String,
    pub text: String,
}

impl Register {
    fn fixed(reg: &str) -> Self {
        Register { reg: reg.to_string(), text: String::new() }
    }
}

/// RegisterFile tracks the three allocatable register classes.
///
///   + `$t0..$t7` hold statement-local names (no underscore in the name).
///   + `$s0..$s7` hold scope-qualified locals (underscore in the name);
///     writes to them are followed by a store to the backing cell.
///   + `$a0..$a3` are bound by `arg` in the callee prologue and written by
///     `param` in the caller prologue.
///
/// The register descriptor maps each physical register to the name it holds;
/// the variable descriptor maps each name to the registers holding it.
/// Allocation reuses a register already holding the name, then an empty
/// register of the class, then evicts a register whose name has another
/// recorded copy.
pub struct RegisterFile {
    temporaries: [String; 8],
    saved: [String; 8],
    args: [String; 4],
    variables: HashMap<String, Vec<String>>,
    integer: Regex,
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            temporaries: Default::default(),
            saved: Default::default(),
            args: Default::default(),
            variables: HashMap::new(),
            integer: Regex::new("^[0-9]+$").expect("valid integer pattern"),
        }
    }

    pub fn get_register(&mut self, operand: &Operand) -> Register {
        match operand {
            Operand::None | Operand::Label(_) => Register::default(),
            Operand::Special(SpecialReg::Err) | Operand::Special(SpecialReg::Switch) => {
                Register::fixed("$t8")
            }
            Operand::Special(SpecialReg::Catch) | Operand::Special(SpecialReg::Case) => {
                Register::fixed("$t9")
            }
            Operand::Special(SpecialReg::Ret) => Register::fixed("$v0"),
            Operand::Special(SpecialReg::Print) => Register::fixed("$v1"),
            Operand::AddressReg => Register::fixed("$t8"),
            Operand::AddressRegDeref { .. } => Register::fixed("($t8)"),
            Operand::Immediate(name) | Operand::ScopedLocal(name) | Operand::StackTemp(name) => {
                self.named_register(name)
            }
        }
    }

    fn named_register(&mut self, name: &str) -> Register {
        // Already materialised somewhere?
        for (index, held) in self.temporaries.iter().enumerate() {
            if held == name {
                return Register::fixed(&format!("$t{}", index));
            }
        }
        for (index, held) in self.saved.iter().enumerate() {
            if held == name {
                return Register::fixed(&format!("$s{}", index));
            }
        }
        for (index, held) in self.args.iter().enumerate() {
            if held == name {
                return Register::fixed(&format!("$a{}", index));
            }
        }

        // Empty register of the appropriate class.
        let saved_class = name.contains('_');
        let class_prefix = if saved_class { "$s" } else { "$t" };
        let registers = if saved_class { &self.saved } else { &self.temporaries };
        if let Some(index) = registers.iter().position(|held| held.is_empty()) {
            let reg = format!("{}{}", class_prefix, index);
            let text = self.load_text(name, &reg);
            self.assign(saved_class, index, name, &reg);
            return Register { reg, text };
        }

        self.spill_or_assign(name)
    }

    /// Evict a register of the class whose current name has another copy
    /// recorded in the variable descriptor.
    fn spill_or_assign(&mut self, name: &str) -> Register {
        let saved_class = name.contains('_');
        let class_prefix = if saved_class { "$s" } else { "$t" };

        for index in 0..8 {
            let held = if saved_class {
                self.saved[index].clone()
            } else {
                self.temporaries[index].clone()
            };
            let copies = self.variables.get(&held).map(Vec::len).unwrap_or(0);
            if copies > 1 {
                let reg = format!("{}{}", class_prefix, index);
                let text = self.load_text(name, &reg);
                if let Some(copies) = self.variables.get_mut(&held) {
                    copies.retain(|existing| existing != &reg);
                }
                self.assign(saved_class, index, name, &reg);
                return Register { reg, text };
            }
        }

        Register::default()
    }

    fn assign(&mut self, saved_class: bool, index: usize, name: &str, reg: &str) {
        if saved_class {
            self.saved[index] = name.to_string();
        } else {
            self.temporaries[index] = name.to_string();
        }
        if !self.integer.is_match(name) {
            self.variables
                .entry(name.to_string())
                .or_default()
                .push(reg.to_string());
        }
    }

    /// Load code for a name entering a register: `li` for immediates, `la`
    /// for label addresses of strings and `S`-prefixed storage, `lb` for
    /// byte cells, `lw` otherwise.
    fn load_text(&self, name: &str, reg: &str) -> String {
        if self.integer.is_match(name) {
            return format!("li {}, {}\n", reg, name);
        }
        match name {
            "true" => return format!("li {}, 1\n", reg),
            "false" | "null" => return format!("li {}, 0\n", reg),
            _ => {}
        }
        if name.starts_with("str") || name.starts_with('S') {
            format!("la {}, {}\n", reg, name)
        } else if name.starts_with('B') {
            format!("lb {}, {}\n", reg, name)
        } else {
            format!("lw {}, {}\n", reg, name)
        }
    }

    /// Bind an argument register in the callee prologue.
    pub fn bind_arg(&mut self, index: usize, name: String) {
        if index < self.args.len() {
            self.args[index] = name;
        }
    }

    /// Statement boundary: statement-local temporaries are dead.
    pub fn clear_statement_temps(&mut self) {
        for index in 0..self.temporaries.len() {
            if self.temporaries[index].starts_with('t') {
                self.release(index);
            }
        }
    }

    /// Immediates are not kept live across quadruples.
    pub fn clear_immediates(&mut self) {
        for index in 0..self.temporaries.len() {
            if self.integer.is_match(&self.temporaries[index]) {
                self.temporaries[index].clear();
            }
        }
    }

    /// Function entry invalidates every temporary register.
    pub fn clear_all_temporaries(&mut self) {
        for index in 0..self.temporaries.len() {
            self.release(index);
        }
    }

    fn release(&mut self, index: usize) {
        let held = std::mem::take(&mut self.temporaries[index]);
        if held.is_empty() {
            return;
        }
        let reg = format!("$t{}", index);
        if let Some(copies) = self.variables.get_mut(&held) {
            copies.retain(|existing| existing != &reg);
            if copies.is_empty() {
                self.variables.remove(&held);
            }
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        RegisterFile::new()
    }
}
