use std::fmt;

/// Scratch slots with a fixed register binding in the backend.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SpecialReg {
    /// Function return value slot, bound to `$v0`.
    Ret,
    /// The slot consumed by `print`, bound to `$v1`.
    Print,
    /// Bounds-check error flag, bound to `$t8`.
    Err,
    /// Active exception handler address, bound to `$t9`.
    Catch,
    /// Switch-case comparison result, bound to `$t9`.
    Case,
    /// Stashed switch condition, bound to `$t8`.
    Switch,
}

impl SpecialReg {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SpecialReg::Ret => "ret",
            SpecialReg::Print => "p",
            SpecialReg::Err => "err",
            SpecialReg::Catch => "catch",
            SpecialReg::Case => "case",
            SpecialReg::Switch => "switch",
        }
    }
}

/// A quadruple operand. The tag tells the backend how to materialise the
/// operand without inspecting name prefixes:
///
///   + `Immediate` is a literal in source form (`42`, `true`, `"hi"`, `null`).
///   + `Label` is a code label (`l0`, `F0_main`, `err_bad_index`); labels are
///     never materialised in registers.
///   + `ScopedLocal` is a named `.data` cell (`W0_x`, `S1_nombre`, `str0`).
///   + `StackTemp` is a statement-local temporary (`t0`..).
///   + `AddressReg` is the scratch address register `i`; `AddressRegDeref` is
///     the load or store through it, with the access width of the value.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Operand {
    None,
    Immediate(String),
    Label(String),
    ScopedLocal(String),
    StackTemp(String),
    Special(SpecialReg),
    AddressReg,
    AddressRegDeref { byte: bool },
}

impl Operand {
    pub fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }

    /// The textual form used by the TAC format and as the key of the backend
    /// variable descriptor.
    pub fn text(&self) -> String {
        match self {
            Operand::None => String::new(),
            Operand::Immediate(text)
            | Operand::Label(text)
            | Operand::ScopedLocal(text)
            | Operand::StackTemp(text) => text.clone(),
            Operand::Special(reg) => reg.as_str().to_string(),
            Operand::AddressReg => String::from("i"),
            Operand::AddressRegDeref { .. } => String::from("i*"),
        }
    }

    /// True for `t0`, the temporary that marks statement boundaries.
    pub fn is_first_temp(&self) -> bool {
        matches!(self, Operand::StackTemp(name) if name == "t0")
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}
