pub mod operand;
pub mod ops;

pub use self::operand::{Operand, SpecialReg};
pub use self::ops::QuadOp;

use std::fmt;

/// A single four-address record `(op, arg1, arg2, result)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub op: QuadOp,
    pub arg1: Operand,
    pub arg2: Operand,
    pub result: Operand,
}

impl Quad {
    pub fn new(op: QuadOp, arg1: Operand, arg2: Operand, result: Operand) -> Self {
        Quad { op, arg1, arg2, result }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = format!("{} {} {}", self.op, self.arg1, self.arg2);
        if self.result.is_none() {
            write!(f, "{}", body.trim())
        } else {
            write!(f, "{} = {}", self.result, body.trim())
        }
    }
}

/// TacProgram is the ordered quadruple stream produced by the IR generator.
/// Its display form is the `tac.ir` text format, one quadruple per line as
/// `result = op arg1 arg2`, with the `result = ` prefix omitted when the
/// quadruple has no result.
#[derive(Debug, Clone, Default)]
pub struct TacProgram {
    pub quadruplets: Vec<Quad>,
}

impl TacProgram {
    pub fn new(quadruplets: Vec<Quad>) -> Self {
        TacProgram { quadruplets }
    }

    pub fn len(&self) -> usize {
        self.quadruplets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quadruplets.is_empty()
    }
}

impl fmt::Display for TacProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for quad in &self.quadruplets {
            writeln!(f, "{}", quad)?;
        }
        Ok(())
    }
}

/// Quadruple formatting tests
#[cfg(test)]
mod tests {
    use super::operand::SpecialReg;
    use super::{Operand, Quad, QuadOp, TacProgram};

    #[test]
    fn quad_with_result_renders_the_assignment_form() {
        let quad = Quad::new(
            QuadOp::Add,
            Operand::Immediate(String::from("5")),
            Operand::StackTemp(String::from("t0")),
            Operand::StackTemp(String::from("t1")),
        );
        assert_eq!(format!("{}", quad), "t1 = + 5 t0");
    }

    #[test]
    fn move_quad_renders_without_an_op() {
        let quad = Quad::new(
            QuadOp::Assign,
            Operand::StackTemp(String::from("t1")),
            Operand::None,
            Operand::ScopedLocal(String::from("W0_x")),
        );
        assert_eq!(format!("{}", quad), "W0_x = t1");
    }

    #[test]
    fn resultless_quad_renders_the_bare_op() {
        let quad = Quad::new(
            QuadOp::Goto,
            Operand::Label(String::from("l4")),
            Operand::None,
            Operand::None,
        );
        assert_eq!(format!("{}", quad), "goto l4");

        let print = Quad::new(QuadOp::Print, Operand::None, Operand::None, Operand::None);
        assert_eq!(format!("{}", print), "print");
    }

    #[test]
    fn special_operands_render_their_reserved_names() {
        assert_eq!(Operand::Special(SpecialReg::Ret).text(), "ret");
        assert_eq!(Operand::Special(SpecialReg::Print).text(), "p");
        assert_eq!(Operand::AddressReg.text(), "i");
        assert_eq!(Operand::AddressRegDeref { byte: true }.text(), "i*");
    }

    #[test]
    fn program_renders_one_quad_per_line() {
        let program = TacProgram::new(vec![
            Quad::new(
                QuadOp::Tag,
                Operand::Label(String::from("l0")),
                Operand::None,
                Operand::None,
            ),
            Quad::new(
                QuadOp::Return,
                Operand::Immediate(String::from("1")),
                Operand::None,
                Operand::None,
            ),
        ]);
        assert_eq!(format!("{}", program), "tag l0\nreturn 1\n");
    }

    #[test]
    fn inverted_equality_mnemonics_are_preserved() {
        assert_eq!(QuadOp::Equal.mnemonic(), Some("sne"));
        assert_eq!(QuadOp::NotEqual.mnemonic(), Some("seq"));
    }
}
