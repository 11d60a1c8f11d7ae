extern crate strum;

pub mod quad;

pub use quad::{Operand, Quad, QuadOp, SpecialReg, TacProgram};
