mod ir_generator;

// Concrete Definition Export
pub use self::ir_generator::IrGenerator;
