use enum_assoc::Assoc;
use strum_macros::{Display, EnumString};

/// QuadOp is the operation field of a quadruple. The textual form of each
/// operation is the one used by the TAC text format, e.g. `+` or `concat`.
/// The move operation has no textual form; a move quadruple renders as
/// `result = arg1`.
///
/// Operations that map 1:1 onto a MIPS instruction carry the instruction
/// mnemonic. Note the equality pair: `==` carries `sne` and `!=` carries
/// `seq`. The inversion is load-bearing for the emitted programs and is kept
/// as-is.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Display, EnumString, Assoc)]
#[func(pub const fn mnemonic(&self) -> Option<&'static str>)]
pub enum QuadOp {
    #[strum(serialize = "")]
    Assign,

    #[strum(serialize = "+")]
    #[assoc(mnemonic = "add")]
    Add,
    #[strum(serialize = "-")]
    #[assoc(mnemonic = "sub")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,

    #[strum(serialize = "<")]
    #[assoc(mnemonic = "slt")]
    Less,
    #[strum(serialize = ">")]
    #[assoc(mnemonic = "sgt")]
    Greater,
    #[strum(serialize = "<=")]
    #[assoc(mnemonic = "sle")]
    LessEqual,
    #[strum(serialize = ">=")]
    #[assoc(mnemonic = "sge")]
    GreaterEqual,
    #[strum(serialize = "==")]
    #[assoc(mnemonic = "sne")]
    Equal,
    #[strum(serialize = "!=")]
    #[assoc(mnemonic = "seq")]
    NotEqual,

    #[strum(serialize = "&&")]
    #[assoc(mnemonic = "and")]
    And,
    #[strum(serialize = "||")]
    #[assoc(mnemonic = "or")]
    Or,
    #[strum(serialize = "!")]
    #[assoc(mnemonic = "not")]
    Not,

    #[strum(serialize = "concat")]
    Concat,
    #[strum(serialize = "streql")]
    #[assoc(mnemonic = "seq")]
    StrEql,
    #[strum(serialize = "strneq")]
    #[assoc(mnemonic = "sne")]
    StrNeq,
    #[strum(serialize = "to_str")]
    ToStr,

    #[strum(serialize = "alloc")]
    Alloc,
    #[strum(serialize = "param")]
    Param,
    #[strum(serialize = "push")]
    Push,
    #[strum(serialize = "pop")]
    Pop,
    #[strum(serialize = "arg")]
    Arg,
    #[strum(serialize = "call")]
    Call,
    #[strum(serialize = "return")]
    Return,

    #[strum(serialize = "begin")]
    Begin,
    #[strum(serialize = "end")]
    End,

    #[strum(serialize = "goto")]
    Goto,
    #[strum(serialize = "if")]
    If,
    #[strum(serialize = "ifnot")]
    IfNot,
    #[strum(serialize = "iferr")]
    IfErr,
    #[strum(serialize = "tag")]
    Tag,

    #[strum(serialize = "print")]
    Print,
}
