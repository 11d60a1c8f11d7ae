pub(super) mod cst;
pub(super) mod symbol;
pub(super) mod symbol_table;

/// Index of a scope in the symbol table arena.
pub type ScopeId = usize;

pub(super) use self::cst::CstNode;
pub(super) use self::symbol::{Symbol, SymbolDataType, SymbolKind};
pub(super) use self::symbol_table::SymbolTable;
