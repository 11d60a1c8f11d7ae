use thiserror::Error;

/// Diagnostics surfaced by the semantic analyser. Each terminates
/// compilation; none is recovered or suppressed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SemanticError {
    #[error("line {line}: '{name}' was already defined in this scope")]
    Redefinition { name: String, line: usize },

    #[error("line {line}: '{name}' is not defined")]
    UndefinedAccess { name: String, line: usize },

    #[error("line {line}: mismatched types, expected '{expected}' found '{found}'")]
    NonMatchingTypes { expected: String, found: String, line: usize },

    #[error("line {line}: invalid type '{found}'")]
    InvalidType { found: String, line: usize },

    #[error("line {line}: property '{property}' isn't defined")]
    InvalidPropertyAccess { property: String, line: usize },

    #[error("line {line}: invalid suffix operation")]
    InvalidSuffix { line: usize },

    #[error("line {line}: invalid index value")]
    InvalidIndex { line: usize },

    #[error("line {line}: invalid use of '{keyword}' keyword")]
    InvalidKeywordUse { keyword: String, line: usize },

    #[error("line {line}: invalid declaration of '{name}'")]
    InvalidDeclaration { name: String, line: usize },

    #[error("line {line}: can't modify constant '{name}'")]
    ConstantModification { name: String, line: usize },

    #[error("line {line}: unreachable code")]
    UnreachableCode { line: usize },

    #[error("line {line}: incomplete call of function '{name}'")]
    IncompleteCall { name: String, line: usize },

    #[error("line {line}: function '{function}' must return a value of type '{expected}'")]
    MissingReturn { function: String, expected: String, line: usize },

    #[error("line {line}: expected {expected} arguments, received {found}")]
    NonMatchingArguments { expected: usize, found: usize, line: usize },
}
