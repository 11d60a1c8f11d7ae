pub mod compiscript_semantic_analyser;
pub(crate) mod context;
pub mod semantic_error;

// Concrete Definition Export
pub use self::compiscript_semantic_analyser::CompiScriptSemanticAnalyser;
pub use self::semantic_error::SemanticError;
