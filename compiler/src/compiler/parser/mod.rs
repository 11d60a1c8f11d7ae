use super::ast::CstNode;
pub mod compiscript_pest_parser;

/// Parser handles interpretation of source text into the concrete syntax
/// tree the later passes walk. Syntax errors are returned as a rendered
/// diagnostic.
pub trait AstParser {
    /// Creates a default configuration of an AstParser
    fn default() -> Self;

    /// Parse a source string into a concrete syntax tree
    fn parse(self, source: &str) -> Result<CstNode, String>;
}

// Concrete Definition Export
pub use self::compiscript_pest_parser::PestCompiScriptParser;
