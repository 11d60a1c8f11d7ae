pub(crate) mod ast;
pub mod backend;
pub mod ir;
pub mod parser;
pub mod semantic_analyser;

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use compiscript_common::TacProgram;
use thiserror::Error;

use self::ast::SymbolTable;
use self::backend::MipsGenerator;
use self::ir::IrGenerator;
use self::parser::{AstParser, PestCompiScriptParser};
use self::semantic_analyser::{CompiScriptSemanticAnalyser, SemanticError};

/// Any failure that terminates a compilation.
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("Syntax Error: {0}")]
    Syntax(String),

    #[error("Semantic Error: {0}")]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything a compilation run produces: the scope tree for table dumps and
/// the quadruple stream the assembly is rendered from.
pub struct CompilationArtifacts {
    pub symbol_table: SymbolTable,
    pub tac: TacProgram,
}

impl CompilationArtifacts {
    /// Render the MIPS assembly for the compiled program.
    pub fn assembly(&self) -> String {
        MipsGenerator::new(&self.tac).generate_assembly()
    }
}

/// Compiler is the strictly pipelined front-to-back driver:
///
/// source -> AstParser -> CstNode tree -> SemanticAnalyser -> SymbolTable
///        -> IrGenerator -> quadruples -> MipsGenerator -> assembly
///
/// The analyser builds the scope tree; the IR generator replays the same
/// tree over a second walk of the parsed program, so both passes see scopes
/// in identical order.
pub struct Compiler;

impl Compiler {
    /// Compiles a source string into the compilation artifacts.
    pub fn compile_str(source: &str) -> Result<CompilationArtifacts, CompilerError> {
        let root = PestCompiScriptParser::default()
            .parse(source)
            .map_err(CompilerError::Syntax)?;

        let symbol_table = CompiScriptSemanticAnalyser::new().analyse(&root)?;
        let (tac, symbol_table) = IrGenerator::new(symbol_table).generate(&root);

        Ok(CompilationArtifacts { symbol_table, tac })
    }

    /// Compiles a source file into the compilation artifacts.
    /// @return: CompilationArtifacts if Ok. Otherwise an IO error from a
    /// failed read or the first compile error.
    pub fn compile(source_filename: &Path) -> Result<CompilationArtifacts, CompilerError> {
        let source_str = fs::read_to_string(source_filename)?;
        Self::compile_str(source_str.as_str())
    }
}

/// Write a produced artifact next to the working directory, e.g. `tac.ir`
/// or `mips.s`.
pub fn write_artifact(dest_filename: &Path, contents: &str) -> Result<(), CompilerError> {
    let mut file = File::create(dest_filename)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod test;
