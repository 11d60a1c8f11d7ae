// External Modules
extern crate pest;
#[macro_use]
extern crate pest_derive;

// Internal Modules
mod compiler;

pub use compiler::{write_artifact, CompilationArtifacts, Compiler, CompilerError};
pub use compiler::semantic_analyser::SemanticError;
