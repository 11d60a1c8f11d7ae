mod ir_test;
mod mips_test;
mod semantic_fail_test;
mod symbol_table_test;

use super::{CompilationArtifacts, Compiler};

/// Compile a source snippet, panicking on any error.
fn compile(source: &str) -> CompilationArtifacts {
    match Compiler::compile_str(source) {
        Ok(artifacts) => artifacts,
        Err(error) => panic!("program failed to compile: {}", error),
    }
}

/// Whitespace-insensitive comparison form used by the golden tests: every
/// line is trimmed and internally collapsed, empty lines are dropped.
fn normalized(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
