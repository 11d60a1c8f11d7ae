// External Modules
extern crate exitcode;
#[macro_use]
extern crate simple_error;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;

use compiscript_compiler::{write_artifact, CompilationArtifacts, Compiler};

/// Command Line interface struct
/// Describes possible arguments using the clap library
#[derive(Parser)]
struct CompilerCLIOptions {
    /// Path of file to compile. CompiScript source files end in .cps
    #[clap(parse(from_os_str))]
    path: PathBuf,

    /// Output selection flags, any of:
    /// -print-tables (dump the scope tree),
    /// -tac (write tac.ir),
    /// -mips (write mips.s)
    #[clap(allow_hyphen_values = true)]
    options: Vec<String>,
}

impl CompilerCLIOptions {
    /// Validates the source path and the option words before any file is
    /// touched.
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        match self.path.extension() {
            Some(extension) if extension == "cps" => {}
            _ => bail!("invalid file given, expected a .cps source"),
        }
        for option in &self.options {
            match option.as_str() {
                "-print-tables" | "-tac" | "-mips" => {}
                unknown => bail!("unknown option '{}'", unknown),
            }
        }
        Ok(())
    }

    /// Writes the artifacts requested by the option flags.
    fn emit(&self, artifacts: &CompilationArtifacts) -> Result<(), Box<dyn Error>> {
        for option in &self.options {
            match option.as_str() {
                "-print-tables" => print!("{}", artifacts.symbol_table),
                "-tac" => write_artifact(Path::new("tac.ir"), &artifacts.tac.to_string())?,
                "-mips" => write_artifact(Path::new("mips.s"), &artifacts.assembly())?,
                _ => {}
            }
        }
        Ok(())
    }
}

fn main() {
    // Parse Command line arguments
    let cli_args = CompilerCLIOptions::parse();

    if let Err(why) = cli_args.validate() {
        eprintln!("Error: {}", why);
        std::process::exit(1);
    }

    let artifacts = match Compiler::compile(cli_args.path.as_path()) {
        Ok(artifacts) => artifacts,
        Err(why) => {
            eprintln!("Error: {}", why);
            std::process::exit(1);
        }
    };

    match cli_args.emit(&artifacts) {
        Ok(_) => std::process::exit(exitcode::OK),
        Err(why) => {
            eprintln!("Error: {}", why);
            std::process::exit(1);
        }
    }
}
