use std::path::PathBuf;

use clap::Parser;

/// Build a Dewy grammar's RNGLR table and parse an input against it.
#[derive(Parser)]
#[command(name = "dewy-cc", bin_name = "dewy-cc")]
#[command(about = "Compiler-compiler for the Dewy meta-grammar language")]
pub struct Cli {
    /// Path to the grammar source (the extended-BNF meta-language).
    pub grammar: PathBuf,

    /// Name of the grammar's start rule (without the leading `#`).
    #[arg(long, default_value = "start")]
    pub start: String,

    /// Path to the input to parse; reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
}
