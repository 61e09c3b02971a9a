use std::path::PathBuf;

use structopt::StructOpt;

/// `lox [flags] [file]`. One binary, one pipeline, no subcommands --
/// just a handful of flags that each stop the pipeline one stage
/// earlier than the last.
#[derive(StructOpt, Debug)]
#[structopt(name = "lox", bin_name = "lox", about = "A Lox interpreter")]
pub struct Opt {
    /// Scans `file` and prints its tokens, one per line, then stops.
    #[structopt(long)]
    pub tokens: bool,

    /// Parses `file` and prints its AST in parenthesized form, then stops.
    #[structopt(long)]
    pub ast: bool,

    /// Compiles `file` to bytecode and prints the disassembled chunk.
    /// Runs the bytecode backend rather than the tree-walking one.
    #[structopt(long)]
    pub disassemble: bool,

    /// Runs on the bytecode backend, printing the stack and the opcode
    /// about to dispatch before every instruction.
    #[structopt(long)]
    pub trace: bool,

    /// Parses (and compiles, if `--disassemble` or `--trace` is also
    /// given) without executing.
    #[structopt(short = "n", long = "no-execute")]
    pub no_execute: bool,

    /// Source file to run. Omit to start a REPL.
    pub file: Option<PathBuf>,
}

impl Opt {
    /// Whether any flag selects the bytecode backend over the default
    /// tree-walking one.
    pub fn wants_vm(&self) -> bool {
        self.disassemble || self.trace
    }
}
