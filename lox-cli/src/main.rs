//! Command-line driver: parses flags, then hands off to either a
//! single-file run or a REPL. One flags struct rather than a
//! subcommand enum, since there is exactly one pipeline to run; the
//! flags just choose where it stops and which backend finishes it.

mod cli;
mod disassemble;
mod run;
mod status;

use structopt::clap::ErrorKind;
use structopt::StructOpt;

use crate::cli::Opt;
use crate::status::Status;

fn main() {
    let opt = match Opt::from_iter_safe(std::env::args_os()) {
        Ok(opt) => opt,
        Err(error) if matches!(error.kind, ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed) => {
            print!("{}", error);
            std::process::exit(0);
        },
        Err(error) => {
            eprint!("{}", error);
            std::process::exit(64);
        },
    };

    let code = match &opt.file {
        Some(path) => run::run_file(path, &opt),
        None => {
            if opt.tokens || opt.ast || opt.disassemble || opt.no_execute {
                Status::fatal().log("--tokens, --ast, --disassemble, and --no-execute require a file.");
                64
            } else {
                run::repl()
            }
        },
    };

    std::process::exit(code);
}
