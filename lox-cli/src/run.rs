use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use lox::common::source::Source;
use lox::compiler::ast;
use lox::compiler::lex::Lexer;
use lox::compiler::resolve;
use lox::compiler::syntax::Diagnostics;
use lox::construct::environment::Environment;
use lox::interpreter::eval::Interpreter;
use lox::Outcome;

use crate::cli::Opt;
use crate::disassemble::disassemble_chunk;
use crate::status::Status;

/// Runs the flag-gated pipeline against one file, returning the process
/// exit code: `0` clean, `65` a scan/parse/compile diagnostic, `70` a
/// runtime fault, `74` the file could not be read.
pub fn run_file(path: &Path, opt: &Opt) -> i32 {
    let source = match Source::path(path) {
        Ok(source) => Rc::new(source),
        Err(error) => {
            Status::fatal().log(&format!("Could not read '{}': {}", path.display(), error));
            return 74;
        },
    };

    run_source(source, opt)
}

fn run_source(source: Rc<Source>, opt: &Opt) -> i32 {
    if opt.tokens {
        let (tokens, diagnostics) = Lexer::lex(source);
        for token in &tokens {
            println!("{:<15} {}", format!("{:?}", token.kind), token.lexeme);
        }
        return report_diagnostics(&diagnostics);
    }

    let program = match lox::parse(Rc::clone(&source)) {
        Ok(program) => program,
        Err(diagnostics) => return report_diagnostics(&diagnostics),
    };

    if opt.ast {
        for stmt in &program {
            println!("{}", ast::print_stmt(stmt));
        }
        return 0;
    }

    if opt.disassemble {
        return match lox::compile(&program) {
            Ok(chunk) => {
                disassemble_chunk(&chunk, &source.to_string());
                if opt.no_execute {
                    0
                } else {
                    report_outcome(lox::run_vm_with(&program, opt.trace))
                }
            },
            Err(Outcome::Syntax(diagnostics)) => report_diagnostics(&diagnostics),
            Err(Outcome::Runtime(_)) => unreachable!("compile() never produces a runtime fault"),
        };
    }

    if opt.no_execute {
        return 0;
    }

    if opt.wants_vm() {
        report_outcome(lox::run_vm_with(&program, opt.trace))
    } else {
        report_outcome(lox::interpret(&program))
    }
}

fn report_diagnostics(diagnostics: &Diagnostics) -> i32 {
    for error in diagnostics.errors() {
        eprintln!("{}", error);
    }
    if diagnostics.had_error() {
        65
    } else {
        0
    }
}

fn report_outcome(outcome: Result<(), Outcome>) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(Outcome::Syntax(diagnostics)) => report_diagnostics(&diagnostics),
        Err(Outcome::Runtime(trace)) => {
            eprintln!("{}", trace);
            70
        },
    }
}

/// One `Interpreter` lives for the whole session so `var` and `fun`
/// declarations persist across lines -- each line is still scanned,
/// parsed, and resolved independently, so a mistyped line never
/// poisons the ones after it.
pub fn repl() -> i32 {
    Status::info().log("Lox REPL. Enter statements one line at a time; Ctrl+D to exit.");

    let globals = Environment::new();
    for (name, value) in lox::kernel::natives() {
        globals.define(name, value);
    }

    let mut line = String::new();
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return 74;
        }
        line.clear();
        let bytes_read = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => return 74,
        };
        if bytes_read == 0 {
            println!();
            return 0;
        }

        let source = Rc::new(Source::source(line.clone()));
        let program = match lox::parse(source) {
            Ok(program) => program,
            Err(diagnostics) => {
                report_diagnostics(&diagnostics);
                continue;
            },
        };

        let (locals, diagnostics) = resolve::resolve(&program);
        if diagnostics.had_error() {
            report_diagnostics(&diagnostics);
            continue;
        }

        let interpreter = Interpreter::with_globals(globals.clone(), locals);
        if let Err(trace) = interpreter.interpret(&program) {
            eprintln!("{}", trace);
        }
    }
}
