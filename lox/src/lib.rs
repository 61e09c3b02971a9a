//! A Lox implementation with two interchangeable backends sharing one
//! front end: scan, parse, resolve once, then either walk the AST
//! directly or compile it to bytecode and run it on a small stack
//! machine. This crate holds the pipeline; `lox-cli` is the driver
//! that reads source and reports results.

pub mod common;
pub mod compiler;
pub mod construct;
pub mod interpreter;
pub mod kernel;
pub mod vm;

use std::rc::Rc;

use common::chunk::Chunk;
use common::source::Source;
use common::trace::Trace;
use compiler::ast::Stmt;
use compiler::syntax::Diagnostics;

/// Scans and parses `source` into a program, reporting every scan and
/// parse diagnostic it finds along the way. An `Err` here means at
/// least one of those diagnostics fired; the caller should print them
/// and stop rather than go on to resolve, compile, or run anything.
pub fn parse(source: Rc<Source>) -> Result<Vec<Stmt>, Diagnostics> {
    let (tokens, lex_diagnostics) = compiler::lex::Lexer::lex(source);
    let (program, parse_diagnostics) = compiler::parse::Parser::parse(tokens);

    let mut diagnostics = lex_diagnostics;
    for error in parse_diagnostics.into_errors() {
        diagnostics.push(error);
    }

    if diagnostics.had_error() {
        Err(diagnostics)
    } else {
        Ok(program)
    }
}

/// Runs `program` on the tree-walking evaluator: resolves it first, then
/// evaluates. A resolver error is reported the same way a parse error
/// would be; a resolved program that then faults at runtime reports via
/// `Trace`.
pub fn interpret(program: &[Stmt]) -> Result<(), Outcome> {
    let (locals, diagnostics) = compiler::resolve::resolve(program);
    if diagnostics.had_error() {
        return Err(Outcome::Syntax(diagnostics));
    }

    interpreter::eval::Interpreter::new(locals).interpret(program).map_err(Outcome::Runtime)
}

/// Compiles `program` to a `Chunk` and runs it on the bytecode VM. Like
/// `interpret`, a compile-time fault and a run-time fault are reported
/// through distinct `Outcome` variants.
pub fn run_vm(program: &[Stmt]) -> Result<(), Outcome> {
    run_vm_with(program, false)
}

/// Same as `run_vm`, with the VM's `--trace` dispatch log switched on.
pub fn run_vm_with(program: &[Stmt], trace: bool) -> Result<(), Outcome> {
    let chunk = compile(program)?;
    vm::vm::Vm::new(&chunk).with_trace(trace).run().map_err(Outcome::Runtime)
}

/// Compiles `program` to a `Chunk` without running it -- used by both
/// `run_vm` and the CLI's `--disassemble` flag.
pub fn compile(program: &[Stmt]) -> Result<Chunk, Outcome> {
    let (chunk, diagnostics) = compiler::compile::compile(program);
    if diagnostics.had_error() {
        Err(Outcome::Syntax(diagnostics))
    } else {
        Ok(chunk)
    }
}

/// Either stage of failure a driver needs to distinguish to pick an
/// exit code: compile-time versus runtime.
#[derive(Debug)]
pub enum Outcome {
    Syntax(Diagnostics),
    Runtime(Trace),
}
