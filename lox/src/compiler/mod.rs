//! Source-to-AST-to-bytecode pipeline: scanner, parser, resolver, and
//! the bytecode compiler. The tree-walking evaluator consumes this
//! module's AST directly; the bytecode VM consumes `compile`'s output.

pub mod ast;
pub mod compile;
pub mod lex;
pub mod parse;
pub mod resolve;
pub mod syntax;
pub mod token;
