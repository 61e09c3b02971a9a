//! The bytecode backend: a stack machine that executes `Chunk`s
//! produced by `compiler::compile`. Deliberately narrower than the
//! tree-walking evaluator -- no user-defined functions or closures.

pub mod vm;
