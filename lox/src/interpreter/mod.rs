//! The tree-walking backend: direct AST evaluation against an
//! `Environment` chain, with full support for closures and
//! user-defined functions.

pub mod control;
pub mod eval;
