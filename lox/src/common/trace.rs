use std::fmt;

use crate::common::span::Span;

/// A runtime error raised while executing an already-compiled program --
/// a type mismatch, an undefined variable, or a bad callee/arity.
/// Distinct from `Syntax`: a `Trace` can only occur once compilation has
/// already succeeded. Carries a bare line number rather than a call
/// stack -- the bytecode backend only ever has a line table (no
/// `Source` handle) to report from, so both backends report the same
/// way.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub message: String,
    pub line: u32,
}

impl Trace {
    pub fn error(message: impl Into<String>, line: u32) -> Trace {
        Trace { message: message.into(), line }
    }

    pub fn at(message: impl Into<String>, span: &Span) -> Trace {
        Trace { message: message.into(), line: span.line() as u32 }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n[line {}]", self.message, self.line)
    }
}
