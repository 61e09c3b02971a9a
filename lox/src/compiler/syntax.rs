use std::fmt;

use crate::common::span::Span;

/// A single `Syntax` diagnostic, covering both scan errors (invalid
/// character, unterminated string) and parse errors (mismatched token,
/// bad assignment target, too many params/args). Rendered as
/// `[line N] Error<where>: <message>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    pub message: String,
    /// ` at 'LEXEME'`, ` at end`, or empty, depending on what produced the
    /// error.
    pub location: String,
    pub span: Span,
}

impl Syntax {
    pub fn error(message: impl Into<String>, location: impl Into<String>, span: Span) -> Syntax {
        Syntax { message: message.into(), location: location.into(), span }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.span.line(), self.location, self.message)
    }
}

/// Accumulates `Syntax` diagnostics across a scan/parse pass. The scanner
/// and parser never stop at the first error: they keep going and report
/// everything they found, but the driver must not go on to evaluate a
/// program that had any.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Syntax>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push(&mut self, error: Syntax) {
        self.errors.push(error);
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Syntax] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Syntax> {
        self.errors
    }
}
