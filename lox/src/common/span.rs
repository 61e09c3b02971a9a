use std::fmt;
use std::rc::Rc;

use crate::common::source::Source;

/// A region of a `Source`, used to point at where a token, AST node, or
/// runtime value came from when rendering a diagnostic. Unlike a `&str`
/// slice, a `Span` keeps a handle to the whole `Source` so it can recover
/// line/column information and render a caret-underlined snippet.
#[derive(Debug, Clone)]
pub struct Span {
    pub source: Rc<Source>,
    pub offset: usize,
    pub length: usize,
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
            && self.offset == other.offset
            && self.length == other.length
    }
}
impl Eq for Span {}

impl Span {
    pub fn new(source: &Rc<Source>, offset: usize, length: usize) -> Span {
        Span { source: Rc::clone(source), offset, length }
    }

    /// A zero-width span pointing at a single byte offset, used for
    /// end-of-file and single-character diagnostics.
    pub fn point(source: &Rc<Source>, offset: usize) -> Span {
        Span { source: Rc::clone(source), offset, length: 1 }
    }

    /// The source text this span covers.
    pub fn lexeme(&self) -> &str {
        &self.source.contents[self.offset..self.offset + self.length]
    }

    /// Combines two spans from the same source into the smallest span
    /// that covers both.
    pub fn combine(a: &Span, b: &Span) -> Span {
        assert!(Rc::ptr_eq(&a.source, &b.source), "can't combine spans from different sources");
        let offset = a.offset.min(b.offset);
        let end = (a.offset + a.length).max(b.offset + b.length);
        Span { source: Rc::clone(&a.source), offset, length: end - offset }
    }

    /// 1-indexed (line, column) of this span's start.
    fn start_line_col(&self) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;
        for ch in self.source.contents[..self.offset.min(self.source.contents.len())].chars() {
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn line(&self) -> usize {
        self.start_line_col().0
    }
}

impl fmt::Display for Span {
    /// Renders a single-line caret-underlined snippet:
    /// ```text
    /// 12 | x = 1 +;
    ///    |        ^
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line_no, col) = self.start_line_col();
        let line_text = self.source.contents.lines().nth(line_no - 1).unwrap_or("");
        let gutter = line_no.to_string();
        let pad = " ".repeat(gutter.len());

        writeln!(f, "{}:{}:{}", self.source, line_no, col)?;
        writeln!(f, "{} |", pad)?;
        writeln!(f, "{} | {}", gutter, line_text)?;
        write!(
            f,
            "{} | {}{}",
            pad,
            " ".repeat(col - 1),
            "^".repeat(self.length.max(1)),
        )
    }
}
