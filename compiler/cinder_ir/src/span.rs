//! Source locations.

use std::fmt;

/// Source location of an AST node.
///
/// Lines and columns are 1-based; `Span::DUMMY` marks synthesized nodes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    /// Placeholder location for generated code.
    pub const DUMMY: Span = Span { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }

    /// Whether this span points at real source text.
    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            f.write_str("<generated>")
        } else {
            write!(f, "line {}, column {}", self.line, self.column)
        }
    }
}
