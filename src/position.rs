//! Source positions for specification fields.
//! Every user-supplied string in a spec document carries the position it
//! was read from, so that errors can point back into the YAML file.

use std::fmt;

/// A (file, line, column) triple. Lines and columns are 1-based; a
/// line of 0 means the exact location could not be determined and only
/// the file name is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self { file: file.into(), line, column }
    }

    /// A position that names the file but no exact location.
    pub fn unknown(file: impl Into<String>) -> Self {
        Self { file: file.into(), line: 0, column: 0 }
    }

    /// Composite position for errors raised inside an expanded string:
    /// the field's own position advanced by the expander's internal line
    /// offset.
    pub fn offset_line(&self, lines: usize) -> Position {
        if self.line == 0 || lines == 0 {
            return self.clone();
        }
        Position { file: self.file.clone(), line: self.line + lines, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// A value paired with the position it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub value: T,
    pub pos: Position,
}

impl<T> Spanned<T> {
    pub fn new(value: T, pos: Position) -> Self {
        Self { value, pos }
    }
}

impl Spanned<String> {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// Recovers positions for scalar values after a serde pass.
///
/// serde_yaml does not expose value spans, so the parser re-scans the
/// raw document for each scalar in document order, starting from a
/// moving cursor. Values that cannot be found again (block scalars,
/// repeated text) degrade to a file-only position.
pub struct PositionIndexer<'a> {
    src: &'a str,
    file: String,
    cursor: usize,
}

impl<'a> PositionIndexer<'a> {
    pub fn new(src: &'a str, file: impl Into<String>) -> Self {
        Self { src, file: file.into(), cursor: 0 }
    }

    /// Locates the next occurrence of `needle` at or after the cursor
    /// and advances past it. Falls back to searching from the start of
    /// the document (without moving the cursor) for out-of-order hits.
    pub fn locate(&mut self, needle: &str) -> Position {
        if !needle.is_empty() {
            if let Some(off) = self.src[self.cursor..].find(needle) {
                let at = self.cursor + off;
                self.cursor = at + needle.len();
                return self.position_at(at);
            }
            if let Some(at) = self.src.find(needle) {
                return self.position_at(at);
            }
        }
        Position::unknown(self.file.clone())
    }

    fn position_at(&self, byte: usize) -> Position {
        let before = &self.src[..byte];
        let line = before.bytes().filter(|b| *b == b'\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Position::new(self.file.clone(), line, byte - line_start + 1)
    }
}
