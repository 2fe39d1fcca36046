/// A zero-indexed `(line, col)` pair, as described in spec §4.2.
///
/// `col` is measured from the byte just past the previous newline, not from
/// a grapheme or character count — matching the byte-oriented scanner.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub struct Position {
    /// Zero-indexed line number.
    pub line: u32,
    /// Zero-indexed column, measured in bytes from the start of the line.
    pub col: u32,
}

impl Position {
    pub(crate) const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
