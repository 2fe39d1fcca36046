use crate::position::Position;

/// A single, source-located diagnostic message.
///
/// Rendered the way the worked examples in the specification show:
///
/// ```text
/// (memory):2:1: error: expected end of document
/// key2: value2
/// ^~~~~~~~~~~~
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Diagnostic {
    /// Placeholder path; the core never reads from a file.
    pub path: &'static str,
    /// The position the diagnostic points at.
    pub position: Position,
    /// The full text of the offending line, without its line terminator.
    pub line_text: String,
    /// Column where the caret span begins (leading whitespace is skipped).
    pub span_start: u32,
    /// Column where the caret span ends (exclusive, trailing whitespace trimmed).
    pub span_end: u32,
    /// Human-readable message, e.g. "expected end of document".
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{}:{}:{}: error: {}",
            self.path,
            self.position.line + 1,
            self.position.col + 1,
            self.message
        )?;
        writeln!(f, "{}", self.line_text)?;
        let start = self.span_start as usize;
        let end = self.span_end.max(self.span_start + 1) as usize;
        let mut marker = String::with_capacity(end);
        for _ in 0..start {
            marker.push(' ');
        }
        marker.push('^');
        for _ in start + 1..end {
            marker.push('~');
        }
        write!(f, "{marker}")
    }
}

/// An append-only sink of diagnostics. The parser enqueues into it exactly
/// once before returning [`ParseError::ParseFailure`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticBundle {
    entries: Vec<Diagnostic>,
}

impl DiagnosticBundle {
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// All diagnostics enqueued so far, in the order they were raised.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// True if nothing has been enqueued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors raised while tokenizing and parsing a document stream.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The token stream ran out mid-construct.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A token appeared where the grammar forbids it.
    #[error("{}:{}: unexpected token", position.line, position.col)]
    UnexpectedToken { position: Position },
    /// An indentation or flow-content rule was violated.
    #[error("{}:{}: malformed yaml: {}", position.line, position.col, message)]
    MalformedYaml { position: Position, message: String },
    /// An unrecognized `\x` or `'x` escape.
    #[error("{}:{}: invalid escape sequence", position.line, position.col)]
    InvalidEscapeSequence { position: Position },
    /// Reserved for explicit nested-document rejection; not raised by the
    /// current grammar.
    #[error("nested documents are not supported")]
    NestedDocuments,
    /// A rich diagnostic was enqueued; render the contained [`Diagnostic`]
    /// for the caller.
    #[error("{diagnostic}")]
    ParseFailure { diagnostic: Diagnostic },
}

/// Errors raised while materializing a node into a [`crate::value::Value`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ValueError {
    /// A mapping contained the same key twice.
    #[error("{}:{}: duplicate map key {:?}", position.line, position.col, key)]
    DuplicateMapKey { position: Position, key: String },
}

/// Errors raised while decoding a [`crate::value::Value`] into a host type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The value did not have the shape the target type requires.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A required struct field was absent from the mapping.
    #[error("missing struct field {field:?}")]
    StructFieldMissing { field: &'static str },
    /// A fixed-size array target did not receive a matching-length sequence.
    #[error("expected array of length {expected}, found {found}")]
    ArraySizeMismatch { expected: usize, found: usize },
    /// None of a tagged union's variants accepted the value.
    #[error("no variant of the tagged union accepted the value")]
    UntaggedUnion,
    /// A tagged union's discriminant field was missing.
    #[error("union tag field {field:?} is missing")]
    UnionTagMissing { field: &'static str },
    /// A numeric value did not fit the target type.
    #[error("value overflows target type")]
    Overflow,
}

/// Errors raised while encoding a host value into a [`crate::value::Value`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// A list element's encoding produced "absent" where a value was
    /// required.
    #[error("cannot encode value")]
    CannotEncodeValue,
    /// An integer value did not fit in `i64` (spec §4.6: "overflow to i64 =
    /// `Overflow`").
    #[error("value overflows target type")]
    Overflow,
}

/// The crate's top-level error, unifying every stage for the convenience
/// entry points in [`crate::load`] and [`crate::decode`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// The exact rendering spec §4.3.8 and §8 scenario 6 show for a
    /// malformed two-document stream.
    #[test]
    fn diagnostic_renders_the_worked_example_format() {
        let diagnostic = Diagnostic {
            path: "(memory)",
            position: Position { line: 1, col: 0 },
            line_text: "key2: value2".to_string(),
            span_start: 0,
            span_end: 12,
            message: "expected end of document".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "(memory):2:1: error: expected end of document\nkey2: value2\n^~~~~~~~~~~~"
        );
    }

    #[test]
    fn diagnostic_caret_skips_leading_whitespace() {
        let diagnostic = Diagnostic {
            path: "(memory)",
            position: Position { line: 0, col: 2 },
            line_text: "  key: value".to_string(),
            span_start: 2,
            span_end: 12,
            message: "oops".to_string(),
        };
        let rendered = diagnostic.to_string();
        let caret_line = rendered.lines().nth(2).unwrap();
        assert!(caret_line.starts_with("  ^"));
    }

    #[test]
    fn diagnostic_bundle_is_append_only_and_ordered() {
        let mut bundle = DiagnosticBundle::default();
        assert!(bundle.is_empty());
        bundle.push(Diagnostic {
            path: "(memory)",
            position: Position { line: 0, col: 0 },
            line_text: String::new(),
            span_start: 0,
            span_end: 0,
            message: "first".to_string(),
        });
        bundle.push(Diagnostic {
            path: "(memory)",
            position: Position { line: 1, col: 0 },
            line_text: String::new(),
            span_start: 0,
            span_end: 0,
            message: "second".to_string(),
        });
        assert_eq!(bundle.entries().len(), 2);
        assert_eq!(bundle.entries()[0].message, "first");
        assert_eq!(bundle.entries()[1].message, "second");
    }
}
