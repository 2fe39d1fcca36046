use crate::token::{Token, TokenId};

/// The tokenizer's implicit string-mode state (spec §4.1).
///
/// This is the one piece of state that makes the scanner context-sensitive:
/// whether a `'` or `"` opens/closes a quoted run, and whether `\` begins an
/// escape, depends on which mode we're currently in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StringMode {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

const LITERAL_TERMINATORS: &[u8] = b"\r\n \'\",:]}";

/// A single-pass byte scanner. Construct with [`Scanner::new`] and drain via
/// [`Scanner::scan`]; the scanner itself never fails (spec §4.1 "Failure").
pub struct Scanner<'s> {
    source: &'s [u8],
    pos: usize,
    mode: StringMode,
    line: u32,
    line_start: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            mode: StringMode::Unquoted,
            line: 0,
            line_start: 0,
        }
    }

    /// Drive the scanner to completion, returning every token (terminated by
    /// exactly one `eof`) paired with its `(line, col)`.
    ///
    /// Tokenizer coverage invariant (spec §8): concatenating
    /// `source[t.start..t.end]` over every non-`eof` token reconstructs
    /// `source` exactly.
    pub fn scan(mut self) -> (Vec<Token>, Vec<crate::position::Position>) {
        let mut tokens = Vec::new();
        let mut positions = Vec::new();
        loop {
            let position = self.position_at(self.pos);
            let token = self.next();
            let is_eof = matches!(token.id, TokenId::Eof);
            tokens.push(token);
            positions.push(position);
            if is_eof {
                break;
            }
        }
        (tokens, positions)
    }

    fn position_at(&self, offset: usize) -> crate::position::Position {
        crate::position::Position::new(self.line, (offset - self.line_start) as u32)
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.source.get(offset).copied()
    }

    fn next(&mut self) -> Token {
        let Some(first) = self.byte_at(self.pos) else {
            let end = self.source.len() as u32;
            return Token::new(TokenId::Eof, end, end);
        };
        let start = self.pos;

        match first {
            b',' => self.single(TokenId::Comma),
            b'[' => self.single(TokenId::FlowSeqStart),
            b']' => self.single(TokenId::FlowSeqEnd),
            b'{' => self.single(TokenId::FlowMapStart),
            b'}' => self.single(TokenId::FlowMapEnd),
            b':' => self.single(TokenId::MapValueInd),
            b'&' => self.single(TokenId::Anchor),
            b'*' => self.single(TokenId::Alias),
            b'!' => self.single(TokenId::Tag),
            b'\n' => self.newline(start),
            b'\r' => self.carriage_return(start),
            b' ' => self.run(start, b' ', TokenId::Space),
            b'\t' => self.run(start, b'\t', TokenId::Tab),
            b'#' => self.comment(start),
            b'\'' => self.single_quote(start),
            b'"' => self.double_quote(start),
            b'\\' if self.mode == StringMode::DoubleQuoted => self.backslash_escape(start),
            b'-' => self.hyphen(start),
            b'.' => self.dot(start),
            _ => self.literal(start),
        }
    }

    fn single(&mut self, id: TokenId) -> Token {
        let start = self.pos;
        self.pos += 1;
        Token::new(id, start as u32, self.pos as u32)
    }

    fn newline(&mut self, start: usize) -> Token {
        self.pos += 1;
        let token = Token::new(TokenId::NewLine, start as u32, self.pos as u32);
        self.line += 1;
        self.line_start = self.pos;
        token
    }

    fn carriage_return(&mut self, start: usize) -> Token {
        self.pos += 1;
        if self.byte_at(self.pos) == Some(b'\n') {
            self.pos += 1;
        }
        // A lone `\r` is tolerated without a following `\n` (spec §9 Open
        // Question 1; resolved in SPEC_FULL.md §G.1: accepted, not an error).
        let token = Token::new(TokenId::NewLine, start as u32, self.pos as u32);
        self.line += 1;
        self.line_start = self.pos;
        token
    }

    fn run(&mut self, start: usize, byte: u8, id: TokenId) -> Token {
        self.pos += 1;
        while self.byte_at(self.pos) == Some(byte) {
            self.pos += 1;
        }
        Token::new(id, start as u32, self.pos as u32)
    }

    fn comment(&mut self, start: usize) -> Token {
        self.pos += 1;
        while let Some(b) = self.byte_at(self.pos) {
            if b == b'\r' || b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Token::new(TokenId::Comment, start as u32, self.pos as u32)
    }

    fn single_quote(&mut self, start: usize) -> Token {
        match self.mode {
            StringMode::Unquoted => {
                self.mode = StringMode::SingleQuoted;
                self.pos += 1;
                Token::new(TokenId::SingleQuoted, start as u32, self.pos as u32)
            }
            StringMode::SingleQuoted => {
                if self.byte_at(self.pos + 1) == Some(b'\'') {
                    self.pos += 2;
                    Token::new(TokenId::EscapeSeq, start as u32, self.pos as u32)
                } else {
                    self.mode = StringMode::Unquoted;
                    self.pos += 1;
                    Token::new(TokenId::SingleQuoted, start as u32, self.pos as u32)
                }
            }
            StringMode::DoubleQuoted => {
                self.pos += 1;
                Token::new(TokenId::SingleQuoted, start as u32, self.pos as u32)
            }
        }
    }

    fn backslash_escape(&mut self, start: usize) -> Token {
        self.pos += 1;
        if self.byte_at(self.pos).is_some() {
            self.pos += 1;
        }
        Token::new(TokenId::EscapeSeq, start as u32, self.pos as u32)
    }

    fn double_quote(&mut self, start: usize) -> Token {
        match self.mode {
            StringMode::Unquoted => {
                self.mode = StringMode::DoubleQuoted;
            }
            StringMode::DoubleQuoted => {
                self.mode = StringMode::Unquoted;
            }
            StringMode::SingleQuoted => {
                // Symmetric with `'` inside double-quoted mode: the marker
                // is emitted but does not change mode.
            }
        }
        self.pos += 1;
        Token::new(TokenId::DoubleQuoted, start as u32, self.pos as u32)
    }

    fn hyphen(&mut self, start: usize) -> Token {
        if self.byte_at(self.pos + 1) == Some(b'-') && self.byte_at(self.pos + 2) == Some(b'-') {
            self.pos += 3;
            return Token::new(TokenId::DocStart, start as u32, self.pos as u32);
        }
        match self.byte_at(self.pos + 1) {
            None | Some(b' ') | Some(b'\n') | Some(b'\r') => {
                self.pos += 1;
                Token::new(TokenId::SeqItemInd, start as u32, self.pos as u32)
            }
            _ => self.literal(start),
        }
    }

    fn dot(&mut self, start: usize) -> Token {
        if self.byte_at(self.pos + 1) == Some(b'.') && self.byte_at(self.pos + 2) == Some(b'.') {
            self.pos += 3;
            return Token::new(TokenId::DocEnd, start as u32, self.pos as u32);
        }
        self.literal(start)
    }

    fn literal(&mut self, start: usize) -> Token {
        self.pos += 1;
        loop {
            let Some(b) = self.byte_at(self.pos) else {
                break;
            };
            if LITERAL_TERMINATORS.contains(&b) {
                break;
            }
            if b == b'\\' && self.mode == StringMode::DoubleQuoted {
                break;
            }
            self.pos += 1;
        }
        Token::new(TokenId::Literal, start as u32, self.pos as u32)
    }
}
