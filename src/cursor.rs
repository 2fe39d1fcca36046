use crate::position::Position;
use crate::token::Token;

/// A cursor over the flat token array produced by [`crate::scanner::Scanner`]
/// (spec §4.2): `peek`/`next`/`seek_to`/`seek_by` over a token index, the way
/// spec §4.2 names the component. [`crate::parser`] inlines this same
/// index-over-`Vec<Token>` shape directly on `Parser` rather than holding a
/// `TokenCursor`, since its token/position arrays are owned by the parser and
/// handed to [`crate::tree::TreeBuilder::finish`] at the end of a parse —
/// `TokenCursor` borrows instead, which a self-owning struct can't do without
/// a lifetime on itself. This type stays the standalone, reusable cursor for
/// any other caller that already holds its own borrowed token/position
/// slices (for instance, walking a finished [`crate::tree::Tree`]'s token
/// stream).
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    positions: &'t [Position],
    index: usize,
}

impl<'t> TokenCursor<'t> {
    pub fn new(tokens: &'t [Token], positions: &'t [Position]) -> Self {
        debug_assert_eq!(tokens.len(), positions.len());
        Self {
            tokens,
            positions,
            index: 0,
        }
    }

    /// Current token index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The token at the cursor, without advancing. Past the last token this
    /// keeps returning the trailing `eof` token.
    pub fn peek(&self) -> Token {
        self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    /// `(line, col)` of the token at the cursor.
    pub fn peek_position(&self) -> Position {
        self.positions[self.index.min(self.positions.len() - 1)]
    }

    /// The token `n` positions ahead of the cursor, without advancing.
    pub fn peek_at(&self, n: usize) -> Token {
        let i = (self.index + n).min(self.tokens.len() - 1);
        self.tokens[i]
    }

    /// Return the token at the cursor and advance past it.
    pub fn next(&mut self) -> Token {
        let token = self.peek();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    /// Reposition the cursor to an absolute token index.
    pub fn seek_to(&mut self, index: usize) {
        self.index = index.min(self.tokens.len() - 1);
    }

    /// Reposition the cursor relative to its current position. Negative
    /// offsets move backward; the cursor clamps to the stream bounds.
    pub fn seek_by(&mut self, delta: isize) {
        let target = (self.index as isize + delta).max(0) as usize;
        self.seek_to(target);
    }

    /// The full token slice, e.g. for rendering a node's source span.
    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    /// The full position slice, parallel to [`TokenCursor::tokens`].
    pub fn positions(&self) -> &'t [Position] {
        self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn cursor_over(source: &'static str) -> (Vec<Token>, Vec<Position>) {
        Scanner::new(source).scan()
    }

    #[test]
    fn peek_does_not_advance_and_next_does() {
        let (tokens, positions) = cursor_over("a: b");
        let mut cursor = TokenCursor::new(&tokens, &positions);
        let first = cursor.peek();
        assert_eq!(cursor.peek(), first);
        assert_eq!(cursor.next(), first);
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn next_past_the_last_token_keeps_returning_eof() {
        let (tokens, positions) = cursor_over("");
        let mut cursor = TokenCursor::new(&tokens, &positions);
        let eof = cursor.next();
        assert_eq!(eof.id, crate::token::TokenId::Eof);
        assert_eq!(cursor.next(), eof);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn seek_to_and_seek_by_reposition_the_cursor() {
        let (tokens, positions) = cursor_over("a: b");
        let mut cursor = TokenCursor::new(&tokens, &positions);
        cursor.seek_to(2);
        assert_eq!(cursor.index(), 2);
        cursor.seek_by(-1);
        assert_eq!(cursor.index(), 1);
        cursor.seek_by(-100);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn peek_at_looks_ahead_without_advancing() {
        let (tokens, positions) = cursor_over("a: b");
        let cursor = TokenCursor::new(&tokens, &positions);
        assert_eq!(cursor.peek_at(1).id, tokens[1].id);
        assert_eq!(cursor.index(), 0);
    }
}
