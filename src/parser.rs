use crate::error::{Diagnostic, DiagnosticBundle, ParseError};
use crate::position::Position;
use crate::scanner::Scanner;
use crate::token::{Token, TokenId};
use crate::tree::{NodeIndex, Scope, Tree, TreeBuilder};

/// Parse `source` into a [`Tree`] (spec §4.3, entry point `parse()`).
pub fn parse(source: &str) -> Result<Tree<'_>, ParseError> {
    let (tokens, positions) = Scanner::new(source).scan();
    Parser::new(source, tokens, positions).run()
}

/// The value a sub-grammar routine produced, together with the position of
/// its first token (used for the mapping indentation checks in §4.3.3) and
/// whether it is a plain (`value`-tagged) leaf, which is held to a stricter
/// indentation rule than compound children.
struct ParsedValue {
    node: NodeIndex,
    position: Position,
    plain_leaf: bool,
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    positions: Vec<Position>,
    index: usize,
    builder: TreeBuilder,
    diagnostics: DiagnosticBundle,
    flow_depth: u32,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, tokens: Vec<Token>, positions: Vec<Position>) -> Self {
        Self {
            source,
            tokens,
            positions,
            index: 0,
            builder: TreeBuilder::new(),
            diagnostics: DiagnosticBundle::default(),
            flow_depth: 0,
        }
    }

    fn run(mut self) -> Result<Tree<'s>, ParseError> {
        self.skip_trivia();
        while self.peek().id != TokenId::Eof {
            let root = self.parse_document()?;
            self.builder.push_document_root(root);
            self.skip_trivia();
        }
        Ok(self.builder.finish(self.source, self.tokens, self.positions))
    }

    // --- token cursor -----------------------------------------------------

    fn peek(&self) -> Token {
        self.tokens[self.index]
    }

    fn peek_at(&self, n: usize) -> Token {
        self.tokens[(self.index + n).min(self.tokens.len() - 1)]
    }

    fn peek_position(&self) -> Position {
        self.positions[self.index]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    /// Skip `comment`, `space`, `tab` and `new_line` tokens (spec §4.3,
    /// `eat_comments_and_space` with no exclusions).
    fn skip_trivia(&mut self) {
        while matches!(
            self.peek().id,
            TokenId::Comment | TokenId::Space | TokenId::Tab | TokenId::NewLine
        ) {
            self.advance();
        }
    }

    /// Skip only `space`/`tab`, preserving `new_line` and `comment` — used to
    /// look one step ahead on the *same* line (spec §4.3.2's "after skipping
    /// non-newline/non-comment space").
    fn skip_inline_space(&mut self) {
        while matches!(self.peek().id, TokenId::Space | TokenId::Tab) {
            self.advance();
        }
    }

    /// Skip trivia inside a flow collection: `comment` is forbidden there
    /// (spec §9 Open Question 2, resolved in SPEC_FULL.md §G.2).
    fn skip_flow_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek().id {
                TokenId::Space | TokenId::Tab | TokenId::NewLine => {
                    self.advance();
                }
                TokenId::Comment => {
                    return Err(self.malformed("comments are not allowed inside a flow collection"));
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn with_flow<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.flow_depth += 1;
        let result = f(self);
        self.flow_depth -= 1;
        result
    }

    // --- diagnostics --------------------------------------------------

    fn line_text(&self, line: u32) -> &'s str {
        self.source.lines().nth(line as usize).unwrap_or("")
    }

    fn diagnostic_at(&self, position: Position, message: impl Into<String>) -> Diagnostic {
        let line_text = self.line_text(position.line);
        let span_start = (line_text.len() - line_text.trim_start().len()) as u32;
        let span_end = line_text.trim_end().len() as u32;
        Diagnostic {
            path: "(memory)",
            position,
            line_text: line_text.to_string(),
            span_start,
            span_end,
            message: message.into(),
        }
    }

    /// Build and enqueue a rich diagnostic, returning the corresponding
    /// [`ParseError::ParseFailure`] (spec §4.3.8).
    fn parse_failure(&mut self, message: impl Into<String>) -> ParseError {
        let diagnostic = self.diagnostic_at(self.peek_position(), message);
        self.diagnostics.push(diagnostic.clone());
        ParseError::ParseFailure { diagnostic }
    }

    fn malformed(&self, message: impl Into<String>) -> ParseError {
        ParseError::MalformedYaml {
            position: self.peek_position(),
            message: message.into(),
        }
    }

    // --- grammar ------------------------------------------------------

    /// A document (spec §4.3.1): optional explicit header, one value,
    /// optional footer.
    fn parse_document(&mut self) -> Result<NodeIndex, ParseError> {
        let start_tok = self.index as u32;
        let mut directive_tok = None;

        if self.peek().id == TokenId::DocStart {
            if self.peek_position().col != 0 {
                return Err(self.malformed("'---' must start at column 0"));
            }
            self.advance();
            self.skip_inline_space();
            if self.peek().id == TokenId::Tag {
                self.advance();
                if self.peek().id != TokenId::Literal {
                    return Err(ParseError::UnexpectedToken {
                        position: self.peek_position(),
                    });
                }
                directive_tok = Some(self.index as u32);
                self.advance();
            }
        }

        self.skip_trivia();
        let value = self.parse_value()?;
        let end_tok = self.index.saturating_sub(1).max(start_tok as usize) as u32;
        let scope = Scope { start_tok, end_tok };

        self.skip_trivia();
        match self.peek().id {
            TokenId::Eof => {}
            TokenId::DocEnd if self.peek_position().col == 0 => {
                self.advance();
            }
            TokenId::DocStart if self.peek_position().col == 0 => {
                // Not consumed; the outer loop starts the next document.
            }
            _ => return Err(self.parse_failure("expected end of document")),
        }

        let inner = value.map(|v| v.node);
        Ok(match directive_tok {
            Some(directive_tok) => self
                .builder
                .push_doc_with_directive(scope, inner, directive_tok),
            None => self.builder.push_doc(scope, inner),
        })
    }

    /// Dispatch on the next token (spec §4.3.2).
    fn parse_value(&mut self) -> Result<Option<ParsedValue>, ParseError> {
        self.skip_trivia();
        match self.peek().id {
            TokenId::Literal => {
                let save = self.index;
                self.advance();
                self.skip_inline_space();
                let is_mapping = self.peek().id == TokenId::MapValueInd;
                self.index = save;
                if is_mapping {
                    Ok(Some(self.parse_block_mapping()?))
                } else {
                    Ok(Some(self.parse_leaf()?))
                }
            }
            TokenId::SingleQuoted | TokenId::DoubleQuoted => Ok(Some(self.parse_quoted_leaf()?)),
            TokenId::SeqItemInd => Ok(Some(self.parse_block_sequence()?)),
            TokenId::FlowSeqStart => Ok(Some(self.parse_flow_sequence()?)),
            TokenId::FlowMapStart => Ok(Some(self.parse_flow_mapping()?)),
            _ => Ok(None),
        }
    }

    /// A block mapping (spec §4.3.3), established at the column of its
    /// first key.
    fn parse_block_mapping(&mut self) -> Result<ParsedValue, ParseError> {
        let map_position = self.peek_position();
        let start_tok = self.index as u32;
        let mut entries = Vec::new();

        loop {
            self.skip_trivia();
            let tok = self.peek();
            if matches!(
                tok.id,
                TokenId::DocStart | TokenId::DocEnd | TokenId::Eof | TokenId::FlowMapEnd
            ) {
                break;
            }
            if self.peek_position().col < map_position.col {
                break;
            }
            if tok.id != TokenId::Literal {
                return Err(ParseError::UnexpectedToken {
                    position: self.peek_position(),
                });
            }

            let key_tok = self.index as u32;
            let key_position = self.peek_position();
            self.advance();
            self.skip_trivia();
            if self.peek().id != TokenId::MapValueInd {
                return Err(self.malformed("expected ':' after mapping key"));
            }
            self.advance();

            let value = self.parse_value()?;
            if let Some(value) = &value {
                self.check_mapping_indent(key_position, value)?;
            }
            entries.push((key_tok, value.map(|v| v.node)));
        }

        let end_tok = self.index.saturating_sub(1).max(start_tok as usize) as u32;
        let node = self
            .builder
            .push_map(Scope { start_tok, end_tok }, entries);
        Ok(ParsedValue {
            node,
            position: map_position,
            plain_leaf: false,
        })
    }

    fn check_mapping_indent(
        &mut self,
        key_position: Position,
        value: &ParsedValue,
    ) -> Result<(), ParseError> {
        let violated = if value.plain_leaf {
            value.position.line != key_position.line && value.position.col <= key_position.col
        } else {
            value.position.col < key_position.col
        };
        if violated {
            return Err(
                self.parse_failure("value in map should have more indentation than the key")
            );
        }
        Ok(())
    }

    /// A block sequence (spec §4.3.4), established at the column of its
    /// first `seq_item_ind`.
    fn parse_block_sequence(&mut self) -> Result<ParsedValue, ParseError> {
        let list_position = self.peek_position();
        let start_tok = self.index as u32;
        let mut items = Vec::new();

        loop {
            self.skip_trivia();
            if self.peek().id != TokenId::SeqItemInd {
                break;
            }
            if self.peek_position().col < list_position.col {
                break;
            }
            self.advance();
            let value = self
                .parse_value()?
                .ok_or_else(|| self.malformed("expected a value after '-'"))?;
            items.push(value.node);
        }

        let end_tok = self.index.saturating_sub(1).max(start_tok as usize) as u32;
        let node = self
            .builder
            .push_list(Scope { start_tok, end_tok }, items);
        Ok(ParsedValue {
            node,
            position: list_position,
            plain_leaf: false,
        })
    }

    /// A flow sequence (spec §4.3.5).
    fn parse_flow_sequence(&mut self) -> Result<ParsedValue, ParseError> {
        let position = self.peek_position();
        let start_tok = self.index as u32;
        self.advance(); // consume '['

        let items = self.with_flow(|p| {
            let mut items = Vec::new();
            let mut prev_was_comma = false;
            let mut any_item = false;
            loop {
                p.skip_flow_trivia()?;
                match p.peek().id {
                    TokenId::FlowSeqEnd => {
                        p.advance();
                        break;
                    }
                    TokenId::Comma => {
                        if prev_was_comma || !any_item {
                            return Err(p.parse_failure("empty element in flow sequence"));
                        }
                        p.advance();
                        prev_was_comma = true;
                        continue;
                    }
                    _ => {}
                }
                let value = p
                    .parse_value()?
                    .ok_or_else(|| p.malformed("expected a value in flow sequence"))?;
                items.push(value.node);
                any_item = true;
                prev_was_comma = false;
            }
            Ok(items)
        })?;

        let end_tok = (self.index - 1) as u32;
        let node = self
            .builder
            .push_list(Scope { start_tok, end_tok }, items);
        Ok(ParsedValue {
            node,
            position,
            plain_leaf: false,
        })
    }

    /// A flow mapping. Not named as its own grammar routine in spec §4.3,
    /// but required by the `a: {}` boundary behavior in spec §8 — see
    /// SPEC_FULL.md §F for the supplementation rationale. Mirrors the flow
    /// sequence's comma handling; keys are restricted to plain literals,
    /// matching the block mapping's key grammar.
    fn parse_flow_mapping(&mut self) -> Result<ParsedValue, ParseError> {
        let position = self.peek_position();
        let start_tok = self.index as u32;
        self.advance(); // consume '{'

        let entries = self.with_flow(|p| {
            let mut entries = Vec::new();
            let mut prev_was_comma = false;
            let mut any_entry = false;
            loop {
                p.skip_flow_trivia()?;
                match p.peek().id {
                    TokenId::FlowMapEnd => {
                        p.advance();
                        break;
                    }
                    TokenId::Comma => {
                        if prev_was_comma || !any_entry {
                            return Err(p.parse_failure("empty element in flow mapping"));
                        }
                        p.advance();
                        prev_was_comma = true;
                        continue;
                    }
                    _ => {}
                }
                if p.peek().id != TokenId::Literal {
                    return Err(ParseError::UnexpectedToken {
                        position: p.peek_position(),
                    });
                }
                let key_tok = p.index as u32;
                p.advance();
                p.skip_flow_trivia()?;
                if p.peek().id != TokenId::MapValueInd {
                    return Err(p.malformed("expected ':' after flow mapping key"));
                }
                p.advance();
                let value = p.parse_value()?;
                entries.push((key_tok, value.map(|v| v.node)));
                any_entry = true;
                prev_was_comma = false;
            }
            Ok(entries)
        })?;

        let end_tok = (self.index - 1) as u32;
        let node = self
            .builder
            .push_map(Scope { start_tok, end_tok }, entries);
        Ok(ParsedValue {
            node,
            position,
            plain_leaf: false,
        })
    }

    /// An unquoted leaf (spec §4.3.6): contiguous `literal`s, embedded
    /// single `space` tokens, and — outside a flow collection — embedded
    /// `comma` tokens, so a plain block scalar like `no quotes, comma` reads
    /// as one string instead of stopping at the comma (see spec §8 scenario
    /// 3; comma only terminates a leaf inside `[...]`/`{...}`, where it is
    /// the element separator).
    fn parse_leaf(&mut self) -> Result<ParsedValue, ParseError> {
        let position = self.peek_position();
        let start_tok = self.index as u32;
        loop {
            match self.peek().id {
                TokenId::Literal => {
                    self.advance();
                }
                TokenId::Comma if self.flow_depth == 0 => {
                    self.advance();
                }
                TokenId::Space => {
                    let after = self.peek_at(1).id;
                    let embeddable = matches!(after, TokenId::Literal)
                        || (self.flow_depth == 0 && after == TokenId::Comma);
                    if !embeddable {
                        break;
                    }
                    self.advance();
                }
                _ => break,
            }
        }
        let end_tok = (self.index - 1).max(start_tok as usize) as u32;
        let node = self.builder.push_value(Scope { start_tok, end_tok });
        Ok(ParsedValue {
            node,
            position,
            plain_leaf: true,
        })
    }

    /// A quoted leaf (spec §4.3.6/§4.3.7).
    fn parse_quoted_leaf(&mut self) -> Result<ParsedValue, ParseError> {
        let position = self.peek_position();
        let start_tok = self.index as u32;
        let opening_id = self.peek().id;
        self.advance();

        let mut text = String::new();
        loop {
            let tok = self.peek();
            match tok.id {
                TokenId::Eof => return Err(ParseError::UnexpectedEof),
                id if id == opening_id => {
                    self.advance();
                    break;
                }
                TokenId::EscapeSeq => {
                    text.push(self.unescape(opening_id, tok)?);
                    self.advance();
                }
                _ => {
                    text.push_str(tok.text(self.source));
                    self.advance();
                }
            }
        }

        let end_tok = (self.index - 1) as u32;
        let node = self
            .builder
            .push_string_value(Scope { start_tok, end_tok }, &text);
        Ok(ParsedValue {
            node,
            position,
            plain_leaf: false,
        })
    }

    /// Unescape one `escape_seq` token (spec §4.3.7).
    fn unescape(&self, opening_id: TokenId, token: Token) -> Result<char, ParseError> {
        let raw = token.text(self.source);
        let result = match opening_id {
            TokenId::SingleQuoted if raw == "''" => Some('\''),
            TokenId::DoubleQuoted => match raw {
                "\\n" => Some('\n'),
                "\\t" => Some('\t'),
                "\\\"" => Some('"'),
                _ => None,
            },
            _ => None,
        };
        result.ok_or(ParseError::InvalidEscapeSequence {
            position: self.positions[self.index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;
    use crate::value::{from_document, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn scenario_1_block_sequence_of_scalars() {
        let tree = parse("- a\n- b\n- c\n").unwrap();
        assert_eq!(tree.document_count(), 1);
        let value = from_document(&tree, tree.documents[0]).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
                Value::String("c".to_string()),
            ])
        );
    }

    #[test]
    fn scenario_2_explicit_document_with_directive() {
        let tree = parse("--- !tapi-tbd\ntbd-version: 4\nabc-version: 5\n...\n").unwrap();
        let root = tree.documents[0];
        let NodeData::DocWithDirective { directive_tok, .. } = tree.data(root) else {
            panic!("expected a directive");
        };
        assert_eq!(tree.token_text(*directive_tok), "tapi-tbd");
        let Value::Map(map) = from_document(&tree, root).unwrap() else {
            panic!("expected a map");
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["tbd-version", "abc-version"]);
        assert_eq!(map.get("tbd-version"), Some(&Value::Int(4)));
        assert_eq!(map.get("abc-version"), Some(&Value::Int(5)));
    }

    #[test]
    fn scenario_3_quoting_styles() {
        let source = "key1: no quotes, comma\nkey2: 'single quoted'\nkey3: \"double quoted\"\n";
        let tree = parse(source).unwrap();
        let Value::Map(map) = from_document(&tree, tree.documents[0]).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(
            map.get("key1"),
            Some(&Value::String("no quotes, comma".to_string()))
        );
        assert_eq!(
            map.get("key2"),
            Some(&Value::String("single quoted".to_string()))
        );
        assert_eq!(
            map.get("key3"),
            Some(&Value::String("double quoted".to_string()))
        );
    }

    #[test]
    fn scenario_6_misindented_second_key_is_a_parse_failure() {
        let err = parse("  key1: value1\nkey2: value2\n").unwrap_err();
        let ParseError::ParseFailure { diagnostic } = err else {
            panic!("expected ParseFailure, got {err:?}");
        };
        assert_eq!(diagnostic.position, Position { line: 1, col: 0 });
        assert_eq!(diagnostic.message, "expected end of document");
        assert_eq!(
            diagnostic.to_string(),
            "(memory):2:1: error: expected end of document\nkey2: value2\n^~~~~~~~~~~~"
        );
    }

    #[test]
    fn empty_flow_sequence_is_list_empty() {
        let tree = parse("[ ]\n").unwrap();
        let Value::List(items) = from_document(&tree, tree.documents[0]).unwrap() else {
            panic!("expected a list");
        };
        assert!(items.is_empty());
    }

    #[test]
    fn flow_sequence_allows_a_trailing_comma() {
        let tree = parse("[1, 2, 3,]\n").unwrap();
        let value = from_document(&tree, tree.documents[0]).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn flow_sequence_rejects_a_doubled_comma() {
        let err = parse("[1,, 2]\n").unwrap_err();
        assert!(matches!(err, ParseError::ParseFailure { .. }));
    }

    #[test]
    fn flow_mapping_empty_materializes_as_empty_map() {
        let tree = parse("a: {}\n").unwrap();
        let Value::Map(outer) = from_document(&tree, tree.documents[0]).unwrap() else {
            panic!("expected a map");
        };
        let Some(Value::Map(inner)) = outer.get("a") else {
            panic!("expected a nested empty map");
        };
        assert!(inner.is_empty());
    }

    #[test]
    fn flow_mapping_parses_entries() {
        let tree = parse("{ a: 1, b: 2 }\n").unwrap();
        let Value::Map(map) = from_document(&tree, tree.documents[0]).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(map.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn comment_inside_flow_sequence_is_malformed() {
        let err = parse("[1, # oops\n2]\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedYaml { .. }));
    }

    #[test]
    fn same_column_keys_stay_one_mapping_not_two_documents() {
        // Both `a` and `b` sit at column 0, so the block-mapping loop in
        // §4.3.3 keeps reading entries into the same mapping rather than
        // treating `b: 2` as a second implicit document.
        let tree = parse("a: 1\nb: 2\n").unwrap();
        assert_eq!(tree.document_count(), 1);
        let Value::Map(map) = from_document(&tree, tree.documents[0]).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(map.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn leaf_value_on_its_own_line_at_the_key_column_needs_more_indentation() {
        // `value` lands on the line after `key:` at the same column as the
        // key itself — the plain-leaf indentation rule in §4.3.3 rejects
        // this rather than silently treating `value` as the key's value.
        let err = parse("key:\nvalue\n").unwrap_err();
        let ParseError::ParseFailure { diagnostic } = err else {
            panic!("expected ParseFailure, got {err:?}");
        };
        assert_eq!(
            diagnostic.message,
            "value in map should have more indentation than the key"
        );
    }

    #[test]
    fn nested_block_sequence_in_mapping_requires_more_indentation() {
        let tree = parse("parent:\n  - a\n  - b\n").unwrap();
        let Value::Map(map) = from_document(&tree, tree.documents[0]).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(
            map.get("parent"),
            Some(&Value::List(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string())
            ]))
        );
    }

    #[test]
    fn empty_source_has_zero_documents() {
        let tree = parse("").unwrap();
        assert_eq!(tree.document_count(), 0);
    }

    #[test]
    fn multiple_explicit_documents_are_all_returned() {
        let tree = parse("--- 1\n--- 2\n--- 3\n").unwrap();
        assert_eq!(tree.document_count(), 3);
        let values: Vec<Value> = tree
            .documents
            .iter()
            .map(|&d| from_document(&tree, d).unwrap())
            .collect();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }
}
