use crate::position::Position;
use crate::token::Token;

/// Sentinel marking "no value" in a `u32` slot, so node 0 is still
/// addressable (spec §3, "Optional-node index").
pub const NONE_INDEX: u32 = u32::MAX;

pub type NodeIndex = u32;
pub type TokenIndex = u32;
pub type ExtrasIndex = u32;

fn some_index(index: u32) -> Option<NodeIndex> {
    if index == NONE_INDEX {
        None
    } else {
        Some(index)
    }
}

fn index_or_none(index: Option<NodeIndex>) -> u32 {
    index.unwrap_or(NONE_INDEX)
}

/// The half-open token range a node covers (spec §3, "Scope").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub start_tok: TokenIndex,
    pub end_tok: TokenIndex,
}

/// The node's tag. Kept as its own array in [`Tree`] so a scan that only
/// needs tags (e.g. a quick node-shape check) stays cache-friendly without
/// touching the heavier `data` column (spec §9, "Column-oriented node
/// storage").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeTag {
    /// Document without a directive.
    Doc,
    /// Document with a leading `!tag` directive literal.
    DocWithDirective,
    /// Mapping with exactly one entry.
    MapSingle,
    /// Mapping with two or more entries.
    MapMany,
    /// `[]`.
    ListEmpty,
    /// Sequence of exactly one element.
    ListOne,
    /// Sequence of exactly two elements.
    ListTwo,
    /// Sequence of three or more elements.
    ListMany,
    /// Unquoted leaf; text is the source slice between the scope tokens.
    Value,
    /// Quoted leaf; text is interned (and possibly unescaped).
    StringValue,
}

/// One entry of a `map_many` record in the extras pool.
#[derive(Copy, Clone, Debug)]
pub struct MapEntry {
    pub key_tok: TokenIndex,
    pub value: Option<NodeIndex>,
}

/// The node's payload, discriminated by [`NodeTag`] (spec §3's `data`
/// union, expressed as a safe enum rather than a raw 8-byte union — see
/// DESIGN.md for why literal bit-packing isn't used under `#![deny(unsafe_code)]`).
#[derive(Clone, Debug)]
pub enum NodeData {
    Doc {
        inner: Option<NodeIndex>,
    },
    DocWithDirective {
        inner: Option<NodeIndex>,
        directive_tok: TokenIndex,
    },
    MapSingle {
        key_tok: TokenIndex,
        value: Option<NodeIndex>,
    },
    MapMany {
        extras: ExtrasIndex,
    },
    ListEmpty,
    ListOne {
        item: NodeIndex,
    },
    ListTwo {
        items: [NodeIndex; 2],
    },
    ListMany {
        extras: ExtrasIndex,
    },
    Value,
    StringValue {
        string: InternedStr,
    },
}

/// `(offset, len)` into the tree's string-bytes pool (spec §3, "String
/// bytes pool"). Only quoted or otherwise-processed leaves are interned;
/// plain leaves reuse the source via their [`Scope`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InternedStr {
    pub offset: u32,
    pub len: u32,
}

/// The immutable, owned result of parsing (spec §3, "Tree").
///
/// A `Tree` owns everything it was built from except the source text, which
/// it borrows for the lifetime of the tree. All three of node storage,
/// extras, and string bytes are flat, append-only arenas indexed by `u32` —
/// there is no pointer, and no node can reference a slot that wasn't already
/// allocated (spec §3 invariants).
#[non_exhaustive]
pub struct Tree<'s> {
    pub source: &'s str,
    pub tokens: Vec<Token>,
    pub positions: Vec<Position>,
    pub documents: Vec<NodeIndex>,
    tags: Vec<NodeTag>,
    scopes: Vec<Scope>,
    data: Vec<NodeData>,
    extras: Vec<u32>,
    strings: Vec<u8>,
}

impl<'s> Tree<'s> {
    /// Number of documents parsed from the stream.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Total number of nodes allocated.
    pub fn node_count(&self) -> usize {
        self.tags.len()
    }

    pub fn tag(&self, node: NodeIndex) -> NodeTag {
        self.tags[node as usize]
    }

    pub fn scope(&self, node: NodeIndex) -> Scope {
        self.scopes[node as usize]
    }

    pub fn data(&self, node: NodeIndex) -> &NodeData {
        &self.data[node as usize]
    }

    /// Column of the token at `index`.
    pub fn col_of(&self, token_index: TokenIndex) -> u32 {
        self.positions[token_index as usize].col
    }

    /// Position of the token at `index`.
    pub fn position_of(&self, token_index: TokenIndex) -> Position {
        self.positions[token_index as usize]
    }

    /// Raw source text a single token covers, e.g. a mapping key literal.
    pub fn token_text(&self, token_index: TokenIndex) -> &'s str {
        self.tokens[token_index as usize].text(self.source)
    }

    /// The source text a node's scope covers, from the first token's start
    /// byte to the last token's end byte.
    pub fn node_text(&self, node: NodeIndex) -> &'s str {
        let scope = self.scope(node);
        let start = self.tokens[scope.start_tok as usize].start as usize;
        let end = self.tokens[scope.end_tok as usize].end as usize;
        &self.source[start..end]
    }

    /// Look up interned string bytes.
    pub fn interned_str(&self, s: InternedStr) -> &str {
        let bytes = &self.strings[s.offset as usize..(s.offset + s.len) as usize];
        std::str::from_utf8(bytes).expect("interned strings are always valid utf-8")
    }

    /// Decode a `map_many` extras record at `offset`.
    pub fn map_entries(&self, offset: ExtrasIndex) -> Vec<MapEntry> {
        let offset = offset as usize;
        let len = self.extras[offset] as usize;
        let mut entries = Vec::with_capacity(len);
        let mut cursor = offset + 1;
        for _ in 0..len {
            let key_tok = self.extras[cursor];
            let value = some_index(self.extras[cursor + 1]);
            entries.push(MapEntry { key_tok, value });
            cursor += 2;
        }
        entries
    }

    /// Decode a `list_many` extras record at `offset`.
    pub fn list_items(&self, offset: ExtrasIndex) -> Vec<NodeIndex> {
        let offset = offset as usize;
        let len = self.extras[offset] as usize;
        self.extras[offset + 1..offset + 1 + len].to_vec()
    }
}

/// Incremental builder used by the parser to populate a [`Tree`]. Kept
/// separate from `Tree` itself so the tree stays conceptually immutable once
/// handed back to callers (spec §5, "Allocation discipline").
///
/// Deliberately holds no tokens of its own: the parser owns the token/
/// position arrays directly (so it can drive a plain index-based cursor over
/// them without a self-referential borrow), and hands them to
/// [`TreeBuilder::finish`] only once parsing is complete.
#[derive(Default)]
pub(crate) struct TreeBuilder {
    documents: Vec<NodeIndex>,
    tags: Vec<NodeTag>,
    scopes: Vec<Scope>,
    data: Vec<NodeData>,
    extras: Vec<u32>,
    strings: Vec<u8>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_node(&mut self, tag: NodeTag, scope: Scope, data: NodeData) -> NodeIndex {
        let index = self.tags.len() as u32;
        self.tags.push(tag);
        self.scopes.push(scope);
        self.data.push(data);
        index
    }

    pub fn push_doc(&mut self, scope: Scope, inner: Option<NodeIndex>) -> NodeIndex {
        self.push_node(NodeTag::Doc, scope, NodeData::Doc { inner })
    }

    pub fn push_doc_with_directive(
        &mut self,
        scope: Scope,
        inner: Option<NodeIndex>,
        directive_tok: TokenIndex,
    ) -> NodeIndex {
        self.push_node(
            NodeTag::DocWithDirective,
            scope,
            NodeData::DocWithDirective {
                inner,
                directive_tok,
            },
        )
    }

    pub fn push_map(
        &mut self,
        scope: Scope,
        entries: Vec<(TokenIndex, Option<NodeIndex>)>,
    ) -> NodeIndex {
        if entries.len() == 1 {
            let (key_tok, value) = entries[0];
            return self.push_node(
                NodeTag::MapSingle,
                scope,
                NodeData::MapSingle { key_tok, value },
            );
        }
        let extras = self.reserve_extras_header(entries.len() as u32);
        for (key_tok, value) in &entries {
            self.extras.push(*key_tok);
            self.extras.push(index_or_none(*value));
        }
        self.push_node(NodeTag::MapMany, scope, NodeData::MapMany { extras })
    }

    pub fn push_list(&mut self, scope: Scope, items: Vec<NodeIndex>) -> NodeIndex {
        match items.len() {
            0 => self.push_node(NodeTag::ListEmpty, scope, NodeData::ListEmpty),
            1 => self.push_node(
                NodeTag::ListOne,
                scope,
                NodeData::ListOne { item: items[0] },
            ),
            2 => self.push_node(
                NodeTag::ListTwo,
                scope,
                NodeData::ListTwo {
                    items: [items[0], items[1]],
                },
            ),
            n => {
                let extras = self.reserve_extras_header(n as u32);
                self.extras.extend_from_slice(&items);
                self.push_node(NodeTag::ListMany, scope, NodeData::ListMany { extras })
            }
        }
    }

    pub fn push_value(&mut self, scope: Scope) -> NodeIndex {
        self.push_node(NodeTag::Value, scope, NodeData::Value)
    }

    pub fn push_string_value(&mut self, scope: Scope, text: &str) -> NodeIndex {
        let string = self.intern(text);
        self.push_node(
            NodeTag::StringValue,
            scope,
            NodeData::StringValue { string },
        )
    }

    fn reserve_extras_header(&mut self, len: u32) -> ExtrasIndex {
        let offset = self.extras.len() as u32;
        self.extras.push(len);
        offset
    }

    fn intern(&mut self, text: &str) -> InternedStr {
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(text.as_bytes());
        InternedStr {
            offset,
            len: text.len() as u32,
        }
    }

    pub fn push_document_root(&mut self, node: NodeIndex) {
        self.documents.push(node);
    }

    pub fn finish<'s>(
        self,
        source: &'s str,
        tokens: Vec<Token>,
        positions: Vec<Position>,
    ) -> Tree<'s> {
        Tree {
            source,
            tokens,
            positions,
            documents: self.documents,
            tags: self.tags,
            scopes: self.scopes,
            data: self.data,
            extras: self.extras,
            strings: self.strings,
        }
    }
}
