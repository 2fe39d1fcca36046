use indexmap::IndexMap;

use crate::error::ValueError;
use crate::tree::{NodeData, NodeIndex, NodeTag, Tree};

/// The materialized, owned value a node resolves to (spec §4.4).
///
/// Unlike [`Tree`], a `Value` borrows nothing — every string is copied out of
/// the tree's arenas so it can outlive the parse.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// A mapping key or sequence item with no value (`key:` with nothing
    /// after it).
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    List(Vec<Value>),
    /// Order-preserving; insertion order matches source order (spec §4.4).
    Map(IndexMap<String, Value>),
}

/// Materialize one of a tree's documents. `Doc`/`DocWithDirective` nodes
/// carry an optional inner value; an empty document resolves to
/// [`Value::Empty`].
pub fn from_document(tree: &Tree<'_>, doc: NodeIndex) -> Result<Value, ValueError> {
    let inner = match tree.data(doc) {
        NodeData::Doc { inner } => *inner,
        NodeData::DocWithDirective { inner, .. } => *inner,
        _ => unreachable!("from_document called on a non-document node"),
    };
    match inner {
        Some(node) => from_node(tree, node),
        None => Ok(Value::Empty),
    }
}

/// Materialize any node, recursively.
pub fn from_node(tree: &Tree<'_>, node: NodeIndex) -> Result<Value, ValueError> {
    match tree.tag(node) {
        NodeTag::Doc | NodeTag::DocWithDirective => from_document(tree, node),
        NodeTag::MapSingle => {
            let NodeData::MapSingle { key_tok, value } = tree.data(node) else {
                unreachable!()
            };
            let mut map = IndexMap::with_capacity(1);
            insert_entry(tree, &mut map, *key_tok, *value)?;
            Ok(Value::Map(map))
        }
        NodeTag::MapMany => {
            let NodeData::MapMany { extras } = tree.data(node) else {
                unreachable!()
            };
            let entries = tree.map_entries(*extras);
            let mut map = IndexMap::with_capacity(entries.len());
            for entry in entries {
                insert_entry(tree, &mut map, entry.key_tok, entry.value)?;
            }
            Ok(Value::Map(map))
        }
        NodeTag::ListEmpty => Ok(Value::List(Vec::new())),
        NodeTag::ListOne => {
            let NodeData::ListOne { item } = tree.data(node) else {
                unreachable!()
            };
            Ok(Value::List(vec![from_node(tree, *item)?]))
        }
        NodeTag::ListTwo => {
            let NodeData::ListTwo { items } = tree.data(node) else {
                unreachable!()
            };
            Ok(Value::List(vec![
                from_node(tree, items[0])?,
                from_node(tree, items[1])?,
            ]))
        }
        NodeTag::ListMany => {
            let NodeData::ListMany { extras } = tree.data(node) else {
                unreachable!()
            };
            let items = tree.list_items(*extras);
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                list.push(from_node(tree, item)?);
            }
            Ok(Value::List(list))
        }
        NodeTag::Value => Ok(classify_leaf(tree.node_text(node))),
        NodeTag::StringValue => {
            let NodeData::StringValue { string } = tree.data(node) else {
                unreachable!()
            };
            // Open Question 3 (SPEC_FULL.md §G.3): classification runs over
            // the raw text for quoted leaves too, so `"true"` decodes the
            // same as `true`.
            Ok(classify_leaf(tree.interned_str(*string)))
        }
    }
}

fn insert_entry(
    tree: &Tree<'_>,
    map: &mut IndexMap<String, Value>,
    key_tok: crate::tree::TokenIndex,
    value: Option<NodeIndex>,
) -> Result<(), ValueError> {
    let key = tree.token_text(key_tok).to_string();
    if map.contains_key(&key) {
        return Err(ValueError::DuplicateMapKey {
            position: tree.position_of(key_tok),
            key,
        });
    }
    let value = match value {
        Some(node) => from_node(tree, node)?,
        None => Value::Empty,
    };
    map.insert(key, value);
    Ok(())
}

/// Longest recognized boolean literal (`false`), in bytes. Leaf text longer
/// than this can never match the truthy/falsy sets below, so the length
/// check short-circuits the lowercase + set lookup for ordinary strings.
const LONGEST_BOOL_LITERAL: usize = 5;

/// Classify a leaf's text, trying `int`, then `float`, then `bool`, falling
/// back to `string` (spec §4.4). Runs the same way for unquoted and quoted
/// leaves alike (Open Question 3, SPEC_FULL.md §G.3).
fn classify_leaf(text: &str) -> Value {
    if let Some(i) = parse_yaml_int(text) {
        return Value::Int(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return Value::Float(f);
    }
    match looks_like_bool(text) {
        Some(b) => Value::Bool(b),
        None => Value::String(text.to_string()),
    }
}

/// Whether `text` falls in the truthy/falsy boolean literal sets of spec
/// §4.4, case-insensitively. Shared with [`crate::stringify`] so a string
/// value that would reclassify as a bool on re-parse gets quoted.
pub(crate) fn looks_like_bool(text: &str) -> Option<bool> {
    if text.is_empty() || text.len() > LONGEST_BOOL_LITERAL {
        return None;
    }
    match text.to_ascii_lowercase().as_str() {
        "y" | "yes" | "on" | "true" => Some(true),
        "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

/// Plain decimal, `0x` hex and `0o` octal integers (spec §9 Open Question 4,
/// resolved in SPEC_FULL.md §G.4): YAML 1.1 extras like `0b` binary or
/// sexagesimal are not recognized and fall through to float/string.
pub(crate) fn parse_yaml_int(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest.is_empty() {
        return None;
    }
    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}
