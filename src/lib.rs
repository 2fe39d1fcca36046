//! A small, dependency-light YAML 1.2 core.
//!
//! The pipeline is a context-sensitive tokenizer ([`scanner`]), a
//! recursive-descent parser that builds a compact, index-based syntax tree
//! ([`parser`], [`tree`], [`cursor`]), and a value layer that materializes,
//! decodes, encodes and stringifies that tree ([`value`], [`decode`],
//! [`encode`], [`stringify`]).
//!
//! Anchors, aliases, multi-line block scalars (`|`, `>`) and tag resolution
//! are out of scope — see the module docs for what each stage does cover.
#![deny(unsafe_code)]

mod cursor;
mod decode;
mod encode;
mod error;
mod parser;
mod position;
mod scanner;
mod stringify;
mod token;
mod tree;
mod value;

pub use crate::cursor::TokenCursor;
pub use crate::decode::{decode_union, Bytes as DecodeBytes, FromValue, StructDecoder};
pub use crate::encode::{Bytes as EncodeBytes, MapEncoder, ToValue};
pub use crate::error::{
    DecodeError, Diagnostic, DiagnosticBundle, EncodeError, Error, ParseError, ValueError,
};
pub use crate::position::Position;
pub use crate::stringify::{stringify, stringify_document};
pub use crate::token::{Token, TokenId};
pub use crate::tree::{
    ExtrasIndex, InternedStr, MapEntry, NodeData, NodeIndex, NodeTag, Scope, TokenIndex, Tree,
    NONE_INDEX,
};
pub use crate::value::{from_document, from_node, Value};

/// Parse `source` and decode it into `T` (spec §4.5, "Multi-document").
///
/// A single document decodes directly into `T`. Zero documents decode only
/// into the `void`/unit target (anything else is a [`DecodeError::TypeMismatch`],
/// per spec §8's boundary behavior). More than one document requires `T` to
/// be an array of matching length or a slice — every document materializes
/// into a [`Value`] and the whole run decodes as one [`Value::List`], so the
/// existing array/slice [`FromValue`] impls carry the "array of length N or
/// a slice, else `TypeMismatch`" rule without a separate code path.
///
/// Callers needing every document as plain [`Value`]s, or needing the
/// [`Tree`] itself (to inspect positions, re-materialize, or walk nodes
/// directly), should call [`load_values`] or [`parser::parse`] instead.
pub fn load<T: FromValue>(source: &str) -> Result<T, Error> {
    let tree = parser::parse(source)?;
    let value = match tree.documents.as_slice() {
        [] => Value::Empty,
        [doc] => from_document(&tree, *doc)?,
        docs => {
            let mut values = Vec::with_capacity(docs.len());
            for &doc in docs {
                values.push(from_document(&tree, doc)?);
            }
            Value::List(values)
        }
    };
    Ok(T::from_value(&value)?)
}

/// Parse `source` and materialize every document into a [`Value`], without
/// decoding into a host type.
pub fn load_values(source: &str) -> Result<Vec<Value>, Error> {
    let tree = parser::parse(source)?;
    tree.documents
        .iter()
        .map(|&doc| from_document(&tree, doc))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Encode a host value and render it as a single YAML document (no explicit
/// `---`/`...` framing — see [`stringify_document`] for that).
pub fn dump<T: ToValue>(value: &T) -> Result<String, EncodeError> {
    Ok(stringify(&value.to_value()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_a_flat_mapping_into_a_struct() {
        struct Config {
            name: String,
            retries: i64,
        }
        impl FromValue for Config {
            fn from_value(value: &Value) -> Result<Self, DecodeError> {
                let d = StructDecoder::new(value)?;
                Ok(Config {
                    name: d.field("name")?,
                    retries: d.field("retries")?,
                })
            }
        }

        let config: Config = load("name: prod\nretries: 3\n").unwrap();
        assert_eq!(config.name, "prod");
        assert_eq!(config.retries, 3);
    }

    #[test]
    fn round_trips_a_vec_through_dump_and_load() {
        // A list of non-compound elements renders inline (spec §4.6 / §8
        // scenario 1), not one `- ` per line.
        let rendered = dump(&vec![1i64, 2, 3]).unwrap();
        assert_eq!(rendered, "[ 1, 2, 3 ]\n");
        let loaded: Vec<i64> = load(&rendered).unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[test]
    fn load_values_reads_every_document() {
        let values = load_values("--- 1\n--- 2\n--- 3\n").unwrap();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn empty_source_loads_as_empty() {
        let values = load_values("").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn empty_source_decodes_into_unit_but_nothing_else() {
        load::<()>("").unwrap();
        let err = load::<i64>("").unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::TypeMismatch { .. })));
    }

    #[test]
    fn multiple_documents_decode_into_a_matching_array() {
        let docs: [i64; 3] = load("--- 1\n--- 2\n--- 3\n").unwrap();
        assert_eq!(docs, [1, 2, 3]);
    }

    #[test]
    fn multiple_documents_decode_into_a_vec() {
        let docs: Vec<i64> = load("--- 1\n--- 2\n--- 3\n").unwrap();
        assert_eq!(docs, vec![1, 2, 3]);
    }

    #[test]
    fn multiple_documents_into_a_non_aggregate_target_is_a_type_mismatch() {
        let err = load::<i64>("--- 1\n--- 2\n").unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::TypeMismatch { .. })));
    }

    #[test]
    fn multiple_documents_into_a_mismatched_array_length_errors() {
        let err = load::<[i64; 2]>("--- 1\n--- 2\n--- 3\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::ArraySizeMismatch {
                expected: 2,
                found: 3
            })
        ));
    }
}
