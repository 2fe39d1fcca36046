use indexmap::IndexMap;

use crate::error::DecodeError;
use crate::value::Value;

/// Decode a [`Value`] into a host type (spec §4.5).
///
/// There is no derive macro here — implementations are written by hand, the
/// way a plain-Rust decoder would be before reaching for a proc-macro crate.
/// [`StructDecoder`] and [`decode_union`] exist to keep hand-written struct
/// and tagged-union impls short.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, DecodeError>;
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Empty => "empty",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Bool(_) => "bool",
        Value::String(_) => "string",
        Value::List(_) => "list",
        Value::Map(_) => "map",
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, DecodeError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(*i).map_err(|_| DecodeError::Overflow),
                        other => Err(DecodeError::TypeMismatch {
                            expected: "int",
                            found: kind_name(other),
                        }),
                    }
                }
            }
        )+
    };
}

impl_from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(DecodeError::TypeMismatch {
                expected: "float",
                found: kind_name(other),
            }),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(DecodeError::TypeMismatch {
                expected: "bool",
                found: kind_name(other),
            }),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(DecodeError::TypeMismatch {
                expected: "string",
                found: kind_name(other),
            }),
        }
    }
}

/// The `void`/unit target (spec §4.5: "Only legal when the YAML contains
/// zero documents"). [`crate::load`] hands this impl [`Value::Empty`] when
/// the source had no documents at all; anything else decoding from `Empty`
/// here is a `TypeMismatch`, matching spec §8's boundary behavior ("decoding
/// void/unit succeeds, decoding anything else → `TypeMismatch`").
impl FromValue for () {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Empty => Ok(()),
            other => Err(DecodeError::TypeMismatch {
                expected: "empty",
                found: kind_name(other),
            }),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Empty => Ok(None),
            other => Ok(Some(T::from_value(other)?)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            other => Err(DecodeError::TypeMismatch {
                expected: "list",
                found: kind_name(other),
            }),
        }
    }
}

/// A byte-slice target (spec §4.5's `[]T` exception: "`T = byte` → use the
/// `string` payload directly").
///
/// Rust's coherence rules forbid a blanket `impl<T: FromValue> FromValue
/// for Vec<T>` from coexisting with a more specific `Vec<u8>` impl without
/// specialization, so the exception is expressed as a wrapper type instead
/// — the same trick `serde_bytes::ByteBuf` uses for exactly this shape of
/// problem. `Vec<u8>` itself still decodes from a `list` of integers, as
/// the blanket impl above dictates; reach for `Bytes` when the YAML side is
/// a `string` payload that should land in a `Vec<u8>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

impl FromValue for Bytes {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::String(s) => Ok(Bytes(s.clone().into_bytes())),
            other => Err(DecodeError::TypeMismatch {
                expected: "string",
                found: kind_name(other),
            }),
        }
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), T::from_value(v)?)))
                .collect(),
            other => Err(DecodeError::TypeMismatch {
                expected: "map",
                found: kind_name(other),
            }),
        }
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let Value::List(items) = value else {
            return Err(DecodeError::TypeMismatch {
                expected: "list",
                found: kind_name(value),
            });
        };
        if items.len() != N {
            return Err(DecodeError::ArraySizeMismatch {
                expected: N,
                found: items.len(),
            });
        }
        let decoded = items
            .iter()
            .map(T::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        match decoded.try_into() {
            Ok(array) => Ok(array),
            Err(_) => unreachable!("length already checked above"),
        }
    }
}

/// Borrows a mapping's entries while decoding a struct field by field
/// (spec §4.5, "struct decoding").
pub struct StructDecoder<'a> {
    map: &'a IndexMap<String, Value>,
}

impl<'a> StructDecoder<'a> {
    pub fn new(value: &'a Value) -> Result<Self, DecodeError> {
        match value {
            Value::Map(map) => Ok(Self { map }),
            other => Err(DecodeError::TypeMismatch {
                expected: "map",
                found: kind_name(other),
            }),
        }
    }

    /// Look up a field by name, retrying with every `_` turned into `-` if
    /// the literal name isn't present (spec §4.5, struct decoding: "if not
    /// found, retry with `_` → `-` substitution").
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.map.get(name).or_else(|| {
            if name.contains('_') {
                self.map.get(&name.replace('_', "-"))
            } else {
                None
            }
        })
    }

    /// Decode a required field, raising [`DecodeError::StructFieldMissing`]
    /// if it's absent from the mapping (under either spelling).
    pub fn field<T: FromValue>(&self, name: &'static str) -> Result<T, DecodeError> {
        match self.lookup(name) {
            Some(value) => T::from_value(value),
            None => Err(DecodeError::StructFieldMissing { field: name }),
        }
    }

    /// Decode an optional field: absent from the mapping (under either
    /// spelling), or present as `Value::Empty`, both decode to `None`.
    pub fn field_opt<T: FromValue>(&self, name: &'static str) -> Result<Option<T>, DecodeError> {
        match self.lookup(name) {
            None => Ok(None),
            Some(value) => Option::<T>::from_value(value),
        }
    }
}

/// Decode a tagged union (spec §4.5, "tagged union decoding"): try each
/// variant's decoder in declaration order and accept the first one that
/// succeeds. `TypeMismatch` and `StructFieldMissing` are tolerated while
/// probing — they just mean "not this variant" — but any other error (an
/// `Overflow` on a field both variants share, say) is fatal and propagates
/// immediately, matching spec §7's "the typed decoder recovers only while
/// probing union alternatives".
///
/// `tag_field` additionally gates entry: a map lacking it raises
/// `UnionTagMissing` up front, the way a real tagged union would insist on
/// its discriminant being present before even trying variants. If every
/// variant declined, the result is `UntaggedUnion`.
pub fn decode_union<T>(
    value: &Value,
    tag_field: &'static str,
    variants: &[(&'static str, fn(&Value) -> Result<T, DecodeError>)],
) -> Result<T, DecodeError> {
    let Value::Map(map) = value else {
        return Err(DecodeError::TypeMismatch {
            expected: "map",
            found: kind_name(value),
        });
    };
    if !map.contains_key(tag_field) {
        return Err(DecodeError::UnionTagMissing { field: tag_field });
    }
    for (_, decode) in variants {
        match decode(value) {
            Ok(decoded) => return Ok(decoded),
            Err(DecodeError::TypeMismatch { .. } | DecodeError::StructFieldMissing { .. }) => {
                continue
            }
            Err(other) => return Err(other),
        }
    }
    Err(DecodeError::UntaggedUnion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Point {
        x: i64,
        y: i64,
        label: Option<String>,
    }

    impl FromValue for Point {
        fn from_value(value: &Value) -> Result<Self, DecodeError> {
            let d = StructDecoder::new(value)?;
            Ok(Point {
                x: d.field("x")?,
                y: d.field("y")?,
                label: d.field_opt("label")?,
            })
        }
    }

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn decodes_a_hand_written_struct() {
        let value = map(vec![("x", Value::Int(1)), ("y", Value::Int(2))]);
        let point = Point::from_value(&value).unwrap();
        assert_eq!((point.x, point.y, point.label), (1, 2, None));
    }

    #[test]
    fn missing_required_field_errors() {
        let value = map(vec![("x", Value::Int(1))]);
        let err = Point::from_value(&value).unwrap_err();
        assert!(matches!(err, DecodeError::StructFieldMissing { field: "y" }));
    }

    #[test]
    fn unit_decodes_from_empty_and_rejects_anything_else() {
        <()>::from_value(&Value::Empty).unwrap();
        let err = <()>::from_value(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { expected: "empty", .. }));
    }

    #[test]
    fn bytes_decodes_from_a_string_payload() {
        let value = Value::String("abc".to_string());
        let bytes = Bytes::from_value(&value).unwrap();
        assert_eq!(bytes.0, b"abc".to_vec());
    }

    #[test]
    fn integer_overflow_is_reported() {
        let value = Value::Int(1000);
        let err = u8::from_value(&value).unwrap_err();
        assert!(matches!(err, DecodeError::Overflow));
    }

    #[test]
    fn tagged_union_dispatches_on_discriminant() {
        enum Shape {
            Circle(f64),
            Square(f64),
        }
        fn decode_circle(value: &Value) -> Result<Shape, DecodeError> {
            let d = StructDecoder::new(value)?;
            Ok(Shape::Circle(d.field("radius")?))
        }
        fn decode_square(value: &Value) -> Result<Shape, DecodeError> {
            let d = StructDecoder::new(value)?;
            Ok(Shape::Square(d.field("side")?))
        }
        let value = map(vec![
            ("kind", Value::String("circle".to_string())),
            ("radius", Value::Float(2.0)),
        ]);
        let shape = decode_union(
            &value,
            "kind",
            &[("circle", decode_circle), ("square", decode_square)],
        )
        .unwrap();
        assert!(matches!(shape, Shape::Circle(r) if r == 2.0));

        // "square" is tried first here but its required field is absent,
        // which must be tolerated rather than fatal — the next variant
        // still gets a chance.
        let shape = decode_union(
            &value,
            "kind",
            &[("square", decode_square), ("circle", decode_circle)],
        )
        .unwrap();
        assert!(matches!(shape, Shape::Circle(r) if r == 2.0));
    }

    #[test]
    fn tagged_union_without_tag_field_is_rejected_up_front() {
        enum Shape {
            Circle(f64),
        }
        fn decode_circle(value: &Value) -> Result<Shape, DecodeError> {
            let d = StructDecoder::new(value)?;
            Ok(Shape::Circle(d.field("radius")?))
        }
        let value = map(vec![("radius", Value::Float(2.0))]);
        let err = decode_union(&value, "kind", &[("circle", decode_circle)]).unwrap_err();
        assert!(matches!(err, DecodeError::UnionTagMissing { field: "kind" }));
    }

    #[test]
    fn struct_field_falls_back_from_underscore_to_hyphen() {
        struct Retry {
            retry_count: i64,
        }
        impl FromValue for Retry {
            fn from_value(value: &Value) -> Result<Self, DecodeError> {
                let d = StructDecoder::new(value)?;
                Ok(Retry {
                    retry_count: d.field("retry_count")?,
                })
            }
        }
        let value = map(vec![("retry-count", Value::Int(3))]);
        let retry = Retry::from_value(&value).unwrap();
        assert_eq!(retry.retry_count, 3);
    }
}
