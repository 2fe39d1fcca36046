use indexmap::IndexMap;

use crate::error::EncodeError;
use crate::value::Value;

/// Encode a host type into a [`Value`] (spec §4.6).
///
/// Fallible, not infallible: a float that can't round-trip through the
/// leaf classification in §4.4 (`NaN`, `inf`, `-inf` would come back out as
/// a string, not a float) is rejected rather than silently encoded as
/// something decode would never produce; an integer that overflows `i64`
/// is [`EncodeError::Overflow`] (spec §4.6: "overflow to i64 = `Overflow`").
pub trait ToValue {
    fn to_value(&self) -> Result<Value, EncodeError>;
}

macro_rules! impl_to_value_int {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Result<Value, EncodeError> {
                    Ok(Value::Int(i64::from(*self)))
                }
            }
        )+
    };
}

impl_to_value_int!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for u64 {
    fn to_value(&self) -> Result<Value, EncodeError> {
        i64::try_from(*self)
            .map(Value::Int)
            .map_err(|_| EncodeError::Overflow)
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Result<Value, EncodeError> {
        i64::try_from(*self)
            .map(Value::Int)
            .map_err(|_| EncodeError::Overflow)
    }
}

impl ToValue for isize {
    fn to_value(&self) -> Result<Value, EncodeError> {
        Ok(Value::Int(*self as i64))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value, EncodeError> {
        if self.is_finite() {
            Ok(Value::Float(*self))
        } else {
            Err(EncodeError::CannotEncodeValue)
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value, EncodeError> {
        (*self as f64).to_value()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value, EncodeError> {
        Ok(Value::Bool(*self))
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value, EncodeError> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, EncodeError> {
        Ok(Value::String(self.clone()))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, EncodeError> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Empty),
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Result<Value, EncodeError> {
        let mut list = Vec::with_capacity(self.len());
        for item in self {
            let encoded = item.to_value()?;
            if matches!(encoded, Value::Empty) {
                return Err(EncodeError::CannotEncodeValue);
            }
            list.push(encoded);
        }
        Ok(Value::List(list))
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Result<Value, EncodeError> {
        self.as_slice().to_value()
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Result<Value, EncodeError> {
        self.as_slice().to_value()
    }
}

/// Encode-side counterpart to [`crate::decode::Bytes`]: a byte slice that
/// should become a `string` payload rather than a `list` of integers (spec
/// §4.6, "Slices of bytes → string; other slices → list"). `Vec<u8>`/`[u8]`
/// themselves still go through the blanket slice impl above and encode as a
/// `list`, for the reason given on [`crate::decode::Bytes`].
pub struct Bytes<'a>(pub &'a [u8]);

impl ToValue for Bytes<'_> {
    fn to_value(&self) -> Result<Value, EncodeError> {
        String::from_utf8(self.0.to_vec())
            .map(Value::String)
            .map_err(|_| EncodeError::CannotEncodeValue)
    }
}

impl<T: ToValue> ToValue for IndexMap<String, T> {
    fn to_value(&self) -> Result<Value, EncodeError> {
        let mut map = IndexMap::with_capacity(self.len());
        for (key, value) in self {
            map.insert(key.clone(), value.to_value()?);
        }
        Ok(Value::Map(map))
    }
}

/// Accumulates fields while hand-writing a struct's `ToValue` impl, the
/// encode-side counterpart to [`crate::decode::StructDecoder`].
#[derive(Default)]
pub struct MapEncoder {
    map: IndexMap<String, Value>,
}

impl MapEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `value` and insert it under `name` — unless it encodes to
    /// "absent" (`Value::Empty`), which is filtered out of the aggregate
    /// rather than stored (spec §4.6: "Optional `None` → absent (encoded as
    /// `null`, filtered out by aggregates)").
    pub fn field(mut self, name: &str, value: impl ToValue) -> Result<Self, EncodeError> {
        let encoded = value.to_value()?;
        if !matches!(encoded, Value::Empty) {
            self.map.insert(name.to_string(), encoded);
        }
        Ok(self)
    }

    pub fn finish(self) -> Value {
        Value::Map(self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_primitives() {
        assert_eq!(42i64.to_value().unwrap(), Value::Int(42));
        assert_eq!(true.to_value().unwrap(), Value::Bool(true));
        assert_eq!("hi".to_value().unwrap(), Value::String("hi".to_string()));
    }

    #[test]
    fn bytes_encodes_to_a_string_payload() {
        assert_eq!(
            Bytes(b"abc").to_value().unwrap(),
            Value::String("abc".to_string())
        );
    }

    #[test]
    fn rejects_non_finite_floats() {
        assert!(matches!(
            f64::NAN.to_value(),
            Err(EncodeError::CannotEncodeValue)
        ));
        assert!(matches!(
            f64::INFINITY.to_value(),
            Err(EncodeError::CannotEncodeValue)
        ));
    }

    #[test]
    fn map_encoder_builds_a_mapping() {
        let value = MapEncoder::new()
            .field("x", 1i64)
            .unwrap()
            .field("y", 2i64)
            .unwrap()
            .finish();
        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map.get("x"), Some(&Value::Int(1)));
        assert_eq!(map.get("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn map_encoder_filters_out_absent_fields() {
        let value = MapEncoder::new()
            .field("present", Some(1i64))
            .unwrap()
            .field("absent", None::<i64>)
            .unwrap()
            .finish();
        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map.get("present"), Some(&Value::Int(1)));
        assert!(!map.contains_key("absent"));
    }

    #[test]
    fn u64_overflowing_i64_is_reported_as_overflow() {
        assert!(matches!(u64::MAX.to_value(), Err(EncodeError::Overflow)));
    }

    #[test]
    fn slice_with_an_absent_element_cannot_be_encoded() {
        let items = vec![None::<i64>, Some(1)];
        assert!(matches!(
            items.to_value(),
            Err(EncodeError::CannotEncodeValue)
        ));
    }

    #[test]
    fn encodes_a_vec_as_a_list() {
        let value = vec![1i64, 2, 3].to_value().unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }
}
