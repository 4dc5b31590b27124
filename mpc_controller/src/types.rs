//! Scalar type tags and their plain Rust counterparts.

use std::fmt;

/// Scalar type tags understood by the controller.
///
/// The tag travels next to the raw bytes of every [`crate::Value`] so that the
/// receiving protection domain knows how to interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
}

/// Error type for unknown scalar type tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scalar type '{0}'")]
pub struct InvalidScalarType(pub String);

impl ScalarType {
    /// Tag used on the wire and in [`crate::Value::type_name`].
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int8 => "int8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint8 => "uint8",
            ScalarType::Uint16 => "uint16",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
        }
    }

    /// Size of a single element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::Int8 | ScalarType::Uint8 => 1,
            ScalarType::Int16 | ScalarType::Uint16 => 2,
            ScalarType::Int32 | ScalarType::Uint32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::Uint64 | ScalarType::Float64 => 8,
        }
    }
}

impl TryFrom<&str> for ScalarType {
    type Error = InvalidScalarType;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bool" => Ok(ScalarType::Bool),
            "int8" => Ok(ScalarType::Int8),
            "int16" => Ok(ScalarType::Int16),
            "int32" => Ok(ScalarType::Int32),
            "int64" => Ok(ScalarType::Int64),
            "uint8" => Ok(ScalarType::Uint8),
            "uint16" => Ok(ScalarType::Uint16),
            "uint32" => Ok(ScalarType::Uint32),
            "uint64" => Ok(ScalarType::Uint64),
            "float32" => Ok(ScalarType::Float32),
            "float64" => Ok(ScalarType::Float64),
            _ => Err(InvalidScalarType(value.to_string())),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Plain Rust type with a fixed-size little-endian encoding for a [`ScalarType`].
pub trait Scalar: Copy + Sized {
    /// Tag the encoded bytes are labelled with.
    const TYPE: ScalarType;

    /// Append the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode one element. Returns `None` if `bytes` is not exactly one element wide.
    fn read_le(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: ScalarType = ScalarType::$tag;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Option<Self> {
                    bytes.try_into().ok().map(<$ty>::from_le_bytes)
                }
            }
        )*
    };
}

impl_scalar! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for ty in [
            ScalarType::Bool,
            ScalarType::Int8,
            ScalarType::Int16,
            ScalarType::Int32,
            ScalarType::Int64,
            ScalarType::Uint8,
            ScalarType::Uint16,
            ScalarType::Uint32,
            ScalarType::Uint64,
            ScalarType::Float32,
            ScalarType::Float64,
        ] {
            assert_eq!(ScalarType::try_from(ty.name()), Ok(ty));
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert_eq!(
            ScalarType::try_from("xor_uint64"),
            Err(InvalidScalarType("xor_uint64".to_string()))
        );
    }

    #[test]
    fn test_int64_encoding_is_little_endian() {
        let mut out = Vec::new();
        (-2i64).write_le(&mut out);
        assert_eq!(out, vec![0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(i64::read_le(&out), Some(-2));
    }

    #[test]
    fn test_read_rejects_wrong_width() {
        assert_eq!(i64::read_le(&[0u8; 4]), None);
        assert_eq!(u16::read_le(&[1, 0]), Some(1));
    }
}
