//! Named values exchanged with computation servers.

use std::{collections::HashMap, sync::Arc};

use crate::error::{InvalidValue, ParseError};
use crate::types::{Scalar, ScalarType};

/// Arguments or results of a program, keyed by the names the program uses.
pub type ValueMap = HashMap<String, Arc<Value>>;

/// A typed byte buffer tagged with the protection domain that interprets it.
///
/// The buffer is reference counted, so a value placed into a [`ValueMap`]
/// shares its bytes with every clone instead of copying them.
#[derive(Clone, PartialEq, Eq)]
pub struct Value {
    pdk_name: String,
    type_name: String,
    data: Arc<[u8]>,
}

impl Value {
    /// Wrap an existing buffer.
    ///
    /// If `type_name` is a known [`ScalarType`], the buffer must hold a whole
    /// number of elements. Unknown tags are accepted as-is for protection
    /// domains that define their own types.
    pub fn new(
        pdk_name: impl Into<String>,
        type_name: impl Into<String>,
        data: Arc<[u8]>,
    ) -> Result<Self, InvalidValue> {
        let type_name = type_name.into();
        if let Ok(scalar_type) = ScalarType::try_from(type_name.as_str()) {
            let width = scalar_type.byte_width();
            if data.len() % width != 0 {
                return Err(InvalidValue {
                    scalar_type,
                    width,
                    len: data.len(),
                });
            }
        }
        Ok(Self {
            pdk_name: pdk_name.into(),
            type_name,
            data,
        })
    }

    /// Encode `values` into a single freshly allocated buffer.
    pub fn from_scalars<T: Scalar>(pdk_name: impl Into<String>, values: &[T]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * T::TYPE.byte_width());
        for &value in values {
            value.write_le(&mut bytes);
        }
        Self {
            pdk_name: pdk_name.into(),
            type_name: T::TYPE.name().to_string(),
            data: Arc::from(bytes),
        }
    }

    /// Name of the protection domain the value belongs to.
    pub fn pdk_name(&self) -> &str {
        &self.pdk_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the underlying buffer.
    pub fn buffer(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Byte length of the buffer.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Decode a value holding exactly one element of type `T`.
    pub fn get_value<T: Scalar>(&self) -> Result<T, ParseError> {
        self.check_type::<T>()?;
        let width = T::TYPE.byte_width();
        T::read_le(&self.data).ok_or(ParseError::SizeMismatch {
            expected: width,
            got: self.data.len(),
        })
    }

    /// Decode a value holding any number of elements of type `T`.
    pub fn get_vector<T: Scalar>(&self) -> Result<Vec<T>, ParseError> {
        self.check_type::<T>()?;
        // known types are validated to whole elements on construction
        let width = T::TYPE.byte_width();
        self.data
            .chunks_exact(width)
            .map(|chunk| {
                T::read_le(chunk).ok_or(ParseError::SizeMismatch {
                    expected: width,
                    got: chunk.len(),
                })
            })
            .collect()
    }

    fn check_type<T: Scalar>(&self) -> Result<(), ParseError> {
        let scalar_type = ScalarType::try_from(self.type_name.as_str())
            .map_err(|_| ParseError::UnknownType(self.type_name.clone()))?;
        if scalar_type != T::TYPE {
            return Err(ParseError::TypeMismatch {
                expected: T::TYPE,
                got: self.type_name.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("pdk_name", &self.pdk_name)
            .field("type_name", &self.type_name)
            .field("size", &self.data.len())
            .finish()
    }
}
