//! Run-code messages, their versioned frame encoding and the stream codec.

use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio_util::codec::LengthDelimitedCodec;

use crate::error::{DecodeError, EncodeError, InvalidValue};
use crate::value::{Value, ValueMap};
use crate::{HEADER_SIZE, MAX_FRAME_SIZE, REPLY_MAGIC, REPLY_VERSION, REQUEST_MAGIC, REQUEST_VERSION};

/// A named value as it travels on the wire.
///
/// The bytes are the value's plain encoding. Nothing here splits them into
/// shares, so a server receiving a `WireValue` sees the value in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireValue {
    pub name: String,
    pub pdk_name: String,
    pub type_name: String,
    pub data: Vec<u8>,
}

impl WireValue {
    pub fn from_entry(name: &str, value: &Value) -> Self {
        Self {
            name: name.to_string(),
            pdk_name: value.pdk_name().to_string(),
            type_name: value.type_name().to_string(),
            data: value.data().to_vec(),
        }
    }

    pub fn into_entry(self) -> Result<(String, Arc<Value>), InvalidValue> {
        let value = Value::new(self.pdk_name, self.type_name, Arc::from(self.data))?;
        Ok((self.name, Arc::new(value)))
    }
}

/// Flatten a value map, ordered by name so equal maps encode identically.
pub(crate) fn to_wire_values(map: &ValueMap) -> Vec<WireValue> {
    let mut values: Vec<_> = map
        .iter()
        .map(|(name, value)| WireValue::from_entry(name, value))
        .collect();
    values.sort_by(|a, b| a.name.cmp(&b.name));
    values
}

pub(crate) fn from_wire_values(values: Vec<WireValue>) -> Result<ValueMap, InvalidValue> {
    values.into_iter().map(WireValue::into_entry).collect()
}

/// Request to run a precompiled program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCodeRequest {
    pub program: String,
    pub arguments: Vec<WireValue>,
}

/// A worker's answer to a [`RunCodeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunCodeReply {
    /// The program finished and published these results.
    Results(Vec<WireValue>),
    /// The program failed. Messages are ordered outermost first, each one
    /// caused by the next.
    Failure(Vec<String>),
}

/// A message with its own frame tag and protocol version.
pub trait Frame: Serialize + DeserializeOwned {
    const MAGIC: [u8; 4];
    const VERSION: u32;
}

impl Frame for RunCodeRequest {
    const MAGIC: [u8; 4] = REQUEST_MAGIC;
    const VERSION: u32 = REQUEST_VERSION;
}

impl Frame for RunCodeReply {
    const MAGIC: [u8; 4] = REPLY_MAGIC;
    const VERSION: u32 = REPLY_VERSION;
}

/// Encode a message as `[MAGIC][VERSION][msgpack payload]`.
pub fn encode_frame<T: Frame>(message: &T) -> Result<Vec<u8>, EncodeError> {
    let payload = rmp_serde::to_vec(message).map_err(EncodeError)?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&T::MAGIC);
    frame.extend_from_slice(&T::VERSION.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode a frame, rejecting other message kinds and other protocol versions.
pub fn decode_frame<T: Frame>(frame: &[u8]) -> Result<T, DecodeError> {
    let Some((magic, rest)) = frame.split_first_chunk::<4>() else {
        return Err(DecodeError::Truncated(frame.len()));
    };
    let Some((version, payload)) = rest.split_first_chunk::<4>() else {
        return Err(DecodeError::Truncated(frame.len()));
    };
    if *magic != T::MAGIC {
        return Err(DecodeError::WrongMagic {
            expected: T::MAGIC,
            found: *magic,
        });
    }
    let version = u32::from_be_bytes(*version);
    if version != T::VERSION {
        return Err(DecodeError::UnsupportedVersion {
            got: version,
            expected: T::VERSION,
        });
    }
    rmp_serde::from_slice(payload).map_err(DecodeError::Payload)
}

/// Stream codec carrying one frame per big-endian u32 length prefix.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_SIZE)
        .new_codec()
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};
    use tokio_util::codec::{Decoder, Encoder};

    use super::*;

    fn arguments() -> ValueMap {
        let mut map = ValueMap::new();
        map.insert(
            "b".to_string(),
            Arc::new(Value::from_scalars("pd_shared3p", &[0i64, 1, 2])),
        );
        map.insert(
            "a".to_string(),
            Arc::new(Value::from_scalars("pd_shared3p", &[-1i64, 0, 1])),
        );
        map
    }

    #[test]
    fn test_request_survives_framing() {
        let request = RunCodeRequest {
            program: "scalar_product.sb".to_string(),
            arguments: to_wire_values(&arguments()),
        };
        let mut codec = frame_codec();
        let mut stream = BytesMut::new();
        codec
            .encode(Bytes::from(encode_frame(&request).unwrap()), &mut stream)
            .unwrap();
        assert_eq!(&stream[..4], &((stream.len() - 4) as u32).to_be_bytes());

        let frame = codec.decode(&mut stream).unwrap().unwrap();
        let decoded: RunCodeRequest = decode_frame(&frame).unwrap();
        assert_eq!(decoded, request);

        let map = from_wire_values(decoded.arguments).unwrap();
        assert_eq!(map, arguments());
    }

    #[test]
    fn test_wire_values_sorted_by_name() {
        let names: Vec<_> = to_wire_values(&arguments())
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_reply_rejected_as_request() {
        let reply = encode_frame(&RunCodeReply::Failure(vec!["boom".to_string()])).unwrap();
        assert!(matches!(
            decode_frame::<RunCodeRequest>(&reply),
            Err(DecodeError::WrongMagic {
                expected: REQUEST_MAGIC,
                found: REPLY_MAGIC
            })
        ));
    }

    #[test]
    fn test_reply_version_mismatch() {
        let mut reply = encode_frame(&RunCodeReply::Results(vec![])).unwrap();
        reply[4..8].copy_from_slice(&999u32.to_be_bytes());
        assert!(matches!(
            decode_frame::<RunCodeReply>(&reply),
            Err(DecodeError::UnsupportedVersion {
                got: 999,
                expected: REPLY_VERSION
            })
        ));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            decode_frame::<RunCodeReply>(b"MPCR\0\0"),
            Err(DecodeError::Truncated(6))
        ));
    }

    #[test]
    fn test_malformed_payload() {
        let mut frame = encode_frame(&RunCodeReply::Results(vec![])).unwrap();
        frame.truncate(HEADER_SIZE);
        frame.push(0xc1);
        assert!(matches!(
            decode_frame::<RunCodeReply>(&frame),
            Err(DecodeError::Payload(_))
        ));
    }

    #[test]
    fn test_invalid_wire_value_rejected() {
        let values = vec![WireValue {
            name: "c".to_string(),
            pdk_name: "pd_shared3p".to_string(),
            type_name: "int64".to_string(),
            data: vec![0; 5],
        }];
        assert!(from_wire_values(values).is_err());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut stream = BytesMut::new();
        stream.extend_from_slice(&(MAX_FRAME_SIZE as u32 + 1).to_be_bytes());
        assert!(frame_codec().decode(&mut stream).is_err());
    }
}
