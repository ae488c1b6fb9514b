//! Codec trait and the JSON implementation.
//!
//! The transport layer doesn't care how messages are serialized — it asks
//! a [`Codec`] to turn typed values into bytes and back. JSON is the only
//! implementation today: the embedding web app reads frames in DevTools,
//! and frame sizes are tiny at this scale. A binary codec can slot in
//! later without touching any other layer.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes typed values to bytes and decodes bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientCommand, GameId, UserId};

    #[test]
    fn test_json_codec_round_trips_commands() {
        let codec = JsonCodec;
        let cmd = ClientCommand::EndTurn {
            game_id: GameId(5),
            user_id: UserId::new("alice"),
        };

        let bytes = codec.encode(&cmd).unwrap();
        let decoded: ClientCommand = codec.decode(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientCommand, _> = codec.decode(b"definitely not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_decode_wrong_shape_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientCommand, _> = codec.decode(br#"{"hello": "world"}"#);
        assert!(result.is_err());
    }
}
