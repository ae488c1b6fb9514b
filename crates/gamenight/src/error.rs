//! Unified error type for the server layer.

use gamenight_protocol::ProtocolError;

/// Errors a connection handler or the accept loop can hit.
///
/// Command rejections are *not* errors at this level — they become
/// [`ServerEvent::Error`](gamenight_session::ServerEvent::Error) frames
/// for the acting client and the connection carries on.
#[derive(Debug, thiserror::Error)]
pub enum GamenightError {
    /// Encoding an outbound event failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The WebSocket layer failed (handshake, send, receive).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Binding or accepting TCP connections failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let wrapped: GamenightError = err.into();
        assert!(matches!(wrapped, GamenightError::Protocol(_)));
        assert!(wrapped.to_string().contains("bad"));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy");
        let wrapped: GamenightError = err.into();
        assert!(matches!(wrapped, GamenightError::Io(_)));
    }
}
