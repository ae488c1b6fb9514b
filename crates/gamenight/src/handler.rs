//! Per-connection handler: decode commands in, pump events out.
//!
//! Each accepted WebSocket gets its own task running this loop. The
//! handler is deliberately thin — it validates frames into
//! [`ClientCommand`]s at the boundary and forwards them to the engine;
//! every game decision happens in the session layer.
//!
//! A connection may bind to sessions (join/rejoin); when the socket goes
//! away, each binding is reported so the disconnect-grace machinery can
//! take over.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use gamenight_protocol::{ClientCommand, Codec, JsonCodec};
use gamenight_session::{Binding, Engine, ServerEvent};

use crate::GamenightError;

/// Handles a single connection from WebSocket upgrade to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    engine: Arc<Engine>,
) -> Result<(), GamenightError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();

    // The engine pushes events for this client into `event_tx`; this
    // loop owns the socket and is the only writer to it.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let codec = JsonCodec;
    let mut bindings: Vec<Binding> = Vec::new();

    loop {
        tokio::select! {
            incoming = source.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "recv error, closing connection");
                        break;
                    }
                    None => break,
                };

                let data = match msg {
                    Message::Binary(data) => data.to_vec(),
                    Message::Text(text) => text.as_bytes().to_vec(),
                    Message::Close(_) => break,
                    // Ping/pong and frames are handled by tungstenite.
                    _ => continue,
                };

                // Boundary validation: only well-typed commands go further.
                let command: ClientCommand = match codec.decode(&data) {
                    Ok(command) => command,
                    Err(e) => {
                        tracing::debug!(error = %e, "undecodable frame");
                        let _ = event_tx.send(ServerEvent::Error {
                            message: format!("malformed command: {e}"),
                        });
                        continue;
                    }
                };

                match engine.handle(command, &event_tx).await {
                    Ok(Some(binding)) => {
                        if !bindings.contains(&binding) {
                            bindings.push(binding);
                        }
                    }
                    Ok(None) => {}
                    // Rejections go only to this client and mutate nothing.
                    Err(reject) => {
                        let _ = event_tx.send(ServerEvent::Error {
                            message: reject.to_string(),
                        });
                    }
                }
            }

            // `event_tx` lives in this scope, so recv() can't return None.
            Some(event) = event_rx.recv() => {
                let bytes = codec.encode(&event)?;
                if sink.send(Message::Binary(bytes.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    // The socket is gone: let every bound session start its grace clock.
    for (game_id, user_id) in bindings {
        engine.disconnected(game_id, user_id).await;
    }
    Ok(())
}
