//! Outbound pump: outbound queue → socket.

use std::fmt;

use axum::extract::ws::Message;
use futures_util::sink::{Sink, SinkExt};
use tokio::sync::mpsc;

use crate::domain::{ConnectionId, WireFrame};

/// Why an outbound pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundExit {
    /// The hub released the queue; a close frame was sent
    Released,
    /// Writing to the socket failed
    WriteFailed,
}

/// Write queued frames to the socket until the hub releases the queue or a
/// write fails. Never unregisters: the connection's supervisor does that once
/// this pump has stopped.
pub async fn pump<K>(
    id: ConnectionId,
    mut queue: mpsc::Receiver<WireFrame>,
    mut sink: K,
) -> OutboundExit
where
    K: Sink<Message> + Unpin,
    K::Error: fmt::Display,
{
    while let Some(frame) = queue.recv().await {
        if let Err(e) = sink.send(Message::Text(frame)).await {
            tracing::debug!("Write to '{}' failed: {}", id, e);
            let _ = sink.close().await;
            return OutboundExit::WriteFailed;
        }
    }

    tracing::debug!("Outbound queue of '{}' released, closing socket", id);
    if let Err(e) = sink.send(Message::Close(None)).await {
        tracing::debug!("Failed to send close frame to '{}': {}", id, e);
    }
    let _ = sink.close().await;

    OutboundExit::Released
}
