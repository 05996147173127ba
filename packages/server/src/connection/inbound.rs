//! Inbound pump: socket → hub.

use std::fmt;

use axum::extract::ws::Message;
use futures_util::stream::{Stream, StreamExt};

use crate::{
    domain::{ConnectionId, Envelope},
    hub::HubHandle,
};

/// Why an inbound pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundExit {
    /// The peer sent a close frame or the stream ended
    PeerClosed,
    /// Reading from the socket failed
    ReadFailed,
    /// The hub stopped accepting commands
    HubUnavailable,
}

/// Read frames until the socket closes, submitting each one to the hub as a
/// broadcast from `id`. On the way out the connection is unregistered and the
/// read half is dropped.
pub async fn pump<S, E>(id: ConnectionId, mut stream: S, hub: HubHandle) -> InboundExit
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let exit = loop {
        let content = match stream.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            Some(Ok(Message::Binary(data))) => String::from_utf8_lossy(&data).into_owned(),
            // pongs are answered by the socket itself
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break InboundExit::PeerClosed,
            Some(Err(e)) => {
                tracing::debug!("Read from '{}' failed: {}", id, e);
                break InboundExit::ReadFailed;
            }
        };

        let frame = match Envelope::message(id, content).to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode message from '{}', dropping it: {}", id, e);
                continue;
            }
        };

        if hub.broadcast_from(id, frame).await.is_err() {
            break InboundExit::HubUnavailable;
        }
    };

    if exit != InboundExit::HubUnavailable && hub.unregister(id).await.is_err() {
        tracing::warn!("Hub stopped before '{}' could be unregistered", id);
    }

    exit
}
