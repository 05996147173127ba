//! A live connection and the two tasks that pump it.
//!
//! Each connection runs an inbound pump (socket → hub) and an outbound pump
//! (outbound queue → socket). [`Connection::serve`] supervises them as one
//! group so neither outlives the other, and tears both down as soon as the
//! hub lets go of the connection.

pub mod inbound;
pub mod outbound;

use std::{fmt, time::Duration};

use axum::extract::ws::Message;
use futures_util::{StreamExt, sink::Sink, stream::Stream};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    domain::{ConnectionId, WireFrame},
    hub::{HubHandle, Membership},
};

pub use inbound::InboundExit;
pub use outbound::OutboundExit;

pub struct Connection<T> {
    id: ConnectionId,
    transport: T,
    outbound: mpsc::Receiver<WireFrame>,
    released: oneshot::Receiver<()>,
}

impl<T> Connection<T> {
    /// Wrap `transport` with an empty outbound queue holding up to `capacity`
    /// frames. The returned membership is meant for the hub and nobody else.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn open(id: ConnectionId, transport: T, capacity: usize) -> (Self, Membership) {
        let (tx, rx) = mpsc::channel(capacity);
        let (release, released) = oneshot::channel();
        let connection = Self {
            id,
            transport,
            outbound: rx,
            released,
        };
        (connection, Membership::new(tx, release))
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<T, E> Connection<T>
where
    T: Stream<Item = Result<Message, E>> + Sink<Message> + Send + 'static,
    E: fmt::Display + Send + 'static,
    <T as Sink<Message>>::Error: fmt::Display + Send + 'static,
{
    /// Run both pumps until the connection is done, then make sure it is no
    /// longer a hub member.
    ///
    /// Once the read side stops or the hub releases the connection, the
    /// outbound pump has `close_grace` to flush the close frame before it is
    /// aborted.
    pub async fn serve(self, hub: HubHandle, close_grace: Duration) {
        let Connection {
            id,
            transport,
            outbound,
            mut released,
        } = self;
        let (sink, stream) = transport.split();

        let mut inbound_task = tokio::spawn(inbound::pump(id, stream, hub.clone()));
        let mut outbound_task = tokio::spawn(outbound::pump(id, outbound, sink));

        tokio::select! {
            exit = &mut inbound_task => {
                tracing::debug!("Inbound pump of '{}' stopped: {:?}", id, exit);
                // the unregister releases the queue, which lets the outbound pump say goodbye
                finish_outbound(id, outbound_task, close_grace).await;
            }
            exit = &mut outbound_task => {
                tracing::debug!("Outbound pump of '{}' stopped: {:?}", id, exit);
                inbound_task.abort();
            }
            _ = &mut released => {
                tracing::debug!("Connection '{}' released by the hub, closing", id);
                inbound_task.abort();
                finish_outbound(id, outbound_task, close_grace).await;
            }
        }

        if hub.unregister(id).await.is_err() {
            tracing::warn!("Hub stopped before '{}' could be unregistered", id);
        }
        tracing::info!("Connection '{}' closed", id);
    }
}

async fn finish_outbound(
    id: ConnectionId,
    mut outbound_task: JoinHandle<OutboundExit>,
    close_grace: Duration,
) {
    match tokio::time::timeout(close_grace, &mut outbound_task).await {
        Ok(exit) => tracing::debug!("Outbound pump of '{}' stopped: {:?}", id, exit),
        Err(_) => {
            tracing::debug!("Outbound pump of '{}' did not finish in time, aborting", id);
            outbound_task.abort();
        }
    }
}
