//! Connection hub.
//!
//! The hub is the single authority over the set of live connections. It runs
//! as one task that applies [`HubCommand`]s strictly one at a time, so the
//! membership set needs no lock and every fan-out sees a consistent snapshot.
//!
//! Delivery never waits on a recipient: frames are pushed with `try_send`, and
//! a connection whose outbound queue is full (or already closed) is evicted on
//! the spot. Dropping its [`Membership`] closes the queue and tells the
//! connection's supervisor to tear both pumps down, so an evicted connection
//! is handled exactly like one whose socket failed.

mod command;

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::{ConnectionId, Envelope, WireFrame};

pub(crate) use command::HubCommand;
pub use command::{HubHandle, Membership, OutboundSender};

#[derive(Debug, Default)]
pub struct Hub {
    members: HashMap<ConnectionId, Membership>,
}

impl Hub {
    /// Spawn the hub loop and return a handle to it.
    ///
    /// The loop runs until every clone of the returned handle is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `command_capacity` is zero (see `RelayConfig::validate`).
    pub fn spawn(command_capacity: usize) -> HubHandle {
        let (tx, rx) = mpsc::channel(command_capacity);

        tokio::spawn(Hub::default().run(rx));

        HubHandle::new(tx)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<HubCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }

        tracing::debug!("All hub handles dropped, hub stopped");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register { id, membership } => self.register(id, membership),
            HubCommand::Unregister { id } => self.unregister(id),
            HubCommand::Broadcast { frame, origin } => {
                if self.members.contains_key(&origin) {
                    self.deliver(&frame, Some(origin));
                } else {
                    tracing::debug!("'{}' is not a member, dropping its broadcast", origin);
                }
            }
            HubCommand::Members { result } => {
                let _ = result.send(self.members.keys().copied().collect());
            }
        }
    }

    fn register(&mut self, id: ConnectionId, membership: Membership) {
        if self.members.contains_key(&id) {
            tracing::warn!("Connection '{}' is already registered, ignoring", id);
            return;
        }

        self.members.insert(id, membership);
        tracing::info!(
            "Connection '{}' registered ({} connected)",
            id,
            self.members.len()
        );

        self.announce(Envelope::joined(), Some(id));
    }

    fn unregister(&mut self, id: ConnectionId) {
        // Dropping the membership releases the connection.
        if self.members.remove(&id).is_none() {
            tracing::debug!("Connection '{}' is not registered, nothing to do", id);
            return;
        }
        tracing::info!(
            "Connection '{}' unregistered ({} connected)",
            id,
            self.members.len()
        );

        self.announce(Envelope::left(), None);
    }

    fn announce(&mut self, notice: Envelope, skip: Option<ConnectionId>) {
        match notice.to_frame() {
            Ok(frame) => self.deliver(&frame, skip),
            Err(e) => tracing::error!("Failed to encode notice, dropping it: {}", e),
        }
    }

    /// Fan `frame` out to every member except `skip`, then announce every
    /// eviction to whoever is still connected.
    fn deliver(&mut self, frame: &WireFrame, skip: Option<ConnectionId>) {
        let mut evicted = self.fan_out(frame, skip);
        if evicted.is_empty() {
            return;
        }

        let left = match Envelope::left().to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode notice, dropping it: {}", e);
                return;
            }
        };

        // A left notice can overflow another queue; terminates because every
        // round removes at least one member.
        while evicted.pop().is_some() {
            evicted.extend(self.fan_out(&left, None));
        }
    }

    fn fan_out(&mut self, frame: &WireFrame, skip: Option<ConnectionId>) -> Vec<ConnectionId> {
        let mut evicted = Vec::new();

        self.members.retain(|id, membership| {
            if Some(*id) == skip {
                return true;
            }

            match membership.outbound().try_send(frame.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Outbound queue of '{}' is full, dropping connection", id);
                    evicted.push(*id);
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("Outbound queue of '{}' is closed, dropping connection", id);
                    evicted.push(*id);
                    false
                }
            }
        });

        evicted
    }
}
