//! Commands accepted by the hub loop and the handle used to submit them.

use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{ConnectionId, WireFrame},
    error::RelayError,
};

/// Writer side of a connection's outbound queue. Only the hub holds it.
pub type OutboundSender = mpsc::Sender<WireFrame>;

/// What the hub keeps for each member: the writer of its outbound queue and
/// a release guard. Dropping the membership (unregister or eviction) closes
/// the queue and wakes the connection waiting on the guard's receiver.
#[derive(Debug)]
pub struct Membership {
    outbound: OutboundSender,
    _release: oneshot::Sender<()>,
}

impl Membership {
    pub fn new(outbound: OutboundSender, release: oneshot::Sender<()>) -> Self {
        Self {
            outbound,
            _release: release,
        }
    }

    pub(crate) fn outbound(&self) -> &OutboundSender {
        &self.outbound
    }
}

#[derive(Debug)]
pub(crate) enum HubCommand {
    Register {
        id: ConnectionId,
        membership: Membership,
    },
    Unregister {
        id: ConnectionId,
    },
    Broadcast {
        frame: WireFrame,
        origin: ConnectionId,
    },
    Members {
        result: oneshot::Sender<Vec<ConnectionId>>,
    },
}

/// Cloneable handle to a running hub.
///
/// Every command goes through one channel, so commands from all handles are
/// processed in the order they were submitted.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(crate) fn new(commands: mpsc::Sender<HubCommand>) -> Self {
        Self { commands }
    }

    /// Add a connection to the membership set and announce it to the others.
    ///
    /// The hub becomes the only owner of `membership`.
    pub async fn register(
        &self,
        id: ConnectionId,
        membership: Membership,
    ) -> Result<(), RelayError> {
        self.submit(HubCommand::Register { id, membership }).await
    }

    /// Remove a connection. Unknown or already removed ids are ignored.
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), RelayError> {
        self.submit(HubCommand::Unregister { id }).await
    }

    /// Deliver a frame sent by `origin` to every other member.
    ///
    /// Dropped by the hub if `origin` is no longer a member.
    pub async fn broadcast_from(
        &self,
        origin: ConnectionId,
        frame: WireFrame,
    ) -> Result<(), RelayError> {
        self.submit(HubCommand::Broadcast { frame, origin }).await
    }

    /// Snapshot of the current members, taken after every previously
    /// submitted command has been applied.
    pub async fn members(&self) -> Result<Vec<ConnectionId>, RelayError> {
        let (tx, rx) = oneshot::channel();
        self.submit(HubCommand::Members { result: tx }).await?;
        rx.await.map_err(|_| RelayError::HubUnavailable)
    }

    async fn submit(&self, command: HubCommand) -> Result<(), RelayError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RelayError::HubUnavailable)
    }
}
