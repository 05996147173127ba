//! Domain types shared by the hub, the connection pumps and the client.

mod connection_id;
mod envelope;

pub use connection_id::{ConnectionId, ConnectionIdFactory, UuidConnectionIdFactory};
pub use envelope::{Envelope, JOIN_NOTICE, LEAVE_NOTICE, WireFrame};

#[cfg(test)]
pub use connection_id::MockConnectionIdFactory;
