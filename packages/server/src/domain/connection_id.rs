//! Connection identifier value object and its factory.

use std::fmt;

use uuid::Uuid;

/// Opaque, globally unique identifier of one live connection.
///
/// Assigned once when the connection is accepted and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Source of fresh connection identifiers.
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionIdFactory: Send + Sync {
    fn generate(&self) -> ConnectionId;
}

/// Random (v4) UUID identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidConnectionIdFactory;

impl ConnectionIdFactory for UuidConnectionIdFactory {
    fn generate(&self) -> ConnectionId {
        ConnectionId(Uuid::new_v4())
    }
}
