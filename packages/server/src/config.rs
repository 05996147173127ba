//! Runtime configuration of the relay server.

use std::time::Duration;

use crate::error::RelayError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 12345;
/// Frames a connection may have waiting before it is treated as a slow consumer.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
/// Commands (register, unregister, broadcast) that may wait for the hub loop.
pub const DEFAULT_HUB_CAPACITY: usize = 1024;
/// Time a closing connection gets to flush its close frame before it is cut.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Bound of each connection's outbound queue
    pub outbound_capacity: usize,
    /// Bound of the hub's command queue
    pub hub_capacity: usize,
    /// How long a closing connection may take to send its close frame
    pub close_grace: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            hub_capacity: DEFAULT_HUB_CAPACITY,
            close_grace: DEFAULT_CLOSE_GRACE,
        }
    }
}

impl RelayConfig {
    /// Check that both queue bounds are usable.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::InvalidConfig` if a capacity is zero.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.outbound_capacity == 0 {
            return Err(RelayError::InvalidConfig(
                "outbound capacity must be at least 1".to_string(),
            ));
        }
        if self.hub_capacity == 0 {
            return Err(RelayError::InvalidConfig(
                "hub capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
