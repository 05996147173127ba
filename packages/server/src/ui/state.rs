//! Server state shared with the handlers.

use std::{sync::Arc, time::Duration};

use crate::{domain::ConnectionIdFactory, hub::HubHandle};

/// Shared application state
pub struct AppState {
    /// Handle to the hub every accepted connection registers with
    pub hub: HubHandle,
    /// Source of identifiers for accepted connections
    pub ids: Arc<dyn ConnectionIdFactory>,
    /// Bound of each new connection's outbound queue
    pub outbound_capacity: usize,
    /// Time a closing connection gets to flush its close frame
    pub close_grace: Duration,
}
