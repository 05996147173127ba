//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::RelayConfig,
    domain::UuidConnectionIdFactory,
    error::RelayError,
    hub::Hub,
};

use super::{handler::websocket_handler, signal::shutdown_signal, state::AppState};

/// Broadcast relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(RelayConfig::default());
/// server.run().await?;
/// ```
pub struct Server {
    config: RelayConfig,
}

impl Server {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Start the hub, bind the listener and serve until Ctrl+C / SIGTERM.
    ///
    /// Open connections are not drained; they end with the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, if binding fails, or
    /// if serving fails.
    pub async fn run(self) -> Result<(), RelayError> {
        self.config.validate()?;

        let state = AppState {
            hub: Hub::spawn(self.config.hub_capacity),
            ids: Arc::new(UuidConnectionIdFactory),
            outbound_capacity: self.config.outbound_capacity,
            close_grace: self.config.close_grace,
        };

        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Relay server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!(
            "Outbound queue capacity: {} frames per connection",
            self.config.outbound_capacity
        );

        serve(listener, state, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// The relay's only route: `GET /ws`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve the relay on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), RelayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
