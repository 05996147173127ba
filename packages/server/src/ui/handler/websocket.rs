//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    connection::Connection,
    domain::ConnectionIdFactory,
    error::RelayError,
    hub::HubHandle,
    ui::state::AppState,
};

/// Upgrade the request to a WebSocket and hand the socket to the hub.
///
/// The `Origin` header is not checked: connections from any origin are
/// accepted. Requests that are not a valid upgrade get `404 Not Found` and
/// leave the hub untouched.
pub async fn websocket_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!("Rejected WebSocket upgrade: {}", rejection);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    ws.on_failed_upgrade(|e: axum::Error| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    match admit(
        socket,
        &state.hub,
        state.ids.as_ref(),
        state.outbound_capacity,
    )
    .await
    {
        Ok(connection) => {
            tracing::info!("Connection '{}' accepted", connection.id());
            connection
                .serve(state.hub.clone(), state.close_grace)
                .await;
        }
        Err(e) => tracing::error!("Failed to register connection: {}", e),
    }
}

/// Give `transport` a fresh identifier and an empty outbound queue, and
/// register it with the hub. The caller still has to serve the returned
/// connection.
///
/// # Errors
///
/// Returns `RelayError::HubUnavailable` if the hub has stopped.
pub async fn admit<T>(
    transport: T,
    hub: &HubHandle,
    ids: &dyn ConnectionIdFactory,
    capacity: usize,
) -> Result<Connection<T>, RelayError> {
    let id = ids.generate();
    let (connection, membership) = Connection::open(id, transport, capacity);

    hub.register(id, membership).await?;

    Ok(connection)
}
