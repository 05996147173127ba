//! HTTP surface of the relay: the WebSocket upgrade endpoint and the server
//! that hosts it.

pub mod handler;
mod server;
mod signal;
pub mod state;

pub use server::{Server, router, serve};
pub use state::AppState;
