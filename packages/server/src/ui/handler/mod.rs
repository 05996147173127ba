//! Request handlers.

pub mod websocket;

pub use websocket::{admit, websocket_handler};
