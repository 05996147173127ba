//! Interactive terminal client for the broadcast relay.

pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::{ReconnectPolicy, run_client};
