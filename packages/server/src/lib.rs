//! Broadcast relay server library.
//!
//! Clients connect over WebSocket; every message one client sends is fanned
//! out to all the other connected clients by the [`hub::Hub`].

pub mod config;
pub mod connection;
pub mod domain;
pub mod error;
pub mod hub;
pub mod ui;
