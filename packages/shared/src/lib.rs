//! Utilities shared by the relay server and client binaries.

pub mod logger;
