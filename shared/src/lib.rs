//! Types shared between the pong server and its clients.
//!
//! Everything here derives `ts_rs::TS` so the browser client can import generated bindings.

pub mod config;
pub mod protocol;
pub mod vec2;
