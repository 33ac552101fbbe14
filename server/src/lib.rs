//! Pong session server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod input;
pub mod physics;
pub mod protocol;
pub mod registry;
pub mod result;
pub mod session;
pub mod side;
pub mod state;
pub mod ws;
