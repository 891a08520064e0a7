//! Shared real-time pixel canvas server.
//!
//! Clients connect over a websocket, receive the full canvas once, then see
//! every append and clear as it happens.

pub mod config;
pub mod error;
pub mod registry;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
