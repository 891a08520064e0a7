//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the shared canvas and its fanout so the route handler
//! can stay focused on protocol translation and connection lifecycle.

pub mod canvas;
