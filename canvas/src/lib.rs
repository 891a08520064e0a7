//! Client replay engine for the shared pixel canvas.
//!
//! This crate is compiled to WebAssembly and runs in the browser, and is also
//! used natively by the CLI and the server's end-to-end tests. It turns the
//! server's message stream into paint operations, keeps a mirror of the
//! authoritative pixel sequence, and captures local strokes as outbound
//! `APPEND_PIXELS` messages. The host is responsible only for moving frames
//! between the websocket and the engine.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::ReplayEngine`], brush, and echo policy |
//! | [`surface`] | The [`surface::Surface`] trait plus in-memory surfaces |
//! | [`render`] | [`render::CanvasSurface`] over a browser 2D context |
//! | [`web`] | [`web::WebEngine`], the `wasm-bindgen` export |
//! | [`consts`] | Shared defaults |

pub mod consts;
pub mod engine;
pub mod render;
pub mod surface;
pub mod web;
