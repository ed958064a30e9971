//! HTTP API for the session controller
//!
//! Interface boundary to the presentation layer: status snapshot, the two
//! user toggles, the unlock gesture, and an SSE event stream. When running
//! against the emulated tracking source, found/lost injection routes stand
//! in for the external engine.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, AppContext};
