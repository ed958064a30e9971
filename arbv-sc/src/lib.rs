//! # ARBV Session Controller Library (arbv-sc)
//!
//! Core marker-tracking session controller for the AR book viewer.
//!
//! **Purpose:** Reconcile the tracking engine's per-marker found/lost event
//! stream against the per-target media bindings, converging logical playback
//! state (active marker, playing, muted) to physical element state despite
//! autoplay restrictions and event races, and expose the session over an
//! HTTP/SSE control interface.
//!
//! **Architecture:** Single event-loop controller; external collaborators
//! (tracking engine, media elements) injected behind trait seams.

pub mod api;
pub mod config;
pub mod emulator;
pub mod error;
pub mod media;
pub mod registry;
pub mod session;
pub mod state;
pub mod tracking;

pub use error::{Error, Result};
pub use session::Session;
pub use state::{SessionStatus, SharedState};
