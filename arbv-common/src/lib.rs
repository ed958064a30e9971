//! # ARBV Common Library
//!
//! Shared code for the ARBV session controller:
//! - Event types (ArbvEvent enum) and EventBus
//! - Target identifiers and localized value maps
//! - Configuration loading
//! - Error types

pub mod config;
pub mod error;
pub mod events;
pub mod target;

pub use error::{Error, Result};
pub use target::TargetId;
