//! Shared session state
//!
//! Published snapshot of the session, readable by the facade, the HTTP
//! surface, and tests. The controller loop owns the authoritative copy (its
//! latch); this struct only ever mirrors what the loop has already decided.

use arbv_common::events::{ArbvEvent, EventBus, TrackingStatus};
use arbv_common::TargetId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio::sync::RwLock;

/// Read-only snapshot of the session exposed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub tracking_status: TrackingStatus,
    pub active_target: Option<TargetId>,
    pub is_playing: bool,
    pub is_muted: bool,
    pub is_unlocked: bool,
}

impl SessionStatus {
    /// Initial state: nothing seen yet, locked, silent
    pub fn initial() -> Self {
        Self {
            tracking_status: TrackingStatus::Searching,
            active_target: None,
            is_playing: false,
            is_muted: false,
            is_unlocked: false,
        }
    }
}

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes; the torn-down
/// flag is atomic so late async completions can check it without locking.
pub struct SharedState {
    status: RwLock<SessionStatus>,

    /// Set exactly once, at teardown
    torn_down: AtomicBool,

    /// Event broadcaster for SSE and test observers
    events: EventBus,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        Self {
            status: RwLock::new(SessionStatus::initial()),
            torn_down: AtomicBool::new(false),
            events: EventBus::new(100),
        }
    }

    /// Get the current published snapshot
    pub async fn status(&self) -> SessionStatus {
        *self.status.read().await
    }

    /// Publish a new snapshot (controller loop only)
    pub async fn publish(&self, status: SessionStatus) {
        *self.status.write().await = status;
    }

    /// Whether the session has been torn down
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Mark the session torn down; returns true if it already was
    pub fn mark_torn_down(&self) -> bool {
        self.torn_down.swap(true, Ordering::AcqRel)
    }

    /// Broadcast an event to all listeners
    pub fn broadcast_event(&self, event: ArbvEvent) {
        // No receivers is OK
        self.events.emit_lossy(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<ArbvEvent> {
        self.events.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
