//! Tracking engine boundary
//!
//! The external tracking engine (camera + marker recognition) is a black
//! box behind the `TrackingSource` trait: it delivers per-target found/lost
//! events with no payload beyond the id, and releases its camera/stream
//! resources on `stop()`. Delivery order per target follows the engine;
//! cross-target ordering is not guaranteed — the resolver's latch handles
//! that.

use crate::error::Result;
use arbv_common::TargetId;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One tracking engine report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEvent {
    /// The engine acquired the target
    Found(TargetId),
    /// The engine lost the target
    Lost(TargetId),
}

impl TrackingEvent {
    pub fn target_id(&self) -> TargetId {
        match self {
            TrackingEvent::Found(id) | TrackingEvent::Lost(id) => *id,
        }
    }
}

/// Sender half handed to a tracking source at start
pub type TrackingEventTx = mpsc::UnboundedSender<TrackingEvent>;

/// Receiver half consumed by the session controller
pub type TrackingEventRx = mpsc::UnboundedReceiver<TrackingEvent>;

/// Subscription interface to the external tracking engine
#[async_trait]
pub trait TrackingSource: Send + Sync {
    /// Begin delivering events on `events`
    ///
    /// Resolves only once the engine is ready (camera running, marker set
    /// loaded) — an explicit ready signal, not a flag to poll.
    async fn start(&mut self, events: TrackingEventTx) -> Result<()>;

    /// Stop tracking and release camera/stream resources
    async fn stop(&mut self) -> Result<()>;
}
