//! Event types for the ARBV event system
//!
//! Provides the shared event definitions and the EventBus used by the
//! session controller and its SSE surface.

use crate::target::TargetId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Tracking status of the session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    /// No target has been seen yet
    Searching,
    /// The active target is currently tracked
    Found,
    /// The active target dropped out of tracking
    Lost,
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingStatus::Searching => write!(f, "searching"),
            TrackingStatus::Found => write!(f, "found"),
            TrackingStatus::Lost => write!(f, "lost"),
        }
    }
}

/// Classification of a `found` transition
///
/// Re-scan of the target that is already active keeps its playback position;
/// the other two transitions reset every binding to the start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ScanTransition {
    /// First target ever seen in this session
    FirstScan,
    /// A different target supersedes the previous one
    Switch,
    /// The currently active target was briefly lost and re-acquired
    Rescan,
}

impl std::fmt::Display for ScanTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanTransition::FirstScan => write!(f, "FirstScan"),
            ScanTransition::Switch => write!(f, "Switch"),
            ScanTransition::Rescan => write!(f, "Rescan"),
        }
    }
}

/// ARBV event types
///
/// Events are broadcast via the EventBus and serialized for SSE
/// transmission. All session-visible state transitions go through this enum
/// so connected clients can mirror the controller without polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArbvEvent {
    /// Tracking status changed (searching / found / lost)
    TrackingStatusChanged {
        /// Status before change
        old_status: TrackingStatus,
        /// Status after change
        new_status: TrackingStatus,
        /// When status changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A target was found by the tracking engine and became active
    TargetFound {
        /// Target that is now active
        target_id: TargetId,
        /// How the transition was classified
        transition: ScanTransition,
        /// When the target was found
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active target was lost by the tracking engine
    ///
    /// Late `lost` events for superseded targets are discarded by the
    /// resolver and never reach the bus.
    TargetLost {
        /// Target that was lost
        target_id: TargetId,
        /// When the target was lost
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Logical playback state flipped (play / pause)
    PlaybackStateChanged {
        /// Whether media should now be playing
        playing: bool,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Mute flag changed
    MuteChanged {
        /// New mute flag
        muted: bool,
        /// True when the mute was forced by autoplay policy rather than
        /// requested by the user
        forced: bool,
        /// When the flag changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A play attempt was blocked even after the muted retry
    ///
    /// Diagnostic only; the session recovers on a later `found` once a user
    /// gesture has unlocked playback.
    PlaybackBlocked {
        /// Target whose media failed to start
        target_id: TargetId,
        /// When the attempt was abandoned
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The one-shot unlock handshake completed
    SessionUnlocked {
        /// When all pre-warm attempts had settled
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session was torn down and released its resources
    SessionTornDown {
        /// When teardown completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ArbvEvent {
    /// Get event type as string for SSE event names and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ArbvEvent::TrackingStatusChanged { .. } => "TrackingStatusChanged",
            ArbvEvent::TargetFound { .. } => "TargetFound",
            ArbvEvent::TargetLost { .. } => "TargetLost",
            ArbvEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            ArbvEvent::MuteChanged { .. } => "MuteChanged",
            ArbvEvent::PlaybackBlocked { .. } => "PlaybackBlocked",
            ArbvEvent::SessionUnlocked { .. } => "SessionUnlocked",
            ArbvEvent::SessionTornDown { .. } => "SessionTornDown",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ArbvEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ArbvEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ArbvEvent,
    ) -> Result<usize, broadcast::error::SendError<ArbvEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ArbvEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(100);
        let event = ArbvEvent::PlaybackStateChanged {
            playing: true,
            timestamp: chrono::Utc::now(),
        };

        // Should return error when no subscribers
        assert!(bus.emit(event).is_err());
    }

    #[test]
    fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let event = ArbvEvent::TargetFound {
            target_id: TargetId(1),
            transition: ScanTransition::FirstScan,
            timestamp: chrono::Utc::now(),
        };

        assert!(bus.emit(event).is_ok());

        let received = rx.try_recv().expect("Should receive event");
        match received {
            ArbvEvent::TargetFound {
                target_id,
                transition,
                ..
            } => {
                assert_eq!(target_id, TargetId(1));
                assert_eq!(transition, ScanTransition::FirstScan);
            }
            _ => panic!("Wrong event type received"),
        }
    }

    #[test]
    fn test_eventbus_emit_lossy() {
        let bus = EventBus::new(2); // Small capacity
        let mut _rx = bus.subscribe(); // Subscribe but don't receive

        for _ in 0..10 {
            bus.emit_lossy(ArbvEvent::PlaybackStateChanged {
                playing: false,
                timestamp: chrono::Utc::now(),
            }); // Should not panic even when full
        }

        assert_eq!(bus.capacity(), 2);
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(ArbvEvent::SessionUnlocked {
            timestamp: chrono::Utc::now(),
        })
        .expect("emit should succeed");

        assert_eq!(rx1.try_recv().unwrap().event_type(), "SessionUnlocked");
        assert_eq!(rx2.try_recv().unwrap().event_type(), "SessionUnlocked");
    }

    #[test]
    fn test_event_serialization_tagged() {
        let event = ArbvEvent::MuteChanged {
            muted: true,
            forced: true,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).expect("Serialization should succeed");
        assert!(json.contains("\"type\":\"MuteChanged\""));
        assert!(json.contains("\"muted\":true"));
        assert!(json.contains("\"forced\":true"));

        let deserialized: ArbvEvent = serde_json::from_str(&json).expect("Deserialization should succeed");
        match deserialized {
            ArbvEvent::MuteChanged { muted, forced, .. } => {
                assert!(muted);
                assert!(forced);
            }
            _ => panic!("Wrong event type deserialized"),
        }
    }

    #[test]
    fn test_event_type_method() {
        let events = vec![
            (
                ArbvEvent::TrackingStatusChanged {
                    old_status: TrackingStatus::Searching,
                    new_status: TrackingStatus::Found,
                    timestamp: chrono::Utc::now(),
                },
                "TrackingStatusChanged",
            ),
            (
                ArbvEvent::TargetLost {
                    target_id: TargetId(2),
                    timestamp: chrono::Utc::now(),
                },
                "TargetLost",
            ),
            (
                ArbvEvent::PlaybackBlocked {
                    target_id: TargetId(2),
                    timestamp: chrono::Utc::now(),
                },
                "PlaybackBlocked",
            ),
            (
                ArbvEvent::SessionTornDown {
                    timestamp: chrono::Utc::now(),
                },
                "SessionTornDown",
            ),
        ];

        for (event, expected_type) in events {
            assert_eq!(event.event_type(), expected_type);
        }
    }

    #[test]
    fn test_tracking_status_display() {
        assert_eq!(TrackingStatus::Searching.to_string(), "searching");
        assert_eq!(TrackingStatus::Found.to_string(), "found");
        assert_eq!(TrackingStatus::Lost.to_string(), "lost");
    }
}
