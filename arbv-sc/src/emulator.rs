//! Emulated collaborators
//!
//! The production tracking engine and media elements live outside this
//! process (camera pipeline, platform media stack). The emulated versions
//! here stand in for them in the dev binary and the test suites: the
//! tracking source is injectable from the HTTP surface or a test, and the
//! media element records every call it receives with a configurable play
//! policy.

use crate::error::Result;
use crate::media::{MediaElement, PlaybackBlocked};
use crate::tracking::{TrackingEvent, TrackingEventTx, TrackingSource};
use arbv_common::TargetId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

// ========================================
// Emulated media element
// ========================================

/// How the emulated element answers play requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayPolicy {
    /// Every play request is accepted
    Accept,
    /// Reject unmuted play until one muted play has succeeded — the shape
    /// of platform autoplay policy
    AutoplayGuard,
    /// Reject every unmuted play, accept muted ones
    RejectUnmuted,
    /// Reject every play request (backgrounded tab, dead output)
    Reject,
    /// Requests stay pending until `release_play()` is called; models a
    /// play promise that settles late
    Hold,
}

/// One recorded element call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementCall {
    /// A play request, with the element's mute flag at request time
    Play { muted: bool },
    Pause,
    SetMuted(bool),
    SeekStart,
    Release,
}

/// Media element that records every call it receives
pub struct EmulatedMediaElement {
    label: String,
    policy: PlayPolicy,
    muted: AtomicBool,
    playing: AtomicBool,
    released: AtomicBool,
    warmed: AtomicBool,
    calls: Mutex<Vec<ElementCall>>,
    hold_tx: watch::Sender<bool>,
}

impl EmulatedMediaElement {
    pub fn new(label: &str, policy: PlayPolicy) -> Arc<Self> {
        let (hold_tx, _) = watch::channel(false);
        Arc::new(Self {
            label: label.to_string(),
            policy,
            muted: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            released: AtomicBool::new(false),
            warmed: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            hold_tx,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Everything the element has been asked to do, in order
    pub fn calls(&self) -> Vec<ElementCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Mute flags of all play requests seen so far, in order
    pub fn play_calls(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ElementCall::Play { muted } => Some(muted),
                _ => None,
            })
            .collect()
    }

    /// Number of seek-to-start calls (reset tracking)
    pub fn seek_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ElementCall::SeekStart))
            .count()
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Settle held play requests (Hold policy only)
    pub fn release_play(&self) {
        let _ = self.hold_tx.send(true);
    }

    fn record(&self, call: ElementCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_for_release_play(&self) {
        let mut rx = self.hold_tx.subscribe();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl MediaElement for EmulatedMediaElement {
    async fn play(&self) -> std::result::Result<(), PlaybackBlocked> {
        let muted = self.is_muted();
        self.record(ElementCall::Play { muted });

        if self.is_released() {
            return Err(PlaybackBlocked);
        }

        match self.policy {
            PlayPolicy::Accept => {}
            PlayPolicy::AutoplayGuard => {
                if muted {
                    self.warmed.store(true, Ordering::Release);
                } else if !self.warmed.load(Ordering::Acquire) {
                    debug!("{}: unmuted play rejected (no prior muted play)", self.label);
                    return Err(PlaybackBlocked);
                }
            }
            PlayPolicy::RejectUnmuted => {
                if !muted {
                    return Err(PlaybackBlocked);
                }
            }
            PlayPolicy::Reject => return Err(PlaybackBlocked),
            PlayPolicy::Hold => {
                self.wait_for_release_play().await;
                // The source may have been released while the request was
                // pending
                if self.is_released() {
                    return Err(PlaybackBlocked);
                }
            }
        }

        self.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn pause(&self) {
        self.record(ElementCall::Pause);
        self.playing.store(false, Ordering::Release);
    }

    fn set_muted(&self, muted: bool) {
        self.record(ElementCall::SetMuted(muted));
        self.muted.store(muted, Ordering::Release);
    }

    fn seek_start(&self) {
        self.record(ElementCall::SeekStart);
    }

    fn release(&self) {
        self.record(ElementCall::Release);
        self.released.store(true, Ordering::Release);
        self.playing.store(false, Ordering::Release);
    }
}

// ========================================
// Emulated tracking source
// ========================================

#[derive(Default)]
struct InjectorShared {
    tx: Mutex<Option<TrackingEventTx>>,
    started: AtomicBool,
    stopped: AtomicBool,
}

/// Tracking source whose events are injected from outside (HTTP routes in
/// the dev binary, direct calls in tests)
pub struct EmulatedTrackingSource {
    shared: Arc<InjectorShared>,
}

/// Injection handle for an [`EmulatedTrackingSource`]
#[derive(Clone)]
pub struct TrackingInjector {
    shared: Arc<InjectorShared>,
}

impl EmulatedTrackingSource {
    pub fn new() -> (Self, TrackingInjector) {
        let shared = Arc::new(InjectorShared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            TrackingInjector { shared },
        )
    }
}

#[async_trait]
impl TrackingSource for EmulatedTrackingSource {
    async fn start(&mut self, events: TrackingEventTx) -> Result<()> {
        *self.shared.tx.lock().unwrap() = Some(events);
        self.shared.started.store(true, Ordering::Release);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        // Dropping the sender is the camera release: nothing can be
        // delivered afterwards
        self.shared.tx.lock().unwrap().take();
        self.shared.stopped.store(true, Ordering::Release);
        Ok(())
    }
}

impl TrackingInjector {
    /// Inject a found event; returns false once the source is stopped
    pub fn found(&self, id: TargetId) -> bool {
        self.send(TrackingEvent::Found(id))
    }

    /// Inject a lost event; returns false once the source is stopped
    pub fn lost(&self, id: TargetId) -> bool {
        self.send(TrackingEvent::Lost(id))
    }

    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    fn send(&self, event: TrackingEvent) -> bool {
        let guard = self.shared.tx.lock().unwrap();
        match guard.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accept_policy() {
        let element = EmulatedMediaElement::new("e", PlayPolicy::Accept);

        assert!(element.play().await.is_ok());
        assert!(element.is_playing());

        element.pause();
        assert!(!element.is_playing());
    }

    #[tokio::test]
    async fn test_autoplay_guard_rejects_cold_unmuted_play() {
        let element = EmulatedMediaElement::new("e", PlayPolicy::AutoplayGuard);

        // Unmuted before any muted play: rejected
        assert!(element.play().await.is_err());
        assert!(!element.is_playing());

        // A muted play warms the element
        element.set_muted(true);
        assert!(element.play().await.is_ok());

        // Unmuted now succeeds
        element.set_muted(false);
        assert!(element.play().await.is_ok());
        assert_eq!(element.play_calls(), vec![false, true, false]);
    }

    #[tokio::test]
    async fn test_hold_policy_waits_for_release() {
        let element = EmulatedMediaElement::new("e", PlayPolicy::Hold);

        let pending = {
            let element = Arc::clone(&element);
            tokio::spawn(async move { element.play().await })
        };

        // Still pending
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        element.release_play();
        assert!(pending.await.unwrap().is_ok());
        assert!(element.is_playing());
    }

    #[tokio::test]
    async fn test_held_play_rejects_after_source_release() {
        let element = EmulatedMediaElement::new("e", PlayPolicy::Hold);

        let pending = {
            let element = Arc::clone(&element);
            tokio::spawn(async move { element.play().await })
        };
        tokio::task::yield_now().await;

        element.release();
        element.release_play();

        assert!(pending.await.unwrap().is_err());
        assert!(!element.is_playing());
    }

    #[tokio::test]
    async fn test_injector_delivery_and_stop() {
        let (mut source, injector) = EmulatedTrackingSource::new();
        assert!(!injector.is_started());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        source.start(tx).await.unwrap();
        assert!(injector.is_started());

        assert!(injector.found(TargetId(1)));
        assert_eq!(rx.recv().await, Some(TrackingEvent::Found(TargetId(1))));

        source.stop().await.unwrap();
        assert!(injector.is_stopped());
        assert!(!injector.lost(TargetId(1)));
    }
}
