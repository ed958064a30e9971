//! Media bindings
//!
//! One binding per target, owning the target's video and/or audio elements
//! behind the `MediaElement` capability trait. The session core only ever
//! calls binding methods; it never touches rendering primitives directly.

use arbv_common::TargetId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Returned by a media element when the platform rejects a play request
/// (autoplay policy, backgrounded context, released source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackBlocked;

impl std::fmt::Display for PlaybackBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "play request blocked")
    }
}

/// Capability interface over one platform media element
///
/// Only `play()` suspends: its acceptance or rejection resolves later, on
/// the platform's schedule. Everything else takes effect immediately.
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Request playback; resolves once the platform accepts or rejects
    async fn play(&self) -> std::result::Result<(), PlaybackBlocked>;

    /// Pause playback, keeping the current position
    fn pause(&self);

    /// Set the mute flag
    fn set_muted(&self, muted: bool);

    /// Seek to position zero
    fn seek_start(&self);

    /// Stop the underlying stream and release the source; the element
    /// rejects all subsequent play requests
    fn release(&self);
}

/// Desired logical state for one binding, computed by the policy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredState {
    pub playing: bool,
    pub muted: bool,
}

/// Outcome of applying a desired state to a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayResult {
    /// All elements accepted the request
    Accepted,
    /// At least one play request was rejected by the platform
    Blocked,
    /// Nothing to do: no media configured, or the binding is torn down
    NoMedia,
}

/// Live media handle(s) for one target
pub struct MediaBinding {
    target_id: TargetId,
    video: Option<Arc<dyn MediaElement>>,
    audio: Option<Arc<dyn MediaElement>>,
    torn_down: AtomicBool,
}

impl MediaBinding {
    pub fn new(
        target_id: TargetId,
        video: Option<Arc<dyn MediaElement>>,
        audio: Option<Arc<dyn MediaElement>>,
    ) -> Self {
        Self {
            target_id,
            video,
            audio,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn target_id(&self) -> TargetId {
        self.target_id
    }

    pub fn has_media(&self) -> bool {
        self.video.is_some() || self.audio.is_some()
    }

    /// Whether a separate audio track supplies this target's sound
    pub fn has_audio_track(&self) -> bool {
        self.audio.is_some()
    }

    fn elements(&self) -> impl Iterator<Item = &Arc<dyn MediaElement>> {
        self.video.iter().chain(self.audio.iter())
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Pause and seek every element back to position zero. Idempotent.
    pub fn reset(&self) {
        if self.is_torn_down() {
            return;
        }
        for element in self.elements() {
            element.pause();
            element.seek_start();
        }
    }

    /// Apply a desired state to the underlying elements
    ///
    /// Mute flags are applied before any play request so a blocked element
    /// is never audible. When the target has both video and a separate
    /// audio track, the video renders muted regardless of the requested
    /// flag: the audio track supplies sound.
    pub async fn set_desired_state(&self, playing: bool, muted: bool) -> PlayResult {
        if self.is_torn_down() || !self.has_media() {
            return PlayResult::NoMedia;
        }

        if let Some(video) = &self.video {
            video.set_muted(muted || self.audio.is_some());
        }
        if let Some(audio) = &self.audio {
            audio.set_muted(muted);
        }

        if !playing {
            for element in self.elements() {
                element.pause();
            }
            return PlayResult::Accepted;
        }

        let mut blocked = false;
        for element in self.elements() {
            if element.play().await.is_err() {
                blocked = true;
            }
            if self.is_torn_down() {
                return PlayResult::NoMedia;
            }
        }

        if blocked {
            // Keep the video/audio pair in sync: a half-started pair pauses
            // until the caller retries.
            for element in self.elements() {
                element.pause();
            }
            debug!("Play attempt blocked for target {}", self.target_id);
            return PlayResult::Blocked;
        }

        PlayResult::Accepted
    }

    /// Silent pre-warm: muted play immediately followed by pause
    ///
    /// The attempt itself is what satisfies platform autoplay policy;
    /// rejection is acceptable and ignored.
    pub async fn prewarm(&self) {
        if self.is_torn_down() {
            return;
        }
        for element in self.elements() {
            element.set_muted(true);
        }
        for element in self.elements() {
            let _ = element.play().await;
            element.pause();
        }
    }

    /// Stop streams and release sources; all later calls become no-ops
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        for element in self.elements() {
            element.pause();
            element.release();
        }
    }
}

/// The full binding set for one session, in registry order
pub struct BindingSet {
    bindings: Vec<Arc<MediaBinding>>,
}

impl BindingSet {
    pub fn new(bindings: Vec<Arc<MediaBinding>>) -> Self {
        Self { bindings }
    }

    pub fn get(&self, id: TargetId) -> Option<&Arc<MediaBinding>> {
        self.bindings.iter().find(|b| b.target_id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MediaBinding>> {
        self.bindings.iter()
    }

    /// Reset every binding, active or not. Used on first-scan and switch so
    /// playback offsets never leak across targets.
    pub fn reset_all(&self) {
        for binding in &self.bindings {
            binding.reset();
        }
    }

    pub fn teardown_all(&self) {
        for binding in &self.bindings {
            binding.teardown();
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
