//! Playback policy engine
//!
//! Reconciliation pass over every binding, run after each state mutation
//! (never on a timer). The decision itself is a pure function of the
//! session state; the side-effecting pass spawns the play attempts, whose
//! resolutions come back to the controller loop as messages for
//! re-validation.

use crate::media::{BindingSet, DesiredState, MediaBinding, PlayResult};
use crate::session::SessionMsg;
use arbv_common::events::TrackingStatus;
use arbv_common::TargetId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Session state the policy decides against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyInputs {
    pub active_target: Option<TargetId>,
    pub tracking_status: TrackingStatus,
    pub is_playing: bool,
    pub is_muted: bool,
    pub is_unlocked: bool,
}

/// A target is logically active iff it is the active target, currently
/// tracked, and flagged as playing.
pub fn is_logically_active(inputs: &PolicyInputs, id: TargetId) -> bool {
    inputs.active_target == Some(id)
        && inputs.tracking_status == TrackingStatus::Found
        && inputs.is_playing
}

/// Desired binding state for one target
///
/// Until the unlock handshake completes, desired mute is forced on
/// regardless of the user's mute flag. Non-active bindings are force-muted
/// so a stale unmuted element cannot bleed audio during fast switches.
pub fn desired_for(inputs: &PolicyInputs, id: TargetId) -> DesiredState {
    if is_logically_active(inputs, id) {
        DesiredState {
            playing: true,
            muted: !inputs.is_unlocked || inputs.is_muted,
        }
    } else {
        DesiredState {
            playing: false,
            muted: true,
        }
    }
}

/// How a spawned play attempt settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The attempt was accepted as requested
    Started,
    /// The unmuted attempt was blocked; the muted retry succeeded
    ForcedMute,
    /// Both attempts were blocked; playback stays paused
    Abandoned,
}

/// Reconciles every binding to the decided state
pub(crate) struct PolicyEngine {
    bindings: Arc<BindingSet>,
    tx: mpsc::UnboundedSender<SessionMsg>,
}

impl PolicyEngine {
    pub fn new(bindings: Arc<BindingSet>, tx: mpsc::UnboundedSender<SessionMsg>) -> Self {
        Self { bindings, tx }
    }

    /// Run one reconciliation pass
    ///
    /// Pause paths apply inline (they never suspend). Play paths suspend on
    /// the platform's schedule, so each is spawned; its settlement is
    /// delivered back to the controller loop, which re-validates the
    /// session state before acting on it.
    pub async fn reconcile(&self, inputs: PolicyInputs) {
        for binding in self.bindings.iter() {
            let desired = desired_for(&inputs, binding.target_id());
            if desired.playing {
                self.spawn_play_attempt(Arc::clone(binding), desired);
            } else {
                let _ = binding.set_desired_state(false, true).await;
            }
        }
    }

    fn spawn_play_attempt(&self, binding: Arc<MediaBinding>, desired: DesiredState) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let target_id = binding.target_id();
            let outcome = match binding.set_desired_state(true, desired.muted).await {
                PlayResult::Accepted => PlayOutcome::Started,
                PlayResult::NoMedia => return,
                PlayResult::Blocked if desired.muted => PlayOutcome::Abandoned,
                PlayResult::Blocked => {
                    // Autoplay fallback: one muted retry
                    debug!("Unmuted play blocked for target {}, retrying muted", target_id);
                    match binding.set_desired_state(true, true).await {
                        PlayResult::Accepted => PlayOutcome::ForcedMute,
                        _ => PlayOutcome::Abandoned,
                    }
                }
            };

            // The controller loop is gone after teardown; the settlement is
            // dropped with it.
            let _ = tx.send(SessionMsg::PlaySettled { target_id, outcome });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_inputs(active: u32) -> PolicyInputs {
        PolicyInputs {
            active_target: Some(TargetId(active)),
            tracking_status: TrackingStatus::Found,
            is_playing: true,
            is_muted: false,
            is_unlocked: true,
        }
    }

    #[test]
    fn test_only_active_target_is_logically_active() {
        let inputs = playing_inputs(1);

        assert!(is_logically_active(&inputs, TargetId(1)));
        assert!(!is_logically_active(&inputs, TargetId(2)));
    }

    #[test]
    fn test_not_active_when_lost_or_paused() {
        let mut inputs = playing_inputs(1);
        inputs.tracking_status = TrackingStatus::Lost;
        assert!(!is_logically_active(&inputs, TargetId(1)));

        let mut inputs = playing_inputs(1);
        inputs.is_playing = false;
        assert!(!is_logically_active(&inputs, TargetId(1)));
    }

    #[test]
    fn test_desired_mute_forced_before_unlock() {
        let mut inputs = playing_inputs(1);
        inputs.is_unlocked = false;

        let desired = desired_for(&inputs, TargetId(1));
        assert!(desired.playing);
        assert!(desired.muted);
    }

    #[test]
    fn test_desired_follows_user_mute_after_unlock() {
        let inputs = playing_inputs(1);
        assert!(!desired_for(&inputs, TargetId(1)).muted);

        let mut muted = inputs;
        muted.is_muted = true;
        assert!(desired_for(&muted, TargetId(1)).muted);
    }

    #[test]
    fn test_inactive_bindings_paused_and_muted() {
        let inputs = playing_inputs(1);

        let desired = desired_for(&inputs, TargetId(2));
        assert!(!desired.playing);
        assert!(desired.muted);
    }
}
