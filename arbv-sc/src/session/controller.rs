//! Session controller and facade
//!
//! All tracking events, user actions, play settlements, and teardown are
//! serialized onto one event-loop task: handlers are discrete and
//! non-preemptible, and anything that suspended (a play request, the
//! pre-warm pass) re-enters the loop as a message that is re-validated
//! against current state before it may mutate anything.

use crate::error::Result;
use crate::media::BindingSet;
use crate::registry::TargetRegistry;
use crate::state::{SessionStatus, SharedState};
use crate::tracking::{TrackingEvent, TrackingSource};
use arbv_common::events::{ArbvEvent, ScanTransition, TrackingStatus};
use arbv_common::TargetId;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::policy::{is_logically_active, PlayOutcome, PolicyEngine, PolicyInputs};
use super::resolver::{LostDecision, TrackingResolver};
use super::unlock::UnlockHandshake;

/// Messages processed by the controller loop
#[derive(Debug)]
pub(crate) enum SessionMsg {
    /// Tracking engine report, in delivery order
    Tracking(TrackingEvent),
    /// User action: flip the play flag
    TogglePlay,
    /// User action: flip the mute flag
    ToggleMute,
    /// User gesture anywhere on the interaction surface
    UserGesture,
    /// A spawned play attempt settled
    PlaySettled {
        target_id: TargetId,
        outcome: PlayOutcome,
    },
    /// The unlock pre-warm pass settled
    UnlockSettled,
    /// Tear the session down and acknowledge
    Teardown { ack: oneshot::Sender<()> },
}

/// Handle to a running session
///
/// Cheap to clone; all methods funnel into the controller loop. The handle
/// stays valid after teardown — further actions become no-ops.
#[derive(Clone)]
pub struct Session {
    tx: mpsc::UnboundedSender<SessionMsg>,
    state: Arc<SharedState>,
}

impl Session {
    /// Start a session: bring the tracking engine up, then spawn the
    /// controller loop
    ///
    /// Resolves once the tracking engine reports ready, so callers never
    /// poll for readiness.
    pub async fn start(
        registry: Arc<TargetRegistry>,
        bindings: BindingSet,
        mut tracking: Box<dyn TrackingSource>,
        state: Arc<SharedState>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        tracking.start(event_tx).await?;

        // Forward tracking events onto the controller loop
        let forward_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if forward_tx.send(SessionMsg::Tracking(event)).is_err() {
                    break;
                }
            }
        });

        info!("Session started with {} targets", registry.len());

        let bindings = Arc::new(bindings);
        let controller = Controller {
            policy: PolicyEngine::new(Arc::clone(&bindings), tx.clone()),
            registry,
            bindings,
            resolver: TrackingResolver::new(),
            unlock: UnlockHandshake::new(),
            tracking_status: TrackingStatus::Searching,
            is_playing: false,
            is_unlocked: false,
            state: Arc::clone(&state),
            tracking,
            rx,
            tx: tx.clone(),
        };
        tokio::spawn(controller.run());

        Ok(Self { tx, state })
    }

    /// Read-only snapshot of the current session state
    pub async fn status(&self) -> SessionStatus {
        self.state.status().await
    }

    /// Flip the play flag; the policy engine reconciles
    pub fn toggle_play(&self) {
        let _ = self.tx.send(SessionMsg::TogglePlay);
    }

    /// Flip the mute flag; the policy engine reconciles
    pub fn toggle_mute(&self) {
        let _ = self.tx.send(SessionMsg::ToggleMute);
    }

    /// Report a user gesture (feeds the one-shot unlock handshake)
    pub fn user_gesture(&self) {
        let _ = self.tx.send(SessionMsg::UserGesture);
    }

    /// Subscribe to the session event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<ArbvEvent> {
        self.state.subscribe_events()
    }

    pub fn is_torn_down(&self) -> bool {
        self.state.is_torn_down()
    }

    /// Tear the session down: stop tracking (releasing camera resources),
    /// tear down every binding, and drop the controller loop
    ///
    /// Safe to call at any point, including while play requests are
    /// mid-flight — their settlements land on a dead loop and are dropped.
    /// Subsequent calls return immediately.
    pub async fn teardown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SessionMsg::Teardown { ack: ack_tx }).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// The controller loop state
///
/// `resolver` (the latch) plus the plain fields here are the authoritative
/// session state; `state` is the published mirror for the facade and SSE.
struct Controller {
    registry: Arc<TargetRegistry>,
    bindings: Arc<BindingSet>,
    policy: PolicyEngine,
    resolver: TrackingResolver,
    unlock: UnlockHandshake,
    tracking_status: TrackingStatus,
    is_playing: bool,
    is_unlocked: bool,
    state: Arc<SharedState>,
    tracking: Box<dyn TrackingSource>,
    rx: mpsc::UnboundedReceiver<SessionMsg>,
    tx: mpsc::UnboundedSender<SessionMsg>,
}

impl Controller {
    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                SessionMsg::Tracking(TrackingEvent::Found(id)) => self.handle_found(id).await,
                SessionMsg::Tracking(TrackingEvent::Lost(id)) => self.handle_lost(id).await,
                SessionMsg::TogglePlay => self.handle_toggle_play().await,
                SessionMsg::ToggleMute => self.handle_toggle_mute().await,
                SessionMsg::UserGesture => self.handle_user_gesture(),
                SessionMsg::PlaySettled { target_id, outcome } => {
                    self.handle_play_settled(target_id, outcome).await
                }
                SessionMsg::UnlockSettled => self.handle_unlock_settled().await,
                SessionMsg::Teardown { ack } => {
                    self.handle_teardown().await;
                    let _ = ack.send(());
                    break;
                }
            }
        }
        debug!("Controller loop stopped");
    }

    async fn handle_found(&mut self, id: TargetId) {
        if self.registry.get(id).is_none() {
            // Tracking engine events are untrusted; never raise
            warn!("Found event for unknown target {}, ignoring", id);
            return;
        }

        // Latch first: any lost event processed after this point compares
        // against the new target.
        let transition = self.resolver.on_found(id);
        info!("Target {} found ({})", id, transition);

        match transition {
            ScanTransition::FirstScan | ScanTransition::Switch => {
                // Full reset across all targets so playback offsets never
                // leak when the user jitters between markers
                self.bindings.reset_all();
            }
            ScanTransition::Rescan => {
                // Continuation: the user briefly lost and regained the
                // same marker
            }
        }

        let old_status = self.tracking_status;
        let was_playing = self.is_playing;
        self.tracking_status = TrackingStatus::Found;
        self.is_playing = true;
        self.publish_state().await;

        if old_status != TrackingStatus::Found {
            self.state.broadcast_event(ArbvEvent::TrackingStatusChanged {
                old_status,
                new_status: TrackingStatus::Found,
                timestamp: chrono::Utc::now(),
            });
        }
        self.state.broadcast_event(ArbvEvent::TargetFound {
            target_id: id,
            transition,
            timestamp: chrono::Utc::now(),
        });
        if !was_playing {
            self.state.broadcast_event(ArbvEvent::PlaybackStateChanged {
                playing: true,
                timestamp: chrono::Utc::now(),
            });
        }

        self.reconcile().await;
    }

    async fn handle_lost(&mut self, id: TargetId) {
        if self.registry.get(id).is_none() {
            warn!("Lost event for unknown target {}, ignoring", id);
            return;
        }

        match self.resolver.on_lost(id) {
            LostDecision::Stale => {
                // A newer found already superseded this target
                debug!("Discarding stale lost event for target {}", id);
            }
            LostDecision::Genuine => {
                info!("Target {} lost", id);

                let old_status = self.tracking_status;
                let was_playing = self.is_playing;
                self.tracking_status = TrackingStatus::Lost;
                self.is_playing = false;
                self.publish_state().await;

                if old_status != TrackingStatus::Lost {
                    self.state.broadcast_event(ArbvEvent::TrackingStatusChanged {
                        old_status,
                        new_status: TrackingStatus::Lost,
                        timestamp: chrono::Utc::now(),
                    });
                }
                self.state.broadcast_event(ArbvEvent::TargetLost {
                    target_id: id,
                    timestamp: chrono::Utc::now(),
                });
                if was_playing {
                    self.state.broadcast_event(ArbvEvent::PlaybackStateChanged {
                        playing: false,
                        timestamp: chrono::Utc::now(),
                    });
                }

                self.reconcile().await;
            }
        }
    }

    async fn handle_toggle_play(&mut self) {
        self.is_playing = !self.is_playing;
        info!("Playback toggled: playing={}", self.is_playing);
        self.publish_state().await;
        self.state.broadcast_event(ArbvEvent::PlaybackStateChanged {
            playing: self.is_playing,
            timestamp: chrono::Utc::now(),
        });
        self.reconcile().await;
    }

    async fn handle_toggle_mute(&mut self) {
        let muted = !self.resolver.muted();
        self.resolver.set_muted(muted);
        info!("Mute toggled: muted={}", muted);
        self.publish_state().await;
        self.state.broadcast_event(ArbvEvent::MuteChanged {
            muted,
            forced: false,
            timestamp: chrono::Utc::now(),
        });
        self.reconcile().await;
    }

    fn handle_user_gesture(&mut self) {
        if !self.unlock.begin() {
            return;
        }
        info!("First user gesture: pre-warming {} bindings", self.bindings.len());
        UnlockHandshake::spawn_prewarm(Arc::clone(&self.bindings), self.tx.clone());
    }

    async fn handle_unlock_settled(&mut self) {
        if self.is_unlocked {
            return;
        }
        self.is_unlocked = true;
        info!("Session unlocked");
        self.publish_state().await;
        self.state.broadcast_event(ArbvEvent::SessionUnlocked {
            timestamp: chrono::Utc::now(),
        });
        self.reconcile().await;
    }

    async fn handle_play_settled(&mut self, target_id: TargetId, outcome: PlayOutcome) {
        // State may have moved while the request was pending: only a
        // settlement for the still-logically-active target may mutate
        // anything.
        if !is_logically_active(&self.inputs(), target_id) {
            debug!(
                "Play settlement for inactive target {} ({:?}), ignoring",
                target_id, outcome
            );
            // The element may have started between the pause pass and the
            // settlement; force it back to the inactive state
            if let Some(binding) = self.bindings.get(target_id) {
                let _ = binding.set_desired_state(false, true).await;
            }
            return;
        }

        match outcome {
            PlayOutcome::Started => {}
            PlayOutcome::ForcedMute => {
                if !self.resolver.muted() {
                    info!("Autoplay blocked; continuing muted for target {}", target_id);
                    self.resolver.set_muted(true);
                    self.publish_state().await;
                    self.state.broadcast_event(ArbvEvent::MuteChanged {
                        muted: true,
                        forced: true,
                        timestamp: chrono::Utc::now(),
                    });
                    self.reconcile().await;
                }
            }
            PlayOutcome::Abandoned => {
                // Not a playable context yet; a later found event retries
                debug!("Playback abandoned for target {}", target_id);
                self.state.broadcast_event(ArbvEvent::PlaybackBlocked {
                    target_id,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
    }

    async fn handle_teardown(&mut self) {
        if self.state.mark_torn_down() {
            return;
        }
        info!("Tearing down session");

        if let Err(e) = self.tracking.stop().await {
            warn!("Tracking engine stop failed: {}", e);
        }
        self.bindings.teardown_all();

        self.is_playing = false;
        self.publish_state().await;
        self.state.broadcast_event(ArbvEvent::SessionTornDown {
            timestamp: chrono::Utc::now(),
        });
    }

    fn inputs(&self) -> PolicyInputs {
        PolicyInputs {
            active_target: self.resolver.active(),
            tracking_status: self.tracking_status,
            is_playing: self.is_playing,
            is_muted: self.resolver.muted(),
            is_unlocked: self.is_unlocked,
        }
    }

    async fn reconcile(&self) {
        self.policy.reconcile(self.inputs()).await;
    }

    async fn publish_state(&self) {
        self.state
            .publish(SessionStatus {
                tracking_status: self.tracking_status,
                active_target: self.resolver.active(),
                is_playing: self.is_playing,
                is_muted: self.resolver.muted(),
                is_unlocked: self.is_unlocked,
            })
            .await;
    }
}
