//! Unlock handshake
//!
//! Mobile platforms block programmatic `play()` until a user gesture has
//! touched each media element. On the first gesture anywhere in the
//! interaction surface, every binding pre-warms: muted play immediately
//! followed by pause — inaudible and invisible. Once all attempts have
//! settled (success or failure, any order), the session unlocks exactly
//! once.

use crate::media::BindingSet;
use crate::session::SessionMsg;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// One-shot state of the handshake
#[derive(Debug, Default)]
pub(crate) struct UnlockHandshake {
    started: bool,
}

impl UnlockHandshake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the handshake; only the first caller gets `true`
    pub fn begin(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Spawn the pre-warm pass over every binding
    ///
    /// Settlement is delivered back to the controller loop; outcomes of the
    /// individual attempts are deliberately ignored — the attempt itself is
    /// what satisfies platform policy.
    pub fn spawn_prewarm(bindings: Arc<BindingSet>, tx: mpsc::UnboundedSender<SessionMsg>) {
        tokio::spawn(async move {
            let attempts = bindings
                .iter()
                .map(Arc::clone)
                .map(|binding| async move { binding.prewarm().await })
                .collect::<Vec<_>>();

            join_all(attempts).await;
            debug!("Pre-warm settled for {} bindings", bindings.len());

            let _ = tx.send(SessionMsg::UnlockSettled);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::{ElementCall, EmulatedMediaElement, PlayPolicy};
    use crate::media::{MediaBinding, MediaElement};
    use arbv_common::TargetId;

    #[test]
    fn test_begin_is_one_shot() {
        let mut handshake = UnlockHandshake::new();
        assert!(handshake.begin());
        assert!(!handshake.begin());
        assert!(!handshake.begin());
    }

    #[tokio::test]
    async fn test_prewarm_touches_every_binding() {
        let v1 = EmulatedMediaElement::new("v1", PlayPolicy::Accept);
        let a2 = EmulatedMediaElement::new("a2", PlayPolicy::AutoplayGuard);
        let bindings = Arc::new(BindingSet::new(vec![
            Arc::new(MediaBinding::new(
                TargetId(1),
                Some(v1.clone() as Arc<dyn MediaElement>),
                None,
            )),
            Arc::new(MediaBinding::new(
                TargetId(2),
                None,
                Some(a2.clone() as Arc<dyn MediaElement>),
            )),
        ]));

        let (tx, mut rx) = mpsc::unbounded_channel();
        UnlockHandshake::spawn_prewarm(Arc::clone(&bindings), tx);

        // Settles regardless of individual attempt outcomes
        let msg = rx.recv().await.expect("prewarm should settle");
        assert!(matches!(msg, SessionMsg::UnlockSettled));

        for element in [v1, a2] {
            let calls = element.calls();
            assert!(calls.contains(&ElementCall::SetMuted(true)));
            assert!(calls.contains(&ElementCall::Play { muted: true }));
            assert!(calls.contains(&ElementCall::Pause));
        }
    }
}
