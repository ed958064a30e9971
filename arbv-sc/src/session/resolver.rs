//! Tracking event resolver
//!
//! Decides what each found/lost event means for the session. The resolver
//! keeps its own synchronous mirror of the active target id and the mute
//! flag (the latch): it is written at the top of every handler, before any
//! other logic, so a `lost` event racing in behind a newer `found` always
//! compares against the true current target — never a stale snapshot still
//! waiting to propagate through the published state.

use arbv_common::events::ScanTransition;
use arbv_common::TargetId;

/// Synchronous mirror of the resolver-owned session fields
#[derive(Debug, Clone, Copy, Default)]
struct LatchState {
    active: Option<TargetId>,
    muted: bool,
}

/// What a `lost` event turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LostDecision {
    /// The currently active target dropped out of tracking
    Genuine,
    /// A late report for a target that has already been superseded;
    /// discarded without touching session state
    Stale,
}

/// Resolves tracking events against the latch
#[derive(Debug, Default)]
pub struct TrackingResolver {
    latch: LatchState,
}

impl TrackingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The authoritative active target id
    pub fn active(&self) -> Option<TargetId> {
        self.latch.active
    }

    /// The authoritative mute flag
    pub fn muted(&self) -> bool {
        self.latch.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.latch.muted = muted;
    }

    /// Classify a `found` event and advance the latch
    ///
    /// The latch is written before returning so any `lost` event processed
    /// after this point — even one already queued — sees the new target as
    /// authoritative.
    pub fn on_found(&mut self, id: TargetId) -> ScanTransition {
        let previous = self.latch.active;
        self.latch.active = Some(id);

        match previous {
            None => ScanTransition::FirstScan,
            Some(prev) if prev == id => ScanTransition::Rescan,
            Some(_) => ScanTransition::Switch,
        }
    }

    /// Classify a `lost` event against the latch
    pub fn on_lost(&self, id: TargetId) -> LostDecision {
        if self.latch.active == Some(id) {
            LostDecision::Genuine
        } else {
            LostDecision::Stale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_scan() {
        let mut resolver = TrackingResolver::new();
        assert_eq!(resolver.active(), None);

        assert_eq!(resolver.on_found(TargetId(1)), ScanTransition::FirstScan);
        assert_eq!(resolver.active(), Some(TargetId(1)));
    }

    #[test]
    fn test_rescan_same_target() {
        let mut resolver = TrackingResolver::new();
        resolver.on_found(TargetId(1));

        assert_eq!(resolver.on_found(TargetId(1)), ScanTransition::Rescan);
        assert_eq!(resolver.active(), Some(TargetId(1)));
    }

    #[test]
    fn test_switch_target() {
        let mut resolver = TrackingResolver::new();
        resolver.on_found(TargetId(1));

        assert_eq!(resolver.on_found(TargetId(2)), ScanTransition::Switch);
        assert_eq!(resolver.active(), Some(TargetId(2)));
    }

    #[test]
    fn test_lost_active_target_is_genuine() {
        let mut resolver = TrackingResolver::new();
        resolver.on_found(TargetId(1));

        assert_eq!(resolver.on_lost(TargetId(1)), LostDecision::Genuine);
    }

    #[test]
    fn test_late_lost_after_switch_is_stale() {
        let mut resolver = TrackingResolver::new();

        // found(A), found(B) without an intervening lost(A): the tracking
        // engine reported both during a marker swap
        resolver.on_found(TargetId(1));
        resolver.on_found(TargetId(2));

        // A's lost arrives late; B stays authoritative
        assert_eq!(resolver.on_lost(TargetId(1)), LostDecision::Stale);
        assert_eq!(resolver.active(), Some(TargetId(2)));
    }

    #[test]
    fn test_lost_before_any_found_is_stale() {
        let resolver = TrackingResolver::new();
        assert_eq!(resolver.on_lost(TargetId(1)), LostDecision::Stale);
    }

    #[test]
    fn test_mute_mirror() {
        let mut resolver = TrackingResolver::new();
        assert!(!resolver.muted());

        resolver.set_muted(true);
        assert!(resolver.muted());
    }
}
