// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred mounting of the heavy visual subsystem.
//!
//! ```text
//!   Idle ──(mount timer)──► Ready ──(mount_complete)──► Mounted
//! ```
//!
//! [`DeferredLoader`] starts [`Idle`](LoaderState::Idle) on every mount and
//! moves to [`Ready`](LoaderState::Ready) exactly once, when the timer it was
//! [armed](DeferredLoader::arm) with fires. The timer itself lives in the
//! owner's [`TimerQueue`](crate::timer::TimerQueue); the loader only keeps its
//! [`TimerId`] so that stale or foreign expirations are ignored and the owner
//! can cancel it on teardown.
//!
//! On [`RenderTier::StaticFallback`] the animated subsystem is never
//! requested: becoming ready swaps the placeholder straight for a static
//! asset.

use crate::scene::SceneSettings;
use crate::tier::{RenderTier, TierSelection};
use crate::timer::TimerId;

/// Loader lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoaderState {
    /// Waiting for the mount delay; the placeholder is shown.
    Idle,
    /// The delay elapsed; the tier's visual may be instantiated.
    Ready,
    /// The host reported the visual as initialized. Only leaving the static
    /// fallback for an animated tier returns the loader to `Idle`.
    Mounted,
}

impl LoaderState {
    /// Returns a short label for logs and DOM attributes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Mounted => "mounted",
        }
    }
}

/// What the host should render in the visual slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Visual {
    /// Lightweight placeholder (spinner or poster).
    Placeholder,
    /// The animated scene with the given settings. Until the loader reaches
    /// [`LoaderState::Mounted`] the placeholder stays on top of it.
    Scene(SceneSettings),
    /// Static asset for [`RenderTier::StaticFallback`].
    StaticAsset,
}

/// How the loader reacted to a tier change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retier {
    /// Same tier; nothing to do.
    Unchanged,
    /// The visual was swapped in place without a new delay.
    Swapped,
    /// The loader went back to [`LoaderState::Idle`] and must be re-armed
    /// with the new tier's delay. `cancel` is the previous timer, if one was
    /// still pending.
    Rearm {
        /// Timer to cancel.
        cancel: Option<TimerId>,
    },
}

/// Placeholder → visual state machine for one mount.
#[derive(Clone, Debug)]
pub struct DeferredLoader {
    state: LoaderState,
    selection: TierSelection,
    timer: Option<TimerId>,
}

impl DeferredLoader {
    /// Creates an idle, unarmed loader for `selection`.
    #[must_use]
    pub const fn new(selection: TierSelection) -> Self {
        Self {
            state: LoaderState::Idle,
            selection,
            timer: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoaderState {
        self.state
    }

    /// Tier the loader is working towards.
    #[must_use]
    pub const fn tier(&self) -> RenderTier {
        self.selection.tier
    }

    /// The active selection, including its mount delay.
    #[must_use]
    pub const fn selection(&self) -> TierSelection {
        self.selection
    }

    /// The pending mount timer, if armed.
    #[must_use]
    pub const fn pending_timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Records the timer that will make the loader ready.
    ///
    /// Ignored unless the loader is [`LoaderState::Idle`].
    pub fn arm(&mut self, timer: TimerId) {
        if self.state == LoaderState::Idle {
            self.timer = Some(timer);
        }
    }

    /// Handles an expired timer. Returns `true` on the `Idle → Ready`
    /// transition; any other id is ignored.
    pub fn on_timer(&mut self, timer: TimerId) -> bool {
        if self.state != LoaderState::Idle || self.timer != Some(timer) {
            return false;
        }
        self.timer = None;
        self.state = LoaderState::Ready;
        true
    }

    /// Handles the host's report that the visual finished initializing.
    /// Returns `true` on the `Ready → Mounted` transition.
    pub fn mount_complete(&mut self) -> bool {
        if self.state != LoaderState::Ready {
            return false;
        }
        self.state = LoaderState::Mounted;
        true
    }

    /// Applies a new tier selection.
    ///
    /// - An idle loader restarts its delay for the new tier.
    /// - Between two animated tiers, or towards the static fallback, the
    ///   visual is swapped in place and the state is kept.
    /// - Leaving the static fallback for an animated tier goes back to idle:
    ///   the heavy subsystem was never loaded and gets the full delay.
    pub fn retier(&mut self, selection: TierSelection) -> Retier {
        let old = self.selection.tier;
        let new = selection.tier;
        if old == new {
            self.selection = selection;
            return Retier::Unchanged;
        }
        self.selection = selection;

        let needs_rearm = self.state == LoaderState::Idle || (!old.is_animated() && new.is_animated());
        if needs_rearm {
            self.state = LoaderState::Idle;
            return Retier::Rearm {
                cancel: self.timer.take(),
            };
        }

        Retier::Swapped
    }

    /// Releases the pending timer for cancellation on teardown.
    pub fn disarm(&mut self) -> Option<TimerId> {
        self.timer.take()
    }

    /// Returns `true` once the delay has elapsed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self.state, LoaderState::Idle)
    }

    /// Returns `true` while the host should instantiate the animated
    /// subsystem, that is between the delay elapsing and
    /// [`mount_complete`](Self::mount_complete).
    #[must_use]
    pub const fn wants_heavy_mount(&self) -> bool {
        matches!(self.state, LoaderState::Ready) && self.selection.tier.is_animated()
    }

    /// Returns `true` while the placeholder should be visible.
    #[must_use]
    pub const fn shows_placeholder(&self) -> bool {
        match self.state {
            LoaderState::Idle => true,
            LoaderState::Ready => self.selection.tier.is_animated(),
            LoaderState::Mounted => false,
        }
    }

    /// What to render in the visual slot.
    #[must_use]
    pub const fn visual(&self) -> Visual {
        if !self.is_ready() {
            return Visual::Placeholder;
        }
        match SceneSettings::for_tier(self.selection.tier) {
            Some(settings) => Visual::Scene(settings),
            None => Visual::StaticAsset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{Duration, HostTime};
    use crate::timer::TimerQueue;

    fn selection(tier: RenderTier, ms: u64) -> TierSelection {
        TierSelection {
            tier,
            mount_delay: Duration::from_millis(ms),
        }
    }

    #[test]
    fn idle_ready_mounted() {
        let mut timers = TimerQueue::new();
        let mut loader = DeferredLoader::new(selection(RenderTier::Full, 200));
        assert_eq!(loader.visual(), Visual::Placeholder);

        loader.arm(timers.schedule(HostTime::from_millis(200), ()));
        let (id, _, ()) = timers.pop_expired(HostTime::from_millis(200)).unwrap();
        assert!(loader.on_timer(id));
        assert_eq!(loader.state(), LoaderState::Ready);
        assert_eq!(loader.visual(), Visual::Scene(SceneSettings::FULL));
        assert!(loader.shows_placeholder(), "placeholder until initialized");

        assert!(loader.wants_heavy_mount());
        assert!(loader.mount_complete());
        assert!(!loader.wants_heavy_mount(), "a mounted visual is not requested again");
        assert!(!loader.shows_placeholder());
        assert!(!loader.on_timer(id), "fires exactly once");
        assert!(!loader.mount_complete(), "mounted is terminal");
    }

    #[test]
    fn foreign_timer_is_ignored() {
        let mut timers = TimerQueue::new();
        let mut loader = DeferredLoader::new(selection(RenderTier::Reduced, 400));
        let other = timers.schedule(HostTime(1), ());
        loader.arm(timers.schedule(HostTime(2), ()));
        assert!(!loader.on_timer(other));
        assert_eq!(loader.state(), LoaderState::Idle);
    }

    #[test]
    fn static_fallback_never_wants_heavy_mount() {
        let mut timers = TimerQueue::new();
        let mut loader = DeferredLoader::new(selection(RenderTier::StaticFallback, 800));
        loader.arm(timers.schedule(HostTime::from_millis(800), ()));
        let (id, _, ()) = timers.pop_expired(HostTime::from_millis(800)).unwrap();
        assert!(loader.on_timer(id));
        assert_eq!(loader.visual(), Visual::StaticAsset);
        assert!(!loader.wants_heavy_mount());
        assert!(!loader.shows_placeholder());
    }

    #[test]
    fn idle_retier_rearms() {
        let mut timers = TimerQueue::new();
        let mut loader = DeferredLoader::new(selection(RenderTier::Full, 200));
        let first = timers.schedule(HostTime::from_millis(200), ());
        loader.arm(first);

        let outcome = loader.retier(selection(RenderTier::Reduced, 400));
        assert_eq!(outcome, Retier::Rearm { cancel: Some(first) });
        assert_eq!(loader.pending_timer(), None);
        assert_eq!(loader.state(), LoaderState::Idle);
    }

    #[test]
    fn animated_retier_swaps_in_place() {
        let mut loader = DeferredLoader::new(selection(RenderTier::Full, 200));
        let mut timers = TimerQueue::new();
        let id = timers.schedule(HostTime(0), ());
        loader.arm(id);
        let _ = loader.on_timer(id);
        let _ = loader.mount_complete();

        assert_eq!(loader.retier(selection(RenderTier::Reduced, 400)), Retier::Swapped);
        assert_eq!(loader.state(), LoaderState::Mounted);
        assert_eq!(loader.visual(), Visual::Scene(SceneSettings::REDUCED));

        assert_eq!(
            loader.retier(selection(RenderTier::StaticFallback, 800)),
            Retier::Swapped
        );
        assert_eq!(loader.visual(), Visual::StaticAsset);
        assert_eq!(loader.state(), LoaderState::Mounted, "demotion keeps the state");
        assert!(!loader.wants_heavy_mount());
        assert!(!loader.shows_placeholder());
    }

    #[test]
    fn leaving_static_fallback_restarts_delay() {
        let mut loader = DeferredLoader::new(selection(RenderTier::StaticFallback, 800));
        let mut timers = TimerQueue::new();
        let id = timers.schedule(HostTime(0), ());
        loader.arm(id);
        let _ = loader.on_timer(id);

        assert_eq!(
            loader.retier(selection(RenderTier::Full, 200)),
            Retier::Rearm { cancel: None }
        );
        assert_eq!(loader.visual(), Visual::Placeholder);
    }
}
