// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The presentation controller.
//!
//! [`PresentationController`] owns every piece of presentation state for one
//! mount: the current [`DeviceProfile`], the governed [`RenderTier`], the
//! [`DeferredLoader`], one [`CarouselEngine`] per registered carousel, the
//! [`VisibilityTrigger`], and a single [`TimerQueue`] for every deadline
//! (mount delay, resize debounce, auto-advance, scroll settle).
//!
//! The host feeds it events and the current [`HostTime`]; it never reads a
//! clock itself. After a batch of events the host calls
//! [`evaluate`](PresentationController::evaluate) and hands the resulting
//! [`PresentationChanges`] to its [`Presenter`](crate::backend::Presenter).
//!
//! [`unmount`](PresentationController::unmount) consumes the controller. Its
//! pending timers are cancelled and returned in a [`Teardown`]; since nothing
//! else owns them, no callback can reach a torn-down controller.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;
use core::num::NonZeroUsize;

use kurbo::Rect;
use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use crate::backend::{PresentationChanges, PresentationSource, ScrollCommand};
use crate::carousel::{
    CarouselEngine, CarouselId, DEFAULT_SETTLE_TOLERANCE, IndexChange, IndexSource, Navigation,
    ScrollPhase, ScrollSample,
};
use crate::device::{Classifier, ClassifierConfig, DeviceProfile};
use crate::dirty;
use crate::loader::{DeferredLoader, LoaderState, Retier, Visual};
use crate::probe::EnvironmentProbe;
use crate::reveal::{BlockId, Reveal, RevealSpec, VisibilityTrigger, intersection_ratio};
use crate::throttle::FrameRequest;
use crate::tier::{RenderTier, TierDecision, TierGovernor, TierPolicy, TierSelection};
use crate::time::{Duration, HostTime};
use crate::timer::{TimerId, TimerQueue};
use crate::trace::{
    ClassifyEvent, CoalesceEvent, IndexEvent, LoaderEvent, NoopSink, RevealEvent,
    ScrollPhaseEvent, TeardownEvent, TierEvent, TimerEvent, TimerPurpose, TraceSink, Tracer,
};

/// Controller-wide configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Device classification rules.
    pub classifier: ClassifierConfig,
    /// Tier mapping and mount delays.
    pub tier_policy: TierPolicy,
    /// Quiet period after the last resize before reclassifying.
    pub resize_debounce: Duration,
    /// Longest a programmatic scroll may take before the index is reconciled
    /// with wherever the container ended up.
    pub settle_timeout: Duration,
}

impl ControllerConfig {
    /// Configuration for browsers.
    #[must_use]
    pub fn web() -> Self {
        Self {
            classifier: ClassifierConfig::web(),
            tier_policy: TierPolicy::standard(),
            resize_debounce: Duration::from_millis(150),
            settle_timeout: Duration::from_millis(700),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::web()
    }
}

/// Per-carousel configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarouselConfig {
    /// Number of items. Fixed for the lifetime of the mount.
    pub item_count: NonZeroUsize,
    /// Auto-advance interval, active only while hover affordances are off
    /// (narrow tiers).
    pub auto_advance: Option<Duration>,
    /// Distance (CSS px) under which a programmatic scroll counts as arrived.
    pub settle_tolerance: f64,
}

impl CarouselConfig {
    /// A carousel with `item_count` items and no auto-advance.
    #[must_use]
    pub const fn new(item_count: NonZeroUsize) -> Self {
        Self {
            item_count,
            auto_advance: None,
            settle_tolerance: DEFAULT_SETTLE_TOLERANCE,
        }
    }

    /// Enables auto-advance with the given interval.
    #[must_use]
    pub const fn with_auto_advance(mut self, interval: Duration) -> Self {
        self.auto_advance = Some(interval);
        self
    }
}

#[derive(Clone, Debug)]
struct CarouselSlot {
    engine: CarouselEngine,
    config: CarouselConfig,
    advance_timer: Option<TimerId>,
    settle_timer: Option<TimerId>,
}

/// What [`PresentationController::unmount`] released.
#[derive(Debug)]
pub struct Teardown<S> {
    /// Timers that were still pending, in the order they would have fired.
    pub cancelled: Vec<(TimerId, TimerPurpose)>,
    /// The trace sink, returned to the caller.
    pub sink: S,
}

/// Owner of all presentation state for one mount.
pub struct PresentationController<P, S = NoopSink> {
    probe: P,
    sink: S,
    classifier: Classifier,
    policy: TierPolicy,
    resize_debounce: Duration,
    settle_timeout: Duration,

    profile: DeviceProfile,
    governor: TierGovernor,
    selection: TierSelection,
    loader: DeferredLoader,
    carousels: BTreeMap<CarouselId, CarouselSlot>,
    reveals: VisibilityTrigger,
    reveal_delays: BTreeMap<BlockId, Duration>,

    timers: TimerQueue<TimerPurpose>,
    resize_timer: Option<TimerId>,
    dirty: DirtyTracker<u32>,
    clock: HostTime,
}

impl<P, S> fmt::Debug for PresentationController<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationController")
            .field("profile", &self.profile)
            .field("selection", &self.selection)
            .field("loader", &self.loader)
            .field("carousels", &self.carousels.len())
            .field("pending_timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

impl<P: EnvironmentProbe> PresentationController<P, NoopSink> {
    /// Mounts a controller without tracing.
    #[must_use]
    pub fn mount(probe: P, config: ControllerConfig, now: HostTime) -> Self {
        Self::mount_with_sink(probe, config, NoopSink, now)
    }
}

impl<P: EnvironmentProbe, S: TraceSink> PresentationController<P, S> {
    /// Mounts a controller: classifies the device, selects the initial tier
    /// and arms the deferred-mount timer.
    #[must_use]
    pub fn mount_with_sink(probe: P, config: ControllerConfig, sink: S, now: HostTime) -> Self {
        let classifier = Classifier::new(config.classifier);
        let profile = classifier.classify(&probe);
        let selection = config.tier_policy.select(&profile);

        let mut this = Self {
            probe,
            sink,
            classifier,
            policy: config.tier_policy,
            resize_debounce: config.resize_debounce,
            settle_timeout: config.settle_timeout,
            profile,
            governor: TierGovernor::new(),
            selection,
            loader: DeferredLoader::new(selection),
            carousels: BTreeMap::new(),
            reveals: VisibilityTrigger::new(),
            reveal_delays: BTreeMap::new(),
            timers: TimerQueue::new(),
            resize_timer: None,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            clock: now,
        };

        this.trace_classify();
        let _ = this.governor.offer(&this.profile, selection);
        let e = TierEvent {
            at: now,
            from: None,
            to: selection.tier,
            mount_delay: selection.mount_delay,
            width_class: this.profile.width_class,
        };
        this.tracer().tier_selected(&e);

        let timer = this.schedule(TimerPurpose::Mount, now.saturating_add(selection.mount_delay));
        this.loader.arm(timer);

        this.dirty.mark(dirty::PAGE, dirty::TIER);
        this.dirty.mark(dirty::PAGE, dirty::LOADER);
        this.dirty.mark(dirty::PAGE, dirty::HOVER);
        this
    }

    // -- registration -------------------------------------------------------

    /// Registers a carousel. Returns `false` if `id` is already registered.
    pub fn add_carousel(&mut self, id: CarouselId, config: CarouselConfig, now: HostTime) -> bool {
        self.tick(now);
        if self.carousels.contains_key(&id) {
            return false;
        }
        let engine =
            CarouselEngine::new(config.item_count).with_settle_tolerance(config.settle_tolerance);
        self.carousels.insert(
            id,
            CarouselSlot {
                engine,
                config,
                advance_timer: None,
                settle_timer: None,
            },
        );
        self.dirty.mark(id.0, dirty::INDEX);
        self.restart_auto_advance(id);
        true
    }

    /// Updates a carousel's total scroll width after layout.
    pub fn set_scroll_width(&mut self, id: CarouselId, scroll_width: f64) {
        if let Some(slot) = self.carousels.get_mut(&id) {
            slot.engine.set_scroll_width(scroll_width);
        }
    }

    /// Starts watching a content block for its one-shot reveal.
    ///
    /// Returns `false` if the block already fired during this mount.
    pub fn observe(&mut self, block: BlockId, spec: RevealSpec) -> bool {
        self.reveals.observe(block, spec)
    }

    /// Stops watching a block without firing it.
    pub fn unobserve(&mut self, block: BlockId) -> bool {
        self.reveals.unobserve(block)
    }

    // -- inbound events -----------------------------------------------------

    /// Notes a viewport resize. Reclassification happens once the debounce
    /// period passes without another resize; the latest resize wins.
    pub fn on_resize(&mut self, now: HostTime) {
        self.tick(now);
        if let Some(timer) = self.resize_timer.take() {
            self.cancel(timer);
        }
        let deadline = now.saturating_add(self.resize_debounce);
        let timer = self.schedule(TimerPurpose::ResizeDebounce, deadline);
        self.resize_timer = Some(timer);
    }

    /// Records a scroll sample for a carousel. Returns whether the host must
    /// request an animation frame, or `None` for an unknown carousel.
    pub fn on_scroll(&mut self, id: CarouselId, sample: ScrollSample) -> Option<FrameRequest> {
        let slot = self.carousels.get_mut(&id)?;
        let from = slot.engine.phase();
        let request = slot.engine.on_scroll(sample);
        self.trace_phase(id, from);
        Some(request)
    }

    /// Notes direct user input on a carousel container, which takes over
    /// from any programmatic scroll.
    pub fn on_user_input(&mut self, id: CarouselId, now: HostTime) {
        self.tick(now);
        let Some(slot) = self.carousels.get_mut(&id) else {
            return;
        };
        let from = slot.engine.phase();
        slot.engine.on_user_input();
        let settle = slot.settle_timer.take();
        self.trace_phase(id, from);
        if let Some(timer) = settle {
            self.cancel(timer);
        }
    }

    /// Notes that a carousel container stopped scrolling.
    pub fn on_scroll_end(&mut self, id: CarouselId, now: HostTime) {
        self.tick(now);
        self.end_scroll(id);
    }

    /// Navigates a carousel to `index`.
    ///
    /// Out-of-range requests (and unknown carousels) are ignored. Otherwise
    /// the index updates immediately and the returned command carries the
    /// smooth-scroll target, unless the container has not been laid out yet.
    pub fn go_to_index(
        &mut self,
        id: CarouselId,
        index: usize,
        now: HostTime,
    ) -> Option<ScrollCommand> {
        self.tick(now);
        let slot = self.carousels.get_mut(&id)?;
        let from = slot.engine.phase();
        let navigation = slot.engine.go_to_index(index)?;
        self.trace_phase(id, from);
        self.after_navigation(id, navigation, IndexSource::Navigation)
    }

    /// Evaluates coalesced scroll samples at an animation-frame boundary.
    pub fn on_frame(&mut self, now: HostTime) {
        self.tick(now);
        let ids: Vec<CarouselId> = self
            .carousels
            .iter()
            .filter(|(_, slot)| slot.engine.has_pending_scroll())
            .map(|(id, _)| *id)
            .collect();

        for id in ids {
            let Some(slot) = self.carousels.get_mut(&id) else {
                continue;
            };
            let from = slot.engine.phase();
            let update = slot.engine.on_frame();
            let settle = if update.settled {
                slot.settle_timer.take()
            } else {
                None
            };

            let e = CoalesceEvent {
                at: now,
                carousel: id,
                samples: update.samples,
            };
            self.tracer().coalesce(&e);
            self.trace_phase(id, from);
            if let Some(timer) = settle {
                self.cancel(timer);
            }
            if let Some(change) = update.change {
                self.record_index(id, change, IndexSource::Scroll);
                self.restart_auto_advance(id);
            }
        }
    }

    /// Feeds an intersection ratio for a block. Returns the reveal if the
    /// block fired.
    pub fn on_intersection(&mut self, block: BlockId, ratio: f64, now: HostTime) -> Option<Reveal> {
        self.tick(now);
        let reveal = self.reveals.on_intersection(block, ratio)?;
        self.reveal_delays.insert(block, reveal.delay);
        self.dirty.mark(block.0, dirty::REVEAL);
        let e = RevealEvent {
            at: now,
            block,
            ratio,
            delay: reveal.delay,
        };
        self.tracer().reveal(&e);
        Some(reveal)
    }

    /// Like [`on_intersection`](Self::on_intersection), computing the ratio
    /// from block and viewport rectangles.
    pub fn on_block_geometry(
        &mut self,
        block: BlockId,
        bounds: Rect,
        viewport: Rect,
        now: HostTime,
    ) -> Option<Reveal> {
        self.on_intersection(block, intersection_ratio(bounds, viewport), now)
    }

    /// Reports that the tier's visual finished initializing.
    pub fn mark_visual_mounted(&mut self, now: HostTime) -> bool {
        self.tick(now);
        let from = self.loader.state();
        if !self.loader.mount_complete() {
            return false;
        }
        self.loader_changed(from);
        true
    }

    /// Fires every timer due at `now` and returns the scroll commands the
    /// host must execute.
    pub fn advance(&mut self, now: HostTime) -> Vec<ScrollCommand> {
        self.tick(now);
        let mut commands = Vec::new();
        while let Some((timer, deadline, purpose)) = self.timers.pop_expired(now) {
            let e = TimerEvent {
                at: now,
                timer,
                purpose,
                deadline,
            };
            self.tracer().timer_fired(&e);

            match purpose {
                TimerPurpose::Mount => {
                    let from = self.loader.state();
                    if self.loader.on_timer(timer) {
                        self.loader_changed(from);
                    }
                }
                TimerPurpose::ResizeDebounce => {
                    if self.resize_timer == Some(timer) {
                        self.resize_timer = None;
                        self.reclassify();
                    }
                }
                TimerPurpose::AutoAdvance(id) => {
                    let Some(slot) = self.carousels.get_mut(&id) else {
                        continue;
                    };
                    if slot.advance_timer != Some(timer) {
                        continue;
                    }
                    slot.advance_timer = None;
                    let from = slot.engine.phase();
                    let navigation = slot.engine.advance();
                    self.trace_phase(id, from);
                    commands.extend(self.after_navigation(id, navigation, IndexSource::AutoAdvance));
                }
                TimerPurpose::ScrollSettle(id) => {
                    let Some(slot) = self.carousels.get_mut(&id) else {
                        continue;
                    };
                    if slot.settle_timer != Some(timer) {
                        continue;
                    }
                    slot.settle_timer = None;
                    if slot.engine.phase() == ScrollPhase::ProgrammaticScrolling {
                        self.end_scroll(id);
                    }
                }
            }
        }
        commands
    }

    /// Earliest pending deadline; the host should call
    /// [`advance`](Self::advance) at or after it.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.timers.next_deadline()
    }

    /// Drains all dirty channels into a fresh [`PresentationChanges`].
    pub fn evaluate(&mut self) -> PresentationChanges {
        let mut changes = PresentationChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut PresentationChanges) {
        changes.clear();
        changes.tier = !self.drain(dirty::TIER).is_empty();
        changes.loader = !self.drain(dirty::LOADER).is_empty();
        changes.hover = !self.drain(dirty::HOVER).is_empty();
        changes.indices = self.drain(dirty::INDEX).into_iter().map(CarouselId).collect();
        changes.revealed = self.drain(dirty::REVEAL).into_iter().map(BlockId).collect();
    }

    /// Tears the mount down, cancelling every pending timer.
    pub fn unmount(mut self, now: HostTime) -> Teardown<S> {
        self.tick(now);
        let pending = self.timers.cancel_all();
        let mut cancelled = Vec::with_capacity(pending.len());
        for (timer, deadline, purpose) in pending {
            let e = TimerEvent {
                at: now,
                timer,
                purpose,
                deadline,
            };
            self.tracer().timer_cancelled(&e);
            cancelled.push((timer, purpose));
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a mount never holds anywhere near u32::MAX timers"
        )]
        let e = TeardownEvent {
            at: now,
            cancelled_timers: cancelled.len() as u32,
        };
        self.tracer().teardown(&e);
        Teardown {
            cancelled,
            sink: self.sink,
        }
    }

    // -- queries ------------------------------------------------------------

    /// The injected environment probe.
    #[must_use]
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The latest device profile.
    #[must_use]
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// The active tier and its mount delay.
    #[must_use]
    pub fn selection(&self) -> TierSelection {
        self.selection
    }

    /// The active tier.
    #[must_use]
    pub fn tier(&self) -> RenderTier {
        self.selection.tier
    }

    /// Loader state.
    #[must_use]
    pub fn loader_state(&self) -> LoaderState {
        self.loader.state()
    }

    /// What the visual slot should show.
    #[must_use]
    pub fn visual(&self) -> Visual {
        self.loader.visual()
    }

    /// Whether the placeholder should be visible.
    #[must_use]
    pub fn shows_placeholder(&self) -> bool {
        self.loader.shows_placeholder()
    }

    /// Whether the host should request or keep the animated subsystem.
    #[must_use]
    pub fn wants_heavy_mount(&self) -> bool {
        self.loader.wants_heavy_mount()
    }

    /// Whether hover affordances are enabled.
    #[must_use]
    pub fn hover_affordances_enabled(&self) -> bool {
        self.selection.tier.hover_affordances()
    }

    /// A registered carousel's engine.
    #[must_use]
    pub fn carousel(&self, id: CarouselId) -> Option<&CarouselEngine> {
        self.carousels.get(&id).map(|slot| &slot.engine)
    }

    /// A registered carousel's current index.
    #[must_use]
    pub fn current_index(&self, id: CarouselId) -> Option<usize> {
        self.carousel(id).map(CarouselEngine::current_index)
    }

    /// Whether a block has fired its reveal during this mount.
    #[must_use]
    pub fn has_fired(&self, block: BlockId) -> bool {
        self.reveals.has_fired(block)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // -- internals ----------------------------------------------------------

    fn tracer(&mut self) -> Tracer<'_> {
        Tracer::new(&mut self.sink)
    }

    fn tick(&mut self, now: HostTime) {
        self.clock = self.clock.max(now);
    }

    fn schedule(&mut self, purpose: TimerPurpose, deadline: HostTime) -> TimerId {
        let timer = self.timers.schedule(deadline, purpose);
        let e = TimerEvent {
            at: self.clock,
            timer,
            purpose,
            deadline,
        };
        self.tracer().timer_scheduled(&e);
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        let Some(deadline) = self.timers.deadline(timer) else {
            return;
        };
        let Some(purpose) = self.timers.cancel(timer) else {
            return;
        };
        let e = TimerEvent {
            at: self.clock,
            timer,
            purpose,
            deadline,
        };
        self.tracer().timer_cancelled(&e);
    }

    fn drain(&mut self, channel: Channel) -> Vec<u32> {
        let mut keys: Vec<u32> = self.dirty.drain(channel).deterministic().run().collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    fn trace_classify(&mut self) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "signal sets hold a handful of tokens"
        )]
        let e = ClassifyEvent {
            at: self.clock,
            width_class: self.profile.width_class,
            concurrency_hint: self.profile.concurrency_hint,
            signal_count: self.profile.platform_signals.len() as u32,
        };
        self.tracer().classify(&e);
    }

    fn trace_phase(&mut self, id: CarouselId, from: ScrollPhase) {
        let Some(to) = self.carousels.get(&id).map(|slot| slot.engine.phase()) else {
            return;
        };
        if from == to {
            return;
        }
        let e = ScrollPhaseEvent {
            at: self.clock,
            carousel: id,
            from,
            to,
        };
        self.tracer().scroll_phase(&e);
    }

    fn record_index(&mut self, id: CarouselId, change: IndexChange, source: IndexSource) {
        self.dirty.mark(id.0, dirty::INDEX);
        let e = IndexEvent {
            at: self.clock,
            carousel: id,
            from: change.from,
            to: change.to,
            source,
        };
        self.tracer().index(&e);
    }

    fn loader_changed(&mut self, from: LoaderState) {
        self.dirty.mark(dirty::PAGE, dirty::LOADER);
        let to = self.loader.state();
        if from == to {
            return;
        }
        let e = LoaderEvent {
            at: self.clock,
            from,
            to,
            tier: self.loader.tier(),
        };
        self.tracer().loader(&e);
    }

    /// Shared tail of user navigation and auto-advance.
    fn after_navigation(
        &mut self,
        id: CarouselId,
        navigation: Navigation,
        source: IndexSource,
    ) -> Option<ScrollCommand> {
        if let Some(change) = navigation.change() {
            self.record_index(id, change, source);
        }

        let slot = self.carousels.get_mut(&id)?;
        let programmatic = slot.engine.phase() == ScrollPhase::ProgrammaticScrolling;
        let old_settle = slot.settle_timer.take();
        if let Some(timer) = old_settle {
            self.cancel(timer);
        }
        if programmatic {
            let timer = self.schedule(
                TimerPurpose::ScrollSettle(id),
                self.clock.saturating_add(self.settle_timeout),
            );
            if let Some(slot) = self.carousels.get_mut(&id) {
                slot.settle_timer = Some(timer);
            }
        }

        self.restart_auto_advance(id);
        navigation.target_offset.map(|offset| ScrollCommand {
            carousel: id,
            offset,
        })
    }

    fn end_scroll(&mut self, id: CarouselId) {
        let Some(slot) = self.carousels.get_mut(&id) else {
            return;
        };
        let from = slot.engine.phase();
        let change = slot.engine.on_scroll_end();
        let settle = slot.settle_timer.take();
        self.trace_phase(id, from);
        if let Some(timer) = settle {
            self.cancel(timer);
        }
        if let Some(change) = change {
            self.record_index(id, change, IndexSource::Scroll);
            self.restart_auto_advance(id);
        }
    }

    fn auto_advance_active(&self) -> bool {
        !self.selection.tier.hover_affordances()
    }

    /// Cancels a carousel's auto-advance timer and, if auto-advance applies
    /// on the current tier, schedules a fresh interval.
    fn restart_auto_advance(&mut self, id: CarouselId) {
        let Some(slot) = self.carousels.get_mut(&id) else {
            return;
        };
        let old = slot.advance_timer.take();
        let interval = slot.config.auto_advance;
        if let Some(timer) = old {
            self.cancel(timer);
        }
        let Some(interval) = interval.filter(|_| self.auto_advance_active()) else {
            return;
        };
        let deadline = self.clock.saturating_add(interval);
        let timer = self.schedule(TimerPurpose::AutoAdvance(id), deadline);
        if let Some(slot) = self.carousels.get_mut(&id) {
            slot.advance_timer = Some(timer);
        }
    }

    /// Starts or stops auto-advance intervals after a tier change.
    fn sync_auto_advance(&mut self) {
        let active = self.auto_advance_active();
        let ids: Vec<CarouselId> = self
            .carousels
            .iter()
            .filter(|(_, slot)| slot.config.auto_advance.is_some())
            .filter(|(_, slot)| slot.advance_timer.is_some() != active)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.restart_auto_advance(id);
        }
    }

    /// Debounced reclassification after a resize.
    fn reclassify(&mut self) {
        self.profile = self.classifier.classify(&self.probe);
        self.trace_classify();
        let proposal = self.policy.select(&self.profile);

        match self.governor.offer(&self.profile, proposal) {
            TierDecision::Initial(_) | TierDecision::Unchanged => {}
            TierDecision::Held { active, proposed } => {
                let e = TierEvent {
                    at: self.clock,
                    from: Some(active),
                    to: proposed,
                    mount_delay: proposal.mount_delay,
                    width_class: self.profile.width_class,
                };
                self.tracer().tier_held(&e);
            }
            TierDecision::Changed { from, to } => self.apply_tier(from, to),
        }
    }

    fn apply_tier(&mut self, from: RenderTier, to: TierSelection) {
        self.selection = to;
        self.dirty.mark(dirty::PAGE, dirty::TIER);
        if from.hover_affordances() != to.tier.hover_affordances() {
            self.dirty.mark(dirty::PAGE, dirty::HOVER);
        }
        let e = TierEvent {
            at: self.clock,
            from: Some(from),
            to: to.tier,
            mount_delay: to.mount_delay,
            width_class: self.profile.width_class,
        };
        self.tracer().tier_selected(&e);

        let loader_from = self.loader.state();
        match self.loader.retier(to) {
            Retier::Unchanged => {}
            Retier::Swapped => self.loader_changed(loader_from),
            Retier::Rearm { cancel } => {
                if let Some(timer) = cancel {
                    self.cancel(timer);
                }
                let deadline = self.clock.saturating_add(to.mount_delay);
                let timer = self.schedule(TimerPurpose::Mount, deadline);
                self.loader.arm(timer);
                self.loader_changed(loader_from);
            }
        }

        self.sync_auto_advance();
    }
}

impl<P: EnvironmentProbe, S: TraceSink> PresentationSource for PresentationController<P, S> {
    fn tier(&self) -> RenderTier {
        self.selection.tier
    }

    fn loader_state(&self) -> LoaderState {
        self.loader.state()
    }

    fn visual(&self) -> Visual {
        self.loader.visual()
    }

    fn hover_affordances_enabled(&self) -> bool {
        self.selection.tier.hover_affordances()
    }

    fn current_index(&self, carousel: CarouselId) -> Option<usize> {
        self.carousels
            .get(&carousel)
            .map(|slot| slot.engine.current_index())
    }

    fn item_count(&self, carousel: CarouselId) -> Option<usize> {
        self.carousels
            .get(&carousel)
            .map(|slot| slot.engine.item_count())
    }

    fn reveal_delay(&self, block: BlockId) -> Option<Duration> {
        self.reveal_delays.get(&block).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneSettings;
    use core::cell::Cell;

    const SHOWCASE: CarouselId = CarouselId(0);

    fn ms(n: u64) -> HostTime {
        HostTime::from_millis(n)
    }

    fn six() -> NonZeroUsize {
        NonZeroUsize::new(6).unwrap()
    }

    /// Probe whose width can change between classifications.
    struct ResizableProbe {
        width: Cell<f64>,
        cores: u32,
    }

    impl EnvironmentProbe for ResizableProbe {
        fn viewport_width(&self) -> Option<f64> {
            Some(self.width.get())
        }

        fn hardware_concurrency(&self) -> Option<u32> {
            Some(self.cores)
        }

        fn platform(&self) -> Option<alloc::string::String> {
            None
        }
    }

    fn make_controller(width: f64, cores: u32) -> PresentationController<ResizableProbe> {
        let probe = ResizableProbe {
            width: Cell::new(width),
            cores,
        };
        PresentationController::mount(probe, ControllerConfig::web(), HostTime::ZERO)
    }

    fn make_showcase(width: f64) -> PresentationController<ResizableProbe> {
        let mut c = make_controller(width, 8);
        assert!(c.add_carousel(SHOWCASE, CarouselConfig::new(six()), HostTime::ZERO));
        c.set_scroll_width(SHOWCASE, 1200.0);
        c
    }

    #[test]
    fn wide_mount_becomes_ready_after_delay() {
        let mut c = make_controller(1440.0, 8);
        assert_eq!(c.tier(), RenderTier::Full);
        assert!(c.shows_placeholder());
        assert_eq!(c.next_deadline(), Some(ms(200)));

        let _ = c.advance(ms(199));
        assert_eq!(c.loader_state(), LoaderState::Idle);
        let _ = c.advance(ms(200));
        assert_eq!(c.loader_state(), LoaderState::Ready);
        assert_eq!(c.visual(), Visual::Scene(SceneSettings::FULL));
        assert!(c.wants_heavy_mount());
        assert!(c.mark_visual_mounted(ms(250)));
        assert!(!c.shows_placeholder());
        assert!(!c.wants_heavy_mount(), "mounted visuals are not requested again");
        assert!(!c.mark_visual_mounted(ms(260)));
    }

    #[test]
    fn demotion_after_mount_swaps_without_remount() {
        let mut c = make_controller(1440.0, 8);
        let _ = c.advance(ms(200));
        assert!(c.mark_visual_mounted(ms(210)));
        let _ = c.evaluate();

        c.probe().width.set(500.0);
        c.on_resize(ms(300));
        let _ = c.advance(ms(450));
        assert_eq!(c.tier(), RenderTier::Reduced);
        assert_eq!(c.loader_state(), LoaderState::Mounted);
        assert_eq!(c.visual(), Visual::Scene(SceneSettings::REDUCED));
        assert!(!c.wants_heavy_mount());
        assert!(c.evaluate().loader, "hosts see the settings swap once");
        assert!(!c.evaluate().loader);
    }

    #[test]
    fn unmount_cancels_pending_mount_timer() {
        let mut c = make_controller(500.0, 8);
        assert_eq!(c.selection().mount_delay, Duration::from_millis(400));

        assert!(c.advance(ms(100)).is_empty());
        assert_eq!(c.loader_state(), LoaderState::Idle);

        let teardown = c.unmount(ms(100));
        assert_eq!(teardown.cancelled.len(), 1);
        assert_eq!(teardown.cancelled[0].1, TimerPurpose::Mount);
    }

    #[test]
    fn narrow_low_power_mount_uses_static_fallback() {
        let mut c = make_controller(375.0, 2);
        assert_eq!(c.tier(), RenderTier::StaticFallback);
        assert_eq!(c.next_deadline(), Some(ms(800)));
        let _ = c.advance(ms(800));
        assert_eq!(c.visual(), Visual::StaticAsset);
        assert!(!c.wants_heavy_mount());
        assert!(!c.hover_affordances_enabled());
    }

    #[test]
    fn first_evaluate_reports_everything() {
        let mut c = make_showcase(1440.0);
        let changes = c.evaluate();
        assert!(changes.tier && changes.loader && changes.hover);
        assert_eq!(changes.indices, [SHOWCASE]);
        assert!(c.evaluate().is_empty(), "channels are drained");
    }

    #[test]
    fn scroll_is_coalesced_per_frame() {
        let mut c = make_showcase(1440.0);
        let _ = c.evaluate();

        let sample = |offset| ScrollSample {
            offset,
            scroll_width: 1200.0,
        };
        assert_eq!(c.on_scroll(SHOWCASE, sample(100.0)), Some(FrameRequest::Needed));
        assert_eq!(c.on_scroll(SHOWCASE, sample(300.0)), Some(FrameRequest::Pending));
        assert_eq!(c.on_scroll(SHOWCASE, sample(450.0)), Some(FrameRequest::Pending));
        assert_eq!(c.current_index(SHOWCASE), Some(0), "nothing moves before the frame");

        c.on_frame(ms(16));
        assert_eq!(c.current_index(SHOWCASE), Some(2));
        assert_eq!(c.evaluate().indices, [SHOWCASE]);
    }

    #[test]
    fn navigation_scrolls_and_settles() {
        let mut c = make_showcase(1440.0);
        let cmd = c.go_to_index(SHOWCASE, 5, ms(10));
        assert_eq!(
            cmd,
            Some(ScrollCommand {
                carousel: SHOWCASE,
                offset: 1000.0
            })
        );
        assert_eq!(c.current_index(SHOWCASE), Some(5));

        // Intermediate animation samples do not fight the optimistic index.
        let _ = c.on_scroll(
            SHOWCASE,
            ScrollSample {
                offset: 300.0,
                scroll_width: 1200.0,
            },
        );
        c.on_frame(ms(26));
        assert_eq!(c.current_index(SHOWCASE), Some(5));

        let _ = c.on_scroll(
            SHOWCASE,
            ScrollSample {
                offset: 1000.0,
                scroll_width: 1200.0,
            },
        );
        c.on_frame(ms(300));
        assert_eq!(
            c.carousel(SHOWCASE).map(CarouselEngine::phase),
            Some(ScrollPhase::Idle)
        );
        assert_eq!(
            c.pending_timers(),
            1,
            "settle timer cancelled on arrival; only the mount timer remains"
        );
    }

    #[test]
    fn settle_timeout_reconciles_a_stalled_scroll() {
        let mut c = make_showcase(1440.0);
        let _ = c.go_to_index(SHOWCASE, 4, ms(0));
        let _ = c.on_scroll(
            SHOWCASE,
            ScrollSample {
                offset: 600.0,
                scroll_width: 1200.0,
            },
        );
        c.on_frame(ms(16));
        assert_eq!(c.current_index(SHOWCASE), Some(4));

        let _ = c.advance(ms(700));
        assert_eq!(
            c.current_index(SHOWCASE),
            Some(3),
            "index follows where the container actually stopped"
        );
    }

    #[test]
    fn out_of_range_navigation_is_ignored() {
        let mut c = make_showcase(1440.0);
        let _ = c.evaluate();
        assert_eq!(c.go_to_index(SHOWCASE, 6, ms(1)), None);
        assert_eq!(c.go_to_index(CarouselId(9), 0, ms(1)), None);
        assert_eq!(c.current_index(SHOWCASE), Some(0));
        assert!(c.evaluate().indices.is_empty());
    }

    #[test]
    fn auto_advance_runs_only_on_narrow_tiers() {
        let mut wide = make_controller(1440.0, 8);
        let config = CarouselConfig::new(six()).with_auto_advance(Duration::from_millis(5000));
        let _ = wide.add_carousel(SHOWCASE, config, HostTime::ZERO);
        let _ = wide.advance(ms(20_000));
        assert_eq!(wide.current_index(SHOWCASE), Some(0));

        let mut narrow = make_controller(390.0, 8);
        let _ = narrow.add_carousel(SHOWCASE, config, HostTime::ZERO);
        narrow.set_scroll_width(SHOWCASE, 1200.0);
        let commands = narrow.advance(ms(5000));
        assert_eq!(narrow.current_index(SHOWCASE), Some(1));
        assert_eq!(commands.len(), 1);
        assert!((commands[0].offset - 200.0).abs() < 1e-9);
    }

    #[test]
    fn auto_advance_wraps_and_resets_on_navigation() {
        let mut c = make_controller(390.0, 8);
        let config = CarouselConfig::new(six()).with_auto_advance(Duration::from_millis(5000));
        let _ = c.add_carousel(SHOWCASE, config, HostTime::ZERO);

        let _ = c.go_to_index(SHOWCASE, 5, ms(3000));
        let _ = c.advance(ms(5000));
        assert_eq!(c.current_index(SHOWCASE), Some(5), "interval restarted at 3000");
        let _ = c.advance(ms(8000));
        assert_eq!(c.current_index(SHOWCASE), Some(0), "wraps after the last item");
    }

    #[test]
    fn resize_is_debounced_and_latest_wins() {
        let mut c = make_controller(1440.0, 8);
        let _ = c.advance(ms(200));
        let _ = c.evaluate();

        c.probe().width.set(500.0);
        c.on_resize(ms(1000));
        c.probe().width.set(1000.0);
        c.on_resize(ms(1100));
        assert_eq!(c.next_deadline(), Some(ms(1250)), "first resize was superseded");
        let _ = c.advance(ms(1250));
        assert_eq!(c.tier(), RenderTier::Full);

        c.probe().width.set(500.0);
        c.on_resize(ms(1300));
        let _ = c.advance(ms(1450));
        assert_eq!(c.tier(), RenderTier::Reduced);
        let changes = c.evaluate();
        assert!(changes.tier && changes.hover && changes.loader);
    }

    #[test]
    fn promotion_needs_width_class_change() {
        let mut c = make_controller(375.0, 2);
        assert_eq!(c.tier(), RenderTier::StaticFallback);

        c.on_resize(ms(10));
        let _ = c.advance(ms(160));
        assert_eq!(c.tier(), RenderTier::StaticFallback);

        c.probe().width.set(1024.0);
        c.on_resize(ms(200));
        let _ = c.advance(ms(350));
        assert_eq!(c.tier(), RenderTier::Full);
        assert_eq!(c.loader_state(), LoaderState::Idle, "static to animated re-arms");
        assert_eq!(c.next_deadline(), Some(ms(550)));
    }

    #[test]
    fn reveal_fires_once_and_is_reported() {
        let mut c = make_controller(1440.0, 8);
        let _ = c.evaluate();
        let block = BlockId(3);
        assert!(c.observe(block, RevealSpec::staggered(0.3, Duration::from_millis(120), 2)));

        assert_eq!(c.on_intersection(block, 0.1, ms(5)), None);
        let reveal = c.on_intersection(block, 0.4, ms(6));
        assert_eq!(reveal.map(|r| r.delay), Some(Duration::from_millis(240)));
        assert_eq!(c.on_intersection(block, 1.0, ms(7)), None);
        assert!(c.has_fired(block));

        let changes = c.evaluate();
        assert_eq!(changes.revealed, [block]);
        assert_eq!(c.reveal_delay(block), Some(Duration::from_millis(240)));
    }

    #[test]
    fn geometry_feeds_the_trigger() {
        let mut c = make_controller(1440.0, 8);
        let _ = c.observe(BlockId(0), RevealSpec::new(0.5));
        let viewport = Rect::new(0.0, 0.0, 1440.0, 900.0);
        let bounds = Rect::new(0.0, 800.0, 1440.0, 1000.0);
        assert_eq!(c.on_block_geometry(BlockId(0), bounds, viewport, ms(1)), Some(Reveal {
            block: BlockId(0),
            delay: Duration::ZERO
        }));
    }

    #[test]
    fn unmount_reports_every_pending_timer() {
        let mut c = make_controller(390.0, 8);
        let config = CarouselConfig::new(six()).with_auto_advance(Duration::from_millis(5000));
        let _ = c.add_carousel(SHOWCASE, config, HostTime::ZERO);
        c.set_scroll_width(SHOWCASE, 1200.0);
        c.on_resize(ms(50));
        let _ = c.go_to_index(SHOWCASE, 2, ms(60));

        let purposes: Vec<_> = c.unmount(ms(100)).cancelled.into_iter().map(|(_, p)| p).collect();
        assert_eq!(
            purposes,
            [
                TimerPurpose::ResizeDebounce,
                TimerPurpose::Mount,
                TimerPurpose::ScrollSettle(SHOWCASE),
                TimerPurpose::AutoAdvance(SHOWCASE),
            ]
        );
    }

    #[test]
    fn huge_intervals_saturate() {
        let mut c = make_controller(390.0, 8);
        let config = CarouselConfig::new(six()).with_auto_advance(Duration(u64::MAX));
        assert!(c.add_carousel(SHOWCASE, config, ms(10)));
        c.set_scroll_width(SHOWCASE, 1200.0);
        assert_eq!(c.next_deadline(), Some(ms(400)), "only the mount timer is due");
        assert!(c.advance(ms(10_000)).is_empty());
        assert_eq!(c.current_index(SHOWCASE), Some(0));
    }
}
