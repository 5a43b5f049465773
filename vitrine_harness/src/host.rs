// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted host event loop.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use vitrine_core::backend::{PresentationChanges, PresentationSource, Presenter, ScrollCommand};
use vitrine_core::carousel::{CarouselId, ScrollSample};
use vitrine_core::controller::{CarouselConfig, ControllerConfig, PresentationController, Teardown};
use vitrine_core::loader::{LoaderState, Visual};
use vitrine_core::reveal::{BlockId, Reveal, RevealSpec};
use vitrine_core::throttle::FrameRequest;
use vitrine_core::tier::RenderTier;
use vitrine_core::time::{Duration, HostTime};
use vitrine_core::trace::{NoopSink, TraceSink};

use crate::{FixtureProbe, VirtualClock};

/// How the simulated browser executes smooth-scroll commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollMode {
    /// The container reaches the target on the next animation frame.
    #[default]
    Instant,
    /// The container never moves, as if the scroll were swallowed. Only the
    /// settle timeout ends it.
    Stalled,
}

/// What the DOM would currently show, as reconstructed from presenter calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PresentedState {
    /// Last applied tier.
    pub tier: Option<RenderTier>,
    /// Last applied loader state.
    pub loader: Option<LoaderState>,
    /// Last applied visual.
    pub visual: Option<Visual>,
    /// Last applied hover affordance flag.
    pub hover: Option<bool>,
    /// Last applied index per carousel.
    pub indices: BTreeMap<CarouselId, usize>,
    /// Revealed blocks with their entrance delay.
    pub revealed: BTreeMap<BlockId, Duration>,
}

/// A [`Presenter`] that mirrors what it is asked to apply.
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    state: PresentedState,
    log: Vec<PresentationChanges>,
}

impl RecordingPresenter {
    /// Creates an empty presenter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The reconstructed presentation.
    #[must_use]
    pub fn state(&self) -> &PresentedState {
        &self.state
    }

    /// Every non-empty change set applied so far, oldest first.
    #[must_use]
    pub fn log(&self) -> &[PresentationChanges] {
        &self.log
    }
}

impl Presenter for RecordingPresenter {
    fn apply(&mut self, source: &dyn PresentationSource, changes: &PresentationChanges) {
        if changes.tier {
            self.state.tier = Some(source.tier());
        }
        if changes.loader {
            self.state.loader = Some(source.loader_state());
            self.state.visual = Some(source.visual());
        }
        if changes.hover {
            self.state.hover = Some(source.hover_affordances_enabled());
        }
        for &carousel in &changes.indices {
            if let Some(index) = source.current_index(carousel) {
                self.state.indices.insert(carousel, index);
            }
        }
        for &block in &changes.revealed {
            let delay = source.reveal_delay(block).unwrap_or(Duration::ZERO);
            self.state.revealed.insert(block, delay);
        }
        self.log.push(changes.clone());
    }
}

/// Plays the browser's part for a [`PresentationController`].
///
/// Every input method stamps events with the [`VirtualClock`], and
/// [`wait`](Self::wait) fires timers at their exact deadlines. After each
/// step the host drains the controller into its [`RecordingPresenter`].
#[derive(Debug)]
pub struct ScriptedHost<S: TraceSink = NoopSink> {
    controller: PresentationController<FixtureProbe, S>,
    probe: FixtureProbe,
    clock: VirtualClock,
    presenter: RecordingPresenter,
    changes: PresentationChanges,
    scroll_mode: ScrollMode,
    scroll_widths: BTreeMap<CarouselId, f64>,
    observed: BTreeSet<BlockId>,
    in_flight: BTreeMap<CarouselId, f64>,
    executed: Vec<(HostTime, ScrollCommand)>,
    frame_requested: bool,
}

impl ScriptedHost<NoopSink> {
    /// Mounts a controller with the web configuration at time zero.
    #[must_use]
    pub fn mount(probe: FixtureProbe) -> Self {
        Self::mount_with_sink(probe, ControllerConfig::web(), NoopSink)
    }
}

impl<S: TraceSink> ScriptedHost<S> {
    /// Mounts a controller with `config`, tracing into `sink`.
    #[must_use]
    pub fn mount_with_sink(probe: FixtureProbe, config: ControllerConfig, sink: S) -> Self {
        let clock = VirtualClock::default();
        let controller =
            PresentationController::mount_with_sink(probe.clone(), config, sink, clock.now());
        let mut host = Self {
            controller,
            probe,
            clock,
            presenter: RecordingPresenter::new(),
            changes: PresentationChanges::default(),
            scroll_mode: ScrollMode::Instant,
            scroll_widths: BTreeMap::new(),
            observed: BTreeSet::new(),
            in_flight: BTreeMap::new(),
            executed: Vec::new(),
            frame_requested: false,
        };
        host.present();
        host
    }

    /// Sets how smooth-scroll commands are executed from now on.
    pub fn set_scroll_mode(&mut self, mode: ScrollMode) {
        self.scroll_mode = mode;
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.clock.now()
    }

    /// The driven controller.
    #[must_use]
    pub fn controller(&self) -> &PresentationController<FixtureProbe, S> {
        &self.controller
    }

    /// The shared probe handle.
    #[must_use]
    pub fn probe(&self) -> &FixtureProbe {
        &self.probe
    }

    /// The recording presenter.
    #[must_use]
    pub fn presenter(&self) -> &RecordingPresenter {
        &self.presenter
    }

    /// Every scroll command the host executed, with the time it was issued.
    #[must_use]
    pub fn executed(&self) -> &[(HostTime, ScrollCommand)] {
        &self.executed
    }

    /// Registers a carousel laid out with `scroll_width` px of content.
    pub fn add_carousel(&mut self, id: CarouselId, config: CarouselConfig, scroll_width: f64) -> bool {
        if !self.controller.add_carousel(id, config, self.clock.now()) {
            return false;
        }
        self.controller.set_scroll_width(id, scroll_width);
        self.scroll_widths.insert(id, scroll_width);
        self.present();
        true
    }

    /// Lays a carousel out again with `scroll_width` px of content, as a
    /// viewport change would. No scroll event is sent; the host re-reads the
    /// width before its next navigation.
    pub fn relayout(&mut self, id: CarouselId, scroll_width: f64) {
        if let Some(width) = self.scroll_widths.get_mut(&id) {
            *width = scroll_width;
        }
    }

    /// Watches a block for its reveal.
    pub fn observe(&mut self, block: BlockId, spec: RevealSpec) -> bool {
        if !self.controller.observe(block, spec) {
            return false;
        }
        self.observed.insert(block);
        true
    }

    /// Returns `true` while the simulated observer still watches `block`.
    #[must_use]
    pub fn is_observed(&self, block: BlockId) -> bool {
        self.observed.contains(&block)
    }

    /// The user drags a carousel to `offset`. The sample is evaluated on the
    /// next [`frame`](Self::frame).
    pub fn user_scroll(&mut self, id: CarouselId, offset: f64) {
        let now = self.clock.now();
        self.in_flight.remove(&id);
        self.controller.on_user_input(id, now);
        self.push_sample(id, offset);
    }

    /// The container reports `scrollend`.
    pub fn scroll_end(&mut self, id: CarouselId) {
        self.in_flight.remove(&id);
        self.controller.on_scroll_end(id, self.clock.now());
        self.present();
    }

    /// The user clicks pagination dot `index`.
    pub fn click_dot(&mut self, id: CarouselId, index: usize) {
        self.refresh_scroll_widths();
        if let Some(command) = self.controller.go_to_index(id, index, self.clock.now()) {
            self.execute(command);
        }
        self.present();
    }

    /// Runs one animation frame at the current time.
    pub fn frame(&mut self) {
        if self.scroll_mode == ScrollMode::Instant {
            let arrived: Vec<(CarouselId, f64)> =
                core::mem::take(&mut self.in_flight).into_iter().collect();
            for (id, offset) in arrived {
                self.push_sample(id, offset);
            }
        }
        if core::mem::take(&mut self.frame_requested) {
            self.controller.on_frame(self.clock.now());
        }
        self.present();
    }

    /// Resizes the viewport. Reclassification happens once the debounce
    /// timer fires during a later [`wait`](Self::wait).
    pub fn resize(&mut self, width: f64) {
        self.probe.set_width(width);
        self.refresh_scroll_widths();
        self.controller.on_resize(self.clock.now());
    }

    /// Reports an intersection ratio for a block.
    pub fn intersect(&mut self, block: BlockId, ratio: f64) -> Option<Reveal> {
        let reveal = self.controller.on_intersection(block, ratio, self.clock.now());
        self.present();
        reveal
    }

    /// The heavy visual finished initializing.
    pub fn finish_visual_mount(&mut self) -> bool {
        let mounted = self.controller.mark_visual_mounted(self.clock.now());
        self.present();
        mounted
    }

    /// Lets `by` elapse, firing every timer at its deadline and running a
    /// frame after each firing that issued scroll commands.
    pub fn wait(&mut self, by: Duration) {
        let target = self.clock.now().saturating_add(by);
        while let Some(deadline) = self.controller.next_deadline() {
            if deadline > target {
                break;
            }
            let now = self.clock.advance_to(deadline);
            self.refresh_scroll_widths();
            let commands = self.controller.advance(now);
            let issued = !commands.is_empty();
            for command in commands {
                self.execute(command);
            }
            if issued {
                self.frame();
            } else {
                self.present();
            }
        }
        self.clock.advance_to(target);
    }

    /// Unmounts the controller at the current time.
    pub fn unmount(self) -> Teardown<S> {
        self.controller.unmount(self.clock.now())
    }

    fn push_sample(&mut self, id: CarouselId, offset: f64) {
        let scroll_width = self.scroll_widths.get(&id).copied().unwrap_or(0.0);
        let sample = ScrollSample {
            offset,
            scroll_width,
        };
        if self.controller.on_scroll(id, sample) == Some(FrameRequest::Needed) {
            self.frame_requested = true;
        }
    }

    fn refresh_scroll_widths(&mut self) {
        for (&id, &width) in &self.scroll_widths {
            self.controller.set_scroll_width(id, width);
        }
    }

    fn execute(&mut self, command: ScrollCommand) {
        self.executed.push((self.clock.now(), command));
        self.in_flight.insert(command.carousel, command.offset);
    }

    fn present(&mut self) {
        self.controller.evaluate_into(&mut self.changes);
        if self.changes.is_empty() {
            return;
        }
        self.presenter.apply(&self.controller, &self.changes);
        for block in &self.changes.revealed {
            self.observed.remove(block);
        }
    }
}
