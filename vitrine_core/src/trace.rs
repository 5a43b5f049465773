// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the presentation controller.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [controller](crate::controller::PresentationController) calls at each
//! decision point. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::carousel::{CarouselId, IndexSource, ScrollPhase};
use crate::device::WidthClass;
use crate::loader::LoaderState;
use crate::reveal::BlockId;
use crate::tier::RenderTier;
use crate::time::{Duration, HostTime};
use crate::timer::TimerId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What a controller timer is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    /// Deferred heavy-visual mount.
    Mount,
    /// Trailing edge of the resize debounce.
    ResizeDebounce,
    /// Auto-advance interval of a carousel.
    AutoAdvance(CarouselId),
    /// Deadline for a programmatic scroll to settle.
    ScrollSettle(CarouselId),
}

impl TimerPurpose {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::ResizeDebounce => "resize-debounce",
            Self::AutoAdvance(_) => "auto-advance",
            Self::ScrollSettle(_) => "scroll-settle",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after each classification pass.
#[derive(Clone, Copy, Debug)]
pub struct ClassifyEvent {
    /// Host time of the pass.
    pub at: HostTime,
    /// Resulting width class.
    pub width_class: WidthClass,
    /// Resulting concurrency hint.
    pub concurrency_hint: u32,
    /// Number of platform signals matched.
    pub signal_count: u32,
}

/// Emitted when a tier takes effect or a promotion is held back.
#[derive(Clone, Copy, Debug)]
pub struct TierEvent {
    /// Host time of the decision.
    pub at: HostTime,
    /// Previously active tier (`None` for the first selection).
    pub from: Option<RenderTier>,
    /// Tier that took effect, or the proposed tier for a held promotion.
    pub to: RenderTier,
    /// Mount delay of `to`.
    pub mount_delay: Duration,
    /// Width class the decision was made under.
    pub width_class: WidthClass,
}

/// Emitted on every loader state transition.
#[derive(Clone, Copy, Debug)]
pub struct LoaderEvent {
    /// Host time of the transition.
    pub at: HostTime,
    /// Previous state.
    pub from: LoaderState,
    /// New state.
    pub to: LoaderState,
    /// Tier the loader is working towards.
    pub tier: RenderTier,
}

/// Emitted when a timer is scheduled, fires or is cancelled.
#[derive(Clone, Copy, Debug)]
pub struct TimerEvent {
    /// Host time of the event.
    pub at: HostTime,
    /// Timer handle.
    pub timer: TimerId,
    /// What the timer is for.
    pub purpose: TimerPurpose,
    /// Deadline the timer was scheduled for.
    pub deadline: HostTime,
}

/// Emitted when a carousel's index changes.
#[derive(Clone, Copy, Debug)]
pub struct IndexEvent {
    /// Host time of the change.
    pub at: HostTime,
    /// Which carousel.
    pub carousel: CarouselId,
    /// Previous index.
    pub from: usize,
    /// New index.
    pub to: usize,
    /// What caused the change.
    pub source: IndexSource,
}

/// Emitted when a carousel's scroll phase changes.
#[derive(Clone, Copy, Debug)]
pub struct ScrollPhaseEvent {
    /// Host time of the change.
    pub at: HostTime,
    /// Which carousel.
    pub carousel: CarouselId,
    /// Previous phase.
    pub from: ScrollPhase,
    /// New phase.
    pub to: ScrollPhase,
}

/// Emitted when coalesced scroll samples are evaluated at a frame.
#[derive(Clone, Copy, Debug)]
pub struct CoalesceEvent {
    /// Host time of the frame.
    pub at: HostTime,
    /// Which carousel.
    pub carousel: CarouselId,
    /// Number of scroll samples merged into this frame.
    pub samples: u32,
}

/// Emitted when a block fires its reveal.
#[derive(Clone, Copy, Debug)]
pub struct RevealEvent {
    /// Host time of the intersection callback.
    pub at: HostTime,
    /// Which block.
    pub block: BlockId,
    /// Intersection ratio that fired it.
    pub ratio: f64,
    /// Entrance delay handed to the host.
    pub delay: Duration,
}

/// Emitted once when the controller is torn down.
#[derive(Clone, Copy, Debug)]
pub struct TeardownEvent {
    /// Host time of the unmount.
    pub at: HostTime,
    /// Timers that were still pending and got cancelled.
    pub cancelled_timers: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the presentation controller.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after each classification pass.
    fn on_classify(&mut self, e: &ClassifyEvent) {
        _ = e;
    }

    /// Called when a tier takes effect.
    fn on_tier_selected(&mut self, e: &TierEvent) {
        _ = e;
    }

    /// Called when a promotion is held back by the governor.
    fn on_tier_held(&mut self, e: &TierEvent) {
        _ = e;
    }

    /// Called on every loader transition.
    fn on_loader(&mut self, e: &LoaderEvent) {
        _ = e;
    }

    /// Called when a timer is scheduled.
    fn on_timer_scheduled(&mut self, e: &TimerEvent) {
        _ = e;
    }

    /// Called when a timer fires.
    fn on_timer_fired(&mut self, e: &TimerEvent) {
        _ = e;
    }

    /// Called when a pending timer is cancelled.
    fn on_timer_cancelled(&mut self, e: &TimerEvent) {
        _ = e;
    }

    /// Called when a carousel index changes.
    fn on_index(&mut self, e: &IndexEvent) {
        _ = e;
    }

    /// Called when a carousel scroll phase changes.
    fn on_scroll_phase(&mut self, e: &ScrollPhaseEvent) {
        _ = e;
    }

    /// Called when coalesced scroll samples are evaluated.
    fn on_coalesce(&mut self, e: &CoalesceEvent) {
        _ = e;
    }

    /// Called when a block fires its reveal.
    fn on_reveal(&mut self, e: &RevealEvent) {
        _ = e;
    }

    /// Called once on teardown.
    fn on_teardown(&mut self, e: &TeardownEvent) {
        _ = e;
    }
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    fn on_classify(&mut self, e: &ClassifyEvent) {
        (**self).on_classify(e);
    }

    fn on_tier_selected(&mut self, e: &TierEvent) {
        (**self).on_tier_selected(e);
    }

    fn on_tier_held(&mut self, e: &TierEvent) {
        (**self).on_tier_held(e);
    }

    fn on_loader(&mut self, e: &LoaderEvent) {
        (**self).on_loader(e);
    }

    fn on_timer_scheduled(&mut self, e: &TimerEvent) {
        (**self).on_timer_scheduled(e);
    }

    fn on_timer_fired(&mut self, e: &TimerEvent) {
        (**self).on_timer_fired(e);
    }

    fn on_timer_cancelled(&mut self, e: &TimerEvent) {
        (**self).on_timer_cancelled(e);
    }

    fn on_index(&mut self, e: &IndexEvent) {
        (**self).on_index(e);
    }

    fn on_scroll_phase(&mut self, e: &ScrollPhaseEvent) {
        (**self).on_scroll_phase(e);
    }

    fn on_coalesce(&mut self, e: &CoalesceEvent) {
        (**self).on_coalesce(e);
    }

    fn on_reveal(&mut self, e: &RevealEvent) {
        (**self).on_reveal(e);
    }

    fn on_teardown(&mut self, e: &TeardownEvent) {
        (**self).on_teardown(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method that forwards one event to the sink.
macro_rules! emit {
    ($(#[$doc:meta])* $name:ident => $hook:ident($ty:ty)) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    emit!(
        /// Emits a [`ClassifyEvent`].
        classify => on_classify(ClassifyEvent)
    );
    emit!(
        /// Emits a [`TierEvent`] for a tier that took effect.
        tier_selected => on_tier_selected(TierEvent)
    );
    emit!(
        /// Emits a [`TierEvent`] for a held promotion.
        tier_held => on_tier_held(TierEvent)
    );
    emit!(
        /// Emits a [`LoaderEvent`].
        loader => on_loader(LoaderEvent)
    );
    emit!(
        /// Emits a [`TimerEvent`] for a scheduled timer.
        timer_scheduled => on_timer_scheduled(TimerEvent)
    );
    emit!(
        /// Emits a [`TimerEvent`] for a fired timer.
        timer_fired => on_timer_fired(TimerEvent)
    );
    emit!(
        /// Emits a [`TimerEvent`] for a cancelled timer.
        timer_cancelled => on_timer_cancelled(TimerEvent)
    );
    emit!(
        /// Emits an [`IndexEvent`].
        index => on_index(IndexEvent)
    );
    emit!(
        /// Emits a [`ScrollPhaseEvent`].
        scroll_phase => on_scroll_phase(ScrollPhaseEvent)
    );
    emit!(
        /// Emits a [`CoalesceEvent`].
        coalesce => on_coalesce(CoalesceEvent)
    );
    emit!(
        /// Emits a [`RevealEvent`].
        reveal => on_reveal(RevealEvent)
    );
    emit!(
        /// Emits a [`TeardownEvent`].
        teardown => on_teardown(TeardownEvent)
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> IndexEvent {
        IndexEvent {
            at: HostTime::from_millis(16),
            carousel: CarouselId(0),
            from: 0,
            to: 2,
            source: IndexSource::Scroll,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_index(&sample_index());
        sink.on_teardown(&TeardownEvent {
            at: HostTime::ZERO,
            cancelled_timers: 0,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.index(&sample_index());
    }

    #[test]
    fn purpose_labels() {
        assert_eq!(TimerPurpose::Mount.as_str(), "mount");
        assert_eq!(TimerPurpose::ScrollSettle(CarouselId(3)).as_str(), "scroll-settle");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            indices: Vec<usize>,
        }
        impl TraceSink for RecordingSink {
            fn on_index(&mut self, e: &IndexEvent) {
                self.indices.push(e.to);
            }
        }

        let mut sink = RecordingSink { indices: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.index(&sample_index());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.indices, &[2]);
    }
}
