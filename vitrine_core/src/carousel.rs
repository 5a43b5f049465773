// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll-offset ↔ selection-index synchronization for a snap carousel.
//!
//! [`CarouselEngine`] is the only writer of a carousel's current index. It
//! reconciles two inputs:
//!
//! - **Scroll samples** from the host ([`on_scroll`](CarouselEngine::on_scroll)).
//!   These are coalesced and only evaluated at the next animation frame
//!   ([`on_frame`](CarouselEngine::on_frame)), where the index becomes
//!   `round(offset / item_width)` clamped to the item range.
//! - **Navigation requests** ([`go_to_index`](CarouselEngine::go_to_index)).
//!   The index is updated optimistically and a smooth-scroll target is
//!   returned for the host to execute.
//!
//! # Scroll phases
//!
//! ```text
//!              on_scroll                  go_to_index
//!   Idle ───────────────► UserScrolling ◄──────────────┐
//!    ▲  ◄─── on_scroll_end ────┘   │                    │
//!    │                             └─ go_to_index ─► ProgrammaticScrolling
//!    └──── target reached / on_scroll_end ──────────────┘   │
//!                                       on_user_input ──────┘ → UserScrolling
//! ```
//!
//! While [`ScrollPhase::ProgrammaticScrolling`], scroll samples produced by
//! the smooth-scroll animation are recorded but never move the index; the
//! optimistic value stands until the offset reaches the target (within
//! [`settle_tolerance`](CarouselEngine::settle_tolerance)), the host reports
//! the end of scrolling, or the user takes over.

use core::num::NonZeroUsize;

use crate::throttle::{FrameCoalescer, FrameRequest};

/// Identifies a carousel registered with the
/// [`PresentationController`](crate::controller::PresentationController).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarouselId(pub u32);

/// A raw scroll observation from the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSample {
    /// Horizontal scroll offset of the container (`scrollLeft`).
    pub offset: f64,
    /// Total scrollable width of the container (`scrollWidth`).
    pub scroll_width: f64,
}

/// Who is currently moving the scroll container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollPhase {
    /// Nothing is scrolling.
    Idle,
    /// The user is scrolling; samples drive the index.
    UserScrolling,
    /// A smooth scroll issued by [`CarouselEngine::go_to_index`] is in flight.
    ProgrammaticScrolling,
}

/// What caused an index change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexSource {
    /// Derived from a scroll offset.
    Scroll,
    /// Requested through pagination or another control.
    Navigation,
    /// Produced by the auto-advance interval.
    AutoAdvance,
}

/// An index transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexChange {
    /// Previous index.
    pub from: usize,
    /// New index.
    pub to: usize,
}

/// Result of [`CarouselEngine::on_frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameUpdate {
    /// Number of scroll samples merged into this frame (0 if none were
    /// pending).
    pub samples: u32,
    /// Index change derived from the latest sample, if any.
    pub change: Option<IndexChange>,
    /// Whether an in-flight programmatic scroll reached its target.
    pub settled: bool,
}

/// A navigation accepted by [`CarouselEngine::go_to_index`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Navigation {
    /// Index before the request.
    pub from: usize,
    /// Index after the request (already current).
    pub to: usize,
    /// Offset to smooth-scroll to, or `None` if the container has not been
    /// laid out yet.
    pub target_offset: Option<f64>,
}

impl Navigation {
    /// Returns the index change, or `None` if the index did not move.
    #[must_use]
    pub fn change(&self) -> Option<IndexChange> {
        (self.from != self.to).then_some(IndexChange {
            from: self.from,
            to: self.to,
        })
    }
}

/// One pagination dot, projected from the current index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PaginationDot {
    /// Item index the dot navigates to.
    pub index: usize,
    /// Whether this dot marks the current item.
    pub active: bool,
}

/// Offset distance (CSS px) under which a programmatic scroll counts as
/// arrived.
pub const DEFAULT_SETTLE_TOLERANCE: f64 = 1.0;

/// Owner of one carousel's index and scroll state.
#[derive(Clone, Debug)]
pub struct CarouselEngine {
    item_count: NonZeroUsize,
    current_index: usize,
    scroll_offset: f64,
    scroll_width: f64,
    phase: ScrollPhase,
    target_offset: f64,
    pending: FrameCoalescer<ScrollSample>,
    settle_tolerance: f64,
}

impl CarouselEngine {
    /// Creates an engine for `item_count` items, starting at index 0 with no
    /// layout.
    #[must_use]
    pub fn new(item_count: NonZeroUsize) -> Self {
        Self {
            item_count,
            current_index: 0,
            scroll_offset: 0.0,
            scroll_width: 0.0,
            phase: ScrollPhase::Idle,
            target_offset: 0.0,
            pending: FrameCoalescer::new(),
            settle_tolerance: DEFAULT_SETTLE_TOLERANCE,
        }
    }

    /// Sets the arrival tolerance for programmatic scrolls.
    #[must_use]
    pub fn with_settle_tolerance(mut self, tolerance: f64) -> Self {
        self.settle_tolerance = tolerance.max(0.0);
        self
    }

    /// Number of items; fixed for the engine's lifetime.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count.get()
    }

    /// Current selection index, always in `0..item_count`.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Last scroll offset applied at a frame boundary.
    #[must_use]
    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Current scroll phase.
    #[must_use]
    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    /// Arrival tolerance for programmatic scrolls.
    #[must_use]
    pub fn settle_tolerance(&self) -> f64 {
        self.settle_tolerance
    }

    /// Width of one item, or `None` until the container has a positive
    /// scroll width.
    #[must_use]
    pub fn item_width(&self) -> Option<f64> {
        (self.scroll_width.is_finite() && self.scroll_width > 0.0)
            .then(|| self.scroll_width / self.item_count.get() as f64)
    }

    /// Scroll offset at which item `index` is aligned.
    #[must_use]
    pub fn offset_for(&self, index: usize) -> Option<f64> {
        if index >= self.item_count.get() {
            return None;
        }
        self.item_width().map(|w| w * index as f64)
    }

    /// Index nearest to `offset` under the current layout.
    #[must_use]
    pub fn index_for_offset(&self, offset: f64) -> Option<usize> {
        let width = self.item_width()?;
        let offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
        // Non-negative, so adding one half and truncating rounds to nearest.
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "ratio is finite and non-negative; saturating cast clamps huge values"
        )]
        let candidate = (offset / width + 0.5) as usize;
        Some(candidate.min(self.item_count.get() - 1))
    }

    /// Updates the container's scroll width after a layout change.
    pub fn set_scroll_width(&mut self, scroll_width: f64) {
        if scroll_width.is_finite() {
            self.scroll_width = scroll_width.max(0.0);
        }
    }

    /// Records a scroll sample for evaluation at the next frame.
    pub fn on_scroll(&mut self, sample: ScrollSample) -> FrameRequest {
        if self.phase == ScrollPhase::Idle {
            self.phase = ScrollPhase::UserScrolling;
        }
        self.pending.push(sample)
    }

    /// Notes direct user input on the container (wheel, touch, drag), which
    /// takes over from any programmatic scroll.
    pub fn on_user_input(&mut self) {
        self.phase = ScrollPhase::UserScrolling;
    }

    /// Returns `true` if a scroll sample is waiting for a frame.
    #[must_use]
    pub fn has_pending_scroll(&self) -> bool {
        self.pending.is_pending()
    }

    /// Evaluates the latest coalesced scroll sample.
    pub fn on_frame(&mut self) -> FrameUpdate {
        let Some((sample, samples)) = self.pending.flush() else {
            return FrameUpdate::default();
        };
        self.apply_sample(sample);

        let mut settled = false;
        if self.phase == ScrollPhase::ProgrammaticScrolling {
            if !self.near_target() {
                return FrameUpdate {
                    samples,
                    change: None,
                    settled,
                };
            }
            self.phase = ScrollPhase::Idle;
            settled = true;
        }

        FrameUpdate {
            samples,
            change: self.reconcile(),
            settled,
        }
    }

    /// Ends any scrolling: flushes the pending sample, returns to
    /// [`ScrollPhase::Idle`] and reconciles the index with the final offset.
    ///
    /// Hosts call this on `scrollend`; the controller also calls it when a
    /// programmatic scroll overruns its settle timeout.
    pub fn on_scroll_end(&mut self) -> Option<IndexChange> {
        if let Some((sample, _)) = self.pending.flush() {
            self.apply_sample(sample);
        }
        self.phase = ScrollPhase::Idle;
        self.reconcile()
    }

    /// Navigates to `index`.
    ///
    /// Out-of-range requests are ignored and return `None`. Otherwise the
    /// index is updated immediately and the returned [`Navigation`] carries
    /// the smooth-scroll target for the host.
    pub fn go_to_index(&mut self, index: usize) -> Option<Navigation> {
        if index >= self.item_count.get() {
            return None;
        }
        let from = self.current_index;
        self.current_index = index;
        self.pending.discard();

        let target_offset = self.offset_for(index);
        self.phase = match target_offset {
            Some(target) if !self.within_tolerance(self.scroll_offset, target) => {
                self.target_offset = target;
                ScrollPhase::ProgrammaticScrolling
            }
            _ => ScrollPhase::Idle,
        };

        Some(Navigation {
            from,
            to: index,
            target_offset,
        })
    }

    /// Navigates to the next item, wrapping to the first after the last.
    pub fn advance(&mut self) -> Navigation {
        let next = (self.current_index + 1) % self.item_count.get();
        let from = self.current_index;
        self.go_to_index(next).unwrap_or(Navigation {
            from,
            to: from,
            target_offset: None,
        })
    }

    /// Pagination dots, one per item.
    pub fn dots(&self) -> impl Iterator<Item = PaginationDot> + '_ {
        (0..self.item_count.get()).map(|index| PaginationDot {
            index,
            active: index == self.current_index,
        })
    }

    fn apply_sample(&mut self, sample: ScrollSample) {
        if sample.offset.is_finite() {
            self.scroll_offset = sample.offset.max(0.0);
        }
        self.set_scroll_width(sample.scroll_width);
    }

    fn reconcile(&mut self) -> Option<IndexChange> {
        let candidate = self.index_for_offset(self.scroll_offset)?;
        if candidate == self.current_index {
            return None;
        }
        let change = IndexChange {
            from: self.current_index,
            to: candidate,
        };
        self.current_index = candidate;
        Some(change)
    }

    fn near_target(&self) -> bool {
        self.within_tolerance(self.scroll_offset, self.target_offset)
    }

    fn within_tolerance(&self, a: f64, b: f64) -> bool {
        let d = a - b;
        d <= self.settle_tolerance && d >= -self.settle_tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn make_engine(items: usize, scroll_width: f64) -> CarouselEngine {
        let mut engine = CarouselEngine::new(NonZeroUsize::new(items).unwrap());
        engine.set_scroll_width(scroll_width);
        engine
    }

    fn sample(offset: f64) -> ScrollSample {
        ScrollSample {
            offset,
            scroll_width: 1200.0,
        }
    }

    #[test]
    fn scroll_to_450_selects_item_two() {
        let mut engine = make_engine(6, 1200.0);
        assert_eq!(engine.item_width(), Some(200.0));
        let _ = engine.on_scroll(sample(450.0));
        let update = engine.on_frame();
        assert_eq!(update.change, Some(IndexChange { from: 0, to: 2 }));
        assert_eq!(engine.current_index(), 2);
    }

    #[test]
    fn go_to_last_item_targets_offset_1000() {
        let mut engine = make_engine(6, 1200.0);
        let nav = engine.go_to_index(5).unwrap();
        assert_eq!(nav.target_offset, Some(1000.0));
        assert_eq!(nav.change(), Some(IndexChange { from: 0, to: 5 }));
        assert_eq!(engine.current_index(), 5, "index updates before the scroll lands");
        assert_eq!(engine.phase(), ScrollPhase::ProgrammaticScrolling);
    }

    #[test]
    fn index_stays_in_range_for_all_offsets() {
        for items in 1..=8_usize {
            let total = 150.0 * items as f64;
            let mut engine = make_engine(items, total);
            let mut offset = 0.0;
            while offset <= total {
                let _ = engine.on_scroll(ScrollSample {
                    offset,
                    scroll_width: total,
                });
                let _ = engine.on_frame();
                let index = engine.current_index();
                assert!(index < items, "items={items} offset={offset} index={index}");

                // Index and offset agree within one item width.
                let width = engine.item_width().unwrap();
                let distance = offset - width * index as f64;
                assert!(distance <= width && distance >= -width);
                offset += 7.5;
            }
        }
    }

    #[test]
    fn overscroll_is_clamped() {
        let mut engine = make_engine(6, 1200.0);
        let _ = engine.on_scroll(sample(5000.0));
        let _ = engine.on_frame();
        assert_eq!(engine.current_index(), 5);

        let _ = engine.on_scroll(sample(-80.0));
        let _ = engine.on_frame();
        assert_eq!(engine.current_index(), 0, "rubber-band offsets clamp to zero");
    }

    #[test]
    fn unlaid_out_container_skips_recomputation() {
        let mut engine = CarouselEngine::new(NonZeroUsize::new(6).unwrap());
        let _ = engine.on_scroll(ScrollSample {
            offset: 450.0,
            scroll_width: 0.0,
        });
        let update = engine.on_frame();
        assert_eq!(update.samples, 1);
        assert_eq!(update.change, None);
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn coalesced_burst_uses_last_offset() {
        let mut engine = make_engine(6, 1200.0);
        assert_eq!(engine.on_scroll(sample(100.0)), FrameRequest::Needed);
        assert_eq!(engine.on_scroll(sample(700.0)), FrameRequest::Pending);
        assert_eq!(engine.on_scroll(sample(820.0)), FrameRequest::Pending);

        let update = engine.on_frame();
        assert_eq!(update.samples, 3);
        assert_eq!(update.change, Some(IndexChange { from: 0, to: 4 }));
        assert_eq!(engine.on_frame(), FrameUpdate::default(), "nothing left to do");
    }

    #[test]
    fn out_of_range_navigation_is_ignored() {
        let mut engine = make_engine(6, 1200.0);
        let _ = engine.go_to_index(3);
        assert_eq!(engine.go_to_index(6), None);
        assert_eq!(engine.go_to_index(usize::MAX), None);
        assert_eq!(engine.current_index(), 3);
    }

    #[test]
    fn animation_frames_do_not_fight_optimistic_index() {
        let mut engine = make_engine(6, 1200.0);
        let _ = engine.go_to_index(5);

        // Intermediate offsets of the smooth scroll.
        for offset in [120.0, 390.0, 610.0, 880.0] {
            let _ = engine.on_scroll(sample(offset));
            let update = engine.on_frame();
            assert_eq!(update.change, None, "offset={offset}");
            assert_eq!(engine.current_index(), 5);
        }

        let _ = engine.on_scroll(sample(999.5));
        let update = engine.on_frame();
        assert!(update.settled);
        assert_eq!(update.change, None, "settles on the optimistic index");
        assert_eq!(engine.phase(), ScrollPhase::Idle);
    }

    #[test]
    fn user_input_interrupts_programmatic_scroll() {
        let mut engine = make_engine(6, 1200.0);
        let _ = engine.go_to_index(5);
        let _ = engine.on_scroll(sample(300.0));
        let _ = engine.on_frame();
        assert_eq!(engine.current_index(), 5);

        engine.on_user_input();
        let _ = engine.on_scroll(sample(310.0));
        let update = engine.on_frame();
        assert_eq!(update.change, Some(IndexChange { from: 5, to: 2 }));
        assert_eq!(engine.phase(), ScrollPhase::UserScrolling);
    }

    #[test]
    fn scroll_end_reconverges() {
        let mut engine = make_engine(6, 1200.0);
        let _ = engine.go_to_index(4);
        let _ = engine.on_scroll(sample(598.0));
        assert_eq!(engine.on_scroll_end(), Some(IndexChange { from: 4, to: 3 }));
        assert_eq!(engine.phase(), ScrollPhase::Idle);
    }

    #[test]
    fn navigation_before_layout_has_no_target() {
        let mut engine = CarouselEngine::new(NonZeroUsize::new(3).unwrap());
        let nav = engine.go_to_index(2).unwrap();
        assert_eq!(nav.target_offset, None);
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.phase(), ScrollPhase::Idle);
    }

    #[test]
    fn navigation_overrides_any_prior_state() {
        let mut engine = make_engine(6, 1200.0);
        let _ = engine.on_scroll(sample(800.0));
        for target in [0, 5, 2, 2, 1] {
            let _ = engine.go_to_index(target);
            assert_eq!(engine.current_index(), target);
            assert!(!engine.has_pending_scroll(), "stale samples are dropped");
        }
    }

    #[test]
    fn advance_wraps() {
        let mut engine = make_engine(3, 900.0);
        let visited: Vec<usize> = (0..4).map(|_| engine.advance().to).collect();
        assert_eq!(visited, [1, 2, 0, 1]);
    }

    #[test]
    fn dots_project_current_index() {
        let mut engine = make_engine(4, 800.0);
        let _ = engine.go_to_index(2);
        let active: Vec<usize> = engine.dots().filter(|d| d.active).map(|d| d.index).collect();
        assert_eq!(active, [2]);
        assert_eq!(engine.dots().count(), 4);
    }
}
