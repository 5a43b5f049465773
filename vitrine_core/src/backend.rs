// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for host integrations.
//!
//! Vitrine splits host-specific work into *backend* crates. Each backend
//! provides the following pieces:
//!
//! - **Environment probe**: an [`EnvironmentProbe`] that reads viewport
//!   width, concurrency and platform identifier from the host.
//!
//! - **Event plumbing**: subscriptions for resize, scroll, intersection,
//!   animation frames and timeouts that forward into the
//!   [`PresentationController`]. Each subscription is an owned guard that
//!   releases its registration on drop.
//!
//! - **Presenter**: implements the [`Presenter`] trait to apply drained
//!   [`PresentationChanges`] to host-native elements (e.g. DOM attributes).
//!
//! - **Scroll execution**: performs the [`ScrollCommand`]s returned by
//!   navigation and auto-advance.
//!
//! # Crate boundaries
//!
//! `vitrine_core` owns the state machines, timers and this contract module.
//! Backend crates depend on `vitrine_core` and provide host glue. Application
//! code depends on both and wires them together.
//!
//! [`EnvironmentProbe`]: crate::probe::EnvironmentProbe
//! [`PresentationController`]: crate::controller::PresentationController

use alloc::vec::Vec;

use crate::carousel::CarouselId;
use crate::loader::{LoaderState, Visual};
use crate::reveal::BlockId;
use crate::tier::RenderTier;
use crate::time::Duration;

/// Asks the host to smooth-scroll a carousel container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollCommand {
    /// Carousel whose container scrolls.
    pub carousel: CarouselId,
    /// Target horizontal offset (CSS px).
    pub offset: f64,
}

/// The set of changes drained by a single
/// [`PresentationController::evaluate`](crate::controller::PresentationController::evaluate)
/// call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresentationChanges {
    /// The render tier changed.
    pub tier: bool,
    /// The loader state or its visual changed.
    pub loader: bool,
    /// Hover affordances were toggled.
    pub hover: bool,
    /// Carousels whose current index changed, in id order.
    pub indices: Vec<CarouselId>,
    /// Blocks that fired their reveal, in id order.
    pub revealed: Vec<BlockId>,
}

impl PresentationChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.tier = false;
        self.loader = false;
        self.hover = false;
        self.indices.clear();
        self.revealed.clear();
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.tier && !self.loader && !self.hover && self.indices.is_empty() && self.revealed.is_empty()
    }
}

/// Read access to the current presentation state.
///
/// Presenters read values through this trait rather than from the changes
/// themselves, so a change set only says *what* to refresh.
pub trait PresentationSource {
    /// Active render tier.
    fn tier(&self) -> RenderTier;

    /// Loader state.
    fn loader_state(&self) -> LoaderState;

    /// What the visual slot should show.
    fn visual(&self) -> Visual;

    /// Whether hover affordances (scroll hint, hover transforms) are enabled.
    fn hover_affordances_enabled(&self) -> bool;

    /// Current index of a carousel, or `None` if it is not registered.
    fn current_index(&self, carousel: CarouselId) -> Option<usize>;

    /// Item count of a carousel, or `None` if it is not registered.
    fn item_count(&self, carousel: CarouselId) -> Option<usize>;

    /// Entrance delay of a block that has fired.
    fn reveal_delay(&self, block: BlockId) -> Option<Duration>;
}

/// Applies drained presentation changes to host-native elements.
///
/// The DOM presenter and test doubles implement this trait.
///
/// # Event loop pseudocode
///
/// ```rust,ignore
/// fn on_animation_frame(now: HostTime) {
///     // Feed: coalesced scroll samples, expired timers
///     controller.on_frame(now);
///     for cmd in controller.advance(now) {
///         host.smooth_scroll(cmd.carousel, cmd.offset);
///     }
///
///     // Evaluate: drain dirty channels
///     let changes = controller.evaluate();
///
///     // Present: apply incremental changes
///     presenter.apply(&controller, &changes);
/// }
/// ```
pub trait Presenter {
    /// Applies the given [`PresentationChanges`], reading current values from
    /// `source` as needed.
    fn apply(&mut self, source: &dyn PresentationSource, changes: &PresentationChanges);
}
