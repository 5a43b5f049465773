// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The [controller](crate::controller::PresentationController) records every
//! observable change on one of these channels (via [`understory_dirty`]) and
//! drains them all in [`evaluate`](crate::controller::PresentationController::evaluate).
//! The result is a [`PresentationChanges`](crate::backend::PresentationChanges)
//! that a [`Presenter`](crate::backend::Presenter) applies incrementally.
//!
//! Keys are small integers local to each channel:
//!
//! - [`TIER`], [`LOADER`] and [`HOVER`] use the single key [`PAGE`].
//! - [`INDEX`] is keyed by [`CarouselId`](crate::carousel::CarouselId).
//! - [`REVEAL`] is keyed by [`BlockId`](crate::reveal::BlockId).
//!
//! No channel propagates; there are no dependency edges between keys.

use understory_dirty::Channel;

/// Key used by page-wide channels.
pub const PAGE: u32 = 0;

/// The active render tier changed.
pub const TIER: Channel = Channel::new(0);

/// The deferred loader changed state or visual.
pub const LOADER: Channel = Channel::new(1);

/// A carousel's current index changed.
pub const INDEX: Channel = Channel::new(2);

/// A content block fired its reveal.
pub const REVEAL: Channel = Channel::new(3);

/// Hover affordances were enabled or disabled.
pub const HOVER: Channel = Channel::new(4);
