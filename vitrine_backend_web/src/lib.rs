// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for vitrine.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebProbe`]: `window`/`navigator` environment probe
//! - [`DomPresenter`]: data-attribute and class updates
//! - [`FrameRequester`]: one-shot `requestAnimationFrame` requests
//! - [`TimeoutSlot`]: re-armable `setTimeout`
//! - [`Listener`]: event listener guard
//! - [`VisibilityObserver`]: `IntersectionObserver` wrapper
//! - [`WebHost`]: the event loop wiring all of the above to a
//!   [`PresentationController`](vitrine_core::controller::PresentationController)
//!
//! Every registration is an owned guard that releases itself on drop.

#![no_std]

extern crate alloc;

mod host;
mod listener;
pub mod observer;
mod presenter;
mod probe;
mod raf;
mod timeout;

pub use host::{VisualMount, WebHost};
pub use listener::Listener;
pub use observer::VisibilityObserver;
pub use presenter::{ACTIVE_DOT_CLASS, DomPresenter, HOVER_CLASS, VISIBLE_CLASS};
pub use probe::WebProbe;
pub use raf::FrameRequester;
pub use timeout::TimeoutSlot;
pub use vitrine_core::backend::Presenter;

use vitrine_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks, the same clock as
/// `requestAnimationFrame` timestamps.
#[must_use]
pub fn now() -> HostTime {
    raf::host_time_from_ms(raf::performance_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timestamps_are_microseconds() {
        assert_eq!(raf::host_time_from_ms(16.5), HostTime(16_500));
        assert_eq!(raf::host_time_from_ms(0.0), HostTime::ZERO);
    }

    #[test]
    fn bogus_timestamps_clamp_to_origin() {
        assert_eq!(raf::host_time_from_ms(-3.0), HostTime::ZERO);
        assert_eq!(raf::host_time_from_ms(f64::NAN), HostTime::ZERO);
    }
}
