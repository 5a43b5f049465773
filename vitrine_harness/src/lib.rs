// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic scenario driver for vitrine presentation controllers.
//!
//! The harness stands in for a browser: [`FixtureProbe`] answers environment
//! queries from values a test can change mid-scenario, [`VirtualClock`]
//! replaces `performance.now()`, and [`ScriptedHost`] plays the event loop,
//! firing timers at their exact deadlines, executing scroll commands and
//! recording everything a [`Presenter`](vitrine_core::backend::Presenter)
//! would have been asked to apply.

#![no_std]

extern crate alloc;

mod host;

pub use host::{PresentedState, RecordingPresenter, ScriptedHost, ScrollMode};

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use vitrine_core::probe::{EnvironmentProbe, StaticProbe};
use vitrine_core::time::{Duration, HostTime};

/// A shared, mutable [`StaticProbe`].
///
/// Clones share the same values, so a test can keep one handle while the
/// controller owns another and change the "device" between events.
#[derive(Clone, Debug, Default)]
pub struct FixtureProbe {
    inner: Rc<RefCell<StaticProbe>>,
}

impl FixtureProbe {
    /// Creates a probe answering from `values`.
    #[must_use]
    pub fn new(values: StaticProbe) -> Self {
        Self {
            inner: Rc::new(RefCell::new(values)),
        }
    }

    /// A probe reporting `width` CSS px and `cores` logical processors.
    #[must_use]
    pub fn device(width: f64, cores: u32) -> Self {
        Self::new(StaticProbe::with_width(width).with_concurrency(cores))
    }

    /// Changes the reported viewport width.
    pub fn set_width(&self, width: f64) {
        self.inner.borrow_mut().viewport_width = Some(width);
    }

    /// Changes the reported logical processor count.
    pub fn set_concurrency(&self, cores: Option<u32>) {
        self.inner.borrow_mut().hardware_concurrency = cores;
    }

    /// Changes the reported platform string.
    pub fn set_platform(&self, platform: Option<String>) {
        self.inner.borrow_mut().platform = platform;
    }

    /// Returns a copy of the current values.
    #[must_use]
    pub fn snapshot(&self) -> StaticProbe {
        self.inner.borrow().clone()
    }
}

impl EnvironmentProbe for FixtureProbe {
    fn viewport_width(&self) -> Option<f64> {
        self.inner.borrow().viewport_width
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        self.inner.borrow().hardware_concurrency
    }

    fn platform(&self) -> Option<String> {
        self.inner.borrow().platform.clone()
    }
}

/// A monotonic clock that only moves when told to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VirtualClock {
    now: HostTime,
}

impl VirtualClock {
    /// A clock starting at `start`.
    #[must_use]
    pub const fn starting_at(start: HostTime) -> Self {
        Self { now: start }
    }

    /// Current time.
    #[must_use]
    pub const fn now(&self) -> HostTime {
        self.now
    }

    /// Moves the clock forward by `by` and returns the new time.
    pub fn advance_by(&mut self, by: Duration) -> HostTime {
        self.now = self.now.saturating_add(by);
        self.now
    }

    /// Moves the clock to `to`. Earlier times are ignored.
    pub fn advance_to(&mut self, to: HostTime) -> HostTime {
        self.now = self.now.max(to);
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_probe_clones_share_values() {
        let probe = FixtureProbe::device(1440.0, 8);
        let held = probe.clone();
        probe.set_width(390.0);
        probe.set_concurrency(None);
        assert_eq!(held.viewport_width(), Some(390.0));
        assert_eq!(held.hardware_concurrency(), None);
        assert_eq!(held.snapshot().viewport_width, Some(390.0));
    }

    #[test]
    fn virtual_clock_is_monotonic() {
        let mut clock = VirtualClock::default();
        assert_eq!(clock.advance_by(Duration::from_millis(50)), HostTime::from_millis(50));
        assert_eq!(
            clock.advance_to(HostTime::from_millis(20)),
            HostTime::from_millis(50),
            "moving backwards must be ignored"
        );
        assert_eq!(clock.advance_to(HostTime::from_millis(80)), HostTime::from_millis(80));
    }
}
