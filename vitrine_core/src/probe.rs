// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Environment queries behind an injectable capability.
//!
//! The [`Classifier`](crate::device::Classifier) never reads ambient globals.
//! Hosts hand it an [`EnvironmentProbe`]: the web backend implements one on
//! top of `window`/`navigator`, tests and server-side hosts use
//! [`StaticProbe`].
//!
//! Every query is optional. A probe that cannot answer returns `None` and the
//! classifier substitutes a safe default.

use alloc::string::String;

/// Read-only access to the signals the classifier needs.
///
/// Implementations must be cheap: the classifier calls every method on each
/// debounced resize.
pub trait EnvironmentProbe {
    /// Current layout viewport width in CSS pixels.
    fn viewport_width(&self) -> Option<f64>;

    /// Number of logical processors reported by the host, if exposed.
    fn hardware_concurrency(&self) -> Option<u32>;

    /// Coarse platform identifier (for browsers, the user-agent string).
    fn platform(&self) -> Option<String>;
}

impl<P: EnvironmentProbe + ?Sized> EnvironmentProbe for &P {
    fn viewport_width(&self) -> Option<f64> {
        (**self).viewport_width()
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        (**self).hardware_concurrency()
    }

    fn platform(&self) -> Option<String> {
        (**self).platform()
    }
}

/// A probe that answers from fixed values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticProbe {
    /// Reported viewport width.
    pub viewport_width: Option<f64>,
    /// Reported logical processor count.
    pub hardware_concurrency: Option<u32>,
    /// Reported platform identifier.
    pub platform: Option<String>,
}

impl StaticProbe {
    /// A probe with only a viewport width; the other signals are unavailable.
    #[must_use]
    pub const fn with_width(width: f64) -> Self {
        Self {
            viewport_width: Some(width),
            hardware_concurrency: None,
            platform: None,
        }
    }

    /// Sets the logical processor count.
    #[must_use]
    pub fn with_concurrency(mut self, cores: u32) -> Self {
        self.hardware_concurrency = Some(cores);
        self
    }

    /// Sets the platform identifier.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

impl EnvironmentProbe for StaticProbe {
    fn viewport_width(&self) -> Option<f64> {
        self.viewport_width
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        self.hardware_concurrency
    }

    fn platform(&self) -> Option<String> {
        self.platform.clone()
    }
}
