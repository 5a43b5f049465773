// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Environment probe backed by `window` and `navigator`.

use alloc::string::String;

use web_sys::Window;

use vitrine_core::probe::EnvironmentProbe;

/// Reads classification signals from the browser.
///
/// Every query degrades to `None` when the browser throws or does not expose
/// the value, so the classifier falls back to its defaults.
#[derive(Clone, Debug)]
pub struct WebProbe {
    window: Window,
}

impl WebProbe {
    /// Creates a probe over `window`.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    /// The probed window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl EnvironmentProbe for WebProbe {
    fn viewport_width(&self) -> Option<f64> {
        self.window.inner_width().ok()?.as_f64()
    }

    fn hardware_concurrency(&self) -> Option<u32> {
        let cores = self.window.navigator().hardware_concurrency();
        // Absent on some browsers, in which case the binding yields 0 or NaN.
        if cores.is_finite() && cores >= 1.0 {
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "finite positive core count; clamped to u32 range"
            )]
            let cores = cores.min(f64::from(u32::MAX)) as u32;
            Some(cores)
        } else {
            None
        }
    }

    fn platform(&self) -> Option<String> {
        self.window.navigator().user_agent().ok()
    }
}
