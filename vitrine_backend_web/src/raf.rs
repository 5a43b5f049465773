// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot `requestAnimationFrame` requests.
//!
//! [`FrameRequester`] asks the browser for a single animation frame at a
//! time. Scroll handlers call [`request`](FrameRequester::request) whenever
//! the controller reports
//! [`FrameRequest::Needed`](vitrine_core::throttle::FrameRequest::Needed);
//! repeated requests before the frame runs collapse into one callback.
//!
//! Each callback receives a [`DOMHighResTimeStamp`][mdn] (milliseconds from
//! `performance.now()`), which is converted to microsecond
//! [`HostTime`](vitrine_core::time::HostTime) ticks.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use vitrine_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods: avoids
// fetching (and unwrapping) the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// Converts a `DOMHighResTimeStamp` in milliseconds to [`HostTime`].
pub(crate) fn host_time_from_ms(ms: f64) -> HostTime {
    HostTime::from_millis_f64(ms)
}

/// Requests single animation frames on demand.
///
/// The JS closure is created once and reused for every request, so it is
/// never dropped while the browser may still call it. Dropping the requester
/// cancels an outstanding frame.
pub struct FrameRequester {
    inner: Rc<FrameInner>,
}

type FrameClosure = Closure<dyn FnMut(f64)>;

struct FrameInner {
    /// The JS closure registered with `requestAnimationFrame`.
    closure: RefCell<Option<FrameClosure>>,

    /// The ID of the outstanding request, if any.
    raf_id: Cell<Option<i32>>,

    /// Frames delivered so far.
    frame_counter: Cell<u64>,
}

impl FrameRequester {
    /// Creates a requester that calls `callback` with the frame time each
    /// time a requested frame runs.
    pub fn new(mut callback: impl FnMut(HostTime) + 'static) -> Self {
        let inner = Rc::new(FrameInner {
            closure: RefCell::new(None),
            raf_id: Cell::new(None),
            frame_counter: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            // Cleared first so the callback may request the next frame.
            if inner.raf_id.take().is_none() {
                return;
            }
            inner.frame_counter.set(inner.frame_counter.get() + 1);
            callback(host_time_from_ms(timestamp_ms));
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Requests a frame. No-op if one is already outstanding.
    pub fn request(&self) {
        if self.inner.raf_id.get().is_some() {
            return;
        }
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(Some(id));
        }
    }

    /// Cancels the outstanding frame, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.raf_id.take() {
            cancel_animation_frame(id);
        }
    }

    /// Returns `true` if a frame is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.raf_id.get().is_some()
    }
}

impl Drop for FrameRequester {
    fn drop(&mut self) {
        self.cancel();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for FrameRequester {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameRequester")
            .field("pending", &self.is_pending())
            .field("frame_counter", &self.inner.frame_counter.get())
            .finish()
    }
}
