// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Re-armable `setTimeout` guard.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use vitrine_core::time::Duration;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// A single browser timeout that can be re-armed with a new delay.
///
/// The host arms it for the controller's next deadline after every event.
/// Arming replaces any pending timeout; dropping the slot clears it.
pub struct TimeoutSlot {
    inner: Rc<TimeoutInner>,
}

struct TimeoutInner {
    closure: RefCell<Option<Closure<dyn FnMut()>>>,
    handle: Cell<Option<i32>>,
}

impl TimeoutSlot {
    /// Creates an unarmed slot that calls `callback` when it expires.
    pub fn new(mut callback: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(TimeoutInner {
            closure: RefCell::new(None),
            handle: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.handle.take().is_none() {
                return;
            }
            callback();
        }) as Box<dyn FnMut()>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Arms the slot to fire after `delay`, replacing any pending timeout.
    pub fn arm(&self, delay: Duration) {
        self.clear();
        // Rounded up so the timeout never fires before the deadline. Browsers
        // treat delays past `i32::MAX` as zero.
        let delay_ms = i32::try_from(delay.ticks().div_ceil(1_000)).unwrap_or(i32::MAX);
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = set_timeout(closure.as_ref().unchecked_ref(), delay_ms);
            self.inner.handle.set(Some(id));
        }
    }

    /// Clears the pending timeout, if any.
    pub fn clear(&self) {
        if let Some(id) = self.inner.handle.take() {
            clear_timeout(id);
        }
    }

    /// Returns `true` if a timeout is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.inner.handle.get().is_some()
    }
}

impl Drop for TimeoutSlot {
    fn drop(&mut self) {
        self.clear();
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for TimeoutSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeoutSlot")
            .field("armed", &self.is_armed())
            .finish()
    }
}
