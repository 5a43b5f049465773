// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `IntersectionObserver` wrapper and geometry fallback.
//!
//! [`VisibilityObserver`] reports `(BlockId, ratio)` pairs for observed
//! elements. Elements are tagged with a `data-vitrine-block` attribute so the
//! callback can map entries back to block ids without holding element
//! references.
//!
//! Hosts without `IntersectionObserver` can feed [`element_bounds`] and
//! [`viewport_bounds`] to
//! [`PresentationController::on_block_geometry`](vitrine_core::controller::PresentationController::on_block_geometry)
//! instead.

use alloc::boxed::Box;
use alloc::string::ToString;

use js_sys::Array;
use kurbo::Rect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, Window};

use vitrine_core::reveal::BlockId;

/// Attribute carrying the block id of an observed element.
pub const BLOCK_ATTRIBUTE: &str = "data-vitrine-block";

/// Thresholds that cover the reveal thresholds used by showcase blocks.
pub const DEFAULT_THRESHOLDS: [f64; 6] = [0.0, 0.2, 0.3, 0.5, 0.75, 1.0];

type EntriesClosure = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// Watches elements and reports their visible fraction.
///
/// Dropping the observer disconnects it.
pub struct VisibilityObserver {
    observer: IntersectionObserver,
    _closure: EntriesClosure,
}

impl VisibilityObserver {
    /// Creates an observer that fires at each of `thresholds`.
    ///
    /// Fails if the browser has no `IntersectionObserver`.
    pub fn new(
        thresholds: &[f64],
        mut callback: impl FnMut(BlockId, f64) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
            for entry in entries.iter() {
                let entry: IntersectionObserverEntry = entry.unchecked_into();
                if let Some(block) = block_id(&entry.target()) {
                    callback(block, entry.intersection_ratio());
                }
            }
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let list = Array::new();
        for &t in thresholds {
            list.push(&JsValue::from_f64(t));
        }
        let init = IntersectionObserverInit::new();
        init.set_threshold(&list);

        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)?;
        Ok(Self {
            observer,
            _closure: closure,
        })
    }

    /// Starts watching `element` as `block`.
    pub fn observe(&self, block: BlockId, element: &Element) -> Result<(), JsValue> {
        element.set_attribute(BLOCK_ATTRIBUTE, &block.0.to_string())?;
        self.observer.observe(element);
        Ok(())
    }

    /// Stops watching `element`.
    pub fn unobserve(&self, element: &Element) {
        self.observer.unobserve(element);
    }
}

impl Drop for VisibilityObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl core::fmt::Debug for VisibilityObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisibilityObserver").finish_non_exhaustive()
    }
}

/// Reads the block id tagged on `element`.
#[must_use]
pub fn block_id(element: &Element) -> Option<BlockId> {
    element
        .get_attribute(BLOCK_ATTRIBUTE)?
        .parse()
        .ok()
        .map(BlockId)
}

/// The element's border box in viewport coordinates.
#[must_use]
pub fn element_bounds(element: &Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.right(), r.bottom())
}

/// The layout viewport in viewport coordinates.
pub fn viewport_bounds(window: &Window) -> Result<Rect, JsValue> {
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(Rect::new(0.0, 0.0, width, height))
}
