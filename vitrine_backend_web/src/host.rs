// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser event loop for a [`PresentationController`].
//!
//! [`WebHost`] owns the controller together with every browser registration
//! feeding it: the resize listener, per-carousel scroll and input listeners,
//! pagination dot clicks, the intersection observer, one re-armable timeout
//! for the controller's next deadline and one animation-frame requester.
//! Callbacks hold weak references, so dropping the host (or calling
//! [`WebHost::unmount`]) releases everything.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, ScrollBehavior, ScrollToOptions, Window};

use vitrine_core::backend::{PresentationChanges, Presenter as _, ScrollCommand};
use vitrine_core::carousel::{CarouselId, ScrollSample};
use vitrine_core::controller::{CarouselConfig, ControllerConfig, PresentationController, Teardown};
use vitrine_core::loader::{LoaderState, Visual};
use vitrine_core::reveal::{BlockId, RevealSpec};
use vitrine_core::throttle::FrameRequest;
use vitrine_core::time::HostTime;
use vitrine_core::trace::{NoopSink, TraceSink};

use crate::listener::Listener;
use crate::observer::{DEFAULT_THRESHOLDS, VisibilityObserver, element_bounds, viewport_bounds};
use crate::presenter::DomPresenter;
use crate::probe::WebProbe;
use crate::raf::FrameRequester;
use crate::timeout::TimeoutSlot;

/// Mounts the heavy visual into the slot element.
///
/// Called once the loader is ready for an animated tier; returning `Ok`
/// reports the visual as mounted. After that it is called again only when
/// the visual changes under a mounted loader (new scene settings or the
/// static asset after a demotion).
pub type VisualMount = Box<dyn FnMut(&Visual, &HtmlElement) -> Result<(), JsValue>>;

/// Input events that hand a carousel back to the user.
const USER_INPUT_EVENTS: [&str; 3] = ["wheel", "touchstart", "pointerdown"];

struct Shared<S: TraceSink> {
    controller: PresentationController<WebProbe, S>,
    presenter: DomPresenter,
    changes: PresentationChanges,
    timeout: Option<TimeoutSlot>,
    frames: Option<FrameRequester>,
    observer: Option<VisibilityObserver>,
    listeners: Vec<Listener>,
    visual_mount: Option<VisualMount>,
    mount_error: Option<JsValue>,
}

/// Drives a [`PresentationController`] from browser events.
pub struct WebHost<S: TraceSink + 'static = NoopSink> {
    shared: Rc<RefCell<Shared<S>>>,
}

impl<S: TraceSink + 'static> core::fmt::Debug for WebHost<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut d = f.debug_struct("WebHost");
        if let Ok(s) = self.shared.try_borrow() {
            d.field("controller", &s.controller)
                .field("listeners", &s.listeners.len())
                .field("observer", &s.observer.is_some());
        }
        d.finish_non_exhaustive()
    }
}

impl WebHost<NoopSink> {
    /// Mounts a host without tracing.
    pub fn mount(window: Window, root: HtmlElement, config: ControllerConfig) -> Result<Self, JsValue> {
        Self::mount_with_sink(window, root, config, NoopSink)
    }
}

impl<S: TraceSink + 'static> WebHost<S> {
    /// Mounts a host: classifies the device from `window`, writes the initial
    /// state onto `root` and subscribes to resize events.
    pub fn mount_with_sink(
        window: Window,
        root: HtmlElement,
        config: ControllerConfig,
        sink: S,
    ) -> Result<Self, JsValue> {
        let controller =
            PresentationController::mount_with_sink(WebProbe::new(window.clone()), config, sink, crate::now());
        let shared = Rc::new(RefCell::new(Shared {
            controller,
            presenter: DomPresenter::new(root),
            changes: PresentationChanges::default(),
            timeout: None,
            frames: None,
            observer: None,
            listeners: Vec::new(),
            visual_mount: None,
            mount_error: None,
        }));
        let weak = Rc::downgrade(&shared);

        let timeout = TimeoutSlot::new({
            let weak = weak.clone();
            move || with_shared(&weak, |s| s.fire_timers(crate::now()))
        });
        let frames = FrameRequester::new({
            let weak = weak.clone();
            move |now| {
                with_shared(&weak, |s| {
                    s.controller.on_frame(now);
                    s.sync(now);
                });
            }
        });
        let observer = VisibilityObserver::new(&DEFAULT_THRESHOLDS, {
            let weak = weak.clone();
            move |block, ratio| {
                with_shared(&weak, |s| {
                    let now = crate::now();
                    let _ = s.controller.on_intersection(block, ratio, now);
                    s.sync(now);
                });
            }
        })
        .ok();

        let mut listeners = Vec::new();
        listeners.push(Listener::new(&window, "resize", {
            let weak = weak.clone();
            move |_| {
                with_shared(&weak, |s| {
                    let now = crate::now();
                    s.refresh_scroll_widths();
                    s.controller.on_resize(now);
                    s.sync(now);
                });
            }
        })?);
        if observer.is_none() {
            // No IntersectionObserver: measure blocks on every page scroll.
            listeners.push(Listener::new(&window, "scroll", {
                let weak = weak.clone();
                move |_| with_shared(&weak, |s| s.measure_blocks(crate::now()))
            })?);
        }

        {
            let mut s = shared.borrow_mut();
            s.timeout = Some(timeout);
            s.frames = Some(frames);
            s.observer = observer;
            s.listeners = listeners;
            s.sync(crate::now());
        }
        Ok(Self { shared })
    }

    /// Sets the element hosting the heavy visual and the function that
    /// mounts it.
    pub fn set_visual_slot(
        &self,
        slot: HtmlElement,
        mount: impl FnMut(&Visual, &HtmlElement) -> Result<(), JsValue> + 'static,
    ) {
        let mut s = self.shared.borrow_mut();
        s.presenter.set_visual_slot(slot);
        let visual = s.controller.visual();
        s.presenter.apply_visual(visual);
        s.visual_mount = Some(Box::new(mount));
        s.sync(crate::now());
    }

    /// Registers a scroll-snap carousel.
    ///
    /// `dots[i]` navigates to item `i` when clicked. Returns `Ok(false)` if
    /// `id` is already registered.
    pub fn add_carousel(
        &self,
        id: CarouselId,
        container: HtmlElement,
        dots: Vec<HtmlElement>,
        config: CarouselConfig,
    ) -> Result<bool, JsValue> {
        let weak = Rc::downgrade(&self.shared);
        let mut s = self.shared.borrow_mut();
        let now = crate::now();
        if !s.controller.add_carousel(id, config, now) {
            return Ok(false);
        }
        s.controller
            .set_scroll_width(id, px(container.scroll_width()));

        s.listeners.push(Listener::new(&container, "scroll", {
            let weak = weak.clone();
            let container = container.clone();
            move |_| {
                with_shared(&weak, |s| {
                    let sample = ScrollSample {
                        offset: px(container.scroll_left()),
                        scroll_width: px(container.scroll_width()),
                    };
                    if s.controller.on_scroll(id, sample) == Some(FrameRequest::Needed)
                        && let Some(frames) = &s.frames
                    {
                        frames.request();
                    }
                });
            }
        })?);
        s.listeners.push(Listener::new(&container, "scrollend", {
            let weak = weak.clone();
            move |_| {
                with_shared(&weak, |s| {
                    let now = crate::now();
                    s.controller.on_scroll_end(id, now);
                    s.sync(now);
                });
            }
        })?);
        for event_type in USER_INPUT_EVENTS {
            s.listeners.push(Listener::new(&container, event_type, {
                let weak = weak.clone();
                move |_| {
                    with_shared(&weak, |s| {
                        let now = crate::now();
                        s.controller.on_user_input(id, now);
                        s.sync(now);
                    });
                }
            })?);
        }
        for (index, dot) in dots.iter().enumerate() {
            s.listeners.push(Listener::new(dot, "click", {
                let weak = weak.clone();
                move |_| with_shared(&weak, |s| s.go_to_index(id, index, crate::now()))
            })?);
        }

        s.presenter.add_carousel(id, container, dots);
        s.sync(now);
        Ok(true)
    }

    /// Watches `element` as `block` for its one-shot reveal.
    pub fn observe(&self, block: BlockId, element: HtmlElement, spec: RevealSpec) -> Result<bool, JsValue> {
        let mut s = self.shared.borrow_mut();
        if !s.controller.observe(block, spec) {
            return Ok(false);
        }
        if let Some(observer) = &s.observer {
            observer.observe(block, &element)?;
        }
        s.presenter.add_block(block, element);
        if s.observer.is_none() {
            s.measure_blocks(crate::now());
        }
        Ok(true)
    }

    /// Navigates a carousel, as a pagination control would.
    pub fn go_to_index(&self, id: CarouselId, index: usize) {
        self.shared.borrow_mut().go_to_index(id, index, crate::now());
    }

    /// Runs `f` against the controller.
    pub fn with_controller<R>(&self, f: impl FnOnce(&PresentationController<WebProbe, S>) -> R) -> R {
        f(&self.shared.borrow().controller)
    }

    /// Takes the error returned by the visual mount function, if it failed.
    pub fn take_mount_error(&self) -> Option<JsValue> {
        self.shared.borrow_mut().mount_error.take()
    }

    /// Releases every browser registration, then unmounts the controller.
    ///
    /// Fails only if called from inside one of the host's own callbacks.
    pub fn unmount(self) -> Result<Teardown<S>, JsValue> {
        let shared = Rc::try_unwrap(self.shared)
            .map_err(|_| JsValue::from_str("vitrine host is busy"))?
            .into_inner();
        let Shared {
            controller,
            presenter,
            timeout,
            frames,
            observer,
            listeners,
            ..
        } = shared;
        drop(listeners);
        drop(observer);
        drop(frames);
        drop(timeout);
        drop(presenter);
        Ok(controller.unmount(crate::now()))
    }
}

impl<S: TraceSink> Shared<S> {
    fn fire_timers(&mut self, now: HostTime) {
        self.refresh_scroll_widths();
        for command in self.controller.advance(now) {
            self.execute(command);
        }
        self.sync(now);
    }

    fn go_to_index(&mut self, id: CarouselId, index: usize, now: HostTime) {
        self.refresh_scroll_widths();
        if let Some(command) = self.controller.go_to_index(id, index, now) {
            self.execute(command);
        }
        self.sync(now);
    }

    /// Re-reads every container's scroll width, which changes with the
    /// viewport even when nothing scrolls.
    fn refresh_scroll_widths(&mut self) {
        for (id, container) in self.presenter.carousel_containers() {
            self.controller.set_scroll_width(id, px(container.scroll_width()));
        }
    }

    fn execute(&self, command: ScrollCommand) {
        let Some(container) = self.presenter.carousel_container(command.carousel) else {
            return;
        };
        let options = ScrollToOptions::new();
        options.set_left(command.offset);
        options.set_behavior(ScrollBehavior::Smooth);
        container.scroll_to_with_scroll_to_options(&options);
    }

    fn measure_blocks(&mut self, now: HostTime) {
        let Ok(viewport) = viewport_bounds(self.controller.probe().window()) else {
            return;
        };
        let pending: Vec<(BlockId, kurbo::Rect)> = self
            .presenter
            .blocks()
            .filter(|(block, _)| !self.controller.has_fired(*block))
            .map(|(block, el)| (block, element_bounds(el)))
            .collect();
        for (block, bounds) in pending {
            let _ = self.controller.on_block_geometry(block, bounds, viewport, now);
        }
        self.sync(now);
    }

    /// Presents drained changes, mounts the heavy visual when it is due and
    /// re-arms the timeout for the next deadline.
    fn sync(&mut self, now: HostTime) {
        self.present();

        let swapped = self.changes.loader && self.controller.loader_state() == LoaderState::Mounted;
        if (self.controller.wants_heavy_mount() || swapped)
            && let (Some(mount), Some(slot)) = (&mut self.visual_mount, self.presenter.visual_slot())
        {
            match mount(&self.controller.visual(), slot) {
                Ok(()) => {
                    let _ = self.controller.mark_visual_mounted(now);
                }
                Err(err) => {
                    self.visual_mount = None;
                    self.mount_error = Some(err);
                }
            }
            self.present();
        }

        if let Some(timeout) = &self.timeout {
            match self.controller.next_deadline() {
                Some(deadline) => timeout.arm(deadline.saturating_duration_since(now)),
                None => timeout.clear(),
            }
        }
    }

    fn present(&mut self) {
        self.controller.evaluate_into(&mut self.changes);
        if self.changes.is_empty() {
            return;
        }
        self.presenter.apply(&self.controller, &self.changes);

        // Revealed blocks are done; stop watching them.
        for block in &self.changes.revealed {
            let Some(element) = self.presenter.remove_block(*block) else {
                continue;
            };
            if let Some(observer) = &self.observer {
                observer.unobserve(&element);
            }
        }
    }
}

/// Runs `f` if the host is still alive and not already inside a callback.
fn with_shared<S: TraceSink>(weak: &Weak<RefCell<Shared<S>>>, f: impl FnOnce(&mut Shared<S>)) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let Ok(mut s) = shared.try_borrow_mut() else {
        return;
    };
    f(&mut s);
}

/// DOM scroll metrics are `i32` or `f64` depending on the property.
fn px(value: impl Into<f64>) -> f64 {
    value.into()
}
