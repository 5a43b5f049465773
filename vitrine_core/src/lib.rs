// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive presentation state for showcase pages.
//!
//! `vitrine_core` decides how heavy a page's visuals may be on the running
//! device, when the heavy part may mount, and keeps scroll-snap carousels and
//! entrance reveals consistent with user input. It is `no_std` compatible
//! (with `alloc`), never reads a clock or the DOM itself, and is driven
//! entirely by host events plus a monotonic [`HostTime`](time::HostTime).
//!
//! # Architecture
//!
//! ```text
//!   EnvironmentProbe ──► Classifier ──► DeviceProfile
//!                                           │
//!                                           ▼
//!                          TierPolicy::select() ──► TierGovernor
//!                                                       │
//!                 ┌─────────────────────────────────────┘
//!                 ▼
//!   DeferredLoader ◄── TimerQueue ──► CarouselEngine ◄── scroll / frames
//!                 │                        │
//!                 └────────┬───────────────┘   VisibilityTrigger ◄── intersections
//!                          ▼                        │
//!   PresentationController::evaluate() ◄────────────┘
//!                          │
//!                          ▼
//!   PresentationChanges ──► Presenter::apply()
//! ```
//!
//! **[`device`]** / **[`probe`]**: environment reads through an injected
//! [`EnvironmentProbe`](probe::EnvironmentProbe), classified into a
//! [`DeviceProfile`](device::DeviceProfile).
//!
//! **[`tier`]**: the pure profile → [`RenderTier`](tier::RenderTier) mapping
//! with per-tier mount delays, plus promotion hysteresis.
//!
//! **[`loader`]** / **[`scene`]**: the deferred `Idle → Ready → Mounted`
//! loader and the per-tier scene settings it hands out.
//!
//! **[`carousel`]** / **[`throttle`]**: scroll-offset ↔ index synchronization
//! with per-frame coalescing and optimistic programmatic navigation.
//!
//! **[`reveal`]**: one-shot viewport reveals.
//!
//! **[`timer`]** / **[`time`]**: cancellable one-shot timers on a host-driven
//! clock.
//!
//! **[`controller`]**: the owner that wires everything together for one
//! mount; tearing it down cancels every timer.
//!
//! **[`dirty`]** / **[`backend`]**: change tracking via `understory_dirty` and
//! the [`Presenter`](backend::Presenter) contract for host backends.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod carousel;
pub mod controller;
pub mod device;
pub mod dirty;
pub mod loader;
pub mod probe;
pub mod reveal;
pub mod scene;
pub mod throttle;
pub mod tier;
pub mod time;
pub mod timer;
pub mod trace;
