// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in milliseconds.

use std::io::Write;

use vitrine_core::carousel::ScrollPhase;
use vitrine_core::time::{Duration, HostTime};
use vitrine_core::trace::{
    ClassifyEvent, CoalesceEvent, IndexEvent, LoaderEvent, RevealEvent, ScrollPhaseEvent,
    TeardownEvent, TierEvent, TimerEvent, TimerPurpose, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn timer(&mut self, verb: &str, e: &TimerEvent) {
        let _ = writeln!(
            self.writer,
            "[timer:{verb}] {:.1}ms #{} {} deadline={:.1}ms",
            ms(e.at),
            e.timer.get(),
            purpose(e.purpose),
            ms(e.deadline),
        );
    }

    fn tier(&mut self, verb: &str, e: &TierEvent) {
        let from = e.from.map_or("-", |t| t.as_str());
        let _ = writeln!(
            self.writer,
            "[tier:{verb}] {:.1}ms {from} -> {} ({}, delay={:.1}ms)",
            ms(e.at),
            e.to.as_str(),
            e.width_class.as_str(),
            span_ms(e.mount_delay),
        );
    }
}

fn ms(t: HostTime) -> f64 {
    t.ticks() as f64 / 1000.0
}

fn span_ms(d: Duration) -> f64 {
    d.ticks() as f64 / 1000.0
}

fn purpose(p: TimerPurpose) -> String {
    match p {
        TimerPurpose::Mount | TimerPurpose::ResizeDebounce => p.as_str().to_owned(),
        TimerPurpose::AutoAdvance(c) | TimerPurpose::ScrollSettle(c) => {
            format!("{}[{}]", p.as_str(), c.0)
        }
    }
}

fn phase_name(phase: ScrollPhase) -> &'static str {
    match phase {
        ScrollPhase::Idle => "idle",
        ScrollPhase::UserScrolling => "user",
        ScrollPhase::ProgrammaticScrolling => "programmatic",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_classify(&mut self, e: &ClassifyEvent) {
        let _ = writeln!(
            self.writer,
            "[classify] {:.1}ms width={} cores={} signals={}",
            ms(e.at),
            e.width_class.as_str(),
            e.concurrency_hint,
            e.signal_count,
        );
    }

    fn on_tier_selected(&mut self, e: &TierEvent) {
        self.tier("selected", e);
    }

    fn on_tier_held(&mut self, e: &TierEvent) {
        self.tier("held", e);
    }

    fn on_loader(&mut self, e: &LoaderEvent) {
        let _ = writeln!(
            self.writer,
            "[loader] {:.1}ms {} -> {} tier={}",
            ms(e.at),
            e.from.as_str(),
            e.to.as_str(),
            e.tier.as_str(),
        );
    }

    fn on_timer_scheduled(&mut self, e: &TimerEvent) {
        self.timer("scheduled", e);
    }

    fn on_timer_fired(&mut self, e: &TimerEvent) {
        self.timer("fired", e);
    }

    fn on_timer_cancelled(&mut self, e: &TimerEvent) {
        self.timer("cancelled", e);
    }

    fn on_index(&mut self, e: &IndexEvent) {
        let _ = writeln!(
            self.writer,
            "[index] {:.1}ms carousel={} {} -> {} ({:?})",
            ms(e.at),
            e.carousel.0,
            e.from,
            e.to,
            e.source,
        );
    }

    fn on_scroll_phase(&mut self, e: &ScrollPhaseEvent) {
        let _ = writeln!(
            self.writer,
            "[scroll] {:.1}ms carousel={} {} -> {}",
            ms(e.at),
            e.carousel.0,
            phase_name(e.from),
            phase_name(e.to),
        );
    }

    fn on_coalesce(&mut self, e: &CoalesceEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] {:.1}ms carousel={} samples={}",
            ms(e.at),
            e.carousel.0,
            e.samples,
        );
    }

    fn on_reveal(&mut self, e: &RevealEvent) {
        let _ = writeln!(
            self.writer,
            "[reveal] {:.1}ms block={} ratio={:.2} delay={:.1}ms",
            ms(e.at),
            e.block.0,
            e.ratio,
            span_ms(e.delay),
        );
    }

    fn on_teardown(&mut self, e: &TeardownEvent) {
        let _ = writeln!(
            self.writer,
            "[teardown] {:.1}ms cancelled={}",
            ms(e.at),
            e.cancelled_timers,
        );
    }
}
