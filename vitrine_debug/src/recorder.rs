// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use vitrine_core::carousel::{CarouselId, IndexSource, ScrollPhase};
use vitrine_core::device::WidthClass;
use vitrine_core::loader::LoaderState;
use vitrine_core::reveal::BlockId;
use vitrine_core::tier::RenderTier;
use vitrine_core::time::{Duration, HostTime};
use vitrine_core::timer::TimerId;
use vitrine_core::trace::{
    ClassifyEvent, CoalesceEvent, IndexEvent, LoaderEvent, RevealEvent, ScrollPhaseEvent,
    TeardownEvent, TierEvent, TimerEvent, TimerPurpose, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CLASSIFY: u8 = 1;
const TAG_TIER_SELECTED: u8 = 2;
const TAG_TIER_HELD: u8 = 3;
const TAG_LOADER: u8 = 4;
const TAG_TIMER_SCHEDULED: u8 = 5;
const TAG_TIMER_FIRED: u8 = 6;
const TAG_TIMER_CANCELLED: u8 = 7;
const TAG_INDEX: u8 = 8;
const TAG_SCROLL_PHASE: u8 = 9;
const TAG_COALESCE: u8 = 10;
const TAG_REVEAL: u8 = 11;
const TAG_TEARDOWN: u8 = 12;

/// Marker for an absent [`RenderTier`].
const NO_TIER: u8 = 0xff;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Decodes everything recorded so far.
    pub fn events(&self) -> DecodeIter<'_> {
        decode(&self.buf)
    }

    /// Index changes recorded for `carousel`, as `(from, to, source)`.
    #[must_use]
    pub fn index_changes(&self, carousel: CarouselId) -> Vec<(usize, usize, IndexSource)> {
        self.events()
            .filter_map(|event| match event {
                RecordedEvent::Index(e) if e.carousel == carousel => Some((e.from, e.to, e.source)),
                _ => None,
            })
            .collect()
    }

    /// Tiers in the order they took effect.
    #[must_use]
    pub fn tiers(&self) -> Vec<RenderTier> {
        self.events()
            .filter_map(|event| match event {
                RecordedEvent::TierSelected(e) => Some(e.to),
                _ => None,
            })
            .collect()
    }

    /// Purposes of the timers that fired, in firing order.
    #[must_use]
    pub fn fired_timers(&self) -> Vec<TimerPurpose> {
        self.events()
            .filter_map(|event| match event {
                RecordedEvent::TimerFired(e) => Some(e.purpose),
                _ => None,
            })
            .collect()
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_usize(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.ticks());
    }

    fn write_tier(&mut self, tier: Option<RenderTier>) {
        self.write_u8(match tier {
            Some(RenderTier::Full) => 0,
            Some(RenderTier::Reduced) => 1,
            Some(RenderTier::StaticFallback) => 2,
            None => NO_TIER,
        });
    }

    fn write_width(&mut self, w: WidthClass) {
        self.write_u8(match w {
            WidthClass::Narrow => 0,
            WidthClass::Wide => 1,
        });
    }

    fn write_loader(&mut self, s: LoaderState) {
        self.write_u8(match s {
            LoaderState::Idle => 0,
            LoaderState::Ready => 1,
            LoaderState::Mounted => 2,
        });
    }

    fn write_phase(&mut self, p: ScrollPhase) {
        self.write_u8(match p {
            ScrollPhase::Idle => 0,
            ScrollPhase::UserScrolling => 1,
            ScrollPhase::ProgrammaticScrolling => 2,
        });
    }

    fn write_purpose(&mut self, p: TimerPurpose) {
        let (tag, carousel) = match p {
            TimerPurpose::Mount => (0, 0),
            TimerPurpose::ResizeDebounce => (1, 0),
            TimerPurpose::AutoAdvance(c) => (2, c.0),
            TimerPurpose::ScrollSettle(c) => (3, c.0),
        };
        self.write_u8(tag);
        self.write_u32(carousel);
    }

    fn write_tier_event(&mut self, tag: u8, e: &TierEvent) {
        self.write_u8(tag);
        self.write_time(e.at);
        self.write_tier(e.from);
        self.write_tier(Some(e.to));
        self.write_u64(e.mount_delay.ticks());
        self.write_width(e.width_class);
    }

    fn write_timer_event(&mut self, tag: u8, e: &TimerEvent) {
        self.write_u8(tag);
        self.write_time(e.at);
        self.write_u64(e.timer.get());
        self.write_purpose(e.purpose);
        self.write_time(e.deadline);
    }
}

impl TraceSink for RecorderSink {
    fn on_classify(&mut self, e: &ClassifyEvent) {
        self.write_u8(TAG_CLASSIFY);
        self.write_time(e.at);
        self.write_width(e.width_class);
        self.write_u32(e.concurrency_hint);
        self.write_u32(e.signal_count);
    }

    fn on_tier_selected(&mut self, e: &TierEvent) {
        self.write_tier_event(TAG_TIER_SELECTED, e);
    }

    fn on_tier_held(&mut self, e: &TierEvent) {
        self.write_tier_event(TAG_TIER_HELD, e);
    }

    fn on_loader(&mut self, e: &LoaderEvent) {
        self.write_u8(TAG_LOADER);
        self.write_time(e.at);
        self.write_loader(e.from);
        self.write_loader(e.to);
        self.write_tier(Some(e.tier));
    }

    fn on_timer_scheduled(&mut self, e: &TimerEvent) {
        self.write_timer_event(TAG_TIMER_SCHEDULED, e);
    }

    fn on_timer_fired(&mut self, e: &TimerEvent) {
        self.write_timer_event(TAG_TIMER_FIRED, e);
    }

    fn on_timer_cancelled(&mut self, e: &TimerEvent) {
        self.write_timer_event(TAG_TIMER_CANCELLED, e);
    }

    fn on_index(&mut self, e: &IndexEvent) {
        self.write_u8(TAG_INDEX);
        self.write_time(e.at);
        self.write_u32(e.carousel.0);
        self.write_usize(e.from);
        self.write_usize(e.to);
        self.write_u8(match e.source {
            IndexSource::Scroll => 0,
            IndexSource::Navigation => 1,
            IndexSource::AutoAdvance => 2,
        });
    }

    fn on_scroll_phase(&mut self, e: &ScrollPhaseEvent) {
        self.write_u8(TAG_SCROLL_PHASE);
        self.write_time(e.at);
        self.write_u32(e.carousel.0);
        self.write_phase(e.from);
        self.write_phase(e.to);
    }

    fn on_coalesce(&mut self, e: &CoalesceEvent) {
        self.write_u8(TAG_COALESCE);
        self.write_time(e.at);
        self.write_u32(e.carousel.0);
        self.write_u32(e.samples);
    }

    fn on_reveal(&mut self, e: &RevealEvent) {
        self.write_u8(TAG_REVEAL);
        self.write_time(e.at);
        self.write_u32(e.block.0);
        self.write_u64(e.ratio.to_bits());
        self.write_u64(e.delay.ticks());
    }

    fn on_teardown(&mut self, e: &TeardownEvent) {
        self.write_u8(TAG_TEARDOWN);
        self.write_time(e.at);
        self.write_u32(e.cancelled_timers);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`ClassifyEvent`].
    Classify(ClassifyEvent),
    /// A [`TierEvent`] for a tier that took effect.
    TierSelected(TierEvent),
    /// A [`TierEvent`] for a held promotion.
    TierHeld(TierEvent),
    /// A [`LoaderEvent`].
    Loader(LoaderEvent),
    /// A [`TimerEvent`] for a scheduled timer.
    TimerScheduled(TimerEvent),
    /// A [`TimerEvent`] for a fired timer.
    TimerFired(TimerEvent),
    /// A [`TimerEvent`] for a cancelled timer.
    TimerCancelled(TimerEvent),
    /// An [`IndexEvent`].
    Index(IndexEvent),
    /// A [`ScrollPhaseEvent`].
    ScrollPhase(ScrollPhaseEvent),
    /// A [`CoalesceEvent`].
    Coalesce(CoalesceEvent),
    /// A [`RevealEvent`].
    Reveal(RevealEvent),
    /// A [`TeardownEvent`].
    Teardown(TeardownEvent),
}

impl RecordedEvent {
    /// Host time the event was recorded at.
    #[must_use]
    pub fn at(&self) -> HostTime {
        match self {
            Self::Classify(e) => e.at,
            Self::TierSelected(e) | Self::TierHeld(e) => e.at,
            Self::Loader(e) => e.at,
            Self::TimerScheduled(e) | Self::TimerFired(e) | Self::TimerCancelled(e) => e.at,
            Self::Index(e) => e.at,
            Self::ScrollPhase(e) => e.at,
            Self::Coalesce(e) => e.at,
            Self::Reveal(e) => e.at,
            Self::Teardown(e) => e.at,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_usize(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_duration(&mut self) -> Option<Duration> {
        self.read_u64().map(Duration)
    }

    fn read_tier(&mut self) -> Option<Option<RenderTier>> {
        Some(match self.read_u8()? {
            0 => Some(RenderTier::Full),
            1 => Some(RenderTier::Reduced),
            2 => Some(RenderTier::StaticFallback),
            _ => None,
        })
    }

    fn read_width(&mut self) -> Option<WidthClass> {
        Some(match self.read_u8()? {
            0 => WidthClass::Narrow,
            _ => WidthClass::Wide,
        })
    }

    fn read_loader(&mut self) -> Option<LoaderState> {
        Some(match self.read_u8()? {
            0 => LoaderState::Idle,
            1 => LoaderState::Ready,
            _ => LoaderState::Mounted,
        })
    }

    fn read_phase(&mut self) -> Option<ScrollPhase> {
        Some(match self.read_u8()? {
            0 => ScrollPhase::Idle,
            1 => ScrollPhase::UserScrolling,
            _ => ScrollPhase::ProgrammaticScrolling,
        })
    }

    fn read_purpose(&mut self) -> Option<TimerPurpose> {
        let tag = self.read_u8()?;
        let carousel = CarouselId(self.read_u32()?);
        Some(match tag {
            0 => TimerPurpose::Mount,
            1 => TimerPurpose::ResizeDebounce,
            2 => TimerPurpose::AutoAdvance(carousel),
            _ => TimerPurpose::ScrollSettle(carousel),
        })
    }

    fn decode_classify(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Classify(ClassifyEvent {
            at: self.read_time()?,
            width_class: self.read_width()?,
            concurrency_hint: self.read_u32()?,
            signal_count: self.read_u32()?,
        }))
    }

    fn decode_tier(&mut self) -> Option<TierEvent> {
        Some(TierEvent {
            at: self.read_time()?,
            from: self.read_tier()?,
            to: self.read_tier()??,
            mount_delay: self.read_duration()?,
            width_class: self.read_width()?,
        })
    }

    fn decode_loader(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Loader(LoaderEvent {
            at: self.read_time()?,
            from: self.read_loader()?,
            to: self.read_loader()?,
            tier: self.read_tier()??,
        }))
    }

    fn decode_timer(&mut self) -> Option<TimerEvent> {
        Some(TimerEvent {
            at: self.read_time()?,
            timer: TimerId::from_raw(self.read_u64()?),
            purpose: self.read_purpose()?,
            deadline: self.read_time()?,
        })
    }

    fn decode_index(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Index(IndexEvent {
            at: self.read_time()?,
            carousel: CarouselId(self.read_u32()?),
            from: self.read_usize()?,
            to: self.read_usize()?,
            source: match self.read_u8()? {
                0 => IndexSource::Scroll,
                1 => IndexSource::Navigation,
                _ => IndexSource::AutoAdvance,
            },
        }))
    }

    fn decode_scroll_phase(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ScrollPhase(ScrollPhaseEvent {
            at: self.read_time()?,
            carousel: CarouselId(self.read_u32()?),
            from: self.read_phase()?,
            to: self.read_phase()?,
        }))
    }

    fn decode_coalesce(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Coalesce(CoalesceEvent {
            at: self.read_time()?,
            carousel: CarouselId(self.read_u32()?),
            samples: self.read_u32()?,
        }))
    }

    fn decode_reveal(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Reveal(RevealEvent {
            at: self.read_time()?,
            block: BlockId(self.read_u32()?),
            ratio: f64::from_bits(self.read_u64()?),
            delay: self.read_duration()?,
        }))
    }

    fn decode_teardown(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Teardown(TeardownEvent {
            at: self.read_time()?,
            cancelled_timers: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_CLASSIFY => self.decode_classify(),
            TAG_TIER_SELECTED => self.decode_tier().map(RecordedEvent::TierSelected),
            TAG_TIER_HELD => self.decode_tier().map(RecordedEvent::TierHeld),
            TAG_LOADER => self.decode_loader(),
            TAG_TIMER_SCHEDULED => self.decode_timer().map(RecordedEvent::TimerScheduled),
            TAG_TIMER_FIRED => self.decode_timer().map(RecordedEvent::TimerFired),
            TAG_TIMER_CANCELLED => self.decode_timer().map(RecordedEvent::TimerCancelled),
            TAG_INDEX => self.decode_index(),
            TAG_SCROLL_PHASE => self.decode_scroll_phase(),
            TAG_COALESCE => self.decode_coalesce(),
            TAG_REVEAL => self.decode_reveal(),
            TAG_TEARDOWN => self.decode_teardown(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    use vitrine_core::controller::{CarouselConfig, ControllerConfig, PresentationController};
    use vitrine_core::probe::StaticProbe;

    fn make_timer_event(purpose: TimerPurpose) -> TimerEvent {
        TimerEvent {
            at: HostTime::from_millis(10),
            timer: TimerId::from_raw(4),
            purpose,
            deadline: HostTime::from_millis(5010),
        }
    }

    #[test]
    fn timer_purpose_keeps_its_carousel() {
        let mut rec = RecorderSink::new();
        rec.on_timer_scheduled(&make_timer_event(TimerPurpose::AutoAdvance(CarouselId(3))));

        let events: Vec<_> = rec.events().collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::TimerScheduled(e) => {
                assert_eq!(e.timer, TimerId::from_raw(4));
                assert_eq!(e.purpose, TimerPurpose::AutoAdvance(CarouselId(3)));
                assert_eq!(e.deadline, HostTime::from_millis(5010));
            }
            other => panic!("expected TimerScheduled, got {other:?}"),
        }
    }

    #[test]
    fn first_tier_has_no_predecessor() {
        let mut rec = RecorderSink::new();
        rec.on_tier_selected(&TierEvent {
            at: HostTime::ZERO,
            from: None,
            to: RenderTier::Reduced,
            mount_delay: Duration::from_millis(400),
            width_class: WidthClass::Narrow,
        });
        match rec.events().next() {
            Some(RecordedEvent::TierSelected(e)) => {
                assert_eq!(e.from, None);
                assert_eq!(e.to, RenderTier::Reduced);
                assert_eq!(e.mount_delay, Duration::from_millis(400));
            }
            other => panic!("expected TierSelected, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_teardown(&TeardownEvent {
            at: HostTime(7),
            cancelled_timers: 2,
        });
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes).count(), 1);
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
    }

    #[test]
    fn records_a_controller_session() {
        let probe = StaticProbe::with_width(390.0).with_concurrency(8);
        let mut controller = PresentationController::mount_with_sink(
            probe,
            ControllerConfig::web(),
            RecorderSink::new(),
            HostTime::ZERO,
        );
        let showcase = CarouselId(0);
        let config = CarouselConfig::new(NonZeroUsize::new(3).unwrap())
            .with_auto_advance(Duration::from_millis(5000));
        let _ = controller.add_carousel(showcase, config, HostTime::ZERO);
        let _ = controller.go_to_index(showcase, 2, HostTime::from_millis(100));
        let _ = controller.advance(HostTime::from_millis(5100));

        let rec = controller.unmount(HostTime::from_millis(5200)).sink;
        assert_eq!(rec.tiers(), [RenderTier::Reduced]);
        assert_eq!(
            rec.index_changes(showcase),
            [
                (0, 2, IndexSource::Navigation),
                (2, 0, IndexSource::AutoAdvance)
            ]
        );
        assert_eq!(
            rec.fired_timers(),
            [TimerPurpose::Mount, TimerPurpose::AutoAdvance(showcase)]
        );
        assert!(matches!(
            rec.events().last(),
            Some(RecordedEvent::Teardown(TeardownEvent {
                cancelled_timers: 1,
                ..
            }))
        ));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
