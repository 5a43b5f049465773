// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Timers become async spans (`b`/`e` pairs keyed by timer id), so a mount
//! delay or an auto-advance interval shows up as a bar from scheduling to
//! firing or cancellation. Everything else is an instant event, except frame
//! coalescing which is emitted as a counter.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use vitrine_core::time::HostTime;
use vitrine_core::trace::TimerPurpose;

use crate::recorder::{RecordedEvent, decode};

/// Track ids used as `tid` so each concern gets its own lane.
const TID_TIER: u32 = 0;
const TID_LOADER: u32 = 1;
const TID_TIMERS: u32 = 2;
const TID_CAROUSEL: u32 = 3;
const TID_REVEAL: u32 = 4;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Classify(e) => {
                events.push(instant("Classify", "Tier", e.at, TID_TIER, json!({
                    "width_class": e.width_class.as_str(),
                    "concurrency_hint": e.concurrency_hint,
                    "signal_count": e.signal_count,
                })));
            }
            RecordedEvent::TierSelected(e) | RecordedEvent::TierHeld(e) => {
                let name = if matches!(recorded, RecordedEvent::TierHeld(_)) {
                    "TierHeld"
                } else {
                    "TierSelected"
                };
                events.push(instant(name, "Tier", e.at, TID_TIER, json!({
                    "from": e.from.map(|t| t.as_str()),
                    "to": e.to.as_str(),
                    "mount_delay_us": e.mount_delay.ticks(),
                    "width_class": e.width_class.as_str(),
                })));
            }
            RecordedEvent::Loader(e) => {
                events.push(instant("Loader", "Loader", e.at, TID_LOADER, json!({
                    "from": e.from.as_str(),
                    "to": e.to.as_str(),
                    "tier": e.tier.as_str(),
                })));
            }
            RecordedEvent::TimerScheduled(e) => {
                events.push(json!({
                    "ph": "b",
                    "name": timer_name(e.purpose),
                    "cat": "Timer",
                    "id": e.timer.get(),
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": TID_TIMERS,
                    "args": {
                        "deadline_us": us(e.deadline),
                    }
                }));
            }
            RecordedEvent::TimerFired(e) | RecordedEvent::TimerCancelled(e) => {
                let fired = matches!(recorded, RecordedEvent::TimerFired(_));
                events.push(json!({
                    "ph": "e",
                    "name": timer_name(e.purpose),
                    "cat": "Timer",
                    "id": e.timer.get(),
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": TID_TIMERS,
                    "args": {
                        "outcome": if fired { "fired" } else { "cancelled" },
                    }
                }));
            }
            RecordedEvent::Index(e) => {
                events.push(instant("Index", "Carousel", e.at, TID_CAROUSEL, json!({
                    "carousel": e.carousel.0,
                    "from": e.from,
                    "to": e.to,
                    "source": format!("{:?}", e.source),
                })));
            }
            RecordedEvent::ScrollPhase(e) => {
                events.push(instant("ScrollPhase", "Carousel", e.at, TID_CAROUSEL, json!({
                    "carousel": e.carousel.0,
                    "from": format!("{:?}", e.from),
                    "to": format!("{:?}", e.to),
                })));
            }
            RecordedEvent::Coalesce(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": format!("ScrollSamples[{}]", e.carousel.0),
                    "cat": "Carousel",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": TID_CAROUSEL,
                    "args": {
                        "samples": e.samples,
                    }
                }));
            }
            RecordedEvent::Reveal(e) => {
                events.push(instant("Reveal", "Reveal", e.at, TID_REVEAL, json!({
                    "block": e.block.0,
                    "ratio": e.ratio,
                    "delay_us": e.delay.ticks(),
                })));
            }
            RecordedEvent::Teardown(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Teardown",
                    "cat": "Lifecycle",
                    "ts": us(e.at),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "cancelled_timers": e.cancelled_timers,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, at: HostTime, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": us(at),
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

fn timer_name(purpose: TimerPurpose) -> String {
    match purpose {
        TimerPurpose::Mount | TimerPurpose::ResizeDebounce => purpose.as_str().to_owned(),
        TimerPurpose::AutoAdvance(c) | TimerPurpose::ScrollSettle(c) => {
            format!("{}[{}]", purpose.as_str(), c.0)
        }
    }
}

/// Host ticks are already microseconds, the unit Chrome traces use.
fn us(t: HostTime) -> u64 {
    t.ticks()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use vitrine_core::carousel::{CarouselId, IndexSource};
    use vitrine_core::timer::TimerId;
    use vitrine_core::trace::{IndexEvent, TimerEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        let timer = TimerEvent {
            at: HostTime::ZERO,
            timer: TimerId::from_raw(1),
            purpose: TimerPurpose::Mount,
            deadline: HostTime::from_millis(200),
        };
        rec.on_timer_scheduled(&timer);
        rec.on_timer_fired(&TimerEvent {
            at: HostTime::from_millis(200),
            ..timer
        });
        rec.on_index(&IndexEvent {
            at: HostTime::from_millis(250),
            carousel: CarouselId(0),
            from: 0,
            to: 2,
            source: IndexSource::Scroll,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        // The timer is an async span.
        assert_eq!(parsed[0]["ph"], "b");
        assert_eq!(parsed[1]["ph"], "e");
        assert_eq!(parsed[0]["id"], parsed[1]["id"]);
        assert_eq!(parsed[1]["ts"], 200_000);
        assert_eq!(parsed[1]["args"]["outcome"], "fired");

        // The index change is an instant.
        assert_eq!(parsed[2]["ph"], "i");
        assert_eq!(parsed[2]["args"]["to"], 2);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
