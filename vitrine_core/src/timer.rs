// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancellable one-shot timers on a host-driven clock.
//!
//! [`TimerQueue`] holds pending deadlines but never reads a clock itself. The
//! host asks for [`next_deadline`](TimerQueue::next_deadline), arranges to be
//! called back at that time (e.g. with `setTimeout`), and then pops expired
//! entries with [`pop_expired`](TimerQueue::pop_expired). Tests drive the same
//! queue with a virtual clock.
//!
//! Cancellation is by [`TimerId`]. Ids are never reused, so cancelling or
//! matching against a stale id is always harmless. Dropping the queue drops
//! every pending entry with it; nothing can fire after its owner is gone.

use alloc::vec::Vec;
use core::fmt;

use crate::time::HostTime;

/// Handle to a scheduled timer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Rebuilds a handle from a raw value, e.g. when decoding a recorded
    /// trace. A rebuilt handle only matches the timer it was taken from.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerId({})", self.0)
    }
}

#[derive(Clone, Debug)]
struct Entry<E> {
    id: TimerId,
    deadline: HostTime,
    event: E,
}

/// A set of pending one-shot timers, each carrying an event payload.
#[derive(Clone, Debug)]
pub struct TimerQueue<E> {
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Schedules `event` to fire at `deadline`.
    pub fn schedule(&mut self, deadline: HostTime, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline,
            event,
        });
        id
    }

    /// Cancels a pending timer, returning its payload.
    ///
    /// Returns `None` if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.swap_remove(pos).event)
    }

    /// Returns `true` if `id` is still pending.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Returns the deadline of `id`, if it is still pending.
    #[must_use]
    pub fn deadline(&self, id: TimerId) -> Option<HostTime> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.deadline)
    }

    /// Returns the earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Removes and returns the earliest timer whose deadline is at or before
    /// `now`, with that deadline. Ties fire in scheduling order.
    pub fn pop_expired(&mut self, now: HostTime) -> Option<(TimerId, HostTime, E)> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.id))
            .map(|(i, _)| i)?;
        let entry = self.entries.swap_remove(pos);
        Some((entry.id, entry.deadline, entry.event))
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cancels every pending timer, returning them in firing order.
    pub fn cancel_all(&mut self) -> Vec<(TimerId, HostTime, E)> {
        let mut entries = core::mem::take(&mut self.entries);
        entries.sort_by_key(|e| (e.deadline, e.id));
        entries
            .into_iter()
            .map(|e| (e.id, e.deadline, e.event))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        let late = q.schedule(HostTime(300), "late");
        let early = q.schedule(HostTime(100), "early");

        assert_eq!(q.next_deadline(), Some(HostTime(100)));
        assert_eq!(q.pop_expired(HostTime(50)), None, "nothing due yet");
        assert_eq!(q.pop_expired(HostTime(1000)), Some((early, HostTime(100), "early")));
        assert_eq!(q.pop_expired(HostTime(1000)), Some((late, HostTime(300), "late")));
        assert!(q.is_empty());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut q = TimerQueue::new();
        let a = q.schedule(HostTime(10), 'a');
        let b = q.schedule(HostTime(10), 'b');
        let c = q.schedule(HostTime(10), 'c');
        let _ = q.cancel(b);
        let d = q.schedule(HostTime(10), 'd');

        let order: Vec<_> = core::iter::from_fn(|| q.pop_expired(HostTime(10)))
            .map(|(id, _, ev)| (id, ev))
            .collect();
        assert_eq!(order, [(a, 'a'), (c, 'c'), (d, 'd')]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let id = q.schedule(HostTime(400), ());
        assert_eq!(q.cancel(id), Some(()));
        assert_eq!(q.cancel(id), None, "second cancel is a no-op");
        assert!(!q.is_pending(id));
        assert_eq!(q.pop_expired(HostTime(u64::MAX)), None);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut q = TimerQueue::new();
        let first = q.schedule(HostTime(1), ());
        let _ = q.pop_expired(HostTime(1));
        let second = q.schedule(HostTime(1), ());
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn cancel_all_returns_pending_in_firing_order() {
        let mut q = TimerQueue::new();
        let b = q.schedule(HostTime(2), 'b');
        let a = q.schedule(HostTime(1), 'a');
        assert_eq!(q.cancel_all(), [(a, HostTime(1), 'a'), (b, HostTime(2), 'b')]);
        assert_eq!(q.next_deadline(), None);
    }
}
