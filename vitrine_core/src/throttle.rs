// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame coalescing of high-frequency input.
//!
//! Scroll events arrive far more often than the display refreshes.
//! [`FrameCoalescer`] keeps only the latest sample between two frame
//! boundaries and tells the caller when a new animation frame must be
//! requested, so a burst of events costs one recomputation.

/// Whether the host must request an animation frame after a push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameRequest {
    /// No frame is outstanding; the host must request one.
    Needed,
    /// A frame is already outstanding and will pick up the new sample.
    Pending,
}

/// Latest-value-wins buffer flushed once per animation frame.
#[derive(Clone, Debug)]
pub struct FrameCoalescer<T> {
    latest: Option<T>,
    merged: u32,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameCoalescer<T> {
    /// Creates an empty coalescer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: None,
            merged: 0,
        }
    }

    /// Records a sample, replacing any sample not yet flushed.
    pub fn push(&mut self, sample: T) -> FrameRequest {
        let request = if self.latest.is_some() {
            FrameRequest::Pending
        } else {
            FrameRequest::Needed
        };
        self.latest = Some(sample);
        self.merged = self.merged.saturating_add(1);
        request
    }

    /// Returns `true` if a sample is waiting for the next frame.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.latest.is_some()
    }

    /// Flushes at a frame boundary, returning the last sample pushed and the
    /// number of pushes it stands for.
    pub fn flush(&mut self) -> Option<(T, u32)> {
        let sample = self.latest.take()?;
        let merged = core::mem::take(&mut self.merged);
        Some((sample, merged))
    }

    /// Drops any unflushed sample.
    pub fn discard(&mut self) {
        self.latest = None;
        self.merged = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_requests_one_frame() {
        let mut c = FrameCoalescer::new();
        assert_eq!(c.push(10.0), FrameRequest::Needed);
        assert_eq!(c.push(20.0), FrameRequest::Pending);
        assert_eq!(c.push(35.0), FrameRequest::Pending);
        assert_eq!(c.flush(), Some((35.0, 3)), "last sample wins");
        assert_eq!(c.flush(), None);
    }

    #[test]
    fn next_push_after_flush_requests_again() {
        let mut c = FrameCoalescer::new();
        let _ = c.push(1_u32);
        let _ = c.flush();
        assert_eq!(c.push(2), FrameRequest::Needed);
    }

    #[test]
    fn discard_clears_pending() {
        let mut c = FrameCoalescer::new();
        let _ = c.push(1_u32);
        c.discard();
        assert!(!c.is_pending());
        assert_eq!(c.flush(), None);
    }
}
