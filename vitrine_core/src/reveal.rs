// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot entrance triggers for content blocks.
//!
//! [`VisibilityTrigger`] watches blocks registered with
//! [`observe`](VisibilityTrigger::observe). The first time a block's
//! intersection ratio reaches its threshold, it fires a [`Reveal`] and its
//! watch entry is released. A fired block stays fired for the rest of the
//! mount; crossing the threshold again does nothing.
//!
//! Ratios come either from a native intersection observer or from
//! [`intersection_ratio`] applied to block and viewport rectangles.

use alloc::collections::{BTreeMap, BTreeSet};

use kurbo::Rect;

use crate::time::Duration;

/// Identifies a content block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

/// How a block is watched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealSpec {
    /// Visible fraction of the block (0.0–1.0) required to fire.
    pub threshold: f64,
    /// Delay the host applies before starting the entrance animation.
    pub delay: Duration,
}

impl RevealSpec {
    /// A spec with the given threshold and no delay. The threshold is clamped
    /// to `0.0..=1.0`; NaN becomes `1.0`.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_nan() {
            1.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self {
            threshold,
            delay: Duration::ZERO,
        }
    }

    /// A spec for the `slot`-th item of a staggered group.
    #[must_use]
    pub fn staggered(threshold: f64, stagger: Duration, slot: u32) -> Self {
        Self {
            delay: stagger.saturating_mul(u64::from(slot)),
            ..Self::new(threshold)
        }
    }
}

/// A fired reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reveal {
    /// The block that entered the viewport.
    pub block: BlockId,
    /// Entrance-animation delay from the block's [`RevealSpec`].
    pub delay: Duration,
}

/// Fraction of `block` that lies inside `viewport`.
///
/// A zero-area block counts as fully visible when its origin lies inside the
/// viewport, matching native intersection observers.
#[must_use]
pub fn intersection_ratio(block: Rect, viewport: Rect) -> f64 {
    let block = block.abs();
    let viewport = viewport.abs();
    let area = block.area();
    if area <= 0.0 {
        return if viewport.contains(block.origin()) {
            1.0
        } else {
            0.0
        };
    }
    let overlap = block.intersect(viewport);
    let visible = overlap.width().max(0.0) * overlap.height().max(0.0);
    (visible / area).clamp(0.0, 1.0)
}

/// Watches content blocks and fires each at most once.
#[derive(Clone, Debug, Default)]
pub struct VisibilityTrigger {
    watching: BTreeMap<BlockId, RevealSpec>,
    fired: BTreeSet<BlockId>,
}

impl VisibilityTrigger {
    /// Creates a trigger with no watched blocks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            watching: BTreeMap::new(),
            fired: BTreeSet::new(),
        }
    }

    /// Starts watching `block`. Re-observing a watched block replaces its
    /// spec.
    ///
    /// Returns `false` (and does nothing) if the block already fired.
    pub fn observe(&mut self, block: BlockId, spec: RevealSpec) -> bool {
        if self.fired.contains(&block) {
            return false;
        }
        self.watching.insert(block, spec);
        true
    }

    /// Stops watching `block` without firing it.
    pub fn unobserve(&mut self, block: BlockId) -> bool {
        self.watching.remove(&block).is_some()
    }

    /// Feeds an intersection ratio for `block`.
    ///
    /// Fires when `ratio >= threshold` and the block is actually intersecting
    /// (`ratio > 0`), so a zero threshold does not fire on the initial
    /// "not intersecting" callback.
    pub fn on_intersection(&mut self, block: BlockId, ratio: f64) -> Option<Reveal> {
        let spec = self.watching.get(&block)?;
        if !(ratio > 0.0 && ratio >= spec.threshold) {
            return None;
        }
        let delay = spec.delay;
        self.watching.remove(&block);
        self.fired.insert(block);
        Some(Reveal { block, delay })
    }

    /// Returns `true` if `block` has fired during this mount.
    #[must_use]
    pub fn has_fired(&self, block: BlockId) -> bool {
        self.fired.contains(&block)
    }

    /// Returns `true` if `block` is still being watched.
    #[must_use]
    pub fn is_watching(&self, block: BlockId) -> bool {
        self.watching.contains_key(&block)
    }

    /// Returns the reveal settings of a watched block.
    #[must_use]
    pub fn spec(&self, block: BlockId) -> Option<RevealSpec> {
        self.watching.get(&block).copied()
    }

    /// Blocks still being watched, in id order.
    pub fn watching(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.watching.keys().copied()
    }

    /// Number of blocks still being watched.
    #[must_use]
    pub fn watching_count(&self) -> usize {
        self.watching.len()
    }

    /// Forgets every watch and fired record. This is the remount path; the
    /// owner must re-observe blocks afterwards.
    pub fn reset(&mut self) {
        self.watching.clear();
        self.fired.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_across_repeated_crossings() {
        let mut trigger = VisibilityTrigger::new();
        let block = BlockId(7);
        assert!(trigger.observe(block, RevealSpec::new(0.5)));

        assert_eq!(trigger.on_intersection(block, 0.2), None);
        assert_eq!(
            trigger.on_intersection(block, 0.6),
            Some(Reveal {
                block,
                delay: Duration::ZERO
            })
        );
        assert!(!trigger.is_watching(block), "entry is released on fire");

        // Scrolling away and back again.
        for ratio in [0.0, 0.9, 0.1, 1.0] {
            assert_eq!(trigger.on_intersection(block, ratio), None);
        }
        assert!(trigger.has_fired(block));
    }

    #[test]
    fn fired_block_cannot_be_rearmed() {
        let mut trigger = VisibilityTrigger::new();
        let block = BlockId(1);
        let _ = trigger.observe(block, RevealSpec::new(0.2));
        let _ = trigger.on_intersection(block, 0.3);
        assert!(!trigger.observe(block, RevealSpec::new(0.2)));
        assert_eq!(trigger.on_intersection(block, 1.0), None);
    }

    #[test]
    fn blocks_fire_independently_in_intersection_order() {
        let mut trigger = VisibilityTrigger::new();
        for id in 0..3 {
            let _ = trigger.observe(BlockId(id), RevealSpec::new(0.3));
        }
        let order: alloc::vec::Vec<_> = [(2, 0.4), (0, 0.1), (0, 0.5), (1, 0.35)]
            .into_iter()
            .filter_map(|(id, ratio)| trigger.on_intersection(BlockId(id), ratio))
            .map(|r| r.block.0)
            .collect();
        assert_eq!(order, [2, 0, 1]);
        assert_eq!(trigger.watching_count(), 0);
    }

    #[test]
    fn zero_threshold_needs_actual_intersection() {
        let mut trigger = VisibilityTrigger::new();
        let _ = trigger.observe(BlockId(0), RevealSpec::new(0.0));
        assert_eq!(trigger.on_intersection(BlockId(0), 0.0), None);
        assert!(trigger.on_intersection(BlockId(0), 0.01).is_some());
    }

    #[test]
    fn unobserved_block_never_fires() {
        let mut trigger = VisibilityTrigger::new();
        assert_eq!(trigger.on_intersection(BlockId(9), 1.0), None);
        assert!(!trigger.has_fired(BlockId(9)));
    }

    #[test]
    fn staggered_delay_scales_with_slot() {
        let spec = RevealSpec::staggered(0.2, Duration::from_millis(120), 3);
        assert_eq!(spec.delay, Duration::from_millis(360));
        assert_eq!(RevealSpec::new(4.0).threshold, 1.0);
        assert_eq!(RevealSpec::new(f64::NAN).threshold, 1.0);
    }

    #[test]
    fn reset_is_a_remount() {
        let mut trigger = VisibilityTrigger::new();
        let _ = trigger.observe(BlockId(0), RevealSpec::new(0.5));
        let _ = trigger.on_intersection(BlockId(0), 1.0);
        trigger.reset();
        assert!(!trigger.has_fired(BlockId(0)));
        assert!(trigger.observe(BlockId(0), RevealSpec::new(0.5)));
    }

    #[test]
    fn ratio_from_geometry() {
        let viewport = Rect::new(0.0, 0.0, 400.0, 800.0);
        let half_in = Rect::new(0.0, 700.0, 400.0, 900.0);
        let below = Rect::new(0.0, 900.0, 400.0, 1100.0);
        let inside = Rect::new(10.0, 10.0, 100.0, 100.0);

        assert!((intersection_ratio(half_in, viewport) - 0.5).abs() < 1e-12);
        assert_eq!(intersection_ratio(below, viewport), 0.0);
        assert_eq!(intersection_ratio(inside, viewport), 1.0);
        assert_eq!(
            intersection_ratio(Rect::new(5.0, 5.0, 5.0, 5.0), viewport),
            1.0,
            "zero-area block inside the viewport"
        );
    }
}
