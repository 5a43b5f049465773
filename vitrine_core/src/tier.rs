// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render tier selection.
//!
//! [`TierPolicy::select`] is the pure mapping from a [`DeviceProfile`] to a
//! [`TierSelection`]:
//!
//! | width class | low-powered | tier                              | delay |
//! |-------------|-------------|-----------------------------------|-------|
//! | Wide        | any         | [`RenderTier::Full`]              | 200ms |
//! | Narrow      | no          | [`RenderTier::Reduced`]           | 400ms |
//! | Narrow      | yes         | [`RenderTier::StaticFallback`]    | 800ms |
//!
//! A device is low-powered when its concurrency hint is at or below
//! [`TierPolicy::low_concurrency_max`] or when any of
//! [`TierPolicy::low_power_signals`] was matched on the platform.
//!
//! [`TierGovernor`] sits on top of the pure mapping and applies hysteresis
//! across resize passes: promotions only take effect with a width-class
//! change, so a spurious concurrency re-read cannot make the visual subsystem
//! flicker between tiers.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::device::{DeviceProfile, SIGNAL_LEGACY, WidthClass};
use crate::time::Duration;

/// Capability class governing which visual subsystem is mounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderTier {
    /// Full animated scene.
    Full,
    /// Animated scene with reduced quality settings.
    Reduced,
    /// No animated scene; a static asset replaces the placeholder.
    StaticFallback,
}

impl RenderTier {
    /// Returns `true` for tiers that mount the animated subsystem.
    #[must_use]
    pub const fn is_animated(self) -> bool {
        matches!(self, Self::Full | Self::Reduced)
    }

    /// Returns `true` if pointer-hover affordances (scroll hints, hover
    /// transforms) are enabled on this tier.
    ///
    /// Narrow tiers are touch-primary; hover is suppressed there entirely.
    #[must_use]
    pub const fn hover_affordances(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Capability rank: higher is more capable.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Full => 2,
            Self::Reduced => 1,
            Self::StaticFallback => 0,
        }
    }

    /// Returns a short label for logs and DOM attributes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Reduced => "reduced",
            Self::StaticFallback => "static",
        }
    }
}

/// Result of tier selection: the tier and how long to defer its mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TierSelection {
    /// Selected tier.
    pub tier: RenderTier,
    /// Delay before the visual subsystem may mount.
    pub mount_delay: Duration,
}

/// Policy table for [`TierPolicy::select`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierPolicy {
    /// Concurrency hints at or below this value count as low-powered.
    pub low_concurrency_max: u32,
    /// Platform signals that mark a device as low-powered.
    pub low_power_signals: Vec<String>,
    /// Mount delay for [`RenderTier::Full`].
    pub full_delay: Duration,
    /// Mount delay for [`RenderTier::Reduced`].
    pub reduced_delay: Duration,
    /// Mount delay for [`RenderTier::StaticFallback`].
    pub static_delay: Duration,
}

impl TierPolicy {
    /// The standard policy table.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            low_concurrency_max: 2,
            low_power_signals: vec![SIGNAL_LEGACY.to_string()],
            full_delay: Duration::from_millis(200),
            reduced_delay: Duration::from_millis(400),
            static_delay: Duration::from_millis(800),
        }
    }

    /// Returns `true` if the delays are ordered
    /// `Full < Reduced < StaticFallback`.
    #[must_use]
    pub fn delays_are_ordered(&self) -> bool {
        self.full_delay < self.reduced_delay && self.reduced_delay < self.static_delay
    }

    /// Returns `true` if `profile` describes a low-powered device.
    #[must_use]
    pub fn is_low_powered(&self, profile: &DeviceProfile) -> bool {
        profile.concurrency_hint <= self.low_concurrency_max
            || self
                .low_power_signals
                .iter()
                .any(|s| profile.has_signal(s))
    }

    /// Returns the mount delay configured for `tier`.
    #[must_use]
    pub fn delay_for(&self, tier: RenderTier) -> Duration {
        match tier {
            RenderTier::Full => self.full_delay,
            RenderTier::Reduced => self.reduced_delay,
            RenderTier::StaticFallback => self.static_delay,
        }
    }

    /// Maps a profile to its tier and mount delay. Pure and total.
    #[must_use]
    pub fn select(&self, profile: &DeviceProfile) -> TierSelection {
        let tier = match profile.width_class {
            WidthClass::Wide => RenderTier::Full,
            WidthClass::Narrow if self.is_low_powered(profile) => RenderTier::StaticFallback,
            WidthClass::Narrow => RenderTier::Reduced,
        };
        TierSelection {
            tier,
            mount_delay: self.delay_for(tier),
        }
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Selects a tier with the [standard](TierPolicy::standard) policy.
#[must_use]
pub fn select_tier(profile: &DeviceProfile) -> TierSelection {
    TierPolicy::standard().select(profile)
}

/// Outcome of offering a new selection to the [`TierGovernor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierDecision {
    /// The first selection after mount.
    Initial(TierSelection),
    /// The tier changed from the previous one.
    Changed {
        /// Previously active tier.
        from: RenderTier,
        /// Newly active selection.
        to: TierSelection,
    },
    /// The selection matched the active tier.
    Unchanged,
    /// A promotion was proposed without a width-class change and was held
    /// back.
    Held {
        /// The active tier, which stays in effect.
        active: RenderTier,
        /// The tier the pure mapping proposed.
        proposed: RenderTier,
    },
}

/// Applies promotion hysteresis over successive selections.
///
/// Demotions (towards [`RenderTier::StaticFallback`]) apply immediately.
/// Promotions apply only when the width class differs from the one the
/// active tier was chosen under.
#[derive(Clone, Debug, Default)]
pub struct TierGovernor {
    active: Option<(TierSelection, WidthClass)>,
}

impl TierGovernor {
    /// Creates a governor with no active tier.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Returns the active selection, if any.
    #[must_use]
    pub fn active(&self) -> Option<TierSelection> {
        self.active.map(|(s, _)| s)
    }

    /// Offers a freshly selected tier for `profile`.
    pub fn offer(&mut self, profile: &DeviceProfile, selection: TierSelection) -> TierDecision {
        let width = profile.width_class;
        let Some((current, current_width)) = self.active else {
            self.active = Some((selection, width));
            return TierDecision::Initial(selection);
        };

        if selection.tier == current.tier {
            self.active = Some((current, width));
            return TierDecision::Unchanged;
        }

        let promotion = selection.tier.rank() > current.tier.rank();
        if promotion && width == current_width {
            return TierDecision::Held {
                active: current.tier,
                proposed: selection.tier,
            };
        }

        self.active = Some((selection, width));
        TierDecision::Changed {
            from: current.tier,
            to: selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;

    fn make_profile(width_class: WidthClass, concurrency_hint: u32, signals: &[&str]) -> DeviceProfile {
        DeviceProfile {
            width_class,
            concurrency_hint,
            platform_signals: signals.iter().map(|s| (*s).to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn policy_table() {
        let wide_low = make_profile(WidthClass::Wide, 1, &[SIGNAL_LEGACY]);
        let narrow = make_profile(WidthClass::Narrow, 8, &[]);
        let narrow_low = make_profile(WidthClass::Narrow, 8, &[SIGNAL_LEGACY]);

        assert_eq!(
            select_tier(&wide_low),
            TierSelection {
                tier: RenderTier::Full,
                mount_delay: Duration::from_millis(200)
            }
        );
        assert_eq!(
            select_tier(&narrow),
            TierSelection {
                tier: RenderTier::Reduced,
                mount_delay: Duration::from_millis(400)
            }
        );
        assert_eq!(select_tier(&narrow_low).tier, RenderTier::StaticFallback);
    }

    #[test]
    fn narrow_dual_core_is_static_fallback() {
        let profile = make_profile(WidthClass::Narrow, 2, &[]);
        let selection = select_tier(&profile);
        assert_eq!(selection.tier, RenderTier::StaticFallback);
        assert_eq!(selection.mount_delay.as_millis(), 800);
    }

    #[test]
    fn selection_is_deterministic() {
        let profile = make_profile(WidthClass::Narrow, 3, &["mobile"]);
        assert_eq!(select_tier(&profile), select_tier(&profile));
    }

    #[test]
    fn standard_delays_are_ordered() {
        assert!(TierPolicy::standard().delays_are_ordered());
        let mut policy = TierPolicy::standard();
        policy.reduced_delay = Duration::from_millis(900);
        assert!(!policy.delays_are_ordered());
    }

    #[test]
    fn only_full_has_hover() {
        assert!(RenderTier::Full.hover_affordances());
        assert!(!RenderTier::Reduced.hover_affordances());
        assert!(!RenderTier::StaticFallback.hover_affordances());
        assert!(!RenderTier::StaticFallback.is_animated());
    }

    #[test]
    fn governor_holds_promotion_without_width_change() {
        let policy = TierPolicy::standard();
        let mut governor = TierGovernor::new();

        let weak = make_profile(WidthClass::Narrow, 2, &[]);
        assert!(matches!(
            governor.offer(&weak, policy.select(&weak)),
            TierDecision::Initial(_)
        ));

        // A later re-read reports more cores while still narrow.
        let reread = make_profile(WidthClass::Narrow, 8, &[]);
        assert_eq!(
            governor.offer(&reread, policy.select(&reread)),
            TierDecision::Held {
                active: RenderTier::StaticFallback,
                proposed: RenderTier::Reduced,
            }
        );
        assert_eq!(
            governor.active().map(|s| s.tier),
            Some(RenderTier::StaticFallback)
        );
    }

    #[test]
    fn governor_promotes_on_width_change() {
        let policy = TierPolicy::standard();
        let mut governor = TierGovernor::new();

        let weak = make_profile(WidthClass::Narrow, 2, &[]);
        let _ = governor.offer(&weak, policy.select(&weak));

        let rotated = make_profile(WidthClass::Wide, 2, &[]);
        assert_eq!(
            governor.offer(&rotated, policy.select(&rotated)),
            TierDecision::Changed {
                from: RenderTier::StaticFallback,
                to: policy.select(&rotated),
            }
        );
    }

    #[test]
    fn governor_demotes_immediately() {
        let policy = TierPolicy::standard();
        let mut governor = TierGovernor::new();

        let capable = make_profile(WidthClass::Narrow, 8, &[]);
        let _ = governor.offer(&capable, policy.select(&capable));

        let throttled = make_profile(WidthClass::Narrow, 1, &[]);
        assert!(matches!(
            governor.offer(&throttled, policy.select(&throttled)),
            TierDecision::Changed {
                from: RenderTier::Reduced,
                to: TierSelection {
                    tier: RenderTier::StaticFallback,
                    ..
                },
            }
        ));
    }

    #[test]
    fn static_fallback_is_stable_while_narrow_and_weak() {
        let policy = TierPolicy::standard();
        let mut governor = TierGovernor::new();
        let weak = make_profile(WidthClass::Narrow, 2, &[SIGNAL_LEGACY]);
        let _ = governor.offer(&weak, policy.select(&weak));

        for cores in [1, 2, 4, 8, 16] {
            let p = make_profile(WidthClass::Narrow, cores, &[SIGNAL_LEGACY]);
            let decision = governor.offer(&p, policy.select(&p));
            assert_eq!(decision, TierDecision::Unchanged, "cores={cores}");
        }
    }
}
