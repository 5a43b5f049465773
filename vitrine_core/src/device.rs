// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device capability classification.
//!
//! [`Classifier::classify`] turns the raw answers of an
//! [`EnvironmentProbe`] into a [`DeviceProfile`]: a width class, a
//! concurrency hint, and a set of platform signal tokens. A profile is an
//! immutable snapshot; every classification pass builds a new one.
//!
//! Platform matching is a heuristic that drifts as real devices change, so the
//! needles live in [`ClassifierConfig::platform_rules`] rather than in code.

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use crate::probe::EnvironmentProbe;

/// Signal token emitted for platforms known to be underpowered.
pub const SIGNAL_LEGACY: &str = "legacy";

/// Signal token emitted for phone/tablet user agents.
pub const SIGNAL_MOBILE: &str = "mobile";

/// Coarse viewport width class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WidthClass {
    /// Below the narrow breakpoint (phones, small tablets in portrait).
    Narrow,
    /// At or above the narrow breakpoint.
    Wide,
}

impl WidthClass {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Wide => "wide",
        }
    }
}

/// Snapshot of the device's capability signals.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceProfile {
    /// Viewport width class.
    pub width_class: WidthClass,
    /// Logical processor count, or the configured fallback when unknown.
    pub concurrency_hint: u32,
    /// Signal tokens matched from the platform identifier.
    pub platform_signals: BTreeSet<String>,
}

impl DeviceProfile {
    /// Returns `true` if the given signal token was matched.
    #[must_use]
    pub fn has_signal(&self, signal: &str) -> bool {
        self.platform_signals.contains(signal)
    }
}

/// Maps a case-insensitive substring of the platform identifier to a signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformRule {
    /// Lowercase substring to look for.
    pub needle: String,
    /// Token added to [`DeviceProfile::platform_signals`] on a match.
    pub signal: String,
}

impl PlatformRule {
    /// Creates a rule; the needle is lowercased.
    #[must_use]
    pub fn new(needle: &str, signal: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
            signal: signal.to_string(),
        }
    }
}

/// Configuration for the [`Classifier`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierConfig {
    /// Viewports strictly narrower than this (CSS px) are [`WidthClass::Narrow`].
    pub narrow_below: f64,
    /// Concurrency assumed when the host does not report one. Deliberately
    /// generous so that capable devices are not demoted.
    pub fallback_concurrency: u32,
    /// Platform substring rules, evaluated in order; all matches apply.
    pub platform_rules: Vec<PlatformRule>,
}

impl ClassifierConfig {
    /// Default configuration for browsers.
    #[must_use]
    pub fn web() -> Self {
        Self {
            narrow_below: 768.0,
            fallback_concurrency: 8,
            platform_rules: vec![
                PlatformRule::new("android 4", SIGNAL_LEGACY),
                PlatformRule::new("android 5", SIGNAL_LEGACY),
                PlatformRule::new("android 6", SIGNAL_LEGACY),
                PlatformRule::new("iphone os 9_", SIGNAL_LEGACY),
                PlatformRule::new("iphone os 10_", SIGNAL_LEGACY),
                PlatformRule::new("windows phone", SIGNAL_LEGACY),
                PlatformRule::new("mobi", SIGNAL_MOBILE),
                PlatformRule::new("android", SIGNAL_MOBILE),
                PlatformRule::new("iphone", SIGNAL_MOBILE),
                PlatformRule::new("ipad", SIGNAL_MOBILE),
            ],
        }
    }

    /// Lowercased needles of the rules that mark a platform as legacy.
    pub fn legacy_platform_tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.platform_rules
            .iter()
            .filter(|rule| rule.signal == SIGNAL_LEGACY)
            .map(|rule| rule.needle.as_str())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::web()
    }
}

/// Builds [`DeviceProfile`]s from an [`EnvironmentProbe`].
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    /// Creates a classifier with the given configuration.
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies the device described by `probe`.
    ///
    /// Missing or nonsensical answers degrade to the capable side: an unknown
    /// width is [`WidthClass::Wide`], an unknown or zero concurrency is
    /// [`ClassifierConfig::fallback_concurrency`], and an unknown platform
    /// yields no signals.
    #[must_use]
    pub fn classify<P: EnvironmentProbe + ?Sized>(&self, probe: &P) -> DeviceProfile {
        let width_class = match probe.viewport_width() {
            Some(w) if w.is_finite() && w < self.config.narrow_below => WidthClass::Narrow,
            _ => WidthClass::Wide,
        };

        let concurrency_hint = probe
            .hardware_concurrency()
            .filter(|&n| n > 0)
            .unwrap_or(self.config.fallback_concurrency);

        let mut platform_signals = BTreeSet::new();
        if let Some(platform) = probe.platform() {
            let platform = platform.to_lowercase();
            for rule in &self.config.platform_rules {
                if platform.contains(rule.needle.as_str()) {
                    platform_signals.insert(rule.signal.clone());
                }
            }
        }

        DeviceProfile {
            width_class,
            concurrency_hint,
            platform_signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StaticProbe;

    const OLD_ANDROID: &str =
        "Mozilla/5.0 (Linux; Android 5.1.1; SM-J320F) AppleWebKit/537.36 Mobile Safari/537.36";
    const DESKTOP: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

    #[test]
    fn narrow_breakpoint_is_exclusive() {
        let classifier = Classifier::default();
        let narrow = classifier.classify(&StaticProbe::with_width(767.9));
        let wide = classifier.classify(&StaticProbe::with_width(768.0));
        assert_eq!(narrow.width_class, WidthClass::Narrow);
        assert_eq!(wide.width_class, WidthClass::Wide);
    }

    #[test]
    fn missing_signals_degrade_to_capable_defaults() {
        let classifier = Classifier::default();
        let profile = classifier.classify(&StaticProbe::default());
        assert_eq!(profile.width_class, WidthClass::Wide);
        assert_eq!(profile.concurrency_hint, 8);
        assert!(profile.platform_signals.is_empty());
    }

    #[test]
    fn zero_concurrency_uses_fallback() {
        let classifier = Classifier::default();
        let profile = classifier.classify(&StaticProbe::with_width(400.0).with_concurrency(0));
        assert_eq!(profile.concurrency_hint, 8);
    }

    #[test]
    fn non_finite_width_counts_as_wide() {
        let classifier = Classifier::default();
        let profile = classifier.classify(&StaticProbe::with_width(f64::NAN));
        assert_eq!(profile.width_class, WidthClass::Wide);
    }

    #[test]
    fn legacy_platform_is_flagged() {
        let classifier = Classifier::default();
        let probe = StaticProbe::with_width(360.0)
            .with_concurrency(8)
            .with_platform(OLD_ANDROID);
        let profile = classifier.classify(&probe);
        assert!(profile.has_signal(SIGNAL_LEGACY));
        assert!(profile.has_signal(SIGNAL_MOBILE));
    }

    #[test]
    fn desktop_platform_has_no_signals() {
        let classifier = Classifier::default();
        let probe = StaticProbe::with_width(1440.0)
            .with_concurrency(16)
            .with_platform(DESKTOP);
        assert!(classifier.classify(&probe).platform_signals.is_empty());
    }

    #[test]
    fn rules_are_configuration() {
        let mut config = ClassifierConfig::web();
        config.platform_rules = vec![PlatformRule::new("KaiOS", SIGNAL_LEGACY)];
        let classifier = Classifier::new(config);
        assert!(classifier.config().legacy_platform_tokens().eq(["kaios"]));

        let kai = StaticProbe::with_width(240.0).with_platform("Mozilla/5.0 (Mobile; KAIOS/2.5)");
        assert!(classifier.classify(&kai).has_signal(SIGNAL_LEGACY));

        let android = StaticProbe::with_width(360.0).with_platform(OLD_ANDROID);
        assert!(
            !classifier.classify(&android).has_signal(SIGNAL_LEGACY),
            "default rules must not leak into a custom rule set"
        );
    }

    #[test]
    fn classification_is_repeatable() {
        let classifier = Classifier::default();
        let probe = StaticProbe::with_width(500.0)
            .with_concurrency(4)
            .with_platform(OLD_ANDROID);
        assert_eq!(classifier.classify(&probe), classifier.classify(&probe));
    }
}
