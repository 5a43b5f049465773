// Copyright 2026 the Vitrine Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quality settings handed to the animated visual subsystem.

use crate::tier::RenderTier;

/// When the animated scene renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameLoop {
    /// Render every animation frame.
    Always,
    /// Render only when something in the scene changed.
    OnDemand,
}

/// Renderer and camera parameters for an animated tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSettings {
    /// Render cadence.
    pub frame_loop: FrameLoop,
    /// Whether lights cast shadows.
    pub shadows: bool,
    /// Whether the canvas requests antialiasing.
    pub antialias: bool,
    /// Upper bound for the canvas device-pixel ratio.
    pub max_pixel_ratio: f64,
    /// Camera distance from the model.
    pub camera_distance: f64,
    /// Vertical field of view in degrees.
    pub field_of_view: f64,
    /// Orbit auto-rotation speed multiplier.
    pub auto_rotate_speed: f64,
    /// Whether orbit damping is enabled.
    pub damping: bool,
    /// Whether the secondary fill light is added.
    pub fill_light: bool,
}

impl SceneSettings {
    /// Settings for [`RenderTier::Full`].
    pub const FULL: Self = Self {
        frame_loop: FrameLoop::Always,
        shadows: true,
        antialias: true,
        max_pixel_ratio: 1.5,
        camera_distance: 6.0,
        field_of_view: 50.0,
        auto_rotate_speed: 1.0,
        damping: true,
        fill_light: true,
    };

    /// Settings for [`RenderTier::Reduced`].
    pub const REDUCED: Self = Self {
        frame_loop: FrameLoop::OnDemand,
        shadows: false,
        antialias: false,
        max_pixel_ratio: 1.0,
        camera_distance: 7.0,
        field_of_view: 55.0,
        auto_rotate_speed: 0.5,
        damping: false,
        fill_light: false,
    };

    /// Returns the settings for `tier`, or `None` for
    /// [`RenderTier::StaticFallback`], which never mounts a scene.
    #[must_use]
    pub const fn for_tier(tier: RenderTier) -> Option<Self> {
        match tier {
            RenderTier::Full => Some(Self::FULL),
            RenderTier::Reduced => Some(Self::REDUCED),
            RenderTier::StaticFallback => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_fallback_has_no_scene() {
        assert_eq!(SceneSettings::for_tier(RenderTier::StaticFallback), None);
    }

    #[test]
    fn reduced_is_cheaper_than_full() {
        let full = SceneSettings::FULL;
        let reduced = SceneSettings::REDUCED;
        assert!(reduced.max_pixel_ratio < full.max_pixel_ratio);
        assert!(!reduced.shadows && full.shadows);
        assert_eq!(reduced.frame_loop, FrameLoop::OnDemand);
    }
}
