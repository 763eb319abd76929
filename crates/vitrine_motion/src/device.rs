//! Device profiling
//!
//! Classifies the viewport into a [`DeviceTier`] and derives the base motion
//! budget for it. Resize and orientation changes are debounced: the profile is
//! only recomputed once the viewport has been quiet for the configured settle
//! delay.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DeviceConfig;

/// Coarse device class derived from viewport width
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceTier {
    Mobile,
    Tablet,
    Desktop,
}

impl fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceTier::Mobile => "mobile",
            DeviceTier::Tablet => "tablet",
            DeviceTier::Desktop => "desktop",
        })
    }
}

/// Base motion budget for the current device
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub tier: DeviceTier,
    pub reduced_motion: bool,
    /// Tier time scale, before the governor and reduced motion are applied
    pub time_scale: f32,
    /// Tier particle cap, before the governor and reduced motion are applied
    pub particle_cap: usize,
}

impl DeviceProfile {
    /// Whether anything should move at all
    pub fn motion_enabled(&self) -> bool {
        !self.reduced_motion
    }

    pub fn is_desktop(&self) -> bool {
        self.tier == DeviceTier::Desktop
    }
}

/// Computes and tracks the [`DeviceProfile`]
#[derive(Debug)]
pub struct DeviceProfiler {
    config: DeviceConfig,
    max_particles: usize,
    profile: DeviceProfile,
    /// Time of the last viewport change not yet folded into the profile
    pending_since: Option<f64>,
}

impl DeviceProfiler {
    /// Start with a desktop profile until the first refresh
    pub fn new(config: DeviceConfig, max_particles: usize) -> Self {
        let profile = Self::classify_with(&config, max_particles, None, false);
        Self {
            config,
            max_particles,
            profile,
            pending_since: None,
        }
    }

    fn classify_with(config: &DeviceConfig, max_particles: usize, width: Option<f32>, reduced_motion: bool) -> DeviceProfile {
        // An unreadable width falls back to desktop
        let width = width.filter(|w| w.is_finite() && *w > 0.0);
        let (tier, time_scale, particle_cap) = match width {
            Some(w) if w <= config.mobile_max_width => {
                (DeviceTier::Mobile, config.mobile_time_scale, config.mobile_particle_cap)
            }
            Some(w) if w <= config.tablet_max_width => {
                (DeviceTier::Tablet, config.tablet_time_scale, config.tablet_particle_cap)
            }
            _ => (DeviceTier::Desktop, config.desktop_time_scale, max_particles),
        };

        DeviceProfile {
            tier,
            reduced_motion,
            time_scale,
            particle_cap: particle_cap.min(max_particles),
        }
    }

    /// Profile for a viewport width and reduced-motion preference
    pub fn classify(&self, width: Option<f32>, reduced_motion: bool) -> DeviceProfile {
        Self::classify_with(&self.config, self.max_particles, width, reduced_motion)
    }

    /// Recompute immediately. Returns the new profile if it changed.
    pub fn refresh(&mut self, width: Option<f32>, reduced_motion: bool) -> Option<DeviceProfile> {
        self.pending_since = None;
        let next = self.classify(width, reduced_motion);
        if next == self.profile {
            return None;
        }
        tracing::debug!(tier = %next.tier, reduced_motion, "device profile changed");
        self.profile = next;
        Some(next)
    }

    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    /// Record a resize or orientation change at `now` (ms)
    pub fn notify_viewport_change(&mut self, now: f64) {
        self.pending_since = Some(now);
    }

    /// Whether a viewport change is waiting to settle
    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Recompute once the settle delay has passed since the last change.
    ///
    /// Returns the new profile only if it differs from the current one.
    pub fn poll(&mut self, now: f64, width: Option<f32>, reduced_motion: bool) -> Option<DeviceProfile> {
        let since = self.pending_since?;
        if now - since < self.config.settle_delay_ms {
            return None;
        }
        self.refresh(width, reduced_motion)
    }
}
