//! Frame-rate governor
//!
//! Samples frames over fixed windows. When a window measures below the degrade
//! threshold the governor drops to [`GovernorLevel::Degraded`], which slows
//! every tween and cuts the current tier's particle budget by a ratio; it only restores once a window
//! measures above the (higher) restore threshold, so the level does not flap
//! around a single cut-off.

use crate::config::GovernorConfig;

/// Counts frames over fixed-length windows
#[derive(Clone, Debug)]
pub struct FrameSampler {
    window_ms: f64,
    frames: u32,
    window_start: Option<f64>,
}

impl FrameSampler {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            frames: 0,
            window_start: None,
        }
    }

    /// Count one frame at `now` (ms).
    ///
    /// Returns the measured rate when this frame closes a window.
    pub fn tick(&mut self, now: f64) -> Option<u32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            self.frames = 0;
            return None;
        };

        self.frames += 1;
        let elapsed = now - start;
        if elapsed < self.window_ms {
            return None;
        }

        let fps = (f64::from(self.frames) * 1000.0 / elapsed).round() as u32;
        self.frames = 0;
        self.window_start = Some(now);
        Some(fps)
    }

    /// Forget the current window; the next tick opens a new one
    pub fn reset(&mut self) {
        self.frames = 0;
        self.window_start = None;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GovernorLevel {
    #[default]
    Normal,
    Degraded,
}

/// Limits imposed by the governor on top of the device profile
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GovernorCaps {
    pub time_scale: f32,
    pub particle_cap: usize,
}

/// Hysteresis state machine over measured frame rates
#[derive(Clone, Debug)]
pub struct PerformanceGovernor {
    config: GovernorConfig,
    level: GovernorLevel,
}

impl PerformanceGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            level: GovernorLevel::Normal,
        }
    }

    pub fn level(&self) -> GovernorLevel {
        self.level
    }

    pub fn is_degraded(&self) -> bool {
        self.level == GovernorLevel::Degraded
    }

    /// Feed one window measurement. Returns the new level on a change.
    pub fn observe(&mut self, fps: u32) -> Option<GovernorLevel> {
        let next = match self.level {
            GovernorLevel::Normal if fps < self.config.degrade_below_fps => GovernorLevel::Degraded,
            GovernorLevel::Degraded if fps > self.config.restore_above_fps => GovernorLevel::Normal,
            level => level,
        };
        if next == self.level {
            return None;
        }
        match next {
            GovernorLevel::Degraded => tracing::warn!(fps, "frame rate low, reducing motion"),
            GovernorLevel::Normal => tracing::info!(fps, "frame rate recovered, restoring motion"),
        }
        self.level = next;
        Some(next)
    }

    /// Caps for the current level given the device tier's particle cap
    pub fn caps(&self, tier_cap: usize) -> GovernorCaps {
        match self.level {
            GovernorLevel::Normal => GovernorCaps {
                time_scale: 1.0,
                particle_cap: tier_cap,
            },
            GovernorLevel::Degraded => GovernorCaps {
                time_scale: self.config.degraded_time_scale,
                particle_cap: (tier_cap as f32 * self.config.degraded_particle_ratio).floor() as usize,
            },
        }
    }

    /// Return to normal, e.g. after a restart
    pub fn reset(&mut self) {
        self.level = GovernorLevel::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_measures_windows() {
        let mut sampler = FrameSampler::new(1000.0);
        assert_eq!(sampler.tick(0.0), None);

        let mut result = None;
        for i in 1..=60 {
            result = sampler.tick(f64::from(i) * 1000.0 / 60.0);
            if i < 60 {
                assert_eq!(result, None);
            }
        }
        assert_eq!(result, Some(60));
    }

    #[test]
    fn test_sampler_slow_frames() {
        let mut sampler = FrameSampler::new(1000.0);
        sampler.tick(0.0);
        let mut last = None;
        let mut t = 0.0;
        while last.is_none() {
            t += 50.0;
            last = sampler.tick(t);
        }
        assert_eq!(last, Some(20));
    }

    #[test]
    fn test_hysteresis() {
        let mut governor = PerformanceGovernor::new(GovernorConfig::default());
        assert_eq!(governor.observe(45), None);
        assert_eq!(governor.observe(29), Some(GovernorLevel::Degraded));
        // Between the thresholds nothing changes
        assert_eq!(governor.observe(40), None);
        assert_eq!(governor.observe(55), None);
        assert_eq!(governor.observe(56), Some(GovernorLevel::Normal));
    }

    #[test]
    fn test_caps() {
        let mut governor = PerformanceGovernor::new(GovernorConfig::default());
        assert_eq!(
            governor.caps(30),
            GovernorCaps {
                time_scale: 1.0,
                particle_cap: 30
            }
        );
        governor.observe(10);
        let caps = governor.caps(30);
        assert_eq!(caps.time_scale, 0.7);
        assert_eq!(caps.particle_cap, 15);
        // Mobile tier cap of 15 degrades to 7
        assert_eq!(governor.caps(15).particle_cap, 7);
    }
}
