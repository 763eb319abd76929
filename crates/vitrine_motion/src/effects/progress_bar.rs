//! Scroll progress bar
//!
//! Mirrors the tracker's scroll progress onto the bar's horizontal scale. This
//! reports position rather than decorating the page, so it keeps working under
//! reduced motion.

use vitrine_core::{NodeId, Property, PropertyValue, ReadOnly};

use super::{Effect, EffectId, FrameInfo};
use crate::config::ProgressBarConfig;
use crate::context::MotionContext;
use crate::error::Result;

pub struct ProgressBar {
    config: ProgressBarConfig,
    bar: Option<NodeId>,
    progress: Option<ReadOnly<f32>>,
    written: Option<f32>,
}

impl ProgressBar {
    pub fn new(config: ProgressBarConfig) -> Self {
        Self {
            config,
            bar: None,
            progress: None,
            written: None,
        }
    }

    fn sync(&mut self, ctx: &mut MotionContext) {
        let (Some(bar), Some(progress)) = (self.bar, &self.progress) else {
            return;
        };
        let value = progress.get();
        if self.written != Some(value) {
            ctx.set(bar, &[(Property::ScaleX, PropertyValue::Float(value))]);
            self.written = Some(value);
        }
    }
}

impl Effect for ProgressBar {
    fn name(&self) -> &str {
        "progress-bar"
    }

    fn start(&mut self, ctx: &mut MotionContext, _id: EffectId) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let nodes = ctx.require(&self.config.selector)?;
        self.bar = nodes.first().copied();
        self.progress = Some(ctx.tracker.progress());
        self.written = None;
        self.sync(ctx);
        Ok(())
    }

    fn update(&mut self, ctx: &mut MotionContext, _frame: &FrameInfo) {
        self.sync(ctx);
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        if let Some(bar) = self.bar.take() {
            ctx.reset(bar, &[Property::ScaleX]);
        }
        self.progress = None;
        self.written = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlaybackController;
    use crate::device::{DeviceProfile, DeviceTier};
    use vitrine_core::{NodeSpec, Rect, SceneSurface, Viewport};

    #[test]
    fn test_bar_follows_progress() {
        let mut scene = SceneSurface::new(Viewport::new(1280.0, 800.0, 1800.0));
        let bar = scene.insert_element(NodeSpec::new("div").id("scroll-progress").bounds(Rect::new(0.0, 0.0, 1280.0, 4.0)));
        scene.scroll_to(500.0);
        let profile = DeviceProfile {
            tier: DeviceTier::Desktop,
            reduced_motion: true,
            time_scale: 1.0,
            particle_cap: 30,
        };
        let playback = PlaybackController::new(30);
        let mut ctx = MotionContext::new(Box::new(scene), profile, &playback, 1);

        let mut effect = ProgressBar::new(ProgressBarConfig::default());
        effect.start(&mut ctx, EffectId(7)).unwrap();
        assert_eq!(ctx.surface.property(bar, Property::ScaleX), Some(PropertyValue::Float(0.0)));

        let viewport = ctx.viewport();
        ctx.tracker.update_progress(&viewport);
        effect.update(
            &mut ctx,
            &FrameInfo {
                now: 0.0,
                dt_ms: 16.0,
                time_scale: 0.0,
            },
        );
        assert_eq!(ctx.surface.property(bar, Property::ScaleX), Some(PropertyValue::Float(0.5)));
    }
}
