//! Scrub-linked parallax
//!
//! Desktop only. Each layer node shifts by `-50% * speed` as it travels through
//! its scroll window, so slower layers appear further away.

use rustc_hash::FxHashMap;
use vitrine_core::{NodeId, Property, PropertyValue};

use super::{Effect, EffectId};
use crate::config::ParallaxConfig;
use crate::context::MotionContext;
use crate::device::DeviceProfile;
use crate::error::{MotionError, Result};
use crate::trigger::{TriggerConfig, TriggerEvent, TriggerKind};

pub struct Parallax {
    config: ParallaxConfig,
    /// Speed per node; the first layer that matches a node wins
    speeds: FxHashMap<NodeId, f32>,
    id: Option<EffectId>,
    active: bool,
}

impl Parallax {
    pub fn new(config: ParallaxConfig) -> Self {
        Self {
            config,
            speeds: FxHashMap::default(),
            id: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `y_percent` for a node at `progress` through its window
    pub fn offset(speed: f32, progress: f32) -> f32 {
        -50.0 * speed * progress.clamp(0.0, 1.0)
    }
}

impl Effect for Parallax {
    fn name(&self) -> &str {
        "parallax"
    }

    fn start(&mut self, ctx: &mut MotionContext, id: EffectId) -> Result<()> {
        self.id = Some(id);
        let profile = ctx.profile();
        if !self.config.enabled || ctx.reduced_motion() || !profile.is_desktop() {
            tracing::debug!(tier = %profile.tier, "parallax disabled for this device");
            return Ok(());
        }

        for layer in &self.config.layers {
            for node in ctx.query(&layer.selector) {
                self.speeds.entry(node).or_insert(layer.speed);
            }
        }
        if self.speeds.is_empty() {
            return Err(MotionError::MissingAnchor("parallax layers".into()));
        }

        for &node in self.speeds.keys() {
            let trigger = TriggerConfig::new(node, id, self.config.start)
                .end(self.config.end)
                .scrub();
            ctx.tracker.register(trigger);
        }
        self.active = true;
        Ok(())
    }

    fn on_trigger(&mut self, ctx: &mut MotionContext, event: &TriggerEvent) {
        let TriggerKind::Scrub(progress) = event.kind else {
            return;
        };
        for node in &event.nodes {
            if let Some(speed) = self.speeds.get(node) {
                let offset = Self::offset(*speed, progress);
                ctx.set(*node, &[(Property::YPercent, PropertyValue::Float(offset))]);
            }
        }
    }

    fn on_profile_change(&mut self, ctx: &mut MotionContext, profile: &DeviceProfile) {
        if !self.config.enabled || ctx.reduced_motion() || profile.is_desktop() == self.active {
            return;
        }
        let Some(id) = self.id else { return };
        self.stop(ctx);
        if let Err(err) = self.start(ctx, id) {
            tracing::warn!(error = %err, "parallax restart failed");
        }
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        if let Some(id) = self.id {
            ctx.tracker.remove_owner(id);
        }
        for (node, _) in self.speeds.drain() {
            ctx.reset(node, &[Property::YPercent]);
        }
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlaybackController;
    use crate::device::DeviceTier;
    use vitrine_core::{NodeSpec, Rect, SceneSurface, Viewport};

    fn context(tier: DeviceTier) -> (MotionContext, NodeId) {
        let mut scene = SceneSurface::new(Viewport::new(1280.0, 800.0, 800.0));
        let card = scene.insert_element(
            NodeSpec::new("div")
                .class("service-card")
                .bounds(Rect::new(0.0, 1000.0, 400.0, 200.0)),
        );
        scene.insert_element(NodeSpec::new("footer").bounds(Rect::new(0.0, 3000.0, 1280.0, 400.0)));
        let profile = DeviceProfile {
            tier,
            reduced_motion: false,
            time_scale: 1.0,
            particle_cap: 30,
        };
        let playback = PlaybackController::new(30);
        (MotionContext::new(Box::new(scene), profile, &playback, 1), card)
    }

    #[test]
    fn test_offset() {
        assert_eq!(Parallax::offset(0.5, 0.0), 0.0);
        assert_eq!(Parallax::offset(0.5, 1.0), -25.0);
        assert!((Parallax::offset(0.3, 2.0) + 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_scrub_writes_y_percent() {
        let (mut ctx, card) = context(DeviceTier::Desktop);
        let mut parallax = Parallax::new(ParallaxConfig::default());
        parallax.start(&mut ctx, EffectId(4)).unwrap();
        assert!(parallax.is_active());

        ctx.tracker.evaluate(ctx.surface.as_ref());
        let events = ctx.tracker.evaluate(ctx.surface.as_ref());
        assert!(events.is_empty());

        let event = TriggerEvent {
            owner: EffectId(4),
            trigger: Default::default(),
            batch: None,
            kind: TriggerKind::Scrub(0.5),
            nodes: [card].into_iter().collect(),
        };
        parallax.on_trigger(&mut ctx, &event);
        let offset = ctx
            .surface
            .property(card, Property::YPercent)
            .and_then(|v| v.as_float())
            .unwrap();
        assert!((offset + 7.5).abs() < 1e-4);
    }

    #[test]
    fn test_inactive_off_desktop() {
        let (mut ctx, _) = context(DeviceTier::Mobile);
        let mut parallax = Parallax::new(ParallaxConfig::default());
        parallax.start(&mut ctx, EffectId(4)).unwrap();
        assert!(!parallax.is_active());
        assert_eq!(ctx.tracker.trigger_count(), 0);

        let desktop = DeviceProfile {
            tier: DeviceTier::Desktop,
            reduced_motion: false,
            time_scale: 1.0,
            particle_cap: 30,
        };
        ctx.set_profile(desktop);
        parallax.on_profile_change(&mut ctx, &desktop);
        assert!(parallax.is_active());
        assert_eq!(ctx.tracker.trigger_count(), 1);
    }

    #[test]
    fn test_disabled_parallax_stays_off_on_desktop() {
        let (mut ctx, card) = context(DeviceTier::Mobile);
        let mut parallax = Parallax::new(ParallaxConfig {
            enabled: false,
            ..ParallaxConfig::default()
        });
        parallax.start(&mut ctx, EffectId(4)).unwrap();

        let desktop = DeviceProfile {
            tier: DeviceTier::Desktop,
            reduced_motion: false,
            time_scale: 1.0,
            particle_cap: 30,
        };
        ctx.set_profile(desktop);
        parallax.on_profile_change(&mut ctx, &desktop);
        assert!(!parallax.is_active());
        assert_eq!(ctx.tracker.trigger_count(), 0);
        assert_eq!(ctx.surface.property(card, Property::YPercent), None);
    }
}
