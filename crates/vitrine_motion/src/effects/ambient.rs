//! Ambient loops
//!
//! Decorative infinite tweens: the rotating and breathing aurora, the marquee
//! strip, the card glow, floating hero letters, the button pulse and the
//! progress bar glow. Loops with a start delay wait on scaled frame time, so
//! they hold while playback is frozen. Loops never run under reduced motion.

use rustc_hash::FxHashMap;
use vitrine_animation::{TweenId, TweenSpec};
use vitrine_core::{NodeId, NodeSpec, Property, Rect};

use super::{Effect, EffectId, FrameInfo};
use crate::config::{AmbientConfig, LoopConfig};
use crate::context::MotionContext;
use crate::error::Result;

pub struct AmbientLoops {
    config: AmbientConfig,
    /// Created nodes by class; loops naming the same class share one node
    created: FxHashMap<String, NodeId>,
    /// Page nodes the loops write to, with the properties written
    page_nodes: Vec<(NodeId, Property)>,
    tweens: Vec<TweenId>,
    /// Loops waiting for their start delay
    pending: Vec<LoopConfig>,
    elapsed_ms: f32,
}

impl AmbientLoops {
    pub fn new(config: AmbientConfig) -> Self {
        Self {
            config,
            created: FxHashMap::default(),
            page_nodes: Vec::new(),
            tweens: Vec::new(),
            pending: Vec::new(),
            elapsed_ms: 0.0,
        }
    }

    pub fn running_loops(&self) -> usize {
        self.tweens.len()
    }

    /// Loops still waiting for their start delay
    pub fn pending_loops(&self) -> usize {
        self.pending.len()
    }

    fn start_loop(&mut self, ctx: &mut MotionContext, effect: &LoopConfig) {
        let nodes = self.nodes_for(ctx, effect);
        if nodes.is_empty() {
            tracing::debug!(name = %effect.name, "ambient loop has no nodes");
            return;
        }

        for (i, node) in nodes.into_iter().enumerate() {
            let jitter = effect.jitter_ms * ctx.rng.f32();
            let mut spec = TweenSpec::to(effect.duration_ms + jitter)
                .ease(effect.easing)
                .delay(i as f32 * effect.stagger_ms)
                .looping(effect.yoyo);
            spec.to = effect.to.to_list();

            if !ctx.owns(node) {
                for (property, _) in &spec.to {
                    self.page_nodes.push((node, *property));
                }
            }
            self.tweens.extend(ctx.animate(node, &spec));
        }
    }

    fn nodes_for(&mut self, ctx: &mut MotionContext, effect: &LoopConfig) -> Vec<NodeId> {
        if let Some(selector) = &effect.selector {
            return ctx.query(selector);
        }
        let Some(class) = &effect.create else {
            return Vec::new();
        };
        if let Some(node) = self.created.get(class) {
            return vec![*node];
        }
        let viewport = ctx.viewport();
        let node = ctx.create_node(
            None,
            NodeSpec::new("div")
                .class(class.clone())
                .bounds(Rect::new(0.0, 0.0, viewport.width, viewport.height)),
        );
        self.created.insert(class.clone(), node);
        vec![node]
    }
}

impl Effect for AmbientLoops {
    fn name(&self) -> &str {
        "ambient"
    }

    fn start(&mut self, ctx: &mut MotionContext, _id: EffectId) -> Result<()> {
        if !self.config.enabled || ctx.reduced_motion() {
            return Ok(());
        }

        let loops = self.config.loops.clone();
        for effect in loops {
            if effect.start_after_ms > 0.0 {
                self.pending.push(effect);
            } else {
                self.start_loop(ctx, &effect);
            }
        }

        tracing::debug!(loops = self.tweens.len(), pending = self.pending.len(), "ambient loops started");
        Ok(())
    }

    fn update(&mut self, ctx: &mut MotionContext, frame: &FrameInfo) {
        if self.pending.is_empty() {
            return;
        }
        self.elapsed_ms += frame.scaled_dt();
        let elapsed = self.elapsed_ms;
        let (due, waiting): (Vec<LoopConfig>, Vec<LoopConfig>) =
            std::mem::take(&mut self.pending).into_iter().partition(|l| l.start_after_ms <= elapsed);
        self.pending = waiting;
        for effect in &due {
            self.start_loop(ctx, effect);
        }
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        self.pending.clear();
        self.elapsed_ms = 0.0;
        for id in self.tweens.drain(..) {
            ctx.scheduler.kill(id);
        }
        for (node, property) in self.page_nodes.drain(..) {
            ctx.reset(node, &[property]);
        }
        for (_, node) in self.created.drain() {
            ctx.remove_node(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlaybackController;
    use crate::device::{DeviceProfile, DeviceTier};
    use vitrine_core::{SceneSurface, Selector, Viewport};

    fn context(reduced_motion: bool) -> MotionContext {
        let mut scene = SceneSurface::new(Viewport::new(1280.0, 800.0, 3000.0));
        for i in 0..2 {
            scene.insert_element(
                NodeSpec::new("div")
                    .class("service-card")
                    .bounds(Rect::new(i as f32 * 400.0, 1000.0, 380.0, 300.0)),
            );
        }
        scene.insert_element(NodeSpec::new("div").id("scroll-progress").bounds(Rect::new(0.0, 0.0, 1280.0, 4.0)));
        scene.insert_element(NodeSpec::new("a").class("cta-button").bounds(Rect::new(40.0, 400.0, 200.0, 50.0)));
        let profile = DeviceProfile {
            tier: DeviceTier::Desktop,
            reduced_motion,
            time_scale: 1.0,
            particle_cap: 30,
        };
        let playback = PlaybackController::new(30);
        MotionContext::new(Box::new(scene), profile, &playback, 1)
    }

    #[test]
    fn test_default_loops() {
        let mut ctx = context(false);
        let mut ambient = AmbientLoops::new(AmbientConfig::default());
        ambient.start(&mut ctx, EffectId(6)).unwrap();

        // aurora (shared by two loops) + marquee
        assert_eq!(ctx.surface.layer_node_count(), 2);
        // spin, breathe, marquee, two card glows, progress glow
        assert_eq!(ambient.running_loops(), 6);
        assert_eq!(ctx.scheduler.looping_count(), 6);
        assert_eq!(ambient.pending_loops(), 1);

        ambient.stop(&mut ctx);
        assert_eq!(ctx.surface.layer_node_count(), 0);
        assert_eq!(ctx.scheduler.looping_count(), 0);
        assert_eq!(ambient.pending_loops(), 0);
    }

    #[test]
    fn test_button_pulse_waits_for_start_delay() {
        let mut ctx = context(false);
        let button = ctx.query(&Selector::class("cta-button"))[0];
        let mut ambient = AmbientLoops::new(AmbientConfig::default());
        ambient.start(&mut ctx, EffectId(6)).unwrap();
        assert!(!ctx.scheduler.is_animating(button, Property::Scale));

        let frame = |time_scale| FrameInfo {
            now: 0.0,
            dt_ms: 1_000.0,
            time_scale,
        };
        // Frozen playback does not advance the delay
        ambient.update(&mut ctx, &frame(0.0));
        assert_eq!(ambient.pending_loops(), 1);
        for _ in 0..3 {
            ambient.update(&mut ctx, &frame(1.0));
        }
        assert_eq!(ambient.pending_loops(), 0);
        assert_eq!(ambient.running_loops(), 7);
        assert!(ctx.scheduler.is_animating(button, Property::Scale));

        ctx.scheduler.tick(ctx.surface.as_mut(), 1_000.0);
        let scale = ctx
            .surface
            .property(button, Property::Scale)
            .and_then(|v| v.as_float())
            .unwrap();
        assert!(scale > 1.0 && scale < 1.05);

        ambient.stop(&mut ctx);
        let scale = ctx.surface.property(button, Property::Scale).and_then(|v| v.as_float());
        assert_eq!(scale, Some(1.0));
    }

    #[test]
    fn test_reduced_motion_starts_no_loops() {
        let mut ctx = context(true);
        let mut ambient = AmbientLoops::new(AmbientConfig::default());
        ambient.start(&mut ctx, EffectId(6)).unwrap();
        assert_eq!(ambient.running_loops(), 0);
        assert_eq!(ctx.surface.layer_node_count(), 0);
    }
}
