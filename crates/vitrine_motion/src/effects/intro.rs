//! Page-load intro
//!
//! One master timeline: headings rise in, then subheadings, paragraphs and the
//! call-to-action buttons, each group overlapping the previous one.

use vitrine_animation::{Sequence, SequenceStep, TweenId};
use vitrine_core::{NodeId, Property};

use super::{Effect, EffectId};
use crate::config::IntroConfig;
use crate::context::MotionContext;
use crate::error::{MotionError, Result};

pub struct IntroSequence {
    config: IntroConfig,
    tweens: Vec<TweenId>,
    /// Every node the intro wrote to, with the properties written
    written: Vec<(NodeId, Vec<Property>)>,
}

impl IntroSequence {
    pub fn new(config: IntroConfig) -> Self {
        Self {
            config,
            tweens: Vec::new(),
            written: Vec::new(),
        }
    }

    /// Build the timeline against the current page
    pub fn build(&self, ctx: &MotionContext) -> Sequence {
        let mut sequence = Sequence::new();
        for step in &self.config.steps {
            let nodes = ctx.query(&step.selector);
            if nodes.is_empty() {
                tracing::debug!(selector = %step.selector, "intro step has no nodes");
                continue;
            }
            let mut spec = step.to.tween(step.duration_ms, step.easing);
            if let Some(from) = &step.from {
                spec.from = from.to_list();
            }
            sequence = sequence.then(SequenceStep::new(nodes, spec).stagger(step.stagger()).at(step.position));
        }
        sequence
    }

    pub fn running_tweens(&self) -> usize {
        self.tweens.len()
    }
}

impl Effect for IntroSequence {
    fn name(&self) -> &str {
        "intro"
    }

    fn start(&mut self, ctx: &mut MotionContext, _id: EffectId) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let sequence = self.build(ctx);
        if sequence.is_empty() {
            return Err(MotionError::MissingAnchor("intro headings".into()));
        }

        for step in sequence.steps() {
            let properties: Vec<Property> = step.spec.to.iter().map(|(p, _)| *p).collect();
            for &node in &step.nodes {
                self.written.push((node, properties.clone()));
            }
        }

        if ctx.reduced_motion() {
            for step in sequence.steps() {
                for &node in &step.nodes {
                    ctx.set(node, &step.spec.to);
                }
            }
            return Ok(());
        }

        for step in sequence.steps() {
            for &node in &step.nodes {
                ctx.touch(node);
            }
        }
        self.tweens = sequence.play(&mut ctx.scheduler, ctx.surface.as_mut());
        tracing::debug!(duration_ms = sequence.duration_ms(), "intro started");
        Ok(())
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        for id in self.tweens.drain(..) {
            ctx.scheduler.kill(id);
        }
        for (node, properties) in self.written.drain(..) {
            ctx.reset(node, &properties);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlaybackController;
    use crate::device::{DeviceProfile, DeviceTier};
    use vitrine_core::{NodeSpec, PropertyValue, Rect, SceneSurface, Viewport};

    fn context(reduced_motion: bool) -> (MotionContext, NodeId, NodeId) {
        let mut scene = SceneSurface::new(Viewport::new(1280.0, 800.0, 2000.0));
        let h1 = scene.insert_element(NodeSpec::new("h1").bounds(Rect::new(0.0, 100.0, 800.0, 80.0)));
        let cta = scene.insert_element(
            NodeSpec::new("a")
                .class("cta-button")
                .bounds(Rect::new(0.0, 300.0, 200.0, 50.0)),
        );
        let profile = DeviceProfile {
            tier: DeviceTier::Desktop,
            reduced_motion,
            time_scale: 1.0,
            particle_cap: 30,
        };
        let playback = PlaybackController::new(30);
        (MotionContext::new(Box::new(scene), profile, &playback, 1), h1, cta)
    }

    #[test]
    fn test_skips_missing_groups() {
        let (ctx, _, _) = context(false);
        let intro = IntroSequence::new(IntroConfig::default());
        let sequence = intro.build(&ctx);
        // h1 and .cta-button exist; h2/h3 and p do not
        assert_eq!(sequence.steps().len(), 2);
    }

    #[test]
    fn test_intro_plays_and_settles() {
        let (mut ctx, h1, cta) = context(false);
        let mut intro = IntroSequence::new(IntroConfig::default());
        intro.start(&mut ctx, EffectId(9)).unwrap();

        // From-states apply immediately, even to delayed steps
        assert_eq!(ctx.surface.property(h1, Property::Opacity), Some(PropertyValue::Float(0.0)));
        assert_eq!(ctx.surface.property(cta, Property::Scale), Some(PropertyValue::Float(0.8)));

        for _ in 0..40 {
            ctx.scheduler.tick(ctx.surface.as_mut(), 100.0);
        }
        assert!(!ctx.scheduler.has_active_tweens());
        assert_eq!(ctx.surface.property(h1, Property::Opacity), Some(PropertyValue::Float(1.0)));
        assert_eq!(ctx.surface.property(cta, Property::Scale), Some(PropertyValue::Float(1.0)));

        intro.stop(&mut ctx);
        assert_eq!(ctx.surface.property(h1, Property::Opacity), Some(PropertyValue::Float(1.0)));
        assert_eq!(ctx.surface.property(h1, Property::TranslateY), Some(PropertyValue::Float(0.0)));
    }

    #[test]
    fn test_reduced_motion_lands_final_state() {
        let (mut ctx, h1, _) = context(true);
        let mut intro = IntroSequence::new(IntroConfig::default());
        intro.start(&mut ctx, EffectId(9)).unwrap();
        assert!(!ctx.scheduler.has_active_tweens());
        assert_eq!(ctx.surface.property(h1, Property::Opacity), Some(PropertyValue::Float(1.0)));
    }
}
