//! Counting statistics
//!
//! Nodes carrying a numeric `data-count` attribute count up from zero the
//! first time they scroll into view. The counter snaps to whole numbers.

use rustc_hash::FxHashMap;
use vitrine_animation::TweenSpec;
use vitrine_core::{NodeId, Property, PropertyValue};

use super::{Effect, EffectId};
use crate::config::CountUpConfig;
use crate::context::MotionContext;
use crate::error::Result;
use crate::trigger::{TriggerConfig, TriggerEvent, TriggerId, TriggerKind};

pub struct CountUp {
    config: CountUpConfig,
    /// Target value per node that has not counted yet
    pending: FxHashMap<NodeId, (TriggerId, f32)>,
    counted: Vec<NodeId>,
}

impl CountUp {
    pub fn new(config: CountUpConfig) -> Self {
        Self {
            config,
            pending: FxHashMap::default(),
            counted: Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn target_of(&self, ctx: &MotionContext, node: NodeId) -> Option<f32> {
        let raw = ctx.surface.attribute(node, &self.config.attribute)?;
        match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                tracing::warn!(value = %raw, "ignoring non-numeric count target");
                None
            }
        }
    }
}

impl Effect for CountUp {
    fn name(&self) -> &str {
        "count-up"
    }

    fn start(&mut self, ctx: &mut MotionContext, id: EffectId) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let nodes = ctx.require(&self.config.selector)?;

        for node in nodes {
            let Some(target) = self.target_of(ctx, node) else {
                continue;
            };
            if ctx.reduced_motion() {
                ctx.set(node, &[(Property::Counter, PropertyValue::Float(target))]);
                self.counted.push(node);
                continue;
            }
            ctx.set(node, &[(Property::Counter, PropertyValue::Float(0.0))]);
            let trigger = ctx.tracker.register(TriggerConfig::new(node, id, self.config.start));
            self.pending.insert(node, (trigger, target));
        }
        Ok(())
    }

    fn on_trigger(&mut self, ctx: &mut MotionContext, event: &TriggerEvent) {
        if !matches!(event.kind, TriggerKind::Enter | TriggerKind::EnterBack) {
            return;
        }
        for node in &event.nodes {
            // Count once, then forget the trigger
            let Some((trigger, target)) = self.pending.remove(node) else {
                continue;
            };
            ctx.tracker.unregister(trigger);
            let spec = TweenSpec::to(self.config.duration_ms)
                .prop(Property::Counter, target)
                .ease(self.config.easing)
                .snap(1.0);
            ctx.animate(*node, &spec);
            self.counted.push(*node);
        }
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        for (node, (trigger, _)) in self.pending.drain() {
            ctx.tracker.unregister(trigger);
            ctx.reset(node, &[Property::Counter]);
        }
        for node in self.counted.drain(..) {
            ctx.reset(node, &[Property::Counter]);
        }
    }
}
