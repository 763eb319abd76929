//! Scroll reveals
//!
//! Every node matching the selector gets a trigger. Transitions map onto the
//! configured [`ToggleActions`](crate::config::ToggleActions); batched reveals
//! receive all nodes that crossed together and stagger them.
//!
//! A reveal may carry mobile and tablet variants. The variant for the current
//! tier is resolved on start, and a tier change that selects a different
//! variant re-registers the reveal.

use rustc_hash::FxHashMap;
use vitrine_animation::TweenSpec;
use vitrine_core::{NodeId, NodeSpec, Property, PropertyValue};

use super::{Effect, EffectId};
use crate::config::{RevealConfig, ToggleAction};
use crate::context::MotionContext;
use crate::device::DeviceProfile;
use crate::error::Result;
use crate::trigger::{TriggerConfig, TriggerEvent, TriggerKind};

pub struct ScrollReveal {
    base: RevealConfig,
    /// `base` resolved for the tier it was last started on
    config: RevealConfig,
    /// Observed page node -> node that is actually animated
    targets: FxHashMap<NodeId, NodeId>,
    /// Layer-owned overlays, in creation order
    overlays: Vec<NodeId>,
    id: Option<EffectId>,
}

impl ScrollReveal {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config: config.clone(),
            base: config,
            targets: FxHashMap::default(),
            overlays: Vec::new(),
            id: None,
        }
    }

    /// The reveal as currently played
    pub fn resolved(&self) -> &RevealConfig {
        &self.config
    }

    /// Node animated for an observed node
    pub fn target_of(&self, node: NodeId) -> Option<NodeId> {
        self.targets.get(&node).copied()
    }

    /// Values the node rests at before it is revealed
    fn resting_values(&self) -> Vec<(Property, PropertyValue)> {
        match &self.config.from {
            Some(from) => from.to_list().into_vec(),
            None => self
                .config
                .to
                .to_list()
                .iter()
                .map(|(p, _)| (*p, p.initial_value()))
                .collect(),
        }
    }

    fn written_properties(&self) -> Vec<Property> {
        let mut properties: Vec<Property> = self.config.to.to_list().iter().map(|(p, _)| *p).collect();
        if let Some(from) = &self.config.from {
            for (p, _) in from.to_list() {
                if !properties.contains(&p) {
                    properties.push(p);
                }
            }
        }
        properties
    }

    fn perform(&self, ctx: &mut MotionContext, action: ToggleAction, target: NodeId, delay_ms: f32) {
        let c = &self.config;
        match action {
            ToggleAction::Play => {
                let spec = c.to.tween(c.duration_ms, c.easing).delay(delay_ms);
                ctx.animate(target, &spec);
            }
            ToggleAction::Reverse => {
                let mut spec = TweenSpec::to(c.duration_ms).ease(c.easing).delay(delay_ms);
                spec.to = self.resting_values().into_iter().collect();
                ctx.animate(target, &spec);
            }
            ToggleAction::Dim => {
                ctx.set(target, &[(Property::Opacity, PropertyValue::Float(c.dim_opacity))]);
            }
            ToggleAction::Restore => {
                let spec = TweenSpec::to(c.restore_ms).opacity(1.0).delay(delay_ms);
                ctx.animate(target, &spec);
            }
            ToggleAction::None => {}
        }
    }
}

impl Effect for ScrollReveal {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn start(&mut self, ctx: &mut MotionContext, id: EffectId) -> Result<()> {
        self.config = self.base.for_tier(ctx.profile().tier);
        let nodes = ctx.require(&self.config.selector)?;
        self.id = Some(id);

        if ctx.reduced_motion() {
            // Decorative overlays are skipped; content lands in its final state
            if self.config.overlay.is_none() {
                let to = self.config.to.to_list();
                for node in nodes {
                    ctx.set(node, &to);
                    self.targets.insert(node, node);
                }
            }
            return Ok(());
        }

        let batch = self.config.batch.then(|| ctx.tracker.create_batch(id));
        let resting = self.config.from.map(|from| from.to_list());

        for node in nodes {
            let target = match &self.config.overlay {
                Some(class) => {
                    let bounds = ctx.surface.bounds(node).unwrap_or_default();
                    let overlay = ctx.create_node(Some(node), NodeSpec::new("div").class(class.clone()).bounds(bounds));
                    self.overlays.push(overlay);
                    overlay
                }
                None => node,
            };
            if let Some(resting) = &resting {
                ctx.set(target, resting);
            }
            self.targets.insert(node, target);

            let mut trigger = TriggerConfig::new(node, id, self.config.start).end(self.config.end);
            if let Some(batch) = batch {
                trigger = trigger.batch(batch);
            }
            ctx.tracker.register(trigger);
        }

        tracing::debug!(
            reveal = %self.config.name,
            tier = %ctx.profile().tier,
            nodes = self.targets.len(),
            "reveal registered"
        );
        Ok(())
    }

    fn on_trigger(&mut self, ctx: &mut MotionContext, event: &TriggerEvent) {
        let actions = &self.config.actions;
        let action = match event.kind {
            TriggerKind::Enter => actions.enter,
            TriggerKind::Leave => actions.leave,
            TriggerKind::EnterBack => actions.enter_back,
            TriggerKind::LeaveBack => actions.leave_back,
            TriggerKind::Scrub(_) => return,
        };
        if action == ToggleAction::None {
            return;
        }

        for (i, node) in event.nodes.iter().enumerate() {
            let Some(target) = self.target_of(*node) else {
                continue;
            };
            let delay = i as f32 * self.config.stagger_ms;
            self.perform(ctx, action, target, delay);
        }
    }

    fn on_profile_change(&mut self, ctx: &mut MotionContext, profile: &DeviceProfile) {
        if !self.base.has_variants() || ctx.reduced_motion() {
            return;
        }
        if self.base.for_tier(profile.tier) == self.config {
            return;
        }
        let Some(id) = self.id else { return };
        self.stop(ctx);
        if let Err(err) = self.start(ctx, id) {
            tracing::warn!(reveal = %self.base.name, error = %err, "reveal restart failed");
        }
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        if let Some(id) = self.id.take() {
            ctx.tracker.remove_owner(id);
        }
        let properties = self.written_properties();
        for (node, target) in self.targets.drain() {
            if node == target {
                ctx.reset(node, &properties);
            }
        }
        for overlay in self.overlays.drain(..) {
            ctx.remove_node(overlay);
        }
    }
}
