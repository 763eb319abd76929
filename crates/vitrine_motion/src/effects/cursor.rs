//! Custom cursor
//!
//! A small layer-owned dot eases toward the pointer every frame and grows while
//! an interactive element is hovered. Desktop only; nothing is created under
//! reduced motion.

use rustc_hash::FxHashSet;
use vitrine_animation::TweenSpec;
use vitrine_core::{HostEvent, NodeId, NodeSpec, Point, Property, PropertyValue, Rect};

use super::{Effect, EffectId, FrameInfo};
use crate::config::CursorConfig;
use crate::context::MotionContext;
use crate::device::DeviceProfile;
use crate::error::Result;

/// Frame length the smoothing factor is tuned for
const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

pub struct CustomCursor {
    config: CursorConfig,
    node: Option<NodeId>,
    interactive: FxHashSet<NodeId>,
    position: Point,
    target: Point,
    id: Option<EffectId>,
}

impl CustomCursor {
    pub fn new(config: CursorConfig) -> Self {
        Self {
            config,
            node: None,
            interactive: FxHashSet::default(),
            position: Point::ZERO,
            target: Point::ZERO,
            id: None,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Share of the remaining distance covered in `dt_ms`, independent of frame rate
    fn follow_factor(&self, dt_ms: f32) -> f32 {
        1.0 - (1.0 - self.config.smoothing).powf(dt_ms / REFERENCE_FRAME_MS)
    }

    fn hover(&self, ctx: &mut MotionContext, scale: f32) {
        if let Some(node) = self.node {
            let spec = TweenSpec::to(self.config.hover_ms)
                .scale(scale)
                .ease(self.config.hover_easing);
            ctx.animate(node, &spec);
        }
    }
}

impl Effect for CustomCursor {
    fn name(&self) -> &str {
        "cursor"
    }

    fn start(&mut self, ctx: &mut MotionContext, id: EffectId) -> Result<()> {
        self.id = Some(id);
        if !self.config.enabled || ctx.reduced_motion() || !ctx.profile().is_desktop() {
            return Ok(());
        }

        let size = self.config.size;
        let node = ctx.create_node(
            None,
            NodeSpec::new("div")
                .class("custom-cursor")
                .bounds(Rect::new(0.0, 0.0, size, size)),
        );
        self.node = Some(node);
        self.interactive = ctx.query(&self.config.interactive).into_iter().collect();

        let viewport = ctx.viewport();
        self.position = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        self.target = self.position;
        Ok(())
    }

    fn update(&mut self, ctx: &mut MotionContext, frame: &FrameInfo) {
        let Some(node) = self.node else {
            return;
        };
        // Pointer following is input feedback, not decoration: wall time, not scaled time
        let k = self.follow_factor(frame.dt_ms);
        self.position.x += (self.target.x - self.position.x) * k;
        self.position.y += (self.target.y - self.position.y) * k;

        let half = self.config.size / 2.0;
        ctx.surface
            .set_property(node, Property::TranslateX, PropertyValue::Float(self.position.x - half));
        ctx.surface
            .set_property(node, Property::TranslateY, PropertyValue::Float(self.position.y - half));
    }

    fn on_event(&mut self, ctx: &mut MotionContext, event: &HostEvent) {
        if self.node.is_none() {
            return;
        }
        match event {
            HostEvent::PointerMove { position } => self.target = *position,
            HostEvent::PointerEnter { node } if self.interactive.contains(node) => {
                self.hover(ctx, self.config.hover_scale);
            }
            HostEvent::PointerLeave { node } if self.interactive.contains(node) => {
                self.hover(ctx, 1.0);
            }
            _ => {}
        }
    }

    fn on_profile_change(&mut self, ctx: &mut MotionContext, profile: &DeviceProfile) {
        if !self.config.enabled || ctx.reduced_motion() || profile.is_desktop() == self.node.is_some() {
            return;
        }
        let Some(id) = self.id else { return };
        self.stop(ctx);
        if let Err(err) = self.start(ctx, id) {
            tracing::warn!(error = %err, "cursor restart failed");
        }
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        if let Some(node) = self.node.take() {
            ctx.remove_node(node);
        }
        self.interactive.clear();
    }
}
