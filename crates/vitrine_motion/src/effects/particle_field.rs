//! Background particle effects
//!
//! Two renderings of a [`ParticleField`]: gold motes rising through a fixed
//! overlay of page nodes, and soft colored blobs drifting across a full-screen
//! canvas. Both honor the particle budget every frame and create nothing at all
//! under reduced motion.

use vitrine_animation::{Easing, TweenSpec};
use vitrine_core::{CanvasId, Color, NodeId, NodeSpec, Point, Property, PropertyValue, Rect, Size, Vec2};

use super::{Effect, EffectId, FrameInfo};
use crate::config::{BlobConfig, DriftConfig};
use crate::context::MotionContext;
use crate::error::Result;
use crate::particles::{EdgeMode, Particle, ParticleField};

/// Nominal frame length that blob speeds are expressed in
const FRAME_MS: f32 = 1000.0 / 60.0;

fn between(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    min + rng.f32() * (max - min)
}

fn viewport_size(ctx: &MotionContext) -> Size {
    let viewport = ctx.viewport();
    Size::new(viewport.width, viewport.height)
}

// =============================================================================
// Drift particles
// =============================================================================

/// Gold particles rising through `#floating-particles`
pub struct DriftParticles {
    config: DriftConfig,
    container: Option<NodeId>,
    field: ParticleField,
    /// Hidden nodes of expired particles, reused by later spawns
    free_nodes: Vec<NodeId>,
    spawn_clock: f32,
}

impl DriftParticles {
    pub fn new(config: DriftConfig) -> Self {
        let overscan = config.overscan;
        Self {
            config,
            container: None,
            field: ParticleField::new(Size::ZERO, EdgeMode::Wrap).overscan(overscan),
            free_nodes: Vec::new(),
            spawn_clock: 0.0,
        }
    }

    /// The overlay node, while running
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    fn spawn(&mut self, ctx: &mut MotionContext, container: NodeId, lifetime_ms: Option<f32>) {
        let c = &self.config;
        let Size { width, height } = self.field.bounds();
        let rng = &mut ctx.rng;

        let size = between(rng, c.min_size, c.max_size);
        let duration = between(rng, c.min_duration_ms, c.max_duration_ms);
        let sway = between(rng, -c.sway, c.sway);
        // Looping particles start spread over the field; new arrivals come from below
        let y = match lifetime_ms {
            None => rng.f32() * height,
            Some(_) => height + rng.f32() * c.overscan,
        };
        let position = Point::new(rng.f32() * width, y);
        let velocity = Vec2::new(sway / duration, -(height + c.overscan) / duration);
        let peak = between(rng, c.min_opacity, c.max_opacity);
        let pulse = between(rng, c.min_pulse_ms, c.max_pulse_ms);
        let min_opacity = c.min_opacity;

        let node = match self.free_nodes.pop() {
            Some(node) => {
                ctx.surface.set_visible(node, true);
                node
            }
            None => ctx.create_node(
                Some(container),
                NodeSpec::new("div")
                    .class("floating-particle")
                    .bounds(Rect::new(0.0, 0.0, size, size)),
            ),
        };

        let pulse = TweenSpec::to(pulse)
            .from_prop(Property::Opacity, min_opacity)
            .opacity(peak)
            .ease(Easing::SineInOut)
            .looping(true);
        ctx.animate(node, &pulse);

        let mut particle = Particle::new(position, velocity, size).opacity(peak).node(node);
        if let Some(ms) = lifetime_ms {
            particle = particle.expires_after(ms);
        }
        self.field.spawn(particle);
    }

    fn render(&self, ctx: &mut MotionContext) {
        let active = self.field.active_count();
        for (i, p) in self.field.particles().iter().enumerate() {
            let Some(node) = p.node else { continue };
            let visible = i < active;
            ctx.surface.set_visible(node, visible);
            if visible {
                ctx.surface
                    .set_property(node, Property::TranslateX, PropertyValue::Float(p.position.x));
                ctx.surface
                    .set_property(node, Property::TranslateY, PropertyValue::Float(p.position.y));
            }
        }
    }
}

impl Effect for DriftParticles {
    fn name(&self) -> &str {
        "drift-particles"
    }

    fn start(&mut self, ctx: &mut MotionContext, _id: EffectId) -> Result<()> {
        if !self.config.enabled || ctx.reduced_motion() {
            return Ok(());
        }

        let size = viewport_size(ctx);
        let container = ctx.create_node(
            None,
            NodeSpec::new("div")
                .id("floating-particles")
                .class("floating-particles")
                .bounds(Rect::new(0.0, 0.0, size.width, size.height)),
        );
        self.container = Some(container);
        self.field.set_bounds(size);
        self.spawn_clock = 0.0;

        let looping = self.config.looping_particles.min(self.config.max_particles);
        for _ in 0..looping {
            self.spawn(ctx, container, None);
        }
        self.field.set_active_count(ctx.particle_budget());
        self.render(ctx);

        tracing::debug!(particles = self.field.len(), "drift particles started");
        Ok(())
    }

    fn update(&mut self, ctx: &mut MotionContext, frame: &FrameInfo) {
        let Some(container) = self.container else {
            return;
        };
        let budget = ctx.particle_budget();
        let dt = frame.scaled_dt();
        self.field.set_bounds(viewport_size(ctx));

        if self.config.spawn_interval_ms > 0.0 {
            self.spawn_clock += dt;
            if self.spawn_clock >= self.config.spawn_interval_ms {
                self.spawn_clock = 0.0;
                if self.field.len() < self.config.max_particles.min(budget) {
                    let c = &self.config;
                    let lifetime = between(&mut ctx.rng, c.min_lifetime_ms, c.max_lifetime_ms);
                    self.spawn(ctx, container, Some(lifetime));
                }
            }
        }

        for expired in self.field.update(dt) {
            if let Some(node) = expired.node {
                ctx.scheduler.kill_node(node);
                ctx.surface.set_visible(node, false);
                self.free_nodes.push(node);
            }
        }

        self.field.set_active_count(budget);
        self.render(ctx);
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        for particle in self.field.drain() {
            if let Some(node) = particle.node {
                ctx.remove_node(node);
            }
        }
        for node in self.free_nodes.drain(..) {
            ctx.remove_node(node);
        }
        if let Some(container) = self.container.take() {
            ctx.remove_node(container);
        }
    }
}

// =============================================================================
// Liquid blobs
// =============================================================================

/// Translucent blobs drifting across `#liquid-canvas`
pub struct LiquidBlobs {
    config: BlobConfig,
    max_particles: usize,
    node: Option<NodeId>,
    canvas: Option<CanvasId>,
    field: ParticleField,
}

impl LiquidBlobs {
    pub fn new(config: BlobConfig, max_particles: usize) -> Self {
        Self {
            config,
            max_particles,
            node: None,
            canvas: None,
            field: ParticleField::new(Size::ZERO, EdgeMode::Bounce),
        }
    }

    pub fn canvas(&self) -> Option<CanvasId> {
        self.canvas
    }

    /// Blobs drawn for a particle budget, in proportion to the maximum
    fn visible_for(&self, budget: usize) -> usize {
        if budget == 0 || self.max_particles == 0 {
            return 0;
        }
        (self.config.count * budget)
            .div_ceil(self.max_particles)
            .min(self.config.count)
    }

    fn draw(&self, ctx: &mut MotionContext, canvas: CanvasId) {
        ctx.surface.clear_canvas(canvas);
        for blob in self.field.active() {
            ctx.surface.draw_blob(canvas, blob.position, blob.size, blob.color);
        }
    }
}

impl Effect for LiquidBlobs {
    fn name(&self) -> &str {
        "liquid-blobs"
    }

    fn start(&mut self, ctx: &mut MotionContext, _id: EffectId) -> Result<()> {
        if !self.config.enabled || ctx.reduced_motion() {
            return Ok(());
        }

        let size = viewport_size(ctx);
        let node = ctx.create_node(
            None,
            NodeSpec::new("canvas")
                .id("liquid-canvas")
                .bounds(Rect::new(0.0, 0.0, size.width, size.height)),
        );
        let canvas = match ctx.acquire_canvas(node) {
            Ok(canvas) => canvas,
            Err(err) => {
                ctx.remove_node(node);
                return Err(err);
            }
        };
        self.node = Some(node);
        self.canvas = Some(canvas);
        self.field.set_bounds(size);

        let c = &self.config;
        for _ in 0..c.count {
            let rng = &mut ctx.rng;
            let radius = between(rng, c.min_radius, c.max_radius);
            let position = Point::new(rng.f32() * size.width, rng.f32() * size.height);
            let velocity = Vec2::new(
                between(rng, -c.max_speed, c.max_speed) / FRAME_MS,
                between(rng, -c.max_speed, c.max_speed) / FRAME_MS,
            );
            let hue = between(rng, c.min_hue, c.max_hue);
            let color = Color::hsla(hue, c.saturation, c.lightness, c.alpha);
            self.field.spawn(Particle::new(position, velocity, radius).color(color));
        }
        self.field.set_active_count(self.visible_for(ctx.particle_budget()));
        self.draw(ctx, canvas);

        tracing::debug!(blobs = self.field.len(), "liquid blobs started");
        Ok(())
    }

    fn update(&mut self, ctx: &mut MotionContext, frame: &FrameInfo) {
        let Some(canvas) = self.canvas else {
            return;
        };
        self.field.set_bounds(viewport_size(ctx));
        self.field.update(frame.scaled_dt());
        self.field.set_active_count(self.visible_for(ctx.particle_budget()));
        self.draw(ctx, canvas);
    }

    fn stop(&mut self, ctx: &mut MotionContext) {
        self.field.drain();
        if let Some(canvas) = self.canvas.take() {
            ctx.release_canvas(canvas);
        }
        if let Some(node) = self.node.take() {
            ctx.remove_node(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlaybackController;
    use crate::device::{DeviceProfile, DeviceTier};
    use crate::governor::GovernorCaps;
    use vitrine_core::{SceneSurface, Viewport};

    fn context(reduced_motion: bool) -> (MotionContext, PlaybackController) {
        let profile = DeviceProfile {
            tier: DeviceTier::Desktop,
            reduced_motion,
            time_scale: 1.0,
            particle_cap: 30,
        };
        let playback = PlaybackController::new(30);
        playback.apply(
            &profile,
            &GovernorCaps {
                time_scale: 1.0,
                particle_cap: 30,
            },
        );
        let scene = SceneSurface::new(Viewport::new(1280.0, 800.0, 3000.0));
        (MotionContext::new(Box::new(scene), profile, &playback, 42), playback)
    }

    fn frame(dt_ms: f32) -> FrameInfo {
        FrameInfo {
            now: 0.0,
            dt_ms,
            time_scale: 1.0,
        }
    }

    #[test]
    fn test_drift_creates_container_and_particles() {
        let (mut ctx, _playback) = context(false);
        let mut drift = DriftParticles::new(DriftConfig::default());
        drift.start(&mut ctx, EffectId(0)).unwrap();

        // container + 24 looping particles
        assert_eq!(ctx.surface.layer_node_count(), 25);
        assert_eq!(drift.field().active_count(), 24);
        assert_eq!(ctx.scheduler.looping_count(), 24);

        drift.stop(&mut ctx);
        assert_eq!(ctx.surface.layer_node_count(), 0);
        assert!(drift.container().is_none());
    }

    #[test]
    fn test_drift_respects_budget() {
        let (mut ctx, playback) = context(false);
        let mut drift = DriftParticles::new(DriftConfig::default());
        drift.start(&mut ctx, EffectId(0)).unwrap();

        let degraded = DeviceProfile {
            tier: DeviceTier::Desktop,
            reduced_motion: false,
            time_scale: 1.0,
            particle_cap: 30,
        };
        playback.apply(
            &degraded,
            &GovernorCaps {
                time_scale: 0.7,
                particle_cap: 15,
            },
        );
        drift.update(&mut ctx, &frame(16.0));
        assert_eq!(drift.field().active_count(), 15);

        let visible = drift
            .field()
            .particles()
            .iter()
            .filter_map(|p| p.node)
            .filter(|n| ctx.surface.is_visible(*n))
            .count();
        assert_eq!(visible, 15);
    }

    #[test]
    fn test_drift_spawns_expiring_particles_below_budget() {
        let (mut ctx, _playback) = context(false);
        let mut drift = DriftParticles::new(DriftConfig::default());
        drift.start(&mut ctx, EffectId(0)).unwrap();

        for _ in 0..25 {
            drift.update(&mut ctx, &frame(100.0));
        }
        // One spawn per two seconds, never past the maximum
        assert_eq!(drift.field().len(), 25);
        assert!(drift.field().len() <= 30);
    }

    #[test]
    fn test_reduced_motion_creates_nothing() {
        let (mut ctx, _playback) = context(true);
        let mut drift = DriftParticles::new(DriftConfig::default());
        let mut blobs = LiquidBlobs::new(BlobConfig::default(), 30);
        drift.start(&mut ctx, EffectId(0)).unwrap();
        blobs.start(&mut ctx, EffectId(1)).unwrap();
        assert_eq!(ctx.surface.layer_node_count(), 0);
        assert_eq!(ctx.surface.canvas_count(), 0);
    }

    #[test]
    fn test_blobs_draw_every_frame() {
        let (mut ctx, _playback) = context(false);
        let mut blobs = LiquidBlobs::new(BlobConfig::default(), 30);
        blobs.start(&mut ctx, EffectId(0)).unwrap();
        assert_eq!(ctx.surface.canvas_count(), 1);

        blobs.update(&mut ctx, &frame(16.0));
        blobs.stop(&mut ctx);
        assert_eq!(ctx.surface.canvas_count(), 0);
        assert_eq!(ctx.surface.layer_node_count(), 0);
    }

    #[test]
    fn test_blob_count_follows_budget() {
        let blobs = LiquidBlobs::new(BlobConfig::default(), 30);
        assert_eq!(blobs.visible_for(30), 3);
        assert_eq!(blobs.visible_for(15), 2);
        assert_eq!(blobs.visible_for(1), 1);
        assert_eq!(blobs.visible_for(0), 0);
    }
}
