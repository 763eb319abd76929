//! Particle field simulation
//!
//! A [`ParticleField`] owns a pool of particles and integrates them each frame.
//! It knows nothing about rendering: the drift effect maps particles onto page
//! nodes, the blob effect paints them onto a canvas.
//!
//! Velocities are in pixels per millisecond and are multiplied by the global
//! time scale, so a degraded or reduced-motion profile slows the field down
//! along with every tween.

use smallvec::SmallVec;
use vitrine_core::{Color, NodeId, Point, Size, Vec2};

/// How long a particle lives
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lifetime {
    /// Wraps around the field forever
    Looping,
    /// Removed once the remaining time runs out or it leaves the field
    /// vertically
    Expires { remaining_ms: f32 },
}

/// What happens when a particle leaves the field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeMode {
    /// Rising particles re-enter from below; horizontal drift wraps around
    #[default]
    Wrap,
    /// Reflect off every edge
    Bounce,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub velocity: Vec2,
    /// Diameter for drift particles, radius for blobs
    pub size: f32,
    pub color: Color,
    pub opacity: f32,
    pub lifetime: Lifetime,
    /// Page node rendering this particle, if any
    pub node: Option<NodeId>,
}

impl Particle {
    pub fn new(position: Point, velocity: Vec2, size: f32) -> Self {
        Self {
            position,
            velocity,
            size,
            color: Color::GOLD,
            opacity: 1.0,
            lifetime: Lifetime::Looping,
            node: None,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn expires_after(mut self, ms: f32) -> Self {
        self.lifetime = Lifetime::Expires { remaining_ms: ms };
        self
    }

    pub fn node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn is_looping(&self) -> bool {
        self.lifetime == Lifetime::Looping
    }
}

/// A pool of particles moving inside a rectangle
#[derive(Clone, Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    bounds: Size,
    edge_mode: EdgeMode,
    /// Distance below the field that wrapped particles re-enter from
    overscan: f32,
    /// Only the first `active` particles are shown
    active: usize,
}

impl ParticleField {
    pub fn new(bounds: Size, edge_mode: EdgeMode) -> Self {
        Self {
            particles: Vec::new(),
            bounds,
            edge_mode,
            overscan: 0.0,
            active: 0,
        }
    }

    pub fn overscan(mut self, overscan: f32) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Follow a viewport resize
    pub fn set_bounds(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    pub fn spawn(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Show only the first `n` particles. Returns the effective count.
    pub fn set_active_count(&mut self, n: usize) -> usize {
        self.active = n.min(self.particles.len());
        self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.min(self.particles.len())
    }

    /// Particles currently shown
    pub fn active(&self) -> &[Particle] {
        &self.particles[..self.active_count()]
    }

    /// Advance every particle by `dt_ms` already scaled by the time scale.
    ///
    /// Returns the particles whose lifetime ran out; they are no longer part
    /// of the field.
    pub fn update(&mut self, dt_ms: f32) -> SmallVec<[Particle; 4]> {
        let Size { width, height } = self.bounds;

        for p in &mut self.particles {
            p.position.x += p.velocity.x * dt_ms;
            p.position.y += p.velocity.y * dt_ms;

            match self.edge_mode {
                EdgeMode::Wrap => {
                    let out_of_range = p.position.y < -p.size || p.position.y > height + self.overscan;
                    if let Lifetime::Expires { remaining_ms } = &mut p.lifetime {
                        if out_of_range {
                            *remaining_ms = 0.0;
                        }
                    } else if p.position.y < -p.size {
                        p.position.y = height + self.overscan;
                    } else if p.position.y > height + self.overscan {
                        p.position.y = -p.size;
                    }
                    if width > 0.0 {
                        p.position.x = p.position.x.rem_euclid(width);
                    }
                }
                EdgeMode::Bounce => {
                    if p.position.x < 0.0 || p.position.x > width {
                        p.velocity.x = -p.velocity.x;
                        p.position.x = p.position.x.clamp(0.0, width.max(0.0));
                    }
                    if p.position.y < 0.0 || p.position.y > height {
                        p.velocity.y = -p.velocity.y;
                        p.position.y = p.position.y.clamp(0.0, height.max(0.0));
                    }
                }
            }

            if let Lifetime::Expires { remaining_ms } = &mut p.lifetime {
                *remaining_ms -= dt_ms;
            }
        }

        let mut expired = SmallVec::new();
        let mut i = 0;
        while i < self.particles.len() {
            if matches!(self.particles[i].lifetime, Lifetime::Expires { remaining_ms } if remaining_ms <= 0.0) {
                if i < self.active {
                    self.active -= 1;
                }
                expired.push(self.particles.remove(i));
            } else {
                i += 1;
            }
        }
        expired
    }

    /// Remove every particle, returning them for cleanup
    pub fn drain(&mut self) -> Vec<Particle> {
        self.active = 0;
        std::mem::take(&mut self.particles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_particles_wrap() {
        let mut field = ParticleField::new(Size::new(400.0, 800.0), EdgeMode::Wrap).overscan(200.0);
        field.spawn(Particle::new(Point::new(100.0, 5.0), Vec2::new(0.0, -0.1), 4.0));

        field.update(100.0);
        assert_eq!(field.particles()[0].position.y, 1000.0);
        field.update(100.0);
        assert!((field.particles()[0].position.y - 990.0).abs() < 1e-3);
    }

    #[test]
    fn test_horizontal_wrap() {
        let mut field = ParticleField::new(Size::new(400.0, 800.0), EdgeMode::Wrap);
        field.spawn(Particle::new(Point::new(395.0, 400.0), Vec2::new(0.1, 0.0), 4.0));
        field.update(100.0);
        assert!((field.particles()[0].position.x - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounce_reflects_velocity() {
        let mut field = ParticleField::new(Size::new(100.0, 100.0), EdgeMode::Bounce);
        field.spawn(Particle::new(Point::new(99.0, 50.0), Vec2::new(0.5, 0.0), 10.0));
        field.update(10.0);
        let p = &field.particles()[0];
        assert_eq!(p.position.x, 100.0);
        assert_eq!(p.velocity.x, -0.5);
    }

    #[test]
    fn test_expiring_particles_are_returned() {
        let mut field = ParticleField::new(Size::new(100.0, 100.0), EdgeMode::Wrap);
        field.spawn(Particle::new(Point::new(10.0, 10.0), Vec2::ZERO, 2.0));
        field.spawn(Particle::new(Point::new(20.0, 20.0), Vec2::ZERO, 2.0).expires_after(50.0));
        field.set_active_count(2);

        assert!(field.update(40.0).is_empty());
        let expired = field.update(20.0);
        assert_eq!(expired.len(), 1);
        assert_eq!(field.len(), 1);
        assert_eq!(field.active_count(), 1);
    }

    #[test]
    fn test_expiring_particle_leaving_field_is_removed() {
        let mut field = ParticleField::new(Size::new(400.0, 800.0), EdgeMode::Wrap).overscan(200.0);
        field.spawn(Particle::new(Point::new(100.0, 5.0), Vec2::new(0.0, -0.1), 4.0).expires_after(60_000.0));
        field.set_active_count(1);

        let removed = field.update(100.0);
        assert_eq!(removed.len(), 1);
        assert!(removed[0].position.y < 0.0);
        assert!(field.is_empty());
        assert_eq!(field.active_count(), 0);
    }

    #[test]
    fn test_active_count_is_clamped() {
        let mut field = ParticleField::new(Size::new(100.0, 100.0), EdgeMode::Wrap);
        field.spawn(Particle::new(Point::ZERO, Vec2::ZERO, 2.0));
        assert_eq!(field.set_active_count(10), 1);
        assert_eq!(field.active().len(), 1);
        assert_eq!(field.set_active_count(0), 0);
    }

    #[test]
    fn test_zero_time_freezes_field() {
        let mut field = ParticleField::new(Size::new(100.0, 100.0), EdgeMode::Bounce);
        field.spawn(Particle::new(Point::new(50.0, 50.0), Vec2::new(1.0, 1.0), 2.0).expires_after(10.0));
        assert!(field.update(0.0).is_empty());
        assert_eq!(field.particles()[0].position, Point::new(50.0, 50.0));
    }
}
