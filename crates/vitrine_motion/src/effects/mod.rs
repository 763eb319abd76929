//! Effects
//!
//! An effect is one self-contained piece of page motion: the particle field,
//! a scroll reveal, the custom cursor and so on. The orchestrator owns every
//! effect, starts them in registration order and routes frames, trigger
//! events and host events to them.
//!
//! Effects must be restartable: `stop` followed by `start` on the same page
//! leaves exactly one set of nodes, triggers and tweens behind.

mod ambient;
mod count_up;
mod cursor;
mod intro;
mod parallax;
mod particle_field;
mod progress_bar;
mod reveal;

pub use ambient::AmbientLoops;
pub use count_up::CountUp;
pub use cursor::CustomCursor;
pub use intro::IntroSequence;
pub use parallax::Parallax;
pub use particle_field::{DriftParticles, LiquidBlobs};
pub use progress_bar::ProgressBar;
pub use reveal::ScrollReveal;

use vitrine_core::HostEvent;

use crate::context::MotionContext;
use crate::device::DeviceProfile;
use crate::error::Result;
use crate::trigger::TriggerEvent;

/// Identifies an effect within one orchestrator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u32);

/// Per-frame timing handed to effects
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    /// Host timestamp in milliseconds
    pub now: f64,
    /// Wall time since the previous frame, clamped
    pub dt_ms: f32,
    /// Global time scale in effect for this frame
    pub time_scale: f32,
}

impl FrameInfo {
    /// Frame delta after applying the time scale
    pub fn scaled_dt(&self) -> f32 {
        self.dt_ms * self.time_scale
    }
}

/// One piece of page motion
pub trait Effect {
    fn name(&self) -> &str;

    /// Create nodes, register triggers and start tweens.
    ///
    /// A missing anchor element is reported as an error; the orchestrator
    /// logs it and carries on without this effect.
    fn start(&mut self, ctx: &mut MotionContext, id: EffectId) -> Result<()>;

    /// Called once per frame after trigger dispatch, before tweens advance
    fn update(&mut self, _ctx: &mut MotionContext, _frame: &FrameInfo) {}

    /// A trigger registered by this effect changed state
    fn on_trigger(&mut self, _ctx: &mut MotionContext, _event: &TriggerEvent) {}

    /// Pointer input, delivered immediately
    fn on_event(&mut self, _ctx: &mut MotionContext, _event: &HostEvent) {}

    /// The device tier changed; reduced-motion changes restart every effect instead
    fn on_profile_change(&mut self, _ctx: &mut MotionContext, _profile: &DeviceProfile) {}

    /// Remove everything this effect created and undo the styles it wrote
    fn stop(&mut self, ctx: &mut MotionContext);
}
