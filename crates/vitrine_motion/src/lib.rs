//! Vitrine Motion
//!
//! The scroll-driven motion layer of the Vitrine brochure site: device
//! profiling, a frame-rate governor, scroll triggers, particle fields, the
//! site's effects and the orchestrator that runs them.
//!
//! # Example
//!
//! ```ignore
//! use vitrine_core::{HostEvent, SceneSurface, Viewport};
//! use vitrine_motion::{MotionConfig, Orchestrator};
//!
//! let surface = SceneSurface::new(Viewport::new(1280.0, 800.0, 4000.0));
//! let mut motion = Orchestrator::new(Box::new(surface), MotionConfig::default());
//! motion.start(0.0);
//!
//! motion.handle_event(&HostEvent::Scroll { scroll_y: 400.0 }, 16.0);
//! motion.frame(16.0);
//!
//! motion.stop();
//! ```

pub mod config;
pub mod context;
pub mod device;
pub mod effects;
pub mod error;
pub mod governor;
pub mod orchestrator;
pub mod particles;
pub mod scroll;
pub mod ticker;
pub mod trigger;

pub use config::{MotionConfig, RevealConfig, StyleValues, ToggleAction, ToggleActions};
pub use context::{MotionContext, PlaybackController};
pub use device::{DeviceProfile, DeviceProfiler, DeviceTier};
pub use effects::{Effect, EffectId, FrameInfo};
pub use error::{MotionError, Result};
pub use governor::{FrameSampler, GovernorCaps, GovernorLevel, PerformanceGovernor};
pub use orchestrator::{default_effects, EngineProbe, MotionState, Orchestrator};
pub use particles::{EdgeMode, Lifetime, Particle, ParticleField};
pub use scroll::{scroll_progress, ScrollTracker};
pub use ticker::{FrameTicker, FrameToken};
pub use trigger::{Threshold, TriggerConfig, TriggerEvent, TriggerId, TriggerKind};
