//! Vitrine Animation
//!
//! The tween engine behind the motion layer.
//!
//! # Features
//!
//! - **Easing**: power, sine, back and cubic-bezier curves with GSAP-style names
//! - **Tweens**: one-shot, repeating and yoyo tweens over style properties
//! - **Overwrite**: one running tween per (node, property) pair
//! - **Global time scale**: every tween advances by `dt * time_scale`
//! - **Reduced motion**: loops are skipped and one-shots land on their end state
//! - **Staggers and sequences**: delay offsets for groups and overlapping intro steps

pub mod easing;
pub mod scheduler;
pub mod sequence;
pub mod stagger;
pub mod tween;
pub mod values;

pub use easing::{Easing, EasingParseError};
pub use scheduler::{AnimationScheduler, TweenId, TweenIds};
pub use sequence::{Position, PositionParseError, Sequence, SequenceStep};
pub use stagger::{Stagger, StaggerDirection};
pub use tween::{PropertyList, Repeat, Tween, TweenSpec, TweenState};
pub use values::Interpolate;
