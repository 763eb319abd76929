//! Tweens
//!
//! A [`TweenSpec`] is the declarative description ("animate opacity to 1 and y
//! to 0 over 800ms with power2.out"). Starting a spec on a node produces one
//! [`Tween`] per property, each interpolating from the node's current value to
//! the target.

use smallvec::SmallVec;
use vitrine_core::{Color, NodeId, Property, PropertyValue};

use crate::easing::Easing;
use crate::values::Interpolate;

/// How often a tween plays
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    /// Play once
    #[default]
    Once,
    /// Play once, then repeat `n` more times
    Times(u32),
    /// Repeat forever
    Infinite,
}

/// Property/value pairs carried by a spec
pub type PropertyList = SmallVec<[(Property, PropertyValue); 4]>;

/// Declarative description of an animation
#[derive(Clone, Debug, PartialEq)]
pub struct TweenSpec {
    /// Target values
    pub to: PropertyList,
    /// Explicit start values (`fromTo`); properties not listed start from the node's current value
    pub from: PropertyList,
    pub duration_ms: f32,
    pub delay_ms: f32,
    pub easing: Easing,
    pub repeat: Repeat,
    /// Alternate direction on every repeat
    pub yoyo: bool,
    /// Round float values to a multiple of this step (counters)
    pub snap: Option<f32>,
}

impl TweenSpec {
    /// A spec with the given duration and no targets yet
    pub fn to(duration_ms: f32) -> Self {
        Self {
            to: SmallVec::new(),
            from: SmallVec::new(),
            duration_ms,
            delay_ms: 0.0,
            easing: Easing::PowerOut(1),
            repeat: Repeat::Once,
            yoyo: false,
            snap: None,
        }
    }

    /// Add a target value
    pub fn prop(mut self, property: Property, value: impl Into<PropertyValue>) -> Self {
        let value = value.into();
        match self.to.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => self.to.push((property, value)),
        }
        self
    }

    /// Add an explicit start value
    pub fn from_prop(mut self, property: Property, value: impl Into<PropertyValue>) -> Self {
        let value = value.into();
        match self.from.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => self.from.push((property, value)),
        }
        self
    }

    pub fn opacity(self, value: f32) -> Self {
        self.prop(Property::Opacity, value)
    }

    pub fn x(self, value: f32) -> Self {
        self.prop(Property::TranslateX, value)
    }

    pub fn y(self, value: f32) -> Self {
        self.prop(Property::TranslateY, value)
    }

    pub fn scale(self, value: f32) -> Self {
        self.prop(Property::Scale, value)
    }

    pub fn rotation(self, degrees: f32) -> Self {
        self.prop(Property::Rotation, degrees)
    }

    pub fn color(self, color: Color) -> Self {
        self.prop(Property::Color, color)
    }

    pub fn delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Repeat forever, optionally alternating direction
    pub fn looping(mut self, yoyo: bool) -> Self {
        self.repeat = Repeat::Infinite;
        self.yoyo = yoyo;
        self
    }

    pub fn snap(mut self, step: f32) -> Self {
        self.snap = Some(step);
        self
    }

    /// True for tweens that repeat (finite or not)
    pub fn is_looping(&self) -> bool {
        self.repeat != Repeat::Once
    }

    /// Explicit start value for a property, if any
    pub fn from_value(&self, property: Property) -> Option<PropertyValue> {
        self.from
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| *v)
    }

    /// Total wall time of one play including delay and repeats; infinite for endless loops
    pub fn total_ms(&self) -> f32 {
        let plays = match self.repeat {
            Repeat::Once => 1.0,
            Repeat::Times(n) => (n + 1) as f32,
            Repeat::Infinite => return f32::INFINITY,
        };
        self.delay_ms + self.duration_ms * plays
    }
}

/// Lifecycle of a running tween
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenState {
    /// Waiting out its delay
    Delayed,
    Running,
    Finished,
}

/// One property of one node being interpolated
#[derive(Clone, Debug)]
pub struct Tween {
    node: NodeId,
    property: Property,
    from: PropertyValue,
    to: PropertyValue,
    duration_ms: f32,
    delay_remaining_ms: f32,
    easing: Easing,
    repeat: Repeat,
    yoyo: bool,
    snap: Option<f32>,
    /// Time into the current iteration
    elapsed_ms: f32,
    iteration: u32,
    reversed: bool,
    state: TweenState,
}

impl Tween {
    pub fn new(
        node: NodeId,
        property: Property,
        from: PropertyValue,
        to: PropertyValue,
        spec: &TweenSpec,
    ) -> Self {
        Self {
            node,
            property,
            from,
            to,
            duration_ms: spec.duration_ms.max(0.0),
            delay_remaining_ms: spec.delay_ms.max(0.0),
            easing: spec.easing,
            repeat: spec.repeat,
            yoyo: spec.yoyo,
            snap: spec.snap,
            elapsed_ms: 0.0,
            iteration: 0,
            reversed: false,
            state: if spec.delay_ms > 0.0 {
                TweenState::Delayed
            } else {
                TweenState::Running
            },
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn property(&self) -> Property {
        self.property
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == TweenState::Finished
    }

    pub fn is_looping(&self) -> bool {
        self.repeat != Repeat::Once
    }

    /// Completed repeats
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Progress through the current iteration (0.0 to 1.0), before easing
    pub fn progress(&self) -> f32 {
        if self.state == TweenState::Finished || self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Current interpolated value
    pub fn value(&self) -> PropertyValue {
        let mut linear = self.progress();
        if self.reversed {
            linear = 1.0 - linear;
        }
        let value = self.from.lerp(&self.to, self.easing.apply(linear));
        match (value, self.snap) {
            (PropertyValue::Float(v), Some(step)) if step > 0.0 => {
                PropertyValue::Float((v / step).round() * step)
            }
            _ => value,
        }
    }

    /// Value the tween settles on when it runs to completion
    pub fn end_value(&self) -> PropertyValue {
        let ends_reversed = match self.repeat {
            Repeat::Times(n) => self.yoyo && n % 2 == 1,
            _ => false,
        };
        if ends_reversed {
            self.from
        } else {
            self.to
        }
    }

    /// Advance by an already time-scaled delta.
    ///
    /// Returns the value to write, or `None` while still delayed.
    pub fn advance(&mut self, dt_ms: f32) -> Option<PropertyValue> {
        let mut dt = dt_ms.max(0.0);

        match self.state {
            TweenState::Finished => return None,
            TweenState::Delayed => {
                self.delay_remaining_ms -= dt;
                if self.delay_remaining_ms > 0.0 {
                    return None;
                }
                dt = -self.delay_remaining_ms;
                self.delay_remaining_ms = 0.0;
                self.state = TweenState::Running;
            }
            TweenState::Running => {}
        }

        if self.duration_ms <= 0.0 {
            self.finish();
            return Some(self.value());
        }

        self.elapsed_ms += dt;
        while self.elapsed_ms >= self.duration_ms {
            let can_repeat = match self.repeat {
                Repeat::Once => false,
                Repeat::Times(n) => self.iteration < n,
                Repeat::Infinite => true,
            };
            if !can_repeat {
                self.finish();
                break;
            }
            self.elapsed_ms -= self.duration_ms;
            self.iteration += 1;
            if self.yoyo {
                self.reversed = !self.reversed;
            }
        }

        Some(self.value())
    }

    fn finish(&mut self) {
        self.elapsed_ms = self.duration_ms;
        self.state = TweenState::Finished;
    }
}
