//! Animatable value types
//!
//! Linear interpolation for the value types tweens carry.

use vitrine_core::{Color, PropertyValue, Vec2};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t.
    ///
    /// `t` may leave 0..=1 for overshooting curves such as `back.out`.
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

// ============================================================================
// f32 Implementation
// ============================================================================

impl Interpolate for f32 {
    // Exact at both ends: t = 1 yields `other` bit for bit
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

// ============================================================================
// Vec2 Implementation
// ============================================================================

impl Interpolate for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

// ============================================================================
// Color Implementation
// ============================================================================

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        // Overshoot on colors is clamped; channels outside 0..=1 are meaningless
        Color::lerp(self, other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.r - other.r).abs() < epsilon
            && (self.g - other.g).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.a - other.a).abs() < epsilon
    }
}

// ============================================================================
// PropertyValue Implementation
// ============================================================================

impl Interpolate for PropertyValue {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        match (self, other) {
            (PropertyValue::Float(a), PropertyValue::Float(b)) => PropertyValue::Float(a.lerp(b, t)),
            (PropertyValue::Color(a), PropertyValue::Color(b)) => PropertyValue::Color(a.lerp(b, t)),
            // Mismatched kinds cannot blend; jump at the end
            _ if t >= 1.0 => *other,
            _ => *self,
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        match (self, other) {
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.approx_eq(b, epsilon),
            (PropertyValue::Color(a), PropertyValue::Color(b)) => a.approx_eq(b, epsilon),
            _ => false,
        }
    }
}
