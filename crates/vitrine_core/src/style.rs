//! Animatable style properties
//!
//! The motion layer only ever touches a node through this closed set of
//! properties. Anything else about a node (layout, content, classes) belongs to
//! the page.

use serde::{Deserialize, Serialize};

use crate::geometry::Color;

/// A visual property a tween or effect may write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// 0.0 (invisible) to 1.0 (opaque)
    Opacity,
    /// Horizontal translation in pixels
    TranslateX,
    /// Vertical translation in pixels
    TranslateY,
    /// Horizontal translation as a percentage of the node's own width
    XPercent,
    /// Vertical translation as a percentage of the node's own height
    YPercent,
    /// Uniform scale factor
    Scale,
    /// Horizontal-only scale factor (progress bars)
    ScaleX,
    /// Rotation in degrees
    Rotation,
    /// Blur filter radius in pixels
    Blur,
    /// Fill / background color
    Color,
    /// Alpha of the decorative glow shadow
    ShadowAlpha,
    /// Numeric text content (count-up counters)
    Counter,
}

impl Property {
    /// Value a node has for this property before anything wrote to it
    pub fn initial_value(self) -> PropertyValue {
        match self {
            Property::Opacity | Property::Scale | Property::ScaleX => PropertyValue::Float(1.0),
            Property::Color => PropertyValue::Color(Color::TRANSPARENT),
            _ => PropertyValue::Float(0.0),
        }
    }

    /// CSS-ish name used in logs and config files
    pub fn name(self) -> &'static str {
        match self {
            Property::Opacity => "opacity",
            Property::TranslateX => "x",
            Property::TranslateY => "y",
            Property::XPercent => "x_percent",
            Property::YPercent => "y_percent",
            Property::Scale => "scale",
            Property::ScaleX => "scale_x",
            Property::Rotation => "rotation",
            Property::Blur => "blur",
            Property::Color => "color",
            Property::ShadowAlpha => "shadow_alpha",
            Property::Counter => "counter",
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of an animatable property
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Float(f32),
    Color(Color),
}

impl PropertyValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            PropertyValue::Float(_) => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        PropertyValue::Color(value)
    }
}
