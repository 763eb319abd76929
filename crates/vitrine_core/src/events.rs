//! Host events forwarded into the motion layer

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::surface::NodeId;

/// Snapshot of the host viewport and document scroll metrics
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width in CSS pixels. May be `NaN` or `0.0` when the host cannot read it.
    pub width: f32,
    /// Viewport height in CSS pixels
    pub height: f32,
    /// Current vertical scroll offset
    pub scroll_y: f32,
    /// Total scrollable document height
    pub scroll_height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scroll_height: f32) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
            scroll_height,
        }
    }

    /// Width if the host reported a usable value
    pub fn readable_width(&self) -> Option<f32> {
        (self.width.is_finite() && self.width > 0.0).then_some(self.width)
    }

    /// Maximum scroll offset (0 when the document fits in the viewport)
    pub fn max_scroll(&self) -> f32 {
        (self.scroll_height - self.height).max(0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0, 800.0)
    }
}

/// Kinds of host listeners the motion layer attaches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
    OrientationChange,
    PointerMove,
    PointerHover,
}

impl EventKind {
    /// Every listener kind the orchestrator attaches on start
    pub const ALL: [EventKind; 5] = [
        EventKind::Scroll,
        EventKind::Resize,
        EventKind::OrientationChange,
        EventKind::PointerMove,
        EventKind::PointerHover,
    ];
}

/// An event delivered by the host
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostEvent {
    /// Document scrolled to a new offset
    Scroll { scroll_y: f32 },
    /// Viewport resized
    Resize { width: f32, height: f32 },
    /// Device orientation changed
    OrientationChange,
    /// Pointer moved (viewport coordinates)
    PointerMove { position: Point },
    /// Pointer entered a node
    PointerEnter { node: NodeId },
    /// Pointer left a node
    PointerLeave { node: NodeId },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Scroll { .. } => EventKind::Scroll,
            HostEvent::Resize { .. } => EventKind::Resize,
            HostEvent::OrientationChange => EventKind::OrientationChange,
            HostEvent::PointerMove { .. } => EventKind::PointerMove,
            HostEvent::PointerEnter { .. } | HostEvent::PointerLeave { .. } => {
                EventKind::PointerHover
            }
        }
    }
}
