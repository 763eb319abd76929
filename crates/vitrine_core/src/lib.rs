//! Vitrine Core
//!
//! Foundational types shared by the Vitrine motion layer:
//!
//! - **Geometry**: points, rects, vectors and colors in CSS pixel space
//! - **Style**: the closed set of animatable properties
//! - **Events**: viewport metrics and host events
//! - **Surface**: the page abstraction the motion layer draws through
//! - **Scene**: an in-memory surface for headless runs and tests
//! - **Shared values**: single-writer state with read-only subscriber handles

pub mod events;
pub mod geometry;
pub mod scene;
pub mod shared;
pub mod style;
pub mod surface;

pub use events::{EventKind, HostEvent, Viewport};
pub use geometry::{Color, Point, Rect, Size, Vec2};
pub use scene::{DrawnBlob, SceneSurface};
pub use shared::{ReadOnly, Shared, SubscriptionHandle, SubscriptionId};
pub use style::{Property, PropertyValue};
pub use surface::{
    CanvasId, ListenerId, NodeId, NodeSpec, Selector, SelectorError, SelectorPart, Surface,
};
