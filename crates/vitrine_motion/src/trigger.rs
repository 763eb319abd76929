//! Scroll triggers
//!
//! A trigger watches one page node and reports when it moves into or out of a
//! visibility window. The window is described by two thresholds written as
//! `"<element edge> <viewport position>"`:
//!
//! - `"top 80%"`: the element's top edge reaches 80% of the viewport height
//! - `"bottom top"`: the element's bottom edge reaches the top of the viewport
//! - `"center"`: shorthand for `"center center"`
//!
//! The element is inside the window once the start threshold has been crossed
//! and until the end threshold is crossed.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use vitrine_core::{NodeId, Rect};

use crate::effects::EffectId;
use crate::error::MotionError;

new_key_type! {
    /// Handle to a registered trigger
    pub struct TriggerId;
    /// Handle to a group of triggers whose events are merged
    pub struct BatchId;
}

/// Edge of the observed element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
}

impl Edge {
    /// Document-space y of this edge
    pub fn of(self, rect: &Rect) -> f32 {
        match self {
            Edge::Top => rect.top(),
            Edge::Center => rect.center_y(),
            Edge::Bottom => rect.bottom(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Center => "center",
            Edge::Bottom => "bottom",
        }
    }
}

/// Position inside the viewport, measured from its top
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportPosition {
    Top,
    Center,
    Bottom,
    /// Percentage of the viewport height
    Percent(f32),
    /// Pixels from the viewport top
    Pixels(f32),
}

impl ViewportPosition {
    /// Offset from the viewport top in pixels
    pub fn resolve(self, viewport_height: f32) -> f32 {
        match self {
            ViewportPosition::Top => 0.0,
            ViewportPosition::Center => viewport_height / 2.0,
            ViewportPosition::Bottom => viewport_height,
            ViewportPosition::Percent(p) => viewport_height * p / 100.0,
            ViewportPosition::Pixels(px) => px,
        }
    }
}

/// One side of a visibility window
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Threshold {
    pub edge: Edge,
    pub position: ViewportPosition,
}

impl Threshold {
    pub const fn new(edge: Edge, position: ViewportPosition) -> Self {
        Self { edge, position }
    }

    /// Scroll offset at which this threshold is crossed for `rect`
    pub fn crossing_scroll(&self, rect: &Rect, viewport_height: f32) -> f32 {
        self.edge.of(rect) - self.position.resolve(viewport_height)
    }

    /// Whether the threshold has been crossed at `scroll_y`
    pub fn is_crossed(&self, rect: &Rect, scroll_y: f32, viewport_height: f32) -> bool {
        self.edge.of(rect) - scroll_y <= self.position.resolve(viewport_height)
    }
}

impl FromStr for Threshold {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MotionError::InvalidThreshold(s.to_string());

        let edge_of = |word: &str| match word {
            "top" => Some(Edge::Top),
            "center" => Some(Edge::Center),
            "bottom" => Some(Edge::Bottom),
            _ => None,
        };

        let mut words = s.split_whitespace();
        let (edge_word, position_word) = match (words.next(), words.next(), words.next()) {
            (Some(edge), Some(position), None) => (edge, position),
            (Some(both), None, None) => (both, both),
            _ => return Err(err()),
        };

        let edge = edge_of(edge_word).ok_or_else(err)?;
        let position = match position_word {
            "top" => ViewportPosition::Top,
            "center" => ViewportPosition::Center,
            "bottom" => ViewportPosition::Bottom,
            word => {
                if let Some(p) = word.strip_suffix('%') {
                    ViewportPosition::Percent(p.parse().map_err(|_| err())?)
                } else if let Some(px) = word.strip_suffix("px") {
                    ViewportPosition::Pixels(px.parse().map_err(|_| err())?)
                } else {
                    return Err(err());
                }
            }
        };

        Ok(Threshold { edge, position })
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.edge.name())?;
        match self.position {
            ViewportPosition::Top => f.write_str("top"),
            ViewportPosition::Center => f.write_str("center"),
            ViewportPosition::Bottom => f.write_str("bottom"),
            ViewportPosition::Percent(p) => write!(f, "{p}%"),
            ViewportPosition::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

impl TryFrom<String> for Threshold {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Threshold> for String {
    fn from(value: Threshold) -> Self {
        value.to_string()
    }
}

/// Registration data for a trigger
#[derive(Clone, Copy, Debug)]
pub struct TriggerConfig {
    /// Observed page node
    pub node: NodeId,
    pub start: Threshold,
    pub end: Threshold,
    /// Effect the events are routed to
    pub owner: EffectId,
    pub batch: Option<BatchId>,
    /// Also report local progress through the window
    pub scrub: bool,
}

impl TriggerConfig {
    /// A trigger with the default `"bottom top"` end
    pub fn new(node: NodeId, owner: EffectId, start: Threshold) -> Self {
        Self {
            node,
            start,
            end: Threshold::new(Edge::Bottom, ViewportPosition::Top),
            owner,
            batch: None,
            scrub: false,
        }
    }

    pub fn end(mut self, end: Threshold) -> Self {
        self.end = end;
        self
    }

    pub fn batch(mut self, batch: BatchId) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn scrub(mut self) -> Self {
        self.scrub = true;
        self
    }
}

/// Last direction the page scrolled in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollDirection {
    #[default]
    Down,
    Up,
}

/// What happened to a trigger
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerKind {
    /// Entered the window scrolling down
    Enter,
    /// Left the window scrolling down
    Leave,
    /// Entered the window scrolling up
    EnterBack,
    /// Left the window scrolling up
    LeaveBack,
    /// Local progress through the window changed (scrub triggers only)
    Scrub(f32),
}

impl TriggerKind {
    pub fn is_transition(&self) -> bool {
        !matches!(self, TriggerKind::Scrub(_))
    }
}

/// A trigger notification routed to the owning effect.
///
/// Batched transitions carry every node of the batch that made the same
/// transition in one evaluation, in registration order.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerEvent {
    pub owner: EffectId,
    /// First trigger that contributed to the event
    pub trigger: TriggerId,
    pub batch: Option<BatchId>,
    pub kind: TriggerKind,
    pub nodes: SmallVec<[NodeId; 4]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_thresholds() {
        let t: Threshold = "top 80%".parse().unwrap();
        assert_eq!(t, Threshold::new(Edge::Top, ViewportPosition::Percent(80.0)));

        let t: Threshold = "bottom top".parse().unwrap();
        assert_eq!(t, Threshold::new(Edge::Bottom, ViewportPosition::Top));

        let t: Threshold = "center".parse().unwrap();
        assert_eq!(t, Threshold::new(Edge::Center, ViewportPosition::Center));

        let t: Threshold = "top 120px".parse().unwrap();
        assert_eq!(t.position.resolve(800.0), 120.0);
    }

    #[test]
    fn test_reject_bad_thresholds() {
        for bad in ["", "left 80%", "top eighty%", "top 80% extra", "80%"] {
            assert!(bad.parse::<Threshold>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["top 80%", "bottom top", "center center", "top 120px"] {
            let t: Threshold = s.parse().unwrap();
            assert_eq!(t.to_string(), s);
        }
    }

    #[test]
    fn test_crossing() {
        let rect = Rect::new(0.0, 1000.0, 100.0, 200.0);
        let t: Threshold = "top 80%".parse().unwrap();
        // 80% of 800 is 640; the top reaches it at scroll 360
        assert_eq!(t.crossing_scroll(&rect, 800.0), 360.0);
        assert!(!t.is_crossed(&rect, 359.0, 800.0));
        assert!(t.is_crossed(&rect, 360.0, 800.0));
    }
}
