//! Rendering surface abstraction
//!
//! The motion layer never talks to a concrete document. It sees the page as a
//! retained tree of nodes that it can query by selector, measure, style,
//! append to and remove from, plus a handful of canvas drawing calls and host
//! listener bookkeeping.
//!
//! Nodes created through [`Surface::create_node`] are *layer-owned*; nodes that
//! belong to the page are only ever referenced. Teardown must leave
//! [`Surface::layer_node_count`], [`Surface::canvas_count`] and
//! [`Surface::listener_count`] at zero.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

use crate::events::{EventKind, Viewport};
use crate::geometry::{Color, Point, Rect};
use crate::style::{Property, PropertyValue};

new_key_type! {
    /// Handle to a node on the surface
    pub struct NodeId;
    /// Handle to an acquired 2D canvas context
    pub struct CanvasId;
    /// Handle to an attached host listener
    pub struct ListenerId;
}

// ============================================================================
// Selectors
// ============================================================================

/// Selector parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("invalid selector segment '{0}'")]
    Invalid(String),
}

/// One simple selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorPart {
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// `[attribute]`
    Attribute(String),
    /// `tag`
    Tag(String),
}

/// A comma-separated list of simple selectors (`".service-card, h2, #hero"`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    parts: SmallVec<[SelectorPart; 2]>,
}

impl Selector {
    /// `.class`
    pub fn class(name: impl Into<String>) -> Self {
        Self::from_part(SelectorPart::Class(name.into()))
    }

    /// `#id`
    pub fn id(name: impl Into<String>) -> Self {
        Self::from_part(SelectorPart::Id(name.into()))
    }

    /// `tag`
    pub fn tag(name: impl Into<String>) -> Self {
        Self::from_part(SelectorPart::Tag(name.into()))
    }

    /// `[attribute]`
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::from_part(SelectorPart::Attribute(name.into()))
    }

    /// Add the alternatives of `other` (`a, b`)
    pub fn or(mut self, other: Selector) -> Self {
        self.parts.extend(other.parts);
        self
    }

    fn from_part(part: SelectorPart) -> Self {
        let mut parts = SmallVec::new();
        parts.push(part);
        Self { parts }
    }

    pub fn parts(&self) -> &[SelectorPart] {
        &self.parts
    }

    /// Check whether a node description matches any alternative
    pub fn matches(&self, tag: &str, id: Option<&str>, classes: &[String], attrs: &FxHashMap<String, String>) -> bool {
        self.parts.iter().any(|part| match part {
            SelectorPart::Id(want) => id == Some(want.as_str()),
            SelectorPart::Class(want) => classes.iter().any(|c| c == want),
            SelectorPart::Attribute(want) => attrs.contains_key(want),
            SelectorPart::Tag(want) => tag.eq_ignore_ascii_case(want),
        })
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = SmallVec::new();
        for raw in s.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let part = if let Some(id) = raw.strip_prefix('#') {
                SelectorPart::Id(valid_ident(id, raw)?)
            } else if let Some(class) = raw.strip_prefix('.') {
                SelectorPart::Class(valid_ident(class, raw)?)
            } else if let Some(attr) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                SelectorPart::Attribute(valid_ident(attr, raw)?)
            } else {
                SelectorPart::Tag(valid_ident(raw, raw)?)
            };
            parts.push(part);
        }
        if parts.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Selector { parts })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match part {
                SelectorPart::Id(v) => write!(f, "#{v}")?,
                SelectorPart::Class(v) => write!(f, ".{v}")?,
                SelectorPart::Attribute(v) => write!(f, "[{v}]")?,
                SelectorPart::Tag(v) => f.write_str(v)?,
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Selector> for String {
    fn from(value: Selector) -> Self {
        value.to_string()
    }
}

fn valid_ident(ident: &str, raw: &str) -> Result<String, SelectorError> {
    let ok = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(ident.to_string())
    } else {
        Err(SelectorError::Invalid(raw.to_string()))
    }
}

// ============================================================================
// Node creation
// ============================================================================

/// Description of a node the layer wants to append
#[derive(Clone, Debug, Default)]
pub struct NodeSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: FxHashMap<String, String>,
    /// Document-space bounds (fixed-position overlays use viewport-sized rects)
    pub bounds: Rect,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }
}

// ============================================================================
// Surface trait
// ============================================================================

/// The page as seen by the motion layer
pub trait Surface {
    /// Current viewport and scroll metrics
    fn viewport(&self) -> Viewport;

    /// Whether the user asked the system for reduced motion
    fn prefers_reduced_motion(&self) -> bool;

    /// All nodes matching a selector, in document order
    fn query(&self, selector: &Selector) -> Vec<NodeId>;

    /// Document-space bounds of a node, `None` once the node is gone
    fn bounds(&self, node: NodeId) -> Option<Rect>;

    /// Read an attribute of a node
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Append a layer-owned node under `parent` (or the document body)
    fn create_node(&mut self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId;

    /// Remove a node and its subtree. Returns false if it did not exist.
    fn remove_node(&mut self, node: NodeId) -> bool;

    /// Write a style property
    fn set_property(&mut self, node: NodeId, property: Property, value: PropertyValue);

    /// Read a style property previously written
    fn property(&self, node: NodeId, property: Property) -> Option<PropertyValue>;

    /// Drop every property the layer wrote to a node
    fn clear_properties(&mut self, node: NodeId);

    /// Show or hide a node (`display: none`)
    fn set_visible(&mut self, node: NodeId, visible: bool);

    fn is_visible(&self, node: NodeId) -> bool;

    /// Acquire a 2D drawing context on a canvas node
    fn acquire_canvas(&mut self, node: NodeId) -> Option<CanvasId>;

    /// Release a drawing context
    fn release_canvas(&mut self, canvas: CanvasId);

    fn clear_canvas(&mut self, canvas: CanvasId);

    /// Fill a radial blob fading from `color` at the center to transparent
    fn draw_blob(&mut self, canvas: CanvasId, center: Point, radius: f32, color: Color);

    /// Attach a host listener
    fn add_listener(&mut self, kind: EventKind) -> ListenerId;

    /// Detach a host listener. Returns false if it was not attached.
    fn remove_listener(&mut self, listener: ListenerId) -> bool;

    /// Hand the finished frame to the host
    fn present(&mut self) {}

    /// Nodes created by the layer that still exist
    fn layer_node_count(&self) -> usize;

    /// Canvas contexts still acquired
    fn canvas_count(&self) -> usize;

    /// Listeners still attached
    fn listener_count(&self) -> usize;
}

/// A surface shared with the host through `Rc<RefCell<_>>`.
///
/// Lets a driver keep inspecting and scrolling a surface it handed to the
/// motion layer. Borrows are short and never held across calls.
impl<S: Surface> Surface for Rc<RefCell<S>> {
    fn viewport(&self) -> Viewport {
        self.borrow().viewport()
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.borrow().prefers_reduced_motion()
    }

    fn query(&self, selector: &Selector) -> Vec<NodeId> {
        self.borrow().query(selector)
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.borrow().bounds(node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.borrow().attribute(node, name)
    }

    fn create_node(&mut self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId {
        self.borrow_mut().create_node(parent, spec)
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        self.borrow_mut().remove_node(node)
    }

    fn set_property(&mut self, node: NodeId, property: Property, value: PropertyValue) {
        self.borrow_mut().set_property(node, property, value)
    }

    fn property(&self, node: NodeId, property: Property) -> Option<PropertyValue> {
        self.borrow().property(node, property)
    }

    fn clear_properties(&mut self, node: NodeId) {
        self.borrow_mut().clear_properties(node)
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        self.borrow_mut().set_visible(node, visible)
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.borrow().is_visible(node)
    }

    fn acquire_canvas(&mut self, node: NodeId) -> Option<CanvasId> {
        self.borrow_mut().acquire_canvas(node)
    }

    fn release_canvas(&mut self, canvas: CanvasId) {
        self.borrow_mut().release_canvas(canvas)
    }

    fn clear_canvas(&mut self, canvas: CanvasId) {
        self.borrow_mut().clear_canvas(canvas)
    }

    fn draw_blob(&mut self, canvas: CanvasId, center: Point, radius: f32, color: Color) {
        self.borrow_mut().draw_blob(canvas, center, radius, color)
    }

    fn add_listener(&mut self, kind: EventKind) -> ListenerId {
        self.borrow_mut().add_listener(kind)
    }

    fn remove_listener(&mut self, listener: ListenerId) -> bool {
        self.borrow_mut().remove_listener(listener)
    }

    fn present(&mut self) {
        self.borrow_mut().present()
    }

    fn layer_node_count(&self) -> usize {
        self.borrow().layer_node_count()
    }

    fn canvas_count(&self) -> usize {
        self.borrow().canvas_count()
    }

    fn listener_count(&self) -> usize {
        self.borrow().listener_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse_list() {
        let selector: Selector = ".service-card, h2, #hero, [data-count]".parse().unwrap();
        assert_eq!(
            selector.parts(),
            &[
                SelectorPart::Class("service-card".into()),
                SelectorPart::Tag("h2".into()),
                SelectorPart::Id("hero".into()),
                SelectorPart::Attribute("data-count".into()),
            ]
        );
    }

    #[test]
    fn test_selector_rejects_garbage() {
        assert_eq!("  ,  ".parse::<Selector>(), Err(SelectorError::Empty));
        assert!(matches!(
            ".a b".parse::<Selector>(),
            Err(SelectorError::Invalid(_))
        ));
    }

    #[test]
    fn test_selector_display_round_trips() {
        let selector: Selector = ".card,h1 , [data-count]".parse().unwrap();
        assert_eq!(selector.to_string(), ".card, h1, [data-count]");
        assert_eq!(selector.to_string().parse::<Selector>(), Ok(selector.clone()));

        let built = Selector::class("card").or(Selector::tag("h1")).or(Selector::attribute("data-count"));
        assert_eq!(built, selector);
    }

    #[test]
    fn test_selector_matches() {
        let selector: Selector = ".card, h1".parse().unwrap();
        let attrs = FxHashMap::default();
        assert!(selector.matches("div", None, &["card".to_string()], &attrs));
        assert!(selector.matches("H1", None, &[], &attrs));
        assert!(!selector.matches("p", Some("card"), &[], &attrs));
    }
}
