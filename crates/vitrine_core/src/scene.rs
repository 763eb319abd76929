//! In-memory surface
//!
//! [`SceneSurface`] models a laid-out page: page elements with fixed document
//! bounds, a scrollable viewport, and bookkeeping for everything the motion
//! layer creates. It backs the headless simulator and the test suites.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::events::{EventKind, Viewport};
use crate::geometry::{Color, Point, Rect};
use crate::style::{Property, PropertyValue};
use crate::surface::{CanvasId, ListenerId, NodeId, NodeSpec, Selector, Surface};

#[derive(Clone, Debug)]
struct SceneNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: FxHashMap<String, String>,
    bounds: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: FxHashMap<Property, PropertyValue>,
    visible: bool,
    /// Created by the motion layer rather than the page
    owned: bool,
}

impl SceneNode {
    fn from_spec(spec: NodeSpec, parent: Option<NodeId>, owned: bool) -> Self {
        Self {
            tag: spec.tag,
            id: spec.id,
            classes: spec.classes,
            attributes: spec.attributes,
            bounds: spec.bounds,
            parent,
            children: Vec::new(),
            properties: FxHashMap::default(),
            visible: true,
            owned,
        }
    }
}

/// A blob drawn during the current canvas frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawnBlob {
    pub center: Point,
    pub radius: f32,
    pub color: Color,
}

#[derive(Clone, Debug)]
struct CanvasState {
    node: NodeId,
    blobs: Vec<DrawnBlob>,
}

/// In-memory [`Surface`] implementation
#[derive(Clone, Debug)]
pub struct SceneSurface {
    nodes: SlotMap<NodeId, SceneNode>,
    /// Document order
    order: Vec<NodeId>,
    canvases: SlotMap<CanvasId, CanvasState>,
    listeners: SlotMap<ListenerId, EventKind>,
    viewport: Viewport,
    reduced_motion: bool,
    frames_presented: u64,
}

impl SceneSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            canvases: SlotMap::with_key(),
            listeners: SlotMap::with_key(),
            viewport,
            reduced_motion: false,
            frames_presented: 0,
        }
    }

    /// Add a page element (not owned by the motion layer)
    pub fn insert_element(&mut self, spec: NodeSpec) -> NodeId {
        let bottom = spec.bounds.bottom();
        let id = self.nodes.insert(SceneNode::from_spec(spec, None, false));
        self.order.push(id);
        if bottom > self.viewport.scroll_height {
            self.viewport.scroll_height = bottom;
        }
        id
    }

    /// Remove a page element, as a page navigation would
    pub fn remove_element(&mut self, node: NodeId) -> bool {
        self.remove_subtree(node)
    }

    /// Scroll the document, clamped to the scrollable range
    pub fn scroll_to(&mut self, scroll_y: f32) -> f32 {
        self.viewport.scroll_y = scroll_y.clamp(0.0, self.viewport.max_scroll());
        self.viewport.scroll_y
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.viewport.scroll_y = self.viewport.scroll_y.min(self.viewport.max_scroll());
    }

    pub fn set_scroll_height(&mut self, scroll_height: f32) {
        self.viewport.scroll_height = scroll_height;
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    /// Total nodes, page and layer
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Layer-owned nodes carrying a class
    pub fn layer_nodes_with_class(&self, class: &str) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.nodes
                    .get(*id)
                    .is_some_and(|n| n.owned && n.classes.iter().any(|c| c == class))
            })
            .collect()
    }

    /// Listeners attached for one event kind
    pub fn listeners_of(&self, kind: EventKind) -> usize {
        self.listeners.values().filter(|k| **k == kind).count()
    }

    /// Blobs drawn since the canvas was last cleared
    pub fn drawn_blobs(&self, canvas: CanvasId) -> &[DrawnBlob] {
        self.canvases
            .get(canvas)
            .map(|c| c.blobs.as_slice())
            .unwrap_or(&[])
    }

    /// Canvas contexts acquired on a node
    pub fn canvases_on(&self, node: NodeId) -> Vec<CanvasId> {
        self.canvases
            .iter()
            .filter(|(_, c)| c.node == node)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn remove_subtree(&mut self, node: NodeId) -> bool {
        let Some(removed) = self.nodes.remove(node) else {
            return false;
        };
        if let Some(parent) = removed.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != node);
        }
        self.order.retain(|id| *id != node);
        for child in removed.children {
            self.remove_subtree(child);
        }
        true
    }
}

impl Default for SceneSurface {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl Surface for SceneSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn query(&self, selector: &Selector) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.nodes.get(*id).is_some_and(|n| {
                    selector.matches(&n.tag, n.id.as_deref(), &n.classes, &n.attributes)
                })
            })
            .collect()
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.nodes.get(node).map(|n| n.bounds)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get(node)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn create_node(&mut self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId {
        let parent = parent.filter(|p| self.nodes.contains_key(*p));
        let id = self.nodes.insert(SceneNode::from_spec(spec, parent, true));
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(id);
        }
        self.order.push(id);
        id
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        self.remove_subtree(node)
    }

    fn set_property(&mut self, node: NodeId, property: Property, value: PropertyValue) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.properties.insert(property, value);
        }
    }

    fn property(&self, node: NodeId, property: Property) -> Option<PropertyValue> {
        self.nodes
            .get(node)
            .and_then(|n| n.properties.get(&property).copied())
    }

    fn clear_properties(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.properties.clear();
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.visible = visible;
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.visible)
    }

    fn acquire_canvas(&mut self, node: NodeId) -> Option<CanvasId> {
        if !self.nodes.contains_key(node) {
            return None;
        }
        Some(self.canvases.insert(CanvasState {
            node,
            blobs: Vec::new(),
        }))
    }

    fn release_canvas(&mut self, canvas: CanvasId) {
        self.canvases.remove(canvas);
    }

    fn clear_canvas(&mut self, canvas: CanvasId) {
        if let Some(c) = self.canvases.get_mut(canvas) {
            c.blobs.clear();
        }
    }

    fn draw_blob(&mut self, canvas: CanvasId, center: Point, radius: f32, color: Color) {
        if let Some(c) = self.canvases.get_mut(canvas) {
            c.blobs.push(DrawnBlob {
                center,
                radius,
                color,
            });
        }
    }

    fn add_listener(&mut self, kind: EventKind) -> ListenerId {
        self.listeners.insert(kind)
    }

    fn remove_listener(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(listener).is_some()
    }

    fn present(&mut self) {
        self.frames_presented += 1;
    }

    fn layer_node_count(&self) -> usize {
        self.nodes.values().filter(|n| n.owned).count()
    }

    fn canvas_count(&self) -> usize {
        self.canvases.len()
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> SceneSurface {
        let mut scene = SceneSurface::new(Viewport::new(1280.0, 800.0, 800.0));
        scene.insert_element(NodeSpec::new("section").id("hero").bounds(Rect::new(0.0, 0.0, 1280.0, 800.0)));
        scene.insert_element(
            NodeSpec::new("div")
                .class("service-card")
                .bounds(Rect::new(0.0, 1000.0, 400.0, 300.0)),
        );
        scene
    }

    #[test]
    fn test_insert_grows_scroll_height() {
        let scene = page();
        assert_eq!(scene.viewport().scroll_height, 1300.0);
        assert_eq!(scene.viewport().max_scroll(), 500.0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut scene = page();
        assert_eq!(scene.scroll_to(10_000.0), 500.0);
        assert_eq!(scene.scroll_to(-5.0), 0.0);
    }

    #[test]
    fn test_owned_nodes_are_counted_and_removed_with_subtree() {
        let mut scene = page();
        let container = scene.create_node(None, NodeSpec::new("div").id("particles"));
        let child = scene.create_node(Some(container), NodeSpec::new("div").class("particle"));
        assert_eq!(scene.layer_node_count(), 2);
        assert_eq!(scene.layer_nodes_with_class("particle"), vec![child]);

        assert!(scene.remove_node(container));
        assert_eq!(scene.layer_node_count(), 0);
        assert!(scene.bounds(child).is_none());
        assert!(!scene.remove_node(container));
    }

    #[test]
    fn test_query_skips_removed_elements() {
        let mut scene = page();
        let selector: Selector = ".service-card".parse().unwrap();
        let cards = scene.query(&selector);
        assert_eq!(cards.len(), 1);
        scene.remove_element(cards[0]);
        assert!(scene.query(&selector).is_empty());
    }

    #[test]
    fn test_canvas_and_listener_bookkeeping() {
        let mut scene = page();
        let node = scene.create_node(None, NodeSpec::new("canvas"));
        let canvas = scene.acquire_canvas(node).unwrap();
        scene.draw_blob(canvas, Point::new(1.0, 2.0), 100.0, Color::GOLD);
        assert_eq!(scene.drawn_blobs(canvas).len(), 1);
        scene.clear_canvas(canvas);
        assert!(scene.drawn_blobs(canvas).is_empty());
        scene.release_canvas(canvas);
        assert_eq!(scene.canvas_count(), 0);

        let listener = scene.add_listener(EventKind::Scroll);
        assert_eq!(scene.listeners_of(EventKind::Scroll), 1);
        assert!(scene.remove_listener(listener));
        assert!(!scene.remove_listener(listener));
        assert_eq!(scene.listener_count(), 0);
    }
}
