//! Shared motion context
//!
//! Effects do not own the page, the scheduler or the trigger tracker; they
//! borrow them through a [`MotionContext`] for the duration of each call. The
//! context also books every resource the layer acquires, so teardown can
//! release all of it regardless of which effect forgot what.
//!
//! The derived playback values (global time scale and particle budget) are
//! written by the [`PlaybackController`] alone. Everything else reads them
//! through [`ReadOnly`] handles.

use rustc_hash::FxHashSet;
use vitrine_animation::{AnimationScheduler, TweenIds, TweenSpec};
use vitrine_core::{
    CanvasId, NodeId, NodeSpec, Property, PropertyValue, ReadOnly, Selector, Shared, Surface, Viewport,
};

use crate::device::DeviceProfile;
use crate::error::{MotionError, Result};
use crate::governor::GovernorCaps;
use crate::scroll::ScrollTracker;

/// Sole writer of the derived playback values
pub struct PlaybackController {
    time_scale: Shared<f32>,
    particle_budget: Shared<usize>,
}

impl PlaybackController {
    pub fn new(max_particles: usize) -> Self {
        Self {
            time_scale: Shared::new(1.0),
            particle_budget: Shared::new(max_particles),
        }
    }

    pub fn time_scale(&self) -> ReadOnly<f32> {
        self.time_scale.reader()
    }

    pub fn particle_budget(&self) -> ReadOnly<usize> {
        self.particle_budget.reader()
    }

    /// Derive and publish the playback values.
    ///
    /// Reduced motion forces both to zero. Otherwise each is the stricter of
    /// the device tier and the governor. Returns true if anything changed.
    pub fn apply(&self, profile: &DeviceProfile, caps: &GovernorCaps) -> bool {
        let (time_scale, budget) = if profile.reduced_motion {
            (0.0, 0)
        } else {
            (
                profile.time_scale.min(caps.time_scale),
                profile.particle_cap.min(caps.particle_cap),
            )
        };
        let scale_changed = self.time_scale.set(time_scale);
        let budget_changed = self.particle_budget.set(budget);
        if scale_changed || budget_changed {
            tracing::debug!(time_scale, budget, "playback updated");
        }
        scale_changed || budget_changed
    }
}

/// Everything an effect may touch while it runs
pub struct MotionContext {
    pub surface: Box<dyn Surface>,
    pub scheduler: AnimationScheduler,
    pub tracker: ScrollTracker,
    pub rng: fastrand::Rng,
    profile: DeviceProfile,
    time_scale: ReadOnly<f32>,
    particle_budget: ReadOnly<usize>,
    owned_nodes: Vec<NodeId>,
    owned_canvases: Vec<CanvasId>,
    /// Page nodes the layer has written styles to
    touched: FxHashSet<NodeId>,
}

impl MotionContext {
    pub fn new(
        surface: Box<dyn Surface>,
        profile: DeviceProfile,
        playback: &PlaybackController,
        seed: u64,
    ) -> Self {
        Self {
            surface,
            scheduler: AnimationScheduler::new(playback.time_scale()),
            tracker: ScrollTracker::new(),
            rng: fastrand::Rng::with_seed(seed),
            profile,
            time_scale: playback.time_scale(),
            particle_budget: playback.particle_budget(),
            owned_nodes: Vec::new(),
            owned_canvases: Vec::new(),
            touched: FxHashSet::default(),
        }
    }

    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    pub(crate) fn set_profile(&mut self, profile: DeviceProfile) {
        self.profile = profile;
    }

    pub fn reduced_motion(&self) -> bool {
        self.profile.reduced_motion
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale.get()
    }

    pub fn particle_budget(&self) -> usize {
        self.particle_budget.get()
    }

    pub fn viewport(&self) -> Viewport {
        self.surface.viewport()
    }

    pub fn query(&self, selector: &Selector) -> Vec<NodeId> {
        self.surface.query(selector)
    }

    /// Query page nodes, failing if none exist
    pub fn require(&self, selector: &Selector) -> Result<Vec<NodeId>> {
        let nodes = self.surface.query(selector);
        if nodes.is_empty() {
            return Err(MotionError::MissingAnchor(selector.to_string()));
        }
        Ok(nodes)
    }

    /// Append a layer-owned node, booked for teardown
    pub fn create_node(&mut self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId {
        let node = self.surface.create_node(parent, spec);
        self.owned_nodes.push(node);
        node
    }

    /// Remove a layer-owned node and its tweens
    pub fn remove_node(&mut self, node: NodeId) {
        self.scheduler.kill_node(node);
        self.surface.remove_node(node);
        self.owned_nodes.retain(|n| *n != node);
    }

    pub fn owns(&self, node: NodeId) -> bool {
        self.owned_nodes.contains(&node)
    }

    /// Acquire a drawing context, booked for teardown
    pub fn acquire_canvas(&mut self, node: NodeId) -> Result<CanvasId> {
        let canvas = self
            .surface
            .acquire_canvas(node)
            .ok_or_else(|| MotionError::CanvasUnavailable(format!("{node:?}")))?;
        self.owned_canvases.push(canvas);
        Ok(canvas)
    }

    pub fn release_canvas(&mut self, canvas: CanvasId) {
        self.surface.release_canvas(canvas);
        self.owned_canvases.retain(|c| *c != canvas);
    }

    /// Start a tween on a node
    pub fn animate(&mut self, node: NodeId, spec: &TweenSpec) -> TweenIds {
        self.touch(node);
        self.scheduler.start(self.surface.as_mut(), node, spec)
    }

    /// Write values immediately, killing tweens on those properties
    pub fn set(&mut self, node: NodeId, values: &[(Property, PropertyValue)]) {
        self.touch(node);
        self.scheduler.set(self.surface.as_mut(), node, values);
    }

    /// Put properties back to their initial values
    pub fn reset(&mut self, node: NodeId, properties: &[Property]) {
        let values: Vec<_> = properties.iter().map(|p| (*p, p.initial_value())).collect();
        self.scheduler.set(self.surface.as_mut(), node, &values);
    }

    pub(crate) fn touch(&mut self, node: NodeId) {
        if !self.owns(node) {
            self.touched.insert(node);
        }
    }

    /// Release every booked resource and clear styles written to page nodes
    pub fn release_all(&mut self) {
        self.scheduler.kill_all();
        for canvas in self.owned_canvases.drain(..) {
            self.surface.release_canvas(canvas);
        }
        // Children go with their parents; removing them again is a no-op
        for node in self.owned_nodes.drain(..) {
            self.surface.remove_node(node);
        }
        for node in self.touched.drain() {
            self.surface.clear_properties(node);
        }
    }

    /// Resources currently booked
    pub fn owned_counts(&self) -> (usize, usize) {
        (self.owned_nodes.len(), self.owned_canvases.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceTier;
    use vitrine_core::{Rect, SceneSurface};

    fn profile(tier: DeviceTier, reduced_motion: bool) -> DeviceProfile {
        DeviceProfile {
            tier,
            reduced_motion,
            time_scale: 0.8,
            particle_cap: 15,
        }
    }

    #[test]
    fn test_playback_takes_stricter_limit() {
        let playback = PlaybackController::new(30);
        let time_scale = playback.time_scale();
        let budget = playback.particle_budget();

        playback.apply(
            &profile(DeviceTier::Mobile, false),
            &GovernorCaps {
                time_scale: 1.0,
                particle_cap: 30,
            },
        );
        assert_eq!(time_scale.get(), 0.8);
        assert_eq!(budget.get(), 15);

        playback.apply(
            &profile(DeviceTier::Mobile, false),
            &GovernorCaps {
                time_scale: 0.7,
                particle_cap: 15,
            },
        );
        assert_eq!(time_scale.get(), 0.7);
    }

    #[test]
    fn test_reduced_motion_zeroes_playback() {
        let playback = PlaybackController::new(30);
        playback.apply(
            &profile(DeviceTier::Desktop, true),
            &GovernorCaps {
                time_scale: 1.0,
                particle_cap: 30,
            },
        );
        assert_eq!(playback.time_scale().get(), 0.0);
        assert_eq!(playback.particle_budget().get(), 0);
    }

    #[test]
    fn test_release_all_cleans_up() {
        let mut scene = SceneSurface::default();
        let page = scene.insert_element(NodeSpec::new("div").bounds(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let playback = PlaybackController::new(30);
        let mut ctx = MotionContext::new(Box::new(scene), profile(DeviceTier::Desktop, false), &playback, 1);

        let holder = ctx.create_node(None, NodeSpec::new("div"));
        let canvas_node = ctx.create_node(Some(holder), NodeSpec::new("canvas"));
        ctx.acquire_canvas(canvas_node).unwrap();
        ctx.set(page, &[(Property::Opacity, PropertyValue::Float(0.5))]);

        assert_eq!(ctx.surface.layer_node_count(), 2);
        assert_eq!(ctx.surface.canvas_count(), 1);

        ctx.release_all();
        assert_eq!(ctx.surface.layer_node_count(), 0);
        assert_eq!(ctx.surface.canvas_count(), 0);
        assert_eq!(ctx.surface.property(page, Property::Opacity), None);
        assert_eq!(ctx.owned_counts(), (0, 0));
    }

    #[test]
    fn test_require_reports_missing_anchor() {
        let playback = PlaybackController::new(30);
        let ctx = MotionContext::new(
            Box::new(SceneSurface::default()),
            profile(DeviceTier::Desktop, false),
            &playback,
            1,
        );
        let err = ctx.require(&Selector::id("hero")).unwrap_err();
        assert!(matches!(err, MotionError::MissingAnchor(ref s) if s == "#hero"));
    }
}
