//! Tween scheduler
//!
//! Owns every running tween and advances them once per frame. Tweens are keyed
//! by [`TweenId`]; an index on `(node, property)` enforces overwrite semantics:
//! starting a tween on a property that is already animating retires the older
//! tween, while tweens on different properties of the same node run side by
//! side.
//!
//! All tweens share one global time scale, read through a [`ReadOnly`] handle
//! so only the playback controller can change it.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use vitrine_core::{NodeId, Property, PropertyValue, ReadOnly, Surface};

use crate::tween::{Tween, TweenSpec};

new_key_type! {
    /// Handle to a running tween
    pub struct TweenId;
}

/// Ids of the tweens created by one `start` call
pub type TweenIds = SmallVec<[TweenId; 4]>;

/// Runs all tweens of the motion layer
pub struct AnimationScheduler {
    tweens: SlotMap<TweenId, Tween>,
    /// Which tween currently owns a (node, property) pair
    owners: FxHashMap<(NodeId, Property), TweenId>,
    time_scale: ReadOnly<f32>,
    reduced_motion: bool,
}

impl AnimationScheduler {
    pub fn new(time_scale: ReadOnly<f32>) -> Self {
        Self {
            tweens: SlotMap::with_key(),
            owners: FxHashMap::default(),
            time_scale,
            reduced_motion: false,
        }
    }

    /// Current global time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale.get()
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Switch the reduced-motion policy.
    ///
    /// Turning it on settles every running tween: one-shots jump to their end
    /// value and loops are dropped.
    pub fn set_reduced_motion(&mut self, surface: &mut dyn Surface, reduced: bool) {
        if reduced && !self.reduced_motion {
            self.settle_all(surface);
        }
        self.reduced_motion = reduced;
    }

    /// Start a tween on a node.
    ///
    /// Start values come from the spec's explicit `from` list, then the node's
    /// last written value, then the property's initial value. Under reduced
    /// motion nothing is started: looping specs are skipped and one-shot specs
    /// are applied as static end states.
    pub fn start(&mut self, surface: &mut dyn Surface, node: NodeId, spec: &TweenSpec) -> TweenIds {
        let mut ids = TweenIds::new();

        if self.reduced_motion {
            if spec.is_looping() {
                tracing::trace!("reduced motion: skipping looping tween");
            } else {
                self.set(surface, node, &spec.to);
            }
            return ids;
        }

        for &(property, to) in &spec.to {
            self.kill_property(node, property);

            let from = match spec.from_value(property) {
                Some(from) => {
                    surface.set_property(node, property, from);
                    from
                }
                None => surface
                    .property(node, property)
                    .unwrap_or_else(|| property.initial_value()),
            };

            let id = self.tweens.insert(Tween::new(node, property, from, to, spec));
            self.owners.insert((node, property), id);
            ids.push(id);
        }

        ids
    }

    /// Apply values immediately, killing any tween on those properties
    pub fn set(&mut self, surface: &mut dyn Surface, node: NodeId, values: &[(Property, PropertyValue)]) {
        for &(property, value) in values {
            self.kill_property(node, property);
            surface.set_property(node, property, value);
        }
    }

    /// Retire one tween. Returns false if it had already finished.
    pub fn kill(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.tweens.remove(id) else {
            return false;
        };
        let key = (tween.node(), tween.property());
        if self.owners.get(&key) == Some(&id) {
            self.owners.remove(&key);
        }
        true
    }

    /// Retire every tween on a node
    pub fn kill_node(&mut self, node: NodeId) -> usize {
        let before = self.tweens.len();
        self.tweens.retain(|_, t| t.node() != node);
        self.owners.retain(|(n, _), _| *n != node);
        before - self.tweens.len()
    }

    /// Retire every tween
    pub fn kill_all(&mut self) {
        self.tweens.clear();
        self.owners.clear();
    }

    fn kill_property(&mut self, node: NodeId, property: Property) {
        if let Some(old) = self.owners.remove(&(node, property)) {
            self.tweens.remove(old);
            tracing::trace!(%property, "overwriting running tween");
        }
    }

    /// Jump one-shot tweens to their end value and drop everything
    pub fn settle_all(&mut self, surface: &mut dyn Surface) {
        for tween in self.tweens.values() {
            if !tween.is_looping() {
                surface.set_property(tween.node(), tween.property(), tween.end_value());
            }
        }
        self.kill_all();
    }

    /// Advance all tweens by `dt_ms` of wall time.
    ///
    /// Returns the number of tweens still running afterwards.
    pub fn tick(&mut self, surface: &mut dyn Surface, dt_ms: f32) -> usize {
        let scaled = dt_ms * self.time_scale.get().max(0.0);
        let mut retired: SmallVec<[TweenId; 16]> = SmallVec::new();

        for (id, tween) in self.tweens.iter_mut() {
            // The page removed the node; nothing to write to
            if surface.bounds(tween.node()).is_none() {
                retired.push(id);
                continue;
            }
            if let Some(value) = tween.advance(scaled) {
                surface.set_property(tween.node(), tween.property(), value);
            }
            if tween.is_finished() {
                retired.push(id);
            }
        }

        for id in retired {
            self.kill(id);
        }
        self.tweens.len()
    }

    pub fn get(&self, id: TweenId) -> Option<&Tween> {
        self.tweens.get(id)
    }

    /// Whether a (node, property) pair is currently animating
    pub fn is_animating(&self, node: NodeId, property: Property) -> bool {
        self.owners.contains_key(&(node, property))
    }

    pub fn has_active_tweens(&self) -> bool {
        !self.tweens.is_empty()
    }

    pub fn tween_count(&self) -> usize {
        self.tweens.len()
    }

    /// Tweens with a repeat mode other than `Once`
    pub fn looping_count(&self) -> usize {
        self.tweens.values().filter(|t| t.is_looping()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use vitrine_core::{NodeSpec, Rect, SceneSurface, Shared};

    fn setup() -> (SceneSurface, NodeId, Shared<f32>) {
        let mut scene = SceneSurface::default();
        let node = scene.insert_element(NodeSpec::new("div").bounds(Rect::new(0.0, 0.0, 100.0, 100.0)));
        (scene, node, Shared::new(1.0))
    }

    fn opacity(scene: &SceneSurface, node: NodeId) -> f32 {
        scene.property(node, Property::Opacity).and_then(|v| v.as_float()).unwrap()
    }

    #[test]
    fn test_tick_writes_values_and_retires() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        let spec = TweenSpec::to(100.0).opacity(0.0).ease(Easing::Linear);
        scheduler.start(&mut scene, node, &spec);

        assert_eq!(scheduler.tick(&mut scene, 50.0), 1);
        assert!((opacity(&scene, node) - 0.5).abs() < 1e-5);
        assert_eq!(scheduler.tick(&mut scene, 60.0), 0);
        assert_eq!(opacity(&scene, node), 0.0);
        assert!(!scheduler.is_animating(node, Property::Opacity));
    }

    #[test]
    fn test_overwrite_retires_previous_tween() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        let first = scheduler.start(&mut scene, node, &TweenSpec::to(500.0).opacity(0.0).y(40.0));
        let second = scheduler.start(&mut scene, node, &TweenSpec::to(500.0).opacity(1.0));

        assert!(scheduler.get(first[0]).is_none());
        // y is untouched by the second tween and keeps running
        assert!(scheduler.get(first[1]).is_some());
        assert!(scheduler.get(second[0]).is_some());
        assert_eq!(scheduler.tween_count(), 2);
    }

    #[test]
    fn test_time_scale_slows_every_tween() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        scheduler.start(&mut scene, node, &TweenSpec::to(100.0).opacity(0.0).ease(Easing::Linear));

        scale.set(0.5);
        scheduler.tick(&mut scene, 100.0);
        assert!((opacity(&scene, node) - 0.5).abs() < 1e-5);

        scale.set(0.0);
        scheduler.tick(&mut scene, 1000.0);
        assert!((opacity(&scene, node) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_explicit_from_is_applied_immediately() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        let spec = TweenSpec::to(300.0)
            .from_prop(Property::Opacity, 0.0f32)
            .opacity(1.0)
            .delay(200.0);
        scheduler.start(&mut scene, node, &spec);
        assert_eq!(opacity(&scene, node), 0.0);
    }

    #[test]
    fn test_reduced_motion_applies_end_states_only() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        scheduler.set_reduced_motion(&mut scene, true);

        let ids = scheduler.start(&mut scene, node, &TweenSpec::to(800.0).opacity(0.25));
        assert!(ids.is_empty());
        assert_eq!(opacity(&scene, node), 0.25);

        let ids = scheduler.start(&mut scene, node, &TweenSpec::to(800.0).rotation(360.0).looping(false));
        assert!(ids.is_empty());
        assert_eq!(scheduler.looping_count(), 0);
        assert!(scene.property(node, Property::Rotation).is_none());
    }

    #[test]
    fn test_enabling_reduced_motion_settles_running_tweens() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        scheduler.start(&mut scene, node, &TweenSpec::to(800.0).opacity(0.2));
        scheduler.start(&mut scene, node, &TweenSpec::to(800.0).scale(1.1).looping(true));

        scheduler.set_reduced_motion(&mut scene, true);
        assert_eq!(scheduler.tween_count(), 0);
        assert!((opacity(&scene, node) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_removed_node_retires_its_tweens() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        scheduler.start(&mut scene, node, &TweenSpec::to(800.0).opacity(0.2).looping(true));
        scene.remove_element(node);
        assert_eq!(scheduler.tick(&mut scene, 16.0), 0);
    }

    #[test]
    fn test_set_kills_conflicting_tween() {
        let (mut scene, node, scale) = setup();
        let mut scheduler = AnimationScheduler::new(scale.reader());
        scheduler.start(&mut scene, node, &TweenSpec::to(800.0).opacity(0.2));
        scheduler.set(&mut scene, node, &[(Property::Opacity, PropertyValue::Float(0.3))]);
        assert_eq!(scheduler.tween_count(), 0);
        assert_eq!(opacity(&scene, node), 0.3);
        assert_eq!(scheduler.kill_node(node), 0);
    }
}
