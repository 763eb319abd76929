//! Scroll progress tracking
//!
//! [`ScrollTracker`] is the only writer of the page's scroll progress and of
//! every trigger's visibility state. Progress is published through a
//! [`Shared`] value; page widgets get a [`ReadOnly`] handle.

use slotmap::SlotMap;
use smallvec::smallvec;
use vitrine_core::{ReadOnly, Shared, Surface, Viewport};

use crate::effects::EffectId;
use crate::trigger::{BatchId, ScrollDirection, TriggerConfig, TriggerEvent, TriggerId, TriggerKind};

/// Where a trigger's node sits relative to its window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Zone {
    /// Start threshold not crossed yet
    Before,
    Inside,
    /// End threshold crossed
    After,
}

#[derive(Clone, Debug)]
struct TriggerState {
    config: TriggerConfig,
    /// `None` until the first evaluation
    zone: Option<Zone>,
    last_scrub: Option<f32>,
}

/// Normalized scroll progress of a viewport, 0 when nothing can scroll
pub fn scroll_progress(viewport: &Viewport) -> f32 {
    let range = viewport.scroll_height - viewport.height;
    if !(range > 0.0) || !viewport.scroll_y.is_finite() {
        return 0.0;
    }
    (viewport.scroll_y / range).clamp(0.0, 1.0)
}

/// Publishes scroll progress and evaluates triggers
pub struct ScrollTracker {
    progress: Shared<f32>,
    triggers: SlotMap<TriggerId, TriggerState>,
    /// Registration order
    order: Vec<TriggerId>,
    batches: SlotMap<BatchId, EffectId>,
    last_scroll_y: Option<f32>,
    direction: ScrollDirection,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self {
            progress: Shared::new(0.0),
            triggers: SlotMap::with_key(),
            order: Vec::new(),
            batches: SlotMap::with_key(),
            last_scroll_y: None,
            direction: ScrollDirection::Down,
        }
    }

    /// Read-only progress handle
    pub fn progress(&self) -> ReadOnly<f32> {
        self.progress.reader()
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Recompute progress from the viewport and push it to subscribers
    pub fn update_progress(&mut self, viewport: &Viewport) -> f32 {
        let progress = scroll_progress(viewport);
        self.progress.set(progress);
        progress
    }

    /// Open a batch owned by an effect
    pub fn create_batch(&mut self, owner: EffectId) -> BatchId {
        self.batches.insert(owner)
    }

    pub fn register(&mut self, config: TriggerConfig) -> TriggerId {
        let id = self.triggers.insert(TriggerState {
            config,
            zone: None,
            last_scrub: None,
        });
        self.order.push(id);
        id
    }

    pub fn unregister(&mut self, id: TriggerId) -> bool {
        self.order.retain(|t| *t != id);
        self.triggers.remove(id).is_some()
    }

    /// Drop every trigger and batch owned by an effect
    pub fn remove_owner(&mut self, owner: EffectId) {
        self.triggers.retain(|_, t| t.config.owner != owner);
        let triggers = &self.triggers;
        self.order.retain(|id| triggers.contains_key(*id));
        self.batches.retain(|_, o| *o != owner);
    }

    /// Drop all triggers and forget the scroll history
    pub fn clear(&mut self) {
        self.triggers.clear();
        self.order.clear();
        self.batches.clear();
        self.last_scroll_y = None;
        self.direction = ScrollDirection::Down;
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Whether a trigger's node is currently inside its window
    pub fn is_in_view(&self, id: TriggerId) -> bool {
        self.triggers
            .get(id)
            .is_some_and(|t| t.zone == Some(Zone::Inside))
    }

    /// Evaluate every trigger against the surface's current scroll position.
    ///
    /// Triggers whose node has disappeared are pruned. The very first
    /// evaluation counts as scrolling down.
    pub fn evaluate(&mut self, surface: &dyn Surface) -> Vec<TriggerEvent> {
        let viewport = surface.viewport();
        let scroll_y = viewport.scroll_y;
        let height = viewport.height;

        let scrolled = match self.last_scroll_y {
            None => true,
            Some(last) => {
                if scroll_y > last {
                    self.direction = ScrollDirection::Down;
                } else if scroll_y < last {
                    self.direction = ScrollDirection::Up;
                }
                scroll_y != last
            }
        };
        let down = self.direction == ScrollDirection::Down;

        let mut events: Vec<TriggerEvent> = Vec::new();
        let mut pruned = Vec::new();

        for &id in &self.order {
            let Some(state) = self.triggers.get_mut(id) else {
                continue;
            };
            let config = state.config;
            let Some(rect) = surface.bounds(config.node) else {
                pruned.push(id);
                continue;
            };

            let zone = if !config.start.is_crossed(&rect, scroll_y, height) {
                Zone::Before
            } else if config.end.is_crossed(&rect, scroll_y, height) {
                Zone::After
            } else {
                Zone::Inside
            };
            let previous = state.zone.unwrap_or(Zone::Before);
            state.zone = Some(zone);

            let kinds: &[TriggerKind] = match (previous, zone, down) {
                (Zone::Before, Zone::Inside, true) | (Zone::After, Zone::Inside, true) => &[TriggerKind::Enter],
                (Zone::Before, Zone::Inside, false) | (Zone::After, Zone::Inside, false) => {
                    &[TriggerKind::EnterBack]
                }
                (Zone::Inside, Zone::Before, true) | (Zone::Inside, Zone::After, true) => &[TriggerKind::Leave],
                (Zone::Inside, Zone::Before, false) | (Zone::Inside, Zone::After, false) => {
                    &[TriggerKind::LeaveBack]
                }
                // Jumped over the whole window in one step
                (Zone::Before, Zone::After, _) => &[TriggerKind::Enter, TriggerKind::Leave],
                (Zone::After, Zone::Before, _) => &[TriggerKind::EnterBack, TriggerKind::LeaveBack],
                _ => &[],
            };

            for &kind in kinds {
                push_event(&mut events, id, &config, kind);
            }

            if config.scrub && (scrolled || state.last_scrub.is_none()) {
                let s0 = config.start.crossing_scroll(&rect, height);
                let s1 = config.end.crossing_scroll(&rect, height);
                let local = if s1 > s0 {
                    ((scroll_y - s0) / (s1 - s0)).clamp(0.0, 1.0)
                } else if scroll_y >= s0 {
                    1.0
                } else {
                    0.0
                };
                if state.last_scrub != Some(local) {
                    state.last_scrub = Some(local);
                    events.push(TriggerEvent {
                        owner: config.owner,
                        trigger: id,
                        batch: None,
                        kind: TriggerKind::Scrub(local),
                        nodes: smallvec![config.node],
                    });
                }
            }
        }

        for id in pruned {
            tracing::debug!(?id, "pruning trigger whose node is gone");
            self.unregister(id);
        }

        self.last_scroll_y = Some(scroll_y);
        events
    }
}

fn push_event(events: &mut Vec<TriggerEvent>, id: TriggerId, config: &TriggerConfig, kind: TriggerKind) {
    if let Some(batch) = config.batch {
        if let Some(event) = events
            .iter_mut()
            .find(|e| e.batch == Some(batch) && e.kind == kind)
        {
            event.nodes.push(config.node);
            return;
        }
    }
    events.push(TriggerEvent {
        owner: config.owner,
        trigger: id,
        batch: config.batch,
        kind,
        nodes: smallvec![config.node],
    });
}
