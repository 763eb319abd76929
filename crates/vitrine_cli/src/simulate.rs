//! Headless scroll simulation
//!
//! Drives the orchestrator against a laid-out page the way a browser would:
//! one frame per tick, a scroll down to the bottom, a pause, and a scroll back
//! to the top, with the pointer sweeping across the viewport.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;
use vitrine_core::{HostEvent, Point, SceneSurface, Surface};
use vitrine_motion::{DeviceTier, GovernorLevel, MotionConfig, Orchestrator};

use crate::page::PageLayout;

/// Knobs for one simulation run
#[derive(Clone, Debug)]
pub struct SimulationOptions {
    pub width: f32,
    pub height: f32,
    pub reduced_motion: bool,
    /// Wall time between frames
    pub frame_ms: f64,
    /// Scroll speed in pixels per second
    pub scroll_speed: f32,
    /// Pause at the bottom of the page
    pub dwell_ms: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            reduced_motion: false,
            frame_ms: 1000.0 / 60.0,
            scroll_speed: 1200.0,
            dwell_ms: 500.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EffectReport {
    pub name: String,
    pub running: bool,
}

/// Summary printed after a run
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub frames: u64,
    pub duration_ms: f64,
    pub tier: DeviceTier,
    pub reduced_motion: bool,
    pub state: String,
    pub governor_changes: u32,
    pub degraded_at_end: bool,
    pub particle_budget: usize,
    pub time_scale: f32,
    pub max_layer_nodes: usize,
    pub effects: Vec<EffectReport>,
    /// Layer-owned nodes, canvases and listeners left after teardown
    pub leaked: [usize; 3],
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Down,
    Dwell { until: f64 },
    Up,
    Done,
}

/// Run one simulation to completion and tear the layer down
pub fn run(config: MotionConfig, layout: &PageLayout, options: &SimulationOptions) -> SimulationReport {
    let mut scene = layout.build(options.width, options.height);
    scene.set_reduced_motion(options.reduced_motion);
    let max_scroll = scene.viewport().max_scroll();
    let scene = Rc::new(RefCell::new(scene));

    let mut motion = Orchestrator::new(Box::new(Rc::clone(&scene)), config);
    let state = motion.start(0.0);
    info!(?state, max_scroll, "simulation started");

    let step = options.scroll_speed * (options.frame_ms / 1000.0) as f32;
    let mut phase = Phase::Down;
    let mut scroll_y = 0.0f32;
    let mut now = 0.0f64;
    let mut frames = 0u64;
    let mut level = motion.governor_level();
    let mut governor_changes = 0u32;
    let mut max_layer_nodes = scene.borrow().layer_node_count();

    while phase != Phase::Done {
        now += options.frame_ms;

        phase = match phase {
            Phase::Down if scroll_y >= max_scroll => Phase::Dwell {
                until: now + options.dwell_ms,
            },
            Phase::Down => {
                scroll_y = (scroll_y + step).min(max_scroll);
                Phase::Down
            }
            Phase::Dwell { until } if now >= until => Phase::Up,
            Phase::Up if scroll_y <= 0.0 => Phase::Done,
            Phase::Up => {
                scroll_y = (scroll_y - step).max(0.0);
                Phase::Up
            }
            other => other,
        };

        let applied = scene.borrow_mut().scroll_to(scroll_y);
        motion.handle_event(&HostEvent::Scroll { scroll_y: applied }, now);

        // Sweep the pointer left to right once a second
        let sweep = ((now / 1000.0).fract() as f32) * options.width;
        motion.handle_event(
            &HostEvent::PointerMove {
                position: Point::new(sweep, options.height / 2.0),
            },
            now,
        );

        if motion.frame(now) {
            frames += 1;
        }

        let current = motion.governor_level();
        if current != level {
            governor_changes += 1;
            info!(
                at_ms = now,
                level = ?current,
                budget = motion.particle_budget(),
                time_scale = motion.time_scale(),
                "governor changed level"
            );
            level = current;
        }
        max_layer_nodes = max_layer_nodes.max(scene.borrow().layer_node_count());
    }

    let profile = motion.profile();
    let effects = motion
        .effects()
        .map(|(name, running)| EffectReport {
            name: name.to_string(),
            running,
        })
        .collect();
    let report_state = format!("{:?}", motion.state());
    let particle_budget = motion.particle_budget();
    let time_scale = motion.time_scale();

    motion.stop();
    let leaked = leaked(&scene.borrow());
    info!(frames, duration_ms = now, "simulation finished");

    SimulationReport {
        frames,
        duration_ms: now,
        tier: profile.tier,
        reduced_motion: profile.reduced_motion,
        state: report_state,
        governor_changes,
        degraded_at_end: level == GovernorLevel::Degraded,
        particle_budget,
        time_scale,
        max_layer_nodes,
        effects,
        leaked,
    }
}

fn leaked(scene: &SceneSurface) -> [usize; 3] {
    [scene.layer_node_count(), scene.canvas_count(), scene.listener_count()]
}
