//! Motion orchestrator
//!
//! Owns the whole motion layer: the effect registry, the shared context, the
//! device profiler, the frame-rate governor and the frame ticker.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --start--> Initializing --engine ok--> Active
//!                               |                        |
//!                     retries exhausted                stop
//!                               v                        v
//!                           Degraded ------stop------> TornDown --start--> Initializing
//! ```
//!
//! # Frame order
//!
//! Each accepted frame runs, in order: device re-profiling, scroll progress,
//! trigger dispatch, effect updates, tween advancement, governor sampling and
//! finally `present`.

use vitrine_core::{EventKind, HostEvent, ListenerId, ReadOnly, Surface};

use crate::config::MotionConfig;
use crate::context::{MotionContext, PlaybackController};
use crate::device::{DeviceProfile, DeviceProfiler};
use crate::effects::{
    AmbientLoops, CountUp, CustomCursor, DriftParticles, Effect, EffectId, FrameInfo, IntroSequence, LiquidBlobs,
    Parallax, ProgressBar, ScrollReveal,
};
use crate::error::MotionError;
use crate::governor::{FrameSampler, GovernorLevel, PerformanceGovernor};
use crate::ticker::{FrameTicker, FrameToken};

/// Reports whether the animation engine can run
pub trait EngineProbe {
    fn is_available(&mut self) -> bool;
}

impl<F: FnMut() -> bool> EngineProbe for F {
    fn is_available(&mut self) -> bool {
        self()
    }
}

/// Lifecycle state of the motion layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    Uninitialized,
    /// Waiting for the animation engine
    Initializing,
    Active,
    /// The engine never became available; the page stays static
    Degraded,
    TornDown,
}

struct Slot {
    effect: Box<dyn Effect>,
    running: bool,
}

#[derive(Debug, Default)]
struct Retry {
    failures: u32,
    next_at: Option<f64>,
}

/// Entry point of the motion layer
pub struct Orchestrator {
    config: MotionConfig,
    ctx: MotionContext,
    effects: Vec<Slot>,
    profiler: DeviceProfiler,
    governor: PerformanceGovernor,
    sampler: FrameSampler,
    playback: PlaybackController,
    ticker: FrameTicker,
    probe: Box<dyn EngineProbe>,
    state: MotionState,
    retry: Retry,
    listeners: Vec<ListenerId>,
    /// Scroll or resize seen since the last frame
    dirty: bool,
}

impl Orchestrator {
    /// Create an orchestrator with the default effect registry
    pub fn new(surface: Box<dyn Surface>, config: MotionConfig) -> Self {
        let max_particles = config.max_particles();
        let profiler = DeviceProfiler::new(config.device.clone(), max_particles);
        let playback = PlaybackController::new(max_particles);
        let ctx = MotionContext::new(surface, profiler.profile(), &playback, config.seed);

        let mut orchestrator = Self {
            governor: PerformanceGovernor::new(config.governor.clone()),
            sampler: FrameSampler::new(config.governor.window_ms),
            ctx,
            effects: Vec::new(),
            profiler,
            playback,
            ticker: FrameTicker::new(),
            probe: Box::new(|| true),
            state: MotionState::Uninitialized,
            retry: Retry::default(),
            listeners: Vec::new(),
            dirty: false,
            config,
        };
        for effect in default_effects(&orchestrator.config) {
            orchestrator.register(effect);
        }
        orchestrator
    }

    /// Replace the engine availability check
    pub fn with_probe(mut self, probe: impl EngineProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Add an effect. A running layer starts it right away.
    pub fn register(&mut self, effect: Box<dyn Effect>) -> EffectId {
        let id = EffectId(self.effects.len() as u32);
        self.effects.push(Slot { effect, running: false });
        if self.state == MotionState::Active {
            self.start_effect(id);
        }
        id
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bring the layer up. Calling it while starting or running does nothing.
    pub fn start(&mut self, now: f64) -> MotionState {
        match self.state {
            MotionState::Initializing | MotionState::Active | MotionState::Degraded => {
                tracing::debug!(state = ?self.state, "start ignored");
            }
            MotionState::Uninitialized | MotionState::TornDown => {
                self.state = MotionState::Initializing;
                self.retry = Retry::default();
                self.try_activate(now);
            }
        }
        self.state
    }

    fn try_activate(&mut self, now: f64) {
        if self.probe.is_available() {
            self.activate();
            return;
        }

        self.retry.failures += 1;
        if self.retry.failures > self.config.engine.max_retries {
            let err = MotionError::EngineUnavailable {
                attempts: self.retry.failures,
            };
            tracing::error!(error = %err, "running without motion");
            self.retry.next_at = None;
            self.state = MotionState::Degraded;
        } else {
            let delay = self.config.engine.retry_delay_ms;
            tracing::warn!(attempt = self.retry.failures, delay_ms = delay, "animation engine unavailable, retrying");
            self.retry.next_at = Some(now + delay);
        }
    }

    fn activate(&mut self) {
        for kind in EventKind::ALL {
            self.listeners.push(self.ctx.surface.add_listener(kind));
        }

        let viewport = self.ctx.viewport();
        let reduced = self.ctx.surface.prefers_reduced_motion();
        self.profiler.refresh(viewport.readable_width(), reduced);
        let profile = self.profiler.profile();
        self.ctx.set_profile(profile);
        self.ctx.scheduler.set_reduced_motion(self.ctx.surface.as_mut(), reduced);

        self.governor.reset();
        self.apply_playback();
        self.ctx.tracker.update_progress(&viewport);

        for i in 0..self.effects.len() {
            self.start_effect(EffectId(i as u32));
        }
        // Elements already in view react without waiting for a scroll
        self.dispatch_triggers();

        self.ticker.start();
        self.sampler.reset();
        self.dirty = false;
        self.state = MotionState::Active;

        let running = self.effects.iter().filter(|s| s.running).count();
        tracing::info!(
            tier = %profile.tier,
            reduced_motion = profile.reduced_motion,
            effects = running,
            "motion layer active"
        );
    }

    fn start_effect(&mut self, id: EffectId) {
        let Some(slot) = self.effects.get_mut(id.0 as usize) else {
            return;
        };
        match slot.effect.start(&mut self.ctx, id) {
            Ok(()) => slot.running = true,
            Err(err) => {
                tracing::warn!(effect = slot.effect.name(), error = %err, "effect skipped");
                // Undo whatever was created before the failure
                slot.effect.stop(&mut self.ctx);
                slot.running = false;
            }
        }
    }

    fn stop_effects(&mut self) {
        for slot in self.effects.iter_mut().filter(|s| s.running) {
            slot.effect.stop(&mut self.ctx);
            slot.running = false;
        }
    }

    /// Tear everything down. Safe to call any number of times.
    pub fn stop(&mut self) {
        if matches!(self.state, MotionState::Uninitialized | MotionState::TornDown) {
            return;
        }

        self.ticker.stop();
        self.stop_effects();
        self.ctx.scheduler.kill_all();
        self.ctx.tracker.clear();
        self.ctx.release_all();
        for listener in self.listeners.drain(..) {
            self.ctx.surface.remove_listener(listener);
        }
        self.retry = Retry::default();
        self.dirty = false;
        self.state = MotionState::TornDown;
        tracing::info!("motion layer torn down");
    }

    // =========================================================================
    // Host input
    // =========================================================================

    /// Feed a host event received at `now` (ms)
    pub fn handle_event(&mut self, event: &HostEvent, now: f64) {
        if self.state != MotionState::Active {
            return;
        }
        match event {
            HostEvent::Scroll { .. } => self.dirty = true,
            HostEvent::Resize { .. } | HostEvent::OrientationChange => {
                self.profiler.notify_viewport_change(now);
                self.dirty = true;
            }
            HostEvent::PointerMove { .. } | HostEvent::PointerEnter { .. } | HostEvent::PointerLeave { .. } => {
                for slot in self.effects.iter_mut().filter(|s| s.running) {
                    slot.effect.on_event(&mut self.ctx, event);
                }
            }
        }
    }

    /// Run one frame for the current run. Returns false if nothing ran.
    ///
    /// While waiting for the engine this only drives the retry timer.
    pub fn frame(&mut self, now: f64) -> bool {
        if self.state == MotionState::Initializing {
            if self.retry.next_at.is_some_and(|at| now >= at) {
                self.try_activate(now);
            }
            return false;
        }
        match self.ticker.token() {
            Some(token) => self.frame_with(token, now),
            None => false,
        }
    }

    /// Run a frame that was requested with `token`.
    ///
    /// Frames requested before the last stop or restart are ignored.
    pub fn frame_with(&mut self, token: FrameToken, now: f64) -> bool {
        if !self.ticker.accept(token) {
            tracing::trace!("stale frame ignored");
            return false;
        }
        let dt_ms = self.ticker.delta(now) as f32;

        let viewport = self.ctx.viewport();
        let reduced = self.ctx.surface.prefers_reduced_motion();
        let width = viewport.readable_width();
        let changed = if reduced != self.profiler.profile().reduced_motion {
            self.profiler.refresh(width, reduced)
        } else {
            self.profiler.poll(now, width, reduced)
        };
        if let Some(profile) = changed {
            self.apply_profile(profile);
        }

        if self.dirty {
            self.dirty = false;
            self.ctx.tracker.update_progress(&viewport);
            self.dispatch_triggers();
        }

        let frame = FrameInfo {
            now,
            dt_ms,
            time_scale: self.ctx.time_scale(),
        };
        for slot in self.effects.iter_mut().filter(|s| s.running) {
            slot.effect.update(&mut self.ctx, &frame);
        }

        self.ctx.scheduler.tick(self.ctx.surface.as_mut(), dt_ms);

        if let Some(fps) = self.sampler.tick(now) {
            if self.governor.observe(fps).is_some() {
                self.apply_playback();
            }
        }

        self.ctx.surface.present();
        true
    }

    fn dispatch_triggers(&mut self) {
        let events = self.ctx.tracker.evaluate(self.ctx.surface.as_ref());
        for event in events {
            let Some(slot) = self.effects.get_mut(event.owner.0 as usize) else {
                continue;
            };
            if slot.running {
                if event.kind.is_transition() {
                    tracing::debug!(effect = slot.effect.name(), kind = ?event.kind, nodes = event.nodes.len(), "trigger");
                }
                slot.effect.on_trigger(&mut self.ctx, &event);
            }
        }
    }

    fn apply_profile(&mut self, profile: DeviceProfile) {
        let previous = self.ctx.profile();
        self.ctx.set_profile(profile);
        self.apply_playback();
        tracing::info!(tier = %profile.tier, reduced_motion = profile.reduced_motion, "device profile applied");

        if previous.reduced_motion != profile.reduced_motion {
            self.ctx
                .scheduler
                .set_reduced_motion(self.ctx.surface.as_mut(), profile.reduced_motion);
            self.stop_effects();
            for i in 0..self.effects.len() {
                self.start_effect(EffectId(i as u32));
            }
            self.dispatch_triggers();
        } else {
            for slot in self.effects.iter_mut().filter(|s| s.running) {
                slot.effect.on_profile_change(&mut self.ctx, &profile);
            }
            // Effects may have registered new triggers
            self.dirty = true;
        }
    }

    fn apply_playback(&mut self) {
        let caps = self.governor.caps(self.ctx.profile().particle_cap);
        self.playback.apply(&self.ctx.profile(), &caps);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Page scroll progress in 0..=1
    pub fn scroll_progress(&self) -> ReadOnly<f32> {
        self.ctx.tracker.progress()
    }

    /// Particles allowed on screen right now
    pub fn particle_budget(&self) -> usize {
        self.ctx.particle_budget()
    }

    /// Global tween speed multiplier right now
    pub fn time_scale(&self) -> f32 {
        self.ctx.time_scale()
    }

    pub fn profile(&self) -> DeviceProfile {
        self.ctx.profile()
    }

    pub fn governor_level(&self) -> GovernorLevel {
        self.governor.level()
    }

    /// Token for scheduling the next frame, while running
    pub fn frame_token(&self) -> Option<FrameToken> {
        self.ticker.token()
    }

    pub fn context(&self) -> &MotionContext {
        &self.ctx
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Registered effect names in start order, with whether each is running
    pub fn effects(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.effects.iter().map(|s| (s.effect.name(), s.running))
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The site's effects in start order
pub fn default_effects(config: &MotionConfig) -> Vec<Box<dyn Effect>> {
    let mut effects: Vec<Box<dyn Effect>> = vec![
        Box::new(DriftParticles::new(config.particles.drift.clone())),
        Box::new(LiquidBlobs::new(config.particles.blobs.clone(), config.max_particles())),
    ];
    effects.extend(
        config
            .reveals
            .iter()
            .cloned()
            .map(|reveal| Box::new(ScrollReveal::new(reveal)) as Box<dyn Effect>),
    );
    effects.push(Box::new(Parallax::new(config.parallax.clone())));
    effects.push(Box::new(CustomCursor::new(config.cursor.clone())));
    effects.push(Box::new(AmbientLoops::new(config.ambient.clone())));
    effects.push(Box::new(ProgressBar::new(config.progress_bar.clone())));
    effects.push(Box::new(CountUp::new(config.count_up.clone())));
    effects.push(Box::new(IntroSequence::new(config.intro.clone())));
    effects
}
