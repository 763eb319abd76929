//! Motion layer configuration
//!
//! Everything tunable about the motion layer lives in one [`MotionConfig`],
//! loaded from TOML. Every field has a default matching the production site,
//! so an empty file is a valid configuration:
//!
//! ```toml
//! seed = 7
//!
//! [device]
//! mobile_max_width = 768.0
//!
//! [governor]
//! degrade_below_fps = 30
//!
//! [[reveals]]
//! name = "cards"
//! selector = ".service-card"
//! start = "top 85%"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use vitrine_animation::{Easing, Position, PropertyList, Stagger, TweenSpec};
use vitrine_core::{Property, Selector};

use crate::device::DeviceTier;
use crate::error::{MotionError, Result};
use crate::trigger::{Edge, Threshold, ViewportPosition};

const fn threshold(edge: Edge, position: ViewportPosition) -> Threshold {
    Threshold::new(edge, position)
}

// =============================================================================
// Top level
// =============================================================================

/// Complete motion layer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Seed for particle randomness; equal seeds give equal fields
    pub seed: u64,
    pub device: DeviceConfig,
    pub governor: GovernorConfig,
    pub engine: EngineConfig,
    pub particles: ParticlesConfig,
    pub reveals: Vec<RevealConfig>,
    pub parallax: ParallaxConfig,
    pub cursor: CursorConfig,
    pub ambient: AmbientConfig,
    pub progress_bar: ProgressBarConfig,
    pub count_up: CountUpConfig,
    pub intro: IntroConfig,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            device: DeviceConfig::default(),
            governor: GovernorConfig::default(),
            engine: EngineConfig::default(),
            particles: ParticlesConfig::default(),
            reveals: RevealConfig::defaults(),
            parallax: ParallaxConfig::default(),
            cursor: CursorConfig::default(),
            ambient: AmbientConfig::default(),
            progress_bar: ProgressBarConfig::default(),
            count_up: CountUpConfig::default(),
            intro: IntroConfig::default(),
        }
    }
}

impl MotionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: MotionConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MotionError::InvalidConfig(e.to_string()))
    }

    /// Largest number of drift particles the field may ever show
    pub fn max_particles(&self) -> usize {
        self.particles.drift.max_particles
    }

    /// Check value ranges that the type system cannot express
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(MotionError::InvalidConfig(msg));

        let d = &self.device;
        if !(d.mobile_max_width > 0.0 && d.mobile_max_width < d.tablet_max_width) {
            return invalid(format!(
                "device breakpoints must satisfy 0 < mobile_max_width ({}) < tablet_max_width ({})",
                d.mobile_max_width, d.tablet_max_width
            ));
        }
        for (name, scale) in [
            ("mobile_time_scale", d.mobile_time_scale),
            ("tablet_time_scale", d.tablet_time_scale),
            ("desktop_time_scale", d.desktop_time_scale),
        ] {
            if !(scale > 0.0 && scale <= 4.0) {
                return invalid(format!("device.{name} must be in (0, 4], got {scale}"));
            }
        }

        let g = &self.governor;
        if g.degrade_below_fps >= g.restore_above_fps {
            return invalid(format!(
                "governor.degrade_below_fps ({}) must be below restore_above_fps ({})",
                g.degrade_below_fps, g.restore_above_fps
            ));
        }
        if g.window_ms <= 0.0 {
            return invalid("governor.window_ms must be positive".into());
        }
        if !(0.0..=1.0).contains(&g.degraded_particle_ratio) {
            return invalid("governor.degraded_particle_ratio must be in [0, 1]".into());
        }

        let drift = &self.particles.drift;
        if drift.looping_particles > drift.max_particles {
            return invalid(format!(
                "particles.drift.looping_particles ({}) exceeds max_particles ({})",
                drift.looping_particles, drift.max_particles
            ));
        }
        check_range("particles.drift size", drift.min_size, drift.max_size)?;
        check_range("particles.drift duration", drift.min_duration_ms, drift.max_duration_ms)?;
        check_range("particles.drift lifetime", drift.min_lifetime_ms, drift.max_lifetime_ms)?;
        check_range("particles.blobs radius", self.particles.blobs.min_radius, self.particles.blobs.max_radius)?;
        check_range("particles.blobs hue", self.particles.blobs.min_hue, self.particles.blobs.max_hue)?;

        for reveal in &self.reveals {
            if reveal.to.is_empty() {
                return invalid(format!("reveal '{}' has no target values", reveal.name));
            }
        }
        for effect in &self.ambient.loops {
            if effect.selector.is_some() == effect.create.is_some() {
                return invalid(format!(
                    "ambient loop '{}' needs exactly one of `selector` or `create`",
                    effect.name
                ));
            }
        }
        if !(self.cursor.smoothing > 0.0 && self.cursor.smoothing <= 1.0) {
            return invalid("cursor.smoothing must be in (0, 1]".into());
        }
        Ok(())
    }
}

fn check_range(name: &str, min: f32, max: f32) -> Result<()> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(MotionError::InvalidConfig(format!("{name}: min ({min}) must not exceed max ({max})")))
    }
}

// =============================================================================
// Device profiling / governor / engine
// =============================================================================

/// Breakpoints and per-tier presets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Widths up to this are mobile
    pub mobile_max_width: f32,
    /// Widths up to this (and above mobile) are tablet
    pub tablet_max_width: f32,
    pub mobile_time_scale: f32,
    pub tablet_time_scale: f32,
    pub desktop_time_scale: f32,
    pub mobile_particle_cap: usize,
    pub tablet_particle_cap: usize,
    /// Quiet period after a resize or orientation change before re-profiling
    pub settle_delay_ms: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mobile_max_width: 768.0,
            tablet_max_width: 1024.0,
            mobile_time_scale: 0.8,
            tablet_time_scale: 0.9,
            desktop_time_scale: 1.0,
            mobile_particle_cap: 15,
            tablet_particle_cap: 25,
            settle_delay_ms: 100.0,
        }
    }
}

/// Frame-rate governor thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Length of one sampling window
    pub window_ms: f64,
    /// Degrade when a window measures fewer frames per second than this
    pub degrade_below_fps: u32,
    /// Restore when a window measures more frames per second than this
    pub restore_above_fps: u32,
    pub degraded_time_scale: f32,
    /// Share of the particle maximum kept while degraded
    pub degraded_particle_ratio: f32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000.0,
            degrade_below_fps: 30,
            restore_above_fps: 55,
            degraded_time_scale: 0.7,
            degraded_particle_ratio: 0.5,
        }
    }
}

/// Retry policy while the animation engine is unavailable
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retry_delay_ms: f64,
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 500.0,
            max_retries: 3,
        }
    }
}

// =============================================================================
// Particles
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlesConfig {
    pub drift: DriftConfig,
    pub blobs: BlobConfig,
}

/// Rising DOM particles
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub enabled: bool,
    /// Pool size, also the particle budget on desktop
    pub max_particles: usize,
    /// Particles created on start that wrap around forever
    pub looping_particles: usize,
    /// Spawn an expiring particle this often while below budget (0 disables)
    pub spawn_interval_ms: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Time to rise across the viewport
    pub min_duration_ms: f32,
    pub max_duration_ms: f32,
    /// Lifetime of expiring particles
    pub min_lifetime_ms: f32,
    pub max_lifetime_ms: f32,
    /// Maximum horizontal drift over one rise
    pub sway: f32,
    /// Extra distance below the viewport particles start from
    pub overscan: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
    pub min_pulse_ms: f32,
    pub max_pulse_ms: f32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_particles: 30,
            looping_particles: 24,
            spawn_interval_ms: 2000.0,
            min_size: 2.0,
            max_size: 8.0,
            min_duration_ms: 15_000.0,
            max_duration_ms: 40_000.0,
            min_lifetime_ms: 6_000.0,
            max_lifetime_ms: 12_000.0,
            sway: 100.0,
            overscan: 200.0,
            min_opacity: 0.2,
            max_opacity: 1.0,
            min_pulse_ms: 2_000.0,
            max_pulse_ms: 6_000.0,
        }
    }
}

/// Canvas liquid blobs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub enabled: bool,
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Largest per-frame velocity on each axis
    pub max_speed: f32,
    pub min_hue: f32,
    pub max_hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 3,
            min_radius: 100.0,
            max_radius: 300.0,
            max_speed: 1.0,
            min_hue: 45.0,
            max_hue: 75.0,
            saturation: 0.8,
            lightness: 0.6,
            alpha: 0.1,
        }
    }
}

// =============================================================================
// Style values
// =============================================================================

/// A set of property values as written in configuration files
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Horizontal shift as a percentage of the node's width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_percent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_alpha: Option<f32>,
}

impl StyleValues {
    pub fn is_empty(&self) -> bool {
        self.to_list().is_empty()
    }

    /// Property/value pairs in a fixed order
    pub fn to_list(&self) -> PropertyList {
        [
            (Property::Opacity, self.opacity),
            (Property::TranslateX, self.x),
            (Property::TranslateY, self.y),
            (Property::XPercent, self.x_percent),
            (Property::Scale, self.scale),
            (Property::Rotation, self.rotation),
            (Property::ShadowAlpha, self.shadow_alpha),
        ]
        .into_iter()
        .filter_map(|(p, v)| v.map(|v| (p, v.into())))
        .collect()
    }

    /// Tween spec animating to these values
    pub fn tween(&self, duration_ms: f32, easing: Easing) -> TweenSpec {
        let mut spec = TweenSpec::to(duration_ms).ease(easing);
        spec.to = self.to_list();
        spec
    }
}

// =============================================================================
// Effects
// =============================================================================

/// What a reveal does when its trigger makes a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    /// Tween to the target values
    Play,
    /// Tween back to the resting values
    Reverse,
    /// Drop opacity to the dim level at once
    Dim,
    /// Tween opacity back to 1
    Restore,
    None,
}

impl std::str::FromStr for ToggleAction {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "play" => Ok(ToggleAction::Play),
            "reverse" => Ok(ToggleAction::Reverse),
            "dim" => Ok(ToggleAction::Dim),
            "restore" => Ok(ToggleAction::Restore),
            "none" => Ok(ToggleAction::None),
            other => Err(MotionError::InvalidConfig(format!("unknown toggle action '{other}'"))),
        }
    }
}

impl ToggleAction {
    fn name(self) -> &'static str {
        match self {
            ToggleAction::Play => "play",
            ToggleAction::Reverse => "reverse",
            ToggleAction::Dim => "dim",
            ToggleAction::Restore => "restore",
            ToggleAction::None => "none",
        }
    }
}

/// Actions for enter, leave, enter-back and leave-back, written as
/// `"play dim restore none"`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToggleActions {
    pub enter: ToggleAction,
    pub leave: ToggleAction,
    pub enter_back: ToggleAction,
    pub leave_back: ToggleAction,
}

impl ToggleActions {
    pub const fn new(enter: ToggleAction, leave: ToggleAction, enter_back: ToggleAction, leave_back: ToggleAction) -> Self {
        Self {
            enter,
            leave,
            enter_back,
            leave_back,
        }
    }
}

impl std::str::FromStr for ToggleActions {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let actions = s
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<ToggleAction>>>()?;
        match actions.as_slice() {
            [enter, leave, enter_back, leave_back] => Ok(Self::new(*enter, *leave, *enter_back, *leave_back)),
            _ => Err(MotionError::InvalidConfig(format!(
                "toggle actions need four entries, got '{s}'"
            ))),
        }
    }
}

impl std::fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.enter.name(),
            self.leave.name(),
            self.enter_back.name(),
            self.leave_back.name()
        )
    }
}

impl TryFrom<String> for ToggleActions {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ToggleActions> for String {
    fn from(value: ToggleActions) -> Self {
        value.to_string()
    }
}

/// Scroll reveal of every node matching a selector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealConfig {
    pub name: String,
    pub selector: Selector,
    #[serde(default = "default_reveal_start")]
    pub start: Threshold,
    #[serde(default = "default_reveal_end")]
    pub end: Threshold,
    /// Merge simultaneous transitions and stagger them
    #[serde(default)]
    pub batch: bool,
    /// Animate a layer-owned overlay child with this class instead of the node
    #[serde(default)]
    pub overlay: Option<String>,
    /// Static state applied on start
    #[serde(default)]
    pub from: Option<StyleValues>,
    pub to: StyleValues,
    #[serde(default = "default_reveal_duration")]
    pub duration_ms: f32,
    #[serde(default = "default_reveal_easing")]
    pub easing: Easing,
    #[serde(default)]
    pub stagger_ms: f32,
    #[serde(default = "default_reveal_actions")]
    pub actions: ToggleActions,
    #[serde(default = "default_dim_opacity")]
    pub dim_opacity: f32,
    #[serde(default = "default_restore_ms")]
    pub restore_ms: f32,
    /// Overrides applied on mobile devices
    #[serde(default)]
    pub mobile: Option<RevealVariant>,
    /// Overrides applied on tablets
    #[serde(default)]
    pub tablet: Option<RevealVariant>,
}

/// Per-tier replacement of a reveal's motion. Unset fields keep the base value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealVariant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<StyleValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<StyleValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stagger_ms: Option<f32>,
}

fn default_reveal_start() -> Threshold {
    threshold(Edge::Top, ViewportPosition::Percent(85.0))
}

fn default_reveal_end() -> Threshold {
    threshold(Edge::Bottom, ViewportPosition::Top)
}

fn default_reveal_duration() -> f32 {
    800.0
}

fn default_reveal_easing() -> Easing {
    Easing::PowerOut(2)
}

fn default_reveal_actions() -> ToggleActions {
    ToggleActions::new(ToggleAction::Play, ToggleAction::Dim, ToggleAction::Restore, ToggleAction::None)
}

fn default_dim_opacity() -> f32 {
    0.3
}

fn default_restore_ms() -> f32 {
    300.0
}

impl RevealConfig {
    /// A reveal with the default window and actions
    pub fn new(name: impl Into<String>, selector: Selector, to: StyleValues) -> Self {
        Self {
            name: name.into(),
            selector,
            start: default_reveal_start(),
            end: default_reveal_end(),
            batch: false,
            overlay: None,
            from: None,
            to,
            duration_ms: default_reveal_duration(),
            easing: default_reveal_easing(),
            stagger_ms: 0.0,
            actions: default_reveal_actions(),
            dim_opacity: default_dim_opacity(),
            restore_ms: default_restore_ms(),
            mobile: None,
            tablet: None,
        }
    }

    pub fn variant(&self, tier: DeviceTier) -> Option<&RevealVariant> {
        match tier {
            DeviceTier::Mobile => self.mobile.as_ref(),
            DeviceTier::Tablet => self.tablet.as_ref(),
            DeviceTier::Desktop => None,
        }
    }

    /// Whether any tier plays this reveal differently
    pub fn has_variants(&self) -> bool {
        self.mobile.is_some() || self.tablet.is_some()
    }

    /// The reveal as played on `tier`
    pub fn for_tier(&self, tier: DeviceTier) -> RevealConfig {
        let mut resolved = RevealConfig {
            mobile: None,
            tablet: None,
            ..self.clone()
        };
        if let Some(v) = self.variant(tier) {
            if v.from.is_some() {
                resolved.from = v.from;
            }
            resolved.to = v.to.unwrap_or(self.to);
            resolved.duration_ms = v.duration_ms.unwrap_or(self.duration_ms);
            resolved.easing = v.easing.unwrap_or(self.easing);
            resolved.stagger_ms = v.stagger_ms.unwrap_or(self.stagger_ms);
        }
        resolved
    }

    /// Card and gallery reveals with lighter mobile and tablet variants, glass
    /// overlays, the text shimmer sweep and section magnetism
    pub fn defaults() -> Vec<RevealConfig> {
        let hidden = StyleValues {
            opacity: Some(0.0),
            y: Some(50.0),
            scale: Some(0.95),
            ..Default::default()
        };
        let shown = StyleValues {
            opacity: Some(1.0),
            y: Some(0.0),
            scale: Some(1.0),
            ..Default::default()
        };
        let toggle = ToggleActions::new(
            ToggleAction::Play,
            ToggleAction::Reverse,
            ToggleAction::Play,
            ToggleAction::Reverse,
        );
        // Fade and rise only, no scale
        let mobile = RevealVariant {
            from: Some(StyleValues {
                opacity: Some(0.0),
                y: Some(50.0),
                ..Default::default()
            }),
            to: Some(StyleValues {
                opacity: Some(1.0),
                y: Some(0.0),
                ..Default::default()
            }),
            duration_ms: Some(600.0),
            easing: Some(Easing::PowerOut(2)),
            stagger_ms: Some(100.0),
        };
        let tablet = RevealVariant {
            from: Some(StyleValues {
                opacity: Some(0.0),
                y: Some(60.0),
                scale: Some(0.9),
                ..Default::default()
            }),
            to: Some(shown),
            duration_ms: Some(800.0),
            easing: Some(Easing::BackOut(1.7)),
            stagger_ms: Some(150.0),
        };
        let text = Selector::tag("p")
            .or(Selector::tag("h1"))
            .or(Selector::tag("h2"))
            .or(Selector::tag("h3"))
            .or(Selector::tag("h4"))
            .or(Selector::tag("h5"))
            .or(Selector::tag("h6"));

        vec![
            RevealConfig {
                batch: true,
                from: Some(hidden),
                stagger_ms: 100.0,
                mobile: Some(mobile),
                tablet: Some(tablet),
                ..RevealConfig::new("cards", Selector::class("service-card"), shown)
            },
            RevealConfig {
                batch: true,
                from: Some(hidden),
                duration_ms: 600.0,
                easing: Easing::BackOut(1.7),
                stagger_ms: 50.0,
                mobile: Some(mobile),
                ..RevealConfig::new("gallery", Selector::class("gallery-item"), shown)
            },
            RevealConfig {
                start: threshold(Edge::Top, ViewportPosition::Percent(70.0)),
                end: threshold(Edge::Bottom, ViewportPosition::Percent(30.0)),
                overlay: Some("glass-overlay".into()),
                from: Some(StyleValues {
                    opacity: Some(0.0),
                    ..Default::default()
                }),
                duration_ms: 500.0,
                actions: toggle,
                ..RevealConfig::new(
                    "glass",
                    Selector::class("service-card")
                        .or(Selector::class("gallery-item"))
                        .or(Selector::class("contact-info")),
                    StyleValues {
                        opacity: Some(1.0),
                        ..Default::default()
                    },
                )
            },
            RevealConfig {
                start: threshold(Edge::Top, ViewportPosition::Percent(80.0)),
                batch: true,
                overlay: Some("text-shimmer".into()),
                from: Some(StyleValues {
                    x_percent: Some(-100.0),
                    ..Default::default()
                }),
                duration_ms: 1_500.0,
                stagger_ms: 100.0,
                actions: ToggleActions::new(ToggleAction::Play, ToggleAction::None, ToggleAction::None, ToggleAction::None),
                ..RevealConfig::new(
                    "text-shimmer",
                    text,
                    StyleValues {
                        x_percent: Some(100.0),
                        ..Default::default()
                    },
                )
            },
            RevealConfig {
                start: threshold(Edge::Top, ViewportPosition::Center),
                end: threshold(Edge::Bottom, ViewportPosition::Center),
                actions: toggle,
                ..RevealConfig::new(
                    "magnetism",
                    Selector::tag("section"),
                    StyleValues {
                        scale: Some(1.02),
                        ..Default::default()
                    },
                )
            },
        ]
    }
}

/// One scrub-linked parallax layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParallaxLayer {
    pub selector: Selector,
    /// `y_percent` reaches `-50 * speed` at the end of the window
    pub speed: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    pub enabled: bool,
    pub start: Threshold,
    pub end: Threshold,
    pub layers: Vec<ParallaxLayer>,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        let layer = |selector, speed| ParallaxLayer { selector, speed };
        Self {
            enabled: true,
            start: threshold(Edge::Top, ViewportPosition::Bottom),
            end: threshold(Edge::Bottom, ViewportPosition::Top),
            layers: vec![
                layer(Selector::class("hero-particles"), 0.5),
                layer(Selector::class("service-card"), 0.3),
                layer(Selector::class("gallery-item"), 0.7),
                layer(Selector::tag("h1").or(Selector::tag("h2")), 0.2),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub enabled: bool,
    /// Fraction of the remaining distance covered each frame
    pub smoothing: f32,
    pub size: f32,
    pub hover_scale: f32,
    pub hover_ms: f32,
    pub hover_easing: Easing,
    /// Elements that grow the cursor while hovered
    pub interactive: Selector,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smoothing: 0.1,
            size: 20.0,
            hover_scale: 2.0,
            hover_ms: 300.0,
            hover_easing: Easing::BackOut(1.7),
            interactive: Selector::tag("button")
                .or(Selector::tag("a"))
                .or(Selector::class("service-card"))
                .or(Selector::class("gallery-item")),
        }
    }
}

/// A decorative infinite tween
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    pub name: String,
    /// Animate existing page nodes
    #[serde(default)]
    pub selector: Option<Selector>,
    /// Animate a layer-owned full-viewport node with this class
    #[serde(default)]
    pub create: Option<String>,
    pub to: StyleValues,
    pub duration_ms: f32,
    /// Random extra duration per node
    #[serde(default)]
    pub jitter_ms: f32,
    /// Start delay between consecutive nodes
    #[serde(default)]
    pub stagger_ms: f32,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub yoyo: bool,
    /// Scaled time to wait after start before the loop begins
    #[serde(default)]
    pub start_after_ms: f32,
}

impl LoopConfig {
    fn on_page(name: &str, selector: Selector, to: StyleValues, duration_ms: f32) -> Self {
        Self {
            name: name.into(),
            selector: Some(selector),
            create: None,
            to,
            duration_ms,
            jitter_ms: 0.0,
            stagger_ms: 0.0,
            easing: Easing::SineInOut,
            yoyo: true,
            start_after_ms: 0.0,
        }
    }

    fn created(name: &str, class: &str, to: StyleValues, duration_ms: f32) -> Self {
        Self {
            selector: None,
            create: Some(class.into()),
            ..Self::on_page(name, Selector::tag("body"), to, duration_ms)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub enabled: bool,
    pub loops: Vec<LoopConfig>,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        let values = |f: fn(&mut StyleValues)| {
            let mut v = StyleValues::default();
            f(&mut v);
            v
        };
        Self {
            enabled: true,
            loops: vec![
                LoopConfig {
                    easing: Easing::Linear,
                    yoyo: false,
                    ..LoopConfig::created("aurora-spin", "aurora", values(|v| v.rotation = Some(360.0)), 60_000.0)
                },
                LoopConfig::created("aurora-breathe", "aurora", values(|v| v.scale = Some(1.2)), 20_000.0),
                LoopConfig {
                    easing: Easing::Linear,
                    yoyo: false,
                    ..LoopConfig::created("marquee", "marquee", values(|v| v.x = Some(-1200.0)), 30_000.0)
                },
                LoopConfig {
                    stagger_ms: 300.0,
                    ..LoopConfig::on_page(
                        "card-glow",
                        Selector::class("service-card").or(Selector::class("gallery-item")),
                        values(|v| v.shadow_alpha = Some(0.1)),
                        4_000.0,
                    )
                },
                LoopConfig {
                    jitter_ms: 1_000.0,
                    stagger_ms: 100.0,
                    ..LoopConfig::on_page(
                        "floating-letters",
                        Selector::class("floating-letter"),
                        values(|v| v.y = Some(-20.0)),
                        3_000.0,
                    )
                },
                // Held back until the intro has scaled the CTA in
                LoopConfig {
                    stagger_ms: 400.0,
                    start_after_ms: 3_000.0,
                    ..LoopConfig::on_page(
                        "button-pulse",
                        Selector::tag("button").or(Selector::class("cta-button")),
                        values(|v| v.scale = Some(1.05)),
                        2_000.0,
                    )
                },
                LoopConfig::on_page(
                    "progress-glow",
                    Selector::id("scroll-progress"),
                    values(|v| v.shadow_alpha = Some(0.8)),
                    2_000.0,
                ),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressBarConfig {
    pub enabled: bool,
    pub selector: Selector,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selector: Selector::id("scroll-progress"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountUpConfig {
    pub enabled: bool,
    pub selector: Selector,
    /// Attribute holding the target number
    pub attribute: String,
    pub start: Threshold,
    pub duration_ms: f32,
    pub easing: Easing,
}

impl Default for CountUpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selector: Selector::attribute("data-count"),
            attribute: "data-count".into(),
            start: threshold(Edge::Top, ViewportPosition::Percent(80.0)),
            duration_ms: 2_000.0,
            easing: Easing::PowerOut(2),
        }
    }
}

/// One group of the page-load intro
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntroStep {
    pub selector: Selector,
    #[serde(default)]
    pub from: Option<StyleValues>,
    pub to: StyleValues,
    pub duration_ms: f32,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub stagger_ms: f32,
    #[serde(default)]
    pub position: Position,
}

impl IntroStep {
    pub fn stagger(&self) -> Stagger {
        Stagger::new(self.stagger_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub enabled: bool,
    pub steps: Vec<IntroStep>,
}

impl Default for IntroConfig {
    fn default() -> Self {
        let rise = |y: f32| StyleValues {
            opacity: Some(0.0),
            y: Some(y),
            ..Default::default()
        };
        let settled = StyleValues {
            opacity: Some(1.0),
            y: Some(0.0),
            ..Default::default()
        };
        let step = |selector, from, to, duration_ms, easing, stagger_ms, position| IntroStep {
            selector,
            from: Some(from),
            to,
            duration_ms,
            easing,
            stagger_ms,
            position,
        };
        Self {
            enabled: true,
            steps: vec![
                step(Selector::tag("h1"), rise(50.0), settled, 1200.0, Easing::PowerOut(3), 100.0, Position::AfterPrevious),
                step(Selector::tag("h2").or(Selector::tag("h3")), rise(50.0), settled, 800.0, Easing::PowerOut(2), 50.0, Position::Offset(-600.0)),
                step(Selector::tag("p"), rise(30.0), settled, 600.0, Easing::PowerOut(2), 20.0, Position::Offset(-400.0)),
                step(
                    Selector::class("cta-button"),
                    StyleValues {
                        opacity: Some(0.0),
                        scale: Some(0.8),
                        ..Default::default()
                    },
                    StyleValues {
                        opacity: Some(1.0),
                        scale: Some(1.0),
                        ..Default::default()
                    },
                    800.0,
                    Easing::BackOut(1.7),
                    100.0,
                    Position::Offset(-300.0),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = MotionConfig::from_toml_str("").unwrap();
        assert_eq!(config, MotionConfig::default());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = MotionConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(MotionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = MotionConfig::from_toml_str(
            r#"
            seed = 9
            [device]
            mobile_max_width = 600.0
            [governor]
            degrade_below_fps = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.device.mobile_max_width, 600.0);
        assert_eq!(config.device.tablet_max_width, 1024.0);
        assert_eq!(config.governor.degrade_below_fps, 25);
        assert_eq!(config.governor.restore_above_fps, 55);
    }

    #[test]
    fn test_reveal_from_toml() {
        let config = MotionConfig::from_toml_str(
            r#"
            [[reveals]]
            name = "reviews"
            selector = ".review"
            start = "top 75%"
            actions = "play none none reverse"
            easing = "power3.out"
            to = { opacity = 1.0, y = 0.0 }
            "#,
        )
        .unwrap();
        assert_eq!(config.reveals.len(), 1);
        let reveal = &config.reveals[0];
        assert_eq!(reveal.start.to_string(), "top 75%");
        assert_eq!(reveal.end.to_string(), "bottom top");
        assert_eq!(reveal.actions.leave_back, ToggleAction::Reverse);
        assert_eq!(reveal.easing, Easing::PowerOut(3));
        assert_eq!(reveal.to.to_list().len(), 2);
    }

    #[test]
    fn test_reveal_tier_variants() {
        let reveals = RevealConfig::defaults();
        let cards = reveals.iter().find(|r| r.name == "cards").unwrap();

        let desktop = cards.for_tier(DeviceTier::Desktop);
        assert_eq!(desktop.duration_ms, 800.0);
        assert_eq!(desktop.from.and_then(|f| f.scale), Some(0.95));

        let mobile = cards.for_tier(DeviceTier::Mobile);
        assert_eq!(mobile.duration_ms, 600.0);
        assert_eq!(mobile.easing, Easing::PowerOut(2));
        assert_eq!(mobile.from.and_then(|f| f.y), Some(50.0));
        assert_eq!(mobile.from.and_then(|f| f.scale), None);
        assert!(mobile.mobile.is_none());

        let tablet = cards.for_tier(DeviceTier::Tablet);
        assert_eq!(tablet.easing, Easing::BackOut(1.7));
        assert_eq!(tablet.stagger_ms, 150.0);
        assert_eq!(tablet.from.and_then(|f| f.y), Some(60.0));
        assert_eq!(tablet.from.and_then(|f| f.scale), Some(0.9));

        // Gallery items keep their desktop reveal on tablets
        let gallery = reveals.iter().find(|r| r.name == "gallery").unwrap();
        assert_eq!(gallery.for_tier(DeviceTier::Tablet), gallery.for_tier(DeviceTier::Desktop));
        assert_eq!(gallery.for_tier(DeviceTier::Mobile).duration_ms, 600.0);
    }

    #[test]
    fn test_reveal_variant_from_toml() {
        let config = MotionConfig::from_toml_str(
            r#"
            [[reveals]]
            name = "reviews"
            selector = ".review"
            to = { opacity = 1.0 }
            duration_ms = 900.0

            [reveals.mobile]
            duration_ms = 400.0
            "#,
        )
        .unwrap();
        let reveal = &config.reveals[0];
        assert_eq!(reveal.for_tier(DeviceTier::Mobile).duration_ms, 400.0);
        assert_eq!(reveal.for_tier(DeviceTier::Tablet).duration_ms, 900.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(MotionConfig::from_toml_str("[governor]\ndegrade_below_fps = 60").is_err());
        assert!(MotionConfig::from_toml_str("[cursor]\ninteractive = \"a b\"").is_err());
        assert!(MotionConfig::from_toml_str("[count_up]\nstart = \"top eighty\"").is_err());
        assert!(matches!(
            MotionConfig::from_toml_str("[device]\nmobile_max_width = 2000.0"),
            Err(MotionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_toggle_actions_parse() {
        let actions: ToggleActions = "play reverse play reverse".parse().unwrap();
        assert_eq!(actions.leave, ToggleAction::Reverse);
        assert!("play".parse::<ToggleActions>().is_err());
        assert!("play jump none none".parse::<ToggleActions>().is_err());
    }
}
