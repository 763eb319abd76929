//! Sequences
//!
//! A sequence lays out several staggered groups on one time axis, the way the
//! page-load intro plays headings, then subheadings slightly overlapping, then
//! paragraphs and buttons. Positions use the familiar timeline notation:
//!
//! | text    | meaning                                     |
//! |---------|---------------------------------------------|
//! | `""`/`>`| after everything placed so far              |
//! | `<`     | together with the previous step             |
//! | `-=0.6` | 600ms before the end of everything so far   |
//! | `+=0.2` | 200ms after the end of everything so far    |
//! | `1.5`   | at 1.5s from the start                      |
//!
//! Playing a sequence resolves it into per-node delays and hands plain tweens
//! to the scheduler; there is no separate timeline runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use vitrine_core::{NodeId, Surface};

use crate::scheduler::{AnimationScheduler, TweenId};
use crate::stagger::Stagger;
use crate::tween::TweenSpec;

/// Position parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid sequence position '{0}'")]
pub struct PositionParseError(pub String);

/// Where a step starts relative to the steps before it
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    /// At the end of everything placed so far
    #[default]
    AfterPrevious,
    /// At the start of the previous step
    WithPrevious,
    /// Relative to the end of everything so far; negative overlaps
    Offset(f32),
    /// Absolute time from the sequence start
    At(f32),
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let seconds = |v: &str| {
            v.trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v * 1000.0)
                .ok_or_else(|| PositionParseError(s.to_string()))
        };

        match s {
            "" | ">" => Ok(Position::AfterPrevious),
            "<" => Ok(Position::WithPrevious),
            _ => {
                if let Some(rest) = s.strip_prefix("-=") {
                    seconds(rest).map(|ms| Position::Offset(-ms))
                } else if let Some(rest) = s.strip_prefix("+=") {
                    seconds(rest).map(Position::Offset)
                } else {
                    let ms = seconds(s)?;
                    if ms < 0.0 {
                        return Err(PositionParseError(s.to_string()));
                    }
                    Ok(Position::At(ms))
                }
            }
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::AfterPrevious => f.write_str(">"),
            Position::WithPrevious => f.write_str("<"),
            Position::Offset(ms) if *ms < 0.0 => write!(f, "-={}", -ms / 1000.0),
            Position::Offset(ms) => write!(f, "+={}", ms / 1000.0),
            Position::At(ms) => write!(f, "{}", ms / 1000.0),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = PositionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(value: Position) -> Self {
        value.to_string()
    }
}

/// One staggered group in a sequence
#[derive(Clone, Debug)]
pub struct SequenceStep {
    pub nodes: Vec<NodeId>,
    pub spec: TweenSpec,
    pub stagger: Stagger,
    pub position: Position,
}

impl SequenceStep {
    pub fn new(nodes: Vec<NodeId>, spec: TweenSpec) -> Self {
        Self {
            nodes,
            spec,
            stagger: Stagger::default(),
            position: Position::AfterPrevious,
        }
    }

    pub fn stagger(mut self, stagger: Stagger) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Time from the step's start until its last member finishes
    fn span_ms(&self) -> f32 {
        let total = self.nodes.len();
        let last_delay = (0..total)
            .map(|i| self.stagger.delay_for_index(i, total))
            .fold(0.0f32, f32::max);
        self.spec.delay_ms + last_delay + self.spec.duration_ms
    }
}

/// Ordered list of steps on one time axis
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    steps: Vec<SequenceStep>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: SequenceStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Start time of every step, in order
    pub fn resolve(&self) -> Vec<f32> {
        let mut starts = Vec::with_capacity(self.steps.len());
        let mut end = 0.0f32;
        let mut previous_start = 0.0f32;

        for step in &self.steps {
            let start = match step.position {
                Position::AfterPrevious => end,
                Position::WithPrevious => previous_start,
                Position::Offset(ms) => end + ms,
                Position::At(ms) => ms,
            }
            .max(0.0);
            starts.push(start);
            previous_start = start;
            end = end.max(start + step.span_ms());
        }
        starts
    }

    /// Total running time
    pub fn duration_ms(&self) -> f32 {
        self.resolve()
            .iter()
            .zip(&self.steps)
            .map(|(start, step)| start + step.span_ms())
            .fold(0.0, f32::max)
    }

    /// Start every member of every step on the scheduler
    pub fn play(&self, scheduler: &mut AnimationScheduler, surface: &mut dyn Surface) -> Vec<TweenId> {
        let mut ids = Vec::new();
        for (start, step) in self.resolve().into_iter().zip(&self.steps) {
            let total = step.nodes.len();
            for (index, &node) in step.nodes.iter().enumerate() {
                let mut spec = step.stagger.apply(&step.spec, index, total);
                spec.delay_ms += start;
                ids.extend(scheduler.start(surface, node, &spec));
            }
        }
        tracing::debug!(steps = self.steps.len(), tweens = ids.len(), "sequence started");
        ids
    }
}
