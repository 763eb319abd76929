//! Staggered starts for groups of nodes

use serde::{Deserialize, Serialize};

use crate::tween::TweenSpec;

/// Order in which a group is staggered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaggerDirection {
    /// First to last
    #[default]
    Forward,
    /// Last to first
    Reverse,
    /// Center outward
    FromCenter,
}

/// Delay offsets for the members of a group
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stagger {
    /// Delay before the first member starts (ms)
    pub base_delay_ms: f32,
    /// Delay between consecutive members (ms)
    pub each_ms: f32,
    pub direction: StaggerDirection,
    /// Cap the step count; members past the limit share its delay
    pub limit: Option<usize>,
}

impl Default for Stagger {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Stagger {
    pub fn new(each_ms: f32) -> Self {
        Self {
            base_delay_ms: 0.0,
            each_ms,
            direction: StaggerDirection::Forward,
            limit: None,
        }
    }

    pub fn base_delay(mut self, delay_ms: f32) -> Self {
        self.base_delay_ms = delay_ms;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.direction = StaggerDirection::Reverse;
        self
    }

    pub fn from_center(mut self) -> Self {
        self.direction = StaggerDirection::FromCenter;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Delay for member `index` of a group of `total`
    pub fn delay_for_index(&self, index: usize, total: usize) -> f32 {
        let step = match self.direction {
            StaggerDirection::Forward => index,
            StaggerDirection::Reverse => total.saturating_sub(1).saturating_sub(index),
            StaggerDirection::FromCenter => {
                let center = total / 2;
                index.abs_diff(center)
            }
        };
        let step = self.limit.map_or(step, |limit| step.min(limit));
        self.base_delay_ms + self.each_ms * step as f32
    }

    /// Copy of `spec` delayed for member `index`, on top of the spec's own delay
    pub fn apply(&self, spec: &TweenSpec, index: usize, total: usize) -> TweenSpec {
        let mut spec = spec.clone();
        spec.delay_ms += self.delay_for_index(index, total);
        spec
    }
}
