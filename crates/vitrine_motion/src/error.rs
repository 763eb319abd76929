//! Motion layer error types

use thiserror::Error;
use vitrine_animation::{EasingParseError, PositionParseError};
use vitrine_core::SelectorError;

/// Errors raised while configuring or starting the motion layer.
///
/// None of them is fatal to the page: the orchestrator logs them and carries on
/// without the effect that failed.
#[derive(Error, Debug)]
pub enum MotionError {
    /// An effect's anchor element is not on the page
    #[error("anchor not found: {0}")]
    MissingAnchor(String),

    /// A trigger threshold such as `"top 80%"` did not parse
    #[error("invalid threshold '{0}'")]
    InvalidThreshold(String),

    #[error(transparent)]
    Easing(#[from] EasingParseError),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Position(#[from] PositionParseError),

    /// The host could not hand out a drawing context
    #[error("canvas context unavailable for {0}")]
    CanvasUnavailable(String),

    /// The animation engine never became available
    #[error("animation engine unavailable after {attempts} attempts")]
    EngineUnavailable { attempts: u32 },

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse a configuration file
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Failed to read a configuration file
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for motion layer operations
pub type Result<T> = std::result::Result<T, MotionError>;
