//! Error types for level loading and simulation updates

use thiserror::Error;

/// Problems with a level description. Raised synchronously from `init`.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid world size {width}x{height}")]
    InvalidWorld { width: f32, height: f32 },

    #[error("track needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("track width must be positive, got {0}")]
    InvalidTrackWidth(f32),

    #[error("race needs at least one lap")]
    NoLaps,

    #[error("time limit must be positive, got {0}")]
    InvalidTimeLimit(f32),

    #[error("{0} is not a finite coordinate")]
    NonFinite(&'static str),

    #[error("level parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced from a scene update.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("scene updated before a successful init")]
    NotInitialized,

    #[error(transparent)]
    Level(#[from] LevelError),
}
