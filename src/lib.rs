//! Truck Rally - 2D monster truck simulation core
//!
//! Core modules:
//! - `sim`: Simulation (physics, collisions, camera, AI, scenes)
//! - `platform`: Frame scheduler and the input snapshot contract
//! - `renderer`: Minimal 2D drawing surface and entity shapes
//! - `level`: Level/content configuration
//! - `audio`: Sound effect bus handed to scenes

pub mod audio;
pub mod error;
pub mod level;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{LevelError, SimError};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Frame rate the decay factors are calibrated against
    pub const BASELINE_FPS: f32 = 60.0;
    /// Largest delta the scheduler hands to a scene (seconds)
    pub const MAX_DELTA_TIME: f32 = 0.1;

    /// Stadium gravity (pixels/s², y grows downward)
    pub const GRAVITY: f32 = 1500.0;
    /// Per-frame velocity retention on the ground (60 fps baseline)
    pub const GROUND_FRICTION: f32 = 0.92;
    /// Per-frame velocity retention in the air (60 fps baseline)
    pub const AIR_RESISTANCE: f32 = 0.99;
    pub const MAX_VELOCITY_X: f32 = 900.0;
    pub const MAX_VELOCITY_Y: f32 = 1400.0;

    /// Stadium truck footprint
    pub const TRUCK_WIDTH: f32 = 80.0;
    pub const TRUCK_HEIGHT: f32 = 40.0;
    /// Minimum speed to flatten an obstacle instead of bumping into it
    pub const CRUSH_SPEED: f32 = 220.0;
    pub const STAR_RADIUS: f32 = 16.0;
    pub const STAR_POINTS: u64 = 100;
    /// Time added to the level clock per completed challenge (seconds)
    pub const CHALLENGE_BONUS_TIME: f32 = 15.0;

    /// Race truck collision radius
    pub const RACE_TRUCK_RADIUS: f32 = 18.0;
    pub const RACE_COUNTDOWN: f32 = 3.0;
    /// Projected progress along a segment needed to pass its checkpoint
    pub const CHECKPOINT_PROGRESS: f32 = 0.7;
    /// Slack inside the track edge before a truck counts as off-track
    pub const OFF_TRACK_MARGIN: f32 = 10.0;
    /// Per-frame speed retention while off-track (60 fps baseline)
    pub const OFF_TRACK_SLOWDOWN: f32 = 0.92;
    /// Pull toward the nearest waypoint while off-track (pixels/s)
    pub const OFF_TRACK_NUDGE: f32 = 60.0;

    pub const BOOST_COOLDOWN: f32 = 3.0;
    pub const BOOST_DURATION: f32 = 1.5;
    pub const BOOST_MULTIPLIER: f32 = 1.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Shortest signed angle from `from` to `to`, in [-π, π)
#[inline]
pub fn angle_difference(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Frame-rate independent decay: `factor` is the retention per 60 fps frame
#[inline]
pub fn frame_decay(factor: f32, dt: f32) -> f32 {
    factor.powf(dt * consts::BASELINE_FPS)
}
