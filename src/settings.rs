//! Player settings and preferences
//!
//! Stored as JSON by the host, separate from any save data.

use serde::{Deserialize, Serialize};

use crate::sim::ai::Difficulty;

/// Camera follow presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CameraFollow {
    Loose,
    #[default]
    Normal,
    Tight,
}

impl CameraFollow {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraFollow::Loose => "Loose",
            CameraFollow::Normal => "Normal",
            CameraFollow::Tight => "Tight",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "loose" => Some(CameraFollow::Loose),
            "normal" | "default" => Some(CameraFollow::Normal),
            "tight" => Some(CameraFollow::Tight),
            _ => None,
        }
    }

    /// Fraction of the distance to the target covered per 60 fps frame
    pub fn follow_speed(&self) -> f32 {
        match self {
            CameraFollow::Loose => 0.05,
            CameraFollow::Normal => 0.1,
            CameraFollow::Tight => 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Camera ===
    pub camera_follow: CameraFollow,
    /// Screen shake on crushes and impacts
    pub screen_shake: bool,

    // === HUD ===
    pub show_fps: bool,
    pub show_positions: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Race ===
    /// Difficulty for opponents the level leaves unspecified
    pub ai_difficulty: Difficulty,

    // === Accessibility ===
    /// Reduced motion (no shake, gentler camera)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_follow: CameraFollow::Normal,
            screen_shake: true,

            show_fps: false,
            show_positions: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            ai_difficulty: Difficulty::Medium,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Camera follow speed; reduced motion caps it at the loose preset
    pub fn effective_follow_speed(&self) -> f32 {
        let speed = self.camera_follow.follow_speed();
        if self.reduced_motion {
            speed.min(CameraFollow::Loose.follow_speed())
        } else {
            speed
        }
    }

    /// Parse settings; unknown or missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse, logging and falling back to defaults on bad input
    pub fn load_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Some(Err(e)) => {
                log::warn!("Ignoring unreadable settings: {}", e);
                Self::default()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
