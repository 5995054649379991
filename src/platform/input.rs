//! Per-tick input snapshot
//!
//! Produced by the host from keyboard/touch state, consumed read-only by the
//! scenes. The core never polls devices itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Touch {
    pub x: f32,
    pub y: f32,
}

/// Input state for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump: bool,
    /// Pause request; scenes toggle on the rising edge
    pub pause: bool,
    #[serde(default)]
    pub touches: Vec<Touch>,
}

impl InputSnapshot {
    /// -1 for left, +1 for right, 0 for neither or both
    pub fn horizontal(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// +1 for up (accelerate), -1 for down (brake/reverse)
    pub fn vertical(&self) -> f32 {
        match (self.up, self.down) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// Fold touches into directional input: touches on the left/right third
    /// of the screen steer, the middle third jumps.
    pub fn with_touch_zones(mut self, screen_width: f32) -> Self {
        if screen_width <= 0.0 {
            return self;
        }
        for touch in &self.touches {
            let third = screen_width / 3.0;
            if touch.x < third {
                self.left = true;
            } else if touch.x > third * 2.0 {
                self.right = true;
            } else {
                self.jump = true;
            }
        }
        self
    }
}
