//! 2D immediate-mode rendering contract
//!
//! The simulation draws against any surface that can push/pop transforms,
//! fill rectangles and trace simple paths. Backends (canvas, GPU, terminal)
//! live outside this crate; `RecordingSurface` captures commands for headless
//! runs and tests.

pub mod recording;
pub mod shapes;

pub use recording::{DrawCommand, RecordingSurface};

/// RGBA color, components in 0..=1
pub type Color = [f32; 4];

/// Minimal 2D drawing API, modeled on the HTML canvas context
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn scale(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);

    fn set_fill_color(&mut self, color: Color);
    fn set_stroke(&mut self, color: Color, width: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
}

/// Colors for game elements
pub mod colors {
    use super::Color;

    pub const BACKGROUND: Color = [0.05, 0.05, 0.1, 1.0];
    pub const GROUND: Color = [0.45, 0.3, 0.15, 1.0];
    pub const PLATFORM: Color = [0.5, 0.5, 0.55, 1.0];
    pub const RAMP: Color = [0.6, 0.45, 0.25, 1.0];
    pub const STAR: Color = [1.0, 0.85, 0.2, 1.0];
    pub const OBSTACLE: Color = [0.7, 0.2, 0.2, 1.0];
    pub const OBSTACLE_CRUSHED: Color = [0.3, 0.15, 0.15, 1.0];
    pub const TRACK: Color = [0.25, 0.25, 0.3, 1.0];
    pub const TRACK_EDGE: Color = [0.9, 0.9, 0.9, 1.0];
    pub const START_LINE: Color = [1.0, 1.0, 1.0, 1.0];
    pub const BOOST_PAD: Color = [0.2, 0.9, 1.0, 1.0];
    pub const BOOST_PAD_COOLING: Color = [0.1, 0.35, 0.4, 1.0];
    pub const PLAYER: Color = [0.2, 0.8, 0.4, 1.0];
    pub const OPPONENT: Color = [0.9, 0.4, 0.2, 1.0];
    pub const WHEEL: Color = [0.1, 0.1, 0.1, 1.0];
    pub const OVERLAY: Color = [0.0, 0.0, 0.0, 0.5];
}
