//! Smoothly following 2D camera
//!
//! `position` is the world coordinate of the viewport's top-left corner.
//! Screen/world conversion uses position and zoom only; rotation is applied
//! to the render transform alone.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::Rect;
use super::vector::VecExt;
use crate::renderer::Surface;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Viewport size in screen pixels
    pub viewport: Vec2,
    /// Fraction of the remaining distance covered per 60 fps frame (0..=1)
    pub follow_speed: f32,
    /// Screen-space rect the target may roam without moving the camera
    pub dead_zone: Option<Rect>,
    /// World rect the view must stay inside
    pub bounds: Option<Rect>,
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            viewport: Vec2::new(1280.0, 720.0),
            follow_speed: 0.1,
            dead_zone: None,
            bounds: None,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Shake {
    intensity: f32,
    duration: f32,
    elapsed: f32,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    pub rotation: f32,
    pub viewport: Vec2,
    pub follow_speed: f32,
    pub dead_zone: Option<Rect>,
    pub bounds: Option<Rect>,
    target: Option<Vec2>,
    shake: Option<Shake>,
    shake_offset: Vec2,
    /// Multiplier on shake intensity (0 disables shaking)
    shake_scale: f32,
    rng: Pcg32,
}

impl Camera {
    pub fn new(config: CameraConfig, seed: u64) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: if config.zoom > 0.0 { config.zoom } else { 1.0 },
            rotation: 0.0,
            viewport: config.viewport,
            follow_speed: config.follow_speed.clamp(0.0, 1.0),
            dead_zone: config.dead_zone,
            bounds: config.bounds,
            target: None,
            shake: None,
            shake_offset: Vec2::ZERO,
            shake_scale: 1.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// World point the camera keeps centered (None stops following)
    pub fn set_target(&mut self, target: Option<Vec2>) {
        self.target = target;
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    pub fn set_shake_enabled(&mut self, enabled: bool) {
        self.shake_scale = if enabled { 1.0 } else { 0.0 };
        if !enabled {
            self.stop_shake();
        }
    }

    /// Size of the visible world area
    #[inline]
    pub fn view_size(&self) -> Vec2 {
        self.viewport.safe_div(self.zoom)
    }

    /// Jump straight to the target with no easing
    pub fn snap_to_target(&mut self) {
        if let Some(target) = self.target {
            self.position = self.clamp_to_bounds(target - self.view_size() * 0.5);
        }
    }

    pub fn update(&mut self, dt: f32) {
        if let Some(target) = self.target {
            let in_dead_zone = self
                .dead_zone
                .is_some_and(|zone| zone.contains_point((target - self.position) * self.zoom));

            if !in_dead_zone {
                let desired = target - self.view_size() * 0.5;
                let t = 1.0 - (1.0 - self.follow_speed).powf(dt * crate::consts::BASELINE_FPS);
                self.position = self.position.lerp_exact(desired, t.clamp(0.0, 1.0));
            }
        }

        self.update_shake(dt);
        self.position = self.clamp_to_bounds(self.position);
    }

    fn update_shake(&mut self, dt: f32) {
        let Some(mut shake) = self.shake else {
            self.shake_offset = Vec2::ZERO;
            return;
        };

        shake.elapsed += dt;
        if shake.elapsed >= shake.duration {
            self.stop_shake();
            return;
        }

        let magnitude = shake.intensity * (1.0 - shake.elapsed / shake.duration);
        self.shake_offset = Vec2::new(
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
        ) * magnitude;
        self.shake = Some(shake);
    }

    /// Start a shake whose offset fades linearly to zero over `duration`
    pub fn shake(&mut self, intensity: f32, duration: f32) {
        let intensity = intensity * self.shake_scale;
        if intensity <= 0.0 || duration <= 0.0 {
            return;
        }
        self.shake = Some(Shake {
            intensity,
            duration,
            elapsed: 0.0,
        });
    }

    pub fn stop_shake(&mut self) {
        self.shake = None;
        self.shake_offset = Vec2::ZERO;
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Current shake displacement (zero when idle)
    pub fn shake_offset(&self) -> Vec2 {
        self.shake_offset
    }

    /// Top-left of the rendered view: follow position plus shake, clamped
    pub fn view_position(&self) -> Vec2 {
        self.clamp_to_bounds(self.position + self.shake_offset)
    }

    pub fn view_rect(&self) -> Rect {
        Rect::from_pos_size(self.view_position(), self.view_size())
    }

    fn clamp_to_bounds(&self, pos: Vec2) -> Vec2 {
        let Some(bounds) = self.bounds else {
            return pos;
        };
        let view = self.view_size();
        Vec2::new(
            clamp_axis(pos.x, bounds.x, bounds.w, view.x),
            clamp_axis(pos.y, bounds.y, bounds.h, view.y),
        )
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.view_position()) * self.zoom
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen.safe_div(self.zoom) + self.view_position()
    }

    /// Whether any part of `rect` is on screen
    pub fn is_visible(&self, rect: &Rect) -> bool {
        self.view_rect().intersects(rect)
    }

    pub fn is_point_visible(&self, point: Vec2, margin: f32) -> bool {
        self.view_rect().expand(margin).contains_point(point)
    }

    /// Push the world transform: save, scale, translate, rotate
    pub fn apply_transform(&self, surface: &mut dyn Surface) {
        let pos = self.view_position();
        surface.save();
        surface.scale(self.zoom, self.zoom);
        surface.translate(-pos.x, -pos.y);
        if self.rotation != 0.0 {
            surface.rotate(self.rotation);
        }
    }

    pub fn restore_transform(&self, surface: &mut dyn Surface) {
        surface.restore();
    }
}

/// Keep `[pos, pos + view]` inside `[min, min + extent]`, centering when the
/// world is narrower than the view
#[inline]
fn clamp_axis(pos: f32, min: f32, extent: f32, view: f32) -> f32 {
    if extent <= view {
        min + (extent - view) * 0.5
    } else {
        pos.clamp(min, min + extent - view)
    }
}
