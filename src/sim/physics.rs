//! Semi-implicit Euler integrator
//!
//! Velocity is updated before position each step. Friction and air
//! resistance are retention factors calibrated per 60 fps frame and applied as
//! `factor^(dt * 60)`, so the same body behaves the same at any frame rate.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionResult, Rect, check_aabb_detailed};
use super::vector::VecExt;
use crate::consts::*;
use crate::frame_decay;

/// Kinematic state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    /// Top-left corner of the body's bounding box
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f32,
    /// Horizontal velocity retention per 60 fps frame while grounded
    pub friction: f32,
    /// Bounce factor for collisions (0 = dead stop, 1 = perfect bounce)
    pub restitution: f32,
    pub is_grounded: bool,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass: 1.0,
            friction: GROUND_FRICTION,
            restitution: 0.2,
            is_grounded: false,
        }
    }
}

impl PhysicsBody {
    pub fn new(position: Vec2, mass: f32) -> Self {
        Self {
            position,
            mass,
            ..Default::default()
        }
    }

    /// Bounding box for a body of the given size
    pub fn rect(&self, size: Vec2) -> Rect {
        Rect::from_pos_size(self.position, size)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// World-level integrator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    /// Horizontal velocity retention per 60 fps frame while airborne
    pub air_resistance: f32,
    /// Per-axis velocity limits (absolute)
    pub max_velocity: Vec2,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            air_resistance: AIR_RESISTANCE,
            max_velocity: Vec2::new(MAX_VELOCITY_X, MAX_VELOCITY_Y),
        }
    }
}

impl PhysicsConfig {
    /// No gravity, no decay: for top-down movement where the entity owns speed
    pub fn top_down(max_speed: f32) -> Self {
        Self {
            gravity: 0.0,
            air_resistance: 1.0,
            max_velocity: Vec2::splat(max_speed),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Physics {
    pub config: PhysicsConfig,
}

impl Physics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    /// Advance one body by `dt` seconds
    pub fn update(&self, body: &mut PhysicsBody, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        body.acceleration.y = if body.is_grounded {
            0.0
        } else {
            self.config.gravity
        };

        body.velocity += body.acceleration * dt;

        let retention = if body.is_grounded {
            body.friction
        } else {
            self.config.air_resistance
        };
        body.velocity.x *= frame_decay(retention, dt);

        let max = self.config.max_velocity;
        body.velocity.x = body.velocity.x.clamp(-max.x, max.x);
        body.velocity.y = body.velocity.y.clamp(-max.y, max.y);

        body.position += body.velocity * dt;

        // Forces are re-applied every frame; gravity rewrites y next step
        body.acceleration.x = 0.0;
    }

    /// Continuous force, integrated over the next step
    pub fn apply_force(&self, body: &mut PhysicsBody, force: Vec2) {
        body.acceleration += force.safe_div(body.mass);
    }

    /// Instant change in velocity
    pub fn apply_impulse(&self, body: &mut PhysicsBody, impulse: Vec2) {
        body.velocity += impulse.safe_div(body.mass);
    }

    /// Launch upward if standing on something. Returns whether it fired.
    pub fn jump(&self, body: &mut PhysicsBody, force: f32) -> bool {
        if !body.is_grounded {
            return false;
        }
        self.force_jump(body, force);
        true
    }

    /// Launch upward regardless of ground contact
    pub fn force_jump(&self, body: &mut PhysicsBody, force: f32) {
        body.velocity.y = -force;
        body.is_grounded = false;
    }

    /// Push a body of `size` out of a static rectangle along the axis of
    /// least overlap, then adjust its velocity for the side that was hit.
    pub fn resolve_static_collision(
        &self,
        body: &mut PhysicsBody,
        size: Vec2,
        obstacle: &Rect,
    ) -> CollisionResult {
        let result = check_aabb_detailed(&body.rect(size), obstacle);
        if !result.collided {
            return result;
        }

        body.position += result.mtv();

        if result.normal.y < 0.0 {
            // Landed on top
            if body.velocity.y > 0.0 {
                body.velocity.y = 0.0;
            }
            body.is_grounded = true;
        } else if result.normal.y > 0.0 {
            // Hit the underside
            if body.velocity.y < 0.0 {
                body.velocity.y = -body.velocity.y * body.restitution;
            }
        } else {
            body.velocity.x *= -body.restitution;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_fall_physics() -> Physics {
        Physics::new(PhysicsConfig {
            gravity: 980.0,
            air_resistance: 1.0,
            max_velocity: Vec2::splat(10_000.0),
        })
    }

    #[test]
    fn test_gravity_is_timestep_invariant() {
        let physics = free_fall_physics();

        let mut coarse = PhysicsBody::new(Vec2::ZERO, 1.0);
        physics.update(&mut coarse, 1.0);

        let mut fine = PhysicsBody::new(Vec2::ZERO, 1.0);
        for _ in 0..60 {
            physics.update(&mut fine, 1.0 / 60.0);
        }

        assert!((coarse.velocity.y - 980.0).abs() < 1e-3);
        assert!((fine.velocity.y - 980.0).abs() < 0.05);
    }

    #[test]
    fn test_friction_is_frame_rate_independent() {
        let physics = Physics::default();
        let mut a = PhysicsBody::new(Vec2::ZERO, 1.0);
        a.is_grounded = true;
        a.velocity.x = 500.0;
        let mut b = a.clone();

        for _ in 0..30 {
            physics.update(&mut a, 1.0 / 30.0);
        }
        for _ in 0..120 {
            physics.update(&mut b, 1.0 / 120.0);
        }
        assert!((a.velocity.x - b.velocity.x).abs() < 0.01);
        assert!(a.velocity.x < 500.0);
    }

    #[test]
    fn test_grounded_body_ignores_gravity() {
        let physics = Physics::default();
        let mut body = PhysicsBody::new(Vec2::new(0.0, 100.0), 1.0);
        body.is_grounded = true;
        physics.update(&mut body, 1.0 / 60.0);
        assert_eq!(body.acceleration.y, 0.0);
        assert_eq!(body.position.y, 100.0);
    }

    #[test]
    fn test_velocity_clamped_per_axis() {
        let physics = Physics::default();
        let mut body = PhysicsBody::new(Vec2::ZERO, 1.0);
        body.velocity = Vec2::new(50_000.0, -50_000.0);
        physics.update(&mut body, 1.0 / 60.0);
        assert!(body.velocity.x <= MAX_VELOCITY_X);
        assert!(body.velocity.y >= -MAX_VELOCITY_Y);
    }

    #[test]
    fn test_force_and_impulse_scale_by_mass() {
        let physics = Physics::default();
        let mut body = PhysicsBody::new(Vec2::ZERO, 2.0);
        physics.apply_force(&mut body, Vec2::new(10.0, 0.0));
        assert_eq!(body.acceleration.x, 5.0);
        physics.apply_impulse(&mut body, Vec2::new(0.0, -8.0));
        assert_eq!(body.velocity.y, -4.0);

        let mut massless = PhysicsBody::new(Vec2::ZERO, 0.0);
        physics.apply_impulse(&mut massless, Vec2::new(5.0, 5.0));
        assert_eq!(massless.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_acceleration_x_cleared_each_step() {
        let physics = Physics::default();
        let mut body = PhysicsBody::new(Vec2::ZERO, 1.0);
        physics.apply_force(&mut body, Vec2::new(100.0, 0.0));
        physics.update(&mut body, 1.0 / 60.0);
        assert_eq!(body.acceleration.x, 0.0);
        assert_eq!(body.acceleration.y, GRAVITY);
    }

    #[test]
    fn test_jump_requires_ground() {
        let physics = Physics::default();
        let mut body = PhysicsBody::new(Vec2::ZERO, 1.0);
        assert!(!physics.jump(&mut body, 600.0));
        assert_eq!(body.velocity.y, 0.0);

        body.is_grounded = true;
        assert!(physics.jump(&mut body, 600.0));
        assert_eq!(body.velocity.y, -600.0);
        assert!(!body.is_grounded);

        physics.force_jump(&mut body, 300.0);
        assert_eq!(body.velocity.y, -300.0);
    }

    #[test]
    fn test_landing_on_platform() {
        let physics = Physics::default();
        let size = Vec2::new(20.0, 10.0);
        let mut body = PhysicsBody::new(Vec2::new(0.0, 95.0), 1.0);
        body.velocity.y = 300.0;
        let ground = Rect::new(-100.0, 100.0, 300.0, 40.0);

        let r = physics.resolve_static_collision(&mut body, size, &ground);
        assert!(r.collided);
        assert!(body.is_grounded);
        assert_eq!(body.velocity.y, 0.0);
        assert!((body.rect(size).bottom() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_ceiling_bounce_uses_restitution() {
        let physics = Physics::default();
        let size = Vec2::new(20.0, 10.0);
        let mut body = PhysicsBody::new(Vec2::new(0.0, 38.0), 1.0);
        body.restitution = 0.5;
        body.velocity.y = -200.0;
        let ceiling = Rect::new(-100.0, 0.0, 300.0, 40.0);

        physics.resolve_static_collision(&mut body, size, &ceiling);
        assert_eq!(body.velocity.y, 100.0);
        assert!(!body.is_grounded);
    }

    #[test]
    fn test_wall_reflects_horizontal_velocity() {
        let physics = Physics::default();
        let size = Vec2::new(20.0, 20.0);
        let mut body = PhysicsBody::new(Vec2::new(82.0, 0.0), 1.0);
        body.restitution = 0.5;
        body.velocity.x = 100.0;
        let wall = Rect::new(100.0, -100.0, 20.0, 300.0);

        physics.resolve_static_collision(&mut body, size, &wall);
        assert_eq!(body.velocity.x, -50.0);
        assert!(body.rect(size).right() <= 100.0 + 1e-4);
    }

    #[test]
    fn test_resolution_never_deepens_overlap() {
        let physics = Physics::default();
        let size = Vec2::new(30.0, 30.0);
        let obstacle = Rect::new(0.0, 0.0, 50.0, 50.0);
        for i in 0..20 {
            let mut body = PhysicsBody::new(Vec2::new(-25.0 + i as f32 * 4.0, -20.0 + i as f32 * 3.0), 1.0);
            let before = check_aabb_detailed(&body.rect(size), &obstacle).overlap;
            physics.resolve_static_collision(&mut body, size, &obstacle);
            let after = check_aabb_detailed(&body.rect(size), &obstacle).overlap;
            assert!(after <= before);
        }
    }
}
