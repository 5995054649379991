//! Drivable trucks
//!
//! `StadiumTruck` is a side-on platformer body pushed by forces and pulled by
//! gravity. `RaceTruck` is a top-down car that owns its scalar speed and
//! heading and writes them into its body's velocity before the shared
//! integrator runs.

use glam::Vec2;

use super::collision::{Circle, Rect};
use super::physics::{Physics, PhysicsBody};
use super::vector::VecExt;
use crate::consts::*;
use crate::frame_decay;
use crate::level::TruckStats;
use crate::normalize_angle;
use crate::platform::InputSnapshot;

pub type TruckId = u32;

/// Fraction of top speed from which a race truck has full steering authority
const FULL_GRIP_SPEED: f32 = 0.35;
/// Steering authority left at a standstill
const MIN_GRIP: f32 = 0.3;

/// Side-on stadium truck. `body.position` is the top-left of its box.
#[derive(Debug, Clone)]
pub struct StadiumTruck {
    pub body: PhysicsBody,
    pub size: Vec2,
    /// Visual tilt; follows ramps on the ground, input in the air
    pub rotation: f32,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub drive_force: f32,
    pub max_speed: f32,
    pub jump_force: f32,
    /// Fraction of drive force available while airborne
    pub air_control: f32,
    pub stats: TruckStats,
}

impl StadiumTruck {
    pub fn new(spawn: Vec2, stats: TruckStats) -> Self {
        let stats = stats.clamped();
        let speed = TruckStats::unit(stats.speed);
        let jump = TruckStats::unit(stats.jump);
        let handling = TruckStats::unit(stats.handling);

        let mut body = PhysicsBody::new(spawn, 1.0);
        // Better handling means tyres that bite harder
        body.friction = GROUND_FRICTION - 0.04 * handling;

        Self {
            body,
            size: Vec2::new(TRUCK_WIDTH, TRUCK_HEIGHT),
            rotation: 0.0,
            facing: 1.0,
            drive_force: 1400.0 + 1000.0 * speed,
            max_speed: 380.0 + 220.0 * speed,
            jump_force: 520.0 + 260.0 * jump,
            air_control: 0.25 + 0.35 * handling,
            stats,
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect(self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.body.position + self.size * 0.5
    }

    /// Pickup shape
    pub fn circle(&self) -> Circle {
        Circle::new(self.center(), self.size.max_element() * 0.5)
    }

    pub fn speed(&self) -> f32 {
        self.body.speed()
    }

    /// Turn one frame of input into forces. Returns true if a jump fired.
    pub fn apply_input(&mut self, physics: &Physics, input: &InputSnapshot, dt: f32) -> bool {
        let h = input.horizontal();
        if h != 0.0 {
            let grip = if self.body.is_grounded { 1.0 } else { self.air_control };
            let force = Vec2::new(h * self.drive_force * grip * self.body.mass, 0.0);
            physics.apply_force(&mut self.body, force);
            self.facing = h;
        }

        if input.down && self.body.is_grounded {
            self.body.velocity.x *= frame_decay(0.8, dt);
        }

        self.body.velocity.x = self.body.velocity.x.clamp(-self.max_speed, self.max_speed);

        if !self.body.is_grounded {
            // Air tilt, nose follows input
            self.rotation = normalize_angle(self.rotation + h * 3.0 * dt);
        }

        input.jump && physics.jump(&mut self.body, self.jump_force)
    }
}

/// Top-down race truck. `body.position` is the truck's center.
#[derive(Debug, Clone)]
pub struct RaceTruck {
    pub id: TruckId,
    pub name: String,
    pub is_player: bool,
    pub body: PhysicsBody,
    pub radius: f32,
    /// Heading in radians, 0 = +x, increasing clockwise on screen
    pub rotation: f32,
    /// Signed scalar speed along the heading
    pub speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    /// Radians per second at full steer and full grip
    pub turn_rate: f32,
    pub lap: u32,
    pub checkpoint_index: usize,
    /// Set when the checkpoint index wraps to 0; the next forward gate
    /// crossing counts the lap
    pub lap_armed: bool,
    pub finished: bool,
    pub finish_time: Option<f32>,
    /// 1-based place in the current standings
    pub race_position: usize,
    pub boost_timer: f32,
    pub off_track: bool,
    pub prev_position: Vec2,
}

impl RaceTruck {
    pub fn new(id: TruckId, name: impl Into<String>, is_player: bool, stats: TruckStats) -> Self {
        let stats = stats.clamped();
        let speed = TruckStats::unit(stats.speed);
        let punch = TruckStats::unit(stats.jump);
        let handling = TruckStats::unit(stats.handling);

        let mut body = PhysicsBody::new(Vec2::ZERO, 1.0);
        body.is_grounded = true;
        body.friction = 1.0;
        body.restitution = 0.5;

        Self {
            id,
            name: name.into(),
            is_player,
            body,
            radius: RACE_TRUCK_RADIUS,
            rotation: 0.0,
            speed: 0.0,
            max_speed: 260.0 + 120.0 * speed,
            acceleration: 200.0 + 120.0 * punch,
            turn_rate: 3.0 + 1.5 * handling,
            lap: 0,
            checkpoint_index: 0,
            lap_armed: false,
            finished: false,
            finish_time: None,
            race_position: 0,
            boost_timer: 0.0,
            off_track: false,
            prev_position: Vec2::ZERO,
        }
    }

    /// Put the truck on the grid
    pub fn place(&mut self, position: Vec2, heading: f32) {
        self.body.position = position;
        self.body.velocity = Vec2::ZERO;
        self.body.acceleration = Vec2::ZERO;
        self.prev_position = position;
        self.rotation = normalize_angle(heading);
        self.speed = 0.0;
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.body.position, self.radius)
    }

    pub fn is_boosting(&self) -> bool {
        self.boost_timer > 0.0
    }

    /// Current top speed including any boost
    pub fn top_speed(&self) -> f32 {
        if self.is_boosting() {
            self.max_speed * BOOST_MULTIPLIER
        } else {
            self.max_speed
        }
    }

    pub fn start_boost(&mut self, duration: f32) {
        self.boost_timer = self.boost_timer.max(duration);
        self.speed = self.speed.max(self.max_speed);
    }

    /// Steer and throttle in -1..=1, the same for player input and AI
    pub fn apply_control(&mut self, steer: f32, throttle: f32, dt: f32) {
        if self.finished || dt <= 0.0 {
            return;
        }
        let steer = steer.clamp(-1.0, 1.0);
        let throttle = throttle.clamp(-1.0, 1.0);

        self.boost_timer = (self.boost_timer - dt).max(0.0);

        // Steering bites with speed, reversed when backing up
        let grip = (self.speed / (self.max_speed * FULL_GRIP_SPEED).max(1.0)).clamp(-1.0, 1.0);
        let grip = if grip.abs() < MIN_GRIP { MIN_GRIP.copysign(grip) } else { grip };
        self.rotation = normalize_angle(self.rotation + steer * self.turn_rate * grip * dt);

        if throttle > 0.0 {
            self.speed += throttle * self.acceleration * dt;
        } else if throttle < 0.0 {
            let rate = if self.speed > 0.0 { 2.0 } else { 0.5 };
            self.speed += throttle * self.acceleration * rate * dt;
        } else {
            self.speed *= frame_decay(0.98, dt);
        }

        let top = self.top_speed();
        // Boost wears off gradually
        if self.speed > top {
            self.speed = (self.speed - self.acceleration * 2.0 * dt).max(top);
        }
        self.speed = self.speed.max(-self.max_speed * 0.4);

        self.body.velocity = Vec2::from_angle_len(self.rotation, self.speed);
    }

    /// Shared integration step; remembers where the truck came from for the
    /// gate crossing test
    pub fn integrate(&mut self, physics: &Physics, dt: f32) {
        self.prev_position = self.body.position;
        if self.finished {
            return;
        }
        physics.update(&mut self.body, dt);
    }

    /// Stop dead; finished trucks stay frozen
    pub fn freeze(&mut self) {
        self.speed = 0.0;
        self.boost_timer = 0.0;
        self.body.velocity = Vec2::ZERO;
        self.body.acceleration = Vec2::ZERO;
    }

    /// Direction of travel, or the heading when stationary
    pub fn forward(&self) -> Vec2 {
        match self.body.velocity.safe_normalize() {
            v if v == Vec2::ZERO => Vec2::from_angle_len(self.rotation, 1.0),
            v => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::PhysicsConfig;

    fn ground_physics() -> Physics {
        Physics::new(PhysicsConfig::default())
    }

    #[test]
    fn test_stadium_truck_drives_and_jumps() {
        let physics = ground_physics();
        let mut truck = StadiumTruck::new(Vec2::new(0.0, 100.0), TruckStats::default());
        truck.body.is_grounded = true;

        let input = InputSnapshot {
            right: true,
            ..Default::default()
        };
        for _ in 0..60 {
            truck.apply_input(&physics, &input, 1.0 / 60.0);
            physics.update(&mut truck.body, 1.0 / 60.0);
        }
        assert!(truck.body.velocity.x > 100.0);
        assert!(truck.body.velocity.x <= truck.max_speed);
        assert_eq!(truck.facing, 1.0);

        let jump = InputSnapshot {
            jump: true,
            ..Default::default()
        };
        assert!(truck.apply_input(&physics, &jump, 1.0 / 60.0));
        assert!(truck.body.velocity.y < 0.0);
        // No double jump
        assert!(!truck.apply_input(&physics, &jump, 1.0 / 60.0));
    }

    #[test]
    fn test_stats_scale_truck() {
        let slow = StadiumTruck::new(Vec2::ZERO, TruckStats {
            speed: 1,
            jump: 1,
            handling: 1,
        });
        let fast = StadiumTruck::new(Vec2::ZERO, TruckStats {
            speed: 5,
            jump: 5,
            handling: 5,
        });
        assert!(fast.max_speed > slow.max_speed);
        assert!(fast.jump_force > slow.jump_force);
        assert!(fast.air_control > slow.air_control);

        // Out-of-range stats are clamped
        let silly = StadiumTruck::new(Vec2::ZERO, TruckStats {
            speed: 50,
            jump: 5,
            handling: 5,
        });
        assert_eq!(silly.max_speed, fast.max_speed);
    }

    #[test]
    fn test_race_truck_accelerates_to_top_speed() {
        let physics = Physics::new(PhysicsConfig::top_down(1000.0));
        let mut truck = RaceTruck::new(0, "p1", true, TruckStats::default());
        truck.place(Vec2::ZERO, 0.0);
        for _ in 0..600 {
            truck.apply_control(0.0, 1.0, 1.0 / 60.0);
            truck.integrate(&physics, 1.0 / 60.0);
        }
        assert!((truck.speed - truck.max_speed).abs() < 1e-3);
        assert!(truck.position().x > 0.0);
        assert!(truck.position().y.abs() < 1e-3);
    }

    #[test]
    fn test_race_truck_steering_follows_sign() {
        let mut truck = RaceTruck::new(0, "p1", true, TruckStats::default());
        truck.speed = truck.max_speed;
        truck.apply_control(1.0, 0.0, 0.1);
        assert!(truck.rotation > 0.0);

        truck.rotation = 0.0;
        truck.speed = -50.0;
        truck.apply_control(1.0, 0.0, 0.1);
        assert!(truck.rotation < 0.0);
    }

    #[test]
    fn test_boost_raises_then_decays() {
        let mut truck = RaceTruck::new(0, "p1", true, TruckStats::default());
        truck.speed = truck.max_speed;
        truck.start_boost(1.0);
        for _ in 0..30 {
            truck.apply_control(0.0, 1.0, 1.0 / 60.0);
        }
        assert!(truck.is_boosting());
        assert!(truck.speed > truck.max_speed);

        for _ in 0..300 {
            truck.apply_control(0.0, 1.0, 1.0 / 60.0);
        }
        assert!(!truck.is_boosting());
        assert!((truck.speed - truck.max_speed).abs() < 1e-3);
    }

    #[test]
    fn test_finished_truck_is_frozen() {
        let physics = Physics::new(PhysicsConfig::top_down(1000.0));
        let mut truck = RaceTruck::new(0, "p1", true, TruckStats::default());
        truck.place(Vec2::new(10.0, 10.0), 0.0);
        truck.finished = true;
        truck.freeze();
        truck.apply_control(1.0, 1.0, 0.1);
        truck.integrate(&physics, 0.1);
        assert_eq!(truck.position(), Vec2::new(10.0, 10.0));
        assert_eq!(truck.speed, 0.0);
    }
}
