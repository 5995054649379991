//! Waypoint-pursuit AI for opponent trucks
//!
//! The controller steers toward a looping list of waypoints and is made
//! deliberately imperfect: a sinusoidal wobble, random time-boxed steering
//! mistakes, and a reaction delay on the cornering target. All randomness
//! comes from the controller's own seeded generator.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::vector::VecExt;
use crate::angle_difference;

/// Bearing error below which the raw steering signal is zero (radians)
const STEER_DEADBAND: f32 = 0.05;
/// Weight kept from the previous filtered steering value each tick
const STEER_SMOOTHING: f32 = 0.8;
/// Slowdown applied when the target is straight behind (bearing error π)
const MAX_TURN_SLOWDOWN: f32 = 0.5;
/// Steering strength of a mistake relative to full lock
const MISTAKE_STEER: f32 = 0.5;
/// Throttle multiplier while a mistake is active
const MISTAKE_THROTTLE: f32 = 0.5;
/// Gain from speed error (fraction of max speed) to throttle
const THROTTLE_GAIN: f32 = 4.0;

/// Opponent skill presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" | "normal" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Tuning table for this preset
    pub fn params(&self) -> AiParams {
        match self {
            Difficulty::Easy => AiParams {
                speed_multiplier: 0.75,
                waypoint_radius: 60.0,
                wobble_amount: 0.30,
                mistake_chance: 0.25,
                mistake_duration: 0.8,
                reaction_time: 0.30,
                look_ahead: 0.3,
            },
            Difficulty::Medium => AiParams {
                speed_multiplier: 0.88,
                waypoint_radius: 50.0,
                wobble_amount: 0.15,
                mistake_chance: 0.10,
                mistake_duration: 0.5,
                reaction_time: 0.15,
                look_ahead: 0.5,
            },
            Difficulty::Hard => AiParams {
                speed_multiplier: 0.97,
                waypoint_radius: 40.0,
                wobble_amount: 0.05,
                mistake_chance: 0.03,
                mistake_duration: 0.3,
                reaction_time: 0.05,
                look_ahead: 0.7,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiParams {
    /// Cruising speed as a fraction of the truck's top speed
    pub speed_multiplier: f32,
    /// Distance at which a waypoint counts as reached
    pub waypoint_radius: f32,
    /// Scale of the organic steering wobble
    pub wobble_amount: f32,
    /// Expected mistakes per second
    pub mistake_chance: f32,
    /// Seconds a mistake lasts
    pub mistake_duration: f32,
    /// Seconds a cornering target is held before re-evaluation
    pub reaction_time: f32,
    /// How far (0..=1) the cornering target leans toward the next waypoint
    pub look_ahead: f32,
}

/// What the controller can observe about its truck
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiView {
    pub position: Vec2,
    pub rotation: f32,
    pub speed: f32,
    pub max_speed: f32,
}

/// Control output, applied the same way as player input
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AiCommand {
    /// -1 (left) ..= 1 (right), positive turns toward increasing angle
    pub steer: f32,
    /// -1 (brake) ..= 1 (full throttle)
    pub throttle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Mistake {
    remaining: f32,
    direction: f32,
}

#[derive(Debug, Clone)]
pub struct AiController {
    waypoints: Vec<Vec2>,
    difficulty: Difficulty,
    params: AiParams,
    current_waypoint: usize,
    wobble_phase: f32,
    wobble_frequency: f32,
    wobble_amplitude: f32,
    mistake: Option<Mistake>,
    /// Cornering target held for the reaction delay: (target, seconds left)
    reaction: Option<(Vec2, f32)>,
    filtered_steer: f32,
    rng: Pcg32,
}

impl AiController {
    pub fn new(waypoints: Vec<Vec2>, difficulty: Difficulty, seed: u64) -> Self {
        Self::with_params(waypoints, difficulty, difficulty.params(), seed)
    }

    /// Controller with a custom tuning table
    pub fn with_params(waypoints: Vec<Vec2>, difficulty: Difficulty, params: AiParams, seed: u64) -> Self {
        let mut ai = Self {
            waypoints,
            difficulty,
            params,
            current_waypoint: 0,
            wobble_phase: 0.0,
            wobble_frequency: 1.0,
            wobble_amplitude: 1.0,
            mistake: None,
            reaction: None,
            filtered_steer: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        };
        ai.reset();
        ai
    }

    /// Back to waypoint 0 with no wobble, mistake, reaction or steering memory
    pub fn reset(&mut self) {
        self.current_waypoint = 0;
        self.wobble_phase = 0.0;
        self.wobble_frequency = self.rng.random_range(0.5..1.5);
        self.wobble_amplitude = self.rng.random_range(0.5..1.0);
        self.mistake = None;
        self.reaction = None;
        self.filtered_steer = 0.0;
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn params(&self) -> &AiParams {
        &self.params
    }

    pub fn current_waypoint_index(&self) -> usize {
        self.current_waypoint
    }

    /// Start pursuit from a given waypoint (e.g. the one after the grid)
    pub fn set_current_waypoint(&mut self, index: usize) {
        if !self.waypoints.is_empty() {
            self.current_waypoint = index % self.waypoints.len();
            self.reaction = None;
        }
    }

    pub fn is_mistake_active(&self) -> bool {
        self.mistake.is_some()
    }

    pub fn reaction_target(&self) -> Option<(Vec2, f32)> {
        self.reaction
    }

    pub fn filtered_steer(&self) -> f32 {
        self.filtered_steer
    }

    pub fn wobble_offset(&self) -> f32 {
        self.wobble_phase.sin() * self.wobble_amplitude * self.params.wobble_amount
    }

    pub fn update(&mut self, view: &AiView, dt: f32) -> AiCommand {
        if self.waypoints.is_empty() || dt <= 0.0 {
            return AiCommand::default();
        }
        let n = self.waypoints.len();

        // 1. Wobble
        self.wobble_phase = (self.wobble_phase + self.wobble_frequency * TAU * dt) % TAU;
        let wobble = self.wobble_offset();

        // 2. Mistake timer
        if let Some(m) = self.mistake.as_mut() {
            m.remaining -= dt;
            if m.remaining <= 0.0 {
                self.mistake = None;
            }
        }

        // 3. Pursuit target, with the reaction-delayed cornering blend
        let current = self.waypoints[self.current_waypoint];
        let radius = self.params.waypoint_radius;
        let target = match self.reaction {
            Some((cached, remaining)) => {
                let remaining = remaining - dt;
                self.reaction = (remaining > 0.0).then_some((cached, remaining));
                cached
            }
            None => {
                let dist = view.position.distance(current);
                if dist < radius * 2.0 {
                    let next = self.waypoints[(self.current_waypoint + 1) % n];
                    let closeness = 1.0 - dist / (radius * 2.0);
                    let blended = current.lerp_exact(next, closeness * self.params.look_ahead);
                    if self.params.reaction_time > 0.0 {
                        self.reaction = Some((blended, self.params.reaction_time));
                    }
                    blended
                } else {
                    current
                }
            }
        };

        // 4. Waypoint advance
        if view.position.distance(current) < radius {
            self.current_waypoint = (self.current_waypoint + 1) % n;
            self.reaction = None;
        }

        // 5. Steering
        let to_target = target - view.position;
        let bearing_error = if to_target.length_squared() > 0.0 {
            angle_difference(view.rotation, to_target.angle())
        } else {
            0.0
        };
        let raw = if bearing_error > STEER_DEADBAND {
            1.0
        } else if bearing_error < -STEER_DEADBAND {
            -1.0
        } else {
            0.0
        };
        let steer = match self.mistake {
            Some(m) => m.direction * MISTAKE_STEER,
            None => raw + wobble,
        };

        // 6. Smoothing
        self.filtered_steer = self.filtered_steer * STEER_SMOOTHING + steer * (1.0 - STEER_SMOOTHING);

        // 7. Speed
        let turn_factor = 1.0 - MAX_TURN_SLOWDOWN * bearing_error.abs() / PI;
        let target_speed = self.params.speed_multiplier * turn_factor;
        let current_speed = if view.max_speed > 0.0 {
            view.speed / view.max_speed
        } else {
            0.0
        };
        let mut throttle = ((target_speed - current_speed) * THROTTLE_GAIN).clamp(-1.0, 1.0);
        if self.mistake.is_some() {
            throttle *= MISTAKE_THROTTLE;
        }

        // 8. Maybe start a new mistake (Poisson process, rate = mistake_chance)
        if self.mistake.is_none()
            && self.params.mistake_chance > 0.0
            && self.rng.random::<f32>() < self.params.mistake_chance * dt
        {
            let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
            self.mistake = Some(Mistake {
                remaining: self.params.mistake_duration,
                direction,
            });
            log::debug!("AI mistake: steering {} for {:.2}s", direction, self.params.mistake_duration);
        }

        AiCommand {
            steer: self.filtered_steer.clamp(-1.0, 1.0),
            throttle,
        }
    }
}
