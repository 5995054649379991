//! Race mode: trucks lapping a waypoint track
//!
//! ```text
//! Countdown --timer--> Racing <--pause--> Paused
//!                        |
//!               every truck finished
//!                        v
//!                     Finished
//! ```
//!
//! Progress is tracked per truck with two independent checks. The checkpoint
//! index walks the waypoints as the truck passes 70% of each segment; wrapping
//! from the last checkpoint back to 0 arms the lap. An armed lap is counted
//! only when the truck's movement crosses the start/finish gate heading
//! forward, so shuffling back and forth over the line never adds laps.

use std::cmp::Ordering;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::Scene;
use super::ai::{AiController, AiView};
use super::boost_pad::BoostPad;
use super::camera::{Camera, CameraConfig};
use super::collision::check_circle_detailed;
use super::events::{GameEvent, RaceResult};
use super::physics::{Physics, PhysicsConfig};
use super::track::Track;
use super::truck::{RaceTruck, TruckId};
use super::vector::VecExt;
use crate::audio::{AudioBus, SoundEffect};
use crate::consts::*;
use crate::error::{LevelError, SimError};
use crate::frame_decay;
use crate::level::RaceLevel;
use crate::platform::InputSnapshot;
use crate::renderer::{Surface, colors, shapes};
use crate::settings::Settings;

/// Distance between grid slots
const GRID_SPACING: f32 = RACE_TRUCK_RADIUS * 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    Uninitialized,
    Countdown,
    Racing,
    Paused,
    Finished,
}

pub struct RaceScene {
    phase: RacePhase,
    level: Option<RaceLevel>,
    settings: Settings,
    audio: AudioBus,
    physics: Physics,
    camera: Camera,
    track: Option<Track>,
    trucks: Vec<RaceTruck>,
    /// One per truck, same order; the player's only drives in autopilot
    controllers: Vec<AiController>,
    boost_pads: Vec<BoostPad>,
    countdown: f32,
    race_time: f32,
    finish_order: Vec<TruckId>,
    results: Vec<RaceResult>,
    autopilot: bool,
    pause_held: bool,
    events: Vec<GameEvent>,
    seed: u64,
}

impl RaceScene {
    pub fn new(viewport: Vec2, seed: u64) -> Self {
        let settings = Settings::default();
        let mut camera = Camera::new(
            CameraConfig {
                viewport,
                follow_speed: settings.effective_follow_speed(),
                ..Default::default()
            },
            seed,
        );
        camera.set_shake_enabled(settings.effective_screen_shake());

        Self {
            phase: RacePhase::Uninitialized,
            level: None,
            settings,
            audio: AudioBus::default(),
            physics: Physics::new(PhysicsConfig::top_down(MAX_VELOCITY_X)),
            camera,
            track: None,
            trucks: Vec::new(),
            controllers: Vec::new(),
            boost_pads: Vec::new(),
            countdown: 0.0,
            race_time: 0.0,
            finish_order: Vec::new(),
            results: Vec::new(),
            autopilot: false,
            pause_held: false,
            events: Vec::new(),
            seed,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.camera.follow_speed = settings.effective_follow_speed();
        self.camera.set_shake_enabled(settings.effective_screen_shake());
        self.settings = settings;
        self
    }

    pub fn with_audio(mut self, audio: AudioBus) -> Self {
        self.audio = audio;
        self
    }

    /// Let the AI drive the player's truck too
    pub fn with_autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }

    pub fn set_autopilot(&mut self, autopilot: bool) {
        self.autopilot = autopilot;
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    /// Validate and load a level. On error the scene stays uninitialized.
    pub fn init(&mut self, level: RaceLevel) -> Result<(), LevelError> {
        let built = level
            .validate()
            .and_then(|_| Track::new(level.waypoint_vecs(), level.track_width, level.laps));
        let track = match built {
            Ok(track) => track,
            Err(e) => {
                log::warn!("Rejected race level '{}': {}", level.name, e);
                self.phase = RacePhase::Uninitialized;
                self.level = None;
                self.track = None;
                return Err(e);
            }
        };
        self.build(&level, track);
        log::info!(
            "Race '{}' ready: {} trucks, {} laps, {:.0}px track",
            level.name,
            self.trucks.len(),
            level.laps,
            self.track.as_ref().map_or(0.0, |t| t.total_length())
        );
        self.level = Some(level);
        Ok(())
    }

    /// Back to the grid with the same level
    pub fn restart(&mut self) -> Result<(), SimError> {
        let level = self.level.clone().ok_or(SimError::NotInitialized)?;
        let track = Track::new(level.waypoint_vecs(), level.track_width, level.laps)?;
        self.build(&level, track);
        log::info!("Race restarted");
        Ok(())
    }

    fn build(&mut self, level: &RaceLevel, track: Track) {
        let waypoints = track.waypoints().to_vec();

        let mut trucks = vec![RaceTruck::new(0, "Player", true, level.truck)];
        let mut difficulties = vec![self.settings.ai_difficulty];
        for (i, opponent) in level.opponents.iter().enumerate() {
            let id = i as TruckId + 1;
            let name = opponent.name.clone().unwrap_or_else(|| format!("CPU {}", id));
            trucks.push(RaceTruck::new(id, name, false, opponent.stats));
            difficulties.push(opponent.difficulty.unwrap_or(self.settings.ai_difficulty));
        }

        let grid = track.grid_positions(trucks.len(), GRID_SPACING);
        for (truck, (position, heading)) in trucks.iter_mut().zip(grid) {
            truck.place(position, heading);
            truck.race_position = truck.id as usize + 1;
        }

        self.controllers = trucks
            .iter()
            .zip(difficulties)
            .map(|(truck, difficulty)| {
                let mut ai = AiController::new(waypoints.clone(), difficulty, truck_seed(self.seed, truck.id));
                // The grid sits behind waypoint 0, pursue the one after it
                ai.set_current_waypoint(1);
                ai
            })
            .collect();

        self.boost_pads = level
            .boost_pads
            .iter()
            .filter(|p| p.is_valid())
            .enumerate()
            .map(|(i, p)| BoostPad::new(i as u32, p.to_rect(), BOOST_COOLDOWN))
            .collect();

        let top_speed = trucks.iter().map(|t| t.max_speed).fold(0.0, f32::max);
        self.physics = Physics::new(PhysicsConfig::top_down(top_speed * BOOST_MULTIPLIER));

        self.camera.bounds = Some(level.world.rect());
        self.camera.stop_shake();
        self.camera.set_target(Some(trucks[0].position()));
        self.camera.snap_to_target();

        self.trucks = trucks;
        self.track = Some(track);
        self.countdown = if level.countdown.is_finite() {
            level.countdown.max(0.0)
        } else {
            RACE_COUNTDOWN
        };
        self.race_time = 0.0;
        self.finish_order.clear();
        self.results.clear();
        self.pause_held = false;
        self.events.clear();
        self.phase = RacePhase::Countdown;
    }

    pub fn pause(&mut self) {
        if self.phase == RacePhase::Racing {
            self.phase = RacePhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == RacePhase::Paused {
            self.phase = RacePhase::Racing;
        }
    }

    pub fn update(&mut self, input: &InputSnapshot, dt: f32) -> Result<(), SimError> {
        if self.phase == RacePhase::Uninitialized {
            return Err(SimError::NotInitialized);
        }
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DELTA_TIME) } else { 0.0 };

        let pause_pressed = input.pause && !self.pause_held;
        self.pause_held = input.pause;
        if pause_pressed {
            match self.phase {
                RacePhase::Racing => self.pause(),
                RacePhase::Paused => self.resume(),
                _ => {}
            }
        }

        match self.phase {
            RacePhase::Countdown => self.tick_countdown(dt),
            RacePhase::Racing => self.tick_race(input, dt),
            _ => {}
        }

        if self.phase != RacePhase::Paused {
            if let Some(player) = self.trucks.first() {
                self.camera.set_target(Some(player.position()));
            }
            self.camera.update(dt);
        }
        Ok(())
    }

    fn tick_countdown(&mut self, dt: f32) {
        let before = self.countdown.ceil();
        self.countdown -= dt;
        if self.countdown <= 0.0 {
            self.countdown = 0.0;
            self.phase = RacePhase::Racing;
            self.audio.play(SoundEffect::RaceStart);
            self.events.push(GameEvent::RaceStarted);
            log::info!("Race started");
        } else if self.countdown.ceil() < before {
            self.audio.play(SoundEffect::CountdownBeep);
        }
    }

    fn tick_race(&mut self, input: &InputSnapshot, dt: f32) {
        let Some(track) = self.track.as_ref() else {
            return;
        };
        self.race_time += dt;

        for (truck, ai) in self.trucks.iter_mut().zip(self.controllers.iter_mut()) {
            if truck.finished {
                continue;
            }

            let (steer, throttle) = if truck.is_player && !self.autopilot {
                (input.horizontal(), input.vertical())
            } else {
                let view = AiView {
                    position: truck.position(),
                    rotation: truck.rotation,
                    speed: truck.speed,
                    max_speed: truck.top_speed(),
                };
                let command = ai.update(&view, dt);
                (command.steer, command.throttle)
            };

            truck.apply_control(steer, throttle, dt);
            truck.integrate(&self.physics, dt);
            apply_off_track(track, truck, dt);

            for pad in self.boost_pads.iter_mut() {
                if pad.overlaps(truck.position(), truck.radius) && pad.try_activate(truck.id) {
                    truck.start_boost(BOOST_DURATION);
                    if truck.is_player {
                        self.audio.play(SoundEffect::Boost);
                    }
                }
            }

            let Some(lap) = advance_progress(track, truck) else {
                continue;
            };
            log::debug!("{} completed lap {}/{}", truck.name, lap, track.laps());
            self.events.push(GameEvent::LapCompleted {
                truck_id: truck.id,
                lap,
            });

            if lap >= track.laps() {
                truck.finished = true;
                truck.finish_time = Some(self.race_time);
                truck.freeze();
                self.finish_order.push(truck.id);
                let position = self.finish_order.len();
                log::info!("{} finished P{} in {:.2}s", truck.name, position, self.race_time);
                if truck.is_player {
                    self.audio.play(SoundEffect::Finish);
                }
                self.events.push(GameEvent::TruckFinished {
                    truck_id: truck.id,
                    position,
                    time: self.race_time,
                });
            } else if truck.is_player {
                self.audio.play(SoundEffect::LapComplete);
            }
        }

        for pad in self.boost_pads.iter_mut() {
            pad.update(dt);
        }

        separate_trucks(&mut self.trucks);

        for (place, index) in rank_trucks(track, &self.trucks, &self.finish_order)
            .into_iter()
            .enumerate()
        {
            self.trucks[index].race_position = place + 1;
        }

        if self.trucks.iter().all(|t| t.finished) {
            self.complete_race();
        }
    }

    fn complete_race(&mut self) {
        self.results = self
            .finish_order
            .iter()
            .enumerate()
            .filter_map(|(i, id)| {
                let truck = self.trucks.iter().find(|t| t.id == *id)?;
                Some(RaceResult {
                    truck_id: truck.id,
                    position: i + 1,
                    time: truck.finish_time.unwrap_or(self.race_time),
                    is_player: truck.is_player,
                })
            })
            .collect();
        self.phase = RacePhase::Finished;
        self.events.push(GameEvent::RaceComplete(self.results.clone()));
        log::info!("Race complete after {:.2}s", self.race_time);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let viewport = self.camera.viewport;
        surface.set_fill_color(colors::BACKGROUND);
        surface.fill_rect(0.0, 0.0, viewport.x, viewport.y);
        let Some(track) = self.track.as_ref() else {
            return;
        };

        self.camera.apply_transform(surface);

        shapes::track(surface, track);
        let player_id = self.trucks.first().map(|t| t.id);
        for pad in &self.boost_pads {
            let cooling = player_id.is_some_and(|id| pad.is_cooling_down(id));
            let color = if cooling {
                colors::BOOST_PAD_COOLING
            } else {
                colors::BOOST_PAD
            };
            shapes::fill_rect(surface, &pad.rect, color);
        }
        for truck in &self.trucks {
            if !self.camera.is_point_visible(truck.position(), truck.radius * 2.0) {
                continue;
            }
            let color = if truck.is_player {
                colors::PLAYER
            } else if truck.is_boosting() {
                shapes::speed_color(truck.speed, truck.max_speed, 1.0)
            } else {
                colors::OPPONENT
            };
            shapes::top_truck(surface, truck.position(), truck.radius, truck.rotation, color);
        }

        self.camera.restore_transform(surface);

        // HUD: one pip per truck, the player's lit; lap bar underneath
        if let Some(player) = self.trucks.first() {
            for place in 1..=self.trucks.len() {
                let color = if place == player.race_position {
                    colors::PLAYER
                } else {
                    colors::TRACK
                };
                surface.set_fill_color(color);
                surface.fill_rect(16.0 + (place - 1) as f32 * 20.0, 16.0, 14.0, 14.0);
            }
            let frac = player.lap as f32 / track.laps() as f32;
            surface.set_fill_color(colors::STAR);
            surface.fill_rect(16.0, 38.0, (viewport.x * 0.25) * frac.min(1.0), 6.0);
        }

        if self.phase == RacePhase::Countdown {
            let lights = self.countdown.ceil().max(0.0) as usize;
            surface.set_fill_color(colors::OBSTACLE);
            for i in 0..lights {
                let x = viewport.x * 0.5 + (i as f32 - lights as f32 * 0.5) * 40.0;
                surface.fill_rect(x, viewport.y * 0.3, 30.0, 30.0);
            }
        }

        if matches!(self.phase, RacePhase::Paused | RacePhase::Finished) {
            surface.set_fill_color(colors::OVERLAY);
            surface.fill_rect(0.0, 0.0, viewport.x, viewport.y);
        }
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    pub fn race_time(&self) -> f32 {
        self.race_time
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn trucks(&self) -> &[RaceTruck] {
        &self.trucks
    }

    pub fn player(&self) -> Option<&RaceTruck> {
        self.trucks.iter().find(|t| t.is_player)
    }

    pub fn boost_pads(&self) -> &[BoostPad] {
        &self.boost_pads
    }

    /// Results in finishing order, empty until the race is complete
    pub fn results(&self) -> &[RaceResult] {
        &self.results
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

impl Scene for RaceScene {
    type Level = RaceLevel;

    fn init(&mut self, level: RaceLevel) -> Result<(), LevelError> {
        RaceScene::init(self, level)
    }

    fn start(&mut self) {}

    fn update(&mut self, input: &InputSnapshot, dt: f32) -> Result<(), SimError> {
        RaceScene::update(self, input, dt)
    }

    fn render(&self, surface: &mut dyn Surface) {
        RaceScene::render(self, surface)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        RaceScene::drain_events(self)
    }

    fn is_over(&self) -> bool {
        self.phase == RacePhase::Finished
    }
}

/// Per-truck RNG seed derived from the scene seed
fn truck_seed(seed: u64, id: TruckId) -> u64 {
    seed ^ (id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Walk the checkpoint index and count a lap if one was completed this tick.
/// Returns the new lap count when it changed.
pub fn advance_progress(track: &Track, truck: &mut RaceTruck) -> Option<u32> {
    let segment = track.segment(truck.checkpoint_index);
    if segment.progress(truck.position()) >= CHECKPOINT_PROGRESS {
        let next = track.next_index(truck.checkpoint_index);
        if next == 0 {
            truck.lap_armed = true;
        }
        truck.checkpoint_index = next;
    }

    if truck.lap_armed && track.crosses_start_gate(truck.prev_position, truck.position()) {
        truck.lap_armed = false;
        truck.lap += 1;
        return Some(truck.lap);
    }
    None
}

/// Slow a truck that left the track and ease it back toward the course
fn apply_off_track(track: &Track, truck: &mut RaceTruck, dt: f32) {
    truck.off_track = !track.is_on_track(truck.position(), OFF_TRACK_MARGIN);
    if !truck.off_track {
        return;
    }
    truck.speed *= frame_decay(OFF_TRACK_SLOWDOWN, dt);
    let waypoint = track.waypoints()[track.nearest_waypoint(truck.position())];
    truck.body.position += (waypoint - truck.position()).safe_normalize() * OFF_TRACK_NUDGE * dt;
    truck.body.velocity = Vec2::from_angle_len(truck.rotation, truck.speed);
}

/// Push overlapping trucks apart, half the overlap each. Finished trucks
/// don't move; the other truck takes the whole push.
fn separate_trucks(trucks: &mut [RaceTruck]) {
    for i in 0..trucks.len() {
        for j in (i + 1)..trucks.len() {
            let hit = check_circle_detailed(&trucks[i].circle(), &trucks[j].circle());
            if !hit.collided {
                continue;
            }
            let push = hit.mtv();
            match (trucks[i].finished, trucks[j].finished) {
                (true, true) => {}
                (false, true) => trucks[i].body.position += push,
                (true, false) => trucks[j].body.position -= push,
                (false, false) => {
                    trucks[i].body.position += push * 0.5;
                    trucks[j].body.position -= push * 0.5;
                }
            }
        }
    }
}

/// Truck indices from first to last place
pub fn rank_trucks(track: &Track, trucks: &[RaceTruck], finish_order: &[TruckId]) -> Vec<usize> {
    let finish_place = |t: &RaceTruck| finish_order.iter().position(|id| *id == t.id);
    // An armed truck has passed every checkpoint and is heading for the line
    let checkpoint = |t: &RaceTruck| {
        if t.lap_armed {
            track.len()
        } else {
            t.checkpoint_index
        }
    };
    let to_next = |t: &RaceTruck| {
        let next = if t.lap_armed {
            0
        } else {
            track.next_index(t.checkpoint_index)
        };
        t.position().distance(track.waypoints()[next])
    };

    let mut order: Vec<usize> = (0..trucks.len()).collect();
    order.sort_by(|&a, &b| {
        let (ta, tb) = (&trucks[a], &trucks[b]);
        match (finish_place(ta), finish_place(tb)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => tb
                .lap
                .cmp(&ta.lap)
                .then(checkpoint(tb).cmp(&checkpoint(ta)))
                .then(to_next(ta).total_cmp(&to_next(tb))),
        }
    });
    order
}
