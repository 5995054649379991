//! Stadium mode: a timed freestyle arena
//!
//! One side-on truck, ground/platforms/ramps to drive over, stars to collect
//! and obstacles to crush, with a chain of challenges that buy extra time.
//!
//! ```text
//! Uninitialized --init--> Ready --start--> Running <--pause--> Paused
//!                                             |
//!                                    timer <= 0
//!                                             v
//!                                          GameOver --restart--> Ready
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::Scene;
use super::camera::{Camera, CameraConfig};
use super::collision::{Circle, Rect, check_aabb, check_circle};
use super::events::GameEvent;
use super::physics::{Physics, PhysicsConfig};
use super::truck::StadiumTruck;
use crate::audio::{AudioBus, SoundEffect};
use crate::consts::*;
use crate::error::{LevelError, SimError};
use crate::level::{Challenge, ChallengeKind, RampDef, RampFacing, StadiumLevel};
use crate::platform::InputSnapshot;
use crate::renderer::{Surface, colors, shapes};
use crate::settings::Settings;

const CRUSH_SHAKE_INTENSITY: f32 = 10.0;
const CRUSH_SHAKE_DURATION: f32 = 0.3;
/// Thickness of the invisible side walls
const WALL_THICKNESS: f32 = 100.0;
/// Largest step up onto a ramp surface the truck takes in one tick
const RAMP_STEP: f32 = 16.0;
/// Thickness of the solid face at a ramp's tall end
const RAMP_FACE: f32 = 4.0;
/// Upward speed beyond the slope's own at which the truck leaves the ramp
const RAMP_RELEASE: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StadiumPhase {
    Uninitialized,
    Ready,
    Running,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub id: u32,
    pub position: Vec2,
    pub collected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub rect: Rect,
    pub points: u64,
    pub crushed: bool,
}

/// Wedge sitting on `base_y`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub x: f32,
    pub base_y: f32,
    pub width: f32,
    pub height: f32,
    pub facing: RampFacing,
}

impl Ramp {
    fn from_def(def: &RampDef) -> Option<Self> {
        let finite = [def.x, def.y, def.width, def.height].iter().all(|v| v.is_finite());
        (finite && def.width > 0.0 && def.height > 0.0).then_some(Self {
            x: def.x,
            base_y: def.y,
            width: def.width,
            height: def.height,
            facing: def.facing,
        })
    }

    /// dy/dx of the surface in screen space
    pub fn slope(&self) -> f32 {
        match self.facing {
            RampFacing::Right => -self.height / self.width,
            RampFacing::Left => self.height / self.width,
        }
    }

    pub fn angle(&self) -> f32 {
        self.slope().atan()
    }

    /// Surface height under `x`, None off the ramp
    pub fn surface_y(&self, x: f32) -> Option<f32> {
        if x < self.x || x > self.x + self.width {
            return None;
        }
        let t = (x - self.x) / self.width;
        let rise = match self.facing {
            RampFacing::Right => t,
            RampFacing::Left => 1.0 - t,
        };
        Some(self.base_y - self.height * rise)
    }

    /// Vertical face at the tall end
    fn face(&self) -> Rect {
        let x = match self.facing {
            RampFacing::Right => self.x + self.width - RAMP_FACE,
            RampFacing::Left => self.x,
        };
        Rect::new(x, self.base_y - self.height, RAMP_FACE, self.height)
    }
}

/// Progress of the active challenge, counted from when it activated
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ChallengeTracker {
    index: usize,
    stars_at_start: u32,
    crushes_at_start: u32,
    elapsed: f32,
}

pub struct StadiumScene {
    phase: StadiumPhase,
    level: Option<StadiumLevel>,
    settings: Settings,
    audio: AudioBus,
    physics: Physics,
    camera: Camera,
    truck: StadiumTruck,
    spawn: Vec2,
    world: Rect,
    ground: Rect,
    walls: Vec<Rect>,
    platforms: Vec<Rect>,
    ramps: Vec<Ramp>,
    stars: Vec<Star>,
    obstacles: Vec<Obstacle>,
    challenges: Vec<Challenge>,
    tracker: ChallengeTracker,
    score: u64,
    stars_collected: u32,
    crushes: u32,
    time_limit: f32,
    time_remaining: f32,
    bonus_time: f32,
    elapsed: f32,
    pause_held: bool,
    events: Vec<GameEvent>,
}

impl StadiumScene {
    pub fn new(viewport: Vec2, seed: u64) -> Self {
        let settings = Settings::default();
        let mut camera = Camera::new(
            CameraConfig {
                viewport,
                follow_speed: settings.effective_follow_speed(),
                dead_zone: Some(Rect::new(
                    viewport.x * 0.4,
                    viewport.y * 0.35,
                    viewport.x * 0.2,
                    viewport.y * 0.3,
                )),
                bounds: None,
                zoom: 1.0,
            },
            seed,
        );
        camera.set_shake_enabled(settings.effective_screen_shake());

        Self {
            phase: StadiumPhase::Uninitialized,
            level: None,
            settings,
            audio: AudioBus::default(),
            physics: Physics::new(PhysicsConfig::default()),
            camera,
            truck: StadiumTruck::new(Vec2::ZERO, Default::default()),
            spawn: Vec2::ZERO,
            world: Rect::default(),
            ground: Rect::default(),
            walls: Vec::new(),
            platforms: Vec::new(),
            ramps: Vec::new(),
            stars: Vec::new(),
            obstacles: Vec::new(),
            challenges: Vec::new(),
            tracker: ChallengeTracker::default(),
            score: 0,
            stars_collected: 0,
            crushes: 0,
            time_limit: 0.0,
            time_remaining: 0.0,
            bonus_time: CHALLENGE_BONUS_TIME,
            elapsed: 0.0,
            pause_held: false,
            events: Vec::new(),
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

    /// Validate and load a level. On error the scene stays uninitialized.
    pub fn init(&mut self, level: StadiumLevel) -> Result<(), LevelError> {
        if let Err(e) = level.validate() {
            log::warn!("Rejected stadium level '{}': {}", level.name, e);
            self.phase = StadiumPhase::Uninitialized;
            self.level = None;
            return Err(e);
        }
        self.build(&level);
        log::info!(
            "Stadium '{}' ready: {} stars, {} obstacles, {} challenges",
            level.name,
            self.stars.len(),
            self.obstacles.len(),
            self.challenges.len()
        );
        self.level = Some(level);
        self.phase = StadiumPhase::Ready;
        Ok(())
    }

    /// Reload the current level from scratch
    pub fn restart(&mut self) -> Result<(), SimError> {
        let level = self.level.clone().ok_or(SimError::NotInitialized)?;
        self.build(&level);
        self.phase = StadiumPhase::Ready;
        log::info!("Stadium restarted");
        Ok(())
    }

    fn build(&mut self, level: &StadiumLevel) {
        self.world = level.world.rect();
        let ground_y = level.ground_y();
        self.ground = Rect::new(0.0, ground_y, level.world.width, level.world.height - ground_y + WALL_THICKNESS);

        let tall = level.world.height * 3.0;
        self.walls = vec![
            Rect::new(-WALL_THICKNESS, -level.world.height, WALL_THICKNESS, tall),
            Rect::new(level.world.width, -level.world.height, WALL_THICKNESS, tall),
        ];

        self.platforms = level
            .platforms
            .iter()
            .filter(|p| {
                let ok = p.is_valid();
                if !ok {
                    log::warn!("Skipping invalid platform {:?}", p);
                }
                ok
            })
            .map(|p| p.to_rect())
            .collect();

        self.ramps = level.ramps.iter().filter_map(Ramp::from_def).collect();
        self.walls.extend(self.ramps.iter().map(Ramp::face));

        self.stars = level
            .stars
            .iter()
            .filter(|s| s.is_finite())
            .enumerate()
            .map(|(i, s)| Star {
                id: i as u32,
                position: s.to_vec2(),
                collected: false,
            })
            .collect();
        if self.stars.len() != level.stars.len() {
            log::warn!("Skipped {} non-finite stars", level.stars.len() - self.stars.len());
        }

        self.obstacles = level
            .obstacles
            .iter()
            .filter(|o| o.rect_def().is_valid())
            .enumerate()
            .map(|(i, o)| Obstacle {
                id: i as u32,
                rect: o.rect_def().to_rect(),
                points: o.points,
                crushed: false,
            })
            .collect();

        self.challenges = level.challenges.iter().filter_map(|c| c.sanitize()).collect();
        self.tracker = ChallengeTracker::default();

        self.spawn = level.start.to_vec2();
        self.truck = StadiumTruck::new(self.spawn, level.truck);
        self.truck.body.is_grounded = self.is_supported(&self.truck.rect());

        self.score = 0;
        self.stars_collected = 0;
        self.crushes = 0;
        self.time_limit = level.time_limit;
        self.time_remaining = level.time_limit;
        self.bonus_time = if level.bonus_time.is_finite() {
            level.bonus_time.max(0.0)
        } else {
            CHALLENGE_BONUS_TIME
        };
        self.elapsed = 0.0;
        self.pause_held = false;
        self.events.clear();

        self.camera.bounds = Some(self.world);
        self.camera.stop_shake();
        self.camera.set_target(Some(self.truck.center()));
        self.camera.snap_to_target();
    }

    pub fn start(&mut self) {
        if self.phase == StadiumPhase::Ready {
            self.phase = StadiumPhase::Running;
            log::info!("Stadium run started");
        }
    }

    pub fn pause(&mut self) {
        if self.phase == StadiumPhase::Running {
            self.phase = StadiumPhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == StadiumPhase::Paused {
            self.phase = StadiumPhase::Running;
        }
    }

    pub fn update(&mut self, input: &InputSnapshot, dt: f32) -> Result<(), SimError> {
        if self.phase == StadiumPhase::Uninitialized {
            return Err(SimError::NotInitialized);
        }
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DELTA_TIME) } else { 0.0 };

        let pause_pressed = input.pause && !self.pause_held;
        self.pause_held = input.pause;
        if pause_pressed {
            match self.phase {
                StadiumPhase::Running => self.pause(),
                StadiumPhase::Paused => self.resume(),
                _ => {}
            }
        }

        match self.phase {
            StadiumPhase::Running => {}
            StadiumPhase::Paused => return Ok(()),
            _ => {
                self.camera.update(dt);
                return Ok(());
            }
        }

        self.elapsed += dt;
        self.time_remaining -= dt;

        self.step_truck(input, dt);
        self.collect_stars();
        self.evaluate_challenge(dt);

        self.camera.set_target(Some(self.truck.center()));
        self.camera.update(dt);

        if self.time_remaining <= 0.0 {
            self.time_remaining = 0.0;
            self.phase = StadiumPhase::GameOver;
            self.audio.play(SoundEffect::GameOver);
            self.events.push(GameEvent::GameOver {
                score: self.score,
                stars: self.stars_collected,
                crushes: self.crushes,
            });
            log::info!(
                "Game over: score {}, {} stars, {} crushes",
                self.score,
                self.stars_collected,
                self.crushes
            );
        }
        Ok(())
    }

    fn step_truck(&mut self, input: &InputSnapshot, dt: f32) {
        if self.truck.apply_input(&self.physics, input, dt) {
            self.audio.play(SoundEffect::Jump);
        }
        self.physics.update(&mut self.truck.body, dt);
        self.truck.body.is_grounded = false;

        for solid in self.walls.iter().chain(std::iter::once(&self.ground)).chain(&self.platforms) {
            self.physics
                .resolve_static_collision(&mut self.truck.body, self.truck.size, solid);
        }

        for obstacle in self.obstacles.iter_mut().filter(|o| !o.crushed) {
            if !check_aabb(&self.truck.rect(), &obstacle.rect) {
                continue;
            }
            if self.truck.speed() >= CRUSH_SPEED {
                obstacle.crushed = true;
                self.crushes += 1;
                self.score += obstacle.points;
                self.events.push(GameEvent::ObstacleCrushed {
                    id: obstacle.id,
                    points: obstacle.points,
                    total_score: self.score,
                });
                self.camera.shake(CRUSH_SHAKE_INTENSITY, CRUSH_SHAKE_DURATION);
                self.audio.play(SoundEffect::Crush);
                log::debug!("Crushed obstacle {} at {:.0} px/s", obstacle.id, self.truck.speed());
            } else {
                let hit = self
                    .physics
                    .resolve_static_collision(&mut self.truck.body, self.truck.size, &obstacle.rect);
                if hit.normal.x != 0.0 {
                    self.audio.play(SoundEffect::Bump);
                }
            }
        }

        let ramp_angle = self.ride_ramps();

        if !self.truck.body.is_grounded
            && self.truck.body.velocity.y >= 0.0
            && self.is_supported(&self.truck.rect())
        {
            self.truck.body.is_grounded = true;
        }

        match ramp_angle {
            Some(angle) => self.truck.rotation = angle,
            None if self.truck.body.is_grounded => self.truck.rotation = 0.0,
            None => {}
        }
    }

    /// Keep the truck glued to any ramp under it. Returns the ramp angle.
    fn ride_ramps(&mut self) -> Option<f32> {
        let rect = self.truck.rect();
        let foot = Vec2::new(rect.center().x, rect.bottom());
        let body = &mut self.truck.body;

        for ramp in &self.ramps {
            let Some(surface) = ramp.surface_y(foot.x) else {
                continue;
            };
            let slope = ramp.slope();
            let on_surface = foot.y >= surface - 1.0 && foot.y - surface <= RAMP_STEP;
            // Not leaving the surface faster than it falls away (jumps)
            let following = body.velocity.y >= body.velocity.x * slope - RAMP_RELEASE;
            if on_surface && following {
                body.position.y = surface - self.truck.size.y;
                body.velocity.y = body.velocity.x * slope;
                body.is_grounded = true;
                return Some(ramp.angle());
            }
        }
        None
    }

    /// Something solid directly under `rect`
    fn is_supported(&self, rect: &Rect) -> bool {
        let probe = Rect::new(rect.x, rect.y + 1.0, rect.w, rect.h);
        let standing_on = |s: &Rect| s.top() >= rect.bottom() - 0.5 && probe.intersects(s);

        standing_on(&self.ground)
            || self.platforms.iter().any(standing_on)
            || self
                .obstacles
                .iter()
                .filter(|o| !o.crushed)
                .any(|o| standing_on(&o.rect))
    }

    fn collect_stars(&mut self) {
        let pickup = self.truck.circle();
        for star in self.stars.iter_mut().filter(|s| !s.collected) {
            if check_circle(&pickup, &Circle::new(star.position, STAR_RADIUS)) {
                star.collected = true;
                self.stars_collected += 1;
                self.score += STAR_POINTS;
                self.audio.play(SoundEffect::StarCollect);
                self.events.push(GameEvent::StarCollected {
                    id: star.id,
                    total: self.stars_collected,
                });
            }
        }
    }

    /// Active challenge and its progress (seconds survived for `time`)
    pub fn active_challenge(&self) -> Option<(Challenge, u32)> {
        let challenge = *self.challenges.get(self.tracker.index)?;
        let progress = match challenge.kind {
            ChallengeKind::Collect => self.stars_collected - self.tracker.stars_at_start,
            ChallengeKind::Crush => self.crushes - self.tracker.crushes_at_start,
            ChallengeKind::Time => self.tracker.elapsed as u32,
        };
        Some((challenge, progress))
    }

    fn evaluate_challenge(&mut self, dt: f32) {
        if self.tracker.index >= self.challenges.len() {
            return;
        }
        self.tracker.elapsed += dt;
        let Some((challenge, progress)) = self.active_challenge() else {
            return;
        };

        let complete = match challenge.kind {
            ChallengeKind::Time => self.tracker.elapsed >= challenge.target as f32,
            _ => progress >= challenge.target,
        };

        if complete {
            self.time_remaining += self.bonus_time;
            self.audio.play(SoundEffect::ChallengeComplete);
            self.events.push(GameEvent::ChallengeComplete(challenge.kind));
            log::info!(
                "Challenge {} x{} complete, +{:.0}s",
                challenge.kind.as_str(),
                challenge.target,
                self.bonus_time
            );
            self.advance_challenge();
        } else if challenge.time_limit.is_some_and(|limit| self.tracker.elapsed >= limit) {
            self.audio.play(SoundEffect::ChallengeFailed);
            self.events.push(GameEvent::ChallengeFailed(challenge.kind));
            log::info!("Challenge {} x{} failed", challenge.kind.as_str(), challenge.target);
            self.advance_challenge();
        }
    }

    fn advance_challenge(&mut self) {
        self.tracker = ChallengeTracker {
            index: self.tracker.index + 1,
            stars_at_start: self.stars_collected,
            crushes_at_start: self.crushes,
            elapsed: 0.0,
        };
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let viewport = self.camera.viewport;
        surface.set_fill_color(colors::BACKGROUND);
        surface.fill_rect(0.0, 0.0, viewport.x, viewport.y);
        if self.phase == StadiumPhase::Uninitialized {
            return;
        }

        self.camera.apply_transform(surface);

        shapes::fill_rect(surface, &self.ground, colors::GROUND);
        for platform in self.platforms.iter().filter(|p| self.camera.is_visible(p)) {
            shapes::fill_rect(surface, platform, colors::PLATFORM);
        }
        for ramp in &self.ramps {
            shapes::ramp(
                surface,
                ramp.x,
                ramp.base_y,
                ramp.width,
                ramp.height,
                ramp.facing == RampFacing::Right,
            );
        }
        for obstacle in self.obstacles.iter().filter(|o| self.camera.is_visible(&o.rect)) {
            if obstacle.crushed {
                let r = obstacle.rect;
                let flat = Rect::new(r.x - 4.0, r.bottom() - r.h * 0.25, r.w + 8.0, r.h * 0.25);
                shapes::fill_rect(surface, &flat, colors::OBSTACLE_CRUSHED);
            } else {
                shapes::fill_rect(surface, &obstacle.rect, colors::OBSTACLE);
            }
        }
        for star in &self.stars {
            if !star.collected && self.camera.is_point_visible(star.position, STAR_RADIUS) {
                shapes::star(surface, star.position, STAR_RADIUS, self.elapsed * 2.0);
            }
        }
        shapes::side_truck(
            surface,
            self.truck.center(),
            self.truck.size,
            self.truck.rotation,
            self.truck.facing,
            colors::PLAYER,
        );

        self.camera.restore_transform(surface);

        // Timer bar
        let full = self.time_limit.max(self.time_remaining);
        let frac = if full > 0.0 { self.time_remaining / full } else { 0.0 };
        surface.set_fill_color(colors::STAR);
        surface.fill_rect(16.0, 16.0, (viewport.x - 32.0) * frac, 8.0);

        if matches!(self.phase, StadiumPhase::Paused | StadiumPhase::GameOver) {
            surface.set_fill_color(colors::OVERLAY);
            surface.fill_rect(0.0, 0.0, viewport.x, viewport.y);
        }
    }

    pub fn phase(&self) -> StadiumPhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn stars_collected(&self) -> u32 {
        self.stars_collected
    }

    pub fn crushes(&self) -> u32 {
        self.crushes
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn truck(&self) -> &StadiumTruck {
        &self.truck
    }

    pub fn truck_mut(&mut self) -> &mut StadiumTruck {
        &mut self.truck
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn spawn_point(&self) -> Vec2 {
        self.spawn
    }
}

impl Scene for StadiumScene {
    type Level = StadiumLevel;

    fn init(&mut self, level: StadiumLevel) -> Result<(), LevelError> {
        StadiumScene::init(self, level)
    }

    fn start(&mut self) {
        StadiumScene::start(self)
    }

    fn update(&mut self, input: &InputSnapshot, dt: f32) -> Result<(), SimError> {
        StadiumScene::update(self, input, dt)
    }

    fn render(&self, surface: &mut dyn Surface) {
        StadiumScene::render(self, surface)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        StadiumScene::drain_events(self)
    }

    fn is_over(&self) -> bool {
        self.phase == StadiumPhase::GameOver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{ChallengeDef, ObstacleDef, PointDef, WorldSize};
    use crate::renderer::{DrawCommand, RecordingSurface};

    const DT: f32 = 1.0 / 60.0;

    /// Flat 2000x1000 arena, ground top at y=960, truck resting at x=100
    fn flat_level() -> StadiumLevel {
        StadiumLevel {
            name: "test".into(),
            world: WorldSize {
                width: 2000.0,
                height: 1000.0,
            },
            time_limit: 60.0,
            bonus_time: 15.0,
            ground_height: 40.0,
            start: PointDef { x: 100.0, y: 920.0 },
            platforms: vec![],
            ramps: vec![],
            stars: vec![],
            obstacles: vec![],
            challenges: vec![],
            truck: Default::default(),
        }
    }

    fn running(level: StadiumLevel) -> StadiumScene {
        let mut scene = StadiumScene::new(Vec2::new(800.0, 600.0), 7);
        scene.init(level).unwrap();
        scene.start();
        scene
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::default()
    }

    #[test]
    fn test_update_before_init_fails() {
        let mut scene = StadiumScene::new(Vec2::new(800.0, 600.0), 1);
        assert!(matches!(scene.update(&idle(), DT), Err(SimError::NotInitialized)));
        assert!(matches!(scene.restart(), Err(SimError::NotInitialized)));
    }

    #[test]
    fn test_invalid_level_leaves_scene_uninitialized() {
        let mut scene = StadiumScene::new(Vec2::new(800.0, 600.0), 1);
        let mut level = flat_level();
        level.world.width = -5.0;
        assert!(scene.init(level).is_err());
        assert_eq!(scene.phase(), StadiumPhase::Uninitialized);
        assert!(scene.update(&idle(), DT).is_err());
    }

    #[test]
    fn test_truck_rests_on_ground() {
        let mut scene = running(flat_level());
        for _ in 0..120 {
            scene.update(&idle(), DT).unwrap();
        }
        let truck = scene.truck();
        assert!(truck.body.is_grounded);
        assert!((truck.rect().bottom() - 960.0).abs() < 1.0);
    }

    #[test]
    fn test_collect_challenge_grants_bonus_time() {
        let mut level = flat_level();
        // Five stars sitting on the truck
        level.stars = (0..5).map(|i| PointDef { x: 130.0 + i as f32 * 5.0, y: 940.0 }).collect();
        level.challenges = vec![ChallengeDef {
            kind: ChallengeKind::Collect,
            target: 5,
            time_limit: None,
        }];
        let mut scene = running(level);

        scene.update(&idle(), DT).unwrap();

        assert_eq!(scene.stars_collected(), 5);
        assert_eq!(scene.score(), 5 * STAR_POINTS);
        assert!((scene.time_remaining() - (60.0 - DT + 15.0)).abs() < 1e-3);

        let events = scene.drain_events();
        assert!(events.contains(&GameEvent::ChallengeComplete(ChallengeKind::Collect)));
        assert!(events.contains(&GameEvent::StarCollected { id: 4, total: 5 }));
        assert!(scene.active_challenge().is_none());
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn test_challenge_progress_counts_from_activation() {
        let mut level = flat_level();
        level.stars = vec![PointDef { x: 140.0, y: 940.0 }];
        level.challenges = vec![
            ChallengeDef {
                kind: ChallengeKind::Collect,
                target: 1,
                time_limit: None,
            },
            ChallengeDef {
                kind: ChallengeKind::Collect,
                target: 1,
                time_limit: None,
            },
        ];
        let mut scene = running(level);
        scene.update(&idle(), DT).unwrap();

        // The star that finished the first challenge doesn't count for the second
        let (challenge, progress) = scene.active_challenge().unwrap();
        assert_eq!(challenge.kind, ChallengeKind::Collect);
        assert_eq!(progress, 0);
    }

    #[test]
    fn test_challenge_time_limit_fails() {
        let mut level = flat_level();
        level.challenges = vec![
            ChallengeDef {
                kind: ChallengeKind::Crush,
                target: 3,
                time_limit: Some(0.5),
            },
            ChallengeDef {
                kind: ChallengeKind::Time,
                target: 1,
                time_limit: None,
            },
        ];
        let mut scene = running(level);
        for _ in 0..40 {
            scene.update(&idle(), DT).unwrap();
        }
        let events = scene.drain_events();
        assert!(events.contains(&GameEvent::ChallengeFailed(ChallengeKind::Crush)));
        assert_eq!(scene.active_challenge().unwrap().0.kind, ChallengeKind::Time);

        // Survive the time challenge: bonus without a failure
        let before = scene.time_remaining();
        for _ in 0..70 {
            scene.update(&idle(), DT).unwrap();
        }
        let events = scene.drain_events();
        assert!(events.contains(&GameEvent::ChallengeComplete(ChallengeKind::Time)));
        assert!(scene.time_remaining() > before);
    }

    #[test]
    fn test_fast_truck_crushes_obstacle() {
        let mut level = flat_level();
        level.obstacles = vec![ObstacleDef {
            x: 300.0,
            y: 920.0,
            w: 60.0,
            h: 40.0,
            points: 50,
        }];
        let mut scene = running(level);
        scene.truck_mut().body.velocity.x = 400.0;

        let right = InputSnapshot {
            right: true,
            ..Default::default()
        };
        for _ in 0..60 {
            scene.update(&right, DT).unwrap();
        }

        assert_eq!(scene.crushes(), 1);
        assert_eq!(scene.score(), 50);
        assert!(scene.obstacles()[0].crushed);
        assert!(scene.truck().rect().left() > 300.0);
        let events = scene.drain_events();
        assert!(events.contains(&GameEvent::ObstacleCrushed {
            id: 0,
            points: 50,
            total_score: 50
        }));
    }

    #[test]
    fn test_slow_truck_is_blocked() {
        let mut level = flat_level();
        level.obstacles = vec![ObstacleDef {
            x: 200.0,
            y: 920.0,
            w: 60.0,
            h: 40.0,
            points: 50,
        }];
        let mut scene = running(level);
        scene.truck_mut().body.velocity.x = 150.0;

        for _ in 0..60 {
            scene.update(&idle(), DT).unwrap();
        }

        assert_eq!(scene.crushes(), 0);
        assert!(!scene.obstacles()[0].crushed);
        assert!(scene.truck().rect().right() <= 200.0 + 1e-3);
    }

    #[test]
    fn test_timeout_ends_game() {
        let mut level = flat_level();
        level.time_limit = 1.0;
        let mut scene = running(level);
        for _ in 0..70 {
            scene.update(&idle(), DT).unwrap();
        }
        assert_eq!(scene.phase(), StadiumPhase::GameOver);
        assert_eq!(scene.time_remaining(), 0.0);
        let events = scene.drain_events();
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                score: 0,
                stars: 0,
                crushes: 0
            })
        );

        // Terminal until restart
        scene.update(&idle(), DT).unwrap();
        assert_eq!(scene.phase(), StadiumPhase::GameOver);
        scene.restart().unwrap();
        assert_eq!(scene.phase(), StadiumPhase::Ready);
        assert_eq!(scene.time_remaining(), 1.0);
    }

    #[test]
    fn test_pause_toggles_on_press_and_freezes() {
        let mut scene = running(flat_level());
        let press = InputSnapshot {
            pause: true,
            ..Default::default()
        };

        scene.update(&press, DT).unwrap();
        assert_eq!(scene.phase(), StadiumPhase::Paused);
        let frozen = scene.time_remaining();

        // Holding the key doesn't toggle again
        for _ in 0..10 {
            scene.update(&press, DT).unwrap();
        }
        assert_eq!(scene.phase(), StadiumPhase::Paused);
        assert_eq!(scene.time_remaining(), frozen);

        scene.update(&idle(), DT).unwrap();
        scene.update(&press, DT).unwrap();
        assert_eq!(scene.phase(), StadiumPhase::Running);
    }

    #[test]
    fn test_ready_does_not_tick() {
        let mut scene = StadiumScene::new(Vec2::new(800.0, 600.0), 3);
        scene.init(flat_level()).unwrap();
        scene.update(&idle(), DT).unwrap();
        assert_eq!(scene.phase(), StadiumPhase::Ready);
        assert_eq!(scene.time_remaining(), 60.0);
    }

    #[test]
    fn test_truck_climbs_ramp() {
        let mut level = flat_level();
        level.ramps = vec![RampDef {
            x: 300.0,
            y: 960.0,
            width: 400.0,
            height: 100.0,
            facing: RampFacing::Right,
        }];
        let mut scene = running(level);
        let right = InputSnapshot {
            right: true,
            ..Default::default()
        };

        let mut highest = f32::MAX;
        for _ in 0..90 {
            scene.update(&right, DT).unwrap();
            highest = highest.min(scene.truck().rect().bottom());
        }
        // Got well above the ground line on the way up
        assert!(highest < 920.0);
    }

    #[test]
    fn test_ramp_surface() {
        let ramp = Ramp {
            x: 0.0,
            base_y: 100.0,
            width: 200.0,
            height: 50.0,
            facing: RampFacing::Right,
        };
        assert_eq!(ramp.surface_y(0.0), Some(100.0));
        assert_eq!(ramp.surface_y(200.0), Some(50.0));
        assert_eq!(ramp.surface_y(201.0), None);
        assert!(ramp.angle() < 0.0);

        let left = Ramp {
            facing: RampFacing::Left,
            ..ramp
        };
        assert_eq!(left.surface_y(0.0), Some(50.0));
        assert!(left.angle() > 0.0);
    }

    #[test]
    fn test_render_balanced_with_overlay_when_paused() {
        let mut scene = running(crate::level::demo_stadium_level());
        let mut surface = RecordingSurface::new();
        scene.render(&mut surface);
        assert!(surface.is_balanced());
        let overlay = |c: &DrawCommand| *c == DrawCommand::FillColor(colors::OVERLAY);
        assert_eq!(surface.count(overlay), 0);

        scene.pause();
        surface.clear();
        scene.render(&mut surface);
        assert!(surface.is_balanced());
        assert_eq!(surface.count(overlay), 1);
    }
}
