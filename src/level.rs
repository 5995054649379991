//! Level configuration
//!
//! Plain data handed to `Scene::init`, usually deserialized from JSON.
//! Structural problems (no world, fewer than two waypoints, zero laps) are
//! errors. Out-of-range content is clamped or skipped with a warning so that
//! a bad content table can't crash gameplay.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::CHALLENGE_BONUS_TIME;
use crate::error::LevelError;
use crate::sim::ai::Difficulty;
use crate::sim::collision::Rect;

/// Truck tuning, each stat 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruckStats {
    #[serde(default = "default_stat")]
    pub speed: i32,
    #[serde(default = "default_stat")]
    pub jump: i32,
    #[serde(default = "default_stat")]
    pub handling: i32,
}

fn default_stat() -> i32 {
    3
}

impl Default for TruckStats {
    fn default() -> Self {
        Self {
            speed: 3,
            jump: 3,
            handling: 3,
        }
    }
}

impl TruckStats {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn clamped(&self) -> Self {
        Self {
            speed: self.speed.clamp(Self::MIN, Self::MAX),
            jump: self.jump.clamp(Self::MIN, Self::MAX),
            handling: self.handling.clamp(Self::MIN, Self::MAX),
        }
    }

    /// Stat mapped onto 0..=1
    pub fn unit(stat: i32) -> f32 {
        (stat.clamp(Self::MIN, Self::MAX) - Self::MIN) as f32 / (Self::MAX - Self::MIN) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldSize {
    pub width: f32,
    pub height: f32,
}

impl WorldSize {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    fn validate(&self) -> Result<(), LevelError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(LevelError::InvalidWorld {
                width: self.width,
                height: self.height,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointDef {
    pub x: f32,
    pub y: f32,
}

impl PointDef {
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectDef {
    pub x: f32,
    pub y: f32,
    #[serde(alias = "width")]
    pub w: f32,
    #[serde(alias = "height")]
    pub h: f32,
}

impl RectDef {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Finite position and a positive size
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite()) && self.w > 0.0 && self.h > 0.0
    }
}

/// Which way a ramp climbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampFacing {
    /// Low on the left, high on the right
    #[default]
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampDef {
    /// Left edge
    pub x: f32,
    /// Y of the ramp's base (usually the ground line)
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub facing: RampFacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDef {
    pub x: f32,
    pub y: f32,
    #[serde(alias = "width")]
    pub w: f32,
    #[serde(alias = "height")]
    pub h: f32,
    #[serde(default = "default_obstacle_points")]
    pub points: u64,
}

fn default_obstacle_points() -> u64 {
    50
}

impl ObstacleDef {
    pub fn rect_def(&self) -> RectDef {
        RectDef {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    /// Collect `target` stars
    Collect,
    /// Crush `target` obstacles
    Crush,
    /// Keep going for `target` seconds
    Time,
}

impl ChallengeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeKind::Collect => "collect",
            ChallengeKind::Crush => "crush",
            ChallengeKind::Time => "time",
        }
    }
}

/// Challenge as written in content; see [`Challenge`] for the checked form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChallengeDef {
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub target: i64,
    #[serde(default, rename = "timeLimit", alias = "time_limit")]
    pub time_limit: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub kind: ChallengeKind,
    pub target: u32,
    pub time_limit: Option<f32>,
}

impl ChallengeDef {
    /// Checked challenge, or None when the target is meaningless
    pub fn sanitize(&self) -> Option<Challenge> {
        if self.target <= 0 {
            log::warn!("Ignoring {} challenge with target {}", self.kind.as_str(), self.target);
            return None;
        }
        let time_limit = self.time_limit.filter(|t| t.is_finite() && *t > 0.0);
        Some(Challenge {
            kind: self.kind,
            target: self.target.min(u32::MAX as i64) as u32,
            time_limit,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StadiumLevel {
    #[serde(default)]
    pub name: String,
    pub world: WorldSize,
    #[serde(default = "default_time_limit")]
    pub time_limit: f32,
    #[serde(default = "default_bonus_time")]
    pub bonus_time: f32,
    #[serde(default = "default_ground_height")]
    pub ground_height: f32,
    pub start: PointDef,
    #[serde(default)]
    pub platforms: Vec<RectDef>,
    #[serde(default)]
    pub ramps: Vec<RampDef>,
    #[serde(default)]
    pub stars: Vec<PointDef>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
    #[serde(default)]
    pub challenges: Vec<ChallengeDef>,
    #[serde(default)]
    pub truck: TruckStats,
}

fn default_time_limit() -> f32 {
    60.0
}

fn default_bonus_time() -> f32 {
    CHALLENGE_BONUS_TIME
}

fn default_ground_height() -> f32 {
    40.0
}

impl StadiumLevel {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        self.world.validate()?;
        if !self.time_limit.is_finite() || self.time_limit <= 0.0 {
            return Err(LevelError::InvalidTimeLimit(self.time_limit));
        }
        if !self.start.is_finite() {
            return Err(LevelError::NonFinite("start"));
        }
        Ok(())
    }

    /// Y of the ground's top surface
    pub fn ground_y(&self) -> f32 {
        self.world.height - self.ground_height.clamp(0.0, self.world.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentDef {
    #[serde(default)]
    pub name: Option<String>,
    /// None takes the player's preferred difficulty
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub stats: TruckStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceLevel {
    #[serde(default)]
    pub name: String,
    pub world: WorldSize,
    pub waypoints: Vec<PointDef>,
    pub track_width: f32,
    pub laps: u32,
    #[serde(default = "default_countdown")]
    pub countdown: f32,
    #[serde(default)]
    pub boost_pads: Vec<RectDef>,
    #[serde(default)]
    pub opponents: Vec<OpponentDef>,
    #[serde(default)]
    pub truck: TruckStats,
}

fn default_countdown() -> f32 {
    crate::consts::RACE_COUNTDOWN
}

impl RaceLevel {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Structural checks; the track itself re-checks its geometry
    pub fn validate(&self) -> Result<(), LevelError> {
        self.world.validate()?;
        if self.waypoints.len() < 2 {
            return Err(LevelError::TooFewWaypoints(self.waypoints.len()));
        }
        if self.waypoints.iter().any(|w| !w.is_finite()) {
            return Err(LevelError::NonFinite("waypoint"));
        }
        if !self.track_width.is_finite() || self.track_width <= 0.0 {
            return Err(LevelError::InvalidTrackWidth(self.track_width));
        }
        if self.laps == 0 {
            return Err(LevelError::NoLaps);
        }
        Ok(())
    }

    pub fn waypoint_vecs(&self) -> Vec<Vec2> {
        self.waypoints.iter().map(|p| p.to_vec2()).collect()
    }
}

/// Small built-in arena used by the headless runner and tests
pub fn demo_stadium_level() -> StadiumLevel {
    StadiumLevel {
        name: "Demo Stadium".into(),
        world: WorldSize {
            width: 3000.0,
            height: 1000.0,
        },
        time_limit: 60.0,
        bonus_time: CHALLENGE_BONUS_TIME,
        ground_height: 40.0,
        start: PointDef { x: 200.0, y: 880.0 },
        platforms: vec![RectDef {
            x: 1200.0,
            y: 760.0,
            w: 300.0,
            h: 20.0,
        }],
        ramps: vec![RampDef {
            x: 800.0,
            y: 960.0,
            width: 200.0,
            height: 80.0,
            facing: RampFacing::Right,
        }],
        stars: vec![
            PointDef { x: 500.0, y: 920.0 },
            PointDef { x: 1350.0, y: 720.0 },
            PointDef { x: 2000.0, y: 920.0 },
        ],
        obstacles: vec![ObstacleDef {
            x: 1700.0,
            y: 920.0,
            w: 60.0,
            h: 40.0,
            points: 50,
        }],
        challenges: vec![
            ChallengeDef {
                kind: ChallengeKind::Collect,
                target: 3,
                time_limit: None,
            },
            ChallengeDef {
                kind: ChallengeKind::Crush,
                target: 1,
                time_limit: Some(30.0),
            },
        ],
        truck: TruckStats::default(),
    }
}

/// Loop with a chicane and one opponent per difficulty
pub fn demo_race_level() -> RaceLevel {
    let waypoints = [
        (800.0, 200.0),
        (1400.0, 200.0),
        (1750.0, 450.0),
        (1400.0, 800.0),
        (1000.0, 700.0),
        (600.0, 850.0),
        (250.0, 500.0),
        (400.0, 200.0),
    ]
    .iter()
    .map(|&(x, y)| PointDef { x, y })
    .collect();

    RaceLevel {
        name: "Demo Oval".into(),
        world: WorldSize {
            width: 2000.0,
            height: 1100.0,
        },
        waypoints,
        track_width: 160.0,
        laps: 2,
        countdown: crate::consts::RACE_COUNTDOWN,
        boost_pads: vec![RectDef {
            x: 1100.0,
            y: 180.0,
            w: 60.0,
            h: 40.0,
        }],
        opponents: [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .map(|difficulty| OpponentDef {
                name: Some(format!("{} bot", difficulty.as_str())),
                difficulty: Some(difficulty),
                stats: TruckStats::default(),
            })
            .collect(),
        truck: TruckStats::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_are_clamped() {
        let stats = TruckStats {
            speed: 9,
            jump: -2,
            handling: 3,
        }
        .clamped();
        assert_eq!(stats.speed, 5);
        assert_eq!(stats.jump, 1);
        assert_eq!(TruckStats::unit(1), 0.0);
        assert_eq!(TruckStats::unit(5), 1.0);
    }

    #[test]
    fn test_parse_stadium_json() {
        let json = r#"{
            "world": {"width": 2000, "height": 800},
            "start": {"x": 100, "y": 700},
            "stars": [{"x": 300, "y": 720}],
            "challenges": [
                {"type": "collect", "target": 5, "timeLimit": 20},
                {"type": "crush", "target": -3}
            ],
            "truck": {"speed": 7}
        }"#;
        let level = StadiumLevel::from_json(json).unwrap();
        assert_eq!(level.time_limit, 60.0);
        assert_eq!(level.bonus_time, 15.0);
        assert_eq!(level.truck.clamped().speed, 5);
        assert_eq!(level.truck.jump, 3);

        let checked: Vec<_> = level.challenges.iter().filter_map(|c| c.sanitize()).collect();
        assert_eq!(checked.len(), 1);
        assert_eq!(checked[0].kind, ChallengeKind::Collect);
        assert_eq!(checked[0].time_limit, Some(20.0));
    }

    #[test]
    fn test_invalid_world_rejected() {
        let json = r#"{"world": {"width": 0, "height": 800}, "start": {"x": 0, "y": 0}}"#;
        assert!(matches!(
            StadiumLevel::from_json(json),
            Err(LevelError::InvalidWorld { .. })
        ));
        assert!(matches!(StadiumLevel::from_json("{"), Err(LevelError::Parse(_))));
    }

    #[test]
    fn test_parse_race_json() {
        let json = r#"{
            "world": {"width": 1000, "height": 1000},
            "waypoints": [{"x": 100, "y": 100}, {"x": 900, "y": 100}, {"x": 500, "y": 900}],
            "trackWidth": 120,
            "laps": 3,
            "opponents": [{"difficulty": "hard"}, {}]
        }"#;
        let level = RaceLevel::from_json(json).unwrap();
        assert_eq!(level.countdown, 3.0);
        assert_eq!(level.opponents[0].difficulty, Some(Difficulty::Hard));
        assert_eq!(level.opponents[1].difficulty, None);
        assert_eq!(level.waypoint_vecs()[1], Vec2::new(900.0, 100.0));
    }

    #[test]
    fn test_race_validation() {
        let mut level = demo_race_level();
        assert!(level.validate().is_ok());
        level.laps = 0;
        assert!(matches!(level.validate(), Err(LevelError::NoLaps)));
        level.laps = 1;
        level.waypoints.truncate(1);
        assert!(matches!(level.validate(), Err(LevelError::TooFewWaypoints(1))));
    }

    #[test]
    fn test_demo_levels_are_valid() {
        assert!(demo_stadium_level().validate().is_ok());
        assert!(demo_race_level().validate().is_ok());
    }
}
