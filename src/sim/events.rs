//! Outbound gameplay events
//!
//! Scenes queue these during `update`; the host drains them after each frame
//! to drive HUD, audio cues and result screens.

use serde::{Deserialize, Serialize};

use super::truck::TruckId;
use crate::level::ChallengeKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub truck_id: TruckId,
    /// 1-based finishing place
    pub position: usize,
    /// Race clock at the finish, in seconds
    pub time: f32,
    pub is_player: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    StarCollected { id: u32, total: u32 },
    ObstacleCrushed { id: u32, points: u64, total_score: u64 },
    ChallengeComplete(ChallengeKind),
    ChallengeFailed(ChallengeKind),
    GameOver { score: u64, stars: u32, crushes: u32 },
    RaceStarted,
    LapCompleted { truck_id: TruckId, lap: u32 },
    TruckFinished { truck_id: TruckId, position: usize, time: f32 },
    RaceComplete(Vec<RaceResult>),
}
