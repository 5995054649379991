//! Simulation module
//!
//! All gameplay logic lives here. It stays deterministic and host-agnostic:
//! - Time only enters through `update(dt)`
//! - Seeded RNG only, owned by the component that draws from it
//! - Stable iteration order (entity vectors, never hash order)
//! - Drawing goes through the `Surface` trait, input through `InputSnapshot`

pub mod ai;
pub mod boost_pad;
pub mod camera;
pub mod collision;
pub mod events;
pub mod physics;
pub mod race;
pub mod stadium;
pub mod track;
pub mod truck;
pub mod vector;

pub use ai::{AiCommand, AiController, AiParams, AiView, Difficulty};
pub use boost_pad::BoostPad;
pub use camera::{Camera, CameraConfig};
pub use collision::{Circle, CollisionResult, Rect};
pub use events::{GameEvent, RaceResult};
pub use physics::{Physics, PhysicsBody, PhysicsConfig};
pub use race::{RacePhase, RaceScene};
pub use stadium::{StadiumPhase, StadiumScene};
pub use track::Track;
pub use truck::{RaceTruck, StadiumTruck, TruckId};
pub use vector::VecExt;

use crate::error::{LevelError, SimError};
use crate::platform::{InputSnapshot, LoopTarget};
use crate::renderer::Surface;

/// A game mode the host can load, tick and draw
pub trait Scene {
    type Level;

    fn init(&mut self, level: Self::Level) -> Result<(), LevelError>;
    /// Leave the pre-game state, where the mode has one
    fn start(&mut self);
    fn update(&mut self, input: &InputSnapshot, dt: f32) -> Result<(), SimError>;
    fn render(&self, surface: &mut dyn Surface);
    fn drain_events(&mut self) -> Vec<GameEvent>;
    /// Reached the terminal state
    fn is_over(&self) -> bool;
}

/// Binds a scene to a surface and the latest input so the scheduler can
/// drive it. The host refreshes `input` before each frame and collects
/// `events` afterwards.
pub struct SceneLoop<S, R> {
    pub scene: S,
    pub surface: R,
    pub input: InputSnapshot,
    pub events: Vec<GameEvent>,
}

impl<S: Scene, R: Surface> SceneLoop<S, R> {
    pub fn new(scene: S, surface: R) -> Self {
        Self {
            scene,
            surface,
            input: InputSnapshot::default(),
            events: Vec::new(),
        }
    }
}

impl<S: Scene, R: Surface> LoopTarget for SceneLoop<S, R> {
    type Error = SimError;

    fn update(&mut self, dt: f32) -> Result<(), SimError> {
        self.scene.update(&self.input, dt)?;
        self.events.extend(self.scene.drain_events());
        Ok(())
    }

    fn render(&mut self) {
        self.scene.render(&mut self.surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FrameHandle, FrameHost, LoopError, Scheduler, SchedulerConfig};
    use crate::renderer::RecordingSurface;
    use glam::Vec2;

    #[derive(Default)]
    struct ManualHost {
        next: u64,
    }

    impl FrameHost for ManualHost {
        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            FrameHandle(self.next)
        }

        fn cancel_frame(&mut self, _handle: FrameHandle) {}
    }

    #[test]
    fn test_scheduler_drives_stadium() {
        let mut scene = StadiumScene::new(Vec2::new(800.0, 600.0), 1);
        scene.init(crate::level::demo_stadium_level()).unwrap();
        scene.start();
        let mut target = SceneLoop::new(scene, RecordingSurface::new());
        let mut host = ManualHost::default();
        let mut scheduler = Scheduler::new(SchedulerConfig::default());

        scheduler.start(&mut host);
        for frame in 0..120 {
            target.surface.clear();
            scheduler
                .on_frame(frame as f64 * 1000.0 / 60.0, &mut host, &mut target)
                .unwrap();
            assert!(target.surface.is_balanced());
        }
        assert!(target.scene.elapsed() > 1.9);
        assert!(target.scene.time_remaining() < 58.1);
    }

    #[test]
    fn test_update_error_stops_loop() {
        let scene = RaceScene::new(Vec2::new(800.0, 600.0), 1);
        let mut target = SceneLoop::new(scene, RecordingSurface::new());
        let mut host = ManualHost::default();
        let mut scheduler = Scheduler::new(SchedulerConfig::default());

        scheduler.start(&mut host);
        let err = scheduler.on_frame(0.0, &mut host, &mut target);
        assert!(matches!(err, Err(LoopError::Update(SimError::NotInitialized))));
        assert!(!scheduler.is_running());
        assert!(scheduler.pending_frame().is_none());
        // Nothing was drawn for the failed frame
        assert!(target.surface.commands.is_empty());
    }
}
