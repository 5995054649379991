//! Truck Rally entry point
//!
//! The native build runs a scene headless against a simulated 60 fps clock
//! and logs what happened. Usage:
//!
//! ```text
//! truck-rally [race|stadium] [level.json] [settings.json]
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fs;

    use glam::Vec2;
    use thiserror::Error;

    use truck_rally::audio::{AudioBus, LogAudio};
    use truck_rally::level::{RaceLevel, StadiumLevel, demo_race_level, demo_stadium_level};
    use truck_rally::platform::{FrameHandle, FrameHost, InputSnapshot, LoopError, Scheduler, SchedulerConfig};
    use truck_rally::renderer::RecordingSurface;
    use truck_rally::sim::{GameEvent, RaceScene, Scene, SceneLoop, StadiumScene};
    use truck_rally::{LevelError, Settings, SimError};

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up on a run after this much simulated time (seconds)
    const TIME_CAP: f64 = 600.0;

    #[derive(Debug, Error)]
    pub enum RunError {
        #[error("unknown mode '{0}', expected 'race' or 'stadium'")]
        UnknownMode(String),
        #[error("could not read {path}: {source}")]
        Read {
            path: String,
            #[source]
            source: std::io::Error,
        },
        #[error(transparent)]
        Level(#[from] LevelError),
        #[error(transparent)]
        Loop(#[from] LoopError<SimError>),
    }

    /// Frame host for a simulated clock; requests are just numbered
    #[derive(Default)]
    struct SimulatedHost {
        next: u64,
    }

    impl FrameHost for SimulatedHost {
        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            FrameHandle(self.next)
        }

        fn cancel_frame(&mut self, _handle: FrameHandle) {}
    }

    fn read(path: &str) -> Result<String, RunError> {
        fs::read_to_string(path).map_err(|source| RunError::Read {
            path: path.to_string(),
            source,
        })
    }

    pub fn run(args: &[String]) -> Result<(), RunError> {
        let mode = args.first().map(String::as_str).unwrap_or("race");
        let level_path = args.get(1).map(String::as_str);
        let settings_json = args.get(2).map(|p| read(p)).transpose()?;
        let settings = Settings::load_or_default(settings_json.as_deref());
        let audio = AudioBus::from_settings(Box::new(LogAudio), &settings);
        let seed = 0x7275_636b;

        match mode {
            "race" => {
                let level = match level_path {
                    Some(path) => RaceLevel::from_json(&read(path)?)?,
                    None => demo_race_level(),
                };
                log::info!("Race '{}': {} laps, {} opponents", level.name, level.laps, level.opponents.len());
                let mut scene = RaceScene::new(VIEWPORT, seed)
                    .with_settings(settings)
                    .with_audio(audio)
                    .with_autopilot(true);
                scene.init(level)?;
                let scene = drive(scene, |_| InputSnapshot::default())?;
                for result in scene.results() {
                    log::info!(
                        "P{} truck {}{} in {:.2}s",
                        result.position,
                        result.truck_id,
                        if result.is_player { " (player)" } else { "" },
                        result.time
                    );
                }
            }
            "stadium" => {
                let level = match level_path {
                    Some(path) => StadiumLevel::from_json(&read(path)?)?,
                    None => demo_stadium_level(),
                };
                log::info!("Stadium '{}': {:.0}s on the clock", level.name, level.time_limit);
                let mut scene = StadiumScene::new(VIEWPORT, seed)
                    .with_settings(settings)
                    .with_audio(audio);
                scene.init(level)?;
                // Floor it and hop every couple of seconds
                let scene = drive(scene, |frame| InputSnapshot {
                    right: true,
                    jump: frame % 120 == 0,
                    ..Default::default()
                })?;
                log::info!(
                    "Score {} with {} stars and {} crushes",
                    scene.score(),
                    scene.stars_collected(),
                    scene.crushes()
                );
            }
            other => return Err(RunError::UnknownMode(other.to_string())),
        }
        Ok(())
    }

    /// Tick `scene` until it ends or the time cap runs out, logging events
    fn drive<S: Scene>(mut scene: S, input: impl Fn(u64) -> InputSnapshot) -> Result<S, RunError> {
        scene.start();
        let mut target = SceneLoop::new(scene, RecordingSurface::new());
        let mut host = SimulatedHost::default();
        let mut scheduler = Scheduler::new(SchedulerConfig::default());

        scheduler.start(&mut host);
        let mut frame = 0u64;
        while !target.scene.is_over() && (frame as f64) * FRAME_MS < TIME_CAP * 1000.0 {
            target.input = input(frame);
            target.surface.clear();
            scheduler.on_frame(frame as f64 * FRAME_MS, &mut host, &mut target)?;
            for event in target.events.drain(..) {
                log_event(&event);
            }
            frame += 1;
        }
        scheduler.stop(&mut host);

        if !target.scene.is_over() {
            log::warn!("Stopped at the {TIME_CAP}s cap before the scene ended");
        }
        log::info!(
            "Ran {} frames, last frame drew {} commands",
            frame,
            target.surface.commands.len()
        );
        Ok(target.scene)
    }

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::LapCompleted { .. } | GameEvent::StarCollected { .. } => log::debug!("{:?}", event),
            _ => log::info!("{:?}", event),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Truck Rally (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = headless::run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives the library directly
}
