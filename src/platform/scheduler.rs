//! Frame scheduler
//!
//! The host (browser `requestAnimationFrame`, a native event loop, or a
//! simulated clock) calls [`Scheduler::on_frame`] with a millisecond
//! timestamp. Each frame runs `update(dt)` unless paused and then always
//! `render()`. An update error stops the loop and is returned to the host.

use thiserror::Error;

use crate::consts::MAX_DELTA_TIME;

/// Opaque id of a pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Something that can schedule and cancel the next animation frame
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// The per-frame work driven by the scheduler
pub trait LoopTarget {
    type Error;

    fn update(&mut self, dt: f32) -> Result<(), Self::Error>;
    fn render(&mut self);
}

#[derive(Debug, Error)]
pub enum LoopError<E: std::error::Error + 'static> {
    #[error("update failed, loop stopped: {0}")]
    Update(#[source] E),
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Upper bound on the delta handed to `update` (seconds)
    pub max_delta_time: f32,
    /// Length of the FPS sampling window (seconds)
    pub fps_window: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_delta_time: MAX_DELTA_TIME,
            fps_window: 1.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
    running: bool,
    paused: bool,
    last_timestamp: Option<f64>,
    pending: Option<FrameHandle>,
    frames_in_window: u32,
    window_elapsed: f32,
    fps: f32,
    frame_count: u64,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn start(&mut self, host: &mut dyn FrameHost) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_timestamp = None;
        self.pending = Some(host.request_frame());
        log::info!("Scheduler started");
    }

    /// Stop ticking and cancel the pending frame; safe to call repeatedly
    pub fn stop(&mut self, host: &mut dyn FrameHost) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        log::info!("Scheduler stopped after {} frames", self.frame_count);
    }

    /// Skip updates but keep rendering
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Don't hand the scene the whole time spent paused
            self.last_timestamp = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Run one frame. `timestamp` is in milliseconds.
    pub fn on_frame<T>(
        &mut self,
        timestamp: f64,
        host: &mut dyn FrameHost,
        target: &mut T,
    ) -> Result<(), LoopError<T::Error>>
    where
        T: LoopTarget,
        T::Error: std::error::Error + 'static,
    {
        if !self.running {
            return Ok(());
        }
        self.pending = None;

        let delta = match self.last_timestamp {
            Some(last) => (((timestamp - last) / 1000.0) as f32).clamp(0.0, self.config.max_delta_time),
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp);
        self.frame_count += 1;
        self.track_fps(delta);

        if !self.paused {
            if let Err(e) = target.update(delta) {
                log::error!("Update failed on frame {}, stopping loop", self.frame_count);
                self.stop(host);
                return Err(LoopError::Update(e));
            }
        }

        target.render();

        if self.running {
            self.pending = Some(host.request_frame());
        }
        Ok(())
    }

    fn track_fps(&mut self, delta: f32) {
        self.frames_in_window += 1;
        self.window_elapsed += delta;
        if self.window_elapsed >= self.config.fps_window {
            self.fps = self.frames_in_window as f32 / self.window_elapsed;
            self.frames_in_window = 0;
            self.window_elapsed = 0.0;
        }
    }
}
