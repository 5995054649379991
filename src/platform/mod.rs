//! Platform-facing layer
//!
//! Handles the boundary with the host:
//! - Frame scheduling (host animation callback → update/render)
//! - The immutable per-frame input snapshot

pub mod input;
pub mod scheduler;

pub use input::{InputSnapshot, Touch};
pub use scheduler::{FrameHandle, FrameHost, LoopError, LoopTarget, Scheduler, SchedulerConfig};
