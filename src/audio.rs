//! Sound cue bus
//!
//! Scenes emit cues through an `AudioBus` they are handed at construction;
//! there is no global audio context. Synthesis belongs to the host, which
//! plugs in an `AudioSink`.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Truck left the ground
    Jump,
    /// Truck bumped into something solid
    Bump,
    StarCollect,
    /// Obstacle flattened
    Crush,
    ChallengeComplete,
    ChallengeFailed,
    GameOver,
    /// Once per countdown second
    CountdownBeep,
    RaceStart,
    Boost,
    LapComplete,
    Finish,
}

/// Where cues end up
pub trait AudioSink {
    /// `gain` is already scaled by master/sfx volume and never zero
    fn play(&mut self, effect: SoundEffect, gain: f32);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect, _gain: f32) {}
}

/// Logs cues at debug level, handy for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect, gain: f32) {
        log::debug!("sfx {:?} gain {:.2}", effect, gain);
    }
}

/// Volume-aware handle over a sink
pub struct AudioBus {
    sink: Box<dyn AudioSink>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioBus {
    fn default() -> Self {
        Self::new(Box::new(NullAudio))
    }
}

impl std::fmt::Debug for AudioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBus")
            .field("master_volume", &self.master_volume)
            .field("sfx_volume", &self.sfx_volume)
            .field("muted", &self.muted)
            .finish_non_exhaustive()
    }
}

impl AudioBus {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    pub fn from_settings(sink: Box<dyn AudioSink>, settings: &Settings) -> Self {
        let mut bus = Self::new(sink);
        bus.apply_settings(settings);
        bus
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = if vol.is_finite() { vol.clamp(0.0, 1.0) } else { 0.0 };
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = if vol.is_finite() { vol.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.sink.play(effect, vol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Capture(Rc<RefCell<Vec<(SoundEffect, f32)>>>);

    impl AudioSink for Capture {
        fn play(&mut self, effect: SoundEffect, gain: f32) {
            self.0.borrow_mut().push((effect, gain));
        }
    }

    #[test]
    fn test_volume_scales_gain() {
        let capture = Capture::default();
        let mut bus = AudioBus::new(Box::new(capture.clone()));
        bus.set_master_volume(0.5);
        bus.set_sfx_volume(0.5);
        bus.play(SoundEffect::Crush);
        assert_eq!(capture.0.borrow().as_slice(), &[(SoundEffect::Crush, 0.25)]);
    }

    #[test]
    fn test_muted_bus_is_silent() {
        let capture = Capture::default();
        let mut bus = AudioBus::new(Box::new(capture.clone()));
        bus.set_muted(true);
        bus.play(SoundEffect::Jump);
        bus.set_muted(false);
        bus.set_master_volume(0.0);
        bus.play(SoundEffect::Jump);
        assert!(capture.0.borrow().is_empty());
    }

    #[test]
    fn test_settings_apply() {
        let settings = Settings {
            master_volume: 2.0,
            sfx_volume: f32::NAN,
            ..Default::default()
        };
        let bus = AudioBus::from_settings(Box::new(NullAudio), &settings);
        assert_eq!(bus.effective_volume(), 0.0);
        assert_eq!(bus.master_volume, 1.0);
    }
}
