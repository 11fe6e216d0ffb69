//! Sound cues emitted by the simulation
//!
//! The simulation never plays audio itself. It queues `SoundCue`s at the
//! moments they happen and the platform drains them into an `AudioSink`.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Player fired a shot
    Shot,
    /// Player threw a grenade
    GrenadeThrow,
    /// Anything exploded
    Explosion,
    /// An enemy started its stun countdown
    EnemyStunned,
    /// An enemy was removed and scored
    EnemyKilled,
    /// The player died
    PlayerKilled,
}

impl SoundEffect {
    /// Mix level before settings gain
    pub fn base_volume(&self) -> f32 {
        match self {
            SoundEffect::Shot => 0.5,
            SoundEffect::GrenadeThrow => 0.4,
            SoundEffect::Explosion => 0.9,
            SoundEffect::EnemyStunned => 0.6,
            SoundEffect::EnemyKilled => 0.7,
            SoundEffect::PlayerKilled => 1.0,
        }
    }
}

/// "Play effect X at volume/rate Y"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub effect: SoundEffect,
    pub volume: f32,
    /// Playback rate (1.0 = natural pitch)
    pub rate: f32,
}

impl SoundCue {
    pub fn new(effect: SoundEffect) -> Self {
        Self {
            effect,
            volume: effect.base_volume(),
            rate: 1.0,
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// Scale volume by a settings gain
    pub fn scaled(mut self, gain: f32) -> Self {
        self.volume = (self.volume * gain).clamp(0.0, 1.0);
        self
    }
}

/// Audio collaborator
pub trait AudioSink {
    fn play(&mut self, cue: &SoundCue);
}

/// Records cues, for headless runs and tests
#[derive(Debug, Default)]
pub struct CueLog {
    pub cues: Vec<SoundCue>,
}

impl AudioSink for CueLog {
    fn play(&mut self, cue: &SoundCue) {
        log::trace!("sound {:?} vol={:.2} rate={:.2}", cue.effect, cue.volume, cue.rate);
        self.cues.push(*cue);
    }
}

impl CueLog {
    pub fn count(&self, effect: SoundEffect) -> usize {
        self.cues.iter().filter(|c| c.effect == effect).count()
    }
}
