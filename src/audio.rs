//! Sound triggers
//!
//! The simulation never plays audio itself. It names the sound that should
//! play and the host forwards it to whatever backend it has.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundId {
    /// Player tank fired
    PlayerShot,
    /// Enemy fired
    EnemyShot,
    /// Bullet landed on a target
    Hit,
    /// Area damage went off
    Explosion,
    /// Enemy destroyed
    EnemyDestroyed,
    /// One of the player's tanks destroyed
    TankDestroyed,
    /// Active skill cast
    SkillCast,
    /// Active skill ran out
    SkillEnd,
    /// Player levelled up
    LevelUp,
    /// Wave cleared
    WaveClear,
    /// Battle won
    Victory,
    /// Battle lost
    Defeat,
}

impl SoundId {
    /// String id the host's sound bank is keyed by
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundId::PlayerShot => "shoot",
            SoundId::EnemyShot => "enemy_shoot",
            SoundId::Hit => "hit",
            SoundId::Explosion => "explosion",
            SoundId::EnemyDestroyed => "enemy_destroyed",
            SoundId::TankDestroyed => "tank_destroyed",
            SoundId::SkillCast => "skill_cast",
            SoundId::SkillEnd => "skill_end",
            SoundId::LevelUp => "level_up",
            SoundId::WaveClear => "wave_clear",
            SoundId::Victory => "victory",
            SoundId::Defeat => "defeat",
        }
    }
}

/// Fire-and-forget audio backend
pub trait AudioSink {
    /// Play `sound_id` at `volume` (0.0 - 1.0)
    fn play(&mut self, sound_id: &str, volume: f32);
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    fn play(&mut self, sound_id: &str, volume: f32) {
        (**self).play(sound_id, volume);
    }
}

/// Audio sink that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogAudio {
    pub played: usize,
    pub last_volume: f32,
}

impl AudioSink for LogAudio {
    fn play(&mut self, sound_id: &str, volume: f32) {
        self.played += 1;
        self.last_volume = volume;
        log::trace!("play {} at {:.2}", sound_id, volume);
    }
}

/// Volume-gated wrapper around another sink
pub struct MixedAudio<S: AudioSink> {
    inner: S,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl<S: AudioSink> MixedAudio<S> {
    pub fn new(inner: S, master_volume: f32, sfx_volume: f32, muted: bool) -> Self {
        Self {
            inner,
            master_volume: master_volume.clamp(0.0, 1.0),
            sfx_volume: sfx_volume.clamp(0.0, 1.0),
            muted,
        }
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: AudioSink> AudioSink for MixedAudio<S> {
    fn play(&mut self, sound_id: &str, volume: f32) {
        let volume = (volume * self.effective_volume()).clamp(0.0, 1.0);
        if volume <= 0.0 {
            return;
        }
        self.inner.play(sound_id, volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_mix_drops_sounds() {
        let mut audio = MixedAudio::new(LogAudio::default(), 0.8, 1.0, true);
        audio.play(SoundId::Hit.as_str(), 1.0);
        assert_eq!(audio.inner().played, 0);

        let mut audio = MixedAudio::new(LogAudio::default(), 0.8, 1.0, false);
        audio.play(SoundId::Hit.as_str(), 1.0);
        assert_eq!(audio.inner().played, 1);
    }

    #[test]
    fn test_mix_scales_volume() {
        let mut audio = MixedAudio::new(LogAudio::default(), 0.5, 0.5, false);
        audio.play(SoundId::PlayerShot.as_str(), 1.0);
        assert!((audio.inner().last_volume - 0.25).abs() < 1e-6);

        let mut silent = MixedAudio::new(LogAudio::default(), 0.0, 1.0, false);
        silent.play(SoundId::PlayerShot.as_str(), 1.0);
        assert_eq!(silent.inner().played, 0);
    }
}
