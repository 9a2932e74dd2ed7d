//! Outbound simulation events
//!
//! Everything the core wants the outside world to know about (sounds, hit
//! numbers, notifications) is queued here and drained by the host once per
//! frame. Nothing waits on the host's response.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioSink, SoundId};
use crate::consts::MAX_QUEUED_EVENTS;

/// Severity of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
}

/// Receives user-visible notifications
pub trait Notifier {
    fn notify(&mut self, message: &str, kind: NoticeKind);
}

/// Notifier that writes to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str, kind: NoticeKind) {
        log::info!("[{:?}] {}", kind, message);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Sound(SoundId),
    Notify { message: String, kind: NoticeKind },
    DamageNumber { pos: Vec2, amount: f32 },
    Explosion { pos: Vec2, radius: f32 },
    SkillCast { skill_id: String },
    SkillExpired { skill_id: String },
    WaveStarted { wave: u32 },
    WaveCleared { wave: u32 },
    LevelUp { level: u32 },
    BattleEnded { victory: bool },
}

/// Per-frame event queue. Bounded: when the host stops draining, the
/// oldest events are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimEvents {
    queue: VecDeque<SimEvent>,
    /// Events ever pushed, including dropped and drained ones
    pushed: u64,
    overflowed: bool,
}

impl SimEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        if self.queue.len() >= MAX_QUEUED_EVENTS {
            self.queue.pop_front();
            if !self.overflowed {
                self.overflowed = true;
                log::warn!("Event queue full, dropping oldest events until drained");
            }
        }
        self.queue.push_back(event);
        self.pushed += 1;
    }

    pub fn sound(&mut self, sound: SoundId) {
        self.push(SimEvent::Sound(sound));
    }

    pub fn notify(&mut self, message: impl Into<String>, kind: NoticeKind) {
        self.push(SimEvent::Notify {
            message: message.into(),
            kind,
        });
    }

    pub fn damage_number(&mut self, pos: Vec2, amount: f32) {
        self.push(SimEvent::DamageNumber { pos, amount });
    }

    pub fn explosion(&mut self, pos: Vec2, radius: f32) {
        self.push(SimEvent::Explosion { pos, radius });
    }

    /// Position marker for `since`
    pub fn mark(&self) -> u64 {
        self.pushed
    }

    /// Events pushed after `mark` that are still queued
    pub fn since(&self, mark: u64) -> impl Iterator<Item = &SimEvent> {
        let oldest = self.pushed - self.queue.len() as u64;
        let skip = mark.saturating_sub(oldest) as usize;
        self.queue.iter().skip(skip)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.queue.iter()
    }

    /// Take all queued events, leaving the queue empty
    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.overflowed = false;
        self.queue.drain(..).collect()
    }

    /// Forward queued sounds and notifications to the host sinks.
    /// Returns the remaining (visual/state) events for the renderer.
    pub fn dispatch(
        &mut self,
        audio: &mut dyn AudioSink,
        notifier: &mut dyn Notifier,
    ) -> Vec<SimEvent> {
        let mut rest = Vec::new();
        for event in self.drain() {
            match event {
                SimEvent::Sound(sound) => audio.play(sound.as_str(), 1.0),
                SimEvent::Notify { message, kind } => notifier.notify(&message, kind),
                other => rest.push(other),
            }
        }
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LogAudio;

    #[derive(Default)]
    struct Collect(Vec<String>);

    impl Notifier for Collect {
        fn notify(&mut self, message: &str, _kind: NoticeKind) {
            self.0.push(message.to_string());
        }
    }

    #[test]
    fn test_dispatch_routes_sinks() {
        let mut events = SimEvents::new();
        events.sound(SoundId::Hit);
        events.notify("Wave 1", NoticeKind::Info);
        events.damage_number(Vec2::ZERO, 5.0);

        let mut audio = LogAudio::default();
        let mut notes = Collect::default();
        let rest = events.dispatch(&mut audio, &mut notes);

        assert_eq!(audio.played, 1);
        assert_eq!(notes.0, vec!["Wave 1".to_string()]);
        assert_eq!(rest.len(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_undrained_queue_is_bounded() {
        let mut events = SimEvents::new();
        for i in 0..MAX_QUEUED_EVENTS + 10 {
            events.damage_number(Vec2::ZERO, i as f32);
        }
        assert_eq!(events.len(), MAX_QUEUED_EVENTS);
        // Oldest went first
        assert_eq!(
            events.iter().next(),
            Some(&SimEvent::DamageNumber {
                pos: Vec2::ZERO,
                amount: 10.0
            })
        );

        let mark = events.mark();
        events.explosion(Vec2::ONE, 5.0);
        let fresh: Vec<_> = events.since(mark).collect();
        assert_eq!(fresh, vec![&SimEvent::Explosion { pos: Vec2::ONE, radius: 5.0 }]);

        events.drain();
        assert!(events.is_empty());
        assert_eq!(events.since(mark).count(), 0);
    }
}
