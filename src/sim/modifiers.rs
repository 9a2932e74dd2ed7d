//! Multiplicative stat modifiers
//!
//! Temporary buffs and debuffs are kept as a list of entries tagged with the
//! skill that applied them. The effective value of a stat is its base value
//! times the product of the matching entries, so ending a buff removes its
//! entry instead of dividing the stat back out.

use serde::{Deserialize, Serialize};

/// A stat that temporary modifiers can scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Damage,
    Speed,
    /// Rate at which shoot cooldowns recover
    FireRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Id of the skill that applied this entry
    pub source: String,
    pub stat: Stat,
    pub factor: f32,
    /// Self-expiring entries count down; `None` lives until removed
    pub remaining_ms: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierStack {
    entries: Vec<Modifier>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry that lasts until `remove_source` is called
    pub fn push(&mut self, source: &str, stat: Stat, factor: f32) {
        self.entries.push(Modifier {
            source: source.to_string(),
            stat,
            factor,
            remaining_ms: None,
        });
    }

    /// Add an entry that drops itself after `duration_ms`
    pub fn push_timed(&mut self, source: &str, stat: Stat, factor: f32, duration_ms: f32) {
        self.entries.push(Modifier {
            source: source.to_string(),
            stat,
            factor,
            remaining_ms: Some(duration_ms),
        });
    }

    /// Remove every entry applied by `source`. Returns how many were removed.
    pub fn remove_source(&mut self, source: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|m| m.source != source);
        before - self.entries.len()
    }

    pub fn has_source(&self, source: &str) -> bool {
        self.entries.iter().any(|m| m.source == source)
    }

    /// Product of every factor applying to `stat`
    pub fn multiplier(&self, stat: Stat) -> f32 {
        self.entries
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.factor)
            .product()
    }

    pub fn apply(&self, stat: Stat, base: f32) -> f32 {
        base * self.multiplier(stat)
    }

    /// Count down timed entries and drop the expired ones
    pub fn tick(&mut self, dt: f32) {
        for m in &mut self.entries {
            if let Some(remaining) = m.remaining_ms.as_mut() {
                *remaining -= dt;
            }
        }
        self.entries
            .retain(|m| m.remaining_ms.is_none_or(|remaining| remaining > 0.0));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
