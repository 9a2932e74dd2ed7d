//! Active and passive skills
//!
//! A `SkillTemplate` is static catalog data. A `SkillInstance` is one owned
//! copy of it with a level and, for active skills, the
//! Ready -> Active -> Ready cooldown state machine.

mod catalog;
mod effects;
mod manager;

pub use catalog::{SKILLS, find_template};
pub use effects::{BattleView, EffectCtx, EffectKind, SkillEffect};
pub use manager::{SkillManager, SkillSlot};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkillType {
    Active,
    Passive,
}

/// Static definition of a skill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub skill_type: SkillType,
    pub effect: SkillEffect,
    /// Active time (ms); 0 for instant skills and passives
    pub duration: f32,
    /// Cooldown (ms); 0 for passives
    pub cooldown: f32,
    pub max_level: u32,
    /// Player level required before the skill is offered
    pub unlock_level: u32,
}

impl SkillTemplate {
    pub fn is_passive(&self) -> bool {
        self.skill_type == SkillType::Passive
    }
}

/// An owned skill
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillInstance {
    #[serde(skip)]
    pub template: &'static SkillTemplate,
    pub id: &'static str,
    pub level: u32,
    pub is_active: bool,
    pub remaining_duration: f32,
    pub remaining_cooldown: f32,
}

impl SkillInstance {
    pub fn new(template: &'static SkillTemplate) -> Self {
        Self {
            template,
            id: template.id,
            level: 1,
            // Passives are always on
            is_active: template.is_passive(),
            remaining_duration: 0.0,
            remaining_cooldown: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.template.is_passive() && self.remaining_cooldown <= 0.0
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.template.max_level
    }

    /// Raise the level by one. False at the cap.
    pub fn level_up(&mut self) -> bool {
        if self.is_maxed() {
            return false;
        }
        self.level += 1;
        true
    }

    /// Enter the active state. Rejected (no state change) while cooling down.
    pub fn activate(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.remaining_cooldown = self.template.cooldown;
        self.remaining_duration = self.template.duration;
        self.is_active = self.template.duration > 0.0;
        true
    }

    /// Count down. Returns true on the tick the active phase ends.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.template.is_passive() {
            return false;
        }
        self.remaining_cooldown = (self.remaining_cooldown - dt).max(0.0);
        if self.is_active {
            self.remaining_duration -= dt;
            if self.remaining_duration <= 0.0 {
                self.remaining_duration = 0.0;
                self.is_active = false;
                return true;
            }
        }
        false
    }

    /// Cooldown progress in [0, 1] for the HUD (1 = ready)
    pub fn cooldown_progress(&self) -> f32 {
        if self.template.cooldown <= 0.0 {
            return 1.0;
        }
        1.0 - (self.remaining_cooldown / self.template.cooldown).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_round_trip() {
        let template = find_template("power_surge").unwrap();
        let mut skill = SkillInstance::new(template);
        assert!(skill.is_ready());
        assert!(skill.activate());
        assert!(!skill.is_ready());
        assert!(skill.is_active);

        // Activating again is a no-op
        let snapshot = skill.clone();
        assert!(!skill.activate());
        assert_eq!(skill, snapshot);

        let mut elapsed = 0.0;
        while !skill.is_ready() {
            skill.tick(100.0);
            elapsed += 100.0;
        }
        assert_eq!(elapsed, template.cooldown);
    }

    #[test]
    fn test_expiry_fires_once() {
        let template = find_template("overdrive").unwrap();
        let mut skill = SkillInstance::new(template);
        skill.activate();
        let mut expiries = 0;
        for _ in 0..200 {
            if skill.tick(50.0) {
                expiries += 1;
            }
        }
        assert_eq!(expiries, 1);
        assert!(!skill.is_active);
    }

    #[test]
    fn test_passive_never_activates() {
        let template = find_template("armor_plating").unwrap();
        let mut skill = SkillInstance::new(template);
        assert!(skill.is_active);
        assert!(!skill.activate());
        assert!(!skill.tick(1000.0));
        assert_eq!(template.duration, 0.0);
        assert_eq!(template.cooldown, 0.0);
    }

    #[test]
    fn test_level_cap() {
        let template = find_template("time_warp").unwrap();
        let mut skill = SkillInstance::new(template);
        assert!(skill.level_up());
        assert!(skill.level_up());
        assert!(!skill.level_up());
        assert_eq!(skill.level, template.max_level);
    }
}
