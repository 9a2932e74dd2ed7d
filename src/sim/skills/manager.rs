//! Owned skills, skill slots and the auto-cast policy

use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use serde::Serialize;

use super::catalog::{SKILLS, find_template};
use super::effects::{BattleView, EffectCtx};
use super::{SkillInstance, SkillTemplate};
use crate::audio::SoundId;
use crate::consts::*;
use crate::sim::entity::Enemy;
use crate::sim::events::{SimEvent, SimEvents};
use crate::sim::player::{Player, StatBonuses};

/// One equipped active skill
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSlot {
    pub slot_index: usize,
    pub skill: SkillInstance,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillManager {
    /// Active skills, in slot order. Reset every battle.
    pub slots: Vec<SkillSlot>,
    /// Passive skills. Persisted across battles.
    pub passives: Vec<SkillInstance>,
    pub auto_cast: bool,
    auto_cast_timer: f32,
}

impl Default for SkillManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillManager {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            passives: Vec::new(),
            auto_cast: true,
            auto_cast_timer: 0.0,
        }
    }

    fn find_owned(&self, id: &str) -> Option<&SkillInstance> {
        self.slots
            .iter()
            .map(|s| &s.skill)
            .chain(self.passives.iter())
            .find(|s| s.id == id)
    }

    fn find_owned_mut(&mut self, id: &str) -> Option<&mut SkillInstance> {
        self.slots
            .iter_mut()
            .map(|s| &mut s.skill)
            .chain(self.passives.iter_mut())
            .find(|s| s.id == id)
    }

    /// Level of an owned skill
    pub fn owned_level(&self, id: &str) -> Option<u32> {
        self.find_owned(id).map(|s| s.level)
    }

    /// Acquire a skill, or level it up if already owned. False when the id
    /// is unknown, the skill is maxed, or every active slot is taken.
    /// Passive changes only take effect once the caller re-applies
    /// `passive_bonuses`.
    pub fn acquire(&mut self, id: &str) -> bool {
        let Some(template) = find_template(id) else {
            log::warn!("Unknown skill '{}'", id);
            return false;
        };
        if let Some(owned) = self.find_owned_mut(id) {
            let levelled = owned.level_up();
            if levelled {
                log::info!("{} -> level {}", template.name, owned.level);
            }
            return levelled;
        }

        if template.is_passive() {
            self.passives.push(SkillInstance::new(template));
        } else {
            if self.slots.len() >= MAX_ACTIVE_SKILLS {
                return false;
            }
            self.slots.push(SkillSlot {
                slot_index: self.slots.len(),
                skill: SkillInstance::new(template),
            });
        }
        log::info!("Acquired {}", template.name);
        true
    }

    /// Combined stat bonuses of every owned passive
    pub fn passive_bonuses(&self) -> StatBonuses {
        self.passives
            .iter()
            .map(|s| s.template.effect.passive_bonuses(s.level))
            .fold(StatBonuses::default(), |acc, b| acc.merge(&b))
    }

    /// Passive levels keyed by id, for persistence
    pub fn passive_levels(&self) -> BTreeMap<String, u32> {
        self.passives
            .iter()
            .map(|s| (s.id.to_string(), s.level))
            .collect()
    }

    /// Replace owned passives with stored levels. Unknown ids and active
    /// skills are skipped; levels are clamped to the cap.
    pub fn load_passive_levels(&mut self, levels: &BTreeMap<String, u32>) {
        self.passives.clear();
        for (id, &level) in levels {
            let Some(template) = find_template(id) else {
                log::warn!("Ignoring stored passive '{}': unknown skill", id);
                continue;
            };
            if !template.is_passive() || level == 0 {
                continue;
            }
            let mut skill = SkillInstance::new(template);
            skill.level = level.min(template.max_level);
            self.passives.push(skill);
        }
    }

    /// Drop every active skill (new battle session)
    pub fn reset_actives(&mut self) {
        self.slots.clear();
        self.auto_cast_timer = 0.0;
    }

    /// Manually cast the skill in `slot_index`. False if empty or not ready.
    pub fn activate_slot(
        &mut self,
        slot_index: usize,
        player: &mut Player,
        enemies: &mut [Enemy],
        events: &mut SimEvents,
        rng: &mut dyn RngCore,
    ) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.slot_index == slot_index) else {
            return false;
        };
        cast(slot, player, enemies, events, rng)
    }

    /// Tick durations and cooldowns, run continuous effects, fire expiries,
    /// then give auto-cast its chance.
    pub fn update(
        &mut self,
        dt: f32,
        player: &mut Player,
        enemies: &mut [Enemy],
        events: &mut SimEvents,
        rng: &mut dyn RngCore,
    ) {
        for slot in &mut self.slots {
            let skill = &mut slot.skill;
            if skill.is_active {
                let mut ctx = EffectCtx {
                    player: &mut *player,
                    enemies: &mut *enemies,
                    events: &mut *events,
                    rng: &mut *rng,
                    source: skill.id,
                    level: skill.level,
                    dt,
                    remaining: skill.remaining_duration,
                };
                skill.template.effect.on_tick(&mut ctx);
            }
            if skill.tick(dt) {
                expire(skill, player, enemies, events, rng);
            }
        }

        if !self.auto_cast {
            return;
        }
        self.auto_cast_timer += dt;
        if self.auto_cast_timer >= AUTO_CAST_INTERVAL_MS {
            self.auto_cast_timer = 0.0;
            self.try_auto_cast(player, enemies, events, rng);
        }
    }

    /// Cast the first ready skill, in slot order, whose heuristic matches.
    /// At most one cast per call. Returns the slot cast.
    pub fn try_auto_cast(
        &mut self,
        player: &mut Player,
        enemies: &mut [Enemy],
        events: &mut SimEvents,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let chosen = {
            let view = BattleView::new(player, enemies);
            self.slots.iter().position(|slot| {
                slot.skill.is_ready()
                    && slot
                        .skill
                        .template
                        .effect
                        .wants_auto_cast(slot.skill.level, &view)
            })
        }?;
        let slot = &mut self.slots[chosen];
        log::debug!("Auto-casting {}", slot.skill.id);
        cast(slot, player, enemies, events, rng).then_some(slot.slot_index)
    }

    /// Run the exit phase of everything still active (battle teardown)
    pub fn end_all(
        &mut self,
        player: &mut Player,
        enemies: &mut [Enemy],
        events: &mut SimEvents,
        rng: &mut dyn RngCore,
    ) {
        for slot in &mut self.slots {
            let skill = &mut slot.skill;
            if skill.is_active {
                skill.is_active = false;
                skill.remaining_duration = 0.0;
                expire(skill, player, enemies, events, rng);
            }
        }
    }

    /// Whether the skill could still be acquired or levelled
    fn is_offerable(&self, template: &SkillTemplate, player_level: u32) -> bool {
        if template.unlock_level > player_level {
            return false;
        }
        match self.find_owned(template.id) {
            Some(owned) => !owned.is_maxed(),
            None => template.is_passive() || self.slots.len() < MAX_ACTIVE_SKILLS,
        }
    }

    /// Up to `n` distinct offers for the skill selection screen, weighted
    /// toward skills not yet owned.
    pub fn random_choices<R: Rng + ?Sized>(
        &self,
        n: usize,
        player_level: u32,
        rng: &mut R,
    ) -> Vec<&'static SkillTemplate> {
        let mut pool: Vec<(&'static SkillTemplate, f32)> = SKILLS
            .iter()
            .filter(|t| self.is_offerable(t, player_level))
            .map(|t| {
                let weight = if self.find_owned(t.id).is_some() {
                    OWNED_SKILL_WEIGHT
                } else {
                    UNOWNED_SKILL_WEIGHT
                };
                (t, weight)
            })
            .collect();

        let mut picks = Vec::with_capacity(n.min(pool.len()));
        while picks.len() < n && !pool.is_empty() {
            let total: f32 = pool.iter().map(|(_, w)| w).sum();
            let mut roll = rng.random::<f32>() * total;
            let mut index = pool.len() - 1;
            for (i, (_, weight)) in pool.iter().enumerate() {
                if roll < *weight {
                    index = i;
                    break;
                }
                roll -= weight;
            }
            picks.push(pool.swap_remove(index).0);
        }
        picks
    }
}

fn cast(
    slot: &mut SkillSlot,
    player: &mut Player,
    enemies: &mut [Enemy],
    events: &mut SimEvents,
    rng: &mut dyn RngCore,
) -> bool {
    let skill = &mut slot.skill;
    if !skill.activate() {
        return false;
    }
    let mut ctx = EffectCtx {
        player,
        enemies,
        events: &mut *events,
        rng,
        source: skill.id,
        level: skill.level,
        dt: 0.0,
        remaining: skill.remaining_duration,
    };
    skill.template.effect.on_cast(&mut ctx);

    log::info!("Cast {} (level {})", skill.template.name, skill.level);
    events.push(SimEvent::SkillCast {
        skill_id: skill.id.to_string(),
    });
    events.sound(SoundId::SkillCast);
    true
}

fn expire(
    skill: &SkillInstance,
    player: &mut Player,
    enemies: &mut [Enemy],
    events: &mut SimEvents,
    rng: &mut dyn RngCore,
) {
    let mut ctx = EffectCtx {
        player,
        enemies,
        events: &mut *events,
        rng,
        source: skill.id,
        level: skill.level,
        dt: 0.0,
        remaining: 0.0,
    };
    skill.template.effect.on_expire(&mut ctx);

    log::debug!("{} wore off", skill.template.name);
    events.push(SimEvent::SkillExpired {
        skill_id: skill.id.to_string(),
    });
    events.sound(SoundId::SkillEnd);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EnemyKind;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn crowd(n: u32) -> Vec<Enemy> {
        (0..n)
            .map(|i| Enemy::new(i + 1, EnemyKind::Basic, Vec2::new(100.0, i as f32 * 5.0), 1))
            .collect()
    }

    #[test]
    fn test_acquire_levels_and_caps_slots() {
        let mut skills = SkillManager::new();
        assert!(skills.acquire("power_surge"));
        assert!(skills.acquire("power_surge"));
        assert_eq!(skills.owned_level("power_surge"), Some(2));
        assert!(!skills.acquire("no_such_skill"));

        for id in [
            "overdrive",
            "emergency_repair",
            "energy_shield",
            "multi_shot",
            "time_warp",
        ] {
            assert!(skills.acquire(id));
        }
        assert_eq!(skills.slots.len(), MAX_ACTIVE_SKILLS);
        assert!(!skills.acquire("freeze_blast"));
        // Passives don't take slots
        assert!(skills.acquire("armor_plating"));
        assert_eq!(
            skills.slots.iter().map(|s| s.slot_index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_expiry_clears_flags_once() {
        let mut skills = SkillManager::new();
        skills.auto_cast = false;
        skills.acquire("explosive_rounds");
        let mut player = Player::new();
        let mut enemies: Vec<Enemy> = Vec::new();
        let mut events = SimEvents::new();
        let mut rng = Pcg32::seed_from_u64(1);

        assert!(skills.activate_slot(0, &mut player, &mut enemies, &mut events, &mut rng));
        assert_eq!(player.flags.explosive_shot, Some(72.0));
        assert!(!skills.activate_slot(0, &mut player, &mut enemies, &mut events, &mut rng));

        for _ in 0..100 {
            skills.update(100.0, &mut player, &mut enemies, &mut events, &mut rng);
        }
        assert_eq!(player.flags.explosive_shot, None);
        let expiries = events
            .iter()
            .filter(|e| matches!(e, SimEvent::SkillExpired { .. }))
            .count();
        assert_eq!(expiries, 1);
    }

    #[test]
    fn test_auto_cast_first_match_one_per_cycle() {
        let mut skills = SkillManager::new();
        // Heal won't match at full health; both boosts will
        skills.acquire("emergency_repair");
        skills.acquire("power_surge");
        skills.acquire("overdrive");
        let mut player = Player::new();
        let mut enemies = crowd(4);
        let mut events = SimEvents::new();
        let mut rng = Pcg32::seed_from_u64(2);

        skills.update(1999.0, &mut player, &mut enemies, &mut events, &mut rng);
        assert!(skills.slots.iter().all(|s| s.skill.is_ready()));

        skills.update(1.0, &mut player, &mut enemies, &mut events, &mut rng);
        assert!(skills.slots[0].skill.is_ready());
        assert!(!skills.slots[1].skill.is_ready());
        assert!(skills.slots[2].skill.is_ready());

        skills.update(2000.0, &mut player, &mut enemies, &mut events, &mut rng);
        assert!(!skills.slots[2].skill.is_ready());
    }

    #[test]
    fn test_auto_cast_disabled() {
        let mut skills = SkillManager::new();
        skills.auto_cast = false;
        skills.acquire("power_surge");
        let mut player = Player::new();
        let mut enemies = crowd(10);
        let mut events = SimEvents::new();
        let mut rng = Pcg32::seed_from_u64(2);
        skills.update(5000.0, &mut player, &mut enemies, &mut events, &mut rng);
        assert!(skills.slots[0].skill.is_ready());
    }

    #[test]
    fn test_random_choices_respect_gates() {
        let mut skills = SkillManager::new();
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..50 {
            let picks = skills.random_choices(SKILL_CHOICES, 1, &mut rng);
            assert_eq!(picks.len(), SKILL_CHOICES);
            assert!(picks.iter().all(|t| t.unlock_level <= 1));
            for (i, a) in picks.iter().enumerate() {
                assert!(picks[i + 1..].iter().all(|b| a.id != b.id));
            }
        }

        // Maxed skills drop out of the pool
        for _ in 0..10 {
            skills.acquire("armor_plating");
        }
        for _ in 0..50 {
            let picks = skills.random_choices(SKILL_CHOICES, 1, &mut rng);
            assert!(picks.iter().all(|t| t.id != "armor_plating"));
        }

        // Pool smaller than n
        let picks = skills.random_choices(50, 1, &mut rng);
        assert_eq!(picks.len(), 4);
    }

    #[test]
    fn test_random_choices_favour_unowned() {
        let mut skills = SkillManager::new();
        skills.acquire("power_surge");
        let mut rng = Pcg32::seed_from_u64(4);
        let owned = (0..2000)
            .filter(|_| skills.random_choices(1, 1, &mut rng)[0].id == "power_surge")
            .count();
        // 1 / (1 + 3 * 4) of draws
        assert!(owned > 80 && owned < 250, "{}", owned);
    }

    #[test]
    fn test_passive_levels_round_trip() {
        let mut skills = SkillManager::new();
        skills.acquire("weapon_mastery");
        skills.acquire("weapon_mastery");
        skills.acquire("rapid_reload");
        skills.acquire("power_surge");
        let stored = skills.passive_levels();
        assert_eq!(stored.len(), 2);

        let mut reloaded = SkillManager::new();
        reloaded.load_passive_levels(&stored);
        assert_eq!(reloaded.passive_bonuses(), skills.passive_bonuses());
        assert!(reloaded.slots.is_empty());
    }
}
