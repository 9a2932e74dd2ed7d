//! Battle orchestration
//!
//! `Battle` is the simulation context. It owns every piece of battle state
//! and steps it in a fixed order each frame:
//! input -> entities -> camera -> waves -> skills -> collisions -> battle end
//! -> visual effects. Collisions see this frame's movement and the end check
//! sees this frame's damage.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat;
use super::events::{NoticeKind, SimEvent, SimEvents};
use super::player::{MoveVector, Player, Progression, StatBonuses};
use super::skills::{SkillManager, SkillTemplate};
use super::wave::WaveManager;
use crate::audio::SoundId;
use crate::consts::*;
use crate::lerp;

/// Top-level screen the game is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scene {
    Menu,
    Battle,
    SkillSelection,
    Results,
    Base,
}

/// Battle difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleType {
    Training,
    Standard,
    Elite,
    BossRush,
}

impl BattleType {
    pub const ALL: [BattleType; 4] = [
        BattleType::Training,
        BattleType::Standard,
        BattleType::Elite,
        BattleType::BossRush,
    ];

    /// Reward multiplier
    pub fn multiplier(self) -> f64 {
        match self {
            BattleType::Training => 1.0,
            BattleType::Standard => 1.2,
            BattleType::Elite => 1.5,
            BattleType::BossRush => 2.0,
        }
    }

    /// Waves to clear for victory
    pub fn waves(self) -> u32 {
        match self {
            BattleType::Training => 3,
            BattleType::Standard => 5,
            BattleType::Elite => 8,
            BattleType::BossRush => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BattleType::Training => "Training",
            BattleType::Standard => "Standard",
            BattleType::Elite => "Elite",
            BattleType::BossRush => "Boss Rush",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BattleType::Training => "training",
            BattleType::Standard => "standard",
            BattleType::Elite => "elite",
            BattleType::BossRush => "boss_rush",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// End-of-battle payout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRewards {
    pub victory: bool,
    pub waves_cleared: u32,
    pub raw_score: u64,
    pub raw_experience: u64,
    pub total_multiplier: f64,
    pub final_score: u64,
    pub final_experience: u64,
    pub coins: u64,
}

impl BattleRewards {
    pub fn compute(
        battle_type: BattleType,
        raw_score: u64,
        raw_experience: u64,
        victory: bool,
        waves_cleared: u32,
    ) -> Self {
        let mut total_multiplier = battle_type.multiplier();
        if victory {
            total_multiplier *= COMPLETION_BONUS_MULTIPLIER;
        }
        let final_score = (raw_score as f64 * total_multiplier).floor() as u64;
        let final_experience = (raw_experience as f64 * total_multiplier).floor() as u64;
        Self {
            victory,
            waves_cleared,
            raw_score,
            raw_experience,
            total_multiplier,
            final_score,
            final_experience,
            coins: final_score / 4,
        }
    }
}

/// Per-frame input
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub movement: MoveVector,
    /// Manual fire
    pub shoot: bool,
    /// Manual skill cast request
    pub cast_slot: Option<usize>,
}

/// Player-facing switches that change how a battle plays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleOptions {
    pub auto_shoot: bool,
    pub auto_cast: bool,
    pub damage_numbers: bool,
    /// Camera snaps instead of easing
    pub reduced_motion: bool,
}

impl Default for BattleOptions {
    fn default() -> Self {
        Self {
            auto_shoot: true,
            auto_cast: true,
            damage_numbers: true,
            reduced_motion: false,
        }
    }
}

/// Follows the main tank
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec2,
}

impl Camera {
    pub fn follow(&mut self, target: Vec2, snap: bool) {
        if snap {
            self.pos = target;
        } else {
            self.pos = Vec2::new(
                lerp(self.pos.x, target.x, CAMERA_FOLLOW_LERP),
                lerp(self.pos.y, target.y, CAMERA_FOLLOW_LERP),
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisualKind {
    DamageNumber { amount: f32 },
    Explosion { radius: f32 },
}

/// Short-lived decoration for the renderer (not gameplay-affecting)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualEffect {
    pub kind: VisualKind,
    pub pos: Vec2,
    /// Remaining life (ms)
    pub life: f32,
    pub max_life: f32,
}

#[derive(Debug)]
pub struct Battle {
    pub seed: u64,
    rng: Pcg32,
    pub battle_type: BattleType,
    pub scene: Scene,
    pub options: BattleOptions,
    pub player: Player,
    pub waves: WaveManager,
    pub skills: SkillManager,
    pub events: SimEvents,
    pub camera: Camera,
    pub effects: Vec<VisualEffect>,
    /// Offers on the skill selection screen
    pub skill_choices: Vec<&'static SkillTemplate>,
    pub rewards: Option<BattleRewards>,
    /// Upgrade bonuses from the base screen; passives merge on top
    upgrade_bonuses: StatBonuses,
    /// Latch so a cleared wave raises exactly one interstitial
    wave_completed: bool,
    /// Battle time (ms)
    pub elapsed: f64,
}

impl Battle {
    pub fn new(seed: u64, progression: Progression) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            battle_type: BattleType::Standard,
            scene: Scene::Menu,
            options: BattleOptions::default(),
            player: Player::with_progression(progression),
            waves: WaveManager::new(),
            skills: SkillManager::new(),
            events: SimEvents::new(),
            camera: Camera::default(),
            effects: Vec::new(),
            skill_choices: Vec::new(),
            rewards: None,
            upgrade_bonuses: StatBonuses::default(),
            wave_completed: false,
            elapsed: 0.0,
        }
    }

    /// Recompute squad stats from base: upgrades, then passive skills
    pub fn apply_bonuses(&mut self, upgrade_bonuses: StatBonuses) {
        self.upgrade_bonuses = upgrade_bonuses;
        let bonuses = upgrade_bonuses.merge(&self.skills.passive_bonuses());
        self.player.apply_bonuses(&bonuses);
    }

    /// Begin a fresh battle at wave 1
    pub fn start(&mut self, battle_type: BattleType, seed: u64, upgrade_bonuses: StatBonuses) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.battle_type = battle_type;
        self.skills.reset_actives();
        self.skills.auto_cast = self.options.auto_cast;
        self.apply_bonuses(upgrade_bonuses);
        self.player.reset_for_battle();
        self.camera.pos = self.player.main_tank.hull.pos;
        self.effects.clear();
        self.skill_choices.clear();
        self.rewards = None;
        self.wave_completed = false;
        self.elapsed = 0.0;

        log::info!(
            "Starting {} battle ({} waves, seed {})",
            battle_type.name(),
            battle_type.waves(),
            seed
        );
        self.events.notify(
            format!("{} battle: survive {} waves", battle_type.name(), battle_type.waves()),
            NoticeKind::Info,
        );
        self.waves.start_wave(1, &mut self.events);
        self.scene = Scene::Battle;
    }

    /// Advance one frame. Does nothing outside the battle scene.
    pub fn step(&mut self, dt: f32, input: &TickInput) {
        if self.scene != Scene::Battle {
            return;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT_MS);
        self.elapsed += dt as f64;
        let first_event = self.events.mark();

        // Entities
        self.player.update(dt, input.movement);
        if self.options.auto_shoot {
            self.player.auto_shoot(dt, &self.waves.enemies, &mut self.events);
        }
        if input.shoot {
            self.player.manual_shoot(&self.waves.enemies, &mut self.events);
        }
        if let Some(slot) = input.cast_slot {
            self.cast_skill(slot);
        }

        self.camera
            .follow(self.player.main_tank.hull.pos, self.options.reduced_motion);

        self.waves
            .update(dt, &mut self.player, &mut self.rng, &mut self.events);

        self.skills.update(
            dt,
            &mut self.player,
            &mut self.waves.enemies,
            &mut self.events,
            &mut self.rng,
        );

        combat::resolve(&mut self.player, &mut self.waves.enemies, &mut self.events);

        self.check_battle_end();

        self.update_effects(dt, first_event);
    }

    /// Manually cast a slot. False if the slot is empty or cooling down.
    pub fn cast_skill(&mut self, slot_index: usize) -> bool {
        if self.scene != Scene::Battle {
            return false;
        }
        self.skills.activate_slot(
            slot_index,
            &mut self.player,
            &mut self.waves.enemies,
            &mut self.events,
            &mut self.rng,
        )
    }

    fn check_battle_end(&mut self) {
        if self.player.all_dead() {
            self.finish(false);
            return;
        }
        if self.wave_completed || !self.waves.is_wave_complete() {
            return;
        }
        self.wave_completed = true;

        let wave = self.waves.current_wave;
        let progression = &mut self.player.progression;
        progression.best_wave = progression.best_wave.max(wave);
        log::info!("Wave {} cleared", wave);
        self.events.push(SimEvent::WaveCleared { wave });
        self.events.sound(SoundId::WaveClear);

        if wave >= self.battle_type.waves() {
            self.finish(true);
            return;
        }

        // Difficulty stays wave-local: the squad starts every wave fresh
        self.player.restore_full();
        self.waves.pause();
        self.skill_choices =
            self.skills
                .random_choices(SKILL_CHOICES, self.player.progression.level, &mut self.rng);
        self.scene = Scene::SkillSelection;
    }

    /// Take offer `index` from the selection screen and start the next wave
    pub fn choose_skill(&mut self, index: usize) -> bool {
        if self.scene != Scene::SkillSelection {
            return false;
        }
        let Some(template) = self.skill_choices.get(index).copied() else {
            return false;
        };
        let acquired = self.skills.acquire(template.id);
        if acquired && template.is_passive() {
            let bonuses = self.upgrade_bonuses;
            self.apply_bonuses(bonuses);
        }
        if acquired {
            self.events
                .notify(format!("Learned {}", template.name), NoticeKind::Success);
        }
        self.next_wave();
        acquired
    }

    /// Decline every offer and start the next wave
    pub fn skip_skill(&mut self) {
        if self.scene == Scene::SkillSelection {
            self.next_wave();
        }
    }

    fn next_wave(&mut self) {
        self.skill_choices.clear();
        self.wave_completed = false;
        let next = self.waves.current_wave + 1;
        self.waves.start_wave(next, &mut self.events);
        self.events
            .notify(format!("Wave {}", next), NoticeKind::Info);
        self.scene = Scene::Battle;
    }

    fn finish(&mut self, victory: bool) {
        self.skills.end_all(
            &mut self.player,
            &mut self.waves.enemies,
            &mut self.events,
            &mut self.rng,
        );
        let waves_cleared = if victory {
            self.waves.current_wave
        } else {
            self.waves.current_wave.saturating_sub(1)
        };
        self.waves.clear();

        let rewards = BattleRewards::compute(
            self.battle_type,
            self.player.battle_score,
            self.player.battle_experience,
            victory,
            waves_cleared,
        );

        // Kills already paid out; top up to the final figures
        let top_up = rewards.coins.saturating_sub(self.player.battle_coins);
        let progression = &mut self.player.progression;
        progression.score += rewards.final_score.saturating_sub(rewards.raw_score);
        progression.coins = progression
            .coins
            .saturating_add(u32::try_from(top_up).unwrap_or(u32::MAX));
        self.player.battle_coins += top_up;
        let bonus_experience = rewards.final_experience.saturating_sub(rewards.raw_experience);
        self.player
            .gain_experience(bonus_experience as u32, &mut self.events);

        log::info!(
            "Battle over ({}): score {} x{:.2} = {}, {} coins",
            if victory { "victory" } else { "defeat" },
            rewards.raw_score,
            rewards.total_multiplier,
            rewards.final_score,
            rewards.coins
        );
        self.events.push(SimEvent::BattleEnded { victory });
        if victory {
            self.events.sound(SoundId::Victory);
            self.events.notify("Victory!", NoticeKind::Success);
        } else {
            self.events.sound(SoundId::Defeat);
            self.events.notify("Your squad was destroyed", NoticeKind::Warning);
        }
        self.rewards = Some(rewards);
        self.scene = Scene::Results;
    }

    /// Walk away mid-battle. No rewards.
    pub fn abandon(&mut self) {
        if matches!(self.scene, Scene::Battle | Scene::SkillSelection) {
            self.skills.end_all(
                &mut self.player,
                &mut self.waves.enemies,
                &mut self.events,
                &mut self.rng,
            );
            self.waves.clear();
            self.skill_choices.clear();
        }
        self.scene = Scene::Menu;
    }

    /// Leave the results screen
    pub fn leave_results(&mut self, to_base: bool) {
        if self.scene == Scene::Results {
            self.scene = if to_base { Scene::Base } else { Scene::Menu };
        }
    }

    /// Age existing renderer effects, then add one for every hit and
    /// explosion queued since `first_event`
    fn update_effects(&mut self, dt: f32, first_event: u64) {
        for effect in &mut self.effects {
            effect.life -= dt;
        }
        self.effects.retain(|e| e.life > 0.0);

        for event in self.events.since(first_event) {
            let (kind, pos, life) = match *event {
                SimEvent::DamageNumber { pos, amount } if self.options.damage_numbers => {
                    (VisualKind::DamageNumber { amount }, pos, DAMAGE_NUMBER_MS)
                }
                SimEvent::Explosion { pos, radius } => {
                    (VisualKind::Explosion { radius }, pos, EXPLOSION_EFFECT_MS)
                }
                _ => continue,
            };
            if self.effects.len() >= MAX_VISUAL_EFFECTS {
                self.effects.remove(0);
            }
            self.effects.push(VisualEffect {
                kind,
                pos,
                life,
                max_life: life,
            });
        }
    }

    /// Take everything queued since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }
}
