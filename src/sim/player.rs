//! The player's squad: one main tank, its mini-tank escort and progression
//!
//! Mini tanks hold formation slots laid out in the main tank's local frame,
//! so the whole squad turns with the main tank's facing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Enemy, ShotModifiers, Tank, TankKind, TargetRef};
use super::events::{SimEvent, SimEvents};
use super::modifiers::{ModifierStack, Stat};
use crate::audio::SoundId;
use crate::consts::*;
use crate::{distance, frame_scale, lerp, rotate};

/// Slot offsets behind and beside the main tank (local frame, +x = forward)
const FORMATION_SLOTS: [(f32, f32); MAX_MINI_TANKS] = [
    (-40.0, -35.0),
    (-40.0, 35.0),
    (-75.0, -65.0),
    (-75.0, 65.0),
    (0.0, -60.0),
    (0.0, 60.0),
    (-110.0, -25.0),
    (-110.0, 25.0),
];

/// Merged joystick/keyboard movement for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveVector {
    pub x: f32,
    pub y: f32,
    pub magnitude: f32,
}

impl MoveVector {
    pub fn new(x: f32, y: f32, magnitude: f32) -> Self {
        Self {
            x: x.clamp(-1.0, 1.0),
            y: y.clamp(-1.0, 1.0),
            magnitude: magnitude.clamp(0.0, 1.0),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.magnitude <= 0.0 || (self.x == 0.0 && self.y == 0.0)
    }
}

/// Permanent per-level growth of the main tank
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatDeltas {
    pub max_health: i32,
    pub damage: f32,
}

/// Persistent player progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub coins: u32,
    pub score: u64,
    #[serde(default)]
    pub stat_deltas: StatDeltas,
    #[serde(default)]
    pub best_wave: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next: BASE_EXPERIENCE_TO_NEXT,
            coins: 0,
            score: 0,
            stat_deltas: StatDeltas::default(),
            best_wave: 0,
        }
    }
}

/// Flat and multiplicative stat bonuses from upgrades and passive skills.
/// Always applied on top of freshly built base stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBonuses {
    pub main_health: i32,
    pub main_damage: f32,
    pub main_speed: f32,
    pub mini_health: i32,
    pub mini_damage: f32,
    pub mini_speed: f32,
    /// Multiplier on every tank's shoot cooldown
    pub cooldown_factor: f32,
    pub extra_minis: usize,
    pub max_shield: f32,
}

impl Default for StatBonuses {
    fn default() -> Self {
        Self {
            main_health: 0,
            main_damage: 0.0,
            main_speed: 0.0,
            mini_health: 0,
            mini_damage: 0.0,
            mini_speed: 0.0,
            cooldown_factor: 1.0,
            extra_minis: 0,
            max_shield: 0.0,
        }
    }
}

impl StatBonuses {
    /// Combine two bonus sets (flat parts add, cooldown factors multiply)
    pub fn merge(&self, other: &StatBonuses) -> StatBonuses {
        StatBonuses {
            main_health: self.main_health + other.main_health,
            main_damage: self.main_damage + other.main_damage,
            main_speed: self.main_speed + other.main_speed,
            mini_health: self.mini_health + other.mini_health,
            mini_damage: self.mini_damage + other.mini_damage,
            mini_speed: self.mini_speed + other.mini_speed,
            cooldown_factor: self.cooldown_factor * other.cooldown_factor,
            extra_minis: self.extra_minis + other.extra_minis,
            max_shield: self.max_shield + other.max_shield,
        }
    }
}

/// Combat flags raised by active skills; cleared when the skill ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatFlags {
    /// Area radius added to every player bullet hit
    pub explosive_shot: Option<f32>,
    /// (extra bullets per side, spread)
    pub multi_shot: Option<(u32, f32)>,
    pub vortex_active: bool,
    /// Radius around the main tank that destroys enemy bullets
    pub ice_barrier: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub main_tank: Tank,
    pub mini_tanks: Vec<Tank>,
    pub move_dir: MoveVector,
    pub auto_shoot_timer: f32,
    pub progression: Progression,
    pub flags: CombatFlags,
    /// Damage/speed buffs from active skills
    pub modifiers: ModifierStack,
    /// Depletable shield pool from the shield upgrade
    pub shield: f32,
    pub max_shield: f32,
    /// Max-health granted by the shield skill this battle
    pub shield_bonus: i32,
    /// Score and experience earned in the current battle (before multipliers)
    pub battle_score: u64,
    pub battle_experience: u64,
    /// Coins already paid out for kills this battle
    pub battle_coins: u64,
    bonuses: StatBonuses,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self::with_progression(Progression::default())
    }

    pub fn with_progression(progression: Progression) -> Self {
        let mut player = Self {
            main_tank: Tank::new(TankKind::Main, Vec2::ZERO),
            mini_tanks: Vec::new(),
            move_dir: MoveVector::default(),
            auto_shoot_timer: 0.0,
            progression,
            flags: CombatFlags::default(),
            modifiers: ModifierStack::new(),
            shield: 0.0,
            max_shield: 0.0,
            shield_bonus: 0,
            battle_score: 0,
            battle_experience: 0,
            battle_coins: 0,
            bonuses: StatBonuses::default(),
        };
        player.apply_bonuses(&StatBonuses::default());
        player
    }

    /// Local-frame offset of formation slot `index`
    pub fn formation_offset(index: usize) -> Option<Vec2> {
        FORMATION_SLOTS
            .get(index)
            .map(|&(x, y)| Vec2::new(x, y))
    }

    /// World position of formation slot `index` for the main tank's current pose
    pub fn formation_position(&self, index: usize) -> Option<Vec2> {
        Self::formation_offset(index)
            .map(|offset| self.main_tank.hull.pos + rotate(offset, self.main_tank.hull.angle))
    }

    /// Add one mini tank at the next free slot. False once the formation is full.
    pub fn add_mini_tank(&mut self) -> bool {
        let index = self.mini_tanks.len();
        let Some(pos) = self.formation_position(index) else {
            return false;
        };
        let mut tank = Tank::new(TankKind::Mini, pos);
        tank.hull.angle = self.main_tank.hull.angle;
        tank.hull.target_angle = self.main_tank.hull.angle;
        self.apply_mini_stats(&mut tank);
        self.mini_tanks.push(tank);
        true
    }

    pub fn tank(&self, target: TargetRef) -> Option<&Tank> {
        match target {
            TargetRef::Main => Some(&self.main_tank),
            TargetRef::Mini(i) => self.mini_tanks.get(i),
        }
    }

    pub fn tank_mut(&mut self, target: TargetRef) -> Option<&mut Tank> {
        match target {
            TargetRef::Main => Some(&mut self.main_tank),
            TargetRef::Mini(i) => self.mini_tanks.get_mut(i),
        }
    }

    /// Every tank with its reference, main first
    pub fn tanks(&self) -> impl Iterator<Item = (TargetRef, &Tank)> {
        std::iter::once((TargetRef::Main, &self.main_tank)).chain(
            self.mini_tanks
                .iter()
                .enumerate()
                .map(|(i, t)| (TargetRef::Mini(i), t)),
        )
    }

    pub fn tanks_mut(&mut self) -> impl Iterator<Item = &mut Tank> {
        std::iter::once(&mut self.main_tank).chain(self.mini_tanks.iter_mut())
    }

    pub fn living_count(&self) -> usize {
        self.tanks().filter(|(_, t)| t.is_alive()).count()
    }

    pub fn all_dead(&self) -> bool {
        self.living_count() == 0
    }

    /// Nearest living tank to `pos`
    pub fn nearest_living(&self, pos: Vec2) -> Option<(TargetRef, f32)> {
        self.tanks()
            .filter(|(_, t)| t.is_alive())
            .map(|(r, t)| (r, distance(pos, t.hull.pos)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Move the squad and advance every tank's timers and bullets
    pub fn update(&mut self, dt: f32, movement: MoveVector) {
        self.move_dir = movement;
        let speed_mult = self.modifiers.multiplier(Stat::Speed);

        if self.main_tank.is_alive() && !movement.is_idle() {
            let dir = Vec2::new(movement.x, movement.y).normalize_or_zero();
            let step = self.main_tank.hull.speed * speed_mult * movement.magnitude * frame_scale(dt);
            self.main_tank.hull.pos += dir * step;
            self.main_tank.hull.target_angle = dir.y.atan2(dir.x);
        }

        let main_angle = self.main_tank.hull.angle;
        for i in 0..self.mini_tanks.len() {
            let Some(slot) = self.formation_position(i) else {
                log::warn!("Mini tank {} has no formation slot, skipping", i);
                continue;
            };
            let mini = &mut self.mini_tanks[i];
            if !mini.is_alive() {
                continue;
            }
            let pos = mini.hull.pos;
            mini.hull.pos = Vec2::new(
                lerp(pos.x, slot.x, FORMATION_FOLLOW_LERP),
                lerp(pos.y, slot.y, FORMATION_FOLLOW_LERP),
            );
            mini.hull.target_angle = main_angle;
        }

        for tank in self.tanks_mut() {
            tank.update(dt);
        }
    }

    /// Shot adjustments from the active buffs
    pub fn shot_modifiers(&self) -> ShotModifiers {
        let (extra_shots, spread) = self.flags.multi_shot.unwrap_or((0, 0.0));
        ShotModifiers {
            damage_mult: self.modifiers.multiplier(Stat::Damage),
            extra_shots,
            spread,
        }
    }

    /// Every AUTO_SHOOT_INTERVAL_MS, each living tank fires at the nearest
    /// enemy inside its range. Returns the number of shots fired.
    pub fn auto_shoot(&mut self, dt: f32, enemies: &[Enemy], events: &mut SimEvents) -> usize {
        self.auto_shoot_timer += dt;
        if self.auto_shoot_timer < AUTO_SHOOT_INTERVAL_MS {
            return 0;
        }
        self.auto_shoot_timer = 0.0;

        let shot = self.shot_modifiers();
        let mut fired = 0;
        for tank in self.tanks_mut() {
            if !tank.is_alive() {
                continue;
            }
            let Some(target) = nearest_enemy_within(enemies, tank.hull.pos, tank.range) else {
                continue;
            };
            if tank.shoot(Some(target), &shot) {
                fired += 1;
            }
        }
        if fired > 0 {
            events.sound(SoundId::PlayerShot);
        }
        fired
    }

    /// Manual fire: the main tank shoots at the nearest enemy in range, or
    /// straight ahead when none is.
    pub fn manual_shoot(&mut self, enemies: &[Enemy], events: &mut SimEvents) -> bool {
        let shot = self.shot_modifiers();
        let target =
            nearest_enemy_within(enemies, self.main_tank.hull.pos, self.main_tank.range);
        let fired = self.main_tank.shoot(target, &shot);
        if fired {
            events.sound(SoundId::PlayerShot);
        }
        fired
    }

    /// Damage a tank. The shield pool soaks main-tank damage first.
    /// Returns true if the tank was destroyed by this hit.
    pub fn damage_tank(&mut self, target: TargetRef, amount: f32) -> bool {
        let mut amount = amount;
        if target == TargetRef::Main && self.shield > 0.0 {
            let absorbed = amount.min(self.shield);
            self.shield -= absorbed;
            amount -= absorbed;
            if amount <= 0.0 {
                return false;
            }
        }
        match self.tank_mut(target) {
            Some(tank) => tank.hull.take_damage(amount),
            None => false,
        }
    }

    /// Heal the main tank by `amount` and each mini by 80% of it
    pub fn heal_squad(&mut self, amount: i32) {
        self.main_tank.hull.heal(amount);
        let mini_amount = (amount as f32 * 0.8).round() as i32;
        for mini in &mut self.mini_tanks {
            mini.hull.heal(mini_amount);
        }
    }

    /// Full heal for the whole squad (revives), refills the shield pool
    pub fn restore_full(&mut self) {
        for tank in self.tanks_mut() {
            tank.hull.heal_full();
        }
        self.shield = self.max_shield;
    }

    /// Grant experience, levelling up as many times as it covers.
    /// Returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u32, events: &mut SimEvents) -> u32 {
        let mut gained = 0;
        self.progression.experience += amount;
        while self.progression.experience >= self.progression.experience_to_next {
            self.progression.experience -= self.progression.experience_to_next;
            self.progression.level += 1;
            self.progression.experience_to_next =
                (self.progression.experience_to_next as f32 * EXPERIENCE_GROWTH).floor() as u32;
            self.progression.stat_deltas.max_health += LEVEL_UP_HEALTH_DELTA;
            self.progression.stat_deltas.damage += LEVEL_UP_DAMAGE_DELTA;
            gained += 1;

            log::info!("Level up! Now level {}", self.progression.level);
            events.push(SimEvent::LevelUp {
                level: self.progression.level,
            });
            events.sound(SoundId::LevelUp);
        }
        if gained > 0 {
            let bonuses = self.bonuses;
            self.apply_bonuses(&bonuses);
            self.restore_full();
        }
        gained
    }

    /// Record a kill's rewards
    pub fn reward_kill(&mut self, value: u32, events: &mut SimEvents) {
        self.progression.score += value as u64;
        self.battle_score += value as u64;
        self.battle_experience += (value / 2) as u64;
        self.battle_coins += (value / 4) as u64;
        self.progression.coins += value / 4;
        self.gain_experience(value / 2, events);
    }

    /// Currently applied bonus set
    pub fn bonuses(&self) -> &StatBonuses {
        &self.bonuses
    }

    /// Rebuild every tank's stats from base values plus `bonuses`, level
    /// deltas and the shield-skill bonus. Damage already taken carries over.
    /// Safe to call repeatedly with the same input.
    pub fn apply_bonuses(&mut self, bonuses: &StatBonuses) {
        self.bonuses = *bonuses;

        let target_minis = (STARTING_MINI_TANKS + bonuses.extra_minis).min(MAX_MINI_TANKS);
        if self.mini_tanks.len() > target_minis {
            self.mini_tanks.truncate(target_minis);
        }
        while self.mini_tanks.len() < target_minis {
            if !self.add_mini_tank() {
                break;
            }
        }

        let base = TankKind::Main.base_stats();
        let deltas = self.progression.stat_deltas;
        let max_health = base.health + deltas.max_health + bonuses.main_health + self.shield_bonus;
        rebuild_hull(
            &mut self.main_tank,
            max_health,
            base.damage + deltas.damage + bonuses.main_damage,
            base.speed + bonuses.main_speed,
            base.cooldown * bonuses.cooldown_factor,
        );

        let mut minis = std::mem::take(&mut self.mini_tanks);
        for mini in &mut minis {
            self.apply_mini_stats(mini);
        }
        self.mini_tanks = minis;

        self.max_shield = bonuses.max_shield;
        self.shield = self.shield.min(self.max_shield);
    }

    fn apply_mini_stats(&self, mini: &mut Tank) {
        let base = TankKind::Mini.base_stats();
        let b = &self.bonuses;
        rebuild_hull(
            mini,
            base.health + b.mini_health + self.shield_bonus,
            base.damage + b.mini_damage,
            base.speed + b.mini_speed,
            base.cooldown * b.cooldown_factor,
        );
    }

    /// Raise every tank's max health for the rest of the battle (shield
    /// skill). Living tanks gain the same health; dead ones stay dead.
    pub fn grant_shield_bonus(&mut self, amount: i32) {
        self.shield_bonus += amount;
        for tank in self.tanks_mut() {
            tank.hull.max_health = tank.hull.max_health.saturating_add(amount);
            if tank.hull.is_alive {
                tank.hull.heal(amount);
            }
        }
    }

    /// Clear battle-scoped state before a new battle
    pub fn reset_for_battle(&mut self) {
        self.flags = CombatFlags::default();
        self.modifiers.clear();
        self.shield_bonus = 0;
        self.battle_score = 0;
        self.battle_experience = 0;
        self.battle_coins = 0;
        self.auto_shoot_timer = 0.0;
        self.main_tank.hull.pos = Vec2::ZERO;
        self.main_tank.hull.angle = 0.0;
        self.main_tank.hull.target_angle = 0.0;
        let bonuses = self.bonuses;
        self.apply_bonuses(&bonuses);
        for i in 0..self.mini_tanks.len() {
            if let Some(pos) = self.formation_position(i) {
                self.mini_tanks[i].hull.pos = pos;
            }
        }
        for tank in self.tanks_mut() {
            tank.hull.bullets.clear();
            tank.hull.shoot_cooldown = 0.0;
        }
        self.restore_full();
    }
}

fn rebuild_hull(tank: &mut Tank, max_health: i32, damage: f32, speed: f32, cooldown: f32) {
    let missing = (tank.hull.max_health - tank.hull.health).max(0);
    let was_alive = tank.hull.is_alive;
    tank.hull.max_health = max_health.max(1);
    tank.hull.health = if was_alive {
        (tank.hull.max_health - missing).max(1)
    } else {
        0
    };
    tank.hull.is_alive = tank.hull.health > 0;
    tank.hull.damage = damage;
    tank.hull.speed = speed;
    tank.hull.max_shoot_cooldown = cooldown;
}

/// Position of the nearest living enemy within `range` of `pos`
pub fn nearest_enemy_within(enemies: &[Enemy], pos: Vec2, range: f32) -> Option<Vec2> {
    enemies
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| (e.hull.pos, distance(pos, e.hull.pos)))
        .filter(|&(_, d)| d <= range)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(p, _)| p)
}
