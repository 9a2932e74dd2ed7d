//! Skill effects
//!
//! Each effect kind carries its own typed parameters and three handlers:
//! `on_cast` runs once on activation, `on_tick` every tick while the skill
//! is active, `on_expire` exactly once when the duration runs out.

use glam::Vec2;
use rand::{Rng, RngCore};
use serde::Serialize;

use crate::audio::SoundId;
use crate::distance;
use crate::frame_scale;
use crate::sim::entity::{Bullet, BulletOwner, BulletSpec, Enemy};
use crate::sim::events::SimEvents;
use crate::sim::modifiers::Stat;
use crate::sim::player::{Player, StatBonuses};

/// Effect descriptor with its tuning parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkillEffect {
    Heal { amount: f32 },
    DamageBoost { multiplier: f32 },
    SpeedBoost { multiplier: f32 },
    Shield { amount: f32 },
    ExplosiveShot { radius: f32 },
    MultiShot { extra: u32, spread: f32 },
    TimeSlow { factor: f32 },
    AutoRepair { per_second: f32 },
    FreezeBlast { radius: f32, damage: f32, freeze_ms: f32 },
    FireNova { radius: f32, damage: f32, burn_per_second: f32 },
    VortexField { radius: f32, pull: f32, damage_per_second: f32 },
    PlasmaBurst { bullets: u32, damage: f32, penetration: u32 },
    IceBarrier { radius: f32 },
    MagneticPull { radius: f32, pull: f32, damage: f32 },
    LightningStorm { damage: f32, interval_ms: f32, chain_radius: f32 },
    QuantumStrike { damage: f32, splash_radius: f32 },
    HealthBonus { main: i32, mini: i32 },
    DamageBonus { main: f32, mini: f32 },
    SpeedBonus { amount: f32 },
    CooldownReduction { factor: f32 },
    Reinforcements,
}

/// Bare effect tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Heal,
    DamageBoost,
    SpeedBoost,
    Shield,
    ExplosiveShot,
    MultiShot,
    TimeSlow,
    AutoRepair,
    FreezeBlast,
    FireNova,
    VortexField,
    PlasmaBurst,
    IceBarrier,
    MagneticPull,
    LightningStorm,
    QuantumStrike,
    HealthBonus,
    DamageBonus,
    SpeedBonus,
    CooldownReduction,
    Reinforcements,
}

impl EffectKind {
    pub fn is_passive(self) -> bool {
        matches!(
            self,
            EffectKind::HealthBonus
                | EffectKind::DamageBonus
                | EffectKind::SpeedBonus
                | EffectKind::CooldownReduction
                | EffectKind::Reinforcements
        )
    }
}

/// Everything an effect handler may touch
pub struct EffectCtx<'a> {
    pub player: &'a mut Player,
    pub enemies: &'a mut [Enemy],
    pub events: &'a mut SimEvents,
    pub rng: &'a mut dyn RngCore,
    /// Id of the casting skill; tags modifiers so expiry removes only its own
    pub source: &'a str,
    pub level: u32,
    pub dt: f32,
    /// Remaining active time before this tick's decrement (ms)
    pub remaining: f32,
}

/// Read-only battle state the auto-cast heuristics look at
#[derive(Clone, Copy)]
pub struct BattleView<'a> {
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
}

impl<'a> BattleView<'a> {
    pub fn new(player: &'a Player, enemies: &'a [Enemy]) -> Self {
        Self { player, enemies }
    }

    /// Main-tank health ratio
    pub fn health_ratio(&self) -> f32 {
        self.player.main_tank.hull.health_ratio()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
    }

    /// Living enemies within `radius` of the main tank
    pub fn enemies_near(&self, radius: f32) -> usize {
        let center = self.player.main_tank.hull.pos;
        self.enemies
            .iter()
            .filter(|e| e.is_alive() && distance(center, e.hull.pos) <= radius)
            .count()
    }

    /// Enemy bullets within `radius` of the main tank
    pub fn enemy_bullets_near(&self, radius: f32) -> usize {
        let center = self.player.main_tank.hull.pos;
        self.enemies
            .iter()
            .flat_map(|e| e.hull.bullets.iter())
            .filter(|b| distance(center, b.pos) <= radius)
            .count()
    }

    pub fn any_enemy_with_health(&self, health: i32) -> bool {
        self.enemies
            .iter()
            .any(|e| e.is_alive() && e.hull.health >= health)
    }
}

/// Scale a heal, shield or area magnitude by `1 + level * 0.2`
pub fn scaled(base: f32, level: u32) -> f32 {
    base * (5 + level) as f32 / 5.0
}

/// Buff multiplier at `level`
pub fn buff_multiplier(base: f32, level: u32) -> f32 {
    base + 0.1 * level.saturating_sub(1) as f32
}

/// True on the tick where `remaining` crosses a multiple of `period`
fn pulse(remaining: f32, dt: f32, period: f32) -> bool {
    period > 0.0 && remaining % period < dt
}

/// Damage one enemy with hit feedback. Rewards are collected by the wave
/// manager when it sweeps the dead.
fn strike(enemy: &mut Enemy, amount: f32, events: &mut SimEvents) {
    if !enemy.is_alive() || amount <= 0.0 {
        return;
    }
    events.damage_number(enemy.hull.pos, amount);
    if enemy.hull.take_damage(amount) {
        events.sound(SoundId::EnemyDestroyed);
    }
}

/// Move an enemy toward `center` by `step`, stopping short of `stop_at`
fn drag_towards(enemy: &mut Enemy, center: Vec2, step: f32, stop_at: f32) {
    let offset = center - enemy.hull.pos;
    let dist = offset.length();
    if dist <= stop_at || dist <= f32::EPSILON {
        return;
    }
    let step = step.min(dist - stop_at);
    enemy.hull.pos += offset / dist * step;
}

impl SkillEffect {
    pub fn kind(&self) -> EffectKind {
        match self {
            SkillEffect::Heal { .. } => EffectKind::Heal,
            SkillEffect::DamageBoost { .. } => EffectKind::DamageBoost,
            SkillEffect::SpeedBoost { .. } => EffectKind::SpeedBoost,
            SkillEffect::Shield { .. } => EffectKind::Shield,
            SkillEffect::ExplosiveShot { .. } => EffectKind::ExplosiveShot,
            SkillEffect::MultiShot { .. } => EffectKind::MultiShot,
            SkillEffect::TimeSlow { .. } => EffectKind::TimeSlow,
            SkillEffect::AutoRepair { .. } => EffectKind::AutoRepair,
            SkillEffect::FreezeBlast { .. } => EffectKind::FreezeBlast,
            SkillEffect::FireNova { .. } => EffectKind::FireNova,
            SkillEffect::VortexField { .. } => EffectKind::VortexField,
            SkillEffect::PlasmaBurst { .. } => EffectKind::PlasmaBurst,
            SkillEffect::IceBarrier { .. } => EffectKind::IceBarrier,
            SkillEffect::MagneticPull { .. } => EffectKind::MagneticPull,
            SkillEffect::LightningStorm { .. } => EffectKind::LightningStorm,
            SkillEffect::QuantumStrike { .. } => EffectKind::QuantumStrike,
            SkillEffect::HealthBonus { .. } => EffectKind::HealthBonus,
            SkillEffect::DamageBonus { .. } => EffectKind::DamageBonus,
            SkillEffect::SpeedBonus { .. } => EffectKind::SpeedBonus,
            SkillEffect::CooldownReduction { .. } => EffectKind::CooldownReduction,
            SkillEffect::Reinforcements => EffectKind::Reinforcements,
        }
    }

    /// Cast phase
    pub fn on_cast(&self, ctx: &mut EffectCtx<'_>) {
        let center = ctx.player.main_tank.hull.pos;

        match *self {
            SkillEffect::Heal { amount } => {
                ctx.player.heal_squad(scaled(amount, ctx.level).round() as i32);
            }
            SkillEffect::DamageBoost { multiplier } => {
                ctx.player
                    .modifiers
                    .push(ctx.source, Stat::Damage, buff_multiplier(multiplier, ctx.level));
            }
            SkillEffect::SpeedBoost { multiplier } => {
                ctx.player
                    .modifiers
                    .push(ctx.source, Stat::Speed, buff_multiplier(multiplier, ctx.level));
            }
            SkillEffect::Shield { amount } => {
                ctx.player.grant_shield_bonus(scaled(amount, ctx.level).round() as i32);
            }
            SkillEffect::ExplosiveShot { radius } => {
                ctx.player.flags.explosive_shot = Some(scaled(radius, ctx.level));
            }
            SkillEffect::MultiShot { extra, spread } => {
                let extra = extra + ctx.level.saturating_sub(1) / 2;
                ctx.player.flags.multi_shot = Some((extra, spread));
            }
            SkillEffect::TimeSlow { factor } => {
                for enemy in ctx.enemies.iter_mut().filter(|e| e.is_alive()) {
                    enemy.modifiers.push(ctx.source, Stat::Speed, factor);
                    enemy.modifiers.push(ctx.source, Stat::FireRate, factor);
                }
            }
            SkillEffect::AutoRepair { .. } => {}
            SkillEffect::FreezeBlast {
                radius,
                damage,
                freeze_ms,
            } => {
                let radius = scaled(radius, ctx.level);
                for enemy in ctx.enemies.iter_mut() {
                    if !enemy.is_alive() || distance(center, enemy.hull.pos) > radius {
                        continue;
                    }
                    strike(enemy, scaled(damage, ctx.level), ctx.events);
                    enemy
                        .modifiers
                        .push_timed(ctx.source, Stat::Speed, 0.0, freeze_ms);
                    enemy
                        .modifiers
                        .push_timed(ctx.source, Stat::FireRate, 0.0, freeze_ms);
                }
                ctx.events.explosion(center, radius);
            }
            SkillEffect::FireNova { radius, damage, .. } => {
                let radius = scaled(radius, ctx.level);
                for enemy in ctx.enemies.iter_mut() {
                    if distance(center, enemy.hull.pos) <= radius {
                        strike(enemy, scaled(damage, ctx.level), ctx.events);
                    }
                }
                ctx.events.explosion(center, radius);
            }
            SkillEffect::VortexField { .. } => {
                ctx.player.flags.vortex_active = true;
            }
            SkillEffect::PlasmaBurst {
                bullets,
                damage,
                penetration,
            } => {
                let main = &mut ctx.player.main_tank;
                if !main.is_alive() || bullets == 0 {
                    return;
                }
                let spec = BulletSpec {
                    penetration,
                    ..main.bullet
                };
                let step = std::f32::consts::TAU / bullets as f32;
                for i in 0..bullets {
                    let angle = step * i as f32;
                    let muzzle = main.hull.pos + crate::polar_to_cartesian(main.hull.size, angle);
                    main.hull.bullets.push(Bullet::new(
                        muzzle,
                        angle,
                        &spec,
                        scaled(damage, ctx.level),
                        BulletOwner::Main,
                    ));
                }
                ctx.events.sound(SoundId::PlayerShot);
            }
            SkillEffect::IceBarrier { radius } => {
                ctx.player.flags.ice_barrier = Some(scaled(radius, ctx.level));
            }
            SkillEffect::MagneticPull {
                radius,
                pull,
                damage,
            } => {
                let radius = scaled(radius, ctx.level);
                let main_size = ctx.player.main_tank.hull.size;
                for enemy in ctx.enemies.iter_mut() {
                    if !enemy.is_alive() || distance(center, enemy.hull.pos) > radius {
                        continue;
                    }
                    let stop_at = main_size + enemy.hull.size;
                    drag_towards(enemy, center, scaled(pull, ctx.level), stop_at);
                    strike(enemy, scaled(damage, ctx.level), ctx.events);
                }
            }
            SkillEffect::LightningStorm {
                damage,
                chain_radius,
                ..
            } => {
                let damage = scaled(damage, ctx.level);
                let chain_radius = scaled(chain_radius, ctx.level);
                lightning_strike(ctx, damage, chain_radius);
            }
            SkillEffect::QuantumStrike {
                damage,
                splash_radius,
            } => {
                let damage = scaled(damage, ctx.level);
                let splash_radius = scaled(splash_radius, ctx.level);
                quantum_strike(ctx, damage, splash_radius);
            }
            SkillEffect::HealthBonus { .. }
            | SkillEffect::DamageBonus { .. }
            | SkillEffect::SpeedBonus { .. }
            | SkillEffect::CooldownReduction { .. }
            | SkillEffect::Reinforcements => {}
        }
    }

    /// Continuous phase, called every tick while active
    pub fn on_tick(&self, ctx: &mut EffectCtx<'_>) {
        let center = ctx.player.main_tank.hull.pos;

        match *self {
            SkillEffect::AutoRepair { per_second } => {
                if pulse(ctx.remaining, ctx.dt, 1000.0) {
                    ctx.player.heal_squad(scaled(per_second, ctx.level).round() as i32);
                }
            }
            SkillEffect::FireNova {
                radius,
                burn_per_second,
                ..
            } => {
                if pulse(ctx.remaining, ctx.dt, 1000.0) {
                    let radius = scaled(radius, ctx.level);
                    for enemy in ctx.enemies.iter_mut() {
                        if distance(center, enemy.hull.pos) <= radius {
                            strike(enemy, scaled(burn_per_second, ctx.level), ctx.events);
                        }
                    }
                }
            }
            SkillEffect::VortexField {
                radius,
                pull,
                damage_per_second,
            } => {
                let radius = scaled(radius, ctx.level);
                let main_size = ctx.player.main_tank.hull.size;
                let burn = pulse(ctx.remaining, ctx.dt, 1000.0);
                for enemy in ctx.enemies.iter_mut() {
                    if !enemy.is_alive() || distance(center, enemy.hull.pos) > radius {
                        continue;
                    }
                    let stop_at = main_size + enemy.hull.size;
                    drag_towards(enemy, center, pull * frame_scale(ctx.dt), stop_at);
                    if burn {
                        strike(enemy, scaled(damage_per_second, ctx.level), ctx.events);
                    }
                }
            }
            SkillEffect::IceBarrier { .. } => {
                let Some(radius) = ctx.player.flags.ice_barrier else {
                    return;
                };
                for enemy in ctx.enemies.iter_mut() {
                    enemy
                        .hull
                        .bullets
                        .retain(|b| distance(center, b.pos) > radius);
                }
            }
            SkillEffect::LightningStorm {
                damage,
                interval_ms,
                chain_radius,
            } => {
                if pulse(ctx.remaining, ctx.dt, interval_ms) {
                    let damage = scaled(damage, ctx.level);
                    let chain_radius = scaled(chain_radius, ctx.level);
                    lightning_strike(ctx, damage, chain_radius);
                }
            }
            _ => {}
        }
    }

    /// Exit phase, called once when the active duration ends
    pub fn on_expire(&self, ctx: &mut EffectCtx<'_>) {
        match *self {
            SkillEffect::DamageBoost { .. } | SkillEffect::SpeedBoost { .. } => {
                ctx.player.modifiers.remove_source(ctx.source);
            }
            SkillEffect::ExplosiveShot { .. } => ctx.player.flags.explosive_shot = None,
            SkillEffect::MultiShot { .. } => ctx.player.flags.multi_shot = None,
            SkillEffect::VortexField { .. } => ctx.player.flags.vortex_active = false,
            SkillEffect::IceBarrier { .. } => ctx.player.flags.ice_barrier = None,
            SkillEffect::TimeSlow { .. } => {
                for enemy in ctx.enemies.iter_mut() {
                    enemy.modifiers.remove_source(ctx.source);
                }
            }
            _ => {}
        }
    }

    /// Whether auto-cast should fire this effect now
    pub fn wants_auto_cast(&self, level: u32, view: &BattleView<'_>) -> bool {
        let hp = view.health_ratio();
        let n = view.enemy_count();

        match *self {
            SkillEffect::Heal { .. } => hp < 0.5,
            SkillEffect::DamageBoost { .. } => n >= 3,
            SkillEffect::SpeedBoost { .. } => view.enemies_near(150.0) >= 3 || hp < 0.4,
            SkillEffect::Shield { .. } => hp < 0.6,
            SkillEffect::ExplosiveShot { .. } => n >= 5,
            SkillEffect::MultiShot { .. } => n >= 4,
            SkillEffect::TimeSlow { .. } => n >= 6,
            SkillEffect::AutoRepair { .. } => hp < 0.7,
            SkillEffect::FreezeBlast { radius, .. } | SkillEffect::FireNova { radius, .. } => {
                view.enemies_near(scaled(radius, level)) >= 3
            }
            SkillEffect::VortexField { .. } => n >= 5,
            SkillEffect::PlasmaBurst { .. } => view.enemies_near(250.0) >= 4,
            SkillEffect::IceBarrier { radius } => {
                hp < 0.5 || view.enemy_bullets_near(scaled(radius, level)) >= 5
            }
            SkillEffect::MagneticPull { .. } => n >= 4,
            SkillEffect::LightningStorm { .. } => n >= 4,
            SkillEffect::QuantumStrike { .. } => view.any_enemy_with_health(100),
            SkillEffect::HealthBonus { .. }
            | SkillEffect::DamageBonus { .. }
            | SkillEffect::SpeedBonus { .. }
            | SkillEffect::CooldownReduction { .. }
            | SkillEffect::Reinforcements => false,
        }
    }

    /// Permanent stat bonuses of a passive effect at `level`
    pub fn passive_bonuses(&self, level: u32) -> StatBonuses {
        let lv = level as f32;
        match *self {
            SkillEffect::HealthBonus { main, mini } => StatBonuses {
                main_health: main * level as i32,
                mini_health: mini * level as i32,
                ..Default::default()
            },
            SkillEffect::DamageBonus { main, mini } => StatBonuses {
                main_damage: main * lv,
                mini_damage: mini * lv,
                ..Default::default()
            },
            SkillEffect::SpeedBonus { amount } => StatBonuses {
                main_speed: amount * lv,
                mini_speed: amount * lv,
                ..Default::default()
            },
            SkillEffect::CooldownReduction { factor } => StatBonuses {
                cooldown_factor: factor.powi(level as i32),
                ..Default::default()
            },
            SkillEffect::Reinforcements => StatBonuses {
                extra_minis: level as usize,
                ..Default::default()
            },
            _ => StatBonuses::default(),
        }
    }
}

/// Hit a random living enemy, then chain to the nearest other enemy inside
/// `chain_radius` for half damage.
fn lightning_strike(ctx: &mut EffectCtx<'_>, damage: f32, chain_radius: f32) {
    let living: Vec<usize> = ctx
        .enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive())
        .map(|(i, _)| i)
        .collect();
    if living.is_empty() {
        return;
    }
    let first = living[ctx.rng.random_range(0..living.len())];
    let origin = ctx.enemies[first].hull.pos;
    strike(&mut ctx.enemies[first], damage, ctx.events);
    ctx.events.explosion(origin, 20.0);
    ctx.events.sound(SoundId::Hit);

    let chained = living
        .iter()
        .copied()
        .filter(|&i| i != first)
        .map(|i| (i, distance(origin, ctx.enemies[i].hull.pos)))
        .filter(|&(_, d)| d <= chain_radius)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some((i, _)) = chained {
        strike(&mut ctx.enemies[i], damage * 0.5, ctx.events);
    }
}

/// Teleport next to the toughest living enemy and hit it, splashing half
/// damage around it.
fn quantum_strike(ctx: &mut EffectCtx<'_>, damage: f32, splash_radius: f32) {
    if !ctx.player.main_tank.is_alive() {
        return;
    }
    let Some(target) = ctx
        .enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive())
        .max_by_key(|(_, e)| e.hull.health)
        .map(|(i, _)| i)
    else {
        return;
    };

    let target_pos = ctx.enemies[target].hull.pos;
    let main = &mut ctx.player.main_tank.hull;
    let gap = main.size + ctx.enemies[target].hull.size + 10.0;
    let approach = (main.pos - target_pos).normalize_or(Vec2::X);
    main.pos = target_pos + approach * gap;
    main.face(target_pos);

    strike(&mut ctx.enemies[target], damage, ctx.events);
    for (i, enemy) in ctx.enemies.iter_mut().enumerate() {
        if i != target && distance(target_pos, enemy.hull.pos) <= splash_radius {
            strike(enemy, damage * 0.5, ctx.events);
        }
    }
    ctx.events.explosion(target_pos, splash_radius);
}
