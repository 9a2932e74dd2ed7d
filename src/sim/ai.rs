//! Enemy behaviour
//!
//! Each tick an enemy re-targets the nearest living player tank by linear
//! scan, then runs the behaviour for its kind. Behaviours only move and
//! shoot; the per-kind numbers come from `EnemyKind::profile`.

use glam::Vec2;
use rand::Rng;

use super::entity::{Bullet, BulletOwner, Enemy, EnemyKind};
use super::events::SimEvents;
use super::modifiers::Stat;
use super::player::Player;
use crate::audio::SoundId;
use crate::consts::*;
use crate::{angle_to, frame_scale, polar_to_cartesian};

/// Basic tanks back off inside this distance
const BASIC_RETREAT_DISTANCE: f32 = 100.0;
/// Fast tanks rush from beyond this distance
const FAST_RUSH_DISTANCE: f32 = 200.0;
/// Fast tanks start strafing inside this distance
const FAST_STRAFE_DISTANCE: f32 = 80.0;
/// Snipers close in beyond this fraction of their range
const SNIPER_APPROACH_FRACTION: f32 = 0.8;
const SNIPER_RETREAT_DISTANCE: f32 = 150.0;
const BOSS_ADVANCE_DISTANCE: f32 = 150.0;
const BOSS_RETREAT_DISTANCE: f32 = 200.0;
/// Strafe wobble: amplitude (radians) and rate (per ms)
const STRAFE_WOBBLE_AMPLITUDE: f32 = 0.5;
const STRAFE_WOBBLE_RATE: f32 = 0.003;

/// Boss attack cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossPhase {
    Aggressive,
    Strafe,
    Retreat,
}

impl Enemy {
    /// Current boss phase, `None` for other kinds
    pub fn boss_phase(&self) -> Option<BossPhase> {
        if self.kind != EnemyKind::Boss {
            return None;
        }
        let phase = (self.state_timer / BOSS_PHASE_MS).floor() as u32 % 3;
        Some(match phase {
            0 => BossPhase::Aggressive,
            1 => BossPhase::Strafe,
            _ => BossPhase::Retreat,
        })
    }

    /// Pick a target and act on it for this tick
    pub fn update_ai<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        player: &Player,
        rng: &mut R,
        events: &mut SimEvents,
    ) {
        if !self.is_alive() {
            return;
        }
        let Some((target_ref, dist)) = player.nearest_living(self.hull.pos) else {
            self.target = None;
            return;
        };
        self.target = Some(target_ref);
        let Some(target) = player.tank(target_ref).map(|t| t.hull.pos) else {
            return;
        };
        self.hull.target_angle = angle_to(self.hull.pos, target);

        match self.kind {
            EnemyKind::Basic => {
                if dist > self.range {
                    self.move_towards(target, dt);
                } else if dist < BASIC_RETREAT_DISTANCE {
                    self.move_away(target, dt);
                    self.shoot_at(target, rng, events);
                } else {
                    self.shoot_at(target, rng, events);
                }
            }
            EnemyKind::Heavy => {
                if dist > self.range {
                    self.move_towards(target, dt);
                } else {
                    self.shoot_at(target, rng, events);
                }
            }
            EnemyKind::Fast => {
                if dist > FAST_RUSH_DISTANCE {
                    self.move_towards(target, dt);
                } else if dist < FAST_STRAFE_DISTANCE {
                    self.circle_strafe(target, dt);
                    self.shoot_at(target, rng, events);
                } else {
                    self.shoot_at(target, rng, events);
                }
            }
            EnemyKind::Sniper => {
                if dist > self.range * SNIPER_APPROACH_FRACTION {
                    self.move_towards(target, dt);
                } else if dist < SNIPER_RETREAT_DISTANCE {
                    self.move_away(target, dt);
                } else {
                    self.shoot_at(target, rng, events);
                }
            }
            EnemyKind::Boss => self.boss_behaviour(target, dist, dt, rng, events),
        }
    }

    fn boss_behaviour<R: Rng + ?Sized>(
        &mut self,
        target: Vec2,
        dist: f32,
        dt: f32,
        rng: &mut R,
        events: &mut SimEvents,
    ) {
        match self.boss_phase() {
            Some(BossPhase::Aggressive) => {
                if dist > BOSS_ADVANCE_DISTANCE {
                    self.move_towards(target, dt);
                }
                let fired = self.shoot_at(target, rng, events);
                // Rapid-fire window: another attempt, still cooldown-gated
                if !fired && self.state_timer % BOSS_RAPID_FIRE_PERIOD_MS < dt {
                    self.shoot_at(target, rng, events);
                }
            }
            Some(BossPhase::Strafe) => {
                self.circle_strafe(target, dt);
                self.shoot_at(target, rng, events);
            }
            Some(BossPhase::Retreat) => {
                if dist < BOSS_RETREAT_DISTANCE {
                    self.move_away(target, dt);
                }
                self.shoot_at(target, rng, events);
            }
            None => {}
        }
    }

    pub fn move_towards(&mut self, target: Vec2, dt: f32) {
        let bearing = angle_to(self.hull.pos, target);
        self.hull.pos += polar_to_cartesian(self.effective_speed() * frame_scale(dt), bearing);
    }

    pub fn move_away(&mut self, target: Vec2, dt: f32) {
        let bearing = angle_to(self.hull.pos, target);
        self.hull.pos -= polar_to_cartesian(self.effective_speed() * frame_scale(dt), bearing);
    }

    /// Move perpendicular to the target bearing with a slow wobble
    pub fn circle_strafe(&mut self, target: Vec2, dt: f32) {
        let bearing = angle_to(self.hull.pos, target);
        let wobble = (self.state_timer * STRAFE_WOBBLE_RATE).sin() * STRAFE_WOBBLE_AMPLITUDE;
        let heading = bearing + std::f32::consts::FRAC_PI_2 + wobble;
        self.hull.pos += polar_to_cartesian(self.effective_speed() * frame_scale(dt), heading);
    }

    /// Fire at `target` with the kind's aim error. False if not ready or
    /// frozen.
    pub fn shoot_at<R: Rng + ?Sized>(
        &mut self,
        target: Vec2,
        rng: &mut R,
        events: &mut SimEvents,
    ) -> bool {
        if !self.hull.can_shoot() || self.modifiers.multiplier(Stat::FireRate) <= 0.0 {
            return false;
        }
        let error = if self.inaccuracy > 0.0 {
            rng.random_range(-self.inaccuracy..=self.inaccuracy)
        } else {
            0.0
        };
        let aim = angle_to(self.hull.pos, target) + error;
        self.hull.angle = aim;
        self.hull.target_angle = aim;

        let muzzle = self.hull.pos + polar_to_cartesian(self.hull.size, aim);
        self.hull.bullets.push(Bullet::new(
            muzzle,
            aim,
            &self.bullet,
            self.hull.damage,
            BulletOwner::Enemy,
        ));
        self.hull.shoot_cooldown = self.hull.max_shoot_cooldown;
        self.hull.muzzle_flash = MUZZLE_FLASH_MS;
        events.sound(SoundId::EnemyShot);
        true
    }
}
