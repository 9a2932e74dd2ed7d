//! Tank Adventure - A top-down tank squad action game
//!
//! Core modules:
//! - `sim`: Simulation core (entities, enemy AI, waves, skills, combat, battle flow)
//! - `upgrades`: Coin-bought permanent tank upgrades
//! - `persistence`: Save/load of progression records through a storage backend
//! - `platform`: Browser host bindings (wasm only)
//! - `audio`: Sound ids and the sinks the host implements
//! - `settings`: Player preferences

pub mod audio;
pub mod game;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod upgrades;

pub use game::Game;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Frame delta cap (ms) so a suspended tab doesn't blow up the simulation
    pub const MAX_FRAME_DT_MS: f32 = 50.0;
    /// Reference frame length (ms) that speeds are expressed against
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

    /// Rotation smoothing per tick
    pub const TANK_TURN_SMOOTHING: f32 = 0.3;
    pub const ENEMY_TURN_SMOOTHING: f32 = 0.08;

    /// Visual timers (ms)
    pub const HIT_FLASH_MS: f32 = 150.0;
    pub const MUZZLE_FLASH_MS: f32 = 100.0;

    /// Main tank defaults
    pub const MAIN_HEALTH: i32 = 100;
    pub const MAIN_DAMAGE: f32 = 20.0;
    pub const MAIN_SPEED: f32 = 3.0;
    pub const MAIN_SIZE: f32 = 20.0;
    pub const MAIN_COOLDOWN_MS: f32 = 500.0;
    pub const MAIN_RANGE: f32 = 350.0;
    pub const MAIN_BULLET_SPEED: f32 = 8.0;
    pub const MAIN_BULLET_SIZE: f32 = 4.0;
    pub const MAIN_BULLET_LIFE_MS: f32 = 2000.0;
    pub const MAIN_BULLET_PENETRATION: u32 = 2;

    /// Mini tank defaults
    pub const MINI_HEALTH: i32 = 50;
    pub const MINI_DAMAGE: f32 = 10.0;
    pub const MINI_SPEED: f32 = 3.0;
    pub const MINI_SIZE: f32 = 12.0;
    pub const MINI_COOLDOWN_MS: f32 = 700.0;
    pub const MINI_RANGE: f32 = 300.0;
    pub const MINI_BULLET_SPEED: f32 = 7.0;
    pub const MINI_BULLET_SIZE: f32 = 3.0;
    pub const MINI_BULLET_LIFE_MS: f32 = 1500.0;

    /// Formation
    pub const MAX_MINI_TANKS: usize = 8;
    pub const STARTING_MINI_TANKS: usize = 2;
    pub const FORMATION_FOLLOW_LERP: f32 = 0.1;
    pub const AUTO_SHOOT_INTERVAL_MS: f32 = 100.0;

    /// Enemy bullets
    pub const ENEMY_BULLET_SPEED: f32 = 5.0;
    pub const ENEMY_BULLET_SIZE: f32 = 3.0;
    pub const ENEMY_BULLET_LIFE_MS: f32 = 3000.0;
    pub const DEFAULT_BULLET_SIZE: f32 = 3.0;

    /// Waves
    pub const WAVE_BASE_ENEMIES: u32 = 10;
    pub const WAVE_ENEMIES_PER_WAVE: u32 = 3;
    pub const WAVE_MAX_ENEMIES: u32 = 40;
    pub const WAVE_BASE_SPAWN_INTERVAL_MS: f32 = 2200.0;
    pub const WAVE_SPAWN_INTERVAL_STEP_MS: f32 = 80.0;
    pub const WAVE_MIN_SPAWN_INTERVAL_MS: f32 = 800.0;
    pub const SPAWN_RADIUS: f32 = 400.0;
    pub const BOSS_WAVE_PERIOD: u32 = 5;
    pub const BOSS_CHANCE: f64 = 0.3;
    pub const ENEMY_HEALTH_SCALE_PER_WAVE: f32 = 0.1;

    /// Boss behaviour
    pub const BOSS_PHASE_MS: f32 = 3000.0;
    pub const BOSS_RAPID_FIRE_PERIOD_MS: f32 = 500.0;

    /// Skills
    pub const AUTO_CAST_INTERVAL_MS: f32 = 2000.0;
    pub const MAX_ACTIVE_SKILLS: usize = 6;
    pub const SKILL_CHOICES: usize = 3;
    pub const UNOWNED_SKILL_WEIGHT: f32 = 3.0;
    pub const OWNED_SKILL_WEIGHT: f32 = 1.0;

    /// Progression
    pub const BASE_EXPERIENCE_TO_NEXT: u32 = 100;
    pub const EXPERIENCE_GROWTH: f32 = 1.5;
    pub const LEVEL_UP_HEALTH_DELTA: i32 = 10;
    pub const LEVEL_UP_DAMAGE_DELTA: f32 = 2.0;

    /// Rewards
    pub const COMPLETION_BONUS_MULTIPLIER: f64 = 1.5;

    /// Camera and renderer decorations
    pub const CAMERA_FOLLOW_LERP: f32 = 0.1;
    pub const DAMAGE_NUMBER_MS: f32 = 800.0;
    pub const EXPLOSION_EFFECT_MS: f32 = 400.0;
    pub const MAX_VISUAL_EFFECTS: usize = 256;
    /// Undrained host events kept before the oldest are dropped
    pub const MAX_QUEUED_EVENTS: usize = 4096;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Bearing from `from` to `to` in radians
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Circle-circle overlap test (strict, touching circles don't collide)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    distance(a, b) < ra + rb
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Shortest signed arc from `from` to `to`, in [-π, π]
#[inline]
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    let diff = to - from;
    diff.sin().atan2(diff.cos())
}

/// Movement scale for a frame of `dt` ms relative to the reference frame
#[inline]
pub fn frame_scale(dt: f32) -> f32 {
    dt / consts::REFERENCE_FRAME_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_shortest_arc_wraps() {
        let arc = shortest_arc(PI - 0.1, -PI + 0.1);
        assert!((arc - 0.2).abs() < 1e-4);
        let arc = shortest_arc(0.0, -0.5);
        assert!((arc + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_circles_overlap_is_strict() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert!(!circles_overlap(a, 5.0, b, 5.0));
        assert!(circles_overlap(a, 5.1, b, 5.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), PI / 2.0);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_angle_and_distance() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(4.0, 5.0);
        assert!((distance(a, b) - 5.0).abs() < 1e-5);
        assert!((angle_to(Vec2::ZERO, Vec2::new(0.0, 3.0)) - PI / 2.0).abs() < 1e-5);
        assert!((lerp(2.0, 4.0, 0.25) - 2.5).abs() < 1e-6);
        assert!((polar_to_cartesian(2.0, 0.0) - Vec2::new(2.0, 0.0)).length() < 1e-6);
        assert!((normalize_angle(2.5 * PI) - PI / 2.0).abs() < 1e-4);
    }
}
