//! Tanks, enemies and the bullets they own
//!
//! Player tanks and enemies share the same hull: position, facing, health,
//! shoot cooldown and a list of live bullets. What differs is the stat block
//! they're built from and who steers them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::modifiers::{ModifierStack, Stat};
use crate::consts::*;
use crate::{angle_to, frame_scale, polar_to_cartesian, shortest_arc};

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Enemy,
    Main,
    Mini,
}

/// A projectile. Lives in its shooter's bullet list until it expires or
/// spends its last hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
    pub damage: f32,
    /// Remaining life (ms)
    pub life: f32,
    pub owner: BulletOwner,
    pub size: f32,
    /// Maximum number of targets this bullet damages before removal
    pub penetration: u32,
    /// Targets damaged so far
    pub hits: u32,
    /// Area damage radius on hit (0 = none)
    pub explosion_radius: f32,
    /// Enemy ids already struck, so a piercing round doesn't re-hit
    #[serde(default)]
    pub struck: Vec<u32>,
}

impl Bullet {
    pub fn new(pos: Vec2, angle: f32, spec: &BulletSpec, damage: f32, owner: BulletOwner) -> Self {
        Self {
            pos,
            angle,
            speed: spec.speed,
            damage,
            life: spec.life,
            owner,
            size: spec.size,
            penetration: spec.penetration.max(1),
            hits: 0,
            explosion_radius: spec.explosion_radius,
            struck: Vec::new(),
        }
    }

    /// Advance along heading and age the bullet
    pub fn advance(&mut self, dt: f32) {
        self.pos += polar_to_cartesian(self.speed * frame_scale(dt), self.angle);
        self.life -= dt;
    }

    pub fn is_spent(&self) -> bool {
        self.life <= 0.0 || self.hits >= self.penetration
    }

    pub fn radius(&self) -> f32 {
        if self.size > 0.0 {
            self.size
        } else {
            DEFAULT_BULLET_SIZE
        }
    }
}

/// Per-shooter bullet parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletSpec {
    pub speed: f32,
    pub size: f32,
    pub life: f32,
    pub penetration: u32,
    pub explosion_radius: f32,
}

/// Shared positional/health state of every combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    pub pos: Vec2,
    /// Current facing (radians)
    pub angle: f32,
    /// Facing being smoothed toward
    pub target_angle: f32,
    pub health: i32,
    pub max_health: i32,
    pub damage: f32,
    pub speed: f32,
    /// Collision radius
    pub size: f32,
    /// Counts down in ms; anything <= 0 is ready
    pub shoot_cooldown: f32,
    pub max_shoot_cooldown: f32,
    pub bullets: Vec<Bullet>,
    pub is_alive: bool,
    /// Visual timers, only read by the renderer
    pub hit_flash: f32,
    pub muzzle_flash: f32,
}

impl Hull {
    pub fn new(pos: Vec2, max_health: i32, damage: f32, speed: f32, size: f32, cooldown: f32) -> Self {
        Self {
            pos,
            angle: 0.0,
            target_angle: 0.0,
            health: max_health,
            max_health,
            damage,
            speed,
            size,
            shoot_cooldown: 0.0,
            max_shoot_cooldown: cooldown,
            bullets: Vec::new(),
            is_alive: max_health > 0,
            hit_flash: 0.0,
            muzzle_flash: 0.0,
        }
    }

    /// Advance timers, facing and owned bullets by `dt` ms.
    /// `fire_rate` scales how fast the shoot cooldown recovers.
    pub fn update(&mut self, dt: f32, smoothing: f32, fire_rate: f32) {
        self.shoot_cooldown -= dt * fire_rate;
        self.hit_flash = (self.hit_flash - dt).max(0.0);
        self.muzzle_flash = (self.muzzle_flash - dt).max(0.0);

        self.angle += shortest_arc(self.angle, self.target_angle) * smoothing;

        for bullet in &mut self.bullets {
            bullet.advance(dt);
        }
        self.bullets.retain(|b| b.life > 0.0);
    }

    pub fn can_shoot(&self) -> bool {
        self.is_alive && self.shoot_cooldown <= 0.0
    }

    /// Snap facing toward a point (aiming isn't smoothed)
    pub fn face(&mut self, target: Vec2) {
        let angle = angle_to(self.pos, target);
        self.angle = angle;
        self.target_angle = angle;
    }

    /// Apply damage. Returns true only on the alive-to-dead transition.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive {
            return false;
        }
        let amount = amount.max(0.0).round() as i32;
        self.health = self.health.saturating_sub(amount).max(0);
        self.hit_flash = HIT_FLASH_MS;
        if self.health == 0 {
            self.is_alive = false;
            return true;
        }
        false
    }

    /// Heal up to max health. A dead hull with health restored comes back.
    pub fn heal(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.is_alive = self.health > 0;
    }

    pub fn heal_full(&mut self) {
        self.health = self.max_health;
        self.is_alive = self.health > 0;
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    /// Change max health keeping health inside [0, max]
    pub fn set_max_health(&mut self, max_health: i32) {
        self.max_health = max_health.max(1);
        self.health = self.health.min(self.max_health);
        self.is_alive = self.health > 0;
    }
}

/// Main tank or escort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankKind {
    Main,
    Mini,
}

/// Base stat block for a tank kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankStats {
    pub health: i32,
    pub damage: f32,
    pub speed: f32,
    pub size: f32,
    pub cooldown: f32,
    pub range: f32,
    pub bullet: BulletSpec,
}

impl TankKind {
    pub fn base_stats(self) -> TankStats {
        match self {
            TankKind::Main => TankStats {
                health: MAIN_HEALTH,
                damage: MAIN_DAMAGE,
                speed: MAIN_SPEED,
                size: MAIN_SIZE,
                cooldown: MAIN_COOLDOWN_MS,
                range: MAIN_RANGE,
                bullet: BulletSpec {
                    speed: MAIN_BULLET_SPEED,
                    size: MAIN_BULLET_SIZE,
                    life: MAIN_BULLET_LIFE_MS,
                    penetration: MAIN_BULLET_PENETRATION,
                    explosion_radius: 0.0,
                },
            },
            TankKind::Mini => TankStats {
                health: MINI_HEALTH,
                damage: MINI_DAMAGE,
                speed: MINI_SPEED,
                size: MINI_SIZE,
                cooldown: MINI_COOLDOWN_MS,
                range: MINI_RANGE,
                bullet: BulletSpec {
                    speed: MINI_BULLET_SPEED,
                    size: MINI_BULLET_SIZE,
                    life: MINI_BULLET_LIFE_MS,
                    penetration: 1,
                    explosion_radius: 0.0,
                },
            },
        }
    }

    fn owner(self) -> BulletOwner {
        match self {
            TankKind::Main => BulletOwner::Main,
            TankKind::Mini => BulletOwner::Mini,
        }
    }
}

/// Transient shot adjustments coming from active skills
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotModifiers {
    pub damage_mult: f32,
    /// Extra bullets fanned out on each side pair
    pub extra_shots: u32,
    /// Angle between fanned bullets (radians)
    pub spread: f32,
}

impl Default for ShotModifiers {
    fn default() -> Self {
        Self {
            damage_mult: 1.0,
            extra_shots: 0,
            spread: 0.0,
        }
    }
}

/// A player-side tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    pub kind: TankKind,
    pub hull: Hull,
    pub range: f32,
    pub bullet: BulletSpec,
}

impl Tank {
    pub fn new(kind: TankKind, pos: Vec2) -> Self {
        let stats = kind.base_stats();
        Self {
            kind,
            hull: Hull::new(
                pos,
                stats.health,
                stats.damage,
                stats.speed,
                stats.size,
                stats.cooldown,
            ),
            range: stats.range,
            bullet: stats.bullet,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.hull.update(dt, TANK_TURN_SMOOTHING, 1.0);
    }

    pub fn is_alive(&self) -> bool {
        self.hull.is_alive
    }

    /// Fire toward `target` (or along facing). Returns false if the cooldown
    /// isn't ready or the tank is dead.
    pub fn shoot(&mut self, target: Option<Vec2>, shot: &ShotModifiers) -> bool {
        if !self.hull.can_shoot() {
            return false;
        }
        if let Some(target) = target {
            self.hull.face(target);
        }

        let damage = self.hull.damage * shot.damage_mult;
        let muzzle = self.hull.pos + polar_to_cartesian(self.hull.size, self.hull.angle);
        let owner = self.kind.owner();
        self.hull
            .bullets
            .push(Bullet::new(muzzle, self.hull.angle, &self.bullet, damage, owner));
        for i in 1..=shot.extra_shots {
            let offset = shot.spread * i as f32;
            for angle in [self.hull.angle - offset, self.hull.angle + offset] {
                self.hull
                    .bullets
                    .push(Bullet::new(muzzle, angle, &self.bullet, damage, owner));
            }
        }

        self.hull.shoot_cooldown = self.hull.max_shoot_cooldown;
        self.hull.muzzle_flash = MUZZLE_FLASH_MS;
        true
    }
}

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Heavy,
    Fast,
    Sniper,
    Boss,
}

/// Base stat block for an enemy kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    pub health: i32,
    pub damage: f32,
    pub speed: f32,
    pub size: f32,
    pub range: f32,
    pub cooldown: f32,
    pub value: u32,
    /// Half-width of the uniform aim error (radians)
    pub inaccuracy: f32,
    pub bullet_speed: f32,
}

impl EnemyKind {
    pub fn profile(self) -> EnemyProfile {
        let (health, damage, speed, size, range, cooldown, value) = match self {
            EnemyKind::Basic => (30, 8.0, 1.2, 15.0, 250.0, 1500.0, 10),
            EnemyKind::Heavy => (80, 15.0, 0.7, 20.0, 220.0, 2500.0, 25),
            EnemyKind::Fast => (20, 6.0, 2.2, 12.0, 180.0, 1000.0, 15),
            EnemyKind::Sniper => (25, 20.0, 0.9, 14.0, 450.0, 3000.0, 20),
            EnemyKind::Boss => (400, 25.0, 0.8, 35.0, 300.0, 800.0, 100),
        };
        let inaccuracy = match self {
            EnemyKind::Fast => 0.2,
            EnemyKind::Sniper => 0.0,
            _ => 0.1,
        };
        let bullet_speed = match self {
            EnemyKind::Sniper => ENEMY_BULLET_SPEED * 2.0,
            _ => ENEMY_BULLET_SPEED,
        };
        EnemyProfile {
            health,
            damage,
            speed,
            size,
            range,
            cooldown,
            value,
            inaccuracy,
            bullet_speed,
        }
    }

    /// Tint the renderer uses to tell kinds apart
    pub fn indicator(self) -> &'static str {
        match self {
            EnemyKind::Basic => "#e05050",
            EnemyKind::Heavy => "#8b4513",
            EnemyKind::Fast => "#ffa500",
            EnemyKind::Sniper => "#9932cc",
            EnemyKind::Boss => "#b22222",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnemyKind::Basic => "basic",
            EnemyKind::Heavy => "heavy",
            EnemyKind::Fast => "fast",
            EnemyKind::Sniper => "sniper",
            EnemyKind::Boss => "boss",
        }
    }
}

/// Which player tank an enemy is locked on to. Re-resolved every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    Main,
    Mini(usize),
}

/// An AI-controlled enemy tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub hull: Hull,
    pub range: f32,
    pub value: u32,
    pub inaccuracy: f32,
    pub bullet: BulletSpec,
    /// Time spent alive (ms); drives boss phases and strafing wobble
    pub state_timer: f32,
    pub target: Option<TargetRef>,
    /// Temporary slows and freezes
    pub modifiers: ModifierStack,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, wave: u32) -> Self {
        let p = kind.profile();
        let health_scale = 1.0 + ENEMY_HEALTH_SCALE_PER_WAVE * wave.saturating_sub(1) as f32;
        let health = (p.health as f32 * health_scale).round() as i32;
        Self {
            id,
            kind,
            hull: Hull::new(pos, health, p.damage, p.speed, p.size, p.cooldown),
            range: p.range,
            value: p.value,
            inaccuracy: p.inaccuracy,
            bullet: BulletSpec {
                speed: p.bullet_speed,
                size: ENEMY_BULLET_SIZE,
                life: ENEMY_BULLET_LIFE_MS,
                penetration: 1,
                explosion_radius: 0.0,
            },
            state_timer: 0.0,
            target: None,
            modifiers: ModifierStack::new(),
        }
    }

    /// Advance timers, facing and bullets
    pub fn update(&mut self, dt: f32) {
        let fire_rate = self.modifiers.multiplier(Stat::FireRate);
        self.hull.update(dt, ENEMY_TURN_SMOOTHING, fire_rate);
        self.modifiers.tick(dt);
        self.state_timer += dt;
    }

    pub fn is_alive(&self) -> bool {
        self.hull.is_alive
    }

    /// Movement speed after slows
    pub fn effective_speed(&self) -> f32 {
        self.modifiers.apply(Stat::Speed, self.hull.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_damage_reports_transition_once() {
        let mut tank = Tank::new(TankKind::Mini, Vec2::ZERO);
        assert!(!tank.hull.take_damage(20.0));
        assert!(tank.hull.take_damage(100.0));
        assert_eq!(tank.hull.health, 0);
        assert!(!tank.is_alive());
        // Already dead: no-op
        assert!(!tank.hull.take_damage(5.0));
        assert_eq!(tank.hull.health, 0);
    }

    #[test]
    fn test_heal_clamps_and_revives() {
        let mut tank = Tank::new(TankKind::Main, Vec2::ZERO);
        tank.hull.take_damage(1000.0);
        assert!(!tank.is_alive());
        tank.hull.heal(30);
        assert!(tank.is_alive());
        assert_eq!(tank.hull.health, 30);
        tank.hull.heal(10_000);
        assert_eq!(tank.hull.health, tank.hull.max_health);
    }

    #[test]
    fn test_fractional_damage_rounds() {
        let mut tank = Tank::new(TankKind::Main, Vec2::ZERO);
        // Explosion edge tail
        assert!(!tank.hull.take_damage(0.05));
        assert_eq!(tank.hull.health, MAIN_HEALTH);
        tank.hull.take_damage(2.6);
        assert_eq!(tank.hull.health, MAIN_HEALTH - 3);
    }

    #[test]
    fn test_huge_heal_saturates() {
        let mut tank = Tank::new(TankKind::Main, Vec2::ZERO);
        tank.hull.take_damage(10.0);
        tank.hull.heal(i32::MAX);
        assert_eq!(tank.hull.health, tank.hull.max_health);
        assert!(tank.is_alive());
    }

    #[test]
    fn test_shoot_gated_by_cooldown() {
        let mut tank = Tank::new(TankKind::Main, Vec2::ZERO);
        let shot = ShotModifiers::default();
        assert!(tank.shoot(None, &shot));
        assert!(!tank.shoot(None, &shot));
        assert_eq!(tank.hull.bullets.len(), 1);

        tank.update(MAIN_COOLDOWN_MS - 1.0);
        assert!(!tank.shoot(None, &shot));
        tank.update(1.0);
        assert!(tank.shoot(None, &shot));
        assert_eq!(tank.hull.bullets.len(), 2);
    }

    #[test]
    fn test_shoot_snaps_aim() {
        let mut tank = Tank::new(TankKind::Main, Vec2::ZERO);
        tank.shoot(Some(Vec2::new(0.0, 50.0)), &ShotModifiers::default());
        assert!((tank.hull.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(tank.hull.angle, tank.hull.target_angle);
        assert_eq!(tank.hull.bullets[0].penetration, MAIN_BULLET_PENETRATION);
    }

    #[test]
    fn test_dead_tank_cannot_shoot() {
        let mut tank = Tank::new(TankKind::Mini, Vec2::ZERO);
        tank.hull.take_damage(1000.0);
        assert!(!tank.shoot(None, &ShotModifiers::default()));
    }

    #[test]
    fn test_multi_shot_fans_bullets() {
        let mut tank = Tank::new(TankKind::Mini, Vec2::ZERO);
        let shot = ShotModifiers {
            damage_mult: 1.5,
            extra_shots: 2,
            spread: 0.2,
        };
        tank.shoot(None, &shot);
        assert_eq!(tank.hull.bullets.len(), 5);
        assert!((tank.hull.bullets[0].damage - MINI_DAMAGE * 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_bullets_expire() {
        let mut tank = Tank::new(TankKind::Mini, Vec2::ZERO);
        tank.shoot(None, &ShotModifiers::default());
        let start = tank.hull.bullets[0].pos;
        tank.update(REFERENCE_FRAME_MS);
        let moved = tank.hull.bullets[0].pos - start;
        assert!((moved.length() - MINI_BULLET_SPEED).abs() < 1e-3);
        tank.update(MINI_BULLET_LIFE_MS);
        assert!(tank.hull.bullets.is_empty());
    }

    #[test]
    fn test_angle_smoothing_takes_short_way() {
        let mut hull = Hull::new(Vec2::ZERO, 10, 1.0, 1.0, 5.0, 100.0);
        hull.angle = 3.0;
        hull.target_angle = -3.0;
        hull.update(16.0, ENEMY_TURN_SMOOTHING, 1.0);
        // Short way round is forward through π, not back through 0
        assert!(hull.angle > 3.0);
    }

    #[test]
    fn test_enemy_health_scales_with_wave() {
        let e1 = Enemy::new(1, EnemyKind::Basic, Vec2::ZERO, 1);
        let e11 = Enemy::new(2, EnemyKind::Basic, Vec2::ZERO, 11);
        assert_eq!(e1.hull.max_health, 30);
        assert_eq!(e11.hull.max_health, 60);
        assert_eq!(EnemyKind::Sniper.profile().bullet_speed, ENEMY_BULLET_SPEED * 2.0);
    }
}
