//! Per-frame hit resolution
//!
//! Runs after every entity has moved: player bullets against enemies,
//! enemy bullets against the squad, then body overlap separation.

use glam::Vec2;

use super::entity::{Bullet, Enemy, Hull, TargetRef};
use super::events::SimEvents;
use super::player::Player;
use crate::audio::SoundId;
use crate::{circles_overlap, distance};

/// Counts from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatReport {
    pub hits: usize,
    pub enemies_destroyed: usize,
    pub tanks_destroyed: usize,
}

/// Resolve every collision for this frame
pub fn resolve(player: &mut Player, enemies: &mut [Enemy], events: &mut SimEvents) -> CombatReport {
    let mut report = CombatReport::default();
    resolve_player_bullets(player, enemies, events, &mut report);
    resolve_enemy_bullets(player, enemies, events, &mut report);
    separate_bodies(player, enemies);
    report
}

/// Player bullets against living enemies. A bullet keeps going until it has
/// struck `penetration` distinct enemies; each hit may also detonate.
pub fn resolve_player_bullets(
    player: &mut Player,
    enemies: &mut [Enemy],
    events: &mut SimEvents,
    report: &mut CombatReport,
) {
    let explosive = player.flags.explosive_shot;
    for tank in player.tanks_mut() {
        for bullet in &mut tank.hull.bullets {
            for i in 0..enemies.len() {
                if bullet.hits >= bullet.penetration {
                    break;
                }
                let enemy = &enemies[i];
                if !enemy.is_alive()
                    || bullet.struck.contains(&enemy.id)
                    || !circles_overlap(bullet.pos, bullet.radius(), enemy.hull.pos, enemy.hull.size)
                {
                    continue;
                }

                bullet.hits += 1;
                bullet.struck.push(enemy.id);
                report.hits += 1;
                hit_enemy(&mut enemies[i], bullet.damage, events, report);

                let radius = bullet.explosion_radius.max(explosive.unwrap_or(0.0));
                if radius > 0.0 {
                    explode(bullet, radius, enemies, events, report);
                }
            }
        }
        tank.hull.bullets.retain(|b| b.hits < b.penetration);
    }
}

fn hit_enemy(enemy: &mut Enemy, damage: f32, events: &mut SimEvents, report: &mut CombatReport) {
    events.damage_number(enemy.hull.pos, damage);
    events.sound(SoundId::Hit);
    if enemy.hull.take_damage(damage) {
        report.enemies_destroyed += 1;
        events.sound(SoundId::EnemyDestroyed);
    }
}

/// Linear-falloff area damage around the bullet. Layered on top of the
/// direct hit, so the struck enemy takes both.
fn explode(
    bullet: &Bullet,
    radius: f32,
    enemies: &mut [Enemy],
    events: &mut SimEvents,
    report: &mut CombatReport,
) {
    events.explosion(bullet.pos, radius);
    events.sound(SoundId::Explosion);
    for enemy in enemies.iter_mut() {
        if !enemy.is_alive() {
            continue;
        }
        let dist = distance(bullet.pos, enemy.hull.pos);
        if dist >= radius {
            continue;
        }
        let damage = bullet.damage * (1.0 - dist / radius);
        if damage <= 0.0 {
            continue;
        }
        events.damage_number(enemy.hull.pos, damage);
        if enemy.hull.take_damage(damage) {
            report.enemies_destroyed += 1;
            events.sound(SoundId::EnemyDestroyed);
        }
    }
}

/// Enemy bullets against the squad. No penetration or explosions on this
/// side: a bullet is gone after its first hit.
pub fn resolve_enemy_bullets(
    player: &mut Player,
    enemies: &mut [Enemy],
    events: &mut SimEvents,
    report: &mut CombatReport,
) {
    for enemy in enemies.iter_mut() {
        let mut i = 0;
        while i < enemy.hull.bullets.len() {
            let bullet = &enemy.hull.bullets[i];
            let target = player
                .tanks()
                .filter(|(_, t)| t.is_alive())
                .find(|(_, t)| circles_overlap(bullet.pos, bullet.radius(), t.hull.pos, t.hull.size))
                .map(|(r, _)| r);
            let Some(target) = target else {
                i += 1;
                continue;
            };

            let bullet = enemy.hull.bullets.swap_remove(i);
            report.hits += 1;
            if let Some(tank) = player.tank(target) {
                events.damage_number(tank.hull.pos, bullet.damage);
            }
            events.sound(SoundId::Hit);
            if player.damage_tank(target, bullet.damage) {
                report.tanks_destroyed += 1;
                events.sound(SoundId::TankDestroyed);
                match target {
                    TargetRef::Main => log::info!("Main tank destroyed"),
                    TargetRef::Mini(n) => log::debug!("Mini tank {} destroyed", n),
                }
            }
        }
    }
}

/// Push two overlapping circles apart along the line between their centers,
/// half the overlap each. Returns true if they overlapped.
pub fn separate_pair(a: &mut Vec2, ra: f32, b: &mut Vec2, rb: f32) -> bool {
    let offset = *b - *a;
    let dist = offset.length();
    let min_dist = ra + rb;
    if dist >= min_dist {
        return false;
    }
    // Coincident centers have no bearing; pick one
    let dir = if dist > f32::EPSILON { offset / dist } else { Vec2::X };
    let push = dir * (min_dist - dist) * 0.5;
    *a -= push;
    *b += push;
    true
}

/// Soft separation of every living body, tanks and enemies alike
pub fn separate_bodies(player: &mut Player, enemies: &mut [Enemy]) {
    let mut hulls: Vec<&mut Hull> = player
        .tanks_mut()
        .map(|t| &mut t.hull)
        .chain(enemies.iter_mut().map(|e| &mut e.hull))
        .filter(|h| h.is_alive)
        .collect();

    for i in 0..hulls.len() {
        let (head, tail) = hulls.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            separate_pair(&mut a.pos, a.size, &mut b.pos, b.size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::entity::{BulletOwner, EnemyKind};
    use proptest::prelude::*;

    fn main_bullet(player: &Player, pos: Vec2) -> Bullet {
        let tank = &player.main_tank;
        Bullet::new(pos, 0.0, &tank.bullet, 20.0, BulletOwner::Main)
    }

    /// Player with no escorts and its main tank parked out of the way
    fn lone_player() -> Player {
        let mut player = Player::new();
        player.mini_tanks.clear();
        player.main_tank.hull.pos = Vec2::new(-1000.0, 0.0);
        player
    }

    #[test]
    fn test_penetrating_bullet_hits_two_then_goes() {
        let mut player = lone_player();
        let mut enemies = vec![
            Enemy::new(1, EnemyKind::Heavy, Vec2::new(0.0, 0.0), 1),
            Enemy::new(2, EnemyKind::Heavy, Vec2::new(5.0, 0.0), 1),
        ];
        player.main_tank.hull.bullets.push(main_bullet(&player, Vec2::new(2.0, 0.0)));
        let mut events = SimEvents::new();
        let report = resolve(&mut player, &mut enemies, &mut events);

        assert_eq!(report.hits, 2);
        assert_eq!(enemies[0].hull.health, 60);
        assert_eq!(enemies[1].hull.health, 60);
        assert!(player.main_tank.hull.bullets.is_empty());
    }

    #[test]
    fn test_penetrating_bullet_survives_single_hit() {
        let mut player = lone_player();
        let mut enemies = vec![Enemy::new(1, EnemyKind::Heavy, Vec2::ZERO, 1)];
        player.main_tank.hull.bullets.push(main_bullet(&player, Vec2::new(2.0, 0.0)));
        let mut events = SimEvents::new();
        resolve_player_bullets(&mut player, &mut enemies, &mut events, &mut CombatReport::default());

        assert!(enemies[0].is_alive());
        assert_eq!(player.main_tank.hull.bullets.len(), 1);
        assert_eq!(player.main_tank.hull.bullets[0].hits, 1);

        // Still overlapping next frame: the same enemy isn't struck twice
        resolve_player_bullets(&mut player, &mut enemies, &mut events, &mut CombatReport::default());
        assert_eq!(enemies[0].hull.health, 60);
    }

    #[test]
    fn test_explosive_shot_layers_area_damage() {
        let mut player = lone_player();
        player.flags.explosive_shot = Some(60.0);
        let mut enemies = vec![
            Enemy::new(1, EnemyKind::Heavy, Vec2::ZERO, 1),
            Enemy::new(2, EnemyKind::Heavy, Vec2::new(30.0, 0.0), 1),
            Enemy::new(3, EnemyKind::Heavy, Vec2::new(200.0, 0.0), 1),
        ];
        let mut bullet = main_bullet(&player, Vec2::ZERO);
        bullet.penetration = 1;
        player.main_tank.hull.bullets.push(bullet);
        let mut events = SimEvents::new();
        resolve_player_bullets(&mut player, &mut enemies, &mut events, &mut CombatReport::default());

        // Direct 20 + full-strength blast 20
        assert_eq!(enemies[0].hull.health, 40);
        // Half-strength blast at half the radius
        assert_eq!(enemies[1].hull.health, 70);
        assert_eq!(enemies[2].hull.health, 80);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, crate::sim::events::SimEvent::Explosion { .. }))
        );
    }

    #[test]
    fn test_enemy_bullet_hits_first_tank_only() {
        let mut player = Player::new();
        let mut enemies = vec![Enemy::new(1, EnemyKind::Sniper, Vec2::new(300.0, 0.0), 1)];
        let spec = enemies[0].bullet;
        enemies[0]
            .hull
            .bullets
            .push(Bullet::new(Vec2::new(5.0, 0.0), 0.0, &spec, 20.0, BulletOwner::Enemy));
        let mut events = SimEvents::new();
        let report = resolve(&mut player, &mut enemies, &mut events);

        assert_eq!(report.hits, 1);
        assert_eq!(player.main_tank.hull.health, MAIN_HEALTH - 20);
        assert!(enemies[0].hull.bullets.is_empty());
    }

    #[test]
    fn test_dead_enemies_ignored() {
        let mut player = lone_player();
        let mut enemies = vec![Enemy::new(1, EnemyKind::Basic, Vec2::ZERO, 1)];
        enemies[0].hull.take_damage(1000.0);
        player.main_tank.hull.bullets.push(main_bullet(&player, Vec2::ZERO));
        let report = resolve(&mut player, &mut enemies, &mut SimEvents::new());
        assert_eq!(report.hits, 0);
        assert_eq!(player.main_tank.hull.bullets.len(), 1);
    }

    #[test]
    fn test_bodies_pushed_apart() {
        let mut player = lone_player();
        let mut enemies = vec![
            Enemy::new(1, EnemyKind::Basic, Vec2::ZERO, 1),
            Enemy::new(2, EnemyKind::Basic, Vec2::new(10.0, 0.0), 1),
        ];
        separate_bodies(&mut player, &mut enemies);
        let gap = distance(enemies[0].hull.pos, enemies[1].hull.pos);
        assert!((gap - 30.0).abs() < 1e-4);
        assert!((enemies[0].hull.pos.x - -10.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn separation_restores_contact_distance(
            ax in -500.0f32..500.0,
            ay in -500.0f32..500.0,
            angle in 0.0f32..std::f32::consts::TAU,
            ra in 5.0f32..40.0,
            rb in 5.0f32..40.0,
            frac in 0.01f32..0.99,
        ) {
            let mut a = Vec2::new(ax, ay);
            let mut b = a + Vec2::from_angle(angle) * (ra + rb) * frac;
            let (a0, b0) = (a, b);

            prop_assert!(separate_pair(&mut a, ra, &mut b, rb));
            prop_assert!((distance(a, b) - (ra + rb)).abs() < 1e-2);
            // Split evenly
            prop_assert!(((a - a0).length() - (b - b0).length()).abs() < 1e-3);
        }

        #[test]
        fn separation_leaves_clear_pairs_alone(
            gap in 0.0f32..100.0,
            ra in 5.0f32..40.0,
            rb in 5.0f32..40.0,
        ) {
            let mut a = Vec2::ZERO;
            let mut b = Vec2::new(ra + rb + gap, 0.0);
            prop_assert!(!separate_pair(&mut a, ra, &mut b, rb));
            prop_assert_eq!(a, Vec2::ZERO);
        }
    }
}
