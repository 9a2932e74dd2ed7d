//! Wave spawning and progression
//!
//! Enemies trickle in one per spawn interval on a ring around the main tank.
//! Enemy count and spawn rate both scale with the wave number up to a cap.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Enemy, EnemyKind};
use super::events::{SimEvent, SimEvents};
use super::player::Player;
use crate::consts::*;
use crate::polar_to_cartesian;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveManager {
    pub current_wave: u32,
    pub enemies: Vec<Enemy>,
    pub enemies_spawned: u32,
    pub total_enemies_in_wave: u32,
    /// Time accumulated toward the next spawn (ms)
    pub spawn_timer: f32,
    pub spawn_interval: f32,
    pub wave_active: bool,
    pub wave_paused: bool,
    /// Kills this wave
    pub enemies_killed: u32,
    next_enemy_id: u32,
}

impl Default for WaveManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of enemies in wave `n`
pub fn enemies_for_wave(n: u32) -> u32 {
    (WAVE_BASE_ENEMIES + WAVE_ENEMIES_PER_WAVE * n).min(WAVE_MAX_ENEMIES)
}

/// Spawn interval (ms) for wave `n`
pub fn spawn_interval_for_wave(n: u32) -> f32 {
    (WAVE_BASE_SPAWN_INTERVAL_MS - WAVE_SPAWN_INTERVAL_STEP_MS * n as f32)
        .max(WAVE_MIN_SPAWN_INTERVAL_MS)
}

/// Draw weights for the regular kinds at wave `w`
pub fn enemy_weights(w: u32) -> [(EnemyKind, f32); 4] {
    let w = w as f32;
    [
        (EnemyKind::Basic, (0.6 - 0.05 * w).max(0.2)),
        (EnemyKind::Heavy, (0.15 + 0.02 * w).min(0.3)),
        (EnemyKind::Fast, (0.15 + 0.02 * w).min(0.3)),
        (EnemyKind::Sniper, (0.1 + 0.01 * w).min(0.2)),
    ]
}

impl WaveManager {
    pub fn new() -> Self {
        Self {
            current_wave: 1,
            enemies: Vec::new(),
            enemies_spawned: 0,
            total_enemies_in_wave: 0,
            spawn_timer: 0.0,
            spawn_interval: spawn_interval_for_wave(1),
            wave_active: false,
            wave_paused: false,
            enemies_killed: 0,
            next_enemy_id: 1,
        }
    }

    /// Reset counters and begin spawning wave `n`
    pub fn start_wave(&mut self, n: u32, events: &mut SimEvents) {
        let n = n.max(1);
        self.current_wave = n;
        self.enemies.clear();
        self.enemies_spawned = 0;
        self.enemies_killed = 0;
        self.total_enemies_in_wave = enemies_for_wave(n);
        self.spawn_interval = spawn_interval_for_wave(n);
        self.spawn_timer = 0.0;
        self.wave_active = true;
        self.wave_paused = false;

        log::info!(
            "Wave {}: {} enemies, spawn every {}ms",
            n,
            self.total_enemies_in_wave,
            self.spawn_interval
        );
        events.push(SimEvent::WaveStarted { wave: n });
    }

    /// Freeze spawning and enemy updates without discarding state
    pub fn pause(&mut self) {
        self.wave_paused = true;
    }

    pub fn resume(&mut self) {
        self.wave_paused = false;
    }

    /// Wave is done once everything has spawned and nothing is left alive
    pub fn is_wave_complete(&self) -> bool {
        self.enemies_spawned >= self.total_enemies_in_wave && self.enemies.is_empty()
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.is_alive())
    }

    /// Collect rewards for dead enemies, run AI for the rest, spawn more
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        player: &mut Player,
        rng: &mut R,
        events: &mut SimEvents,
    ) {
        if !self.wave_active || self.wave_paused {
            return;
        }

        let mut i = 0;
        while i < self.enemies.len() {
            if self.enemies[i].is_alive() {
                i += 1;
                continue;
            }
            let dead = self.enemies.swap_remove(i);
            self.enemies_killed += 1;
            player.reward_kill(dead.value, events);
        }
        // swap_remove scrambles order; keep spawn order for stable iteration
        self.enemies.sort_by_key(|e| e.id);

        for enemy in &mut self.enemies {
            enemy.update_ai(dt, player, rng, events);
            enemy.update(dt);
        }

        if self.enemies_spawned < self.total_enemies_in_wave {
            self.spawn_timer += dt;
            while self.spawn_timer >= self.spawn_interval
                && self.enemies_spawned < self.total_enemies_in_wave
            {
                self.spawn_timer -= self.spawn_interval;
                self.spawn_enemy(player, rng);
            }
        }
    }

    /// Spawn one enemy on the ring around the main tank
    pub fn spawn_enemy<R: Rng + ?Sized>(&mut self, player: &Player, rng: &mut R) -> u32 {
        let kind = self.choose_enemy_type(rng);
        let theta = rng.random::<f32>() * std::f32::consts::TAU;
        let pos = player.main_tank.hull.pos + polar_to_cartesian(SPAWN_RADIUS, theta);
        self.spawn_enemy_at(kind, pos)
    }

    /// Spawn a specific kind at a position. Counts toward the wave total.
    pub fn spawn_enemy_at(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        let mut enemy = Enemy::new(id, kind, pos, self.current_wave);
        enemy.hull.angle = crate::angle_to(pos, Vec2::ZERO);
        enemy.hull.target_angle = enemy.hull.angle;
        self.enemies.push(enemy);
        self.enemies_spawned += 1;
        log::debug!("Spawned {} #{} at ({:.0}, {:.0})", kind.as_str(), id, pos.x, pos.y);
        id
    }

    /// Every 5th wave may force a boss, otherwise a weighted draw
    pub fn choose_enemy_type<R: Rng + ?Sized>(&self, rng: &mut R) -> EnemyKind {
        if self.current_wave % BOSS_WAVE_PERIOD == 0 && rng.random_bool(BOSS_CHANCE) {
            return EnemyKind::Boss;
        }
        let weights = enemy_weights(self.current_wave);
        let total: f32 = weights.iter().map(|(_, w)| w).sum();
        let mut roll = rng.random::<f32>() * total;
        for (kind, weight) in weights {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        EnemyKind::Basic
    }

    /// Drop every enemy and stop the wave (battle teardown)
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.wave_active = false;
        self.wave_paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_wave_scaling() {
        let mut waves = WaveManager::new();
        let mut events = SimEvents::new();
        waves.start_wave(1, &mut events);
        assert_eq!(waves.total_enemies_in_wave, 13);
        assert_eq!(waves.spawn_interval, 2120.0);

        waves.start_wave(10, &mut events);
        assert_eq!(waves.total_enemies_in_wave, 40);
        assert_eq!(waves.spawn_interval, 1400.0);

        assert_eq!(spawn_interval_for_wave(50), WAVE_MIN_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_spawns_one_per_interval_on_ring() {
        let mut waves = WaveManager::new();
        let mut player = Player::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = SimEvents::new();
        waves.start_wave(1, &mut events);

        waves.update(2000.0, &mut player, &mut rng, &mut events);
        assert_eq!(waves.enemies_spawned, 0);
        waves.update(200.0, &mut player, &mut rng, &mut events);
        assert_eq!(waves.enemies_spawned, 1);

        let d = waves.enemies[0].hull.pos.length();
        assert!((d - SPAWN_RADIUS).abs() < 1e-2);
    }

    #[test]
    fn test_completion_requires_all_spawned_and_dead() {
        let mut waves = WaveManager::new();
        let mut player = Player::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = SimEvents::new();
        waves.start_wave(1, &mut events);
        assert!(!waves.is_wave_complete());

        // Spawn everything at once
        for _ in 0..waves.total_enemies_in_wave {
            waves.spawn_enemy(&player, &mut rng);
        }
        assert!(!waves.is_wave_complete());

        for enemy in &mut waves.enemies {
            enemy.hull.take_damage(10_000.0);
        }
        // Dead but not yet collected
        assert!(!waves.is_wave_complete());

        let score_before = player.progression.score;
        waves.update(1.0, &mut player, &mut rng, &mut events);
        assert!(waves.is_wave_complete());
        assert!(player.progression.score > score_before);
        assert_eq!(waves.enemies_killed, waves.total_enemies_in_wave);
    }

    #[test]
    fn test_kill_rewards() {
        let mut waves = WaveManager::new();
        let mut player = Player::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = SimEvents::new();
        waves.start_wave(1, &mut events);
        waves.spawn_enemy_at(EnemyKind::Heavy, Vec2::new(1000.0, 0.0));
        waves.enemies[0].hull.take_damage(10_000.0);
        waves.update(1.0, &mut player, &mut rng, &mut events);

        assert_eq!(player.progression.score, 25);
        assert_eq!(player.progression.experience, 12);
        assert_eq!(player.progression.coins, 6);
    }

    #[test]
    fn test_paused_wave_is_frozen() {
        let mut waves = WaveManager::new();
        let mut player = Player::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = SimEvents::new();
        waves.start_wave(2, &mut events);
        waves.spawn_enemy_at(EnemyKind::Basic, Vec2::new(1000.0, 0.0));
        waves.pause();
        waves.update(10_000.0, &mut player, &mut rng, &mut events);
        assert_eq!(waves.enemies_spawned, 1);
        assert_eq!(waves.enemies[0].hull.pos, Vec2::new(1000.0, 0.0));

        waves.resume();
        waves.update(16.0, &mut player, &mut rng, &mut events);
        assert!(waves.enemies[0].hull.pos.x < 1000.0);
    }

    #[test]
    fn test_weights_shift_with_wave() {
        let early = enemy_weights(1);
        let late = enemy_weights(20);
        assert!(early[0].1 > late[0].1);
        assert_eq!(late[0].1, 0.2);
        assert_eq!(late[1].1, 0.3);
        assert_eq!(late[3].1, 0.2);
    }

    #[test]
    fn test_boss_only_on_fifth_waves() {
        let mut waves = WaveManager::new();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut events = SimEvents::new();
        waves.start_wave(4, &mut events);
        assert!((0..500).all(|_| waves.choose_enemy_type(&mut rng) != EnemyKind::Boss));

        waves.start_wave(5, &mut events);
        let bosses = (0..1000)
            .filter(|_| waves.choose_enemy_type(&mut rng) == EnemyKind::Boss)
            .count();
        assert!(bosses > 200 && bosses < 400);
    }
}
