//! Permanent upgrades bought with coins on the base screen
//!
//! Upgrade levels only feed `StatBonuses`; the squad's stats are always
//! rebuilt from base values, so buying an upgrade never stacks twice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::events::{NoticeKind, SimEvents};
use crate::sim::player::{Progression, StatBonuses};

pub const MAX_UPGRADE_LEVEL: u32 = 10;
pub const MAX_FORMATION_LEVEL: u32 = 6;
pub const UPGRADE_COST_GROWTH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    MainHealth,
    MainDamage,
    MainSpeed,
    MiniHealth,
    MiniDamage,
    FireRate,
    Shield,
    Formation,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 8] = [
        UpgradeKind::MainHealth,
        UpgradeKind::MainDamage,
        UpgradeKind::MainSpeed,
        UpgradeKind::MiniHealth,
        UpgradeKind::MiniDamage,
        UpgradeKind::FireRate,
        UpgradeKind::Shield,
        UpgradeKind::Formation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeKind::MainHealth => "main_health",
            UpgradeKind::MainDamage => "main_damage",
            UpgradeKind::MainSpeed => "main_speed",
            UpgradeKind::MiniHealth => "mini_health",
            UpgradeKind::MiniDamage => "mini_damage",
            UpgradeKind::FireRate => "fire_rate",
            UpgradeKind::Shield => "shield",
            UpgradeKind::Formation => "formation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::MainHealth => "Reinforced Hull",
            UpgradeKind::MainDamage => "Heavy Cannon",
            UpgradeKind::MainSpeed => "Turbo Engine",
            UpgradeKind::MiniHealth => "Escort Armor",
            UpgradeKind::MiniDamage => "Escort Guns",
            UpgradeKind::FireRate => "Autoloader",
            UpgradeKind::Shield => "Shield Generator",
            UpgradeKind::Formation => "Formation Slot",
        }
    }

    pub fn max_level(self) -> u32 {
        match self {
            UpgradeKind::Formation => MAX_FORMATION_LEVEL,
            _ => MAX_UPGRADE_LEVEL,
        }
    }

    /// Price of the first level
    pub fn base_cost(self) -> u32 {
        match self {
            UpgradeKind::MainHealth => 100,
            UpgradeKind::MainDamage => 150,
            UpgradeKind::MainSpeed => 120,
            UpgradeKind::MiniHealth => 80,
            UpgradeKind::MiniDamage => 100,
            UpgradeKind::FireRate => 200,
            UpgradeKind::Shield => 150,
            UpgradeKind::Formation => 300,
        }
    }

    /// Price of buying the level after `level`
    pub fn cost_at(self, level: u32) -> u32 {
        (self.base_cost() as f64 * UPGRADE_COST_GROWTH.powi(level as i32)).floor() as u32
    }
}

/// Owned upgrade levels, keyed by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Upgrades {
    levels: BTreeMap<UpgradeKind, u32>,
}

impl Upgrades {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_maxed(&self, kind: UpgradeKind) -> bool {
        self.level(kind) >= kind.max_level()
    }

    /// Price of the next level, `None` once maxed
    pub fn next_cost(&self, kind: UpgradeKind) -> Option<u32> {
        if self.is_maxed(kind) {
            None
        } else {
            Some(kind.cost_at(self.level(kind)))
        }
    }

    /// Buy one level of `kind`. Warns when coins are short; a maxed
    /// upgrade is refused silently.
    pub fn purchase(
        &mut self,
        kind: UpgradeKind,
        progression: &mut Progression,
        events: &mut SimEvents,
    ) -> bool {
        let Some(cost) = self.next_cost(kind) else {
            return false;
        };
        if progression.coins < cost {
            events.notify("not enough coins", NoticeKind::Warning);
            return false;
        }
        progression.coins -= cost;
        let level = self.levels.entry(kind).or_insert(0);
        *level += 1;
        log::info!("Bought {} level {} for {} coins", kind.as_str(), level, cost);
        events.notify(format!("{} upgraded to level {}", kind.name(), level), NoticeKind::Success);
        true
    }

    /// Stat bonuses contributed by every owned level
    pub fn bonuses(&self) -> StatBonuses {
        let lvl = |kind| self.level(kind);
        StatBonuses {
            main_health: 20 * lvl(UpgradeKind::MainHealth) as i32,
            main_damage: 5.0 * lvl(UpgradeKind::MainDamage) as f32,
            main_speed: 0.3 * lvl(UpgradeKind::MainSpeed) as f32,
            mini_health: 10 * lvl(UpgradeKind::MiniHealth) as i32,
            mini_damage: 3.0 * lvl(UpgradeKind::MiniDamage) as f32,
            mini_speed: 0.0,
            cooldown_factor: 0.95f32.powi(lvl(UpgradeKind::FireRate) as i32),
            extra_minis: lvl(UpgradeKind::Formation) as usize,
            max_shield: 20.0 * lvl(UpgradeKind::Shield) as f32,
        }
    }

    /// Levels keyed by upgrade id, as persisted
    pub fn to_levels(&self) -> BTreeMap<String, u32> {
        self.levels
            .iter()
            .filter(|&(_, &level)| level > 0)
            .map(|(kind, &level)| (kind.as_str().to_string(), level))
            .collect()
    }

    /// Rebuild from persisted levels. Unknown ids are skipped and levels
    /// are clamped to each upgrade's cap.
    pub fn from_levels(levels: &BTreeMap<String, u32>) -> Self {
        let mut upgrades = Self::new();
        for (id, &level) in levels {
            match UpgradeKind::parse(id) {
                Some(kind) => {
                    upgrades.levels.insert(kind, level.min(kind.max_level()));
                }
                None => log::warn!("Ignoring unknown upgrade '{}'", id),
            }
        }
        upgrades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::SimEvent;

    #[test]
    fn test_cost_grows_geometrically() {
        assert_eq!(UpgradeKind::MainHealth.cost_at(0), 100);
        assert_eq!(UpgradeKind::MainHealth.cost_at(1), 150);
        assert_eq!(UpgradeKind::MainHealth.cost_at(2), 225);
        assert_eq!(UpgradeKind::MainHealth.cost_at(3), 337);
    }

    #[test]
    fn test_purchase_spends_coins() {
        let mut upgrades = Upgrades::new();
        let mut progression = Progression {
            coins: 300,
            ..Default::default()
        };
        let mut events = SimEvents::new();

        assert!(upgrades.purchase(UpgradeKind::MainHealth, &mut progression, &mut events));
        assert_eq!(progression.coins, 200);
        assert_eq!(upgrades.level(UpgradeKind::MainHealth), 1);
        assert_eq!(upgrades.next_cost(UpgradeKind::MainHealth), Some(150));
    }

    #[test]
    fn test_purchase_without_coins_warns() {
        let mut upgrades = Upgrades::new();
        let mut progression = Progression {
            coins: 50,
            ..Default::default()
        };
        let mut events = SimEvents::new();

        assert!(!upgrades.purchase(UpgradeKind::Formation, &mut progression, &mut events));
        assert_eq!(progression.coins, 50);
        assert_eq!(
            events.drain(),
            vec![SimEvent::Notify {
                message: "not enough coins".to_string(),
                kind: NoticeKind::Warning,
            }]
        );
    }

    #[test]
    fn test_maxed_upgrade_refused_silently() {
        let mut levels = BTreeMap::new();
        levels.insert("formation".to_string(), 6);
        let mut upgrades = Upgrades::from_levels(&levels);
        let mut progression = Progression {
            coins: 1_000_000,
            ..Default::default()
        };
        let mut events = SimEvents::new();

        assert!(upgrades.is_maxed(UpgradeKind::Formation));
        assert!(!upgrades.purchase(UpgradeKind::Formation, &mut progression, &mut events));
        assert!(events.is_empty());
        assert_eq!(progression.coins, 1_000_000);
    }

    #[test]
    fn test_bonuses_per_level() {
        let mut levels = BTreeMap::new();
        levels.insert("main_health".to_string(), 2);
        levels.insert("fire_rate".to_string(), 2);
        levels.insert("shield".to_string(), 1);
        levels.insert("formation".to_string(), 3);
        let bonuses = Upgrades::from_levels(&levels).bonuses();

        assert_eq!(bonuses.main_health, 40);
        assert!((bonuses.cooldown_factor - 0.9025).abs() < 1e-6);
        assert_eq!(bonuses.max_shield, 20.0);
        assert_eq!(bonuses.extra_minis, 3);
    }

    #[test]
    fn test_levels_round_trip_clamps_and_skips() {
        let mut levels = BTreeMap::new();
        levels.insert("main_damage".to_string(), 99);
        levels.insert("laser".to_string(), 3);
        let upgrades = Upgrades::from_levels(&levels);

        assert_eq!(upgrades.level(UpgradeKind::MainDamage), MAX_UPGRADE_LEVEL);
        let saved = upgrades.to_levels();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved["main_damage"], MAX_UPGRADE_LEVEL);
    }
}
