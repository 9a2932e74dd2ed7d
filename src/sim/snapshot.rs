//! Read-only view of a battle for the renderer and HUD

use glam::Vec2;
use serde::Serialize;

use super::battle::{Battle, BattleRewards, BattleType, Camera, Scene, VisualEffect};
use super::entity::{BulletOwner, Enemy, Tank, TankKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TankView {
    pub kind: TankKind,
    pub pos: Vec2,
    pub angle: f32,
    pub health: i32,
    pub max_health: i32,
    pub size: f32,
    pub alive: bool,
    pub hit_flash: f32,
    pub muzzle_flash: f32,
}

impl From<&Tank> for TankView {
    fn from(tank: &Tank) -> Self {
        Self {
            kind: tank.kind,
            pos: tank.hull.pos,
            angle: tank.hull.angle,
            health: tank.hull.health,
            max_health: tank.hull.max_health,
            size: tank.hull.size,
            alive: tank.hull.is_alive,
            hit_flash: tank.hull.hit_flash,
            muzzle_flash: tank.hull.muzzle_flash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyView {
    pub id: u32,
    pub kind: &'static str,
    pub color: &'static str,
    pub pos: Vec2,
    pub angle: f32,
    pub health: i32,
    pub max_health: i32,
    pub size: f32,
    pub hit_flash: f32,
    /// Under a slow or freeze
    pub slowed: bool,
}

impl From<&Enemy> for EnemyView {
    fn from(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id,
            kind: enemy.kind.as_str(),
            color: enemy.kind.indicator(),
            pos: enemy.hull.pos,
            angle: enemy.hull.angle,
            health: enemy.hull.health,
            max_health: enemy.hull.max_health,
            size: enemy.hull.size,
            hit_flash: enemy.hull.hit_flash,
            slowed: !enemy.modifiers.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BulletView {
    pub pos: Vec2,
    pub angle: f32,
    pub size: f32,
    pub owner: BulletOwner,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSlotView {
    pub slot_index: usize,
    pub id: &'static str,
    pub name: &'static str,
    pub level: u32,
    pub is_active: bool,
    pub remaining_duration: f32,
    /// 0 = just cast, 1 = ready
    pub cooldown_progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillChoiceView {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub passive: bool,
    /// Level after taking it (1 for a new skill)
    pub next_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hud {
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub coins: u32,
    pub score: u64,
    pub battle_score: u64,
    pub wave: u32,
    pub waves_total: u32,
    pub enemies_left: u32,
    pub shield: f32,
    pub max_shield: f32,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub scene: Scene,
    pub battle_type: BattleType,
    pub camera: Camera,
    pub main_tank: TankView,
    pub mini_tanks: Vec<TankView>,
    pub enemies: Vec<EnemyView>,
    pub bullets: Vec<BulletView>,
    pub effects: Vec<VisualEffect>,
    pub hud: Hud,
    pub skills: Vec<SkillSlotView>,
    pub choices: Vec<SkillChoiceView>,
    pub rewards: Option<BattleRewards>,
}

impl RenderSnapshot {
    pub fn capture(battle: &Battle) -> Self {
        let player = &battle.player;
        let waves = &battle.waves;

        let bullets = player
            .tanks()
            .flat_map(|(_, t)| t.hull.bullets.iter())
            .chain(waves.enemies.iter().flat_map(|e| e.hull.bullets.iter()))
            .map(|b| BulletView {
                pos: b.pos,
                angle: b.angle,
                size: b.radius(),
                owner: b.owner,
            })
            .collect();

        let skills = battle
            .skills
            .slots
            .iter()
            .map(|slot| SkillSlotView {
                slot_index: slot.slot_index,
                id: slot.skill.id,
                name: slot.skill.template.name,
                level: slot.skill.level,
                is_active: slot.skill.is_active,
                remaining_duration: slot.skill.remaining_duration,
                cooldown_progress: slot.skill.cooldown_progress(),
            })
            .collect();

        let choices = battle
            .skill_choices
            .iter()
            .map(|t| SkillChoiceView {
                id: t.id,
                name: t.name,
                description: t.description,
                passive: t.is_passive(),
                next_level: battle.skills.owned_level(t.id).map_or(1, |l| l + 1),
            })
            .collect();

        let progression = &player.progression;
        let hud = Hud {
            level: progression.level,
            experience: progression.experience,
            experience_to_next: progression.experience_to_next,
            coins: progression.coins,
            score: progression.score,
            battle_score: player.battle_score,
            wave: waves.current_wave,
            waves_total: battle.battle_type.waves(),
            enemies_left: waves.total_enemies_in_wave.saturating_sub(waves.enemies_killed),
            shield: player.shield,
            max_shield: player.max_shield,
        };

        Self {
            scene: battle.scene,
            battle_type: battle.battle_type,
            camera: battle.camera,
            main_tank: TankView::from(&player.main_tank),
            mini_tanks: player.mini_tanks.iter().map(TankView::from).collect(),
            enemies: waves.enemies.iter().map(EnemyView::from).collect(),
            bullets,
            effects: battle.effects.clone(),
            hud,
            skills,
            choices,
            rewards: battle.rewards,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::battle::TickInput;
    use crate::sim::player::{Progression, StatBonuses};

    #[test]
    fn test_snapshot_reflects_battle() {
        let mut battle = Battle::new(3, Progression::default());
        battle.start(BattleType::Elite, 3, StatBonuses::default());
        battle.skills.acquire("power_surge");
        for _ in 0..300 {
            battle.step(16.0, &TickInput::default());
        }

        let snap = RenderSnapshot::capture(&battle);
        assert_eq!(snap.scene, Scene::Battle);
        assert_eq!(snap.mini_tanks.len(), battle.player.mini_tanks.len());
        assert_eq!(snap.enemies.len(), battle.waves.enemies.len());
        assert_eq!(snap.hud.waves_total, 8);
        assert_eq!(snap.skills[0].id, "power_surge");

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"mainTank\""));
        assert!(json.contains("\"battleType\":\"elite\""));
    }
}
