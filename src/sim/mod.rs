//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame delta only (no clocks)
//! - Seeded RNG only
//! - Stable iteration order (enemies by id, tanks main-first)
//! - No rendering or platform dependencies

pub mod ai;
pub mod battle;
pub mod combat;
pub mod entity;
pub mod events;
pub mod modifiers;
pub mod player;
pub mod skills;
pub mod snapshot;
pub mod wave;

pub use ai::BossPhase;
pub use battle::{
    Battle, BattleOptions, BattleRewards, BattleType, Camera, Scene, TickInput, VisualEffect,
    VisualKind,
};
pub use combat::CombatReport;
pub use entity::{Bullet, BulletOwner, Enemy, EnemyKind, Hull, Tank, TankKind, TargetRef};
pub use events::{LogNotifier, NoticeKind, Notifier, SimEvent, SimEvents};
pub use modifiers::{Modifier, ModifierStack, Stat};
pub use player::{MoveVector, Player, Progression, StatBonuses};
pub use skills::{SkillEffect, SkillInstance, SkillManager, SkillTemplate, SkillType};
pub use snapshot::RenderSnapshot;
pub use wave::WaveManager;
