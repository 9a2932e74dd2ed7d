//! The skill catalog

use super::effects::SkillEffect;
use super::{SkillTemplate, SkillType};

const fn active(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    effect: SkillEffect,
    duration: f32,
    cooldown: f32,
    max_level: u32,
    unlock_level: u32,
) -> SkillTemplate {
    SkillTemplate {
        id,
        name,
        description,
        skill_type: SkillType::Active,
        effect,
        duration,
        cooldown,
        max_level,
        unlock_level,
    }
}

const fn passive(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    effect: SkillEffect,
    max_level: u32,
    unlock_level: u32,
) -> SkillTemplate {
    SkillTemplate {
        id,
        name,
        description,
        skill_type: SkillType::Passive,
        effect,
        duration: 0.0,
        cooldown: 0.0,
        max_level,
        unlock_level,
    }
}

pub static SKILLS: [SkillTemplate; 21] = [
    active(
        "emergency_repair",
        "Emergency Repair",
        "Instantly repairs the main tank; escorts get 80%",
        SkillEffect::Heal { amount: 40.0 },
        0.0,
        15_000.0,
        5,
        1,
    ),
    active(
        "power_surge",
        "Power Surge",
        "Boosts squad damage for a short time",
        SkillEffect::DamageBoost { multiplier: 1.5 },
        5_000.0,
        20_000.0,
        5,
        1,
    ),
    active(
        "overdrive",
        "Overdrive",
        "Boosts squad speed for a short time",
        SkillEffect::SpeedBoost { multiplier: 1.5 },
        5_000.0,
        15_000.0,
        5,
        1,
    ),
    active(
        "energy_shield",
        "Energy Shield",
        "Reinforces every tank's hull for the rest of the battle",
        SkillEffect::Shield { amount: 30.0 },
        0.0,
        25_000.0,
        5,
        2,
    ),
    active(
        "explosive_rounds",
        "Explosive Rounds",
        "Squad bullets explode on impact",
        SkillEffect::ExplosiveShot { radius: 60.0 },
        8_000.0,
        25_000.0,
        5,
        2,
    ),
    active(
        "multi_shot",
        "Multi Shot",
        "Every shot fans out extra bullets",
        SkillEffect::MultiShot {
            extra: 1,
            spread: 0.2,
        },
        8_000.0,
        20_000.0,
        5,
        2,
    ),
    active(
        "time_warp",
        "Time Warp",
        "Slows every enemy on the field",
        SkillEffect::TimeSlow { factor: 0.5 },
        5_000.0,
        30_000.0,
        3,
        3,
    ),
    active(
        "auto_repair",
        "Auto Repair",
        "Repairs the squad every second",
        SkillEffect::AutoRepair { per_second: 5.0 },
        10_000.0,
        30_000.0,
        5,
        3,
    ),
    active(
        "freeze_blast",
        "Freeze Blast",
        "Damages and freezes nearby enemies",
        SkillEffect::FreezeBlast {
            radius: 200.0,
            damage: 20.0,
            freeze_ms: 2_000.0,
        },
        0.0,
        25_000.0,
        5,
        4,
    ),
    active(
        "fire_nova",
        "Fire Nova",
        "A ring of fire that keeps burning nearby enemies",
        SkillEffect::FireNova {
            radius: 180.0,
            damage: 40.0,
            burn_per_second: 10.0,
        },
        3_000.0,
        20_000.0,
        5,
        4,
    ),
    active(
        "vortex_field",
        "Vortex Field",
        "Drags enemies toward the main tank and grinds them down",
        SkillEffect::VortexField {
            radius: 250.0,
            pull: 1.5,
            damage_per_second: 5.0,
        },
        4_000.0,
        30_000.0,
        5,
        5,
    ),
    active(
        "plasma_burst",
        "Plasma Burst",
        "Fires a ring of piercing plasma bolts",
        SkillEffect::PlasmaBurst {
            bullets: 16,
            damage: 25.0,
            penetration: 3,
        },
        0.0,
        20_000.0,
        5,
        5,
    ),
    active(
        "ice_barrier",
        "Ice Barrier",
        "Enemy bullets shatter near the main tank",
        SkillEffect::IceBarrier { radius: 120.0 },
        6_000.0,
        30_000.0,
        5,
        6,
    ),
    active(
        "magnetic_pull",
        "Magnetic Pull",
        "Yanks distant enemies in and shocks them",
        SkillEffect::MagneticPull {
            radius: 300.0,
            pull: 80.0,
            damage: 15.0,
        },
        0.0,
        20_000.0,
        5,
        6,
    ),
    active(
        "lightning_storm",
        "Lightning Storm",
        "Lightning strikes random enemies and chains",
        SkillEffect::LightningStorm {
            damage: 35.0,
            interval_ms: 500.0,
            chain_radius: 120.0,
        },
        3_000.0,
        30_000.0,
        5,
        7,
    ),
    active(
        "quantum_strike",
        "Quantum Strike",
        "Teleports next to the toughest enemy and strikes it",
        SkillEffect::QuantumStrike {
            damage: 120.0,
            splash_radius: 80.0,
        },
        0.0,
        35_000.0,
        3,
        8,
    ),
    passive(
        "armor_plating",
        "Armor Plating",
        "+20 max health (escorts +10) per level",
        SkillEffect::HealthBonus { main: 20, mini: 10 },
        5,
        1,
    ),
    passive(
        "weapon_mastery",
        "Weapon Mastery",
        "+3 damage (escorts +2) per level",
        SkillEffect::DamageBonus { main: 3.0, mini: 2.0 },
        5,
        1,
    ),
    passive(
        "engine_tuning",
        "Engine Tuning",
        "+0.2 speed per level",
        SkillEffect::SpeedBonus { amount: 0.2 },
        5,
        2,
    ),
    passive(
        "rapid_reload",
        "Rapid Reload",
        "Shoot cooldowns x0.9 per level",
        SkillEffect::CooldownReduction { factor: 0.9 },
        5,
        3,
    ),
    passive(
        "reinforcements",
        "Reinforcements",
        "+1 mini tank per level",
        SkillEffect::Reinforcements,
        6,
        4,
    ),
];

pub fn find_template(id: &str) -> Option<&'static SkillTemplate> {
    SKILLS.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique() {
        for (i, a) in SKILLS.iter().enumerate() {
            for b in &SKILLS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_passives_have_no_timers() {
        for skill in SKILLS.iter().filter(|s| s.is_passive()) {
            assert_eq!(skill.duration, 0.0, "{}", skill.id);
            assert_eq!(skill.cooldown, 0.0, "{}", skill.id);
            assert!(skill.effect.kind().is_passive(), "{}", skill.id);
        }
        for skill in SKILLS.iter().filter(|s| !s.is_passive()) {
            assert!(skill.cooldown > 0.0, "{}", skill.id);
            assert!(!skill.effect.kind().is_passive(), "{}", skill.id);
        }
    }
}
