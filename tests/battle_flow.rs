//! Whole battles driven through the public API

use std::collections::BTreeMap;

use tank_adventure::Game;
use tank_adventure::persistence::{MemoryStorage, SaveData};
use tank_adventure::sim::{BattleType, MoveVector, Scene};
use tank_adventure::upgrades::{UpgradeKind, Upgrades};

const DT: f32 = 1000.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 60 * 15;

/// Drive toward the nearest enemy when nothing is close, otherwise hold
fn pilot(game: &mut Game) {
    let me = game.battle.player.main_tank.hull.pos;
    let nearest = game
        .battle
        .waves
        .living_enemies()
        .map(|e| e.hull.pos - me)
        .min_by(|a, b| a.length().total_cmp(&b.length()));
    game.input.movement = match nearest {
        Some(d) if d.length() > 200.0 => MoveVector::new(d.x / d.length(), d.y / d.length(), 1.0),
        _ => MoveVector::default(),
    };
}

fn play_to_results(game: &mut Game) -> u32 {
    let mut frames = 0;
    while game.scene() != Scene::Results && frames < MAX_FRAMES {
        if game.scene() == Scene::SkillSelection {
            if !game.choose_skill(0) {
                game.skip_skill();
            }
        } else {
            pilot(game);
            game.step(DT);
        }
        game.battle.drain_events();
        frames += 1;
    }
    frames
}

#[test]
fn training_battle_reaches_results() {
    let mut game = Game::new(Box::new(MemoryStorage::new()), 5);
    game.start_battle(BattleType::Training, 5);
    assert_eq!(game.scene(), Scene::Battle);

    let frames = play_to_results(&mut game);
    assert!(frames < MAX_FRAMES, "battle never finished");

    let rewards = game.battle.rewards.expect("results carry rewards");
    let progression = &game.battle.player.progression;
    assert_eq!(progression.score, rewards.final_score);
    assert!(rewards.final_score >= rewards.raw_score);
    if rewards.victory {
        assert_eq!(rewards.waves_cleared, 3);
        assert!((rewards.total_multiplier - 1.5).abs() < 1e-9);
    }

    // Results were written on arrival
    let saved = SaveData::load(game.storage()).unwrap();
    assert_eq!(saved.progression, *progression);

    game.leave_results(true);
    assert_eq!(game.scene(), Scene::Base);
    game.return_to_menu();
    assert_eq!(game.scene(), Scene::Menu);
}

#[test]
fn same_seed_same_battle() {
    let run = || {
        let mut game = Game::new(Box::new(MemoryStorage::new()), 9);
        game.start_battle(BattleType::Standard, 9);
        for _ in 0..600 {
            pilot(&mut game);
            game.step(DT);
            if game.scene() == Scene::SkillSelection {
                game.choose_skill(0);
            }
        }
        game.snapshot().to_json().unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn reload_does_not_stack_bonuses() {
    let mut passives = BTreeMap::new();
    passives.insert("armor_plating".to_string(), 2);
    let mut levels = BTreeMap::new();
    levels.insert("main_health".to_string(), 3);
    levels.insert("formation".to_string(), 1);
    let data = SaveData {
        passives,
        upgrades: Upgrades::from_levels(&levels),
        ..Default::default()
    };

    let mut storage = MemoryStorage::new();
    data.save(&mut storage).unwrap();

    let mut game = Game::new(Box::new(storage.clone()), 1);
    // 100 base + 60 upgrades + 40 armor plating
    assert_eq!(game.battle.player.main_tank.hull.max_health, 200);
    assert_eq!(game.battle.player.mini_tanks.len(), 3);

    // Saving and loading again lands on the same numbers
    game.save();
    let again = SaveData::load(game.storage()).unwrap();
    let mut storage = MemoryStorage::new();
    again.save(&mut storage).unwrap();
    let mut reloaded = Game::new(Box::new(storage), 1);
    assert_eq!(reloaded.battle.player.main_tank.hull.max_health, 200);

    // So does starting battles back to back
    for _ in 0..3 {
        reloaded.start_battle(BattleType::Training, 1);
        reloaded.return_to_menu();
    }
    assert_eq!(reloaded.battle.player.main_tank.hull.max_health, 200);
    assert_eq!(reloaded.upgrades.level(UpgradeKind::MainHealth), 3);

    game.battle.apply_bonuses(game.upgrades.bonuses());
    game.battle.apply_bonuses(game.upgrades.bonuses());
    assert_eq!(game.battle.player.main_tank.hull.max_health, 200);
}
