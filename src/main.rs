//! Tank Adventure entry point
//!
//! The browser build is driven from the page through `platform::WebGame`.
//! The native binary plays battles headless with a scripted pilot, which is
//! handy for balancing and for eyeballing the logs.
//!
//! Usage: `tank-adventure [training|standard|elite|boss_rush] [seed] [battles]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use tank_adventure::Game;
    use tank_adventure::audio::LogAudio;
    use tank_adventure::persistence::MemoryStorage;
    use tank_adventure::sim::{BattleType, LogNotifier, MoveVector, Scene};
    use tank_adventure::upgrades::UpgradeKind;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let battle_type = args
        .next()
        .and_then(|s| BattleType::parse(&s))
        .unwrap_or(BattleType::Training);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let battles: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    log::info!(
        "Tank Adventure (native) starting: {} x{}, seed {}",
        battle_type.name(),
        battles,
        seed
    );

    const DT: f32 = 1000.0 / 60.0;
    // Ten minutes of game time per battle at most
    const MAX_FRAMES: u32 = 60 * 60 * 10;
    const PILOT_HOLD_DISTANCE: f32 = 200.0;

    let mut game = Game::new(Box::new(MemoryStorage::new()), seed);
    let mut audio = LogAudio::default();
    let mut notifier = LogNotifier;

    for round in 0..battles {
        game.start_battle(battle_type, seed.wrapping_add(round as u64));

        let mut frames = 0;
        while game.scene() != Scene::Results && frames < MAX_FRAMES {
            match game.scene() {
                Scene::SkillSelection => {
                    if !game.choose_skill(0) {
                        game.skip_skill();
                    }
                }
                _ => {
                    // Close in on the nearest enemy, hold once something is in range
                    let me = game.battle.player.main_tank.hull.pos;
                    let nearest = game
                        .battle
                        .waves
                        .living_enemies()
                        .map(|e| e.hull.pos - me)
                        .min_by(|a, b| a.length().total_cmp(&b.length()));
                    game.input.movement = match nearest {
                        Some(d) if d.length() > PILOT_HOLD_DISTANCE => {
                            let d = d.normalize();
                            MoveVector::new(d.x, d.y, 1.0)
                        }
                        _ => MoveVector::default(),
                    };
                    game.step(DT);
                }
            }
            game.dispatch(&mut audio, &mut notifier);
            frames += 1;
        }

        let Some(rewards) = game.battle.rewards else {
            log::warn!("Battle {} timed out after {} frames", round + 1, frames);
            game.return_to_menu();
            continue;
        };
        println!(
            "Battle {}: {} after {} waves | score {} (x{:.2}) | +{} coins | {:.1}s",
            round + 1,
            if rewards.victory { "victory" } else { "defeat" },
            rewards.waves_cleared,
            rewards.final_score,
            rewards.total_multiplier,
            rewards.coins,
            game.battle.elapsed / 1000.0
        );

        // Spend on the cheapest affordable upgrade until broke
        game.leave_results(true);
        loop {
            let progression = &game.battle.player.progression;
            let cheapest = UpgradeKind::ALL
                .into_iter()
                .filter_map(|k| game.upgrades.next_cost(k).map(|c| (c, k)))
                .filter(|&(cost, _)| cost <= progression.coins)
                .min();
            match cheapest {
                Some((_, kind)) => {
                    game.purchase_upgrade(kind);
                }
                None => break,
            }
        }
        game.dispatch(&mut audio, &mut notifier);
        game.return_to_menu();
    }

    let progression = &game.battle.player.progression;
    println!(
        "Final: level {}, score {}, {} coins, best wave {}, {} sounds played",
        progression.level, progression.score, progression.coins, progression.best_wave, audio.played
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::start, this is just to satisfy the compiler
}
