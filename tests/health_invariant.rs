//! Health stays inside [0, max] and liveness tracks it

use glam::Vec2;
use proptest::prelude::*;

use tank_adventure::sim::{Hull, Player, TargetRef};

#[derive(Debug, Clone)]
enum Op {
    Damage(f32),
    Heal(i32),
    SetMax(i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0f32..200.0).prop_map(Op::Damage),
        (-20i32..120).prop_map(Op::Heal),
        (1i32..300).prop_map(Op::SetMax),
    ]
}

proptest! {
    #[test]
    fn hull_health_stays_in_bounds(ops in prop::collection::vec(op(), 1..60)) {
        let mut hull = Hull::new(Vec2::ZERO, 100, 10.0, 1.0, 10.0, 500.0);
        for op in ops {
            match op {
                Op::Damage(amount) => { hull.take_damage(amount); }
                Op::Heal(amount) => hull.heal(amount),
                Op::SetMax(max) => hull.set_max_health(max),
            }
            prop_assert!(hull.health >= 0);
            prop_assert!(hull.health <= hull.max_health);
            prop_assert_eq!(hull.is_alive, hull.health > 0);
        }
    }

    #[test]
    fn death_is_reported_once(hits in prop::collection::vec(1.0f32..60.0, 1..30)) {
        let mut hull = Hull::new(Vec2::ZERO, 100, 10.0, 1.0, 10.0, 500.0);
        let deaths = hits.into_iter().filter(|&h| hull.take_damage(h)).count();
        prop_assert!(deaths <= 1);
        prop_assert_eq!(deaths == 1, !hull.is_alive);
    }

    #[test]
    fn shield_absorbs_before_main_hull(shield in 0.0f32..100.0, hit in 0.0f32..150.0) {
        let mut player = Player::new();
        player.max_shield = 100.0;
        player.shield = shield;
        player.damage_tank(TargetRef::Main, hit);

        let main = &player.main_tank.hull;
        prop_assert!(player.shield >= 0.0);
        if hit <= shield {
            prop_assert_eq!(main.health, main.max_health);
        } else {
            prop_assert_eq!(main.health, (main.max_health - (hit - shield).round() as i32).max(0));
        }
    }
}
