use mineblown_core::rules::SPAWN_CLEARANCE;
use mineblown_core::*;
use proptest::prelude::*;

const SIDE: u8 = 12;

#[derive(Clone, Debug)]
enum Op {
    Reveal(PlayerId, Coord2),
    Flag(PlayerId, Coord2),
    RandomAttack(PlayerId, Coord2),
    PrecisionAttack(PlayerId),
    Wait(Millis),
}

fn arb_player() -> impl Strategy<Value = PlayerId> {
    prop_oneof![Just(PlayerId::One), Just(PlayerId::Two)]
}

fn arb_coords() -> impl Strategy<Value = Coord2> {
    (0..SIDE, 0..SIDE)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (arb_player(), arb_coords()).prop_map(|(player, at)| Op::Reveal(player, at)),
        3 => (arb_player(), arb_coords()).prop_map(|(player, at)| Op::Flag(player, at)),
        1 => (arb_player(), arb_coords()).prop_map(|(player, at)| Op::RandomAttack(player, at)),
        1 => arb_player().prop_map(Op::PrecisionAttack),
        1 => (0..3_000u64).prop_map(Op::Wait),
    ]
}

fn arb_config() -> impl Strategy<Value = GameConfig> {
    (4..=16u8, 4..=16u8, 0.0..0.3f64).prop_map(|(w, h, density)| GameConfig::new((w, h), density).unwrap())
}

fn apply(engine: &mut Engine, op: &Op, now: Millis) -> Result<()> {
    match *op {
        Op::Reveal(player, at) => engine.reveal(player, at, now).map(drop),
        Op::Flag(player, at) => engine.flag(player, at, now).map(drop),
        Op::RandomAttack(player, at) => engine
            .random_attack(player, at, AttackGate::Trusted, now)
            .map(drop),
        Op::PrecisionAttack(player) => engine.precision_attack(player, AttackGate::Trusted, now).map(drop),
        Op::Wait(_) => {
            engine.process_teleports(now);
            Ok(())
        }
    }
}

fn owned_by(engine: &Engine, player: PlayerId) -> i32 {
    engine.tiles().iter().filter(|tile| tile.owner == Some(player)).count() as i32
}

proptest! {
    #[test]
    fn generation_is_deterministic_and_spares_spawns(seed in any::<u32>(), config in arb_config()) {
        let layout = SeededGenerator::new(seed).generate(&config);

        prop_assert_eq!(&layout, &SeededGenerator::new(seed).generate(&config));
        prop_assert_eq!(layout.mine_count(), config.mine_count());
        for player in PlayerId::ALL {
            for coords in iter_disc(config.spawn(player), SPAWN_CLEARANCE, config.size) {
                prop_assert!(!layout.contains_mine(coords));
            }
        }
    }

    #[test]
    fn flood_fill_leaves_no_open_zero_border(seed in any::<u32>(), start in arb_coords()) {
        let config = GameConfig::new((SIDE, SIDE), 0.15).unwrap();
        let mut engine = Engine::new(config, seed).unwrap();
        prop_assume!(!engine.tile(start).unwrap().mine);

        engine.reveal(PlayerId::One, start, 0).unwrap();

        for coords in iter_coords(engine.size()) {
            let tile = engine.tile(coords).unwrap();
            if !tile.is_revealed() || tile.adjacency != 0 {
                continue;
            }
            let unrevealed_safe = engine
                .tiles()
                .iter_neighbors(coords)
                .filter(|&pos| !engine.tile(pos).unwrap().mine)
                .any(|pos| engine.tile(pos).unwrap().is_hidden());
            prop_assert!(!unrevealed_safe, "zero tile {:?} has a hidden safe neighbor", coords);
        }
        prop_assert_eq!(engine.resolved_safe_tiles(), engine.count_resolved_safe_tiles());
    }

    #[test]
    fn accounting_holds_under_any_play(seed in any::<u32>(), ops in prop::collection::vec(arb_op(), 1..120)) {
        let config = GameConfig::new((SIDE, SIDE), 0.15).unwrap();
        let mut engine = Engine::new(config, seed).unwrap();
        let mut replica = engine.clone();
        let mut now = 0;

        for op in &ops {
            if let Op::Wait(delay) = op {
                now += delay;
            }
            let before = engine.snapshot();
            let was_finished = engine.is_finished();

            let result = apply(&mut engine, op, now);
            prop_assert_eq!(result, apply(&mut replica, op, now));

            if was_finished {
                if !matches!(op, Op::Wait(_)) {
                    prop_assert_eq!(result, Err(GameError::AlreadyEnded));
                }
                prop_assert_eq!(&engine.snapshot(), &before);
                continue;
            }
            prop_assert_eq!(result, Ok(()));

            let resolved = engine.resolved_safe_tiles();
            prop_assert_eq!(resolved, engine.count_resolved_safe_tiles());
            prop_assert!(resolved <= engine.total_safe_tiles());
            prop_assert_eq!(engine.is_finished(), resolved == engine.total_safe_tiles());
            for player in PlayerId::ALL {
                prop_assert_eq!(engine.player(player).score, owned_by(&engine, player));
            }
        }

        prop_assert_eq!(engine.snapshot(), replica.snapshot());
    }

    #[test]
    fn attacks_without_ammunition_change_nothing(seed in any::<u32>(), center in arb_coords(), now in 0..10_000u64) {
        let config = GameConfig::new((SIDE, SIDE), 0.15).unwrap();
        let mut engine = Engine::new(config, seed).unwrap();
        let before = engine.snapshot();

        let random = engine.random_attack(PlayerId::One, center, AttackGate::Local, now).unwrap();
        let precision = engine.precision_attack(PlayerId::One, AttackGate::Local, now).unwrap();

        prop_assert_eq!(random, AttackOutcome::Gated);
        prop_assert_eq!(precision, AttackOutcome::Gated);
        prop_assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn shield_absorbs_exactly_one_mine(first in arb_coords(), second in arb_coords()) {
        prop_assume!(first != second);
        let layout = MineLayout::from_mine_coords((SIDE, SIDE), &[first, second]).unwrap();
        let mut engine = Engine::from_layout(&layout).unwrap();
        engine.apply_power_up(PlayerId::One, PowerUpKind::Shield, None, 0).unwrap();

        prop_assert_eq!(engine.reveal(PlayerId::One, first, 0), Ok(RevealOutcome::Absorbed));
        prop_assert_eq!(engine.resolved_safe_tiles(), 0);
        prop_assert_eq!(engine.reveal(PlayerId::One, second, 0), Ok(RevealOutcome::Detonated));
        prop_assert!(engine.player(PlayerId::One).is_stunned(0));
    }
}
