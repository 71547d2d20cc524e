//! Property-based tests for the combat, turn and economy rules.

use proptest::prelude::*;
use tactics_core::combat::splash_multiplier;
use tactics_core::prelude::*;
use tactics_core::unit::{BaseStats, Tags};
use tactics_test_utils::determinism::strategies::{
    arb_armor, arb_attack, arb_coord, arb_falloff, arb_health, arb_placements, arb_status,
};
use tactics_test_utils::fixtures::{fixed, BoardBuilder, MOBILE_KINDS};

fn target(armor: i32, max_hp: i32, tags: &[&str]) -> Unit {
    Unit::new(
        "Target",
        PlayerId::One,
        BaseStats {
            armor,
            max_hp,
            ..BaseStats::default()
        },
        Tags::from_iter(tags.iter().copied()),
    )
}

proptest! {
    /// Every hit takes at least one HP, however heavy the armor.
    #[test]
    fn prop_damage_floor(attack in arb_attack(), armor in arb_armor(), hp in arb_health()) {
        let mut unit = target(armor, hp, &[]);
        let lost = unit.take_damage(fixed(attack));
        prop_assert!(lost >= 1);
        prop_assert_eq!(unit.hp(), hp - lost);
        prop_assert_eq!(lost, (attack - armor).max(1));
    }

    /// With a falloff of at most one, splash never grows with distance.
    #[test]
    fn prop_splash_is_monotone(falloff in arb_falloff(), distance in 0u32..8) {
        let near = splash_multiplier(falloff, distance);
        let far = splash_multiplier(falloff, distance + 1);
        prop_assert!(far <= near);
        prop_assert_eq!(splash_multiplier(falloff, 0), Fixed::ONE);
    }

    /// Each advance adds half a turn, flips the acting player once and
    /// restores every surviving unit's actions.
    #[test]
    fn prop_turn_advance(placements in arb_placements(8, 8, 12), advances in 1usize..6) {
        let mut builder = BoardBuilder::new().size(8, 8);
        for (coord, kind, owner) in &placements {
            builder = builder.unit(coord.x, coord.y, kind, *owner);
        }
        let mut board = builder.build();

        for _ in 0..advances {
            let before_turn = board.turn();
            let before_player = board.acting();
            let summary = board.next_turn();
            prop_assert_eq!(board.turn() - before_turn, fixed(1) / fixed(2));
            prop_assert_eq!(board.acting(), before_player.other());
            prop_assert_eq!(summary.ended, before_player);
            for (_, unit) in board.grid().units() {
                prop_assert_eq!(unit.actions(), unit.base().max_actions);
                prop_assert!(!unit.has_moved());
            }
        }
    }

    /// A purchase either moves exactly its cost out of the treasury and adds
    /// one unit, or changes nothing at all.
    #[test]
    fn prop_purchase_conservation(
        funds in 0i32..12,
        purchases in proptest::collection::vec(
            (arb_coord(6, 6), proptest::sample::select(MOBILE_KINDS.to_vec())),
            1..10,
        ),
    ) {
        let mut board = BoardBuilder::new().size(6, 6).funds(funds).build();
        for (coord, kind) in purchases {
            let funds_before = board.player(PlayerId::Zero).funds;
            let units_before = board.grid().unit_count();
            let hash_before = board.state_hash();
            let cost = board.catalog().cost_of(kind).unwrap();

            match board.buy_unit(coord, kind) {
                Ok(id) => {
                    prop_assert_eq!(board.player(PlayerId::Zero).funds, funds_before - cost);
                    prop_assert_eq!(board.grid().unit_count(), units_before + 1);
                    prop_assert_eq!(board.grid().position_of(id), Some(coord));
                }
                Err(_) => prop_assert_eq!(board.state_hash(), hash_before),
            }
            prop_assert!(board.player(PlayerId::Zero).funds >= 0);
        }
    }

    /// Attaching never leaves a negative duration behind, and immunity is
    /// absolute.
    #[test]
    fn prop_status_attach_and_tick(kind in arb_status(), ticks in 0usize..8) {
        let mut living = target(0, 50, &["alive"]);
        let mut construct = target(0, 50, &["construct"]);

        let effect = kind.instantiate();
        let blocked = effect.immunity_tags.iter().any(|tag| tag == "construct");
        let result = construct.attach_status(kind.instantiate());
        if blocked {
            prop_assert!(result.is_err());
            prop_assert!(construct.statuses().is_empty());
        }

        if living.attach_status(kind.instantiate()).is_ok() {
            for _ in 0..ticks {
                living.tick_statuses();
            }
            for effect in living.statuses().as_slice() {
                prop_assert!(effect.duration > 0);
            }
            prop_assert!(living.hp() <= living.max_hp());
        }
    }

    /// Moves land on empty cells within speed and keep the position index
    /// in step with the cells.
    #[test]
    fn prop_moves_stay_consistent(placements in arb_placements(8, 8, 12)) {
        let mut builder = BoardBuilder::new().size(8, 8);
        for (coord, kind, owner) in &placements {
            builder = builder.unit(coord.x, coord.y, kind, *owner);
        }
        let mut board = builder.build();

        let movers: Vec<Coord> = board
            .grid()
            .units_of(PlayerId::Zero)
            .map(|(coord, _)| coord)
            .collect();
        for from in movers {
            let Some(speed) = board.unit_at(from).map(Unit::speed) else {
                continue;
            };
            let moves = board.moveable_tiles_from(from);
            for cell in &moves {
                prop_assert!(board.grid().is_empty(*cell));
                prop_assert!(from.manhattan(*cell) <= speed as u32);
            }
            if let Some(&to) = moves.iter().next() {
                prop_assert!(board.move_unit(from, to));
            }
        }

        for (coord, unit) in board.grid().units() {
            prop_assert_eq!(board.grid().position_of(unit.id()), Some(coord));
        }
    }
}
