//! End-to-end checks of the engine rules through the public board API.
//!
//! Boards are built from the shared fixture catalog so the numbers here
//! match the stat lines in `tactics_test_utils::fixtures::STANDARD_UNITS`.

use std::collections::BTreeSet;

use tactics_core::economy::PurchaseError;
use tactics_core::interaction::{ClickOutcome, ClickState, ProductionStatus};
use tactics_core::prelude::*;
use tactics_core::status::AttachError;
use tactics_core::unit::{BaseStats, Tags};
use tactics_test_utils::fixtures::{fixed, fixed_f, BoardBuilder};

fn c(x: u32, y: u32) -> Coord {
    Coord::new(x, y)
}

// =============================================================================
// Damage and splash
// =============================================================================

#[test]
fn damage_never_drops_below_one() {
    let mut fortress = Unit::new(
        "Fortress",
        PlayerId::One,
        BaseStats {
            armor: 999,
            max_hp: 20,
            ..BaseStats::default()
        },
        Tags::default(),
    );
    assert_eq!(fortress.take_damage(fixed(5)), 1);
    assert_eq!(fortress.hp(), 19);
}

#[test]
fn archer_volley_matches_stat_line() {
    let mut board = BoardBuilder::new()
        .unit(5, 1, "Archer", PlayerId::Zero)
        .unit(5, 4, "Archer", PlayerId::One)
        .build();
    let report = board.attack(c(5, 1), c(5, 4));
    assert_eq!(report.total_damage(), 4);
    assert_eq!(board.unit_at(c(5, 4)).unwrap().hp(), 6);
}

#[test]
fn catapult_splash_falls_off_with_distance() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Catapult", PlayerId::Zero)
        .unit(0, 4, "Archer", PlayerId::One)
        .unit(1, 4, "Archer", PlayerId::One)
        .unit(0, 3, "Peasant", PlayerId::Zero)
        .build();

    let report = board.attack(c(0, 0), c(0, 4));
    assert_eq!(report.hits.len(), 2);
    assert_eq!(board.unit_at(c(0, 4)).unwrap().hp(), 4);
    // 6 × 0.5¹ = 3 at distance one.
    assert_eq!(board.unit_at(c(1, 4)).unwrap().hp(), 7);
    // Splash never hurts allies.
    assert_eq!(board.unit_at(c(0, 3)).unwrap().hp(), 5);
    assert_eq!(board.unit_at(c(0, 0)).unwrap().actions(), 0);
}

#[test]
fn siege_bonus_applies_to_buildings() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Catapult", PlayerId::Zero)
        .prebuilt(0, 4, "Wall", PlayerId::One)
        .build();
    board.attack(c(0, 0), c(0, 4));
    // 6 × 2 = 12, minus 3 armor.
    assert_eq!(board.unit_at(c(0, 4)).unwrap().hp(), 11);
}

#[test]
fn knight_bonus_against_infantry() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Knight", PlayerId::Zero)
        .unit(0, 1, "Swordsman", PlayerId::One)
        .build();
    board.attack(c(0, 0), c(0, 1));
    // 6 × 1.5 = 9, minus 1 armor.
    assert_eq!(board.unit_at(c(0, 1)).unwrap().hp(), 4);
}

#[test]
fn spent_units_can_neither_attack_nor_move() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Archer", PlayerId::Zero)
        .unit(0, 2, "Archer", PlayerId::One)
        .build();
    board.attack(c(0, 0), c(0, 2));
    assert!(board.attackable_tiles_from(c(0, 0)).is_empty());
    assert!(board.moveable_tiles_from(c(0, 0)).is_empty());
    assert!(!board.move_unit(c(0, 0), c(1, 0)));
}

// =============================================================================
// Status effects
// =============================================================================

#[test]
fn poison_runs_its_course() {
    let mut archer = Unit::new(
        "Archer",
        PlayerId::One,
        BaseStats {
            max_hp: 10,
            ..BaseStats::default()
        },
        Tags::from_iter(["alive"]),
    );
    archer
        .attach_status(StatusKind::Poison.instantiate())
        .unwrap();
    for _ in 0..3 {
        archer.tick_statuses();
    }
    assert_eq!(archer.hp(), 4);
    assert!(!archer.has_status("Poison"));
}

#[test]
fn constructs_shrug_off_poison() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Alchemist", PlayerId::Zero)
        .unit(0, 2, "Catapult", PlayerId::One)
        .build();
    let report = board.attack(c(0, 0), c(0, 2));
    assert_eq!(report.statuses.len(), 1);
    assert!(matches!(
        &report.statuses[0].result,
        Err(AttachError::Immune { tag, .. }) if tag == "construct"
    ));
    assert!(board.unit_at(c(0, 2)).unwrap().statuses().is_empty());
}

#[test]
fn poison_ticks_on_the_victims_turn() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Alchemist", PlayerId::Zero)
        .unit(0, 2, "Archer", PlayerId::One)
        .build();
    board.attack(c(0, 0), c(0, 2));
    assert_eq!(board.unit_at(c(0, 2)).unwrap().hp(), 8);

    // Player Zero's turn ends: the archer is untouched.
    board.next_turn();
    assert_eq!(board.unit_at(c(0, 2)).unwrap().hp(), 8);
    // Player One's turn ends: poison ticks.
    board.next_turn();
    assert_eq!(board.unit_at(c(0, 2)).unwrap().hp(), 6);
}

#[test]
fn poison_kills_are_reported_by_turn_advance() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Alchemist", PlayerId::Zero)
        .unit(0, 2, "Peasant", PlayerId::One)
        .build();
    board.attack(c(0, 0), c(0, 2));
    assert_eq!(board.unit_at(c(0, 2)).unwrap().hp(), 3);
    board.next_turn();
    let summary = board.next_turn();
    assert!(board.unit_at(c(0, 2)).is_some());
    assert!(summary.lost_to_status.is_empty());

    board.next_turn();
    let summary = board.next_turn();
    assert!(board.unit_at(c(0, 2)).is_none());
    assert_eq!(summary.lost_to_status, vec!["Peasant".to_string()]);
}

#[test]
fn fear_weakens_the_next_strike() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Knight", PlayerId::Zero)
        .unit(0, 1, "Catapult", PlayerId::One)
        .unit(3, 3, "Archer", PlayerId::One)
        .build();
    // Catapults are constructs: fear does not take.
    let report = board.attack(c(0, 0), c(0, 1));
    assert!(matches!(report.statuses[0].result, Err(AttachError::Immune { .. })));

    board.next_turn();
    board.next_turn();
    board.move_unit(c(0, 0), c(2, 3));
    let report = board.attack(c(2, 3), c(3, 3));
    assert!(report.statuses[0].result.is_ok());
    let archer = board.unit_at(c(3, 3)).unwrap();
    assert!(archer.has_status("Fear"));
    // Archer attack 4, fear −2.
    assert_eq!(archer.attack(), 2);
}

// =============================================================================
// Movement
// =============================================================================

#[test]
fn enemies_block_paths() {
    let board = BoardBuilder::new()
        .unit(0, 0, "Archer", PlayerId::Zero)
        .unit(1, 0, "Swordsman", PlayerId::One)
        .unit(0, 1, "Swordsman", PlayerId::One)
        .build();
    assert!(board.moveable_tiles_from(c(0, 0)).is_empty());
}

#[test]
fn allies_are_passable_but_walls_are_not() {
    let board = BoardBuilder::new()
        .unit(0, 0, "Archer", PlayerId::Zero)
        .prebuilt(1, 0, "Wall", PlayerId::Zero)
        .unit(0, 1, "Peasant", PlayerId::Zero)
        .build();
    let moves = board.moveable_tiles_from(c(0, 0));
    // Through the peasant, never onto it.
    assert!(moves.contains(&c(0, 2)));
    assert!(moves.contains(&c(1, 1)));
    assert!(!moves.contains(&c(0, 1)));
    assert!(!moves.contains(&c(1, 0)));
    // Going around the wall costs three steps to (2, 1) and four to (2, 0).
    assert!(moves.contains(&c(2, 1)));
    assert!(!moves.contains(&c(2, 0)));
}

#[test]
fn units_move_once_per_turn() {
    let mut board = BoardBuilder::new().unit(0, 0, "Archer", PlayerId::Zero).build();
    assert!(board.move_unit(c(0, 0), c(0, 3)));
    assert!(board.moveable_tiles_from(c(0, 3)).is_empty());
    board.next_turn();
    board.next_turn();
    assert!(!board.moveable_tiles_from(c(0, 3)).is_empty());
}

// =============================================================================
// Turn advance and economy
// =============================================================================

#[test]
fn turn_advance_flips_and_pays() {
    let mut board = BoardBuilder::new()
        .prebuilt(0, 0, "Farm", PlayerId::One)
        .prebuilt(1, 0, "Farm", PlayerId::One)
        .build();
    let summary = board.next_turn();
    assert_eq!(board.turn(), fixed_f(1.5));
    assert_eq!(summary.acting, PlayerId::One);
    assert_eq!(summary.income, 2);
    assert_eq!(board.player(PlayerId::One).funds, 7);

    let summary = board.next_turn();
    assert_eq!(board.turn(), fixed(2));
    assert_eq!(board.turn_number(), 2);
    assert_eq!(summary.income, 0);
    assert_eq!(board.player(PlayerId::Zero).funds, 5);
}

#[test]
fn purchases_conserve_funds() {
    let mut board = BoardBuilder::new().funds(6).build();
    let funds = board.player(PlayerId::Zero).funds;
    board.buy_unit(c(0, 0), "Swordsman").unwrap();
    assert_eq!(board.player(PlayerId::Zero).funds, funds - 3);

    assert!(matches!(
        board.buy_unit(c(0, 0), "Archer"),
        Err(PurchaseError::Occupied(_))
    ));
    assert!(matches!(
        board.buy_unit(c(1, 0), "Knight"),
        Err(PurchaseError::InsufficientFunds { cost: 5, funds: 3, .. })
    ));
    assert_eq!(board.player(PlayerId::Zero).funds, 3);
    assert_eq!(board.grid().unit_count(), 1);
}

#[test]
fn walls_take_three_build_actions() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Peasant", PlayerId::Zero)
        .unit(1, 1, "Wall", PlayerId::Zero)
        .build();
    assert!(board.build(c(0, 0), c(1, 1)));
    assert!(board.unit_at(c(1, 1)).unwrap().is_under_construction());
    board.next_turn();
    board.next_turn();
    assert!(board.build(c(0, 0), c(1, 1)));
    assert!(!board.unit_at(c(1, 1)).unwrap().is_under_construction());
}

// =============================================================================
// Click state machine
// =============================================================================

#[test]
fn moves_need_a_second_click() {
    let mut board = BoardBuilder::new().unit(0, 0, "Archer", PlayerId::Zero).build();
    assert_eq!(board.click(c(0, 0)), ClickOutcome::Selected);
    assert_eq!(board.click(c(0, 2)), ClickOutcome::Armed);
    assert!(board.unit_at(c(0, 0)).is_some());

    // A different legal cell re-arms instead of committing.
    assert_eq!(board.click(c(1, 1)), ClickOutcome::Armed);
    assert_eq!(
        *board.selection(),
        ClickState::ConfirmingMove {
            from: c(0, 0),
            to: c(1, 1)
        }
    );
    assert_eq!(
        board.click(c(1, 1)),
        ClickOutcome::Moved {
            from: c(0, 0),
            to: c(1, 1)
        }
    );
    assert_eq!(*board.selection(), ClickState::ChoosingAction { from: c(1, 1) });
}

#[test]
fn attacks_need_a_second_click() {
    let mut board = BoardBuilder::new()
        .unit(0, 0, "Archer", PlayerId::Zero)
        .unit(0, 3, "Archer", PlayerId::One)
        .build();
    board.click(c(0, 0));
    assert_eq!(board.click(c(0, 3)), ClickOutcome::Armed);
    assert_eq!(board.unit_at(c(0, 3)).unwrap().hp(), 10);
    let ClickOutcome::Attacked(report) = board.click(c(0, 3)) else {
        panic!("expected an attack");
    };
    assert_eq!(report.total_damage(), 4);
    assert_eq!(*board.selection(), ClickState::ChoosingAction { from: c(0, 0) });
}

#[test]
fn production_through_menu_and_click() {
    let mut board = BoardBuilder::new()
        .prebuilt(5, 0, "Castle", PlayerId::Zero)
        .build();
    board.click(c(5, 0));
    let menu = board.production_menu();
    assert_eq!(menu.len(), 6);
    let knight = menu.iter().find(|entry| entry.kind == "Knight").unwrap();
    assert_eq!(knight.status, ProductionStatus::Available);
    assert_eq!(knight.label(), "5: Knight");
    let catapult = menu.iter().find(|entry| entry.kind == "Catapult").unwrap();
    assert_eq!(catapult.status, ProductionStatus::Available);

    assert!(board.press_key('a'));
    let highlights = board.highlights();
    assert!(highlights.producible.contains(&c(4, 1)));
    let ClickOutcome::Produced(id) = board.click(c(4, 1)) else {
        panic!("expected a purchase");
    };
    assert_eq!(board.grid().position_of(id), Some(c(4, 1)));
    assert_eq!(board.player(PlayerId::Zero).funds, 3);
    assert_eq!(*board.selection(), ClickState::ChoosingAction { from: c(5, 0) });

    let knight = board
        .production_menu()
        .into_iter()
        .find(|entry| entry.kind == "Knight")
        .unwrap();
    assert_eq!(knight.status, ProductionStatus::InsufficientFunds);
    assert_eq!(knight.label(), "5: Knight - Insufficient Funds");
}

#[test]
fn turn_advance_clears_selection() {
    let mut board = BoardBuilder::new().unit(0, 0, "Archer", PlayerId::Zero).build();
    board.click(c(0, 0));
    board.click(c(0, 1));
    board.next_turn();
    assert_eq!(*board.selection(), ClickState::default());
    let expected: BTreeSet<Coord> = BTreeSet::new();
    assert_eq!(board.highlights().moveable, expected);
}
