//! The ordered rule list the AI runs for each unit.
//!
//! A rule returns `None` when it does not apply, passing the unit on to the
//! next rule.

use rand::seq::SliceRandom;
use tracing::debug;

use super::scoring::{
    best_target, enemy_cells, foothold, is_lethal, safest_cell, step_away, step_toward,
    uncontested_objectives,
};
use super::{AiAction, HeuristicAi, TurnContext};
use crate::board::Board;
use crate::data::UnitCatalog;
use crate::grid::Coord;
use crate::unit::tags;

type Rule = fn(&mut HeuristicAi, &mut Board, Coord, TurnContext) -> Option<AiAction>;

/// Rules in priority order.
pub(super) const RULES: &[(&str, Rule)] = &[
    ("hold_objective", hold_objective as Rule),
    ("builder", builder as Rule),
    ("engage", engage as Rule),
    ("factory", factory as Rule),
];

fn attack_best(board: &mut Board, from: Coord) -> Option<AiAction> {
    let target = best_target(board, from)?;
    let report = board.attack(from, target);
    Some(AiAction::Attack {
        target,
        damage: report.total_damage(),
        kills: report.kills(),
    })
}

fn move_to(board: &mut Board, from: Coord, to: Coord, retreat: bool) -> Option<AiAction> {
    if !board.move_unit(from, to) {
        return None;
    }
    Some(if retreat {
        AiAction::Retreat { to }
    } else {
        AiAction::Move { to }
    })
}

/// Units on an objective stay there unless staying is lethal. Factories
/// are left to the factory rule.
fn hold_objective(
    _ai: &mut HeuristicAi,
    board: &mut Board,
    from: Coord,
    _context: TurnContext,
) -> Option<AiAction> {
    if !board.is_objective(from) || board.unit_at(from)?.has_tag(tags::FACTORY) {
        return None;
    }
    if let Some(action) = attack_best(board, from) {
        return Some(action);
    }

    let unit = board.unit_at(from)?;
    let escape = if is_lethal(board, from, unit) {
        safest_cell(board, &board.moveable_tiles_from(from), unit)
    } else {
        None
    };
    if let Some(action) = escape.and_then(|to| move_to(board, from, to, true)) {
        return Some(action);
    }
    Some(AiAction::Hold)
}

/// Builders fight, finish sites, found producers or head for objectives.
fn builder(
    ai: &mut HeuristicAi,
    board: &mut Board,
    from: Coord,
    context: TurnContext,
) -> Option<AiAction> {
    let unit = board.unit_at(from)?;
    if !unit.has_tag(tags::BUILDER) {
        return None;
    }
    if let Some(action) = attack_best(board, from) {
        return Some(action);
    }

    if let Some(&site) = board.buildable_tiles_from(from).first() {
        board.build(from, site);
        return Some(AiAction::Build { site });
    }

    if !context.dire && foothold(board, ai.player) <= foothold(board, ai.player.other()) {
        if let Some(action) = found_producer(board, from) {
            return Some(action);
        }
    }

    let goals: Vec<Coord> = uncontested_objectives(board, ai.player).into_iter().collect();
    if let Some(to) = step_toward(&board.moveable_tiles_from(from), &goals) {
        if let Some(action) = move_to(board, from, to, false) {
            return Some(action);
        }
    }
    Some(AiAction::Idle)
}

/// Buy the cheapest affordable producer next to the builder, away from enemies.
fn found_producer(board: &mut Board, from: Coord) -> Option<AiAction> {
    let builder = board.unit_at(from)?;
    if builder.actions() == 0 {
        return None;
    }
    let funds = board.acting_player().funds;
    let kind = board
        .catalog()
        .produced_by(builder.name())
        .into_iter()
        .filter(|data| data.has_tag(tags::PRODUCER) && data.cost <= funds)
        .min_by_key(|data| data.cost)?
        .name
        .clone();

    let enemies = enemy_cells(board, builder.owner());
    let at = board
        .grid()
        .empty_surrounding(from)
        .find(|cell| enemies.iter().all(|enemy| enemy.manhattan(*cell) > 1))?;

    let id = board.buy_unit(at, &kind).ok()?;
    if let Some(builder) = board.unit_at_mut(from) {
        builder.spend_action();
    }
    debug!(site = %id, kind = %kind, %at, "ai founded producer");
    Some(AiAction::Produce { kind, at })
}

/// Attack the best target, else advance on objectives or enemies.
fn engage(
    ai: &mut HeuristicAi,
    board: &mut Board,
    from: Coord,
    context: TurnContext,
) -> Option<AiAction> {
    if let Some(action) = attack_best(board, from) {
        return Some(action);
    }

    let moves = board.moveable_tiles_from(from);
    if moves.is_empty() {
        return None;
    }

    let goals: Vec<Coord> = uncontested_objectives(board, ai.player).into_iter().collect();
    if let Some(action) = step_toward(&moves, &goals).and_then(|to| move_to(board, from, to, false))
    {
        return Some(action);
    }

    let enemies = enemy_cells(board, ai.player);
    if enemies.is_empty() {
        return None;
    }
    if context.dire {
        if let Some(action) =
            step_away(&moves, &enemies).and_then(|to| move_to(board, from, to, true))
        {
            return Some(action);
        }
    }
    step_toward(&moves, &enemies).and_then(|to| move_to(board, from, to, false))
}

/// Factories buy a unit from the least recently bought cost bracket.
fn factory(
    ai: &mut HeuristicAi,
    board: &mut Board,
    from: Coord,
    _context: TurnContext,
) -> Option<AiAction> {
    let unit = board.unit_at(from)?;
    if !unit.has_tag(tags::FACTORY) {
        return None;
    }
    let at = board.grid().empty_surrounding(from).next()?;
    let options: Vec<(String, i32)> = board
        .catalog()
        .produced_by(unit.name())
        .into_iter()
        .map(|data| (data.name.clone(), data.cost))
        .collect();
    let funds = board.acting_player().funds;

    let kind = ai.choose_kind(board.catalog(), &options, funds)?;
    board.buy_unit(at, &kind).ok()?;
    ai.record_purchase(&kind);
    Some(AiAction::Produce { kind, at })
}

impl HeuristicAi {
    /// Cost bracket: 0 cheap, 1 mid, 2 expensive.
    fn bracket(&self, cost: i32) -> usize {
        if cost <= self.config.cheap_max_cost {
            0
        } else if cost >= self.config.expensive_min_cost {
            2
        } else {
            1
        }
    }

    /// Pick an affordable kind from the bracket least represented in the
    /// recent purchase history, then uniformly within it.
    fn choose_kind(
        &mut self,
        catalog: &UnitCatalog,
        options: &[(String, i32)],
        funds: i32,
    ) -> Option<String> {
        let mut buckets: [Vec<&str>; 3] = Default::default();
        for (kind, cost) in options.iter().filter(|(_, cost)| *cost <= funds) {
            buckets[self.bracket(*cost)].push(kind);
        }

        let mut recent = [0usize; 3];
        for kind in &self.history {
            recent[self.bracket(catalog.cost_of(kind).unwrap_or(0))] += 1;
        }

        let chosen = (0..3)
            .filter(|&b| !buckets[b].is_empty())
            .min_by_key(|&b| recent[b])?;
        buckets[chosen]
            .choose(&mut self.rng)
            .map(|kind| (*kind).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::ai::AiConfig;
    use crate::config::GameConfig;
    use crate::player::PlayerId;

    const CATALOG: &str = r#"[
        UnitData(name: "Castle", attack: 0, max_hp: 30, armor: 2, speed: 0, range: 0,
                 cost: 20, production: 1, tags: ["factory", "obstructs movement"]),
        UnitData(name: "Archer", attack: 4, max_hp: 10, speed: 3, range: 3, cost: 2,
                 tags: ["alive", "produced by Castle"]),
        UnitData(name: "Swordsman", attack: 5, max_hp: 12, armor: 1, speed: 3, range: 1,
                 cost: 3, tags: ["alive", "produced by Castle"]),
        UnitData(name: "Knight", attack: 6, max_hp: 14, speed: 4, range: 1, cost: 5,
                 tags: ["alive", "produced by Castle"]),
        UnitData(name: "Peasant", attack: 1, max_hp: 5, speed: 3, range: 1, cost: 1,
                 tags: ["alive", "builder", "produced by Castle"]),
        UnitData(name: "Farm", attack: 0, max_hp: 8, speed: 0, range: 0, cost: 3,
                 production: 1,
                 tags: ["producer", "produced by builder", "produced by Peasant"]),
    ]"#;

    fn board(objectives: &[Coord]) -> Board {
        let catalog = UnitCatalog::from_ron_str(CATALOG).unwrap();
        let config = GameConfig::default()
            .with_size(10, 10)
            .with_objectives(objectives.iter().copied());
        Board::new(&config, Arc::new(catalog)).unwrap()
    }

    fn context() -> TurnContext {
        TurnContext { dire: false }
    }

    fn ai() -> HeuristicAi {
        HeuristicAi::new(PlayerId::Zero, AiConfig::default())
    }

    #[test]
    fn test_bracket_rotation() {
        let board = board(&[]);
        let mut ai = ai();
        let options = vec![
            ("Archer".to_string(), 2),
            ("Swordsman".to_string(), 3),
            ("Knight".to_string(), 5),
        ];
        ai.record_purchase("Archer");
        ai.record_purchase("Knight");
        assert_eq!(
            ai.choose_kind(board.catalog(), &options, 10),
            Some("Swordsman".to_string())
        );
        // Only the cheap bracket is affordable.
        assert_eq!(
            ai.choose_kind(board.catalog(), &options, 2),
            Some("Archer".to_string())
        );
        assert_eq!(ai.choose_kind(board.catalog(), &options, 1), None);
    }

    #[test]
    fn test_holder_stays_on_objective() {
        let mut board = board(&[Coord::new(5, 5)]);
        board.place_unit(Coord::new(5, 5), "Knight", PlayerId::Zero, false).unwrap();
        let action = hold_objective(&mut ai(), &mut board, Coord::new(5, 5), context());
        assert_eq!(action, Some(AiAction::Hold));
        assert!(board.unit_at(Coord::new(5, 5)).is_some());
    }

    #[test]
    fn test_holder_retreats_from_lethal_threat() {
        let mut board = board(&[Coord::new(5, 5)]);
        board.place_unit(Coord::new(5, 5), "Peasant", PlayerId::Zero, false).unwrap();
        // Out of the peasant's reach but able to close in and strike.
        board.place_unit(Coord::new(5, 8), "Knight", PlayerId::One, false).unwrap();
        let action = hold_objective(&mut ai(), &mut board, Coord::new(5, 5), context());
        assert!(matches!(action, Some(AiAction::Retreat { .. })));
        assert!(board.grid().is_empty(Coord::new(5, 5)));
    }

    #[test]
    fn test_engage_attacks_then_advances() {
        let mut board = board(&[Coord::new(9, 9)]);
        board.place_unit(Coord::new(0, 0), "Archer", PlayerId::Zero, false).unwrap();
        board.place_unit(Coord::new(0, 2), "Archer", PlayerId::One, false).unwrap();
        let action = engage(&mut ai(), &mut board, Coord::new(0, 0), context());
        assert!(matches!(action, Some(AiAction::Attack { damage: 4, .. })));

        board.remove_unit(Coord::new(0, 2));
        board.place_unit(Coord::new(5, 0), "Archer", PlayerId::Zero, false).unwrap();
        let action = engage(&mut ai(), &mut board, Coord::new(5, 0), context());
        let Some(AiAction::Move { to }) = action else {
            panic!("expected a move, got {action:?}");
        };
        assert_eq!(to.manhattan(Coord::new(9, 9)), 10);
    }

    #[test]
    fn test_dire_units_back_away() {
        let mut board = board(&[]);
        board.place_unit(Coord::new(5, 5), "Swordsman", PlayerId::Zero, false).unwrap();
        board.place_unit(Coord::new(5, 9), "Knight", PlayerId::One, false).unwrap();
        let action = engage(&mut ai(), &mut board, Coord::new(5, 5), TurnContext { dire: true });
        let Some(AiAction::Retreat { to }) = action else {
            panic!("expected a retreat, got {action:?}");
        };
        assert!(to.manhattan(Coord::new(5, 9)) > 4);
    }

    #[test]
    fn test_objectives_come_before_retreat() {
        let mut board = board(&[Coord::new(5, 0)]);
        board.place_unit(Coord::new(5, 5), "Swordsman", PlayerId::Zero, false).unwrap();
        board.place_unit(Coord::new(5, 9), "Knight", PlayerId::One, false).unwrap();
        let action = engage(&mut ai(), &mut board, Coord::new(5, 5), TurnContext { dire: true });
        let Some(AiAction::Move { to }) = action else {
            panic!("expected an advance, got {action:?}");
        };
        assert_eq!(to.manhattan(Coord::new(5, 0)), 2);
    }

    #[test]
    fn test_factory_on_objective_keeps_producing() {
        let mut board = board(&[Coord::new(5, 0)]);
        board.place_unit(Coord::new(5, 0), "Castle", PlayerId::Zero, true).unwrap();
        let mut ai = ai();
        assert_eq!(
            hold_objective(&mut ai, &mut board, Coord::new(5, 0), context()),
            None
        );
        let action = RULES
            .iter()
            .find_map(|&(_, rule)| rule(&mut ai, &mut board, Coord::new(5, 0), context()));
        assert!(matches!(action, Some(AiAction::Produce { .. })));
    }

    #[test]
    fn test_builder_founds_producer_then_builds() {
        let mut board = board(&[]);
        board.place_unit(Coord::new(0, 0), "Peasant", PlayerId::Zero, false).unwrap();
        let action = builder(&mut ai(), &mut board, Coord::new(0, 0), context());
        let Some(AiAction::Produce { kind, at }) = action else {
            panic!("expected a purchase, got {action:?}");
        };
        assert_eq!(kind, "Farm");
        assert!(board.unit_at(at).unwrap().is_under_construction());
        assert_eq!(board.player(PlayerId::Zero).funds, 2);

        board.next_turn();
        board.next_turn();
        let action = builder(&mut ai(), &mut board, Coord::new(0, 0), context());
        assert_eq!(action, Some(AiAction::Build { site: at }));
    }

    #[test]
    fn test_factory_produces_next_to_itself() {
        let mut board = board(&[]);
        board.place_unit(Coord::new(5, 0), "Castle", PlayerId::Zero, true).unwrap();
        let mut ai = ai();
        let action = factory(&mut ai, &mut board, Coord::new(5, 0), context());
        let Some(AiAction::Produce { kind, at }) = action else {
            panic!("expected a purchase, got {action:?}");
        };
        assert!(at.manhattan(Coord::new(5, 0)) <= 2);
        assert_eq!(board.unit_at(at).unwrap().name(), kind);
        assert_eq!(ai.history().collect::<Vec<_>>(), vec![kind.as_str()]);
    }
}
