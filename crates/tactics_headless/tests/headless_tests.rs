//! File-backed runs of the headless runner.

use std::fs;

use tactics_core::player::PlayerId;
use tactics_headless::{
    load_catalog, run_batch, run_match, BatchConfig, BatchResults, RunnerError, Scenario,
};
use tactics_test_utils::fixtures::STANDARD_UNITS;

const DUEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/scenarios/duel.ron");

#[test]
fn duel_scenario_loads_and_plays() {
    let scenario = Scenario::load(DUEL).unwrap();
    assert_eq!(scenario.name, "Duel");
    assert_eq!(scenario.placements.len(), 6);

    let catalog = load_catalog(None).unwrap();
    let result = run_match(&scenario, catalog, 5, 30).unwrap();
    assert!(result.sides.iter().all(|side| side.purchases == 0));
    if let Some(winner) = result.winner {
        assert!(result.sides[winner.index()].survivors > 0);
        assert_eq!(result.sides[winner.other().index()].survivors, 0);
    }
}

#[test]
fn catalog_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.ron");
    fs::write(&path, STANDARD_UNITS).unwrap();

    let catalog = load_catalog(Some(&path)).unwrap();
    assert_eq!(catalog.len(), 9);
    assert!(!catalog.contains("Gate"));
}

#[test]
fn broken_catalog_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("units.ron");
    fs::write(&path, "[UnitData(name: \"Half\"").unwrap();
    assert!(matches!(
        load_catalog(Some(&path)),
        Err(RunnerError::Game(_))
    ));
}

#[test]
fn scenario_with_unknown_kind_fails_to_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ron");
    fs::write(
        &path,
        r#"Scenario(name: "Bad", placements: [(kind: "Dragon", x: 0, y: 0, owner: One)])"#,
    )
    .unwrap();

    let scenario = Scenario::load(&path).unwrap();
    let catalog = load_catalog(None).unwrap();
    assert!(scenario.build_game(catalog, 0).is_err());
}

#[test]
fn batch_results_save_and_load() {
    let scenario = Scenario::load(DUEL).unwrap();
    let catalog = load_catalog(None).unwrap();
    let results = run_batch(
        &scenario,
        catalog,
        BatchConfig::new(6).with_seed(100).with_max_turns(20),
    );
    assert_eq!(results.matches.len(), 6);
    assert!(results.errors.is_empty());
    let seeds: Vec<u64> = results.matches.iter().map(|m| m.seed).collect();
    assert_eq!(seeds, (100..106).collect::<Vec<_>>());
    assert_eq!(
        results.summary.draws + results.summary.wins.values().sum::<u32>(),
        6
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("batch.json");
    results.save(&path).unwrap();
    let loaded = BatchResults::load(&path).unwrap();
    assert_eq!(loaded.matches, results.matches);
    assert_eq!(loaded.config, results.config);
    assert_eq!(loaded.scenario, "Duel");
}

#[test]
fn batch_is_reproducible_across_thread_counts() {
    let scenario = Scenario::castles();
    let catalog = load_catalog(None).unwrap();
    let config = BatchConfig::new(4).with_seed(9).with_max_turns(8);

    let serial = run_batch(
        &scenario,
        std::sync::Arc::clone(&catalog),
        BatchConfig {
            parallel_games: 1,
            ..config.clone()
        },
    );
    let parallel = run_batch(&scenario, catalog, config);
    assert_eq!(serial.matches, parallel.matches);
}

#[test]
fn castle_scenario_starts_balanced() {
    let catalog = load_catalog(None).unwrap();
    let game = Scenario::castles().build_game(catalog, 1).unwrap();
    let board = game.board();
    assert_eq!((board.grid().width(), board.grid().height()), (10, 20));
    assert_eq!(
        board.grid().units_of(PlayerId::Zero).count(),
        board.grid().units_of(PlayerId::One).count()
    );
    assert!(game.is_ai(PlayerId::Zero) && game.is_ai(PlayerId::One));
}
