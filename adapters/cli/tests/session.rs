use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use horde_cli::{
    DoorOpening, LevelConfig, RunReport, ScenarioConfig, Session, SimulationConfig, TargetConfig,
};
use horde_system_spawning::SpawnConfig;

fn scenario(rows: &[&str], panels: u32, target: TargetConfig, ticks: u64) -> ScenarioConfig {
    ScenarioConfig {
        level: LevelConfig {
            rows: rows.iter().map(|row| (*row).to_owned()).collect(),
            tile_size: 32.0,
            panels,
        },
        spawning: SpawnConfig::new(500, 4),
        simulation: SimulationConfig {
            tick_ms: 50,
            ticks,
            seed: 21,
        },
        target,
        ..ScenarioConfig::default()
    }
}

fn fingerprint(report: &RunReport) -> u64 {
    let mut hasher = DefaultHasher::new();
    report.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn unopposed_horde_breaches_and_overwhelms_the_defender() {
    let config = scenario(
        &[
            "#########",
            "#...P...#",
            "####B####",
            "#S......#",
            "#########",
        ],
        1,
        TargetConfig {
            health: 20,
            damage: 0,
            ..TargetConfig::default()
        },
        2_000,
    );

    let report = Session::new(&config).expect("session loads").run(2_000);

    assert!(report.target_fell, "defender should fall: {report:?}");
    assert_eq!(report.target_health, 0);
    assert!(report.damage_taken >= 20);
    assert!(report.ticks_run < 2_000, "run should stop early");
    assert_eq!(report.barricades_breached, 1);
    assert!(report.spawned >= 1);
    assert_eq!(report.died, 0);
}

#[test]
fn defender_cuts_down_agents_in_the_open() {
    let config = scenario(
        &["##########", "#S......P#", "##########"],
        0,
        TargetConfig {
            health: 100,
            damage: 100,
            cooldown_ms: 100,
            range: 512.0,
        },
        400,
    );

    let report = Session::new(&config).expect("session loads").run(400);

    assert_eq!(report.ticks_run, 400);
    assert!(report.died >= 1, "defender should kill: {report:?}");
    assert_eq!(report.target_health, 100);
    assert!(!report.target_fell);
}

#[test]
fn scheduled_door_unlocks_its_zone() {
    let config = ScenarioConfig {
        doors: vec![DoorOpening { door: 0, tick: 10 }],
        ..ScenarioConfig::default()
    };

    let mut session = Session::new(&config).expect("session loads");
    for _ in 0..20 {
        assert!(session.step());
    }
    let report = session.finish();

    assert_eq!(report.ticks_run, 20);
    assert_eq!(report.zones_unlocked, vec![2]);
    assert!(session.level().doors()[0].is_open());
}

#[test]
fn deterministic_replay_produces_identical_report() {
    let config = ScenarioConfig {
        doors: vec![DoorOpening { door: 0, tick: 200 }],
        ..ScenarioConfig::default()
    };

    let first = Session::new(&config).expect("session loads").run(600);
    let second = Session::new(&config).expect("session loads").run(600);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(fingerprint(&first), fingerprint(&second));
    assert!(first.spawned > 0);
}

#[test]
fn invalid_scenarios_are_rejected() {
    let mut config = ScenarioConfig::default();
    config.simulation.tick_ms = 0;
    let error = Session::new(&config).expect_err("zero tick is rejected");
    assert!(error.to_string().contains("tick_ms"));

    let config = scenario(&["#####", "#S.P"], 0, TargetConfig::default(), 10);
    let error = Session::new(&config).expect_err("ragged map is rejected");
    assert!(format!("{error:#}").contains("failed to load level"));
}
