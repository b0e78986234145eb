//! Whole-journey simulation runs.

use journey_engine::EngineConfig;
use journey_sim::{run_simulator, SimulatorConfig, SimulatorReport};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn uncached_engine_survives_heavy_faults() {
    let engine = EngineConfig::from_toml_str("[ledger_cache]\nenabled = false\n").unwrap();
    let report = run_simulator(SimulatorConfig {
        seed: 7,
        users: 6,
        failure_rate: 0.35,
        max_retries: 64,
        engine,
        ..SimulatorConfig::default()
    })
    .await
    .unwrap();

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.stats.users_started, 6);
}

#[tokio::test]
async fn without_lost_acks_every_user_finishes() {
    let report = run_simulator(SimulatorConfig {
        seed: 11,
        users: 5,
        failure_rate: 0.1,
        lost_ack: false,
        max_retries: 64,
        ..SimulatorConfig::default()
    })
    .await
    .unwrap();

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.stats.users_finished, 5);
}

#[tokio::test]
async fn report_serializes_to_json() {
    let report = run_simulator(SimulatorConfig {
        users: 2,
        failure_rate: 0.0,
        ..SimulatorConfig::default()
    })
    .await
    .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let back: SimulatorReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.stats, report.stats);
    assert_eq!(back.config.seed, report.config.seed);
    assert_eq!(back.config.engine, report.config.engine);
}
