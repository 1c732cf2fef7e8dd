use std::fs;
use std::path::Path;

use tempfile::tempdir;
use tractor_core::model::player::PlayerPosition;
use tractor_replay::config::ReplayConfig;
use tractor_replay::replay::{ReplayError, ReplayRunner};

const DEMO_YAML: &str = include_str!("../../../replay/replay.yaml");

fn load_config(output_dir: &Path, run_id: &str) -> ReplayConfig {
    let path = output_dir.join(format!("{run_id}.yaml"));
    let yaml = DEMO_YAML
        .replace("\"demo_round\"", &format!("\"{run_id}\""))
        .replace(
            "replay/out/{run_id}/plays.jsonl",
            &output_dir.join("{run_id}").join("plays.jsonl").display().to_string(),
        )
        .replace("enable_structured: true", "enable_structured: false");
    fs::write(&path, yaml).expect("write config");
    ReplayConfig::from_path(&path).expect("config loads")
}

fn run(config: ReplayConfig) -> tractor_replay::replay::ReplaySummary {
    let outputs = config.resolved_outputs();
    ReplayRunner::new(config, outputs)
        .expect("runner created")
        .run()
        .expect("replay completes")
}

#[test]
fn demo_round_replays_to_completion() {
    let dir = tempdir().expect("temp dir");
    let summary = run(load_config(dir.path(), "smoke"));

    assert_eq!(summary.plays_applied, 12);
    assert_eq!(summary.plays_rejected, 1);
    assert_eq!(
        summary.trick_winners,
        vec![
            PlayerPosition::East,
            PlayerPosition::South,
            PlayerPosition::West
        ]
    );
    assert!(summary.round_finished);
    assert_eq!(summary.jsonl_path, dir.path().join("smoke").join("plays.jsonl"));

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    let rows: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect();
    assert_eq!(rows.len(), 13);
    assert!(rows.iter().all(|row| row["run_id"] == "smoke"));
    assert_eq!(rows[1]["rejection"]["reason"], "suit_not_exhausted");
    assert_eq!(rows[8]["suit"], "Mixed");
    assert_eq!(rows[6]["suit"], "Trump");
    assert_eq!(rows[10]["current_winner"], "west");
}

#[test]
fn replay_output_is_deterministic() {
    let dir = tempdir().expect("temp dir");
    let first = run(load_config(dir.path(), "first"));
    let second = run(load_config(dir.path(), "second"));

    let normalize = |path: &Path, run_id: &str| {
        fs::read_to_string(path)
            .expect("jsonl readable")
            .replace(run_id, "RUN")
    };
    assert_eq!(
        normalize(&first.jsonl_path, "first"),
        normalize(&second.jsonl_path, "second")
    );
}

#[test]
fn script_out_of_step_with_the_table_aborts() {
    let dir = tempdir().expect("temp dir");
    let mut config = load_config(dir.path(), "desync");
    config.plays.swap(3, 4);
    let outputs = config.resolved_outputs();
    let err = ReplayRunner::new(config, outputs)
        .expect("runner created")
        .run()
        .unwrap_err();
    assert!(matches!(err, ReplayError::Desync { index: 3, .. }));
}
