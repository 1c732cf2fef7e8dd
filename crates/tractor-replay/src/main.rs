use std::path::PathBuf;

use clap::Parser;

use tractor_replay::config::ReplayConfig;
use tractor_replay::logging::init_logging;
use tractor_replay::replay::ReplayRunner;

/// Replays a scripted Tractor round through the rule engine.
#[derive(Debug, Parser)]
#[command(
    name = "tractor-replay",
    author,
    version,
    about = "Deterministic Tractor round replayer"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "replay/replay.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the JSONL output path.
    #[arg(long, value_name = "PATH")]
    jsonl: Option<String>,

    /// Stop at the first illegal play instead of skipping it.
    #[arg(long)]
    stop_on_invalid: bool,

    /// Exit after validating the configuration and the deal.
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ReplayConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(jsonl) = cli.jsonl {
        config.outputs.jsonl = jsonl;
    }

    if cli.stop_on_invalid {
        config.stop_on_invalid = true;
    }

    config.validate()?;

    let outputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let play_count = config.plays.len();
    let designation = config.trump.designation()?;

    println!(
        "Loaded replay '{run_id}' with {play_count} scripted play{} (trump {designation}, {} leads)",
        if play_count == 1 { "" } else { "s" },
        config.leader
    );

    let logging = config.logging.clone();
    let runner = ReplayRunner::new(config, outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: replay skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&logging, &outputs)?;

    let summary = runner.run()?;
    println!(
        "Replay complete for '{run_id}': {} applied, {} rejected, {} tricks → {}",
        summary.plays_applied,
        summary.plays_rejected,
        summary.tricks_completed,
        summary.jsonl_path.display()
    );
    if let Some(index) = summary.stopped_at {
        println!("Stopped at rejected play {index}.");
    }
    if !summary.trick_winners.is_empty() {
        let winners: Vec<String> = summary
            .trick_winners
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Trick winners: {}", winners.join(", "));
    }
    if summary.round_finished {
        println!("Round finished.");
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
