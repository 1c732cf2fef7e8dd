use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};
use tractor_core::game::round::{Round, RoundError};
use tractor_core::model::card::Card;
use tractor_core::model::player::PlayerPosition;
use tractor_core::rules::{InvalidPlay, PlayError};

use crate::config::{ReplayConfig, ResolvedOutputs, ValidationError};

/// Feeds a scripted round through the rule engine, one JSON line per play.
pub struct ReplayRunner {
    config: ReplayConfig,
    outputs: ResolvedOutputs,
    round: Round,
    plays: Vec<(PlayerPosition, Vec<Card>)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub plays_applied: usize,
    pub plays_rejected: usize,
    pub tricks_completed: usize,
    pub trick_winners: Vec<PlayerPosition>,
    /// Index of the rejected play that ended the run under `stop_on_invalid`.
    pub stopped_at: Option<usize>,
    pub round_finished: bool,
    pub jsonl_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct PlayLogRow<'a> {
    run_id: &'a str,
    index: usize,
    trick: usize,
    seat: PlayerPosition,
    cards: Vec<String>,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    suit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_winner: Option<PlayerPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trick_winner: Option<PlayerPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<&'a InvalidPlay>,
}

impl ReplayRunner {
    /// Build a runner from a validated configuration, dealing the round.
    pub fn new(config: ReplayConfig, outputs: ResolvedOutputs) -> Result<Self, ReplayError> {
        let designation = config.trump.designation()?;
        let hands = config.hands.deal()?;
        let plays = config
            .plays
            .iter()
            .enumerate()
            .map(|(index, play)| Ok((play.seat, play.cards(index)?)))
            .collect::<Result<Vec<_>, ValidationError>>()?;
        let round = Round::new(hands, designation, config.leader).map_err(ReplayError::Deal)?;

        Ok(Self {
            config,
            outputs,
            round,
            plays,
        })
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    /// Apply every scripted play, streaming rows to the JSONL output.
    ///
    /// Illegal plays are logged and skipped; anything that means the script
    /// no longer matches the table aborts the run.
    pub fn run(mut self) -> Result<ReplaySummary, ReplayError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);

        let mut applied = 0usize;
        let mut rejected = 0usize;
        let mut stopped_at = None;
        let plays = std::mem::take(&mut self.plays);

        for (index, (seat, cards)) in plays.into_iter().enumerate() {
            let trick = self.round.completed_tricks().len() + 1;
            let tokens: Vec<String> = cards.iter().map(Card::to_string).collect();
            let mut row = PlayLogRow {
                run_id: &self.config.run_id,
                index,
                trick,
                seat,
                cards: tokens,
                accepted: false,
                suit: None,
                card_count: None,
                current_winner: None,
                trick_winner: None,
                rejection: None,
            };

            match self.round.play(seat, &cards) {
                Ok(outcome) => {
                    applied += 1;
                    row.accepted = true;
                    row.suit = Some(outcome.format.suit.to_string());
                    row.card_count = Some(outcome.format.card_count);
                    row.current_winner = Some(outcome.current_winner);
                    row.trick_winner = outcome.trick_winner;
                    event!(
                        target: "tractor_replay::play",
                        Level::INFO,
                        run_id = %self.config.run_id,
                        index = index as u32,
                        trick = trick as u32,
                        seat = %seat,
                        cards = %row.cards.join(","),
                        winner = %outcome.current_winner,
                        winner_changed = outcome.winner_changed
                    );
                    if let Some(winner) = outcome.trick_winner {
                        event!(
                            target: "tractor_replay::trick",
                            Level::INFO,
                            run_id = %self.config.run_id,
                            trick = trick as u32,
                            winner = %winner
                        );
                    }
                    write_row(&mut writer, &row)?;
                }
                Err(RoundError::Play(PlayError::Invalid(reason))) => {
                    rejected += 1;
                    event!(
                        target: "tractor_replay::play",
                        Level::WARN,
                        run_id = %self.config.run_id,
                        index = index as u32,
                        seat = %seat,
                        cards = %row.cards.join(","),
                        reason = %reason
                    );
                    row.rejection = Some(&reason);
                    write_row(&mut writer, &row)?;
                    if self.config.stop_on_invalid {
                        stopped_at = Some(index);
                        break;
                    }
                }
                Err(source) => {
                    writer.flush()?;
                    event!(
                        target: "tractor_replay::play",
                        Level::ERROR,
                        run_id = %self.config.run_id,
                        index = index as u32,
                        seat = %seat,
                        error = %source
                    );
                    return Err(ReplayError::Desync {
                        index,
                        seat,
                        source,
                    });
                }
            }
        }

        writer.flush()?;

        let trick_winners: Vec<PlayerPosition> = self
            .round
            .completed_tricks()
            .iter()
            .map(|trick| trick.winner)
            .collect();

        Ok(ReplaySummary {
            plays_applied: applied,
            plays_rejected: rejected,
            tricks_completed: trick_winners.len(),
            trick_winners,
            stopped_at,
            round_finished: self.round.is_finished(),
            jsonl_path: self.outputs.jsonl.clone(),
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), ReplayError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_row(writer: &mut BufWriter<File>, row: &PlayLogRow<'_>) -> Result<(), ReplayError> {
    serde_json::to_writer(&mut *writer, row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("{0}")]
    Config(#[from] ValidationError),
    #[error("deal rejected: {0}")]
    Deal(#[source] RoundError),
    #[error("play {index} by {seat} does not match the table: {source}")]
    Desync {
        index: usize,
        seat: PlayerPosition,
        #[source]
        source: RoundError,
    },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR_LEAD_YAML: &str = r#"
run_id: "pair_lead"
trump: { suit: "hearts", rank: "2" }
leader: north
hands:
  north: ["7C", "7C", "AS"]
  east: ["9D", "KD", "3S"]
  south: ["8C", "9C", "QS"]
  west: ["3H", "3H", "4S"]
plays:
  - { seat: north, cards: ["7C", "7C"] }
  - { seat: east, cards: ["9D"] }
  - { seat: east, cards: ["9D", "KD"] }
  - { seat: south, cards: ["8C", "9C"] }
  - { seat: west, cards: ["3H", "3H"] }
  - { seat: west, cards: ["4S"] }
  - { seat: north, cards: ["AS"] }
  - { seat: east, cards: ["3S"] }
  - { seat: south, cards: ["QS"] }
outputs:
  jsonl: "plays.jsonl"
"#;

    fn runner(yaml: &str, dir: &Path) -> ReplayRunner {
        let mut config: ReplayConfig = serde_yaml::from_str(yaml).expect("parse yaml");
        config.outputs.jsonl = dir.join("plays.jsonl").display().to_string();
        config.validate().expect("validate");
        let outputs = config.resolved_outputs();
        ReplayRunner::new(config, outputs).expect("runner")
    }

    #[test]
    fn illegal_plays_are_recorded_and_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let summary = runner(PAIR_LEAD_YAML, dir.path()).run().expect("replay");

        assert_eq!(summary.plays_applied, 8);
        assert_eq!(summary.plays_rejected, 1);
        assert_eq!(summary.stopped_at, None);
        assert_eq!(
            summary.trick_winners,
            vec![PlayerPosition::West, PlayerPosition::North]
        );
        assert!(summary.round_finished);

        let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl");
        let rows: Vec<serde_json::Value> = jsonl
            .lines()
            .map(|line| serde_json::from_str(line).expect("row"))
            .collect();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[1]["accepted"], false);
        assert_eq!(rows[1]["rejection"]["reason"], "length_mismatch");
        assert_eq!(rows[4]["trick_winner"], "west");
    }

    #[test]
    fn stop_on_invalid_ends_the_run() {
        let dir = tempfile::tempdir().expect("temp dir");
        let yaml = format!("{PAIR_LEAD_YAML}stop_on_invalid: true\n");
        let summary = runner(&yaml, dir.path()).run().expect("replay");
        assert_eq!(summary.stopped_at, Some(1));
        assert_eq!(summary.plays_applied, 1);
        assert_eq!(summary.tricks_completed, 0);
        assert!(!summary.round_finished);
    }

    #[test]
    fn out_of_turn_aborts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let yaml = PAIR_LEAD_YAML.replace(
            "- { seat: east, cards: [\"9D\"] }",
            "- { seat: south, cards: [\"QS\"] }"
        );
        let err = runner(&yaml, dir.path()).run().unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Desync {
                index: 1,
                seat: PlayerPosition::South,
                source: RoundError::OutOfTurn { .. }
            }
        ));
    }

    #[test]
    fn overfull_deal_is_refused() {
        let mut config: ReplayConfig =
            serde_yaml::from_str(&PAIR_LEAD_YAML.replace("\"AS\"]", "\"7C\"]"))
                .expect("parse yaml");
        config.validate().expect("validate");
        let outputs = config.resolved_outputs();
        assert!(matches!(
            ReplayRunner::new(config, outputs),
            Err(ReplayError::Deal(_))
        ));
    }

    #[test]
    fn building_a_runner_touches_no_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("out");
        let mut config: ReplayConfig = serde_yaml::from_str(PAIR_LEAD_YAML).expect("parse yaml");
        config.outputs.jsonl = out.join("plays.jsonl").display().to_string();
        config.logging.enable_structured = true;
        config.validate().expect("validate");
        let outputs = config.resolved_outputs();

        let runner = ReplayRunner::new(config, outputs).expect("runner");
        assert_eq!(runner.round().expected_seat(), PlayerPosition::North);
        assert!(!out.exists());
    }
}
