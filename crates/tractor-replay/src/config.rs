use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;
use tractor_core::model::card::{Card, parse_cards};
use tractor_core::model::player::{PlayerPosition, SEAT_COUNT};
use tractor_core::model::rank::Rank;
use tractor_core::rules::{TrumpDesignation, TrumpSuit};

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// A scripted round loaded from YAML: the deal, the trump and every play in
/// seating order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReplayConfig {
    pub run_id: String,
    pub trump: TrumpConfig,
    pub leader: PlayerPosition,
    pub hands: HandsConfig,
    #[serde(default)]
    pub plays: Vec<PlayConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub stop_on_invalid: bool,
}

impl ReplayConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ReplayConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.trump.designation()?;
        self.hands.deal()?;
        for (index, play) in self.plays.iter().enumerate() {
            play.cards(index)?;
        }
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrumpConfig {
    /// `spades`, `hearts`, `clubs`, `diamonds` or `nt`.
    pub suit: String,
    pub rank: String,
}

impl TrumpConfig {
    pub fn designation(&self) -> Result<TrumpDesignation, ValidationError> {
        let suit: TrumpSuit = self
            .suit
            .parse()
            .map_err(|err| invalid("trump.suit", format!("{err}")))?;
        let rank: Rank = self
            .rank
            .parse()
            .map_err(|err| invalid("trump.rank", format!("{err}")))?;
        Ok(TrumpDesignation::new(suit, rank))
    }
}

/// Dealt cards per seat, as card tokens such as `10H` or `BJ`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HandsConfig {
    #[serde(default)]
    pub north: Vec<String>,
    #[serde(default)]
    pub east: Vec<String>,
    #[serde(default)]
    pub south: Vec<String>,
    #[serde(default)]
    pub west: Vec<String>,
}

impl HandsConfig {
    pub fn tokens(&self, seat: PlayerPosition) -> &[String] {
        match seat {
            PlayerPosition::North => &self.north,
            PlayerPosition::East => &self.east,
            PlayerPosition::South => &self.south,
            PlayerPosition::West => &self.west,
        }
    }

    pub fn deal(&self) -> Result<[Vec<Card>; SEAT_COUNT], ValidationError> {
        let mut dealt: [Vec<Card>; SEAT_COUNT] = Default::default();
        for seat in PlayerPosition::LOOP {
            dealt[seat.index()] = parse_cards(self.tokens(seat)).map_err(|err| {
                invalid(
                    &format!("hands.{}", seat.to_string().to_ascii_lowercase()),
                    format!("{err}"),
                )
            })?;
        }
        Ok(dealt)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayConfig {
    pub seat: PlayerPosition,
    pub cards: Vec<String>,
}

impl PlayConfig {
    /// Parsed cards; `index` only labels the error.
    pub fn cards(&self, index: usize) -> Result<Vec<Card>, ValidationError> {
        parse_cards(&self.cards)
            .map_err(|err| invalid(&format!("plays[{index}].cards"), format!("{err}")))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        if self.jsonl.trim().is_empty() {
            return Err(invalid("outputs.jsonl", "path must not be empty"));
        }
        if resolve_template(run_id, &self.jsonl).components().count() == 0 {
            return Err(invalid("outputs.jsonl", "resolved path is invalid"));
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(invalid("run_id", "run_id must not be empty"));
    }
    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(invalid(
            "run_id",
            "run_id may only contain alphanumeric characters, '.', '_' or '-'",
        ));
    }
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASIC_YAML: &str = r#"
run_id: "pair_lead"
trump:
  suit: "hearts"
  rank: "2"
leader: north
hands:
  north: ["7C", "7C"]
  east: ["BJ", "AS"]
  south: ["8C", "8C"]
  west: ["3C", "JC"]
plays:
  - seat: north
    cards: ["7C", "7C"]
  - seat: east
    cards: ["BJ", "AS"]
outputs:
  jsonl: "replay/out/{run_id}/plays.jsonl"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: ReplayConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.leader, PlayerPosition::North);
        assert!(!cfg.stop_on_invalid);
        assert_eq!(cfg.plays.len(), 2);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));
        assert_eq!(
            cfg.trump.designation().unwrap(),
            TrumpDesignation::new(TrumpSuit::Hearts, Rank::Two)
        );
        assert_eq!(
            cfg.resolved_outputs().jsonl,
            PathBuf::from("replay/out/pair_lead/plays.jsonl")
        );
    }

    #[test]
    fn no_trump_and_ten_tokens_parse() {
        let trump = TrumpConfig {
            suit: "nt".to_string(),
            rank: "10".to_string(),
        };
        assert_eq!(
            trump.designation().unwrap(),
            TrumpDesignation::rank_only(Rank::Ten)
        );
    }

    #[test]
    fn rejects_bad_card_token() {
        let yaml = BASIC_YAML.replace("[\"3C\", \"JC\"]", "[\"3C\", \"1X\"]");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidField { ref field, .. } if field == "hands.west"
        ));
    }

    #[test]
    fn rejects_bad_run_id() {
        let yaml = BASIC_YAML.replace("\"pair_lead\"", "\"pair lead\"");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn blank_tracing_level_falls_back_to_info() {
        let yaml = BASIC_YAML.replace("\"debug\"", "\"  \"");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
        cfg.validate().expect("validate");
        assert_eq!(cfg.logging.tracing_level, "info");
    }

    #[test]
    fn from_path_reports_the_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"run_id: [unterminated").expect("write");
        let err = ReplayConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), file.path());
    }
}
