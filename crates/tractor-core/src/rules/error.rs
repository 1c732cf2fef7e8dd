use crate::model::card::Card;
use crate::rules::trump::FunctionalSuit;
use serde::Serialize;
use thiserror::Error;

/// Rule violations a player can be asked to correct.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidPlay {
    #[error("mixed lead: every card of a lead must share one suit")]
    MixedLead,
    #[error("length mismatch: lead has {expected} cards but {actual} were played")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("did not exhaust lead suit: {required} {suit} cards required but {played} played")]
    SuitNotExhausted {
        suit: FunctionalSuit,
        required: usize,
        played: usize,
    },
    #[error("tractor not satisfied: a tractor of length {length} is held but was not played")]
    TractorNotSatisfied { length: usize },
    #[error("did not play available pairs: {required} pairs required but {played} played")]
    PairsNotSatisfied { required: usize, played: usize },
}

/// Inputs that cannot come from a client in sync with the table. These end
/// the offending session rather than prompting again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InconsistentState {
    #[error("play contains no cards")]
    EmptyPlay,
    #[error("{0:?} is not a card of the pack")]
    MalformedCard(Card),
    #[error("{0} is not held by the player")]
    CardNotHeld(Card),
    #[error("{0} appears more often than the pack holds")]
    TooManyCopies(Card),
    #[error("lead format carries no functional suit")]
    MixedLeadFormat,
    #[error("current trick already holds a play from every seat")]
    TrickOverfull,
}

impl InconsistentState {
    /// Classifies a card reported by `Deck::check_card_counts`.
    pub fn over_count(card: Card) -> Self {
        if card.is_well_formed() {
            InconsistentState::TooManyCopies(card)
        } else {
            InconsistentState::MalformedCard(card)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error(transparent)]
    Invalid(#[from] InvalidPlay),
    #[error("inconsistent state: {0}")]
    Inconsistent(#[from] InconsistentState),
}

impl PlayError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlayError::Inconsistent(_))
    }

    pub fn invalid(&self) -> Option<&InvalidPlay> {
        match self {
            PlayError::Invalid(reason) => Some(reason),
            PlayError::Inconsistent(_) => None,
        }
    }
}
