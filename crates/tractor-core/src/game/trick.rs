use crate::model::card::Card;
use crate::model::player::{PlayerPosition, SEAT_COUNT};
use crate::rules::format::TrickFormat;
use crate::rules::trump::TrumpOrdering;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// One seat's resolved play within a trick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickPlay {
    pub position: PlayerPosition,
    pub format: TrickFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrickPhase {
    Empty,
    Leading,
    /// Number of followers that have played so far.
    Following(usize),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrickProgress {
    pub current_winner: PlayerPosition,
    pub winner_changed: bool,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrickError {
    #[error("trick already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("{0} has already played this trick")]
    AlreadyPlayed(PlayerPosition),
}

/// Accumulates one resolved play per seat and tracks who is winning.
///
/// Plays must already have passed the legality resolver; the trick only
/// checks seating order.
#[derive(Debug, Clone)]
pub struct TrickState {
    leader: PlayerPosition,
    plays: Vec<TrickPlay>,
    winning: Option<usize>,
}

impl TrickState {
    pub fn new(leader: PlayerPosition) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(SEAT_COUNT),
            winning: None,
        }
    }

    pub fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub fn plays(&self) -> &[TrickPlay] {
        &self.plays
    }

    pub fn lead(&self) -> Option<&TrickFormat> {
        self.plays.first().map(|play| &play.format)
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == SEAT_COUNT
    }

    pub fn phase(&self) -> TrickPhase {
        match self.plays.len() {
            0 => TrickPhase::Empty,
            1 => TrickPhase::Leading,
            n if n < SEAT_COUNT => TrickPhase::Following(n - 1),
            _ => TrickPhase::Complete,
        }
    }

    pub fn current_winner(&self) -> Option<PlayerPosition> {
        self.winning.map(|index| self.plays[index].position)
    }

    pub fn winning_format(&self) -> Option<&TrickFormat> {
        self.winning.map(|index| &self.plays[index].format)
    }

    /// The trick's winner, once every seat has played.
    pub fn winner(&self) -> Option<PlayerPosition> {
        if self.is_complete() {
            self.current_winner()
        } else {
            None
        }
    }

    pub fn expected_position(&self) -> PlayerPosition {
        self.leader.offset(self.plays.len())
    }

    pub fn accept(
        &mut self,
        ordering: &TrumpOrdering,
        position: PlayerPosition,
        format: TrickFormat,
    ) -> Result<TrickProgress, TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }
        if self.plays.iter().any(|play| play.position == position) {
            return Err(TrickError::AlreadyPlayed(position));
        }
        let expected = self.expected_position();
        if expected != position {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }

        let takes_lead = match self.winning_format() {
            None => true,
            Some(defender) => beats(ordering, &format, defender),
        };
        self.plays.push(TrickPlay { position, format });
        if takes_lead {
            self.winning = Some(self.plays.len() - 1);
            debug!(%position, "winning play replaced");
        }

        Ok(TrickProgress {
            current_winner: self.current_winner().unwrap_or(position),
            winner_changed: takes_lead,
            complete: self.is_complete(),
        })
    }
}

/// Whether `challenger` takes the trick from `defender`.
///
/// Mixed plays never win. Otherwise tractors (matched by length), loose pairs
/// and singles are compared position by position after sorting, and every
/// challenger card must strictly outrank its counterpart; one miss anywhere
/// forfeits the challenge.
pub fn beats(ordering: &TrumpOrdering, challenger: &TrickFormat, defender: &TrickFormat) -> bool {
    if challenger.is_mixed() {
        return false;
    }
    if challenger.tractors.len() != defender.tractors.len() {
        return false;
    }
    for (length, defending) in &defender.tractors {
        let challenging = challenger.tractors_of(*length);
        let ours: Vec<Card> = challenging.iter().map(|t| t.high_card).collect();
        let theirs: Vec<Card> = defending.iter().map(|t| t.high_card).collect();
        if !all_outrank(ordering, ours, theirs) {
            return false;
        }
    }
    all_outrank(ordering, challenger.pairs.clone(), defender.pairs.clone())
        && all_outrank(ordering, challenger.singles.clone(), defender.singles.clone())
}

fn all_outrank(ordering: &TrumpOrdering, mut ours: Vec<Card>, mut theirs: Vec<Card>) -> bool {
    if ours.len() != theirs.len() {
        return false;
    }
    ours.sort_by_key(|&card| ordering.sort_key(card));
    theirs.sort_by_key(|&card| ordering.sort_key(card));
    ours.iter()
        .zip(theirs.iter())
        .all(|(&a, &b)| ordering.outranks(a, b))
}
