use crate::game::trick::{TrickError, TrickPlay, TrickState};
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::{PlayerPosition, SEAT_COUNT};
use crate::rules::error::{InconsistentState, PlayError};
use crate::rules::format::TrickFormat;
use crate::rules::legality::LegalityResolver;
use crate::rules::trump::{TrumpDesignation, TrumpOrdering};
use serde::{Deserialize, Serialize};
use std::{array, mem};
use thiserror::Error;
use tracing::{debug, info};

/// A finished trick kept for the round's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTrick {
    pub leader: PlayerPosition,
    pub plays: Vec<TrickPlay>,
    pub winner: PlayerPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    pub format: TrickFormat,
    pub current_winner: PlayerPosition,
    pub winner_changed: bool,
    /// Set when this play completed the trick.
    pub trick_winner: Option<PlayerPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("trump cannot change once cards have been played")]
    TrumpLocked,
    #[error(transparent)]
    Play(#[from] PlayError),
    #[error(transparent)]
    Trick(#[from] TrickError),
}

impl RoundError {
    /// Errors that mean the client is out of sync with the table.
    pub fn is_fatal(&self) -> bool {
        match self {
            RoundError::Play(err) => err.is_fatal(),
            RoundError::Trick(_) => true,
            RoundError::OutOfTurn { .. } | RoundError::TrumpLocked => false,
        }
    }
}

impl From<InconsistentState> for RoundError {
    fn from(state: InconsistentState) -> Self {
        RoundError::Play(PlayError::Inconsistent(state))
    }
}

/// The session side of play: owns the hands, the trump ordering and the trick
/// in progress, and hands the lead to each trick's winner.
#[derive(Debug, Clone)]
pub struct Round {
    hands: [Hand; SEAT_COUNT],
    ordering: TrumpOrdering,
    current_trick: TrickState,
    trick_history: Vec<CompletedTrick>,
    starting_player: PlayerPosition,
}

impl Round {
    pub fn new(
        hands: [Vec<Card>; SEAT_COUNT],
        designation: TrumpDesignation,
        starting_player: PlayerPosition,
    ) -> Result<Self, RoundError> {
        Self::from_parts(
            hands,
            designation,
            starting_player,
            Vec::new(),
            starting_player,
            Vec::new(),
        )
    }

    /// Rebuilds a round part way through. The plays of the current trick are
    /// accepted again in seating order so the winning play is re-derived.
    pub(crate) fn from_parts(
        hands: [Vec<Card>; SEAT_COUNT],
        designation: TrumpDesignation,
        starting_player: PlayerPosition,
        trick_history: Vec<CompletedTrick>,
        current_leader: PlayerPosition,
        current_plays: Vec<TrickPlay>,
    ) -> Result<Self, RoundError> {
        if current_plays.len() >= SEAT_COUNT {
            return Err(InconsistentState::TrickOverfull.into());
        }
        if current_plays.first().is_some_and(|play| play.format.is_mixed()) {
            return Err(InconsistentState::MixedLeadFormat.into());
        }
        let played = trick_history
            .iter()
            .flat_map(|trick| trick.plays.iter())
            .chain(current_plays.iter())
            .flat_map(|play| play.format.cards.iter());
        if let Some(card) = Deck::check_card_counts(hands.iter().flatten().chain(played)) {
            return Err(InconsistentState::over_count(card).into());
        }

        let mut dealt = hands.into_iter();
        let hands = array::from_fn(|_| Hand::with_cards(dealt.next().unwrap_or_default()));
        let ordering = TrumpOrdering::build(designation);
        let mut current_trick = TrickState::new(current_leader);
        for play in current_plays {
            current_trick.accept(&ordering, play.position, play.format)?;
        }

        Ok(Self {
            hands,
            ordering,
            current_trick,
            trick_history,
            starting_player,
        })
    }

    pub fn ordering(&self) -> &TrumpOrdering {
        &self.ordering
    }

    pub fn designation(&self) -> TrumpDesignation {
        self.ordering.designation()
    }

    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn current_trick(&self) -> &TrickState {
        &self.current_trick
    }

    pub fn completed_tricks(&self) -> &[CompletedTrick] {
        &self.trick_history
    }

    pub fn starting_player(&self) -> PlayerPosition {
        self.starting_player
    }

    pub fn expected_seat(&self) -> PlayerPosition {
        self.current_trick.expected_position()
    }

    pub fn tricks_won(&self, seat: PlayerPosition) -> usize {
        self.trick_history
            .iter()
            .filter(|trick| trick.winner == seat)
            .count()
    }

    pub fn is_finished(&self) -> bool {
        self.hands.iter().all(Hand::is_empty) && self.current_trick.plays().is_empty()
    }

    /// Replaces the trump designation. Only allowed before the first card.
    pub fn declare_trump(&mut self, designation: TrumpDesignation) -> Result<bool, RoundError> {
        if !self.trick_history.is_empty() || !self.current_trick.plays().is_empty() {
            return Err(RoundError::TrumpLocked);
        }
        let changed = self.ordering.rebuild(designation);
        if changed {
            info!(%designation, "trump declared");
        }
        Ok(changed)
    }

    /// Resolves `cards` for `seat` without changing anything.
    pub fn check(&self, seat: PlayerPosition, cards: &[Card]) -> Result<TrickFormat, RoundError> {
        let expected = self.expected_seat();
        if expected != seat {
            return Err(RoundError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        let format = LegalityResolver::new(&self.ordering).resolve(
            self.current_trick.lead(),
            self.hands[seat.index()].cards(),
            cards,
        )?;
        Ok(format)
    }

    pub fn play(&mut self, seat: PlayerPosition, cards: &[Card]) -> Result<PlayOutcome, RoundError> {
        let format = self.check(seat, cards)?;
        if !self.hands[seat.index()].remove_all(cards) {
            return Err(InconsistentState::CardNotHeld(cards[0]).into());
        }
        let progress = match self.current_trick.accept(&self.ordering, seat, format.clone()) {
            Ok(progress) => progress,
            Err(err) => {
                for &card in cards {
                    self.hands[seat.index()].add(card);
                }
                return Err(err.into());
            }
        };

        let trick_winner = if progress.complete {
            let winner = progress.current_winner;
            self.complete_trick(winner);
            Some(winner)
        } else {
            None
        };

        Ok(PlayOutcome {
            format,
            current_winner: progress.current_winner,
            winner_changed: progress.winner_changed,
            trick_winner,
        })
    }

    fn complete_trick(&mut self, winner: PlayerPosition) {
        let finished = mem::replace(&mut self.current_trick, TrickState::new(winner));
        debug!(
            leader = %finished.leader(),
            %winner,
            trick = self.trick_history.len() + 1,
            "trick complete"
        );
        self.trick_history.push(CompletedTrick {
            leader: finished.leader(),
            plays: finished.plays().to_vec(),
            winner,
        });
    }
}
