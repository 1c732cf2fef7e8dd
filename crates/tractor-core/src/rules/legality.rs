//! Follow-suit legality for a proposed play.
//!
//! The resolver is a pure decision: it needs the player's hand as it stood
//! before the proposed cards leave it, and returns either the resolved
//! [`TrickFormat`] or the reason the play is refused. Turn order is not
//! checked here.

use crate::model::card::Card;
use crate::rules::error::{InconsistentState, InvalidPlay, PlayError};
use crate::rules::format::{FormatResolver, TrickFormat};
use crate::rules::trump::{FunctionalSuit, TrumpOrdering};
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
pub struct LegalityResolver<'a> {
    ordering: &'a TrumpOrdering,
}

impl<'a> LegalityResolver<'a> {
    pub fn new(ordering: &'a TrumpOrdering) -> Self {
        Self { ordering }
    }

    /// Decides whether `proposed` may be played from `hand` against `lead`.
    ///
    /// With no lead the play opens the trick and must be a single functional
    /// suit. Otherwise the follower must match the lead's card count, spend
    /// lead-suit cards before anything else, and reproduce held tractors and
    /// pairs. Legal plays that do not reproduce the lead's shape come back
    /// tagged `Mixed`.
    pub fn resolve(
        &self,
        lead: Option<&TrickFormat>,
        hand: &[Card],
        proposed: &[Card],
    ) -> Result<TrickFormat, PlayError> {
        let outcome = self
            .check_inputs(hand, proposed)
            .map_err(PlayError::from)
            .and_then(|()| match lead {
                None => self.resolve_lead(proposed),
                Some(lead) => self.resolve_follow(lead, hand, proposed),
            });

        match &outcome {
            Ok(format) => trace!(suit = %format.suit, cards = format.card_count, "play accepted"),
            Err(err) => debug!(
                error = %err,
                leading = lead.is_none(),
                cards = proposed.len(),
                "play rejected"
            ),
        }
        outcome
    }

    fn formats(&self) -> FormatResolver<'a> {
        FormatResolver::new(self.ordering)
    }

    fn check_inputs(&self, hand: &[Card], proposed: &[Card]) -> Result<(), InconsistentState> {
        if proposed.is_empty() {
            return Err(InconsistentState::EmptyPlay);
        }
        if let Some(card) = proposed.iter().find(|card| !card.is_well_formed()) {
            return Err(InconsistentState::MalformedCard(*card));
        }
        let mut remaining = hand.to_vec();
        for card in proposed {
            match remaining.iter().position(|held| held == card) {
                Some(index) => {
                    remaining.swap_remove(index);
                }
                None => return Err(InconsistentState::CardNotHeld(*card)),
            }
        }
        Ok(())
    }

    fn resolve_lead(&self, proposed: &[Card]) -> Result<TrickFormat, PlayError> {
        let suit = self.ordering.functional_suit(proposed[0]);
        if proposed
            .iter()
            .any(|&card| self.ordering.functional_suit(card) != suit)
        {
            return Err(InvalidPlay::MixedLead.into());
        }
        // TODO: multi-component leads are accepted without checking that each
        // component is the highest of its kind still out.
        Ok(self.formats().decompose(suit, proposed))
    }

    fn resolve_follow(
        &self,
        lead: &TrickFormat,
        hand: &[Card],
        proposed: &[Card],
    ) -> Result<TrickFormat, PlayError> {
        let suit = lead
            .functional_suit()
            .ok_or(InconsistentState::MixedLeadFormat)?;

        if proposed.len() != lead.card_count {
            return Err(InvalidPlay::LengthMismatch {
                expected: lead.card_count,
                actual: proposed.len(),
            }
            .into());
        }

        let holdings: Vec<Card> = hand
            .iter()
            .copied()
            .filter(|&card| self.ordering.functional_suit(card) == suit)
            .collect();
        let suit_in_play = proposed
            .iter()
            .filter(|&&card| self.ordering.functional_suit(card) == suit)
            .count();

        let required = holdings.len().min(lead.card_count);
        if suit_in_play < required {
            return Err(InvalidPlay::SuitNotExhausted {
                suit,
                required,
                played: suit_in_play,
            }
            .into());
        }

        if holdings.len() >= lead.card_count {
            return self.resolve_full_follow(lead, suit, &holdings, proposed);
        }

        if !holdings.is_empty() {
            return Ok(TrickFormat::mixed(proposed, self.ordering));
        }

        // Void in the lead suit: an all-trump play may still match the lead.
        if proposed
            .iter()
            .any(|&card| self.ordering.functional_suit(card) != FunctionalSuit::Trump)
        {
            return Ok(TrickFormat::mixed(proposed, self.ordering));
        }
        let ruff = self.formats().decompose(FunctionalSuit::Trump, proposed);
        Ok(self.classify(lead, ruff, proposed))
    }

    fn resolve_full_follow(
        &self,
        lead: &TrickFormat,
        suit: FunctionalSuit,
        holdings: &[Card],
        proposed: &[Card],
    ) -> Result<TrickFormat, PlayError> {
        let formats = self.formats();
        let played = formats.decompose(suit, proposed);
        let held = formats.decompose(suit, holdings);

        let mut played_left = tractor_counts(&played);
        let mut held_left = tractor_counts(&held);
        let mut unsatisfied_pairs = 0;

        // Only a held tractor of exactly the lead's length obliges the player.
        for tractor in lead.tractor_iter() {
            let length = tractor.length;
            let held_slot = held_left.entry(length).or_default();
            if *held_slot == 0 {
                unsatisfied_pairs += length;
                continue;
            }
            *held_slot -= 1;

            let played_slot = played_left.entry(length).or_default();
            if *played_slot == 0 {
                return Err(InvalidPlay::TractorNotSatisfied { length }.into());
            }
            *played_slot -= 1;
        }

        let played_pairs = played.pairs.len() + pair_total(&played_left);
        let demand = lead.pairs.len() + unsatisfied_pairs;
        let available = held.pairs.len() + pair_total(&held_left);
        let required = demand.min(available);
        if played_pairs < required {
            return Err(InvalidPlay::PairsNotSatisfied {
                required,
                played: played_pairs,
            }
            .into());
        }

        Ok(self.classify(lead, played, proposed))
    }

    fn classify(&self, lead: &TrickFormat, format: TrickFormat, proposed: &[Card]) -> TrickFormat {
        if format.matches_shape(lead) {
            format
        } else {
            TrickFormat::mixed(proposed, self.ordering)
        }
    }
}

fn tractor_counts(format: &TrickFormat) -> BTreeMap<usize, usize> {
    format
        .tractors
        .iter()
        .map(|(&length, tractors)| (length, tractors.len()))
        .collect()
}

fn pair_total(counts: &BTreeMap<usize, usize>) -> usize {
    counts.iter().map(|(length, count)| length * count).sum()
}
