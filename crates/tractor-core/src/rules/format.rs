//! Structural decomposition of a play into tractors, pairs and singles.

use crate::model::card::Card;
use crate::rules::trump::{FunctionalSuit, TrumpOrdering};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// A run of `length` adjacent pairs, identified by its strongest pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tractor {
    pub high_card: Card,
    pub length: usize,
}

impl Tractor {
    pub const fn card_count(&self) -> usize {
        self.length * 2
    }
}

/// Suit tag of a resolved play. `Mixed` plays broke suit or shape and can
/// never take the trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatSuit {
    Functional(FunctionalSuit),
    Mixed,
}

impl FormatSuit {
    pub const fn functional(self) -> Option<FunctionalSuit> {
        match self {
            FormatSuit::Functional(suit) => Some(suit),
            FormatSuit::Mixed => None,
        }
    }

    pub const fn is_mixed(self) -> bool {
        matches!(self, FormatSuit::Mixed)
    }
}

impl From<FunctionalSuit> for FormatSuit {
    fn from(suit: FunctionalSuit) -> Self {
        FormatSuit::Functional(suit)
    }
}

impl fmt::Display for FormatSuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatSuit::Functional(suit) => write!(f, "{suit}"),
            FormatSuit::Mixed => f.write_str("Mixed"),
        }
    }
}

/// The comparable outline of a format: what a follower has to reproduce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatShape {
    pub tractor_lengths: Vec<usize>,
    pub pairs: usize,
    pub singles: usize,
}

/// A play broken down into components. Every list is strongest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickFormat {
    pub suit: FormatSuit,
    pub card_count: usize,
    /// Every card of the play.
    pub cards: Vec<Card>,
    pub tractors: BTreeMap<usize, Vec<Tractor>>,
    pub pairs: Vec<Card>,
    pub singles: Vec<Card>,
}

impl TrickFormat {
    pub fn empty(suit: FormatSuit) -> Self {
        Self {
            suit,
            card_count: 0,
            cards: Vec::new(),
            tractors: BTreeMap::new(),
            pairs: Vec::new(),
            singles: Vec::new(),
        }
    }

    /// A play that keeps no structure: every card is treated as a single.
    pub fn mixed(cards: &[Card], ordering: &TrumpOrdering) -> Self {
        let mut singles = cards.to_vec();
        singles.sort_by_key(|&card| ordering.sort_key(card));
        Self {
            suit: FormatSuit::Mixed,
            card_count: singles.len(),
            cards: singles.clone(),
            tractors: BTreeMap::new(),
            pairs: Vec::new(),
            singles,
        }
    }

    pub fn is_mixed(&self) -> bool {
        self.suit.is_mixed()
    }

    pub fn functional_suit(&self) -> Option<FunctionalSuit> {
        self.suit.functional()
    }

    pub fn tractors_of(&self, length: usize) -> &[Tractor] {
        self.tractors.get(&length).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tractor_iter(&self) -> impl Iterator<Item = &Tractor> {
        self.tractors.values().flatten()
    }

    /// Pairs held inside tractors.
    pub fn tractor_pairs(&self) -> usize {
        self.tractor_iter().map(|t| t.length).sum()
    }

    /// Loose pairs plus pairs inside tractors.
    pub fn total_pairs(&self) -> usize {
        self.pairs.len() + self.tractor_pairs()
    }

    pub fn shape(&self) -> FormatShape {
        let mut tractor_lengths: Vec<usize> = self.tractor_iter().map(|t| t.length).collect();
        tractor_lengths.sort_unstable();
        FormatShape {
            tractor_lengths,
            pairs: self.pairs.len(),
            singles: self.singles.len(),
        }
    }

    pub fn matches_shape(&self, other: &TrickFormat) -> bool {
        self.shape() == other.shape()
    }
}

/// Splits same-suit plays into singles, pairs and tractors.
#[derive(Debug, Clone, Copy)]
pub struct FormatResolver<'a> {
    ordering: &'a TrumpOrdering,
}

impl<'a> FormatResolver<'a> {
    pub fn new(ordering: &'a TrumpOrdering) -> Self {
        Self { ordering }
    }

    /// Decomposes `cards`, all of functional suit `suit`, in any order.
    ///
    /// Identical adjacent cards pair up greedily, so three of a kind yields
    /// one pair and one single. Pairs one functional step apart chain into
    /// tractors.
    pub fn decompose(&self, suit: FunctionalSuit, cards: &[Card]) -> TrickFormat {
        debug_assert!(
            cards
                .iter()
                .all(|&card| self.ordering.functional_suit(card) == suit)
        );
        let mut sorted = cards.to_vec();
        sorted.sort_by_key(|&card| self.ordering.sort_key(card));

        let mut format = TrickFormat::empty(FormatSuit::Functional(suit));
        format.card_count = sorted.len();
        format.cards = sorted.clone();

        let mut paired = Vec::new();
        let mut i = 0;
        while i < sorted.len() {
            if i + 1 < sorted.len() && sorted[i] == sorted[i + 1] {
                paired.push(sorted[i]);
                i += 2;
            } else {
                format.singles.push(sorted[i]);
                i += 1;
            }
        }

        let mut run_start = 0;
        for j in 1..=paired.len() {
            let continues = j < paired.len()
                && self.ordering.functional_rank(paired[j])
                    == self.ordering.functional_rank(paired[j - 1]) + 1;
            if continues {
                continue;
            }
            let length = j - run_start;
            if length >= 2 {
                format.tractors.entry(length).or_default().push(Tractor {
                    high_card: paired[run_start],
                    length,
                });
            } else {
                format.pairs.push(paired[run_start]);
            }
            run_start = j;
        }

        trace!(
            %suit,
            cards = format.card_count,
            tractors = format.tractor_iter().count(),
            pairs = format.pairs.len(),
            singles = format.singles.len(),
            "decomposed play"
        );
        format
    }
}
