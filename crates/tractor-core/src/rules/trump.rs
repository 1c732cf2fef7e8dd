use crate::model::card::{Card, DOMAIN_SIZE};
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// The declared trump suit, or the explicit state where none has been declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrumpSuit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
    NoTrump,
}

impl TrumpSuit {
    pub const fn as_suit(self) -> Option<Suit> {
        match self {
            TrumpSuit::Spades => Some(Suit::Spades),
            TrumpSuit::Hearts => Some(Suit::Hearts),
            TrumpSuit::Clubs => Some(Suit::Clubs),
            TrumpSuit::Diamonds => Some(Suit::Diamonds),
            TrumpSuit::NoTrump => None,
        }
    }
}

impl FromStr for TrumpSuit {
    type Err = ParseTrumpSuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "spades" => Ok(TrumpSuit::Spades),
            "h" | "hearts" => Ok(TrumpSuit::Hearts),
            "c" | "clubs" => Ok(TrumpSuit::Clubs),
            "d" | "diamonds" => Ok(TrumpSuit::Diamonds),
            "nt" | "none" | "no_trump" | "notrump" => Ok(TrumpSuit::NoTrump),
            _ => Err(ParseTrumpSuitError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised trump suit '{0}'")]
pub struct ParseTrumpSuitError(pub String);

/// Trump suit and trump rank for one round. Fixed once declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrumpDesignation {
    pub suit: TrumpSuit,
    pub rank: Rank,
}

impl TrumpDesignation {
    pub const fn new(suit: TrumpSuit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    /// Only the rank is known; no suit has been declared yet.
    pub const fn rank_only(rank: Rank) -> Self {
        Self::new(TrumpSuit::NoTrump, rank)
    }
}

impl fmt::Display for TrumpDesignation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suit.as_suit() {
            Some(suit) => write!(f, "{}{}", self.rank, suit),
            None => write!(f, "{}NT", self.rank),
        }
    }
}

/// The suit a card counts as for following, after trump cards are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalSuit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
    Trump,
}

impl FunctionalSuit {
    pub const fn from_natural(suit: Suit) -> Self {
        match suit {
            Suit::Spades => FunctionalSuit::Spades,
            Suit::Hearts => FunctionalSuit::Hearts,
            Suit::Clubs => FunctionalSuit::Clubs,
            Suit::Diamonds => FunctionalSuit::Diamonds,
            Suit::SmallJoker | Suit::BigJoker => FunctionalSuit::Trump,
        }
    }
}

impl fmt::Display for FunctionalSuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FunctionalSuit::Spades => "Spades",
            FunctionalSuit::Hearts => "Hearts",
            FunctionalSuit::Clubs => "Clubs",
            FunctionalSuit::Diamonds => "Diamonds",
            FunctionalSuit::Trump => "Trump",
        };
        f.write_str(label)
    }
}

/// Precomputed card orderings for one trump designation.
///
/// Both orders are laid out strongest first, so a lower rank value means a
/// stronger card: the big joker is always 0. Display ranks are unique per
/// card; functional ranks tie the off-suit trump-rank cards together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrumpOrdering {
    designation: TrumpDesignation,
    display: [u8; DOMAIN_SIZE],
    functional: [u8; DOMAIN_SIZE],
}

impl TrumpOrdering {
    pub fn build(designation: TrumpDesignation) -> Self {
        let mut ordering = Self {
            designation,
            display: [0; DOMAIN_SIZE],
            functional: [0; DOMAIN_SIZE],
        };
        ordering.fill_tables();
        ordering
    }

    /// Recomputes the tables when `designation` differs from the current one.
    /// Returns whether anything changed.
    pub fn rebuild(&mut self, designation: TrumpDesignation) -> bool {
        if self.designation == designation {
            return false;
        }
        self.designation = designation;
        self.fill_tables();
        true
    }

    pub fn designation(&self) -> TrumpDesignation {
        self.designation
    }

    pub fn display_rank(&self, card: Card) -> u8 {
        self.display[card.index()]
    }

    pub fn functional_rank(&self, card: Card) -> u8 {
        self.functional[card.index()]
    }

    /// Functional rank with display rank as tie-break; a strict total order.
    pub fn sort_key(&self, card: Card) -> (u8, u8) {
        (self.functional_rank(card), self.display_rank(card))
    }

    /// Whether `a` is strictly stronger than `b`. Only meaningful when both
    /// share a functional suit or `a` is trump.
    pub fn outranks(&self, a: Card, b: Card) -> bool {
        self.functional_rank(a) < self.functional_rank(b)
    }

    pub fn functional_suit(&self, card: Card) -> FunctionalSuit {
        if self.is_trump(card) {
            FunctionalSuit::Trump
        } else {
            FunctionalSuit::from_natural(card.suit)
        }
    }

    pub fn is_trump(&self, card: Card) -> bool {
        card.is_joker()
            || card.rank == self.designation.rank
            || self.designation.suit.as_suit() == Some(card.suit)
    }

    fn fill_tables(&mut self) {
        let TrumpDesignation { suit, rank } = self.designation;
        let trump_suit = suit.as_suit();
        let off_suits: Vec<Suit> = Suit::NATURAL
            .iter()
            .copied()
            .filter(|s| Some(*s) != trump_suit)
            .collect();

        // (card, shares its functional rank with the previous entry)
        let mut layout: Vec<(Card, bool)> = Vec::with_capacity(DOMAIN_SIZE);
        layout.push((Card::big_joker(), false));
        layout.push((Card::small_joker(), false));
        if let Some(ts) = trump_suit {
            layout.push((Card::new(rank, ts), false));
        }
        for (i, s) in off_suits.iter().enumerate() {
            layout.push((Card::new(rank, *s), i > 0));
        }
        let suit_runs = trump_suit.into_iter().chain(off_suits.iter().copied());
        for s in suit_runs {
            for r in Rank::DESCENDING.iter().copied().filter(|r| *r != rank) {
                layout.push((Card::new(r, s), false));
            }
        }

        let mut functional = 0u8;
        for (position, (card, tied)) in layout.iter().enumerate() {
            if position > 0 && !tied {
                functional += 1;
            }
            self.display[card.index()] = position as u8;
            self.functional[card.index()] = functional;
        }
        trace!(designation = %self.designation, "rebuilt trump ordering");
    }
}
