use crate::model::rank::{ParseRankError, Rank};
use crate::model::suit::Suit;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Rank carried by both jokers. A joker holding any other rank is malformed.
pub const JOKER_RANK: Rank = Rank::Two;

/// Number of distinct cards in one pack: 52 natural cards plus two jokers.
pub const DOMAIN_SIZE: usize = 54;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn small_joker() -> Self {
        Self::new(JOKER_RANK, Suit::SmallJoker)
    }

    pub const fn big_joker() -> Self {
        Self::new(JOKER_RANK, Suit::BigJoker)
    }

    pub const fn is_joker(self) -> bool {
        self.suit.is_joker()
    }

    pub fn is_well_formed(self) -> bool {
        !self.is_joker() || self.rank == JOKER_RANK
    }

    /// Position of this card within the 54-card domain. Natural suits occupy
    /// `0..52` in canonical suit order, then the small and big jokers.
    pub const fn index(self) -> usize {
        match self.suit {
            Suit::SmallJoker => 52,
            Suit::BigJoker => 53,
            suit => suit.index() * 13 + (self.rank.value() as usize - 2),
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            52 => Some(Self::small_joker()),
            53 => Some(Self::big_joker()),
            i if i < 52 => {
                let suit = match Suit::from_index(i / 13) {
                    Some(suit) => suit,
                    None => return None,
                };
                match Rank::from_value((i % 13) as u8 + 2) {
                    Some(rank) => Some(Self::new(rank, suit)),
                    None => None,
                }
            }
            _ => None,
        }
    }

    /// Every distinct card of one pack, in index order.
    pub fn domain() -> impl Iterator<Item = Card> {
        (0..DOMAIN_SIZE).filter_map(Card::from_index)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_joker() {
            write!(f, "{}", self.suit)
        } else {
            write!(f, "{}{}", self.rank, self.suit)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCardError {
    #[error("card token '{0}' is too short")]
    TooShort(String),
    #[error("unrecognised suit in card token '{0}'")]
    Suit(String),
    #[error(transparent)]
    Rank(#[from] ParseRankError),
}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        match token.as_str() {
            "SJ" => return Ok(Card::small_joker()),
            "BJ" => return Ok(Card::big_joker()),
            _ => {}
        }
        if token.len() < 2 {
            return Err(ParseCardError::TooShort(s.to_string()));
        }
        let (rank_part, suit_part) = token.split_at(token.len() - 1);
        let suit = match suit_part {
            "S" => Suit::Spades,
            "H" => Suit::Hearts,
            "C" => Suit::Clubs,
            "D" => Suit::Diamonds,
            _ => return Err(ParseCardError::Suit(s.to_string())),
        };
        let rank = rank_part.parse::<Rank>()?;
        Ok(Card::new(rank, suit))
    }
}

/// Parses whitespace-free card tokens such as `"10H"` or `"BJ"`.
pub fn parse_cards<I, S>(tokens: I) -> Result<Vec<Card>, ParseCardError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| token.as_ref().parse::<Card>())
        .collect()
}
