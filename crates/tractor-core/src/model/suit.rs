use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Suit {
    Spades = 0,
    Hearts = 1,
    Clubs = 2,
    Diamonds = 3,
    SmallJoker = 4,
    BigJoker = 5,
}

impl Suit {
    /// The four natural suits in canonical order.
    pub const NATURAL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds];

    pub const ALL: [Suit; 6] = [
        Suit::Spades,
        Suit::Hearts,
        Suit::Clubs,
        Suit::Diamonds,
        Suit::SmallJoker,
        Suit::BigJoker,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Suit::Spades),
            1 => Some(Suit::Hearts),
            2 => Some(Suit::Clubs),
            3 => Some(Suit::Diamonds),
            4 => Some(Suit::SmallJoker),
            5 => Some(Suit::BigJoker),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_joker(self) -> bool {
        matches!(self, Suit::SmallJoker | Suit::BigJoker)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Suit::Spades => "S",
            Suit::Hearts => "H",
            Suit::Clubs => "C",
            Suit::Diamonds => "D",
            Suit::SmallJoker => "SJ",
            Suit::BigJoker => "BJ",
        };
        f.write_str(symbol)
    }
}
