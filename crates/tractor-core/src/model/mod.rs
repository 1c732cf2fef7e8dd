//! Plain card-table values: suits, ranks, cards, the pack, hands and seats.

pub mod card;
pub mod deck;
pub mod hand;
pub mod player;
pub mod rank;
pub mod suit;
