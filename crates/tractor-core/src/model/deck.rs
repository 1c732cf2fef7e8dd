use crate::model::card::{Card, DOMAIN_SIZE};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Number of full packs shuffled together for a four-seat game.
pub const PACKS: usize = 2;

/// The physical card set for one session: two complete packs including jokers.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DOMAIN_SIZE * PACKS);
        for _ in 0..PACKS {
            cards.extend(Card::domain());
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// How many copies of `card` the pack holds; zero for malformed cards.
    pub fn copies_of(card: Card) -> usize {
        if card.is_well_formed() { PACKS } else { 0 }
    }

    /// Returns the first card that appears more often than the pack allows.
    pub fn check_card_counts<'a, I>(cards: I) -> Option<Card>
    where
        I: IntoIterator<Item = &'a Card>,
    {
        let mut seen = [0usize; DOMAIN_SIZE];
        cards.into_iter().copied().find(|&card| {
            let slot = &mut seen[card.index()];
            *slot += 1;
            *slot > Self::copies_of(card)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Deck, PACKS};
    use crate::model::card::{Card, DOMAIN_SIZE};
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    #[test]
    fn standard_deck_has_two_packs() {
        let deck = Deck::standard();
        assert_eq!(deck.cards().len(), DOMAIN_SIZE * PACKS);
        assert_eq!(Deck::check_card_counts(deck.cards()), None);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn third_copy_is_reported() {
        let card = Card::new(Rank::Seven, Suit::Clubs);
        assert_eq!(Deck::check_card_counts(&[card, card]), None);
        assert_eq!(Deck::check_card_counts(&[card, card, card]), Some(card));
    }

    #[test]
    fn malformed_joker_has_no_copies() {
        let odd = Card::new(Rank::Ace, Suit::BigJoker);
        assert_eq!(Deck::copies_of(odd), 0);
        assert_eq!(Deck::check_card_counts(&[odd]), Some(odd));
    }
}
