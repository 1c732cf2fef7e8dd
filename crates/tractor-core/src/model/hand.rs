use crate::model::card::Card;
use crate::rules::trump::{FunctionalSuit, TrumpOrdering};

/// The cards one seat still holds. Duplicates are expected with two packs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        let mut hand = Self { cards };
        hand.sort();
        hand
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
        self.sort();
    }

    pub fn remove(&mut self, card: Card) -> bool {
        if let Some(index) = self.cards.iter().position(|&c| c == card) {
            self.cards.remove(index);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn count(&self, card: Card) -> usize {
        self.cards.iter().filter(|&&c| c == card).count()
    }

    /// Multiset containment: every card in `cards` is held at least as many
    /// times as it appears there.
    pub fn contains_all(&self, cards: &[Card]) -> bool {
        let mut remaining = self.cards.clone();
        cards.iter().all(|card| {
            match remaining.iter().position(|c| c == card) {
                Some(index) => {
                    remaining.swap_remove(index);
                    true
                }
                None => false,
            }
        })
    }

    /// Removes every card of `cards`, or nothing if any is missing.
    pub fn remove_all(&mut self, cards: &[Card]) -> bool {
        if !self.contains_all(cards) {
            return false;
        }
        for card in cards {
            self.remove(*card);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Cards counting as `suit` under `ordering`, strongest first.
    pub fn cards_in(&self, suit: FunctionalSuit, ordering: &TrumpOrdering) -> Vec<Card> {
        let mut held: Vec<Card> = self
            .cards
            .iter()
            .copied()
            .filter(|&card| ordering.functional_suit(card) == suit)
            .collect();
        held.sort_by_key(|&card| ordering.sort_key(card));
        held
    }

    /// The hand in on-screen order for the active trump designation.
    pub fn display_order(&self, ordering: &TrumpOrdering) -> Vec<Card> {
        let mut shown = self.cards.clone();
        shown.sort_by_key(|&card| ordering.display_rank(card));
        shown
    }

    fn sort(&mut self) {
        self.cards.sort_by_key(|card| card.index());
    }
}

#[cfg(test)]
mod tests {
    use super::Hand;
    use crate::model::card::Card;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::rules::trump::{FunctionalSuit, TrumpDesignation, TrumpOrdering, TrumpSuit};

    #[test]
    fn add_and_remove_cards() {
        let mut hand = Hand::new();
        let card = Card::new(Rank::Three, Suit::Clubs);
        hand.add(card);
        hand.add(card);
        assert_eq!(hand.count(card), 2);
        assert!(hand.remove(card));
        assert!(hand.contains(card));
        assert!(hand.remove(card));
        assert!(!hand.contains(card));
    }

    #[test]
    fn containment_respects_multiplicity() {
        let five = Card::new(Rank::Five, Suit::Spades);
        let hand = Hand::with_cards(vec![five, Card::new(Rank::Six, Suit::Spades)]);
        assert!(hand.contains_all(&[five]));
        assert!(!hand.contains_all(&[five, five]));
    }

    #[test]
    fn remove_all_is_all_or_nothing() {
        let five = Card::new(Rank::Five, Suit::Spades);
        let six = Card::new(Rank::Six, Suit::Spades);
        let mut hand = Hand::with_cards(vec![five, six]);
        assert!(!hand.remove_all(&[five, Card::big_joker()]));
        assert_eq!(hand.len(), 2);
        assert!(hand.remove_all(&[six, five]));
        assert!(hand.is_empty());
    }

    #[test]
    fn trump_cards_are_collected_strongest_first() {
        let ordering = TrumpOrdering::build(TrumpDesignation::new(TrumpSuit::Hearts, Rank::Two));
        let hand = Hand::with_cards(vec![
            Card::new(Rank::King, Suit::Hearts),
            Card::new(Rank::Two, Suit::Clubs),
            Card::small_joker(),
            Card::new(Rank::Nine, Suit::Spades),
        ]);
        assert_eq!(
            hand.cards_in(FunctionalSuit::Trump, &ordering),
            vec![
                Card::small_joker(),
                Card::new(Rank::Two, Suit::Clubs),
                Card::new(Rank::King, Suit::Hearts),
            ]
        );
        assert_eq!(
            hand.display_order(&ordering).last(),
            Some(&Card::new(Rank::Nine, Suit::Spades))
        );
    }
}
