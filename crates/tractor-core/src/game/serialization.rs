use super::round::{CompletedTrick, Round, RoundError};
use super::trick::TrickPlay;
use crate::model::card::Card;
use crate::model::player::{PlayerPosition, SEAT_COUNT};
use crate::rules::trump::TrumpDesignation;
use serde::{Deserialize, Serialize};
use std::array;

/// Public view of a round as exchanged with the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundSnapshot {
    pub trump: TrumpDesignation,
    pub starting_player: PlayerPosition,
    pub hands: [Vec<Card>; SEAT_COUNT],
    pub completed: Vec<CompletedTrick>,
    pub current_leader: PlayerPosition,
    pub current_plays: Vec<TrickPlay>,
}

impl RoundSnapshot {
    pub fn capture(round: &Round) -> Self {
        RoundSnapshot {
            trump: round.designation(),
            starting_player: round.starting_player(),
            hands: array::from_fn(|i| {
                PlayerPosition::from_index(i)
                    .map(|seat| round.hand(seat).cards().to_vec())
                    .unwrap_or_default()
            }),
            completed: round.completed_tricks().to_vec(),
            current_leader: round.current_trick().leader(),
            current_plays: round.current_trick().plays().to_vec(),
        }
    }

    /// Rebuilds the round, replaying the current trick so the winning play is
    /// derived again rather than trusted. Snapshots whose cards or current
    /// trick could not come from a live round are refused.
    pub fn restore(self) -> Result<Round, RoundError> {
        Round::from_parts(
            self.hands,
            self.trump,
            self.starting_player,
            self.completed,
            self.current_leader,
            self.current_plays,
        )
    }

    pub fn to_json(round: &Round) -> serde_json::Result<String> {
        let snapshot = Self::capture(round);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::RoundSnapshot;
    use crate::game::round::{Round, RoundError};
    use crate::game::trick::TrickPlay;
    use crate::model::card::{Card, parse_cards};
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::rules::error::{InconsistentState, PlayError};
    use crate::rules::format::TrickFormat;
    use crate::rules::legality::LegalityResolver;
    use crate::rules::trump::{TrumpDesignation, TrumpSuit};

    fn cards(tokens: &[&str]) -> Vec<Card> {
        parse_cards(tokens.iter().copied()).unwrap()
    }

    fn round_mid_trick() -> Round {
        let mut round = Round::new(
            [
                cards(&["9S", "AS"]),
                cards(&["KS", "3D"]),
                cards(&["BJ", "5C"]),
                cards(&["4S", "6S"]),
            ],
            TrumpDesignation::new(TrumpSuit::Diamonds, Rank::Ten),
            PlayerPosition::North,
        )
        .unwrap();
        round.play(PlayerPosition::North, &cards(&["9S"])).unwrap();
        round.play(PlayerPosition::East, &cards(&["KS"])).unwrap();
        round
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let round = round_mid_trick();
        let json = RoundSnapshot::to_json(&round).unwrap();
        assert!(json.contains("\"current_leader\": \"north\""));
        assert!(json.contains("\"suit\": \"diamonds\""));
    }

    #[test]
    fn snapshot_roundtrip_rederives_winner() {
        let round = round_mid_trick();
        let json = RoundSnapshot::to_json(&round).unwrap();
        let restored = RoundSnapshot::from_json(&json).unwrap().restore().unwrap();

        assert_eq!(restored.designation(), round.designation());
        assert_eq!(
            restored.current_trick().current_winner(),
            Some(PlayerPosition::East)
        );
        assert_eq!(restored.expected_seat(), PlayerPosition::South);
        assert_eq!(
            restored.hand(PlayerPosition::South).cards(),
            round.hand(PlayerPosition::South).cards()
        );
    }

    #[test]
    fn restored_round_keeps_playing() {
        let round = round_mid_trick();
        let mut restored = RoundSnapshot::capture(&round).restore().unwrap();
        restored.play(PlayerPosition::South, &cards(&["BJ"])).unwrap();
        let outcome = restored
            .play(PlayerPosition::West, &cards(&["4S"]))
            .unwrap();
        assert_eq!(outcome.trick_winner, Some(PlayerPosition::South));
    }

    fn inconsistent(state: InconsistentState) -> RoundError {
        RoundError::Play(PlayError::Inconsistent(state))
    }

    #[test]
    fn restore_refuses_a_full_current_trick() {
        let round = round_mid_trick();
        let mut snapshot = RoundSnapshot::capture(&round);
        let resolver = LegalityResolver::new(round.ordering());
        let lead = round.current_trick().lead().cloned().unwrap();
        for (position, token) in [(PlayerPosition::South, "BJ"), (PlayerPosition::West, "4S")] {
            let hand = round.hand(position).cards();
            let format = resolver.resolve(Some(&lead), hand, &cards(&[token])).unwrap();
            snapshot.current_plays.push(TrickPlay { position, format });
        }

        assert_eq!(
            snapshot.restore().unwrap_err(),
            inconsistent(InconsistentState::TrickOverfull)
        );
    }

    #[test]
    fn restore_refuses_a_mixed_lead() {
        let round = round_mid_trick();
        let mut snapshot = RoundSnapshot::capture(&round);
        snapshot.current_plays[0].format = TrickFormat::mixed(&cards(&["9S"]), round.ordering());

        assert_eq!(
            snapshot.restore().unwrap_err(),
            inconsistent(InconsistentState::MixedLeadFormat)
        );
    }

    #[test]
    fn restore_counts_played_cards_against_the_pack() {
        let round = round_mid_trick();
        let king = cards(&["KS"])[0];
        let mut snapshot = RoundSnapshot::capture(&round);
        // East already played one king; two more in hand make three.
        snapshot.hands[PlayerPosition::North.index()].extend([king, king]);

        assert_eq!(
            snapshot.restore().unwrap_err(),
            inconsistent(InconsistentState::TooManyCopies(king))
        );
    }
}
