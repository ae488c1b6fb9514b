//! Per-recipient projections of the deduction game.
//!
//! A player's view contains their own record in full — including their own
//! secret — but redacts the opponent down to public fields. The only
//! projection that exposes both secrets is [`RevealedView`], built for the
//! results screen once the game is over.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use gamenight_protocol::{GameId, Phase, Slot, UserId};

use crate::{Character, GuessGame, TurnPhase, TurnRecord};

/// A participant as seen by themselves: everything, secret included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnPlayer {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub ready: bool,
    pub secret_character_id: u32,
    pub flipped_cards: BTreeSet<u32>,
}

/// A participant as seen by their opponent: public fields only.
///
/// There is deliberately no secret field here — the type system makes the
/// redaction structural rather than a matter of remembering to skip a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentPlayer {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub ready: bool,
    pub flipped_cards: BTreeSet<u32>,
}

/// What one player is allowed to see while the game runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub game_id: GameId,
    pub me: OwnPlayer,
    pub opponent: OpponentPlayer,
    pub characters: Vec<Character>,
    pub current_turn: UserId,
    pub phase: Phase,
    pub turn_phase: TurnPhase,
    pub current_question: Option<String>,
    pub current_answer: Option<String>,
    pub turn_history: Vec<TurnRecord>,
    pub winner: Option<UserId>,
    pub lobby_expires_at_ms: u64,
    pub created_at_ms: u64,
    pub finished_at_ms: Option<u64>,
}

/// The post-game projection with both secrets visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealedView {
    pub game_id: GameId,
    pub player1: OwnPlayer,
    pub player2: OwnPlayer,
    pub characters: Vec<Character>,
    pub winner: Option<UserId>,
    pub phase: Phase,
    pub turn_history: Vec<TurnRecord>,
    pub created_at_ms: u64,
    pub finished_at_ms: Option<u64>,
}

impl GuessGame {
    fn own_player(&self, slot: Slot) -> OwnPlayer {
        let p = self.core.participant(slot);
        OwnPlayer {
            user_id: p.user_id.clone(),
            display_name: p.display_name.clone(),
            avatar: p.avatar.clone(),
            ready: p.ready,
            secret_character_id: self.secret_of(slot),
            flipped_cards: self.flipped_of(slot).clone(),
        }
    }

    fn opponent_player(&self, slot: Slot) -> OpponentPlayer {
        let p = self.core.participant(slot);
        OpponentPlayer {
            user_id: p.user_id.clone(),
            display_name: p.display_name.clone(),
            avatar: p.avatar.clone(),
            ready: p.ready,
            flipped_cards: self.flipped_of(slot).clone(),
        }
    }

    /// The state `slot`'s player may see right now.
    pub fn player_view(&self, slot: Slot) -> PlayerView {
        PlayerView {
            game_id: self.core.id,
            me: self.own_player(slot),
            opponent: self.opponent_player(slot.other()),
            characters: self.characters.clone(),
            current_turn: self.current_turn_user().clone(),
            phase: self.core.phase,
            turn_phase: self.turn_phase(),
            current_question: self.current_question().map(String::from),
            current_answer: self.current_answer().map(String::from),
            turn_history: self.history().to_vec(),
            winner: self.core.winner.clone(),
            lobby_expires_at_ms: self.core.lobby_expires_at_ms,
            created_at_ms: self.core.created_at_ms,
            finished_at_ms: self.core.finished_at_ms,
        }
    }

    /// The full reveal for the results screen. Both secrets are visible,
    /// so callers must only ship this once the session is terminal.
    pub fn revealed_view(&self) -> RevealedView {
        RevealedView {
            game_id: self.core.id,
            player1: self.own_player(Slot::P1),
            player2: self.own_player(Slot::P2),
            characters: self.characters.clone(),
            winner: self.core.winner.clone(),
            phase: self.core.phase,
            turn_history: self.history().to_vec(),
            created_at_ms: self.core.created_at_ms,
            finished_at_ms: self.core.finished_at_ms,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_catalog;
    use gamenight_protocol::PlayerInfo;

    fn playing_game() -> GuessGame {
        let mut game = GuessGame::new(
            GameId(1),
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("bob", "Bob"),
            demo_catalog(),
            1_000,
            600_000,
        );
        game.core.participant_mut(Slot::P2).claimed = true;
        game.core.transition(Phase::Playing);
        game.start();
        game
    }

    #[test]
    fn test_player_view_includes_own_secret() {
        let game = playing_game();
        let view = game.player_view(Slot::P1);
        assert_eq!(view.me.secret_character_id, game.secret_of(Slot::P1));
    }

    #[test]
    fn test_player_view_never_leaks_opponent_secret() {
        // The serialized opponent record must not mention the secret at
        // all — absence of the key, not a null.
        let game = playing_game();
        let view = game.player_view(Slot::P1);
        let json = serde_json::to_value(&view).unwrap();

        assert!(json["opponent"].get("secret_character_id").is_none());
        // And nothing in the opponent object equals bob's secret id.
        let secret = game.secret_of(Slot::P2);
        let opponent = serde_json::to_string(&json["opponent"]).unwrap();
        assert!(!opponent.contains(&format!("\"secret_character_id\":{secret}")));
    }

    #[test]
    fn test_player_view_is_symmetric_for_slot2() {
        let game = playing_game();
        let view = game.player_view(Slot::P2);
        assert_eq!(view.me.user_id.as_str(), "bob");
        assert_eq!(view.opponent.user_id.as_str(), "alice");
        assert_eq!(view.me.secret_character_id, game.secret_of(Slot::P2));
    }

    #[test]
    fn test_player_view_shows_opponent_flipped_cards() {
        // Flipped cards are public — both boards show them.
        let mut game = playing_game();
        game.ask(Slot::P1, "Are you wearing a hat?").unwrap();
        game.answer(Slot::P2, "no").unwrap();
        game.flip(Slot::P1, &[2, 7]).unwrap();

        let bob_view = game.player_view(Slot::P2);
        assert_eq!(bob_view.opponent.flipped_cards.len(), 2);
    }

    #[test]
    fn test_revealed_view_exposes_both_secrets() {
        let mut game = playing_game();
        let secret = game.secret_of(Slot::P2);
        game.guess(Slot::P1, secret).unwrap();

        let revealed = game.revealed_view();
        assert_eq!(revealed.player1.secret_character_id, game.secret_of(Slot::P1));
        assert_eq!(revealed.player2.secret_character_id, game.secret_of(Slot::P2));
        assert_eq!(revealed.winner.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_view_tracks_turn_state() {
        let mut game = playing_game();
        game.ask(Slot::P1, "Do you wear glasses?").unwrap();

        let view = game.player_view(Slot::P2);
        assert_eq!(view.turn_phase, TurnPhase::Answer);
        assert_eq!(view.current_question.as_deref(), Some("Do you wear glasses?"));
        assert_eq!(view.current_turn.as_str(), "alice");
    }
}
