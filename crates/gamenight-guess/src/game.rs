//! The deduction game state machine.
//!
//! Both players hold a secret character; they alternate turns asking
//! yes/no questions, flipping eliminated cards on their own board, and —
//! whenever they dare — guessing the opponent's secret. A correct guess
//! wins; a wrong guess loses on the spot. That instant-loss rule is the
//! heart of the game and is enforced here, not in the client.
//!
//! Within a turn the sub-phases advance strictly:
//!
//! ```text
//! Ask ──→ Answer ──→ Flip ──→ Ask (other player)
//! ```
//!
//! The sub-phase alone decides who may act, so there is no
//! simultaneous-action ambiguity to resolve.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::seq::index;
use serde::{Deserialize, Serialize};

use gamenight_protocol::{GameId, Phase, PlayerInfo, SessionCore, Slot, UserId};

use crate::{Character, GuessError};

/// Question length bounds, counted in characters after trimming.
const QUESTION_MIN_CHARS: usize = 5;
const QUESTION_MAX_CHARS: usize = 100;

/// Current unix time in milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

// ---------------------------------------------------------------------------
// Turn sub-state
// ---------------------------------------------------------------------------

/// The sub-phase inside the active player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    /// The turn holder may ask a question (or guess).
    Ask,
    /// The opponent must answer the pending question.
    Answer,
    /// The turn holder flips cards, then ends the turn.
    Flip,
}

impl TurnPhase {
    fn name(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Answer => "answer",
            Self::Flip => "flip",
        }
    }
}

/// One completed question/answer exchange, appended to the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub asker: UserId,
    pub question: String,
    pub answer: String,
    pub at_ms: u64,
}

/// The result of a guess: who won, and whether the guess was right.
///
/// `correct == false` means the guesser lost — a wrong guess ends the
/// game immediately in the opponent's favour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub guessed_character_id: u32,
    pub correct: bool,
    pub winner: UserId,
    pub loser: UserId,
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// Full server-side state of one deduction session.
///
/// The secrets live here and nowhere else; clients only ever see them
/// through the redaction in [`player_view`](GuessGame::player_view) and
/// [`revealed_view`](GuessGame::revealed_view).
#[derive(Debug, Clone)]
pub struct GuessGame {
    pub core: SessionCore,
    /// Read-only catalog shared by the session.
    pub characters: Vec<Character>,
    /// Secret character ids, indexed by slot. Always two distinct ids.
    secrets: [u32; 2],
    /// Cards each player has eliminated on their own board.
    flipped: [BTreeSet<u32>; 2],
    current_turn: Slot,
    turn_phase: TurnPhase,
    current_question: Option<String>,
    current_answer: Option<String>,
    turn_history: Vec<TurnRecord>,
}

impl GuessGame {
    /// Creates a fresh lobby-phase session and draws two distinct secrets.
    ///
    /// # Panics
    /// Panics if the catalog holds fewer than two characters — a
    /// misconfigured deployment, not a runtime condition.
    pub fn new(
        id: GameId,
        creator: PlayerInfo,
        opponent: PlayerInfo,
        characters: Vec<Character>,
        created_at_ms: u64,
        lobby_ttl_ms: u64,
    ) -> Self {
        assert!(
            characters.len() >= 2,
            "catalog must hold at least two characters"
        );

        // Two distinct indices, drawn without replacement.
        let mut rng = rand::rng();
        let picks = index::sample(&mut rng, characters.len(), 2);
        let secrets = [
            characters[picks.index(0)].id,
            characters[picks.index(1)].id,
        ];

        Self {
            core: SessionCore::new(id, creator, opponent, created_at_ms, lobby_ttl_ms),
            characters,
            secrets,
            flipped: [BTreeSet::new(), BTreeSet::new()],
            current_turn: Slot::P1,
            turn_phase: TurnPhase::Ask,
            current_question: None,
            current_answer: None,
            turn_history: Vec::new(),
        }
    }

    /// Resets the turn machine as play begins: participant 1 asks first.
    pub fn start(&mut self) {
        self.current_turn = Slot::P1;
        self.turn_phase = TurnPhase::Ask;
    }

    // -- Accessors --------------------------------------------------------

    pub fn current_turn(&self) -> Slot {
        self.current_turn
    }

    pub fn current_turn_user(&self) -> &UserId {
        &self.core.participant(self.current_turn).user_id
    }

    pub fn turn_phase(&self) -> TurnPhase {
        self.turn_phase
    }

    pub fn secret_of(&self, slot: Slot) -> u32 {
        self.secrets[slot.index()]
    }

    pub fn flipped_of(&self, slot: Slot) -> &BTreeSet<u32> {
        &self.flipped[slot.index()]
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.turn_history
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn current_answer(&self) -> Option<&str> {
        self.current_answer.as_deref()
    }

    // -- Guards -----------------------------------------------------------

    fn require_playing(&self) -> Result<(), GuessError> {
        if self.core.phase == Phase::Playing {
            Ok(())
        } else {
            Err(GuessError::NotPlaying)
        }
    }

    fn require_turn(&self, slot: Slot) -> Result<(), GuessError> {
        if self.current_turn == slot {
            Ok(())
        } else {
            Err(GuessError::NotYourTurn)
        }
    }

    fn require_turn_phase(&self, expected: TurnPhase) -> Result<(), GuessError> {
        if self.turn_phase == expected {
            Ok(())
        } else {
            Err(GuessError::WrongTurnPhase {
                expected: expected.name(),
                actual: self.turn_phase.name(),
            })
        }
    }

    // -- Operations -------------------------------------------------------
    //
    // Every operation either fully applies or rejects without touching
    // state; guards run before the first mutation.

    /// The turn holder asks a yes/no question.
    pub fn ask(&mut self, slot: Slot, question: &str) -> Result<&str, GuessError> {
        self.require_playing()?;
        self.require_turn_phase(TurnPhase::Ask)?;
        self.require_turn(slot)?;
        let question = validate_question(question)?;

        self.current_question = Some(question.to_string());
        self.current_answer = None;
        self.turn_phase = TurnPhase::Answer;
        Ok(self.current_question.as_deref().expect("just stored"))
    }

    /// The opponent answers the pending question, which is then logged.
    pub fn answer(&mut self, slot: Slot, answer: &str) -> Result<(), GuessError> {
        self.require_playing()?;
        self.require_turn_phase(TurnPhase::Answer)?;
        if slot == self.current_turn {
            return Err(GuessError::NotYourAnswer);
        }

        let question = self
            .current_question
            .clone()
            .expect("answer phase implies a pending question");

        self.current_answer = Some(answer.to_string());
        self.turn_history.push(TurnRecord {
            asker: self.current_turn_user().clone(),
            question,
            answer: answer.to_string(),
            at_ms: now_ms(),
        });
        self.turn_phase = TurnPhase::Flip;
        Ok(())
    }

    /// The turn holder flips cards on their own board.
    ///
    /// Re-flipping an already-flipped id is a no-op, not an error — the
    /// client may retransmit freely.
    pub fn flip(&mut self, slot: Slot, card_ids: &[u32]) -> Result<(), GuessError> {
        self.require_playing()?;
        self.require_turn_phase(TurnPhase::Flip)?;
        self.require_turn(slot)?;

        self.flipped[slot.index()].extend(card_ids.iter().copied());
        Ok(())
    }

    /// The turn holder passes the turn to the opponent.
    pub fn end_turn(&mut self, slot: Slot) -> Result<(), GuessError> {
        self.require_playing()?;
        self.require_turn_phase(TurnPhase::Flip)?;
        self.require_turn(slot)?;

        self.current_turn = self.current_turn.other();
        self.turn_phase = TurnPhase::Ask;
        self.current_question = None;
        self.current_answer = None;
        Ok(())
    }

    /// The turn holder names the opponent's secret — and ends the game
    /// either way.
    ///
    /// Legal in any turn sub-phase as long as the guesser holds the turn.
    pub fn guess(
        &mut self,
        slot: Slot,
        character_id: u32,
    ) -> Result<GuessOutcome, GuessError> {
        self.require_playing()?;
        self.require_turn(slot)?;

        let correct = character_id == self.secrets[slot.other().index()];
        let (winner_slot, loser_slot) = if correct {
            (slot, slot.other())
        } else {
            (slot.other(), slot)
        };

        let winner = self.core.participant(winner_slot).user_id.clone();
        let loser = self.core.participant(loser_slot).user_id.clone();

        self.core.winner = Some(winner.clone());
        self.core.transition(Phase::Finished);
        self.core.finished_at_ms = Some(now_ms());

        Ok(GuessOutcome {
            guessed_character_id: character_id,
            correct,
            winner,
            loser,
        })
    }
}

/// Validates a question and returns it trimmed.
///
/// Rules: trimmed length within [5, 100] characters, and the question
/// must end with `?`.
pub fn validate_question(question: &str) -> Result<&str, GuessError> {
    let trimmed = question.trim();
    let len = trimmed.chars().count();
    if len < QUESTION_MIN_CHARS {
        return Err(GuessError::InvalidQuestion(format!(
            "question too short (min {QUESTION_MIN_CHARS} characters)"
        )));
    }
    if len > QUESTION_MAX_CHARS {
        return Err(GuessError::InvalidQuestion(format!(
            "question too long (max {QUESTION_MAX_CHARS} characters)"
        )));
    }
    if !trimmed.ends_with('?') {
        return Err(GuessError::InvalidQuestion(
            "yes/no questions must end with \"?\"".to_string(),
        ));
    }
    Ok(trimmed)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_catalog;

    /// A started game with alice (P1) and bob (P2).
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

    /// Advances alice's turn through ask + answer so flipping is legal.
    fn reach_flip_phase(game: &mut GuessGame) {
        game.ask(Slot::P1, "Are you wearing a hat?").unwrap();
        game.answer(Slot::P2, "no").unwrap();
    }

    // =====================================================================
    // Creation
    // =====================================================================

    #[test]
    fn test_new_assigns_two_distinct_secrets() {
        // Random draws must never hand both players the same character.
        for _ in 0..50 {
            let game = GuessGame::new(
                GameId(1),
                PlayerInfo::new("alice", "Alice"),
                PlayerInfo::new("bob", "Bob"),
                demo_catalog(),
                1_000,
                600_000,
            );
            assert_ne!(game.secret_of(Slot::P1), game.secret_of(Slot::P2));
        }
    }

    #[test]
    fn test_new_secrets_come_from_the_catalog() {
        let catalog = demo_catalog();
        let ids: Vec<u32> = catalog.iter().map(|c| c.id).collect();
        let game = GuessGame::new(
            GameId(1),
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("bob", "Bob"),
            catalog,
            1_000,
            600_000,
        );
        assert!(ids.contains(&game.secret_of(Slot::P1)));
        assert!(ids.contains(&game.secret_of(Slot::P2)));
    }

    #[test]
    fn test_start_gives_first_turn_to_slot1() {
        let game = playing_game();
        assert_eq!(game.current_turn(), Slot::P1);
        assert_eq!(game.turn_phase(), TurnPhase::Ask);
        assert_eq!(game.current_turn_user().as_str(), "alice");
    }

    // =====================================================================
    // validate_question()
    // =====================================================================

    #[test]
    fn test_validate_question_accepts_trimmed_question() {
        assert_eq!(
            validate_question("  Are you a robot?  ").unwrap(),
            "Are you a robot?"
        );
    }

    #[test]
    fn test_validate_question_rejects_too_short() {
        assert!(matches!(
            validate_question("Ok?"),
            Err(GuessError::InvalidQuestion(_))
        ));
    }

    #[test]
    fn test_validate_question_rejects_missing_question_mark() {
        assert!(matches!(
            validate_question("short"),
            Err(GuessError::InvalidQuestion(_))
        ));
        assert!(matches!(
            validate_question("You are wearing a hat"),
            Err(GuessError::InvalidQuestion(_))
        ));
    }

    #[test]
    fn test_validate_question_rejects_too_long() {
        let long = format!("{}?", "a".repeat(100));
        assert!(matches!(
            validate_question(&long),
            Err(GuessError::InvalidQuestion(_))
        ));
    }

    #[test]
    fn test_validate_question_boundary_lengths() {
        // Exactly 5 and exactly 100 characters are both legal.
        assert!(validate_question("Hat??").is_ok());
        let exactly_100 = format!("{}?", "a".repeat(99));
        assert!(validate_question(&exactly_100).is_ok());
    }

    // =====================================================================
    // ask()
    // =====================================================================

    #[test]
    fn test_ask_valid_question_moves_to_answer_phase() {
        let mut game = playing_game();

        game.ask(Slot::P1, "Are you a robot?").unwrap();

        assert_eq!(game.turn_phase(), TurnPhase::Answer);
        assert_eq!(game.current_question(), Some("Are you a robot?"));
    }

    #[test]
    fn test_ask_invalid_question_leaves_state_unchanged() {
        let mut game = playing_game();

        let result = game.ask(Slot::P1, "short");

        assert!(matches!(result, Err(GuessError::InvalidQuestion(_))));
        assert_eq!(game.turn_phase(), TurnPhase::Ask);
        assert_eq!(game.current_question(), None);
    }

    #[test]
    fn test_ask_out_of_turn_is_rejected() {
        let mut game = playing_game();

        let result = game.ask(Slot::P2, "Are you a robot?");

        assert_eq!(result, Err(GuessError::NotYourTurn));
        assert_eq!(game.turn_phase(), TurnPhase::Ask);
    }

    #[test]
    fn test_ask_before_game_starts_is_rejected() {
        let mut game = GuessGame::new(
            GameId(1),
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("bob", "Bob"),
            demo_catalog(),
            1_000,
            600_000,
        );
        // Still in lobby — asking is premature.
        let result = game.ask(Slot::P1, "Are you a robot?");
        assert_eq!(result, Err(GuessError::NotPlaying));
    }

    // =====================================================================
    // answer()
    // =====================================================================

    #[test]
    fn test_answer_records_history_and_moves_to_flip() {
        let mut game = playing_game();
        game.ask(Slot::P1, "Are you wearing glasses?").unwrap();

        game.answer(Slot::P2, "yes").unwrap();

        assert_eq!(game.turn_phase(), TurnPhase::Flip);
        assert_eq!(game.history().len(), 1);
        let record = &game.history()[0];
        assert_eq!(record.asker.as_str(), "alice");
        assert_eq!(record.question, "Are you wearing glasses?");
        assert_eq!(record.answer, "yes");
    }

    #[test]
    fn test_answer_by_the_asker_is_rejected() {
        let mut game = playing_game();
        game.ask(Slot::P1, "Are you wearing glasses?").unwrap();

        let result = game.answer(Slot::P1, "yes");

        assert_eq!(result, Err(GuessError::NotYourAnswer));
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_answer_before_question_is_rejected() {
        let mut game = playing_game();

        let result = game.answer(Slot::P2, "yes");

        assert!(matches!(result, Err(GuessError::WrongTurnPhase { .. })));
    }

    // =====================================================================
    // flip()
    // =====================================================================

    #[test]
    fn test_flip_unions_into_own_board() {
        let mut game = playing_game();
        reach_flip_phase(&mut game);

        game.flip(Slot::P1, &[3, 1, 4]).unwrap();

        assert_eq!(
            game.flipped_of(Slot::P1).iter().copied().collect::<Vec<_>>(),
            vec![1, 3, 4]
        );
        assert!(game.flipped_of(Slot::P2).is_empty());
    }

    #[test]
    fn test_flip_already_flipped_card_is_idempotent() {
        let mut game = playing_game();
        reach_flip_phase(&mut game);
        game.flip(Slot::P1, &[2, 5]).unwrap();

        // Same ids again — membership unchanged, no error.
        game.flip(Slot::P1, &[2, 5]).unwrap();

        assert_eq!(game.flipped_of(Slot::P1).len(), 2);
    }

    #[test]
    fn test_flip_outside_flip_phase_is_rejected() {
        let mut game = playing_game();

        let result = game.flip(Slot::P1, &[1]);

        assert!(matches!(result, Err(GuessError::WrongTurnPhase { .. })));
        assert!(game.flipped_of(Slot::P1).is_empty());
    }

    // =====================================================================
    // end_turn()
    // =====================================================================

    #[test]
    fn test_end_turn_swaps_turn_and_clears_transients() {
        let mut game = playing_game();
        reach_flip_phase(&mut game);

        game.end_turn(Slot::P1).unwrap();

        assert_eq!(game.current_turn(), Slot::P2);
        assert_eq!(game.turn_phase(), TurnPhase::Ask);
        assert_eq!(game.current_question(), None);
        assert_eq!(game.current_answer(), None);
    }

    #[test]
    fn test_turn_cycle_alternates_between_players() {
        // Two full turns: ask → answer → flip → end, twice, with the
        // turn holder alternating.
        let mut game = playing_game();

        reach_flip_phase(&mut game);
        game.end_turn(Slot::P1).unwrap();
        assert_eq!(game.current_turn(), Slot::P2);

        game.ask(Slot::P2, "Do you have red hair?").unwrap();
        game.answer(Slot::P1, "no").unwrap();
        game.end_turn(Slot::P2).unwrap();

        assert_eq!(game.current_turn(), Slot::P1);
        assert_eq!(game.turn_phase(), TurnPhase::Ask);
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_end_turn_outside_flip_phase_is_rejected() {
        let mut game = playing_game();

        let result = game.end_turn(Slot::P1);

        assert!(matches!(result, Err(GuessError::WrongTurnPhase { .. })));
        assert_eq!(game.current_turn(), Slot::P1);
    }

    // =====================================================================
    // guess()
    // =====================================================================

    #[test]
    fn test_correct_guess_wins_and_finishes() {
        let mut game = playing_game();
        let secret = game.secret_of(Slot::P2);

        let outcome = game.guess(Slot::P1, secret).unwrap();

        assert!(outcome.correct);
        assert_eq!(outcome.winner.as_str(), "alice");
        assert_eq!(outcome.loser.as_str(), "bob");
        assert_eq!(game.core.phase, Phase::Finished);
        assert_eq!(game.core.winner.as_ref().unwrap().as_str(), "alice");
        assert!(game.core.finished_at_ms.is_some());
    }

    #[test]
    fn test_wrong_guess_loses_immediately() {
        let mut game = playing_game();
        // Pick an id that is definitely not bob's secret.
        let wrong = demo_catalog()
            .iter()
            .map(|c| c.id)
            .find(|id| *id != game.secret_of(Slot::P2))
            .unwrap();

        let outcome = game.guess(Slot::P1, wrong).unwrap();

        assert!(!outcome.correct);
        assert_eq!(outcome.winner.as_str(), "bob");
        assert_eq!(game.core.phase, Phase::Finished);
    }

    #[test]
    fn test_guess_is_legal_in_any_turn_sub_phase() {
        // Mid-turn (answer pending) the turn holder may still guess.
        let mut game = playing_game();
        game.ask(Slot::P1, "Are you wearing a hat?").unwrap();

        let secret = game.secret_of(Slot::P2);
        assert!(game.guess(Slot::P1, secret).is_ok());
    }

    #[test]
    fn test_guess_out_of_turn_is_rejected() {
        let mut game = playing_game();

        let result = game.guess(Slot::P2, 1);

        assert_eq!(result, Err(GuessError::NotYourTurn));
        assert_eq!(game.core.phase, Phase::Playing);
    }

    #[test]
    fn test_guess_after_finish_is_rejected() {
        let mut game = playing_game();
        let secret = game.secret_of(Slot::P2);
        game.guess(Slot::P1, secret).unwrap();

        // The loser can't retaliate after the game ended.
        let result = game.guess(Slot::P2, game.secret_of(Slot::P1));
        assert_eq!(result, Err(GuessError::NotPlaying));
    }
}
