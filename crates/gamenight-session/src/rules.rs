//! The `GameRules` seam between the shared lifecycle and the two games.
//!
//! The session actor is generic: it runs lobbies, countdowns, grace
//! timers, and broadcasting identically for every game. What differs —
//! which commands exist, what a tick does, what a view looks like — is
//! expressed through this trait, implemented here for both simulations.

use gamenight_guess::GuessGame;
use gamenight_maze::MazeGame;
use gamenight_protocol::{GameCommand, Phase, Recipient, SessionCore, Slot};

use crate::clock::now_ms;
use crate::event::{GameOverState, GameView, ServerEvent};
use crate::Reject;

/// What the session actor needs from a game simulation.
pub trait GameRules: Send + 'static {
    /// Shared session fields (phase, participants, winner).
    fn core(&self) -> &SessionCore;
    fn core_mut(&mut self) -> &mut SessionCore;

    /// `true` if this game runs the fixed-timestep loop while playing.
    fn uses_ticks(&self) -> bool {
        false
    }

    /// Called once as the session enters the playing phase.
    fn on_start(&mut self) {}

    /// Handles one in-game command from a claimed participant.
    ///
    /// Returns the events to dispatch, or a rejection that is reported to
    /// the acting client only.
    fn handle(
        &mut self,
        slot: Slot,
        command: GameCommand,
    ) -> Result<Vec<(Recipient, ServerEvent)>, Reject>;

    /// Advances one fixed timestep. Only called for tick-driven games
    /// while the session is playing.
    fn tick(&mut self) -> Vec<(Recipient, ServerEvent)> {
        Vec::new()
    }

    /// The projection `slot`'s player receives on start and rejoin.
    fn view(&self, slot: Slot) -> GameView;

    /// The projection embedded in `GameOver`.
    fn over_state(&self) -> GameOverState;

    /// Ends the game immediately in `winner`'s favour (forfeit paths).
    /// A no-op unless the session is currently playing.
    fn force_finish(&mut self, winner: Slot);
}

// ---------------------------------------------------------------------------
// Deduction game
// ---------------------------------------------------------------------------

impl GameRules for GuessGame {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn on_start(&mut self) {
        self.start();
    }

    fn handle(
        &mut self,
        slot: Slot,
        command: GameCommand,
    ) -> Result<Vec<(Recipient, ServerEvent)>, Reject> {
        let game_id = self.core.id;
        let user = self.core.participant(slot).user_id.clone();

        match command {
            GameCommand::Ask { question } => {
                let stored = self.ask(slot, &question)?.to_string();
                Ok(vec![(
                    Recipient::All,
                    ServerEvent::QuestionAsked {
                        game_id,
                        asked_by: user,
                        question: stored,
                    },
                )])
            }

            GameCommand::Answer { answer } => {
                self.answer(slot, &answer)?;
                Ok(vec![(
                    Recipient::All,
                    ServerEvent::QuestionAnswered {
                        game_id,
                        answered_by: user,
                        answer,
                    },
                )])
            }

            GameCommand::Flip { card_ids } => {
                self.flip(slot, &card_ids)?;
                Ok(vec![(
                    Recipient::All,
                    ServerEvent::CardsFlipped {
                        game_id,
                        flipped_by: user,
                        card_ids,
                    },
                )])
            }

            GameCommand::EndTurn => {
                self.end_turn(slot)?;
                Ok(vec![(
                    Recipient::All,
                    ServerEvent::TurnChanged {
                        game_id,
                        current_turn: self.current_turn_user().clone(),
                    },
                )])
            }

            GameCommand::Guess { character_id } => {
                let outcome = self.guess(slot, character_id)?;
                tracing::info!(
                    %game_id,
                    guesser = %user,
                    character_id,
                    correct = outcome.correct,
                    "guess ends the game"
                );
                Ok(vec![(
                    Recipient::All,
                    ServerEvent::GameOver {
                        game_id,
                        winner: outcome.winner,
                        forfeit: false,
                        state: self.over_state(),
                    },
                )])
            }

            // There is no movement in the deduction game.
            GameCommand::Move { .. } => Err(Reject::Unsupported),
        }
    }

    fn view(&self, slot: Slot) -> GameView {
        GameView::Deduction(Box::new(self.player_view(slot)))
    }

    fn over_state(&self) -> GameOverState {
        GameOverState::Deduction(Box::new(self.revealed_view()))
    }

    fn force_finish(&mut self, winner: Slot) {
        if self.core.transition(Phase::Finished) {
            self.core.winner = Some(self.core.participant(winner).user_id.clone());
            self.core.finished_at_ms = Some(now_ms());
        }
    }
}

// ---------------------------------------------------------------------------
// Maze race
// ---------------------------------------------------------------------------

impl GameRules for MazeGame {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn uses_ticks(&self) -> bool {
        true
    }

    fn handle(
        &mut self,
        slot: Slot,
        command: GameCommand,
    ) -> Result<Vec<(Recipient, ServerEvent)>, Reject> {
        match command {
            // Movement is just input: the next tick consumes it, and the
            // tick broadcast is the only acknowledgement clients need.
            GameCommand::Move { direction } => {
                self.queue_direction(slot, direction);
                Ok(Vec::new())
            }
            _ => Err(Reject::Unsupported),
        }
    }

    fn tick(&mut self) -> Vec<(Recipient, ServerEvent)> {
        let outcome = MazeGame::tick(self);
        let game_id = self.core.id;

        let mut events = vec![(
            Recipient::All,
            ServerEvent::GameTick {
                snapshot: Box::new(self.snapshot()),
            },
        )];

        if let Some(winner) = outcome.winner {
            // Stamped here, outside the simulation, so the tick function
            // itself stays clock-free.
            self.core.finished_at_ms = Some(now_ms());
            events.push((
                Recipient::All,
                ServerEvent::GameOver {
                    game_id,
                    winner: self.core.participant(winner).user_id.clone(),
                    forfeit: false,
                    state: self.over_state(),
                },
            ));
        }

        events
    }

    fn view(&self, _slot: Slot) -> GameView {
        // Fully public state — the same snapshot serves both players.
        GameView::Maze(Box::new(self.snapshot()))
    }

    fn over_state(&self) -> GameOverState {
        GameOverState::Maze(Box::new(self.snapshot()))
    }

    fn force_finish(&mut self, winner: Slot) {
        if self.core.phase == Phase::Playing {
            self.finish(winner);
            self.core.finished_at_ms = Some(now_ms());
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gamenight_guess::demo_catalog;
    use gamenight_protocol::{Direction, GameId, PlayerInfo, UserId};

    fn playing_guess() -> GuessGame {
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
        GameRules::on_start(&mut game);
        game
    }

    fn playing_maze() -> MazeGame {
        let mut game = MazeGame::new(
            GameId(2),
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("bob", "Bob"),
            1_000,
            600_000,
        );
        let p2 = game.core.participant_mut(Slot::P2);
        p2.user_id = UserId::new("bob");
        p2.claimed = true;
        game.core.transition(Phase::Playing);
        game
    }

    #[test]
    fn test_guess_ask_produces_broadcast_event() {
        let mut game = playing_guess();
        let events = GameRules::handle(
            &mut game,
            Slot::P1,
            GameCommand::Ask {
                question: "Are you wearing a hat?".into(),
            },
        )
        .unwrap();

        assert_eq!(events.len(), 1);
        let (recipient, event) = &events[0];
        assert_eq!(*recipient, Recipient::All);
        assert!(matches!(event, ServerEvent::QuestionAsked { .. }));
    }

    #[test]
    fn test_guess_move_is_unsupported() {
        let mut game = playing_guess();
        let result = GameRules::handle(
            &mut game,
            Slot::P1,
            GameCommand::Move {
                direction: Direction::Up,
            },
        );
        assert!(matches!(result, Err(Reject::Unsupported)));
    }

    #[test]
    fn test_guess_game_over_carries_revealed_state() {
        let mut game = playing_guess();
        let secret = game.secret_of(Slot::P2);
        let events = GameRules::handle(
            &mut game,
            Slot::P1,
            GameCommand::Guess {
                character_id: secret,
            },
        )
        .unwrap();

        match &events[0].1 {
            ServerEvent::GameOver {
                winner,
                forfeit,
                state: GameOverState::Deduction(revealed),
                ..
            } => {
                assert_eq!(winner.as_str(), "alice");
                assert!(!forfeit);
                assert_eq!(revealed.player2.secret_character_id, secret);
            }
            other => panic!("expected GameOver, got {other:?}"),
        }
    }

    #[test]
    fn test_maze_tick_emits_snapshot() {
        let mut game = playing_maze();
        let events = GameRules::tick(&mut game);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].1, ServerEvent::GameTick { .. }));
    }

    #[test]
    fn test_maze_move_returns_no_events() {
        let mut game = playing_maze();
        let events = GameRules::handle(
            &mut game,
            Slot::P1,
            GameCommand::Move {
                direction: Direction::Up,
            },
        )
        .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_maze_ask_is_unsupported() {
        let mut game = playing_maze();
        let result = GameRules::handle(
            &mut game,
            Slot::P1,
            GameCommand::Ask {
                question: "Are you a ghost?".into(),
            },
        );
        assert!(matches!(result, Err(Reject::Unsupported)));
    }

    #[test]
    fn test_force_finish_credits_winner_once() {
        let mut game = playing_maze();
        GameRules::force_finish(&mut game, Slot::P2);
        assert_eq!(game.core.phase, Phase::Finished);
        assert_eq!(game.core.winner.as_ref().unwrap().as_str(), "bob");

        // A second forfeit cannot overwrite the result.
        GameRules::force_finish(&mut game, Slot::P1);
        assert_eq!(game.core.winner.as_ref().unwrap().as_str(), "bob");
    }
}
