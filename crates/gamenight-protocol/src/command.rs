//! Inbound commands — the tagged union every client message is parsed into.
//!
//! The transport boundary decodes raw frames into [`ClientCommand`] before
//! anything touches game state, so the simulation layer only ever sees
//! well-typed input. A frame that doesn't parse is answered with an error
//! to that client and goes no further.

use serde::{Deserialize, Serialize};

use crate::{Direction, GameId, PlayerInfo, UserId};

// ---------------------------------------------------------------------------
// GameKind
// ---------------------------------------------------------------------------

/// Which of the two games a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    /// The turn-based deduction game (ask → answer → flip, guess to win).
    Deduction,
    /// The real-time maze race (dots, ghosts, lives).
    MazeRace,
}

// ---------------------------------------------------------------------------
// ClientCommand
// ---------------------------------------------------------------------------

/// Every command a client can send, one variant per operation.
///
/// `#[serde(tag = "type")]` gives the internally tagged JSON the client SDK
/// speaks:
///
/// ```json
/// { "type": "AskQuestion", "game_id": 3, "user_id": "alice",
///   "question": "Are you wearing a hat?" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Create a new session: the creator takes slot 1, the placeholder
    /// info seeds slot 2 until the real opponent joins.
    CreateGame {
        game: GameKind,
        creator: PlayerInfo,
        opponent: PlayerInfo,
    },

    /// Bind this connection to a session: rejoining an owned slot or
    /// claiming the unfilled placeholder.
    JoinLobby {
        game_id: GameId,
        user_id: UserId,
        /// Overrides the placeholder's display name when claiming it.
        display_name: Option<String>,
        avatar: Option<String>,
    },

    /// Mark this participant ready. When both are ready the countdown starts.
    PlayerReady { game_id: GameId, user_id: UserId },

    /// Abandon a lobby before play begins.
    CancelGame { game_id: GameId, user_id: UserId },

    /// Queue a direction change (maze race).
    Move {
        game_id: GameId,
        user_id: UserId,
        direction: Direction,
    },

    /// Ask the opponent a yes/no question (deduction).
    AskQuestion {
        game_id: GameId,
        user_id: UserId,
        question: String,
    },

    /// Answer the pending question (deduction).
    AnswerQuestion {
        game_id: GameId,
        user_id: UserId,
        answer: String,
    },

    /// Flip (eliminate) cards on your own board (deduction).
    FlipCards {
        game_id: GameId,
        user_id: UserId,
        card_ids: Vec<u32>,
    },

    /// Hand the turn to the opponent (deduction).
    EndTurn { game_id: GameId, user_id: UserId },

    /// Guess the opponent's secret character. Wrong guesses lose the game
    /// on the spot (deduction).
    MakeGuess {
        game_id: GameId,
        user_id: UserId,
        character_id: u32,
    },

    /// Concede immediately, crediting the opponent.
    Forfeit { game_id: GameId, user_id: UserId },

    /// Rebind after a dropped connection; cancels any pending
    /// disconnect forfeit and resends the full view.
    RejoinGame { game_id: GameId, user_id: UserId },
}

impl ClientCommand {
    /// The session this command targets, if it names one.
    ///
    /// `CreateGame` is the only command without a target — the session
    /// doesn't exist yet.
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            Self::CreateGame { .. } => None,
            Self::JoinLobby { game_id, .. }
            | Self::PlayerReady { game_id, .. }
            | Self::CancelGame { game_id, .. }
            | Self::Move { game_id, .. }
            | Self::AskQuestion { game_id, .. }
            | Self::AnswerQuestion { game_id, .. }
            | Self::FlipCards { game_id, .. }
            | Self::EndTurn { game_id, .. }
            | Self::MakeGuess { game_id, .. }
            | Self::Forfeit { game_id, .. }
            | Self::RejoinGame { game_id, .. } => Some(*game_id),
        }
    }

    /// Splits off the in-game portion, if this is an in-game command.
    ///
    /// Lifecycle commands (create/join/ready/cancel/forfeit/rejoin) are
    /// handled by the session layer itself; the remainder is routed into
    /// the running simulation as a [`GameCommand`].
    pub fn into_game_command(self) -> Option<(GameId, UserId, GameCommand)> {
        match self {
            Self::Move {
                game_id,
                user_id,
                direction,
            } => Some((game_id, user_id, GameCommand::Move { direction })),
            Self::AskQuestion {
                game_id,
                user_id,
                question,
            } => Some((game_id, user_id, GameCommand::Ask { question })),
            Self::AnswerQuestion {
                game_id,
                user_id,
                answer,
            } => Some((game_id, user_id, GameCommand::Answer { answer })),
            Self::FlipCards {
                game_id,
                user_id,
                card_ids,
            } => Some((game_id, user_id, GameCommand::Flip { card_ids })),
            Self::EndTurn { game_id, user_id } => {
                Some((game_id, user_id, GameCommand::EndTurn))
            }
            Self::MakeGuess {
                game_id,
                user_id,
                character_id,
            } => Some((game_id, user_id, GameCommand::Guess { character_id })),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GameCommand
// ---------------------------------------------------------------------------

/// The in-game subset of [`ClientCommand`], already stripped of routing
/// fields. This is what a running simulation receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameCommand {
    Move { direction: Direction },
    Ask { question: String },
    Answer { answer: String },
    Flip { card_ids: Vec<u32> },
    EndTurn,
    Guess { character_id: u32 },
}

// =========================================================================
// Tests
// =========================================================================
