//! Outbound events — everything the engine can push to a client.
//!
//! Events travel through one unbounded channel per connection; the
//! session actor resolves a [`Recipient`](gamenight_protocol::Recipient)
//! for each event and drops sends to connections that have gone away.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use gamenight_guess::{PlayerView, RevealedView};
use gamenight_maze::MazeSnapshot;
use gamenight_protocol::{GameId, SessionCore, UserId};

/// The channel a connection handler hands to the engine so events can
/// flow back to its socket.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Receiving half, owned by the connection handler.
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

// ---------------------------------------------------------------------------
// View payloads
// ---------------------------------------------------------------------------

/// The per-recipient projection sent when a game starts or is rejoined.
///
/// The deduction view is personalized (it carries the recipient's own
/// secret); the maze snapshot is the same for everyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameView {
    Deduction(Box<PlayerView>),
    Maze(Box<MazeSnapshot>),
}

/// The projection embedded in `GameOver` for the results screen.
///
/// For the deduction game this is the revealed view — the only moment
/// both secrets become visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameOverState {
    Deduction(Box<RevealedView>),
    Maze(Box<MazeSnapshot>),
}

/// A participant as shown in lobby updates — public fields only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub ready: bool,
}

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// Every event the server pushes, as an internally tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to `CreateGame`: the new session's id.
    GameCreated { game_id: GameId },

    /// Lobby roster changed (join, ready). Sent to everyone in the room.
    LobbyUpdated {
        game_id: GameId,
        player1: LobbyPlayer,
        player2: LobbyPlayer,
        seconds_remaining: u64,
    },

    /// Both players are ready; play begins after the countdown.
    GameStarting { game_id: GameId, countdown: u32 },

    /// Play has begun. Each recipient gets their own view.
    GameStarted { game_id: GameId, view: GameView },

    /// One fixed-timestep snapshot of the maze race (~20/s while playing).
    GameTick { snapshot: Box<MazeSnapshot> },

    /// Deduction: the turn holder asked a question.
    QuestionAsked {
        game_id: GameId,
        asked_by: UserId,
        question: String,
    },

    /// Deduction: the opponent answered.
    QuestionAnswered {
        game_id: GameId,
        answered_by: UserId,
        answer: String,
    },

    /// Deduction: the turn holder flipped cards on their board.
    CardsFlipped {
        game_id: GameId,
        flipped_by: UserId,
        card_ids: Vec<u32>,
    },

    /// Deduction: the turn passed to the other player.
    TurnChanged { game_id: GameId, current_turn: UserId },

    /// The session finished — by a guess, a maze win, or a forfeit.
    GameOver {
        game_id: GameId,
        winner: UserId,
        forfeit: bool,
        state: GameOverState,
    },

    /// The other player's connection dropped; the grace clock is running.
    OpponentDisconnected { game_id: GameId, wait_secs: u64 },

    /// The other player is back; the grace clock stopped.
    OpponentReconnected { game_id: GameId },

    /// The lobby timed out before both players readied up.
    LobbyExpired { game_id: GameId },

    /// A participant cancelled the lobby.
    GameCancelled {
        game_id: GameId,
        cancelled_by: Option<UserId>,
    },

    /// Reply to a rejoin: the full current view for this recipient.
    GameRejoined { game_id: GameId, view: GameView },

    /// A rejected or malformed command. Sent only to the acting client.
    Error { message: String },
}

impl ServerEvent {
    /// Builds a `LobbyUpdated` from the session core.
    pub(crate) fn lobby_update(core: &SessionCore, now_ms: u64) -> Self {
        let player = |i: usize| {
            let p = &core.participants[i];
            LobbyPlayer {
                user_id: p.user_id.clone(),
                display_name: p.display_name.clone(),
                avatar: p.avatar.clone(),
                ready: p.ready,
            }
        };
        Self::LobbyUpdated {
            game_id: core.id,
            player1: player(0),
            player2: player(1),
            seconds_remaining: core.lobby_expires_at_ms.saturating_sub(now_ms) / 1000,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gamenight_protocol::{GameId, PlayerInfo};

    #[test]
    fn test_events_are_internally_tagged() {
        let event = ServerEvent::GameStarting {
            game_id: GameId(3),
            countdown: 3,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "GameStarting");
        assert_eq!(json["game_id"], 3);
        assert_eq!(json["countdown"], 3);
    }

    #[test]
    fn test_error_event_round_trip() {
        let event = ServerEvent::Error {
            message: "not your turn".into(),
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_lobby_update_computes_remaining_seconds() {
        let core = SessionCore::new(
            GameId(1),
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("pending", "Opponent"),
            10_000,
            600_000,
        );
        let event = ServerEvent::lobby_update(&core, 40_000);
        match event {
            ServerEvent::LobbyUpdated {
                seconds_remaining, ..
            } => assert_eq!(seconds_remaining, 570),
            other => panic!("expected LobbyUpdated, got {other:?}"),
        }
    }

    #[test]
    fn test_lobby_update_clamps_at_zero() {
        let core = SessionCore::new(
            GameId(1),
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("pending", "Opponent"),
            10_000,
            1_000,
        );
        let event = ServerEvent::lobby_update(&core, 99_000);
        match event {
            ServerEvent::LobbyUpdated {
                seconds_remaining, ..
            } => assert_eq!(seconds_remaining, 0),
            other => panic!("expected LobbyUpdated, got {other:?}"),
        }
    }

    #[test]
    fn test_game_view_tags_by_game() {
        let snapshot = gamenight_maze::MazeGame::new(
            GameId(1),
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("bob", "Bob"),
            1_000,
            600_000,
        )
        .snapshot();
        let view = GameView::Maze(Box::new(snapshot));
        let json: serde_json::Value = serde_json::to_value(&view).unwrap();
        assert_eq!(json["game"], "maze");
        assert!(json.get("player1").is_some());
    }
}
