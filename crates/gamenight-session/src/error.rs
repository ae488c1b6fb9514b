//! Rejections — the errors a command can earn without mutating anything.
//!
//! These map one-to-one onto the failure taxonomy the engine promises:
//! validation errors, authorization errors (non-participant, wrong
//! turn/phase), and not-found. A rejection is reported to the acting
//! client only; it is never broadcast and never changes state.

use gamenight_guess::GuessError;
use gamenight_protocol::GameId;

/// Why a command was refused.
#[derive(Debug, thiserror::Error)]
pub enum Reject {
    /// No session exists under this id (or it already retired).
    #[error("game {0} not found")]
    NotFound(GameId),

    /// The acting user is not bound to either participant slot.
    #[error("you are not part of this game")]
    NotParticipant,

    /// Both slots are already claimed by other users.
    #[error("game is full")]
    GameFull,

    /// A join arrived after the lobby closed.
    #[error("game already started")]
    AlreadyStarted,

    /// The session is in the wrong phase for this operation.
    #[error("game is not in the {expected} phase")]
    WrongPhase { expected: &'static str },

    /// The command doesn't exist in this game (e.g. `Move` sent to the
    /// deduction game).
    #[error("this game does not support that command")]
    Unsupported,

    /// A deduction-game rule rejected the command.
    #[error(transparent)]
    Game(#[from] GuessError),

    /// The session actor is gone — its command channel is closed.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_messages_are_client_presentable() {
        assert_eq!(Reject::NotFound(GameId(3)).to_string(), "game G-3 not found");
        assert_eq!(Reject::GameFull.to_string(), "game is full");
        assert_eq!(
            Reject::WrongPhase { expected: "lobby" }.to_string(),
            "game is not in the lobby phase"
        );
    }

    #[test]
    fn test_game_errors_pass_through_transparently() {
        let reject: Reject = GuessError::NotYourTurn.into();
        assert_eq!(reject.to_string(), "not your turn");
    }
}
