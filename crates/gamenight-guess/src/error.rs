//! Error types for the deduction simulation.

/// A rejected deduction-game command.
///
/// Rejections never mutate state: the caller reports them to the acting
/// client and nothing is broadcast.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GuessError {
    /// The session is not in the playing phase.
    #[error("game is not in the playing phase")]
    NotPlaying,

    /// The acting player does not hold the turn.
    #[error("not your turn")]
    NotYourTurn,

    /// Answering is the other player's job right now.
    #[error("not your turn to answer")]
    NotYourAnswer,

    /// The turn is in the wrong sub-phase for this operation.
    #[error("turn is in the {actual} phase, expected {expected}")]
    WrongTurnPhase {
        expected: &'static str,
        actual: &'static str,
    },

    /// The question failed validation (length, trailing `?`).
    #[error("{0}")]
    InvalidQuestion(String),
}
