//! Turn-based deduction game simulation.
//!
//! Each player holds a secret character from a shared catalog. Turns cycle
//! through ask → answer → flip; a guess may come at any point in the
//! holder's turn and ends the game win-or-lose. This crate is the pure
//! rules engine: no sockets, no timers, no async — the session layer
//! drives it and broadcasts the results.
//!
//! # Key types
//!
//! - [`GuessGame`] — full server-side state and every operation
//! - [`TurnPhase`] — the ask/answer/flip sub-state machine
//! - [`PlayerView`] / [`RevealedView`] — redacted and post-game projections
//! - [`Character`] — one card in the injected catalog

mod catalog;
mod error;
mod game;
mod view;

pub use catalog::{Character, demo_catalog};
pub use error::GuessError;
pub use game::{GuessGame, GuessOutcome, TurnPhase, TurnRecord, validate_question};
pub use view::{OpponentPlayer, OwnPlayer, PlayerView, RevealedView};
