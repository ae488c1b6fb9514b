//! Core types shared by every layer of the engine.
//!
//! This module defines the identity types, the common session data model
//! (the fields both games share), and the small enums — phases, directions,
//! recipients — that the rest of the workspace builds on. Everything here
//! is serializable because all of it appears, in one projection or another,
//! in messages sent to clients.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user, issued by the surrounding application.
///
/// This is a newtype over `String` rather than a numeric id: the embedding
/// app hands us opaque account ids and we never mint our own. Wrapping it
/// keeps a `UserId` from being confused with a display name or an avatar
/// reference in a function signature.
///
/// `#[serde(transparent)]` makes it serialize as a bare JSON string, which
/// is what the client SDK sends and expects back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Convenience constructor for anything stringy.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A unique identifier for a game session.
///
/// Allocated by the registry from a process-local counter. Serializes as a
/// plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase — the session lifecycle state machine
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// Transitions only ever move forward:
///
/// ```text
/// Lobby ──→ Playing ──→ Finished
///   │                      ▲
///   └──→ Cancelled         └─ (win, loss, or forfeit)
/// ```
///
/// A session never re-enters an earlier phase, and `Finished`/`Cancelled`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Participants are gathering and confirming readiness.
    Lobby,
    /// The game is running; commands and (for the maze race) ticks mutate state.
    Playing,
    /// The game ended with a winner.
    Finished,
    /// The lobby expired or a participant cancelled before play began.
    Cancelled,
}

impl Phase {
    /// Returns `true` once no further mutation is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    /// Returns `true` if moving to `target` is a legal forward transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::Playing)
                | (Self::Lobby, Self::Cancelled)
                | (Self::Playing, Self::Finished)
                | (Self::Playing, Self::Cancelled)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Direction — maze-race movement
// ---------------------------------------------------------------------------

/// A cardinal movement direction on the maze grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The grid delta for one step in this direction.
    ///
    /// The maze uses screen coordinates: y grows downward, so `Up` is
    /// `(0, -1)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// Identity payload supplied when creating or joining a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub user_id: UserId,
    pub display_name: String,
    /// Opaque avatar reference (emoji, URL — the engine never interprets it).
    pub avatar: Option<String>,
}

impl PlayerInfo {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            display_name: display_name.into(),
            avatar: None,
        }
    }
}

/// One of a session's two participant slots.
///
/// A slot seeded from placeholder info at creation has `claimed: false`
/// until a real user binds to it by joining. Once both slots are claimed,
/// further joins by other users are rejected as "game full".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub ready: bool,
    pub claimed: bool,
}

impl Participant {
    /// A slot bound to a concrete user from the start (the initiator).
    pub fn claimed(info: PlayerInfo) -> Self {
        Self {
            user_id: info.user_id,
            display_name: info.display_name,
            avatar: info.avatar,
            ready: false,
            claimed: true,
        }
    }

    /// A placeholder slot waiting for its user to join.
    pub fn placeholder(info: PlayerInfo) -> Self {
        Self {
            user_id: info.user_id,
            display_name: info.display_name,
            avatar: info.avatar,
            ready: false,
            claimed: false,
        }
    }
}

/// Index of a participant slot. Slot `P1` is the initiator and acts first
/// wherever order matters (first turn, dot-collection tie-breaks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    P1,
    P2,
}

impl Slot {
    /// The other slot.
    pub fn other(self) -> Self {
        match self {
            Self::P1 => Self::P2,
            Self::P2 => Self::P1,
        }
    }

    /// Array index for `[T; 2]` storage keyed by slot.
    pub fn index(self) -> usize {
        match self {
            Self::P1 => 0,
            Self::P2 => 1,
        }
    }

    pub const BOTH: [Slot; 2] = [Slot::P1, Slot::P2];
}

// ---------------------------------------------------------------------------
// SessionCore — fields common to both games
// ---------------------------------------------------------------------------

/// The session fields shared by every game type.
///
/// Each simulation embeds one of these; the lifecycle layer reads and
/// writes session state only through it, so joins, readiness, phase
/// transitions and forfeits behave identically across games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCore {
    pub id: GameId,
    pub phase: Phase,
    pub participants: [Participant; 2],
    /// Unix milliseconds at creation.
    pub created_at_ms: u64,
    /// Unix milliseconds when an unstarted lobby is abandoned.
    pub lobby_expires_at_ms: u64,
    pub winner: Option<UserId>,
    pub finished_at_ms: Option<u64>,
}

impl SessionCore {
    /// Builds a fresh lobby-phase core with the creator in slot 1 and the
    /// placeholder opponent in slot 2.
    pub fn new(
        id: GameId,
        creator: PlayerInfo,
        opponent: PlayerInfo,
        created_at_ms: u64,
        lobby_ttl_ms: u64,
    ) -> Self {
        Self {
            id,
            phase: Phase::Lobby,
            participants: [
                Participant::claimed(creator),
                Participant::placeholder(opponent),
            ],
            created_at_ms,
            lobby_expires_at_ms: created_at_ms + lobby_ttl_ms,
            winner: None,
            finished_at_ms: None,
        }
    }

    /// Which slot a claimed user occupies, if any.
    ///
    /// Placeholder slots don't count: a user id that happens to match an
    /// unclaimed placeholder is not yet a participant.
    pub fn slot_of(&self, user: &UserId) -> Option<Slot> {
        Slot::BOTH
            .into_iter()
            .find(|s| self.participants[s.index()].claimed
                && self.participants[s.index()].user_id == *user)
    }

    pub fn participant(&self, slot: Slot) -> &Participant {
        &self.participants[slot.index()]
    }

    pub fn participant_mut(&mut self, slot: Slot) -> &mut Participant {
        &mut self.participants[slot.index()]
    }

    /// Both slots claimed and ready — the lobby may start.
    pub fn both_ready(&self) -> bool {
        self.participants
            .iter()
            .all(|p| p.claimed && p.ready)
    }

    /// Moves the session to `target`, enforcing forward-only transitions.
    ///
    /// Returns `false` (and changes nothing) if the transition is illegal —
    /// e.g. a late timer firing against an already-finished session.
    pub fn transition(&mut self, target: Phase) -> bool {
        if self.phase.can_transition_to(target) {
            self.phase = target;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Delivery target for an outbound event within a session's room.
///
/// Simulations return `(Recipient, event)` pairs; the session actor
/// resolves each recipient against the currently bound connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Everyone bound to the session.
    All,
    /// One specific user.
    User(UserId),
    /// Everyone except the named user (e.g. "your opponent disconnected").
    AllExcept(UserId),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, name: &str) -> PlayerInfo {
        PlayerInfo::new(id, name)
    }

    fn core() -> SessionCore {
        SessionCore::new(
            GameId(7),
            info("alice", "Alice"),
            info("pending", "Opponent"),
            1_000,
            600_000,
        )
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::new("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn test_game_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&GameId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_game_id_display() {
        assert_eq!(GameId(3).to_string(), "G-3");
    }

    // =====================================================================
    // Phase
    // =====================================================================

    #[test]
    fn test_phase_transitions_follow_forward_order() {
        assert!(Phase::Lobby.can_transition_to(Phase::Playing));
        assert!(Phase::Lobby.can_transition_to(Phase::Cancelled));
        assert!(Phase::Playing.can_transition_to(Phase::Finished));
        assert!(Phase::Playing.can_transition_to(Phase::Cancelled));
    }

    #[test]
    fn test_phase_never_moves_backward() {
        assert!(!Phase::Playing.can_transition_to(Phase::Lobby));
        assert!(!Phase::Finished.can_transition_to(Phase::Playing));
        assert!(!Phase::Finished.can_transition_to(Phase::Lobby));
        assert!(!Phase::Cancelled.can_transition_to(Phase::Playing));
    }

    #[test]
    fn test_phase_lobby_cannot_jump_to_finished() {
        // A lobby can be cancelled but never "won".
        assert!(!Phase::Lobby.can_transition_to(Phase::Finished));
    }

    #[test]
    fn test_phase_terminal_states() {
        assert!(!Phase::Lobby.is_terminal());
        assert!(!Phase::Playing.is_terminal());
        assert!(Phase::Finished.is_terminal());
        assert!(Phase::Cancelled.is_terminal());
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        let json = serde_json::to_string(&Phase::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
    }

    // =====================================================================
    // Direction
    // =====================================================================

    #[test]
    fn test_direction_deltas() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
    }

    #[test]
    fn test_direction_deserializes_from_lowercase() {
        let dir: Direction = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(dir, Direction::Left);
    }

    // =====================================================================
    // Slot
    // =====================================================================

    #[test]
    fn test_slot_other_swaps() {
        assert_eq!(Slot::P1.other(), Slot::P2);
        assert_eq!(Slot::P2.other(), Slot::P1);
    }

    // =====================================================================
    // SessionCore
    // =====================================================================

    #[test]
    fn test_new_core_starts_in_lobby_with_placeholder_slot2() {
        let core = core();
        assert_eq!(core.phase, Phase::Lobby);
        assert!(core.participants[0].claimed);
        assert!(!core.participants[1].claimed);
        assert_eq!(core.lobby_expires_at_ms, 601_000);
    }

    #[test]
    fn test_slot_of_ignores_unclaimed_placeholder() {
        let core = core();
        assert_eq!(core.slot_of(&UserId::new("alice")), Some(Slot::P1));
        // "pending" is the placeholder's provisional id — not a participant.
        assert_eq!(core.slot_of(&UserId::new("pending")), None);
    }

    #[test]
    fn test_both_ready_requires_claimed_slots() {
        let mut core = core();
        core.participants[0].ready = true;
        core.participants[1].ready = true;
        // Slot 2 is still a placeholder, so readiness doesn't count.
        assert!(!core.both_ready());

        core.participants[1].claimed = true;
        assert!(core.both_ready());
    }

    #[test]
    fn test_transition_rejects_backward_move() {
        let mut core = core();
        assert!(core.transition(Phase::Playing));
        assert!(!core.transition(Phase::Lobby));
        assert_eq!(core.phase, Phase::Playing);
        assert!(core.transition(Phase::Finished));
        assert!(!core.transition(Phase::Playing));
    }
}
