//! The session registry: the one owned store of live sessions.
//!
//! Constructed once at process start and shared by handle — never ambient
//! global state. The registry maps a [`GameId`] to the handle of the actor
//! that owns that session's state; all reads and writes of session state
//! go through those handles.

use std::collections::HashMap;

use gamenight_protocol::GameId;

use crate::actor::SessionHandle;

/// Keyed store of active sessions.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<GameId, SessionHandle>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next session id. Ids are process-local and never
    /// reused within a process lifetime.
    pub fn allocate_id(&mut self) -> GameId {
        self.next_id += 1;
        GameId(self.next_id)
    }

    /// Registers a session under `id`.
    ///
    /// # Panics
    /// Panics on an id collision. Ids come from
    /// [`allocate_id`](Self::allocate_id), so a collision is a programmer
    /// error, not a runtime condition.
    pub fn insert(&mut self, id: GameId, handle: SessionHandle) {
        let previous = self.entries.insert(id, handle);
        assert!(previous.is_none(), "session id collision on {id}");
    }

    /// Looks up a session handle.
    pub fn get(&self, id: GameId) -> Option<&SessionHandle> {
        self.entries.get(&id)
    }

    /// Removes a session, returning its handle if it existed.
    pub fn remove(&mut self, id: GameId) -> Option<SessionHandle> {
        self.entries.remove(&id)
    }

    /// Drops entries whose actor has retired (command channel closed).
    ///
    /// Called opportunistically on creation and lookup, so finished
    /// sessions can't accumulate in a long-lived process.
    pub fn prune_retired(&mut self) {
        self.entries.retain(|id, handle| {
            let alive = !handle.is_closed();
            if !alive {
                tracing::debug!(game_id = %id, "pruning retired session");
            }
            alive
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<GameId> {
        self.entries.keys().copied().collect()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::spawn_session;
    use crate::SessionConfig;
    use gamenight_guess::{GuessGame, demo_catalog};
    use gamenight_protocol::PlayerInfo;

    fn handle(id: GameId) -> SessionHandle {
        let game = GuessGame::new(
            id,
            PlayerInfo::new("alice", "Alice"),
            PlayerInfo::new("bob", "Bob"),
            demo_catalog(),
            1_000,
            600_000,
        );
        spawn_session(game, SessionConfig::default())
    }

    #[tokio::test]
    async fn test_allocate_id_is_monotonic() {
        let mut registry = Registry::new();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[tokio::test]
    async fn test_insert_get_remove_round_trip() {
        let mut registry = Registry::new();
        let id = registry.allocate_id();
        registry.insert(id, handle(id));

        assert!(registry.get(id).is_some());
        assert_eq!(registry.len(), 1);

        registry.remove(id);
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    #[should_panic(expected = "session id collision")]
    async fn test_insert_duplicate_id_panics() {
        let mut registry = Registry::new();
        let id = registry.allocate_id();
        registry.insert(id, handle(id));
        registry.insert(id, handle(id));
    }

    #[tokio::test]
    async fn test_get_unknown_id_returns_none() {
        let registry = Registry::new();
        assert!(registry.get(GameId(404)).is_none());
    }
}
