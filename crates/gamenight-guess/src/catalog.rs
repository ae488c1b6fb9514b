//! The character catalog — the shared board both players deduce over.
//!
//! Catalogs are injected at session creation; loading them from disk or a
//! CMS is the embedding application's job. A small built-in catalog is
//! provided for tests and local demos.

use serde::{Deserialize, Serialize};

/// One character card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    /// Opaque art reference (emoji, URL).
    pub avatar: Option<String>,
}

impl Character {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: None,
        }
    }
}

/// A minimal catalog for tests and demos.
///
/// Real deployments inject their own; the engine only requires at least
/// two characters so that two distinct secrets can be drawn.
pub fn demo_catalog() -> Vec<Character> {
    [
        "Margot", "Felix", "Priya", "Oscar", "Luna", "Dmitri", "Sofia",
        "Henry", "Amara", "Kenji", "Ingrid", "Theo",
    ]
    .iter()
    .enumerate()
    .map(|(i, name)| Character::new(i as u32 + 1, *name))
    .collect()
}
