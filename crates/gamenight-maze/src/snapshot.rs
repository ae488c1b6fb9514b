//! The broadcast snapshot — the single projection of a maze-race session.
//!
//! Unlike the deduction game there is no hidden information here, so one
//! snapshot serves both recipients. Entities are keyed `player1` /
//! `player2`; the client works out which one is "me" from its own user id.

use serde::{Deserialize, Serialize};

use gamenight_protocol::{Direction, GameId, Phase, Slot, UserId};

use crate::game::{FinalScores, MazeGame};
use crate::grid::MAZE_LAYOUT;

/// A grid coordinate as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// One player's public state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacerSnapshot {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub ready: bool,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub score: u32,
    pub lives: u8,
    pub invincible: bool,
}

/// One ghost's public state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostSnapshot {
    pub id: String,
    pub color: String,
    pub label: String,
    pub x: i32,
    pub y: i32,
}

/// The full public state broadcast every tick (and on start/rejoin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeSnapshot {
    pub game_id: GameId,
    pub phase: Phase,
    pub maze: Vec<String>,
    pub dots: Vec<Point>,
    pub player1: RacerSnapshot,
    pub player2: RacerSnapshot,
    pub ghosts: Vec<GhostSnapshot>,
    pub tick: u64,
    pub winner: Option<UserId>,
    pub final_scores: Option<FinalScores>,
}

impl MazeGame {
    fn racer_snapshot(&self, slot: Slot) -> RacerSnapshot {
        let p = self.core.participant(slot);
        let r = self.racer(slot);
        RacerSnapshot {
            user_id: p.user_id.clone(),
            display_name: p.display_name.clone(),
            avatar: p.avatar.clone(),
            ready: p.ready,
            x: r.x,
            y: r.y,
            direction: r.facing,
            score: r.score,
            lives: r.lives,
            invincible: r.invincible,
        }
    }

    /// Builds the broadcast snapshot of the current state.
    pub fn snapshot(&self) -> MazeSnapshot {
        MazeSnapshot {
            game_id: self.core.id,
            phase: self.core.phase,
            maze: MAZE_LAYOUT.iter().map(|row| row.to_string()).collect(),
            dots: self.dots().iter().map(|&(x, y)| Point { x, y }).collect(),
            player1: self.racer_snapshot(Slot::P1),
            player2: self.racer_snapshot(Slot::P2),
            ghosts: self
                .ghosts()
                .iter()
                .map(|g| GhostSnapshot {
                    id: g.id.to_string(),
                    color: g.color.to_string(),
                    label: g.label.to_string(),
                    x: g.x,
                    y: g.y,
                })
                .collect(),
            tick: self.tick_count(),
            winner: self.core.winner.clone(),
            final_scores: self.final_scores(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
