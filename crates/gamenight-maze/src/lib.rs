//! Fixed-timestep maze-race simulation.
//!
//! Two players, four waypoint-patrolling ghosts, a fixed 21×19 maze, and a
//! shrinking field of dots. The session layer calls [`MazeGame::tick`] on a
//! fixed 50 ms cadence while the game is in the playing phase; everything
//! else — timers, broadcasting, forfeits — lives above this crate.
//!
//! The simulation is deliberately clock-free: given the same initial state
//! and the same queued directions at the same ticks it produces
//! bit-identical results, because clients render server state verbatim.

mod game;
mod grid;
mod snapshot;

pub use game::{
    DOT_SCORE, FinalScores, GHOST_STEP_TICKS, Ghost, INVINCIBLE_TICKS, MazeGame,
    PLAYER_STEP_TICKS, Racer, STARTING_LIVES, TickOutcome,
};
pub use grid::{MAZE_COLS, MAZE_LAYOUT, MAZE_ROWS, PLAYER_SPAWN, is_wall, seed_dots};
pub use snapshot::{GhostSnapshot, MazeSnapshot, Point, RacerSnapshot};
