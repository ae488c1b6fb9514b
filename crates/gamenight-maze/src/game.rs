//! The maze-race simulation: fixed-timestep movement, collisions, scoring.
//!
//! Two players race to hoover up dots while four ghosts patrol fixed
//! waypoint loops. The simulation advances only through [`MazeGame::tick`],
//! called on a fixed cadence by the session layer; between ticks the only
//! input is a queued direction per player. That makes the whole game a
//! deterministic function of its initial state and the queued inputs —
//! clients render server state and nothing else.
//!
//! Each tick runs five stages in a fixed order:
//!
//! 1. player steps (turn, then move)
//! 2. ghost steps (waypoint chase, walls ignored)
//! 3. dot collection — player 1 before player 2
//! 4. ghost collisions (with invincibility windows)
//! 5. win evaluation
//!
//! The player-1-first collection order is the tie-break for two players
//! landing on the same dot in the same tick. It is intentional and
//! load-bearing; both clients display the same authoritative outcome.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use gamenight_protocol::{Direction, GameId, Phase, PlayerInfo, SessionCore, Slot};

use crate::grid::{self, PLAYER_SPAWN};

/// Players advance one cell every 7 ticks; ghosts every 10. At the
/// standard 50 ms tick period that is ~2.9 and 2.0 cells per second —
/// players outrun ghosts on straightaways.
pub const PLAYER_STEP_TICKS: u8 = 7;
pub const GHOST_STEP_TICKS: u8 = 10;

/// Ticks of post-respawn invincibility (1.5 s at the standard period).
pub const INVINCIBLE_TICKS: u64 = 30;

/// Points per collected dot.
pub const DOT_SCORE: u32 = 10;

pub const STARTING_LIVES: u8 = 3;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// One racing player's mutable simulation state.
///
/// Identity lives in the session core; this struct is pure physics —
/// position, facing, score, lives. The wire form is
/// [`RacerSnapshot`](crate::RacerSnapshot), not this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Racer {
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    /// The most recent direction input, consumed (applied or discarded)
    /// at the racer's next step.
    pub queued: Option<Direction>,
    pub score: u32,
    pub lives: u8,
    pub invincible: bool,
    /// Absolute tick at which invincibility lapses.
    pub invincible_until_tick: u64,
    /// Ticks accumulated toward the next step.
    cadence: u8,
}

impl Racer {
    fn new(facing: Direction) -> Self {
        Self {
            x: PLAYER_SPAWN.0,
            y: PLAYER_SPAWN.1,
            facing,
            queued: None,
            score: 0,
            lives: STARTING_LIVES,
            invincible: false,
            invincible_until_tick: 0,
            cadence: 0,
        }
    }

    /// Back to spawn with a fresh invincibility window. Queued input and
    /// step cadence are cleared so the respawn feels identical every time.
    fn respawn(&mut self, now_tick: u64) {
        self.x = PLAYER_SPAWN.0;
        self.y = PLAYER_SPAWN.1;
        self.queued = None;
        self.invincible = true;
        self.invincible_until_tick = now_tick + INVINCIBLE_TICKS;
        self.cadence = 0;
    }
}

/// A patrolling ghost. Ghosts drift straight through walls — only their
/// waypoint list shapes their path.
#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    pub id: &'static str,
    pub color: &'static str,
    pub label: &'static str,
    pub x: i32,
    pub y: i32,
    waypoints: &'static [(i32, i32)],
    waypoint_index: usize,
    cadence: u8,
}

/// The four fixed patrols: spawn cell plus a cyclic waypoint loop.
struct GhostSpec {
    id: &'static str,
    color: &'static str,
    label: &'static str,
    spawn: (i32, i32),
    waypoints: &'static [(i32, i32)],
}

const GHOST_SPECS: [GhostSpec; 4] = [
    GhostSpec {
        id: "ghost1",
        color: "#FF3D71",
        label: "red",
        spawn: (8, 8),
        waypoints: &[(3, 3), (3, 7), (7, 7), (7, 3)],
    },
    GhostSpec {
        id: "ghost2",
        color: "#FF9F1C",
        label: "orange",
        spawn: (10, 8),
        waypoints: &[(1, 10), (17, 10)],
    },
    GhostSpec {
        id: "ghost3",
        color: "#B565FF",
        label: "purple",
        spawn: (8, 9),
        waypoints: &[(9, 1), (9, 19)],
    },
    GhostSpec {
        id: "ghost4",
        color: "#FFE66D",
        label: "yellow",
        spawn: (10, 9),
        waypoints: &[(11, 3), (11, 7), (15, 7), (15, 3)],
    },
];

/// Final score snapshot recorded the moment the game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScores {
    pub player1: u32,
    pub player2: u32,
}

/// What one tick produced, for the caller to turn into events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Dots collected this tick, in resolution order.
    pub collected: Vec<(Slot, (i32, i32))>,
    /// Slots that lost a life this tick.
    pub lives_lost: Vec<Slot>,
    /// Set exactly once, on the tick that ends the game.
    pub winner: Option<Slot>,
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// Full server-side state of one maze-race session.
#[derive(Debug, Clone, PartialEq)]
pub struct MazeGame {
    pub core: SessionCore,
    dots: BTreeSet<(i32, i32)>,
    racers: [Racer; 2],
    ghosts: [Ghost; 4],
    tick: u64,
    final_scores: Option<FinalScores>,
}

impl MazeGame {
    /// Creates a fresh lobby-phase session with the dot set seeded once.
    ///
    /// Player 1 starts facing right, player 2 facing left, both on the
    /// shared spawn cell.
    pub fn new(
        id: GameId,
        creator: PlayerInfo,
        opponent: PlayerInfo,
        created_at_ms: u64,
        lobby_ttl_ms: u64,
    ) -> Self {
        let ghosts = GHOST_SPECS.map(|spec| Ghost {
            id: spec.id,
            color: spec.color,
            label: spec.label,
            x: spec.spawn.0,
            y: spec.spawn.1,
            waypoints: spec.waypoints,
            waypoint_index: 0,
            cadence: 0,
        });

        Self {
            core: SessionCore::new(id, creator, opponent, created_at_ms, lobby_ttl_ms),
            dots: grid::seed_dots(),
            racers: [Racer::new(Direction::Right), Racer::new(Direction::Left)],
            ghosts,
            tick: 0,
            final_scores: None,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn racer(&self, slot: Slot) -> &Racer {
        &self.racers[slot.index()]
    }

    pub fn ghosts(&self) -> &[Ghost; 4] {
        &self.ghosts
    }

    pub fn dots(&self) -> &BTreeSet<(i32, i32)> {
        &self.dots
    }

    pub fn final_scores(&self) -> Option<FinalScores> {
        self.final_scores
    }

    // -- Input ------------------------------------------------------------

    /// Queues a direction change, consumed at the player's next step.
    /// Ignored outside the playing phase — inputs racing the countdown
    /// or arriving after the game ended are simply dropped.
    pub fn queue_direction(&mut self, slot: Slot, direction: Direction) {
        if self.core.phase != Phase::Playing {
            return;
        }
        self.racers[slot.index()].queued = Some(direction);
    }

    // -- Simulation -------------------------------------------------------

    /// Advances the simulation by one fixed timestep.
    ///
    /// A no-op unless the session is in the playing phase, so a straggler
    /// tick against a finished game can never mutate it.
    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.core.phase != Phase::Playing {
            return outcome;
        }

        self.tick += 1;

        // 1. Player steps.
        for slot in Slot::BOTH {
            Self::step_racer(&mut self.racers[slot.index()]);
        }

        // 2. Ghost steps.
        for ghost in &mut self.ghosts {
            Self::step_ghost(ghost);
        }

        // 3. Dot collection. Player 1 is evaluated first: when both land
        //    on the same dot in the same tick, player 1 takes it.
        for slot in Slot::BOTH {
            if let Some(cell) = self.collect_dot(slot) {
                outcome.collected.push((slot, cell));
            }
        }

        // 4. Ghost collisions.
        for slot in Slot::BOTH {
            if self.check_ghost_hit(slot) {
                outcome.lives_lost.push(slot);
            }
        }

        // 5. Win evaluation.
        if let Some(winner) = self.resolve_winner() {
            self.finish(winner);
            outcome.winner = Some(winner);
        }

        outcome
    }

    /// One player's movement: maybe turn, then maybe advance.
    fn step_racer(racer: &mut Racer) {
        racer.cadence += 1;
        if racer.cadence < PLAYER_STEP_TICKS {
            return;
        }
        racer.cadence = 0;

        // Try the queued turn first. The queued direction is consumed
        // whether or not the turn was possible — a blocked turn doesn't
        // linger and fire in a corridor three cells later.
        if let Some(queued) = racer.queued.take() {
            if queued != racer.facing {
                let (dx, dy) = queued.delta();
                if !grid::is_wall(racer.x + dx, racer.y + dy) {
                    racer.facing = queued;
                }
            }
        }

        // Advance one cell in the facing direction if open.
        let (dx, dy) = racer.facing.delta();
        let (nx, ny) = (racer.x + dx, racer.y + dy);
        if !grid::is_wall(nx, ny) {
            racer.x = nx;
            racer.y = ny;
        }
    }

    /// One ghost's movement: a single cell toward the current waypoint,
    /// larger axis distance first (ties go to the x axis). Walls are not
    /// consulted. On exact arrival the patrol advances to the next
    /// waypoint in its cycle.
    fn step_ghost(ghost: &mut Ghost) {
        ghost.cadence += 1;
        if ghost.cadence < GHOST_STEP_TICKS {
            return;
        }
        ghost.cadence = 0;

        let (tx, ty) = ghost.waypoints[ghost.waypoint_index];
        let (dx, dy) = (tx - ghost.x, ty - ghost.y);

        if dx != 0 && dx.abs() >= dy.abs() {
            ghost.x += dx.signum();
        } else if dy != 0 {
            ghost.y += dy.signum();
        }

        if (ghost.x, ghost.y) == (tx, ty) {
            ghost.waypoint_index = (ghost.waypoint_index + 1) % ghost.waypoints.len();
        }
    }

    /// Removes the dot under the player, if any, and scores it.
    fn collect_dot(&mut self, slot: Slot) -> Option<(i32, i32)> {
        let racer = &mut self.racers[slot.index()];
        let cell = (racer.x, racer.y);
        if self.dots.remove(&cell) {
            racer.score += DOT_SCORE;
            Some(cell)
        } else {
            None
        }
    }

    /// Resolves ghost contact for one player. Returns `true` on a hit.
    ///
    /// An invincible player skips collision for the whole tick, even the
    /// tick on which the window lapses — the flag is cleared and contact
    /// resumes next tick.
    fn check_ghost_hit(&mut self, slot: Slot) -> bool {
        let now = self.tick;
        let racer = &mut self.racers[slot.index()];

        if racer.invincible {
            if now >= racer.invincible_until_tick {
                racer.invincible = false;
            }
            return false;
        }

        let hit = self
            .ghosts
            .iter()
            .any(|g| (g.x, g.y) == (racer.x, racer.y));
        if hit {
            racer.lives = racer.lives.saturating_sub(1);
            racer.respawn(now);
        }
        hit
    }

    /// Evaluates the win conditions in priority order.
    fn resolve_winner(&self) -> Option<Slot> {
        let [p1, p2] = &self.racers;

        // Higher score wins; player 1 takes ties.
        let by_score = if p1.score >= p2.score { Slot::P1 } else { Slot::P2 };

        if p1.lives == 0 && p2.lives == 0 {
            return Some(by_score);
        }
        if p1.lives == 0 {
            return Some(Slot::P2);
        }
        if p2.lives == 0 {
            return Some(Slot::P1);
        }
        if self.dots.is_empty() {
            return Some(by_score);
        }
        None
    }

    /// Marks the game finished with `winner`, freezing the final scores.
    ///
    /// Also the entry point for forfeits: the session layer calls this
    /// directly when a player concedes or abandons the game. The finish
    /// timestamp is stamped by the caller — the simulation itself never
    /// reads a clock.
    pub fn finish(&mut self, winner: Slot) {
        if !self.core.transition(Phase::Finished) {
            return;
        }
        self.core.winner = Some(self.core.participant(winner).user_id.clone());
        self.final_scores = Some(FinalScores {
            player1: self.racers[0].score,
            player2: self.racers[1].score,
        });
    }
}

// =========================================================================
// Tests
// =========================================================================
